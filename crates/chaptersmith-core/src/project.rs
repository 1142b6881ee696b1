//! Story projects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::pov::{Pov, PovMode};

/// Name given to a project when the user does not choose one.
pub const DEFAULT_PROJECT_NAME: &str = "New Project";

/// Generation rules attached to every new project unless replaced.
pub const DEFAULT_RULES: [&str; 5] = [
    "Each chapter must be strictly between 1400 and 1800 words. Do not write less than 1400 words, and do not exceed 1800 words. Ensure the chapter feels complete and cohesive while staying within this word count.",
    "Write in immersive first-person POV matching selected POV settings. Use full sentences and personal pronouns like I, my, and me. Avoid fragmented, dramatic lines.",
    "Dialogue must sound natural and reveal emotion through tone, pauses, and body language. Do not name emotions directly.",
    "Avoid metaphors, similes, purple prose, and dash-separated adjective lists. Keep tone grounded and human.",
    "Start each chapter with tension, action, or dialogue; end with a hook or strong emotional beat. Maintain continuity across chapters.",
];

/// Opaque backend identifier of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A story project as confirmed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Backend identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// The outline the chapters are written from.
    pub outline: String,
    /// Number of chapters, 3 to 6.
    pub chapter_count: u32,
    /// Project-wide POV setting.
    pub pov_mode: PovMode,
    /// POV used outside dual mode.
    #[serde(default)]
    pub default_pov: Option<Pov>,
    /// Free-text constraints forwarded to the generator.
    #[serde(default)]
    pub rules: Vec<String>,
    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Project {
    /// Resolves the effective POV for a chapter of this project.
    #[must_use]
    pub fn pov_for(&self, number: u32, pov_override: Option<Pov>) -> Pov {
        crate::pov::resolve(self.pov_mode, number, self.default_pov, pov_override)
    }
}

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    /// Display name.
    pub name: String,
    /// The outline the chapters are written from.
    pub outline: String,
    /// Number of chapters, 3 to 6.
    pub chapter_count: u32,
    /// Project-wide POV setting.
    pub pov_mode: PovMode,
    /// POV used outside dual mode.
    pub default_pov: Option<Pov>,
    /// Free-text constraints forwarded to the generator.
    pub rules: Vec<String>,
    /// Free-form labels.
    pub tags: Vec<String>,
}

impl NewProject {
    /// Builds a creation request with the standard rule preset.
    ///
    /// The default POV mirrors the mode: male for male projects, female for
    /// everything else.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        outline: impl Into<String>,
        chapter_count: u32,
        pov_mode: PovMode,
    ) -> Self {
        let default_pov = match pov_mode {
            PovMode::Male => Pov::Male,
            PovMode::Female | PovMode::Dual => Pov::Female,
        };
        Self {
            name: name.into(),
            outline: outline.into(),
            chapter_count,
            pov_mode,
            default_pov: Some(default_pov),
            rules: DEFAULT_RULES.iter().map(|rule| (*rule).to_owned()).collect(),
            tags: Vec::new(),
        }
    }

    /// Checks the request before it is sent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the outline or the name is blank.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.outline.trim().is_empty() {
            return Err(DomainError::Validation(
                "Please paste your outline to continue.".to_owned(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(
                "project name must not be blank".to_owned(),
            ));
        }
        Ok(())
    }
}
