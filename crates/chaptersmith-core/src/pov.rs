//! Point-of-view model and resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Narrative perspective of a single chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pov {
    /// Female lead.
    Female,
    /// Male lead.
    Male,
}

impl Pov {
    /// Returns the wire name of this POV.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }
}

impl fmt::Display for Pov {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pov {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" | "f" => Ok(Self::Female),
            "male" | "m" => Ok(Self::Male),
            other => Err(DomainError::Validation(format!(
                "unknown POV {other:?}, expected female or male"
            ))),
        }
    }
}

/// Project-wide POV setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PovMode {
    /// Every chapter follows the female lead.
    #[default]
    Female,
    /// Every chapter follows the male lead.
    Male,
    /// Chapters alternate by parity: odd female, even male.
    Dual,
}

impl PovMode {
    /// Returns the wire name of this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Dual => "dual",
        }
    }
}

impl fmt::Display for PovMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PovMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" | "f" => Ok(Self::Female),
            "male" | "m" => Ok(Self::Male),
            "dual" | "d" => Ok(Self::Dual),
            other => Err(DomainError::Validation(format!(
                "unknown POV mode {other:?}, expected female, male or dual"
            ))),
        }
    }
}

/// Computes the effective POV of a chapter.
///
/// A manual override always wins. In dual mode the answer depends only on
/// the parity of `number`, so it never shifts when chapters are regenerated.
/// Otherwise the project default applies; a project without one follows its
/// own mode.
#[must_use]
pub fn resolve(
    mode: PovMode,
    number: u32,
    default_pov: Option<Pov>,
    pov_override: Option<Pov>,
) -> Pov {
    if let Some(pov) = pov_override {
        return pov;
    }
    match mode {
        PovMode::Dual if number % 2 == 1 => Pov::Female,
        PovMode::Dual => Pov::Male,
        PovMode::Female => default_pov.unwrap_or(Pov::Female),
        PovMode::Male => default_pov.unwrap_or(Pov::Male),
    }
}
