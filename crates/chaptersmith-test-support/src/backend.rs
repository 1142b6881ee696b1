//! Scripted backend — in-memory `StoryBackend` for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chaptersmith_core::backend::{Generation, PromptResponse, StoryBackend};
use chaptersmith_core::chapter::{Chapter, ChapterPatch, ChapterStatus};
use chaptersmith_core::error::DomainError;
use chaptersmith_core::pov::PovMode;
use chaptersmith_core::project::{NewProject, Project, ProjectId};
use tokio::sync::Notify;
use uuid::Uuid;

/// How the scripted backend answers generate requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationMode {
    /// Return a generated chapter with this many words of content.
    Content {
        /// Words in the generated body.
        words: usize,
    },
    /// Return a prompt instead, as a server without a model does.
    PromptOnly,
}

/// A call observed by the scripted backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `create_project` with the requested name.
    CreateProject(String),
    /// `list_projects`.
    ListProjects,
    /// `delete_project`.
    DeleteProject(ProjectId),
    /// `initialize_chapters`.
    InitializeChapters(ProjectId),
    /// `generate_chapter`.
    GenerateChapter(ProjectId, u32),
    /// `build_prompt`.
    BuildPrompt(ProjectId, u32),
    /// `update_chapter`.
    UpdateChapter(ProjectId, u32, ChapterPatch),
}

#[derive(Debug)]
struct State {
    projects: Vec<Project>,
    chapters: HashMap<ProjectId, BTreeMap<u32, Chapter>>,
    next_id: u32,
    generation: GenerationMode,
    failure: Option<(u16, String)>,
    calls: Vec<BackendCall>,
}

/// An in-memory backend that follows the server contract, records every call
/// and can be told to fail or to hold a response until released.
#[derive(Debug)]
pub struct ScriptedBackend {
    state: Mutex<State>,
    holds: Mutex<HashMap<u32, Arc<Notify>>>,
    init_hold: Mutex<Option<Arc<Notify>>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Create an empty backend that generates in-range chapters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                projects: Vec::new(),
                chapters: HashMap::new(),
                next_id: 1,
                generation: GenerationMode::Content { words: 1600 },
                failure: None,
                calls: Vec::new(),
            }),
            holds: Mutex::new(HashMap::new()),
            init_hold: Mutex::new(None),
        }
    }

    /// Seed an existing project without chapters.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_project(self, project: Project) -> Self {
        self.state.lock().unwrap().projects.push(project);
        self
    }

    /// Choose how generate requests are answered.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_generation(&self, mode: GenerationMode) {
        self.state.lock().unwrap().generation = mode;
    }

    /// Make every following call fail with this status until cleared.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_with(&self, status: u16, message: &str) {
        self.state.lock().unwrap().failure = Some((status, message.to_owned()));
    }

    /// Stop failing.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear_failure(&self) {
        self.state.lock().unwrap().failure = None;
    }

    /// Hold the next generate or update call for `number` until the returned
    /// handle is notified. The response is computed after release.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn hold(&self, number: u32) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.holds.lock().unwrap().insert(number, Arc::clone(&gate));
        gate
    }

    /// Hold the next `initialize_chapters` call until the returned handle is
    /// notified. The chapter list is read when the call arrives, so a release
    /// after other writes delivers a stale list.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn hold_initialize(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.init_hold.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Returns a snapshot of all calls received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Returns the server-side chapters of a project.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stored_chapters(&self, project_id: &ProjectId) -> Vec<Chapter> {
        self.state
            .lock()
            .unwrap()
            .chapters
            .get(project_id)
            .map(|chapters| chapters.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the projects currently stored.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stored_projects(&self) -> Vec<Project> {
        self.state.lock().unwrap().projects.clone()
    }

    fn record(&self, call: BackendCall) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match &state.failure {
            Some((status, message)) => Err(DomainError::Backend {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn wait_if_held(&self, number: u32) {
        let gate = self.holds.lock().unwrap().remove(&number);
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

/// Applies the set fields of `patch` to a stored record.
fn apply_patch(chapter: &mut Chapter, patch: &ChapterPatch) {
    if let Some(title) = &patch.title {
        chapter.title.clone_from(title);
    }
    if let Some(content) = &patch.content {
        chapter.content.clone_from(content);
    }
    if let Some(status) = patch.status {
        chapter.status = status;
    }
    if let Some(pov) = patch.pov {
        chapter.pov = Some(pov);
    }
}

fn not_found(what: &str) -> DomainError {
    DomainError::Backend {
        status: 404,
        message: format!("{what} not found"),
    }
}

fn chapter_mut<'a>(
    state: &'a mut State,
    project_id: &ProjectId,
    number: u32,
) -> Result<&'a mut Chapter, DomainError> {
    state
        .chapters
        .get_mut(project_id)
        .ok_or_else(|| not_found("Project chapters"))?
        .get_mut(&number)
        .ok_or_else(|| not_found("Chapter"))
}

/// A body of `count` filler words.
#[must_use]
pub fn filler_words(count: usize) -> String {
    vec!["lorem"; count].join(" ")
}

/// A project record suitable for seeding a backend.
#[must_use]
pub fn sample_project(id: &str, chapter_count: u32, pov_mode: PovMode) -> Project {
    let request = NewProject::new("Sample", "A heist goes wrong.", chapter_count, pov_mode);
    Project {
        id: ProjectId::from(id),
        name: request.name,
        outline: request.outline,
        chapter_count: request.chapter_count,
        pov_mode: request.pov_mode,
        default_pov: request.default_pov,
        rules: request.rules,
        tags: request.tags,
    }
}

#[async_trait]
impl StoryBackend for ScriptedBackend {
    async fn create_project(
        &self,
        _correlation_id: Uuid,
        project: &NewProject,
    ) -> Result<Project, DomainError> {
        self.record(BackendCall::CreateProject(project.name.clone()))?;
        let mut state = self.state.lock().unwrap();
        let id = ProjectId(format!("project-{}", state.next_id));
        state.next_id += 1;
        let created = Project {
            id,
            name: project.name.clone(),
            outline: project.outline.clone(),
            chapter_count: project.chapter_count,
            pov_mode: project.pov_mode,
            default_pov: project.default_pov,
            rules: project.rules.clone(),
            tags: project.tags.clone(),
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn list_projects(&self, _correlation_id: Uuid) -> Result<Vec<Project>, DomainError> {
        self.record(BackendCall::ListProjects)?;
        Ok(self.state.lock().unwrap().projects.clone())
    }

    async fn delete_project(
        &self,
        _correlation_id: Uuid,
        project_id: &ProjectId,
    ) -> Result<(), DomainError> {
        self.record(BackendCall::DeleteProject(project_id.clone()))?;
        let mut state = self.state.lock().unwrap();
        state.projects.retain(|project| &project.id != project_id);
        state.chapters.remove(project_id);
        Ok(())
    }

    async fn initialize_chapters(
        &self,
        _correlation_id: Uuid,
        project_id: &ProjectId,
    ) -> Result<Vec<Chapter>, DomainError> {
        self.record(BackendCall::InitializeChapters(project_id.clone()))?;
        let snapshot: Vec<Chapter> = {
            let mut state = self.state.lock().unwrap();
            let chapter_count = state
                .projects
                .iter()
                .find(|project| &project.id == project_id)
                .map(|project| project.chapter_count)
                .ok_or_else(|| not_found("Project"))?;
            let chapters = state
                .chapters
                .entry(project_id.clone())
                .or_insert_with(|| (1..=chapter_count).map(|n| (n, Chapter::empty(n))).collect());
            chapters.values().cloned().collect()
        };
        let gate = self.init_hold.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(snapshot)
    }

    async fn generate_chapter(
        &self,
        _correlation_id: Uuid,
        project_id: &ProjectId,
        number: u32,
    ) -> Result<Generation, DomainError> {
        self.record(BackendCall::GenerateChapter(project_id.clone(), number))?;
        self.wait_if_held(number).await;
        let mut state = self.state.lock().unwrap();
        match state.generation.clone() {
            GenerationMode::PromptOnly => {
                chapter_mut(&mut state, project_id, number)?;
                Ok(Generation::prompt_only(format!(
                    "Write chapter {number} of project {project_id}."
                )))
            }
            GenerationMode::Content { words } => {
                let chapter = chapter_mut(&mut state, project_id, number)?;
                chapter.title = format!("Chapter {number}: Generated");
                chapter.content = filler_words(words);
                chapter.status = ChapterStatus::Generated;
                Ok(Generation::Content(chapter.clone()))
            }
        }
    }

    async fn build_prompt(
        &self,
        _correlation_id: Uuid,
        project_id: &ProjectId,
        number: u32,
    ) -> Result<PromptResponse, DomainError> {
        self.record(BackendCall::BuildPrompt(project_id.clone(), number))?;
        let mut state = self.state.lock().unwrap();
        chapter_mut(&mut state, project_id, number)?;
        Ok(PromptResponse {
            prompt: format!("Write chapter {number} of project {project_id}."),
        })
    }

    async fn update_chapter(
        &self,
        _correlation_id: Uuid,
        project_id: &ProjectId,
        number: u32,
        patch: &ChapterPatch,
    ) -> Result<Chapter, DomainError> {
        self.record(BackendCall::UpdateChapter(
            project_id.clone(),
            number,
            patch.clone(),
        ))?;
        self.wait_if_held(number).await;
        let mut state = self.state.lock().unwrap();
        let chapter = chapter_mut(&mut state, project_id, number)?;
        apply_patch(chapter, patch);
        Ok(chapter.clone())
    }
}
