//! The dashboard's state container and the rules that mutate it.
//!
//! [`Engine`] is the composition root: it owns the [`AppState`], the
//! [`PersistentStore`] mirror, the [`Router`], the onboarding sequence and a
//! [`Scheduler`] for every delayed effect. Callers hold the engine explicitly
//! and drive time with [`Engine::advance`]; there is no global instance.
//!
//! Every mutation marks the state dirty. The first dirty mark schedules a
//! flush after [`EngineConfig::flush_debounce`], so a burst of changes
//! reaches the medium as one batch.

mod dispatch;
mod log_buffer;
mod onboarding;
mod progression;
mod router;
mod scheduler;
mod state;

use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use thiserror::Error;

pub use dispatch::{resolve, Resolution};
pub use log_buffer::{LogBuffer, LOG_CAPACITY};
pub use onboarding::{Onboarding, OnboardingStage, STAGE_OFFSETS};
pub use progression::{
    advance_current_module, normalize_roadmap, roadmap_progress, set_current_module, Advance,
};
pub use router::{navigation_log_line, Router};
pub use scheduler::{Scheduler, TimerId};
pub use state::{AppState, DEFAULT_NEURAL_INTENSITY, DEFAULT_XP, MAX_NEURAL_INTENSITY};

use crate::config::EngineConfig;
use crate::generator::{self, GeneratedProject, GeneratorError, ProjectGenerator};
use crate::models::{Action, DeepLink, LogKind, Tab};
use crate::store::{FlushReport, PersistentStore};

/// Lines the project console cycles through while a project is active.
pub const STATUS_PHRASES: [&str; 5] = [
    "Optimizing data ingestion layer...",
    "Checking architectural entropy...",
    "Securing ingress points...",
    "Validating schema relationships...",
    "Scaling visual primitives...",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Project idea is empty")]
    EmptyIdea,

    #[error("A project generation is already in progress")]
    GenerationInFlight,

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Module not found or already completed: {0}")]
    ModuleUnavailable(String),

    #[error("Amount must be positive")]
    NonPositiveAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    Onboarding(OnboardingStage),
    ClearXpAlert,
    Flush,
    StatusPulse,
}

/// Work handed out by [`Engine::begin_generation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub idea: String,
    pub count: usize,
}

/// Read-only view of everything a front end renders.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub active_tab: Tab,
    pub deep_link: DeepLink,
    /// Module the roadmap focuses on after deep-link fallback.
    pub focused_module: Option<String>,
    pub mobile_menu_open: bool,
    pub palette_open: bool,
    pub antigravity: bool,
    pub xp_alert_visible: bool,
    pub onboarding: OnboardingStage,
    pub onboarding_stage: Option<u8>,
    pub generating: bool,
    pub blueprint: Option<String>,
    pub task_sync_percent: Option<u8>,
    pub roadmap_progress: u8,
    pub mentor_context: String,
    pub state: AppState,
}

/// Aborts the in-flight generation if dropped while `request` is still set.
struct GenerationRun<'a> {
    engine: &'a mut Engine,
    request: Option<GenerationRequest>,
}

impl Drop for GenerationRun<'_> {
    fn drop(&mut self) {
        if let Some(request) = self.request.take() {
            self.engine.abort_generation(&request);
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    state: AppState,
    store: PersistentStore,
    scheduler: Scheduler<TimerEvent>,
    router: Router,
    onboarding: Onboarding,
    /// Pending clear of the XP alert; the alert is visible while this is set.
    xp_alert: Option<TimerId>,
    flush_timer: Option<TimerId>,
    pulse_timer: Option<TimerId>,
    pulse_cursor: usize,
    antigravity: bool,
    palette_open: bool,
    blueprint: Option<String>,
    generating: bool,
}

impl Engine {
    /// Hydrate state from `store` and start first-run onboarding if needed.
    pub fn new(config: EngineConfig, mut store: PersistentStore) -> Self {
        let defaults = AppState::new(config.initial_xp, config.neural_intensity);
        let mut state = store.hydrate(defaults);
        if normalize_roadmap(&mut state.roadmap) {
            tracing::warn!("Stored roadmap violated progression rules and was repaired");
        }

        let onboarding = Onboarding::new(state.onboarding_completed);
        let mut engine = Self {
            config,
            state,
            store,
            scheduler: Scheduler::new(),
            router: Router::new(),
            onboarding,
            xp_alert: None,
            flush_timer: None,
            pulse_timer: None,
            pulse_cursor: 0,
            antigravity: false,
            palette_open: false,
            blueprint: None,
            generating: false,
        };

        let plan = engine.onboarding.plan();
        if !plan.is_empty() {
            tracing::info!("No initialized marker found, starting onboarding");
        }
        for (stage, offset) in plan {
            engine
                .scheduler
                .schedule(*offset, TimerEvent::Onboarding(*stage));
        }

        engine.sync_status_pulse();
        if engine.store.is_dirty(&engine.state) {
            engine.mark_dirty();
        }
        engine
    }

    // ============================================================
    // Accessors
    // ============================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn onboarding_stage(&self) -> OnboardingStage {
        self.onboarding.stage()
    }

    pub fn xp_alert_visible(&self) -> bool {
        self.xp_alert.is_some()
    }

    pub fn antigravity(&self) -> bool {
        self.antigravity
    }

    pub fn palette_open(&self) -> bool {
        self.palette_open
    }

    pub fn blueprint(&self) -> Option<&str> {
        self.blueprint.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Virtual time since the engine was built.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Whether a batched flush is waiting to run.
    pub fn flush_pending(&self) -> bool {
        self.flush_timer.is_some()
    }

    // ============================================================
    // Time and persistence
    // ============================================================

    /// Move virtual time forward, firing every timer that comes due in
    /// deadline order.
    pub fn advance(&mut self, elapsed: Duration) {
        let target = self.scheduler.now() + elapsed;
        while let Some(event) = self.scheduler.pop_due(target) {
            self.handle_timer(event);
        }
        self.scheduler.set_now(target);
    }

    fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Onboarding(stage) => self.enter_onboarding_stage(stage),
            TimerEvent::ClearXpAlert => {
                self.xp_alert = None;
            }
            TimerEvent::Flush => {
                self.flush_timer = None;
                self.flush();
            }
            TimerEvent::StatusPulse => {
                self.pulse_timer = None;
                if self.state.has_project() {
                    let phrase = STATUS_PHRASES[self.pulse_cursor % STATUS_PHRASES.len()];
                    self.pulse_cursor += 1;
                    self.append_log(phrase, LogKind::Info);
                }
                self.sync_status_pulse();
            }
        }
    }

    fn mark_dirty(&mut self) {
        if self.flush_timer.is_none() {
            let delay = self.config.flush_debounce();
            self.flush_timer = Some(self.scheduler.schedule(delay, TimerEvent::Flush));
        }
    }

    /// Write pending changes now instead of waiting for the batch timer.
    pub fn flush(&mut self) -> FlushReport {
        if let Some(timer) = self.flush_timer.take() {
            self.scheduler.cancel(timer);
        }
        self.store.flush(&self.state)
    }

    // ============================================================
    // Log
    // ============================================================

    pub fn append_log(&mut self, text: impl Into<String>, kind: LogKind) {
        self.state.logs.append(text, kind, Local::now());
        self.mark_dirty();
    }

    // ============================================================
    // Onboarding
    // ============================================================

    fn enter_onboarding_stage(&mut self, stage: OnboardingStage) {
        if !self.onboarding.advance_to(stage) {
            tracing::warn!(?stage, current = ?self.onboarding.stage(), "Ignoring out-of-order onboarding stage");
            return;
        }
        tracing::debug!(?stage, "Onboarding advanced");

        if stage == OnboardingStage::Done {
            self.state.onboarding_completed = true;
            self.flush();
            tracing::info!("Onboarding complete");
        }
    }

    // ============================================================
    // Navigation and commands
    // ============================================================

    /// Switch tabs, logging only when the tab actually changes.
    pub fn navigate(&mut self, tab: Tab) -> bool {
        let changed = self.router.navigate(tab);
        if changed {
            self.append_log(navigation_log_line(tab), LogKind::Info);
        }
        changed
    }

    /// Resolve and apply a palette action. Applied actions close the palette.
    pub fn dispatch(&mut self, action: &Action) -> Resolution {
        let resolution = resolve(action);
        match &resolution {
            Resolution::LaunchAntigravity => self.launch_antigravity(),
            Resolution::Navigate(tab) => {
                self.navigate(*tab);
            }
            Resolution::OpenRoadmap { module_id, day } => {
                self.navigate(Tab::Roadmap);
                if let Some(module_id) = module_id {
                    self.router.set_deep_link_module(module_id.clone());
                }
                if let Some(day) = day {
                    self.router.set_deep_link_day(*day);
                }
            }
            Resolution::Ignored => {
                tracing::debug!(id = %action.id, kind = ?action.kind, "Ignoring palette action");
                return resolution;
            }
        }
        self.palette_open = false;
        resolution
    }

    /// Flip palette visibility, returning the new value.
    pub fn toggle_palette(&mut self) -> bool {
        self.palette_open = !self.palette_open;
        self.palette_open
    }

    pub fn close_palette(&mut self) {
        self.palette_open = false;
    }

    pub fn launch_antigravity(&mut self) {
        self.antigravity = true;
        self.router.set_mobile_menu(false);
    }

    pub fn exit_antigravity(&mut self) {
        self.antigravity = false;
    }

    pub fn set_mobile_menu(&mut self, open: bool) {
        self.router.set_mobile_menu(open);
    }

    // ============================================================
    // Progression
    // ============================================================

    /// Add XP and (re)start the alert window. Returns the new total.
    pub fn award_xp(&mut self, amount: u64) -> Result<u64, EngineError> {
        if amount == 0 {
            return Err(EngineError::NonPositiveAmount);
        }

        self.state.xp = self.state.xp.saturating_add(amount);
        if let Some(previous) = self.xp_alert.take() {
            self.scheduler.cancel(previous);
        }
        let window = self.config.xp_alert();
        self.xp_alert = Some(self.scheduler.schedule(window, TimerEvent::ClearXpAlert));
        self.mark_dirty();

        tracing::debug!(amount, total = self.state.xp, "Awarded XP");
        Ok(self.state.xp)
    }

    pub fn advance_current_module(&mut self, delta: u32) -> Result<Advance, EngineError> {
        if delta == 0 {
            return Err(EngineError::NonPositiveAmount);
        }

        let result = advance_current_module(&mut self.state.roadmap, delta);
        if result != Advance::NoCurrent {
            self.mark_dirty();
        }
        if let Advance::Completed { module_id } = &result {
            tracing::info!(module_id = %module_id, "Module completed");
        }
        Ok(result)
    }

    pub fn set_current_module(&mut self, module_id: &str) -> Result<(), EngineError> {
        if !set_current_module(&mut self.state.roadmap, module_id) {
            return Err(EngineError::ModuleUnavailable(module_id.to_string()));
        }
        self.mark_dirty();
        Ok(())
    }

    // ============================================================
    // Project
    // ============================================================

    /// Flip a task's completion. Returns the new `completed` value.
    pub fn toggle_task(&mut self, task_id: &str) -> Result<bool, EngineError> {
        let task = self
            .state
            .project_tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| EngineError::TaskNotFound(task_id.to_string()))?;

        task.completed = !task.completed;
        let completed = task.completed;
        let line = format!("Task update: {} state modified.", task.short_id());

        self.append_log(line, LogKind::Success);
        Ok(completed)
    }

    pub fn set_project_idea(&mut self, idea: &str) {
        if self.state.project_idea == idea {
            return;
        }
        self.state.project_idea = idea.to_string();
        self.sync_status_pulse();
        self.mark_dirty();
    }

    pub fn set_project_notes(&mut self, notes: &str) {
        if self.state.project_notes == notes {
            return;
        }
        self.state.project_notes = notes.to_string();
        self.mark_dirty();
    }

    /// Set the intensity slider, clamped to `0..=100`. Returns the stored value.
    pub fn set_neural_intensity(&mut self, value: u32) -> u8 {
        let value = value.min(u32::from(MAX_NEURAL_INTENSITY)) as u8;
        if self.state.neural_intensity != value {
            self.state.neural_intensity = value;
            self.mark_dirty();
        }
        value
    }

    /// Drop the active project idea and blueprint. Tasks are kept.
    pub fn terminate_project(&mut self) {
        tracing::info!("Terminating project protocol");
        self.blueprint = None;
        self.set_project_idea("");
    }

    /// Start a generation run: records the idea and logs the start lines.
    ///
    /// The caller performs the requests and reports back through
    /// [`Engine::finish_generation`], so no lock needs to be held while the
    /// service is working.
    pub fn begin_generation(&mut self, idea: &str) -> Result<GenerationRequest, EngineError> {
        let idea = idea.trim();
        if idea.is_empty() {
            return Err(EngineError::EmptyIdea);
        }
        if self.generating {
            return Err(EngineError::GenerationInFlight);
        }

        self.generating = true;
        self.append_log("Initializing Project Matrix...", LogKind::Info);
        self.set_project_idea(idea);
        self.append_log("Analyzing architectural constraints...", LogKind::Info);

        Ok(GenerationRequest {
            idea: idea.to_string(),
            count: self.config.tasks_per_generation,
        })
    }

    /// Apply a finished generation run. Results are applied all together or
    /// not at all; returns whether they were applied.
    pub fn finish_generation(
        &mut self,
        request: &GenerationRequest,
        outcome: Result<GeneratedProject, GeneratorError>,
    ) -> bool {
        self.generating = false;

        match outcome {
            Ok(_) if self.state.project_idea != request.idea => {
                tracing::info!("Project changed during generation, discarding results");
                false
            }
            Ok(project) => {
                tracing::info!(tasks = project.tasks.len(), "Project generated");
                self.state.project_tasks = project.tasks;
                self.blueprint = Some(project.blueprint);
                self.append_log("Masterpiece Schema Generated.", LogKind::Success);
                self.append_log("Visual Blueprint Synchronized.", LogKind::Success);
                true
            }
            Err(e) => {
                tracing::warn!("Project generation failed: {}", e);
                self.append_log("System Crash during generation.", LogKind::Warn);
                false
            }
        }
    }

    /// Give up on a run whose outcome will never be reported, e.g. because
    /// the caller stopped waiting for it. No-op once the run has finished.
    pub fn abort_generation(&mut self, request: &GenerationRequest) {
        if !self.generating {
            return;
        }
        self.generating = false;
        tracing::warn!(idea = %request.idea, "Project generation abandoned");
        self.append_log("System Crash during generation.", LogKind::Warn);
    }

    /// Run a whole generation against `service` while holding the engine.
    ///
    /// Dropping the returned future before it completes aborts the run.
    pub async fn generate_project(
        &mut self,
        service: &dyn ProjectGenerator,
        idea: &str,
    ) -> Result<bool, EngineError> {
        let request = self.begin_generation(idea)?;
        let mut run = GenerationRun {
            engine: self,
            request: Some(request.clone()),
        };
        let outcome = generator::generate_project(service, &request.idea, request.count).await;
        run.request = None;
        Ok(run.engine.finish_generation(&request, outcome))
    }

    fn sync_status_pulse(&mut self) {
        match (self.state.has_project(), self.pulse_timer) {
            (true, None) => {
                let interval = self.config.status_pulse();
                self.pulse_timer = Some(self.scheduler.schedule(interval, TimerEvent::StatusPulse));
            }
            (false, Some(timer)) => {
                self.scheduler.cancel(timer);
                self.pulse_timer = None;
            }
            _ => {}
        }
    }

    // ============================================================
    // Derived views
    // ============================================================

    /// Context string handed to the mentor chat.
    pub fn mentor_context(&self) -> String {
        let module = self
            .state
            .current_module()
            .map(|m| m.title.as_str())
            .unwrap_or("None");
        format!("Active Module: {}. Project: {}", module, self.state.project_idea)
    }

    /// Share of completed tasks, rounded. `None` without tasks.
    pub fn task_sync_percent(&self) -> Option<u8> {
        let tasks = &self.state.project_tasks;
        if tasks.is_empty() {
            return None;
        }
        let done = tasks.iter().filter(|t| t.completed).count();
        Some(((done * 100 + tasks.len() / 2) / tasks.len()) as u8)
    }

    pub fn snapshot(&self) -> Snapshot {
        let stage = self.onboarding.stage();
        Snapshot {
            active_tab: self.router.active_tab(),
            deep_link: self.router.deep_link().clone(),
            focused_module: self
                .router
                .focused_module(&self.state.roadmap)
                .map(|m| m.id.clone()),
            mobile_menu_open: self.router.mobile_menu_open(),
            palette_open: self.palette_open,
            antigravity: self.antigravity,
            xp_alert_visible: self.xp_alert_visible(),
            onboarding: stage,
            onboarding_stage: stage.index(),
            generating: self.generating,
            blueprint: self.blueprint.clone(),
            task_sync_percent: self.task_sync_percent(),
            roadmap_progress: roadmap_progress(&self.state.roadmap),
            mentor_context: self.mentor_context(),
            state: self.state.clone(),
        }
    }
}
