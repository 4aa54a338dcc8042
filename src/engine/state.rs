use serde::Serialize;

use super::log_buffer::LogBuffer;
use crate::models::{initial_roadmap, Module, Task};

pub const DEFAULT_XP: u64 = 45_200;
pub const DEFAULT_NEURAL_INTENSITY: u8 = 50;
pub const MAX_NEURAL_INTENSITY: u8 = 100;

/// Everything the dashboard persists between sessions.
///
/// One instance is owned by the [`Engine`](super::Engine); the durable medium
/// only mirrors it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppState {
    pub project_idea: String,
    pub project_tasks: Vec<Task>,
    pub roadmap: Vec<Module>,
    pub xp: u64,
    pub project_notes: String,
    pub logs: LogBuffer,
    pub neural_intensity: u8,
    pub onboarding_completed: bool,
}

impl AppState {
    pub fn new(initial_xp: u64, neural_intensity: u8) -> Self {
        Self {
            project_idea: String::new(),
            project_tasks: Vec::new(),
            roadmap: initial_roadmap(),
            xp: initial_xp,
            project_notes: String::new(),
            logs: LogBuffer::new(),
            neural_intensity: neural_intensity.min(MAX_NEURAL_INTENSITY),
            onboarding_completed: false,
        }
    }

    pub fn current_module(&self) -> Option<&Module> {
        self.roadmap.iter().find(|m| m.is_current())
    }

    pub fn has_project(&self) -> bool {
        !self.project_idea.is_empty()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_XP, DEFAULT_NEURAL_INTENSITY)
    }
}
