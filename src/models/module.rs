use serde::{Deserialize, Serialize};

/// Upper bound for [`Module::progress`].
pub const MAX_PROGRESS: u8 = 100;

/// A unit of the learning roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Stable identifier, unique within a roadmap.
    pub id: String,
    pub title: String,
    /// Completion percentage in `0..=100`.
    pub progress: u8,
    pub status: ModuleStatus,
}

/// Where a module sits in the learner's journey.
///
/// - `Upcoming`: Not started
/// - `Current`: The module being worked on (at most one per roadmap)
/// - `Completed`: Progress reached 100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleStatus {
    Upcoming,
    Current,
    Completed,
}

impl Module {
    pub fn new(id: impl Into<String>, title: impl Into<String>, status: ModuleStatus) -> Self {
        let progress = if status == ModuleStatus::Completed {
            MAX_PROGRESS
        } else {
            0
        };
        Self {
            id: id.into(),
            title: title.into(),
            progress,
            status,
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(MAX_PROGRESS);
        if self.progress == MAX_PROGRESS {
            self.status = ModuleStatus::Completed;
        }
        self
    }

    pub fn is_current(&self) -> bool {
        self.status == ModuleStatus::Current
    }
}

/// The roadmap every new learner starts with.
pub fn initial_roadmap() -> Vec<Module> {
    vec![
        Module::new("m1", "Foundations of Computation", ModuleStatus::Completed),
        Module::new("m2", "Data Structures & Algorithms", ModuleStatus::Current).with_progress(65),
        Module::new("m3", "Systems Architecture", ModuleStatus::Upcoming),
        Module::new("m4", "Distributed Intelligence", ModuleStatus::Upcoming),
        Module::new("m5", "Capstone Masterpiece", ModuleStatus::Upcoming),
    ]
}
