use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of project work in the learner's masterpiece backlog.
///
/// Tasks come from the generation service and are only ever changed by
/// toggling `completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            completed: false,
        }
    }

    /// First four characters of the id, as shown in console messages.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(4) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}
