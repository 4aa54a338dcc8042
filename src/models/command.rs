use serde::{Deserialize, Serialize};

/// Palette entry id that opens the antigravity presentation mode.
pub const ANTIGRAVITY_ACTION_ID: &str = "antigravity";

/// A command chosen from the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub kind: ActionKind,
    #[serde(default)]
    pub metadata: Option<ActionMetadata>,
}

/// Action categories understood by the dispatcher.
///
/// Anything else deserializes to `Unknown` and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Navigation,
    Roadmap,
    #[serde(other)]
    Unknown,
}

/// Optional roadmap target attached to an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMetadata {
    pub module_id: Option<String>,
    pub day: Option<u32>,
}

impl Action {
    pub fn navigate(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ActionKind::Navigation,
            metadata: None,
        }
    }

    pub fn roadmap(id: impl Into<String>, module_id: Option<&str>, day: Option<u32>) -> Self {
        Self {
            id: id.into(),
            kind: ActionKind::Roadmap,
            metadata: Some(ActionMetadata {
                module_id: module_id.map(str::to_string),
                day,
            }),
        }
    }
}
