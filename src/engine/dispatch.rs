//! Palette command resolution.

use crate::models::{Action, ActionKind, Tab, ANTIGRAVITY_ACTION_ID};

/// What a dispatched [`Action`] asks the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    LaunchAntigravity,
    Navigate(Tab),
    OpenRoadmap {
        module_id: Option<String>,
        day: Option<u32>,
    },
    /// Unknown kind or tab id; nothing happens.
    Ignored,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LaunchAntigravity => "launch_antigravity",
            Self::Navigate(_) => "navigate",
            Self::OpenRoadmap { .. } => "open_roadmap",
            Self::Ignored => "ignored",
        }
    }
}

/// Map an action to exactly one resolution, checking the rules in order.
pub fn resolve(action: &Action) -> Resolution {
    match action.kind {
        ActionKind::Navigation if action.id == ANTIGRAVITY_ACTION_ID => {
            Resolution::LaunchAntigravity
        }
        ActionKind::Navigation => match Tab::from_str(&action.id) {
            Some(tab) => Resolution::Navigate(tab),
            None => Resolution::Ignored,
        },
        ActionKind::Roadmap => {
            let metadata = action.metadata.clone().unwrap_or_default();
            Resolution::OpenRoadmap {
                module_id: metadata.module_id,
                day: metadata.day,
            }
        }
        ActionKind::Unknown => Resolution::Ignored,
    }
}
