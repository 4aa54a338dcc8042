use serde::{Deserialize, Serialize};

/// The dashboard views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Roadmap,
    Project,
    Mentor,
    Stats,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Roadmap => "roadmap",
            Self::Project => "project",
            Self::Mentor => "mentor",
            Self::Stats => "stats",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "roadmap" => Some(Self::Roadmap),
            "project" => Some(Self::Project),
            "mentor" => Some(Self::Mentor),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

/// Where the roadmap view should focus when it is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    pub module_id: Option<String>,
    pub day: Option<u32>,
}
