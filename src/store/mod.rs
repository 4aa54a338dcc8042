//! Persistent mirror of [`AppState`] over a durable key-value medium.
//!
//! Every persisted field has exactly one key under [`KEY_PREFIX`]. Values are
//! read once when the engine is built and written back in batches by
//! [`PersistentStore::flush`], which only touches keys whose encoded value
//! changed since the last successful write.
//!
//! Nothing here is fatal: unreadable or malformed values fall back to the
//! caller's defaults and failed writes are logged and left for the next flush.

mod medium;
mod schema;

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use medium::{default_path, KeyValueMedium, SqliteMedium};

use crate::engine::{AppState, LogBuffer, MAX_NEURAL_INTENSITY};
use crate::models::LogEntry;

/// Namespace shared by every key this crate writes.
pub const KEY_PREFIX: &str = "odyssey_";

/// One key per persisted [`AppState`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    ProjectIdea,
    ProjectTasks,
    Roadmap,
    Xp,
    NeuralIntensity,
    ProjectNotes,
    SystemLogs,
    /// Presence-only marker written when onboarding finishes.
    Initialized,
}

impl StoreKey {
    pub const ALL: [StoreKey; 8] = [
        StoreKey::ProjectIdea,
        StoreKey::ProjectTasks,
        StoreKey::Roadmap,
        StoreKey::Xp,
        StoreKey::NeuralIntensity,
        StoreKey::ProjectNotes,
        StoreKey::SystemLogs,
        StoreKey::Initialized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectIdea => "project_idea",
            Self::ProjectTasks => "project_tasks",
            Self::Roadmap => "roadmap",
            Self::Xp => "xp",
            Self::NeuralIntensity => "neural_intensity",
            Self::ProjectNotes => "project_notes",
            Self::SystemLogs => "system_logs",
            Self::Initialized => "initialized",
        }
    }

    /// Full key as stored in the medium, e.g. `odyssey_xp`.
    pub fn storage_key(&self) -> String {
        format!("{}{}", KEY_PREFIX, self.as_str())
    }
}

/// Outcome of a single [`PersistentStore::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub written: usize,
    pub failed: usize,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.written == 0 && self.failed == 0
    }
}

pub struct PersistentStore {
    medium: Box<dyn KeyValueMedium>,
    /// Last value known to be in the medium, per key.
    mirrored: HashMap<StoreKey, String>,
}

impl PersistentStore {
    pub fn new(medium: impl KeyValueMedium + 'static) -> Self {
        Self {
            medium: Box::new(medium),
            mirrored: HashMap::new(),
        }
    }

    /// Open (and migrate) an on-disk SQLite store.
    pub fn open(path: PathBuf) -> Result<Self> {
        let medium = SqliteMedium::open(path)?;
        medium.migrate()?;
        Ok(Self::new(medium))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let medium = SqliteMedium::open_memory()?;
        medium.migrate()?;
        Ok(Self::new(medium))
    }

    fn read(&self, key: StoreKey) -> Option<String> {
        match self.medium.get(&key.storage_key()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = key.as_str(), "Failed to read stored value: {:#}", e);
                None
            }
        }
    }

    /// Load one field, returning `default` when the key is absent, unreadable
    /// or fails to parse.
    pub fn load<T>(&mut self, key: StoreKey, default: T, parse: impl FnOnce(&str) -> Option<T>) -> T {
        let Some(raw) = self.read(key) else {
            return default;
        };

        match parse(&raw) {
            Some(value) => {
                self.mirrored.insert(key, raw);
                value
            }
            None => {
                tracing::warn!(key = key.as_str(), "Malformed stored value, using default");
                default
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.read(StoreKey::Initialized).is_some()
    }

    /// Build the session state from the medium, field by field.
    pub fn hydrate(&mut self, defaults: AppState) -> AppState {
        let AppState {
            project_idea,
            project_tasks,
            roadmap,
            xp,
            project_notes,
            logs,
            neural_intensity,
            onboarding_completed: _,
        } = defaults;

        let project_idea = self.load(StoreKey::ProjectIdea, project_idea, |raw| {
            Some(raw.to_string())
        });
        let project_tasks = self.load(StoreKey::ProjectTasks, project_tasks, parse_json);
        let roadmap = self.load(StoreKey::Roadmap, roadmap, parse_json);
        let xp = self.load(StoreKey::Xp, xp, |raw| raw.trim().parse::<u64>().ok());
        let neural_intensity = self.load(StoreKey::NeuralIntensity, neural_intensity, |raw| {
            raw.trim()
                .parse::<u8>()
                .ok()
                .filter(|v| *v <= MAX_NEURAL_INTENSITY)
        });
        let project_notes = self.load(StoreKey::ProjectNotes, project_notes, |raw| {
            Some(raw.to_string())
        });
        let logs = self.load(StoreKey::SystemLogs, logs, |raw| {
            parse_json::<Vec<LogEntry>>(raw).and_then(LogBuffer::from_entries)
        });
        let onboarding_completed =
            self.load(StoreKey::Initialized, false, |_| Some(true));

        tracing::debug!(
            xp,
            tasks = project_tasks.len(),
            modules = roadmap.len(),
            logs = logs.len(),
            onboarding_completed,
            "Hydrated state"
        );

        AppState {
            project_idea,
            project_tasks,
            roadmap,
            xp,
            project_notes,
            logs,
            neural_intensity,
            onboarding_completed,
        }
    }

    /// Whether `state` differs from what was last written.
    pub fn is_dirty(&self, state: &AppState) -> bool {
        encode(state)
            .into_iter()
            .any(|(key, value)| self.mirrored.get(&key) != Some(&value))
    }

    /// Write every changed field. Failures are logged and counted, never
    /// returned; the key stays dirty so a later flush tries again.
    pub fn flush(&mut self, state: &AppState) -> FlushReport {
        let mut report = FlushReport::default();

        for (key, value) in encode(state) {
            if self.mirrored.get(&key) == Some(&value) {
                continue;
            }

            match self.medium.set(&key.storage_key(), &value) {
                Ok(()) => {
                    self.mirrored.insert(key, value);
                    report.written += 1;
                }
                Err(e) => {
                    tracing::warn!(key = key.as_str(), "Failed to persist value: {:#}", e);
                    report.failed += 1;
                }
            }
        }

        if !report.is_clean() {
            tracing::debug!(written = report.written, failed = report.failed, "Flushed state");
        }
        report
    }

    /// Remove every key this crate owns.
    pub fn clear(&mut self) -> Result<usize> {
        let removed = self.medium.clear_prefix(KEY_PREFIX)?;
        self.mirrored.clear();
        Ok(removed)
    }
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_str(raw).ok()
}

/// Encoded form of each field that should currently be in the medium.
fn encode(state: &AppState) -> Vec<(StoreKey, String)> {
    let mut values = vec![
        (StoreKey::ProjectIdea, state.project_idea.clone()),
        (StoreKey::Xp, state.xp.to_string()),
        (StoreKey::NeuralIntensity, state.neural_intensity.to_string()),
        (StoreKey::ProjectNotes, state.project_notes.clone()),
    ];

    let json = [
        (StoreKey::ProjectTasks, serde_json::to_string(&state.project_tasks)),
        (StoreKey::Roadmap, serde_json::to_string(&state.roadmap)),
        (StoreKey::SystemLogs, serde_json::to_string(&state.logs)),
    ];
    for (key, encoded) in json {
        match encoded {
            Ok(value) => values.push((key, value)),
            Err(e) => tracing::error!(key = key.as_str(), "Failed to encode value: {}", e),
        }
    }

    if state.onboarding_completed {
        values.push((StoreKey::Initialized, "true".to_string()));
    }

    values
}
