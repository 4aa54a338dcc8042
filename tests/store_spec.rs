use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use odyssey::engine::{AppState, LOG_CAPACITY};
use odyssey::models::*;
use odyssey::store::{KeyValueMedium, PersistentStore, SqliteMedium, StoreKey};
use speculate2::speculate;

/// In-memory medium that records every write and can be told to fail them.
#[derive(Clone, Default)]
struct MapMedium {
    values: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<Mutex<Vec<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MapMedium {
    fn seed(&self, key: StoreKey, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.storage_key(), value.to_string());
    }

    fn value(&self, key: StoreKey) -> Option<String> {
        self.values.lock().unwrap().get(&key.storage_key()).cloned()
    }

    fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

impl KeyValueMedium for MapMedium {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("storage quota exceeded");
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.writes.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn clear_prefix(&self, prefix: &str) -> anyhow::Result<usize> {
        let mut values = self.values.lock().unwrap();
        let before = values.len();
        values.retain(|k, _| !k.starts_with(prefix));
        Ok(before - values.len())
    }
}

/// Medium whose reads always fail.
struct BrokenMedium;

impl KeyValueMedium for BrokenMedium {
    fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("medium unavailable")
    }

    fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        anyhow::bail!("medium unavailable")
    }

    fn clear_prefix(&self, _prefix: &str) -> anyhow::Result<usize> {
        anyhow::bail!("medium unavailable")
    }
}

fn sample_state() -> AppState {
    let mut state = AppState::default();
    state.project_idea = "A collaborative IDE".to_string();
    state.project_notes = "Start with the REST layer".to_string();
    state.xp = 1234;
    state.neural_intensity = 80;
    state.project_tasks = vec![Task::new("Schema", "Design tables", "backend")];
    for i in 0..60 {
        state
            .logs
            .append(format!("event {}", i), LogKind::Info, chrono::Local::now());
    }
    state
}

speculate! {
    before {
        let medium = MapMedium::default();
        let mut store = PersistentStore::new(medium.clone());
    }

    describe "keys" {
        it "namespaces every key under one prefix" {
            for key in StoreKey::ALL {
                assert!(key.storage_key().starts_with("odyssey_"));
            }
            assert_eq!(StoreKey::Xp.storage_key(), "odyssey_xp");
        }
    }

    describe "hydrate" {
        it "returns defaults for an empty medium" {
            let state = store.hydrate(AppState::default());

            assert_eq!(state, AppState::default());
            assert!(!state.onboarding_completed);
        }

        it "falls back per field when a value is malformed" {
            medium.seed(StoreKey::Xp, "lots");
            medium.seed(StoreKey::Roadmap, "{not json");
            medium.seed(StoreKey::ProjectIdea, "Keep me");
            medium.seed(StoreKey::NeuralIntensity, "250");

            let state = store.hydrate(AppState::default());

            assert_eq!(state.xp, AppState::default().xp);
            assert_eq!(state.roadmap, initial_roadmap());
            assert_eq!(state.neural_intensity, AppState::default().neural_intensity);
            assert_eq!(state.project_idea, "Keep me");
        }

        it "drops stored logs whose sequence cannot continue" {
            medium.seed(
                StoreKey::SystemLogs,
                r#"[{"id":"a","seq":18446744073709551615,"text":"x","type":"info","timestamp":"10:00:00"}]"#,
            );

            let mut state = store.hydrate(AppState::default());

            assert!(state.logs.is_empty());
            let entry = state.logs.append("fresh", LogKind::Info, chrono::Local::now());
            assert_eq!(entry.seq, 0);
        }

        it "reads the initialized marker by presence" {
            medium.seed(StoreKey::Initialized, "");
            assert!(store.is_initialized());

            let state = store.hydrate(AppState::default());
            assert!(state.onboarding_completed);
        }

        it "survives a medium that cannot be read" {
            let mut broken = PersistentStore::new(BrokenMedium);
            let state = broken.hydrate(AppState::default());

            assert_eq!(state, AppState::default());
            assert!(!broken.is_initialized());
        }
    }

    describe "flush" {
        it "round-trips every persisted field" {
            let state = sample_state();
            let report = store.flush(&state);
            assert_eq!(report.failed, 0);

            let mut reloaded = PersistentStore::new(medium.clone());
            let restored = reloaded.hydrate(AppState::default());

            assert_eq!(restored.project_idea, state.project_idea);
            assert_eq!(restored.project_notes, state.project_notes);
            assert_eq!(restored.xp, state.xp);
            assert_eq!(restored.neural_intensity, state.neural_intensity);
            assert_eq!(restored.roadmap, state.roadmap);
            assert_eq!(restored.project_tasks, state.project_tasks);
            assert_eq!(restored.logs.len(), LOG_CAPACITY);
            assert_eq!(restored.logs.to_vec(), state.logs.to_vec());
        }

        it "stores scalars as plain strings" {
            let state = sample_state();
            store.flush(&state);

            assert_eq!(medium.value(StoreKey::Xp), Some("1234".to_string()));
            assert_eq!(medium.value(StoreKey::NeuralIntensity), Some("80".to_string()));
            assert_eq!(medium.value(StoreKey::ProjectIdea), Some("A collaborative IDE".to_string()));
            assert!(medium.value(StoreKey::Initialized).is_none());
        }

        it "only writes keys that changed" {
            let mut state = sample_state();
            store.flush(&state);
            let first = medium.write_count();

            assert!(store.flush(&state).is_clean());
            assert_eq!(medium.write_count(), first);

            state.xp += 1;
            let report = store.flush(&state);
            assert_eq!(report.written, 1);
            assert_eq!(medium.write_count(), first + 1);
        }

        it "does not rewrite values it just hydrated" {
            store.flush(&sample_state());
            let writes = medium.write_count();

            let mut reloaded = PersistentStore::new(medium.clone());
            let state = reloaded.hydrate(AppState::default());

            assert!(!reloaded.is_dirty(&state));
            assert!(reloaded.flush(&state).is_clean());
            assert_eq!(medium.write_count(), writes);
        }

        it "rewrites a malformed value with the in-memory one" {
            medium.seed(StoreKey::Xp, "garbage");
            let state = store.hydrate(AppState::default());

            assert!(store.is_dirty(&state));
            store.flush(&state);
            assert_eq!(medium.value(StoreKey::Xp), Some(state.xp.to_string()));
        }

        it "reports failed writes without panicking and retries on the next flush" {
            medium.fail_writes.store(true, Ordering::SeqCst);
            let state = sample_state();

            let report = store.flush(&state);
            assert_eq!(report.written, 0);
            assert!(report.failed > 0);
            assert!(store.is_dirty(&state));

            medium.fail_writes.store(false, Ordering::SeqCst);
            let report = store.flush(&state);
            assert_eq!(report.failed, 0);
            assert!(report.written > 0);
            assert!(!store.is_dirty(&state));
        }

        it "writes the initialized marker once onboarding is done" {
            let mut state = AppState::default();
            state.onboarding_completed = true;
            store.flush(&state);
            store.flush(&state);

            let marker_writes = medium
                .writes
                .lock()
                .unwrap()
                .iter()
                .filter(|k| **k == StoreKey::Initialized.storage_key())
                .count();
            assert_eq!(marker_writes, 1);
        }
    }

    describe "clear" {
        it "removes only odyssey keys" {
            store.flush(&sample_state());
            medium
                .values
                .lock()
                .unwrap()
                .insert("other_app".to_string(), "1".to_string());

            let removed = store.clear().expect("clear failed");
            assert_eq!(removed, 7);
            assert_eq!(medium.values.lock().unwrap().len(), 1);
        }
    }

    describe "sqlite" {
        it "persists across reopening the same file" {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("nested").join("odyssey.db");
            let state = sample_state();

            {
                let mut on_disk = PersistentStore::open(path.clone()).expect("open");
                on_disk.flush(&state);
            }

            let mut reopened = PersistentStore::open(path).expect("reopen");
            let restored = reopened.hydrate(AppState::default());
            assert_eq!(restored.project_idea, state.project_idea);
            assert_eq!(restored.logs.to_vec(), state.logs.to_vec());
        }

        it "shares one in-memory database between clones" {
            let sqlite = SqliteMedium::open_memory().expect("open");
            sqlite.migrate().expect("migrate");

            let mut writer = PersistentStore::new(sqlite.clone());
            writer.flush(&sample_state());

            let mut reader = PersistentStore::new(sqlite);
            assert_eq!(reader.hydrate(AppState::default()).xp, 1234);
        }

        it "upserts existing keys and clears by prefix" {
            let sqlite = SqliteMedium::open_memory().expect("open");
            sqlite.migrate().expect("migrate");

            sqlite.set("odyssey_xp", "1").expect("set");
            sqlite.set("odyssey_xp", "2").expect("set");
            assert_eq!(sqlite.get("odyssey_xp").expect("get"), Some("2".to_string()));

            sqlite.set("other_app_key", "x").expect("set");
            assert_eq!(sqlite.clear_prefix("odyssey_").expect("clear"), 1);
            assert_eq!(sqlite.get("odyssey_xp").expect("get"), None);
            assert_eq!(sqlite.get("other_app_key").expect("get"), Some("x".to_string()));
        }
    }
}
