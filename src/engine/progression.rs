//! XP and roadmap progression rules.
//!
//! These are plain functions over the roadmap so the invariants live in one
//! place: at most one module is `Current`, progress never passes
//! [`MAX_PROGRESS`], and a module at 100 is `Completed`.

use crate::models::{Module, ModuleStatus, MAX_PROGRESS};

/// Result of [`advance_current_module`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// No module is current.
    NoCurrent,
    Progressed { module_id: String, progress: u8 },
    Completed { module_id: String },
}

/// Add `delta` to the current module's progress, completing it at 100.
pub fn advance_current_module(roadmap: &mut [Module], delta: u32) -> Advance {
    let Some(module) = roadmap.iter_mut().find(|m| m.is_current()) else {
        return Advance::NoCurrent;
    };

    let progress = u32::from(module.progress)
        .saturating_add(delta)
        .min(u32::from(MAX_PROGRESS));
    module.progress = progress as u8;
    if module.progress == MAX_PROGRESS {
        module.status = ModuleStatus::Completed;
        Advance::Completed {
            module_id: module.id.clone(),
        }
    } else {
        Advance::Progressed {
            module_id: module.id.clone(),
            progress: module.progress,
        }
    }
}

/// Make `module_id` the current module, demoting whichever module was
/// current before. Completed modules cannot become current again.
///
/// If the id appears more than once, only the first eligible entry is
/// promoted.
pub fn set_current_module(roadmap: &mut [Module], module_id: &str) -> bool {
    let Some(target) = roadmap
        .iter()
        .position(|m| m.id == module_id && m.status != ModuleStatus::Completed)
    else {
        return false;
    };

    for (idx, module) in roadmap.iter_mut().enumerate() {
        if idx == target {
            module.status = ModuleStatus::Current;
        } else if module.is_current() {
            module.status = ModuleStatus::Upcoming;
        }
    }
    true
}

/// Repair a roadmap loaded from storage. Returns true if anything changed.
///
/// Clamps progress, completes modules at 100, and keeps only the first
/// `Current` module.
pub fn normalize_roadmap(roadmap: &mut [Module]) -> bool {
    let mut changed = false;
    let mut seen_current = false;

    for module in roadmap.iter_mut() {
        if module.progress > MAX_PROGRESS {
            module.progress = MAX_PROGRESS;
            changed = true;
        }
        if module.progress == MAX_PROGRESS && module.status != ModuleStatus::Completed {
            module.status = ModuleStatus::Completed;
            changed = true;
        }
        if module.is_current() {
            if seen_current {
                module.status = ModuleStatus::Upcoming;
                changed = true;
            }
            seen_current = true;
        }
    }

    changed
}

/// Mean progress across the roadmap, rounded down.
pub fn roadmap_progress(roadmap: &[Module]) -> u8 {
    if roadmap.is_empty() {
        return 0;
    }
    let total: usize = roadmap.iter().map(|m| m.progress as usize).sum();
    (total / roadmap.len()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roadmap() -> Vec<Module> {
        vec![
            Module::new("m1", "One", ModuleStatus::Completed),
            Module::new("m2", "Two", ModuleStatus::Current).with_progress(90),
            Module::new("m3", "Three", ModuleStatus::Upcoming),
        ]
    }

    #[test]
    fn advance_clamps_and_completes() {
        let mut modules = roadmap();
        let result = advance_current_module(&mut modules, 15);

        assert_eq!(result, Advance::Completed { module_id: "m2".into() });
        assert_eq!(modules[1].progress, 100);
        assert_eq!(modules[1].status, ModuleStatus::Completed);
    }

    #[test]
    fn advance_below_cap_keeps_current() {
        let mut modules = roadmap();
        let result = advance_current_module(&mut modules, 5);

        assert_eq!(
            result,
            Advance::Progressed { module_id: "m2".into(), progress: 95 }
        );
        assert_eq!(modules[1].status, ModuleStatus::Current);
    }

    #[test]
    fn advance_without_current_is_noop() {
        let mut modules = roadmap();
        advance_current_module(&mut modules, 10);
        let before = modules.clone();

        assert_eq!(advance_current_module(&mut modules, 10), Advance::NoCurrent);
        assert_eq!(modules, before);
    }

    #[test]
    fn advance_never_overflows() {
        let mut modules = vec![Module::new("m", "M", ModuleStatus::Current).with_progress(99)];
        advance_current_module(&mut modules, u32::MAX);
        assert_eq!(modules[0].progress, 100);
    }

    #[test]
    fn set_current_demotes_previous() {
        let mut modules = roadmap();
        assert!(set_current_module(&mut modules, "m3"));

        assert_eq!(modules[1].status, ModuleStatus::Upcoming);
        assert_eq!(modules[2].status, ModuleStatus::Current);
        assert_eq!(modules.iter().filter(|m| m.is_current()).count(), 1);
    }

    #[test]
    fn set_current_rejects_completed_and_unknown() {
        let mut modules = roadmap();
        assert!(!set_current_module(&mut modules, "m1"));
        assert!(!set_current_module(&mut modules, "nope"));
        assert_eq!(modules, roadmap());
    }

    #[test]
    fn set_current_promotes_one_entry_for_duplicate_ids() {
        let mut modules = vec![
            Module::new("m1", "One", ModuleStatus::Current),
            Module::new("dup", "First copy", ModuleStatus::Upcoming),
            Module::new("dup", "Second copy", ModuleStatus::Upcoming),
        ];

        assert!(set_current_module(&mut modules, "dup"));

        let current: Vec<&str> = modules
            .iter()
            .filter(|m| m.is_current())
            .map(|m| m.title.as_str())
            .collect();
        assert_eq!(current, vec!["First copy"]);
    }

    #[test]
    fn normalize_keeps_first_current_only() {
        let mut modules = vec![
            Module::new("a", "A", ModuleStatus::Current),
            Module::new("b", "B", ModuleStatus::Current),
            Module {
                id: "c".into(),
                title: "C".into(),
                progress: 140,
                status: ModuleStatus::Upcoming,
            },
        ];

        assert!(normalize_roadmap(&mut modules));
        assert_eq!(modules[0].status, ModuleStatus::Current);
        assert_eq!(modules[1].status, ModuleStatus::Upcoming);
        assert_eq!(modules[2].progress, 100);
        assert_eq!(modules[2].status, ModuleStatus::Completed);
        assert!(!normalize_roadmap(&mut modules));
    }

    #[test]
    fn roadmap_progress_is_mean() {
        assert_eq!(roadmap_progress(&roadmap()), 63);
        assert_eq!(roadmap_progress(&[]), 0);
    }
}
