//! Active tab, roadmap deep link, and the mobile menu flag.

use crate::models::{DeepLink, Module, Tab};

#[derive(Debug, Clone, Default)]
pub struct Router {
    active_tab: Tab,
    deep_link: DeepLink,
    mobile_menu_open: bool,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn deep_link(&self) -> &DeepLink {
        &self.deep_link
    }

    pub fn mobile_menu_open(&self) -> bool {
        self.mobile_menu_open
    }

    /// Switch tabs. Returns true only when the tab actually changed.
    ///
    /// Any navigation closes the mobile menu.
    pub fn navigate(&mut self, tab: Tab) -> bool {
        self.mobile_menu_open = false;
        if self.active_tab == tab {
            return false;
        }
        self.active_tab = tab;
        true
    }

    pub fn set_deep_link_module(&mut self, module_id: impl Into<String>) {
        self.deep_link.module_id = Some(module_id.into());
    }

    pub fn set_deep_link_day(&mut self, day: u32) {
        self.deep_link.day = Some(day);
    }

    pub fn set_mobile_menu(&mut self, open: bool) {
        self.mobile_menu_open = open;
    }

    /// Module the roadmap should focus on.
    ///
    /// A deep-linked id that is not on the roadmap falls back to the current
    /// module, then to the first module.
    pub fn focused_module<'a>(&self, roadmap: &'a [Module]) -> Option<&'a Module> {
        self.deep_link
            .module_id
            .as_deref()
            .and_then(|id| roadmap.iter().find(|m| m.id == id))
            .or_else(|| roadmap.iter().find(|m| m.is_current()))
            .or_else(|| roadmap.first())
    }
}

/// Console line recorded when the active tab changes.
pub fn navigation_log_line(tab: Tab) -> String {
    format!("INTERFACE_SHIFT: NAVIGATED_TO_{}", tab.as_str().to_uppercase())
}
