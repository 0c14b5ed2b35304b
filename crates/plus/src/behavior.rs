//! Behaviors layered on the input dispatcher.

pub mod boss_key;
pub mod remap;
pub mod tabs;

use browser_plus_common::config::TabConfig;
use browser_plus_event::{input::InputPosition, key::Key};

use crate::{
    desktop::{BrowserCommand, Desktop, ObjectId, WindowId},
    query::{self, CloseDebounce},
};

/// State shared by the UI thread handlers.
pub struct Browser<D> {
    pub desktop: D,
    pub tabs: TabConfig,
    pub debounce: CloseDebounce,
}

impl<D: Desktop> Browser<D> {
    pub fn new(desktop: D, tabs: TabConfig) -> Self {
        Self {
            desktop,
            tabs,
            debounce: CloseDebounce::new(),
        }
    }

    /// Browser window under `point` with its top container.
    fn top_at(&self, point: InputPosition) -> Option<(WindowId, D::Node)> {
        let window = self.desktop.window_from_point(point)?;
        let top = query::top_container_view(&self.desktop, window)?;
        Some((window, top))
    }

    fn is_only_one_tab(&mut self, top: &D::Node) -> bool {
        let now = self.desktop.tick_count();
        query::is_only_one_tab(top, self.tabs.keep_last_tab, &mut self.debounce, now)
    }

    /// Whether the current tab of `window` shows a new tab page.
    fn is_on_new_tab(&self, window: WindowId, top: &D::Node) -> bool {
        if !self.tabs.new_tab_disable {
            return false;
        }

        if query::is_name_new_tab(top, self.tabs.new_tab_disable_names.as_slice()) {
            return true;
        }

        self.tabs.new_tab_check_document
            && self
                .desktop
                .accessible_object(window, ObjectId::Window)
                .is_some_and(|root| query::is_doc_new_tab(&root))
    }

    #[inline]
    fn is_pressed(&self, key: Key) -> bool {
        self.desktop.is_key_down(key)
    }

    fn command(&self, window: WindowId, command: BrowserCommand) {
        self.desktop
            .execute_command(self.desktop.root_window(window), command);
    }

    /// Replace the last tab instead of closing the window.
    fn keep_last_tab(&self, window: WindowId) {
        self.command(window, BrowserCommand::NewTab);
        self.command(window, BrowserCommand::CloseOtherTabs);
    }
}
