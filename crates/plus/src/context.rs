use std::sync::Arc;

use browser_plus_common::Config;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    behavior::{
        Browser,
        boss_key::BossKey,
        remap::KeyRemapper,
        tabs::{
            BookmarkNewTab, DoubleClickClose, KeepLastTabShortcut, MiddleClickKeep,
            OmniboxNewTab, RightClickClose, WheelSwitch,
        },
    },
    desktop::Desktop,
    input::{Dispatcher, Pipeline, Priority},
};

/// Everything the hooks need, built once from the configuration.
pub struct Context<D> {
    pub config: Arc<Config>,
    /// Mouse and keyboard hooks of the UI thread.
    pub ui: Mutex<Pipeline<Browser<D>>>,
    /// Low-level keyboard hook of the hotkey thread.
    pub keys: Mutex<Pipeline<D>>,
    pub boss_key: Mutex<BossKey>,
}

impl<D: Desktop + Clone> Context<D> {
    pub fn new(config: Arc<Config>, desktop: D) -> Self {
        let tabs = &config.tabs;

        let mut ui = Dispatcher::with_drag_threshold(desktop.drag_threshold());
        if tabs.wheel_tab || tabs.wheel_tab_when_press_rbutton {
            // must see the right button release before right click close
            ui.register(Priority::HIGH, WheelSwitch::default());
        }
        if tabs.double_click_close {
            ui.register(Priority::NORMAL, DoubleClickClose);
        }
        if tabs.right_click_close {
            ui.register(Priority::NORMAL, RightClickClose);
        }
        if tabs.keep_last_tab {
            ui.register(Priority::NORMAL, MiddleClickKeep);
            ui.register(Priority::NORMAL, KeepLastTabShortcut);
        }
        if tabs.bookmark_new_tab.is_enabled() {
            ui.register(Priority::LOW, BookmarkNewTab);
        }
        if tabs.open_url_new_tab.is_enabled() {
            ui.register(Priority::LOW, OmniboxNewTab);
        }

        let mut keys = Dispatcher::new();
        if !config.general.key_mapping.is_empty() {
            keys.register(
                Priority::NORMAL,
                KeyRemapper::new(config.general.key_mapping.clone()),
            );
        }
        debug!(ui = ui.len(), keys = keys.len(), "input handlers registered");

        Self {
            ui: Mutex::new(Pipeline::new(
                Browser::new(desktop.clone(), tabs.clone()),
                ui,
            )),
            keys: Mutex::new(Pipeline::new(desktop, keys)),
            boss_key: Mutex::new(BossKey::new()),
            config,
        }
    }

    pub fn has_ui_handlers(&self) -> bool {
        !self.ui.lock().dispatcher.is_empty()
    }

    pub fn has_key_handlers(&self) -> bool {
        !self.keys.lock().dispatcher.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_plus_event::{
        input::{CursorAction, CursorInput, InputPosition, KeyInputState, KeyboardInput},
        key::Key,
    };

    use crate::{
        desktop::{
            BrowserCommand,
            mock::{Action, BROWSER_WINDOW, BrowserFixture, MockDesktop, tab_point},
        },
        input::Disposition,
    };

    fn context(ini: &str, fixture: BrowserFixture) -> (Context<MockDesktop>, MockDesktop) {
        let config = Arc::new(Config::parse(ini).unwrap());
        let desktop = fixture.desktop.clone();
        (Context::new(config, fixture.desktop), desktop)
    }

    #[test]
    fn registers_handlers_from_configuration() {
        let (cx, _) = context(
            "[tabs]\ndouble_click_close=0\nkeep_last_tab=0\nwheel_tab=0\nwheel_tab_when_press_rbutton=0\n",
            BrowserFixture::new(&["a"]),
        );
        assert!(!cx.has_ui_handlers());
        assert!(!cx.has_key_handlers());

        let (cx, _) = context(
            "[general]\nkey_mapping=F1=Ctrl+T\n",
            BrowserFixture::new(&["a"]),
        );
        assert!(cx.has_ui_handlers());
        assert!(cx.has_key_handlers());
    }

    #[test]
    fn wheel_gesture_wins_over_right_click_close() {
        let (cx, desktop) = context(
            "[tabs]\nright_click_close=1\n",
            BrowserFixture::new(&["a", "b", "c"]),
        );
        let mut ui = cx.ui.lock();

        // over the page, away from the tab bar
        desktop.press(Key::RBUTTON);
        let wheel = CursorInput::scrolled(-120, InputPosition::new(400, 300));
        assert_eq!(ui.dispatch(&wheel.into()), Disposition::Consume);
        desktop.release(Key::RBUTTON);

        let up = CursorInput::released(CursorAction::Right, tab_point(1));
        assert_eq!(ui.dispatch(&up.into()), Disposition::Consume);
        assert_eq!(
            desktop.take_actions(),
            [Action::Command(BROWSER_WINDOW, BrowserCommand::SelectNextTab)]
        );

        // next release closes the tab
        assert_eq!(ui.dispatch(&up.into()), Disposition::Consume);
        assert!(matches!(desktop.take_actions()[..], [Action::Input(_)]));
    }

    #[test]
    fn closing_two_tabs_in_quick_succession_keeps_window() {
        let (cx, desktop) = context("", BrowserFixture::new(&["a", "b"]));
        let mut ui = cx.ui.lock();

        let close = KeyboardInput::new(Key::F4, KeyInputState::Pressed);
        desktop.press(Key::CONTROL);

        // host closes the tab itself
        assert_eq!(ui.dispatch(&close.into()), Disposition::Pass);

        // count not yet updated when the next close arrives
        desktop.advance(120);
        assert_eq!(ui.dispatch(&close.into()), Disposition::Consume);
        assert_eq!(
            desktop.take_actions(),
            [
                Action::Command(BROWSER_WINDOW, BrowserCommand::NewTab),
                Action::Command(BROWSER_WINDOW, BrowserCommand::CloseOtherTabs),
            ]
        );
    }

    #[test]
    fn remapper_runs_on_key_pipeline() {
        let (cx, desktop) = context(
            "[general]\nkey_mapping=F2=Ctrl+Shift+T\n",
            BrowserFixture::new(&["a"]),
        );

        let down = KeyboardInput::new(Key::function(2).unwrap(), KeyInputState::Pressed);
        assert_eq!(cx.keys.lock().dispatch(&down.into()), Disposition::Consume);
        assert_eq!(desktop.take_actions().len(), 1);
    }
}
