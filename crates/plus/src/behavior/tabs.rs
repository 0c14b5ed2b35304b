//! Tab strip mouse behaviors and tab related shortcuts.

use browser_plus_common::config::NewTabMode;
use browser_plus_event::{
    input::{
        CursorAction, CursorEvent, CursorInput, CursorInputState, InputEvent, InputPosition,
        KeyInputState, KeyboardInput,
    },
    key::{Key, Modifiers},
};
use tracing::debug;

use super::Browser;
use crate::{
    desktop::{BrowserCommand, Desktop, ObjectId, Tap, chord},
    input::{Disposition, InputHandler},
    query,
};

fn cursor(event: &InputEvent) -> Option<&CursorInput> {
    match event {
        InputEvent::Cursor(input) => Some(input),
        InputEvent::Keyboard(_) => None,
    }
}

fn key_down(event: &InputEvent) -> Option<&KeyboardInput> {
    match event {
        InputEvent::Keyboard(input) if input.state == KeyInputState::Pressed => Some(input),
        _ => None,
    }
}

/// Switch tabs with the wheel over the tab bar, or anywhere while the right button is held.
#[derive(Debug, Default)]
pub struct WheelSwitch {
    swallow_rbutton_up: bool,
}

impl WheelSwitch {
    fn on_wheel<D: Desktop>(
        &mut self,
        cx: &mut Browser<D>,
        point: InputPosition,
        delta: i16,
    ) -> Disposition {
        if !cx.tabs.wheel_tab && !cx.tabs.wheel_tab_when_press_rbutton {
            return Disposition::Pass;
        }

        let Some((window, top)) = cx.top_at(point) else {
            return Disposition::Pass;
        };

        let command = if delta > 0 {
            BrowserCommand::SelectPreviousTab
        } else {
            BrowserCommand::SelectNextTab
        };

        if cx.tabs.wheel_tab && query::is_on_the_tab_bar(&top, point) {
            cx.command(window, command);
            return Disposition::Consume;
        }

        if cx.tabs.wheel_tab_when_press_rbutton && cx.is_pressed(Key::RBUTTON) {
            // The right button release would open the context menu.
            self.swallow_rbutton_up = true;
            cx.command(window, command);
            return Disposition::Consume;
        }

        Disposition::Pass
    }
}

impl<D: Desktop> InputHandler<Browser<D>> for WheelSwitch {
    fn handle(&mut self, cx: &mut Browser<D>, event: &InputEvent) -> Disposition {
        let Some(input) = cursor(event) else {
            return Disposition::Pass;
        };

        match input.event {
            CursorEvent::Scroll { delta } => self.on_wheel(cx, input.point, delta),

            CursorEvent::Action {
                state: CursorInputState::Released,
                action: CursorAction::Right,
            } if self.swallow_rbutton_up => {
                self.swallow_rbutton_up = false;
                Disposition::Consume
            }

            _ => Disposition::Pass,
        }
    }
}

/// Close a tab by double clicking it.
#[derive(Debug, Default)]
pub struct DoubleClickClose;

impl<D: Desktop> InputHandler<Browser<D>> for DoubleClickClose {
    fn handle(&mut self, cx: &mut Browser<D>, event: &InputEvent) -> Disposition {
        let Some(input) = cursor(event) else {
            return Disposition::Pass;
        };
        if input.action_state(CursorAction::Left)
            != Some(CursorInputState::Pressed { double_click: true })
        {
            return Disposition::Pass;
        }

        let Some((window, top)) = cx.top_at(input.point) else {
            return Disposition::Pass;
        };
        if !query::is_on_one_tab(&top, input.point) {
            return Disposition::Pass;
        }

        if cx.is_only_one_tab(&top) {
            cx.keep_last_tab(window);
        } else {
            cx.command(window, BrowserCommand::CloseTab);
        }

        Disposition::Consume
    }
}

/// Close a tab by right clicking it. Holding Shift opens the context menu instead.
#[derive(Debug, Default)]
pub struct RightClickClose;

impl<D: Desktop> InputHandler<Browser<D>> for RightClickClose {
    fn handle(&mut self, cx: &mut Browser<D>, event: &InputEvent) -> Disposition {
        let Some(input) = cursor(event) else {
            return Disposition::Pass;
        };
        if input.action_state(CursorAction::Right) != Some(CursorInputState::Released)
            || cx.is_pressed(Key::SHIFT)
        {
            return Disposition::Pass;
        }

        let Some((window, top)) = cx.top_at(input.point) else {
            return Disposition::Pass;
        };
        if !query::is_on_one_tab(&top, input.point) {
            return Disposition::Pass;
        }

        if cx.is_only_one_tab(&top) {
            cx.keep_last_tab(window);
        } else {
            // Middle click closes exactly the pointed tab.
            cx.desktop.send_input(&chord([], Tap::MiddleClick));
        }

        Disposition::Consume
    }
}

/// Keep the window open when the last tab is middle clicked.
#[derive(Debug, Default)]
pub struct MiddleClickKeep;

impl<D: Desktop> InputHandler<Browser<D>> for MiddleClickKeep {
    fn handle(&mut self, cx: &mut Browser<D>, event: &InputEvent) -> Disposition {
        let Some(input) = cursor(event) else {
            return Disposition::Pass;
        };
        if input.action_state(CursorAction::Middle) != Some(CursorInputState::Released) {
            return Disposition::Pass;
        }

        let Some((window, top)) = cx.top_at(input.point) else {
            return Disposition::Pass;
        };
        if query::is_on_one_tab(&top, input.point) && cx.is_only_one_tab(&top) {
            cx.keep_last_tab(window);
            return Disposition::Consume;
        }

        Disposition::Pass
    }
}

/// Open bookmarks in a new tab on left click.
///
/// Covers the bookmark bar, expanded bookmark folders and bookmark menus. Clicks
/// with Ctrl or Shift held, clicks on the find bar and clicks while the current tab
/// is a new tab page keep their default behavior.
#[derive(Debug, Default)]
pub struct BookmarkNewTab;

impl BookmarkNewTab {
    fn is_on_link<D: Desktop>(cx: &Browser<D>, top: &D::Node, point: InputPosition) -> bool {
        if query::is_on_bookmark(top, point) {
            return true;
        }

        let Some(pointed) = cx.desktop.window_from_point(point) else {
            return false;
        };
        let is_browser_popup = cx
            .desktop
            .class_name(pointed)
            .is_some_and(|class| class.starts_with(query::BROWSER_WINDOW_CLASS_PREFIX));
        if !is_browser_popup {
            return false;
        }

        cx.desktop
            .accessible_object(pointed, ObjectId::Window)
            .is_some_and(|root| {
                query::is_on_expanded_list(&root, point)
                    || query::is_on_menu_bookmark(&root, point)
            })
    }
}

impl<D: Desktop> InputHandler<Browser<D>> for BookmarkNewTab {
    fn handle(&mut self, cx: &mut Browser<D>, event: &InputEvent) -> Disposition {
        let Some(input) = cursor(event) else {
            return Disposition::Pass;
        };
        if input.action_state(CursorAction::Left) != Some(CursorInputState::Released)
            || cx.is_pressed(Key::CONTROL)
            || cx.is_pressed(Key::SHIFT)
        {
            return Disposition::Pass;
        }

        let held = match cx.tabs.bookmark_new_tab {
            NewTabMode::Disabled => return Disposition::Pass,
            NewTabMode::Foreground => Modifiers::SHIFT,
            NewTabMode::Background => Modifiers::empty(),
        };

        let Some(window) = cx.desktop.foreground_window() else {
            return Disposition::Pass;
        };
        let Some(top) = query::top_container_view(&cx.desktop, window) else {
            return Disposition::Pass;
        };

        if !Self::is_on_link(cx, &top, input.point)
            || cx.is_on_new_tab(window, &top)
            || query::is_on_find_bar_pane(&cx.desktop, input.point)
        {
            return Disposition::Pass;
        }

        debug!("opening bookmark at {:?} in a new tab", input.point);
        cx.desktop
            .send_input(&chord(held.keys(), Tap::MiddleClick));
        Disposition::Consume
    }
}

/// Ctrl+W and Ctrl+F4 replace the last tab instead of closing the window.
#[derive(Debug, Default)]
pub struct KeepLastTabShortcut;

impl<D: Desktop> InputHandler<Browser<D>> for KeepLastTabShortcut {
    fn handle(&mut self, cx: &mut Browser<D>, event: &InputEvent) -> Disposition {
        let Some(input) = key_down(event) else {
            return Disposition::Pass;
        };
        let is_close = input.key == Key::F4 || Key::alphanumeric('W') == Some(input.key);
        if !is_close || !cx.is_pressed(Key::CONTROL) {
            return Disposition::Pass;
        }

        let Some(window) = cx.desktop.focus_window() else {
            return Disposition::Pass;
        };
        let Some(top) = query::top_container_view(&cx.desktop, window) else {
            return Disposition::Pass;
        };

        if cx.is_only_one_tab(&top) {
            cx.keep_last_tab(window);
            return Disposition::Consume;
        }

        Disposition::Pass
    }
}

/// Enter in the omnibox opens the typed address in a new tab.
#[derive(Debug, Default)]
pub struct OmniboxNewTab;

impl<D: Desktop> InputHandler<Browser<D>> for OmniboxNewTab {
    fn handle(&mut self, cx: &mut Browser<D>, event: &InputEvent) -> Disposition {
        let Some(input) = key_down(event) else {
            return Disposition::Pass;
        };
        if input.key != Key::RETURN || cx.is_pressed(Key::MENU) {
            return Disposition::Pass;
        }

        let held = match cx.tabs.open_url_new_tab {
            NewTabMode::Disabled => return Disposition::Pass,
            NewTabMode::Foreground => Modifiers::ALT,
            NewTabMode::Background => Modifiers::SHIFT | Modifiers::ALT,
        };

        let Some(window) = cx.desktop.foreground_window() else {
            return Disposition::Pass;
        };
        let Some(top) = query::top_container_view(&cx.desktop, window) else {
            return Disposition::Pass;
        };
        if !query::is_omnibox_focus(&top) || cx.is_on_new_tab(window, &top) {
            return Disposition::Pass;
        }

        cx.desktop
            .send_input(&chord(held.keys(), Tap::Key(Key::RETURN)));
        Disposition::Consume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_plus_common::config::TabConfig;
    use browser_plus_event::input::{CursorInput, SYNTHETIC_INPUT_MARKER};

    use crate::{
        accessibility::{Accessible, Rect, Role},
        desktop::{
            Stroke,
            mock::{
                Action, BOOKMARK, BROWSER_WINDOW, BrowserFixture, FIND_BAR, FOLDER_LINK,
                FOLDER_SUBFOLDER, MockDesktop, OMNIBOX, center, tab_point,
            },
        },
        input::{Dispatcher, Priority},
    };

    fn browser(fixture: BrowserFixture, tabs: TabConfig) -> Browser<MockDesktop> {
        Browser::new(fixture.desktop, tabs)
    }

    fn run(
        cx: &mut Browser<MockDesktop>,
        handler: &mut impl InputHandler<Browser<MockDesktop>>,
        event: impl Into<InputEvent>,
    ) -> Disposition {
        handler.handle(cx, &event.into())
    }

    fn commands(cx: &Browser<MockDesktop>) -> Vec<Action> {
        cx.desktop.take_actions()
    }

    fn cmd(command: BrowserCommand) -> Action {
        Action::Command(BROWSER_WINDOW, command)
    }

    #[test]
    fn double_click_on_last_tab_replaces_it() {
        let mut cx = browser(BrowserFixture::new(&["only"]), TabConfig::default());

        let res = run(
            &mut cx,
            &mut DoubleClickClose,
            CursorInput::double_clicked(CursorAction::Left, tab_point(0)),
        );

        assert_eq!(res, Disposition::Consume);
        assert_eq!(
            commands(&cx),
            [
                cmd(BrowserCommand::NewTab),
                cmd(BrowserCommand::CloseOtherTabs)
            ]
        );
    }

    #[test]
    fn double_click_closes_tab_when_others_remain() {
        let mut cx = browser(BrowserFixture::new(&["a", "b", "c"]), TabConfig::default());

        let res = run(
            &mut cx,
            &mut DoubleClickClose,
            CursorInput::double_clicked(CursorAction::Left, tab_point(1)),
        );
        assert_eq!(res, Disposition::Consume);
        assert_eq!(commands(&cx), [cmd(BrowserCommand::CloseTab)]);

        let res = run(
            &mut cx,
            &mut DoubleClickClose,
            CursorInput::pressed(CursorAction::Left, tab_point(1)),
        );
        assert_eq!(res, Disposition::Pass);

        let res = run(
            &mut cx,
            &mut DoubleClickClose,
            CursorInput::double_clicked(CursorAction::Left, center(OMNIBOX)),
        );
        assert_eq!(res, Disposition::Pass);
        assert!(commands(&cx).is_empty());
    }

    #[test]
    fn right_click_closes_pointed_tab_directly() {
        let tabs = TabConfig {
            right_click_close: true,
            ..TabConfig::default()
        };
        let mut cx = browser(BrowserFixture::new(&["a", "b"]), tabs);

        let res = run(
            &mut cx,
            &mut RightClickClose,
            CursorInput::released(CursorAction::Right, tab_point(0)),
        );

        assert_eq!(res, Disposition::Consume);
        assert_eq!(
            commands(&cx),
            [Action::Input(vec![Stroke::MiddleDown, Stroke::MiddleUp])]
        );
    }

    #[test]
    fn shift_bypasses_right_click_close() {
        let mut cx = browser(BrowserFixture::new(&["a", "b"]), TabConfig::default());
        cx.desktop.press(Key::SHIFT);

        let res = run(
            &mut cx,
            &mut RightClickClose,
            CursorInput::released(CursorAction::Right, tab_point(0)),
        );
        assert_eq!(res, Disposition::Pass);
        assert!(commands(&cx).is_empty());
    }

    #[test]
    fn wheel_over_tab_bar_switches_tabs() {
        let mut cx = browser(BrowserFixture::new(&["a", "b"]), TabConfig::default());
        let mut handler = WheelSwitch::default();

        let res = run(&mut cx, &mut handler, CursorInput::scrolled(-120, tab_point(4)));
        assert_eq!(res, Disposition::Consume);
        assert_eq!(commands(&cx), [cmd(BrowserCommand::SelectNextTab)]);

        let res = run(&mut cx, &mut handler, CursorInput::scrolled(120, tab_point(0)));
        assert_eq!(res, Disposition::Consume);
        assert_eq!(commands(&cx), [cmd(BrowserCommand::SelectPreviousTab)]);

        let res = run(&mut cx, &mut handler, CursorInput::scrolled(-120, center(OMNIBOX)));
        assert_eq!(res, Disposition::Pass);
        assert!(commands(&cx).is_empty());
    }

    #[test]
    fn wheel_with_right_button_swallows_the_release() {
        let mut cx = browser(BrowserFixture::new(&["a", "b"]), TabConfig::default());
        let mut handler = WheelSwitch::default();
        cx.desktop.press(Key::RBUTTON);

        let res = run(&mut cx, &mut handler, CursorInput::scrolled(-120, center(OMNIBOX)));
        assert_eq!(res, Disposition::Consume);
        assert_eq!(commands(&cx), [cmd(BrowserCommand::SelectNextTab)]);

        cx.desktop.release(Key::RBUTTON);
        let up = CursorInput::released(CursorAction::Right, center(OMNIBOX));
        assert_eq!(run(&mut cx, &mut handler, up), Disposition::Consume);
        assert_eq!(run(&mut cx, &mut handler, up), Disposition::Pass);
    }

    #[test]
    fn middle_click_on_last_tab_keeps_window() {
        let mut cx = browser(BrowserFixture::new(&["only"]), TabConfig::default());

        let up = CursorInput::released(CursorAction::Middle, tab_point(0));
        assert_eq!(run(&mut cx, &mut MiddleClickKeep, up), Disposition::Consume);
        assert_eq!(
            commands(&cx),
            [
                cmd(BrowserCommand::NewTab),
                cmd(BrowserCommand::CloseOtherTabs)
            ]
        );

        let mut cx = browser(
            BrowserFixture::new(&["only"]),
            TabConfig {
                keep_last_tab: false,
                ..TabConfig::default()
            },
        );
        assert_eq!(run(&mut cx, &mut MiddleClickKeep, up), Disposition::Pass);
        assert!(commands(&cx).is_empty());
    }

    #[test]
    fn bookmark_opens_in_new_tab() {
        let tabs = TabConfig {
            bookmark_new_tab: NewTabMode::Foreground,
            ..TabConfig::default()
        };
        let mut cx = browser(BrowserFixture::new(&["Example"]), tabs);

        let up = CursorInput::released(CursorAction::Left, center(BOOKMARK));
        assert_eq!(run(&mut cx, &mut BookmarkNewTab, up), Disposition::Consume);
        assert_eq!(
            commands(&cx),
            [Action::Input(vec![
                Stroke::KeyDown(Key::SHIFT),
                Stroke::MiddleDown,
                Stroke::MiddleUp,
                Stroke::KeyUp(Key::SHIFT),
            ])]
        );

        cx.desktop.press(Key::CONTROL);
        assert_eq!(run(&mut cx, &mut BookmarkNewTab, up), Disposition::Pass);
        cx.desktop.release(Key::CONTROL);

        let script = CursorInput::released(CursorAction::Left, InputPosition::new(150, 95));
        assert_eq!(run(&mut cx, &mut BookmarkNewTab, script), Disposition::Pass);
        assert!(commands(&cx).is_empty());
    }

    #[test]
    fn folder_link_opens_in_new_tab() {
        let fixture = BrowserFixture::new(&["Example"]);
        fixture.open_folder();
        let tabs = TabConfig {
            bookmark_new_tab: NewTabMode::Background,
            ..TabConfig::default()
        };
        let mut cx = browser(fixture, tabs);

        let up = CursorInput::released(CursorAction::Left, center(FOLDER_LINK));
        assert_eq!(run(&mut cx, &mut BookmarkNewTab, up), Disposition::Consume);
        assert_eq!(
            commands(&cx),
            [Action::Input(vec![Stroke::MiddleDown, Stroke::MiddleUp])]
        );

        let up = CursorInput::released(CursorAction::Left, center(FOLDER_SUBFOLDER));
        assert_eq!(run(&mut cx, &mut BookmarkNewTab, up), Disposition::Pass);
        assert!(commands(&cx).is_empty());
    }

    #[test]
    fn bookmark_on_new_tab_page_keeps_default() {
        let tabs = TabConfig {
            bookmark_new_tab: NewTabMode::Background,
            ..TabConfig::default()
        };
        let mut cx = browser(BrowserFixture::new(&["New Tab"]), tabs.clone());
        let up = CursorInput::released(CursorAction::Left, center(BOOKMARK));
        assert_eq!(run(&mut cx, &mut BookmarkNewTab, up), Disposition::Pass);

        let mut cx = browser(
            BrowserFixture::new(&["New Tab"]),
            TabConfig {
                new_tab_disable: false,
                ..tabs
            },
        );
        assert_eq!(run(&mut cx, &mut BookmarkNewTab, up), Disposition::Consume);
        assert_eq!(
            commands(&cx),
            [Action::Input(vec![Stroke::MiddleDown, Stroke::MiddleUp])]
        );
    }

    #[test]
    fn bookmark_click_in_find_bar_is_ignored() {
        let fixture = BrowserFixture::new(&["Example"]);
        fixture.open_find_bar();
        let tree = &fixture.desktop.tree;
        let link = tree
            .node("result", Role::PUSH_BUTTON)
            .with_description("https://example.com/")
            .at(Rect::new(600, 120, 700, 140));
        fixture.bookmark.parent().unwrap().append(&link);
        drop(link);

        let tabs = TabConfig {
            bookmark_new_tab: NewTabMode::Foreground,
            ..TabConfig::default()
        };
        let mut cx = browser(fixture, tabs);
        let up = CursorInput::released(CursorAction::Left, center(FIND_BAR));
        assert_eq!(run(&mut cx, &mut BookmarkNewTab, up), Disposition::Pass);
        assert!(commands(&cx).is_empty());
    }

    #[test]
    fn ctrl_w_on_last_tab_keeps_window() {
        let mut cx = browser(BrowserFixture::new(&["only"]), TabConfig::default());
        let w = Key::alphanumeric('W').unwrap();

        let down = KeyboardInput::new(w, KeyInputState::Pressed);
        assert_eq!(run(&mut cx, &mut KeepLastTabShortcut, down), Disposition::Pass);

        cx.desktop.press(Key::CONTROL);
        assert_eq!(run(&mut cx, &mut KeepLastTabShortcut, down), Disposition::Consume);
        assert_eq!(
            commands(&cx),
            [
                cmd(BrowserCommand::NewTab),
                cmd(BrowserCommand::CloseOtherTabs)
            ]
        );

        let up = KeyboardInput::new(Key::F4, KeyInputState::Released);
        assert_eq!(run(&mut cx, &mut KeepLastTabShortcut, up), Disposition::Pass);
    }

    #[test]
    fn ctrl_w_with_tabs_left_closes_normally() {
        let mut cx = browser(BrowserFixture::new(&["a", "b", "c"]), TabConfig::default());
        cx.desktop.press(Key::CONTROL);

        let down = KeyboardInput::new(Key::F4, KeyInputState::Pressed);
        assert_eq!(run(&mut cx, &mut KeepLastTabShortcut, down), Disposition::Pass);
        assert!(commands(&cx).is_empty());
    }

    #[test]
    fn enter_in_omnibox_opens_new_tab() {
        let fixture = BrowserFixture::new(&["Example"]);
        fixture.focus_omnibox();
        let tabs = TabConfig {
            open_url_new_tab: NewTabMode::Background,
            ..TabConfig::default()
        };
        let mut cx = browser(fixture, tabs);

        let enter = KeyboardInput::new(Key::RETURN, KeyInputState::Pressed);
        assert_eq!(run(&mut cx, &mut OmniboxNewTab, enter), Disposition::Consume);
        assert_eq!(
            commands(&cx),
            [Action::Input(vec![
                Stroke::KeyDown(Key::SHIFT),
                Stroke::KeyDown(Key::MENU),
                Stroke::KeyDown(Key::RETURN),
                Stroke::KeyUp(Key::RETURN),
                Stroke::KeyUp(Key::MENU),
                Stroke::KeyUp(Key::SHIFT),
            ])]
        );
    }

    #[test]
    fn enter_outside_omnibox_passes() {
        let tabs = TabConfig {
            open_url_new_tab: NewTabMode::Foreground,
            ..TabConfig::default()
        };
        let mut cx = browser(BrowserFixture::new(&["Example"]), tabs);

        let enter = KeyboardInput::new(Key::RETURN, KeyInputState::Pressed);
        assert_eq!(run(&mut cx, &mut OmniboxNewTab, enter), Disposition::Pass);
        assert!(commands(&cx).is_empty());
    }

    #[test]
    fn dispatcher_scenarios() {
        let cx = browser(BrowserFixture::new(&["a", "b"]), TabConfig::default());
        let mut dispatcher = Dispatcher::with_drag_threshold(cx.desktop.drag_threshold());
        dispatcher.register(Priority::NORMAL, WheelSwitch::default());
        dispatcher.register(Priority::NORMAL, DoubleClickClose);
        let mut pipeline = crate::input::Pipeline::new(cx, dispatcher);

        let wheel = CursorInput::scrolled(-120, tab_point(1));
        assert_eq!(pipeline.dispatch(&wheel.into()), Disposition::Consume);
        assert_eq!(
            pipeline.state.desktop.take_actions(),
            [cmd(BrowserCommand::SelectNextTab)]
        );

        let mut synthetic = CursorInput::double_clicked(CursorAction::Left, tab_point(0));
        synthetic.extra_info = SYNTHETIC_INPUT_MARKER;
        assert_eq!(pipeline.dispatch(&synthetic.into()), Disposition::Pass);
        assert!(pipeline.state.desktop.take_actions().is_empty());
    }

}
