//! Seam between behavior logic and the windowing system.
//!
//! Behaviors and queries only talk to a [`Desktop`]. The Win32 implementation lives
//! in `backend`; tests drive the same code with a recording mock.

#[cfg(test)]
pub(crate) mod mock;

use browser_plus_event::{input::InputPosition, key::Key};

use crate::accessibility::Accessible;

/// Opaque top-level or child window handle.
pub type WindowId = isize;

/// Which accessibility root of a window to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectId {
    /// The window frame, including non-client area.
    Window,
    /// The client area only.
    Client,
}

/// Browser commands issued through `WM_SYSCOMMAND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserCommand {
    NewTab,
    CloseTab,
    SelectNextTab,
    SelectPreviousTab,
    CloseOtherTabs,
}

impl BrowserCommand {
    /// Command identifier understood by the browser frame.
    pub const fn id(self) -> usize {
        match self {
            BrowserCommand::NewTab => 34014,
            BrowserCommand::CloseTab => 34015,
            BrowserCommand::SelectNextTab => 34016,
            BrowserCommand::SelectPreviousTab => 34017,
            BrowserCommand::CloseOtherTabs => 35023,
        }
    }
}

/// One synthesized input step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    KeyDown(Key),
    KeyUp(Key),
    MiddleDown,
    MiddleUp,
}

/// What a chord taps while its modifiers are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap {
    Key(Key),
    MiddleClick,
}

/// Press `held` in order, tap, then release `held` in reverse order.
pub fn chord(held: impl IntoIterator<Item = Key>, tap: Tap) -> Vec<Stroke> {
    let held: Vec<Key> = held.into_iter().collect();

    let mut strokes = Vec::with_capacity(held.len() * 2 + 2);
    strokes.extend(held.iter().copied().map(Stroke::KeyDown));
    match tap {
        Tap::Key(key) => strokes.extend([Stroke::KeyDown(key), Stroke::KeyUp(key)]),
        Tap::MiddleClick => strokes.extend([Stroke::MiddleDown, Stroke::MiddleUp]),
    }
    strokes.extend(held.iter().rev().copied().map(Stroke::KeyUp));

    strokes
}

pub trait Desktop {
    type Node: Accessible;

    fn accessible_object(&self, window: WindowId, object: ObjectId) -> Option<Self::Node>;

    fn class_name(&self, window: WindowId) -> Option<String>;

    fn foreground_window(&self) -> Option<WindowId>;

    /// Window with keyboard focus on the calling thread.
    fn focus_window(&self) -> Option<WindowId>;

    fn window_from_point(&self, point: InputPosition) -> Option<WindowId>;

    /// Top-level ancestor of `window`.
    fn root_window(&self, window: WindowId) -> WindowId;

    fn is_key_down(&self, key: Key) -> bool;

    /// Milliseconds since an arbitrary fixed point.
    fn tick_count(&self) -> u64;

    /// Distance in pixels a pressed cursor may travel before it counts as a drag.
    fn drag_threshold(&self) -> (i32, i32);

    /// Ask the browser frame to run a command, waiting a bounded time for it.
    fn execute_command(&self, window: WindowId, command: BrowserCommand);

    /// Inject input tagged with the synthetic marker.
    fn send_input(&self, strokes: &[Stroke]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_plus_event::key::Modifiers;

    #[test]
    fn chord_releases_in_reverse_order() {
        let strokes = chord(
            (Modifiers::SHIFT | Modifiers::ALT).keys(),
            Tap::Key(Key::RETURN),
        );

        assert_eq!(
            strokes,
            [
                Stroke::KeyDown(Key::SHIFT),
                Stroke::KeyDown(Key::MENU),
                Stroke::KeyDown(Key::RETURN),
                Stroke::KeyUp(Key::RETURN),
                Stroke::KeyUp(Key::MENU),
                Stroke::KeyUp(Key::SHIFT),
            ]
        );

        assert_eq!(
            chord([], Tap::MiddleClick),
            [Stroke::MiddleDown, Stroke::MiddleUp]
        );
    }

    #[test]
    fn command_ids() {
        assert_eq!(BrowserCommand::NewTab.id(), 34014);
        assert_eq!(BrowserCommand::CloseOtherTabs.id(), 35023);
    }
}
