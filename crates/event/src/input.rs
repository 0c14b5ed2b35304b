//! Input event types.
//!
//! Only the inputs the behavior handlers react to are described. Cursor moves are
//! filtered out by the hook glue before an event is built.

use crate::key::Key;

/// Marker carried in the extra-info field of every input this crate family synthesizes.
///
/// Events tagged with it are passed through untouched so injected input never
/// re-triggers a handler.
pub const SYNTHETIC_INPUT_MARKER: usize = 0x4250_4C53;

/// Describe an input event captured by a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A cursor input.
    Cursor(CursorInput),
    /// A keyboard input.
    Keyboard(KeyboardInput),
}

impl InputEvent {
    /// Extra info the input was delivered with.
    pub const fn extra_info(&self) -> usize {
        match self {
            InputEvent::Cursor(input) => input.extra_info,
            InputEvent::Keyboard(input) => input.extra_info,
        }
    }

    #[inline]
    pub const fn is_synthetic(&self) -> bool {
        self.extra_info() == SYNTHETIC_INPUT_MARKER
    }
}

/// Describe a cursor related input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorInput {
    /// The type of cursor input.
    pub event: CursorEvent,
    /// Cursor position in screen coordinates.
    pub point: InputPosition,
    pub extra_info: usize,
}

/// Describe a cursor event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorEvent {
    /// A cursor button is pressed or released.
    Action {
        /// The state of the input.
        state: CursorInputState,

        /// The button for this action.
        action: CursorAction,
    },

    /// Vertical wheel is scrolled.
    Scroll {
        /// The scroll delta. Positive value means scrolling away from the user.
        delta: i16,
    },
}

/// Describe the state of a cursor button input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorInputState {
    /// Button is pressed down.
    Pressed {
        /// Whether if this press is the second click of a double click.
        double_click: bool,
    },

    /// Button is released.
    Released,
}

/// Describe a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorAction {
    /// Left button
    Left,

    /// Right button
    Right,

    /// Wheel button
    Middle,
}

/// Describe a keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardInput {
    /// The key code of the input.
    pub key: Key,

    /// The state of the key input.
    pub state: KeyInputState,

    pub extra_info: usize,
}

/// Describe the state of a key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInputState {
    /// The key is pressed down.
    Pressed,

    /// The key is released.
    Released,
}

/// Describe a 2D position for cursor input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InputPosition {
    /// X position in pixels.
    pub x: i32,

    /// Y position in pixels.
    pub y: i32,
}

impl InputPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl CursorInput {
    pub const fn new(event: CursorEvent, point: InputPosition) -> Self {
        Self {
            event,
            point,
            extra_info: 0,
        }
    }

    pub const fn pressed(action: CursorAction, point: InputPosition) -> Self {
        Self::new(
            CursorEvent::Action {
                state: CursorInputState::Pressed {
                    double_click: false,
                },
                action,
            },
            point,
        )
    }

    pub const fn double_clicked(action: CursorAction, point: InputPosition) -> Self {
        Self::new(
            CursorEvent::Action {
                state: CursorInputState::Pressed { double_click: true },
                action,
            },
            point,
        )
    }

    pub const fn released(action: CursorAction, point: InputPosition) -> Self {
        Self::new(
            CursorEvent::Action {
                state: CursorInputState::Released,
                action,
            },
            point,
        )
    }

    pub const fn scrolled(delta: i16, point: InputPosition) -> Self {
        Self::new(CursorEvent::Scroll { delta }, point)
    }

    /// Returns the pressed/released state if this event is an action of `button`.
    pub fn action_state(&self, button: CursorAction) -> Option<CursorInputState> {
        match self.event {
            CursorEvent::Action { state, action } if action == button => Some(state),
            _ => None,
        }
    }
}

impl KeyboardInput {
    pub const fn new(key: Key, state: KeyInputState) -> Self {
        Self {
            key,
            state,
            extra_info: 0,
        }
    }
}

impl From<CursorInput> for InputEvent {
    fn from(input: CursorInput) -> Self {
        InputEvent::Cursor(input)
    }
}

impl From<KeyboardInput> for InputEvent {
    fn from(input: KeyboardInput) -> Self {
        InputEvent::Keyboard(input)
    }
}
