use browser_plus_event::{
    input::{
        CursorAction, CursorEvent, CursorInput, CursorInputState, InputEvent, InputPosition,
        KeyInputState, KeyboardInput,
    },
    key::Key,
};
use once_cell::sync::OnceCell;
use tracing::{debug, trace};
use windows::Win32::{
    Foundation::{LPARAM, LRESULT, WPARAM},
    System::Threading::GetCurrentThreadId,
    UI::WindowsAndMessaging::{
        CallNextHookEx, GetMessageExtraInfo, HC_ACTION, HHOOK, MOUSEHOOKSTRUCT, MOUSEHOOKSTRUCTEX,
        SetWindowsHookExW, WH_KEYBOARD, WH_MOUSE, WM_LBUTTONDBLCLK, WM_LBUTTONDOWN, WM_LBUTTONUP,
        WM_MBUTTONDBLCLK, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEWHEEL, WM_NCLBUTTONDBLCLK,
        WM_NCLBUTTONDOWN, WM_NCLBUTTONUP, WM_NCMBUTTONDBLCLK, WM_NCMBUTTONDOWN, WM_NCMBUTTONUP,
        WM_NCRBUTTONDBLCLK, WM_NCRBUTTONDOWN, WM_NCRBUTTONUP, WM_RBUTTONDBLCLK, WM_RBUTTONDOWN,
        WM_RBUTTONUP,
    },
};

use crate::{bootstrap, input::Disposition};

struct Hook {
    _mouse: HHOOK,
    _keyboard: HHOOK,
}

// Hook handles are only passed back to the system.
unsafe impl Send for Hook {}
unsafe impl Sync for Hook {}

static HOOK: OnceCell<Hook> = OnceCell::new();

/// Install mouse and keyboard hooks on the calling thread.
#[tracing::instrument]
pub fn hook() -> anyhow::Result<()> {
    HOOK.get_or_try_init(|| unsafe {
        let thread = GetCurrentThreadId();

        debug!("hooking mouse input of thread {thread}");
        let mouse = SetWindowsHookExW(WH_MOUSE, Some(hooked_mouse), None, thread)?;

        debug!("hooking keyboard input of thread {thread}");
        let keyboard = SetWindowsHookExW(WH_KEYBOARD, Some(hooked_keyboard), None, thread)?;

        Ok::<_, anyhow::Error>(Hook {
            _mouse: mouse,
            _keyboard: keyboard,
        })
    })?;

    Ok(())
}

fn dispatch(event: &InputEvent) -> Disposition {
    let Some(cx) = bootstrap::context() else {
        return Disposition::Pass;
    };

    // Commands sent by a handler may pump messages into this hook again
    match cx.ui.try_lock() {
        Some(mut ui) => ui.dispatch(event),
        None => {
            trace!("re-entrant input passed: {event:?}");
            Disposition::Pass
        }
    }
}

fn cursor_event(msg: u32, mouse_data: u32) -> Option<CursorEvent> {
    let pressed = CursorInputState::Pressed {
        double_click: false,
    };
    let double_clicked = CursorInputState::Pressed { double_click: true };
    let released = CursorInputState::Released;

    let (state, action) = match msg {
        WM_LBUTTONDOWN | WM_NCLBUTTONDOWN => (pressed, CursorAction::Left),
        WM_LBUTTONDBLCLK | WM_NCLBUTTONDBLCLK => (double_clicked, CursorAction::Left),
        WM_LBUTTONUP | WM_NCLBUTTONUP => (released, CursorAction::Left),

        WM_RBUTTONDOWN | WM_NCRBUTTONDOWN => (pressed, CursorAction::Right),
        WM_RBUTTONDBLCLK | WM_NCRBUTTONDBLCLK => (double_clicked, CursorAction::Right),
        WM_RBUTTONUP | WM_NCRBUTTONUP => (released, CursorAction::Right),

        WM_MBUTTONDOWN | WM_NCMBUTTONDOWN => (pressed, CursorAction::Middle),
        WM_MBUTTONDBLCLK | WM_NCMBUTTONDBLCLK => (double_clicked, CursorAction::Middle),
        WM_MBUTTONUP | WM_NCMBUTTONUP => (released, CursorAction::Middle),

        WM_MOUSEWHEEL => {
            return Some(CursorEvent::Scroll {
                delta: (mouse_data >> 16) as u16 as i16,
            });
        }

        _ => return None,
    };

    Some(CursorEvent::Action { state, action })
}

extern "system" fn hooked_mouse(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        let msg = wparam.0 as u32;
        let info = unsafe { &*(lparam.0 as *const MOUSEHOOKSTRUCT) };
        let mouse_data = if msg == WM_MOUSEWHEEL {
            unsafe { (*(lparam.0 as *const MOUSEHOOKSTRUCTEX)).mouseData }
        } else {
            0
        };

        if let Some(event) = cursor_event(msg, mouse_data) {
            let event = InputEvent::Cursor(CursorInput {
                event,
                point: InputPosition::new(info.pt.x, info.pt.y),
                extra_info: info.dwExtraInfo,
            });

            if dispatch(&event).is_consumed() {
                return LRESULT(1);
            }
        }
    }

    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}

extern "system" fn hooked_keyboard(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        if let Some(key) = Key::new(wparam.0 as u8) {
            // Bit 31 is the transition state
            let released = (lparam.0 as u32) & (1 << 31) != 0;
            let event = InputEvent::Keyboard(KeyboardInput {
                key,
                state: if released {
                    KeyInputState::Released
                } else {
                    KeyInputState::Pressed
                },
                extra_info: unsafe { GetMessageExtraInfo() }.0 as usize,
            });

            if dispatch(&event).is_consumed() {
                return LRESULT(1);
            }
        }
    }

    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}
