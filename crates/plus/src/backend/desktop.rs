use core::{mem, ptr};

use browser_plus_event::{
    input::{InputPosition, SYNTHETIC_INPUT_MARKER},
    key::Key,
};
use tracing::{trace, warn};
use windows::{
    Win32::{
        Foundation::{HWND, LPARAM, POINT, WPARAM},
        System::SystemInformation::GetTickCount64,
        UI::{
            Accessibility::{AccessibleObjectFromWindow, IAccessible},
            Input::KeyboardAndMouse::{
                GetFocus, GetKeyState, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBD_EVENT_FLAGS,
                KEYBDINPUT, KEYEVENTF_KEYUP, MOUSE_EVENT_FLAGS, MOUSEEVENTF_MIDDLEDOWN,
                MOUSEEVENTF_MIDDLEUP, MOUSEINPUT, SendInput, VIRTUAL_KEY,
            },
            WindowsAndMessaging::{
                GA_ROOTOWNER, GetAncestor, GetClassNameW, GetForegroundWindow, GetSystemMetrics,
                OBJID_CLIENT, OBJID_WINDOW, SM_CXDRAG, SM_CYDRAG, SMTO_ABORTIFHUNG,
                SendMessageTimeoutW, WM_SYSCOMMAND, WindowFromPoint,
            },
        },
    },
    core::Interface,
};

use super::msaa::MsaaNode;
use crate::desktop::{BrowserCommand, Desktop, ObjectId, Stroke, WindowId};

const COMMAND_TIMEOUT_MS: u32 = 1000;

#[inline]
pub fn hwnd(window: WindowId) -> HWND {
    HWND(window as _)
}

#[inline]
pub fn window_id(hwnd: HWND) -> Option<WindowId> {
    (!hwnd.is_invalid()).then_some(hwnd.0 as WindowId)
}

/// The live desktop of the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Desktop;

impl Desktop for Win32Desktop {
    type Node = MsaaNode;

    fn accessible_object(&self, window: WindowId, object: ObjectId) -> Option<MsaaNode> {
        let id = match object {
            ObjectId::Window => OBJID_WINDOW,
            ObjectId::Client => OBJID_CLIENT,
        };

        let mut raw = ptr::null_mut();
        unsafe { AccessibleObjectFromWindow(hwnd(window), id.0 as u32, &IAccessible::IID, &mut raw) }
            .ok()?;
        if raw.is_null() {
            return None;
        }

        Some(MsaaNode(unsafe { IAccessible::from_raw(raw) }))
    }

    fn class_name(&self, window: WindowId) -> Option<String> {
        let mut buf = [0u16; 256];
        let len = unsafe { GetClassNameW(hwnd(window), &mut buf) };
        let len = usize::try_from(len).ok().filter(|&len| len > 0)?;
        Some(String::from_utf16_lossy(&buf[..len]))
    }

    fn foreground_window(&self) -> Option<WindowId> {
        window_id(unsafe { GetForegroundWindow() })
    }

    fn focus_window(&self) -> Option<WindowId> {
        window_id(unsafe { GetFocus() })
    }

    fn window_from_point(&self, point: InputPosition) -> Option<WindowId> {
        window_id(unsafe {
            WindowFromPoint(POINT {
                x: point.x,
                y: point.y,
            })
        })
    }

    fn root_window(&self, window: WindowId) -> WindowId {
        window_id(unsafe { GetAncestor(hwnd(window), GA_ROOTOWNER) }).unwrap_or(window)
    }

    fn is_key_down(&self, key: Key) -> bool {
        unsafe { GetKeyState(key.code() as i32) < 0 }
    }

    fn tick_count(&self) -> u64 {
        unsafe { GetTickCount64() }
    }

    fn drag_threshold(&self) -> (i32, i32) {
        unsafe { (GetSystemMetrics(SM_CXDRAG), GetSystemMetrics(SM_CYDRAG)) }
    }

    #[tracing::instrument]
    fn execute_command(&self, window: WindowId, command: BrowserCommand) {
        let res = unsafe {
            SendMessageTimeoutW(
                hwnd(window),
                WM_SYSCOMMAND,
                WPARAM(command.id()),
                LPARAM(0),
                SMTO_ABORTIFHUNG,
                COMMAND_TIMEOUT_MS,
                None,
            )
        };
        if res.0 == 0 {
            warn!("browser did not answer {command:?}");
        }
    }

    fn send_input(&self, strokes: &[Stroke]) {
        let inputs: Vec<INPUT> = strokes.iter().copied().map(to_input).collect();
        let sent = unsafe { SendInput(&inputs, mem::size_of::<INPUT>() as i32) };
        trace!("sent {sent} of {} inputs", inputs.len());
    }
}

fn to_input(stroke: Stroke) -> INPUT {
    match stroke {
        Stroke::KeyDown(key) => key_input(key, KEYBD_EVENT_FLAGS(0)),
        Stroke::KeyUp(key) => key_input(key, KEYEVENTF_KEYUP),
        Stroke::MiddleDown => mouse_input(MOUSEEVENTF_MIDDLEDOWN),
        Stroke::MiddleUp => mouse_input(MOUSEEVENTF_MIDDLEUP),
    }
}

fn key_input(key: Key, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(key.code() as u16),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: SYNTHETIC_INPUT_MARKER,
            },
        },
    }
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: SYNTHETIC_INPUT_MARKER,
            },
        },
    }
}
