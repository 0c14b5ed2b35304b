use std::thread;

use anyhow::Context as _;
use browser_plus_event::{
    input::{InputEvent, KeyInputState, KeyboardInput},
    key::Key,
};
use scopeguard::defer;
use tracing::{debug, error, trace};
use windows::Win32::{
    Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM},
    System::Com::{COINIT_MULTITHREADED, CoInitializeEx, CoUninitialize},
    UI::{
        Input::KeyboardAndMouse::{HOT_KEY_MODIFIERS, MOD_NOREPEAT, RegisterHotKey, UnregisterHotKey},
        WindowsAndMessaging::{
            CallNextHookEx, GetMessageW, HC_ACTION, KBDLLHOOKSTRUCT, MSG, SetWindowsHookExW,
            UnhookWindowsHookEx, WH_KEYBOARD_LL, WM_HOTKEY, WM_KEYUP, WM_SYSKEYUP,
        },
    },
};

use super::shell::Win32Shell;
use crate::{bootstrap, input::Disposition};

const BOSS_KEY_ID: i32 = 1;

/// Start the thread owning the boss key and the low-level keyboard hook.
#[tracing::instrument]
pub fn spawn(module: usize) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("browser-plus hotkeys".to_owned())
        .spawn(move || {
            if let Err(err) = run(HINSTANCE(module as _)) {
                error!("hotkey thread failed. err: {err:?}");
            }
        })
        .context("cannot spawn hotkey thread")?;

    Ok(())
}

fn run(module: HINSTANCE) -> anyhow::Result<()> {
    let Some(cx) = bootstrap::context() else {
        return Ok(());
    };

    unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }
        .ok()
        .context("COM initialization failed")?;
    defer!(unsafe { CoUninitialize() });

    let mut listening = false;

    if let Some(hotkey) = cx.config.general.boss_key {
        let modifiers = HOT_KEY_MODIFIERS(hotkey.modifiers.bits() | MOD_NOREPEAT.0);
        match unsafe { RegisterHotKey(None, BOSS_KEY_ID, modifiers, hotkey.key.code() as u32) } {
            Ok(()) => {
                debug!("boss key {hotkey} registered");
                listening = true;
            }
            Err(err) => error!("cannot register boss key {hotkey}. err: {err}"),
        }
    }
    defer!(if listening {
        _ = unsafe { UnregisterHotKey(None, BOSS_KEY_ID) };
    });

    let hook = if cx.has_key_handlers() {
        let hook = unsafe {
            SetWindowsHookExW(WH_KEYBOARD_LL, Some(low_level_keyboard), Some(module), 0)
        }
        .context("cannot install low-level keyboard hook")?;
        debug!("low-level keyboard hook installed");
        Some(hook)
    } else {
        None
    };
    defer!(if let Some(hook) = hook {
        _ = unsafe { UnhookWindowsHookEx(hook) };
    });

    if !listening && hook.is_none() {
        return Ok(());
    }

    let mut msg = MSG::default();
    while unsafe { GetMessageW(&mut msg, None, 0, 0) }.0 > 0 {
        if msg.message == WM_HOTKEY && msg.wParam.0 == BOSS_KEY_ID as usize {
            let mut boss_key = cx.boss_key.lock();
            boss_key.toggle(&Win32Shell);
            debug!(hidden = boss_key.is_hidden(), "boss key toggled");
        }
    }

    Ok(())
}

extern "system" fn low_level_keyboard(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        let info = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
        if let (Some(cx), Some(key)) = (bootstrap::context(), Key::new(info.vkCode as u8)) {
            let released = matches!(wparam.0 as u32, WM_KEYUP | WM_SYSKEYUP);
            let event = InputEvent::Keyboard(KeyboardInput {
                key,
                state: if released {
                    KeyInputState::Released
                } else {
                    KeyInputState::Pressed
                },
                extra_info: info.dwExtraInfo,
            });

            // Re-entrant delivery from injected input passes through
            if let Some(mut keys) = cx.keys.try_lock() {
                if keys.dispatch(&event) == Disposition::Consume {
                    trace!("swallowed {event:?}");
                    return LRESULT(1);
                }
            }
        }
    }

    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}
