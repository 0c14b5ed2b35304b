use core::ptr;

use tracing::{trace, warn};
use windows::{
    Win32::{
        Foundation::{HWND, LPARAM},
        Media::Audio::{
            DEVICE_STATE_ACTIVE, IAudioSessionControl2, IAudioSessionManager2,
            IMMDeviceEnumerator, ISimpleAudioVolume, MMDeviceEnumerator, eRender,
        },
        System::{
            Com::{CLSCTX_ALL, CoCreateInstance, CoTaskMemFree},
            Threading::GetCurrentProcessId,
        },
        UI::WindowsAndMessaging::{
            EnumWindows, GetWindowThreadProcessId, IsWindowVisible, SW_HIDE, SW_SHOW, ShowWindow,
        },
    },
    core::{BOOL, Interface},
};

use super::desktop::{hwnd, window_id};
use crate::{
    behavior::boss_key::{AudioSession, Shell},
    desktop::WindowId,
};

/// Windows and audio sessions of the current process.
///
/// Audio calls need COM initialized on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Shell;

impl Win32Shell {
    fn session_volumes(&self) -> windows::core::Result<Vec<(String, ISimpleAudioVolume)>> {
        let pid = unsafe { GetCurrentProcessId() };
        let enumerator: IMMDeviceEnumerator =
            unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)? };
        let devices = unsafe { enumerator.EnumAudioEndpoints(eRender, DEVICE_STATE_ACTIVE)? };

        let mut volumes = Vec::new();
        for device_index in 0..unsafe { devices.GetCount()? } {
            let device = unsafe { devices.Item(device_index)? };
            let manager: IAudioSessionManager2 = unsafe { device.Activate(CLSCTX_ALL, None)? };
            let sessions = unsafe { manager.GetSessionEnumerator()? };

            for session_index in 0..unsafe { sessions.GetCount()? } {
                let control = unsafe { sessions.GetSession(session_index)? };
                let control: IAudioSessionControl2 = control.cast()?;
                if unsafe { control.GetProcessId() }.ok() != Some(pid) {
                    continue;
                }

                let raw_id = unsafe { control.GetSessionInstanceIdentifier()? };
                let id = unsafe { raw_id.to_string() }.ok();
                unsafe { CoTaskMemFree(Some(raw_id.0 as _)) };

                if let Some(id) = id {
                    volumes.push((id, control.cast::<ISimpleAudioVolume>()?));
                }
            }
        }

        Ok(volumes)
    }
}

impl Shell for Win32Shell {
    fn visible_windows(&self) -> Vec<WindowId> {
        unsafe extern "system" fn collect(hwnd: HWND, lparam: LPARAM) -> BOOL {
            let windows = unsafe { &mut *(lparam.0 as *mut Vec<WindowId>) };

            let mut pid = 0;
            unsafe { GetWindowThreadProcessId(hwnd, Some(&raw mut pid)) };
            if pid == unsafe { GetCurrentProcessId() } && unsafe { IsWindowVisible(hwnd) }.as_bool()
            {
                windows.extend(window_id(hwnd));
            }

            BOOL(1)
        }

        let mut windows = Vec::<WindowId>::new();
        let lparam = LPARAM(ptr::from_mut(&mut windows) as isize);
        if let Err(err) = unsafe { EnumWindows(Some(collect), lparam) } {
            warn!("window enumeration failed. err: {err}");
        }

        windows
    }

    fn set_window_visible(&self, window: WindowId, visible: bool) {
        let cmd = if visible { SW_SHOW } else { SW_HIDE };
        _ = unsafe { ShowWindow(hwnd(window), cmd) };
    }

    fn audio_sessions(&self) -> Vec<AudioSession> {
        let volumes = match self.session_volumes() {
            Ok(volumes) => volumes,
            Err(err) => {
                warn!("cannot enumerate audio sessions. err: {err}");
                return Vec::new();
            }
        };

        volumes
            .into_iter()
            .filter_map(|(id, volume)| {
                let muted = unsafe { volume.GetMute() }.ok()?.as_bool();
                Some(AudioSession { id, muted })
            })
            .collect()
    }

    fn set_session_muted(&self, id: &str, muted: bool) {
        let volumes = match self.session_volumes() {
            Ok(volumes) => volumes,
            Err(err) => {
                warn!("cannot enumerate audio sessions. err: {err}");
                return;
            }
        };

        for (_, volume) in volumes.iter().filter(|(session, _)| session == id) {
            trace!("setting mute of {id} to {muted}");
            if let Err(err) = unsafe { volume.SetMute(muted, ptr::null()) } {
                warn!("cannot change mute of {id}. err: {err}");
            }
        }
    }
}
