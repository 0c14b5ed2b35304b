//! Hide and show every window of the process with one hotkey.

use std::collections::HashMap;

use tracing::debug;

use crate::desktop::WindowId;

/// An audio session of this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSession {
    /// Session instance identifier, stable while the session lives.
    pub id: String,
    pub muted: bool,
}

/// Process level window and audio control.
pub trait Shell {
    /// Visible top-level windows owned by this process.
    fn visible_windows(&self) -> Vec<WindowId>;

    fn set_window_visible(&self, window: WindowId, visible: bool);

    fn audio_sessions(&self) -> Vec<AudioSession>;

    fn set_session_muted(&self, id: &str, muted: bool);
}

/// Mute state of each session before the boss key muted it.
#[derive(Debug, Default)]
pub struct MuteLedger {
    saved: HashMap<String, bool>,
}

impl MuteLedger {
    pub fn mute_all(&mut self, shell: &impl Shell) {
        for session in shell.audio_sessions() {
            shell.set_session_muted(&session.id, true);
            self.saved.insert(session.id, session.muted);
        }
    }

    /// Restore recorded sessions. Sessions created while muted are left alone.
    pub fn restore_all(&mut self, shell: &impl Shell) {
        for session in shell.audio_sessions() {
            if let Some(muted) = self.saved.get(&session.id) {
                shell.set_session_muted(&session.id, *muted);
            }
        }
        self.saved.clear();
    }
}

#[derive(Debug, Default)]
pub struct BossKey {
    hidden: Option<Vec<WindowId>>,
    ledger: MuteLedger,
}

impl BossKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.is_some()
    }

    pub fn toggle(&mut self, shell: &impl Shell) {
        match self.hidden.take() {
            Some(windows) => {
                debug!("showing {} windows", windows.len());
                for window in windows {
                    shell.set_window_visible(window, true);
                }
                self.ledger.restore_all(shell);
            }

            None => {
                let windows = shell.visible_windows();
                debug!("hiding {} windows", windows.len());
                for &window in &windows {
                    shell.set_window_visible(window, false);
                }
                self.ledger.mute_all(shell);
                self.hidden = Some(windows);
            }
        }
    }
}
