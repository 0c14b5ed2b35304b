use core::sync::atomic::{AtomicU8, Ordering};

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::{DetourHook, HookError, HookResult};

/// Lifecycle of a [`OneShotHook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HookState {
    Pending = 0,
    Installed = 1,
    Fired = 2,
}

impl HookState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => HookState::Pending,
            1 => HookState::Installed,
            _ => HookState::Fired,
        }
    }
}

/// A hook that detaches itself after its effect ran once.
///
/// Intended to live in a `static`. The detour decides when the hook condition is met
/// and calls [`OneShotHook::fire_with`]; only one caller ever wins the
/// `Installed -> Fired` transition, so the effect runs exactly once even when the
/// target is entered concurrently or re-entrantly.
pub struct OneShotHook<F> {
    state: AtomicU8,
    hook: OnceCell<DetourHook<F>>,
}

impl<F: Copy> OneShotHook<F> {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(HookState::Pending as u8),
            hook: OnceCell::new(),
        }
    }

    pub fn state(&self) -> HookState {
        HookState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Install and enable the hook.
    ///
    /// The hook record is published before the redirection is enabled, so the detour
    /// can always reach the original function.
    ///
    /// # Safety
    /// func and detour should be valid function pointers with same signature.
    pub unsafe fn install(&self, func: F, detour: F) -> HookResult<()> {
        if self.hook.get().is_some() {
            return Err(HookError::AlreadyInstalled);
        }

        let hook = unsafe { DetourHook::create(func, detour)? };
        self.hook
            .set(hook)
            .map_err(|_| HookError::AlreadyInstalled)?;
        self.state
            .store(HookState::Installed as u8, Ordering::Release);

        let Some(hook) = self.hook.get() else {
            return Err(HookError::AlreadyInstalled);
        };
        if let Err(err) = unsafe { hook.enable() } {
            self.state.store(HookState::Fired as u8, Ordering::Release);
            return Err(err);
        }

        debug!("one-shot hook installed");
        Ok(())
    }

    /// Run `effect` and detach the hook, if this call is the first to fire.
    ///
    /// Returns `None` when the hook was not installed or already fired.
    pub fn fire_with<R>(&self, effect: impl FnOnce() -> R) -> Option<R> {
        self.state
            .compare_exchange(
                HookState::Installed as u8,
                HookState::Fired as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()?;

        let res = effect();
        if let Some(hook) = self.hook.get() {
            if let Err(err) = unsafe { hook.disable() } {
                warn!("failed to detach fired hook. err: {err}");
            } else {
                debug!("one-shot hook detached");
            }
        }

        Some(res)
    }

    /// Original function, if installed.
    pub fn original(&self) -> Option<F> {
        self.hook.get().map(DetourHook::original_fn)
    }

    /// Original function, blocking until the hook record is published.
    pub fn wait_original(&self) -> F {
        self.hook.wait().original_fn()
    }
}

impl<F: Copy> Default for OneShotHook<F> {
    fn default() -> Self {
        Self::new()
    }
}
