//! Inline function hooking.
//!
//! This crate is intended to be used only as `browser-plus`'s internal dependency.
//! It wraps [`retour::RawDetour`] with a typed hook record and adds [`OneShotHook`],
//! a hook that removes itself the first time its condition is met.

mod oneshot;

pub use oneshot::{HookState, OneShotHook};

use core::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    mem,
};
use tracing::debug;

/// A detour function hook.
///
/// `F` must be a function pointer type. The hook owns the redirection; dropping it
/// restores the target.
pub struct DetourHook<F> {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    detour: retour::RawDetour,
    target: F,
    hook: F,
}

impl<F: Copy> DetourHook<F> {
    /// Prepare a hook on the target function without enabling it.
    ///
    /// # Safety
    /// func and detour should be valid function pointers with same signature.
    #[tracing::instrument(skip(func, detour))]
    pub unsafe fn create(func: F, detour: F) -> HookResult<Self> {
        debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<*const ()>());

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            let raw = unsafe { retour::RawDetour::new(to_ptr(func), to_ptr(detour)) }
                .map_err(HookError::Detour)?;
            debug!("hook created");

            Ok(DetourHook {
                detour: raw,
                target: func,
                hook: detour,
            })
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        {
            _ = (func, detour);
            Err(HookError::Unsupported)
        }
    }

    /// Create a hook and enable it immediately.
    ///
    /// # Safety
    /// func and detour should be valid function pointers with same signature.
    pub unsafe fn attach(func: F, detour: F) -> HookResult<Self> {
        let hook = unsafe { Self::create(func, detour)? };
        unsafe { hook.enable()? };
        debug!("hook attached");

        Ok(hook)
    }

    /// Redirect calls of the target to the detour.
    ///
    /// # Safety
    /// No other thread may be executing the first instructions of the target.
    pub unsafe fn enable(&self) -> HookResult<()> {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        unsafe {
            self.detour.enable().map_err(HookError::Detour)
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        Err(HookError::Unsupported)
    }

    /// Restore the original code of the target.
    ///
    /// Calls already inside the detour are unaffected.
    ///
    /// # Safety
    /// No other thread may be executing the first instructions of the target.
    pub unsafe fn disable(&self) -> HookResult<()> {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        unsafe {
            self.detour.disable().map_err(HookError::Detour)
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        Err(HookError::Unsupported)
    }

    pub fn is_enabled(&self) -> bool {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            self.detour.is_enabled()
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        false
    }

    /// Get the original function pointer.
    ///
    /// Calling it runs the target's original code even while the hook is enabled.
    #[inline(always)]
    pub fn original_fn(&self) -> F {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            let trampoline: *const () = self.detour.trampoline();
            unsafe { from_ptr(trampoline) }
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        self.target
    }

    #[inline]
    pub fn target(&self) -> F {
        self.target
    }
}

// Patched code is process-global; the record only holds addresses.
unsafe impl<F: Send> Send for DetourHook<F> {}
unsafe impl<F: Sync> Sync for DetourHook<F> {}

impl<F: Copy> Debug for DetourHook<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetourHook")
            .field("target", &to_ptr(self.target))
            .field("hook", &to_ptr(self.hook))
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[inline(always)]
fn to_ptr<F: Copy>(func: F) -> *const () {
    unsafe { *(&raw const func).cast::<*const ()>() }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline(always)]
unsafe fn from_ptr<F: Copy>(ptr: *const ()) -> F {
    unsafe { *(&raw const ptr).cast::<F>() }
}

pub type HookResult<T> = Result<T, HookError>;

/// Hook error.
#[derive(Debug)]
pub enum HookError {
    /// The detour engine refused the target.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    Detour(retour::Error),

    /// Inline hooking is not available on this architecture.
    Unsupported,

    /// A one-shot hook slot was installed twice.
    AlreadyInstalled,
}

impl Display for HookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            HookError::Detour(err) => write!(f, "Detour call error: {err}"),
            HookError::Unsupported => write!(f, "inline hooks are unsupported on this target"),
            HookError::AlreadyInstalled => write!(f, "hook is already installed"),
        }
    }
}

impl Error for HookError {}
