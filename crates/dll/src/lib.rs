//! `version.dll` proxy loaded by the browser from its own directory.
#![cfg(windows)]

#[cfg(debug_assertions)]
mod dbg;

mod stubs;

use tracing::{debug, error};
use windows::Win32::{Foundation::HINSTANCE, System::SystemServices::DLL_PROCESS_ATTACH};

#[unsafe(no_mangle)]
#[allow(non_snake_case, unused_variables)]
/// # Safety
/// Can be called by loader only. Must not be called manually.
pub unsafe extern "system" fn DllMain(dll_module: HINSTANCE, fdw_reason: u32, _: *mut ()) -> bool {
    #[cfg(debug_assertions)]
    fn setup_tracing() {
        use tracing::level_filters::LevelFilter;

        use crate::dbg::DebugOutput;

        tracing_subscriber::fmt::fmt()
            .with_ansi(false)
            .with_thread_ids(true)
            .with_max_level(LevelFilter::TRACE)
            .with_writer(DebugOutput::new())
            .init();
    }

    if fdw_reason != DLL_PROCESS_ATTACH {
        return true;
    }

    // setup tracing first
    #[cfg(debug_assertions)]
    setup_tracing();

    // The host keeps running unmodified when attaching fails
    match browser_plus::initialize(dll_module.0 as usize) {
        Ok(()) => debug!("attached"),
        Err(err) => error!("initialization failed. err: {err:?}"),
    }

    true
}
