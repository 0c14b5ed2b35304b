use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use browser_plus_common::{Config, cmdline, config::CONFIG_FILE_NAME};
use browser_plus_hook::OneShotHook;
use once_cell::sync::OnceCell;
use tracing::{debug, error, info, warn};
use windows::Win32::{
    Foundation::HMODULE,
    System::LibraryLoader::{GetModuleFileNameW, GetModuleHandleW},
};

use crate::{
    backend::{code, desktop::Win32Desktop, process, worker},
    context::Context,
    hook,
};

const SYSTEM_LIBRARY: &str = "version.dll";

static MODULE: OnceCell<usize> = OnceCell::new();
static CONTEXT: OnceCell<Context<Win32Desktop>> = OnceCell::new();

type EntryPointFn = unsafe extern "system" fn() -> u32;

static ENTRY_POINT: OneShotHook<EntryPointFn> = OneShotHook::new();

/// Context of the browser process, once started.
#[inline]
pub(crate) fn context() -> Option<&'static Context<Win32Desktop>> {
    CONTEXT.get()
}

/// Attach to the process. Called from `DllMain` under the loader lock.
///
/// Redirects the module's exports to the system library, then defers everything
/// else to the host's entry point.
pub fn initialize(module: usize) -> anyhow::Result<()> {
    if MODULE.set(module).is_err() {
        bail!("Already initialized");
    }

    let patched = unsafe { code::forward_module_to_system(HMODULE(module as _), SYSTEM_LIBRARY) }
        .context("export forwarding failed")?;
    debug!("{patched} exports forwarded");

    let entry = host_entry_point().context("cannot locate host entry point")?;
    unsafe { ENTRY_POINT.install(entry, hooked_entry_point as _) }
        .context("entry point hook failed")?;

    Ok(())
}

fn host_entry_point() -> anyhow::Result<EntryPointFn> {
    let exe = unsafe { GetModuleHandleW(None) }?;
    let nt = unsafe { code::nt_headers(exe)? };

    let base = exe.0 as *const u8;
    let rva = nt.OptionalHeader.AddressOfEntryPoint as usize;
    if rva == 0 {
        bail!("host has no entry point");
    }

    Ok(unsafe { core::mem::transmute::<*const u8, EntryPointFn>(base.add(rva)) })
}

extern "system" fn hooked_entry_point() -> u32 {
    ENTRY_POINT.fire_with(start);
    unsafe { ENTRY_POINT.wait_original()() }
}

fn config_path() -> anyhow::Result<PathBuf> {
    let module = MODULE.get().context("not initialized")?;

    let mut buf = vec![0u16; 1024];
    let len = unsafe { GetModuleFileNameW(Some(HMODULE(*module as _)), &mut buf) } as usize;
    if len == 0 || len >= buf.len() {
        bail!("cannot read module path");
    }

    let path = PathBuf::from(String::from_utf16_lossy(&buf[..len]));
    let dir = path.parent().context("module has no directory")?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

fn load_config() -> Arc<Config> {
    let path = match config_path() {
        Ok(path) => path,
        Err(err) => {
            warn!("using default configuration. err: {err:?}");
            return Arc::new(Config::default());
        }
    };

    match Config::load(&path) {
        Ok(config) => config,
        Err(err) => {
            warn!("using default configuration. err: {err}");
            Arc::new(Config::default())
        }
    }
}

/// Runs once on the host's main thread, before its own entry point.
#[tracing::instrument]
fn start() {
    let config = load_config();
    let args = process::args();
    let is_browser = cmdline::is_browser_process(&args);

    if is_browser && config.portable.enabled && !cmdline::has_portable_flag(&args) {
        match process::relaunch_portable(&args, &config.portable) {
            Ok(()) => {
                info!("relaunched in portable mode");
                std::process::exit(0);
            }
            Err(err) => error!("continuing without portable mode. err: {err:?}"),
        }
    }

    if let Err(err) = hook::green::hook() {
        error!("fingerprint hooks failed. err: {err:?}");
    }

    if !is_browser {
        return;
    }

    if config.general.about_page {
        if let Err(err) = hook::pak::hook() {
            error!("resource patch hook failed. err: {err:?}");
        }
    }

    let cx = CONTEXT.get_or_init(|| Context::new(config.clone(), Win32Desktop));

    if cx.has_ui_handlers() {
        if let Err(err) = hook::input::hook() {
            error!("input hooks failed. err: {err:?}");
        }
    }

    if cx.has_key_handlers() || config.general.boss_key.is_some() {
        let module = MODULE.get().copied().unwrap_or_default();
        if let Err(err) = worker::spawn(module) {
            error!("hotkey thread failed. err: {err:?}");
        }
    }

    debug!("browser behaviors installed");
}
