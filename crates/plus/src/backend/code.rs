use core::{ffi::c_void, slice};
use std::ffi::CString;

use anyhow::{Context, bail};
use tracing::{debug, warn};
use windows::{
    Win32::{
        Foundation::HMODULE,
        System::{
            Diagnostics::Debug::FlushInstructionCache,
            LibraryLoader::{GetProcAddress, LOAD_WITH_ALTERED_SEARCH_PATH, LoadLibraryExW},
            Memory::{PAGE_EXECUTE_READWRITE, PAGE_PROTECTION_FLAGS, VirtualProtect},
            SystemInformation::GetSystemDirectoryW,
            SystemServices::IMAGE_DOS_HEADER,
            Threading::GetCurrentProcess,
        },
    },
    core::{HSTRING, PCSTR},
};

#[cfg(target_pointer_width = "64")]
use windows::Win32::System::Diagnostics::Debug::IMAGE_NT_HEADERS64 as IMAGE_NT_HEADERS;
#[cfg(target_pointer_width = "32")]
use windows::Win32::System::Diagnostics::Debug::IMAGE_NT_HEADERS32 as IMAGE_NT_HEADERS;

use crate::export::{Arch, CodeWriter, ExportPatcher, parse_exports};

/// Writes code of the current process through a temporary protection change.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtectedWriter;

impl CodeWriter for ProtectedWriter {
    unsafe fn write_code(&self, at: usize, code: &[u8]) -> bool {
        let target = at as *mut c_void;
        let mut old = PAGE_PROTECTION_FLAGS(0);
        if let Err(err) =
            unsafe { VirtualProtect(target, code.len(), PAGE_EXECUTE_READWRITE, &mut old) }
        {
            warn!("cannot unprotect {at:#x}. err: {err}");
            return false;
        }

        unsafe { target.cast::<u8>().copy_from_nonoverlapping(code.as_ptr(), code.len()) };

        let mut ignored = PAGE_PROTECTION_FLAGS(0);
        _ = unsafe { VirtualProtect(target, code.len(), old, &mut ignored) };
        _ = unsafe { FlushInstructionCache(GetCurrentProcess(), Some(target.cast_const()), code.len()) };

        true
    }
}

/// NT headers of a loaded module.
///
/// # Safety
/// `module` must be a module loaded in this process.
pub unsafe fn nt_headers<'a>(module: HMODULE) -> anyhow::Result<&'a IMAGE_NT_HEADERS> {
    let base = module.0 as *const u8;
    let dos = unsafe { &*base.cast::<IMAGE_DOS_HEADER>() };
    let nt_offset = usize::try_from(dos.e_lfanew).context("negative header offset")?;

    Ok(unsafe { &*base.add(nt_offset).cast::<IMAGE_NT_HEADERS>() })
}

/// Mapped image of a loaded module.
///
/// # Safety
/// `module` must be a module loaded in this process.
pub unsafe fn module_image<'a>(module: HMODULE) -> anyhow::Result<&'a [u8]> {
    let nt = unsafe { nt_headers(module)? };
    let size = nt.OptionalHeader.SizeOfImage as usize;
    if size < size_of::<IMAGE_NT_HEADERS>() {
        bail!("image size {size:#x} is smaller than its headers");
    }

    Ok(unsafe { slice::from_raw_parts(module.0 as *const u8, size) })
}

/// Full path of `name` inside the system directory.
fn system_library_path(name: &str) -> anyhow::Result<HSTRING> {
    let mut buf = [0u16; 260];
    let len = unsafe { GetSystemDirectoryW(Some(&mut buf)) } as usize;
    if len == 0 || len >= buf.len() {
        bail!("cannot locate the system directory");
    }

    let dir = String::from_utf16_lossy(&buf[..len]);
    Ok(HSTRING::from(format!(r"{dir}\{name}")))
}

/// Point every export of `module` at the same named export of the system library `library`.
///
/// # Safety
/// `module` must be this crate's own image, with no thread running its exports.
#[tracing::instrument]
pub unsafe fn forward_module_to_system(module: HMODULE, library: &str) -> anyhow::Result<usize> {
    let Some(arch) = Arch::current() else {
        bail!("unsupported architecture");
    };

    let exports = parse_exports(unsafe { module_image(module)? })?;
    debug!("{} exports to forward", exports.len());

    let path = system_library_path(library)?;
    let system = unsafe { LoadLibraryExW(&path, None, LOAD_WITH_ALTERED_SEARCH_PATH) }
        .with_context(|| format!("cannot load {path}"))?;

    let patcher = unsafe { ExportPatcher::new(module.0 as usize, exports, arch, ProtectedWriter) };
    let patched = patcher.forward_all(|name| {
        let name = CString::new(name).ok()?;
        let proc = unsafe { GetProcAddress(system, PCSTR(name.as_ptr().cast())) }?;
        Some(proc as usize)
    });

    if patched < patcher.exports().len() {
        warn!(
            "forwarded {patched} of {} exports",
            patcher.exports().len()
        );
    }

    Ok(patched)
}
