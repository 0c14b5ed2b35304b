//! Serve a patched copy of `resources.pak` to the browser.
//!
//! The first `CreateFileW` call opening the pack records its handle and arms a
//! `CreateFileMappingW` hook. The first mapping of that handle is answered with a
//! pagefile-backed copy carrying the rewritten about page.

use core::{
    ptr, slice,
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, bail};
use browser_plus_hook::OneShotHook;
use browser_plus_pak::{AboutPagePatch, patch_resources};
use scopeguard::defer;
use tracing::{debug, error, trace};
use windows::{
    Win32::{
        Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE},
        Security::SECURITY_ATTRIBUTES,
        Storage::FileSystem::GetFileSizeEx,
        System::Memory::{
            FILE_MAP_READ, FILE_MAP_WRITE, MapViewOfFile, PAGE_PROTECTION_FLAGS, PAGE_READONLY,
            PAGE_READWRITE, UnmapViewOfFile,
        },
    },
    core::PCWSTR,
};

const PAK_FILE_NAME: &str = "resources.pak";

#[link(name = "kernel32.dll", kind = "raw-dylib", modifiers = "+verbatim")]
unsafe extern "system" {
    fn CreateFileW(
        name: PCWSTR,
        access: u32,
        share_mode: u32,
        security: *const SECURITY_ATTRIBUTES,
        disposition: u32,
        flags: u32,
        template: HANDLE,
    ) -> HANDLE;

    fn CreateFileMappingW(
        file: HANDLE,
        security: *const SECURITY_ATTRIBUTES,
        protect: PAGE_PROTECTION_FLAGS,
        max_size_high: u32,
        max_size_low: u32,
        name: PCWSTR,
    ) -> HANDLE;
}

type CreateFileWFn = unsafe extern "system" fn(
    PCWSTR,
    u32,
    u32,
    *const SECURITY_ATTRIBUTES,
    u32,
    u32,
    HANDLE,
) -> HANDLE;

type CreateFileMappingWFn = unsafe extern "system" fn(
    HANDLE,
    *const SECURITY_ATTRIBUTES,
    PAGE_PROTECTION_FLAGS,
    u32,
    u32,
    PCWSTR,
) -> HANDLE;

static CREATE_FILE: OneShotHook<CreateFileWFn> = OneShotHook::new();
static CREATE_FILE_MAPPING: OneShotHook<CreateFileMappingWFn> = OneShotHook::new();

/// Handle of the opened pack, 0 until seen.
static PAK_HANDLE: AtomicUsize = AtomicUsize::new(0);

#[tracing::instrument]
pub fn hook() -> anyhow::Result<()> {
    debug!("hooking CreateFileW");
    unsafe { CREATE_FILE.install(CreateFileW as _, hooked_create_file as _)? };

    Ok(())
}

fn is_pak_path(name: PCWSTR) -> bool {
    if name.is_null() {
        return false;
    }

    let Ok(path) = (unsafe { name.to_string() }) else {
        return false;
    };
    let file_name = path.rsplit(['\\', '/']).next().unwrap_or_default();
    file_name.eq_ignore_ascii_case(PAK_FILE_NAME)
}

extern "system" fn hooked_create_file(
    name: PCWSTR,
    access: u32,
    share_mode: u32,
    security: *const SECURITY_ATTRIBUTES,
    disposition: u32,
    flags: u32,
    template: HANDLE,
) -> HANDLE {
    let original = CREATE_FILE.wait_original();
    let handle =
        unsafe { original(name, access, share_mode, security, disposition, flags, template) };

    if handle.is_invalid() || !is_pak_path(name) {
        return handle;
    }

    CREATE_FILE.fire_with(|| {
        debug!("resources.pak opened as {:?}", handle.0);
        PAK_HANDLE.store(handle.0 as usize, Ordering::Release);

        debug!("hooking CreateFileMappingW");
        if let Err(err) = unsafe {
            CREATE_FILE_MAPPING.install(CreateFileMappingW as _, hooked_create_file_mapping as _)
        } {
            error!("CreateFileMappingW hook failed. err: {err}");
        }
    });

    handle
}

extern "system" fn hooked_create_file_mapping(
    file: HANDLE,
    security: *const SECURITY_ATTRIBUTES,
    protect: PAGE_PROTECTION_FLAGS,
    max_size_high: u32,
    max_size_low: u32,
    name: PCWSTR,
) -> HANDLE {
    let original = CREATE_FILE_MAPPING.wait_original();

    if file.0 as usize == PAK_HANDLE.load(Ordering::Acquire) {
        let patched = CREATE_FILE_MAPPING.fire_with(|| unsafe { patched_mapping(file, original) });
        match patched {
            Some(Ok(mapping)) => return mapping,
            Some(Err(err)) => error!("resources.pak left unpatched. err: {err:?}"),
            None => {}
        }
    }

    unsafe { original(file, security, protect, max_size_high, max_size_low, name) }
}

/// Copy the pack into a pagefile section and rewrite it there.
///
/// # Safety
/// `file` must be a readable file handle and `create_mapping` the original `CreateFileMappingW`.
unsafe fn patched_mapping(
    file: HANDLE,
    create_mapping: CreateFileMappingWFn,
) -> anyhow::Result<HANDLE> {
    let mut size = 0i64;
    unsafe { GetFileSizeEx(file, &mut size) }.context("cannot read pack size")?;
    let len = usize::try_from(size).context("pack too large")?;
    if len == 0 {
        bail!("empty pack");
    }

    let source = unsafe { create_mapping(file, ptr::null(), PAGE_READONLY, 0, 0, PCWSTR::null()) };
    if source.is_invalid() {
        bail!("cannot map pack");
    }
    defer!(_ = unsafe { CloseHandle(source) });

    let source_view = unsafe { MapViewOfFile(source, FILE_MAP_READ, 0, 0, 0) };
    if source_view.Value.is_null() {
        bail!("cannot view pack");
    }
    defer!(_ = unsafe { UnmapViewOfFile(source_view) });

    let copy = unsafe {
        create_mapping(
            INVALID_HANDLE_VALUE,
            ptr::null(),
            PAGE_READWRITE,
            (size as u64 >> 32) as u32,
            size as u32,
            PCWSTR::null(),
        )
    };
    if copy.is_invalid() {
        bail!("cannot create pagefile section");
    }
    let copy_guard = scopeguard::guard(copy, |copy| {
        _ = unsafe { CloseHandle(copy) };
    });

    let copy_view = unsafe { MapViewOfFile(copy, FILE_MAP_WRITE, 0, 0, len) };
    if copy_view.Value.is_null() {
        bail!("cannot view pagefile section");
    }
    defer!(_ = unsafe { UnmapViewOfFile(copy_view) });

    let data = unsafe {
        let data = slice::from_raw_parts_mut(copy_view.Value.cast::<u8>(), len);
        data.copy_from_slice(slice::from_raw_parts(
            source_view.Value.cast_const().cast::<u8>(),
            len,
        ));
        data
    };

    let patch = AboutPagePatch::new(env!("CARGO_PKG_VERSION"));
    match patch_resources(data, &patch)? {
        Some(id) => debug!("about page resource {id} rewritten"),
        None => trace!("no resource matched the about page"),
    }

    Ok(scopeguard::ScopeGuard::into_inner(copy_guard))
}
