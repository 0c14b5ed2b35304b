//! Keep the profile independent of the machine it runs on.
//!
//! Machine identifiers are hidden and DPAPI encryption, which binds data to the
//! Windows account, is replaced by a plain copy.

use core::{ffi::c_void, ptr};

use browser_plus_hook::DetourHook;
use once_cell::sync::OnceCell;
use tracing::{debug, trace};
use windows::{
    Win32::{
        Foundation::HLOCAL,
        Security::Cryptography::{CRYPT_INTEGER_BLOB, CRYPTPROTECT_PROMPTSTRUCT},
        System::Memory::{LMEM_FIXED, LocalAlloc},
    },
    core::{BOOL, PCWSTR, PWSTR},
};

#[link(name = "kernel32.dll", kind = "raw-dylib", modifiers = "+verbatim")]
unsafe extern "system" {
    fn GetComputerNameW(buffer: PWSTR, size: *mut u32) -> BOOL;

    fn GetVolumeInformationW(
        root: PCWSTR,
        volume_name: PWSTR,
        volume_name_size: u32,
        serial: *mut u32,
        max_component_len: *mut u32,
        flags: *mut u32,
        fs_name: PWSTR,
        fs_name_size: u32,
    ) -> BOOL;
}

#[link(name = "crypt32.dll", kind = "raw-dylib", modifiers = "+verbatim")]
unsafe extern "system" {
    fn CryptProtectData(
        data_in: *const CRYPT_INTEGER_BLOB,
        description: PCWSTR,
        entropy: *const CRYPT_INTEGER_BLOB,
        reserved: *const c_void,
        prompt: *const CRYPTPROTECT_PROMPTSTRUCT,
        flags: u32,
        data_out: *mut CRYPT_INTEGER_BLOB,
    ) -> BOOL;

    fn CryptUnprotectData(
        data_in: *const CRYPT_INTEGER_BLOB,
        description: *mut PWSTR,
        entropy: *const CRYPT_INTEGER_BLOB,
        reserved: *const c_void,
        prompt: *const CRYPTPROTECT_PROMPTSTRUCT,
        flags: u32,
        data_out: *mut CRYPT_INTEGER_BLOB,
    ) -> BOOL;
}

type GetComputerNameWFn = unsafe extern "system" fn(PWSTR, *mut u32) -> BOOL;
type GetVolumeInformationWFn =
    unsafe extern "system" fn(PCWSTR, PWSTR, u32, *mut u32, *mut u32, *mut u32, PWSTR, u32) -> BOOL;
type CryptProtectDataFn = unsafe extern "system" fn(
    *const CRYPT_INTEGER_BLOB,
    PCWSTR,
    *const CRYPT_INTEGER_BLOB,
    *const c_void,
    *const CRYPTPROTECT_PROMPTSTRUCT,
    u32,
    *mut CRYPT_INTEGER_BLOB,
) -> BOOL;
type CryptUnprotectDataFn = unsafe extern "system" fn(
    *const CRYPT_INTEGER_BLOB,
    *mut PWSTR,
    *const CRYPT_INTEGER_BLOB,
    *const c_void,
    *const CRYPTPROTECT_PROMPTSTRUCT,
    u32,
    *mut CRYPT_INTEGER_BLOB,
) -> BOOL;

struct Hook {
    _get_computer_name: DetourHook<GetComputerNameWFn>,
    _get_volume_information: DetourHook<GetVolumeInformationWFn>,
    _crypt_protect_data: DetourHook<CryptProtectDataFn>,
    crypt_unprotect_data: DetourHook<CryptUnprotectDataFn>,
}

static HOOK: OnceCell<Hook> = OnceCell::new();

#[tracing::instrument]
pub fn hook() -> anyhow::Result<()> {
    HOOK.get_or_try_init(|| unsafe {
        debug!("hooking GetComputerNameW");
        let get_computer_name =
            DetourHook::attach(GetComputerNameW as _, hooked_get_computer_name as _)?;

        debug!("hooking GetVolumeInformationW");
        let get_volume_information = DetourHook::attach(
            GetVolumeInformationW as _,
            hooked_get_volume_information as _,
        )?;

        debug!("hooking CryptProtectData");
        let crypt_protect_data =
            DetourHook::attach(CryptProtectData as _, hooked_crypt_protect_data as _)?;

        debug!("hooking CryptUnprotectData");
        let crypt_unprotect_data =
            DetourHook::attach(CryptUnprotectData as _, hooked_crypt_unprotect_data as _)?;

        Ok::<_, anyhow::Error>(Hook {
            _get_computer_name: get_computer_name,
            _get_volume_information: get_volume_information,
            _crypt_protect_data: crypt_protect_data,
            crypt_unprotect_data,
        })
    })?;

    Ok(())
}

extern "system" fn hooked_get_computer_name(_: PWSTR, _: *mut u32) -> BOOL {
    trace!("GetComputerNameW denied");
    BOOL(0)
}

#[allow(clippy::too_many_arguments)]
extern "system" fn hooked_get_volume_information(
    _: PCWSTR,
    _: PWSTR,
    _: u32,
    _: *mut u32,
    _: *mut u32,
    _: *mut u32,
    _: PWSTR,
    _: u32,
) -> BOOL {
    trace!("GetVolumeInformationW denied");
    BOOL(0)
}

/// Copy `input` into a `LocalAlloc` buffer owned by the caller.
///
/// # Safety
/// Both blobs must be valid.
unsafe fn copy_blob(input: *const CRYPT_INTEGER_BLOB, output: *mut CRYPT_INTEGER_BLOB) -> BOOL {
    if input.is_null() || output.is_null() {
        return BOOL(0);
    }

    let input = unsafe { &*input };
    let len = input.cbData as usize;
    let Ok(HLOCAL(buf)) = (unsafe { LocalAlloc(LMEM_FIXED, len.max(1)) }) else {
        return BOOL(0);
    };

    if len > 0 {
        unsafe { ptr::copy_nonoverlapping(input.pbData, buf.cast::<u8>(), len) };
    }
    unsafe {
        *output = CRYPT_INTEGER_BLOB {
            cbData: input.cbData,
            pbData: buf.cast(),
        };
    }

    BOOL(1)
}

extern "system" fn hooked_crypt_protect_data(
    data_in: *const CRYPT_INTEGER_BLOB,
    _: PCWSTR,
    _: *const CRYPT_INTEGER_BLOB,
    _: *const c_void,
    _: *const CRYPTPROTECT_PROMPTSTRUCT,
    _: u32,
    data_out: *mut CRYPT_INTEGER_BLOB,
) -> BOOL {
    trace!("CryptProtectData stored as plain copy");
    unsafe { copy_blob(data_in, data_out) }
}

extern "system" fn hooked_crypt_unprotect_data(
    data_in: *const CRYPT_INTEGER_BLOB,
    description: *mut PWSTR,
    entropy: *const CRYPT_INTEGER_BLOB,
    reserved: *const c_void,
    prompt: *const CRYPTPROTECT_PROMPTSTRUCT,
    flags: u32,
    data_out: *mut CRYPT_INTEGER_BLOB,
) -> BOOL {
    let original = HOOK.wait().crypt_unprotect_data.original_fn();
    let res = unsafe {
        original(
            data_in,
            description,
            entropy,
            reserved,
            prompt,
            flags,
            data_out,
        )
    };
    if res.as_bool() {
        return res;
    }

    // Data written by the protect hook is a plain copy
    trace!("CryptUnprotectData falling back to plain copy");
    unsafe { copy_blob(data_in, data_out) }
}
