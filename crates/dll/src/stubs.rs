//! Exports mirroring the system `version.dll`.
//!
//! Every body is a fixed 16 byte placeholder. On attach each one is overwritten
//! with a jump to the matching export of the system library, so the code here
//! only runs if forwarding failed.

use core::arch::naked_asm;

macro_rules! stubs {
    ($($name:ident),* $(,)?) => {
        $(
            #[unsafe(naked)]
            #[unsafe(no_mangle)]
            #[allow(non_snake_case)]
            pub extern "C" fn $name() {
                #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
                naked_asm!("xor eax, eax", "ret", ".fill 13, 1, 0xcc");

                #[cfg(target_arch = "aarch64")]
                naked_asm!("mov w0, #0", "ret", ".fill 2, 4, 0");
            }
        )*
    };
}

stubs!(
    GetFileVersionInfoA,
    GetFileVersionInfoByHandle,
    GetFileVersionInfoExA,
    GetFileVersionInfoExW,
    GetFileVersionInfoSizeA,
    GetFileVersionInfoSizeExA,
    GetFileVersionInfoSizeExW,
    GetFileVersionInfoSizeW,
    GetFileVersionInfoW,
    VerFindFileA,
    VerFindFileW,
    VerInstallFileA,
    VerInstallFileW,
    VerLanguageNameA,
    VerLanguageNameW,
    VerQueryValueA,
    VerQueryValueW,
);
