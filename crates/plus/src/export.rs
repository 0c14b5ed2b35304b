//! Export table redirection.
//!
//! The dll ships a table of placeholder exports. At attach time every placeholder
//! also exported by the real system library is overwritten with a jump to the system
//! implementation, so callers linking against this module reach the real code.

use anyhow::Context;
use goblin::pe::{PE, options::ParseOptions};
use tracing::{debug, trace, warn};

/// A named export of a loaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub name: String,
    /// Address relative to the image base.
    pub rva: u32,
}

/// Named exports of an image mapped in memory, forwarders excluded.
pub fn parse_exports(image: &[u8]) -> anyhow::Result<Vec<ExportEntry>> {
    let mut opts = ParseOptions::default();
    // Mapped image: relative addresses are offsets.
    opts.resolve_rva = false;
    opts.parse_attribute_certificates = false;

    let pe = PE::parse_with_opts(image, &opts).context("cannot parse image headers")?;

    let exports = pe
        .exports
        .iter()
        .filter(|export| export.reexport.is_none())
        .filter_map(|export| {
            Some(ExportEntry {
                name: export.name?.to_owned(),
                rva: u32::try_from(export.rva).ok()?,
            })
        })
        .collect();

    Ok(exports)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86,
    X64,
    Arm64,
}

impl Arch {
    pub const fn current() -> Option<Arch> {
        if cfg!(target_arch = "x86_64") {
            Some(Arch::X64)
        } else if cfg!(target_arch = "x86") {
            Some(Arch::X86)
        } else if cfg!(target_arch = "aarch64") {
            Some(Arch::Arm64)
        } else {
            None
        }
    }
}

/// Machine code for an unconditional jump placed at `at` that lands on `dest`.
///
/// 64-bit targets load the absolute address into a scratch register. x86 uses a
/// relative jump, which wraps within the 32-bit address space; `None` if either
/// address does not fit in it.
pub fn encode_jump(arch: Arch, at: usize, dest: usize) -> Option<Vec<u8>> {
    let code = match arch {
        Arch::X64 => {
            // mov rax, imm64; jmp rax
            let mut code = vec![0x48, 0xB8];
            code.extend_from_slice(&(dest as u64).to_le_bytes());
            code.extend_from_slice(&[0xFF, 0xE0]);
            code
        }

        Arch::X86 => {
            let at = u32::try_from(at).ok()?;
            let dest = u32::try_from(dest).ok()?;
            // jmp rel32
            let rel = dest.wrapping_sub(at.wrapping_add(5));
            let mut code = vec![0xE9];
            code.extend_from_slice(&rel.to_le_bytes());
            code
        }

        Arch::Arm64 => {
            // ldr x16, #8; br x16; .quad dest
            let mut code = vec![0x50, 0x00, 0x00, 0x58, 0x00, 0x02, 0x1F, 0xD6];
            code.extend_from_slice(&(dest as u64).to_le_bytes());
            code
        }
    };

    Some(code)
}

/// Places machine code into executable memory.
pub trait CodeWriter {
    /// Write `code` at `at`, making it visible to instruction fetch.
    ///
    /// # Safety
    /// `at..at + code.len()` must be mapped code nothing executes during the write.
    unsafe fn write_code(&self, at: usize, code: &[u8]) -> bool;
}

pub struct ExportPatcher<W> {
    base: usize,
    exports: Vec<ExportEntry>,
    arch: Arch,
    writer: W,
}

impl<W: CodeWriter> ExportPatcher<W> {
    /// # Safety
    /// `base` must be the load address of the image `exports` were read from, and
    /// every export must have room for the longest jump of `arch`.
    pub unsafe fn new(base: usize, exports: Vec<ExportEntry>, arch: Arch, writer: W) -> Self {
        Self {
            base,
            exports,
            arch,
            writer,
        }
    }

    pub fn exports(&self) -> &[ExportEntry] {
        &self.exports
    }

    /// Make export `name` jump to `destination`.
    pub fn redirect(&self, name: &str, destination: usize) -> bool {
        let Some(export) = self.exports.iter().find(|export| export.name == name) else {
            return false;
        };

        let at = self.base + export.rva as usize;
        let Some(code) = encode_jump(self.arch, at, destination) else {
            warn!("cannot encode jump from {at:#x} to {destination:#x}");
            return false;
        };

        trace!("redirecting {name} at {at:#x} to {destination:#x}");
        // SAFETY: `new` guarantees `at` is a patchable export of this image
        unsafe { self.writer.write_code(at, &code) }
    }

    /// Redirect every export `resolve` knows a destination for. Returns how many were patched.
    pub fn forward_all(&self, resolve: impl Fn(&str) -> Option<usize>) -> usize {
        let mut patched = 0;
        for export in &self.exports {
            let Some(destination) = resolve(&export.name) else {
                debug!("{} has no system counterpart", export.name);
                continue;
            };

            if self.redirect(&export.name, destination) {
                patched += 1;
            }
        }

        patched
    }
}
