//! In-place rewrite of gzip-compressed pack resources.
//!
//! The offset table is never touched: a rewritten resource has to fit the span of
//! the original. Gzip readers stop at the end of the member, so the span can be
//! padded with zeros as long as its last four bytes still hold the decompressed
//! size.

use std::io::{Read, Write};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use tracing::{debug, trace};

use crate::{Pak, PakError};

pub const GZIP_MAGIC: [u8; 3] = [0x1F, 0x8B, 0x08];

/// Smaller resources are never considered.
pub const MIN_PATCH_SIZE: usize = 10 * 1024;

const ISIZE_LEN: usize = 4;
const MAX_INFLATED_HINT: usize = 64 * 1024 * 1024;

/// A text transformation applied to a decompressed resource.
pub trait Rewrite {
    /// Returns the new text, or `None` if this resource is not the target.
    fn rewrite(&self, text: &str) -> Option<String>;
}

impl<F: Fn(&str) -> Option<String>> Rewrite for F {
    fn rewrite(&self, text: &str) -> Option<String> {
        self(text)
    }
}

/// Rewrite the first resource `rewrite` accepts. Returns its id.
pub fn patch_resources(data: &mut [u8], rewrite: &impl Rewrite) -> Result<Option<u16>, PakError> {
    let pak = Pak::parse(data)?;

    for res in pak.resources() {
        if patch_gzip_span(&mut data[res.range.clone()], rewrite) {
            debug!("patched resource {}", res.id);
            return Ok(Some(res.id));
        }
    }

    Ok(None)
}

/// Rewrite one gzip resource span in place. Leaves the span untouched on any failure.
pub fn patch_gzip_span(span: &mut [u8], rewrite: &impl Rewrite) -> bool {
    if span.len() < MIN_PATCH_SIZE || !span.starts_with(&GZIP_MAGIC) {
        return false;
    }

    let Some(text) = inflate(span) else {
        return false;
    };
    let Some(text) = rewrite.rewrite(&text) else {
        return false;
    };

    let compressed = match deflate(text.as_bytes()) {
        Ok(compressed) => compressed,
        Err(err) => {
            debug!("failed to recompress resource. err: {err}");
            return false;
        }
    };

    let len = compressed.len();
    if len == span.len() {
        span.copy_from_slice(&compressed);
    } else if len + ISIZE_LEN <= span.len() {
        let (head, rest) = span.split_at_mut(len);
        head.copy_from_slice(&compressed);
        rest.fill(0);

        let isize_at = span.len() - ISIZE_LEN;
        span[isize_at..].copy_from_slice(&(text.len() as u32).to_le_bytes());
    } else {
        debug!(
            "patched resource does not fit. span: {} compressed: {len}",
            span.len()
        );
        return false;
    }

    true
}

fn inflate(span: &[u8]) -> Option<String> {
    let isize_at = span.len().checked_sub(ISIZE_LEN)?;
    let hint = u32::from_le_bytes([
        span[isize_at],
        span[isize_at + 1],
        span[isize_at + 2],
        span[isize_at + 3],
    ]) as usize;

    let mut out = Vec::with_capacity(hint.min(MAX_INFLATED_HINT));
    if let Err(err) = GzDecoder::new(span).read_to_end(&mut out) {
        trace!("skipping undecodable gzip resource. err: {err}");
        return None;
    }

    String::from_utf8(out).ok()
}

fn deflate(text: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(text)?;
    encoder.finish()
}

const COPYRIGHT_MARKER: &str = r#"id="product-copyright">"#;

const HIDDEN_REWRITES: [(&str, &str); 2] = [
    (
        r#"id="updateStatusMessage" hidden="[[!showUpdateStatus_]]""#,
        r#"id="updateStatusMessage" hidden"#,
    ),
    (
        r#"id="deprecationWarning" hidden="[[!obsoleteSystemInfo_.obsolete]]""#,
        r#"id="deprecationWarning" hidden"#,
    ),
];

/// Branding and update-status rewrite of the browser's about page.
#[derive(Debug, Clone)]
pub struct AboutPagePatch {
    label: String,
}

impl AboutPagePatch {
    pub fn new(version: &str) -> Self {
        Self {
            label: format!("browser-plus {version}<br>"),
        }
    }
}

impl Rewrite for AboutPagePatch {
    fn rewrite(&self, html: &str) -> Option<String> {
        let at = html.find(COPYRIGHT_MARKER)? + COPYRIGHT_MARKER.len();

        let mut out = String::with_capacity(html.len() + self.label.len());
        out.push_str(&html[..at]);
        out.push_str(&self.label);
        out.push_str(&html[at..]);

        for (from, to) in HIDDEN_REWRITES {
            out = out.replacen(from, to, 1);
        }

        Some(out)
    }
}
