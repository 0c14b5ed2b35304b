//! Chromium `.pak` resource container.
//!
//! A pak file is a small header, a table of `{id, offset}` entries terminated by a
//! sentinel entry with id 0, an optional alias table (version 5), then the resource
//! bytes. Each resource spans from its offset to the next entry's offset.

pub mod patch;

use core::ops::Range;

use thiserror::Error;

pub use patch::{AboutPagePatch, GZIP_MAGIC, MIN_PATCH_SIZE, Rewrite, patch_resources};

const V4_HEADER_LEN: usize = 9;
const V5_HEADER_LEN: usize = 12;
const ENTRY_LEN: usize = 6;
const ALIAS_LEN: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PakError {
    #[error("pak data is truncated")]
    Truncated,

    #[error("unknown pak version {0}")]
    UnknownVersion(u32),

    #[error("invalid pak encoding {0}")]
    InvalidEncoding(u32),

    #[error("entry table has no sentinel")]
    MissingSentinel,

    #[error("resource {id} has invalid offset {offset}")]
    InvalidOffset { id: u16, offset: u32 },
}

/// Text encoding declared for the resources of a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Binary,
    Utf8,
    Utf16,
}

impl Encoding {
    fn from_raw(raw: u32) -> Result<Self, PakError> {
        Ok(match raw {
            0 => Encoding::Binary,
            1 => Encoding::Utf8,
            2 => Encoding::Utf16,
            _ => return Err(PakError::InvalidEncoding(raw)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PakHeader {
    pub version: u32,
    pub encoding: Encoding,
    pub resource_count: usize,
    pub alias_count: usize,
    /// Length of the fixed header, i.e. where the entry table starts.
    pub header_len: usize,
}

/// A resource and the byte range it occupies in the pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: u16,
    pub range: Range<usize>,
}

/// Parsed resource table of a pack. Holds offsets only, not the data.
#[derive(Debug, Clone)]
pub struct Pak {
    header: PakHeader,
    resources: Vec<Resource>,
}

impl Pak {
    pub fn parse(data: &[u8]) -> Result<Self, PakError> {
        let header = parse_header(data)?;

        // Counts come from the file and may overflow a 32-bit usize
        let table_len = header
            .resource_count
            .checked_add(1)
            .and_then(|entries| entries.checked_mul(ENTRY_LEN))
            .ok_or(PakError::Truncated)?;
        let table_end = header
            .header_len
            .checked_add(table_len)
            .ok_or(PakError::Truncated)?;
        let table = data
            .get(header.header_len..table_end)
            .ok_or(PakError::Truncated)?;
        let data_start = header
            .alias_count
            .checked_mul(ALIAS_LEN)
            .and_then(|aliases_len| table_end.checked_add(aliases_len))
            .ok_or(PakError::Truncated)?;
        if data_start > data.len() {
            return Err(PakError::Truncated);
        }

        let entries: Vec<(u16, u32)> = table
            .chunks_exact(ENTRY_LEN)
            .map(|entry| {
                (
                    u16::from_le_bytes([entry[0], entry[1]]),
                    u32::from_le_bytes([entry[2], entry[3], entry[4], entry[5]]),
                )
            })
            .collect();

        let Some(&(sentinel_id, _)) = entries.last() else {
            return Err(PakError::MissingSentinel);
        };
        if sentinel_id != 0 {
            return Err(PakError::MissingSentinel);
        }

        let mut resources = Vec::with_capacity(header.resource_count);
        for pair in entries.windows(2) {
            let (id, offset) = pair[0];
            let (_, next) = pair[1];
            let (start, end) = (offset as usize, next as usize);
            if start < data_start || end < start || end > data.len() {
                return Err(PakError::InvalidOffset { id, offset });
            }

            resources.push(Resource {
                id,
                range: start..end,
            });
        }

        Ok(Self { header, resources })
    }

    #[inline]
    pub fn header(&self) -> &PakHeader {
        &self.header
    }

    #[inline]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn get(&self, id: u16) -> Option<&Resource> {
        self.resources.iter().find(|res| res.id == id)
    }
}

fn parse_header(data: &[u8]) -> Result<PakHeader, PakError> {
    let version = read_u32(data, 0)?;

    match version {
        4 => {
            let resource_count = read_u32(data, 4)? as usize;
            let encoding = *data.get(8).ok_or(PakError::Truncated)?;

            Ok(PakHeader {
                version,
                encoding: Encoding::from_raw(encoding as u32)?,
                resource_count,
                alias_count: 0,
                header_len: V4_HEADER_LEN,
            })
        }

        5 => {
            let encoding = read_u32(data, 4)?;
            let resource_count = read_u16(data, 8)? as usize;
            let alias_count = read_u16(data, 10)? as usize;

            Ok(PakHeader {
                version,
                encoding: Encoding::from_raw(encoding)?,
                resource_count,
                alias_count,
                header_len: V5_HEADER_LEN,
            })
        }

        _ => Err(PakError::UnknownVersion(version)),
    }
}

fn read_u32(data: &[u8], at: usize) -> Result<u32, PakError> {
    let bytes = data.get(at..at + 4).ok_or(PakError::Truncated)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_u16(data: &[u8], at: usize) -> Result<u16, PakError> {
    let bytes = data.get(at..at + 2).ok_or(PakError::Truncated)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}
