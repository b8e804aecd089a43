//! Chunk offset table fixup (stco/co64).
//!
//! Both tables share one layout: version/flags (4 bytes), entry count
//! (4 bytes), then `count` big-endian offsets that are absolute positions
//! in the file. Relocating moov shifts every one of them by the same delta.

use super::BoxType;
use crate::{Error, Result};

/// Byte offset of the entry count inside the table payload.
const ENTRY_COUNT_OFFSET: usize = 4;

/// Byte offset of the first entry inside the table payload.
const ENTRIES_OFFSET: usize = 8;

/// Chunk offset table flavor, selected by box type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOffsets {
    /// `stco`: 32-bit entries.
    Stco,
    /// `co64`: 64-bit entries.
    Co64,
}

impl ChunkOffsets {
    /// Pick the table flavor for a box type, if it is a chunk offset table.
    pub fn from_box_type(box_type: BoxType) -> Option<Self> {
        match box_type {
            BoxType::STCO => Some(Self::Stco),
            BoxType::CO64 => Some(Self::Co64),
            _ => None,
        }
    }

    /// Box type code of this flavor.
    pub fn box_type(&self) -> BoxType {
        match self {
            Self::Stco => BoxType::STCO,
            Self::Co64 => BoxType::CO64,
        }
    }

    /// Width of one entry in bytes.
    pub fn entry_size(&self) -> usize {
        match self {
            Self::Stco => 4,
            Self::Co64 => 8,
        }
    }

    /// Add `delta` to every entry of the table payload.
    ///
    /// Returns the number of entries rewritten.
    pub fn apply(&self, payload: &mut [u8], delta: u64) -> Result<u32> {
        match self {
            Self::Stco => fixup_stco(payload, delta),
            Self::Co64 => fixup_co64(payload, delta),
        }
    }

    /// Decode all entries of the table payload.
    pub fn read(&self, payload: &[u8]) -> Result<Vec<u64>> {
        let entries = self.entries(payload)?;
        Ok(entries
            .chunks_exact(self.entry_size())
            .map(|entry| match self {
                Self::Stco => u32::from_be_bytes([entry[0], entry[1], entry[2], entry[3]]) as u64,
                Self::Co64 => u64::from_be_bytes([
                    entry[0], entry[1], entry[2], entry[3], entry[4], entry[5], entry[6],
                    entry[7],
                ]),
            })
            .collect())
    }

    /// Validate the declared entry count and return the entry bytes.
    fn entries<'a>(&self, payload: &'a [u8]) -> Result<&'a [u8]> {
        let end = self.entries_end(payload)?;
        Ok(&payload[ENTRIES_OFFSET..end])
    }

    fn entries_end(&self, payload: &[u8]) -> Result<usize> {
        if payload.len() < ENTRIES_OFFSET {
            return Err(Error::truncated(
                self.box_type(),
                ENTRIES_OFFSET as u64,
                payload.len() as u64,
            ));
        }
        let count = u32::from_be_bytes([
            payload[ENTRY_COUNT_OFFSET],
            payload[ENTRY_COUNT_OFFSET + 1],
            payload[ENTRY_COUNT_OFFSET + 2],
            payload[ENTRY_COUNT_OFFSET + 3],
        ]);
        let need = ENTRIES_OFFSET as u64 + count as u64 * self.entry_size() as u64;
        if need > payload.len() as u64 {
            return Err(Error::truncated(self.box_type(), need, payload.len() as u64));
        }
        Ok(need as usize)
    }
}

/// Add `delta` to every entry of an `stco` payload.
///
/// Fails with [`Error::OffsetOverflow`] if any entry would exceed `u32::MAX`;
/// the table is left untouched in that case.
pub fn fixup_stco(payload: &mut [u8], delta: u64) -> Result<u32> {
    let end = ChunkOffsets::Stco.entries_end(payload)?;
    let entries = &mut payload[ENTRIES_OFFSET..end];

    for (index, entry) in entries.chunks_exact(4).enumerate() {
        let offset = u32::from_be_bytes([entry[0], entry[1], entry[2], entry[3]]) as u64;
        if offset
            .checked_add(delta)
            .map_or(true, |shifted| shifted > u32::MAX as u64)
        {
            return Err(Error::OffsetOverflow {
                box_type: BoxType::STCO.to_string(),
                index: index as u32,
                offset,
                delta,
            });
        }
    }

    let mut count = 0;
    for entry in entries.chunks_exact_mut(4) {
        let offset = u32::from_be_bytes([entry[0], entry[1], entry[2], entry[3]]);
        entry.copy_from_slice(&(offset + delta as u32).to_be_bytes());
        count += 1;
    }
    Ok(count)
}

/// Add `delta` to every entry of a `co64` payload.
pub fn fixup_co64(payload: &mut [u8], delta: u64) -> Result<u32> {
    let end = ChunkOffsets::Co64.entries_end(payload)?;
    let entries = &mut payload[ENTRIES_OFFSET..end];

    for (index, entry) in entries.chunks_exact(8).enumerate() {
        let offset = read_u64(entry);
        if offset.checked_add(delta).is_none() {
            return Err(Error::OffsetOverflow {
                box_type: BoxType::CO64.to_string(),
                index: index as u32,
                offset,
                delta,
            });
        }
    }

    let mut count = 0;
    for entry in entries.chunks_exact_mut(8) {
        let offset = read_u64(entry);
        entry.copy_from_slice(&(offset + delta).to_be_bytes());
        count += 1;
    }
    Ok(count)
}

fn read_u64(entry: &[u8]) -> u64 {
    u64::from_be_bytes([
        entry[0], entry[1], entry[2], entry[3], entry[4], entry[5], entry[6], entry[7],
    ])
}
