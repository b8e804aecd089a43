//! Box tree walking and moov offset fixup.
//!
//! Sibling boxes are visited by parsing a header, handing the whole box to
//! the caller, then skipping `size` bytes. Payloads are never interpreted
//! unless the caller recurses into them, so unknown boxes cost nothing.

use super::{BoxHeader, BoxType, ChunkOffsets};
use crate::{Error, Result};

/// Containers descended into, in order, on the way from moov to the
/// chunk offset tables.
const CHUNK_OFFSET_PATH: [BoxType; 4] = [
    BoxType::TRAK,
    BoxType::MDIA,
    BoxType::MINF,
    BoxType::STBL,
];

/// One whole box (header + payload) inside a mutable buffer.
#[derive(Debug)]
pub struct BoxRegion<'a> {
    /// Parsed header of the box.
    pub header: BoxHeader,
    /// Header and payload bytes.
    pub bytes: &'a mut [u8],
}

impl<'a> BoxRegion<'a> {
    /// Payload bytes (after the header).
    pub fn payload(&self) -> &[u8] {
        &self.bytes[self.header.header_size()..]
    }

    /// Mutable payload bytes (after the header).
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let start = self.header.header_size();
        &mut self.bytes[start..]
    }
}

/// Iterate over sibling boxes in `region`, calling `on_child` for each.
///
/// Fails with [`Error::TruncatedBox`] if a header or a declared size runs
/// past the end of `region`.
pub fn walk_children<F>(region: &mut [u8], mut on_child: F) -> Result<()>
where
    F: FnMut(BoxRegion<'_>) -> Result<()>,
{
    let mut cursor = 0usize;
    while cursor < region.len() {
        let (header, end) = child_bounds(region, cursor)?;
        on_child(BoxRegion {
            header,
            bytes: &mut region[cursor..end],
        })?;
        cursor = end;
    }
    Ok(())
}

/// Read-only iterator over sibling boxes.
///
/// Yields each header with the whole box bytes. Stops after the first error.
pub struct BoxIter<'a> {
    region: &'a [u8],
    cursor: usize,
    failed: bool,
}

impl<'a> BoxIter<'a> {
    /// Iterate over the boxes in `region`.
    pub fn new(region: &'a [u8]) -> Self {
        Self {
            region,
            cursor: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for BoxIter<'a> {
    type Item = Result<(BoxHeader, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.region.len() {
            return None;
        }
        match child_bounds(self.region, self.cursor) {
            Ok((header, end)) => {
                let bytes = &self.region[self.cursor..end];
                self.cursor = end;
                Some(Ok((header, bytes)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse the header at `cursor` and return it with the end offset of the box.
fn child_bounds(region: &[u8], cursor: usize) -> Result<(BoxHeader, usize)> {
    let (header, _) = BoxHeader::parse(&region[cursor..])?;
    let available = (region.len() - cursor) as u64;
    if header.size > available {
        return Err(Error::truncated(header.box_type, header.size, available));
    }
    Ok((header, cursor + header.size as usize))
}

/// Counters collected while rewriting a moov box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixupSummary {
    /// Number of `trak` boxes visited.
    pub tracks: u32,
    /// Number of stco/co64 tables rewritten.
    pub tables: u32,
    /// Total number of entries rewritten.
    pub entries: u64,
}

/// Add `delta` to every chunk offset in a complete moov box.
///
/// Only `moov → trak → mdia → minf → stbl → {stco | co64}` is followed;
/// every other box is skipped by size. All tracks are visited.
pub fn fixup_moov_offsets(moov: &mut [u8], delta: u64) -> Result<FixupSummary> {
    let (header, payload) = split_moov(moov)?;
    let mut summary = FixupSummary::default();
    fixup_level(payload, 0, delta, &mut summary)?;
    tracing::debug!(
        box_type = %header.box_type,
        tracks = summary.tracks,
        tables = summary.tables,
        entries = summary.entries,
        delta,
        "Rewrote chunk offsets"
    );
    Ok(summary)
}

fn split_moov(moov: &mut [u8]) -> Result<(BoxHeader, &mut [u8])> {
    let (header, header_size) = moov_header(moov)?;
    let end = header.size as usize;
    Ok((header, &mut moov[header_size..end]))
}

/// Parse the top header, requiring a moov box that fits in `moov`.
fn moov_header(moov: &[u8]) -> Result<(BoxHeader, usize)> {
    let (header, header_size) = BoxHeader::parse(moov)?;
    if header.box_type != BoxType::MOOV {
        return Err(Error::malformed(format!(
            "expected 'moov' box, found '{}'",
            header.box_type
        )));
    }
    if header.size > moov.len() as u64 {
        return Err(Error::truncated(
            header.box_type,
            header.size,
            moov.len() as u64,
        ));
    }
    Ok((header, header_size))
}

fn fixup_level(
    region: &mut [u8],
    depth: usize,
    delta: u64,
    summary: &mut FixupSummary,
) -> Result<()> {
    walk_children(region, |mut child| match CHUNK_OFFSET_PATH.get(depth) {
        Some(&container) if child.header.box_type == container => {
            if container == BoxType::TRAK {
                summary.tracks += 1;
            }
            tracing::trace!(box_type = %container, depth, "Descending");
            fixup_level(child.payload_mut(), depth + 1, delta, summary)
        }
        Some(_) => Ok(()),
        None => {
            if let Some(table) = ChunkOffsets::from_box_type(child.header.box_type) {
                let entries = table.apply(child.payload_mut(), delta)?;
                tracing::trace!(box_type = %child.header.box_type, entries, "Rewrote table");
                summary.tables += 1;
                summary.entries += entries as u64;
            }
            Ok(())
        }
    })
}

/// Decode every chunk offset table in a complete moov box, in track order.
pub fn chunk_offsets(moov: &[u8]) -> Result<Vec<(ChunkOffsets, Vec<u64>)>> {
    let (header, header_size) = moov_header(moov)?;
    let mut tables = Vec::new();
    collect_level(&moov[header_size..header.size as usize], 0, &mut tables)?;
    Ok(tables)
}

fn collect_level(
    region: &[u8],
    depth: usize,
    tables: &mut Vec<(ChunkOffsets, Vec<u64>)>,
) -> Result<()> {
    for child in BoxIter::new(region) {
        let (header, bytes) = child?;
        let payload = &bytes[header.header_size()..];
        match CHUNK_OFFSET_PATH.get(depth) {
            Some(&container) if header.box_type == container => {
                collect_level(payload, depth + 1, tables)?;
            }
            Some(_) => {}
            None => {
                if let Some(table) = ChunkOffsets::from_box_type(header.box_type) {
                    tables.push((table, table.read(payload)?));
                }
            }
        }
    }
    Ok(())
}
