//! In-memory source.

use super::{RangeReader, RangeSource};
use crate::{DownloadError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use faststart_media::ByteRange;
use std::io::Cursor;

/// Serves ranges of a buffer and records every request.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
    requests: Vec<ByteRange>,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            requests: Vec::new(),
        }
    }

    /// Ranges requested so far, in order.
    pub fn requests(&self) -> &[ByteRange] {
        &self.requests
    }

    /// Total bytes requested across all reads.
    pub fn bytes_requested(&self) -> u64 {
        self.requests.iter().map(|r| r.len).sum()
    }
}

#[async_trait]
impl RangeSource for MemorySource {
    async fn size(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    async fn read_range(&mut self, from: u64, count: u64) -> Result<RangeReader> {
        let size = self.data.len() as u64;
        let end = from
            .checked_add(count)
            .filter(|&end| end <= size)
            .ok_or_else(|| {
                DownloadError::range_mismatch(format!(
                    "requested {} bytes at {} from a {}-byte source",
                    count, from, size
                ))
            })?;
        self.requests.push(ByteRange { start: from, len: count });
        let body = self.data.slice(from as usize..end as usize);
        Ok(Box::new(Cursor::new(body)))
    }
}
