//! Backward tail scan for a trailing moov box.
//!
//! The scanner does no I/O. It hands out the byte ranges it wants next
//! ([`TailScanner::next_request`]) and is fed the bytes for each
//! ([`TailScanner::feed`]), so it can be driven by any random-access source.
//!
//! A candidate is accepted only if its declared size equals the distance
//! from the candidate start to EOF. The literal bytes `moov` inside media
//! data almost never carry a size that lands exactly on the end of the file.

use crate::mp4::BoxType;
use crate::{Error, Result};

/// Default cap on how far from EOF the scan may reach (50 MiB).
pub const DEFAULT_SEARCH_LIMIT: u64 = 50 * 1024 * 1024;

/// Default size of one backward step (2 MiB).
pub const DEFAULT_SEARCH_STEP: u64 = 2 * 1024 * 1024;

/// Absolute byte range in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte.
    pub start: u64,
    /// Number of bytes.
    pub len: u64,
}

impl ByteRange {
    /// One past the last byte.
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// A moov box found at the tail of the file.
#[derive(Debug, Clone)]
pub struct MoovMatch {
    /// Absolute offset of the box in the source file.
    pub offset: u64,
    /// Declared box size.
    pub size: u64,
    /// Bytes between the end of the box and EOF.
    pub trailing: u64,
    /// The complete box, header included.
    pub bytes: Vec<u8>,
}

/// Step-driven backward scanner over the last `search_limit` bytes of a file.
pub struct TailScanner {
    file_size: u64,
    step: usize,
    /// Right-aligned to EOF; `buf.len()` is the window cap.
    buf: Vec<u8>,
    /// Bytes filled from the end of `buf`.
    fetched: usize,
}

impl TailScanner {
    /// Create a scanner for a file of `file_size` bytes.
    ///
    /// The window is capped at `min(search_limit, file_size)`.
    pub fn new(file_size: u64, search_limit: u64, step: u64) -> Self {
        let window = search_limit.min(file_size) as usize;
        let step = (step as usize).clamp(1, window.max(1));
        Self {
            file_size,
            step,
            buf: vec![0u8; window],
            fetched: 0,
        }
    }

    /// Size of the window this scanner may cover.
    pub fn window(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Bytes fetched so far, counted from EOF.
    pub fn searched(&self) -> u64 {
        self.fetched as u64
    }

    /// Next range to fetch, or `None` once the window is exhausted.
    pub fn next_request(&self) -> Option<ByteRange> {
        let remaining = self.buf.len() - self.fetched;
        if remaining == 0 {
            return None;
        }
        let len = self.step.min(remaining) as u64;
        Some(ByteRange {
            start: self.file_size - self.fetched as u64 - len,
            len,
        })
    }

    /// Error to report once the window is exhausted without a match.
    pub fn not_found(&self) -> Error {
        Error::MoovNotFound {
            searched: self.searched(),
        }
    }

    /// Feed the bytes for the range returned by [`next_request`](Self::next_request).
    ///
    /// Returns the moov box if a self-consistent header starts inside the
    /// newly covered range.
    pub fn feed(&mut self, data: &[u8]) -> Result<Option<MoovMatch>> {
        let request = self.next_request().ok_or_else(|| self.not_found())?;
        if data.len() as u64 != request.len {
            return Err(Error::truncated("tail window", request.len, data.len() as u64));
        }

        let window = self.buf.len();
        let prev_lo = window - self.fetched;
        let new_lo = prev_lo - data.len();
        self.buf[new_lo..prev_lo].copy_from_slice(data);
        self.fetched += data.len();

        tracing::debug!(
            from = request.start,
            len = request.len,
            searched = self.fetched,
            window,
            "Scanning tail step for 'moov'"
        );

        // Headers starting near prev_lo read up to 15 bytes of the previous step.
        for start in (new_lo..prev_lo).rev() {
            if let Some(size) = self.consistent_moov_at(start) {
                return Ok(Some(self.take_match(start, size)));
            }
        }
        Ok(None)
    }

    /// Declared size of a moov header at `start` whose box ends exactly at EOF.
    fn consistent_moov_at(&self, start: usize) -> Option<u64> {
        let buf = &self.buf;
        let distance = (buf.len() - start) as u64;
        if distance < 8 || buf[start + 4..start + 8] != BoxType::MOOV.0 {
            return None;
        }
        let size32 = u32::from_be_bytes([
            buf[start],
            buf[start + 1],
            buf[start + 2],
            buf[start + 3],
        ]) as u64;
        if size32 == distance {
            return Some(size32);
        }
        if size32 == 1 && distance >= 16 {
            let mut large = [0u8; 8];
            large.copy_from_slice(&buf[start + 8..start + 16]);
            let size = u64::from_be_bytes(large);
            if size == distance {
                return Some(size);
            }
        }
        None
    }

    fn take_match(&mut self, start: usize, size: u64) -> MoovMatch {
        let offset = self.file_size - (self.buf.len() - start) as u64;
        let end = start + size as usize;
        let bytes = self.buf[start..end].to_vec();
        tracing::debug!(offset, size, "Found 'moov' box at tail");
        MoovMatch {
            offset,
            size,
            trailing: self.file_size - offset - size,
            bytes,
        }
    }
}

/// Run a tail scan over a file that is already in memory.
pub fn locate_moov_in(file: &[u8], search_limit: u64, step: u64) -> Result<MoovMatch> {
    let mut scanner = TailScanner::new(file.len() as u64, search_limit, step);
    while let Some(range) = scanner.next_request() {
        let chunk = &file[range.start as usize..range.end() as usize];
        if let Some(found) = scanner.feed(chunk)? {
            return Ok(found);
        }
    }
    Err(scanner.not_found())
}
