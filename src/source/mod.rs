//! Random-access byte sources.
//!
//! A [`RangeSource`] answers "give me `count` bytes starting at `from`" and
//! guarantees the bytes belong to one unchanged version of the resource.

mod http;
mod memory;

pub use http::{HttpSource, RemoteMetadata};
pub use memory::MemorySource;

use crate::{DownloadError, Result};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Body of one range read.
pub type RangeReader = Box<dyn AsyncRead + Send + Unpin>;

/// Random-access source of bytes.
///
/// Calls take `&mut self`: one read is in flight at a time, and
/// implementations may cache metadata from the first call.
#[async_trait]
pub trait RangeSource: Send {
    /// Total length of the resource.
    async fn size(&mut self) -> Result<u64>;

    /// Stream exactly `count` bytes starting at `from`.
    async fn read_range(&mut self, from: u64, count: u64) -> Result<RangeReader>;
}

#[async_trait]
impl<S: RangeSource + ?Sized> RangeSource for Box<S> {
    async fn size(&mut self) -> Result<u64> {
        (**self).size().await
    }

    async fn read_range(&mut self, from: u64, count: u64) -> Result<RangeReader> {
        (**self).read_range(from, count).await
    }
}

/// Read a small range fully into memory.
///
/// A body shorter than `count` is a [`DownloadError::RangeMismatch`].
pub async fn read_exact_range<S>(source: &mut S, from: u64, count: u64) -> Result<Vec<u8>>
where
    S: RangeSource + ?Sized,
{
    let mut reader = source.read_range(from, count).await?;
    let mut buf = vec![0u8; count as usize];
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(DownloadError::range_mismatch(format!(
                "body for bytes {}-{} ended after {} of {} bytes",
                from,
                from + count - 1,
                filled,
                count
            )));
        }
        filled += n;
    }
    Ok(buf)
}
