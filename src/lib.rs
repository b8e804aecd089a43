//! Faststart - Download MP4 files over HTTP as fast-start files
//!
//! Files whose `moov` box sits at the end are rewritten on the fly so that
//! `moov` follows `ftyp`, using only HTTP range requests and a single
//! sequential pass over the output.
//!
//! The binary-format work lives in `faststart-media`; this crate provides
//! the byte sources, the download orchestration and configuration.

pub mod config;
pub mod download;
pub mod error;
pub mod request;
pub mod source;

pub use download::{DownloadReport, Downloader, Layout, Progress, Stage};
pub use error::{DownloadError, ErrorKind, Result};
pub use request::{output_name_from_url, DownloadRequest};
pub use source::{HttpSource, MemorySource, RangeSource};

/// Download `request.url` to `request.output` over HTTP range requests.
pub async fn fetch(request: &DownloadRequest, config: &config::Config) -> Result<DownloadReport> {
    let source = HttpSource::new(request.url.clone(), &config.http)?;
    let mut download = config.download.clone();
    download.max_bytes = request.max_bytes;

    tracing::info!(
        "Downloading {} to {}",
        request.url,
        request.output.display()
    );
    Downloader::new(source, download)
        .download_to_path(&request.output)
        .await
}
