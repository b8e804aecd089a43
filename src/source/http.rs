//! HTTP range-request source.
//!
//! One HEAD request captures the length and a revalidation token (ETag,
//! else Last-Modified). Every GET sends that token as `If-Range`, so a
//! resource that changes mid-download comes back as a full `200` response
//! instead of `206` and the download fails instead of mixing versions.

use super::{RangeReader, RangeSource};
use crate::config::HttpConfig;
use crate::{DownloadError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{
    HeaderMap, HeaderName, ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, ETAG, IF_RANGE,
    LAST_MODIFIED, RANGE,
};
use reqwest::{Client, StatusCode, Url};
use std::io;
use std::time::Duration;
use tokio_util::io::StreamReader;

/// Length and revalidation token captured from the HEAD response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMetadata {
    /// Total length in bytes.
    pub size: u64,
    /// Value sent as `If-Range` on every GET.
    pub validator: String,
}

/// [`RangeSource`] backed by HTTP range requests.
pub struct HttpSource {
    client: Client,
    url: Url,
    metadata: Option<RemoteMetadata>,
}

impl HttpSource {
    /// Create a source with a client built from `config`.
    pub fn new(url: Url, config: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self::with_client(builder.build()?, url))
    }

    /// Create a source using an existing client.
    pub fn with_client(client: Client, url: Url) -> Self {
        Self {
            client,
            url,
            metadata: None,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Metadata from the HEAD request, if it has been made.
    pub fn metadata(&self) -> Option<&RemoteMetadata> {
        self.metadata.as_ref()
    }

    async fn prepare(&mut self) -> Result<RemoteMetadata> {
        if let Some(metadata) = &self.metadata {
            return Ok(metadata.clone());
        }

        tracing::info!("Sending HEAD request to {}", self.url);
        let response = self.client.head(self.url.clone()).send().await?;
        log_headers(response.status(), response.headers());

        if response.status() != StatusCode::OK {
            return Err(DownloadError::unavailable(format!(
                "HEAD {} returned {}, expected 200 OK",
                self.url,
                response.status()
            )));
        }

        let metadata = parse_metadata(response.headers())?;
        tracing::debug!(size = metadata.size, validator = %metadata.validator, "Remote metadata");
        self.metadata = Some(metadata.clone());
        Ok(metadata)
    }
}

#[async_trait]
impl RangeSource for HttpSource {
    async fn size(&mut self) -> Result<u64> {
        Ok(self.prepare().await?.size)
    }

    async fn read_range(&mut self, from: u64, count: u64) -> Result<RangeReader> {
        let metadata = self.prepare().await?;
        if count == 0 {
            return Ok(Box::new(tokio::io::empty()));
        }
        let last = from + count - 1;

        tracing::debug!(
            "Sending GET request to {} from {} with size {}",
            self.url,
            from,
            count
        );
        let response = self
            .client
            .get(self.url.clone())
            .header(IF_RANGE, metadata.validator.as_str())
            .header(RANGE, format!("bytes={}-{}", from, last))
            .send()
            .await?;
        log_headers(response.status(), response.headers());

        if response.status() != StatusCode::PARTIAL_CONTENT {
            return Err(DownloadError::range_mismatch(format!(
                "GET bytes={}-{} returned {}, expected 206 Partial Content",
                from,
                last,
                response.status()
            )));
        }

        let expected = format!("bytes {}-{}/{}", from, last, metadata.size);
        let actual = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if actual != expected {
            return Err(DownloadError::range_mismatch(format!(
                "wrong range in server response: expected '{}', got '{}'",
                expected, actual
            )));
        }

        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        Ok(Box::new(StreamReader::new(Box::pin(body))))
    }
}

/// Extract length and revalidation token from HEAD response headers.
fn parse_metadata(headers: &HeaderMap) -> Result<RemoteMetadata> {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    };

    match header(ACCEPT_RANGES) {
        Some(ranges) if ranges.eq_ignore_ascii_case("bytes") => {}
        _ => {
            return Err(DownloadError::unavailable(
                "No Accept-Ranges: bytes in server response",
            ))
        }
    }

    let size = header(CONTENT_LENGTH)
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| DownloadError::unavailable("No Content-Length in server response"))?;

    let validator = header(ETAG)
        .or_else(|| header(LAST_MODIFIED))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            DownloadError::unavailable("No ETag or Last-Modified in server response")
        })?;

    Ok(RemoteMetadata {
        size,
        validator: validator.to_string(),
    })
}

fn log_headers(status: StatusCode, headers: &HeaderMap) {
    tracing::debug!(%status, "Got HTTP response");
    for (name, value) in headers {
        tracing::trace!("  {} = {:?}", name, value);
    }
}
