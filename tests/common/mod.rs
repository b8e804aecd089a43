//! Shared fixtures for integration tests.
//!
//! Builds synthetic MP4 files and serves them from a [`MockServer`] that
//! answers HEAD and ranged GET requests the way a static file server does.

#![allow(dead_code)]

use faststart_media::mp4::writer::{container, ftyp_box, leaf, stco_box, track_with_table};
use faststart_media::BoxType;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const VIDEO_PATH: &str = "/media/clip.mp4";
pub const ETAG: &str = "\"clip-v1\"";

/// Offset of the mdat payload in files built here.
pub const MDAT_PAYLOAD: u32 = 28;

pub fn ftyp() -> Vec<u8> {
    ftyp_box(b"isom", 512, &[*b"isom"])
}

pub fn moov(offsets: &[u32]) -> Vec<u8> {
    container(
        BoxType::MOOV,
        &[
            leaf(BoxType::MVHD, &[0u8; 100]),
            track_with_table(stco_box(offsets)),
        ],
    )
}

pub fn mdat(len: usize) -> Vec<u8> {
    let payload: Vec<u8> = (0..len).map(|i| (i * 7 % 251) as u8).collect();
    leaf(BoxType::MDAT, &payload)
}

/// `ftyp, mdat, moov`: needs relocation.
pub fn tail_moov_file(mdat_len: usize, offsets: &[u32]) -> Vec<u8> {
    [ftyp(), mdat(mdat_len), moov(offsets)].concat()
}

/// `ftyp, moov, mdat`: already fast-start.
pub fn fast_start_file(mdat_len: usize) -> Vec<u8> {
    let moov_len = moov(&[0]).len() as u32;
    [ftyp(), moov(&[MDAT_PAYLOAD + moov_len]), mdat(mdat_len)].concat()
}

/// Answers ranged GETs from `data`.
///
/// A stale `If-Range` gets the full body with `200`, like a real server
/// whose resource changed.
pub struct RangeResponder {
    pub data: Vec<u8>,
    pub etag: String,
    /// Report this Content-Range instead of the served one.
    pub content_range: Option<String>,
}

impl RangeResponder {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            etag: ETAG.to_string(),
            content_range: None,
        }
    }
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let header = |name: &str| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let fresh = header("if-range").map_or(true, |v| v == self.etag);
        let range = header("range").and_then(|v| parse_range(&v));
        let (first, last) = match range {
            Some(range) if fresh => range,
            _ => return ResponseTemplate::new(200).set_body_bytes(self.data.clone()),
        };

        let size = self.data.len() as u64;
        if first >= size || last < first {
            return ResponseTemplate::new(416)
                .insert_header("Content-Range", format!("bytes */{}", size).as_str());
        }
        let last = last.min(size - 1);
        let content_range = self
            .content_range
            .clone()
            .unwrap_or_else(|| format!("bytes {}-{}/{}", first, last, size));

        ResponseTemplate::new(206)
            .insert_header("Content-Range", content_range.as_str())
            .insert_header("ETag", self.etag.as_str())
            .set_body_bytes(self.data[first as usize..=last as usize].to_vec())
    }
}

fn parse_range(value: &str) -> Option<(u64, u64)> {
    let (first, last) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((first.parse().ok()?, last.parse().ok()?))
}

/// HEAD response advertising ranges, length and ETag for `data`.
pub fn head_response(data: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Accept-Ranges", "bytes")
        .insert_header("ETag", ETAG)
        .insert_header("Content-Length", data.len().to_string().as_str())
        .set_body_bytes(data.to_vec())
}

/// Start a server that serves `data` at [`VIDEO_PATH`].
pub async fn serve(data: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(VIDEO_PATH))
        .respond_with(head_response(&data))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VIDEO_PATH))
        .respond_with(RangeResponder::new(data))
        .mount(&server)
        .await;
    server
}

pub fn video_url(server: &MockServer) -> reqwest::Url {
    reqwest::Url::parse(&format!("{}{}", server.uri(), VIDEO_PATH)).unwrap()
}
