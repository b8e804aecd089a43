//! HTTP range source tests against a mock server.

mod common;

use common::{head_response, serve, video_url, RangeResponder, ETAG, VIDEO_PATH};
use faststart::config::HttpConfig;
use faststart::source::read_exact_range;
use faststart::{ErrorKind, HttpSource, RangeSource};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(server: &MockServer) -> HttpSource {
    HttpSource::new(video_url(server), &HttpConfig::default()).unwrap()
}

fn data() -> Vec<u8> {
    (0..5000u32).map(|i| (i % 256) as u8).collect()
}

#[tokio::test]
async fn test_size_and_validator_from_head() {
    let server = serve(data()).await;
    let mut source = source(&server);

    assert!(source.metadata().is_none());
    assert_eq!(source.size().await.unwrap(), 5000);
    let metadata = source.metadata().unwrap();
    assert_eq!(metadata.size, 5000);
    assert_eq!(metadata.validator, ETAG);
}

#[tokio::test]
async fn test_head_is_sent_once() {
    let data = data();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(VIDEO_PATH))
        .respond_with(head_response(&data))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VIDEO_PATH))
        .and(header("If-Range", ETAG))
        .and(header("Range", "bytes=100-199"))
        .respond_with(RangeResponder::new(data.clone()))
        .expect(2)
        .mount(&server)
        .await;

    let mut source = source(&server);
    source.size().await.unwrap();
    for _ in 0..2 {
        let bytes = read_exact_range(&mut source, 100, 100).await.unwrap();
        assert_eq!(bytes, &data[100..200]);
    }
    source.size().await.unwrap();
}

#[tokio::test]
async fn test_reads_exact_ranges() {
    let data = data();
    let server = serve(data.clone()).await;
    let mut source = source(&server);

    let bytes = read_exact_range(&mut source, 0, 8).await.unwrap();
    assert_eq!(bytes, &data[..8]);
    let bytes = read_exact_range(&mut source, 4990, 10).await.unwrap();
    assert_eq!(bytes, &data[4990..]);
    let bytes = read_exact_range(&mut source, 1234, 0).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_head_requirements() {
    let cases = [
        ResponseTemplate::new(404),
        ResponseTemplate::new(200)
            .insert_header("ETag", ETAG)
            .insert_header("Content-Length", "10")
            .set_body_bytes(vec![0u8; 10]),
        ResponseTemplate::new(200)
            .insert_header("Accept-Ranges", "none")
            .insert_header("ETag", ETAG)
            .insert_header("Content-Length", "10")
            .set_body_bytes(vec![0u8; 10]),
        ResponseTemplate::new(200)
            .insert_header("Accept-Ranges", "bytes")
            .insert_header("Content-Length", "10")
            .set_body_bytes(vec![0u8; 10]),
    ];

    for response in cases {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(response)
            .mount(&server)
            .await;

        let err = source(&server).size().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable, "{}", err);
    }
}

#[tokio::test]
async fn test_last_modified_is_used_without_etag() {
    let data = data();
    let modified = "Wed, 21 Oct 2015 07:28:00 GMT";
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Accept-Ranges", "bytes")
                .insert_header("Last-Modified", modified)
                .insert_header("Content-Length", data.len().to_string().as_str())
                .set_body_bytes(data.clone()),
        )
        .mount(&server)
        .await;
    // Answers 200 unless If-Range carries the Last-Modified value.
    Mock::given(method("GET"))
        .respond_with(RangeResponder {
            etag: modified.to_string(),
            ..RangeResponder::new(data.clone())
        })
        .mount(&server)
        .await;

    let mut source = source(&server);
    let bytes = read_exact_range(&mut source, 10, 5).await.unwrap();
    assert_eq!(bytes, &data[10..15]);
}

#[tokio::test]
async fn test_wrong_content_range_is_rejected() {
    let data = data();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(head_response(&data))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(RangeResponder {
            content_range: Some("bytes 0-99/5000".to_string()),
            ..RangeResponder::new(data.clone())
        })
        .mount(&server)
        .await;

    let mut source = source(&server);
    let err = source.read_range(100, 100).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::RangeMismatch);
}

#[tokio::test]
async fn test_changed_resource_is_rejected() {
    let data = data();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(head_response(&data))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(RangeResponder {
            etag: "\"clip-v2\"".to_string(),
            ..RangeResponder::new(data.clone())
        })
        .mount(&server)
        .await;

    let mut source = source(&server);
    let err = source.read_range(0, 100).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::RangeMismatch);
    assert!(err.to_string().contains("200"));
}
