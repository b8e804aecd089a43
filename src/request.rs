//! Download request and output naming.

use anyhow::Result;
use percent_encoding::percent_decode_str;
use reqwest::Url;
use std::path::PathBuf;

/// What to fetch, where to write it, and how much of it to take.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: Url,
    pub output: PathBuf,
    pub max_bytes: u64,
}

/// Default output file name: the last decoded path segment of the URL.
pub fn output_name_from_url(url: &Url) -> Result<PathBuf> {
    let path = percent_decode_str(url.path()).decode_utf8_lossy();
    let name = path.rsplit('/').next().unwrap_or_default().trim();
    if name.is_empty() {
        anyhow::bail!(
            "Can't derive an output file name from {}; pass --output",
            url
        );
    }
    Ok(PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(url: &str) -> Result<PathBuf> {
        output_name_from_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(
            name("http://example.com/videos/clip.mp4").unwrap(),
            PathBuf::from("clip.mp4")
        );
        assert_eq!(
            name("https://example.com/clip.mp4?token=abc").unwrap(),
            PathBuf::from("clip.mp4")
        );
    }

    #[test]
    fn test_percent_decoded_and_trimmed() {
        assert_eq!(
            name("http://example.com/a/My%20Movie.mp4%20").unwrap(),
            PathBuf::from("My Movie.mp4")
        );
        assert_eq!(
            name("http://example.com/%D1%84%D0%B8%D0%BB%D1%8C%D0%BC.mp4").unwrap(),
            PathBuf::from("фильм.mp4")
        );
    }

    #[test]
    fn test_empty_name_is_error() {
        assert!(name("http://example.com/").is_err());
        assert!(name("http://example.com/videos/").is_err());
        assert!(name("http://example.com/%20").is_err());
    }
}
