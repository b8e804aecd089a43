use faststart_media::locate::{DEFAULT_SEARCH_LIMIT, DEFAULT_SEARCH_STEP};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Maximum number of source bytes to write (default: effectively unlimited)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Bytes read from the start of the file to find ftyp and the next box
    #[serde(default = "default_probe_size")]
    pub probe_size: u64,

    /// How far back from EOF to look for a trailing moov box
    #[serde(default = "default_moov_search_limit")]
    pub moov_search_limit: u64,

    /// Size of each backward request during the moov search
    #[serde(default = "default_moov_search_step")]
    pub moov_search_step: u64,

    /// Transfer buffer used while copying media data
    #[serde(default = "default_transfer_buffer")]
    pub transfer_buffer: u64,
}

fn default_max_bytes() -> u64 {
    1_000_000_000_000_000_000
}
fn default_probe_size() -> u64 {
    1024
}
fn default_moov_search_limit() -> u64 {
    DEFAULT_SEARCH_LIMIT
}
fn default_moov_search_step() -> u64 {
    DEFAULT_SEARCH_STEP
}
fn default_transfer_buffer() -> u64 {
    16 * 1024 * 1024
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            probe_size: default_probe_size(),
            moov_search_limit: default_moov_search_limit(),
            moov_search_step: default_moov_search_step(),
            transfer_buffer: default_transfer_buffer(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// TCP connect timeout in seconds (default: none)
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Whole-request timeout in seconds (default: none)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_user_agent() -> String {
    format!("faststart/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: None,
            timeout_secs: None,
        }
    }
}
