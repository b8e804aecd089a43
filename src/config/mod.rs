mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./faststart.toml",
        "~/.config/faststart/config.toml",
        "/etc/faststart/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    let download = &config.download;

    if download.probe_size < 32 {
        anyhow::bail!(
            "probe_size must be at least 32 bytes, got {}",
            download.probe_size
        );
    }

    if download.moov_search_step == 0 {
        anyhow::bail!("moov_search_step cannot be 0");
    }

    if download.moov_search_step > download.moov_search_limit {
        anyhow::bail!(
            "moov_search_step ({}) cannot exceed moov_search_limit ({})",
            download.moov_search_step,
            download.moov_search_limit
        );
    }

    if download.transfer_buffer == 0 {
        anyhow::bail!("transfer_buffer cannot be 0");
    }

    if config.http.user_agent.trim().is_empty() {
        anyhow::bail!("http.user_agent cannot be empty");
    }

    Ok(())
}
