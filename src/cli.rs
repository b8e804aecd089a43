use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "faststart")]
#[command(
    author,
    version,
    about = "Download an MP4 file over HTTP, moving 'moov' to the front"
)]
pub struct Cli {
    /// URL of the MP4 file
    pub url: Url,

    /// Output file (default: last path segment of the URL)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of bytes to write
    #[arg(short, long)]
    pub size: Option<u64>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
