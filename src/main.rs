mod cli;

use faststart::{config, fetch, output_name_from_url, DownloadRequest, Layout};

use anyhow::Result;
use clap::Parser;
use cli::Cli;

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config_or_default(cli.config.as_deref())?;

    let output = match cli.output {
        Some(path) => path,
        None => output_name_from_url(&cli.url)?,
    };
    let request = DownloadRequest {
        url: cli.url,
        output,
        max_bytes: cli.size.unwrap_or(config.download.max_bytes),
    };

    let report = fetch(&request, &config).await?;
    match report.layout {
        Layout::FastStart => println!(
            "{}: already fast-start, {} bytes written",
            request.output.display(),
            report.bytes_written
        ),
        Layout::Relocated => println!(
            "{}: moved 'moov' ({} bytes) to front, {} bytes written",
            request.output.display(),
            report.moov_size.unwrap_or_default(),
            report.bytes_written
        ),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            // Verbose mode: every request and header
            "faststart=trace,faststart_media=debug,reqwest=debug".to_string()
        } else {
            "faststart=info,faststart_media=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cli))
}
