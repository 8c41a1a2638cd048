mod capture;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use commslog_decoder::{parse_events, tokenize};
use log::info;
use simple_logger::SimpleLogger;
use std::path::Path;
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = config::Cli::parse();

    // Load configuration
    let config = config::load_config(&cli)?;

    SimpleLogger::new()
        .with_level(config.level_filter()?)
        .init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logger: {}", e))?;

    info!("Starting commslog-decoder");

    if let Some(ref path) = cli.input {
        let rendered = decode_file(path, &config).await?;
        write_output(cli.output.as_deref(), rendered.as_bytes()).await?;
        return Ok(());
    }

    if let Some(ref port) = config.serial_port {
        match cli.output {
            Some(ref path) => {
                let mut file = tokio::fs::File::create(path)
                    .await
                    .with_context(|| format!("Failed to create output file: {:?}", path))?;
                capture::run(&config, port, &mut file).await?;
            }
            None => capture::run(&config, port, &mut tokio::io::stdout()).await?,
        }
        return Ok(());
    }

    anyhow::bail!("Nothing to decode: pass a capture file or --serial-port")
}

async fn decode_file(path: &Path, config: &config::Config) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read capture file: {:?}", path))?;

    info!("Decoding {} bytes from {:?}", bytes.len(), path);

    let entries = tokenize(&bytes).with_context(|| format!("Failed to tokenize {:?}", path))?;
    let events = parse_events(&entries);

    info!("Decoded {} entries into {} events", entries.len(), events.len());

    let report = output::Report::new(
        path.display().to_string(),
        &bytes,
        entries,
        events,
        config.show_entries,
    );
    output::render_report(&report, config.format)
}

async fn write_output(path: Option<&Path>, contents: &[u8]) -> Result<()> {
    match path {
        Some(path) => tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("Failed to write output file: {:?}", path)),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(contents)
                .await
                .context("Failed to write to stdout")?;
            stdout.flush().await.context("Failed to flush stdout")
        }
    }
}
