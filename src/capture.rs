use crate::config::{Config, OutputFormat};
use crate::output::{self, StampedEvent};
use anyhow::{Context, Result};
use commslog_decoder::{DecodeError, Decoder};
use log::{error, info, warn};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::sleep;
use tokio_serial::SerialPortBuilderExt;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const BACKOFF_MULTIPLIER: u32 = 2;
const READ_CHUNK: usize = 1024;

/// Decodes a live serial capture until Ctrl-C. Dropped connections are
/// retried with exponential backoff; a malformed record stops the capture.
pub async fn run<W>(config: &Config, port: &str, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut backoff = INITIAL_BACKOFF;

    loop {
        info!("Attempting to open serial port: {} @ {} baud", port, config.baud_rate);

        let attempt = tokio::select! {
            result = connect_and_decode(config, port, out) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Capture interrupted");
                return Ok(());
            }
        };

        let delay = match attempt {
            Ok(_) => {
                let delay = retry_delay(true, &mut backoff);
                info!("Serial port closed, reconnecting in {:?}", delay);
                delay
            }
            Err(e) if e.downcast_ref::<DecodeError>().is_some() => return Err(e),
            Err(e) => {
                error!("Serial capture error: {:#}", e);
                let delay = retry_delay(false, &mut backoff);
                warn!("Retrying in {:?}", delay);
                delay
            }
        };

        tokio::select! {
            _ = sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Capture interrupted");
                return Ok(());
            }
        }
    }
}

/// Delay before the next connection attempt. A clean close waits the initial
/// backoff and resets it; an error waits the current backoff and doubles it.
fn retry_delay(clean_close: bool, backoff: &mut Duration) -> Duration {
    if clean_close {
        *backoff = INITIAL_BACKOFF;
        return INITIAL_BACKOFF;
    }

    let delay = *backoff;
    // Exponential backoff
    *backoff = std::cmp::min(*backoff * BACKOFF_MULTIPLIER, MAX_BACKOFF);
    delay
}

async fn connect_and_decode<W>(config: &Config, port: &str, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let stream = tokio_serial::new(port, config.baud_rate)
        .open_native_async()
        .context("Failed to open serial port")?;

    info!("Connected to serial port: {}", port);

    // A reconnect loses bytes, so every connection starts a fresh decoder.
    decode_stream(stream, config.format, out).await
}

/// Feeds `reader` through a [`Decoder`], writing each event as soon as it is
/// complete. Returns when the reader reaches end of stream.
pub async fn decode_stream<R, W>(mut reader: R, format: OutputFormat, out: &mut W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut decoder = Decoder::new();
    let mut buf = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut buf).await.context("Failed to read capture stream")?;
        if n == 0 {
            break;
        }

        for event in decoder.push_bytes(&buf[..n])? {
            let line = output::render_stamped(&StampedEvent::now(&event), format)?;
            out.write_all(line.as_bytes())
                .await
                .context("Failed to write event")?;
        }
        out.flush().await.context("Failed to flush output")?;
    }

    info!("Capture stream ended after {} entries", decoder.entries());
    decoder.finish();
    Ok(())
}
