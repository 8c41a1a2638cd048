use crate::config::OutputFormat;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use commslog_decoder::{Event, LogEntry};
use serde::Serialize;
use std::fmt::Write;

/// Everything produced by decoding one capture file.
#[derive(Debug, Serialize)]
pub struct Report {
    pub source: String,
    /// CRC32 of the raw capture, hex encoded, to match exports with their input.
    pub source_crc32: String,
    pub decoded_at: DateTime<Utc>,
    pub entry_count: usize,
    pub event_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<LogEntry>>,
    pub events: Vec<Event>,
}

impl Report {
    pub fn new(
        source: String,
        bytes: &[u8],
        entries: Vec<LogEntry>,
        events: Vec<Event>,
        include_entries: bool,
    ) -> Self {
        Self {
            source,
            source_crc32: format!("{:08x}", crc32fast::hash(bytes)),
            decoded_at: Utc::now(),
            entry_count: entries.len(),
            event_count: events.len(),
            entries: include_entries.then_some(entries),
            events,
        }
    }
}

/// An event seen during a live capture.
#[derive(Debug, Serialize)]
pub struct StampedEvent<'a> {
    pub timestamp: String,
    #[serde(flatten)]
    pub event: &'a Event,
}

impl<'a> StampedEvent<'a> {
    pub fn now(event: &'a Event) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event,
        }
    }
}

pub fn render_report(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out =
                serde_json::to_string_pretty(report).context("Failed to serialize report")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Jsonl => {
            let mut out = String::new();
            for event in &report.events {
                out.push_str(&serde_json::to_string(event).context("Failed to serialize event")?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Text => Ok(render_text(report)),
    }
}

fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# source:  {}", report.source);
    let _ = writeln!(out, "# crc32:   {}", report.source_crc32);
    let _ = writeln!(out, "# entries: {}", report.entry_count);
    let _ = writeln!(out, "# events:  {}", report.event_count);

    if let Some(entries) = &report.entries {
        out.push('\n');
        for (index, entry) in entries.iter().enumerate() {
            let _ = writeln!(out, "{:>6}  {}", index, entry);
        }
    }

    out.push('\n');
    for (index, event) in report.events.iter().enumerate() {
        let _ = writeln!(out, "{:>6}  {}", index, event);
    }
    out
}

pub fn render_stamped(event: &StampedEvent<'_>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!("{}  {}\n", event.timestamp, event.event)),
        OutputFormat::Json | OutputFormat::Jsonl => {
            let mut line = serde_json::to_string(event).context("Failed to serialize event")?;
            line.push('\n');
            Ok(line)
        }
    }
}
