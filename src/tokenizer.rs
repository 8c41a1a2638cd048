//! Record tokenizer for raw capture bytes.
//!
//! A capture is a run of fixed-shape records:
//!
//! ```text
//! <field0>,<field1>,<dir>,<value...>,<x><terminator>
//! ```
//!
//! Fields 0 and 1 are skipped. Only the first byte of the direction field is
//! looked at, and the value is read from the first four bytes of field 3
//! (`0x2C`, `0044`, ...). After the fourth comma exactly two more bytes belong
//! to the record: one absorbed byte and the terminator that closes it.

use crate::error::{DecodeError, Result};
use crate::log_entry::{Direction, LogEntry};
use log::{debug, warn};

const FIELD_DIRECTION: usize = 2;
const FIELD_VALUE: usize = 3;
const RECORD_COMMAS: usize = 4;
/// Bytes of field 3 that make up the value window.
const VALUE_WIDTH: usize = 4;

/// Incremental tokenizer. Feed bytes with [`Tokenizer::push`]; a
/// [`LogEntry`] is returned each time a record is closed.
#[derive(Debug, Default)]
pub struct Tokenizer {
    commas: usize,
    since_comma: usize,
    chunk: String,
    direction: Option<Direction>,
    value: Option<u8>,
    /// Bytes consumed by the record in progress.
    pending: usize,
    /// Non-whitespace bytes among `pending`.
    pending_content: usize,
    /// Absolute position of the next byte.
    offset: usize,
    records: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of complete records tokenized so far.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn push(&mut self, byte: u8) -> Result<Option<LogEntry>> {
        let offset = self.offset;
        self.offset += 1;
        self.pending += 1;
        if !byte.is_ascii_whitespace() {
            self.pending_content += 1;
        }

        if self.commas == RECORD_COMMAS {
            if self.since_comma == 0 {
                self.since_comma = 1;
                return Ok(None);
            }
            return self.close_record(offset).map(Some);
        }

        if byte == b',' {
            self.commas += 1;
            self.since_comma = 0;
            self.chunk.clear();
            return Ok(None);
        }

        self.chunk.push(char::from(byte));

        if self.commas == FIELD_DIRECTION && self.since_comma == 0 {
            self.direction = Some(Direction::from_code(&self.chunk));
        }
        if self.commas == FIELD_VALUE && self.since_comma == VALUE_WIDTH - 1 {
            let value = parse_value(&self.chunk).ok_or_else(|| DecodeError::InvalidValue {
                record: self.records,
                offset,
                text: self.chunk.clone(),
            })?;
            self.value = Some(value);
        }
        self.since_comma += 1;

        Ok(None)
    }

    /// Feeds a slice, appending every completed entry to `out`.
    pub fn push_slice(&mut self, bytes: &[u8], out: &mut Vec<LogEntry>) -> Result<()> {
        for &byte in bytes {
            if let Some(entry) = self.push(byte)? {
                out.push(entry);
            }
        }
        Ok(())
    }

    /// Ends the stream. Returns how many bytes of an unterminated record were
    /// discarded. Trailing whitespace alone (the `\n` of a CRLF capture) is not
    /// a record and counts as nothing.
    pub fn finish(self) -> usize {
        if self.pending_content == 0 {
            0
        } else {
            self.pending
        }
    }

    fn close_record(&mut self, offset: usize) -> Result<LogEntry> {
        let direction = self.direction.unwrap_or(Direction::Inbound);
        let value = self.value;
        let record = self.records;

        self.reset();
        self.records += 1;

        let value = value.ok_or(DecodeError::MissingValue { record, offset })?;
        Ok(LogEntry::new(direction, value))
    }

    fn reset(&mut self) {
        self.commas = 0;
        self.since_comma = 0;
        self.chunk.clear();
        self.direction = None;
        self.value = None;
        self.pending = 0;
        self.pending_content = 0;
    }
}

/// Parses the value window: decimal, or hexadecimal with a `0x` prefix.
fn parse_value(window: &str) -> Option<u8> {
    let text = window.trim_matches(|c: char| c.is_ascii_whitespace());
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Tokenizes a whole capture. A trailing record without its terminator is
/// dropped.
pub fn tokenize(bytes: &[u8]) -> Result<Vec<LogEntry>> {
    let mut tokenizer = Tokenizer::new();
    let mut entries = Vec::new();
    tokenizer.push_slice(bytes, &mut entries)?;

    let dropped = tokenizer.finish();
    if dropped > 0 {
        warn!("Dropping {} bytes of an incomplete trailing record", dropped);
    }
    debug!("Tokenized {} entries from {} bytes", entries.len(), bytes.len());

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(direction: &str, value: &str) -> String {
        format!("0.001250,UART,{},{},,\n", direction, value)
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(tokenize(b"").unwrap(), vec![]);
    }

    #[test]
    fn one_entry_per_record_in_order() {
        let capture = [
            record("O", "0x2C"),
            record("I", "0x48"),
            record("O", "0x01"),
        ]
        .concat();

        assert_eq!(
            tokenize(capture.as_bytes()).unwrap(),
            vec![
                LogEntry::outbound(0x2C),
                LogEntry::inbound(0x48),
                LogEntry::outbound(0x01),
            ]
        );
    }

    #[test]
    fn decimal_values() {
        let capture = [record("I", "0072"), record("I", "105 ")].concat();
        assert_eq!(
            tokenize(capture.as_bytes()).unwrap(),
            vec![LogEntry::inbound(72), LogEntry::inbound(105)]
        );
    }

    #[test]
    fn only_first_four_value_bytes_count() {
        let capture = record("O", "0x0A trailing notes");
        assert_eq!(
            tokenize(capture.as_bytes()).unwrap(),
            vec![LogEntry::outbound(0x0A)]
        );
    }

    #[test]
    fn direction_codes() {
        let capture = [
            record("O", "0x01"),
            record("I", "0x01"),
            record("X", "0x01"),
            record("", "0x01"),
        ]
        .concat();
        let directions: Vec<_> = tokenize(capture.as_bytes())
            .unwrap()
            .into_iter()
            .map(|e| e.direction)
            .collect();

        assert_eq!(
            directions,
            vec![
                Direction::Outbound,
                Direction::Inbound,
                Direction::Inbound,
                Direction::Inbound,
            ]
        );
    }

    #[test]
    fn direction_reads_first_byte_only() {
        let capture = [record("Out", "0x01"), record("In", "0x02"), record("XO", "0x03")].concat();
        assert_eq!(
            tokenize(capture.as_bytes()).unwrap(),
            vec![
                LogEntry::outbound(0x01),
                LogEntry::inbound(0x02),
                LogEntry::inbound(0x03),
            ]
        );
    }

    #[test]
    fn empty_direction_does_not_inherit_previous() {
        let entries = tokenize(b"a,b,O,0x01,,\na,b,,0x02,,\n").unwrap();
        assert_eq!(entries, vec![LogEntry::outbound(0x01), LogEntry::inbound(0x02)]);
    }

    #[test]
    fn crlf_capture_leaves_nothing_dropped() {
        let capture = "a,b,O,0x01,,\r\na,b,I,0x02,,\r\n";
        let mut tokenizer = Tokenizer::new();
        let mut entries = Vec::new();
        tokenizer.push_slice(capture.as_bytes(), &mut entries).unwrap();

        assert_eq!(entries, vec![LogEntry::outbound(0x01), LogEntry::inbound(0x02)]);
        assert_eq!(tokenizer.finish(), 0);
    }

    #[test]
    fn terminator_byte_is_consumed() {
        // The byte after the absorbed one closes the record even if it is not a newline.
        let capture = "a,b,O,0x05,,;c,d,I,0x06,,;";
        assert_eq!(
            tokenize(capture.as_bytes()).unwrap(),
            vec![LogEntry::outbound(0x05), LogEntry::inbound(0x06)]
        );
    }

    #[test]
    fn partial_trailing_record_is_dropped() {
        let mut capture = [record("O", "0x01"), record("O", "0x02")].concat();
        capture.push_str("0.001300,UART,O,0x0");

        let mut tokenizer = Tokenizer::new();
        let mut entries = Vec::new();
        tokenizer.push_slice(capture.as_bytes(), &mut entries).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(tokenizer.records(), 2);
        assert_eq!(tokenizer.finish(), "0.001300,UART,O,0x0".len());
        assert_eq!(tokenize(capture.as_bytes()).unwrap().len(), 2);
    }

    #[test]
    fn record_waiting_for_terminator_is_dropped() {
        let capture = "a,b,O,0x01,,";
        assert_eq!(tokenize(capture.as_bytes()).unwrap(), vec![]);
    }

    #[test]
    fn non_numeric_value_fails() {
        let err = tokenize(b"a,b,O,zz12,,\n").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidValue {
                record: 0,
                offset: 9,
                text: "zz12".to_string(),
            }
        );
    }

    #[test]
    fn out_of_range_value_fails() {
        let capture = [record("O", "0x01"), record("O", "0300")].concat();
        match tokenize(capture.as_bytes()) {
            Err(DecodeError::InvalidValue { record, text, .. }) => {
                assert_eq!(record, 1);
                assert_eq!(text, "0300");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn short_value_field_fails() {
        let err = tokenize(b"a,b,O,7,,\n").unwrap_err();
        assert_eq!(err, DecodeError::MissingValue { record: 0, offset: 9 });
    }

    #[test]
    fn value_does_not_carry_into_next_record() {
        let capture = [record("O", "0x01"), record("O", "7")].concat();
        assert!(matches!(
            tokenize(capture.as_bytes()),
            Err(DecodeError::MissingValue { record: 1, .. })
        ));
    }

    #[test]
    fn parse_value_forms() {
        assert_eq!(parse_value("0x2C"), Some(0x2C));
        assert_eq!(parse_value("0X2c"), Some(0x2C));
        assert_eq!(parse_value(" 44 "), Some(44));
        assert_eq!(parse_value("0255"), Some(255));
        assert_eq!(parse_value("    "), None);
        assert_eq!(parse_value("0x"), None);
        assert_eq!(parse_value("abcd"), None);
    }
}
