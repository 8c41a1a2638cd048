use crate::error::Result;
use crate::event_parser::EventParser;
use crate::log_entry::LogEntry;
use crate::tokenizer::Tokenizer;
use crate::types::Event;
use log::warn;

/// Streaming bytes -> events pipeline.
///
/// Bytes may arrive in arbitrary chunks; a record split across two calls to
/// [`Decoder::push_bytes`] decodes exactly as if it had arrived whole.
#[derive(Debug, Default)]
pub struct Decoder {
    tokenizer: Tokenizer,
    parser: EventParser,
    entries: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log entries decoded so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<Vec<Event>> {
        let mut entries = Vec::new();
        self.tokenizer.push_slice(bytes, &mut entries)?;
        self.entries += entries.len();

        let mut events = Vec::new();
        self.parser.push_all(entries, &mut events);
        Ok(events)
    }

    /// Same as [`Decoder::push_bytes`] but also hands back the entries, for
    /// callers that dump the raw token stream.
    pub fn push_bytes_with_entries(&mut self, bytes: &[u8]) -> Result<(Vec<LogEntry>, Vec<Event>)> {
        let mut entries = Vec::new();
        self.tokenizer.push_slice(bytes, &mut entries)?;
        self.entries += entries.len();

        let mut events = Vec::new();
        self.parser.push_all(entries.iter().copied(), &mut events);
        Ok((entries, events))
    }

    /// Ends the stream, logging whatever had to be discarded.
    pub fn finish(self) {
        let dropped = self.tokenizer.finish();
        if dropped > 0 {
            warn!("Dropping {} bytes of an incomplete trailing record", dropped);
        }
        if let Some(pending) = self.parser.finish() {
            warn!(
                "Dropping {} inbound bytes not followed by outbound traffic: {:?}",
                pending.len(),
                pending
            );
        }
    }
}

/// Decodes a complete capture straight to events.
pub fn decode(bytes: &[u8]) -> Result<Vec<Event>> {
    let mut decoder = Decoder::new();
    let events = decoder.push_bytes(bytes)?;
    decoder.finish();
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_entry::Direction;

    const CAPTURE: &str = "\
0.000100,UART,I,0x48,,
0.000200,UART,I,0x69,,
0.000300,UART,O,0x2C,,
0.000400,UART,O,0x02,,
0.000500,UART,O,0x4F,,
0.000600,UART,O,0x4B,,
0.000700,UART,O,0x09,,
";

    #[test]
    fn chunked_input_matches_whole_input() {
        let whole = decode(CAPTURE.as_bytes()).unwrap();
        assert_eq!(
            whole,
            vec![
                Event::Uart {
                    direction: Direction::Inbound,
                    value: "Hi".to_string(),
                },
                Event::Uart {
                    direction: Direction::Outbound,
                    value: "OK".to_string(),
                },
                Event::Button {
                    which: crate::types::Button::Right,
                    value: true,
                },
            ]
        );

        for chunk_size in [1, 2, 5, 7, 23] {
            let mut decoder = Decoder::new();
            let mut events = Vec::new();
            for chunk in CAPTURE.as_bytes().chunks(chunk_size) {
                events.extend(decoder.push_bytes(chunk).unwrap());
            }
            assert_eq!(decoder.entries(), 7);
            assert_eq!(events, whole, "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn entries_are_returned_alongside_events() {
        let mut decoder = Decoder::new();
        let (entries, events) = decoder
            .push_bytes_with_entries(b"0.1,UART,O,0x01,,\n")
            .unwrap();

        assert_eq!(entries, vec![LogEntry::outbound(0x01)]);
        assert_eq!(events, vec![Event::Power { value: true }]);
    }
}
