//! Decoder for SB <-> TIC communication captures.
//!
//! A capture is a byte dump of comma-separated log records. Decoding happens in
//! two passes:
//!
//! 1. [`tokenize`] turns raw bytes into [`LogEntry`] values (direction + byte).
//! 2. [`parse_events`] turns entries into [`Event`]s: UART messages in both
//!    directions, power and button changes, and sensor markers.
//!
//! ```
//! use commslog_decoder::{decode, Event};
//!
//! let capture = b"0.1,UART,O,0x01,,\n0.2,UART,O,0x28,,\n";
//! let events = decode(capture)?;
//! assert_eq!(events, vec![Event::Power { value: true }, Event::Adc]);
//! # Ok::<(), commslog_decoder::DecodeError>(())
//! ```
//!
//! [`Tokenizer`], [`EventParser`] and [`Decoder`] expose the same machines
//! incrementally for live captures.

pub mod decoder;
pub mod error;
pub mod event_parser;
pub mod log_entry;
pub mod tokenizer;
pub mod types;

pub use decoder::{decode, Decoder};
pub use error::{DecodeError, Result};
pub use event_parser::{command_event, parse_events, EventParser, OutboundState, BEGIN_UART};
pub use log_entry::{Direction, LogEntry};
pub use tokenizer::{tokenize, Tokenizer};
pub use types::{Button, Event};
