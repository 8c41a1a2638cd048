//! Rebuilds protocol events from tokenized log entries.
//!
//! Two machines watch the same entry stream:
//!
//! * [`InboundAssembler`] collects SB -> TIC UART bytes and flushes them as one
//!   message when the TIC side starts talking again.
//! * [`OutboundState`] tracks TIC -> SB traffic: plain command bytes, and the
//!   length-prefixed UART transfer opened by [`BEGIN_UART`].

use crate::log_entry::{Direction, LogEntry};
use crate::types::{Button, Event};
use log::{debug, warn};

/// Outbound command that opens a length-prefixed UART transfer.
pub const BEGIN_UART: u8 = 0x2C;

const POWER_ON: u8 = 0x01;
const POWER_OFF: u8 = 0x02;
const LEFT_DOWN: u8 = 0x05;
const LEFT_UP: u8 = 0x06;
const MIDDLE_DOWN: u8 = 0x07;
const MIDDLE_UP: u8 = 0x08;
const RIGHT_DOWN: u8 = 0x09;
const RIGHT_UP: u8 = 0x0A;
const REGULATOR_ADC: u8 = 0x18;
const ADC: u8 = 0x28;
const PWM: u8 = 0x2B;

/// Maps an outbound command byte to its event. Not valid for [`BEGIN_UART`],
/// which changes parser state instead of emitting.
pub fn command_event(value: u8) -> Event {
    match value {
        POWER_ON => Event::Power { value: true },
        POWER_OFF => Event::Power { value: false },
        LEFT_DOWN => button(Button::Left, true),
        LEFT_UP => button(Button::Left, false),
        MIDDLE_DOWN => button(Button::Middle, true),
        MIDDLE_UP => button(Button::Middle, false),
        RIGHT_DOWN => button(Button::Right, true),
        RIGHT_UP => button(Button::Right, false),
        REGULATOR_ADC => Event::RegulatorAdc,
        ADC => Event::Adc,
        PWM => Event::Pwm,
        _ => Event::Unknown { value },
    }
}

fn button(which: Button, value: bool) -> Event {
    Event::Button { which, value }
}

/// SB -> TIC message reassembly.
#[derive(Debug)]
struct InboundAssembler {
    buffer: String,
    last: Direction,
}

impl Default for InboundAssembler {
    fn default() -> Self {
        Self {
            buffer: String::new(),
            last: Direction::Outbound,
        }
    }
}

impl InboundAssembler {
    fn observe(&mut self, entry: &LogEntry) -> Option<Event> {
        let flushed = match entry.direction {
            Direction::Inbound => {
                self.buffer.push(char::from(entry.value));
                None
            }
            Direction::Outbound if self.last == Direction::Inbound => Some(Event::Uart {
                direction: Direction::Inbound,
                value: std::mem::take(&mut self.buffer),
            }),
            Direction::Outbound => None,
        };
        self.last = entry.direction;
        flushed
    }
}

/// TIC -> SB protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutboundState {
    #[default]
    Idle,
    ExpectingLength,
    ReceivingData { remaining: u8 },
}

/// Incremental event parser. State is owned per instance, so separate
/// parsers never see each other's pending bytes.
#[derive(Debug, Default)]
pub struct EventParser {
    inbound: InboundAssembler,
    state: OutboundState,
    outbound: String,
}

impl EventParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OutboundState {
        self.state
    }

    /// Processes one entry, appending zero, one or two events to `events`.
    ///
    /// Two events only happen when an outbound entry closes a pending inbound
    /// message; the inbound message always comes first.
    pub fn push(&mut self, entry: LogEntry, events: &mut Vec<Event>) {
        if let Some(event) = self.inbound.observe(&entry) {
            events.push(event);
        }

        if entry.direction != Direction::Outbound {
            return;
        }

        match self.state {
            OutboundState::ExpectingLength => {
                if entry.value == 0 {
                    debug!("Zero-length outbound UART transfer");
                    events.push(self.take_outbound());
                } else {
                    self.state = OutboundState::ReceivingData {
                        remaining: entry.value,
                    };
                }
            }
            OutboundState::ReceivingData { remaining } => {
                self.outbound.push(char::from(entry.value));
                let remaining = remaining - 1;
                if remaining == 0 {
                    events.push(self.take_outbound());
                } else {
                    self.state = OutboundState::ReceivingData { remaining };
                }
            }
            OutboundState::Idle if entry.value == BEGIN_UART => {
                self.state = OutboundState::ExpectingLength;
            }
            OutboundState::Idle => events.push(command_event(entry.value)),
        }
    }

    pub fn push_all<I>(&mut self, entries: I, events: &mut Vec<Event>)
    where
        I: IntoIterator<Item = LogEntry>,
    {
        for entry in entries {
            self.push(entry, events);
        }
    }

    /// Ends the stream and returns inbound text that never got flushed by a
    /// following outbound entry.
    pub fn finish(self) -> Option<String> {
        if self.state != OutboundState::Idle {
            warn!(
                "Capture ended inside an outbound UART transfer ({:?}, {} bytes buffered)",
                self.state,
                self.outbound.len()
            );
        }
        if self.inbound.buffer.is_empty() {
            None
        } else {
            Some(self.inbound.buffer)
        }
    }

    fn take_outbound(&mut self) -> Event {
        self.state = OutboundState::Idle;
        Event::Uart {
            direction: Direction::Outbound,
            value: std::mem::take(&mut self.outbound),
        }
    }
}

/// Parses a complete entry sequence into events.
pub fn parse_events(entries: &[LogEntry]) -> Vec<Event> {
    let mut parser = EventParser::new();
    let mut events = Vec::new();
    parser.push_all(entries.iter().copied(), &mut events);

    if let Some(pending) = parser.finish() {
        warn!(
            "Dropping {} inbound bytes not followed by outbound traffic: {:?}",
            pending.len(),
            pending
        );
    }
    debug!("Parsed {} events from {} entries", events.len(), entries.len());

    events
}
