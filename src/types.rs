use crate::log_entry::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Left,
    Right,
    Middle,
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Button::Left => f.write_str("left"),
            Button::Right => f.write_str("right"),
            Button::Middle => f.write_str("middle"),
        }
    }
}

/// A domain event rebuilt from one or more log entries.
///
/// Serializes as `{"type": "...", ...}` so exported captures keep the
/// same layout as the decoder's web front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// Outbound command byte with no known meaning.
    Unknown { value: u8 },
    /// A complete UART message.
    Uart { direction: Direction, value: String },
    Power { value: bool },
    Button { which: Button, value: bool },
    Adc,
    Pwm,
    RegulatorAdc,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Unknown { value } => write!(f, "unknown command 0x{:02X}", value),
            Event::Uart { direction, value } => write!(f, "uart {}: {:?}", direction, value),
            Event::Power { value } => {
                write!(f, "power {}", if *value { "on" } else { "off" })
            }
            Event::Button { which, value } => write!(
                f,
                "button {} {}",
                which,
                if *value { "pressed" } else { "released" }
            ),
            Event::Adc => f.write_str("adc reading"),
            Event::Pwm => f.write_str("pwm trigger"),
            Event::RegulatorAdc => f.write_str("regulator adc reading"),
        }
    }
}
