use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the link transmitted a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// TIC -> SB
    #[serde(rename = "out")]
    Outbound,
    /// SB -> TIC
    #[serde(rename = "in")]
    Inbound,
}

impl Direction {
    /// Direction code as written in field 2 of a record.
    pub fn from_code(code: &str) -> Self {
        if code == "O" {
            Direction::Outbound
        } else {
            Direction::Inbound
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => f.write_str("TIC->SB"),
            Direction::Inbound => f.write_str("SB->TIC"),
        }
    }
}

/// A single byte decoded from one capture record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub direction: Direction,
    pub value: u8,
}

impl LogEntry {
    pub fn new(direction: Direction, value: u8) -> Self {
        Self { direction, value }
    }

    pub fn outbound(value: u8) -> Self {
        Self::new(Direction::Outbound, value)
    }

    pub fn inbound(value: u8) -> Self {
        Self::new(Direction::Inbound, value)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0x{:02X}", self.direction, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_capital_o_is_outbound() {
        assert_eq!(Direction::from_code("O"), Direction::Outbound);
        assert_eq!(Direction::from_code("I"), Direction::Inbound);
        assert_eq!(Direction::from_code("o"), Direction::Inbound);
        assert_eq!(Direction::from_code(""), Direction::Inbound);
    }

    #[test]
    fn entry_serializes_with_short_direction() {
        let json = serde_json::to_string(&LogEntry::outbound(0x2C)).unwrap();
        assert_eq!(json, r#"{"direction":"out","value":44}"#);
    }
}
