//! Daemon error lines (`ACK [code@index] {command} message`).

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Prefix of every daemon error line.
pub const ACK_MARKER: &str = "ACK";

/// Success terminator line.
pub const OK_MARKER: &str = "OK";

static ACK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ACK \[(-?\d+)@(\d+)\] \{(.*?)\}(?: (.*))?$").expect("ACK grammar is valid")
});

/// Error classes the daemon reports in the `code` field of an ACK line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckCode {
    NotList,
    Arg,
    Password,
    Permission,
    Unknown,
    NoExist,
    PlaylistMax,
    System,
    PlaylistLoad,
    UpdateAlready,
    PlayerSync,
    Exist,
    Other(i32),
}

impl From<i32> for AckCode {
    fn from(code: i32) -> Self {
        match code {
            1 => Self::NotList,
            2 => Self::Arg,
            3 => Self::Password,
            4 => Self::Permission,
            5 => Self::Unknown,
            50 => Self::NoExist,
            51 => Self::PlaylistMax,
            52 => Self::System,
            53 => Self::PlaylistLoad,
            54 => Self::UpdateAlready,
            55 => Self::PlayerSync,
            56 => Self::Exist,
            other => Self::Other(other),
        }
    }
}

/// A parsed daemon error line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Numeric error code.
    pub code: i32,
    /// Index of the failing command inside a command list (0 outside lists).
    pub command_index: u32,
    /// Name of the command that failed, empty when the daemon did not know it.
    pub command: String,
    /// Human-readable message.
    pub message: String,
}

impl Ack {
    /// Parse an ACK line. Returns `None` if the line does not follow the grammar.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = ACK_LINE.captures(line.trim())?;

        Some(Self {
            code: caps[1].parse().ok()?,
            command_index: caps[2].parse().ok()?,
            command: caps[3].to_string(),
            message: caps.get(4).map(|m| m.as_str().to_string()).unwrap_or_default(),
        })
    }

    pub fn kind(&self) -> AckCode {
        AckCode::from(self.code)
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.command.is_empty() {
            write!(f, "[{}@{}] {}", self.code, self.command_index, self.message)
        } else {
            write!(
                f,
                "[{}@{}] {{{}}} {}",
                self.code, self.command_index, self.command, self.message
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let ack = Ack::parse("ACK [50@0] {play} song doesn't exist: \"10\"").unwrap();
        assert_eq!(ack.code, 50);
        assert_eq!(ack.command_index, 0);
        assert_eq!(ack.command, "play");
        assert_eq!(ack.message, "song doesn't exist: \"10\"");
        assert_eq!(ack.kind(), AckCode::NoExist);
    }

    #[test]
    fn test_parse_empty_command() {
        let ack = Ack::parse("ACK [5@0] {} unknown command").unwrap();
        assert_eq!(ack.command, "");
        assert_eq!(ack.message, "unknown command");
        assert_eq!(ack.kind(), AckCode::Unknown);
    }

    #[test]
    fn test_parse_command_list_index() {
        let ack = Ack::parse("ACK [2@3] {add} wrong number of arguments").unwrap();
        assert_eq!(ack.command_index, 3);
        assert_eq!(ack.kind(), AckCode::Arg);
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(Ack::parse("ACK something went wrong").is_none());
        assert!(Ack::parse("OK").is_none());
        assert!(Ack::parse("ACK [x@0] {} nope").is_none());
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let ack = Ack::parse("ACK [99@0] {foo} bar").unwrap();
        assert_eq!(ack.kind(), AckCode::Other(99));
    }

    #[test]
    fn test_display() {
        let ack = Ack::parse("ACK [3@0] {password} incorrect password").unwrap();
        assert_eq!(ack.to_string(), "[3@0] {password} incorrect password");
    }
}
