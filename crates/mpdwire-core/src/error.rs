//! Error types for mpdwire.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::ack::Ack;

/// A record that lacked one or more essential fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteRecord {
    /// Identifying value of the record (`Id`, else `file`, else `#<index>`).
    pub id: String,
    /// Missing field names, in essential-field order.
    pub missing: Vec<String>,
}

impl fmt::Display for IncompleteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is missing {}", self.id, self.missing.join(", "))
    }
}

fn describe_incomplete(records: &[IncompleteRecord]) -> String {
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// mpdwire error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection not established: {0}")]
    ConnectionNotEstablished(String),

    #[error("Failed to write to daemon socket: {0}")]
    WriteFailed(String),

    #[error("Command '{command}' timed out after {after:?}")]
    Timeout { command: String, after: Duration },

    #[error("Command failed: {}", .0.message)]
    CommandFailed(Ack),

    #[error("Disconnection failed: {0}")]
    DisconnectionFailed(String),

    #[error("Daemon rejected the password: {0}")]
    BadPassword(String),

    #[error("Must supply a password to authenticate")]
    NoPassword,

    #[error(
        "Command '{command}' returned records missing essential tags: {}",
        describe_incomplete(.records)
    )]
    EssentialTagsMissing {
        command: String,
        records: Vec<IncompleteRecord>,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the connection is still usable after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::CommandFailed(_) | Error::EssentialTagsMissing { .. } | Error::InvalidArgument(_)
        )
    }

    /// The daemon's ACK details, if this error came from one.
    pub fn ack(&self) -> Option<&Ack> {
        match self {
            Error::CommandFailed(ack) => Some(ack),
            _ => None,
        }
    }
}

/// Result type alias for mpdwire operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_carries_daemon_message() {
        let ack = Ack::parse("ACK [50@0] {play} song doesn't exist").unwrap();
        let err = Error::CommandFailed(ack);
        assert_eq!(err.to_string(), "Command failed: song doesn't exist");
        assert!(err.is_recoverable());
        assert_eq!(err.ack().map(|a| a.code), Some(50));
    }

    #[test]
    fn test_essential_tags_missing_message() {
        let err = Error::EssentialTagsMissing {
            command: "playlistinfo".to_string(),
            records: vec![
                IncompleteRecord {
                    id: "7".to_string(),
                    missing: vec!["Album".to_string()],
                },
                IncompleteRecord {
                    id: "9".to_string(),
                    missing: vec!["Artist".to_string(), "Track".to_string()],
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Command 'playlistinfo' returned records missing essential tags: \
             7 is missing Album; 9 is missing Artist, Track"
        );
    }

    #[test]
    fn test_protocol_faults_are_not_recoverable() {
        let timeout = Error::Timeout {
            command: "status".to_string(),
            after: Duration::from_secs(5),
        };
        assert!(!timeout.is_recoverable());
        assert!(!Error::WriteFailed("broken pipe".to_string()).is_recoverable());
        assert!(!Error::ConnectionFailed("refused".to_string()).is_recoverable());
    }
}
