//! mpdwire-core: Core types, configuration, and logging for mpdwire.

pub mod ack;
pub mod build_info;
pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use ack::{Ack, AckCode};
pub use config::{Config, Endpoint, TagConfig};
pub use error::{Error, IncompleteRecord, Result};
