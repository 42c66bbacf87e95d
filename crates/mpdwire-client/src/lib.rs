//! mpdwire-client: protocol engine and session for the MPD control protocol.

pub mod codec;
pub mod command;
pub mod framer;
pub mod response;
pub mod session;
pub mod status;
pub mod transport;

pub use codec::{args, Arg, CommandList};
pub use command::{Arity, Command, Shape};
pub use framer::RawResponse;
pub use response::{Normalizer, Record, Response, ESSENTIAL_FIELDS};
pub use session::Session;
pub use status::{PlaybackState, PlayerStatus, Statistics};
pub use transport::Connection;
