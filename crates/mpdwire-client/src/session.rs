//! The top-level client session.
//!
//! A [`Session`] owns one [`Connection`] and issues at most one command at a
//! time over it. Status, statistics and the queue are cached and only change
//! on [`Session::refresh`].

use std::time::Duration;

use mpdwire_core::{Config, Error, Result};
use tracing::{debug, info, warn};

use crate::codec::{self, Arg, CommandList};
use crate::command::Command;
use crate::framer::{self, RawResponse};
use crate::response::{has_descriptive_tags, Normalizer, Record, Response};
use crate::status::{PlayerStatus, Statistics};
use crate::transport::Connection;

/// Resolve a queue position `step` places away from `current`, wrapping in both directions.
pub fn wrap_position(current: usize, step: i64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    Some((current as i64 + step).rem_euclid(len) as usize)
}

/// A client session over one daemon connection.
#[derive(Debug)]
pub struct Session {
    connection: Connection,
    normalizer: Normalizer,
    idle_timeout: Duration,
    status: Record,
    statistics: Record,
    queue: Vec<Record>,
    player: PlayerStatus,
    stats: Statistics,
}

impl Session {
    pub fn new(connection: Connection, normalizer: Normalizer) -> Self {
        Self {
            connection,
            normalizer,
            idle_timeout: Duration::from_secs(86_400),
            status: Record::new(),
            statistics: Record::new(),
            queue: Vec::new(),
            player: PlayerStatus::default(),
            stats: Statistics::default(),
        }
    }

    /// Build an unconnected session from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Connection::from_config(config),
            Normalizer::new(config.tags),
        )
        .with_idle_timeout(config.idle_timeout())
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Establish the connection if it is not already open.
    pub fn connect(&mut self) -> Result<()> {
        self.connection.establish()
    }

    /// Close the connection. The next command reconnects.
    pub fn close(&mut self) -> Result<()> {
        self.connection.close()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_established()
    }

    pub fn is_local(&self) -> bool {
        self.connection.is_local()
    }

    pub fn server_version(&self) -> Option<&str> {
        self.connection.version()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Invoke a command by wire name. Unknown names do nothing and return `None`.
    pub fn call(&mut self, name: &str, args: &[Arg]) -> Result<Option<Response>> {
        let Some(command) = Command::from_name(name) else {
            debug!("Ignoring unknown command '{}'", name.trim());
            return Ok(None);
        };

        info!("Calling '{}' with {} argument(s)", command, args.len());
        self.run(command, args).map(Some)
    }

    /// Run a command with its standard deadline.
    pub fn run(&mut self, command: Command, args: &[Arg]) -> Result<Response> {
        let timeout = match command {
            Command::Idle => self.idle_timeout,
            _ => self.connection.default_timeout(),
        };
        self.run_with_timeout(command, args, timeout)
    }

    /// Run a command with an explicit deadline.
    pub fn run_with_timeout(
        &mut self,
        command: Command,
        args: &[Arg],
        timeout: Duration,
    ) -> Result<Response> {
        let count = args.iter().filter(|a| matches!(a, Arg::Value(_))).count();
        let arity = command.arity();
        if !arity.accepts(count) {
            return Err(Error::InvalidArgument(format!(
                "'{command}' takes {arity} argument(s), got {count}"
            )));
        }

        if command == Command::Close {
            // The daemon hangs up without answering `close`.
            if self.connection.is_established() {
                let _ = self.connection.write_all("close\n");
            }
            self.connection.close()?;
            return Ok(Response::Bool(true));
        }

        let line = codec::serialize(command.name(), args);
        let raw = framer::execute(&mut self.connection, &line, timeout)?;
        self.normalizer.normalize(command, &raw)
    }

    /// Send the configured password.
    pub fn authenticate(&mut self) -> Result<()> {
        if !self.connection.is_established() {
            return Err(Error::ConnectionNotEstablished(
                "authentication requires an established connection".to_string(),
            ));
        }

        let Some(password) = self.connection.password().map(str::to_string) else {
            let _ = self.connection.close();
            return Err(Error::NoPassword);
        };

        match self.run(Command::Password, &[Arg::from(password)]) {
            Ok(response) if response.as_bool() => {
                debug!("Password accepted");
                Ok(())
            }
            Ok(_) => {
                let _ = self.connection.close();
                Err(Error::BadPassword("password was not accepted".to_string()))
            }
            Err(Error::CommandFailed(ack)) => {
                warn!("Password rejected: {}", ack.message);
                let _ = self.connection.close();
                Err(Error::BadPassword(ack.message))
            }
            Err(e) => Err(e),
        }
    }

    /// Re-read statistics, status and the queue, and recompute derived fields.
    pub fn refresh(&mut self) -> Result<()> {
        let statistics = self.run(Command::Stats, &[])?.into_map();
        let status = self.run(Command::Status, &[])?.into_map();
        let queue = self.run(Command::PlaylistInfo, &[])?.into_records();

        self.statistics = statistics;
        self.status = status;
        self.queue = queue;
        self.player = PlayerStatus::from_record(&self.status);
        self.stats = Statistics::from_record(&self.statistics);

        debug!(
            "Refreshed: state {}, track {}/{}",
            self.player.state,
            self.player.current_track,
            self.queue.len()
        );
        Ok(())
    }

    /// Last `status` snapshot.
    pub fn status(&self) -> &Record {
        &self.status
    }

    /// Last `stats` snapshot.
    pub fn statistics_snapshot(&self) -> &Record {
        &self.statistics
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn player(&self) -> &PlayerStatus {
        &self.player
    }

    /// Last queue listing.
    pub fn queue(&self) -> &[Record] {
        &self.queue
    }

    /// Refresh, then return the queue record at the current position.
    pub fn current_track(&mut self) -> Result<Option<Record>> {
        self.refresh()?;
        Ok(self.queue.get(self.player.current_track).cloned())
    }

    /// Start or resume playback.
    ///
    /// With `resume`, a track that was already underway continues from its
    /// elapsed time; otherwise the current track starts from the beginning.
    pub fn play(&mut self, resume: bool) -> Result<Option<Record>> {
        self.refresh()?;

        let Some(position) = wrap_position(self.player.current_track, 0, self.queue.len()) else {
            debug!("Queue is empty, nothing to play");
            return Ok(None);
        };

        let elapsed = self.player.current_position;
        if resume && elapsed > 0 {
            info!("Resuming track {} from {}s", position, elapsed);
            self.run(Command::SeekCur, &[Arg::from(elapsed)])?;
            self.run(Command::Pause, &[Arg::from("0")])?;
        } else {
            self.run(Command::Play, &[Arg::from(position)])?;
        }

        self.current_track()
    }

    pub fn next(&mut self) -> Result<Option<Record>> {
        self.step(1)
    }

    pub fn previous(&mut self) -> Result<Option<Record>> {
        self.step(-1)
    }

    /// Jump to a queue position (taken modulo the queue length).
    pub fn skip(&mut self, to: usize) -> Result<Option<Record>> {
        self.refresh()?;
        let Some(position) = wrap_position(to, 0, self.queue.len()) else {
            return Ok(None);
        };
        self.play_position(position)
    }

    fn step(&mut self, step: i64) -> Result<Option<Record>> {
        self.refresh()?;
        let Some(position) = wrap_position(self.player.current_track, step, self.queue.len())
        else {
            return Ok(None);
        };
        self.play_position(position)
    }

    fn play_position(&mut self, position: usize) -> Result<Option<Record>> {
        info!("Playing queue position {}", position);
        self.run(Command::Play, &[Arg::from(position)])?;
        self.current_track()
    }

    /// Block until one of `subsystems` (or any, when empty) changes.
    pub fn idle(&mut self, subsystems: &[&str]) -> Result<Vec<String>> {
        Ok(self
            .run(Command::Idle, &codec::args(subsystems.iter().copied()))?
            .into_values())
    }

    /// Send a command list as one batch. The response is not normalized.
    pub fn send_batch(&mut self, batch: &CommandList) -> Result<RawResponse> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        info!("Sending command list of {} command(s)", batch.len());
        let timeout = self.connection.default_timeout();
        framer::execute_batch(&mut self.connection, batch, timeout)
    }

    /// Refresh, then return queue records that carry every descriptive tag.
    pub fn complete_tracks(&mut self) -> Result<Vec<Record>> {
        self.refresh()?;
        Ok(self
            .queue
            .iter()
            .filter(|track| has_descriptive_tags(track))
            .cloned()
            .collect())
    }

    /// Whether a stored playlist with this name exists.
    pub fn playlist_exists(&mut self, name: &str) -> Result<bool> {
        Ok(self
            .run(Command::ListPlaylists, &[])?
            .into_values()
            .iter()
            .any(|playlist| playlist == name))
    }

    /// The `file` of the first database match for `tag == value`.
    pub fn first_track_of(&mut self, tag: &str, value: &str) -> Result<Option<String>> {
        Ok(self
            .run(Command::Find, &codec::args([tag, value]))?
            .into_records()
            .into_iter()
            .next()
            .and_then(|record| record.get("file").cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpdwire_core::Endpoint;

    fn offline_session() -> Session {
        Session::new(
            Connection::new(Endpoint::Tcp {
                host: "localhost".to_string(),
                port: 6600,
            }),
            Normalizer::default(),
        )
    }

    #[test]
    fn test_wrap_previous_from_first() {
        assert_eq!(wrap_position(0, -1, 5), Some(4));
    }

    #[test]
    fn test_wrap_next_from_last() {
        assert_eq!(wrap_position(4, 1, 5), Some(0));
    }

    #[test]
    fn test_wrap_within_bounds() {
        assert_eq!(wrap_position(2, 1, 5), Some(3));
        assert_eq!(wrap_position(2, -1, 5), Some(1));
        assert_eq!(wrap_position(7, 0, 5), Some(2));
    }

    #[test]
    fn test_wrap_empty_queue() {
        assert_eq!(wrap_position(0, 1, 0), None);
    }

    #[test]
    fn test_unknown_command_is_noop() {
        let mut session = offline_session();
        assert!(matches!(session.call("frobnicate", &[]), Ok(None)));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_arity_checked_before_connecting() {
        let mut session = offline_session();
        let result = session.call("status", &codec::args(["extra"]));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_authenticate_requires_connection() {
        let mut session = offline_session();
        assert!(matches!(
            session.authenticate(),
            Err(Error::ConnectionNotEstablished(_))
        ));
    }

    #[test]
    fn test_empty_batch_sends_nothing() {
        let mut session = offline_session();
        assert_eq!(session.send_batch(&CommandList::new()).unwrap(), Vec::<String>::new());
        assert!(!session.is_connected());
    }
}
