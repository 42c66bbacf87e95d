//! Socket transport to the daemon.
//!
//! A [`Connection`] owns one duplex stream (TCP or unix socket). Opening it
//! consumes the `OK MPD <version>` greeting; reads afterwards are bounded by
//! a deadline set per exchange.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{IpAddr, Shutdown, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use mpdwire_core::ack::{ACK_MARKER, OK_MARKER};
use mpdwire_core::{Ack, Config, Endpoint, Error, Result};
use tracing::{debug, info, warn};

/// The underlying byte stream.
#[derive(Debug)]
pub enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Stream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.set_read_timeout(timeout),
            #[cfg(unix)]
            Stream::Unix(s) => s.set_read_timeout(timeout),
        }
    }

    fn shutdown(&self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Stream::Unix(s) => s.shutdown(Shutdown::Both),
        }
    }

    /// Whether the peer is on this machine, judged from the socket itself.
    fn peer_is_local(&self) -> bool {
        match self {
            #[cfg(unix)]
            Stream::Unix(_) => true,
            Stream::Tcp(s) => match (s.peer_addr(), s.local_addr()) {
                (Ok(peer), Ok(local)) => peer.ip() == local.ip() || peer.ip().is_loopback(),
                _ => false,
            },
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.read(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.write(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.flush(),
            #[cfg(unix)]
            Stream::Unix(s) => s.flush(),
        }
    }
}

/// Whether an I/O error means a read deadline fired.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Reduce a reported version to major/minor precision (`0.20.0` -> `0.20.x`).
pub fn canonical_version(version: &str) -> String {
    match version.rsplit_once('.') {
        Some((major_minor, patch))
            if major_minor.contains('.')
                && !patch.is_empty()
                && patch.chars().all(|c| c.is_ascii_digit()) =>
        {
            format!("{major_minor}.x")
        }
        _ => version.to_string(),
    }
}

fn host_is_loopback(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}

/// A connection to the daemon.
#[derive(Debug)]
pub struct Connection {
    endpoint: Endpoint,
    password: Option<String>,
    version: Option<String>,
    stream: Option<BufReader<Stream>>,
    local: bool,
    connect_timeout: Duration,
    default_timeout: Duration,
    deadline: Option<Instant>,
}

impl Connection {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            password: None,
            version: None,
            stream: None,
            local: false,
            connect_timeout: Duration::from_secs(5),
            default_timeout: Duration::from_secs(5),
            deadline: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.endpoint())
            .with_password(config.password().map(str::to_string))
            .with_timeouts(config.connect_timeout(), config.timeout())
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, default: Duration) -> Self {
        self.connect_timeout = connect;
        self.default_timeout = default;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Protocol version from the last greeting, e.g. `0.23.x`.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_established(&self) -> bool {
        self.stream.is_some()
    }

    /// Whether the daemon runs on this machine. Only meaningful once established.
    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Open the socket and consume the greeting. No-op when already connected.
    pub fn establish(&mut self) -> Result<()> {
        if self.is_established() {
            return Ok(());
        }

        info!("Connecting to daemon at {}", self.endpoint);

        let stream = self.open_stream().map_err(|e| {
            warn!("Connection to {} failed: {}", self.endpoint, e);
            e
        })?;
        stream
            .set_read_timeout(Some(self.connect_timeout))
            .map_err(|e| Error::ConnectionFailed(e.to_string()))?;

        let mut reader = BufReader::new(stream);
        let version = read_greeting(&mut reader)?;

        self.local = self.determine_local(reader.get_ref());
        self.version = Some(canonical_version(&version));
        self.stream = Some(reader);
        self.set_deadline(self.default_timeout)?;

        info!(
            "Connected to {} (protocol {}, local: {})",
            self.endpoint,
            self.version.as_deref().unwrap_or("unknown"),
            self.local
        );
        Ok(())
    }

    fn open_stream(&self) -> Result<Stream> {
        match &self.endpoint {
            Endpoint::Tcp { host, port } => {
                let addrs = (host.as_str(), *port)
                    .to_socket_addrs()
                    .map_err(|e| Error::ConnectionFailed(format!("{host}:{port}: {e}")))?;

                let mut last_error = None;
                for addr in addrs {
                    debug!("Trying {}", addr);
                    match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                        Ok(stream) => return Ok(Stream::Tcp(stream)),
                        Err(e) => last_error = Some(e),
                    }
                }

                Err(Error::ConnectionFailed(match last_error {
                    Some(e) => format!("{host}:{port}: {e}"),
                    None => format!("{host}:{port}: no addresses resolved"),
                }))
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => UnixStream::connect(path)
                .map(Stream::Unix)
                .map_err(|e| Error::ConnectionFailed(format!("{}: {e}", path.display()))),
            #[cfg(not(unix))]
            Endpoint::Unix(path) => Err(Error::ConnectionFailed(format!(
                "{}: unix sockets are not supported on this platform",
                path.display()
            ))),
        }
    }

    fn determine_local(&self, stream: &Stream) -> bool {
        if stream.peer_is_local() {
            return true;
        }
        match &self.endpoint {
            Endpoint::Tcp { host, .. } => host_is_loopback(host),
            Endpoint::Unix(_) => true,
        }
    }

    /// Close the socket. Local state is reset even if the shutdown fails.
    pub fn close(&mut self) -> Result<()> {
        self.deadline = None;

        let Some(reader) = self.stream.take() else {
            return Ok(());
        };

        debug!("Disconnecting from {}", self.endpoint);
        match reader.get_ref().shutdown() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(Error::DisconnectionFailed(e.to_string())),
        }
    }

    /// Bound the next reads to `timeout` from now.
    pub fn set_deadline(&mut self, timeout: Duration) -> Result<()> {
        self.deadline = Some(Instant::now() + timeout);
        if let Some(reader) = &self.stream {
            reader.get_ref().set_read_timeout(Some(timeout))?;
        }
        Ok(())
    }

    /// Restore the default deadline.
    pub fn reset_deadline(&mut self) -> Result<()> {
        self.set_deadline(self.default_timeout)
    }

    /// Write raw bytes to the socket.
    pub fn write_all(&mut self, data: &str) -> io::Result<()> {
        let reader = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        let stream = reader.get_mut();
        stream.write_all(data.as_bytes())?;
        stream.flush()
    }

    /// Read one line within the current deadline. `Ok(None)` means end of stream.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let remaining = match self.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(io::Error::from(io::ErrorKind::TimedOut));
                }
                Some(remaining)
            }
            None => None,
        };

        let reader = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        reader.get_ref().set_read_timeout(remaining)?;

        let mut line = String::new();
        match reader.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

#[cfg(test)]
impl Connection {
    /// Half-close the client side so the next write fails.
    pub(crate) fn shutdown_write(&self) {
        if let Some(reader) = &self.stream {
            let _ = match reader.get_ref() {
                Stream::Tcp(s) => s.shutdown(Shutdown::Write),
                #[cfg(unix)]
                Stream::Unix(s) => s.shutdown(Shutdown::Write),
            };
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Read the greeting, returning the raw version token.
fn read_greeting<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    loop {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|e| {
            if is_timeout(&e) {
                Error::ConnectionFailed("timed out waiting for greeting".to_string())
            } else {
                Error::ConnectionFailed(e.to_string())
            }
        })?;
        if read == 0 {
            return Err(Error::ConnectionFailed(
                "connection closed before greeting".to_string(),
            ));
        }

        let response = line.trim();
        if response.starts_with(OK_MARKER) {
            let version = response.split_whitespace().nth(2).unwrap_or("0");
            return Ok(version.to_string());
        }

        if response.starts_with(ACK_MARKER) {
            let message = Ack::parse(response)
                .map(|ack| ack.message)
                .unwrap_or_else(|| response.to_string());
            return Err(Error::ConnectionFailed(message));
        }
    }
}
