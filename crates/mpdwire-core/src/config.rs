//! Configuration management for mpdwire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Where the daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP host and port.
    Tcp { host: String, port: u16 },
    /// Local unix-domain socket.
    Unix(PathBuf),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp { host, port } => write!(f, "{host}:{port}"),
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Main configuration structure for mpdwire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Daemon host name or address.
    pub host: String,

    /// Daemon TCP port.
    pub port: u16,

    /// Unix socket path. Takes precedence over `host`/`port` when set.
    pub socket: Option<PathBuf>,

    /// Password sent by `authenticate`.
    pub password: Option<String>,

    /// Default read deadline for a command, in seconds.
    pub timeout_secs: u64,

    /// Deadline for establishing the connection, in seconds.
    pub connect_timeout_secs: u64,

    /// Deadline for `idle`, in seconds.
    pub idle_timeout_secs: u64,

    /// Track record handling.
    pub tags: TagConfig,
}

/// How track records are post-processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Project track records down to the essential fields.
    pub filter: bool,

    /// Fail with `EssentialTagsMissing` when a track record is incomplete.
    pub require_essential: bool,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            filter: true,
            require_essential: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6600,
            socket: None,
            password: None,
            timeout_secs: 5,
            connect_timeout_secs: 5,
            idle_timeout_secs: 86_400,
            tags: TagConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;

        config.socket = config
            .socket
            .map(|p| crate::paths::expand(&p.to_string_lossy()));

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `MPD_HOST` and `MPD_PORT` from the environment.
    ///
    /// `MPD_HOST` accepts `host`, `password@host`, or a socket path
    /// (`/run/mpd/socket`, `~/.mpd/socket`, optionally with `password@`).
    pub fn apply_env(&mut self) -> crate::Result<()> {
        if let Ok(value) = std::env::var("MPD_HOST") {
            self.apply_host_spec(&value);
        }

        if let Ok(value) = std::env::var("MPD_PORT") {
            self.port = value
                .trim()
                .parse()
                .map_err(|_| crate::Error::Config(format!("Invalid MPD_PORT: {value}")))?;
        }

        self.validate()
    }

    fn apply_host_spec(&mut self, spec: &str) {
        let spec = spec.trim();
        if spec.is_empty() {
            return;
        }

        let host = match spec.rsplit_once('@') {
            Some((password, host)) if !password.is_empty() && !host.is_empty() => {
                self.password = Some(password.to_string());
                host
            }
            _ => spec,
        };

        if host.starts_with('/') || host.starts_with('~') {
            self.socket = Some(crate::paths::expand(host));
        } else {
            self.host = host.to_string();
            self.socket = None;
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if self.socket.is_none() && self.host.trim().is_empty() {
            return Err(crate::Error::Config(
                "Either host or socket must be set".to_string(),
            ));
        }
        if self.timeout_secs == 0
            || self.connect_timeout_secs == 0
            || self.idle_timeout_secs == 0
        {
            return Err(crate::Error::Config(
                "Timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// The endpoint the client should connect to.
    pub fn endpoint(&self) -> Endpoint {
        match &self.socket {
            Some(path) => Endpoint::Unix(path.clone()),
            None => Endpoint::Tcp {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }

    /// A non-empty configured password.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::test_env_lock;

    fn clear_env() {
        std::env::remove_var("MPD_HOST");
        std::env::remove_var("MPD_PORT");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(
            config.endpoint(),
            Endpoint::Tcp {
                host: "localhost".to_string(),
                port: 6600
            }
        );
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.idle_timeout(), Duration::from_secs(86_400));
        assert!(config.tags.filter);
        assert!(!config.tags.require_essential);
        assert_eq!(config.password(), None);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "host = \"music.lan\"\npassword = \"hunter2\"\n\n[tags]\nrequire_essential = true\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.host, "music.lan");
        assert_eq!(config.port, 6600);
        assert_eq!(config.password(), Some("hunter2"));
        assert!(config.tags.filter);
        assert!(config.tags.require_essential);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.port = 6601;
        config.socket = Some(PathBuf::from("/run/mpd/socket"));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.endpoint(),
            Endpoint::Unix(PathBuf::from("/run/mpd/socket"))
        );
    }

    #[test]
    fn test_load_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = 0\n").unwrap();

        assert!(matches!(Config::load(&path), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_load_rejects_zero_idle_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "idle_timeout_secs = 0\n").unwrap();

        assert!(matches!(Config::load(&path), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_env_host_with_password() {
        let _lock = test_env_lock();
        clear_env();
        std::env::set_var("MPD_HOST", "secret@media.local");
        std::env::set_var("MPD_PORT", "6700");

        let mut config = Config::default();
        config.apply_env().unwrap();
        clear_env();

        assert_eq!(config.host, "media.local");
        assert_eq!(config.port, 6700);
        assert_eq!(config.password(), Some("secret"));
    }

    #[test]
    fn test_env_socket_path() {
        let _lock = test_env_lock();
        clear_env();
        std::env::set_var("MPD_HOST", "/run/mpd/socket");

        let mut config = Config::default();
        config.apply_env().unwrap();
        clear_env();

        assert_eq!(
            config.endpoint(),
            Endpoint::Unix(PathBuf::from("/run/mpd/socket"))
        );
        assert_eq!(config.password(), None);
    }

    #[test]
    fn test_env_invalid_port() {
        let _lock = test_env_lock();
        clear_env();
        std::env::set_var("MPD_PORT", "not-a-port");

        let mut config = Config::default();
        let result = config.apply_env();
        clear_env();

        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_empty_password_is_none() {
        let config = Config {
            password: Some(String::new()),
            ..Config::default()
        };
        assert_eq!(config.password(), None);
    }
}
