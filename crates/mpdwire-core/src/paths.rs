//! Common filesystem paths used by mpdwire.

use std::path::PathBuf;

/// Base directory for mpdwire state.
///
/// Defaults to `~/.config/mpdwire`, but can be overridden via `MPDWIRE_DIR`
/// for testing or multi-instance setups.
pub fn mpdwire_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MPDWIRE_DIR") {
        return PathBuf::from(dir);
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".config").join("mpdwire")
}

/// Path to the mpdwire configuration file.
pub fn config_path() -> PathBuf {
    mpdwire_dir().join("config.toml")
}

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

#[doc(hidden)]
pub fn test_env_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_honours_override() {
        let _lock = test_env_lock();
        std::env::set_var("MPDWIRE_DIR", "/tmp/mpdwire-test");
        assert_eq!(
            config_path(),
            PathBuf::from("/tmp/mpdwire-test/config.toml")
        );
        std::env::remove_var("MPDWIRE_DIR");
        assert!(config_path().ends_with(".config/mpdwire/config.toml"));
    }

    #[test]
    fn test_expand_tilde() {
        let _lock = test_env_lock();
        let home = std::env::var("HOME").unwrap_or_default();
        if home.is_empty() {
            return;
        }
        assert_eq!(expand("~/.mpd/socket"), PathBuf::from(home).join(".mpd/socket"));
        assert_eq!(expand("/run/mpd/socket"), PathBuf::from("/run/mpd/socket"));
    }
}
