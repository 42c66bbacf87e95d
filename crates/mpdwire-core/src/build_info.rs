/// Compile-time build metadata for mpdwire binaries.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_sha: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
}

const fn env_or<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value {
        Some(v) => v,
        None => default,
    }
}

pub const BUILD_INFO: BuildInfo = BuildInfo {
    version: env!("CARGO_PKG_VERSION"),
    git_sha: env_or(option_env!("MPDWIRE_BUILD_GIT_SHA"), "unknown"),
    timestamp: env_or(option_env!("MPDWIRE_BUILD_TIMESTAMP"), "unknown"),
    target: env_or(option_env!("MPDWIRE_BUILD_TARGET"), "unknown"),
};

impl BuildInfo {
    /// One-line description suitable for `--version` output.
    pub fn version_line(self, binary_name: &str) -> String {
        format!(
            "{binary_name} {} (rev {}, built {}, target {})",
            self.version, self.git_sha, self.timestamp, self.target
        )
    }

    /// Like [`BuildInfo::version_line`], with the protocol version reported by a daemon.
    pub fn version_line_with_server(self, binary_name: &str, server: Option<&str>) -> String {
        match server {
            Some(server) => format!("{} (daemon protocol {server})", self.version_line(binary_name)),
            None => format!("{} (daemon not connected)", self.version_line(binary_name)),
        }
    }
}
