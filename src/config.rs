//! Engine configuration.

/// Default listen port when `LEANCLOUD_APP_PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

/// Default listen host when `ENGINE_HOST` is unset.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Process-wide settings, read once at startup.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// `host:port` the [`Server`](crate::Server) binds to.
    pub addr: String,
    /// Reported as `runtime` by the ping endpoint.
    pub runtime: String,
    /// Reported as `version` by the ping endpoint.
    pub version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            addr: format!("{DEFAULT_HOST}:{DEFAULT_PORT}"),
            runtime: "rust".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl EngineConfig {
    /// Reads `ENGINE_HOST` and `LEANCLOUD_APP_PORT`. An unset or unparsable
    /// port falls back to [`DEFAULT_PORT`]; the host is validated when the
    /// server binds.
    pub fn from_env() -> Self {
        let host = std::env::var("ENGINE_HOST")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = std::env::var("LEANCLOUD_APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { addr: format!("{host}:{port}"), ..Self::default() }
    }
}
