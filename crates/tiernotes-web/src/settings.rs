use std::net::SocketAddr;

use tiernotes_core::config_file::ConfigFile;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// HTTP-facing settings, resolved from the `[server]` table and then
/// `TIERNOTES_BIND`.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: SocketAddr,
    /// Allowed browser origin; `*` allows any.
    pub cors_origin: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl ServerSettings {
    pub fn resolve(
        file: &ConfigFile,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let server = file.server.clone().unwrap_or_default();

        let bind = lookup("TIERNOTES_BIND")
            .or(server.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address '{bind}': {e}"))?;

        let max_upload_mb = server.max_upload_mb.unwrap_or(DEFAULT_MAX_UPLOAD_MB);
        if max_upload_mb == 0 {
            anyhow::bail!("max_upload_mb must be at least 1");
        }

        Ok(Self {
            bind,
            cors_origin: server
                .cors_origin
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}
