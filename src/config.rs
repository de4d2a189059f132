// ── Chatmark: Server Config ────────────────────────────────────────────────
// TOML config with serde defaults. A missing file means "run with defaults";
// a present-but-broken file is a hard error so typos don't silently fall back.

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind — "127.0.0.1" (local only) or "0.0.0.0" (LAN).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL clients use to reach this server; prefixed onto download URLs.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Directory uploaded files are written to (created on startup).
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Optional chatbox config fixture; built-in default when unset.
    #[serde(default)]
    pub chatbox_path: Option<PathBuf>,
    /// Origin allowed by the CORS layer (credentialed, so it must be exact).
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    /// Password checked by `POST /login` (username is fixed to "admin").
    #[serde(default = "default_password")]
    pub password: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8000
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_allowed_origin() -> String {
    "http://127.0.0.1:5173".into()
}

fn default_password() -> String {
    "admin".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: default_bind_address(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            upload_dir: default_upload_dir(),
            chatbox_path: None,
            allowed_origin: default_allowed_origin(),
            password: default_password(),
        }
    }
}

impl ServerConfig {
    /// Load from `path`, then apply `CHATMARK_BIND` / `CHATMARK_PORT` env
    /// overrides.
    pub fn load(path: &Path) -> ChatResult<Self> {
        let mut config = if path.is_file() {
            let raw = std::fs::read_to_string(path)?;
            let config: ServerConfig = toml::from_str(&raw)
                .map_err(|e| ChatError::Config(format!("{}: {e}", path.display())))?;
            info!("[config] Loaded {}", path.display());
            config
        } else {
            info!("[config] No config file at {} — using defaults", path.display());
            ServerConfig::default()
        };

        if let Ok(bind) = std::env::var("CHATMARK_BIND") {
            config.bind_address = bind;
        }
        if let Ok(port) = std::env::var("CHATMARK_PORT") {
            config.port = port
                .parse()
                .map_err(|_| ChatError::Config(format!("CHATMARK_PORT '{port}' is not a port")))?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = ServerConfig::load(Path::new("/does/not/exist.toml")).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.bind_address, "127.0.0.1");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: ServerConfig = toml::from_str("port = 9000").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.password, "admin");
    }
}
