use std::path::PathBuf;

use crate::card::DEFAULT_WHATSAPP_NUMBER;
use crate::error::AppError;

const DEFAULT_ADMIN: &str = "ADMIN";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL. Takes precedence over `snapshot_path` for persistence.
    pub redis_url: Option<String>,
    /// JSON file holding the course snapshot when Redis is not configured.
    pub snapshot_path: Option<PathBuf>,
    /// When set, serve the HTTP API on this address instead of MCP on stdio.
    pub http_listen_addr: Option<String>,
    pub admin_username: String,
    pub admin_password: String,
    /// Digits-only phone number used in enrollment links.
    pub whatsapp_number: String,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            snapshot_path: None,
            http_listen_addr: None,
            admin_username: DEFAULT_ADMIN.to_string(),
            admin_password: DEFAULT_ADMIN.to_string(),
            whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// All optional:
    /// - `REDIS_URL`
    /// - `CATALOG_SNAPSHOT_PATH`
    /// - `CATALOG_HTTP_LISTEN_ADDR`
    /// - `CATALOG_ADMIN_USERNAME`, `CATALOG_ADMIN_PASSWORD` (default: "ADMIN" / "ADMIN")
    /// - `CATALOG_WHATSAPP_NUMBER`
    /// - `CATALOG_MAX_UPLOAD_BYTES` (default: 20 MiB)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let admin_username = get("CATALOG_ADMIN_USERNAME").unwrap_or(defaults.admin_username);
        let admin_password = get("CATALOG_ADMIN_PASSWORD").unwrap_or(defaults.admin_password);

        let whatsapp_number = get("CATALOG_WHATSAPP_NUMBER")
            .map(|n| n.trim().to_string())
            .unwrap_or(defaults.whatsapp_number);
        if !whatsapp_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::Config(format!(
                "CATALOG_WHATSAPP_NUMBER must contain digits only, got {whatsapp_number:?}"
            )));
        }

        let max_upload_bytes = match get("CATALOG_MAX_UPLOAD_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().ok().filter(|&n| n > 0).ok_or_else(|| {
                AppError::Config(format!(
                    "CATALOG_MAX_UPLOAD_BYTES must be a positive integer, got {raw:?}"
                ))
            })?,
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            redis_url: get("REDIS_URL"),
            snapshot_path: get("CATALOG_SNAPSHOT_PATH").map(PathBuf::from),
            http_listen_addr: get("CATALOG_HTTP_LISTEN_ADDR"),
            admin_username,
            admin_password,
            whatsapp_number,
            max_upload_bytes,
        })
    }
}
