use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::info;

/// Server configuration, read from `CUPID_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub storage_dir: PathBuf,
    pub fallback_dir: PathBuf,
    pub public_url: String,
    pub retention_days: i64,
    pub sweep_interval_secs: u64,
    pub session_ttl_secs: u64,
    pub admin_token: Option<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port: u16 = try_load("CUPID_PORT", "3000")?;
        Ok(Self {
            host: try_load("CUPID_HOST", "0.0.0.0")?,
            port,
            db_path: try_load("CUPID_DB_PATH", "cupid.db")?,
            storage_dir: try_load("CUPID_STORAGE_DIR", "./cupid-storage")?,
            fallback_dir: try_load("CUPID_FALLBACK_DIR", "./cupid-fallback")?,
            public_url: try_load("CUPID_PUBLIC_URL", &format!("http://localhost:{}", port))?,
            retention_days: try_load("CUPID_RETENTION_DAYS", "30")?,
            sweep_interval_secs: try_load("CUPID_SWEEP_INTERVAL_SECS", "3600")?,
            session_ttl_secs: try_load("CUPID_SESSION_TTL_SECS", "7200")?,
            admin_token: env::var("CUPID_ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            max_upload_bytes: try_load("CUPID_MAX_UPLOAD_BYTES", "10485760")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value '{raw}'"))
}
