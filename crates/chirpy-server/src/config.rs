use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug)]
pub struct Config {
    pub jwt_secret: String,
    pub polka_key: String,
    pub db_path: PathBuf,
    pub file_root: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Read configuration from the environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = var("JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let polka_key = var("POLKA_KEY").context("POLKA_KEY must be set")?;

        let db_path = var("CHIRPY_DB_PATH")
            .unwrap_or_else(|| "database.json".into())
            .into();
        let file_root = var("CHIRPY_FILE_ROOT").unwrap_or_else(|| ".".into()).into();
        let host = var("CHIRPY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("CHIRPY_PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .context("CHIRPY_PORT must be a port number")?;

        Ok(Self {
            jwt_secret,
            polka_key,
            db_path,
            file_root,
            host,
            port,
        })
    }
}
