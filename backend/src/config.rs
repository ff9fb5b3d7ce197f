//! Startup configuration, read once from the process environment.
//!
//! Everything the service needs from the outside world lives in `AppConfig`:
//! the listen port, the record-store credentials, and the filesystem paths
//! used by the label flow. The struct is built in `main.rs` and injected into
//! the Actix application as `web::Data`, so handlers never touch `std::env`
//! directly and tests can construct a config pointing at temporary paths.

use std::env;
use std::path::PathBuf;

/// Default port, matching the value the frontend expects in development.
const DEFAULT_PORT: u16 = 3000;
/// The label template read by the label flow.
const DEFAULT_TEMPLATE_PATH: &str = "uploads/template.xml";
/// Directory generated label files are written into.
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_RECORD_STORE_BASE_URL: &str = "https://api.notion.com";

/// Connection details for the external record store.
#[derive(Clone, Debug)]
pub struct RecordStoreConfig {
    /// Base URL of the record-store API, without a trailing slash.
    pub base_url: String,
    /// Bearer token for the integration.
    pub api_key: String,
    /// The database new job pages are created under.
    pub database_id: String,
}

/// Full service configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub record_store: RecordStoreConfig,
    pub template_path: PathBuf,
    pub upload_dir: PathBuf,
}

impl AppConfig {
    /// Reads the configuration from the environment.
    ///
    /// `NOTION_API_KEY` and `NOTION_DATABASE_ID` are required; everything else
    /// falls back to a default. Returns a human-readable message when a
    /// required variable is missing or `PORT` is not a number, so `main` can
    /// print it and refuse to start.
    pub fn from_env() -> Result<Self, String> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("PORT must be a number, got `{}`", raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let api_key =
            env::var("NOTION_API_KEY").map_err(|_| "NOTION_API_KEY is not set".to_string())?;
        let database_id = env::var("NOTION_DATABASE_ID")
            .map_err(|_| "NOTION_DATABASE_ID is not set".to_string())?;
        let base_url = env::var("RECORD_STORE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_RECORD_STORE_BASE_URL.to_string());

        let template_path = env::var("TEMPLATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TEMPLATE_PATH));
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR));

        Ok(AppConfig {
            port,
            record_store: RecordStoreConfig {
                base_url,
                api_key,
                database_id,
            },
            template_path,
            upload_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the env mutations stay sequential.
    #[test]
    fn reads_required_vars_and_applies_defaults() {
        env::set_var("NOTION_API_KEY", "secret");
        env::set_var("NOTION_DATABASE_ID", "db-1");
        env::remove_var("PORT");
        env::remove_var("RECORD_STORE_BASE_URL");
        env::remove_var("TEMPLATE_PATH");
        env::remove_var("UPLOAD_DIR");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.record_store.api_key, "secret");
        assert_eq!(config.record_store.base_url, DEFAULT_RECORD_STORE_BASE_URL);
        assert_eq!(config.template_path, PathBuf::from(DEFAULT_TEMPLATE_PATH));

        env::set_var("PORT", "not-a-port");
        assert!(AppConfig::from_env().is_err());
        env::remove_var("PORT");

        env::remove_var("NOTION_API_KEY");
        assert!(AppConfig::from_env().is_err());
    }
}
