// persona-chat/src/config.rs

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::{info, warn};

/// Document key of the spreadsheet the app was first deployed against.
pub const DEFAULT_SPREADSHEET_KEY: &str = "1XpB4gzlkOS72uJMADmSIuvqECM5Ud8M-KwwJbXSxJxM";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Which spreadsheet implementation backs the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetsBackendKind {
    Google,
    Memory,
}

impl FromStr for SheetsBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown SHEETS_BACKEND '{}'. Expected 'google' or 'memory'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    pub sheets_backend: SheetsBackendKind,
    pub spreadsheet_key: String,
    pub sheets_api_base: String,
    /// Raw service-account secret. Never logged.
    pub service_account_json: Option<String>,
    pub profile_cache_ttl_seconds: u64,
    pub session_idle_seconds: u64,
    pub sheets_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("Failed to load .env file: {}. Using system environment variables.", e);
        } else {
            info!("Loaded environment variables from .env file");
        }

        let sheets_backend: SheetsBackendKind = env::var("SHEETS_BACKEND")
            .unwrap_or_else(|_| "google".into())
            .parse()?;

        let service_account_json = Self::read_service_account_secret()?;
        if sheets_backend == SheetsBackendKind::Google && service_account_json.is_none() {
            return Err(anyhow::anyhow!(
                "GOOGLE_SERVICE_ACCOUNT_JSON (or GOOGLE_SERVICE_ACCOUNT_JSON_FILE) must be set when SHEETS_BACKEND=google"
            ));
        }

        Ok(Self {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8501".into())
                .parse()
                .context("API_PORT must be a port number")?,
            sheets_backend,
            spreadsheet_key: env::var("SPREADSHEET_KEY")
                .unwrap_or_else(|_| DEFAULT_SPREADSHEET_KEY.into()),
            sheets_api_base: env::var("SHEETS_API_BASE")
                .unwrap_or_else(|_| DEFAULT_SHEETS_API_BASE.into())
                .trim_end_matches('/')
                .to_string(),
            service_account_json,
            profile_cache_ttl_seconds: env::var("PROFILE_CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .context("PROFILE_CACHE_TTL_SECONDS must be an integer")?,
            session_idle_seconds: env::var("SESSION_IDLE_SECONDS")
                .unwrap_or_else(|_| "3600".into())
                .parse()
                .context("SESSION_IDLE_SECONDS must be an integer")?,
            sheets_timeout_seconds: env::var("SHEETS_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .context("SHEETS_TIMEOUT_SECONDS must be an integer")?,
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "120".into())
                .parse()
                .context("REQUEST_TIMEOUT_SECONDS must be an integer")?,
        })
    }

    /// Inline secret wins over the file variant.
    fn read_service_account_secret() -> Result<Option<String>> {
        if let Ok(inline) = env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            if !inline.trim().is_empty() {
                return Ok(Some(inline));
            }
        }

        match env::var("GOOGLE_SERVICE_ACCOUNT_JSON_FILE") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read service account secret from {}", path))?;
                info!("Using service account secret from file: {}", path);
                Ok(Some(raw))
            }
            Err(_) => Ok(None),
        }
    }

    pub fn print_config(&self) {
        info!("Current Configuration:");
        info!("- API: {}:{}", self.api_host, self.api_port);
        info!("- Sheets Backend: {:?}", self.sheets_backend);
        info!("- Spreadsheet Key: {}", self.spreadsheet_key);
        info!("- Sheets API Base: {}", self.sheets_api_base);
        info!(
            "- Service Account Secret: {}",
            if self.service_account_json.is_some() { "provided" } else { "absent" }
        );
        info!("- Profile Cache TTL: {}s", self.profile_cache_ttl_seconds);
        info!("- Session Idle Expiry: {}s", self.session_idle_seconds);
        info!("- Sheets Timeout: {}s", self.sheets_timeout_seconds);
        info!("- Request Timeout: {}s", self.request_timeout_seconds);
    }

    pub fn api_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.api_host, self.api_port)
            .parse()
            .with_context(|| format!("Invalid API address {}:{}", self.api_host, self.api_port))
    }

    /// Settings for running entirely in memory, used by tests and local demos.
    pub fn in_memory() -> Self {
        Self {
            api_host: "127.0.0.1".into(),
            api_port: 8501,
            sheets_backend: SheetsBackendKind::Memory,
            spreadsheet_key: DEFAULT_SPREADSHEET_KEY.into(),
            sheets_api_base: DEFAULT_SHEETS_API_BASE.into(),
            service_account_json: None,
            profile_cache_ttl_seconds: 60,
            session_idle_seconds: 3600,
            sheets_timeout_seconds: 30,
            request_timeout_seconds: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Backend Selection Tests =====

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("google".parse::<SheetsBackendKind>().unwrap(), SheetsBackendKind::Google);
        assert_eq!(" Memory ".parse::<SheetsBackendKind>().unwrap(), SheetsBackendKind::Memory);
    }

    #[test]
    fn test_backend_kind_rejects_unknown() {
        let err = "sqlite".parse::<SheetsBackendKind>().unwrap_err();
        assert!(err.to_string().contains("sqlite"));
    }

    // ===== API Address Tests =====

    #[test]
    fn test_api_addr_parsing() {
        let config = Config::in_memory();
        let addr = config.api_addr().unwrap();

        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8501);
    }

    #[test]
    fn test_api_addr_with_zero_address() {
        let mut config = Config::in_memory();
        config.api_host = "0.0.0.0".to_string();
        config.api_port = 5000;

        let addr = config.api_addr().unwrap();
        assert_eq!(addr.port(), 5000);
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
    }

    #[test]
    fn test_api_addr_rejects_hostname_garbage() {
        let mut config = Config::in_memory();
        config.api_host = "not a host".to_string();
        assert!(config.api_addr().is_err());
    }

    // ===== Defaults =====

    #[test]
    fn test_in_memory_defaults() {
        let config = Config::in_memory();
        assert_eq!(config.sheets_backend, SheetsBackendKind::Memory);
        assert_eq!(config.spreadsheet_key, DEFAULT_SPREADSHEET_KEY);
        assert!(config.service_account_json.is_none());
        assert!(config.profile_cache_ttl_seconds > 0);
        assert!(config.sheets_timeout_seconds <= config.request_timeout_seconds);
    }
}
