//! Store configuration for the blood pressure logger
//!
//! The configuration is read once at startup and handed to the store
//! constructors. Nothing below the binary looks at the environment.

use std::env;
use std::fs;
use std::path::PathBuf;

use secrecy::SecretString;
use tracing::{info, warn};

/// Default path of the local CSV file
pub const DEFAULT_CSV_PATH: &str = "bp_data.csv";

/// Default worksheet name in the remote spreadsheet
pub const DEFAULT_WORKSHEET: &str = "bp_data";

/// Remote spreadsheet configuration
#[derive(Debug)]
pub struct RemoteConfig {
    /// Service-account key JSON
    pub service_account: SecretString,
    /// Spreadsheet URL or key. A spreadsheet is created when absent.
    pub spreadsheet: Option<String>,
    /// Worksheet holding the reading table
    pub worksheet: String,
}

/// Store configuration
#[derive(Debug)]
pub struct StoreConfig {
    /// Path to the local CSV file
    pub csv_path: PathBuf,
    /// Remote spreadsheet settings; `None` keeps everything local
    pub remote: Option<RemoteConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            remote: None,
        }
    }
}

impl StoreConfig {
    /// Create a new store configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create a store configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let csv_path = non_empty("BP_CSV_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH));
        info!("Using local CSV at: {}", csv_path.display());

        let service_account = match (
            non_empty("GCP_SERVICE_ACCOUNT_JSON"),
            non_empty("GCP_SERVICE_ACCOUNT_FILE"),
        ) {
            (Some(json), _) => Some(json),
            (None, Some(path)) => match fs::read_to_string(&path) {
                Ok(json) => Some(json),
                Err(e) => {
                    // Remote mode stays on so the failure surfaces as an auth error
                    warn!("Failed to read service account file {}: {}", path, e);
                    Some(String::new())
                }
            },
            (None, None) => None,
        };

        let remote = match service_account {
            Some(json) => {
                let spreadsheet = non_empty("BP_SPREADSHEET");
                let worksheet =
                    non_empty("BP_WORKSHEET").unwrap_or_else(|| DEFAULT_WORKSHEET.to_string());
                info!(
                    "Google Sheets enabled: worksheet={}, spreadsheet={}",
                    worksheet,
                    spreadsheet.as_deref().unwrap_or("auto-created")
                );
                Some(RemoteConfig {
                    service_account: SecretString::from(json),
                    spreadsheet,
                    worksheet,
                })
            }
            None => {
                warn!("Google Sheets not configured. Using local CSV.");
                None
            }
        };

        Self { csv_path, remote }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_credentials() {
        let config = StoreConfig::from_lookup(lookup(&[]));
        assert_eq!(config.csv_path, PathBuf::from(DEFAULT_CSV_PATH));
        assert!(config.remote.is_none());
    }

    #[test]
    fn test_inline_credentials_enable_remote() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("BP_CSV_PATH", "/tmp/bp.csv"),
            ("GCP_SERVICE_ACCOUNT_JSON", "{\"client_email\":\"a@b\"}"),
            ("BP_SPREADSHEET", "abc123"),
        ]));

        assert_eq!(config.csv_path, PathBuf::from("/tmp/bp.csv"));
        let remote = config.remote.expect("remote config");
        assert_eq!(remote.worksheet, DEFAULT_WORKSHEET);
        assert_eq!(remote.spreadsheet.as_deref(), Some("abc123"));
        assert!(remote.service_account.expose_secret().contains("client_email"));
    }

    #[test]
    fn test_credentials_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"client_email\":\"svc@example.com\"}}").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = StoreConfig::from_lookup(lookup(&[
            ("GCP_SERVICE_ACCOUNT_FILE", path.as_str()),
            ("BP_WORKSHEET", "readings"),
        ]));

        let remote = config.remote.expect("remote config");
        assert_eq!(remote.worksheet, "readings");
        assert!(remote.spreadsheet.is_none());
        assert!(remote.service_account.expose_secret().contains("svc@example.com"));
    }

    #[test]
    fn test_unreadable_credentials_file_keeps_remote_mode() {
        let config = StoreConfig::from_lookup(lookup(&[(
            "GCP_SERVICE_ACCOUNT_FILE",
            "/nonexistent/key.json",
        )]));

        let remote = config.remote.expect("remote config");
        assert!(remote.service_account.expose_secret().is_empty());
    }
}
