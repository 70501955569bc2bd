use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::ConnectionInfo;
use crate::error::{ProvisionError, Result};
use crate::utils::credential_store;

pub const DEFAULT_ORACLE_PORT: u16 = 1521;
pub const DEFAULT_EMBEDDING_PORT: u16 = 11435;

/// Defaults for a run, read from `<config_dir>/ora_provision/config.json`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub script_path: PathBuf,
    pub log_path: PathBuf,
    pub embedding_model: String,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            script_path: PathBuf::from("docs/oracle_schema.sql"),
            log_path: PathBuf::from("setup_log.txt"),
            embedding_model: "nomic-embed-text:latest".to_string(),
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("ora_provision");
            path.push("config.json");
            path
        })
    }

    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::new(),
        }
    }

    /// Missing or unreadable files fall back to the defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Ignoring config {}: {err}", path.display());
                return Self::new();
            }
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Ignoring config {}: {err}", path.display());
                Self::new()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Load `.env` into the process environment.
///
/// An explicit file must exist. The implicit `./.env` may be absent, but one
/// that exists and does not parse is an error. This runs before logging is
/// set up, so problems are returned to the caller rather than logged here.
pub fn load_env(env_file: Option<&Path>) -> Result<()> {
    match env_file {
        Some(path) => dotenvy::from_path(path)
            .map_err(|err| ProvisionError::config(format!("{}: {err}", path.display()))),
        None => implicit_env_outcome(dotenvy::dotenv()),
    }
}

fn implicit_env_outcome<T>(loaded: std::result::Result<T, dotenvy::Error>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ProvisionError::config(format!("Failed to load .env: {err}"))),
    }
}

pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Build connection settings from `ORACLE_*` keys.
///
/// `lookup` abstracts the environment. When `ORACLE_PASSWORD` is absent the
/// OS keyring is consulted under the user name.
pub fn oracle_connection_info<F>(lookup: F) -> Result<ConnectionInfo>
where
    F: Fn(&str) -> Option<String>,
{
    let mut info = oracle_connection_info_without_password(&lookup)?;
    info.password = match lookup("ORACLE_PASSWORD") {
        Some(password) => password,
        None => credential_store::get_password(&info.username)?.ok_or_else(|| {
            ProvisionError::config(format!(
                "ORACLE_PASSWORD is not set and no stored password exists for {}",
                info.username
            ))
        })?,
    };
    Ok(info)
}

fn oracle_connection_info_without_password<F>(lookup: &F) -> Result<ConnectionInfo>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| {
        lookup(key).ok_or_else(|| ProvisionError::config(format!("{key} is not set")))
    };

    let host = required("ORACLE_HOST")?;
    let service_name = required("ORACLE_SERVICE_NAME")?;
    let username = required("ORACLE_USER")?;
    let port = match lookup("ORACLE_PORT") {
        Some(raw) => raw.trim().parse::<u16>().map_err(|err| {
            ProvisionError::config(format!("ORACLE_PORT {raw:?} is not a port: {err}"))
        })?,
        None => DEFAULT_ORACLE_PORT,
    };

    Ok(ConnectionInfo::new(
        &username,
        "",
        host.trim(),
        port,
        service_name.trim(),
    ))
}

/// Resolve the embedding server base URL.
///
/// `ETHOS_EMBEDDING_SERVER` may be written as a format-string literal such as
/// `f"http://{ETHOS_SERVER}:11435"`; the `f` prefix and quotes are dropped
/// and `{ETHOS_SERVER}` is substituted.
pub fn embedding_server_url<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let server = lookup("ETHOS_SERVER");
    match lookup("ETHOS_EMBEDDING_SERVER") {
        Some(raw) => {
            let cleaned = raw
                .trim()
                .trim_matches('f')
                .trim_matches('"')
                .trim_matches('\'');
            if cleaned.contains("{ETHOS_SERVER}") {
                let server = server.ok_or_else(|| {
                    ProvisionError::config(
                        "ETHOS_EMBEDDING_SERVER references {ETHOS_SERVER} but ETHOS_SERVER is not set",
                    )
                })?;
                Ok(cleaned.replace("{ETHOS_SERVER}", server.trim()))
            } else {
                Ok(cleaned.to_string())
            }
        }
        None => {
            let server = server.ok_or_else(|| {
                ProvisionError::config("neither ETHOS_EMBEDDING_SERVER nor ETHOS_SERVER is set")
            })?;
            Ok(format!("http://{}:{DEFAULT_EMBEDDING_PORT}", server.trim()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn connection_info_from_env() {
        let lookup = lookup_from(&[
            ("ORACLE_HOST", "10.0.0.5"),
            ("ORACLE_PORT", "1522"),
            ("ORACLE_SERVICE_NAME", "XEPDB1"),
            ("ORACLE_USER", "ethos"),
            ("ORACLE_PASSWORD", "pw"),
        ]);
        let info = oracle_connection_info(lookup).unwrap();
        assert_eq!(info.connection_string(), "10.0.0.5:1522/XEPDB1");
        assert_eq!(info.username, "ethos");
        assert_eq!(info.password, "pw");
    }

    #[test]
    fn port_defaults_to_listener_port() {
        let lookup = lookup_from(&[
            ("ORACLE_HOST", "db"),
            ("ORACLE_SERVICE_NAME", "ORCL"),
            ("ORACLE_USER", "ethos"),
        ]);
        let info = oracle_connection_info_without_password(&lookup).unwrap();
        assert_eq!(info.port, 1521);
    }

    #[test]
    fn missing_host_is_a_config_error() {
        let lookup = lookup_from(&[("ORACLE_SERVICE_NAME", "ORCL"), ("ORACLE_USER", "u")]);
        let err = oracle_connection_info_without_password(&lookup).unwrap_err();
        assert!(err.to_string().contains("ORACLE_HOST is not set"));
    }

    #[test]
    fn bad_port_is_rejected() {
        let lookup = lookup_from(&[
            ("ORACLE_HOST", "db"),
            ("ORACLE_PORT", "15x"),
            ("ORACLE_SERVICE_NAME", "ORCL"),
            ("ORACLE_USER", "u"),
        ]);
        assert!(oracle_connection_info_without_password(&lookup).is_err());
    }

    #[test]
    fn embedding_url_substitutes_server_in_format_literal() {
        let lookup = lookup_from(&[
            ("ETHOS_SERVER", "192.168.0.10"),
            ("ETHOS_EMBEDDING_SERVER", "f\"http://{ETHOS_SERVER}:11435\""),
        ]);
        assert_eq!(
            embedding_server_url(lookup).unwrap(),
            "http://192.168.0.10:11435"
        );
    }

    #[test]
    fn embedding_url_accepts_plain_value() {
        let lookup = lookup_from(&[("ETHOS_EMBEDDING_SERVER", "'http://embed.local:9000'")]);
        assert_eq!(embedding_server_url(lookup).unwrap(), "http://embed.local:9000");
    }

    #[test]
    fn embedding_url_falls_back_to_server_default_port() {
        let lookup = lookup_from(&[("ETHOS_SERVER", "gpu-box")]);
        assert_eq!(embedding_server_url(lookup).unwrap(), "http://gpu-box:11435");
    }

    #[test]
    fn embedding_url_needs_some_server() {
        let lookup = lookup_from(&[]);
        assert!(embedding_server_url(lookup).is_err());
    }

    #[test]
    fn config_file_overrides_defaults_partially() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "script_path": "sql/schema.sql" }"#).unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.script_path, PathBuf::from("sql/schema.sql"));
        assert_eq!(config.log_path, PathBuf::from("setup_log.txt"));
    }

    #[test]
    fn missing_implicit_env_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = dotenvy::from_path(dir.path().join(".env"));
        assert!(implicit_env_outcome(loaded).is_ok());
    }

    #[test]
    fn malformed_implicit_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "this is not a dotenv line\n").unwrap();

        let err = implicit_env_outcome(dotenvy::from_path(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to load .env"), "got: {err}");
    }

    #[test]
    fn malformed_explicit_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.env");
        fs::write(&path, "this is not a dotenv line\n").unwrap();

        let err = load_env(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("custom.env"), "got: {err}");
    }

    #[test]
    fn broken_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.embedding_model, "nomic-embed-text:latest");
    }
}
