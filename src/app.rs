use std::io::BufRead;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::db::{DatabaseConnection, LogEntry, QueryExecutor, SqlSession};
use crate::embedding::{run_similarity_check, OllamaEmbedder};
use crate::error::{ProvisionError, Result};
use crate::utils::{
    credential_store, embedding_server_url, env_lookup, oracle_connection_info, AppConfig, RunLog,
};

#[derive(Debug, Parser)]
#[command(name = "ora_provision", version, about)]
pub struct Cli {
    /// Load environment variables from this file instead of `./.env`
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a SQL script against the configured Oracle schema and commit
    Provision {
        #[arg(long)]
        script: Option<PathBuf>,
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Check multilingual similarity on the embedding server
    EmbeddingCheck {
        #[arg(long)]
        model: Option<String>,
        /// Base URL of the embedding server; defaults to ETHOS_* settings
        #[arg(long)]
        url: Option<String>,
    },
    /// Read a password from stdin and keep it in the OS keyring
    StorePassword {
        #[arg(long)]
        user: Option<String>,
    },
    /// Remove a stored password from the OS keyring
    ForgetPassword {
        #[arg(long)]
        user: Option<String>,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Provision {
            script: None,
            log: None,
        }
    }
}

pub struct App {
    config: AppConfig,
}

impl App {
    pub fn new() -> Self {
        let config = AppConfig::load();
        Self { config }
    }

    /// Returns `Ok(false)` when the run finished but reported a failure.
    pub fn run(&self, command: Command) -> Result<bool> {
        match command {
            Command::Provision { script, log } => {
                let script = script.unwrap_or_else(|| self.config.script_path.clone());
                let log = log.unwrap_or_else(|| self.config.log_path.clone());
                self.provision(&script, &log)
            }
            Command::EmbeddingCheck { model, url } => self.embedding_check(model, url),
            Command::StorePassword { user } => {
                let user = Self::resolve_user(user)?;
                let password = Self::read_password_from_stdin()?;
                credential_store::store_password(&user, &password)?;
                tracing::info!("Stored password for {user}");
                Ok(true)
            }
            Command::ForgetPassword { user } => {
                let user = Self::resolve_user(user)?;
                credential_store::delete_password(&user)?;
                tracing::info!("Removed stored password for {user}");
                Ok(true)
            }
        }
    }

    fn provision(&self, script: &Path, log_path: &Path) -> Result<bool> {
        let mut log = RunLog::create(log_path)?;

        let mut conn = DatabaseConnection::new();
        let connected = oracle_connection_info(env_lookup)
            .and_then(|info| conn.connect(info).map_err(ProvisionError::Connection));
        if let Err(err) = connected {
            log.error(err.to_string());
            log.error("Connection failed.");
            return Ok(false);
        }
        tracing::debug!("Session open for {}", conn.get_info().display_string());

        Ok(run_script(&mut conn, script, &mut log))
    }

    fn embedding_check(&self, model: Option<String>, url: Option<String>) -> Result<bool> {
        let url = match url {
            Some(url) => url,
            None => embedding_server_url(env_lookup)?,
        };
        let model = model.unwrap_or_else(|| self.config.embedding_model.clone());
        tracing::info!("--- Testing Embedding Generation with '{model}' on {url} ---");

        let embedder = OllamaEmbedder::new(&url, &model)?;
        let report = match run_similarity_check(&embedder) {
            Ok(report) => report,
            Err(err) => {
                tracing::error!("ERROR: Failed to generate embeddings. Error: {err}");
                return Ok(false);
            }
        };

        tracing::info!("Model {}: dimension {}", report.model, report.dimension);
        tracing::info!("--- Similarity Check ---");
        tracing::info!(
            "Similarity (KR vs EN 'Backend Dev'): {:.4} (Expected: High)",
            report.cross_lingual
        );
        tracing::info!(
            "Similarity (KR 'Backend' vs 'Spring'): {:.4} (Expected: Medium-High)",
            report.related
        );

        if report.passes() {
            tracing::info!("SUCCESS: Model captures semantic similarity across languages.");
        } else {
            tracing::warn!("WARNING: Multilingual similarity is lower than expected.");
        }
        Ok(true)
    }

    fn resolve_user(user: Option<String>) -> Result<String> {
        user.or_else(|| env_lookup("ORACLE_USER"))
            .ok_or_else(|| ProvisionError::config("pass --user or set ORACLE_USER"))
    }

    fn read_password_from_stdin() -> Result<String> {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|source| ProvisionError::Io {
                path: PathBuf::from("<stdin>"),
                source,
            })?;
        let password = line.trim_end_matches(['\r', '\n']).to_string();
        if password.is_empty() {
            return Err(ProvisionError::config("no password given on stdin"));
        }
        Ok(password)
    }
}

/// Execute `script` on an open session, commit once, then close.
///
/// Returns whether the commit succeeded. The session is closed on every path.
fn run_script<S: SqlSession>(session: &mut S, script: &Path, log: &mut RunLog) -> bool {
    let script_name = script
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| script.display().to_string());
    log.info(format!("\n--- Executing {script_name} ---"));

    let summary = QueryExecutor::execute_file(session, script, |entry: &LogEntry| log.record(entry));
    if summary.all_succeeded() {
        tracing::info!("{} units executed", summary.submitted);
    } else {
        tracing::warn!(
            "{} of {} units failed; see {}",
            summary.failed,
            summary.submitted,
            log.path().display()
        );
    }

    let committed = match session.commit() {
        Ok(()) => {
            log.info("SUCCESS: SQL script executed completely.");
            true
        }
        Err(err) => {
            let err = ProvisionError::Commit {
                message: err.to_string(),
            };
            log.error(err.to_string());
            false
        }
    };

    if let Err(err) = session.close() {
        tracing::warn!("Failed to close session: {err}");
    }

    committed
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Session double that records every call in order.
    #[derive(Default)]
    struct EventSession {
        events: Vec<String>,
        fail_commit: bool,
    }

    impl SqlSession for EventSession {
        type Error = String;

        fn execute(&mut self, sql: &str) -> std::result::Result<(), String> {
            self.events.push(format!("execute:{sql}"));
            Ok(())
        }

        fn commit(&mut self) -> std::result::Result<(), String> {
            self.events.push("commit".to_string());
            if self.fail_commit {
                return Err("ORA-03113: end-of-file on communication channel".to_string());
            }
            Ok(())
        }

        fn close(&mut self) -> std::result::Result<(), String> {
            self.events.push("close".to_string());
            Ok(())
        }
    }

    fn write_script(dir: &Path) -> PathBuf {
        let script = dir.join("schema.sql");
        fs::write(
            &script,
            "CREATE TABLE t (id NUMBER);\nINSERT INTO t VALUES (1);\n",
        )
        .unwrap();
        script
    }

    #[test]
    fn run_script_commits_once_after_last_unit() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path());
        let log_path = dir.path().join("setup_log.txt");
        let mut log = RunLog::create(&log_path).unwrap();
        let mut session = EventSession::default();

        assert!(run_script(&mut session, &script, &mut log));
        assert_eq!(
            session.events,
            vec![
                "execute:CREATE TABLE t (id NUMBER)",
                "execute:INSERT INTO t VALUES (1)",
                "commit",
                "close",
            ]
        );
        let content = fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("--- Executing schema.sql ---"));
        assert!(content.ends_with("SUCCESS: SQL script executed completely.\n"));
    }

    #[test]
    fn failed_commit_still_closes_session() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path());
        let log_path = dir.path().join("setup_log.txt");
        let mut log = RunLog::create(&log_path).unwrap();
        let mut session = EventSession {
            fail_commit: true,
            ..EventSession::default()
        };

        assert!(!run_script(&mut session, &script, &mut log));
        assert_eq!(session.events.last().map(String::as_str), Some("close"));
        let content = fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("Commit failed: ORA-03113"));
        assert!(!content.contains("SUCCESS"));
    }

    #[test]
    fn unreadable_script_still_commits_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("setup_log.txt");
        let mut log = RunLog::create(&log_path).unwrap();
        let mut session = EventSession::default();

        run_script(&mut session, &dir.path().join("absent.sql"), &mut log);
        assert_eq!(session.events, vec!["commit", "close"]);
        let content = fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("Error reading SQL file:"));
    }

    #[test]
    fn provision_is_the_default_command() {
        let cli = Cli::parse_from(["ora_provision"]);
        assert!(cli.command.is_none());
        assert!(matches!(
            cli.command.unwrap_or_default(),
            Command::Provision { script: None, log: None }
        ));
    }

    #[test]
    fn provision_flags_parse() {
        let cli = Cli::parse_from([
            "ora_provision",
            "--env-file",
            "conf/.env",
            "provision",
            "--script",
            "docs/oracle_schema.sql",
            "--log",
            "setup_log.txt",
        ]);
        assert_eq!(cli.env_file, Some(PathBuf::from("conf/.env")));
        match cli.command {
            Some(Command::Provision { script, log }) => {
                assert_eq!(script, Some(PathBuf::from("docs/oracle_schema.sql")));
                assert_eq!(log, Some(PathBuf::from("setup_log.txt")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn embedding_check_flags_parse() {
        let cli = Cli::parse_from([
            "ora_provision",
            "embedding-check",
            "--model",
            "bge-m3",
            "--url",
            "http://localhost:11434",
        ]);
        assert!(matches!(
            cli.command,
            Some(Command::EmbeddingCheck { model: Some(ref m), url: Some(ref u) })
                if m == "bge-m3" && u == "http://localhost:11434"
        ));
    }
}
