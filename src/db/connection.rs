use oracle::Connection;
use serde::{Deserialize, Serialize};

use crate::db::session::SqlSession;
use crate::error::SessionError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub host: String,
    pub port: u16,
    pub service_name: String,
}

impl ConnectionInfo {
    pub fn new(username: &str, password: &str, host: &str, port: u16, service_name: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port,
            service_name: service_name.to_string(),
        }
    }

    /// Easy Connect string, `host:port/service_name`.
    pub fn connection_string(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.service_name)
    }

    pub fn display_string(&self) -> String {
        format!("{} as {}", self.connection_string(), self.username)
    }

    /// Securely clear the password from memory by overwriting with zeros
    /// then releasing the allocation.
    pub fn clear_password(&mut self) {
        // SAFETY: we write zeros over the valid UTF-8 bytes (zeros are valid UTF-8)
        let bytes = unsafe { self.password.as_bytes_mut() };
        for b in bytes.iter_mut() {
            // write_volatile keeps the zeroing from being optimized away
            unsafe { std::ptr::write_volatile(b, 0) };
        }
        self.password.clear();
        self.password.shrink_to_fit();
    }
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            host: "localhost".to_string(),
            port: 1521,
            service_name: "ORCL".to_string(),
        }
    }
}

/// A single Oracle session, opened once per run and closed by its owner.
pub struct DatabaseConnection {
    connection: Option<Connection>,
    info: ConnectionInfo,
}

impl DatabaseConnection {
    pub fn new() -> Self {
        Self {
            connection: None,
            info: ConnectionInfo::default(),
        }
    }

    pub fn connect(&mut self, info: ConnectionInfo) -> Result<(), SessionError> {
        tracing::info!("Connecting to Oracle at {}...", info.display_string());

        let conn_str = info.connection_string();
        let connection = match Connection::connect(&info.username, &info.password, &conn_str) {
            Ok(connection) => connection,
            Err(err) => {
                tracing::error!("Connection failed: {err}");
                return Err(err.into());
            }
        };
        tracing::info!("Connected to Oracle DB successfully.");

        self.connection = Some(connection);
        self.info = info;
        // The live session no longer needs the password
        self.info.clear_password();

        Ok(())
    }

    pub fn get_info(&self) -> &ConnectionInfo {
        &self.info
    }

    fn connection_mut(&mut self) -> Result<&mut Connection, SessionError> {
        self.connection.as_mut().ok_or(SessionError::NotConnected)
    }
}

impl Default for DatabaseConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlSession for DatabaseConnection {
    type Error = SessionError;

    fn execute(&mut self, sql: &str) -> Result<(), SessionError> {
        SqlSession::execute(self.connection_mut()?, sql)
    }

    fn commit(&mut self) -> Result<(), SessionError> {
        SqlSession::commit(self.connection_mut()?)
    }

    fn close(&mut self) -> Result<(), SessionError> {
        match self.connection.take() {
            Some(mut connection) => SqlSession::close(&mut connection),
            None => Ok(()),
        }
    }
}
