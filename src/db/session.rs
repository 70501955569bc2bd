use std::fmt::Display;

use oracle::Connection;

use crate::error::SessionError;

/// The slice of a database session the script runner needs.
///
/// `commit` and `close` are called by the run that owns the session, never by
/// the executor itself.
pub trait SqlSession {
    type Error: Display;

    fn execute(&mut self, sql: &str) -> Result<(), Self::Error>;
    fn commit(&mut self) -> Result<(), Self::Error>;
    fn close(&mut self) -> Result<(), Self::Error>;
}

impl SqlSession for Connection {
    type Error = SessionError;

    fn execute(&mut self, sql: &str) -> Result<(), SessionError> {
        let conn: &Connection = self;
        conn.execute(sql, &[])?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SessionError> {
        let conn: &Connection = self;
        conn.commit()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SessionError> {
        let conn: &Connection = self;
        conn.close()?;
        Ok(())
    }
}
