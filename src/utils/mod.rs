pub mod config;
pub mod credential_store;
pub mod run_log;

pub use config::*;
pub use run_log::*;
