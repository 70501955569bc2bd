use keyring::Entry;

use crate::error::{ProvisionError, Result};

const SERVICE_NAME: &str = "ora_provision";

fn entry_for(username: &str) -> Result<Entry> {
    Entry::new(SERVICE_NAME, username).map_err(|e| credential_error("Keyring error", e))
}

fn credential_error(context: &str, err: keyring::Error) -> ProvisionError {
    ProvisionError::Credential {
        message: format!("{context}: {err}"),
    }
}

/// Store the Oracle password for `username` in the OS keyring.
pub fn store_password(username: &str, password: &str) -> Result<()> {
    entry_for(username)?
        .set_password(password)
        .map_err(|e| credential_error("Failed to store password in keyring", e))
}

/// Look up the Oracle password for `username`.
/// Returns Ok(None) if no credential is found (not an error).
pub fn get_password(username: &str) -> Result<Option<String>> {
    match entry_for(username)?.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(credential_error("Failed to retrieve password from keyring", e)),
    }
}

/// Delete the stored password for `username`.
/// Silently succeeds if no credential exists.
pub fn delete_password(username: &str) -> Result<()> {
    match entry_for(username)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(credential_error("Failed to delete password from keyring", e)),
    }
}
