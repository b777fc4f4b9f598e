//! Remote command execution on the cluster's login node.
//!
//! A [`Connector`] authenticates and hands out a [`Session`]; the session runs
//! commands and returns their standard output. [`ssh`] talks to a real host,
//! [`offline`] serves canned data for demos and tests.

pub mod offline;
pub mod ssh;
#[cfg(test)]
pub mod testing;

use std::time::Duration;

use crate::config::Credentials;
use crate::error::{AuthError, ExecError};

/// An authenticated channel for running commands on the remote host
pub trait Session: Send {
    /// Runs `command` and blocks until it exits, returning its standard output
    fn execute(&mut self, command: &str) -> Result<String, ExecError>;

    /// Releases the connection; calling this more than once has no effect
    fn close(&mut self);
}

/// Opens sessions
pub trait Connector: Send {
    fn connect(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Box<dyn Session>, AuthError>;
}

/// Checks the arguments shared by every connector
pub fn validate(credentials: &Credentials, timeout: Duration) -> Result<(), AuthError> {
    if credentials.hostname.trim().is_empty() {
        return Err(AuthError::InvalidHost);
    }

    if timeout.is_zero() {
        return Err(AuthError::InvalidTimeout);
    }

    Ok(())
}
