use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to establish an authenticated session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("hostname is empty")]
    InvalidHost,

    #[error("connection timeout must be greater than zero")]
    InvalidTimeout,

    #[error("no password given for {0}")]
    MissingPassword(String),

    #[error("host unreachable: {0}")]
    Unreachable(String),

    #[error("timed out connecting to {0}")]
    TimedOut(String),

    #[error("authentication rejected for {user}@{host}")]
    Rejected { user: String, host: String },

    #[error("SSH protocol error: {0}")]
    Protocol(String),
}

/// Failure to run a command over an open session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecError {
    #[error("not connected")]
    NotConnected,

    #[error("channel closed: {0}")]
    ChannelClosed(String),

    #[error("remote command exited with status {status}: {stderr}")]
    CommandFailed { status: u32, stderr: String },

    #[error("remote output is not valid UTF-8")]
    InvalidOutput,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    #[error("not logged in")]
    Unauthenticated,

    #[error("refresh interval must be between 1 second and 7 days, not {0} seconds")]
    InvalidInterval(u64),
}

/// Failure to read or write the config file
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot locate home directory; pass --config")]
    NoHome,
}

/// A line of `squeue` output that was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    /// 1-based line number in the raw output
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}
