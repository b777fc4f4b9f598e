/// Application.
pub mod app;
/// Command-line arguments
pub mod args;
/// Saved login details
pub mod config;
/// Error types
pub mod error;
/// Terminal events handler
pub mod event;
/// Event handler.
pub mod handler;
/// Log file setup
pub mod logging;
/// Scheduling of job-list refreshes
pub mod poller;
/// Remote command sessions
pub mod session;
/// Querying of Slurm state
pub mod slurm;
/// Terminal user interface
pub mod tui;
/// Widget renderer
pub mod ui;
/// Custom widgets
pub mod widgets;
/// Background polling thread
pub mod worker;
