use std::rc::Rc;

use chrono::{DateTime, Local};

use crate::args::Args;
use crate::config::{ConfigFile, Credentials, DEFAULT_PORT};
use crate::slurm::{JobRecord, StatusTally};
use crate::widgets::LoginForm;
use crate::worker::{Request, Update, Worker};

/// Refresh intervals offered by the interval selector
pub const INTERVALS: [(u64, &str); 6] = [
    (5, "5 seconds"),
    (30, "30 seconds"),
    (60, "1 minute"),
    (300, "5 minutes"),
    (600, "10 minutes"),
    (1800, "30 minutes"),
];

/// Human readable label for an interval in seconds
pub fn interval_label(seconds: u64) -> String {
    INTERVALS
        .iter()
        .find(|(v, _)| *v == seconds)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("{} seconds", seconds))
}

/// Steps through [`INTERVALS`]; intervals not in the list snap to the nearest entry
pub fn next_interval(current: u64, delta: isize) -> u64 {
    let idx = match INTERVALS.iter().position(|(v, _)| *v == current) {
        Some(idx) => idx as isize + delta,
        None => {
            let above = INTERVALS.iter().position(|(v, _)| *v > current);
            match (above, delta.signum()) {
                (Some(idx), 1) => idx as isize + delta - 1,
                (Some(idx), _) => idx as isize + delta,
                (None, _) => INTERVALS.len() as isize + delta,
            }
        }
    };

    INTERVALS[idx.clamp(0, INTERVALS.len() as isize - 1) as usize].0
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Connection {
    LoggedOut,
    /// Login in progress for `user@host`
    Connecting(String),
    /// Logged in as `user@host`
    LoggedIn(String),
}

/// One-line message shown below the job list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Info(String),
    Warning(String),
    Error(String),
}

pub struct App {
    /// Is the application running?
    pub running: bool,
    /// Command-line args
    pub args: Args,
    pub connection: Connection,
    /// Jobs from the most recent poll
    pub jobs: Rc<Vec<JobRecord>>,
    pub tally: StatusTally,
    /// Time of the most recent poll
    pub updated: Option<DateTime<Local>>,
    /// Is a poll in progress?
    pub refreshing: bool,
    pub auto_refresh: bool,
    /// Refresh interval in seconds
    pub interval: u64,
    pub message: Option<Message>,
    /// Open login dialog, if any
    pub login: Option<LoginForm>,
    /// Used to pre-fill the login dialog
    last_login: Credentials,
    /// Frame of the activity indicator
    spinner: usize,
    worker: Worker,
}

impl App {
    const SPINNER: [&'static str; 4] = ["◐", "◓", "◑", "◒"];

    /// Constructs a new instance of [`App`] and starts logging in, either
    /// directly or by opening the login dialog.
    pub fn new(args: Args, worker: Worker, config: Option<ConfigFile>) -> Self {
        let mut credentials = config
            .map(Credentials::from)
            .unwrap_or_else(|| Credentials::new("", ""));

        if let Some(user) = &args.user {
            credentials.username = user.clone();
        }

        if let Some(host) = &args.host {
            credentials.hostname = host.clone();
        }

        if args.port != DEFAULT_PORT {
            credentials.port = args.port;
        }

        let mut app = Self {
            running: true,
            connection: Connection::LoggedOut,
            jobs: Rc::default(),
            tally: StatusTally::default(),
            updated: None,
            refreshing: false,
            auto_refresh: !args.manual,
            interval: args.interval,
            message: None,
            login: None,
            last_login: credentials.clone(),
            spinner: 0,
            worker,
            args,
        };

        if app.args.test {
            if credentials.username.is_empty() {
                credentials.username = std::env::var("USER").unwrap_or_else(|_| "demo".into());
            }

            if credentials.hostname.is_empty() {
                credentials.hostname = "offline".into();
            }

            app.login_with(credentials);
        } else if credentials.password.is_some()
            && !credentials.username.is_empty()
            && !credentials.hostname.is_empty()
        {
            app.login_with(credentials);
        } else {
            app.open_login();
        }

        app
    }

    /// Applies a message from the polling thread; returns true if the screen needs redrawing
    pub fn apply(&mut self, update: Update) -> bool {
        match update {
            Update::Connecting { username, hostname } => {
                self.connection = Connection::Connecting(format!("{}@{}", username, hostname));
                self.message = Some(Message::Info(format!("Connecting to {}", hostname)));
            }
            Update::LoggedIn { username, hostname } => {
                self.connection = Connection::LoggedIn(format!("{}@{}", username, hostname));
                self.login = None;
                self.message = None;
            }
            Update::LoginFailed(err) => {
                self.connection = Connection::LoggedOut;
                self.message = Some(Message::Error(format!("Authentication failed: {}", err)));
                self.open_login();
                if let Some(form) = &mut self.login {
                    form.error = Some(err.to_string());
                }
            }
            Update::LoggedOut => {
                self.connection = Connection::LoggedOut;
                self.clear_jobs();
                self.message = Some(Message::Info("Logged out; press <L> to log in".into()));
            }
            Update::Refreshing => self.refreshing = true,
            Update::Snapshot(snapshot) => {
                self.refreshing = false;
                self.tally = snapshot.tally;
                self.jobs = Rc::new(snapshot.jobs);
                self.updated = Some(snapshot.timestamp);
                self.message = if let Some(err) = snapshot.outage {
                    Some(Message::Error(format!("Could not list jobs: {}", err)))
                } else if !snapshot.warnings.is_empty() {
                    Some(Message::Warning(format!(
                        "Skipped {} unreadable line(s) of squeue output",
                        snapshot.warnings.len()
                    )))
                } else {
                    None
                };
            }
            Update::Interval(seconds) => {
                self.interval = seconds;
                self.message = Some(Message::Info(format!(
                    "Refreshing every {}",
                    interval_label(seconds)
                )));
            }
            Update::AutoRefresh(enabled) => self.auto_refresh = enabled,
            Update::Error(err) => {
                self.refreshing = false;
                self.message = Some(Message::Error(err));
            }
        }

        true
    }

    /// Handles the tick event of the terminal; returns true if the activity indicator moved.
    pub fn tick(&mut self) -> bool {
        if self.busy() {
            self.spinner = (self.spinner + 1) % Self::SPINNER.len();
            true
        } else {
            false
        }
    }

    pub fn busy(&self) -> bool {
        self.refreshing || matches!(self.connection, Connection::Connecting(_))
    }

    pub fn spinner(&self) -> &'static str {
        Self::SPINNER[self.spinner]
    }

    /// Force update of job list
    pub fn refresh(&mut self) {
        match self.connection {
            Connection::LoggedIn(_) if !self.refreshing => self.worker.send(Request::Refresh),
            Connection::LoggedIn(_) | Connection::Connecting(_) => {}
            Connection::LoggedOut => {
                self.message = Some(Message::Info("Please log in first".into()));
                self.open_login();
            }
        }
    }

    pub fn toggle_auto_refresh(&mut self) {
        self.auto_refresh = !self.auto_refresh;
        self.worker.send(Request::AutoRefresh(self.auto_refresh));
    }

    /// Selects the next (`delta` > 0) or previous refresh interval
    pub fn cycle_interval(&mut self, delta: isize) {
        let interval = next_interval(self.interval, delta);
        if interval != self.interval {
            self.worker.send(Request::SetInterval(interval));
        }
    }

    pub fn open_login(&mut self) {
        if self.login.is_none() {
            self.login = Some(LoginForm::new(&self.last_login));
        }
    }

    pub fn cancel_login(&mut self) {
        self.login = None;
        if self.connection == Connection::LoggedOut {
            self.message = Some(Message::Info("Not logged in; press <L> to log in".into()));
        }
    }

    /// Submits the login dialog, or shows why it cannot be submitted
    pub fn submit_login(&mut self) {
        let Some(form) = &mut self.login else {
            return;
        };

        match form.credentials() {
            Ok(credentials) => {
                self.login = None;
                self.login_with(credentials);
            }
            Err(err) => form.error = Some(err),
        }
    }

    pub fn logout(&mut self) {
        if self.connection != Connection::LoggedOut {
            self.worker.send(Request::Logout);
        }
    }

    /// Set running to false to quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }

    fn login_with(&mut self, credentials: Credentials) {
        self.last_login = Credentials {
            password: None,
            ..credentials.clone()
        };

        self.connection = Connection::Connecting(format!(
            "{}@{}",
            credentials.username, credentials.hostname
        ));
        self.worker.send(Request::Login(credentials));
    }

    fn clear_jobs(&mut self) {
        self.jobs = Rc::default();
        self.tally = StatusTally::default();
        self.updated = None;
        self.refreshing = false;
    }
}
