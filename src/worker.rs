use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::config::{ConfigStore, Credentials};
use crate::error::AuthError;
use crate::poller::{Poller, Snapshot};

/// Instructions for the polling thread
#[derive(Debug)]
pub enum Request {
    Login(Credentials),
    Logout,
    /// Poll immediately
    Refresh,
    /// Change the auto-refresh interval (seconds)
    SetInterval(u64),
    /// Enable or disable automatic polls
    AutoRefresh(bool),
    Shutdown,
}

/// Notifications from the polling thread
#[derive(Debug, Clone)]
pub enum Update {
    Connecting { username: String, hostname: String },
    LoggedIn { username: String, hostname: String },
    LoginFailed(AuthError),
    LoggedOut,
    /// A poll has started
    Refreshing,
    Snapshot(Snapshot),
    Interval(u64),
    AutoRefresh(bool),
    /// A non-fatal problem to show to the user
    Error(String),
}

type Publish = Box<dyn Fn(Update) + Send>;

/// Handle to the thread that owns the [`Poller`].
///
/// Remote queries block, so they run here rather than on the thread driving
/// the user interface. Results are handed to the `publish` callback.
pub struct Worker {
    requests: Sender<Request>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Starts the polling thread. Automatic polls begin after the first
    /// successful login if `auto_refresh` is set.
    pub fn spawn<F>(poller: Poller, store: Option<ConfigStore>, auto_refresh: bool, publish: F) -> Self
    where
        F: Fn(Update) + Send + 'static,
    {
        let (requests, receiver) = mpsc::channel();
        let context = Context {
            poller,
            store,
            auto_refresh,
            publish: Box::new(publish),
        };

        let thread = thread::Builder::new()
            .name("slurmwatch-poller".into())
            .spawn(move || context.run(receiver))
            .ok();

        if thread.is_none() {
            error!("failed to start polling thread");
        }

        Self { requests, thread }
    }

    pub fn send(&self, request: Request) {
        if let Err(err) = self.requests.send(request) {
            warn!("polling thread has stopped; dropping {:?}", err.0);
        }
    }

    /// Stops the polling thread, waiting for an in-flight query to finish
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.requests.send(Request::Shutdown);
            if thread.join().is_err() {
                error!("polling thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    /// Asks the thread to stop without waiting for it, so quitting is not
    /// held up by a slow remote command.
    fn drop(&mut self) {
        if self.thread.take().is_some() {
            let _ = self.requests.send(Request::Shutdown);
        }
    }
}

struct Context {
    poller: Poller,
    store: Option<ConfigStore>,
    /// Whether the user wants automatic polls while logged in
    auto_refresh: bool,
    publish: Publish,
}

impl Context {
    fn run(mut self, requests: Receiver<Request>) {
        debug!("polling thread started");

        loop {
            let request = match self.poller.next_deadline() {
                Some(deadline) => {
                    match requests.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Ok(request) => Some(request),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match requests.recv() {
                    Ok(request) => Some(request),
                    Err(_) => break,
                },
            };

            match request {
                None => self.tick(),
                Some(Request::Shutdown) => break,
                Some(request) => self.handle(request),
            }
        }

        self.poller.logout();
        debug!("polling thread stopped");
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Login(credentials) => self.login(credentials),
            Request::Logout => {
                self.poller.logout();
                (self.publish)(Update::LoggedOut);
            }
            Request::Refresh => self.refresh(),
            Request::SetInterval(seconds) => match self.poller.set_interval(seconds, Instant::now()) {
                Ok(()) => (self.publish)(Update::Interval(seconds)),
                Err(err) => (self.publish)(Update::Error(err.to_string())),
            },
            Request::AutoRefresh(enabled) => {
                self.auto_refresh = enabled;
                if enabled {
                    self.poller.start_auto_refresh(Instant::now());
                } else {
                    self.poller.stop_auto_refresh();
                }

                (self.publish)(Update::AutoRefresh(enabled));
            }
            Request::Shutdown => {}
        }
    }

    fn login(&mut self, credentials: Credentials) {
        let username = credentials.username.clone();
        let hostname = credentials.hostname.clone();
        (self.publish)(Update::Connecting {
            username: username.clone(),
            hostname: hostname.clone(),
        });

        let remember = credentials.remember;
        let saved = credentials.clone();
        if let Err(err) = self.poller.login(credentials) {
            warn!("login as {}@{} failed: {}", username, hostname, err);
            (self.publish)(Update::LoginFailed(err));
            return;
        }

        (self.publish)(Update::LoggedIn { username, hostname });

        if remember {
            if let Some(store) = &self.store {
                if let Err(err) = store.save(&saved) {
                    error!("{}", err);
                    (self.publish)(Update::Error(err.to_string()));
                }
            }
        }

        self.refresh();
        if self.auto_refresh {
            self.poller.start_auto_refresh(Instant::now());
        }
    }

    fn refresh(&mut self) {
        if !self.poller.is_authenticated() {
            (self.publish)(Update::Error("not logged in".into()));
            return;
        }

        (self.publish)(Update::Refreshing);
        match self.poller.refresh_now() {
            Ok(snapshot) => (self.publish)(Update::Snapshot(snapshot)),
            Err(err) => (self.publish)(Update::Error(err.to_string())),
        }
    }

    fn tick(&mut self) {
        let now = Instant::now();
        if !self.poller.next_deadline().is_some_and(|d| d <= now) {
            return;
        }

        (self.publish)(Update::Refreshing);
        match self.poller.tick(now) {
            Some(Ok(snapshot)) => (self.publish)(Update::Snapshot(snapshot)),
            Some(Err(err)) => (self.publish)(Update::Error(err.to_string())),
            None => info!("scheduled poll was cancelled"),
        }
    }
}
