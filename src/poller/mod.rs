mod schedule;

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::{debug, info, warn};

pub use schedule::Schedule;

use crate::config::Credentials;
use crate::error::{AuthError, ExecError, ParseWarning, PollError};
use crate::session::{Connector, Session};
use crate::slurm::{build_command, parse, JobRecord, StatusTally};

/// Refresh interval used until [`Poller::set_interval`] is called
pub const DEFAULT_INTERVAL: u64 = 30;

/// Longest accepted refresh interval (one week)
pub const MAX_INTERVAL: u64 = 7 * 24 * 60 * 60;

/// Login state of a [`Poller`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Unauthenticated,
    Authenticated,
    /// A query is running on the remote host
    Refreshing,
}

/// The result of one poll
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Jobs in the order reported by `squeue`
    pub jobs: Vec<JobRecord>,
    pub tally: StatusTally,
    pub timestamp: DateTime<Local>,
    /// Lines of output that could not be parsed
    pub warnings: Vec<ParseWarning>,
    /// Set if the remote query failed; `jobs` is empty in that case
    pub outage: Option<ExecError>,
}

impl Snapshot {
    fn new(jobs: Vec<JobRecord>, warnings: Vec<ParseWarning>, outage: Option<ExecError>) -> Self {
        Self {
            tally: StatusTally::from_jobs(&jobs),
            jobs,
            timestamp: Local::now(),
            warnings,
            outage,
        }
    }
}

/// Periodically lists the jobs of the logged in user.
///
/// The poller owns the only [`Session`]; polls run one at a time and the next
/// automatic poll is only scheduled once the previous one has been parsed.
pub struct Poller {
    connector: Box<dyn Connector>,
    session: Option<Box<dyn Session>>,
    credentials: Option<Credentials>,
    state: State,
    schedule: Schedule,
    /// Connection timeout
    timeout: Duration,
    snapshot: Option<Snapshot>,
}

impl Poller {
    pub fn new(connector: Box<dyn Connector>, timeout: Duration) -> Self {
        Self {
            connector,
            session: None,
            credentials: None,
            state: State::Unauthenticated,
            schedule: Schedule::new(Duration::from_secs(DEFAULT_INTERVAL)),
            timeout,
            snapshot: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state != State::Unauthenticated
    }

    /// Credentials of the current session
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The most recent poll since logging in
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn interval(&self) -> Duration {
        self.schedule.interval()
    }

    pub fn auto_refresh(&self) -> bool {
        self.schedule.is_armed()
    }

    /// Time at which the next automatic poll is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.schedule.deadline()
    }

    /// Opens a session with `credentials`, replacing any existing session.
    ///
    /// On failure the poller is left unauthenticated.
    pub fn login(&mut self, credentials: Credentials) -> Result<(), AuthError> {
        self.logout();

        let session = self.connector.connect(&credentials, self.timeout)?;
        info!("logged in as {}@{}", credentials.username, credentials.hostname);

        self.session = Some(session);
        self.credentials = Some(credentials);
        self.state = State::Authenticated;
        Ok(())
    }

    /// Closes the session, cancels automatic polls and forgets the last snapshot
    pub fn logout(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();

            if let Some(credentials) = &self.credentials {
                info!("logged out {}@{}", credentials.username, credentials.hostname);
            }
        }

        self.schedule.cancel();
        self.credentials = None;
        self.snapshot = None;
        self.state = State::Unauthenticated;
    }

    /// Sets the interval between automatic polls; a pending poll is re-armed
    /// relative to `now` with the new interval.
    pub fn set_interval(&mut self, seconds: u64, now: Instant) -> Result<(), PollError> {
        if seconds == 0 || seconds > MAX_INTERVAL {
            return Err(PollError::InvalidInterval(seconds));
        }

        self.schedule.set_interval(Duration::from_secs(seconds), now);
        debug!("refresh interval set to {}s", seconds);
        Ok(())
    }

    /// Enables automatic polls; returns false (and does nothing) if not logged in
    pub fn start_auto_refresh(&mut self, now: Instant) -> bool {
        if !self.is_authenticated() {
            return false;
        }

        if !self.schedule.is_armed() {
            self.schedule.arm(now);
            debug!("auto-refresh every {}s", self.interval().as_secs());
        }

        true
    }

    pub fn stop_auto_refresh(&mut self) {
        if self.schedule.cancel().is_some() {
            debug!("auto-refresh stopped");
        }
    }

    /// Queries the remote host for the user's jobs.
    ///
    /// A failed query is not an error: it yields an empty snapshot whose
    /// [`Snapshot::outage`] describes the failure.
    pub fn refresh_now(&mut self) -> Result<Snapshot, PollError> {
        let (Some(session), Some(credentials)) = (self.session.as_mut(), &self.credentials) else {
            return Err(PollError::Unauthenticated);
        };

        self.state = State::Refreshing;
        let snapshot = match session.execute(&build_command(&credentials.username)) {
            Ok(raw) => {
                let parsed = parse(&raw);
                Snapshot::new(parsed.jobs, parsed.warnings, None)
            }
            Err(err) => {
                warn!("failed to query jobs: {}", err);
                Snapshot::new(Vec::new(), Vec::new(), Some(err))
            }
        };
        self.state = State::Authenticated;

        debug!(
            "{} jobs, {} skipped lines",
            snapshot.jobs.len(),
            snapshot.warnings.len()
        );

        self.snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Runs the automatic poll if it is due at `now` and schedules the next one
    pub fn tick(&mut self, now: Instant) -> Option<Result<Snapshot, PollError>> {
        if !self.schedule.fire(now) {
            return None;
        }

        let result = self.refresh_now();
        if self.is_authenticated() {
            self.schedule.arm(Instant::now().max(now));
        }

        Some(result)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::session::offline::OfflineConnector;
    use crate::session::testing::ScriptedConnector;
    use crate::slurm::Status;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn scripted() -> (ScriptedConnector, Poller) {
        let connector = ScriptedConnector::default();
        let poller = Poller::new(Box::new(connector.clone()), TIMEOUT);
        (connector, poller)
    }

    fn alice() -> Credentials {
        Credentials::new("alice", "hpc").password("secret")
    }

    #[test]
    fn test_refresh_requires_login() {
        let (connector, mut poller) = scripted();

        assert_eq!(poller.refresh_now().unwrap_err(), PollError::Unauthenticated);
        assert_eq!(poller.state(), State::Unauthenticated);
        assert!(poller.snapshot().is_none());
        assert!(connector.commands().is_empty());
    }

    #[test]
    fn test_login_and_refresh() {
        let (connector, mut poller) = scripted();
        connector.respond(Ok("JOBID|NAME\n1|a|RUNNING|0:01|1|2|2048\n2|b|BOGUS|0:00|1|1|1\n".into()));

        poller.login(alice()).unwrap();
        assert_eq!(poller.state(), State::Authenticated);

        let snapshot = poller.refresh_now().unwrap();
        assert_eq!(poller.state(), State::Authenticated);
        assert_eq!(
            connector.commands(),
            vec!["squeue -u alice -o '%A|%j|%T|%M|%D|%C|%m'".to_string()]
        );

        assert_eq!(snapshot.jobs.len(), 2);
        assert_eq!(snapshot.jobs[0].memory, "2.0GB");
        assert_eq!(snapshot.jobs[1].status, Status::Pending);
        assert_eq!(snapshot.tally.running, 1);
        assert_eq!(snapshot.tally.pending, 1);
        assert!(snapshot.outage.is_none());
        assert_eq!(poller.snapshot().map(|s| s.jobs.len()), Some(2));
    }

    #[test]
    fn test_failed_query_degrades_to_empty_snapshot() {
        let (connector, mut poller) = scripted();
        connector.respond(Err(ExecError::ChannelClosed("broken pipe".into())));
        poller.login(alice()).unwrap();

        let snapshot = poller.refresh_now().unwrap();
        assert!(snapshot.jobs.is_empty());
        assert_eq!(snapshot.tally, StatusTally::default());
        assert_eq!(
            snapshot.outage,
            Some(ExecError::ChannelClosed("broken pipe".into()))
        );
        assert!(poller.is_authenticated());
    }

    #[test]
    fn test_empty_response() {
        let (_connector, mut poller) = scripted();
        poller.login(alice()).unwrap();

        let snapshot = poller.refresh_now().unwrap();
        assert!(snapshot.jobs.is_empty());
        assert!(snapshot.outage.is_none());
    }

    #[test]
    fn test_failed_login_stays_unauthenticated() {
        let (connector, mut poller) = scripted();
        connector.reject_next_login(AuthError::Rejected {
            user: "alice".into(),
            host: "hpc".into(),
        });

        assert!(matches!(
            poller.login(alice()),
            Err(AuthError::Rejected { .. })
        ));
        assert_eq!(poller.state(), State::Unauthenticated);
        assert!(poller.credentials().is_none());
        assert!(!poller.start_auto_refresh(Instant::now()));
        assert!(!poller.auto_refresh());
    }

    #[test]
    fn test_failed_relogin_drops_previous_session() {
        let (connector, mut poller) = scripted();
        poller.login(alice()).unwrap();

        connector.reject_next_login(AuthError::Unreachable("no route to host".into()));
        assert!(poller.login(Credentials::new("bob", "other").password("x")).is_err());

        assert_eq!(poller.state(), State::Unauthenticated);
        assert_eq!(connector.closes(), 1);
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let (_connector, mut poller) = scripted();
        assert_eq!(
            poller.login(Credentials::new("alice", "")),
            Err(AuthError::InvalidHost)
        );
    }

    #[test]
    fn test_logout() {
        let (connector, mut poller) = scripted();
        poller.login(alice()).unwrap();
        poller.refresh_now().unwrap();
        assert!(poller.start_auto_refresh(Instant::now()));

        poller.logout();
        poller.logout();
        assert_eq!(poller.state(), State::Unauthenticated);
        assert!(poller.snapshot().is_none());
        assert!(!poller.auto_refresh());
        assert_eq!(connector.closes(), 1);
        assert_eq!(poller.refresh_now().unwrap_err(), PollError::Unauthenticated);
    }

    #[test]
    fn test_set_interval() {
        let (_connector, mut poller) = scripted();
        let now = Instant::now();

        assert_eq!(
            poller.set_interval(0, now),
            Err(PollError::InvalidInterval(0))
        );
        assert_eq!(poller.interval(), Duration::from_secs(DEFAULT_INTERVAL));

        poller.set_interval(5, now).unwrap();
        assert_eq!(poller.interval(), Duration::from_secs(5));
        // Not running, so nothing is armed
        assert_eq!(poller.next_deadline(), None);
    }

    #[test]
    fn test_set_interval_out_of_range() {
        let (_connector, mut poller) = scripted();
        let now = Instant::now();

        assert_eq!(
            poller.set_interval(u64::MAX, now),
            Err(PollError::InvalidInterval(u64::MAX))
        );
        assert_eq!(
            poller.set_interval(MAX_INTERVAL + 1, now),
            Err(PollError::InvalidInterval(MAX_INTERVAL + 1))
        );
        assert_eq!(poller.interval(), Duration::from_secs(DEFAULT_INTERVAL));

        poller.set_interval(MAX_INTERVAL, now).unwrap();
        poller.login(alice()).unwrap();

        let start = Instant::now();
        assert!(poller.start_auto_refresh(start));
        assert_eq!(
            poller.next_deadline(),
            Some(start + Duration::from_secs(MAX_INTERVAL))
        );
    }

    #[test]
    fn test_interval_change_rearms_once() {
        let (_connector, mut poller) = scripted();
        poller.login(alice()).unwrap();

        let start = Instant::now();
        assert!(poller.start_auto_refresh(start));
        assert_eq!(poller.next_deadline(), Some(start + Duration::from_secs(30)));

        let now = start + Duration::from_secs(3);
        poller.set_interval(60, now).unwrap();
        assert_eq!(poller.next_deadline(), Some(now + Duration::from_secs(60)));

        // The old deadline no longer fires
        assert!(poller.tick(start + Duration::from_secs(30)).is_none());
        assert!(poller.tick(now + Duration::from_secs(60)).is_some());
    }

    #[test]
    fn test_start_auto_refresh_is_idempotent() {
        let (_connector, mut poller) = scripted();
        poller.login(alice()).unwrap();

        let start = Instant::now();
        assert!(poller.start_auto_refresh(start));
        assert!(poller.start_auto_refresh(start + Duration::from_secs(10)));
        assert_eq!(poller.next_deadline(), Some(start + Duration::from_secs(30)));

        poller.stop_auto_refresh();
        poller.stop_auto_refresh();
        assert!(!poller.auto_refresh());
        assert!(poller.tick(start + Duration::from_secs(60)).is_none());
    }

    #[test]
    fn test_tick_polls_and_rearms() {
        let (connector, mut poller) = scripted();
        poller.login(alice()).unwrap();

        let start = Instant::now();
        poller.set_interval(5, start).unwrap();
        poller.start_auto_refresh(start);

        assert!(poller.tick(start + Duration::from_secs(4)).is_none());
        assert!(connector.commands().is_empty());

        let due = start + Duration::from_secs(5);
        let snapshot = poller.tick(due).unwrap().unwrap();
        assert!(snapshot.jobs.is_empty());
        assert_eq!(connector.commands().len(), 1);

        let next = poller.next_deadline().unwrap();
        assert!(next >= due + Duration::from_secs(5));
    }

    #[test]
    fn test_offline_canned_snapshot() {
        let mut poller = Poller::new(Box::new(OfflineConnector), TIMEOUT);
        poller.login(Credentials::new("demo", "offline")).unwrap();

        let snapshot = poller.refresh_now().unwrap();
        assert_eq!(snapshot.jobs.len(), 9);
        assert_eq!(
            snapshot.tally,
            StatusTally {
                running: 4,
                pending: 3,
                completed: 1,
                failed: 1,
            }
        );
    }
}
