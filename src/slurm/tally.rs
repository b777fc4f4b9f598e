use std::fmt;

use super::jobs::{JobRecord, Status};

/// Number of jobs per status bucket in one poll
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusTally {
    pub running: usize,
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusTally {
    pub fn from_jobs(jobs: &[JobRecord]) -> Self {
        let mut tally = Self::default();
        for job in jobs {
            *tally.bucket_mut(job.status) += 1;
        }

        tally
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Running => self.running,
            Status::Pending => self.pending,
            Status::Completed => self.completed,
            Status::Failed => self.failed,
        }
    }

    pub fn total(&self) -> usize {
        Status::ALL.iter().map(|&s| self.count(s)).sum()
    }

    fn bucket_mut(&mut self, status: Status) -> &mut usize {
        match status {
            Status::Running => &mut self.running,
            Status::Pending => &mut self.pending,
            Status::Completed => &mut self.completed,
            Status::Failed => &mut self.failed,
        }
    }
}

/// Formats the tally as the one-line summary shown below the job list
impl fmt::Display for StatusTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Running: {:2} │ Pending: {:2} │ Completed: {:2} │ Failed: {:2}",
            self.running, self.pending, self.completed, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(state: &str) -> JobRecord {
        JobRecord {
            id: "1".into(),
            name: "job".into(),
            state: state.into(),
            status: Status::from_state(state),
            time: "0:00".into(),
            nodes: 1,
            cpus: 1,
            memory: "1MB".into(),
        }
    }

    #[test]
    fn test_tally() {
        let jobs: Vec<_> = ["RUNNING", "TIMEOUT", "CANCELLED", "WHATEVER", "COMPLETING"]
            .into_iter()
            .map(job)
            .collect();

        let tally = StatusTally::from_jobs(&jobs);
        assert_eq!(tally.count(Status::Running), 1);
        assert_eq!(tally.count(Status::Pending), 1);
        assert_eq!(tally.count(Status::Completed), 1);
        assert_eq!(tally.count(Status::Failed), 2);
        assert_eq!(tally.total(), jobs.len());
    }

    #[test]
    fn test_empty_tally() {
        assert_eq!(StatusTally::from_jobs(&[]), StatusTally::default());
        assert_eq!(
            StatusTally::default().to_string(),
            "Running:  0 │ Pending:  0 │ Completed:  0 │ Failed:  0"
        );
    }
}
