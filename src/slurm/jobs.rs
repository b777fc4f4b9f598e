use std::{fmt, str::FromStr};

use serde::{
    de::{self, IntoDeserializer},
    Deserialize,
};

/// Job states as reported by `squeue --format=%T`
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Terminated due to launch failure
    BootFail,
    /// Cancelled by user/admin
    Cancelled,
    /// Completed successfully
    Completed,
    /// Completing; processes may still be running
    Completing,
    /// Waiting for resources to being running
    Configuring,
    /// Terminated due to deadline
    Deadline,
    /// Terminated with non-zero exit code or similar
    Failed,
    /// Terminated due to node failure
    NodeFail,
    OutOfMemory,
    Pending,
    Preempted,
    Requeued,
    RequeueFed,
    RequeueHold,
    Resizing,
    ResvDelHold,
    Revoked,
    Running,
    Signaling,
    SpecialExit,
    StageOut,
    Stopped,
    Suspended,
    Timeout,
    /// Anything this version of slurmwatch does not know about
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Maps the state onto one of the four display buckets
    pub fn status(self) -> Status {
        match self {
            JobState::Running => Status::Running,
            JobState::Pending => Status::Pending,
            JobState::Completed | JobState::Completing => Status::Completed,
            JobState::Failed | JobState::Timeout | JobState::Cancelled => Status::Failed,
            _ => Status::Pending,
        }
    }
}

impl FromStr for JobState {
    type Err = de::value::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let deserializer: de::value::StrDeserializer<'_, de::value::Error> =
            value.trim().into_deserializer();

        JobState::deserialize(deserializer)
    }
}

/// Normalized status bucket used for tallies and colouring
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Running,
    Pending,
    Completed,
    Failed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Running,
        Status::Pending,
        Status::Completed,
        Status::Failed,
    ];

    /// Derives the bucket from a raw state string; unknown states are pending
    pub fn from_state(state: &str) -> Status {
        state
            .parse::<JobState>()
            .map(JobState::status)
            .unwrap_or(Status::Pending)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Running => "running",
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self, f)
    }
}

/// One job observed in a single poll
#[derive(Clone, Debug, PartialEq)]
pub struct JobRecord {
    /// ID of the job as assigned by the cluster
    pub id: String,
    /// Full name of the job
    pub name: String,
    /// State exactly as reported by `squeue`
    pub state: String,
    /// Bucket derived from `state`
    pub status: Status,
    /// Runtime, formatted by `squeue`
    pub time: String,
    /// Number of nodes requested by/allocated to the job
    pub nodes: u32,
    /// Number of CPUs requested by/allocated to the job
    pub cpus: u32,
    /// Memory, normalized to MB/GB where possible
    pub memory: String,
}

impl JobRecord {
    /// Runtime as a sortable duration; `None` for values squeue did not format as a duration
    pub fn elapsed(&self) -> Option<JobDuration> {
        self.time.parse().ok()
    }

    /// Memory in MB, for sorting
    pub fn memory_mb(&self) -> Option<f64> {
        let (value, scale) = if let Some(value) = self.memory.strip_suffix("GB") {
            (value, 1024.0)
        } else if let Some(value) = self.memory.strip_suffix("MB") {
            (value, 1.0)
        } else {
            (self.memory.as_str(), 1.0)
        };

        value.trim().parse::<f64>().ok().map(|v| v * scale)
    }
}

/// Represents the time taken by a Slurm job
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct JobDuration {
    days: usize,
    hours: usize,
    minutes: usize,
    seconds: usize,
}

impl FromStr for JobDuration {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        fn parse(value: Option<&str>) -> Result<usize, String> {
            let value = value.ok_or_else(|| "value not found in time".to_string())?;
            value
                .parse::<usize>()
                .map_err(|_| format!("invalid value in TIME: {:?}", value))
        }

        let (days, value) = match value.split_once('-') {
            Some((days, value)) => (parse(Some(days))?, value),
            None => (0, value),
        };

        let mut values = value.rsplit(':');
        let seconds = parse(values.next())?;
        let minutes = parse(values.next())?;
        let hours = parse(values.next().or(Some("0")))?;

        Ok(JobDuration {
            days,
            hours,
            minutes,
            seconds,
        })
    }
}

/// Formats the job duration to match squeue output
impl fmt::Display for JobDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}-", self.days)?
        }

        if self.days > 0 || self.hours > 0 {
            write!(f, "{:02}:", self.hours)?
        }

        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}
