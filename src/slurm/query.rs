use log::warn;

use crate::error::ParseWarning;

use super::jobs::{JobRecord, Status};
use super::misc::{format_string, shell_quote};

/// First token of the header line printed by `squeue`
pub const HEADER_MARKER: &str = "JOBID";

/// Field separator shared by [`build_command`] and [`parse`]
pub const DELIMITER: char = '|';

/// `squeue` format specifiers, in the order [`parse`] expects them
const FIELDS: [&str; 7] = [
    // Job or job step ID
    "%A",
    // Job name
    "%j",
    // Job state, extended form
    "%T",
    // Time used by the job
    "%M",
    // Number of nodes allocated or requested
    "%D",
    // Number of CPUs allocated or requested
    "%C",
    // Minimum memory requested
    "%m",
];

/// Builds the remote command listing the jobs of `username`
pub fn build_command(username: &str) -> String {
    format!(
        "squeue -u {} -o '{}'",
        shell_quote(username),
        format_string(FIELDS.iter(), DELIMITER)
    )
}

/// Jobs parsed from one `squeue` response, plus the lines that were skipped
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Parsed {
    pub jobs: Vec<JobRecord>,
    pub warnings: Vec<ParseWarning>,
}

/// Parses `squeue` output in the format requested by [`build_command`].
///
/// Blank lines and the header are ignored. Lines that cannot be parsed are
/// skipped and reported in [`Parsed::warnings`]; they never abort the parse.
/// Jobs are returned in the order they were received.
pub fn parse(raw: &str) -> Parsed {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER as u8)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let mut parsed = Parsed::default();
    for result in reader.records() {
        let (line, outcome) = match result {
            Ok(record) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                if is_blank(&record) || record.get(0) == Some(HEADER_MARKER) {
                    continue;
                }

                (line, parse_record(&record))
            }
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or_default();
                (line, Err(err.to_string()))
            }
        };

        match outcome {
            Ok(job) => parsed.jobs.push(job),
            Err(reason) => {
                let warning = ParseWarning {
                    line: line as usize,
                    reason,
                };

                warn!("skipping squeue output {}", warning);
                parsed.warnings.push(warning);
            }
        }
    }

    parsed
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

fn parse_record(record: &csv::StringRecord) -> Result<JobRecord, String> {
    if record.len() < FIELDS.len() {
        return Err(format!(
            "expected {} fields, found {}",
            FIELDS.len(),
            record.len()
        ));
    }

    let field = |idx: usize| record.get(idx).unwrap_or_default();
    let count = |idx: usize, name: &str| {
        field(idx)
            .parse::<u32>()
            .map_err(|_| format!("invalid {}: {:?}", name, field(idx)))
    };

    Ok(JobRecord {
        id: field(0).to_string(),
        name: field(1).to_string(),
        state: field(2).to_string(),
        status: Status::from_state(field(2)),
        time: field(3).to_string(),
        nodes: count(4, "node count")?,
        cpus: count(5, "CPU count")?,
        memory: normalize_memory(field(6)),
    })
}

/// Formats a memory value reported in megabytes as `<n>MB` or `<n.n>GB`.
///
/// Values that already carry a unit, and values that are not integers, are
/// returned unchanged.
pub fn normalize_memory(raw: &str) -> String {
    if raw.contains("MB") || raw.contains("GB") {
        return raw.to_string();
    }

    match raw.trim().parse::<i64>() {
        Ok(mb) if mb >= 1024 => format!("{:.1}GB", mb as f64 / 1024.0),
        Ok(mb) => format!("{}MB", mb),
        Err(_) => raw.to_string(),
    }
}
