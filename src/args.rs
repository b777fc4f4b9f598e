use std::path::PathBuf;

use argh::FromArgs;

/// Terminal monitor for your Slurm jobs on a remote cluster
#[derive(FromArgs, Debug)]
pub struct Args {
    /// run offline with sample data; any login is accepted
    #[argh(switch, short = 't')]
    pub test: bool,

    /// refresh frequency in seconds
    #[argh(option, default = "30")]
    pub interval: u64,

    /// start with automatic refresh disabled
    #[argh(switch)]
    pub manual: bool,

    /// login node to connect to
    #[argh(option)]
    pub host: Option<String>,

    /// user name on the login node
    #[argh(option)]
    pub user: Option<String>,

    /// SSH port of the login node
    #[argh(option, default = "22")]
    pub port: u16,

    /// connection timeout in seconds
    #[argh(option, default = "5")]
    pub timeout: u64,

    /// location of the config file; defaults to ~/.slurmwatch/config.json
    #[argh(option)]
    pub config: Option<PathBuf>,

    /// location of the log file; defaults to slurmwatch.log next to the config file
    #[argh(option)]
    pub log: Option<PathBuf>,

    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
}
