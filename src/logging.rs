use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use env_logger::{Env, Target};

const LOG_FILE: &str = "slurmwatch.log";

/// Routes `log` output to a file, since the terminal belongs to the UI.
///
/// Uses `path` if given, otherwise `slurmwatch.log` in `dir`. The filter
/// defaults to `info` and can be overridden with `RUST_LOG`. Returns the path
/// of the log file.
pub fn init(path: Option<&Path>, dir: Option<&Path>) -> std::io::Result<Option<PathBuf>> {
    let path = match (path, dir) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(dir)) => dir.join(LOG_FILE),
        (None, None) => return Ok(None),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();

    Ok(Some(path))
}
