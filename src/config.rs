use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Name of the per-user directory holding the config file and log
const CONFIG_DIR: &str = ".slurmwatch";
const CONFIG_FILE: &str = "config.json";

/// Login details for the cluster's login node
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub hostname: String,
    pub port: u16,
    pub password: Option<String>,
    /// Write username and hostname to the config file after a successful login
    pub remember: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            hostname: hostname.into(),
            port: DEFAULT_PORT,
            password: None,
            remember: false,
        }
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

// Never print the password
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("remember", &self.remember)
            .finish()
    }
}

/// On-disk shape of the config file
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub username: String,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Plaintext passwords written by older clients are read, never written
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl From<ConfigFile> for Credentials {
    fn from(config: ConfigFile) -> Self {
        Self {
            username: config.username,
            hostname: config.hostname,
            port: config.port.unwrap_or(DEFAULT_PORT),
            password: config.password,
            remember: true,
        }
    }
}

impl From<&Credentials> for ConfigFile {
    fn from(credentials: &Credentials) -> Self {
        Self {
            username: credentials.username.clone(),
            hostname: credentials.hostname.clone(),
            port: (credentials.port != DEFAULT_PORT).then_some(credentials.port),
            password: None,
        }
    }
}

/// Reads and writes the config file at a fixed location
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.slurmwatch`
    pub fn default_dir() -> Result<PathBuf, PersistenceError> {
        std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(CONFIG_DIR))
            .ok_or(PersistenceError::NoHome)
    }

    /// `~/.slurmwatch/config.json`
    pub fn default_path() -> Result<PathBuf, PersistenceError> {
        Ok(Self::default_dir()?.join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config file, returning `None` if it does not exist
    pub fn load(&self) -> Result<Option<ConfigFile>, PersistenceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("no config at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let config: ConfigFile =
            serde_json::from_str(&contents).map_err(|source| PersistenceError::Format {
                path: self.path.clone(),
                source,
            })?;

        if config.password.is_some() {
            warn!(
                "{} contains a plaintext password; it will be removed the next time the login is saved",
                self.path.display()
            );
        }

        Ok(Some(config))
    }

    /// Overwrites the config file with the username, hostname and port of `credentials`
    pub fn save(&self, credentials: &Credentials) -> Result<(), PersistenceError> {
        let write_err = |source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let contents = serde_json::to_string_pretty(&ConfigFile::from(credentials)).map_err(
            |source| PersistenceError::Format {
                path: self.path.clone(),
                source,
            },
        )?;

        fs::write(&self.path, contents).map_err(write_err)?;
        info!("saved login to {}", self.path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "slurmwatch-config-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file() {
        let store = ConfigStore::new(scratch("missing").join(CONFIG_FILE));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = scratch("save");
        let store = ConfigStore::new(dir.join("nested").join(CONFIG_FILE));

        let mut credentials = Credentials::new("alice", "login.hpc.example.org").password("hunter2");
        credentials.port = 2222;
        store.save(&credentials).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(!contents.contains("hunter2"));
        assert!(!contents.contains("password"));

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(
            loaded,
            ConfigFile {
                username: "alice".into(),
                hostname: "login.hpc.example.org".into(),
                port: Some(2222),
                password: None,
            }
        );

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_legacy_password_is_read() {
        let dir = scratch("legacy");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{"username": "bob", "hostname": "hpc", "password": "secret"}"#,
        )
        .unwrap();

        let credentials = Credentials::from(ConfigStore::new(&path).load().unwrap().unwrap());
        assert_eq!(credentials.username, "bob");
        assert_eq!(credentials.port, DEFAULT_PORT);
        assert_eq!(credentials.password.as_deref(), Some("secret"));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_malformed_file() {
        let dir = scratch("malformed");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ConfigStore::new(&path).load(),
            Err(PersistenceError::Format { .. })
        ));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_debug_hides_password() {
        let credentials = Credentials::new("alice", "hpc").password("hunter2");
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }
}
