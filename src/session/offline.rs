use std::time::Duration;

use log::{debug, info};

use crate::config::Credentials;
use crate::error::{AuthError, ExecError};

use super::{Connector, Session};

/// Response served for `squeue` commands in offline mode
pub const CANNED_SQUEUE: &str = "JOBID|NAME|STATE|TIME|NODES|CPUS|MEMORY
12345|tensorflow_train|RUNNING|10:23|2|32|64000
12346|data_preprocessing|PENDING|00:00|1|8|16000
12347|genome_analysis|RUNNING|5:45|4|128|256000
12348|pytorch_model|COMPLETED|12:30|8|256|512000
12349|ml_training|PENDING|00:00|2|16|32000
12350|batch_process|RUNNING|2:15|1|4|8000
12351|failed_job|FAILED|05:21|2|64|128000
12352|image_processing|RUNNING|8:33|4|96|192000
12353|awaiting_resources|PENDING|00:00|8|512|1024000";

/// Accepts any credentials and never touches the network
#[derive(Debug, Default)]
pub struct OfflineConnector;

impl Connector for OfflineConnector {
    fn connect(
        &self,
        credentials: &Credentials,
        _timeout: Duration,
    ) -> Result<Box<dyn Session>, AuthError> {
        info!(
            "offline mode: accepting {}@{} without authentication",
            credentials.username, credentials.hostname
        );

        Ok(Box::new(OfflineSession::default()))
    }
}

#[derive(Debug, Default)]
pub struct OfflineSession {
    closed: bool,
}

impl Session for OfflineSession {
    fn execute(&mut self, command: &str) -> Result<String, ExecError> {
        if self.closed {
            return Err(ExecError::NotConnected);
        }

        debug!("offline mode: {}", command);
        if command.starts_with("squeue") {
            Ok(CANNED_SQUEUE.to_string())
        } else {
            Ok(String::new())
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
