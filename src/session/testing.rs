//! In-memory session doubles with scripted responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Credentials;
use crate::error::{AuthError, ExecError};

use super::{validate, Connector, Session};

/// Shared record of what the doubles were asked to do
#[derive(Debug, Default)]
pub struct Script {
    /// Outcome of the next `connect` calls; success when empty
    pub logins: VecDeque<Result<(), AuthError>>,
    /// Outcome of the next `execute` calls; empty output when exhausted
    pub responses: VecDeque<Result<String, ExecError>>,
    pub commands: Vec<String>,
    pub connects: usize,
    pub closes: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ScriptedConnector {
    pub script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    pub fn respond(&self, response: Result<String, ExecError>) -> &Self {
        self.script.lock().unwrap().responses.push_back(response);
        self
    }

    pub fn reject_next_login(&self, err: AuthError) -> &Self {
        self.script.lock().unwrap().logins.push_back(Err(err));
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.script.lock().unwrap().commands.clone()
    }

    pub fn connects(&self) -> usize {
        self.script.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.script.lock().unwrap().closes
    }
}

impl Connector for ScriptedConnector {
    fn connect(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Box<dyn Session>, AuthError> {
        validate(credentials, timeout)?;

        let mut script = self.script.lock().unwrap();
        script.logins.pop_front().unwrap_or(Ok(()))?;
        script.connects += 1;

        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            open: true,
        }))
    }
}

pub struct ScriptedSession {
    script: Arc<Mutex<Script>>,
    open: bool,
}

impl Session for ScriptedSession {
    fn execute(&mut self, command: &str) -> Result<String, ExecError> {
        if !self.open {
            return Err(ExecError::NotConnected);
        }

        let mut script = self.script.lock().unwrap();
        script.commands.push(command.to_string());
        script.responses.pop_front().unwrap_or_else(|| Ok(String::new()))
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.script.lock().unwrap().closes += 1;
        }
    }
}
