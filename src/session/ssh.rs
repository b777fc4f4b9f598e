use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use russh::client::{self, Handle};
use russh::keys::ssh_key::PublicKey;
use russh::{ChannelMsg, Disconnect};
use tokio::runtime::{Builder, Runtime};

use crate::config::Credentials;
use crate::error::{AuthError, ExecError};

use super::{validate, Connector, Session};

/// Interval between SSH keepalive messages on idle connections
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Extended data stream carrying stderr
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// russh event handler
struct Client {
    host: String,
}

impl client::Handler for Client {
    type Error = russh::Error;

    // FIXME: Verify against ~/.ssh/known_hosts
    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!("accepting host key of {}", self.host);
        Ok(true)
    }
}

/// Opens password-authenticated SSH sessions.
///
/// The SSH transport runs on a private tokio runtime so that callers can stay
/// synchronous; every blocking call goes through [`Runtime::block_on`].
pub struct SshConnector {
    runtime: Arc<Runtime>,
}

impl SshConnector {
    pub fn new() -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("slurmwatch-ssh")
            .enable_all()
            .build()?;

        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }
}

impl Connector for SshConnector {
    fn connect(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Box<dyn Session>, AuthError> {
        validate(credentials, timeout)?;

        let password = credentials.password.as_deref().ok_or_else(|| {
            AuthError::MissingPassword(format!("{}@{}", credentials.username, credentials.hostname))
        })?;

        info!(
            "connecting to {}@{}:{}",
            credentials.username, credentials.hostname, credentials.port
        );

        let handle = self
            .runtime
            .block_on(async {
                tokio::time::timeout(timeout, authenticate(credentials, password)).await
            })
            .map_err(|_| AuthError::TimedOut(credentials.hostname.clone()))??;

        info!("authenticated as {}@{}", credentials.username, credentials.hostname);
        Ok(Box::new(SshSession {
            runtime: self.runtime.clone(),
            handle: Some(handle),
        }))
    }
}

async fn authenticate(
    credentials: &Credentials,
    password: &str,
) -> Result<Handle<Client>, AuthError> {
    let config = Arc::new(client::Config {
        keepalive_interval: Some(KEEPALIVE_INTERVAL),
        ..Default::default()
    });

    let handler = Client {
        host: credentials.hostname.clone(),
    };

    let mut handle = client::connect(
        config,
        (credentials.hostname.as_str(), credentials.port),
        handler,
    )
    .await
    .map_err(|err| match err {
        russh::Error::IO(err) => AuthError::Unreachable(err.to_string()),
        err => AuthError::Protocol(err.to_string()),
    })?;

    let result = handle
        .authenticate_password(credentials.username.as_str(), password)
        .await
        .map_err(|err| AuthError::Protocol(err.to_string()))?;

    if !result.success() {
        return Err(AuthError::Rejected {
            user: credentials.username.clone(),
            host: credentials.hostname.clone(),
        });
    }

    Ok(handle)
}

/// An authenticated SSH connection; each command runs on a fresh channel
pub struct SshSession {
    runtime: Arc<Runtime>,
    handle: Option<Handle<Client>>,
}

impl Session for SshSession {
    fn execute(&mut self, command: &str) -> Result<String, ExecError> {
        let handle = self.handle.as_ref().ok_or(ExecError::NotConnected)?;
        if handle.is_closed() {
            return Err(ExecError::ChannelClosed("connection closed by remote host".into()));
        }

        debug!("executing {:?}", command);
        self.runtime.block_on(run(handle, command))
    }

    fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            let result = self
                .runtime
                .block_on(handle.disconnect(Disconnect::ByApplication, "", "English"));

            match result {
                Ok(()) => info!("disconnected"),
                Err(err) => debug!("error while disconnecting: {}", err),
            }
        }
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run(handle: &Handle<Client>, command: &str) -> Result<String, ExecError> {
    let closed = |err: russh::Error| ExecError::ChannelClosed(err.to_string());

    let mut channel = handle.channel_open_session().await.map_err(closed)?;
    channel.exec(true, command).await.map_err(closed)?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut status = None;
    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
            ChannelMsg::ExtendedData { ref data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                stderr.extend_from_slice(data)
            }
            ChannelMsg::ExitStatus { exit_status } => status = Some(exit_status),
            _ => {}
        }
    }

    match status {
        Some(0) => {}
        Some(status) => {
            let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
            warn!("{:?} exited with status {}: {}", command, status, stderr);
            return Err(ExecError::CommandFailed { status, stderr });
        }
        None => warn!("{:?} closed without an exit status", command),
    }

    String::from_utf8(stdout).map_err(|_| ExecError::InvalidOutput)
}
