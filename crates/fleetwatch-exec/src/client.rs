//! SSH client — connect, authenticate, run one command under a deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect, Sig};
use tokio::time::Instant;
use tracing::{debug, warn};

use fleetwatch_core::ServerConfig;

use crate::auth::{candidates, Credential};
use crate::error::ExecError;

/// Budget for TCP connect, SSH handshake, and authentication.
///
/// Independent of the round deadline: a host that is completely
/// unreachable fails fast instead of consuming the round budget.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs one remote command against one host, bounded by the shared
/// round deadline — injected into the round orchestrator so tests can
/// substitute a recording fake.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        deadline: Instant,
        server: &ServerConfig,
        command: &str,
    ) -> impl Future<Output = Result<String, ExecError>> + Send;
}

/// Client handler that accepts any server host key.
///
/// Host identity verification is deliberately disabled: fleet hosts
/// live on a controlled internal network and are addressed from the
/// static inventory, an accepted risk documented in the config guide.
struct AcceptingClient;

#[async_trait::async_trait]
impl client::Handler for AcceptingClient {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// The real SSH executor.
#[derive(Clone)]
pub struct SshExecutor {
    config: Arc<client::Config>,
    connect_timeout: Duration,
}

impl SshExecutor {
    pub fn new() -> Self {
        Self::with_connect_timeout(CONNECT_TIMEOUT)
    }

    /// Custom connect budget (tests use a short one).
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self {
            config: Arc::new(client::Config::default()),
            connect_timeout,
        }
    }

    /// Run `command` on `server`, racing completion against `deadline`.
    ///
    /// Whatever happens (setup error, nonzero exit, deadline expiry),
    /// the connection is released before this returns.
    pub async fn execute(
        &self,
        deadline: Instant,
        server: &ServerConfig,
        command: &str,
    ) -> Result<String, ExecError> {
        let mut handle = self.connect(server).await?;
        let result = run_command(&mut handle, deadline, command).await;
        let _ = handle.disconnect(Disconnect::ByApplication, "", "en").await;
        result
    }

    /// Dial, handshake, and authenticate, all within the connect budget.
    async fn connect(&self, server: &ServerConfig) -> Result<Handle<AcceptingClient>, ExecError> {
        let creds = candidates(server);
        if creds.is_empty() {
            return Err(ExecError::NoCredentials {
                user: server.user.clone(),
                host: server.host.clone(),
            });
        }

        let setup = async {
            let mut handle = client::connect(
                self.config.clone(),
                (server.host.as_str(), server.port),
                AcceptingClient,
            )
            .await
            .map_err(|e| ExecError::Connect(e.to_string()))?;

            match authenticate(&mut handle, server, creds).await {
                Ok(()) => Ok(handle),
                Err(e) => {
                    let _ = handle.disconnect(Disconnect::ByApplication, "", "en").await;
                    Err(e)
                }
            }
        };

        match tokio::time::timeout(self.connect_timeout, setup).await {
            Ok(result) => result,
            Err(_) => Err(ExecError::ConnectTimeout {
                addr: server.address(),
                secs: self.connect_timeout.as_secs(),
            }),
        }
    }
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SshExecutor {
    async fn run(
        &self,
        deadline: Instant,
        server: &ServerConfig,
        command: &str,
    ) -> Result<String, ExecError> {
        self.execute(deadline, server, command).await
    }
}

/// Offer each candidate in order; the first one the server accepts
/// wins, so a succeeding key means the password is never sent.
async fn authenticate(
    handle: &mut Handle<AcceptingClient>,
    server: &ServerConfig,
    creds: Vec<Credential>,
) -> Result<(), ExecError> {
    for cred in creds {
        let accepted = match &cred {
            Credential::Key(pair) => {
                handle
                    .authenticate_publickey(&server.user, pair.clone())
                    .await?
            }
            Credential::Password(password) => {
                handle
                    .authenticate_password(&server.user, password)
                    .await?
            }
        };
        if accepted {
            debug!(host = %server.host, method = cred.method(), "authenticated");
            return Ok(());
        }
        debug!(host = %server.host, method = cred.method(), "credential rejected");
    }
    Err(ExecError::AuthRejected {
        user: server.user.clone(),
        host: server.host.clone(),
    })
}

/// Open an exec channel and drain it until the command finishes or the
/// round deadline fires, whichever comes first.
async fn run_command(
    handle: &mut Handle<AcceptingClient>,
    deadline: Instant,
    command: &str,
) -> Result<String, ExecError> {
    let mut channel = handle.channel_open_session().await?;
    channel.exec(true, command).await?;

    // stdout and stderr land in one buffer, in whatever order the
    // transport delivers them.
    let mut captured: Vec<u8> = Vec::new();
    let mut exit_status: Option<u32> = None;

    loop {
        tokio::select! {
            msg = channel.wait() => match msg {
                Some(ChannelMsg::Data { ref data }) => captured.extend_from_slice(data),
                Some(ChannelMsg::ExtendedData { ref data, .. }) => captured.extend_from_slice(data),
                Some(ChannelMsg::ExitStatus { exit_status: status }) => exit_status = Some(status),
                Some(ChannelMsg::Failure) => {
                    let _ = channel.close().await;
                    return Err(ExecError::CommandRefused);
                }
                Some(_) => {}
                None => break,
            },
            _ = tokio::time::sleep_until(deadline) => {
                // Kill is best-effort — not every SSH server delivers
                // the signal, but the session must not be left open.
                if let Err(e) = channel.signal(Sig::KILL).await {
                    warn!(error = %e, "failed to signal remote command");
                }
                let _ = channel.close().await;
                return Err(ExecError::DeadlineExceeded);
            }
        }
    }

    let output = String::from_utf8_lossy(&captured).into_owned();
    match exit_status {
        // A channel that closes without reporting a status has still
        // delivered everything it ever will.
        Some(0) | None => Ok(output),
        Some(status) => Err(ExecError::CommandFailed { status, output }),
    }
}
