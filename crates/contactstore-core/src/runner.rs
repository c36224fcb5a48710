//! Retrieval process runner.
//!
//! Each retrieval spawns the external import program once, passing the
//! provider, email and password as positional arguments, and waits for it
//! to exit. Its standard output is either the raw contact dump or an
//! `error:` report, which is classified here and nowhere else.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::ImporterConfig;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::provider::ProviderId;

/// Marker that starts an error report on standard output.
const ERROR_MARKER: &str = "error:";

/// Error message the program reports for rejected credentials.
const LOGIN_ERROR: &str = "login error";

/// Source of raw contact output for a provider and set of credentials.
pub trait Retrieve {
    /// Retrieves the raw, newline-separated contact dump.
    ///
    /// Implementations classify failures into [`Error`] variants.
    fn retrieve(
        &self,
        provider: ProviderId,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Everything captured from one run of the retrieval program.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Process id of the program.
    pub pid: u32,
    /// Exit code, or `None` if the program was terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Returns true if the program exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }
}

/// Classifies a finished run into a contact dump or an [`Error`].
///
/// An `error:` marker on standard output takes precedence over the exit
/// status. `login error` becomes [`Error::Authentication`]; any other
/// message, or a non-zero exit without a marker, is [`Error::Retrieval`].
///
/// # Errors
///
/// Returns the classified failure when the program did not produce contacts.
pub fn classify(output: ProcessOutput, email: &str) -> Result<String> {
    if let Some(rest) = output.stdout.strip_prefix(ERROR_MARKER) {
        let message = rest.trim();
        if message == LOGIN_ERROR {
            return Err(Error::Authentication {
                pid: output.pid,
                email: email.to_string(),
            });
        }
        return Err(Error::retrieval(message));
    }

    if !output.success() {
        let status = output
            .status
            .map_or_else(|| "a signal".to_string(), |code| format!("status {code}"));
        let stderr = output.stderr.trim();
        return Err(if stderr.is_empty() {
            Error::retrieval(format!("retrieval program exited with {status}"))
        } else {
            Error::retrieval(format!("retrieval program exited with {status}: {stderr}"))
        });
    }

    Ok(output.stdout)
}

/// Runs the external retrieval program as a child process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessRunner {
    /// Creates a runner for `program` with a default two-minute timeout.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Creates a runner from importer configuration.
    #[must_use]
    pub fn from_config(config: &ImporterConfig) -> Self {
        Self::new(&config.program)
            .with_args(config.args.clone())
            .with_timeout(config.timeout())
    }

    /// Sets the leading arguments placed before provider, email and password.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Sets the wait limit for the program.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, provider: ProviderId, credentials: &Credentials) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(provider.as_str())
            .arg(&credentials.email)
            .arg(&credentials.password)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Spawns the program and waits for it, without classifying the result.
    ///
    /// The child is killed if the timeout elapses or the returned future is
    /// dropped before completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Retrieval`] if the program cannot be spawned, cannot
    /// be waited on, or exceeds the timeout.
    pub async fn run(
        &self,
        provider: ProviderId,
        credentials: &Credentials,
    ) -> Result<ProcessOutput> {
        let child = self.command(provider, credentials).spawn().map_err(|e| {
            Error::retrieval(format!("failed to start {}: {e}", self.program.display()))
        })?;
        let pid = child.id().unwrap_or_default();
        debug!(pid, %provider, email = %credentials.email, "Spawned retrieval program");

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::retrieval(format!(
                    "failed to wait for retrieval program: {e}"
                )));
            }
            Err(_) => {
                warn!(pid, "Retrieval program timed out after {:?}", self.timeout);
                return Err(Error::retrieval(format!(
                    "retrieval program timed out after {} seconds",
                    self.timeout.as_secs()
                )));
            }
        };

        let output = ProcessOutput {
            pid,
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !output.stderr.trim().is_empty() {
            warn!(pid, stderr = %output.stderr.trim(), "Retrieval program wrote to stderr");
        }
        debug!(
            pid,
            status = ?output.status,
            bytes = output.stdout.len(),
            "Retrieval program exited"
        );
        Ok(output)
    }
}

impl Retrieve for ProcessRunner {
    async fn retrieve(
        &self,
        provider: ProviderId,
        credentials: &Credentials,
    ) -> Result<String> {
        let output = self.run(provider, credentials).await?;
        classify(output, &credentials.email)
    }
}
