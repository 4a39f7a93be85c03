//! Development server lifecycle.

use std::process::Stdio;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Delay between two health checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A spawned server process, killed on [`DevServer::shutdown`] or drop.
#[derive(Debug)]
pub struct DevServer {
    child: Child,
}

impl DevServer {
    /// Spawn `command` through the shell and wait until `host` responds.
    ///
    /// # Errors
    ///
    /// [`Error::ServerStart`] when `host` gives no HTTP response within
    /// `timeout`, carrying the last polling failure.
    pub async fn start(command: &str, host: &str, timeout: Duration) -> Result<Self> {
        info!(command, "starting server");
        let mut child = shell(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, false));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, true));
        }

        let server = Self { child };
        wait_for_host(host, timeout).await?;
        Ok(server)
    }

    /// Stop the server process.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "failed to stop server");
        } else {
            debug!("server stopped");
        }
    }
}

fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

async fn forward_lines<R>(reader: R, is_stderr: bool)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            warn!("[server] {line}");
        } else {
            info!("[server] {line}");
        }
    }
}

/// Poll `host` every [`POLL_INTERVAL`] until it answers or `timeout` passes.
///
/// Any HTTP response counts as up, error statuses included.
pub async fn wait_for_host(host: &str, timeout: Duration) -> Result<()> {
    let client = Client::new();
    let started = Instant::now();
    loop {
        match client.get(host).send().await {
            Ok(response) => {
                info!(host, status = response.status().as_u16(), "server is up");
                return Ok(());
            },
            Err(e) => {
                debug!(host, error = %e, "server not reachable yet");
                if started.elapsed() + POLL_INTERVAL > timeout {
                    return Err(Error::ServerStart {
                        host: host.to_string(),
                        timeout_secs: timeout.as_secs(),
                        source: Box::new(e),
                    });
                }
            },
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_wait_for_reachable_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        wait_for_host(&server.uri(), Duration::from_secs(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_host_times_out_with_cause() {
        // Port 9 (discard) is not expected to be served locally.
        let err = wait_for_host("http://127.0.0.1:9", Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServerStart { .. }));
        assert!(err.source().is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_server_process_is_stopped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let dev = DevServer::start("echo ready; sleep 30", &server.uri(), Duration::from_secs(2))
            .await
            .unwrap();
        dev.shutdown().await;
    }
}
