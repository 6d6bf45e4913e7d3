//! WebDriver management - spawning and health checking chromedriver,
//! and probing the application under test

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::WebDriverConfig;
use crate::error::{E2eError, E2eResult};

/// Handle to a running chromedriver process
pub struct DriverService {
    child: Child,
    pub url: String,
    pub port: u16,
}

impl DriverService {
    /// Spawn chromedriver and wait until it reports ready
    pub async fn spawn(config: DriverConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let url = format!("http://127.0.0.1:{}", port);

        info!("Spawning chromedriver on port {}", port);

        let mut cmd = Command::new(&config.binary_path);
        cmd.arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                E2eError::DriverNotFound(config.binary_path.display().to_string())
            }
            _ => E2eError::DriverStartup(format!(
                "Failed to spawn {}: {}",
                config.binary_path.display(),
                e
            )),
        })?;

        let mut handle = DriverService { child, url, port };

        // Wait for the driver to accept sessions
        handle.wait_for_ready(config.startup_timeout).await?;

        info!("chromedriver is ready at {}", handle.url);
        Ok(handle)
    }

    /// Poll `/status` until the driver reports `ready`
    async fn wait_for_ready(&mut self, timeout_duration: Duration) -> E2eResult<()> {
        let status_url = format!("{}/status", self.url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            if let Some(status) = self.child.try_wait()? {
                return Err(E2eError::DriverStartup(format!(
                    "chromedriver exited early with {}",
                    status
                )));
            }

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body: serde_json::Value = resp.json().await?;
                    if is_ready(&body) {
                        return Ok(());
                    }
                    debug!("chromedriver not ready yet: {}", body);
                }
                Ok(resp) => {
                    warn!("Status check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for chromedriver to start...");
                    }
                    // Connection refused is expected while the driver is starting
                    if !e.is_connect() {
                        warn!("Status check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::DriverHealthCheck(attempts))
    }

    /// Get the WebDriver endpoint for this driver
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stop the driver
    pub fn stop(&mut self) -> E2eResult<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }

        info!("Stopping chromedriver (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(200));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for DriverService {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning chromedriver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Path to the chromedriver binary
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for driver startup
    pub startup_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::from(&WebDriverConfig::default())
    }
}

impl From<&WebDriverConfig> for DriverConfig {
    fn from(config: &WebDriverConfig) -> Self {
        Self {
            binary_path: config.chromedriver_path.clone(),
            port: config.port,
            startup_timeout: config.startup_timeout(),
        }
    }
}

/// Whether a WebDriver `/status` body reports ready
fn is_ready(body: &serde_json::Value) -> bool {
    body.pointer("/value/ready")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Wait until the application answers HTTP at `base_url`.
///
/// Any response below 500 counts, since unauthenticated routes redirect.
pub async fn wait_for_app(base_url: &str, timeout_duration: Duration) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match client.get(base_url).send().await {
            Ok(resp) if !resp.status().is_server_error() => {
                info!("Application is up at {} ({})", base_url, resp.status());
                return Ok(());
            }
            Ok(resp) => debug!("Application returned {}", resp.status()),
            Err(e) => debug!("Application probe failed: {}", e),
        }

        if start.elapsed() >= timeout_duration {
            break;
        }
        sleep(Duration::from_millis(250)).await;
    }

    Err(E2eError::AppUnreachable {
        url: base_url.to_string(),
        attempts,
    })
}

/// Find a free port to use
fn find_free_port() -> E2eResult<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
