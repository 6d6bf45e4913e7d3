//! Suite configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Top-level configuration for a suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Base URL of the application under test
    pub base_url: String,

    /// WebDriver / browser configuration
    pub webdriver: WebDriverConfig,

    /// Wait and probe timeouts
    pub timeouts: TimeoutConfig,

    /// Login used by the authenticated fixture
    pub credentials: Option<Credentials>,

    /// Directory with YAML suites (None = built-in suites)
    pub specs_dir: Option<PathBuf>,

    /// Output directory for results
    pub output_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            webdriver: WebDriverConfig::default(),
            timeouts: TimeoutConfig::default(),
            credentials: None,
            specs_dir: None,
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Browser and driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// Endpoint of an already running WebDriver server.
    /// When unset, a local chromedriver is spawned.
    pub url: Option<String>,

    /// Path to the chromedriver binary
    pub chromedriver_path: PathBuf,

    /// Port for the spawned chromedriver (None = find free port)
    pub port: Option<u16>,

    /// Run Chrome headless
    pub headless: bool,

    /// Extra Chrome command line arguments
    pub browser_args: Vec<String>,

    /// Timeout for chromedriver startup, in seconds
    pub startup_timeout_secs: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: None,
            chromedriver_path: PathBuf::from("chromedriver"),
            port: None,
            headless: true,
            browser_args: Vec::new(),
            startup_timeout_secs: 30,
        }
    }
}

impl WebDriverConfig {
    /// Chrome arguments passed through `goog:chromeOptions`
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless".to_string());
        }
        args.push("--no-sandbox".to_string());
        args.push("--disable-dev-shm-usage".to_string());
        args.extend(self.browser_args.iter().cloned());
        args
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

/// Timeouts, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// WebDriver implicit wait applied to every element lookup
    pub implicit_wait_ms: u64,

    /// Default timeout for `wait_for` steps
    pub wait_ms: u64,

    /// Poll interval for wait conditions
    pub poll_interval_ms: u64,

    /// How long to wait for the application to answer before running
    pub app_probe_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            implicit_wait_ms: 10_000,
            wait_ms: 10_000,
            poll_interval_ms: 250,
            app_probe_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    pub fn implicit_wait(&self) -> Duration {
        Duration::from_millis(self.implicit_wait_ms)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn app_probe(&self) -> Duration {
        Duration::from_millis(self.app_probe_ms)
    }
}

/// Test account credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Build credentials when both parts are present and non-empty
    pub fn from_parts(email: Option<String>, password: Option<String>) -> Option<Self> {
        match (email, password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(Self { email, password })
            }
            _ => None,
        }
    }
}

impl SuiteConfig {
    /// Load configuration from a TOML file, or defaults if it does not exist.
    ///
    /// Not validated here: callers apply overrides first, then `validate`.
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject configurations that cannot produce a meaningful run
    pub fn validate(&self) -> E2eResult<()> {
        let base = url::Url::parse(&self.base_url)?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(E2eError::Config(format!(
                "base_url must be http or https, got '{}'",
                base.scheme()
            )));
        }
        if let Some(endpoint) = &self.webdriver.url {
            url::Url::parse(endpoint)?;
        }
        if self.timeouts.wait_ms == 0 || self.timeouts.poll_interval_ms == 0 {
            return Err(E2eError::Config(
                "timeouts.wait_ms and timeouts.poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a route against the base URL. Absolute URLs pass through.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
