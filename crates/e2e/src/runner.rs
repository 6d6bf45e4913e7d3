//! Main test runner that orchestrates the WebDriver, browser sessions and fixtures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SuiteConfig;
use crate::driver::{wait_for_app, DriverConfig, DriverService};
use crate::error::{E2eError, E2eResult};
use crate::fixtures;
use crate::page::{BrowserSession, Page};
use crate::spec::{flatten, Suite, TestSpec, Vars};
use crate::steps::{execute_step, Outcome, StepResult};
use crate::suites;

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub suite: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    /// Failure message, or the reason for a skip
    pub error: Option<String>,
    pub screenshot: Option<PathBuf>,
}

impl TestResult {
    fn errored(spec: &TestSpec, error: &E2eError) -> Self {
        Self {
            name: spec.name.clone(),
            suite: spec.suite.clone(),
            outcome: if error.is_skip() { Outcome::Skipped } else { Outcome::Failed },
            duration_ms: 0,
            steps: vec![],
            error: Some(match error {
                E2eError::Skipped(reason) => reason.clone(),
                other => other.to_string(),
            }),
            screenshot: None,
        }
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Main E2E test runner
pub struct TestRunner {
    config: SuiteConfig,

    /// Spawned chromedriver (if any)
    driver: Option<DriverService>,

    /// WebDriver endpoint sessions connect to
    endpoint: Option<String>,

    /// Substituted into suite text
    vars: Vars,
}

impl TestRunner {
    pub fn new(config: SuiteConfig) -> Self {
        let mut vars = Vars::new();
        vars.insert("run_id".to_string(), Utc::now().format("%Y%m%d%H%M%S").to_string());
        vars.insert("base_url".to_string(), config.base_url.clone());

        Self {
            config,
            driver: None,
            endpoint: None,
            vars,
        }
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Use the configured WebDriver endpoint, or spawn chromedriver
    pub async fn start_driver(&mut self) -> E2eResult<()> {
        if self.endpoint.is_some() {
            return Ok(());
        }

        if let Some(url) = &self.config.webdriver.url {
            info!("Using WebDriver at {}", url);
            self.endpoint = Some(url.clone());
            return Ok(());
        }

        let service = DriverService::spawn(DriverConfig::from(&self.config.webdriver)).await?;
        self.endpoint = Some(service.url().to_string());
        self.driver = Some(service);
        Ok(())
    }

    /// Stop a spawned chromedriver
    pub fn stop_driver(&mut self) -> E2eResult<()> {
        self.endpoint = None;
        if let Some(mut driver) = self.driver.take() {
            driver.stop()?;
        }
        Ok(())
    }

    /// Fail fast when the application under test is not answering
    pub async fn check_app(&self) -> E2eResult<()> {
        wait_for_app(&self.config.base_url, self.config.timeouts.app_probe()).await
    }

    /// Load tests from the specs directory, or the built-in suites
    pub fn load_specs(&self) -> E2eResult<Vec<TestSpec>> {
        let suites = match &self.config.specs_dir {
            Some(dir) => Suite::load_all(dir, &self.vars)?,
            None => suites::builtin(&self.vars)?,
        };
        flatten(suites)
    }

    /// Run every loaded test
    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        let specs = self.load_specs()?;
        self.run_specs(&specs).await
    }

    /// Run tests matching a tag or suite name
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs = self.load_specs()?;
        let filtered: Vec<TestSpec> = TestSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        if filtered.is_empty() {
            warn!("No tests tagged '{}'", tag);
        }
        self.run_specs(&filtered).await
    }

    /// Run a specific test by name
    pub async fn run_test(&mut self, name: &str) -> E2eResult<TestSuiteResult> {
        let specs = self.load_specs()?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {}", name)))?;

        self.run_specs(std::slice::from_ref(&spec)).await
    }

    /// Run a list of tests, strictly one after another
    pub async fn run_specs(&mut self, specs: &[TestSpec]) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();

        self.start_driver().await?;

        info!("Running {} test(s) against {}...", specs.len(), self.config.base_url);

        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            let result = match self.run_spec(spec).await {
                Ok(result) => result,
                Err(e) => TestResult::errored(spec, &e),
            };
            log_result(&result);
            results.push(result);
        }

        let summary = summarize(results, &self.config.base_url, started_at, start.elapsed().as_millis() as u64);

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            summary.passed, summary.failed, summary.skipped, summary.duration_ms
        );

        Ok(summary)
    }

    /// Run one test in its own browser session
    pub async fn run_spec(&mut self, spec: &TestSpec) -> E2eResult<TestResult> {
        self.start_driver().await?;
        let endpoint = self
            .endpoint
            .clone()
            .ok_or_else(|| E2eError::DriverStartup("no WebDriver endpoint".to_string()))?;

        let session = BrowserSession::connect(&endpoint, &self.config).await?;
        let result = execute_test(&session, spec, &self.config).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session for {}: {}", spec.name, e);
        }
        Ok(result)
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        let _ = self.stop_driver();
    }
}

/// Run a test's fixture and steps on an open page.
///
/// Steps run once per viewport and stop at the first failure or skip.
/// A failed test gets a screenshot under `<output_dir>/screenshots`.
pub async fn execute_test(page: &dyn Page, spec: &TestSpec, config: &SuiteConfig) -> TestResult {
    let start = Instant::now();
    debug!("Running test: {}", spec.name);

    let mut steps = Vec::new();
    let mut outcome = Outcome::Passed;
    let mut error = None;

    match fixtures::apply(spec.requires, page, config).await {
        Ok(()) => {
            'viewports: for viewport in &spec.viewports {
                if spec.viewports.len() > 1 {
                    debug!("Viewport {}x{}", viewport.width, viewport.height);
                }
                if let Err(e) = page.set_window_size(viewport.width, viewport.height).await {
                    outcome = Outcome::Failed;
                    error = Some(e.to_string());
                    break;
                }

                for step in &spec.steps {
                    let result = execute_step(page, step, config).await;
                    let step_outcome = result.outcome;
                    let step_error = result.error.clone();
                    steps.push(result);

                    if step_outcome != Outcome::Passed {
                        outcome = step_outcome;
                        error = step_error;
                        break 'viewports;
                    }
                }
            }
        }
        Err(E2eError::Skipped(reason)) => {
            outcome = Outcome::Skipped;
            error = Some(reason);
        }
        Err(e) => {
            outcome = Outcome::Failed;
            error = Some(format!("fixture failed: {}", e));
        }
    }

    let screenshot = if outcome == Outcome::Failed {
        capture_failure(page, &spec.name, &config.output_dir).await
    } else {
        None
    };

    TestResult {
        name: spec.name.clone(),
        suite: spec.suite.clone(),
        outcome,
        duration_ms: start.elapsed().as_millis() as u64,
        steps,
        error,
        screenshot,
    }
}

async fn capture_failure(page: &dyn Page, name: &str, output_dir: &Path) -> Option<PathBuf> {
    let dir = output_dir.join("screenshots");
    let path = dir.join(format!("{}.png", file_stem(name)));

    let saved = async {
        let png = page.screenshot().await?;
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&path, png)?;
        Ok::<_, E2eError>(())
    };

    match saved.await {
        Ok(()) => Some(path),
        Err(e) => {
            warn!("Could not capture screenshot for {}: {}", name, e);
            None
        }
    }
}

/// Keep test names from escaping the screenshots directory
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

fn log_result(result: &TestResult) {
    match result.outcome {
        Outcome::Passed => info!("✓ {} ({} ms)", result.name, result.duration_ms),
        Outcome::Skipped => info!(
            "- {} skipped: {}",
            result.name,
            result.error.as_deref().unwrap_or("no reason given")
        ),
        Outcome::Failed => error!(
            "✗ {} - {}",
            result.name,
            result.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Tally results into a suite result
pub fn summarize(
    results: Vec<TestResult>,
    base_url: &str,
    started_at: DateTime<Utc>,
    duration_ms: u64,
) -> TestSuiteResult {
    let count = |o: Outcome| results.iter().filter(|r| r.outcome == o).count();
    let (passed, failed, skipped) = (
        count(Outcome::Passed),
        count(Outcome::Failed),
        count(Outcome::Skipped),
    );

    TestSuiteResult {
        base_url: base_url.to_string(),
        started_at,
        total: results.len(),
        passed,
        failed,
        skipped,
        duration_ms,
        results,
    }
}
