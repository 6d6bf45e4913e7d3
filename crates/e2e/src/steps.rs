//! Step execution against a `Page`

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};
use crate::page::Page;
use crate::spec::{Check, TestStep};
use crate::wait::{contains, wait_until};

pub const SCROLL_WIDTH_SCRIPT: &str = "return document.body.scrollWidth";
pub const INNER_WIDTH_SCRIPT: &str = "return window.innerWidth";

/// Outcome of a step or test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Execute a single step, folding its error into the result
pub async fn execute_step(page: &dyn Page, step: &TestStep, config: &SuiteConfig) -> StepResult {
    let start = Instant::now();
    let step_name = step.name();

    debug!("Executing step: {}", step_name);

    let result = run_step(page, step, config).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => StepResult {
            step_name,
            outcome: Outcome::Passed,
            duration_ms,
            error: None,
        },
        Err(E2eError::Skipped(reason)) => StepResult {
            step_name,
            outcome: Outcome::Skipped,
            duration_ms,
            error: Some(reason),
        },
        Err(e) => StepResult {
            step_name,
            outcome: Outcome::Failed,
            duration_ms,
            error: Some(e.to_string()),
        },
    }
}

async fn run_step(page: &dyn Page, step: &TestStep, config: &SuiteConfig) -> E2eResult<()> {
    match step {
        TestStep::Navigate { path } => page.goto(&config.url_for(path)).await,
        TestStep::Click { selector } => page.click(selector).await,
        TestStep::Fill { selector, value, clear_first } => {
            if *clear_first {
                page.clear(selector).await?;
            }
            page.send_keys(Some(selector), value).await
        }
        TestStep::Press { selector, key } => page.send_keys(selector.as_ref(), &key.as_text()).await,
        TestStep::WaitFor { condition, timeout_ms } => {
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.timeouts.wait());
            wait_until(page, condition, timeout, config.timeouts.poll_interval()).await
        }
        TestStep::Sleep { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            Ok(())
        }
        TestStep::Assert { check } => match evaluate(page, check).await? {
            None => Ok(()),
            Some(failure) => Err(E2eError::AssertionFailed(failure)),
        },
        TestStep::AssertAny { any_of } => {
            let mut failures = Vec::with_capacity(any_of.len());
            for check in any_of {
                match evaluate(page, check).await? {
                    None => return Ok(()),
                    Some(failure) => failures.push(failure),
                }
            }
            Err(E2eError::AssertionFailed(format!(
                "none of {} checks held: {}",
                any_of.len(),
                failures.join("; ")
            )))
        }
        TestStep::SkipIf { check, reason } => match evaluate(page, check).await? {
            None => Err(E2eError::Skipped(reason.clone())),
            Some(_) => Ok(()),
        },
        TestStep::Log { message } => {
            info!("[TEST LOG] {}", message);
            Ok(())
        }
    }
}

/// Evaluate a check once. `None` means it holds, otherwise the failure.
pub async fn evaluate(page: &dyn Page, check: &Check) -> E2eResult<Option<String>> {
    let failure = match check {
        Check::Present(selector) => page
            .query(selector)
            .await?
            .is_empty()
            .then(|| format!("{} is not present", selector)),
        // First match only, like a single element lookup
        Check::Visible(selector) => match page.query(selector).await?.first() {
            None => Some(format!("{} is not present", selector)),
            Some(element) if !element.displayed => Some(format!("{} is not displayed", selector)),
            Some(_) => None,
        },
        Check::CountAtLeast { selector, min } => {
            let count = page.query(selector).await?.len();
            (count < *min).then(|| format!("{} matched {} element(s), expected at least {}", selector, count, min))
        }
        Check::PageContains { text, ignore_case } => {
            let source = page.source().await?;
            (!contains(&source, text, *ignore_case)).then(|| format!("page does not contain '{}'", text))
        }
        Check::UrlContains { text, ignore_case } => {
            let url = page.current_url().await?;
            (!contains(&url, text, *ignore_case)).then(|| format!("URL '{}' does not contain '{}'", url, text))
        }
        Check::NoHorizontalOverflow { tolerance_px } => {
            let body = script_int(page, SCROLL_WIDTH_SCRIPT).await?;
            let viewport = script_int(page, INNER_WIDTH_SCRIPT).await?;
            (body > viewport + tolerance_px).then(|| {
                format!(
                    "page is {}px wide in a {}px viewport (tolerance {}px)",
                    body, viewport, tolerance_px
                )
            })
        }
    };
    Ok(failure)
}

async fn script_int(page: &dyn Page, script: &str) -> E2eResult<i64> {
    let value = page.evaluate(script).await?;
    value.as_i64().ok_or_else(|| E2eError::StepFailed {
        step: script.to_string(),
        reason: format!("expected an integer, got {}", value),
    })
}
