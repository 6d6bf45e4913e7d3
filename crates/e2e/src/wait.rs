//! Wait-until-condition polling

use fantoccini::error::CmdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::page::Page;
use crate::selector::Selector;

/// A DOM or URL state a step can wait for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// At least one matching element is attached
    Present(Selector),
    /// The first matching element is displayed
    Visible(Selector),
    /// The first matching element is displayed and enabled
    Clickable(Selector),
    /// The first matching element is hidden, or nothing matches
    Gone(Selector),
    /// The current URL contains `text`
    UrlContains {
        text: String,
        #[serde(default)]
        ignore_case: bool,
    },
}

impl Condition {
    /// Evaluate the condition once
    pub async fn holds(&self, page: &dyn Page) -> E2eResult<bool> {
        match self {
            Condition::Present(selector) => Ok(!page.query(selector).await?.is_empty()),
            Condition::Visible(selector) => {
                Ok(page.query(selector).await?.first().is_some_and(|e| e.displayed))
            }
            Condition::Clickable(selector) => {
                Ok(page.query(selector).await?.first().is_some_and(|e| e.clickable()))
            }
            Condition::Gone(selector) => {
                Ok(!page.query(selector).await?.first().is_some_and(|e| e.displayed))
            }
            Condition::UrlContains { text, ignore_case } => {
                let url = page.current_url().await?;
                Ok(contains(&url, text, *ignore_case))
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Present(s) => write!(f, "{} to be present", s),
            Condition::Visible(s) => write!(f, "{} to be visible", s),
            Condition::Clickable(s) => write!(f, "{} to be clickable", s),
            Condition::Gone(s) => write!(f, "{} to disappear", s),
            Condition::UrlContains { text, .. } => write!(f, "URL to contain '{}'", text),
        }
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Missing or stale element errors while polling count as "not yet"; the
/// last one is reported on timeout. Any other WebDriver error (invalid
/// selector, lost session) fails immediately.
pub async fn wait_until(
    page: &dyn Page,
    condition: &Condition,
    timeout: Duration,
    poll_interval: Duration,
) -> E2eResult<()> {
    let deadline = Instant::now() + timeout;
    let mut last_error: Option<String> = None;

    loop {
        match condition.holds(page).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(E2eError::WebDriver(e)) if is_transient(&e) => {
                debug!("Polling {} hit {}", condition, e);
                last_error = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        sleep(poll_interval.min(deadline - now)).await;
    }

    let condition = match last_error {
        Some(err) => format!("{} (last error: {})", condition, err),
        None => condition.to_string(),
    };
    Err(E2eError::Timeout {
        condition,
        timeout_ms: timeout.as_millis() as u64,
    })
}

fn is_transient(error: &CmdError) -> bool {
    error.is_no_such_element() || error.is_stale_element_reference()
}

pub(crate) fn contains(haystack: &str, needle: &str, ignore_case: bool) -> bool {
    if ignore_case {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    } else {
        haystack.contains(needle)
    }
}
