//! Per-test fixtures

use tracing::{debug, info};

use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};
use crate::page::Page;
use crate::selector::Selector;
use crate::spec::Requires;
use crate::wait::{wait_until, Condition};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Prepare the session for a test. Returns `E2eError::Skipped` when the
/// fixture's preconditions cannot be met.
pub async fn apply(requires: Requires, page: &dyn Page, config: &SuiteConfig) -> E2eResult<()> {
    match requires {
        Requires::None => Ok(()),
        Requires::Authenticated => authenticate(page, config).await,
    }
}

/// Log in through the login form with the configured test account
pub async fn authenticate(page: &dyn Page, config: &SuiteConfig) -> E2eResult<()> {
    let Some(credentials) = &config.credentials else {
        return Err(E2eError::Skipped(
            "Authentication required (set E2E_EMAIL and E2E_PASSWORD)".to_string(),
        ));
    };

    let timeout = config.timeouts.wait();
    let poll = config.timeouts.poll_interval();

    debug!("Logging in as {}", credentials.email);
    page.goto(&config.url_for(LOGIN_PATH)).await?;

    let email = Selector::name("email");
    let password = Selector::name("password");
    let submit = Selector::button_text("Sign In");

    wait_until(page, &Condition::Present(email.clone()), timeout, poll).await?;
    page.clear(&email).await?;
    page.send_keys(Some(&email), &credentials.email).await?;
    page.clear(&password).await?;
    page.send_keys(Some(&password), &credentials.password).await?;

    wait_until(page, &Condition::Clickable(submit.clone()), timeout, poll).await?;
    page.click(&submit).await?;

    let reached_dashboard = Condition::UrlContains {
        text: DASHBOARD_PATH.to_string(),
        ignore_case: false,
    };
    match wait_until(page, &reached_dashboard, timeout, poll).await {
        Ok(()) => {
            info!("Authenticated as {}", credentials.email);
            Ok(())
        }
        Err(E2eError::Timeout { .. }) => Err(E2eError::Skipped(format!(
            "Authentication failed: login as {} did not reach {}",
            credentials.email, DASHBOARD_PATH
        ))),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, TimeoutConfig};
    use crate::testing::{FakePage, FakeScreen};

    fn config(credentials: Option<Credentials>) -> SuiteConfig {
        SuiteConfig {
            base_url: "http://app".to_string(),
            credentials,
            timeouts: TimeoutConfig {
                wait_ms: 50,
                poll_interval_ms: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn login_page() -> FakeScreen {
        FakeScreen::new()
            .text("Welcome back")
            .shown(&Selector::name("email"))
            .shown(&Selector::name("password"))
            .shown(&Selector::button_text("Sign In"))
    }

    fn creds() -> Option<Credentials> {
        Credentials::from_parts(Some("qa@fastbreak.test".into()), Some("hunter2".into()))
    }

    #[tokio::test]
    async fn test_skips_without_credentials() {
        let page = FakePage::new();
        let err = apply(Requires::Authenticated, &page, &config(None)).await.unwrap_err();
        assert!(err.is_skip());
        assert!(page.visits().is_empty());
    }

    #[tokio::test]
    async fn test_no_fixture_is_noop() {
        let page = FakePage::new();
        apply(Requires::None, &page, &config(None)).await.unwrap();
        assert!(page.visits().is_empty());
    }

    #[tokio::test]
    async fn test_logs_in_through_form() {
        let page = FakePage::new()
            .route("http://app/login", login_page())
            .route("http://app/dashboard", FakeScreen::new().text("Events Dashboard"))
            .on_click(&Selector::button_text("Sign In"), "http://app/dashboard");

        authenticate(&page, &config(creds())).await.unwrap();
        assert_eq!(page.typed(), vec!["qa@fastbreak.test", "hunter2"]);
        assert_eq!(page.current_url().await.unwrap(), "http://app/dashboard");
    }

    #[tokio::test]
    async fn test_rejected_login_skips() {
        let page = FakePage::new().route("http://app/login", login_page());

        let err = authenticate(&page, &config(creds())).await.unwrap_err();
        assert!(matches!(err, E2eError::Skipped(ref reason) if reason.contains("did not reach")));
    }
}
