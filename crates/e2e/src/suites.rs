//! Built-in suites, one per feature area of the dashboard

use crate::error::{E2eError, E2eResult};
use crate::spec::{Suite, Vars};

/// Suite sources compiled into the binary, in run order
pub const BUILTIN: &[(&str, &str)] = &[
    ("authentication.yaml", include_str!("../specs/authentication.yaml")),
    ("dashboard.yaml", include_str!("../specs/dashboard.yaml")),
    ("event_crud.yaml", include_str!("../specs/event_crud.yaml")),
    ("ai_features.yaml", include_str!("../specs/ai_features.yaml")),
    ("integration.yaml", include_str!("../specs/integration.yaml")),
];

/// Parse the built-in suites
pub fn builtin(vars: &Vars) -> E2eResult<Vec<Suite>> {
    BUILTIN
        .iter()
        .map(|(file, yaml)| {
            Suite::from_yaml(yaml, vars).map_err(|e| E2eError::SpecParse(format!("{}: {}", file, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, SuiteConfig, TimeoutConfig};
    use crate::runner::execute_test;
    use crate::selector::Selector;
    use crate::spec::{flatten, Requires, TestSpec, TestStep};
    use crate::steps::Outcome;
    use crate::testing::{FakePage, FakeScreen};

    fn load() -> Vec<TestSpec> {
        let mut vars = Vars::new();
        vars.insert("run_id".to_string(), "20260101000000".to_string());
        vars.insert("base_url".to_string(), "http://localhost:3000".to_string());
        flatten(builtin(&vars).unwrap()).unwrap()
    }

    fn find<'a>(tests: &'a [TestSpec], name: &str) -> &'a TestSpec {
        tests
            .iter()
            .find(|t| t.name == name)
            .unwrap_or_else(|| panic!("missing test {}", name))
    }

    #[test]
    fn test_every_feature_area_present() {
        let tests = load();
        for suite in ["authentication", "dashboard", "event_crud", "ai_features", "integration"] {
            assert!(
                tests.iter().any(|t| t.suite == suite),
                "suite {} has no tests",
                suite
            );
        }
    }

    #[test]
    fn test_anonymous_tests_need_no_login() {
        let tests = load();
        for name in [
            "login_page_loads",
            "signup_page_loads",
            "navigation_between_login_signup",
            "google_oauth_button_present",
            "dashboard_redirects_when_not_authenticated",
            "search_and_filter_workflow",
            "responsive_design",
        ] {
            assert_eq!(find(&tests, name).requires, Requires::None, "{}", name);
        }
    }

    #[test]
    fn test_dashboard_features_require_login() {
        let tests = load();
        for name in [
            "dashboard_elements_present",
            "search_functionality",
            "filter_by_sport",
            "create_event_page_loads",
            "event_form_validation",
            "venue_multi_input",
            "ai_event_creator_button_present",
            "ai_event_creator_dialog_opens",
            "ai_suggestions_button_in_form",
            "ai_generate_button_in_form",
            "complete_event_lifecycle",
        ] {
            assert_eq!(find(&tests, name).requires, Requires::Authenticated, "{}", name);
        }
    }

    #[test]
    fn test_responsive_design_covers_three_viewports() {
        let tests = load();
        let widths: Vec<u32> = find(&tests, "responsive_design")
            .viewports
            .iter()
            .map(|v| v.width)
            .collect();
        assert_eq!(widths, vec![375, 768, 1920]);
    }

    #[test]
    fn test_run_id_reaches_lifecycle_names() {
        let tests = load();
        let names: Vec<&str> = find(&tests, "complete_event_lifecycle")
            .steps
            .iter()
            .filter_map(|step| match step {
                TestStep::Fill { selector, value, .. } if *selector == Selector::name("name") => {
                    Some(value.as_str())
                }
                _ => None,
            })
            .collect();
        assert!(!names.is_empty());
        assert!(names.iter().all(|n| n.contains("20260101000000")), "{:?}", names);
        assert!(names.contains(&"E2E Lifecycle 20260101000000"));

        let lifecycle = serde_json::to_string(find(&tests, "complete_event_lifecycle")).unwrap();
        assert!(!lifecycle.contains("${"));
    }

    fn config(output_dir: &std::path::Path) -> SuiteConfig {
        SuiteConfig {
            base_url: "http://app".to_string(),
            output_dir: output_dir.to_path_buf(),
            timeouts: TimeoutConfig {
                wait_ms: 40,
                poll_interval_ms: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_builtin_redirect_check_passes() {
        let dir = tempfile::tempdir().unwrap();
        let tests = load();
        let page = FakePage::new().redirect("http://app/dashboard", "http://app/login");

        let spec = find(&tests, "dashboard_redirects_when_not_authenticated");
        let result = execute_test(&page, spec, &config(dir.path())).await;
        assert_eq!(result.outcome, Outcome::Passed, "{:?}", result.error);
        assert_eq!(page.visits(), vec!["http://app/login"]);
    }

    #[tokio::test]
    async fn test_builtin_workflow_skips_on_login_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let tests = load();
        let page = FakePage::new().redirect("http://app/dashboard", "http://app/login");

        let spec = find(&tests, "search_and_filter_workflow");
        let result = execute_test(&page, spec, &config(dir.path())).await;
        assert_eq!(result.outcome, Outcome::Skipped);
        assert_eq!(result.error.as_deref(), Some("Authentication required"));
        assert!(result.screenshot.is_none());
        assert!(page.typed().is_empty());
    }

    #[tokio::test]
    async fn test_builtin_search_submits_query() {
        let dir = tempfile::tempdir().unwrap();
        let tests = load();
        let search = Selector::css("input[placeholder*='Search events']");
        let page = FakePage::new()
            .route(
                "http://app/login",
                FakeScreen::new()
                    .shown(&Selector::name("email"))
                    .shown(&Selector::name("password"))
                    .shown(&Selector::button_text("Sign In")),
            )
            .route("http://app/dashboard", FakeScreen::new().shown(&search))
            .route(
                "http://app/dashboard?search=test+event",
                FakeScreen::new().shown(&search),
            )
            .on_click(&Selector::button_text("Sign In"), "http://app/dashboard")
            .on_keys(&search, "http://app/dashboard?search=test+event");

        let mut config = config(dir.path());
        config.credentials = Credentials::from_parts(Some("qa@x.io".into()), Some("pw".into()));

        let spec = find(&tests, "search_functionality");
        let result = execute_test(&page, spec, &config).await;
        assert_eq!(result.outcome, Outcome::Passed, "{:?}", result.error);
        assert_eq!(page.typed(), vec!["qa@x.io", "pw", "test event", "\u{e007}"]);
    }
}
