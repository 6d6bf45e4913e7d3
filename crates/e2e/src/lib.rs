//! Fastbreak Events E2E Test Framework
//!
//! This crate drives a real browser against the Fastbreak Events dashboard:
//! - Spawns chromedriver (or attaches to a running WebDriver)
//! - Opens one fresh browser session per test
//! - Parses declarative YAML suites, one per feature area
//! - Reports pass/fail/skip as JSON, HTML and a console table
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_driver() -> DriverService | WebDriver URL      │
//! │    ├── check_app() -> base URL answers                      │
//! │    ├── run_spec(spec) -> BrowserSession -> TestResult       │
//! │    └── write_results() / report::write_html()               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Suite (YAML)                                               │
//! │    ├── name, description, tags                              │
//! │    └── tests: [TestSpec]                                    │
//! │          ├── requires: none | authenticated                 │
//! │          ├── viewports: [{ width, height }]                 │
//! │          └── steps:                                         │
//! │                ├── navigate { path }                        │
//! │                ├── click / fill / press { selector }        │
//! │                ├── wait_for { condition, timeout_ms? }      │
//! │                ├── assert { check } / assert_any { any_of } │
//! │                └── skip_if { check, reason }                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod fixtures;
pub mod page;
pub mod report;
pub mod runner;
pub mod selector;
pub mod spec;
pub mod steps;
pub mod suites;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SuiteConfig;
pub use error::{E2eError, E2eResult};
pub use page::{BrowserSession, Page};
pub use runner::{TestRunner, TestSuiteResult};
pub use selector::Selector;
pub use spec::{Suite, TestSpec, TestStep};
pub use steps::Outcome;
