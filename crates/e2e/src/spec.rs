//! Declarative YAML test suites

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::{E2eError, E2eResult};
use crate::selector::Selector;
use crate::wait::Condition;

/// A suite file: one feature area and its tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    /// Suite name, e.g. `authentication`
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags applied to every test in the suite
    #[serde(default)]
    pub tags: Vec<String>,

    pub tests: Vec<TestSpec>,
}

/// A single browser test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Suite this test belongs to (filled in when loaded)
    #[serde(default)]
    pub suite: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Fixture the test needs before its first step
    #[serde(default)]
    pub requires: Requires,

    /// The steps run once per viewport
    #[serde(default = "default_viewports")]
    pub viewports: Vec<Viewport>,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

fn default_viewports() -> Vec<Viewport> {
    vec![Viewport { width: 1280, height: 720 }]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Per-test fixture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requires {
    /// A fresh anonymous browser session
    #[default]
    None,
    /// A session logged in with the configured test account
    Authenticated,
}

/// A single step in a test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a route (relative to the base URL)
    Navigate {
        path: String,
    },

    /// Click an element
    Click {
        selector: Selector,
    },

    /// Type into an input field
    Fill {
        selector: Selector,
        value: String,
        #[serde(default)]
        clear_first: bool,
    },

    /// Press a key, on an element or the focused one
    Press {
        #[serde(default)]
        selector: Option<Selector>,
        key: KeyName,
    },

    /// Wait until a condition holds
    WaitFor {
        condition: Condition,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep {
        ms: u64,
    },

    /// Assert a check holds now
    Assert {
        check: Check,
    },

    /// Assert at least one of several checks holds
    AssertAny {
        any_of: Vec<Check>,
    },

    /// Skip the rest of the test when the check holds
    SkipIf {
        check: Check,
        reason: String,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },
}

/// Point-in-time assertion about the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Present(Selector),
    Visible(Selector),
    CountAtLeast {
        selector: Selector,
        min: usize,
    },
    PageContains {
        text: String,
        #[serde(default)]
        ignore_case: bool,
    },
    UrlContains {
        text: String,
        #[serde(default)]
        ignore_case: bool,
    },
    /// Document width stays within the viewport width plus tolerance
    NoHorizontalOverflow {
        #[serde(default = "default_overflow_tolerance")]
        tolerance_px: i64,
    },
}

fn default_overflow_tolerance() -> i64 {
    10
}

/// Keys a step can press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyName {
    Enter,
    Tab,
    Escape,
}

impl KeyName {
    /// WebDriver key code for this key
    pub fn as_text(&self) -> String {
        use fantoccini::key::Key;

        let key = match self {
            KeyName::Enter => Key::Enter,
            KeyName::Tab => Key::Tab,
            KeyName::Escape => Key::Escape,
        };
        char::from(key).to_string()
    }
}

impl TestStep {
    /// Short name used in results and logs
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { path } => format!("navigate:{}", path),
            TestStep::Click { selector } => format!("click:{}", selector),
            TestStep::Fill { selector, .. } => format!("fill:{}", selector),
            TestStep::Press { key, .. } => format!("press:{:?}", key).to_lowercase(),
            TestStep::WaitFor { condition, .. } => format!("wait:{}", condition),
            TestStep::Sleep { ms } => format!("sleep:{}ms", ms),
            TestStep::Assert { check } => format!("assert:{:?}", check),
            TestStep::AssertAny { any_of } => format!("assert_any:{} checks", any_of.len()),
            TestStep::SkipIf { reason, .. } => format!("skip_if:{}", reason),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }
}

/// Variables substituted into suite text as `${name}`
pub type Vars = BTreeMap<String, String>;

/// Replace every `${name}` in `text`. Unknown names are an error.
pub fn interpolate(text: &str, vars: &Vars) -> E2eResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| E2eError::SpecParse("unterminated '${' in suite".to_string()))?;
        let name = &after[..end];
        let value = vars
            .get(name)
            .ok_or_else(|| E2eError::SpecParse(format!("unknown variable '${{{}}}'", name)))?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

impl Suite {
    /// Parse a suite from YAML, substituting variables first
    pub fn from_yaml(yaml: &str, vars: &Vars) -> E2eResult<Self> {
        let rendered = interpolate(yaml, vars)?;
        let mut suite: Suite = serde_yaml::from_str(&rendered)?;
        suite.normalize()?;
        Ok(suite)
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path, vars: &Vars) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content, vars)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all suites from a directory, sorted by file name
    pub fn load_all(dir: &Path, vars: &Vars) -> E2eResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(E2eError::SpecParse(format!(
                "specs directory not found: {}",
                dir.display()
            )));
        }

        let mut suites = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            suites.push(Self::from_file(entry.path(), vars)?);
        }

        Ok(suites)
    }

    /// Stamp suite name and tags onto each test and check its shape
    fn normalize(&mut self) -> E2eResult<()> {
        for test in &mut self.tests {
            test.suite = self.name.clone();
            for tag in &self.tags {
                if !test.tags.contains(tag) {
                    test.tags.push(tag.clone());
                }
            }
            if test.steps.is_empty() {
                return Err(E2eError::SpecParse(format!("test '{}' has no steps", test.name)));
            }
            if test.viewports.is_empty() {
                return Err(E2eError::SpecParse(format!("test '{}' has no viewports", test.name)));
            }
        }
        Ok(())
    }
}

/// Flatten suites into tests, rejecting duplicate test names
pub fn flatten(suites: Vec<Suite>) -> E2eResult<Vec<TestSpec>> {
    let mut seen = HashSet::new();
    let mut tests = Vec::new();

    for suite in suites {
        for test in suite.tests {
            if !seen.insert(test.name.clone()) {
                return Err(E2eError::SpecParse(format!(
                    "duplicate test name '{}' (suite '{}')",
                    test.name, test.suite
                )));
            }
            tests.push(test);
        }
    }
    Ok(tests)
}

impl TestSpec {
    /// Filter specs by tag or suite name
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs
            .iter()
            .filter(|s| s.suite == tag || s.tags.iter().any(|t| t == tag))
            .collect()
    }
}
