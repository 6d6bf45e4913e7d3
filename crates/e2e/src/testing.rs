//! In-memory `Page` used by unit tests

use async_trait::async_trait;
use fantoccini::error::CmdError;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{E2eError, E2eResult};
use crate::page::{ElementState, Page};
use crate::selector::Selector;

/// What the fake browser renders for one URL
#[derive(Debug, Clone, Default)]
pub struct FakeScreen {
    source: String,
    elements: HashMap<String, Vec<ElementState>>,
}

impl FakeScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: &str) -> Self {
        self.source.push_str(text);
        self.source.push('\n');
        self
    }

    pub fn element(mut self, selector: &Selector, state: ElementState) -> Self {
        self.elements.entry(selector.to_string()).or_default().push(state);
        self
    }

    pub fn shown(self, selector: &Selector) -> Self {
        self.element(selector, ElementState { displayed: true, enabled: true })
    }
}

#[derive(Default)]
struct FakeState {
    routes: HashMap<String, FakeScreen>,
    redirects: HashMap<String, String>,
    clicks: HashMap<String, String>,
    keys: HashMap<String, String>,
    scripts: HashMap<String, serde_json::Value>,
    query_faults: Option<(usize, fn() -> CmdError)>,
    query_calls: usize,
    current_url: String,
    screen: FakeScreen,
    visits: Vec<String>,
    typed: Vec<String>,
    window: Option<(u32, u32)>,
}

/// Scripted browser: routes map URLs to screens, clicks and key presses
/// can navigate.
#[derive(Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, screen: FakeScreen) -> Self {
        self.state.lock().unwrap().routes.insert(url.to_string(), screen);
        self
    }

    pub fn redirect(self, from: &str, to: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .redirects
            .insert(from.to_string(), to.to_string());
        self
    }

    /// Clicking `selector` navigates to `url`
    pub fn on_click(self, selector: &Selector, url: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .clicks
            .insert(selector.to_string(), url.to_string());
        self
    }

    /// Typing into `selector` navigates to `url`
    pub fn on_keys(self, selector: &Selector, url: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .keys
            .insert(selector.to_string(), url.to_string());
        self
    }

    pub fn script(self, script: &str, value: serde_json::Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(script.to_string(), value);
        self
    }

    /// The next `times` queries fail with `fault`
    pub fn failing_queries(self, times: usize, fault: fn() -> CmdError) -> Self {
        self.state.lock().unwrap().query_faults = Some((times, fault));
        self
    }

    pub fn query_calls(&self) -> usize {
        self.state.lock().unwrap().query_calls
    }

    pub fn visits(&self) -> Vec<String> {
        self.state.lock().unwrap().visits.clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn window(&self) -> Option<(u32, u32)> {
        self.state.lock().unwrap().window
    }

    fn navigate(state: &mut FakeState, url: &str) {
        let target = state
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        state.visits.push(target.clone());
        state.screen = state.routes.get(&target).cloned().unwrap_or_default();
        state.current_url = target;
    }

    fn require(state: &FakeState, selector: &Selector) -> E2eResult<()> {
        if state.screen.elements.contains_key(&selector.to_string()) {
            Ok(())
        } else {
            Err(E2eError::AssertionFailed(format!("no such element: {}", selector)))
        }
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::navigate(&mut state, url);
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self.state.lock().unwrap().current_url.clone())
    }

    async fn source(&self) -> E2eResult<String> {
        Ok(self.state.lock().unwrap().screen.source.clone())
    }

    async fn query(&self, selector: &Selector) -> E2eResult<Vec<ElementState>> {
        let mut state = self.state.lock().unwrap();
        state.query_calls += 1;
        if let Some((remaining, fault)) = state.query_faults.as_mut() {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(E2eError::WebDriver((*fault)()));
            }
        }
        Ok(state
            .screen
            .elements
            .get(&selector.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn click(&self, selector: &Selector) -> E2eResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::require(&state, selector)?;
        if let Some(url) = state.clicks.get(&selector.to_string()).cloned() {
            Self::navigate(&mut state, &url);
        }
        Ok(())
    }

    async fn clear(&self, selector: &Selector) -> E2eResult<()> {
        let state = self.state.lock().unwrap();
        Self::require(&state, selector)
    }

    async fn send_keys(&self, selector: Option<&Selector>, text: &str) -> E2eResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(selector) = selector {
            Self::require(&state, selector)?;
        }
        state.typed.push(text.to_string());
        if let Some(selector) = selector {
            if let Some(url) = state.keys.get(&selector.to_string()).cloned() {
                Self::navigate(&mut state, &url);
            }
        }
        Ok(())
    }

    async fn set_window_size(&self, width: u32, height: u32) -> E2eResult<()> {
        self.state.lock().unwrap().window = Some((width, height));
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> E2eResult<serde_json::Value> {
        let state = self.state.lock().unwrap();
        Ok(state
            .scripts
            .get(script)
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        Ok(b"\x89PNG fake".to_vec())
    }
}
