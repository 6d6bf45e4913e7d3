//! Element selector strategies

use fantoccini::Locator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a step locates an element on the page.
///
/// In YAML a selector is a single-key map, e.g. `{ name: email }`,
/// `{ css: "button[role='combobox']" }` or `{ button_text: Sign In }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Form control by its `name` attribute
    Name(String),
    /// CSS selector
    Css(String),
    /// Anchor by its exact visible text
    LinkText(String),
    /// Raw XPath expression
    Xpath(String),
    /// `<button>` whose text contains the given string
    ButtonText(String),
    /// Any element of `tag` whose text contains `text`
    Text { tag: String, text: String },
}

/// Query form understood by WebDriver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Css(String),
    LinkText(String),
    XPath(String),
}

impl Query {
    pub fn locator(&self) -> Locator<'_> {
        match self {
            Query::Css(css) => Locator::Css(css),
            Query::LinkText(text) => Locator::LinkText(text),
            Query::XPath(xpath) => Locator::XPath(xpath),
        }
    }
}

impl Selector {
    pub fn css(css: impl Into<String>) -> Self {
        Selector::Css(css.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Selector::Name(name.into())
    }

    pub fn button_text(text: impl Into<String>) -> Self {
        Selector::ButtonText(text.into())
    }

    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Selector::Text {
            tag: tag.into(),
            text: text.into(),
        }
    }

    /// Compile into the query sent over WebDriver
    pub fn query(&self) -> Query {
        match self {
            Selector::Name(name) => Query::Css(format!("[name=\"{}\"]", name.replace('"', "\\\""))),
            Selector::Css(css) => Query::Css(css.clone()),
            Selector::LinkText(text) => Query::LinkText(text.clone()),
            Selector::Xpath(xpath) => Query::XPath(xpath.clone()),
            Selector::ButtonText(text) => Query::XPath(text_xpath("button", text)),
            Selector::Text { tag, text } => Query::XPath(text_xpath(tag, text)),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => write!(f, "name={}", name),
            Selector::Css(css) => write!(f, "css={}", css),
            Selector::LinkText(text) => write!(f, "link='{}'", text),
            Selector::Xpath(xpath) => write!(f, "xpath={}", xpath),
            Selector::ButtonText(text) => write!(f, "button '{}'", text),
            Selector::Text { tag, text } => write!(f, "<{}> '{}'", tag, text),
        }
    }
}

fn text_xpath(tag: &str, text: &str) -> String {
    format!("//{}[contains(text(), {})]", tag, xpath_literal(text))
}

/// Quote a string as an XPath 1.0 literal.
///
/// XPath has no escape sequences, so a value holding both quote kinds
/// is split and rebuilt with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
