//! Locators: a lookup strategy paired with a selector string.
//!
//! Fields declare a [`LocatorSpec`] whose strategy may be left open. Binding a
//! page object resolves every open strategy through the precedence chain
//! field-level -> container-level -> global default, so a [`Locator`] always
//! carries a concrete [`Strategy`] by the time it reaches the driver.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::result::{PageError, PageResult};

/// System-wide fallback strategy
pub const DEFAULT_STRATEGY: Strategy = Strategy::Id;

/// Element lookup strategy (W3C WebDriver names plus the legacy Selenium ones)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `id` attribute
    Id,
    /// `name` attribute
    Name,
    /// Single class name
    ClassName,
    /// CSS selector
    Css,
    /// Exact anchor text
    LinkText,
    /// Anchor text substring
    PartialLinkText,
    /// Tag name
    TagName,
    /// XPath expression
    XPath,
}

impl Strategy {
    /// Wire name of the strategy
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::ClassName => "class name",
            Self::Css => "css selector",
            Self::LinkText => "link text",
            Self::PartialLinkText => "partial link text",
            Self::TagName => "tag name",
            Self::XPath => "xpath",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        DEFAULT_STRATEGY
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the first strategy that is set, left to right.
///
/// `global_default` is mandatory, so resolution never fails.
#[must_use]
pub fn resolve_strategy(
    explicit: Option<Strategy>,
    field_default: Option<Strategy>,
    container_default: Option<Strategy>,
    global_default: Strategy,
) -> Strategy {
    explicit
        .or(field_default)
        .or(container_default)
        .unwrap_or(global_default)
}

/// A locator as declared on a field, before its strategy is bound
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocatorSpec {
    strategy: Option<Strategy>,
    selector: String,
}

impl LocatorSpec {
    /// Selector with the strategy left to the field/container/global defaults
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            strategy: None,
            selector: selector.into(),
        }
    }

    /// Selector with an explicit strategy
    #[must_use]
    pub fn with_strategy(strategy: Strategy, selector: impl Into<String>) -> Self {
        Self {
            strategy: Some(strategy),
            selector: selector.into(),
        }
    }

    /// Explicit strategy, if any
    #[must_use]
    pub const fn strategy(&self) -> Option<Strategy> {
        self.strategy
    }

    /// Raw selector (may be a template)
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Resolve the strategy and produce a bound [`Locator`].
    pub fn bind(
        &self,
        field_default: Option<Strategy>,
        container_default: Option<Strategy>,
        global_default: Strategy,
    ) -> PageResult<Locator> {
        if self.selector.trim().is_empty() {
            return Err(PageError::invalid("locator selector must not be empty"));
        }
        Ok(Locator {
            strategy: resolve_strategy(
                self.strategy,
                field_default,
                container_default,
                global_default,
            ),
            selector: self.selector.clone(),
        })
    }
}

impl From<&str> for LocatorSpec {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

impl From<String> for LocatorSpec {
    fn from(selector: String) -> Self {
        Self::new(selector)
    }
}

impl From<Locator> for LocatorSpec {
    fn from(locator: Locator) -> Self {
        Self {
            strategy: Some(locator.strategy),
            selector: locator.selector,
        }
    }
}

/// Immutable (strategy, selector) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    strategy: Strategy,
    selector: String,
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{(\d*)\}").expect("placeholder pattern is valid")
    })
}

impl Locator {
    /// Create a locator
    #[must_use]
    pub fn new(strategy: Strategy, selector: impl Into<String>) -> Self {
        Self {
            strategy,
            selector: selector.into(),
        }
    }

    /// CSS selector locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Css, selector)
    }

    /// `id` locator
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::new(Strategy::Id, id)
    }

    /// `name` locator
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::new(Strategy::Name, name)
    }

    /// Tag name locator
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::new(Strategy::TagName, tag)
    }

    /// XPath locator
    #[must_use]
    pub fn xpath(path: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, path)
    }

    /// Link text locator
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, text)
    }

    /// Get the strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Get the selector
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Whether the selector contains `{}` / `{N}` placeholders
    #[must_use]
    pub fn is_template(&self) -> bool {
        placeholder_pattern()
            .captures_iter(&self.selector)
            .any(|caps| caps.get(1).is_some())
    }

    /// Fill the selector's placeholders and return a fresh locator.
    ///
    /// `{}` consumes parameters left to right; `{N}` picks parameter `N`.
    /// `{{` and `}}` stand for literal braces.
    pub fn solidify<S: AsRef<str>>(&self, params: &[S]) -> PageResult<Self> {
        let mut next = 0usize;
        let mut missing: Option<usize> = None;
        let selector = placeholder_pattern().replace_all(&self.selector, |caps: &Captures<'_>| {
            let Some(placeholder) = caps.get(1) else {
                return if &caps[0] == "{{" { "{" } else { "}" }.to_string();
            };
            let index = match placeholder.as_str() {
                "" => {
                    next += 1;
                    next - 1
                }
                digits => digits.parse().unwrap_or(usize::MAX),
            };
            match params.get(index) {
                Some(param) => param.as_ref().to_string(),
                None => {
                    let _ = missing.get_or_insert(index);
                    String::new()
                }
            }
        });

        if let Some(index) = missing {
            return Err(PageError::invalid(format!(
                "template {self} needs parameter {index}, got {}",
                params.len()
            )));
        }
        if selector.trim().is_empty() {
            return Err(PageError::invalid(format!(
                "template {self} solidified to an empty selector"
            )));
        }
        Ok(Self {
            strategy: self.strategy,
            selector: selector.into_owned(),
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.selector)
    }
}
