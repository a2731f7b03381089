//! Page Object Model
//!
//! A [`PageObject`] is the typed accessor table of one page or component
//! type: its named fields plus the defaults they fall back to. Objects are
//! assembled once with [`PageObjectBuilder`], shared behind an `Arc`, and
//! instantiated against a live driver by [`crate::PageContext`].
//!
//! ```ignore
//! let login = PageObjectBuilder::new("login")
//!     .with_url_pattern("/login")
//!     .with_default_strategy(Strategy::Css)
//!     .with_field("email", FieldSpec::single("input[name=email]").value_only())
//!     .with_field("submit", FieldSpec::single("button[type=submit]"))
//!     .build()?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PageConfig;
use crate::context::PageContext;
use crate::field::{Field, FieldSpec};
use crate::locator::{Strategy, DEFAULT_STRATEGY};
use crate::result::{PageError, PageResult};

/// Hook run right after a transition lands on a page
pub type EnterHook = Arc<dyn Fn(&PageContext) -> PageResult<()> + Send + Sync>;

// =============================================================================
// PAGE OBJECT
// =============================================================================

/// Named fields of a page or component, with their shared defaults
pub struct PageObject {
    name: String,
    url: Option<UrlMatcher>,
    default_strategy: Option<Strategy>,
    timeout: Option<Duration>,
    fields: HashMap<String, Field>,
    on_enter: Option<EnterHook>,
}

impl fmt::Debug for PageObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageObject")
            .field("name", &self.name)
            .field("url", &self.url.as_ref().map(UrlMatcher::pattern))
            .field("default_strategy", &self.default_strategy)
            .field("timeout", &self.timeout)
            .field("fields", &self.field_names())
            .finish_non_exhaustive()
    }
}

impl PageObject {
    /// Field-less object, used to scope table rows without a row component
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            url: None,
            default_strategy: None,
            timeout: None,
            fields: HashMap::new(),
            on_enter: None,
        })
    }

    /// Page name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL pattern, if any
    #[must_use]
    pub fn url_pattern(&self) -> Option<&str> {
        self.url.as_ref().map(UrlMatcher::pattern)
    }

    /// Whether `url` matches the page's pattern (`false` without one)
    #[must_use]
    pub fn matches_url(&self, url: &str) -> bool {
        self.url.as_ref().is_some_and(|m| m.matches(url))
    }

    /// Container-level default strategy
    #[must_use]
    pub const fn default_strategy(&self) -> Option<Strategy> {
        self.default_strategy
    }

    /// Object-level timeout
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Sorted field names
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Entering hook
    #[must_use]
    pub fn on_enter(&self) -> Option<&EnterHook> {
        self.on_enter.as_ref()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder for page objects
#[derive(Clone)]
pub struct PageObjectBuilder {
    name: String,
    url_pattern: Option<String>,
    default_strategy: Option<Strategy>,
    timeout: Option<Duration>,
    fields: Vec<(String, FieldSpec)>,
    on_enter: Option<EnterHook>,
}

impl fmt::Debug for PageObjectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageObjectBuilder")
            .field("name", &self.name)
            .field("url_pattern", &self.url_pattern)
            .field("fields", &self.fields.len())
            .finish_non_exhaustive()
    }
}

impl PageObjectBuilder {
    /// Create a new page object builder
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_pattern: None,
            default_strategy: None,
            timeout: None,
            fields: Vec::new(),
            on_enter: None,
        }
    }

    /// Set the URL pattern
    #[must_use]
    pub fn with_url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.url_pattern = Some(pattern.into());
        self
    }

    /// Set the container-level default strategy
    #[must_use]
    pub const fn with_default_strategy(mut self, strategy: Strategy) -> Self {
        self.default_strategy = Some(strategy);
        self
    }

    /// Set the object-level timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Register a field; a later registration under the same name wins
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    /// Run `hook` whenever a transition lands on this page
    #[must_use]
    pub fn with_on_enter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PageContext) -> PageResult<()> + Send + Sync + 'static,
    {
        self.on_enter = Some(Arc::new(hook));
        self
    }

    /// Bind every field against the system-wide default strategy
    pub fn build(self) -> PageResult<Arc<PageObject>> {
        self.bind(DEFAULT_STRATEGY)
    }

    /// Bind every field against the default strategy of `config`
    pub fn build_for(self, config: &PageConfig) -> PageResult<Arc<PageObject>> {
        self.bind(config.default_strategy)
    }

    fn bind(self, global_default: Strategy) -> PageResult<Arc<PageObject>> {
        let mut fields = HashMap::with_capacity(self.fields.len());
        for (name, spec) in self.fields {
            let field = spec.bind(&name, self.default_strategy, global_default)?;
            let _ = fields.insert(name, field);
        }
        Ok(Arc::new(PageObject {
            name: self.name,
            url: self.url_pattern.as_deref().map(UrlMatcher::new),
            default_strategy: self.default_strategy,
            timeout: self.timeout,
            fields,
            on_enter: self.on_enter,
        }))
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Page objects by name, for string-keyed transitions
#[derive(Debug, Default, Clone)]
pub struct PageRegistry {
    pages: HashMap<String, Arc<PageObject>>,
}

impl PageRegistry {
    /// Create a new page registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page under its own name
    pub fn register(&mut self, page: Arc<PageObject>) {
        let _ = self.pages.insert(page.name().to_string(), page);
    }

    /// Register a page under an alias
    pub fn register_as(&mut self, name: impl Into<String>, page: Arc<PageObject>) {
        let _ = self.pages.insert(name.into(), page);
    }

    /// Get a page by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<PageObject>> {
        self.pages.get(name).cloned()
    }

    /// Get a page by name or fail with `UnknownPage`
    pub fn resolve(&self, name: &str) -> PageResult<Arc<PageObject>> {
        self.get(name).ok_or_else(|| PageError::UnknownPage {
            name: name.to_string(),
        })
    }

    /// First registered page (by name) whose URL pattern matches `url`
    #[must_use]
    pub fn find_by_url(&self, url: &str) -> Option<Arc<PageObject>> {
        self.list()
            .into_iter()
            .filter_map(|name| self.pages.get(name))
            .find(|page| page.matches_url(url))
            .cloned()
    }

    /// Sorted page names
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered pages
    #[must_use]
    pub fn count(&self) -> usize {
        self.pages.len()
    }
}

// =============================================================================
// URL MATCHING
// =============================================================================

/// `/literal/*/:param` pattern over the path part of a URL
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<UrlSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UrlSegment {
    Literal(String),
    Wildcard,
    Parameter(String),
}

impl UrlSegment {
    fn parse(raw: &str) -> Self {
        match raw {
            "*" => Self::Wildcard,
            _ => raw.strip_prefix(':').map_or_else(
                || Self::Literal(raw.to_string()),
                |name| Self::Parameter(name.to_string()),
            ),
        }
    }
}

/// Path part of a URL: scheme, authority, query and fragment removed
fn path_of(url: &str) -> &str {
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |start| &rest[start..]),
        None => url,
    };
    path.split(['?', '#']).next().unwrap_or_default()
}

fn segments_of(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl UrlMatcher {
    /// Parse `pattern`; each `*` or `:name` stands for exactly one segment
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            segments: segments_of(pattern).map(UrlSegment::parse).collect(),
        }
    }

    /// Parameters captured from `url`, or `None` when it does not match
    #[must_use]
    pub fn params(&self, url: &str) -> Option<HashMap<String, String>> {
        let actual: Vec<&str> = segments_of(path_of(url)).collect();
        if actual.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (segment, value) in self.segments.iter().zip(actual) {
            match segment {
                UrlSegment::Literal(literal) if literal != value => return None,
                UrlSegment::Parameter(name) => {
                    let _ = params.insert(name.clone(), value.to_string());
                }
                _ => {}
            }
        }
        Some(params)
    }

    /// Whether `url` (absolute or path-only) matches
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.params(url).is_some()
    }

    /// Pattern as written
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}
