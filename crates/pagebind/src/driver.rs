//! PageDriver - Abstract Browser Automation Seam
//!
//! Everything Pagebind knows about the browser goes through [`PageDriver`]:
//! element lookup, the handful of element reads and interactions the value
//! adapters need, and the session-level passthroughs (scripts, windows,
//! frames). Implementations wrap a real protocol client; [`crate::MockDriver`]
//! is an in-memory DOM for tests.
//!
//! The trait is synchronous. Page objects are driven by one sequential test
//! script and the only blocking point is the wait primitive in [`crate::wait`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::locator::Locator;
use crate::result::PageResult;

/// Opaque reference to a live DOM element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned element id
    pub id: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Where a lookup starts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SearchContext {
    /// The whole document of the current browsing context
    Document,
    /// Descendants of an element
    Element(ElementHandle),
}

impl SearchContext {
    /// Stable identity used as the first half of a cache key
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Document => "document",
            Self::Element(handle) => &handle.id,
        }
    }

    /// The scoping element, if any
    #[must_use]
    pub const fn element(&self) -> Option<&ElementHandle> {
        match self {
            Self::Document => None,
            Self::Element(handle) => Some(handle),
        }
    }
}

/// Frame to switch into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameTarget {
    /// Back to the top-level document
    Default,
    /// Frame by index in `window.frames`
    Index(u16),
    /// Frame by its `<iframe>`/`<frame>` element
    Element(ElementHandle),
}

/// Synchronous driver interface consumed by the page object engine.
///
/// Contract on failures:
/// - `find_element` with zero matches fails with `PageError::NotFound`
/// - alert operations without an open alert fail with `PageError::NotFound`
/// - any operation on a detached handle fails with `PageError::Stale`
/// - everything else is `PageError::Driver`
pub trait PageDriver {
    /// First element matching `locator` within `scope`
    fn find_element(&self, scope: &SearchContext, locator: &Locator) -> PageResult<ElementHandle>;

    /// All elements matching `locator` within `scope`, in document order
    fn find_elements(
        &self,
        scope: &SearchContext,
        locator: &Locator,
    ) -> PageResult<Vec<ElementHandle>>;

    /// Attribute or property value (`value`, `textContent`, `outerHTML`, ...)
    fn attribute(&self, element: &ElementHandle, name: &str) -> PageResult<Option<String>>;

    /// Lower-case tag name
    fn tag_name(&self, element: &ElementHandle) -> PageResult<String>;

    /// Whether the element is enabled
    fn is_enabled(&self, element: &ElementHandle) -> PageResult<bool>;

    /// Whether the element is rendered visibly
    fn is_displayed(&self, element: &ElementHandle) -> PageResult<bool>;

    /// Checked/selected state of checkboxes, radios and options
    fn is_selected(&self, element: &ElementHandle) -> PageResult<bool>;

    /// Click the element
    fn click(&self, element: &ElementHandle) -> PageResult<()>;

    /// Clear an editable element
    fn clear(&self, element: &ElementHandle) -> PageResult<()>;

    /// Type text into the element
    fn send_keys(&self, element: &ElementHandle, text: &str) -> PageResult<()>;

    /// Execute a script in the page and return its JSON result
    fn execute_script(&self, script: &str) -> PageResult<serde_json::Value>;

    /// Handles of all open windows, in opening order
    fn window_handles(&self) -> PageResult<Vec<String>>;

    /// Switch to a window by handle
    fn switch_to_window(&self, handle: &str) -> PageResult<()>;

    /// Switch to a frame
    fn switch_to_frame(&self, frame: &FrameTarget) -> PageResult<()>;

    /// URL of the current browsing context
    fn current_url(&self) -> PageResult<String>;

    /// Message of the open alert, confirm or prompt (`None` when there is none)
    fn alert_text(&self) -> PageResult<Option<String>>;

    /// Type into the open prompt
    fn send_alert_text(&self, text: &str) -> PageResult<()>;

    /// Accept the open alert
    fn accept_alert(&self) -> PageResult<()>;

    /// Dismiss the open alert
    fn dismiss_alert(&self) -> PageResult<()>;
}

/// Trimmed `textContent` of an element (empty when the attribute is absent)
pub fn text_content(driver: &dyn PageDriver, element: &ElementHandle) -> PageResult<String> {
    Ok(driver
        .attribute(element, "textContent")?
        .map(|text| text.trim().to_string())
        .unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_search_context_ids() {
        assert_eq!(SearchContext::Document.id(), "document");
        let ctx = SearchContext::Element(ElementHandle::new("e-42"));
        assert_eq!(ctx.id(), "e-42");
        assert_eq!(ctx.element(), Some(&ElementHandle::new("e-42")));
        assert!(SearchContext::Document.element().is_none());
    }

    #[test]
    fn test_handle_display_and_serde() {
        let handle = ElementHandle::new("abc");
        assert_eq!(handle.to_string(), "abc");
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, r#"{"id":"abc"}"#);
    }
}
