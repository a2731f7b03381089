//! Pagebind: Page Objects for Browser UI Test Automation
//!
//! Declare a page once as named fields bound to locators, then read and write
//! those fields as plain values. Pagebind resolves the elements (waiting for
//! visibility), memoizes them in a per-page cache that notices navigation and
//! in-place rewrites, and converts between element state and values with
//! kind-specific adapters.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PAGEBIND Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ PageObject │    │ Page /     │    │ PageDriver │            │
//! │   │ (fields,   │───►│ Component  │───►│ (WebDriver │            │
//! │   │ locators)  │    │ Context    │    │  or mock)  │            │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           │                                     │
//! │          ┌────────────────┼────────────────┐                    │
//! │          ▼                ▼                ▼                    │
//! │   ┌────────────┐   ┌────────────┐   ┌────────────┐              │
//! │   │ Element    │   │ Value      │   │ Table      │              │
//! │   │ Cache      │   │ Adapters   │   │ Projector  │              │
//! │   └────────────┘   └────────────┘   └────────────┘              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use pagebind::prelude::*;
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let driver = Rc::new(MockDriver::with_body(vec![
//!     MockElement::input("email").id("email"),
//!     MockElement::input("checkbox").id("remember"),
//! ]));
//! let login = PageObjectBuilder::new("login")
//!     .with_field("email", FieldSpec::single("email").value_only())
//!     .with_field("remember", FieldSpec::single("remember").value_only())
//!     .build()
//!     .unwrap();
//!
//! let page = PageContext::with_config(driver, login, PageConfig::new().with_timeout(0));
//! page.write_field("email", &json!("ada@example.test")).unwrap();
//! page.write_field("remember", &json!(true)).unwrap();
//! assert_eq!(page.read_field("remember").unwrap().as_bool(), Some(true));
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Value adapters: kind detection and kind-specific read/write
#[allow(clippy::missing_errors_doc)]
pub mod adapter;

/// Element cache with root identity, fingerprint and liveness checks
#[allow(clippy::missing_errors_doc)]
pub mod cache;

mod config;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod context;
mod driver;
mod field;
mod locator;

/// Log output setup
pub mod logging;

/// In-memory DOM implementing [`PageDriver`]
#[allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
pub mod mock;

mod navigation;
mod page_object;

/// Element lookup with visibility waits
pub mod resolver;

mod result;
mod table;

/// Polling waits and wait policies
pub mod wait;

pub use config::{PageConfig, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
pub use context::{Alert, ComponentContext, PageContext, Resolved, TemplateField};
pub use driver::{text_content, ElementHandle, FrameTarget, PageDriver, SearchContext};
pub use field::{DictLocators, DictSpec, Field, FieldKind, FieldSpec, ReadHook, WriteHook};
pub use locator::{resolve_strategy, Locator, LocatorSpec, Strategy, DEFAULT_STRATEGY};
pub use mock::{MockDriver, MockElement};
pub use navigation::{GotoOptions, NextPage, WindowTarget, DEFAULT_TOKEN};
pub use page_object::{EnterHook, PageObject, PageObjectBuilder, PageRegistry, UrlMatcher};
pub use resolver::ResolveOptions;
pub use result::{PageError, PageResult};
pub use table::{
    ColumnSource, ColumnSpec, Extractor, Predicate, Query, Record, Table, TableLayout, TableSpec,
};
pub use wait::{AjaxLibrary, WaitOptions, WaitResult, WaitSpec, Waiter};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::config::*;
    pub use super::context::*;
    pub use super::driver::*;
    pub use super::field::*;
    pub use super::locator::*;
    pub use super::mock::{MockDriver, MockElement};
    pub use super::navigation::*;
    pub use super::page_object::*;
    pub use super::result::*;
    pub use super::table::*;
    pub use super::wait::{AjaxLibrary, WaitOptions, WaitSpec, Waiter};
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_root_exports_cover_a_page() {
        let object = PageObjectBuilder::new("home")
            .with_field("title", FieldSpec::single("h1").with_strategy(Strategy::TagName))
            .build()
            .unwrap();
        let driver = std::rc::Rc::new(MockDriver::with_body(vec![
            MockElement::new("h1").text(" Welcome "),
        ]));
        let page = PageContext::with_config(driver, object, PageConfig::new().with_timeout(0));
        let title = page.read_field("title").unwrap();
        let handle = title.as_element().unwrap();
        assert_eq!(text_content(page.driver(), handle).unwrap(), "Welcome");
    }
}
