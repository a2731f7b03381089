//! Page transitions.
//!
//! [`PageContext::goto`] switches the session to a registered page: window
//! first, then the document-ready wait, then the frame. The new context
//! shares the driver and configuration but starts with an empty cache.
//! [`PageContext::transition`] runs an action and picks the target page from
//! what the action returned, through a [`NextPage`] rule.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::context::PageContext;
use crate::driver::FrameTarget;
use crate::page_object::PageRegistry;
use crate::result::{PageError, PageResult};
use crate::wait::{WaitSpec, READY_STATE_SCRIPT};

/// Token key naming the fallback target in [`NextPage::by_token`] pairs
pub const DEFAULT_TOKEN: &str = "__default__";

/// Window to switch to before entering a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowTarget {
    /// Position in the session's window list (opening order)
    Index(usize),
    /// Window handle
    Handle(String),
}

/// How [`PageContext::goto`] enters a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GotoOptions {
    /// Window to switch to first
    pub window: Option<WindowTarget>,
    /// Frame to switch to once the document is ready
    pub frame: Option<FrameTarget>,
    /// Timeout policy of the document-ready wait
    pub wait: WaitSpec,
}

impl GotoOptions {
    /// Stay in the current window and frame
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch window first
    #[must_use]
    pub fn with_window(mut self, window: WindowTarget) -> Self {
        self.window = Some(window);
        self
    }

    /// Switch frame after the document is ready
    #[must_use]
    pub fn with_frame(mut self, frame: FrameTarget) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Timeout policy of the ready wait
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitSpec) -> Self {
        self.wait = wait;
        self
    }
}

/// Chooses the page an action lands on
#[derive(Clone)]
pub enum NextPage {
    /// Always the same page
    Fixed(String),
    /// Page keyed by the token the action returned
    ByToken {
        /// Token to page name
        targets: HashMap<String, String>,
        /// Page used for unknown or missing tokens
        default: Option<String>,
    },
    /// Page computed from the token
    Dynamic(Arc<dyn Fn(Option<&str>) -> Option<String> + Send + Sync>),
}

impl fmt::Debug for NextPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(name) => f.debug_tuple("Fixed").field(name).finish(),
            Self::ByToken { targets, default } => f
                .debug_struct("ByToken")
                .field("targets", targets)
                .field("default", default)
                .finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl NextPage {
    /// Always land on `name`
    #[must_use]
    pub fn fixed(name: impl Into<String>) -> Self {
        Self::Fixed(name.into())
    }

    /// Token to page pairs; the pair keyed [`DEFAULT_TOKEN`] is the fallback
    #[must_use]
    pub fn by_token<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut targets: HashMap<String, String> = pairs
            .into_iter()
            .map(|(token, page)| (token.into(), page.into()))
            .collect();
        let default = targets.remove(DEFAULT_TOKEN);
        Self::ByToken { targets, default }
    }

    /// Compute the page from the token
    #[must_use]
    pub fn dynamic<F>(rule: F) -> Self
    where
        F: Fn(Option<&str>) -> Option<String> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(rule))
    }

    /// Page name for `token`
    pub fn resolve(&self, token: Option<&str>) -> PageResult<String> {
        let unknown = || PageError::UnknownPage {
            name: token.unwrap_or("<none>").to_string(),
        };
        match self {
            Self::Fixed(name) => Ok(name.clone()),
            Self::ByToken { targets, default } => token
                .and_then(|t| targets.get(t))
                .or(default.as_ref())
                .cloned()
                .ok_or_else(unknown),
            Self::Dynamic(rule) => rule(token).ok_or_else(unknown),
        }
    }
}

impl PageContext {
    /// Enter the registered page `name`
    pub fn goto(
        &self,
        registry: &PageRegistry,
        name: &str,
        options: &GotoOptions,
    ) -> PageResult<Self> {
        let object = registry.resolve(name)?;

        if let Some(window) = &options.window {
            let handle = match window {
                WindowTarget::Handle(handle) => handle.clone(),
                WindowTarget::Index(index) => self
                    .window_handles()?
                    .get(*index)
                    .cloned()
                    .ok_or_else(|| PageError::invalid(format!("no window at index {index}")))?,
            };
            debug!("Switching to window {handle}");
            self.switch_to_window(&handle)?;
        }

        let driver = self.driver();
        self.wait_until(
            || matches!(driver.execute_script(READY_STATE_SCRIPT), Ok(Value::Bool(true))),
            "document ready",
            &options.wait,
        )?;

        if let Some(frame) = &options.frame {
            debug!("Switching to frame {frame:?}");
            self.switch_to_frame(frame)?;
        }

        let next = Self::with_config(self.shared_driver(), object, self.config().clone());
        if let Some(hook) = next.object().on_enter().cloned() {
            hook(&next)?;
        }
        info!("Now on page {}", next.name());
        Ok(next)
    }

    /// Run `action`, then enter the page `rule` picks from its token
    pub fn transition<F>(
        &self,
        registry: &PageRegistry,
        rule: &NextPage,
        options: &GotoOptions,
        action: F,
    ) -> PageResult<Self>
    where
        F: FnOnce() -> PageResult<Option<String>>,
    {
        let token = action()?;
        let name = rule.resolve(token.as_deref())?;
        debug!("Action returned {token:?}, next page {name}");
        self.goto(registry, &name, options)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use crate::field::FieldSpec;
    use crate::mock::{MockDriver, MockElement};
    use crate::page_object::{PageObject, PageObjectBuilder};
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn registry(entered: &Arc<AtomicUsize>) -> PageRegistry {
        let counter = Arc::clone(entered);
        let mut registry = PageRegistry::new();
        registry.register(
            PageObjectBuilder::new("login")
                .with_field("user", FieldSpec::single("user").value_only())
                .build()
                .unwrap(),
        );
        registry.register(
            PageObjectBuilder::new("home")
                .with_on_enter(move |_| {
                    let _ = counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build()
                .unwrap(),
        );
        registry
    }

    fn start(driver: &Rc<MockDriver>) -> PageContext {
        PageContext::with_config(
            driver.clone(),
            PageObject::empty("start"),
            PageConfig::new().with_timeout(0),
        )
    }

    fn driver() -> Rc<MockDriver> {
        Rc::new(MockDriver::with_body(vec![
            MockElement::input("text").id("user").value("ada"),
        ]))
    }

    mod next_page_tests {
        use super::*;

        #[test]
        fn test_fixed() {
            assert_eq!(NextPage::fixed("home").resolve(None).unwrap(), "home");
        }

        #[test]
        fn test_by_token_with_default() {
            let rule = NextPage::by_token([("ok", "home"), (DEFAULT_TOKEN, "login")]);
            assert_eq!(rule.resolve(Some("ok")).unwrap(), "home");
            assert_eq!(rule.resolve(Some("other")).unwrap(), "login");
            assert_eq!(rule.resolve(None).unwrap(), "login");
        }

        #[test]
        fn test_by_token_without_default() {
            let rule = NextPage::by_token([("ok", "home")]);
            let err = rule.resolve(Some("nope")).unwrap_err();
            assert!(matches!(err, PageError::UnknownPage { name } if name == "nope"));
        }

        #[test]
        fn test_dynamic() {
            let rule = NextPage::dynamic(|token| token.map(|t| format!("{t}_page")));
            assert_eq!(rule.resolve(Some("cart")).unwrap(), "cart_page");
            assert!(rule.resolve(None).is_err());
        }
    }

    mod goto_tests {
        use super::*;

        #[test]
        fn test_goto_builds_fresh_context() {
            let entered = Arc::new(AtomicUsize::new(0));
            let registry = registry(&entered);
            let driver = driver();
            let page = start(&driver);
            let login = page.goto(&registry, "login", &GotoOptions::new()).unwrap();
            assert_eq!(login.name(), "login");
            assert_eq!(login.config().timeout_ms, 0);
            assert_eq!(login.cached_entries(), 0);
            assert_eq!(login.read_field("user").unwrap().as_str(), Some("ada"));
            assert_eq!(entered.load(Ordering::SeqCst), 0);
        }

        #[test]
        fn test_goto_runs_on_enter() {
            let entered = Arc::new(AtomicUsize::new(0));
            let registry = registry(&entered);
            let driver = driver();
            let _ = start(&driver)
                .goto(&registry, "home", &GotoOptions::new())
                .unwrap();
            assert_eq!(entered.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn test_goto_switches_window_then_frame() {
            let entered = Arc::new(AtomicUsize::new(0));
            let registry = registry(&entered);
            let driver = driver();
            driver.open_window("popup");
            let options = GotoOptions::new()
                .with_window(WindowTarget::Index(1))
                .with_frame(FrameTarget::Index(2));
            let _ = start(&driver).goto(&registry, "login", &options).unwrap();
            assert_eq!(driver.current_window(), "popup");
            let history = driver.history();
            let window = history.iter().position(|c| c == "switch_to_window:popup");
            let frame = history.iter().position(|c| c == "switch_to_frame:2");
            assert!(window.unwrap() < frame.unwrap());
        }

        #[test]
        fn test_goto_bad_window_index() {
            let entered = Arc::new(AtomicUsize::new(0));
            let registry = registry(&entered);
            let driver = driver();
            let options = GotoOptions::new().with_window(WindowTarget::Index(5));
            let err = start(&driver).goto(&registry, "login", &options).unwrap_err();
            assert!(matches!(err, PageError::InvalidArgument { .. }));
        }

        #[test]
        fn test_goto_unknown_page() {
            let entered = Arc::new(AtomicUsize::new(0));
            let registry = registry(&entered);
            let driver = driver();
            let err = start(&driver)
                .goto(&registry, "nowhere", &GotoOptions::new())
                .unwrap_err();
            assert!(matches!(err, PageError::UnknownPage { .. }));
        }

        #[test]
        fn test_goto_waits_for_ready_state() {
            let entered = Arc::new(AtomicUsize::new(0));
            let registry = registry(&entered);
            let driver = driver();
            driver.set_script_results(READY_STATE_SCRIPT, vec![Value::Bool(false)]);
            let strict = GotoOptions::new()
                .with_wait(WaitSpec::new().with_timeout(Duration::from_millis(10)));
            let err = start(&driver).goto(&registry, "login", &strict).unwrap_err();
            assert!(err.is_timeout());
            let lenient = GotoOptions::new().with_wait(
                WaitSpec::new()
                    .with_timeout(Duration::from_millis(10))
                    .ignoring_timeout(),
            );
            assert!(start(&driver).goto(&registry, "login", &lenient).is_ok());
        }
    }

    mod transition_tests {
        use super::*;

        #[test]
        fn test_transition_by_token() {
            let entered = Arc::new(AtomicUsize::new(0));
            let registry = registry(&entered);
            let driver = driver();
            let page = start(&driver);
            let rule = NextPage::by_token([("ok", "home"), (DEFAULT_TOKEN, "login")]);
            let next = page
                .transition(&registry, &rule, &GotoOptions::new(), || {
                    Ok(Some("ok".to_string()))
                })
                .unwrap();
            assert_eq!(next.name(), "home");
            let fallback = page
                .transition(&registry, &rule, &GotoOptions::new(), || Ok(None))
                .unwrap();
            assert_eq!(fallback.name(), "login");
        }

        #[test]
        fn test_action_error_skips_goto() {
            let entered = Arc::new(AtomicUsize::new(0));
            let registry = registry(&entered);
            let driver = driver();
            let err = start(&driver)
                .transition(&registry, &NextPage::fixed("home"), &GotoOptions::new(), || {
                    Err(PageError::driver("click failed"))
                })
                .unwrap_err();
            assert!(matches!(err, PageError::Driver { .. }));
            assert_eq!(entered.load(Ordering::SeqCst), 0);
        }
    }
}
