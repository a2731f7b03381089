//! Wait Mechanisms
//!
//! The polling primitive every blocking operation goes through, plus the
//! option types of the page-level wait helpers.
//!
//! A wait evaluates its predicate, sleeps one poll interval, and repeats
//! until the predicate holds or the deadline passes. The predicate is always
//! evaluated at least once, so a zero timeout means "check now".

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{PageError, PageResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Script reporting whether the document finished loading
pub const READY_STATE_SCRIPT: &str = "return document.readyState == \"complete\";";

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for a single wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT SPEC (page-level helpers)
// =============================================================================

/// Timeout policy of a page-level wait helper
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitSpec {
    /// Override of the page timeout
    pub timeout: Option<Duration>,
    /// Log and swallow a timeout instead of failing
    pub ignore_timeout: bool,
}

impl WaitSpec {
    /// Page timeout, timeouts propagate
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: None,
            ignore_timeout: false,
        }
    }

    /// Override the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Treat a timeout as "not yet true, proceed anyway"
    #[must_use]
    pub const fn ignoring_timeout(mut self) -> Self {
        self.ignore_timeout = true;
        self
    }

    /// Apply the policy to the outcome of a wait
    pub fn settle(&self, outcome: PageResult<WaitResult>) -> PageResult<()> {
        match outcome {
            Ok(_) => Ok(()),
            Err(err) if err.is_timeout() && self.ignore_timeout => {
                warn!("Timeout when waiting, ignored: {err}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// Client-side frameworks whose in-flight requests can be awaited
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AjaxLibrary {
    /// `jQuery.active == 0`
    #[default]
    JQuery,
    /// ASP.NET `PageRequestManager` not in an async postback
    AspNet,
    /// Any script returning `true` when idle
    Custom(String),
}

impl AjaxLibrary {
    /// Idle-check script
    #[must_use]
    pub fn idle_script(&self) -> &str {
        match self {
            Self::JQuery => "return jQuery.active == 0;",
            Self::AspNet => {
                "return Sys.WebForms.PageRequestManager.getInstance().get_isInAsyncPostBack() == false;"
            }
            Self::Custom(script) => script,
        }
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of predicate evaluations
    pub attempts: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// WAITER IMPLEMENTATION
// =============================================================================

/// Polling waiter
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter;

impl Waiter {
    /// Create a new waiter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Poll `predicate` until it holds or `options.timeout_ms` elapses
    pub fn wait_for_function<F>(
        &self,
        mut predicate: F,
        description: impl Into<String>,
        options: &WaitOptions,
    ) -> PageResult<WaitResult>
    where
        F: FnMut() -> bool,
    {
        let waited_for = description.into();
        let started = Instant::now();
        // unrepresentable deadlines wait forever
        let deadline = started.checked_add(options.timeout());
        let mut attempts = 0;

        while !predicate() {
            attempts += 1;
            let mut pause = options.poll_interval();
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(PageError::Timeout {
                        ms: options.timeout_ms,
                        waited_for,
                    });
                }
                pause = pause.min(deadline - now);
            }
            std::thread::sleep(pause);
        }

        attempts += 1;
        debug!("{waited_for} after {attempts} attempt(s)");
        Ok(WaitResult {
            elapsed: started.elapsed(),
            attempts,
            waited_for,
        })
    }
}
