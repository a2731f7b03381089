//! Element resolution: wait for visibility, then fetch.
//!
//! The visibility wait only proves the element was visible at one point in
//! time; the handle it saw is discarded and a fresh lookup is made once the
//! wait returns.

use std::time::Duration;

use tracing::{debug, warn};

use crate::driver::{ElementHandle, PageDriver, SearchContext};
use crate::locator::Locator;
use crate::result::PageResult;
use crate::wait::{WaitOptions, Waiter};

/// How a lookup waits before fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Visibility wait (zero = fetch directly)
    pub timeout: Duration,
    /// Poll interval of the visibility wait
    pub poll_interval: Duration,
    /// Fetch anyway when the visibility wait times out
    pub ignore_visibility: bool,
}

impl ResolveOptions {
    /// No waiting, plain fetch
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(crate::config::DEFAULT_POLL_INTERVAL_MS),
            ignore_visibility: false,
        }
    }

    /// Set the visibility timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set whether a visibility timeout is tolerated
    #[must_use]
    pub const fn with_ignore_visibility(mut self, ignore: bool) -> Self {
        self.ignore_visibility = ignore;
        self
    }

    fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
            .with_poll_interval(u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX))
    }
}

fn wait_visible(
    driver: &dyn PageDriver,
    scope: &SearchContext,
    locator: &Locator,
    options: &ResolveOptions,
) -> PageResult<()> {
    if options.timeout.is_zero() {
        return Ok(());
    }
    let outcome = Waiter::new().wait_for_function(
        || {
            driver
                .find_element(scope, locator)
                .and_then(|element| driver.is_displayed(&element))
                .unwrap_or(false)
        },
        format!("visibility of {locator}"),
        &options.wait_options(),
    );
    match outcome {
        Ok(_) => Ok(()),
        Err(err) if err.is_timeout() && options.ignore_visibility => {
            warn!("Timeout when waiting for {locator} to be visible, operating on it anyway");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Resolve one element.
///
/// Fails with `Timeout` when the visibility wait expires (unless
/// `ignore_visibility`), or `NotFound` when the final fetch matches nothing.
pub fn find_one(
    driver: &dyn PageDriver,
    scope: &SearchContext,
    locator: &Locator,
    options: &ResolveOptions,
) -> PageResult<ElementHandle> {
    wait_visible(driver, scope, locator, options)?;
    let element = driver.find_element(scope, locator)?;
    debug!("Element found: {locator} -> {element}");
    Ok(element)
}

/// Resolve every matching element; an empty result is not a failure.
pub fn find_many(
    driver: &dyn PageDriver,
    scope: &SearchContext,
    locator: &Locator,
    options: &ResolveOptions,
) -> PageResult<Vec<ElementHandle>> {
    wait_visible(driver, scope, locator, options)?;
    let elements = driver.find_elements(scope, locator)?;
    debug!("{} element(s) found: {locator}", elements.len());
    Ok(elements)
}
