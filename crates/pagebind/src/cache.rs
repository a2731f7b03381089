//! Element cache keyed by `(context id, locator)`.
//!
//! Two staleness signals guard every entry:
//!
//! - the id of the `<html>` root, compared on every read and write; a change
//!   means the browser navigated and the whole cache is dropped
//! - a fingerprint of the context's markup, stored per entry; a mismatch means
//!   the container was rewritten in place
//!
//! An entry that survives both is still evicted when any of its handles is
//! disabled, hidden or detached. Entries are all-or-nothing.

use std::collections::HashMap;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::driver::{ElementHandle, PageDriver, SearchContext};
use crate::locator::Locator;
use crate::result::PageResult;

fn root_element(driver: &dyn PageDriver) -> PageResult<ElementHandle> {
    driver.find_element(&SearchContext::Document, &Locator::tag("html"))
}

/// Id of the current `<html>` element
pub fn root_identity(driver: &dyn PageDriver) -> PageResult<String> {
    Ok(root_element(driver)?.id)
}

/// Content hash of a search context's markup.
///
/// The document hashes the `outerHTML` of its `<html>` element, so in-place
/// rewrites anywhere on the page change it.
pub fn fingerprint(driver: &dyn PageDriver, scope: &SearchContext) -> PageResult<String> {
    let element = match scope {
        SearchContext::Document => root_element(driver)?,
        SearchContext::Element(element) => element.clone(),
    };
    let content = driver.attribute(&element, "outerHTML")?.unwrap_or_default();
    Ok(hex_digest(content.as_bytes()))
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
}

/// Handles stored under one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedHandles {
    /// Single field
    One(ElementHandle),
    /// Multi field
    Many(Vec<ElementHandle>),
    /// Dictionary field: item key to value element(s)
    Keyed(Vec<(String, Vec<ElementHandle>)>),
}

impl CachedHandles {
    /// Every handle held, in storage order
    #[must_use]
    pub fn handles(&self) -> Vec<&ElementHandle> {
        match self {
            Self::One(handle) => vec![handle],
            Self::Many(handles) => handles.iter().collect(),
            Self::Keyed(items) => items.iter().flat_map(|(_, hs)| hs.iter()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    handles: CachedHandles,
    fingerprint: String,
}

impl CacheEntry {
    fn is_live(&self, driver: &dyn PageDriver) -> bool {
        self.handles.handles().into_iter().all(|handle| {
            matches!(driver.is_enabled(handle), Ok(true))
                && matches!(driver.is_displayed(handle), Ok(true))
        })
    }
}

/// Per-page element cache
#[derive(Debug, Default)]
pub struct ElementCache {
    root: Option<String>,
    entries: HashMap<(String, Locator), CacheEntry>,
}

impl ElementCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn invalidate_all(&mut self) {
        debug!("Cache invalidated ({} entries)", self.entries.len());
        self.entries.clear();
    }

    /// Drop one entry
    pub fn remove(&mut self, context_id: &str, locator: &Locator) {
        let _ = self
            .entries
            .remove(&(context_id.to_string(), locator.clone()));
    }

    /// Reset when the root identity changed. Returns `true` on reset.
    fn check_root(&mut self, driver: &dyn PageDriver) -> PageResult<bool> {
        let current = root_identity(driver)?;
        match &self.root {
            Some(root) if *root == current => Ok(false),
            Some(_) => {
                debug!("Page root changed, resetting cache");
                self.entries.clear();
                self.root = Some(current);
                Ok(true)
            }
            None => {
                self.root = Some(current);
                Ok(false)
            }
        }
    }

    /// Look up an entry, evicting it when stale
    pub fn read(
        &mut self,
        driver: &dyn PageDriver,
        context_id: &str,
        fingerprint: &str,
        locator: &Locator,
    ) -> PageResult<Option<CachedHandles>> {
        if self.check_root(driver)? {
            return Ok(None);
        }
        let key = (context_id.to_string(), locator.clone());
        let Some(entry) = self.entries.get(&key) else {
            debug!("Cache miss: {context_id}/{locator}");
            return Ok(None);
        };
        if entry.fingerprint != fingerprint {
            debug!("Context of {locator} changed, evicting");
            let _ = self.entries.remove(&key);
            return Ok(None);
        }
        if !entry.is_live(driver) {
            debug!("Cached {locator} is stale, evicting");
            let _ = self.entries.remove(&key);
            return Ok(None);
        }
        debug!("Cache hit: {context_id}/{locator}");
        Ok(Some(entry.handles.clone()))
    }

    /// Store an entry, replacing any previous one
    pub fn write(
        &mut self,
        driver: &dyn PageDriver,
        context_id: &str,
        fingerprint: &str,
        locator: &Locator,
        handles: CachedHandles,
    ) -> PageResult<()> {
        let _ = self.check_root(driver)?;
        let _ = self.entries.insert(
            (context_id.to_string(), locator.clone()),
            CacheEntry {
                handles,
                fingerprint: fingerprint.to_string(),
            },
        );
        Ok(())
    }
}
