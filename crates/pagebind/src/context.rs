//! Page and component contexts.
//!
//! [`PageContext`] is a page object instantiated against a live driver. It
//! owns the element cache of that page. [`ComponentContext`] scopes lookups
//! to one element (or the whole document for the page root) and borrows the
//! page for its driver, configuration and cache.
//!
//! Reads never fail because an element is missing: lookup failures are
//! logged and surface as [`Resolved::Null`]. Writes propagate every failure.

use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::adapter;
use crate::cache::{self, CachedHandles, ElementCache};
use crate::config::PageConfig;
use crate::driver::{text_content, ElementHandle, FrameTarget, PageDriver, SearchContext};
use crate::field::{DictLocators, Field, FieldKind};
use crate::locator::Locator;
use crate::page_object::PageObject;
use crate::resolver::{self, ResolveOptions};
use crate::result::{PageError, PageResult};
use crate::table::Table;
use crate::wait::{AjaxLibrary, WaitOptions, WaitSpec, Waiter, READY_STATE_SCRIPT};

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// RESOLVED VALUES
// =============================================================================

/// Outcome of reading a field
#[derive(Debug, Clone)]
pub enum Resolved<'p> {
    /// Element missing, or nothing to return
    Null,
    /// Adapter value
    Value(Value),
    /// Raw element handle
    Element(ElementHandle),
    /// Element wrapped into a component
    Component(ComponentContext<'p>),
    /// Template accessor awaiting parameters
    Template(TemplateField<'p>),
    /// Table projector
    Table(Table<'p>),
    /// Multi field items
    List(Vec<Resolved<'p>>),
    /// Dictionary items in document order
    Map(Vec<(String, Resolved<'p>)>),
}

impl<'p> Resolved<'p> {
    /// Whether nothing was resolved
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Adapter value, if this is one
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// String adapter value
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Boolean adapter value
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// Element handle, if this is one
    #[must_use]
    pub const fn as_element(&self) -> Option<&ElementHandle> {
        match self {
            Self::Element(handle) => Some(handle),
            _ => None,
        }
    }

    /// Component, if this is one
    #[must_use]
    pub const fn as_component(&self) -> Option<&ComponentContext<'p>> {
        match self {
            Self::Component(component) => Some(component),
            _ => None,
        }
    }

    /// Multi items
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Dictionary entry by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Dictionary keys in document order
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Map(entries) => entries.iter().map(|(k, _)| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Take the template accessor
    #[must_use]
    pub fn into_template(self) -> Option<TemplateField<'p>> {
        match self {
            Self::Template(template) => Some(template),
            _ => None,
        }
    }

    /// Take the table projector
    #[must_use]
    pub fn into_table(self) -> Option<Table<'p>> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }
}

// =============================================================================
// MULTI WRITE PAYLOADS
// =============================================================================

/// Shape of a value written to several elements
#[derive(Debug)]
enum MultiWrite<'v> {
    /// Zipped positionally
    Sequence(&'v [Value]),
    /// Index to value
    Indexed(Vec<(usize, &'v Value)>),
    /// Same value for every element
    Broadcast(&'v Value),
}

impl<'v> MultiWrite<'v> {
    fn parse(value: &'v Value) -> PageResult<Self> {
        let nested = |v: &Value| matches!(v, Value::Array(_) | Value::Object(_));
        match value {
            Value::Null => Err(PageError::invalid(
                "expected a sequence, an index map or a scalar, got null",
            )),
            Value::Array(items) => {
                if items.iter().any(nested) {
                    return Err(PageError::invalid("sequence items must be scalars"));
                }
                Ok(Self::Sequence(items))
            }
            Value::Object(map) => {
                let mut indexed = Vec::with_capacity(map.len());
                for (key, item) in map {
                    if nested(item) {
                        return Err(PageError::invalid(format!(
                            "value at index {key:?} must be a scalar"
                        )));
                    }
                    match key.trim().parse::<usize>() {
                        Ok(index) => indexed.push((index, item)),
                        Err(_) => warn!("Dropping non-integer index {key:?}"),
                    }
                }
                indexed.sort_by_key(|(index, _)| *index);
                Ok(Self::Indexed(indexed))
            }
            scalar => Ok(Self::Broadcast(scalar)),
        }
    }

    fn assign(self, count: usize) -> Vec<(usize, &'v Value)> {
        match self {
            Self::Sequence(items) => items.iter().take(count).enumerate().collect(),
            Self::Indexed(pairs) => pairs
                .into_iter()
                .filter(|(index, _)| {
                    let in_range = *index < count;
                    if !in_range {
                        warn!("Dropping out-of-range index {index} ({count} elements)");
                    }
                    in_range
                })
                .collect(),
            Self::Broadcast(value) => (0..count).map(|index| (index, value)).collect(),
        }
    }
}

// =============================================================================
// PAGE CONTEXT
// =============================================================================

/// A page object bound to a live driver
pub struct PageContext {
    driver: Rc<dyn PageDriver>,
    object: Arc<PageObject>,
    config: PageConfig,
    cache: RefCell<ElementCache>,
}

impl fmt::Debug for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("page", &self.object.name())
            .field("config", &self.config)
            .field("cached", &self.cache.borrow().len())
            .finish_non_exhaustive()
    }
}

impl PageContext {
    /// Bind a page object to a driver with the default configuration
    #[must_use]
    pub fn new(driver: Rc<dyn PageDriver>, object: Arc<PageObject>) -> Self {
        Self::with_config(driver, object, PageConfig::default())
    }

    /// Bind a page object to a driver
    #[must_use]
    pub fn with_config(
        driver: Rc<dyn PageDriver>,
        object: Arc<PageObject>,
        config: PageConfig,
    ) -> Self {
        debug!("Entering page {}", object.name());
        Self {
            driver,
            object,
            config,
            cache: RefCell::new(ElementCache::new()),
        }
    }

    /// Driver of the session
    #[must_use]
    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    /// Shared handle on the driver, for building sibling contexts
    #[must_use]
    pub fn shared_driver(&self) -> Rc<dyn PageDriver> {
        Rc::clone(&self.driver)
    }

    /// Page object
    #[must_use]
    pub const fn object(&self) -> &Arc<PageObject> {
        &self.object
    }

    /// Page name
    #[must_use]
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Configuration
    #[must_use]
    pub const fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Component context rooted at the document
    #[must_use]
    pub fn root(&self) -> ComponentContext<'_> {
        ComponentContext {
            page: self,
            scope: SearchContext::Document,
            object: Arc::clone(&self.object),
        }
    }

    /// Read a page field
    pub fn read_field(&self, name: &str) -> PageResult<Resolved<'_>> {
        self.root().read_field(name)
    }

    /// Write a page field
    pub fn write_field(&self, name: &str, value: &Value) -> PageResult<()> {
        self.root().write_field(name, value)
    }

    /// Template accessor of a page field
    pub fn template(&self, name: &str) -> PageResult<TemplateField<'_>> {
        self.root().template(name)
    }

    /// Table projector of a page field
    pub fn table(&self, name: &str) -> PageResult<Table<'_>> {
        self.root().table(name)
    }

    /// Number of cached entries
    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Drop every cached element
    pub fn invalidate_cache(&self) {
        self.cache.borrow_mut().invalidate_all();
    }

    /// Whether the browser's URL matches this page's pattern
    pub fn is_current(&self) -> PageResult<bool> {
        Ok(self.object.matches_url(&self.driver.current_url()?))
    }

    // -------------------------------------------------------------------------
    // passthroughs
    // -------------------------------------------------------------------------

    /// Execute a script in the page
    pub fn execute_script(&self, script: &str) -> PageResult<Value> {
        self.driver.execute_script(script)
    }

    /// Handles of all open windows
    pub fn window_handles(&self) -> PageResult<Vec<String>> {
        self.driver.window_handles()
    }

    /// Switch to a window by handle
    pub fn switch_to_window(&self, handle: &str) -> PageResult<()> {
        self.driver.switch_to_window(handle)
    }

    /// Switch to a frame
    pub fn switch_to_frame(&self, frame: &FrameTarget) -> PageResult<()> {
        self.driver.switch_to_frame(frame)
    }

    /// URL of the current browsing context
    pub fn current_url(&self) -> PageResult<String> {
        self.driver.current_url()
    }

    // -------------------------------------------------------------------------
    // waits
    // -------------------------------------------------------------------------

    fn wait_options(&self, spec: &WaitSpec) -> WaitOptions {
        let timeout = spec
            .timeout
            .or_else(|| self.object.timeout())
            .unwrap_or_else(|| self.config.timeout());
        WaitOptions::new()
            .with_timeout(millis(timeout))
            .with_poll_interval(self.config.poll_interval_ms)
    }

    /// Poll `predicate` under the page's timeout policy
    pub fn wait_until<F>(&self, predicate: F, description: &str, spec: &WaitSpec) -> PageResult<()>
    where
        F: FnMut() -> bool,
    {
        spec.settle(Waiter::new().wait_for_function(
            predicate,
            description,
            &self.wait_options(spec),
        ))
    }

    /// Run `action`, then wait for the `<html>` root to be replaced and the
    /// new document to finish loading
    pub fn wait_page_loaded<T, F>(&self, spec: &WaitSpec, action: F) -> PageResult<T>
    where
        F: FnOnce() -> PageResult<T>,
    {
        let driver = self.driver();
        let old = cache::root_identity(driver)?;
        let output = action()?;
        self.wait_until(
            || cache::root_identity(driver).is_ok_and(|id| id != old),
            "page change",
            spec,
        )?;
        debug!("Page changed, waiting for document ready");
        self.wait_until(
            || matches!(driver.execute_script(READY_STATE_SCRIPT), Ok(Value::Bool(true))),
            "document ready",
            spec,
        )?;
        debug!("Page completed");
        Ok(output)
    }

    fn displayed(&self, locator: &Locator) -> bool {
        self.driver
            .find_element(&SearchContext::Document, locator)
            .and_then(|element| self.driver.is_displayed(&element))
            .unwrap_or(false)
    }

    fn plain_locator(&self, name: &str) -> PageResult<Locator> {
        let root = self.root();
        let field = root.field(name)?;
        match field.kind() {
            FieldKind::Template { .. } => Err(PageError::UnknownField {
                name: name.to_string(),
                kind: "non-template",
            }),
            _ => Ok(field.locator().clone()),
        }
    }

    /// Wait until the named field resolves to a displayed element
    pub fn wait_element_displayed(&self, name: &str, spec: &WaitSpec) -> PageResult<()> {
        let locator = self.plain_locator(name)?;
        debug!("Waiting for {locator} to display");
        self.wait_until(|| self.displayed(&locator), &format!("{name} displayed"), spec)
    }

    /// Wait until the named field no longer resolves to a displayed element
    pub fn wait_element_disappeared(&self, name: &str, spec: &WaitSpec) -> PageResult<()> {
        let locator = self.plain_locator(name)?;
        debug!("Waiting for {locator} to disappear");
        self.wait_until(|| !self.displayed(&locator), &format!("{name} disappeared"), spec)
    }

    /// Run `action`, then wait until the named field resolves to a different
    /// element than before
    pub fn wait_element_changed<T, F>(&self, name: &str, spec: &WaitSpec, action: F) -> PageResult<T>
    where
        F: FnOnce() -> PageResult<T>,
    {
        let locator = self.plain_locator(name)?;
        let lookup = || self.driver.find_element(&SearchContext::Document, &locator);
        let old = match lookup() {
            Ok(element) => Some(element.id),
            Err(err) => {
                warn!("Element {name} does not exist yet: {err}");
                None
            }
        };
        let output = action()?;
        self.wait_until(
            || lookup().is_ok_and(|element| Some(&element.id) != old.as_ref()),
            &format!("{name} changed"),
            spec,
        )?;
        Ok(output)
    }

    /// Wait until an alert is open, then hand it over
    pub fn alert(&self, spec: &WaitSpec) -> PageResult<Alert<'_>> {
        debug!("Switching to alert");
        self.wait_until(
            || matches!(self.driver.alert_text(), Ok(Some(_))),
            "alert present",
            spec,
        )?;
        let message = self.driver.alert_text()?.ok_or_else(|| PageError::NotFound {
            locator: "alert".to_string(),
        })?;
        Ok(Alert {
            driver: self.driver(),
            message,
        })
    }

    /// Wait until the client-side library has no request in flight
    pub fn wait_ajax(&self, library: &AjaxLibrary, spec: &WaitSpec) -> PageResult<()> {
        debug!("Waiting for AJAX using {library:?}");
        let script = library.idle_script();
        self.wait_until(
            || matches!(self.driver.execute_script(script), Ok(Value::Bool(true))),
            "ajax idle",
            spec,
        )
    }
}

// =============================================================================
// ALERTS
// =============================================================================

/// An open alert, confirm or prompt
pub struct Alert<'p> {
    driver: &'p dyn PageDriver,
    message: String,
}

impl fmt::Debug for Alert<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alert")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Alert<'_> {
    /// Message shown when the alert was taken
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Press OK
    pub fn accept(self) -> PageResult<()> {
        debug!("Accepting alert {:?}", self.message);
        self.driver.accept_alert()
    }

    /// Type into the prompt, then press OK
    pub fn accept_with(self, text: &str) -> PageResult<()> {
        self.driver.send_alert_text(text)?;
        self.accept()
    }

    /// Press Cancel
    pub fn dismiss(self) -> PageResult<()> {
        debug!("Dismissing alert {:?}", self.message);
        self.driver.dismiss_alert()
    }
}

// =============================================================================
// COMPONENT CONTEXT
// =============================================================================

/// Lookups scoped to one element (or the document), typed by a page object
#[derive(Clone)]
pub struct ComponentContext<'p> {
    page: &'p PageContext,
    scope: SearchContext,
    object: Arc<PageObject>,
}

impl fmt::Debug for ComponentContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentContext")
            .field("page", &self.page.name())
            .field("object", &self.object.name())
            .field("scope", &self.scope)
            .finish()
    }
}

impl<'p> ComponentContext<'p> {
    /// Owning page
    #[must_use]
    pub const fn page(&self) -> &'p PageContext {
        self.page
    }

    /// Driver of the session
    #[must_use]
    pub fn driver(&self) -> &'p dyn PageDriver {
        self.page.driver()
    }

    /// Search scope of this context
    #[must_use]
    pub const fn scope(&self) -> &SearchContext {
        &self.scope
    }

    /// Root element (`None` for the page root)
    #[must_use]
    pub const fn element(&self) -> Option<&ElementHandle> {
        self.scope.element()
    }

    /// Page object typing this context
    #[must_use]
    pub const fn object(&self) -> &Arc<PageObject> {
        &self.object
    }

    /// Adapter value of the root element (`Null` for the page root)
    pub fn value(&self) -> PageResult<Value> {
        match &self.scope {
            SearchContext::Document => Ok(Value::Null),
            SearchContext::Element(element) => adapter::read(self.driver(), element),
        }
    }

    /// Trimmed text of the root element (empty for the page root)
    pub fn text(&self) -> PageResult<String> {
        match &self.scope {
            SearchContext::Document => Ok(String::new()),
            SearchContext::Element(element) => text_content(self.driver(), element),
        }
    }

    /// Context rooted at `element`, typed by `object`
    #[must_use]
    pub fn component(&self, element: ElementHandle, object: Arc<PageObject>) -> Self {
        Self {
            page: self.page,
            scope: SearchContext::Element(element),
            object,
        }
    }

    pub(crate) fn field(&self, name: &str) -> PageResult<&Field> {
        self.object.field(name).ok_or_else(|| PageError::UnknownField {
            name: name.to_string(),
            kind: "named",
        })
    }

    /// Read a field
    pub fn read_field(&self, name: &str) -> PageResult<Resolved<'p>> {
        let field = self.field(name)?;
        debug!("Reading {}.{name} ({})", self.object.name(), field.locator());
        match field.kind() {
            FieldKind::Single => self.read_single(field, field.locator()),
            FieldKind::Multi => self.read_multi(field, field.locator()),
            FieldKind::Template { .. } => Ok(Resolved::Template(TemplateField {
                context: self.clone(),
                name: name.to_string(),
            })),
            FieldKind::Dictionary(_) => self.read_dictionary(field),
            FieldKind::Table(_) => self.swallow(field, self.table_of(field).map(Resolved::Table)),
        }
    }

    /// Write a field
    pub fn write_field(&self, name: &str, value: &Value) -> PageResult<()> {
        let field = self.field(name)?;
        debug!("Setting {}.{name} ({})", self.object.name(), field.locator());
        match field.kind() {
            FieldKind::Single => self.write_single(field, field.locator(), value),
            FieldKind::Multi => self.write_multi(field, field.locator(), value),
            FieldKind::Dictionary(_) => self.write_dictionary(field, value),
            FieldKind::Template { .. } => Err(PageError::invalid(format!(
                "template field {name} needs parameters, write it through template()"
            ))),
            FieldKind::Table(_) => Err(PageError::invalid(format!("table field {name} is read-only"))),
        }
    }

    /// Template accessor of a field
    pub fn template(&self, name: &str) -> PageResult<TemplateField<'p>> {
        match self.field(name)?.kind() {
            FieldKind::Template { .. } => Ok(TemplateField {
                context: self.clone(),
                name: name.to_string(),
            }),
            _ => Err(PageError::UnknownField {
                name: name.to_string(),
                kind: "template",
            }),
        }
    }

    /// Table projector of a field; lookup failures of the container propagate
    pub fn table(&self, name: &str) -> PageResult<Table<'p>> {
        self.table_of(self.field(name)?)
    }

    fn table_of(&self, field: &Field) -> PageResult<Table<'p>> {
        let Some(layout) = field.table() else {
            return Err(PageError::UnknownField {
                name: field.name().to_string(),
                kind: "table",
            });
        };
        let container = self.lookup_one(field, field.locator(), true)?;
        let object = field
            .spec()
            .component
            .clone()
            .unwrap_or_else(|| PageObject::empty(field.name()));
        Ok(Table::new(self.component(container, object), layout))
    }

    // -------------------------------------------------------------------------
    // resolution
    // -------------------------------------------------------------------------

    fn options(&self, field: &Field) -> ResolveOptions {
        let config = self.page.config();
        let timeout = field
            .spec()
            .timeout
            .or_else(|| self.object.timeout())
            .unwrap_or_else(|| config.timeout());
        ResolveOptions::immediate()
            .with_timeout(timeout)
            .with_poll_interval(config.poll_interval())
            .with_ignore_visibility(field.spec().ignore_visibility)
    }

    fn caching(&self) -> bool {
        self.page.config().cache_enabled
    }

    fn cache_read(&self, scope: &SearchContext, fingerprint: &str, locator: &Locator) -> PageResult<Option<CachedHandles>> {
        self.page
            .cache
            .borrow_mut()
            .read(self.driver(), scope.id(), fingerprint, locator)
    }

    fn cache_write(
        &self,
        scope: &SearchContext,
        fingerprint: &str,
        locator: &Locator,
        handles: CachedHandles,
    ) -> PageResult<()> {
        self.page
            .cache
            .borrow_mut()
            .write(self.driver(), scope.id(), fingerprint, locator, handles)
    }

    /// One element, served from the cache when `use_cache` holds. A fresh
    /// resolution always refreshes the cache entry.
    pub(crate) fn lookup_one(
        &self,
        field: &Field,
        locator: &Locator,
        use_cache: bool,
    ) -> PageResult<ElementHandle> {
        let driver = self.driver();
        if !self.caching() {
            return resolver::find_one(driver, &self.scope, locator, &self.options(field));
        }
        let fingerprint = cache::fingerprint(driver, &self.scope)?;
        if use_cache {
            let hit = self.cache_read(&self.scope, &fingerprint, locator)?;
            if let Some(CachedHandles::One(handle)) = hit {
                return Ok(handle);
            }
        }
        let handle = resolver::find_one(driver, &self.scope, locator, &self.options(field))?;
        self.cache_write(&self.scope, &fingerprint, locator, CachedHandles::One(handle.clone()))?;
        Ok(handle)
    }

    fn lookup_many(
        &self,
        field: &Field,
        locator: &Locator,
        use_cache: bool,
    ) -> PageResult<Vec<ElementHandle>> {
        let driver = self.driver();
        if !self.caching() {
            return resolver::find_many(driver, &self.scope, locator, &self.options(field));
        }
        let fingerprint = cache::fingerprint(driver, &self.scope)?;
        if use_cache {
            let hit = self.cache_read(&self.scope, &fingerprint, locator)?;
            if let Some(CachedHandles::Many(handles)) = hit {
                return Ok(handles);
            }
        }
        let handles = resolver::find_many(driver, &self.scope, locator, &self.options(field))?;
        self.cache_write(&self.scope, &fingerprint, locator, CachedHandles::Many(handles.clone()))?;
        Ok(handles)
    }

    /// Container, then per item a key text and value element(s). Items
    /// missing either are dropped.
    fn dictionary_entries(
        &self,
        field: &Field,
        dict: &DictLocators,
        use_cache: bool,
    ) -> PageResult<Vec<(String, Vec<ElementHandle>)>> {
        let driver = self.driver();
        let container = self.lookup_one(field, field.locator(), use_cache)?;
        let scope = SearchContext::Element(container);
        let fingerprint = if self.caching() {
            let fingerprint = cache::fingerprint(driver, &scope)?;
            if use_cache {
                let hit = self.cache_read(&scope, &fingerprint, &dict.item)?;
                if let Some(CachedHandles::Keyed(entries)) = hit {
                    return Ok(entries);
                }
            }
            Some(fingerprint)
        } else {
            None
        };

        let mut entries: Vec<(String, Vec<ElementHandle>)> = Vec::new();
        for item in driver.find_elements(&scope, &dict.item)? {
            let item_scope = SearchContext::Element(item);
            let key = match driver
                .find_element(&item_scope, &dict.key)
                .and_then(|key| text_content(driver, &key))
            {
                Ok(key) => key,
                Err(err) => {
                    debug!("Dropping item without key: {err}");
                    continue;
                }
            };
            let values = if dict.multi_value {
                driver.find_elements(&item_scope, &dict.value)
            } else {
                driver.find_element(&item_scope, &dict.value).map(|v| vec![v])
            };
            match values {
                Ok(values) if !values.is_empty() => {
                    match entries.iter_mut().find(|(k, _)| *k == key) {
                        Some(entry) => entry.1 = values,
                        None => entries.push((key, values)),
                    }
                }
                Ok(_) => debug!("Dropping item {key:?} without value"),
                Err(err) => debug!("Dropping item {key:?} without value: {err}"),
            }
        }
        debug!("{} dictionary item(s) in {}", entries.len(), field.name());

        if let Some(fingerprint) = fingerprint {
            self.cache_write(&scope, &fingerprint, &dict.item, CachedHandles::Keyed(entries.clone()))?;
        }
        Ok(entries)
    }

    // -------------------------------------------------------------------------
    // presentation
    // -------------------------------------------------------------------------

    /// Write target handed to write hooks
    fn target(&self, field: &Field, handle: ElementHandle) -> Resolved<'p> {
        match &field.spec().component {
            Some(component) => Resolved::Component(self.component(handle, Arc::clone(component))),
            None => Resolved::Element(handle),
        }
    }

    /// Read result: component, adapter value or raw handle, then the read hook
    fn present(&self, field: &Field, handle: ElementHandle) -> PageResult<Resolved<'p>> {
        let spec = field.spec();
        let resolved = if spec.component.is_some() {
            self.target(field, handle)
        } else if spec.value_only {
            Resolved::Value(adapter::read(self.driver(), &handle)?)
        } else {
            Resolved::Element(handle)
        };
        Ok(match &spec.read_hook {
            Some(hook) => hook(self, resolved),
            None => resolved,
        })
    }

    fn swallow(&self, field: &Field, outcome: PageResult<Resolved<'p>>) -> PageResult<Resolved<'p>> {
        match outcome {
            Err(err) if err.is_lookup_failure() => {
                warn!("Cannot find {} ({}): {err}", field.name(), field.locator());
                Ok(Resolved::Null)
            }
            other => other,
        }
    }

    fn write_handle(&self, field: &Field, handle: ElementHandle, value: &Value) -> PageResult<()> {
        match &field.spec().write_hook {
            Some(hook) => {
                let target = self.target(field, handle);
                hook(self, &target, value)
            }
            None => adapter::write(self.driver(), &handle, value),
        }
    }

    // -------------------------------------------------------------------------
    // field kinds
    // -------------------------------------------------------------------------

    pub(crate) fn read_single(&self, field: &Field, locator: &Locator) -> PageResult<Resolved<'p>> {
        let outcome = self
            .lookup_one(field, locator, true)
            .and_then(|handle| self.present(field, handle));
        self.swallow(field, outcome)
    }

    pub(crate) fn write_single(&self, field: &Field, locator: &Locator, value: &Value) -> PageResult<()> {
        let handle = self.lookup_one(field, locator, field.spec().write_hook.is_some())?;
        self.write_handle(field, handle, value)
    }

    pub(crate) fn read_multi(&self, field: &Field, locator: &Locator) -> PageResult<Resolved<'p>> {
        let outcome = self.lookup_many(field, locator, true).and_then(|handles| {
            handles
                .into_iter()
                .map(|handle| self.present(field, handle))
                .collect::<PageResult<Vec<_>>>()
                .map(Resolved::List)
        });
        self.swallow(field, outcome)
    }

    pub(crate) fn write_multi(&self, field: &Field, locator: &Locator, value: &Value) -> PageResult<()> {
        let payload = MultiWrite::parse(value)?;
        let handles = self.lookup_many(field, locator, field.spec().write_hook.is_some())?;
        for (index, item) in payload.assign(handles.len()) {
            self.write_handle(field, handles[index].clone(), item)?;
        }
        Ok(())
    }

    fn dict_locators<'f>(field: &'f Field) -> PageResult<&'f DictLocators> {
        field.dictionary().ok_or_else(|| PageError::UnknownField {
            name: field.name().to_string(),
            kind: "dictionary",
        })
    }

    fn read_dictionary(&self, field: &Field) -> PageResult<Resolved<'p>> {
        let dict = Self::dict_locators(field)?;
        let outcome = self.dictionary_entries(field, dict, true).and_then(|entries| {
            entries
                .into_iter()
                .map(|(key, handles)| {
                    let value = if dict.multi_value {
                        Resolved::List(
                            handles
                                .into_iter()
                                .map(|handle| self.present(field, handle))
                                .collect::<PageResult<Vec<_>>>()?,
                        )
                    } else {
                        match handles.into_iter().next() {
                            Some(handle) => self.present(field, handle)?,
                            None => Resolved::Null,
                        }
                    };
                    Ok((key, value))
                })
                .collect::<PageResult<Vec<_>>>()
                .map(Resolved::Map)
        });
        self.swallow(field, outcome)
    }

    fn write_dictionary(&self, field: &Field, value: &Value) -> PageResult<()> {
        let Value::Object(values) = value else {
            return Err(PageError::invalid(format!(
                "dictionary {} expects a mapping, got {value}",
                field.name()
            )));
        };
        let dict = Self::dict_locators(field)?;
        let entries = self.dictionary_entries(field, dict, field.spec().write_hook.is_some())?;
        for (key, item) in values {
            let Some((_, handles)) = entries.iter().find(|(k, _)| k == key) else {
                debug!("No item {key:?} in {}, ignored", field.name());
                continue;
            };
            if dict.multi_value {
                for (index, part) in MultiWrite::parse(item)?.assign(handles.len()) {
                    self.write_handle(field, handles[index].clone(), part)?;
                }
            } else if let Some(handle) = handles.first() {
                self.write_handle(field, handle.clone(), item)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// TEMPLATE ACCESSOR
// =============================================================================

/// Deferred accessor of a template field; resolves once parameters are known
#[derive(Debug, Clone)]
pub struct TemplateField<'p> {
    context: ComponentContext<'p>,
    name: String,
}

impl<'p> TemplateField<'p> {
    /// Field name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn parts(&self) -> PageResult<(&Field, bool)> {
        let field = self.context.field(&self.name)?;
        match field.kind() {
            FieldKind::Template { multi } => Ok((field, *multi)),
            _ => Err(PageError::UnknownField {
                name: self.name.clone(),
                kind: "template",
            }),
        }
    }

    /// Locator produced by `params`
    pub fn locator<S: AsRef<str>>(&self, params: &[S]) -> PageResult<Locator> {
        self.parts()?.0.locator().solidify(params)
    }

    /// Resolve with `params` and read
    pub fn read<S: AsRef<str>>(&self, params: &[S]) -> PageResult<Resolved<'p>> {
        let (field, multi) = self.parts()?;
        let locator = field.locator().solidify(params)?;
        if multi {
            self.context.read_multi(field, &locator)
        } else {
            self.context.read_single(field, &locator)
        }
    }

    /// Resolve with `params` and write
    pub fn write<S: AsRef<str>>(&self, params: &[S], value: &Value) -> PageResult<()> {
        let (field, multi) = self.parts()?;
        let locator = field.locator().solidify(params)?;
        if multi {
            self.context.write_multi(field, &locator, value)
        } else {
            self.context.write_single(field, &locator, value)
        }
    }
}
