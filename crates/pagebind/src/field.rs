//! Field descriptors.
//!
//! A [`FieldSpec`] is the declaration registered on a page object builder.
//! [`crate::PageObjectBuilder::build`] binds it into a [`Field`], resolving
//! the strategy of every locator it carries so nothing is left unresolved at
//! access time.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::context::{ComponentContext, Resolved};
use crate::locator::{Locator, LocatorSpec, Strategy};
use crate::page_object::PageObject;
use crate::result::PageResult;
use crate::table::{TableLayout, TableSpec};

/// Post-processing applied to a successfully read field value
pub type ReadHook =
    Arc<dyn for<'a> Fn(&ComponentContext<'a>, Resolved<'a>) -> Resolved<'a> + Send + Sync>;

/// Replaces the value adapter on write; receives the resolved target
pub type WriteHook = Arc<
    dyn for<'a> Fn(&ComponentContext<'a>, &Resolved<'a>, &Value) -> PageResult<()> + Send + Sync,
>;

/// Dictionary layout: items inside the container, key and value inside items
#[derive(Debug, Clone)]
pub struct DictSpec {
    /// Item elements, scoped to the container
    pub item: LocatorSpec,
    /// Key element, scoped to an item; its trimmed text is the key
    pub key: LocatorSpec,
    /// Value element(s), scoped to an item
    pub value: LocatorSpec,
    /// Resolve every matching value element instead of the first
    pub multi_value: bool,
}

impl DictSpec {
    /// Create a dictionary layout
    pub fn new(
        item: impl Into<LocatorSpec>,
        key: impl Into<LocatorSpec>,
        value: impl Into<LocatorSpec>,
    ) -> Self {
        Self {
            item: item.into(),
            key: key.into(),
            value: value.into(),
            multi_value: false,
        }
    }

    /// Values are lists of elements
    #[must_use]
    pub const fn multi_value(mut self) -> Self {
        self.multi_value = true;
        self
    }
}

/// Shape of a field
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// One element
    Single,
    /// Every matching element
    Multi,
    /// Selector is a template solidified per access
    Template {
        /// Resolve all matches instead of one
        multi: bool,
    },
    /// Key/value items inside a container
    Dictionary(DictSpec),
    /// Rows projected into records
    Table(TableSpec),
}

impl FieldKind {
    /// Short name used in errors and logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
            Self::Template { .. } => "template",
            Self::Dictionary(_) => "dictionary",
            Self::Table(_) => "table",
        }
    }
}

/// Declaration of a named field
#[derive(Clone)]
pub struct FieldSpec {
    /// Locator of the element(s) or container
    pub locator: LocatorSpec,
    /// Field shape
    pub kind: FieldKind,
    /// Strategy for this field's locators when they name none
    pub strategy_override: Option<Strategy>,
    /// Wrap resolved elements into this component
    pub component: Option<Arc<PageObject>>,
    /// Read through the value adapter instead of returning handles
    pub value_only: bool,
    /// Operate on the element even if it never became visible
    pub ignore_visibility: bool,
    /// Field-level timeout
    pub timeout: Option<Duration>,
    /// Read post-processing
    pub read_hook: Option<ReadHook>,
    /// Write replacement
    pub write_hook: Option<WriteHook>,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("locator", &self.locator)
            .field("kind", &self.kind.name())
            .field("strategy_override", &self.strategy_override)
            .field("component", &self.component.as_ref().map(|c| c.name().to_string()))
            .field("value_only", &self.value_only)
            .field("ignore_visibility", &self.ignore_visibility)
            .field("timeout", &self.timeout)
            .field("read_hook", &self.read_hook.is_some())
            .field("write_hook", &self.write_hook.is_some())
            .finish()
    }
}

impl FieldSpec {
    fn with_kind(locator: impl Into<LocatorSpec>, kind: FieldKind) -> Self {
        Self {
            locator: locator.into(),
            kind,
            strategy_override: None,
            component: None,
            value_only: false,
            ignore_visibility: false,
            timeout: None,
            read_hook: None,
            write_hook: None,
        }
    }

    /// One element
    pub fn single(locator: impl Into<LocatorSpec>) -> Self {
        Self::with_kind(locator, FieldKind::Single)
    }

    /// Every matching element
    pub fn multi(locator: impl Into<LocatorSpec>) -> Self {
        Self::with_kind(locator, FieldKind::Multi)
    }

    /// One element addressed by a `{}`/`{N}` selector template
    pub fn template(locator: impl Into<LocatorSpec>) -> Self {
        Self::with_kind(locator, FieldKind::Template { multi: false })
    }

    /// Every element matching a selector template
    pub fn template_multi(locator: impl Into<LocatorSpec>) -> Self {
        Self::with_kind(locator, FieldKind::Template { multi: true })
    }

    /// Key/value items inside the container at `locator`
    pub fn dictionary(locator: impl Into<LocatorSpec>, layout: DictSpec) -> Self {
        Self::with_kind(locator, FieldKind::Dictionary(layout))
    }

    /// Table rooted at the container at `locator`
    pub fn table(locator: impl Into<LocatorSpec>, layout: TableSpec) -> Self {
        Self::with_kind(locator, FieldKind::Table(layout))
    }

    /// Default strategy for this field's locators
    #[must_use]
    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy_override = Some(strategy);
        self
    }

    /// Wrap resolved elements into a component
    #[must_use]
    pub fn with_component(mut self, component: Arc<PageObject>) -> Self {
        self.component = Some(component);
        self
    }

    /// Return adapter values instead of handles
    #[must_use]
    pub const fn value_only(mut self) -> Self {
        self.value_only = true;
        self
    }

    /// Tolerate a visibility timeout
    #[must_use]
    pub const fn ignore_visibility(mut self) -> Self {
        self.ignore_visibility = true;
        self
    }

    /// Field-level timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Post-process read values
    #[must_use]
    pub fn with_read_hook<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&ComponentContext<'a>, Resolved<'a>) -> Resolved<'a> + Send + Sync + 'static,
    {
        self.read_hook = Some(Arc::new(hook));
        self
    }

    /// Replace the value adapter on write
    #[must_use]
    pub fn with_write_hook<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&ComponentContext<'a>, &Resolved<'a>, &Value) -> PageResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.write_hook = Some(Arc::new(hook));
        self
    }

    /// Bind every locator against the container and global defaults
    pub(crate) fn bind(
        self,
        name: &str,
        container_default: Option<Strategy>,
        global_default: Strategy,
    ) -> PageResult<Field> {
        let bind = |spec: &LocatorSpec| {
            spec.bind(self.strategy_override, container_default, global_default)
        };
        let locator = bind(&self.locator)?;
        let layout = match &self.kind {
            FieldKind::Dictionary(dict) => Layout::Dictionary(DictLocators {
                item: bind(&dict.item)?,
                key: bind(&dict.key)?,
                value: bind(&dict.value)?,
                multi_value: dict.multi_value,
            }),
            FieldKind::Table(table) => Layout::Table(Arc::new(TableLayout::bind(table, &bind)?)),
            _ => Layout::Plain,
        };
        Ok(Field {
            name: name.to_string(),
            locator,
            layout,
            spec: self,
        })
    }
}

/// Bound dictionary locators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictLocators {
    /// Items, scoped to the container
    pub item: Locator,
    /// Key, scoped to an item
    pub key: Locator,
    /// Value(s), scoped to an item
    pub value: Locator,
    /// Resolve a list of value elements
    pub multi_value: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum Layout {
    Plain,
    Dictionary(DictLocators),
    Table(Arc<TableLayout>),
}

/// A field bound to a page object: declaration plus resolved locators
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    locator: Locator,
    layout: Layout,
    spec: FieldSpec,
}

impl Field {
    /// Field name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound locator of the element(s) or container
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Declaration the field was bound from
    #[must_use]
    pub const fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Field shape
    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.spec.kind
    }

    /// Bound dictionary locators
    #[must_use]
    pub const fn dictionary(&self) -> Option<&DictLocators> {
        match &self.layout {
            Layout::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Bound table layout
    #[must_use]
    pub fn table(&self) -> Option<Arc<TableLayout>> {
        match &self.layout {
            Layout::Table(table) => Some(Arc::clone(table)),
            _ => None,
        }
    }
}
