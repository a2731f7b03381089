//! Table projection.
//!
//! A table field resolves a container; rows are matched inside it and each
//! row is projected into a [`Record`] of named column values. Columns come
//! either from the row's cells by index or from a locator scoped to the row.
//!
//! Rows are fetched fresh on every call. A row that vanishes while it is
//! being projected yields an all-null record instead of failing the query.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::adapter;
use crate::context::ComponentContext;
use crate::driver::{ElementHandle, PageDriver, SearchContext};
use crate::locator::{Locator, LocatorSpec, Strategy};
use crate::page_object::PageObject;
use crate::result::{PageError, PageResult};

/// Turns a cell element into a column value
pub type Extractor =
    Arc<dyn Fn(&dyn PageDriver, &ElementHandle) -> PageResult<Value> + Send + Sync>;

/// Row predicate over one column value
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

// =============================================================================
// DECLARATION
// =============================================================================

/// Where a column's element comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// Zero-based position among the row's cells
    Index(usize),
    /// Locator scoped to the row
    Locator(LocatorSpec),
}

/// Declared column
#[derive(Clone)]
pub struct ColumnSpec {
    name: String,
    source: ColumnSource,
    extractor: Option<Extractor>,
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("extractor", &self.extractor.is_some())
            .finish()
    }
}

impl ColumnSpec {
    /// Column taken from the cell at `index`
    #[must_use]
    pub fn index(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            source: ColumnSource::Index(index),
            extractor: None,
        }
    }

    /// Column taken from a row-scoped locator
    #[must_use]
    pub fn locator(name: impl Into<String>, locator: impl Into<LocatorSpec>) -> Self {
        Self {
            name: name.into(),
            source: ColumnSource::Locator(locator.into()),
            extractor: None,
        }
    }

    /// Replace the value adapter for this column
    #[must_use]
    pub fn with_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&dyn PageDriver, &ElementHandle) -> PageResult<Value> + Send + Sync + 'static,
    {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    /// Column name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Declared table layout
#[derive(Clone)]
pub struct TableSpec {
    rows: LocatorSpec,
    cells: Option<LocatorSpec>,
    columns: Vec<ColumnSpec>,
    row_component: Option<Arc<PageObject>>,
    column_template: Option<LocatorSpec>,
}

impl fmt::Debug for TableSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSpec")
            .field("rows", &self.rows)
            .field("cells", &self.cells)
            .field("columns", &self.columns)
            .field("row_component", &self.row_component.as_ref().map(|c| c.name()))
            .field("column_template", &self.column_template)
            .finish()
    }
}

impl TableSpec {
    /// Layout whose rows match `rows` inside the container
    #[must_use]
    pub fn new(rows: impl Into<LocatorSpec>) -> Self {
        Self {
            rows: rows.into(),
            cells: None,
            columns: Vec::new(),
            row_component: None,
            column_template: None,
        }
    }

    /// Cells of a row (default: `td` tags)
    #[must_use]
    pub fn with_cells(mut self, cells: impl Into<LocatorSpec>) -> Self {
        self.cells = Some(cells.into());
        self
    }

    /// Add a column read from the cell at `index`
    #[must_use]
    pub fn with_column(self, name: impl Into<String>, index: usize) -> Self {
        self.with_column_spec(ColumnSpec::index(name, index))
    }

    /// Add a column read from a row-scoped locator
    #[must_use]
    pub fn with_column_locator(
        self,
        name: impl Into<String>,
        locator: impl Into<LocatorSpec>,
    ) -> Self {
        self.with_column_spec(ColumnSpec::locator(name, locator))
    }

    /// Add a fully specified column
    #[must_use]
    pub fn with_column_spec(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Type row contexts handed to [`Table::apply`] and [`Table::row`]
    #[must_use]
    pub fn with_row_component(mut self, component: Arc<PageObject>) -> Self {
        self.row_component = Some(component);
        self
    }

    /// Container-scoped template producing a column's cells from its identifier
    #[must_use]
    pub fn with_column_template(mut self, template: impl Into<LocatorSpec>) -> Self {
        self.column_template = Some(template.into());
        self
    }
}

// =============================================================================
// BOUND LAYOUT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Index(usize),
    Locator(Locator),
}

#[derive(Clone)]
struct Column {
    name: String,
    source: Source,
    extractor: Option<Extractor>,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Column {
    fn extract(&self, driver: &dyn PageDriver, cell: &ElementHandle) -> PageResult<Value> {
        match &self.extractor {
            Some(extractor) => extractor(driver, cell),
            None => adapter::read(driver, cell),
        }
    }
}

/// Table layout with every locator bound to a strategy
#[derive(Clone)]
pub struct TableLayout {
    rows: Locator,
    cells: Locator,
    columns: Vec<Column>,
    row_component: Option<Arc<PageObject>>,
    column_template: Option<Locator>,
}

impl fmt::Debug for TableLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableLayout")
            .field("rows", &self.rows)
            .field("cells", &self.cells)
            .field("columns", &self.columns)
            .field("column_template", &self.column_template)
            .finish_non_exhaustive()
    }
}

impl TableLayout {
    pub(crate) fn bind(
        spec: &TableSpec,
        bind: &dyn Fn(&LocatorSpec) -> PageResult<Locator>,
    ) -> PageResult<Self> {
        let mut columns: Vec<Column> = Vec::with_capacity(spec.columns.len());
        for column in &spec.columns {
            if columns.iter().any(|c| c.name == column.name) {
                return Err(PageError::invalid(format!(
                    "duplicate table column {:?}",
                    column.name
                )));
            }
            let source = match &column.source {
                ColumnSource::Index(index) => Source::Index(*index),
                ColumnSource::Locator(locator) => Source::Locator(bind(locator)?),
            };
            columns.push(Column {
                name: column.name.clone(),
                source,
                extractor: column.extractor.clone(),
            });
        }

        let column_template = match &spec.column_template {
            Some(template) => {
                let locator = bind(template)?;
                if !locator.is_template() {
                    return Err(PageError::invalid(format!(
                        "column template {locator} has no placeholder"
                    )));
                }
                Some(locator)
            }
            None => None,
        };

        let default_cells = LocatorSpec::with_strategy(Strategy::TagName, "td");
        Ok(Self {
            rows: bind(&spec.rows)?,
            cells: bind(spec.cells.as_ref().unwrap_or(&default_cells))?,
            columns,
            row_component: spec.row_component.clone(),
            column_template,
        })
    }

    /// Row locator, scoped to the container
    #[must_use]
    pub const fn rows(&self) -> &Locator {
        &self.rows
    }

    /// Cell locator, scoped to a row
    #[must_use]
    pub const fn cells(&self) -> &Locator {
        &self.cells
    }

    /// Column names in declaration order
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn has_index_columns(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c.source, Source::Index(_)))
    }
}

// =============================================================================
// QUERIES
// =============================================================================

#[derive(Clone)]
enum Condition {
    Text(String),
    Predicate(Predicate),
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl Condition {
    fn holds(&self, value: &Value) -> bool {
        match self {
            Self::Text(_) if value.is_null() => false,
            Self::Text(text) => adapter::stringify(value).trim() == text,
            Self::Predicate(predicate) => predicate(value),
        }
    }
}

/// Conjunction of per-column conditions; empty matches every row
#[derive(Debug, Clone, Default)]
pub struct Query {
    conditions: Vec<(String, Condition)>,
}

impl Query {
    /// Query matching every row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Column's trimmed text equals `text`
    #[must_use]
    pub fn with_text(mut self, column: impl Into<String>, text: impl AsRef<str>) -> Self {
        self.conditions.push((
            column.into(),
            Condition::Text(text.as_ref().trim().to_string()),
        ));
        self
    }

    /// Column value satisfies `predicate`
    #[must_use]
    pub fn with_predicate<F>(mut self, column: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.conditions
            .push((column.into(), Condition::Predicate(Arc::new(predicate))));
        self
    }

    /// Whether no condition was added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    fn check_columns(&self, layout: &TableLayout) -> PageResult<()> {
        for (column, _) in &self.conditions {
            if !layout.columns.iter().any(|c| c.name == *column) {
                return Err(PageError::UnknownField {
                    name: column.clone(),
                    kind: "column",
                });
            }
        }
        Ok(())
    }

    fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(column, condition)| condition.holds(record.get(column).unwrap_or(&Value::Null)))
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// One projected row
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    index: usize,
    row: ElementHandle,
    fields: Vec<(String, Value)>,
    vanished: bool,
}

impl Record {
    fn vanished(index: usize, row: ElementHandle, layout: &TableLayout) -> Self {
        debug!("Row {index} vanished during projection");
        Self {
            index,
            row,
            fields: layout
                .columns
                .iter()
                .map(|c| (c.name.clone(), Value::Null))
                .collect(),
            vanished: true,
        }
    }

    /// Position of the row at query time
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Row element
    #[must_use]
    pub const fn row(&self) -> &ElementHandle {
        &self.row
    }

    /// Column value by name
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column values in declaration order
    #[must_use]
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Whether the row disappeared while it was projected
    #[must_use]
    pub const fn is_vanished(&self) -> bool {
        self.vanished
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// =============================================================================
// TABLE
// =============================================================================

/// A table field resolved to its container
#[derive(Debug, Clone)]
pub struct Table<'p> {
    container: ComponentContext<'p>,
    layout: Arc<TableLayout>,
}

impl<'p> Table<'p> {
    pub(crate) const fn new(container: ComponentContext<'p>, layout: Arc<TableLayout>) -> Self {
        Self { container, layout }
    }

    /// Container context
    #[must_use]
    pub const fn container(&self) -> &ComponentContext<'p> {
        &self.container
    }

    /// Bound layout
    #[must_use]
    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    fn rows(&self) -> PageResult<Vec<ElementHandle>> {
        self.container
            .driver()
            .find_elements(self.container.scope(), &self.layout.rows)
    }

    fn project(&self, index: usize, row: ElementHandle) -> Record {
        let driver = self.container.driver();
        let scope = SearchContext::Element(row.clone());
        let cells = if self.layout.has_index_columns() {
            match driver.find_elements(&scope, &self.layout.cells) {
                Ok(cells) => cells,
                Err(err) if err.is_stale() => return Record::vanished(index, row, &self.layout),
                Err(err) => {
                    debug!("No cells in row {index}: {err}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let mut fields = Vec::with_capacity(self.layout.columns.len());
        for column in &self.layout.columns {
            let cell = match &column.source {
                Source::Index(position) => {
                    cells.get(*position).cloned().ok_or_else(|| PageError::NotFound {
                        locator: format!("cell {position} of row {index}"),
                    })
                }
                Source::Locator(locator) => driver.find_element(&scope, locator),
            };
            match cell.and_then(|cell| column.extract(driver, &cell)) {
                Ok(value) => fields.push((column.name.clone(), value)),
                Err(err) if err.is_stale() => return Record::vanished(index, row, &self.layout),
                Err(err) => {
                    debug!("Column {} of row {index} is empty: {err}", column.name);
                    fields.push((column.name.clone(), Value::Null));
                }
            }
        }
        Record {
            index,
            row,
            fields,
            vanished: false,
        }
    }

    fn row_context(&self, row: ElementHandle) -> ComponentContext<'p> {
        let object = self
            .layout
            .row_component
            .clone()
            .unwrap_or_else(|| PageObject::empty("row"));
        self.container.component(row, object)
    }

    /// Every row, projected
    pub fn records(&self) -> PageResult<Vec<Record>> {
        self.query(&Query::new())
    }

    /// Rows matching `query`, in document order
    pub fn query(&self, query: &Query) -> PageResult<Vec<Record>> {
        query.check_columns(&self.layout)?;
        let records: Vec<Record> = self
            .rows()?
            .into_iter()
            .enumerate()
            .map(|(index, row)| self.project(index, row))
            .filter(|record| query.matches(record))
            .collect();
        debug!("{} row(s) matched {query:?}", records.len());
        Ok(records)
    }

    /// First row matching `query`; rows after it are not projected
    pub fn query_one(&self, query: &Query) -> PageResult<Option<Record>> {
        query.check_columns(&self.layout)?;
        Ok(self
            .rows()?
            .into_iter()
            .enumerate()
            .map(|(index, row)| self.project(index, row))
            .find(|record| query.matches(record)))
    }

    /// Run `action` on every matching row (only the first when `once`).
    /// Returns the number of rows acted on.
    pub fn apply<F>(&self, query: &Query, once: bool, mut action: F) -> PageResult<usize>
    where
        F: FnMut(&Record, &ComponentContext<'p>) -> PageResult<()>,
    {
        query.check_columns(&self.layout)?;
        let mut applied = 0;
        for (index, row) in self.rows()?.into_iter().enumerate() {
            let record = self.project(index, row.clone());
            if !query.matches(&record) {
                continue;
            }
            action(&record, &self.row_context(row))?;
            applied += 1;
            if once {
                break;
            }
        }
        Ok(applied)
    }

    /// Number of rows currently matched
    pub fn row_count(&self) -> PageResult<usize> {
        Ok(self.rows()?.len())
    }

    /// Context of the row at `index`
    pub fn row(&self, index: usize) -> PageResult<Option<ComponentContext<'p>>> {
        Ok(self
            .rows()?
            .into_iter()
            .nth(index)
            .map(|row| self.row_context(row)))
    }

    fn column_locator(&self, identifier: &str) -> PageResult<Locator> {
        self.layout
            .column_template
            .as_ref()
            .ok_or_else(|| PageError::invalid("table has no column template"))?
            .solidify(&[identifier])
    }

    /// Cells of a column, found through the column template
    pub fn column(&self, identifier: &str) -> PageResult<Vec<ElementHandle>> {
        let locator = self.column_locator(identifier)?;
        self.container
            .driver()
            .find_elements(self.container.scope(), &locator)
    }

    /// Adapter values of a column's cells
    pub fn column_values(&self, identifier: &str) -> PageResult<Vec<Value>> {
        let driver = self.container.driver();
        self.column(identifier)?
            .iter()
            .map(|cell| adapter::read(driver, cell))
            .collect()
    }

    /// Column cells wrapped into `component`
    pub fn column_with(
        &self,
        identifier: &str,
        component: &Arc<PageObject>,
    ) -> PageResult<Vec<ComponentContext<'p>>> {
        Ok(self
            .column(identifier)?
            .into_iter()
            .map(|cell| self.container.component(cell, Arc::clone(component)))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use crate::context::PageContext;
    use crate::field::FieldSpec;
    use crate::mock::{MockDriver, MockElement};
    use crate::page_object::PageObjectBuilder;
    use serde_json::json;
    use std::rc::Rc;

    fn order_row(number: &str, status: &str) -> MockElement {
        MockElement::new("tr").children([
            MockElement::new("td").text(number),
            MockElement::new("td").child(MockElement::new("span").class("status").text(status)),
            MockElement::new("td").child(MockElement::input("checkbox").class("pick")),
        ])
    }

    fn orders() -> Rc<MockDriver> {
        Rc::new(MockDriver::with_body(vec![MockElement::new("table")
            .id("orders")
            .child(MockElement::new("tbody").children([
                order_row("A-1", "Paid"),
                order_row("A-2", "Pending"),
                order_row("A-3", " Paid "),
            ]))]))
    }

    fn layout() -> TableSpec {
        let pick = PageObjectBuilder::new("order_row")
            .with_default_strategy(Strategy::Css)
            .with_field("pick", FieldSpec::single("input.pick").value_only())
            .build()
            .unwrap();
        TableSpec::new(Locator::css("tbody > tr"))
            .with_column("number", 0)
            .with_column_locator("status", Locator::css("span.status"))
            .with_row_component(pick)
            .with_column_template(Locator::css("tr > td:nth-child({})"))
    }

    fn page(driver: &Rc<MockDriver>, spec: TableSpec) -> PageContext {
        let object = PageObjectBuilder::new("orders")
            .with_field("orders", FieldSpec::table("orders", spec))
            .build()
            .unwrap();
        PageContext::with_config(driver.clone(), object, PageConfig::new().with_timeout(0))
    }

    mod bind_tests {
        use super::*;

        fn bind_css(spec: &LocatorSpec) -> PageResult<Locator> {
            spec.bind(None, None, Strategy::Css)
        }

        #[test]
        fn test_default_cells_are_td() {
            let layout = TableLayout::bind(&TableSpec::new("tr"), &bind_css).unwrap();
            assert_eq!(layout.cells(), &Locator::tag("td"));
            assert_eq!(layout.rows(), &Locator::css("tr"));
        }

        #[test]
        fn test_duplicate_columns_rejected() {
            let spec = TableSpec::new("tr").with_column("a", 0).with_column("a", 1);
            assert!(TableLayout::bind(&spec, &bind_css).is_err());
        }

        #[test]
        fn test_column_template_needs_placeholder() {
            let spec = TableSpec::new("tr").with_column_template("td");
            assert!(TableLayout::bind(&spec, &bind_css).is_err());
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_all_records() {
            let driver = orders();
            let page = page(&driver, layout());
            let records = page.table("orders").unwrap().records().unwrap();
            assert_eq!(records.len(), 3);
            assert_eq!(records[1].get("number"), Some(&json!("A-2")));
            assert_eq!(records[1].get("status"), Some(&json!("Pending")));
            assert_eq!(records[1].index(), 1);
        }

        #[test]
        fn test_text_condition_trims() {
            let driver = orders();
            let page = page(&driver, layout());
            let table = page.table("orders").unwrap();
            let paid = table.query(&Query::new().with_text("status", "Paid")).unwrap();
            let numbers: Vec<_> = paid.iter().map(|r| r.get("number").cloned()).collect();
            assert_eq!(numbers, vec![Some(json!("A-1")), Some(json!("A-3"))]);
        }

        #[test]
        fn test_query_one_stops_at_first_match() {
            let driver = orders();
            let page = page(&driver, layout());
            let table = page.table("orders").unwrap();
            driver.clear_history();
            let first = table
                .query_one(&Query::new().with_predicate("number", |v| v.as_str() != Some("A-9")))
                .unwrap()
                .unwrap();
            assert_eq!(first.index(), 0);
            assert_eq!(driver.count("find_element:css selector=span.status"), 1);
        }

        #[test]
        fn test_no_match() {
            let driver = orders();
            let page = page(&driver, layout());
            let table = page.table("orders").unwrap();
            let query = Query::new().with_text("status", "Refunded");
            assert!(table.query(&query).unwrap().is_empty());
            assert!(table.query_one(&query).unwrap().is_none());
        }

        #[test]
        fn test_unknown_column_rejected() {
            let driver = orders();
            let page = page(&driver, layout());
            let err = page
                .table("orders")
                .unwrap()
                .query(&Query::new().with_text("price", "1"))
                .unwrap_err();
            assert!(matches!(err, PageError::UnknownField { kind: "column", .. }));
        }

        #[test]
        fn test_missing_cell_is_null_and_never_equals() {
            let driver = orders();
            let spec = layout().with_column("ghost", 9);
            let page = page(&driver, spec);
            let table = page.table("orders").unwrap();
            let records = table.records().unwrap();
            assert!(records.iter().all(|r| r.get("ghost") == Some(&Value::Null)));
            assert!(table.query(&Query::new().with_text("ghost", "")).unwrap().is_empty());
        }

        #[test]
        fn test_custom_extractor() {
            let driver = orders();
            let spec = layout().with_column_spec(
                ColumnSpec::index("digits", 0).with_extractor(|driver, cell| {
                    let text = crate::driver::text_content(driver, cell)?;
                    Ok(json!(text.trim_start_matches("A-").parse::<u32>().unwrap_or(0)))
                }),
            );
            let page = page(&driver, spec);
            let records = page.table("orders").unwrap().records().unwrap();
            assert_eq!(records[2].get("digits"), Some(&json!(3)));
        }

        #[test]
        fn test_record_serializes_as_map() {
            let driver = orders();
            let page = page(&driver, layout());
            let first = page
                .table("orders")
                .unwrap()
                .query_one(&Query::new())
                .unwrap()
                .unwrap();
            assert_eq!(
                serde_json::to_value(&first).unwrap(),
                json!({"number": "A-1", "status": "Paid"})
            );
        }
    }

    mod apply_tests {
        use super::*;

        #[test]
        fn test_apply_writes_through_row_component() {
            let driver = orders();
            let page = page(&driver, layout());
            let table = page.table("orders").unwrap();
            let applied = table
                .apply(&Query::new().with_text("status", "Paid"), false, |_, row| {
                    row.write_field("pick", &json!(true))
                })
                .unwrap();
            assert_eq!(applied, 2);
            let picked: Vec<_> = table
                .records()
                .unwrap()
                .iter()
                .map(|r| {
                    table
                        .row(r.index())
                        .unwrap()
                        .unwrap()
                        .read_field("pick")
                        .unwrap()
                        .as_bool()
                })
                .collect();
            assert_eq!(picked, vec![Some(true), Some(false), Some(true)]);
        }

        #[test]
        fn test_apply_once() {
            let driver = orders();
            let page = page(&driver, layout());
            let table = page.table("orders").unwrap();
            let mut seen = Vec::new();
            let applied = table
                .apply(&Query::new(), true, |record, _| {
                    seen.push(record.index());
                    Ok(())
                })
                .unwrap();
            assert_eq!(applied, 1);
            assert_eq!(seen, vec![0]);
        }

        #[test]
        fn test_action_error_propagates() {
            let driver = orders();
            let page = page(&driver, layout());
            let table = page.table("orders").unwrap();
            let err = table
                .apply(&Query::new(), false, |_, _| Err(PageError::driver("boom")))
                .unwrap_err();
            assert!(matches!(err, PageError::Driver { .. }));
        }

        #[test]
        fn test_vanished_row_is_all_null() {
            let driver = orders();
            let page = page(&driver, layout());
            let table = page.table("orders").unwrap();
            let rows = table.rows().unwrap();
            driver.remove(&rows[1]);
            let record = table.project(1, rows[1].clone());
            assert!(record.is_vanished());
            assert!(record.fields().iter().all(|(_, v)| v.is_null()));
        }
    }

    mod column_tests {
        use super::*;

        #[test]
        fn test_column_by_template() {
            let driver = orders();
            let page = page(&driver, layout());
            let table = page.table("orders").unwrap();
            assert_eq!(table.row_count().unwrap(), 3);
            assert_eq!(
                table.column_values("1").unwrap(),
                vec![json!("A-1"), json!("A-2"), json!("A-3")]
            );
            assert_eq!(table.column("3").unwrap().len(), 3);
        }

        #[test]
        fn test_column_with_component() {
            let driver = orders();
            let page = page(&driver, layout());
            let table = page.table("orders").unwrap();
            let cell = PageObjectBuilder::new("cell")
                .with_default_strategy(Strategy::Css)
                .with_field("status", FieldSpec::single("span.status").value_only())
                .build()
                .unwrap();
            let cells = table.column_with("2", &cell).unwrap();
            assert_eq!(cells[1].read_field("status").unwrap().as_str(), Some("Pending"));
        }

        #[test]
        fn test_column_without_template_is_invalid() {
            let driver = orders();
            let page = page(&driver, TableSpec::new(Locator::css("tr")));
            let err = page.table("orders").unwrap().column("1").unwrap_err();
            assert!(matches!(err, PageError::InvalidArgument { .. }));
        }

        #[test]
        fn test_missing_container() {
            let driver = Rc::new(MockDriver::new());
            let page = page(&driver, layout());
            assert!(page.table("orders").unwrap_err().is_not_found());
            assert!(page.read_field("orders").unwrap().is_null());
        }
    }
}
