//! Value adapters: element kind detection and kind-specific read/write.
//!
//! | Kind     | Read                          | Write                               |
//! |----------|-------------------------------|-------------------------------------|
//! | select   | text of first selected option | click the option with that text     |
//! | checkbox | selected state                | click iff the state differs         |
//! | radio    | selected state                | click iff `true` and not selected   |
//! | input    | `value` property              | clear, then type                    |
//! | other    | trimmed text content          | clear, then type                    |

use serde_json::Value;
use tracing::debug;

use crate::driver::{text_content, ElementHandle, PageDriver, SearchContext};
use crate::locator::Locator;
use crate::result::{PageError, PageResult};

/// `type` attributes whose state lives in the `value` property
const VALUE_TYPES: &[&str] = &[
    "text", "number", "url", "textarea", "email", "password", "search", "tel",
];

/// Adapter selected for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `<select>`
    Select,
    /// `type="checkbox"`
    Checkbox,
    /// `type="radio"`
    Radio,
    /// Text-like control holding a `value`
    Input,
    /// Anything else
    Text,
}

impl ElementKind {
    /// Classify from the `(tag, type)` pair
    #[must_use]
    pub fn classify(tag: &str, input_type: Option<&str>) -> Self {
        if tag.eq_ignore_ascii_case("select") {
            return Self::Select;
        }
        match input_type.map(str::to_ascii_lowercase).as_deref() {
            Some("checkbox") => Self::Checkbox,
            Some("radio") => Self::Radio,
            Some(t) if VALUE_TYPES.contains(&t) => Self::Input,
            _ => Self::Text,
        }
    }

    /// Classify a live element
    pub fn detect(driver: &dyn PageDriver, element: &ElementHandle) -> PageResult<Self> {
        let tag = driver.tag_name(element)?;
        let input_type = driver.attribute(element, "type")?;
        Ok(Self::classify(&tag, input_type.as_deref()))
    }
}

/// String form of a value typed into a control
#[must_use]
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn expect_bool(value: &Value, kind: &str) -> PageResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| PageError::invalid(format!("{kind} value must be a boolean, got {value}")))
}

fn options(driver: &dyn PageDriver, select: &ElementHandle) -> PageResult<Vec<ElementHandle>> {
    driver.find_elements(&SearchContext::Element(select.clone()), &Locator::tag("option"))
}

/// Read the value of an element
pub fn read(driver: &dyn PageDriver, element: &ElementHandle) -> PageResult<Value> {
    let kind = ElementKind::detect(driver, element)?;
    let value = match kind {
        ElementKind::Select => {
            let mut selected = Value::Null;
            for option in options(driver, element)? {
                if driver.is_selected(&option)? {
                    selected = Value::String(text_content(driver, &option)?);
                    break;
                }
            }
            selected
        }
        ElementKind::Checkbox | ElementKind::Radio => Value::Bool(driver.is_selected(element)?),
        ElementKind::Input => {
            Value::String(driver.attribute(element, "value")?.unwrap_or_default())
        }
        ElementKind::Text => Value::String(text_content(driver, element)?),
    };
    debug!("Read {kind:?} {element}: {value}");
    Ok(value)
}

/// Write a value to an element
pub fn write(driver: &dyn PageDriver, element: &ElementHandle, value: &Value) -> PageResult<()> {
    let kind = ElementKind::detect(driver, element)?;
    debug!("Write {kind:?} {element}: {value}");
    match kind {
        ElementKind::Select => {
            let text = stringify(value);
            for option in options(driver, element)? {
                if text_content(driver, &option)? == text {
                    return driver.click(&option);
                }
            }
            Err(PageError::NotFound {
                locator: format!("option with text {text:?}"),
            })
        }
        ElementKind::Checkbox => {
            let wanted = expect_bool(value, "checkbox")?;
            if driver.is_selected(element)? != wanted {
                driver.click(element)?;
            }
            Ok(())
        }
        ElementKind::Radio => {
            if expect_bool(value, "radio")? && !driver.is_selected(element)? {
                driver.click(element)?;
            }
            Ok(())
        }
        ElementKind::Input | ElementKind::Text => {
            driver.clear(element)?;
            driver.send_keys(element, &stringify(value))
        }
    }
}
