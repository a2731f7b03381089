//! In-memory DOM implementing [`PageDriver`] for unit and scenario tests.
//!
//! Supports the `id`, `name`, `class name`, `tag name`, `link text` and
//! `partial link text` strategies plus a CSS subset: compound selectors made
//! of a tag, `#id`, `.class`, `[attr]`, `[attr=value]` and `:nth-child(n)`,
//! joined by descendant or `>` combinators, with `,` alternatives. XPath is
//! rejected with a driver error.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::Write as _;

use uuid::Uuid;

use crate::driver::{ElementHandle, FrameTarget, PageDriver, SearchContext};
use crate::locator::{Locator, Strategy};
use crate::result::{PageError, PageResult};

/// Declarative element used to build the fake DOM
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    hidden: bool,
    disabled: bool,
    selected: bool,
    children: Vec<MockElement>,
}

impl MockElement {
    /// Element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            ..Self::default()
        }
    }

    /// `<input type=...>`
    #[must_use]
    pub fn input(input_type: &str) -> Self {
        Self::new("input").attr("type", input_type)
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Set the `class` attribute
    #[must_use]
    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    /// Set the own text of the element
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the initial `value` property
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Render the element invisible
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Disable the element
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Set checked/selected state
    #[must_use]
    pub const fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: MockElement) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = MockElement>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    value: String,
    displayed: bool,
    enabled: bool,
    selected: bool,
    parent: Option<String>,
    children: Vec<String>,
    attached: bool,
}

#[derive(Debug, Default)]
struct Dom {
    nodes: HashMap<String, Node>,
    root: String,
    body: String,
    url: String,
    windows: Vec<String>,
    current_window: String,
    scripts: HashMap<String, VecDeque<serde_json::Value>>,
    alert: Option<MockAlert>,
}

#[derive(Debug)]
struct MockAlert {
    message: String,
    /// Presence checks left before the alert shows up
    delay: usize,
    typed: String,
}

impl Dom {
    fn insert(&mut self, parent: Option<&str>, element: MockElement) -> String {
        let id = Uuid::new_v4().to_string();
        let value = element
            .value
            .clone()
            .or_else(|| element.attributes.get("value").cloned())
            .unwrap_or_default();
        let node = Node {
            tag: element.tag,
            attributes: element.attributes,
            text: element.text,
            value,
            displayed: !element.hidden,
            enabled: !element.disabled,
            selected: element.selected,
            parent: parent.map(str::to_string),
            children: Vec::new(),
            attached: true,
        };
        let _ = self.nodes.insert(id.clone(), node);
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(id.clone());
        }
        for child in element.children {
            let _ = self.insert(Some(&id), child);
        }
        id
    }

    fn load(&mut self, url: &str, body: Vec<MockElement>) {
        for node in self.nodes.values_mut() {
            node.attached = false;
        }
        let root = self.insert(None, MockElement::new("html"));
        let body_id = self.insert(Some(&root), MockElement::new("body").children(body));
        self.root = root;
        self.body = body_id;
        self.url = url.to_string();
    }

    fn node(&self, handle: &ElementHandle) -> PageResult<&Node> {
        match self.nodes.get(&handle.id) {
            Some(node) if node.attached => Ok(node),
            _ => Err(PageError::Stale {
                element: handle.id.clone(),
            }),
        }
    }

    fn node_mut(&mut self, handle: &ElementHandle) -> PageResult<&mut Node> {
        match self.nodes.get_mut(&handle.id) {
            Some(node) if node.attached => Ok(node),
            _ => Err(PageError::Stale {
                element: handle.id.clone(),
            }),
        }
    }

    fn detach(&mut self, id: &str) {
        let children = match self.nodes.get_mut(id) {
            Some(node) => {
                node.attached = false;
                node.children.clone()
            }
            None => return,
        };
        for child in children {
            self.detach(&child);
        }
    }

    fn preorder(&self, id: &str, out: &mut Vec<String>) {
        out.push(id.to_string());
        if let Some(node) = self.nodes.get(id) {
            for child in &node.children {
                self.preorder(child, out);
            }
        }
    }

    fn text_content(&self, id: &str) -> String {
        let mut out = String::new();
        if let Some(node) = self.nodes.get(id) {
            out.push_str(&node.text);
            for child in &node.children {
                out.push_str(&self.text_content(child));
            }
        }
        out
    }

    fn outer_html(&self, id: &str) -> String {
        let Some(node) = self.nodes.get(id) else {
            return String::new();
        };
        let mut out = format!("<{}", node.tag);
        for (name, value) in &node.attributes {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        out.push('>');
        out.push_str(&node.text);
        for child in &node.children {
            out.push_str(&self.outer_html(child));
        }
        let _ = write!(out, "</{}>", node.tag);
        out
    }

    fn is_displayed(&self, id: &str) -> bool {
        let mut current = Some(id.to_string());
        while let Some(id) = current {
            match self.nodes.get(&id) {
                Some(node) if node.displayed => current = node.parent.clone(),
                _ => return false,
            }
        }
        true
    }

    fn candidates(&self, scope: &SearchContext) -> PageResult<Vec<String>> {
        let mut out = Vec::new();
        match scope {
            SearchContext::Document => self.preorder(&self.root, &mut out),
            SearchContext::Element(handle) => {
                let node = self.node(handle)?;
                for child in &node.children {
                    self.preorder(child, &mut out);
                }
            }
        }
        Ok(out)
    }

    fn find(&self, scope: &SearchContext, locator: &Locator) -> PageResult<Vec<ElementHandle>> {
        let candidates = self.candidates(scope)?;
        let selector = locator.selector();
        let matched: Vec<ElementHandle> = match locator.strategy() {
            Strategy::Css => {
                let groups = parse_selector_list(selector)?;
                candidates
                    .into_iter()
                    .filter(|id| groups.iter().any(|chain| self.matches_chain(id, chain)))
                    .map(ElementHandle::new)
                    .collect()
            }
            Strategy::XPath => {
                return Err(PageError::driver("xpath is not supported by MockDriver"));
            }
            strategy => candidates
                .into_iter()
                .filter(|id| {
                    let Some(node) = self.nodes.get(id) else {
                        return false;
                    };
                    match strategy {
                        Strategy::Id => node.attributes.get("id").map(String::as_str) == Some(selector),
                        Strategy::Name => {
                            node.attributes.get("name").map(String::as_str) == Some(selector)
                        }
                        Strategy::ClassName => node
                            .attributes
                            .get("class")
                            .is_some_and(|c| c.split_whitespace().any(|c| c == selector)),
                        Strategy::TagName => node.tag.eq_ignore_ascii_case(selector),
                        Strategy::LinkText => {
                            node.tag == "a" && self.text_content(id).trim() == selector
                        }
                        Strategy::PartialLinkText => {
                            node.tag == "a" && self.text_content(id).contains(selector)
                        }
                        Strategy::Css | Strategy::XPath => false,
                    }
                })
                .map(ElementHandle::new)
                .collect(),
        };
        Ok(matched)
    }

    fn matches_chain(&self, id: &str, chain: &[(Combinator, Compound)]) -> bool {
        let Some(((combinator, compound), rest)) = chain.split_last() else {
            return true;
        };
        if !self.matches_compound(id, compound) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        let parent = self.nodes.get(id).and_then(|n| n.parent.clone());
        match combinator {
            Combinator::Child => parent.is_some_and(|p| self.matches_chain(&p, rest)),
            Combinator::Descendant => {
                let mut current = parent;
                while let Some(ancestor) = current {
                    if self.matches_chain(&ancestor, rest) {
                        return true;
                    }
                    current = self.nodes.get(&ancestor).and_then(|n| n.parent.clone());
                }
                false
            }
        }
    }

    fn matches_compound(&self, id: &str, compound: &Compound) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if compound.tag.as_ref().is_some_and(|t| *t != node.tag) {
            return false;
        }
        if compound
            .id
            .as_ref()
            .is_some_and(|want| node.attributes.get("id") != Some(want))
        {
            return false;
        }
        let classes: Vec<&str> = node
            .attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        if !compound.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
        for (name, expected) in &compound.attributes {
            match (node.attributes.get(name), expected) {
                (None, _) => return false,
                (Some(actual), Some(expected)) if actual != expected => return false,
                _ => {}
            }
        }
        if let Some(position) = compound.nth_child {
            let index = node
                .parent
                .as_ref()
                .and_then(|p| self.nodes.get(p))
                .and_then(|p| p.children.iter().position(|c| c == id));
            if index.map(|i| i + 1) != Some(position) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
    nth_child: Option<usize>,
}

fn unsupported(selector: &str) -> PageError {
    PageError::driver(format!("unsupported css selector: {selector}"))
}

fn parse_selector_list(selector: &str) -> PageResult<Vec<Vec<(Combinator, Compound)>>> {
    selector
        .split(',')
        .map(|alternative| {
            let mut chain = Vec::new();
            let mut combinator = Combinator::Descendant;
            for token in alternative.split_whitespace() {
                if token == ">" {
                    combinator = Combinator::Child;
                    continue;
                }
                chain.push((combinator, parse_compound(token)?));
                combinator = Combinator::Descendant;
            }
            if chain.is_empty() {
                return Err(unsupported(selector));
            }
            Ok(chain)
        })
        .collect()
}

fn read_ident(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && (chars[*i].is_alphanumeric() || chars[*i] == '-' || chars[*i] == '_')
    {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

fn parse_compound(token: &str) -> PageResult<Compound> {
    let chars: Vec<char> = token.chars().collect();
    let mut compound = Compound::default();
    let mut i = 0;

    if chars.first() == Some(&'*') {
        i = 1;
    } else {
        let tag = read_ident(&chars, &mut i);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_lowercase());
        }
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                compound.id = Some(read_ident(&chars, &mut i));
            }
            '.' => {
                i += 1;
                compound.classes.push(read_ident(&chars, &mut i));
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .ok_or_else(|| unsupported(token))?;
                let inner: String = chars[i + 1..i + close].iter().collect();
                i += close + 1;
                match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(|c| c == '\'' || c == '"');
                        compound
                            .attributes
                            .push((name.trim().to_string(), Some(value.to_string())));
                    }
                    None => compound.attributes.push((inner.trim().to_string(), None)),
                }
            }
            ':' => {
                let rest: String = chars[i..].iter().collect();
                let inner = rest
                    .strip_prefix(":nth-child(")
                    .and_then(|r| r.split_once(')'))
                    .ok_or_else(|| unsupported(token))?;
                compound.nth_child = Some(inner.0.trim().parse().map_err(|_| unsupported(token))?);
                i += ":nth-child(".len() + inner.0.chars().count() + 1;
            }
            _ => return Err(unsupported(token)),
        }
    }
    Ok(compound)
}

/// Mock driver backed by an in-memory DOM
#[derive(Debug)]
pub struct MockDriver {
    dom: RefCell<Dom>,
    call_history: RefCell<Vec<String>>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Empty page at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self::with_body(Vec::new())
    }

    /// Page whose `<body>` holds `body`
    #[must_use]
    pub fn with_body(body: Vec<MockElement>) -> Self {
        let mut dom = Dom::default();
        dom.windows.push("window-0".to_string());
        dom.current_window = "window-0".to_string();
        dom.load("about:blank", body);
        Self {
            dom: RefCell::new(dom),
            call_history: RefCell::new(Vec::new()),
        }
    }

    /// Replace the document, detaching every existing handle
    pub fn navigate(&self, url: &str, body: Vec<MockElement>) {
        self.record(format!("navigate:{url}"));
        self.dom.borrow_mut().load(url, body);
    }

    /// Handle of the `<html>` root
    #[must_use]
    pub fn root(&self) -> ElementHandle {
        ElementHandle::new(self.dom.borrow().root.clone())
    }

    /// Handle of `<body>`
    #[must_use]
    pub fn body(&self) -> ElementHandle {
        ElementHandle::new(self.dom.borrow().body.clone())
    }

    /// Append an element under `parent`
    pub fn append(&self, parent: &ElementHandle, element: MockElement) -> PageResult<ElementHandle> {
        let mut dom = self.dom.borrow_mut();
        let _ = dom.node(parent)?;
        Ok(ElementHandle::new(dom.insert(Some(&parent.id), element)))
    }

    /// First attached element whose `id` attribute is `dom_id`
    #[must_use]
    pub fn element_by_id(&self, dom_id: &str) -> Option<ElementHandle> {
        self.dom
            .borrow()
            .find(&SearchContext::Document, &Locator::id(dom_id))
            .ok()
            .and_then(|found| found.into_iter().next())
    }

    /// Detach an element and its subtree
    pub fn remove(&self, element: &ElementHandle) {
        let mut dom = self.dom.borrow_mut();
        let parent = dom.nodes.get(&element.id).and_then(|n| n.parent.clone());
        if let Some(parent) = parent.and_then(|p| dom.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != element.id);
        }
        dom.detach(&element.id);
    }

    /// Toggle visibility
    pub fn set_displayed(&self, element: &ElementHandle, displayed: bool) -> PageResult<()> {
        self.dom.borrow_mut().node_mut(element)?.displayed = displayed;
        Ok(())
    }

    /// Toggle enabled state
    pub fn set_enabled(&self, element: &ElementHandle, enabled: bool) -> PageResult<()> {
        self.dom.borrow_mut().node_mut(element)?.enabled = enabled;
        Ok(())
    }

    /// Rewrite an attribute in place (changes the markup fingerprint)
    pub fn set_attribute(&self, element: &ElementHandle, name: &str, value: &str) -> PageResult<()> {
        let _ = self
            .dom
            .borrow_mut()
            .node_mut(element)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Rewrite the own text of an element
    pub fn set_text(&self, element: &ElementHandle, text: &str) -> PageResult<()> {
        self.dom.borrow_mut().node_mut(element)?.text = text.to_string();
        Ok(())
    }

    /// Current `value` property
    pub fn value_of(&self, element: &ElementHandle) -> PageResult<String> {
        Ok(self.dom.borrow().node(element)?.value.clone())
    }

    /// Queue results for a script; the last one repeats
    pub fn set_script_results(&self, script: &str, results: Vec<serde_json::Value>) {
        let _ = self
            .dom
            .borrow_mut()
            .scripts
            .insert(script.to_string(), results.into());
    }

    /// Raise an alert that shows up after `delay` presence checks
    pub fn open_alert(&self, message: &str, delay: usize) {
        self.dom.borrow_mut().alert = Some(MockAlert {
            message: message.to_string(),
            delay,
            typed: String::new(),
        });
    }

    /// Whether an alert is still open (shown or pending)
    #[must_use]
    pub fn has_alert(&self) -> bool {
        self.dom.borrow().alert.is_some()
    }

    fn close_alert(&self, action: &str) -> PageResult<()> {
        let mut dom = self.dom.borrow_mut();
        match dom.alert.take() {
            Some(alert) if alert.delay == 0 => {
                drop(dom);
                self.record(format!("{action}:{}", alert.typed));
                Ok(())
            }
            pending => {
                dom.alert = pending;
                Err(PageError::NotFound {
                    locator: "alert".to_string(),
                })
            }
        }
    }

    /// Open another window
    pub fn open_window(&self, handle: &str) {
        self.dom.borrow_mut().windows.push(handle.to_string());
    }

    /// Handle of the active window
    #[must_use]
    pub fn current_window(&self) -> String {
        self.dom.borrow().current_window.clone()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history.borrow().clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.borrow().iter().any(|c| c.starts_with(method))
    }

    /// Number of recorded calls starting with `prefix`
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.call_history
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Number of lookups (`find_element` + `find_elements`)
    #[must_use]
    pub fn find_count(&self) -> usize {
        self.count("find_")
    }

    /// Number of clicks on one element
    #[must_use]
    pub fn clicks(&self, element: &ElementHandle) -> usize {
        self.count(&format!("click:{}", element.id))
    }

    /// Forget recorded calls
    pub fn clear_history(&self) {
        self.call_history.borrow_mut().clear();
    }

    fn record(&self, call: String) {
        self.call_history.borrow_mut().push(call);
    }
}

impl PageDriver for MockDriver {
    fn find_element(&self, scope: &SearchContext, locator: &Locator) -> PageResult<ElementHandle> {
        self.record(format!("find_element:{locator}"));
        self.dom
            .borrow()
            .find(scope, locator)?
            .into_iter()
            .next()
            .ok_or_else(|| PageError::NotFound {
                locator: locator.to_string(),
            })
    }

    fn find_elements(
        &self,
        scope: &SearchContext,
        locator: &Locator,
    ) -> PageResult<Vec<ElementHandle>> {
        self.record(format!("find_elements:{locator}"));
        self.dom.borrow().find(scope, locator)
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> PageResult<Option<String>> {
        let dom = self.dom.borrow();
        let node = dom.node(element)?;
        let value = match name {
            "textContent" | "innerText" => Some(dom.text_content(&element.id)),
            "outerHTML" => Some(dom.outer_html(&element.id)),
            "innerHTML" => Some(
                node.children
                    .iter()
                    .map(|c| dom.outer_html(c))
                    .collect::<String>(),
            ),
            "value" if matches!(node.tag.as_str(), "input" | "textarea" | "select" | "option") => {
                Some(node.value.clone())
            }
            "type" => match node.tag.as_str() {
                "input" => Some(
                    node.attributes
                        .get("type")
                        .cloned()
                        .unwrap_or_else(|| "text".to_string()),
                ),
                "textarea" => Some("textarea".to_string()),
                "select" => Some("select-one".to_string()),
                _ => node.attributes.get("type").cloned(),
            },
            other => node.attributes.get(other).cloned(),
        };
        Ok(value)
    }

    fn tag_name(&self, element: &ElementHandle) -> PageResult<String> {
        Ok(self.dom.borrow().node(element)?.tag.clone())
    }

    fn is_enabled(&self, element: &ElementHandle) -> PageResult<bool> {
        Ok(self.dom.borrow().node(element)?.enabled)
    }

    fn is_displayed(&self, element: &ElementHandle) -> PageResult<bool> {
        let dom = self.dom.borrow();
        let _ = dom.node(element)?;
        Ok(dom.is_displayed(&element.id))
    }

    fn is_selected(&self, element: &ElementHandle) -> PageResult<bool> {
        Ok(self.dom.borrow().node(element)?.selected)
    }

    fn click(&self, element: &ElementHandle) -> PageResult<()> {
        self.record(format!("click:{}", element.id));
        let mut dom = self.dom.borrow_mut();
        let node = dom.node(element)?.clone();
        if !node.enabled {
            return Ok(());
        }
        let input_type = node.attributes.get("type").map(String::as_str);
        match (node.tag.as_str(), input_type) {
            ("input", Some("checkbox")) => {
                let target = dom.node_mut(element)?;
                target.selected = !target.selected;
            }
            ("input", Some("radio")) => {
                let group = node.attributes.get("name").cloned();
                let ids: Vec<String> = dom.nodes.keys().cloned().collect();
                for id in ids {
                    if let Some(other) = dom.nodes.get_mut(&id) {
                        let same_group = other.tag == "input"
                            && other.attributes.get("type").map(String::as_str) == Some("radio")
                            && other.attributes.get("name") == group.as_ref();
                        if same_group && group.is_some() {
                            other.selected = false;
                        }
                    }
                }
                dom.node_mut(element)?.selected = true;
            }
            ("option", _) => {
                if let Some(parent) = node.parent.clone() {
                    let siblings = dom
                        .nodes
                        .get(&parent)
                        .map(|p| p.children.clone())
                        .unwrap_or_default();
                    for sibling in siblings {
                        if let Some(option) = dom.nodes.get_mut(&sibling) {
                            option.selected = false;
                        }
                    }
                    let value = node
                        .attributes
                        .get("value")
                        .cloned()
                        .unwrap_or_else(|| dom.text_content(&element.id).trim().to_string());
                    if let Some(select) = dom.nodes.get_mut(&parent) {
                        select.value = value;
                    }
                }
                dom.node_mut(element)?.selected = true;
            }
            _ => {}
        }
        Ok(())
    }

    fn clear(&self, element: &ElementHandle) -> PageResult<()> {
        self.record(format!("clear:{}", element.id));
        self.dom.borrow_mut().node_mut(element)?.value.clear();
        Ok(())
    }

    fn send_keys(&self, element: &ElementHandle, text: &str) -> PageResult<()> {
        self.record(format!("send_keys:{}:{text}", element.id));
        self.dom.borrow_mut().node_mut(element)?.value.push_str(text);
        Ok(())
    }

    fn execute_script(&self, script: &str) -> PageResult<serde_json::Value> {
        self.record(format!("execute_script:{script}"));
        let mut dom = self.dom.borrow_mut();
        if let Some(queue) = dom.scripts.get_mut(script) {
            let result = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            return Ok(result.unwrap_or(serde_json::Value::Null));
        }
        if script.contains("document.readyState") {
            return Ok(serde_json::Value::Bool(true));
        }
        Ok(serde_json::Value::Null)
    }

    fn window_handles(&self) -> PageResult<Vec<String>> {
        Ok(self.dom.borrow().windows.clone())
    }

    fn switch_to_window(&self, handle: &str) -> PageResult<()> {
        self.record(format!("switch_to_window:{handle}"));
        let mut dom = self.dom.borrow_mut();
        if !dom.windows.iter().any(|w| w == handle) {
            return Err(PageError::driver(format!("no such window: {handle}")));
        }
        dom.current_window = handle.to_string();
        Ok(())
    }

    fn switch_to_frame(&self, frame: &FrameTarget) -> PageResult<()> {
        let target = match frame {
            FrameTarget::Default => "default".to_string(),
            FrameTarget::Index(index) => index.to_string(),
            FrameTarget::Element(handle) => {
                let _ = self.dom.borrow().node(handle)?;
                handle.id.clone()
            }
        };
        self.record(format!("switch_to_frame:{target}"));
        Ok(())
    }

    fn current_url(&self) -> PageResult<String> {
        Ok(self.dom.borrow().url.clone())
    }

    fn alert_text(&self) -> PageResult<Option<String>> {
        let mut dom = self.dom.borrow_mut();
        Ok(match dom.alert.as_mut() {
            Some(alert) if alert.delay > 0 => {
                alert.delay -= 1;
                None
            }
            Some(alert) => Some(alert.message.clone()),
            None => None,
        })
    }

    fn send_alert_text(&self, text: &str) -> PageResult<()> {
        let mut dom = self.dom.borrow_mut();
        match dom.alert.as_mut() {
            Some(alert) if alert.delay == 0 => {
                alert.typed.push_str(text);
                Ok(())
            }
            _ => Err(PageError::NotFound {
                locator: "alert".to_string(),
            }),
        }
    }

    fn accept_alert(&self) -> PageResult<()> {
        self.close_alert("accept_alert")
    }

    fn dismiss_alert(&self) -> PageResult<()> {
        self.close_alert("dismiss_alert")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> MockDriver {
        MockDriver::with_body(vec![
            MockElement::new("form").id("login").children([
                MockElement::input("text").attr("name", "email").value("a@b.c"),
                MockElement::input("checkbox").id("remember"),
                MockElement::new("button").class("btn primary").text(" Sign in "),
            ]),
            MockElement::new("a").attr("href", "/bookings").text("Bookings"),
            MockElement::new("ul").children([
                MockElement::new("li").text("one"),
                MockElement::new("li").text("two").hidden(),
            ]),
        ])
    }

    mod lookup_tests {
        use super::*;

        #[test]
        fn test_find_by_basic_strategies() {
            let driver = sample();
            let doc = SearchContext::Document;
            assert!(driver.find_element(&doc, &Locator::id("login")).is_ok());
            assert!(driver.find_element(&doc, &Locator::name("email")).is_ok());
            assert!(driver.find_element(&doc, &Locator::link_text("Bookings")).is_ok());
            assert_eq!(driver.find_elements(&doc, &Locator::tag("li")).unwrap().len(), 2);
        }

        #[test]
        fn test_css_compound_and_combinators() {
            let driver = sample();
            let doc = SearchContext::Document;
            let found = driver
                .find_elements(&doc, &Locator::css("form#login > button.primary"))
                .unwrap();
            assert_eq!(found.len(), 1);
            let second = driver
                .find_element(&doc, &Locator::css("ul li:nth-child(2)"))
                .unwrap();
            assert_eq!(driver.attribute(&second, "textContent").unwrap().unwrap(), "two");
            let typed = driver
                .find_elements(&doc, &Locator::css("input[type='checkbox'], a[href]"))
                .unwrap();
            assert_eq!(typed.len(), 2);
        }

        #[test]
        fn test_element_scope_excludes_outside_nodes() {
            let driver = sample();
            let form = driver.element_by_id("login").unwrap();
            let scoped = driver
                .find_elements(&SearchContext::Element(form), &Locator::tag("li"))
                .unwrap();
            assert!(scoped.is_empty());
        }

        #[test]
        fn test_missing_element_is_not_found() {
            let driver = sample();
            let err = driver
                .find_element(&SearchContext::Document, &Locator::id("nope"))
                .unwrap_err();
            assert!(err.is_not_found());
        }

        #[test]
        fn test_xpath_rejected() {
            let driver = sample();
            let err = driver
                .find_elements(&SearchContext::Document, &Locator::xpath("//a"))
                .unwrap_err();
            assert!(matches!(err, PageError::Driver { .. }));
        }
    }

    mod state_tests {
        use super::*;

        #[test]
        fn test_hidden_parent_hides_children() {
            let driver = sample();
            let li = driver
                .find_element(&SearchContext::Document, &Locator::css("li:nth-child(2)"))
                .unwrap();
            assert!(!driver.is_displayed(&li).unwrap());
        }

        #[test]
        fn test_remove_detaches_handle() {
            let driver = sample();
            let form = driver.element_by_id("login").unwrap();
            driver.remove(&form);
            assert!(driver.tag_name(&form).unwrap_err().is_stale());
            assert!(driver.element_by_id("login").is_none());
        }

        #[test]
        fn test_navigate_replaces_root() {
            let driver = sample();
            let old_root = driver.root();
            driver.navigate("https://example.test/next", vec![MockElement::new("main")]);
            assert_ne!(driver.root(), old_root);
            assert!(driver.is_displayed(&old_root).unwrap_err().is_stale());
            assert_eq!(driver.current_url().unwrap(), "https://example.test/next");
        }

        #[test]
        fn test_checkbox_click_toggles() {
            let driver = sample();
            let cb = driver.element_by_id("remember").unwrap();
            driver.click(&cb).unwrap();
            assert!(driver.is_selected(&cb).unwrap());
            driver.click(&cb).unwrap();
            assert!(!driver.is_selected(&cb).unwrap());
            assert_eq!(driver.clicks(&cb), 2);
        }

        #[test]
        fn test_typing_updates_value() {
            let driver = sample();
            let email = driver
                .find_element(&SearchContext::Document, &Locator::name("email"))
                .unwrap();
            driver.clear(&email).unwrap();
            driver.send_keys(&email, "x@y.z").unwrap();
            assert_eq!(driver.value_of(&email).unwrap(), "x@y.z");
            assert_eq!(driver.attribute(&email, "type").unwrap().unwrap(), "text");
        }

        #[test]
        fn test_outer_html_reflects_attribute_changes() {
            let driver = sample();
            let form = driver.element_by_id("login").unwrap();
            let before = driver.attribute(&form, "outerHTML").unwrap();
            driver.set_attribute(&form, "data-state", "busy").unwrap();
            assert_ne!(driver.attribute(&form, "outerHTML").unwrap(), before);
        }

        #[test]
        fn test_script_queue_repeats_last() {
            let driver = MockDriver::new();
            driver.set_script_results(
                "return 1",
                vec![serde_json::json!(false), serde_json::json!(true)],
            );
            assert_eq!(driver.execute_script("return 1").unwrap(), serde_json::json!(false));
            assert_eq!(driver.execute_script("return 1").unwrap(), serde_json::json!(true));
            assert_eq!(driver.execute_script("return 1").unwrap(), serde_json::json!(true));
        }

        #[test]
        fn test_alert_shows_after_delay_and_closes() {
            let driver = MockDriver::new();
            assert_eq!(driver.alert_text().unwrap(), None);
            assert!(driver.accept_alert().unwrap_err().is_not_found());

            driver.open_alert("Delete booking?", 1);
            assert_eq!(driver.alert_text().unwrap(), None);
            assert_eq!(driver.alert_text().unwrap().as_deref(), Some("Delete booking?"));

            driver.send_alert_text("yes").unwrap();
            driver.accept_alert().unwrap();
            assert!(!driver.has_alert());
            assert!(driver.was_called("accept_alert:yes"));
        }
    }
}
