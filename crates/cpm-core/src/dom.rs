//! In-memory document model
//!
//! A small arena-backed element tree standing in for the browser DOM. Elements
//! keep their `ElementId` after being removed from the tree, so code holding
//! an "original element reference" can still address them; `is_connected`
//! reports whether they are reachable from the root. Content nothing refers
//! to any more is freed with `drop_subtree`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Stable handle to an element in a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    /// Wrap a raw id. Only meaningful for ids handed out by a document.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric id.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single element: tag, attributes, class list, inline style, text and form value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    text: String,
    value: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    fn new(tag: impl Into<String>) -> Self {
        let tag: String = tag.into();
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Lowercased tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Value of attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether attribute `name` is present, even with an empty value.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// All attributes, sorted by name.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// The DOM `id` attribute, if any.
    pub fn dom_id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Class list in insertion order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Whether `class` is on the class list.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class. Returns `false` if it was already present.
    pub fn add_class(&mut self, class: impl Into<String>) -> bool {
        let class = class.into();
        if self.has_class(&class) {
            return false;
        }
        self.classes.push(class);
        true
    }

    /// Remove a class. Returns `false` if it was not present.
    pub fn remove_class(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        before != self.classes.len()
    }

    /// Inline style value for `property`.
    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    /// Set an inline style property.
    pub fn set_style(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.style.insert(property.into(), value.into());
    }

    /// Clear an inline style property, returning its previous value.
    pub fn remove_style(&mut self, property: &str) -> Option<String> {
        self.style.remove(property)
    }

    /// Text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text content.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Current form value (inputs, textareas, selects).
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the form value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Parent element, `None` for the root and for detached elements.
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

/// Declarative element tree used to build documents in tests and replay scenarios.
///
/// ```rust,ignore
/// let spec = ElementSpec::new("button")
///     .id("delete-site")
///     .attr("hx-delete", "/sites/3")
///     .attr("hx-confirm", "Delete this item?")
///     .text("Delete");
/// let button = doc.build(doc.body(), &spec)?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSpec {
    /// Tag name
    pub tag: String,
    /// DOM `id` attribute
    pub id: Option<String>,
    /// Class names
    pub classes: Vec<String>,
    /// Attributes other than `id` and `class`
    pub attributes: BTreeMap<String, String>,
    /// Text content
    pub text: String,
    /// Initial form value
    pub value: String,
    /// Nested elements, in order
    pub children: Vec<ElementSpec>,
}

impl Default for ElementSpec {
    fn default() -> Self {
        Self {
            tag: "div".to_string(),
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            children: Vec::new(),
        }
    }
}

impl ElementSpec {
    /// Start a spec for a `tag` element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the DOM id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add one or more whitespace-separated classes.
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the text content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the initial form value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Append a child spec.
    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// Arena-backed document with an `<html>` root and a `<body>`.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: HashMap<ElementId, Element>,
    root: ElementId,
    body: ElementId,
    next_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document (`<html><body></body></html>`).
    pub fn new() -> Self {
        let root = ElementId(0);
        let body = ElementId(1);
        let mut html = Element::new("html");
        html.children.push(body);
        let mut body_el = Element::new("body");
        body_el.parent = Some(root);

        let mut nodes = HashMap::new();
        nodes.insert(root, html);
        nodes.insert(body, body_el);
        Self {
            nodes,
            root,
            body,
            next_id: 2,
        }
    }

    /// Create a document whose body holds the given element trees.
    pub fn with_body(children: &[ElementSpec]) -> Result<Self, CoreError> {
        let mut doc = Self::new();
        let body = doc.body();
        for child in children {
            doc.build(body, child)?;
        }
        Ok(doc)
    }

    /// The `<html>` element.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// The `<body>` element.
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Element::new(tag));
        id
    }

    /// Build an element tree from a spec and append it under `parent`.
    pub fn build(&mut self, parent: ElementId, spec: &ElementSpec) -> Result<ElementId, CoreError> {
        let id = self.create_element(spec.tag.as_str());
        {
            let el = self.element_mut(id)?;
            if let Some(dom_id) = &spec.id {
                el.set_attribute("id", dom_id.as_str());
            }
            for (name, value) in &spec.attributes {
                el.set_attribute(name.as_str(), value.as_str());
            }
            for class in &spec.classes {
                el.add_class(class.as_str());
            }
            el.set_text(spec.text.as_str());
            el.set_value(spec.value.as_str());
        }
        self.append_child(parent, id)?;
        for child in &spec.children {
            self.build(id, child)?;
        }
        Ok(id)
    }

    /// Append `child` as the last child of `parent`, moving it if already attached.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), CoreError> {
        if !self.contains(parent) {
            return Err(CoreError::UnknownElement(parent));
        }
        if !self.contains(child) {
            return Err(CoreError::UnknownElement(child));
        }
        if child == self.root {
            return Err(CoreError::RootImmutable);
        }
        if self.ancestors_inclusive(parent).contains(&child) {
            return Err(CoreError::Cycle { parent, child });
        }

        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Remove an element (and its subtree) from the tree. The id stays valid.
    pub fn remove(&mut self, id: ElementId) -> Result<(), CoreError> {
        if !self.contains(id) {
            return Err(CoreError::UnknownElement(id));
        }
        if id == self.root {
            return Err(CoreError::RootImmutable);
        }
        self.detach(id);
        Ok(())
    }

    /// Remove an element and free its subtree. Unlike [`Document::remove`],
    /// the ids become unknown afterwards; use it for nodes nothing refers to
    /// once they leave the page. Returns how many elements were freed.
    pub fn drop_subtree(&mut self, id: ElementId) -> Result<usize, CoreError> {
        self.remove(id)?;
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in &doomed {
            self.nodes.remove(node);
        }
        Ok(doomed.len())
    }

    fn detach(&mut self, id: ElementId) {
        let parent = self.nodes.get_mut(&id).and_then(|node| node.parent.take());
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.retain(|c| *c != id);
            }
        }
    }

    /// Number of elements held by the arena, connected or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no elements. A document always holds its root
    /// and body.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the id is held by this document (created and not dropped).
    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Whether the element is reachable from the document root.
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.contains(id) && self.ancestors_inclusive(id).last() == Some(&self.root)
    }

    /// Look up an element, connected or not.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(&id)
    }

    /// Mutable access to an element.
    ///
    /// # Errors
    ///
    /// [`CoreError::UnknownElement`] if the id is not held by this document.
    pub fn element_mut(&mut self, id: ElementId) -> Result<&mut Element, CoreError> {
        self.nodes
            .get_mut(&id)
            .ok_or(CoreError::UnknownElement(id))
    }

    /// Shorthand for [`Element::attribute`] by id.
    pub fn get_attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    /// Whether the element exists and carries attribute `name`.
    pub fn has_attribute(&self, id: ElementId, name: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_attribute(name))
    }

    /// Whether the element exists and carries `class`.
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    /// The element followed by its ancestors, nearest first.
    pub fn ancestors_inclusive(&self, id: ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut cursor = self.element(id).map(|_| id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.element(current).and_then(Element::parent);
        }
        chain
    }

    /// Nearest ancestor-or-self matching the predicate.
    pub fn closest(&self, id: ElementId, pred: impl Fn(&Element) -> bool) -> Option<ElementId> {
        self.ancestors_inclusive(id)
            .into_iter()
            .find(|candidate| self.element(*candidate).is_some_and(&pred))
    }

    /// Descendants of `id` in document (pre-)order, excluding `id` itself.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self
            .element(id)
            .map(|el| el.children().iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(el) = self.element(current) {
                stack.extend(el.children().iter().rev().copied());
            }
        }
        out
    }

    /// Descendants of `scope` matching the predicate, in document order.
    pub fn query_all(&self, scope: ElementId, pred: impl Fn(&Element) -> bool) -> Vec<ElementId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.element(*id).is_some_and(&pred))
            .collect()
    }

    /// First connected element whose `id` attribute equals `dom_id`.
    pub fn get_element_by_id(&self, dom_id: &str) -> Option<ElementId> {
        self.query_all(self.root, |el| el.dom_id() == Some(dom_id))
            .into_iter()
            .next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, ElementId, ElementId) {
        let mut doc = Document::new();
        let body = doc.body();
        let list = doc
            .build(
                body,
                &ElementSpec::new("ul").id("sites").child(
                    ElementSpec::new("li")
                        .class("site active")
                        .child(ElementSpec::new("button").id("delete").text("Delete")),
                ),
            )
            .unwrap();
        let button = doc.get_element_by_id("delete").unwrap();
        (doc, list, button)
    }

    #[test]
    fn build_produces_connected_tree() {
        let (doc, list, button) = sample();
        assert!(doc.is_connected(list));
        assert!(doc.is_connected(button));
        assert_eq!(doc.element(button).unwrap().text(), "Delete");
        assert_eq!(doc.ancestors_inclusive(button).last(), Some(&doc.root()));
    }

    #[test]
    fn removed_elements_keep_their_id_but_are_not_found_by_dom_id() {
        let (mut doc, list, button) = sample();
        doc.remove(list).unwrap();
        assert!(doc.contains(button));
        assert!(!doc.is_connected(button));
        assert_eq!(doc.get_element_by_id("delete"), None);
    }

    #[test]
    fn dropped_subtrees_leave_the_arena() {
        let (mut doc, list, button) = sample();
        let before = doc.len();

        assert_eq!(doc.drop_subtree(list).unwrap(), 3);
        assert_eq!(doc.len(), before - 3);
        assert!(!doc.contains(button));
        assert!(doc.element(doc.body()).unwrap().children().is_empty());
        assert_eq!(doc.drop_subtree(list), Err(CoreError::UnknownElement(list)));
    }

    #[test]
    fn closest_includes_self_and_walks_up() {
        let (doc, list, button) = sample();
        let li = doc.closest(button, |el| el.has_class("site")).unwrap();
        assert_eq!(doc.element(li).unwrap().tag(), "li");
        assert_eq!(doc.closest(button, |el| el.tag() == "button"), Some(button));
        assert_eq!(doc.closest(button, |el| el.dom_id() == Some("sites")), Some(list));
        assert_eq!(doc.closest(button, |el| el.tag() == "form"), None);
    }

    #[test]
    fn append_rejects_cycles_and_root_moves() {
        let (mut doc, list, button) = sample();
        assert_eq!(
            doc.append_child(button, list),
            Err(CoreError::Cycle {
                parent: button,
                child: list
            })
        );
        assert_eq!(doc.append_child(list, doc.root()), Err(CoreError::RootImmutable));
        assert_eq!(doc.remove(doc.root()), Err(CoreError::RootImmutable));
    }

    #[test]
    fn append_moves_an_attached_element() {
        let (mut doc, list, button) = sample();
        let body = doc.body();
        doc.append_child(body, button).unwrap();
        assert_eq!(doc.element(button).unwrap().parent(), Some(body));
        assert!(doc.query_all(list, |el| el.tag() == "button").is_empty());
    }

    #[test]
    fn classes_are_unique() {
        let (mut doc, _, button) = sample();
        let el = doc.element_mut(button).unwrap();
        assert!(el.add_class("danger"));
        assert!(!el.add_class("danger"));
        assert!(el.remove_class("danger"));
        assert!(!el.remove_class("danger"));
    }

    #[test]
    fn descendants_are_in_document_order() {
        let doc = Document::with_body(&[
            ElementSpec::new("div")
                .id("a")
                .child(ElementSpec::new("span").id("a1"))
                .child(ElementSpec::new("span").id("a2")),
            ElementSpec::new("div").id("b"),
        ])
        .unwrap();
        let ids: Vec<_> = doc
            .descendants(doc.body())
            .into_iter()
            .filter_map(|id| doc.element(id).and_then(|el| el.dom_id()).map(str::to_string))
            .collect();
        assert_eq!(ids, vec!["a", "a1", "a2", "b"]);
    }

    #[test]
    fn spec_deserializes_with_defaults() {
        let spec: ElementSpec = serde_json::from_str(
            r#"{"id": "flash", "children": [{"tag": "p", "classes": ["alert"], "text": "Saved"}]}"#,
        )
        .unwrap();
        assert_eq!(spec.tag, "div");
        assert_eq!(spec.children[0].tag, "p");
        let doc = Document::with_body(&[spec]).unwrap();
        let flash = doc.get_element_by_id("flash").unwrap();
        assert_eq!(doc.query_all(flash, |el| el.has_class("alert")).len(), 1);
    }
}
