//! UI events and listener registration
//!
//! Events follow the DOM propagation model: document capture, ancestor capture
//! (root first), target, ancestor bubble (parent first), document bubble.
//! Listeners on one node run in registration order. The registry is generic
//! over the handler type so the console can route to a closed set of handlers
//! instead of boxed closures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, ElementId};

/// Event type. Unknown names become `Custom`, which is how synthetic triggers
/// such as `search` are represented.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// `click`
    Click,
    /// `keydown`
    KeyDown,
    /// `input`, fired on every edit
    Input,
    /// `change`, fired when an edit is committed
    Change,
    /// `submit`
    Submit,
    /// Any other event name, lowercased
    Custom(String),
}

impl EventKind {
    /// Parse a DOM event name. Case and surrounding whitespace are ignored.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "click" => Self::Click,
            "keydown" => Self::KeyDown,
            "input" => Self::Input,
            "change" => Self::Change,
            "submit" => Self::Submit,
            other => Self::Custom(other.to_string()),
        }
    }

    /// DOM event name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Click => "click",
            Self::KeyDown => "keydown",
            Self::Input => "input",
            Self::Change => "change",
            Self::Submit => "submit",
            Self::Custom(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyboard key carried by `KeyDown` events.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    /// A single printable character
    Char(char),
    /// Any other named key (`ArrowUp`, `F5`, ...)
    Other(String),
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Self::Escape,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Other(other.to_string()),
                }
            }
        }
    }
}

/// Propagation phase an event is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Walking down from the document towards the target
    Capture,
    /// At the target itself
    Target,
    /// Walking back up towards the document
    Bubble,
}

/// The node whose listeners are currently running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CurrentTarget {
    /// The document object itself (above the root element)
    Document,
    /// An element in the tree
    Element(ElementId),
}

/// A dispatched UI event with DOM-style propagation flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiEvent {
    kind: EventKind,
    target: ElementId,
    key: Option<Key>,
    trusted: bool,
    phase: Phase,
    current_target: CurrentTarget,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
}

impl UiEvent {
    /// A user-originated event.
    pub fn new(kind: EventKind, target: ElementId) -> Self {
        Self {
            kind,
            target,
            key: None,
            trusted: true,
            phase: Phase::Capture,
            current_target: CurrentTarget::Document,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    /// A programmatically dispatched event (re-issued clicks, debounced triggers).
    pub fn synthetic(kind: EventKind, target: ElementId) -> Self {
        Self {
            trusted: false,
            ..Self::new(kind, target)
        }
    }

    /// A trusted `keydown` carrying `key`.
    pub fn key_down(target: ElementId, key: Key) -> Self {
        Self {
            key: Some(key),
            ..Self::new(EventKind::KeyDown, target)
        }
    }

    /// Event type.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Element the event was dispatched at.
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Key, for keyboard events.
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Whether the user produced this event, as opposed to the console
    /// dispatching it.
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Current propagation phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Node whose listeners are running.
    pub fn current_target(&self) -> CurrentTarget {
        self.current_target
    }

    /// Move the event to the next node in its propagation plan.
    pub fn enter(&mut self, node: CurrentTarget, phase: Phase) {
        self.current_target = node;
        self.phase = phase;
    }

    /// Cancel the browser default action.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether some listener called [`prevent_default`](Self::prevent_default).
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop after the current node's remaining listeners.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop immediately, skipping the current node's remaining listeners too.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    /// Whether propagation ends after the current node.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Whether no further listener runs at all.
    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }
}

/// The ordered list of (node, phase) steps an event visits.
///
/// Events on detached elements never reach the document-level listeners.
pub fn propagation_plan(doc: &Document, target: ElementId) -> Vec<(CurrentTarget, Phase)> {
    let chain = doc.ancestors_inclusive(target);
    let Some((_, ancestors)) = chain.split_first() else {
        return Vec::new();
    };
    let connected = doc.is_connected(target);

    let mut plan = Vec::with_capacity(ancestors.len() * 2 + 3);
    if connected {
        plan.push((CurrentTarget::Document, Phase::Capture));
    }
    plan.extend(
        ancestors
            .iter()
            .rev()
            .map(|id| (CurrentTarget::Element(*id), Phase::Capture)),
    );
    plan.push((CurrentTarget::Element(target), Phase::Target));
    plan.extend(
        ancestors
            .iter()
            .map(|id| (CurrentTarget::Element(*id), Phase::Bubble)),
    );
    if connected {
        plan.push((CurrentTarget::Document, Phase::Bubble));
    }
    plan
}

/// Handle returned by [`ListenerRegistry::add`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Clone, Debug)]
struct Registration<H> {
    id: ListenerId,
    node: CurrentTarget,
    kind: EventKind,
    capture: bool,
    handler: H,
}

/// Listener table keyed by node, event kind and capture flag.
#[derive(Clone, Debug)]
pub struct ListenerRegistry<H> {
    entries: Vec<Registration<H>>,
    next_id: u64,
}

impl<H> Default for ListenerRegistry<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<H: Clone + PartialEq> ListenerRegistry<H> {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Registering the same (node, kind, capture, handler)
    /// twice returns the existing id, matching `addEventListener`.
    pub fn add(&mut self, node: CurrentTarget, kind: EventKind, capture: bool, handler: H) -> ListenerId {
        if let Some(existing) = self.entries.iter().find(|r| {
            r.node == node && r.kind == kind && r.capture == capture && r.handler == handler
        }) {
            return existing.id;
        }
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Registration {
            id,
            node,
            kind,
            capture,
            handler,
        });
        id
    }

    /// Unregister one listener. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|r| r.id != id);
        before != self.entries.len()
    }

    /// Drop every listener attached to an element. Returns how many were removed.
    pub fn remove_for_element(&mut self, element: ElementId) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|r| r.node != CurrentTarget::Element(element));
        before - self.entries.len()
    }

    /// Whether `id` is still registered.
    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.iter().any(|r| r.id == id)
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Listeners to run on `node` for `kind` during `phase`, in registration order.
    ///
    /// At the target both capturing and non-capturing listeners run.
    pub fn handlers(&self, node: CurrentTarget, kind: &EventKind, phase: Phase) -> Vec<(ListenerId, H)> {
        self.entries
            .iter()
            .filter(|r| r.node == node && &r.kind == kind)
            .filter(|r| match phase {
                Phase::Capture => r.capture,
                Phase::Bubble => !r.capture,
                Phase::Target => true,
            })
            .map(|r| (r.id, r.handler.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementSpec;

    #[test]
    fn plan_visits_capture_target_bubble() {
        let doc = Document::with_body(&[
            ElementSpec::new("form").id("f").child(ElementSpec::new("button").id("b"))
        ])
        .unwrap();
        let form = doc.get_element_by_id("f").unwrap();
        let button = doc.get_element_by_id("b").unwrap();
        let body = doc.body();
        let root = doc.root();

        let plan = propagation_plan(&doc, button);
        assert_eq!(
            plan,
            vec![
                (CurrentTarget::Document, Phase::Capture),
                (CurrentTarget::Element(root), Phase::Capture),
                (CurrentTarget::Element(body), Phase::Capture),
                (CurrentTarget::Element(form), Phase::Capture),
                (CurrentTarget::Element(button), Phase::Target),
                (CurrentTarget::Element(form), Phase::Bubble),
                (CurrentTarget::Element(body), Phase::Bubble),
                (CurrentTarget::Element(root), Phase::Bubble),
                (CurrentTarget::Document, Phase::Bubble),
            ]
        );
    }

    #[test]
    fn detached_targets_skip_the_document() {
        let mut doc = Document::new();
        let orphan = doc.create_element("button");
        assert_eq!(
            propagation_plan(&doc, orphan),
            vec![(CurrentTarget::Element(orphan), Phase::Target)]
        );
    }

    #[test]
    fn registry_filters_by_phase_and_dedupes() {
        let mut registry: ListenerRegistry<&'static str> = ListenerRegistry::new();
        let guard = registry.add(CurrentTarget::Document, EventKind::Click, true, "guard");
        let again = registry.add(CurrentTarget::Document, EventKind::Click, true, "guard");
        registry.add(CurrentTarget::Document, EventKind::Click, false, "overlay");
        registry.add(CurrentTarget::Document, EventKind::KeyDown, false, "escape");
        assert_eq!(guard, again);
        assert_eq!(registry.len(), 3);

        let capture: Vec<_> = registry
            .handlers(CurrentTarget::Document, &EventKind::Click, Phase::Capture)
            .into_iter()
            .map(|(_, h)| h)
            .collect();
        assert_eq!(capture, vec!["guard"]);

        let target: Vec<_> = registry
            .handlers(CurrentTarget::Document, &EventKind::Click, Phase::Target)
            .into_iter()
            .map(|(_, h)| h)
            .collect();
        assert_eq!(target, vec!["guard", "overlay"]);

        assert!(registry.remove(guard));
        assert!(!registry.contains(guard));
    }

    #[test]
    fn stop_immediate_implies_stop() {
        let mut event = UiEvent::new(EventKind::Click, ElementId::from_raw(1));
        assert!(event.is_trusted());
        event.stop_immediate_propagation();
        assert!(event.propagation_stopped());
        assert!(event.immediate_propagation_stopped());
        assert!(!UiEvent::synthetic(EventKind::Click, ElementId::from_raw(1)).is_trusted());
    }

    #[test]
    fn kinds_and_keys_parse_from_dom_names() {
        assert_eq!(EventKind::from_name("Click"), EventKind::Click);
        assert_eq!(EventKind::from_name("search"), EventKind::Custom("search".into()));
        assert_eq!(EventKind::Custom("search".into()).to_string(), "search");
        assert_eq!(Key::from_name("Escape"), Key::Escape);
        assert_eq!(Key::from_name("a"), Key::Char('a'));
        assert_eq!(Key::from_name("ArrowUp"), Key::Other("ArrowUp".into()));
    }
}
