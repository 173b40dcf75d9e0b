//! Request engine binding
//!
//! Reads the declarative `hx-*` attributes the external request engine acts
//! on. The runtime uses this to register one element-level listener per
//! trigger and to build the [`EngineRequest`] handed to the engine.

use cpm_core::{Document, Element, ElementId, EngineRequest, EventKind, HttpVerb, UiEvent};

/// Class present on an element while its request is in flight.
pub const LOADING_CLASS: &str = "htmx-loading";

const TRIGGER_ATTRIBUTE: &str = "hx-trigger";

/// What an element asks the engine to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineBinding {
    /// Verb of the first `hx-*` attribute found
    pub verb: HttpVerb,
    /// Attribute value
    pub path: String,
    /// Events that fire the request, in declaration order
    pub triggers: Vec<EventKind>,
}

impl EngineBinding {
    /// Whether `kind` is one of the declared triggers.
    pub fn fires_on(&self, kind: &EventKind) -> bool {
        self.triggers.iter().any(|t| t == kind)
    }
}

/// Binding declared on `el`, if any. The first verb attribute present wins.
pub fn binding_for(el: &Element) -> Option<EngineBinding> {
    let (verb, path) = HttpVerb::ALL
        .iter()
        .find_map(|verb| el.attribute(verb.attribute()).map(|path| (*verb, path)))?;
    let triggers = match el.attribute(TRIGGER_ATTRIBUTE) {
        Some(spec) => parse_triggers(spec),
        None => Vec::new(),
    };
    let triggers = if triggers.is_empty() {
        vec![default_trigger(el.tag())]
    } else {
        triggers
    };
    Some(EngineBinding {
        verb,
        path: path.to_string(),
        triggers,
    })
}

/// Event names from an `hx-trigger` value. Each comma-separated spec
/// contributes its first token; modifiers such as `changed` or `delay:` are
/// not interpreted.
pub fn parse_triggers(spec: &str) -> Vec<EventKind> {
    spec.split(',')
        .filter_map(|part| part.split_whitespace().next())
        .map(EventKind::from_name)
        .collect()
}

/// Trigger used when `hx-trigger` is absent.
pub fn default_trigger(tag: &str) -> EventKind {
    match tag {
        "form" => EventKind::Submit,
        "input" | "textarea" | "select" => EventKind::Change,
        _ => EventKind::Click,
    }
}

/// `scope` and its descendants that declare a request, in document order.
pub fn bindable_elements(doc: &Document, scope: ElementId) -> Vec<(ElementId, EngineBinding)> {
    std::iter::once(scope)
        .chain(doc.descendants(scope))
        .filter_map(|id| {
            doc.element(id)
                .and_then(binding_for)
                .map(|binding| (id, binding))
        })
        .collect()
}

/// Request the engine should issue for `event` reaching `element`, read from
/// the element's current attributes.
pub fn request_for(doc: &Document, element: ElementId, event: &UiEvent) -> Option<EngineRequest> {
    let binding = doc.element(element).and_then(binding_for)?;
    if !binding.fires_on(event.kind()) {
        return None;
    }
    Some(EngineRequest {
        element,
        verb: binding.verb,
        path: binding.path,
        trigger: event.kind().clone(),
        synthetic: !event.is_trusted(),
    })
}
