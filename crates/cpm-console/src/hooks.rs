//! One-shot page hooks
//!
//! Small handlers wired at start: native `data-confirm` prompts, password
//! visibility toggles, required-field validation, copy-to-clipboard with
//! feedback, tab selection, the request loading class and flash message
//! dismissal. Each is independent; a failing one never affects the others.

use std::collections::HashMap;

use cpm_core::effects::{ClipboardEffects, NativePromptEffects};
use cpm_core::{Document, ElementId, Scheduler, TimerId, UiEvent};
use tracing::{debug, warn};

use crate::engine::LOADING_CLASS;
use crate::task::Task;

/// Links and buttons carrying this ask a native yes/no question first.
pub const NATIVE_CONFIRM_ATTRIBUTE: &str = "data-confirm";
/// Question used when `data-confirm` is empty.
pub const DEFAULT_NATIVE_CONFIRM: &str = "Are you sure?";
/// Button that flips the named password field between masked and plain.
pub const TOGGLE_PASSWORD_ATTRIBUTE: &str = "data-toggle-password";
/// Forms checked for empty required fields before submit.
pub const VALIDATE_ATTRIBUTE: &str = "data-validate";
/// Attribute marking a field that must not be empty.
pub const REQUIRED_ATTRIBUTE: &str = "required";
/// Marks a required field left empty.
pub const ERROR_CLASS: &str = "error";
/// Alert shown when validation blocks a submit.
pub const REQUIRED_FIELDS_ALERT: &str = "Please fill in all required fields";
/// Value written to the clipboard when the element is clicked.
pub const COPY_ATTRIBUTE: &str = "data-copy";
/// Temporary label of a copy button after a successful copy.
pub const COPIED_LABEL: &str = "✓ Copied!";
/// Tab group.
pub const TABS_CLASS: &str = "tabs";
/// A tab inside a group.
pub const TAB_CLASS: &str = "tab";
/// The selected tab.
pub const ACTIVE_CLASS: &str = "active";
/// Container of server-rendered flash messages.
pub const FLASH_CONTAINER_ID: &str = "flash-messages";
/// A single flash message.
pub const ALERT_CLASS: &str = "alert";

const MASKED_LABEL: &str = "👁️";
const REVEALED_LABEL: &str = "🙈";

/// Ask the native `confirm()` when the click target itself carries
/// `data-confirm`. A refusal cancels the click. Returns whether it may proceed.
pub fn native_confirm_gate(
    doc: &Document,
    event: &mut UiEvent,
    prompts: &mut impl NativePromptEffects,
) -> bool {
    let Some(message) = doc.get_attribute(event.target(), NATIVE_CONFIRM_ATTRIBUTE) else {
        return true;
    };
    let message = if message.is_empty() {
        DEFAULT_NATIVE_CONFIRM
    } else {
        message
    };
    if prompts.confirm(message) {
        return true;
    }
    event.prevent_default();
    event.stop_propagation();
    debug!(element = %event.target(), "native confirmation refused");
    false
}

/// Elements carrying `data-toggle-password` under `scope`.
pub fn password_toggles(doc: &Document, scope: ElementId) -> Vec<ElementId> {
    doc.query_all(scope, |el| el.has_attribute(TOGGLE_PASSWORD_ATTRIBUTE))
}

/// Flip the referenced input between masked and plain text. Returns `true`
/// when the password is now visible, `None` if the input does not exist.
pub fn toggle_password(doc: &mut Document, button: ElementId) -> Option<bool> {
    let input_id = doc.get_attribute(button, TOGGLE_PASSWORD_ATTRIBUTE)?.to_string();
    let input = doc.get_element_by_id(&input_id)?;

    let masked = doc.get_attribute(input, "type") == Some("password");
    let next = if masked { "text" } else { "password" };
    doc.element_mut(input).ok()?.set_attribute("type", next);

    let label = if next == "password" {
        MASKED_LABEL
    } else {
        REVEALED_LABEL
    };
    if let Ok(el) = doc.element_mut(button) {
        el.set_text(label);
    }
    Some(next == "text")
}

/// Forms opting into required-field validation.
pub fn validated_forms(doc: &Document, scope: ElementId) -> Vec<ElementId> {
    doc.query_all(scope, |el| el.tag() == "form" && el.has_attribute(VALIDATE_ATTRIBUTE))
}

/// Mark empty required fields with the error class and clear it on the rest.
/// Returns `true` when every required field has a value.
pub fn validate_form(doc: &mut Document, form: ElementId) -> bool {
    let required = doc.query_all(form, |el| el.has_attribute(REQUIRED_ATTRIBUTE));
    let mut valid = true;
    for field in required {
        let Ok(el) = doc.element_mut(field) else {
            continue;
        };
        if el.value().trim().is_empty() {
            valid = false;
            el.add_class(ERROR_CLASS);
        } else {
            el.remove_class(ERROR_CLASS);
        }
    }
    valid
}

/// Copy-to-clipboard buttons and their temporary "copied" label.
#[derive(Debug)]
pub struct CopyFeedback {
    feedback_ms: u64,
    /// Original label and revert timer per element showing feedback
    showing: HashMap<ElementId, (String, TimerId)>,
}

impl CopyFeedback {
    /// Feedback that reverts after `feedback_ms`.
    pub fn new(feedback_ms: u64) -> Self {
        Self {
            feedback_ms,
            showing: HashMap::new(),
        }
    }

    /// Handle a click on `target`. Returns `true` if text was copied.
    pub fn handle_click(
        &mut self,
        doc: &mut Document,
        scheduler: &mut Scheduler<Task>,
        clipboard: &mut impl ClipboardEffects,
        target: ElementId,
    ) -> bool {
        let Some(text) = doc.get_attribute(target, COPY_ATTRIBUTE).map(str::to_string) else {
            return false;
        };
        if let Err(err) = clipboard.write_text(&text) {
            warn!(%target, error = %err, "clipboard write failed");
            return false;
        }

        let Ok(el) = doc.element_mut(target) else {
            return true;
        };
        // A repeat click inside the feedback window keeps the first label.
        let original = match self.showing.remove(&target) {
            Some((original, timer)) => {
                scheduler.cancel(timer);
                original
            }
            None => el.text().to_string(),
        };
        el.set_text(COPIED_LABEL);
        let timer = scheduler.schedule(
            self.feedback_ms,
            Task::RevertCopyFeedback { element: target },
        );
        self.showing.insert(target, (original, timer));
        true
    }

    /// Put back the original label. Does nothing if no feedback is showing.
    pub fn revert(&mut self, doc: &mut Document, element: ElementId) {
        let Some((original, _)) = self.showing.remove(&element) else {
            return;
        };
        if let Ok(el) = doc.element_mut(element) {
            el.set_text(original);
        }
    }

    /// Whether `element` currently shows the copied label.
    pub fn is_showing(&self, element: ElementId) -> bool {
        self.showing.contains_key(&element)
    }
}

/// `.tab` elements that sit inside a `.tabs` group.
pub fn tab_elements(doc: &Document, scope: ElementId) -> Vec<ElementId> {
    doc.query_all(scope, |el| el.has_class(TAB_CLASS))
        .into_iter()
        .filter(|tab| tab_group(doc, *tab).is_some())
        .collect()
}

fn tab_group(doc: &Document, tab: ElementId) -> Option<ElementId> {
    doc.ancestors_inclusive(tab)
        .into_iter()
        .skip(1)
        .find(|id| doc.has_class(*id, TABS_CLASS))
}

/// Make `tab` the only active tab in its group.
pub fn select_tab(doc: &mut Document, tab: ElementId) {
    if let Some(group) = tab_group(doc, tab) {
        for sibling in doc.query_all(group, |el| el.has_class(TAB_CLASS)) {
            if let Ok(el) = doc.element_mut(sibling) {
                el.remove_class(ACTIVE_CLASS);
            }
        }
    }
    if let Ok(el) = doc.element_mut(tab) {
        el.add_class(ACTIVE_CLASS);
    }
}

/// Toggle the loading class while a request for `element` is in flight.
pub fn mark_loading(doc: &mut Document, element: ElementId, loading: bool) -> bool {
    let Ok(el) = doc.element_mut(element) else {
        return false;
    };
    if loading {
        el.add_class(LOADING_CLASS)
    } else {
        el.remove_class(LOADING_CLASS)
    }
}

/// Auto-dismissal of server-rendered flash messages.
#[derive(Debug, Clone, Copy)]
pub struct FlashMessages {
    display_ms: u64,
    fade_ms: u64,
}

impl FlashMessages {
    /// Messages stay for `display_ms`, then fade for `fade_ms` before removal.
    pub fn new(display_ms: u64, fade_ms: u64) -> Self {
        Self {
            display_ms,
            fade_ms,
        }
    }

    /// Queue the fade if the page has a flash container.
    pub fn schedule(&self, doc: &Document, scheduler: &mut Scheduler<Task>) -> Option<TimerId> {
        let container = doc.get_element_by_id(FLASH_CONTAINER_ID)?;
        Some(scheduler.schedule(self.display_ms, Task::FadeFlash { container }))
    }

    /// Fade every alert currently in the container and queue their removal.
    pub fn fade(&self, doc: &mut Document, scheduler: &mut Scheduler<Task>, container: ElementId) {
        let alerts = doc.query_all(container, |el| el.has_class(ALERT_CLASS));
        if alerts.is_empty() {
            return;
        }
        for alert in &alerts {
            if let Ok(el) = doc.element_mut(*alert) {
                el.set_style("opacity", "0");
            }
        }
        debug!(count = alerts.len(), "flash messages fading");
        scheduler.schedule(self.fade_ms, Task::RemoveFlash { alerts });
    }

    /// Drop the faded alerts from the page.
    pub fn remove(&self, doc: &mut Document, alerts: &[ElementId]) {
        for alert in alerts {
            // An alert nested in one dropped earlier is already gone.
            if !doc.contains(*alert) {
                continue;
            }
            if let Err(err) = doc.drop_subtree(*alert) {
                debug!(%alert, error = %err, "flash message could not be removed");
            }
        }
    }
}
