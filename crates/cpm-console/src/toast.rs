//! Toast notifications
//!
//! A single `#toast-container` surface holds transient `div.alert` entries.
//! Each entry walks `Entering -> Shown -> Leaving` and is then removed; all
//! transitions are driven by scheduler tasks so several toasts can be in
//! flight at once without interfering.

use std::fmt;

use cpm_core::{CoreError, Document, ElementId, Scheduler, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConsoleConfig;
use crate::task::Task;

/// DOM id of the fixed surface toasts are stacked in. Created on first use.
pub const TOAST_CONTAINER_ID: &str = "toast-container";

const CONTAINER_STYLE: [(&str, &str); 7] = [
    ("position", "fixed"),
    ("top", "1rem"),
    ("right", "1rem"),
    ("z-index", "1000"),
    ("display", "flex"),
    ("flex-direction", "column"),
    ("gap", "0.5rem"),
];

const HIDDEN_OPACITY: &str = "0";
const HIDDEN_TRANSFORM: &str = "translateY(-10px)";

/// Toast severity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ToastLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    /// Parse a level name. Unknown names map to `Info`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "warning" => Self::Warning,
            "error" | "danger" => Self::Error,
            _ => Self::Info,
        }
    }

    /// Lowercase level name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// CSS modifier class applied next to `alert`.
    pub fn css_class(self) -> String {
        format!("alert-{}", self.as_str())
    }
}

/// Identifies a toast for its whole lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(u64);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

/// Lifecycle stage of a toast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastStage {
    /// Appended at opacity 0, waiting for the next frame
    Entering,
    /// Fully visible until its display time runs out
    Shown,
    /// Fading out, removal pending
    Leaving,
}

/// A live toast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToastEntry {
    /// Queue-assigned id
    pub id: ToastId,
    /// The toast's `div.alert`
    pub element: ElementId,
    /// Text shown
    pub message: String,
    /// Styling level
    pub level: ToastLevel,
    /// When [`ToastQueue::notify`] ran
    pub created_at: Timestamp,
    /// Current lifecycle stage
    pub stage: ToastStage,
}

/// Live toasts in insertion order.
#[derive(Debug)]
pub struct ToastQueue {
    container: Option<ElementId>,
    entries: Vec<ToastEntry>,
    display_ms: u64,
    fade_ms: u64,
    next_id: u64,
}

impl ToastQueue {
    /// An empty queue using the configured display and fade times.
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            container: None,
            entries: Vec::new(),
            display_ms: config.toast_display_ms,
            fade_ms: config.toast_fade_ms,
            next_id: 1,
        }
    }

    /// Find or create the notification surface. Safe to call repeatedly.
    pub fn ensure_surface(&mut self, doc: &mut Document) -> Result<ElementId, CoreError> {
        if let Some(container) = self.container.filter(|c| doc.is_connected(*c)) {
            return Ok(container);
        }
        let container = match doc.get_element_by_id(TOAST_CONTAINER_ID) {
            Some(existing) => existing,
            None => {
                let container = doc.create_element("div");
                let el = doc.element_mut(container)?;
                el.set_attribute("id", TOAST_CONTAINER_ID);
                for (property, value) in CONTAINER_STYLE {
                    el.set_style(property, value);
                }
                let body = doc.body();
                doc.append_child(body, container)?;
                debug!(%container, "toast surface created");
                container
            }
        };
        self.container = Some(container);
        Ok(container)
    }

    /// Show `message`. The entry fades in on the next frame and leaves after
    /// the display period.
    pub fn notify(
        &mut self,
        doc: &mut Document,
        scheduler: &mut Scheduler<Task>,
        message: &str,
        level: ToastLevel,
    ) -> Result<ToastId, CoreError> {
        let container = self.ensure_surface(doc)?;

        let element = doc.create_element("div");
        {
            let el = doc.element_mut(element)?;
            el.add_class("alert");
            el.add_class(level.css_class());
            el.set_text(message);
            el.set_style("opacity", HIDDEN_OPACITY);
            el.set_style("transform", HIDDEN_TRANSFORM);
            el.set_style("transition", "all 0.3s");
        }
        doc.append_child(container, element)?;

        let id = ToastId(self.next_id);
        self.next_id += 1;
        self.entries.push(ToastEntry {
            id,
            element,
            message: message.to_string(),
            level,
            created_at: scheduler.now(),
            stage: ToastStage::Entering,
        });

        scheduler.request_frame(Task::ToastEnter(id));
        scheduler.schedule(self.display_ms, Task::ToastExpire(id));
        debug!(toast = %id, level = level.as_str(), "toast queued");
        Ok(id)
    }

    /// Run the entry transition. Ignored unless the toast is still entering.
    pub fn on_enter(&mut self, doc: &mut Document, id: ToastId) {
        let Some(entry) = self.entry_mut(id) else {
            return;
        };
        if entry.stage != ToastStage::Entering {
            return;
        }
        entry.stage = ToastStage::Shown;
        let element = entry.element;
        if let Ok(el) = doc.element_mut(element) {
            el.set_style("opacity", "1");
            el.set_style("transform", "translateY(0)");
        }
    }

    /// Start fading and schedule the removal.
    pub fn on_expire(&mut self, doc: &mut Document, scheduler: &mut Scheduler<Task>, id: ToastId) {
        let fade_ms = self.fade_ms;
        let Some(entry) = self.entry_mut(id) else {
            return;
        };
        entry.stage = ToastStage::Leaving;
        let element = entry.element;
        if let Ok(el) = doc.element_mut(element) {
            el.set_style("opacity", HIDDEN_OPACITY);
            el.set_style("transform", HIDDEN_TRANSFORM);
        }
        scheduler.schedule(fade_ms, Task::ToastRemove(id));
    }

    /// Forget the toast and drop its element from the document.
    pub fn on_remove(&mut self, doc: &mut Document, id: ToastId) {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            return;
        };
        let entry = self.entries.remove(pos);
        if doc.contains(entry.element) {
            if let Err(err) = doc.drop_subtree(entry.element) {
                debug!(toast = %id, error = %err, "toast element already gone");
            }
        }
        debug!(toast = %id, "toast removed");
    }

    /// Live toasts, oldest first.
    pub fn entries(&self) -> &[ToastEntry] {
        &self.entries
    }

    /// Look up a live toast.
    pub fn get(&self, id: ToastId) -> Option<&ToastEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: ToastId) -> Option<&mut ToastEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Document, Scheduler<Task>, ToastQueue) {
        (
            Document::new(),
            Scheduler::new(),
            ToastQueue::new(&ConsoleConfig::default()),
        )
    }

    #[test]
    fn surface_is_created_once() {
        let (mut doc, mut sched, mut toasts) = setup();
        toasts.notify(&mut doc, &mut sched, "Saved", ToastLevel::Success).unwrap();
        toasts.notify(&mut doc, &mut sched, "Saved again", ToastLevel::Info).unwrap();

        let surfaces = doc.query_all(doc.root(), |el| el.dom_id() == Some(TOAST_CONTAINER_ID));
        assert_eq!(surfaces.len(), 1);
        let container = doc.element(surfaces[0]).unwrap();
        assert_eq!(container.style("position"), Some("fixed"));
        assert_eq!(container.children().len(), 2);
    }

    #[test]
    fn existing_surface_is_reused() {
        let mut doc = Document::with_body(&[cpm_core::ElementSpec::new("div").id(TOAST_CONTAINER_ID)])
            .unwrap();
        let existing = doc.get_element_by_id(TOAST_CONTAINER_ID).unwrap();
        let mut toasts = ToastQueue::new(&ConsoleConfig::default());
        assert_eq!(toasts.ensure_surface(&mut doc).unwrap(), existing);
    }

    #[test]
    fn entry_walks_through_its_stages() {
        let (mut doc, mut sched, mut toasts) = setup();
        let id = toasts
            .notify(&mut doc, &mut sched, "Route deleted", ToastLevel::Warning)
            .unwrap();
        let element = toasts.get(id).unwrap().element;
        assert!(doc.has_class(element, "alert-warning"));
        assert_eq!(doc.element(element).unwrap().style("opacity"), Some("0"));

        for task in sched.take_frame() {
            if let Task::ToastEnter(id) = task {
                toasts.on_enter(&mut doc, id);
            }
        }
        assert_eq!(toasts.get(id).unwrap().stage, ToastStage::Shown);
        assert_eq!(doc.element(element).unwrap().style("opacity"), Some("1"));

        toasts.on_expire(&mut doc, &mut sched, id);
        assert_eq!(toasts.get(id).unwrap().stage, ToastStage::Leaving);
        toasts.on_remove(&mut doc, id);
        assert!(toasts.entries().is_empty());
        assert!(!doc.is_connected(element));
    }

    #[test]
    fn levels_parse_leniently() {
        assert_eq!(ToastLevel::from_name("ERROR"), ToastLevel::Error);
        assert_eq!(ToastLevel::from_name("danger"), ToastLevel::Error);
        assert_eq!(ToastLevel::from_name("whatever"), ToastLevel::Info);
        assert_eq!(ToastLevel::Success.css_class(), "alert-success");
    }
}
