//! Modal visibility
//!
//! Tracks every `.modal-overlay` element and derives the document scroll lock
//! from them. `sync_scroll_lock` is the only code that touches the body's
//! `overflow` style.

use std::collections::BTreeMap;

use cpm_core::{Document, ElementId};
use tracing::debug;

/// Class identifying a modal overlay. Clicking the overlay itself closes it.
pub const MODAL_OVERLAY_CLASS: &str = "modal-overlay";
/// Present on an overlay while it is closed.
pub const HIDDEN_CLASS: &str = "hidden";

const SCROLL_LOCK_PROPERTY: &str = "overflow";
const SCROLL_LOCK_VALUE: &str = "hidden";

/// Visibility of each tracked modal overlay.
#[derive(Debug, Default)]
pub struct ModalController {
    modals: BTreeMap<ElementId, bool>,
}

impl ModalController {
    /// A controller tracking no modals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track every overlay already present in the document.
    pub fn adopt_existing(&mut self, doc: &mut Document) {
        let overlays = doc.query_all(doc.root(), |el| el.has_class(MODAL_OVERLAY_CLASS));
        for overlay in overlays {
            let visible = !doc.has_class(overlay, HIDDEN_CLASS);
            self.modals.insert(overlay, visible);
        }
        self.sync_scroll_lock(doc);
    }

    /// Show the modal with DOM id `dom_id`. Unknown ids are a no-op.
    pub fn open(&mut self, doc: &mut Document, dom_id: &str) -> bool {
        match doc.get_element_by_id(dom_id) {
            Some(modal) => self.open_element(doc, modal),
            None => {
                debug!(dom_id, "open requested for unknown modal");
                false
            }
        }
    }

    /// Hide the modal with DOM id `dom_id`. Unknown ids are a no-op.
    pub fn close(&mut self, doc: &mut Document, dom_id: &str) -> bool {
        match doc.get_element_by_id(dom_id) {
            Some(modal) => self.close_element(doc, modal),
            None => {
                debug!(dom_id, "close requested for unknown modal");
                false
            }
        }
    }

    /// Show `modal` and take the scroll lock. Returns `false` for unknown ids.
    pub fn open_element(&mut self, doc: &mut Document, modal: ElementId) -> bool {
        let Ok(el) = doc.element_mut(modal) else {
            return false;
        };
        el.remove_class(HIDDEN_CLASS);
        self.modals.insert(modal, true);
        self.sync_scroll_lock(doc);
        debug!(%modal, "modal opened");
        true
    }

    /// Hide `modal` and release the scroll lock if it was the last one.
    pub fn close_element(&mut self, doc: &mut Document, modal: ElementId) -> bool {
        let Ok(el) = doc.element_mut(modal) else {
            return false;
        };
        el.add_class(HIDDEN_CLASS);
        self.modals.insert(modal, false);
        self.sync_scroll_lock(doc);
        debug!(%modal, "modal closed");
        true
    }

    /// Hide every visible modal. Returns how many were closed.
    pub fn close_all(&mut self, doc: &mut Document) -> usize {
        let visible: Vec<ElementId> = self
            .modals
            .iter()
            .filter(|(_, visible)| **visible)
            .map(|(id, _)| *id)
            .collect();
        for modal in &visible {
            if let Ok(el) = doc.element_mut(*modal) {
                el.add_class(HIDDEN_CLASS);
            }
            self.modals.insert(*modal, false);
        }
        self.sync_scroll_lock(doc);
        visible.len()
    }

    /// Close the overlay if the click landed on the overlay itself, not its content.
    pub fn handle_overlay_click(&mut self, doc: &mut Document, target: ElementId) -> bool {
        if !doc.has_class(target, MODAL_OVERLAY_CLASS) {
            return false;
        }
        self.close_element(doc, target)
    }

    /// Escape closes every visible modal, including overlays that reached the
    /// page without passing through `process`.
    pub fn handle_escape(&mut self, doc: &mut Document) -> usize {
        let untracked = doc.query_all(doc.root(), |el| {
            el.has_class(MODAL_OVERLAY_CLASS) && !el.has_class(HIDDEN_CLASS)
        });
        for overlay in untracked {
            self.modals.insert(overlay, true);
        }
        let closed = self.close_all(doc);
        if closed > 0 {
            debug!(closed, "escape closed modals");
        }
        closed
    }

    /// Drop every tracked modal that is no longer connected.
    pub fn prune(&mut self, doc: &mut Document) -> usize {
        let before = self.modals.len();
        self.modals.retain(|modal, _| doc.is_connected(*modal));
        let pruned = before - self.modals.len();
        self.sync_scroll_lock(doc);
        pruned
    }

    /// Whether `modal` is tracked and open.
    pub fn is_visible(&self, modal: ElementId) -> bool {
        self.modals.get(&modal).copied().unwrap_or(false)
    }

    /// Number of open modals.
    pub fn visible_count(&self) -> usize {
        self.modals.values().filter(|visible| **visible).count()
    }

    /// Whether the body currently carries the scroll lock.
    pub fn is_scroll_locked(&self, doc: &Document) -> bool {
        doc.element(doc.body())
            .and_then(|body| body.style(SCROLL_LOCK_PROPERTY))
            == Some(SCROLL_LOCK_VALUE)
    }

    fn sync_scroll_lock(&self, doc: &mut Document) {
        let locked = self
            .modals
            .iter()
            .any(|(modal, visible)| *visible && doc.is_connected(*modal));
        let body = doc.body();
        if let Ok(el) = doc.element_mut(body) {
            if locked {
                el.set_style(SCROLL_LOCK_PROPERTY, SCROLL_LOCK_VALUE);
            } else {
                el.remove_style(SCROLL_LOCK_PROPERTY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpm_core::ElementSpec;

    fn modal(id: &str) -> ElementSpec {
        ElementSpec::new("div")
            .id(id)
            .class("modal-overlay hidden")
            .child(ElementSpec::new("div").id(format!("{id}-content")).class("modal"))
    }

    fn fixture() -> (Document, ModalController) {
        let mut doc = Document::with_body(&[modal("edit"), modal("delete")]).unwrap();
        let mut modals = ModalController::new();
        modals.adopt_existing(&mut doc);
        (doc, modals)
    }

    #[test]
    fn open_and_close_toggle_hidden_and_lock() {
        let (mut doc, mut modals) = fixture();
        assert!(modals.open(&mut doc, "edit"));
        let edit = doc.get_element_by_id("edit").unwrap();
        assert!(!doc.has_class(edit, HIDDEN_CLASS));
        assert!(modals.is_scroll_locked(&doc));

        assert!(modals.close(&mut doc, "edit"));
        assert!(doc.has_class(edit, HIDDEN_CLASS));
        assert!(!modals.is_scroll_locked(&doc));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let (mut doc, mut modals) = fixture();
        assert!(!modals.open(&mut doc, "missing"));
        assert!(!modals.is_scroll_locked(&doc));
    }

    #[test]
    fn lock_holds_until_last_modal_closes() {
        let (mut doc, mut modals) = fixture();
        modals.open(&mut doc, "edit");
        modals.open(&mut doc, "delete");
        modals.close(&mut doc, "edit");
        assert!(modals.is_scroll_locked(&doc));
        assert_eq!(modals.handle_escape(&mut doc), 1);
        assert!(!modals.is_scroll_locked(&doc));
    }

    #[test]
    fn content_clicks_do_not_close() {
        let (mut doc, mut modals) = fixture();
        modals.open(&mut doc, "edit");
        let content = doc.get_element_by_id("edit-content").unwrap();
        let overlay = doc.get_element_by_id("edit").unwrap();

        assert!(!modals.handle_overlay_click(&mut doc, content));
        assert!(modals.is_visible(overlay));
        assert!(modals.handle_overlay_click(&mut doc, overlay));
        assert!(!modals.is_visible(overlay));
    }

    #[test]
    fn removing_a_visible_modal_releases_the_lock() {
        let (mut doc, mut modals) = fixture();
        modals.open(&mut doc, "edit");
        let edit = doc.get_element_by_id("edit").unwrap();
        doc.remove(edit).unwrap();
        assert_eq!(modals.prune(&mut doc), 1);
        assert!(!modals.is_scroll_locked(&doc));
    }

    #[test]
    fn escape_closes_overlays_it_never_saw_open() {
        let (mut doc, mut modals) = fixture();
        let body = doc.body();
        let late = doc
            .build(body, &ElementSpec::new("div").id("late").class("modal-overlay"))
            .unwrap();
        assert!(!modals.is_visible(late));

        assert_eq!(modals.handle_escape(&mut doc), 1);
        assert!(doc.has_class(late, HIDDEN_CLASS));
        assert!(!modals.is_scroll_locked(&doc));
    }

    #[test]
    fn adopts_initially_visible_overlays() {
        let mut doc = Document::with_body(&[ElementSpec::new("div")
            .id("welcome")
            .class("modal-overlay")])
        .unwrap();
        let mut modals = ModalController::new();
        modals.adopt_existing(&mut doc);
        assert_eq!(modals.visible_count(), 1);
        assert!(modals.is_scroll_locked(&doc));
    }
}
