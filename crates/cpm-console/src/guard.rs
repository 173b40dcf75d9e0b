//! Confirmation Interception Protocol
//!
//! Turns the declarative `hx-confirm="<question>"` contract into an
//! asynchronous dialog flow in front of the request engine.
//!
//! ## Lifecycle per guarded element
//!
//! ```text
//!            click (capture)               consent
//!   Idle ─────────────────────▶ AwaitingConsent ─────────▶ Suppressed
//!    ▲                              │   cancel / dismiss       │
//!    │◀─────────────────────────────┘                          │
//!    │◀────────────────── grace timer restores guard ──────────┘
//! ```
//!
//! - Interception prevents the click's default action and stops propagation
//!   immediately, so the engine's own element binding never sees it.
//! - On consent the guard attribute is removed, the restore timer is queued,
//!   and only then is the click re-issued; a failing re-issue cannot leak the
//!   suppression window.
//! - Concurrent dialogs on the same element are not coalesced. Each one is
//!   tracked by its `DialogId` and resolves independently.
//! - While an element is suppressed, a *trusted* click on it is intercepted
//!   with the captured message; only the synthetic re-issue passes through.

use std::collections::{BTreeMap, HashMap};

use cpm_core::effects::{ConfirmRequest, DialogEffects, DialogIcon, DialogId, DialogOutcome};
use cpm_core::{Document, ElementId, Locale, Scheduler, TimerId, UiEvent};
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::task::Task;

/// Where a guarded element currently is in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardPhase {
    /// Guard attribute in place, no dialog open
    Idle,
    /// At least one confirmation dialog is open for it
    AwaitingConsent,
    /// Guard attribute removed for a re-issued action
    Suppressed,
}

/// What the guard did with a click.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interception {
    /// Not guarded (or empty guard); other listeners proceed
    Passthrough,
    /// Click swallowed, dialog open
    AwaitingConsent(DialogId),
    /// Click swallowed, but the dialog could not be shown; nothing else happens
    PresentFailed,
}

/// Outcome of resolving a dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Re-issue the action on `element`
    Consented {
        /// Element the consent was for
        element: ElementId,
        /// Guard message shown in the dialog
        message: String,
    },
    /// Cancelled or dismissed; guard untouched
    Declined {
        /// Element the dialog was for
        element: ElementId,
    },
    /// No pending dialog with that id
    Unknown,
}

#[derive(Clone, Debug)]
struct PendingConsent {
    element: ElementId,
    message: String,
}

#[derive(Clone, Debug)]
struct Suppression {
    message: String,
    restore: TimerId,
}

/// State machine for every guarded element in the document.
#[derive(Debug)]
pub struct ConfirmGuard {
    attribute: String,
    grace_ms: u64,
    confirm_color: String,
    cancel_color: String,
    pending: BTreeMap<DialogId, PendingConsent>,
    suppressed: HashMap<ElementId, Suppression>,
    next_dialog: u64,
}

impl ConfirmGuard {
    /// A guard reading the configured attribute name and grace period.
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            attribute: config.guard_attribute.clone(),
            grace_ms: config.suppression_grace_ms,
            confirm_color: config.confirm_button_color.clone(),
            cancel_color: config.cancel_button_color.clone(),
            pending: BTreeMap::new(),
            suppressed: HashMap::new(),
            next_dialog: 1,
        }
    }

    /// Inspect a click in the capture phase and take ownership of it if guarded.
    pub fn intercept(
        &mut self,
        doc: &Document,
        event: &mut UiEvent,
        locale: Locale,
        dialogs: &mut impl DialogEffects,
    ) -> Interception {
        let Some((element, message)) = self.guarded_ancestor(doc, event) else {
            return Interception::Passthrough;
        };
        if message.is_empty() {
            return Interception::Passthrough;
        }

        event.prevent_default();
        event.stop_immediate_propagation();

        let id = DialogId::from_raw(self.next_dialog);
        self.next_dialog += 1;
        let request = self.confirm_request(id, &message, locale);

        match dialogs.present_confirm(request) {
            Ok(()) => {
                debug!(%element, dialog = %id, "guarded click intercepted");
                self.pending.insert(id, PendingConsent { element, message });
                Interception::AwaitingConsent(id)
            }
            Err(err) => {
                warn!(%element, error = %err, "confirmation dialog failed; action dropped");
                Interception::PresentFailed
            }
        }
    }

    /// Nearest ancestor-or-self that is guarded, with the message to show.
    ///
    /// A suppressed element counts as guarded for trusted clicks, using the
    /// message captured when the window opened.
    fn guarded_ancestor(&self, doc: &Document, event: &UiEvent) -> Option<(ElementId, String)> {
        doc.ancestors_inclusive(event.target())
            .into_iter()
            .find_map(|candidate| {
                if let Some(message) = doc.get_attribute(candidate, &self.attribute) {
                    return Some((candidate, message.to_string()));
                }
                match self.suppressed.get(&candidate) {
                    Some(window) if event.is_trusted() => {
                        Some((candidate, window.message.clone()))
                    }
                    _ => None,
                }
            })
    }

    fn confirm_request(&self, id: DialogId, message: &str, locale: Locale) -> ConfirmRequest {
        let strings = locale.confirm_strings();
        ConfirmRequest {
            id,
            title: strings.title.to_string(),
            text: message.to_string(),
            icon: DialogIcon::Warning,
            confirm_label: strings.proceed.to_string(),
            cancel_label: strings.cancel.to_string(),
            confirm_color: self.confirm_color.clone(),
            cancel_color: self.cancel_color.clone(),
            reverse_buttons: true,
        }
    }

    /// Close a pending dialog. The caller re-issues on `Consented`.
    pub fn resolve(&mut self, dialog: DialogId, outcome: DialogOutcome) -> Resolution {
        let Some(pending) = self.pending.remove(&dialog) else {
            debug!(%dialog, "resolution for unknown dialog ignored");
            return Resolution::Unknown;
        };
        if outcome.is_confirmed() {
            info!(element = %pending.element, %dialog, "consent recorded");
            Resolution::Consented {
                element: pending.element,
                message: pending.message,
            }
        } else {
            debug!(element = %pending.element, %dialog, ?outcome, "confirmation declined");
            Resolution::Declined {
                element: pending.element,
            }
        }
    }

    /// Open (or extend) the suppression window: drop the guard attribute and
    /// queue its restoration. Must run before the re-issued click is dispatched.
    pub fn suppress(
        &mut self,
        doc: &mut Document,
        scheduler: &mut Scheduler<Task>,
        element: ElementId,
        message: String,
    ) {
        if let Ok(el) = doc.element_mut(element) {
            el.remove_attribute(&self.attribute);
        }

        let restore = scheduler.schedule(self.grace_ms, Task::RestoreGuard { element });
        match self.suppressed.get_mut(&element) {
            Some(window) => {
                scheduler.cancel(window.restore);
                window.restore = restore;
            }
            None => {
                self.suppressed
                    .insert(element, Suppression { message, restore });
            }
        }
    }

    /// End the suppression window. Returns `true` if the attribute was put back.
    pub fn restore(&mut self, doc: &mut Document, element: ElementId) -> bool {
        let Some(window) = self.suppressed.remove(&element) else {
            return false;
        };
        if !doc.is_connected(element) {
            debug!(%element, "guarded element left the document; restore skipped");
            return false;
        }
        match doc.element_mut(element) {
            Ok(el) => {
                el.set_attribute(self.attribute.as_str(), window.message);
                true
            }
            Err(_) => false,
        }
    }

    /// Protocol phase of `element`. Elements the guard never saw are `Idle`.
    pub fn phase(&self, element: ElementId) -> GuardPhase {
        if self.suppressed.contains_key(&element) {
            GuardPhase::Suppressed
        } else if self.pending.values().any(|p| p.element == element) {
            GuardPhase::AwaitingConsent
        } else {
            GuardPhase::Idle
        }
    }

    /// Open dialogs, oldest first.
    pub fn pending_dialogs(&self) -> Vec<DialogId> {
        self.pending.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpm_core::effects::EffectError;
    use cpm_core::{ElementSpec, EventKind};

    #[derive(Default)]
    struct Dialogs {
        shown: Vec<ConfirmRequest>,
        fail: bool,
    }

    impl DialogEffects for Dialogs {
        fn present_confirm(&mut self, request: ConfirmRequest) -> Result<(), EffectError> {
            if self.fail {
                return Err(EffectError::DialogUnavailable {
                    reason: "renderer not loaded".into(),
                });
            }
            self.shown.push(request);
            Ok(())
        }
    }

    fn fixture() -> (Document, ElementId, ElementId) {
        let doc = Document::with_body(&[ElementSpec::new("button")
            .id("delete")
            .attr("hx-delete", "/sites/1")
            .attr("hx-confirm", "Delete this item?")
            .child(ElementSpec::new("span").id("label").text("Delete"))])
        .unwrap();
        let button = doc.get_element_by_id("delete").unwrap();
        let label = doc.get_element_by_id("label").unwrap();
        (doc, button, label)
    }

    #[test]
    fn click_on_descendant_is_intercepted_for_the_guarded_ancestor() {
        let (doc, button, label) = fixture();
        let mut guard = ConfirmGuard::new(&ConsoleConfig::default());
        let mut dialogs = Dialogs::default();
        let mut event = UiEvent::new(EventKind::Click, label);

        let outcome = guard.intercept(&doc, &mut event, Locale::English, &mut dialogs);

        assert!(matches!(outcome, Interception::AwaitingConsent(_)));
        assert!(event.default_prevented());
        assert!(event.immediate_propagation_stopped());
        assert_eq!(guard.phase(button), GuardPhase::AwaitingConsent);
        assert_eq!(dialogs.shown[0].text, "Delete this item?");
        assert_eq!(dialogs.shown[0].button_order(), ["Cancel", "Yes, proceed"]);
        assert_eq!(dialogs.shown[0].confirm_color, "#dc3545");
    }

    #[test]
    fn empty_guard_is_passthrough() {
        let (mut doc, button, _) = fixture();
        doc.element_mut(button).unwrap().set_attribute("hx-confirm", "");
        let mut guard = ConfirmGuard::new(&ConsoleConfig::default());
        let mut dialogs = Dialogs::default();
        let mut event = UiEvent::new(EventKind::Click, button);

        assert_eq!(
            guard.intercept(&doc, &mut event, Locale::English, &mut dialogs),
            Interception::Passthrough
        );
        assert!(!event.default_prevented());
        assert!(dialogs.shown.is_empty());
    }

    #[test]
    fn dialog_failure_keeps_guard_and_records_nothing() {
        let (doc, button, _) = fixture();
        let mut guard = ConfirmGuard::new(&ConsoleConfig::default());
        let mut dialogs = Dialogs {
            fail: true,
            ..Dialogs::default()
        };
        let mut event = UiEvent::new(EventKind::Click, button);

        assert_eq!(
            guard.intercept(&doc, &mut event, Locale::English, &mut dialogs),
            Interception::PresentFailed
        );
        assert!(event.default_prevented());
        assert_eq!(guard.phase(button), GuardPhase::Idle);
        assert!(guard.pending_dialogs().is_empty());
        assert!(doc.has_attribute(button, "hx-confirm"));
    }

    #[test]
    fn czech_locale_localizes_labels() {
        let (doc, button, _) = fixture();
        let mut guard = ConfirmGuard::new(&ConsoleConfig::default());
        let mut dialogs = Dialogs::default();
        let mut event = UiEvent::new(EventKind::Click, button);
        guard.intercept(&doc, &mut event, Locale::Czech, &mut dialogs);
        assert_eq!(dialogs.shown[0].title, "Potvrzení");
        assert_eq!(dialogs.shown[0].cancel_label, "Zrušit");
    }

    #[test]
    fn suppression_window_restores_captured_message_once() {
        let (mut doc, button, _) = fixture();
        let mut sched = Scheduler::new();
        let mut guard = ConfirmGuard::new(&ConsoleConfig::default());

        guard.suppress(&mut doc, &mut sched, button, "Delete this item?".into());
        assert!(!doc.has_attribute(button, "hx-confirm"));
        assert_eq!(guard.phase(button), GuardPhase::Suppressed);
        assert_eq!(sched.next_deadline().map(|t| t.as_millis()), Some(100));

        assert!(guard.restore(&mut doc, button));
        assert!(!guard.restore(&mut doc, button));
        assert_eq!(doc.get_attribute(button, "hx-confirm"), Some("Delete this item?"));
        assert_eq!(guard.phase(button), GuardPhase::Idle);
    }

    #[test]
    fn second_consent_reschedules_the_single_restore() {
        let (mut doc, button, _) = fixture();
        let mut sched = Scheduler::new();
        let mut guard = ConfirmGuard::new(&ConsoleConfig::default());

        guard.suppress(&mut doc, &mut sched, button, "Delete this item?".into());
        sched.advance_clock(cpm_core::Timestamp::from_millis(60));
        guard.suppress(&mut doc, &mut sched, button, "ignored".into());

        assert_eq!(sched.pending_timers(), 1);
        assert_eq!(sched.next_deadline().map(|t| t.as_millis()), Some(160));
        assert!(guard.restore(&mut doc, button));
        assert_eq!(doc.get_attribute(button, "hx-confirm"), Some("Delete this item?"));
    }

    #[test]
    fn restore_is_silent_for_detached_elements() {
        let (mut doc, button, _) = fixture();
        let mut sched = Scheduler::new();
        let mut guard = ConfirmGuard::new(&ConsoleConfig::default());
        guard.suppress(&mut doc, &mut sched, button, "Delete this item?".into());
        doc.remove(button).unwrap();

        assert!(!guard.restore(&mut doc, button));
        assert!(!doc.has_attribute(button, "hx-confirm"));
        assert_eq!(guard.phase(button), GuardPhase::Idle);
    }

    #[test]
    fn trusted_click_during_suppression_is_challenged_again() {
        let (mut doc, button, _) = fixture();
        let mut sched = Scheduler::new();
        let mut guard = ConfirmGuard::new(&ConsoleConfig::default());
        let mut dialogs = Dialogs::default();
        guard.suppress(&mut doc, &mut sched, button, "Delete this item?".into());

        let mut reissue = UiEvent::synthetic(EventKind::Click, button);
        assert_eq!(
            guard.intercept(&doc, &mut reissue, Locale::English, &mut dialogs),
            Interception::Passthrough
        );

        let mut user = UiEvent::new(EventKind::Click, button);
        assert!(matches!(
            guard.intercept(&doc, &mut user, Locale::English, &mut dialogs),
            Interception::AwaitingConsent(_)
        ));
        assert_eq!(dialogs.shown[0].text, "Delete this item?");
    }

    #[test]
    fn resolve_consumes_the_pending_dialog() {
        let (doc, button, _) = fixture();
        let mut guard = ConfirmGuard::new(&ConsoleConfig::default());
        let mut dialogs = Dialogs::default();
        let mut event = UiEvent::new(EventKind::Click, button);
        let Interception::AwaitingConsent(id) =
            guard.intercept(&doc, &mut event, Locale::English, &mut dialogs)
        else {
            panic!("expected interception");
        };

        assert_eq!(
            guard.resolve(id, DialogOutcome::Confirmed),
            Resolution::Consented {
                element: button,
                message: "Delete this item?".into()
            }
        );
        assert_eq!(guard.resolve(id, DialogOutcome::Confirmed), Resolution::Unknown);
    }
}
