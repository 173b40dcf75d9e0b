//! # Console Runtime
//!
//! Composition root for the interaction layer.
//!
//! This module provides:
//! - `Console<E>`: owns the document, the listener table, the scheduler and
//!   every component state machine, generic over the host effects
//! - Event dispatch with capture/target/bubble propagation
//! - Task execution for timers and animation frames
//!
//! ## Architecture
//!
//! - **State**: component state machines (`ConfirmGuard`, `ModalController`,
//!   `ToastQueue`, `DebouncedTrigger`, `CopyFeedback`)
//! - **Routing**: a closed [`Handler`] set registered in a `ListenerRegistry`
//! - **Effects**: executed through `E: InteractionEffects`
//!
//! The confirmation guard is registered first, on the document in the capture
//! phase, so it observes every click before any other listener.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut console = Console::with_document(config, document, effects);
//! console.start();
//!
//! let event = console.click(delete_button);
//! assert!(event.default_prevented());
//!
//! let dialog = console.effects().dialogs[0].id;
//! console.resolve_dialog(dialog, DialogOutcome::Confirmed);
//! console.advance(100);
//! ```

use cpm_core::effects::{NativePromptEffects, RequestEngine};
use cpm_core::{
    propagation_plan, CoreError, CurrentTarget, DialogId, DialogOutcome, Document, ElementId,
    ElementSpec, EventKind, InteractionEffects, Key, ListenerRegistry, Locale, Scheduler,
    Timestamp, UiEvent,
};

use crate::config::ConsoleConfig;
use crate::debounce::DebouncedTrigger;
use crate::engine;
use crate::guard::{ConfirmGuard, GuardPhase, Interception, Resolution};
use crate::hooks::{self, CopyFeedback, FlashMessages, REQUIRED_FIELDS_ALERT};
use crate::modal::ModalController;
use crate::task::Task;
use crate::toast::{ToastEntry, ToastId, ToastLevel, ToastQueue};

/// Listener kinds the console can register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handler {
    /// Document capture: intercepts clicks on guarded elements
    ConfirmGuard,
    /// Document bubble: closes a modal when its overlay is clicked
    OverlayClose,
    /// Document bubble: Escape closes every modal
    EscapeClose,
    /// Body bubble: native `data-confirm` prompt
    NativeConfirm,
    /// Body bubble: `data-copy` clipboard buttons
    CopyToClipboard,
    /// Element: hands the event to the request engine
    Engine,
    /// Element: restarts the debounce timer on input
    Debounce,
    /// Element: marks the clicked tab active
    SelectTab,
    /// Element: flips a password field's visibility
    TogglePassword,
    /// Element (form submit): required-field validation
    ValidateForm,
}

/// The interaction layer for one page.
pub struct Console<E: InteractionEffects> {
    config: ConsoleConfig,
    locale: Locale,
    doc: Document,
    scheduler: Scheduler<Task>,
    listeners: ListenerRegistry<Handler>,
    guard: ConfirmGuard,
    modals: ModalController,
    toasts: ToastQueue,
    debounce: DebouncedTrigger,
    copy: CopyFeedback,
    flash: FlashMessages,
    effects: E,
    started: bool,
}

impl<E: InteractionEffects> Console<E> {
    /// Create a console over an empty document.
    pub fn new(config: ConsoleConfig, effects: E) -> Self {
        Self::with_document(config, Document::new(), effects)
    }

    /// Create a console over an existing document.
    ///
    /// Document-level listeners are installed here; element bindings are
    /// installed by [`Console::start`].
    pub fn with_document(config: ConsoleConfig, doc: Document, effects: E) -> Self {
        let mut listeners = ListenerRegistry::new();
        listeners.add(CurrentTarget::Document, EventKind::Click, true, Handler::ConfirmGuard);
        listeners.add(CurrentTarget::Document, EventKind::Click, false, Handler::OverlayClose);
        listeners.add(CurrentTarget::Document, EventKind::KeyDown, false, Handler::EscapeClose);

        Self {
            locale: config.locale,
            guard: ConfirmGuard::new(&config),
            modals: ModalController::new(),
            toasts: ToastQueue::new(&config),
            debounce: DebouncedTrigger::new(config.debounce_quiet_ms),
            copy: CopyFeedback::new(config.copy_feedback_ms),
            flash: FlashMessages::new(config.flash_display_ms, config.flash_fade_ms),
            config,
            doc,
            scheduler: Scheduler::new(),
            listeners,
            effects,
            started: false,
        }
    }

    /// Page-ready initialization. Calling it again does nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let body = self.doc.body();
        self.listeners
            .add(CurrentTarget::Element(body), EventKind::Click, false, Handler::NativeConfirm);
        self.listeners
            .add(CurrentTarget::Element(body), EventKind::Click, false, Handler::CopyToClipboard);

        self.process(self.doc.root());

        let search_id = self.config.search_input_id.clone();
        if let Some(search) = self.doc.get_element_by_id(&search_id) {
            let trigger = EventKind::from_name(&self.config.search_trigger);
            self.bind_debounce(search, trigger);
        }

        self.flash.schedule(&self.doc, &mut self.scheduler);
        tracing::info!(locale = self.locale.to_code(), "console started");
    }

    /// Whether [`start`](Self::start) has run.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Install element bindings for `scope` and its descendants: request
    /// engine triggers, tabs, password toggles and validated forms. Safe to
    /// call again after new content is inserted.
    pub fn process(&mut self, scope: ElementId) {
        for form in hooks::validated_forms(&self.doc, scope) {
            self.listen(form, EventKind::Submit, Handler::ValidateForm);
        }
        for tab in hooks::tab_elements(&self.doc, scope) {
            self.listen(tab, EventKind::Click, Handler::SelectTab);
        }
        for toggle in hooks::password_toggles(&self.doc, scope) {
            self.listen(toggle, EventKind::Click, Handler::TogglePassword);
        }
        let mut bound = 0usize;
        for (element, binding) in engine::bindable_elements(&self.doc, scope) {
            for trigger in binding.triggers {
                self.listen(element, trigger, Handler::Engine);
            }
            bound += 1;
        }
        self.modals.adopt_existing(&mut self.doc);
        tracing::debug!(%scope, bound, "processed subtree");
    }

    fn listen(&mut self, element: ElementId, kind: EventKind, handler: Handler) {
        self.listeners
            .add(CurrentTarget::Element(element), kind, false, handler);
    }

    /// Build `spec` under `parent` and process the new subtree.
    pub fn insert(&mut self, parent: ElementId, spec: &ElementSpec) -> Result<ElementId, CoreError> {
        let element = self.doc.build(parent, spec)?;
        self.process(element);
        Ok(element)
    }

    /// Remove an element from the document and drop state tied to it.
    ///
    /// The element itself stays addressable so a pending guard restore can
    /// still recognize it; its listeners are dropped.
    pub fn remove_element(&mut self, element: ElementId) -> Result<(), CoreError> {
        let mut subtree = self.doc.descendants(element);
        self.doc.remove(element)?;
        subtree.push(element);

        let unbound: usize = subtree
            .iter()
            .map(|id| self.listeners.remove_for_element(*id))
            .sum();
        self.modals.prune(&mut self.doc);
        self.debounce.prune(&self.doc, &mut self.scheduler);
        tracing::debug!(%element, unbound, "element removed");
        Ok(())
    }

    /// Debounce input on `source` into a synthetic `trigger`.
    pub fn bind_debounce(&mut self, source: ElementId, trigger: EventKind) {
        tracing::debug!(%source, %trigger, "debounced trigger bound");
        self.debounce.bind(source, trigger);
        self.listen(source, EventKind::Input, Handler::Debounce);
    }

    /// Stop debouncing `source`, discarding any pending trigger. Returns `false` if it was not bound.
    pub fn unbind_debounce(&mut self, source: ElementId) -> bool {
        self.debounce.unbind(&mut self.scheduler, source)
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Dispatch an event through the document and return it with its final
    /// propagation flags.
    pub fn dispatch(&mut self, mut event: UiEvent) -> UiEvent {
        let plan = propagation_plan(&self.doc, event.target());
        for (node, phase) in plan {
            event.enter(node, phase);
            for (id, handler) in self.listeners.handlers(node, event.kind(), phase) {
                // Removed by an earlier listener in this dispatch
                if !self.listeners.contains(id) {
                    continue;
                }
                self.run_handler(handler, node, &mut event);
                if event.immediate_propagation_stopped() {
                    break;
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }
        event
    }

    fn run_handler(&mut self, handler: Handler, node: CurrentTarget, event: &mut UiEvent) {
        let current = match node {
            CurrentTarget::Element(id) => Some(id),
            CurrentTarget::Document => None,
        };
        match handler {
            Handler::ConfirmGuard => {
                let outcome = self
                    .guard
                    .intercept(&self.doc, event, self.locale, &mut self.effects);
                if let Interception::AwaitingConsent(dialog) = outcome {
                    tracing::debug!(%dialog, "awaiting consent");
                }
            }
            Handler::OverlayClose => {
                self.modals.handle_overlay_click(&mut self.doc, event.target());
            }
            Handler::EscapeClose => {
                if event.key() == Some(&Key::Escape) {
                    self.modals.handle_escape(&mut self.doc);
                }
            }
            Handler::NativeConfirm => {
                hooks::native_confirm_gate(&self.doc, event, &mut self.effects);
            }
            Handler::CopyToClipboard => {
                self.copy.handle_click(
                    &mut self.doc,
                    &mut self.scheduler,
                    &mut self.effects,
                    event.target(),
                );
            }
            Handler::Engine => {
                if let Some(element) = current {
                    self.issue_request(element, event);
                }
            }
            Handler::Debounce => {
                if let Some(source) = current {
                    self.debounce.on_input(&mut self.scheduler, source);
                }
            }
            Handler::SelectTab => {
                if let Some(tab) = current {
                    hooks::select_tab(&mut self.doc, tab);
                }
            }
            Handler::TogglePassword => {
                if let Some(button) = current {
                    hooks::toggle_password(&mut self.doc, button);
                }
            }
            Handler::ValidateForm => {
                if let Some(form) = current {
                    if !hooks::validate_form(&mut self.doc, form) {
                        event.prevent_default();
                        self.effects.alert(REQUIRED_FIELDS_ALERT);
                    }
                }
            }
        }
    }

    fn issue_request(&mut self, element: ElementId, event: &UiEvent) {
        if event.default_prevented() {
            tracing::debug!(%element, kind = %event.kind(), "cancelled event not sent to engine");
            return;
        }
        let Some(request) = engine::request_for(&self.doc, element, event) else {
            return;
        };
        let verb = request.verb;
        match RequestEngine::issue(&mut self.effects, request) {
            Ok(()) => {
                tracing::debug!(%element, %verb, "request issued");
                hooks::mark_loading(&mut self.doc, element, true);
            }
            Err(err) => {
                tracing::warn!(%element, %verb, error = %err, "request engine rejected request");
            }
        }
    }

    /// A user click on `target`.
    pub fn click(&mut self, target: ElementId) -> UiEvent {
        self.dispatch(UiEvent::new(EventKind::Click, target))
    }

    /// A key press with focus on `target`.
    pub fn key_down(&mut self, target: ElementId, key: Key) -> UiEvent {
        self.dispatch(UiEvent::key_down(target, key))
    }

    /// A key press with nothing focused (targets the body).
    pub fn press_key(&mut self, key: Key) -> UiEvent {
        let body = self.doc.body();
        self.key_down(body, key)
    }

    /// The user typed into `target`, leaving it with `value`.
    pub fn input(&mut self, target: ElementId, value: &str) -> UiEvent {
        if let Ok(el) = self.doc.element_mut(target) {
            el.set_value(value);
        }
        self.dispatch(UiEvent::new(EventKind::Input, target))
    }

    /// The user submitted `form`.
    pub fn submit(&mut self, form: ElementId) -> UiEvent {
        self.dispatch(UiEvent::new(EventKind::Submit, form))
    }

    /// Deliver the user's answer to a confirmation dialog.
    ///
    /// On consent the guard is lifted, its restoration is queued, and the
    /// original click is re-issued on the same element.
    pub fn resolve_dialog(&mut self, dialog: DialogId, outcome: DialogOutcome) -> Resolution {
        let resolution = self.guard.resolve(dialog, outcome);
        if let Resolution::Consented { element, message } = &resolution {
            self.guard
                .suppress(&mut self.doc, &mut self.scheduler, *element, message.clone());
            tracing::info!(%element, %dialog, "re-issuing guarded click");
            self.dispatch(UiEvent::synthetic(EventKind::Click, *element));
        }
        resolution
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Current virtual time.
    pub fn now(&self) -> Timestamp {
        self.scheduler.now()
    }

    /// Earliest pending timer.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.scheduler.next_deadline()
    }

    /// Whether any timer or animation frame is outstanding.
    pub fn has_pending_work(&self) -> bool {
        self.scheduler.pending_timers() > 0 || self.scheduler.has_frames()
    }

    /// Advance virtual time by `ms`, running everything that comes due.
    pub fn advance(&mut self, ms: u64) -> usize {
        let target = self.scheduler.now().plus_millis(ms);
        self.advance_to(target)
    }

    /// Advance virtual time to `target`. Pending animation frames are flushed
    /// before each timer. Returns how many timers fired.
    pub fn advance_to(&mut self, target: Timestamp) -> usize {
        let mut fired = 0;
        loop {
            self.next_frame();
            let Some((_, task)) = self.scheduler.pop_due(target) else {
                break;
            };
            self.run_task(task);
            fired += 1;
        }
        self.scheduler.advance_clock(target);
        fired
    }

    /// Run the callbacks queued for the next animation frame.
    pub fn next_frame(&mut self) -> usize {
        let tasks = self.scheduler.take_frame();
        let count = tasks.len();
        for task in tasks {
            self.run_task(task);
        }
        count
    }

    /// Run until no timers or frames remain.
    pub fn settle(&mut self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.scheduler.next_deadline() {
            fired += self.advance_to(deadline);
        }
        self.next_frame();
        fired
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::RestoreGuard { element } => {
                if self.guard.restore(&mut self.doc, element) {
                    tracing::debug!(%element, "guard restored");
                }
            }
            Task::DebounceFire { source } => {
                if let Some(trigger) = self.debounce.fire(&self.doc, source) {
                    tracing::debug!(%source, %trigger, "debounced trigger fired");
                    self.dispatch(UiEvent::synthetic(trigger, source));
                }
            }
            Task::ToastEnter(id) => self.toasts.on_enter(&mut self.doc, id),
            Task::ToastExpire(id) => self.toasts.on_expire(&mut self.doc, &mut self.scheduler, id),
            Task::ToastRemove(id) => self.toasts.on_remove(&mut self.doc, id),
            Task::RevertCopyFeedback { element } => self.copy.revert(&mut self.doc, element),
            Task::FadeFlash { container } => {
                self.flash.fade(&mut self.doc, &mut self.scheduler, container);
            }
            Task::RemoveFlash { alerts } => self.flash.remove(&mut self.doc, &alerts),
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Show the modal with DOM id `dom_id`.
    pub fn open_modal(&mut self, dom_id: &str) -> bool {
        self.modals.open(&mut self.doc, dom_id)
    }

    /// Hide the modal with DOM id `dom_id`.
    pub fn close_modal(&mut self, dom_id: &str) -> bool {
        self.modals.close(&mut self.doc, dom_id)
    }

    /// Show a toast notification.
    pub fn notify(&mut self, message: &str, level: ToastLevel) -> Result<ToastId, CoreError> {
        self.toasts
            .notify(&mut self.doc, &mut self.scheduler, message, level)
    }

    /// Switch the dialog language. Unrecognized codes select English.
    pub fn set_locale(&mut self, code: &str) -> Locale {
        self.locale = Locale::from_code(code);
        tracing::debug!(code, locale = self.locale.to_code(), "locale changed");
        self.locale
    }

    /// Active dialog language.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// The engine started a request for `element`.
    pub fn request_started(&mut self, element: ElementId) -> bool {
        hooks::mark_loading(&mut self.doc, element, true)
    }

    /// The engine finished a request for `element`.
    pub fn request_finished(&mut self, element: ElementId) -> bool {
        hooks::mark_loading(&mut self.doc, element, false)
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Configuration the console was built with.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// The page.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable document access for hosts applying server-driven updates.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Host collaborators.
    pub fn effects(&self) -> &E {
        &self.effects
    }

    /// Mutable access to the host collaborators, for scripting test doubles.
    pub fn effects_mut(&mut self) -> &mut E {
        &mut self.effects
    }

    /// Look up a connected element by DOM id.
    pub fn element_by_id(&self, dom_id: &str) -> Option<ElementId> {
        self.doc.get_element_by_id(dom_id)
    }

    /// Where `element` is in the confirmation protocol.
    pub fn guard_phase(&self, element: ElementId) -> GuardPhase {
        self.guard.phase(element)
    }

    /// Confirmation dialogs still waiting for an answer, oldest first.
    pub fn pending_dialogs(&self) -> Vec<DialogId> {
        self.guard.pending_dialogs()
    }

    /// Live toasts, oldest first.
    pub fn toasts(&self) -> &[ToastEntry] {
        self.toasts.entries()
    }

    /// Whether the body scroll lock is held.
    pub fn is_scroll_locked(&self) -> bool {
        self.modals.is_scroll_locked(&self.doc)
    }

    /// Number of open modals.
    pub fn visible_modals(&self) -> usize {
        self.modals.visible_count()
    }

    /// Whether `modal` is tracked and open.
    pub fn is_modal_visible(&self, modal: ElementId) -> bool {
        self.modals.is_visible(modal)
    }

    /// Whether a debounced trigger is waiting on `source`.
    pub fn is_debounce_pending(&self, source: ElementId) -> bool {
        self.debounce.is_pending(source)
    }

    /// Registered listeners across the document and all elements.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
