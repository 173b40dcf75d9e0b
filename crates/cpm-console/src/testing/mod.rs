//! # Console Test Utilities
//!
//! Deterministic testing of the interaction layer without a browser.
//!
//! ## Overview
//!
//! This module provides:
//! - `RecordingEffects`: host effects that record every dialog, request,
//!   clipboard write and native prompt, with scriptable answers and failures
//! - `TestConsole`: a started `Console<RecordingEffects>` with lookup-by-id
//!   helpers and assertion methods
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cpm_console::testing::TestConsole;
//!
//! let mut console = TestConsole::with_body(&[ElementSpec::new("button")
//!     .id("delete")
//!     .attr("hx-delete", "/sites/1")
//!     .attr("hx-confirm", "Delete this item?")]);
//!
//! console.click_id("delete");
//! console.assert_requests(0);
//! console.confirm_latest();
//! console.assert_requests(1);
//! ```
//!
//! Same inputs give the same outputs: there is no wall clock, every timer runs
//! on the console's virtual scheduler.

use cpm_core::effects::{
    ClipboardEffects, DialogEffects, EffectError, NativePromptEffects, RequestEngine,
};
use cpm_core::{
    ConfirmRequest, DialogId, DialogOutcome, Document, ElementId, ElementSpec, EngineRequest,
    Key, UiEvent,
};

use crate::config::ConsoleConfig;
use crate::guard::{GuardPhase, Resolution};
use crate::runtime::Console;

/// Host effects that record everything the console asks for.
#[derive(Debug, Clone)]
pub struct RecordingEffects {
    /// Every confirmation dialog presented, in order
    pub dialogs: Vec<ConfirmRequest>,
    /// Every request handed to the engine, in order
    pub requests: Vec<EngineRequest>,
    /// Every clipboard write, in order
    pub clipboard: Vec<String>,
    /// Messages passed to native `confirm()`
    pub native_confirms: Vec<String>,
    /// Messages passed to native `alert()`
    pub alerts: Vec<String>,
    /// Answer returned by native `confirm()`
    pub native_confirm_answer: bool,
    /// Make `present_confirm` fail
    pub fail_dialogs: bool,
    /// Make the engine reject requests
    pub fail_requests: bool,
    /// Make clipboard writes fail
    pub fail_clipboard: bool,
}

impl Default for RecordingEffects {
    fn default() -> Self {
        Self {
            dialogs: Vec::new(),
            requests: Vec::new(),
            clipboard: Vec::new(),
            native_confirms: Vec::new(),
            alerts: Vec::new(),
            native_confirm_answer: true,
            fail_dialogs: false,
            fail_requests: false,
            fail_clipboard: false,
        }
    }
}

impl RecordingEffects {
    /// Effects that answer yes to native prompts and never fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently presented dialog.
    pub fn last_dialog(&self) -> Option<&ConfirmRequest> {
        self.dialogs.last()
    }

    /// Requests issued for one element.
    pub fn requests_for(&self, element: ElementId) -> Vec<&EngineRequest> {
        self.requests.iter().filter(|r| r.element == element).collect()
    }
}

impl DialogEffects for RecordingEffects {
    fn present_confirm(&mut self, request: ConfirmRequest) -> Result<(), EffectError> {
        if self.fail_dialogs {
            return Err(EffectError::DialogUnavailable {
                reason: "dialog renderer failure injected".to_string(),
            });
        }
        self.dialogs.push(request);
        Ok(())
    }
}

impl RequestEngine for RecordingEffects {
    fn issue(&mut self, request: EngineRequest) -> Result<(), EffectError> {
        if self.fail_requests {
            return Err(EffectError::Transport {
                reason: "transport failure injected".to_string(),
            });
        }
        self.requests.push(request);
        Ok(())
    }
}

impl ClipboardEffects for RecordingEffects {
    fn write_text(&mut self, text: &str) -> Result<(), EffectError> {
        if self.fail_clipboard {
            return Err(EffectError::ClipboardDenied {
                reason: "clipboard failure injected".to_string(),
            });
        }
        self.clipboard.push(text.to_string());
        Ok(())
    }
}

impl NativePromptEffects for RecordingEffects {
    fn confirm(&mut self, message: &str) -> bool {
        self.native_confirms.push(message.to_string());
        self.native_confirm_answer
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

/// Test-focused console wrapper.
pub struct TestConsole {
    console: Console<RecordingEffects>,
}

impl TestConsole {
    /// Start a console over `body` with the default configuration.
    pub fn with_body(body: &[ElementSpec]) -> Self {
        Self::with_config(ConsoleConfig::default(), body)
    }

    /// Start a console over `body`.
    ///
    /// # Panics
    ///
    /// Panics if the element specs cannot be built.
    #[allow(clippy::expect_used)]
    pub fn with_config(config: ConsoleConfig, body: &[ElementSpec]) -> Self {
        let doc = Document::with_body(body).expect("test document builds");
        Self::with_document(config, doc, RecordingEffects::new())
    }

    /// Start a console over a prepared document and effects.
    pub fn with_document(config: ConsoleConfig, doc: Document, effects: RecordingEffects) -> Self {
        let mut console = Console::with_document(config, doc, effects);
        console.start();
        Self { console }
    }

    /// The wrapped console.
    pub fn console(&self) -> &Console<RecordingEffects> {
        &self.console
    }

    /// Mutable access for operations without a helper here.
    pub fn console_mut(&mut self) -> &mut Console<RecordingEffects> {
        &mut self.console
    }

    /// Unwrap, e.g. to hand the console to a driver.
    pub fn into_console(self) -> Console<RecordingEffects> {
        self.console
    }

    /// Recorded effects.
    pub fn effects(&self) -> &RecordingEffects {
        self.console.effects()
    }

    /// Script answers and failures.
    pub fn effects_mut(&mut self) -> &mut RecordingEffects {
        self.console.effects_mut()
    }

    /// The page.
    pub fn document(&self) -> &Document {
        self.console.document()
    }

    /// Element with DOM id `dom_id`.
    ///
    /// # Panics
    ///
    /// Panics if no connected element has that id.
    pub fn id(&self, dom_id: &str) -> ElementId {
        match self.console.element_by_id(dom_id) {
            Some(id) => id,
            None => panic!("no connected element with id {dom_id:?}"),
        }
    }

    /// Trusted click on `#dom_id`.
    pub fn click_id(&mut self, dom_id: &str) -> UiEvent {
        let target = self.id(dom_id);
        self.console.click(target)
    }

    /// Set the value of `#dom_id` and dispatch `input`.
    pub fn type_into(&mut self, dom_id: &str, value: &str) -> UiEvent {
        let target = self.id(dom_id);
        self.console.input(target, value)
    }

    /// Submit the form `#dom_id`.
    pub fn submit_id(&mut self, dom_id: &str) -> UiEvent {
        let form = self.id(dom_id);
        self.console.submit(form)
    }

    /// Escape with nothing focused.
    pub fn press_escape(&mut self) -> UiEvent {
        self.console.press_key(Key::Escape)
    }

    /// Advance virtual time, returning the number of tasks run.
    pub fn advance(&mut self, ms: u64) -> usize {
        self.console.advance(ms)
    }

    /// Run one animation frame.
    pub fn next_frame(&mut self) -> usize {
        self.console.next_frame()
    }

    /// Id of the most recently presented dialog.
    ///
    /// # Panics
    ///
    /// Panics if no dialog was presented.
    pub fn latest_dialog(&self) -> DialogId {
        match self.effects().last_dialog() {
            Some(dialog) => dialog.id,
            None => panic!("no confirmation dialog was presented"),
        }
    }

    /// Answer `dialog`.
    pub fn resolve(&mut self, dialog: DialogId, outcome: DialogOutcome) -> Resolution {
        self.console.resolve_dialog(dialog, outcome)
    }

    /// Confirm the most recent dialog.
    pub fn confirm_latest(&mut self) -> Resolution {
        let dialog = self.latest_dialog();
        self.resolve(dialog, DialogOutcome::Confirmed)
    }

    /// Cancel the most recent dialog.
    pub fn cancel_latest(&mut self) -> Resolution {
        let dialog = self.latest_dialog();
        self.resolve(dialog, DialogOutcome::Cancelled)
    }

    /// Attribute of `#dom_id`.
    pub fn attribute(&self, dom_id: &str, name: &str) -> Option<String> {
        self.document()
            .get_attribute(self.id(dom_id), name)
            .map(str::to_string)
    }

    /// Text of `#dom_id`, empty if it has none.
    pub fn text(&self, dom_id: &str) -> String {
        self.document()
            .element(self.id(dom_id))
            .map(|el| el.text().to_string())
            .unwrap_or_default()
    }

    /// Whether `#dom_id` carries `class`.
    pub fn has_class(&self, dom_id: &str, class: &str) -> bool {
        self.document().has_class(self.id(dom_id), class)
    }

    /// Assert how many requests reached the engine so far.
    pub fn assert_requests(&self, expected: usize) {
        assert_eq!(
            self.effects().requests.len(),
            expected,
            "expected {expected} engine requests, got {:?}",
            self.effects().requests
        );
    }

    /// Assert how many confirmation dialogs were presented so far.
    pub fn assert_dialogs(&self, expected: usize) {
        assert_eq!(
            self.effects().dialogs.len(),
            expected,
            "expected {expected} dialogs, got {:?}",
            self.effects().dialogs
        );
    }

    /// Assert the guard phase of the element with DOM id `dom_id`.
    pub fn assert_guard(&self, dom_id: &str, expected: GuardPhase) {
        assert_eq!(
            self.console.guard_phase(self.id(dom_id)),
            expected,
            "unexpected guard phase for #{dom_id}"
        );
    }

    /// Assert whether the body scroll lock is held.
    pub fn assert_scroll_locked(&self, expected: bool) {
        assert_eq!(
            self.console.is_scroll_locked(),
            expected,
            "scroll lock mismatch"
        );
    }
}
