//! # Scenario Replay
//!
//! Replays JSON scenarios against a console with recording effects and checks
//! the outcome against the scenario's expectations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cpm_console::replay::replay_file;
//!
//! let report = replay_file(Path::new("scenarios/guarded_delete.json"), ConsoleConfig::default())?;
//! assert!(report.passed(), "{:?}", report.failures);
//! ```

use std::path::Path;

use cpm_core::{
    ConfirmRequest, DialogId, DialogOutcome, Document, ElementId, ElementSpec, EngineRequest, Key,
    Locale,
};
use serde::{Deserialize, Serialize};

use crate::config::ConsoleConfig;
use crate::errors::{ConsoleError, Result};
use crate::runtime::Console;
use crate::testing::RecordingEffects;
use crate::toast::ToastLevel;

/// A scripted interaction session.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Shown in reports and logs
    pub name: String,
    /// Overrides the configured locale
    #[serde(default)]
    pub locale: Option<String>,
    /// Initial body content
    #[serde(default)]
    pub body: Vec<ElementSpec>,
    /// How the recorded host answers
    #[serde(default)]
    pub effects: EffectScript,
    /// Actions, run in order
    pub steps: Vec<Step>,
    /// Checks run once every step has been applied
    #[serde(default)]
    pub expect: Expectations,
}

/// Scripted host behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EffectScript {
    /// Answer given to native `confirm()`
    pub native_confirm_answer: bool,
    /// Fail every confirmation dialog
    pub fail_dialogs: bool,
    /// Reject every engine request
    pub fail_requests: bool,
    /// Fail every clipboard write
    pub fail_clipboard: bool,
}

impl Default for EffectScript {
    fn default() -> Self {
        Self {
            native_confirm_answer: true,
            fail_dialogs: false,
            fail_requests: false,
            fail_clipboard: false,
        }
    }
}

/// One scenario action. Elements are addressed by DOM id.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Trusted click
    Click {
        /// Target element
        id: String,
    },
    /// Key press, on the document when `id` is omitted
    KeyDown {
        /// Focused element
        #[serde(default)]
        id: Option<String>,
        /// DOM key name
        key: String,
    },
    /// Edit a field
    Input {
        /// Edited field
        id: String,
        /// New value
        value: String,
    },
    /// Submit a form
    Submit {
        /// The form
        id: String,
    },
    /// Answer a dialog; the most recent one when `dialog` is omitted
    Resolve {
        /// Dialog to answer
        #[serde(default)]
        dialog: Option<DialogId>,
        /// Button pressed
        outcome: DialogOutcome,
    },
    /// Let virtual time pass
    Advance {
        /// Milliseconds to advance
        ms: u64,
    },
    /// Run one animation frame
    Frame,
    /// Run everything pending
    Settle,
    /// Show a modal
    OpenModal {
        /// DOM id of the overlay
        id: String,
    },
    /// Hide a modal
    CloseModal {
        /// DOM id of the overlay
        id: String,
    },
    /// Show a toast
    Notify {
        /// Toast text
        message: String,
        /// Styling level, `info` when omitted
        #[serde(default)]
        level: ToastLevel,
    },
    /// Switch the dialog language
    SetLocale {
        /// Language code
        code: String,
    },
    /// Take an element off the page
    Remove {
        /// Element to remove
        id: String,
    },
    /// The engine finished a request
    RequestFinished {
        /// Element that issued it
        id: String,
    },
}

/// Expected attribute state. `value: None` expects the attribute to be absent.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeExpectation {
    /// Element checked
    pub id: String,
    /// Attribute name
    pub name: String,
    /// Expected value
    #[serde(default)]
    pub value: Option<String>,
}

/// Checks run after the last step. Omitted fields are not checked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct Expectations {
    pub requests: Option<usize>,
    pub dialogs: Option<usize>,
    pub dialog_titles: Option<Vec<String>>,
    pub dialog_texts: Option<Vec<String>>,
    pub alerts: Option<Vec<String>>,
    pub clipboard: Option<Vec<String>>,
    /// Live toasts after the last step
    pub toasts: Option<usize>,
    pub scroll_locked: Option<bool>,
    pub attributes: Vec<AttributeExpectation>,
    pub texts: Vec<TextExpectation>,
}

/// Expected text content of an element.
#[derive(Debug, Clone, Deserialize)]
pub struct TextExpectation {
    /// Element checked
    pub id: String,
    /// Expected text
    pub text: String,
}

/// What happened during a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Scenario name
    pub name: String,
    /// Locale the scenario ran in
    pub locale: Locale,
    /// Steps applied before the replay stopped
    pub steps_run: usize,
    /// Virtual time at the end of the replay
    pub elapsed_ms: u64,
    /// Requests handed to the engine
    pub requests: Vec<EngineRequest>,
    /// Confirmation dialogs presented
    pub dialogs: Vec<ConfirmRequest>,
    /// Native alerts shown
    pub alerts: Vec<String>,
    /// Clipboard writes
    pub clipboard: Vec<String>,
    /// Native confirm questions asked
    pub native_confirms: Vec<String>,
    /// Messages of the toasts still live
    pub toasts: Vec<String>,
    /// Whether the scroll lock is held at the end
    pub scroll_locked: bool,
    /// Expectations that did not hold
    pub failures: Vec<String>,
}

impl ReplayReport {
    /// Whether every expectation held.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Read a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path).map_err(|source| ConsoleError::ScenarioRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Read and replay a scenario file.
pub fn replay_file(path: &Path, config: ConsoleConfig) -> Result<ReplayReport> {
    let scenario = load_scenario(path)?;
    replay(&scenario, config)
}

/// Replay `scenario` on a fresh console.
pub fn replay(scenario: &Scenario, mut config: ConsoleConfig) -> Result<ReplayReport> {
    if let Some(code) = &scenario.locale {
        config.locale = Locale::from_code(code);
    }
    config.validate()?;

    let doc = Document::with_body(&scenario.body)?;
    let effects = RecordingEffects {
        native_confirm_answer: scenario.effects.native_confirm_answer,
        fail_dialogs: scenario.effects.fail_dialogs,
        fail_requests: scenario.effects.fail_requests,
        fail_clipboard: scenario.effects.fail_clipboard,
        ..RecordingEffects::default()
    };
    let mut console = Console::with_document(config, doc, effects);
    console.start();
    tracing::debug!(scenario = %scenario.name, steps = scenario.steps.len(), "replaying");

    for (index, step) in scenario.steps.iter().enumerate() {
        run_step(&mut console, index, step)?;
    }

    let failures = check(&console, &scenario.expect);
    let effects = console.effects();
    Ok(ReplayReport {
        name: scenario.name.clone(),
        locale: console.locale(),
        steps_run: scenario.steps.len(),
        elapsed_ms: console.now().as_millis(),
        requests: effects.requests.clone(),
        dialogs: effects.dialogs.clone(),
        alerts: effects.alerts.clone(),
        clipboard: effects.clipboard.clone(),
        native_confirms: effects.native_confirms.clone(),
        toasts: console.toasts().iter().map(|t| t.message.clone()).collect(),
        scroll_locked: console.is_scroll_locked(),
        failures,
    })
}

fn element(console: &Console<RecordingEffects>, step: usize, dom_id: &str) -> Result<ElementId> {
    console
        .element_by_id(dom_id)
        .ok_or_else(|| ConsoleError::scenario(step, format!("no element with id {dom_id:?}")))
}

fn run_step(console: &mut Console<RecordingEffects>, index: usize, step: &Step) -> Result<()> {
    tracing::trace!(index, ?step, "scenario step");
    match step {
        Step::Click { id } => {
            let target = element(console, index, id)?;
            console.click(target);
        }
        Step::KeyDown { id, key } => {
            let key = Key::from_name(key);
            match id {
                Some(id) => {
                    let target = element(console, index, id)?;
                    console.key_down(target, key);
                }
                None => {
                    console.press_key(key);
                }
            }
        }
        Step::Input { id, value } => {
            let target = element(console, index, id)?;
            console.input(target, value);
        }
        Step::Submit { id } => {
            let form = element(console, index, id)?;
            console.submit(form);
        }
        Step::Resolve { dialog, outcome } => {
            let dialog = match dialog {
                Some(dialog) => *dialog,
                None => console
                    .effects()
                    .last_dialog()
                    .map(|d| d.id)
                    .ok_or_else(|| ConsoleError::scenario(index, "no dialog to resolve"))?,
            };
            console.resolve_dialog(dialog, *outcome);
        }
        Step::Advance { ms } => {
            console.advance(*ms);
        }
        Step::Frame => {
            console.next_frame();
        }
        Step::Settle => {
            console.settle();
        }
        Step::OpenModal { id } => {
            console.open_modal(id);
        }
        Step::CloseModal { id } => {
            console.close_modal(id);
        }
        Step::Notify { message, level } => {
            console.notify(message, *level)?;
        }
        Step::SetLocale { code } => {
            console.set_locale(code);
        }
        Step::Remove { id } => {
            let target = element(console, index, id)?;
            console.remove_element(target)?;
        }
        Step::RequestFinished { id } => {
            let target = element(console, index, id)?;
            console.request_finished(target);
        }
    }
    Ok(())
}

fn check(console: &Console<RecordingEffects>, expect: &Expectations) -> Vec<String> {
    let effects = console.effects();
    let mut failures = Vec::new();

    let mut count = |what: &str, expected: Option<usize>, actual: usize| {
        if let Some(expected) = expected {
            if expected != actual {
                failures.push(format!("expected {expected} {what}, got {actual}"));
            }
        }
    };
    count("requests", expect.requests, effects.requests.len());
    count("dialogs", expect.dialogs, effects.dialogs.len());
    count("toasts", expect.toasts, console.toasts().len());

    let titles: Vec<String> = effects.dialogs.iter().map(|d| d.title.clone()).collect();
    let texts: Vec<String> = effects.dialogs.iter().map(|d| d.text.clone()).collect();
    let lists = [
        ("dialog titles", &expect.dialog_titles, &titles),
        ("dialog texts", &expect.dialog_texts, &texts),
        ("alerts", &expect.alerts, &effects.alerts),
        ("clipboard writes", &expect.clipboard, &effects.clipboard),
    ];
    for (what, expected, actual) in lists {
        if let Some(expected) = expected {
            if expected != actual {
                failures.push(format!("expected {what} {expected:?}, got {actual:?}"));
            }
        }
    }

    if let Some(expected) = expect.scroll_locked {
        if console.is_scroll_locked() != expected {
            failures.push(format!("expected scroll_locked = {expected}"));
        }
    }

    let doc = console.document();
    for attr in &expect.attributes {
        let Some(id) = doc.get_element_by_id(&attr.id) else {
            failures.push(format!("no element with id {:?}", attr.id));
            continue;
        };
        let actual = doc.get_attribute(id, &attr.name);
        if actual != attr.value.as_deref() {
            failures.push(format!(
                "#{} [{}]: expected {:?}, got {:?}",
                attr.id, attr.name, attr.value, actual
            ));
        }
    }
    for text in &expect.texts {
        let actual = doc
            .get_element_by_id(&text.id)
            .and_then(|id| doc.element(id))
            .map(|el| el.text().to_string());
        if actual.as_deref() != Some(text.text.as_str()) {
            failures.push(format!(
                "#{} text: expected {:?}, got {:?}",
                text.id, text.text, actual
            ));
        }
    }
    failures
}
