//! Async host driver
//!
//! Hosts a [`Console`] on a tokio runtime: host inputs arrive over an
//! unbounded channel and the console's virtual clock follows tokio time, so
//! timers fire when their deadline passes without the host polling.
//!
//! ```rust,ignore
//! let (driver, handle) = ConsoleDriver::new(console);
//! let task = tokio::spawn(driver.run());
//! handle.send(HostInput::Click { target: delete_button });
//! handle.shutdown();
//! let console = task.await?;
//! ```

use std::time::Duration;

use cpm_core::{
    DialogId, DialogOutcome, ElementId, ElementSpec, InteractionEffects, Key, Timestamp,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::runtime::Console;
use crate::toast::ToastLevel;

/// Something the page host reports to the console.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum HostInput {
    /// A trusted click
    Click {
        /// Clicked element
        target: ElementId,
    },
    /// A trusted key press
    KeyDown {
        /// Focused element, `None` when nothing is focused
        target: Option<ElementId>,
        /// DOM `KeyboardEvent.key` value
        key: String,
    },
    /// The user edited a field
    Input {
        /// Edited field
        target: ElementId,
        /// Field value after the edit
        value: String,
    },
    /// A form was submitted
    Submit {
        /// Submitted form
        form: ElementId,
    },
    /// The user answered a confirmation dialog
    ResolveDialog {
        /// Dialog being answered
        dialog: DialogId,
        /// Button that was pressed
        outcome: DialogOutcome,
    },
    /// Show a modal by DOM id
    OpenModal {
        /// DOM id of the overlay
        id: String,
    },
    /// Hide a modal by DOM id
    CloseModal {
        /// DOM id of the overlay
        id: String,
    },
    /// Show a toast
    Notify {
        /// Toast text
        message: String,
        /// Styling level
        level: ToastLevel,
    },
    /// Switch the dialog language
    SetLocale {
        /// Language code, unknown codes fall back to English
        code: String,
    },
    /// `htmx:beforeRequest` on `element`
    RequestStarted {
        /// Element that issued the request
        element: ElementId,
    },
    /// `htmx:afterRequest` on `element`
    RequestFinished {
        /// Element that issued the request
        element: ElementId,
    },
    /// Server-rendered content swapped in under `parent`
    Insert {
        /// Element receiving the content
        parent: ElementId,
        /// Content to append
        spec: ElementSpec,
    },
    /// Content swapped out of the page
    Remove {
        /// Root of the removed subtree
        element: ElementId,
    },
    /// Stop the driver and hand the console back
    Shutdown,
}

/// Sending half handed to the host.
#[derive(Clone, Debug)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<HostInput>,
}

impl DriverHandle {
    /// Queue an input. Returns `false` once the driver has stopped.
    pub fn send(&self, input: HostInput) -> bool {
        self.tx.send(input).is_ok()
    }

    /// Ask the driver to stop after the inputs already queued.
    pub fn shutdown(&self) -> bool {
        self.send(HostInput::Shutdown)
    }
}

/// Event loop binding a console to tokio time and a host input channel.
pub struct ConsoleDriver<E: InteractionEffects> {
    console: Console<E>,
    inputs: mpsc::UnboundedReceiver<HostInput>,
    epoch: Instant,
}

impl<E: InteractionEffects> ConsoleDriver<E> {
    /// Wrap `console`. Its virtual time zero is the moment of this call.
    pub fn new(console: Console<E>) -> (Self, DriverHandle) {
        let (tx, inputs) = mpsc::unbounded_channel();
        let driver = Self {
            console,
            inputs,
            epoch: Instant::now(),
        };
        (driver, DriverHandle { tx })
    }

    /// Run until `Shutdown` arrives or every handle is dropped, then hand the
    /// console back.
    pub async fn run(mut self) -> Console<E> {
        self.console.start();
        tracing::info!("console driver running");

        loop {
            self.sync_clock();
            let deadline = self
                .console
                .next_deadline()
                .map(|at| self.epoch + Duration::from_millis(at.as_millis()));
            let timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                input = self.inputs.recv() => match input {
                    Some(HostInput::Shutdown) | None => break,
                    Some(input) => {
                        self.sync_clock();
                        self.apply(input);
                    }
                },
                () = timer => {}
            }
        }

        self.sync_clock();
        tracing::info!("console driver stopped");
        self.console
    }

    fn sync_clock(&mut self) {
        let elapsed = Instant::now().saturating_duration_since(self.epoch);
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.console.advance_to(Timestamp::from_millis(millis));
    }

    fn apply(&mut self, input: HostInput) {
        tracing::trace!(?input, "host input");
        match input {
            HostInput::Click { target } => {
                self.console.click(target);
            }
            HostInput::KeyDown { target, key } => {
                let key = Key::from_name(&key);
                match target {
                    Some(target) => self.console.key_down(target, key),
                    None => self.console.press_key(key),
                };
            }
            HostInput::Input { target, value } => {
                self.console.input(target, &value);
            }
            HostInput::Submit { form } => {
                self.console.submit(form);
            }
            HostInput::ResolveDialog { dialog, outcome } => {
                self.console.resolve_dialog(dialog, outcome);
            }
            HostInput::OpenModal { id } => {
                self.console.open_modal(&id);
            }
            HostInput::CloseModal { id } => {
                self.console.close_modal(&id);
            }
            HostInput::Notify { message, level } => {
                if let Err(err) = self.console.notify(&message, level) {
                    tracing::warn!(error = %err, "toast could not be shown");
                }
            }
            HostInput::SetLocale { code } => {
                self.console.set_locale(&code);
            }
            HostInput::RequestStarted { element } => {
                self.console.request_started(element);
            }
            HostInput::RequestFinished { element } => {
                self.console.request_finished(element);
            }
            HostInput::Insert { parent, spec } => {
                if let Err(err) = self.console.insert(parent, &spec) {
                    tracing::warn!(%parent, error = %err, "content could not be inserted");
                }
            }
            HostInput::Remove { element } => {
                if let Err(err) = self.console.remove_element(element) {
                    tracing::warn!(%element, error = %err, "content could not be removed");
                }
            }
            HostInput::Shutdown => {}
        }
    }
}
