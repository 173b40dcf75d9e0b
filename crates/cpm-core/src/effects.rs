//! Effect interfaces for external collaborators
//!
//! # Effect Classification
//!
//! - **Category**: Host Effect
//! - **Implementation**: supplied by the page host (browser bindings) or by
//!   test/replay handlers in `cpm-console`
//! - **Usage**: the console runtime calls these; it never talks to the
//!   dialog library, the request engine or the clipboard directly
//!
//! All traits are synchronous: the console runs on a single cooperative event
//! loop, and anything that completes later (the user answering a dialog) is fed
//! back in as a new input rather than awaited.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::ElementId;
use crate::event::EventKind;

/// Error type for effect operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum EffectError {
    /// The dialog renderer could not open a prompt.
    #[error("dialog could not be shown: {reason}")]
    DialogUnavailable {
        /// Renderer-supplied detail
        reason: String,
    },

    /// The request engine refused or failed to send a request.
    #[error("request engine failed: {reason}")]
    Transport {
        /// Engine-supplied detail
        reason: String,
    },

    /// The clipboard write was denied (permissions, insecure context).
    #[error("clipboard write rejected: {reason}")]
    ClipboardDenied {
        /// Host-supplied detail
        reason: String,
    },
}

/// Identifies one presented confirmation dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogId(u64);

impl DialogId {
    /// Wrap a raw id.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric id.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog-{}", self.0)
    }
}

/// Icon shown in the dialog header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogIcon {
    /// Destructive or irreversible action
    Warning,
    /// Neutral question
    Question,
    /// Informational notice
    Info,
}

/// Everything the dialog renderer needs to show a confirmation prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRequest {
    /// Id the host echoes back when the user answers
    pub id: DialogId,
    /// Localized dialog title
    pub title: String,
    /// Guard message, shown verbatim
    pub text: String,
    /// Header icon
    pub icon: DialogIcon,
    /// Localized label of the proceed button
    pub confirm_label: String,
    /// Localized label of the cancel button
    pub cancel_label: String,
    /// CSS color of the proceed button
    pub confirm_color: String,
    /// CSS color of the cancel button
    pub cancel_color: String,
    /// Show cancel before proceed
    pub reverse_buttons: bool,
}

impl ConfirmRequest {
    /// Button labels in on-screen order, left to right.
    pub fn button_order(&self) -> [&str; 2] {
        if self.reverse_buttons {
            [self.cancel_label.as_str(), self.confirm_label.as_str()]
        } else {
            [self.confirm_label.as_str(), self.cancel_label.as_str()]
        }
    }
}

/// How the user closed a confirmation dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogOutcome {
    /// The proceed button
    Confirmed,
    /// The cancel button
    Cancelled,
    /// Backdrop click, Escape, close button
    Dismissed,
}

impl DialogOutcome {
    /// Whether the user consented.
    pub fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// HTTP verb declared by an `hx-*` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpVerb {
    /// Every verb, in the order bindings are looked up.
    pub const ALL: [HttpVerb; 5] = [
        HttpVerb::Get,
        HttpVerb::Post,
        HttpVerb::Put,
        HttpVerb::Patch,
        HttpVerb::Delete,
    ];

    /// The attribute the request engine reads this verb from.
    pub fn attribute(self) -> &'static str {
        match self {
            Self::Get => "hx-get",
            Self::Post => "hx-post",
            Self::Put => "hx-put",
            Self::Patch => "hx-patch",
            Self::Delete => "hx-delete",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A partial-page request handed to the external request engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRequest {
    /// Element carrying the `hx-*` attribute
    pub element: ElementId,
    /// Verb of the matched attribute
    pub verb: HttpVerb,
    /// Attribute value, used as the request path
    pub path: String,
    /// Event that fired the binding
    pub trigger: EventKind,
    /// Whether the triggering event was programmatic
    pub synthetic: bool,
}

/// Asynchronous confirmation dialog renderer.
///
/// `present_confirm` only opens the dialog; the host reports the user's choice
/// later through `Console::resolve_dialog` with the same `DialogId`.
pub trait DialogEffects {
    /// Open a confirmation dialog for `request`.
    fn present_confirm(&mut self, request: ConfirmRequest) -> Result<(), EffectError>;
}

/// The declarative request engine that turns triggered events into HTTP partial updates.
pub trait RequestEngine {
    /// Send the request. Returning `Ok` means the engine accepted it, not
    /// that the response has arrived.
    fn issue(&mut self, request: EngineRequest) -> Result<(), EffectError>;
}

/// System clipboard.
pub trait ClipboardEffects {
    /// Replace the clipboard contents with `text`.
    fn write_text(&mut self, text: &str) -> Result<(), EffectError>;
}

/// The browser's blocking `confirm()` / `alert()`.
pub trait NativePromptEffects {
    /// Ask a yes/no question and block until answered.
    fn confirm(&mut self, message: &str) -> bool;
    /// Show a message and block until dismissed.
    fn alert(&mut self, message: &str);
}

/// Everything the console runtime needs from its host.
pub trait InteractionEffects:
    DialogEffects + RequestEngine + ClipboardEffects + NativePromptEffects
{
}

impl<T> InteractionEffects for T where
    T: DialogEffects + RequestEngine + ClipboardEffects + NativePromptEffects
{
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(reverse: bool) -> ConfirmRequest {
        ConfirmRequest {
            id: DialogId::from_raw(1),
            title: "Confirm".into(),
            text: "Delete this item?".into(),
            icon: DialogIcon::Warning,
            confirm_label: "Yes, proceed".into(),
            cancel_label: "Cancel".into(),
            confirm_color: "#dc3545".into(),
            cancel_color: "#6c757d".into(),
            reverse_buttons: reverse,
        }
    }

    #[test]
    fn reversed_buttons_put_cancel_first() {
        assert_eq!(request(true).button_order(), ["Cancel", "Yes, proceed"]);
        assert_eq!(request(false).button_order(), ["Yes, proceed", "Cancel"]);
    }

    #[test]
    fn verbs_map_to_hx_attributes() {
        let attrs: Vec<_> = HttpVerb::ALL.iter().map(|v| v.attribute()).collect();
        assert_eq!(attrs, vec!["hx-get", "hx-post", "hx-put", "hx-patch", "hx-delete"]);
        assert_eq!(HttpVerb::Delete.to_string(), "DELETE");
    }

    #[test]
    fn only_confirmed_counts_as_consent() {
        assert!(DialogOutcome::Confirmed.is_confirmed());
        assert!(!DialogOutcome::Cancelled.is_confirmed());
        assert!(!DialogOutcome::Dismissed.is_confirmed());
    }
}
