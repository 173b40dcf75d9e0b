//! Deferred work queued on the console scheduler.

use cpm_core::ElementId;

use crate::toast::ToastId;

/// A timer or animation-frame callback. Each variant is routed back to the
/// component that scheduled it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    /// End a suppression window and put the guard attribute back
    RestoreGuard {
        /// Element whose guard was suppressed
        element: ElementId,
    },
    /// Quiet period elapsed for a debounced source
    DebounceFire {
        /// The debounced input
        source: ElementId,
    },
    /// Start the toast's entry transition
    ToastEnter(ToastId),
    /// Display time is over, start fading
    ToastExpire(ToastId),
    /// Fade is over, take the toast off the page
    ToastRemove(ToastId),
    /// Put back the label replaced by the "copied" feedback
    RevertCopyFeedback {
        /// The copy button
        element: ElementId,
    },
    /// Start fading the flash messages under `container`
    FadeFlash {
        /// The flash message container
        container: ElementId,
    },
    /// Drop faded flash messages
    RemoveFlash {
        /// Alerts captured when the fade started
        alerts: Vec<ElementId>,
    },
}
