//! # CPM Console - Interaction Layer
//!
//! Client-side interaction control for the CPM admin console (a Caddy proxy
//! manager UI).
//!
//! ## Purpose
//!
//! Mediates user intent before and after the partial-page requests issued by
//! the external request engine:
//! - Confirmation guard: `hx-confirm` clicks open an asynchronous dialog and
//!   are re-issued exactly once on consent (`guard`)
//! - Modal overlays with a single derived scroll lock (`modal`)
//! - Toast notifications on a lazily created surface (`toast`)
//! - Debounced search triggers (`debounce`)
//! - Small page hooks: native confirms, password toggles, form validation,
//!   copy buttons, tabs, loading class, flash dismissal (`hooks`)
//!
//! ## Architecture
//!
//! `runtime::Console` is the composition root. It owns the document, the
//! listener table and a virtual-time scheduler, and routes events to the
//! component state machines. Host collaborators are reached only through the
//! effect traits in `cpm_core::effects`. `driver` runs a console on tokio
//! time; `replay` and `testing` drive it deterministically. Both sit behind
//! cargo features: `replay` (default) and `testing`.
//!
//! ## Constraints
//!
//! - **MUST NOT**: read wall-clock time outside `driver`
//! - **MUST NOT**: let one handler's failure affect another

#![deny(missing_docs)]

pub mod config;
pub mod debounce;
pub mod driver;
pub mod engine;
pub mod errors;
pub mod guard;
pub mod hooks;
pub mod modal;
#[cfg(feature = "replay")]
pub mod replay;
pub mod runtime;
pub mod task;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod toast;

pub use config::ConsoleConfig;
pub use driver::{ConsoleDriver, DriverHandle, HostInput};
pub use errors::{ConsoleError, Result};
pub use guard::{GuardPhase, Interception, Resolution};
pub use runtime::{Console, Handler};
pub use toast::{ToastId, ToastLevel};
