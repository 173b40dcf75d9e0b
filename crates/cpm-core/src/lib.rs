//! # CPM Core - Interaction Primitives
//!
//! Pure foundation types for the CPM admin console interaction layer.
//!
//! ## Purpose
//!
//! This crate provides the headless building blocks that the console runtime
//! (`cpm-console`) drives:
//! - An in-memory document model with attributes, classes, inline styles and
//!   connected/detached tracking (`dom`)
//! - UI events with capture/target/bubble phases and a listener registry
//!   (`event`)
//! - A virtual-time scheduler for timers and animation frames (`time`)
//! - The supported UI locales and their confirmation strings (`locale`)
//! - Effect traits for the external collaborators: dialog renderer, request
//!   engine, clipboard and native prompts (`effects`)
//!
//! ## Constraints
//!
//! This crate:
//! - **MUST NOT**: perform I/O or read wall-clock time
//! - **MUST NOT**: depend on `cpm-console`
//!
//! Everything here is deterministic so the console state machines can be tested
//! without a browser.

#![deny(missing_docs)]

pub mod dom;
pub mod effects;
pub mod errors;
pub mod event;
pub mod locale;
pub mod time;

pub use dom::{Document, Element, ElementId, ElementSpec};
pub use effects::{
    ConfirmRequest, DialogId, DialogOutcome, EffectError, EngineRequest, HttpVerb,
    InteractionEffects,
};
pub use errors::CoreError;
pub use event::{
    propagation_plan, CurrentTarget, EventKind, Key, ListenerId, ListenerRegistry, Phase, UiEvent,
};
pub use locale::{ConfirmStrings, Locale};
pub use time::{FrameId, Scheduler, TimerId, Timestamp};
