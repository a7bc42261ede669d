#![forbid(unsafe_code)]

//! Host DOM abstraction for the mmodal dialog stack.
//!
//! The modal manager never talks to a browser directly. Everything it needs
//! from the page (tree queries, attributes, classes, focus, body styles and
//! event listener bookkeeping) goes through the [`Dom`] trait, which a host
//! implements: a wasm glue layer over the real document, or the
//! deterministic in-memory DOM used by the test harness.
//!
//! Events are host-driven: the host builds a [`DomEvent`], hands it to the
//! manager's dispatcher, and applies the returned [`DispatchOutcome`]
//! (`preventDefault`) to the native event.

pub mod dom;
pub mod event;
pub mod node;

pub use dom::{Dom, ListenerOptions, StyleProperty};
pub use event::{DispatchOutcome, DomEvent, EventContext, EventKind, Key, KeyEvent, Modifiers};
pub use node::{EventTarget, NodeId};
