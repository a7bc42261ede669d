#![forbid(unsafe_code)]

//! Diagnostics for misuse of the modal stack.
//!
//! None of these cross the public surface: every operation that hits one
//! becomes a no-op, and the error is logged at `WARN` when the relevant
//! config has `debug_mode` enabled.

use std::fmt;

/// Misuse detected by the registry or a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalError {
    /// No element in the page matches the requested dialog.
    MissingContainer(String),
    /// The id is not in the registry.
    NotRegistered(String),
    /// The page has no element carrying the open-trigger attribute.
    NoTriggers { attribute: String },
    /// The dialog was constructed without a container and ignores all calls.
    Inert(String),
    /// A close of the top dialog was requested with no dialog open.
    NothingOpen,
}

impl fmt::Display for ModalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingContainer(id) => write!(
                f,
                "no container found for dialog '{id}'; expected an element like <div id=\"{id}\">"
            ),
            Self::NotRegistered(id) => write!(f, "dialog '{id}' is not registered"),
            Self::NoTriggers { attribute } => write!(
                f,
                "no trigger elements found; add a [{attribute}] attribute to at least one element"
            ),
            Self::Inert(id) => write!(f, "dialog '{id}' has no container and ignores all calls"),
            Self::NothingOpen => f.write_str("no dialog is open"),
        }
    }
}

impl std::error::Error for ModalError {}

/// Log `err` if diagnostics are enabled.
pub(crate) fn diagnose(debug_mode: bool, err: &ModalError) {
    if debug_mode {
        tracing::warn!(error = %err, "mmodal diagnostic");
    }
}
