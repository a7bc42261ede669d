#![forbid(unsafe_code)]

//! Accessible, stackable modal dialogs over a host document.
//!
//! Any container element becomes a dialog: triggers open it, close controls
//! and Escape dismiss it, Tab stays inside it, and focus goes back where it
//! came from. Dialogs stack; only the topmost one answers document-level
//! key presses, through a single listener shared by all of them.
//!
//! # Focus Management
//!
//! - **Auto-focus**: the first interactive element that is not a close
//!   control receives focus when a dialog opens
//! - **Focus trap**: Tab/Shift+Tab wrap at the ends of the dialog
//! - **Focus restore**: the element focused before opening is refocused on
//!   close, if it still can be
//! - **Alert dialogs**: a `role="alertdialog"` inside the container disables
//!   Escape
//!
//! # Example
//!
//! ```ignore
//! use mmodal::{ConfigPatch, ModalRegistry};
//!
//! let mut modals = ModalRegistry::new(dom);
//! modals.init(Some(&ConfigPatch::new().disable_scroll(true)));
//!
//! // Host glue forwards native events.
//! let outcome = modals.dispatch(&event);
//! if outcome.default_prevented {
//!     native.prevent_default();
//! }
//!
//! modals.show("settings", None);
//! modals.close_all();
//! ```

pub mod config;
pub mod dialog;
pub mod error;
pub mod focus;
pub mod listener;
pub mod registry;
pub mod scroll;
pub mod stack;

pub use config::{
    ConfigPatch, DEFAULT_CLOSE_TRIGGER, DEFAULT_IDENTIFIER, DEFAULT_OPEN_CLASS,
    DEFAULT_OPEN_TRIGGER, DialogCallback, ModalConfig, ModalOptions,
};
pub use dialog::{ALERT_DIALOG_ROLE, Dialog, DialogState};
pub use error::ModalError;
pub use focus::{FocusRule, FocusScanner, TrapMode};
pub use listener::{Host, Listener};
pub use registry::{DialogTarget, ModalRegistry};
pub use scroll::{SCROLLBAR_COMPENSATION_PX, ScrollLock};
pub use stack::{DialogId, ModalStack};

pub use mmodal_dom as dom;
