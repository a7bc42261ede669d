#![forbid(unsafe_code)]

//! Open-dialog stack and the shared document key listener.
//!
//! The `ModalStack` records which dialogs are open, in the order they were
//! opened. Only the topmost dialog receives document-level key presses,
//! through a single listener that exists exactly while the stack is
//! non-empty.
//!
//! # Invariants
//!
//! - No duplicates: pushing an id already on the stack is a no-op.
//! - Insertion order is open order; the last entry is the top.
//! - The document carries one [`Listener::GlobalKeydown`] iff the stack is
//!   non-empty. Both transitions happen inside `push`/`remove`, so callers
//!   cannot break this.
//!
//! # Failure Modes
//!
//! - `remove()` of an id not on the stack returns `false` (no panic).
//! - `top()` on an empty stack returns `None`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use mmodal_dom::{EventKind, EventTarget, ListenerOptions};

use crate::listener::{Host, Listener};

/// Global counter for generated dialog ids.
static DIALOG_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier of a registered dialog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(String);

impl DialogId {
    /// Wrap an explicit identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Next generated identifier: `dialog-1`, `dialog-2`, ... Unique for the
    /// lifetime of the process, across registries.
    pub fn generate() -> Self {
        let n = DIALOG_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("dialog-{n}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DialogId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DialogId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for DialogId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DialogId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Stack of open dialog ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalStack {
    /// Open dialogs, bottom to top.
    entries: Vec<DialogId>,
}

impl ModalStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Stack Operations ---

    /// Push `id` on top. Attaches the document key listener when this is the
    /// first open dialog. Returns `false` if `id` was already open.
    pub fn push<D: Host + ?Sized>(&mut self, dom: &mut D, id: DialogId) -> bool {
        if self.contains(&id) {
            return false;
        }
        if self.entries.is_empty() {
            dom.add_listener(
                EventTarget::Document,
                EventKind::Keydown,
                Listener::GlobalKeydown,
                ListenerOptions::default(),
            );
        }
        self.entries.push(id);
        true
    }

    /// Remove `id` from any position. Detaches the document key listener
    /// when the stack becomes empty. Returns `false` if `id` was not open.
    pub fn remove<D: Host + ?Sized>(&mut self, dom: &mut D, id: &DialogId) -> bool {
        let Some(idx) = self.entries.iter().position(|e| e == id) else {
            return false;
        };
        self.entries.remove(idx);
        if self.entries.is_empty() {
            dom.remove_listener(
                EventTarget::Document,
                EventKind::Keydown,
                &Listener::GlobalKeydown,
            );
        }
        true
    }

    // --- State Queries ---

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of open dialogs.
    #[inline]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: &DialogId) -> bool {
        self.entries.iter().any(|e| e == id)
    }

    /// The most recently opened dialog.
    pub fn top(&self) -> Option<&DialogId> {
        self.entries.last()
    }

    /// Open dialogs, bottom to top.
    pub fn ids(&self) -> &[DialogId] {
        &self.entries
    }
}
