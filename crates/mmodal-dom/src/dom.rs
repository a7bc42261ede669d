#![forbid(unsafe_code)]

//! The host document interface.
//!
//! # Listener model
//!
//! Listeners are plain values of the host-chosen type `H` (the modal crate
//! uses an enum naming the routine to run). A listener is identified by the
//! triple `(target, kind, value)`:
//!
//! - adding an identical triple twice keeps a single registration,
//! - removing a triple that is not registered is a no-op,
//! - a listener added with [`ListenerOptions::once`] is detached by
//!   [`Dom::claim_listener`] the first time it is claimed for dispatch.
//!
//! This mirrors `addEventListener`/`removeEventListener` with stable
//! function identity.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Stale handle | Element removed from the page | Queries answer as detached, `focus` returns `false` |
//! | Unknown attribute | Never set | `attribute` returns `None` |

use crate::event::EventKind;
use crate::node::{EventTarget, NodeId};

/// Options for a listener registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Detach after the first time the listener runs.
    pub once: bool,
}

impl ListenerOptions {
    /// Run-once registration (`{ once: true }`).
    pub const ONCE: Self = Self { once: true };
}

/// Inline styles on `<body>` touched by the scroll lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Overflow,
    TouchAction,
    PaddingRight,
}

impl StyleProperty {
    /// CSS property name.
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Overflow => "overflow",
            Self::TouchAction => "touch-action",
            Self::PaddingRight => "padding-right",
        }
    }
}

/// Everything the modal stack needs from the page.
///
/// Required methods are the primitive operations a host must provide; the
/// provided methods derive tree queries from them and may be overridden
/// with native equivalents (`closest`, `querySelectorAll`, ...).
pub trait Dom<H> {
    // --- Tree ---

    /// The root element (`<html>`).
    fn document_element(&self) -> NodeId;

    /// Parent element, `None` for the root and for detached subtrees.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Child elements in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lower-case tag name.
    fn tag_name(&self, node: NodeId) -> String;

    // --- Attributes and classes ---

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn add_class(&mut self, node: NodeId, class: &str);

    fn remove_class(&mut self, node: NodeId, class: &str);

    // --- Layout, focus, styles ---

    /// Whether the element currently has a layout box (`offsetParent !==
    /// null`): connected and not hidden by `display: none` on itself or an
    /// ancestor.
    fn has_layout_box(&self, node: NodeId) -> bool;

    /// `document.activeElement`, `None` when nothing is focused.
    fn active_element(&self) -> Option<NodeId>;

    /// Move focus to `node`. Returns `false` when the element can no longer
    /// take focus (detached, disabled).
    fn focus(&mut self, node: NodeId) -> bool;

    fn body_style(&self, property: StyleProperty) -> String;

    fn set_body_style(&mut self, property: StyleProperty, value: &str);

    /// Width of the viewport scrollbar in CSS pixels
    /// (`window.innerWidth - document.documentElement.clientWidth`).
    fn scrollbar_width(&self) -> u32;

    // --- Listeners ---

    fn add_listener(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        listener: H,
        options: ListenerOptions,
    );

    fn remove_listener(&mut self, target: EventTarget, kind: EventKind, listener: &H);

    fn has_listener(&self, target: EventTarget, kind: EventKind, listener: &H) -> bool;

    /// Snapshot of the listeners bound to `(target, kind)`, in registration
    /// order.
    fn listeners(&self, target: EventTarget, kind: EventKind) -> Vec<H>;

    /// Called by the dispatcher right before running a snapshotted
    /// listener. Returns `false` when the listener was removed since the
    /// snapshot; detaches it when it was registered as run-once.
    fn claim_listener(&mut self, target: EventTarget, kind: EventKind, listener: &H) -> bool;

    // --- Provided queries ---

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Inclusive containment (`Node.contains`).
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Nearest inclusive ancestor carrying `attribute` (`Element.closest`).
    fn closest(&self, node: NodeId, attribute: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.has_attribute(n, attribute) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// All descendants of `root` in document order, excluding `root`.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.children(root).into_iter().rev().collect();
        while let Some(node) = pending.pop() {
            out.push(node);
            pending.extend(self.children(node).into_iter().rev());
        }
        out
    }

    /// Every element in the document carrying `attribute`, in document order.
    fn elements_with_attribute(&self, attribute: &str) -> Vec<NodeId> {
        let root = self.document_element();
        std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|&node| self.has_attribute(node, attribute))
            .collect()
    }

    /// `document.getElementById`.
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let root = self.document_element();
        std::iter::once(root)
            .chain(self.descendants(root))
            .find(|&node| self.attribute(node, "id").as_deref() == Some(id))
    }

    /// Bubbling path of an event: the target, its ancestors, then the
    /// document when the target is connected.
    fn propagation_path(&self, target: NodeId) -> Vec<EventTarget> {
        let mut path = Vec::new();
        let mut top = target;
        let mut current = Some(target);
        while let Some(node) = current {
            path.push(EventTarget::Node(node));
            top = node;
            current = self.parent(node);
        }
        // Detached subtrees never reach the document.
        if top == self.document_element() {
            path.push(EventTarget::Document);
        }
        path
    }
}
