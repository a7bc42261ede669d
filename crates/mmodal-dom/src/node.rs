#![forbid(unsafe_code)]

//! Node handles and event targets.

use std::fmt;

/// Opaque handle to an element owned by the host document.
///
/// A `NodeId` never keeps the element alive. Hosts must tolerate handles
/// to elements that have since been detached: queries answer as for a
/// disconnected element and focus requests are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Wrap a raw host index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw host index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something a listener can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    /// The document itself (last stop of every bubbling event).
    Document,
    /// An element.
    Node(NodeId),
}

impl From<NodeId> for EventTarget {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl EventTarget {
    /// The element behind this target, if any.
    #[inline]
    pub const fn node(self) -> Option<NodeId> {
        match self {
            Self::Document => None,
            Self::Node(node) => Some(node),
        }
    }
}
