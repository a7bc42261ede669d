#![forbid(unsafe_code)]

//! Event model shared by hosts and the modal dispatcher.
//!
//! # Invariants
//!
//! - A [`DomEvent`] always has an element target. Hosts deliver key events
//!   to the focused element, or to `<body>` when nothing is focused.
//! - [`EventContext`] flags only ever go from `false` to `true` during one
//!   dispatch; nothing un-prevents an event.

use bitflags::bitflags;

use crate::node::NodeId;

/// Kinds of events the modal stack listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Primary-button activation (`click`).
    Click,
    /// Key press (`keydown`).
    Keydown,
    /// CSS animation completion (`animationend`).
    AnimationEnd,
}

impl EventKind {
    /// The DOM event type name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Keydown => "keydown",
            Self::AnimationEnd => "animationend",
        }
    }
}

bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// Logical key of a key press.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Tab,
    Enter,
    Char(char),
    /// Any other named key, kept verbatim.
    Named(String),
}

impl Key {
    /// Parse a `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Self::Escape,
            "Tab" => Self::Tab,
            "Enter" => Self::Enter,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Self::Char(ch),
                    _ => Self::Named(other.to_owned()),
                }
            }
        }
    }

    /// Parse a legacy `KeyboardEvent.keyCode` value.
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            27 => Some(Self::Escape),
            9 => Some(Self::Tab),
            13 => Some(Self::Enter),
            _ => None,
        }
    }
}

/// A key press with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key press without modifiers.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
        }
    }

    /// Add modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    /// Whether Shift was held.
    #[inline]
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// An event as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: NodeId,
    /// Present for [`EventKind::Keydown`] only.
    pub key: Option<KeyEvent>,
}

impl DomEvent {
    /// A click on `target`.
    pub fn click(target: NodeId) -> Self {
        Self {
            kind: EventKind::Click,
            target,
            key: None,
        }
    }

    /// A key press delivered to `target`.
    pub fn keydown(target: NodeId, key: KeyEvent) -> Self {
        Self {
            kind: EventKind::Keydown,
            target,
            key: Some(key),
        }
    }

    /// An animation completing on `target`.
    pub fn animation_end(target: NodeId) -> Self {
        Self {
            kind: EventKind::AnimationEnd,
            target,
            key: None,
        }
    }

    /// The pressed key, if this is a key event.
    #[inline]
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref().map(|k| &k.key)
    }

    /// Whether Shift was held (false for non-key events).
    #[inline]
    pub fn shift(&self) -> bool {
        self.key.as_ref().is_some_and(KeyEvent::shift)
    }

    /// Whether this is an Escape press.
    pub fn is_escape(&self) -> bool {
        matches!(self.key(), Some(Key::Escape))
    }

    /// Whether this is a Tab press (with or without Shift).
    pub fn is_tab(&self) -> bool {
        matches!(self.key(), Some(Key::Tab))
    }
}

/// Mutable view of an event while listeners run.
#[derive(Debug)]
pub struct EventContext<'e> {
    event: &'e DomEvent,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl<'e> EventContext<'e> {
    /// Start dispatching `event`.
    pub fn new(event: &'e DomEvent) -> Self {
        Self {
            event,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// The event being dispatched.
    #[inline]
    pub fn event(&self) -> &'e DomEvent {
        self.event
    }

    /// `preventDefault()`.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// `stopPropagation()`: remaining listeners on the current target still
    /// run, later targets on the path do not.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    #[inline]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    #[inline]
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Finish the dispatch.
    pub fn outcome(&self) -> DispatchOutcome {
        DispatchOutcome {
            default_prevented: self.default_prevented,
            propagation_stopped: self.propagation_stopped,
            handled: 0,
        }
    }
}

/// What the host should do with the native event after dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Call `preventDefault()` on the native event.
    pub default_prevented: bool,
    /// Call `stopPropagation()` on the native event.
    pub propagation_stopped: bool,
    /// Number of listeners that ran.
    pub handled: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_keys() {
        assert_eq!(Key::from_dom_key("Escape"), Key::Escape);
        assert_eq!(Key::from_dom_key("Esc"), Key::Escape);
        assert_eq!(Key::from_dom_key("Tab"), Key::Tab);
        assert_eq!(Key::from_dom_key("a"), Key::Char('a'));
        assert_eq!(
            Key::from_dom_key("ArrowLeft"),
            Key::Named("ArrowLeft".to_owned())
        );
    }

    #[test]
    fn parses_legacy_key_codes() {
        assert_eq!(Key::from_key_code(27), Some(Key::Escape));
        assert_eq!(Key::from_key_code(9), Some(Key::Tab));
        assert_eq!(Key::from_key_code(65), None);
    }

    #[test]
    fn shift_tab_is_tab_with_shift() {
        let event = DomEvent::keydown(
            NodeId::new(3),
            KeyEvent::new(Key::Tab).with_modifiers(Modifiers::SHIFT),
        );
        assert!(event.is_tab());
        assert!(event.shift());
        assert!(!event.is_escape());
    }

    #[test]
    fn click_has_no_key() {
        let event = DomEvent::click(NodeId::new(1));
        assert!(event.key().is_none());
        assert!(!event.shift());
    }

    #[test]
    fn context_flags_are_sticky() {
        let event = DomEvent::click(NodeId::new(1));
        let mut cx = EventContext::new(&event);
        assert_eq!(cx.outcome(), DispatchOutcome::default());
        cx.prevent_default();
        cx.stop_propagation();
        let outcome = cx.outcome();
        assert!(outcome.default_prevented);
        assert!(outcome.propagation_stopped);
    }
}
