#![forbid(unsafe_code)]

//! Focus discovery and trapping inside dialog containers.
//!
//! # Invariants
//!
//! - [`FocusScanner::scan`] returns descendants of the container only (never
//!   the container itself) in document order.
//! - The open-time target is chosen from the unfiltered scan; the trap uses
//!   the visibility-filtered scan. The two lists can disagree when a dialog
//!   holds hidden controls, and that difference is kept on purpose.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | No focusable nodes | Empty dialog | Focus left unchanged, trap is a no-op |
//! | All nodes hidden | `display: none` controls | Trap is a no-op, open-time focus still lands |
//! | Focus target detached | Node removed mid-flight | Host refuses focus, nothing else changes |

use mmodal_dom::{EventContext, NodeId};

use crate::listener::Host;

/// One entry of the interactive-element allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusRule {
    /// Element with a tag carrying an attribute, e.g. `a[href]`.
    TagWithAttribute { tag: String, attribute: String },
    /// Form control that is not `disabled`, not `aria-hidden`, and not
    /// `type="hidden"`.
    Control(String),
    /// Any element with this tag (`iframe`, `object`, `embed`).
    Tag(String),
    /// Any element carrying this attribute (`contenteditable`).
    Attribute(String),
    /// Explicit tab stop: a `tabindex` that does not start with `-`.
    TabStop,
}

impl FocusRule {
    fn matches<D: Host + ?Sized>(&self, dom: &D, node: NodeId) -> bool {
        match self {
            Self::TagWithAttribute { tag, attribute } => {
                dom.tag_name(node) == *tag && dom.has_attribute(node, attribute)
            }
            Self::Control(tag) => {
                dom.tag_name(node) == *tag
                    && !dom.has_attribute(node, "disabled")
                    && !dom.has_attribute(node, "aria-hidden")
                    && dom.attribute(node, "type").as_deref() != Some("hidden")
            }
            Self::Tag(tag) => dom.tag_name(node) == *tag,
            Self::Attribute(attribute) => dom.has_attribute(node, attribute),
            Self::TabStop => dom
                .attribute(node, "tabindex")
                .is_some_and(|v| !v.starts_with('-')),
        }
    }
}

/// Which side of the dialog focus was on when Tab was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapMode {
    /// Focus is inside the dialog: wrap at the ends.
    Inside,
    /// Focus escaped every dialog: pull it back to the first node.
    Outside,
}

/// Finds interactive elements inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusScanner {
    rules: Vec<FocusRule>,
}

impl Default for FocusScanner {
    fn default() -> Self {
        let link = |tag: &str| FocusRule::TagWithAttribute {
            tag: tag.to_owned(),
            attribute: "href".to_owned(),
        };
        Self {
            rules: vec![
                link("a"),
                link("area"),
                FocusRule::Control("input".to_owned()),
                FocusRule::Control("select".to_owned()),
                FocusRule::Control("textarea".to_owned()),
                FocusRule::Control("button".to_owned()),
                FocusRule::Tag("iframe".to_owned()),
                FocusRule::Tag("object".to_owned()),
                FocusRule::Tag("embed".to_owned()),
                FocusRule::Attribute("contenteditable".to_owned()),
                FocusRule::TabStop,
            ],
        }
    }
}

impl FocusScanner {
    /// Scanner with the standard allow-list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scanner with no rules at all.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule to the allow-list.
    #[must_use]
    pub fn with_rule(mut self, rule: FocusRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn push_rule(&mut self, rule: FocusRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[FocusRule] {
        &self.rules
    }

    /// Interactive descendants of `container`, in document order.
    pub fn scan<D: Host + ?Sized>(&self, dom: &D, container: NodeId) -> Vec<NodeId> {
        dom.descendants(container)
            .into_iter()
            .filter(|&node| self.rules.iter().any(|rule| rule.matches(dom, node)))
            .collect()
    }

    /// Keep only nodes that currently have a layout box.
    pub fn visible<D: Host + ?Sized>(dom: &D, nodes: Vec<NodeId>) -> Vec<NodeId> {
        nodes
            .into_iter()
            .filter(|&node| dom.has_layout_box(node))
            .collect()
    }

    /// Where focus goes when the dialog opens: the first scanned node that is
    /// not a close control, else the first scanned node. Hidden nodes are not
    /// filtered out here.
    pub fn initial_target<D: Host + ?Sized>(
        &self,
        dom: &D,
        container: NodeId,
        close_trigger: &str,
    ) -> Option<NodeId> {
        let nodes = self.scan(dom, container);
        nodes
            .iter()
            .copied()
            .find(|&node| !dom.has_attribute(node, close_trigger))
            .or_else(|| nodes.first().copied())
    }

    /// Keep Tab navigation inside `container`.
    pub fn retain_focus<D: Host + ?Sized>(
        &self,
        dom: &mut D,
        container: NodeId,
        cx: &mut EventContext<'_>,
        mode: TrapMode,
    ) {
        let nodes = Self::visible(&*dom, self.scan(&*dom, container));
        let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
            return;
        };

        match mode {
            TrapMode::Outside => {
                dom.focus(first);
                cx.prevent_default();
            }
            TrapMode::Inside => {
                let active = dom.active_element();
                let backward = cx.event().shift();
                if backward && active == Some(first) {
                    dom.focus(last);
                    cx.prevent_default();
                } else if !backward && active == Some(last) {
                    dom.focus(first);
                    cx.prevent_default();
                }
            }
        }
    }
}
