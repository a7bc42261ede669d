#![forbid(unsafe_code)]

//! Deterministic in-memory document.
//!
//! `MemoryDom` is an arena of elements plus the page-level state the modal
//! stack touches: the focused element, inline `<body>` styles, the viewport
//! scrollbar width, and the listener table. It is host-driven: nothing
//! happens until a test calls into it or dispatches an event through the
//! modal registry.
//!
//! # Invariants
//!
//! - The arena never shrinks; removed elements keep their `NodeId` and
//!   become detached (no parent, not reachable from the root).
//! - `active` is always `None` or a connected element. Detaching the
//!   focused element (or an ancestor of it) blurs it.
//! - The listener table holds at most one registration per
//!   `(target, kind, listener)` triple.

use ahash::AHashMap;
use mmodal_dom::{Dom, EventKind, EventTarget, ListenerOptions, NodeId, StyleProperty};

use crate::builder::ElementSpec;

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    display_none: bool,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            classes: Vec::new(),
            parent: None,
            children: Vec::new(),
            display_none: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Registration<H> {
    target: EventTarget,
    kind: EventKind,
    listener: H,
    once: bool,
}

/// In-memory document implementing [`Dom`].
#[derive(Debug, Clone)]
pub struct MemoryDom<H> {
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
    active: Option<NodeId>,
    listeners: Vec<Registration<H>>,
    body_styles: AHashMap<StyleProperty, String>,
    scrollbar_width: u32,
}

impl<H> Default for MemoryDom<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> MemoryDom<H> {
    /// An empty page: `<html><body></body></html>`.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            root: NodeId::new(0),
            body: NodeId::new(0),
            active: None,
            listeners: Vec::new(),
            body_styles: AHashMap::new(),
            scrollbar_width: 0,
        };
        dom.root = dom.create_element("html");
        dom.body = dom.create_element("body");
        dom.append_child(dom.root, dom.body);
        dom
    }

    /// Set the viewport scrollbar width.
    #[must_use]
    pub fn with_scrollbar_width(mut self, width: u32) -> Self {
        self.scrollbar_width = width;
        self
    }

    /// `<body>`.
    #[inline]
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(tag));
        id
    }

    /// Move `child` (and its subtree) under `parent`, as last child.
    ///
    /// Returns `false` and leaves the tree alone when `parent` lies inside
    /// `child`'s subtree.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.is_ancestor_or_self(child, parent) {
            tracing::debug!(%parent, %child, "append would create a cycle");
            return false;
        }
        self.detach(child);
        self.nodes[child.raw() as usize].parent = Some(parent);
        self.nodes[parent.raw() as usize].children.push(child);
        true
    }

    /// Build `spec` and append it under `parent`. Returns the new element.
    pub fn append(&mut self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let node = self.build(spec);
        self.append_child(parent, node);
        node
    }

    /// Build `spec` and append it under `<body>`.
    pub fn append_to_body(&mut self, spec: ElementSpec) -> NodeId {
        self.append(self.body, spec)
    }

    fn build(&mut self, spec: ElementSpec) -> NodeId {
        let node = self.create_element(&spec.tag);
        {
            let data = &mut self.nodes[node.raw() as usize];
            data.attributes = spec.attributes;
            data.classes = spec.classes;
            data.display_none = spec.display_none;
        }
        for child in spec.children {
            let child = self.build(child);
            self.append_child(node, child);
        }
        node
    }

    /// Remove `node` from its parent. The subtree stays intact but
    /// disconnected; focus inside it is dropped.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(active) = self.active
            && self.is_ancestor_or_self(node, active)
        {
            self.active = None;
        }
        if let Some(parent) = self.nodes[node.raw() as usize].parent.take() {
            self.nodes[parent.raw() as usize]
                .children
                .retain(|&c| c != node);
        }
    }

    /// Toggle `display: none` on an element.
    pub fn set_display_none(&mut self, node: NodeId, hidden: bool) {
        self.nodes[node.raw() as usize].display_none = hidden;
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.nodes[node.raw() as usize]
            .attributes
            .retain(|(k, _)| k != name);
    }

    /// Drop focus (`document.activeElement` becomes `<body>`/`null`).
    pub fn blur(&mut self) {
        self.active = None;
    }

    /// Whether `node` is reachable from the root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_ancestor_or_self(self.root, node)
    }

    /// Number of listeners bound to `(target, kind)`.
    pub fn listener_count(&self, target: EventTarget, kind: EventKind) -> usize {
        self.listeners
            .iter()
            .filter(|r| r.target == target && r.kind == kind)
            .count()
    }

    /// Number of listeners bound anywhere.
    pub fn total_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Deterministic outline of a subtree, one element per line, children
    /// indented by two spaces. Attributes appear in insertion order and
    /// classes last, so tests can compare whole-state snapshots.
    pub fn outline(&self, root: NodeId) -> Vec<String> {
        let mut lines = Vec::new();
        self.outline_into(root, 0, &mut lines);
        lines
    }

    fn outline_into(&self, node: NodeId, depth: usize, lines: &mut Vec<String>) {
        let data = &self.nodes[node.raw() as usize];
        let mut line = format!("{}<{}", "  ".repeat(depth), data.tag);
        for (name, value) in &data.attributes {
            if value.is_empty() {
                line.push_str(&format!(" {name}"));
            } else {
                line.push_str(&format!(" {name}=\"{value}\""));
            }
        }
        if !data.classes.is_empty() {
            line.push_str(&format!(" class=\"{}\"", data.classes.join(" ")));
        }
        line.push('>');
        lines.push(line);
        for &child in &data.children {
            self.outline_into(child, depth + 1, lines);
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.nodes[n.raw() as usize].parent;
        }
        false
    }

    fn node(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.raw() as usize]
    }

    fn node_mut(&mut self, node: NodeId) -> &mut NodeData {
        &mut self.nodes[node.raw() as usize]
    }
}

impl<H: Clone + PartialEq> Dom<H> for MemoryDom<H> {
    fn document_element(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.node(node).tag.clone()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let data = self.node(node);
        if name == "class" {
            return (!data.classes.is_empty()).then(|| data.classes.join(" "));
        }
        data.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let data = self.node_mut(node);
        if name == "class" {
            data.classes = value.split_whitespace().map(str::to_owned).collect();
            return;
        }
        match data.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_owned(),
            None => data.attributes.push((name.to_owned(), value.to_owned())),
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).classes.iter().any(|c| c == class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.node_mut(node).classes.push(class.to_owned());
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        self.node_mut(node).classes.retain(|c| c != class);
    }

    fn has_layout_box(&self, node: NodeId) -> bool {
        if !self.is_connected(node) {
            return false;
        }
        let mut current = Some(node);
        while let Some(n) = current {
            if self.node(n).display_none {
                return false;
            }
            current = self.node(n).parent;
        }
        true
    }

    fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    fn focus(&mut self, node: NodeId) -> bool {
        if !self.is_connected(node) || Dom::<H>::has_attribute(self, node, "disabled") {
            tracing::trace!(%node, "focus refused");
            return false;
        }
        self.active = Some(node);
        true
    }

    fn body_style(&self, property: StyleProperty) -> String {
        self.body_styles.get(&property).cloned().unwrap_or_default()
    }

    fn set_body_style(&mut self, property: StyleProperty, value: &str) {
        if value.is_empty() {
            self.body_styles.remove(&property);
        } else {
            self.body_styles.insert(property, value.to_owned());
        }
    }

    fn scrollbar_width(&self) -> u32 {
        self.scrollbar_width
    }

    fn add_listener(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        listener: H,
        options: ListenerOptions,
    ) {
        if self.has_listener(target, kind, &listener) {
            return;
        }
        self.listeners.push(Registration {
            target,
            kind,
            listener,
            once: options.once,
        });
    }

    fn remove_listener(&mut self, target: EventTarget, kind: EventKind, listener: &H) {
        self.listeners
            .retain(|r| !(r.target == target && r.kind == kind && &r.listener == listener));
    }

    fn has_listener(&self, target: EventTarget, kind: EventKind, listener: &H) -> bool {
        self.listeners
            .iter()
            .any(|r| r.target == target && r.kind == kind && &r.listener == listener)
    }

    fn listeners(&self, target: EventTarget, kind: EventKind) -> Vec<H> {
        self.listeners
            .iter()
            .filter(|r| r.target == target && r.kind == kind)
            .map(|r| r.listener.clone())
            .collect()
    }

    fn claim_listener(&mut self, target: EventTarget, kind: EventKind, listener: &H) -> bool {
        let Some(idx) = self
            .listeners
            .iter()
            .position(|r| r.target == target && r.kind == kind && &r.listener == listener)
        else {
            return false;
        };
        if self.listeners[idx].once {
            self.listeners.remove(idx);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::el;

    type TestDom = MemoryDom<&'static str>;

    #[test]
    fn new_page_has_html_and_body() {
        let dom = TestDom::new();
        let root = dom.document_element();
        assert_eq!(dom.tag_name(root), "html");
        assert_eq!(dom.parent(dom.body()), Some(root));
        assert!(dom.is_connected(dom.body()));
    }

    #[test]
    fn append_builds_subtree_in_order() {
        let mut dom = TestDom::new();
        let list = dom.append_to_body(
            el("ul")
                .id("list")
                .child(el("li").id("a"))
                .child(el("li").id("b").child(el("span").id("c"))),
        );
        let ids: Vec<_> = dom.descendants(list)
            .into_iter()
            .map(|n| dom.attribute(n, "id").unwrap_or_default())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(dom.element_by_id("list"), Some(list));
    }

    #[test]
    fn append_child_refuses_to_nest_a_node_inside_itself() {
        let mut dom = TestDom::new();
        let outer = dom.append_to_body(el("div").child(el("section").id("inner")));
        let inner = dom.element_by_id("inner").expect("inner");

        assert!(!dom.append_child(inner, outer));
        assert!(!dom.append_child(outer, outer));
        assert_eq!(dom.parent(outer), Some(dom.body()));
        assert_eq!(dom.descendants(outer), [inner]);

        let body = dom.body();
        assert!(dom.append_child(body, inner));
        assert_eq!(dom.parent(inner), Some(body));
    }

    #[test]
    fn detaching_drops_focus_and_layout() {
        let mut dom = TestDom::new();
        let panel = dom.append_to_body(el("div").child(el("button").id("btn")));
        let btn = dom.element_by_id("btn").expect("button");
        assert!(dom.focus(btn));
        dom.detach(panel);
        assert_eq!(dom.active_element(), None);
        assert!(!dom.has_layout_box(btn));
        assert!(!dom.focus(btn));
    }

    #[test]
    fn display_none_hides_descendants() {
        let mut dom = TestDom::new();
        let panel = dom.append_to_body(el("div").child(el("button").id("btn")));
        let btn = dom.element_by_id("btn").expect("button");
        assert!(dom.has_layout_box(btn));
        dom.set_display_none(panel, true);
        assert!(!dom.has_layout_box(btn));
    }

    #[test]
    fn disabled_elements_refuse_focus() {
        let mut dom = TestDom::new();
        let btn = dom.append_to_body(el("button").flag("disabled"));
        assert!(!dom.focus(btn));
    }

    #[test]
    fn listeners_deduplicate_and_once_detaches_on_claim() {
        let mut dom = TestDom::new();
        let target = EventTarget::Node(dom.body());
        dom.add_listener(target, EventKind::Click, "a", ListenerOptions::default());
        dom.add_listener(target, EventKind::Click, "a", ListenerOptions::default());
        dom.add_listener(target, EventKind::Click, "b", ListenerOptions::ONCE);
        assert_eq!(dom.listener_count(target, EventKind::Click), 2);

        assert!(dom.claim_listener(target, EventKind::Click, &"a"));
        assert!(dom.claim_listener(target, EventKind::Click, &"b"));
        assert!(!dom.claim_listener(target, EventKind::Click, &"b"));
        assert_eq!(dom.listeners(target, EventKind::Click), vec!["a"]);

        dom.remove_listener(target, EventKind::Click, &"a");
        dom.remove_listener(target, EventKind::Click, &"missing");
        assert_eq!(dom.total_listeners(), 0);
    }

    #[test]
    fn empty_style_value_clears_property() {
        let mut dom = TestDom::new();
        dom.set_body_style(StyleProperty::Overflow, "hidden");
        assert_eq!(
            dom.body_style(StyleProperty::Overflow),
            "hidden"
        );
        dom.set_body_style(StyleProperty::Overflow, "");
        assert_eq!(dom.body_style(StyleProperty::Overflow), "");
    }

    #[test]
    fn propagation_path_ends_at_document_only_when_connected() {
        let mut dom = TestDom::new();
        let inner = dom.append_to_body(el("div"));
        let path = dom.propagation_path(inner);
        assert_eq!(path.first(), Some(&EventTarget::Node(inner)));
        assert_eq!(path.last(), Some(&EventTarget::Document));

        dom.detach(inner);
        let path = dom.propagation_path(inner);
        assert_eq!(path, vec![EventTarget::Node(inner)]);
    }

    #[test]
    fn closest_is_inclusive() {
        let mut dom = TestDom::new();
        let outer = dom.append_to_body(el("div").flag("data-close").child(el("span").id("s")));
        let span = dom.element_by_id("s").expect("span");
        assert_eq!(dom.closest(span, "data-close"), Some(outer));
        assert_eq!(dom.closest(outer, "data-close"), Some(outer));
        assert_eq!(dom.closest(span, "data-other"), None);
    }

    #[test]
    fn outline_lists_attributes_and_classes() {
        let mut dom = TestDom::new();
        let node = dom.append_to_body(
            el("div")
                .id("m")
                .attr("aria-hidden", "true")
                .class("modal")
                .child(el("button").flag("data-close")),
        );
        assert_eq!(
            dom.outline(node),
            vec![
                "<div id=\"m\" aria-hidden=\"true\" class=\"modal\">".to_owned(),
                "  <button data-close>".to_owned(),
            ]
        );
    }
}
