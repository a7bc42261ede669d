#![forbid(unsafe_code)]

//! Dialog registry and event dispatcher.
//!
//! [`ModalRegistry`] owns the host document, every registered [`Dialog`],
//! the open-dialog stack and the scroll lock. Hosts feed it native events
//! through [`ModalRegistry::dispatch`]; pages and tests drive it directly
//! through `show`/`close`/`close_all`.
//!
//! # Dispatch
//!
//! An event travels the target, its ancestors, then the document. At each
//! stop the bound listeners are snapshotted and run in registration order;
//! a listener removed by an earlier one is skipped, run-once listeners are
//! detached as they fire, and `stop_propagation` ends the walk after the
//! current stop. The document key listener skips a press that the dialog
//! on top at dispatch start already handled through its own listener.
//!
//! # Invariants
//!
//! - A dialog is open iff its id is on the stack.
//! - The document key listener exists iff the stack is non-empty.
//! - Every id on the stack is registered.
//! - Dialogs leave the registry only through `unregister`/`teardown`, after
//!   their listeners are unbound.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown id | Typo, removed container | No-op, `WARN` in debug mode |
//! | Close with nothing open | Stray close control | No-op, `WARN` in debug mode |
//! | No triggers on `init` | Page without trigger attributes | Nothing registered, `WARN` in debug mode |

use std::fmt;

use ahash::AHashMap;
use mmodal_dom::{DispatchOutcome, DomEvent, EventContext, NodeId};

use crate::config::{ConfigPatch, DEFAULT_IDENTIFIER, ModalConfig};
use crate::dialog::{Dialog, DialogCx};
use crate::error::{ModalError, diagnose};
use crate::focus::FocusScanner;
use crate::listener::{Host, Listener};
use crate::scroll::ScrollLock;
use crate::stack::{DialogId, ModalStack};

/// How a caller names a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogTarget {
    /// Registry id, or the container's `id` / identifier attribute.
    Id(String),
    /// The container element itself.
    Container(NodeId),
}

impl fmt::Display for DialogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.write_str(id),
            Self::Container(node) => write!(f, "{node}"),
        }
    }
}

impl From<&str> for DialogTarget {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

impl From<String> for DialogTarget {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<&DialogId> for DialogTarget {
    fn from(id: &DialogId) -> Self {
        Self::Id(id.as_str().to_owned())
    }
}

impl From<DialogId> for DialogTarget {
    fn from(id: DialogId) -> Self {
        Self::Id(id.as_str().to_owned())
    }
}

impl From<NodeId> for DialogTarget {
    fn from(node: NodeId) -> Self {
        Self::Container(node)
    }
}

/// Registry of dialogs over one host document.
pub struct ModalRegistry<D: Host> {
    dom: D,
    dialogs: AHashMap<DialogId, Dialog>,
    stack: ModalStack,
    scroll: ScrollLock,
    scanner: FocusScanner,
    /// Page-level defaults every dialog config starts from.
    defaults: ModalConfig,
    /// Attribute carrying explicit dialog ids on containers.
    identifier: String,
}

impl<D: Host + fmt::Debug> fmt::Debug for ModalRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalRegistry")
            .field("dom", &self.dom)
            .field("dialogs", &self.dialogs.len())
            .field("stack", &self.stack)
            .field("scroll", &self.scroll)
            .field("defaults", &self.defaults)
            .field("identifier", &self.identifier)
            .finish()
    }
}

impl<D: Host> ModalRegistry<D> {
    /// Registry with default configuration.
    pub fn new(dom: D) -> Self {
        Self::with_config(dom, ModalConfig::default())
    }

    /// Registry whose dialogs start from `defaults`.
    pub fn with_config(dom: D, defaults: ModalConfig) -> Self {
        Self {
            dom,
            dialogs: AHashMap::new(),
            stack: ModalStack::new(),
            scroll: ScrollLock::new(),
            scanner: FocusScanner::new(),
            defaults,
            identifier: DEFAULT_IDENTIFIER.to_owned(),
        }
    }

    /// Use another attribute for explicit container ids.
    #[must_use]
    pub fn with_identifier_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.identifier = attribute.into();
        self
    }

    /// Replace the focusable-element scanner.
    #[must_use]
    pub fn with_scanner(mut self, scanner: FocusScanner) -> Self {
        self.scanner = scanner;
        self
    }

    // --- Registration ---

    /// Merge `patch` into the page defaults and register one dialog per
    /// distinct trigger target, with those triggers bound. Returns the
    /// number of dialogs registered by this call.
    pub fn init(&mut self, patch: Option<&ConfigPatch>) -> usize {
        if let Some(patch) = patch {
            self.defaults.apply(patch);
        }
        let attribute = self.defaults.options.open_trigger.clone();
        let debug = self.defaults.options.debug_mode;

        let mut groups: Vec<(String, Vec<NodeId>)> = Vec::new();
        for trigger in self.dom.elements_with_attribute(&attribute) {
            let Some(target) = self.dom.attribute(trigger, &attribute) else {
                continue;
            };
            match groups.iter_mut().find(|(id, _)| *id == target) {
                Some((_, triggers)) => triggers.push(trigger),
                None => groups.push((target, vec![trigger])),
            }
        }
        if groups.is_empty() {
            diagnose(debug, &ModalError::NoTriggers { attribute });
            return 0;
        }

        let mut registered = 0;
        for (target, triggers) in groups {
            let id = DialogId::new(target.as_str());
            if self.dialogs.contains_key(&id) {
                continue;
            }
            let Some(container) = self.find_container(&target) else {
                diagnose(debug, &ModalError::MissingContainer(target));
                continue;
            };
            self.insert(id, container, triggers, self.defaults.clone());
            registered += 1;
        }
        tracing::debug!(registered, "init complete");
        registered
    }

    /// Register a single dialog, binding every trigger that names it.
    ///
    /// Returns the dialog's id, or `None` when no container matches. A
    /// dialog that is already registered is left untouched.
    pub fn register(
        &mut self,
        target: impl Into<DialogTarget>,
        patch: Option<&ConfigPatch>,
    ) -> Option<DialogId> {
        self.register_target(target.into(), patch, true)
    }

    /// Remove a dialog: close it, unbind its triggers and drop pending
    /// animation listeners. Returns `false` for unknown dialogs.
    pub fn unregister(&mut self, target: impl Into<DialogTarget>) -> bool {
        let target = target.into();
        let Some(mut dialog) = self
            .lookup_id(&target)
            .and_then(|id| self.dialogs.remove(&id))
        else {
            diagnose(
                self.defaults.options.debug_mode,
                &ModalError::NotRegistered(target.to_string()),
            );
            return false;
        };

        let Self {
            dom,
            stack,
            scroll,
            scanner,
            ..
        } = self;
        let mut cx = DialogCx {
            dom,
            stack,
            scroll,
            scanner,
        };
        dialog.close(&mut cx, None);
        dialog.unbind_triggers(cx.dom);
        dialog.release(cx.dom);
        tracing::debug!(dialog = %dialog.id(), "dialog unregistered");
        true
    }

    /// Patch a registered dialog's config. Triggers are not touched.
    pub fn configure(&mut self, target: impl Into<DialogTarget>, patch: &ConfigPatch) -> bool {
        let target = target.into();
        match self
            .lookup_id(&target)
            .and_then(|id| self.dialogs.get_mut(&id))
        {
            Some(dialog) => {
                dialog.configure(patch);
                true
            }
            None => {
                diagnose(
                    self.defaults.options.debug_mode,
                    &ModalError::NotRegistered(target.to_string()),
                );
                false
            }
        }
    }

    // --- Transitions ---

    /// Open a dialog, registering it on the fly (without triggers) when
    /// needed. A patch given for an already registered dialog is applied
    /// before opening. Returns `true` if the dialog opened.
    pub fn show(&mut self, target: impl Into<DialogTarget>, patch: Option<&ConfigPatch>) -> bool {
        let target = target.into();
        let id = match self.lookup_id(&target) {
            Some(id) if self.dialogs.contains_key(&id) => {
                if let Some(patch) = patch
                    && let Some(dialog) = self.dialogs.get_mut(&id)
                {
                    dialog.configure(patch);
                }
                id
            }
            _ => match self.register_target(target, patch, false) {
                Some(id) => id,
                None => return false,
            },
        };
        self.open(&id, None)
    }

    /// Close a specific dialog if it is open.
    pub fn close(&mut self, target: impl Into<DialogTarget>) -> bool {
        let target = target.into();
        match self.lookup_id(&target) {
            Some(id) if self.stack.contains(&id) => self.close_dialog(&id, None),
            _ => false,
        }
    }

    /// Close the most recently opened dialog.
    pub fn close_top(&mut self) -> bool {
        let Some(top) = self.stack.top().cloned() else {
            diagnose(self.defaults.options.debug_mode, &ModalError::NothingOpen);
            return false;
        };
        self.close_dialog(&top, None)
    }

    /// Close every open dialog, top first, so focus ends up where it was
    /// before the bottom dialog opened.
    pub fn close_all(&mut self) {
        let open = self.stack.ids().to_vec();
        for id in open.iter().rev() {
            self.close_dialog(id, None);
        }
    }

    /// Unregister everything and hand the document back.
    pub fn teardown(mut self) -> D {
        self.close_all();
        let ids: Vec<DialogId> = self.dialogs.keys().cloned().collect();
        for id in ids {
            self.unregister(id);
        }
        self.dom
    }

    // --- Dispatch ---

    /// Route a host event to the listeners bound along its path.
    pub fn dispatch(&mut self, event: &DomEvent) -> DispatchOutcome {
        let _span = tracing::trace_span!(
            "dispatch",
            kind = event.kind.as_str(),
            target = %event.target,
        )
        .entered();

        let mut ecx = EventContext::new(event);
        let mut handled = 0;
        let top_at_start = self.stack.top().cloned();
        let mut top_saw_key = false;
        for target in self.dom.propagation_path(event.target) {
            for listener in self.dom.listeners(target, event.kind) {
                if !self.dom.claim_listener(target, event.kind, &listener) {
                    continue;
                }
                handled += 1;
                if let Listener::Keydown(id) = &listener
                    && top_at_start.as_ref() == Some(id)
                {
                    top_saw_key = true;
                }
                self.run(&listener, &mut ecx, top_saw_key);
            }
            if ecx.propagation_stopped() {
                break;
            }
        }

        DispatchOutcome {
            handled,
            ..ecx.outcome()
        }
    }

    fn run(&mut self, listener: &Listener, ecx: &mut EventContext<'_>, top_saw_key: bool) {
        tracing::trace!(?listener, "listener");
        match listener {
            Listener::Trigger(id) => {
                self.open(id, Some(ecx.event()));
            }
            Listener::Click(id) => {
                self.with_dialog(id, |dialog, cx| dialog.on_click(cx, ecx));
            }
            Listener::Keydown(id) => {
                self.with_dialog(id, |dialog, cx| dialog.on_keydown(cx, ecx));
            }
            Listener::GlobalKeydown => {
                // The top dialog already handled this press itself.
                if !top_saw_key {
                    self.on_global_keydown(ecx);
                }
            }
            Listener::OpenAnimation(id) => {
                self.with_dialog(id, |dialog, cx| dialog.finish_open(cx));
            }
            Listener::CloseAnimation(id) => {
                self.with_dialog(id, |dialog, cx| dialog.finish_close(cx.dom));
            }
        }
    }

    fn on_global_keydown(&mut self, ecx: &mut EventContext<'_>) {
        let Some(top) = self.stack.top().cloned() else {
            return;
        };
        let Some(dialog) = self.dialogs.get(&top) else {
            return;
        };
        let Some(container) = dialog.container() else {
            return;
        };
        if let Some(active) = self.dom.active_element()
            && self.dom.contains(container, active)
        {
            return;
        }

        let event = ecx.event();
        if event.is_escape() && !dialog.has_alert_dialog(&self.dom) {
            self.close_dialog(&top, None);
        }
        if event.is_tab() {
            self.with_dialog(&top, |dialog, cx| dialog.pull_focus(cx, ecx));
        }
    }

    // --- Queries ---

    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Mutable access to the document, for page changes between events.
    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn defaults(&self) -> &ModalConfig {
        &self.defaults
    }

    pub fn is_registered(&self, target: impl Into<DialogTarget>) -> bool {
        self.dialog(target).is_some()
    }

    pub fn is_open(&self, target: impl Into<DialogTarget>) -> bool {
        self.dialog(target).is_some_and(Dialog::is_open)
    }

    pub fn dialog(&self, target: impl Into<DialogTarget>) -> Option<&Dialog> {
        self.lookup_id(&target.into())
            .and_then(|id| self.dialogs.get(&id))
    }

    /// Open dialogs, bottom to top.
    pub fn open_dialogs(&self) -> &[DialogId] {
        self.stack.ids()
    }

    /// The dialog receiving document-level key presses.
    pub fn top(&self) -> Option<&DialogId> {
        self.stack.top()
    }

    /// Number of registered dialogs.
    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll.is_suspended()
    }

    // --- Internals ---

    fn register_target(
        &mut self,
        target: DialogTarget,
        patch: Option<&ConfigPatch>,
        with_triggers: bool,
    ) -> Option<DialogId> {
        let config = self.defaults.patched(patch);
        if let Some(id) = self.lookup_id(&target)
            && self.dialogs.contains_key(&id)
        {
            return Some(id);
        }

        let container = match &target {
            DialogTarget::Container(node) => Some(*node),
            DialogTarget::Id(id) => self.find_container(id),
        };
        let Some(container) = container else {
            diagnose(
                config.options.debug_mode,
                &ModalError::MissingContainer(target.to_string()),
            );
            return None;
        };
        let id = self.resolve_id(&target, container);
        if self.dialogs.contains_key(&id) {
            return Some(id);
        }

        let triggers = if with_triggers {
            let attribute = config.options.open_trigger.as_str();
            self.dom
                .elements_with_attribute(attribute)
                .into_iter()
                .filter(|&node| self.dom.attribute(node, attribute).as_deref() == Some(id.as_str()))
                .collect()
        } else {
            Vec::new()
        };
        self.insert(id.clone(), container, triggers, config);
        Some(id)
    }

    fn insert(&mut self, id: DialogId, container: NodeId, triggers: Vec<NodeId>, config: ModalConfig) {
        self.dom
            .set_attribute(container, &self.identifier, id.as_str());
        let dialog = Dialog::new(id.clone(), Some(container), triggers, config);
        dialog.bind_triggers(&mut self.dom);
        tracing::debug!(
            dialog = %id,
            triggers = dialog.triggers().len(),
            "dialog registered"
        );
        self.dialogs.insert(id, dialog);
    }

    /// Id named by `target` without touching the page. Containers answer
    /// with their identifier attribute, then their `id`.
    fn lookup_id(&self, target: &DialogTarget) -> Option<DialogId> {
        match target {
            DialogTarget::Id(id) => Some(DialogId::new(id.as_str())),
            DialogTarget::Container(node) => [self.identifier.as_str(), "id"]
                .into_iter()
                .filter_map(|attribute| self.dom.attribute(*node, attribute))
                .find(|value| !value.is_empty())
                .map(DialogId::from),
        }
    }

    /// Like `lookup_id`, generating and recording an id for anonymous
    /// containers.
    fn resolve_id(&mut self, target: &DialogTarget, container: NodeId) -> DialogId {
        if let Some(id) = self.lookup_id(target) {
            return id;
        }
        let id = DialogId::generate();
        self.dom
            .set_attribute(container, &self.identifier, id.as_str());
        id
    }

    /// `getElementById`, then the identifier attribute.
    fn find_container(&self, id: &str) -> Option<NodeId> {
        self.dom.element_by_id(id).or_else(|| {
            self.dom
                .elements_with_attribute(&self.identifier)
                .into_iter()
                .find(|&node| self.dom.attribute(node, &self.identifier).as_deref() == Some(id))
        })
    }

    fn open(&mut self, id: &DialogId, event: Option<&DomEvent>) -> bool {
        self.with_dialog(id, |dialog, cx| dialog.show(cx, event))
            .unwrap_or(false)
    }

    fn close_dialog(&mut self, id: &DialogId, event: Option<&DomEvent>) -> bool {
        self.with_dialog(id, |dialog, cx| dialog.close(cx, event))
            .unwrap_or(false)
    }

    fn with_dialog<R>(
        &mut self,
        id: &DialogId,
        f: impl FnOnce(&mut Dialog, &mut DialogCx<'_, D>) -> R,
    ) -> Option<R> {
        let Self {
            dom,
            dialogs,
            stack,
            scroll,
            scanner,
            ..
        } = self;
        let dialog = dialogs.get_mut(id)?;
        let mut cx = DialogCx {
            dom,
            stack,
            scroll,
            scanner,
        };
        Some(f(dialog, &mut cx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmodal_dom::{Dom, EventKind, EventTarget, Key, KeyEvent};
    use mmodal_harness::{MemoryDom, el};
    use pretty_assertions::assert_eq;

    type Registry = ModalRegistry<MemoryDom<Listener>>;

    fn registry() -> Registry {
        let mut dom = MemoryDom::new();
        dom.append_to_body(el("button").id("open-a").attr("data-micromodal-trigger", "a"));
        dom.append_to_body(el("a").id("open-a-2").attr("data-micromodal-trigger", "a"));
        dom.append_to_body(el("button").id("open-b").attr("data-micromodal-trigger", "b"));
        for id in ["a", "b"] {
            dom.append_to_body(
                el("div").id(id).attr("aria-hidden", "true").child(
                    el("div").flag("data-micromodal-close").child(
                        el("div")
                            .attr("role", "dialog")
                            .child(el("button").id(&format!("{id}-ok"))),
                    ),
                ),
            );
        }
        ModalRegistry::new(dom)
    }

    fn node(registry: &Registry, id: &str) -> NodeId {
        registry.dom().element_by_id(id).expect("element exists")
    }

    #[test]
    fn init_groups_triggers_by_target() {
        let mut registry = registry();
        assert_eq!(registry.init(None), 2);
        let a = registry.dialog("a").expect("a registered");
        assert_eq!(a.triggers(), [node(&registry, "open-a"), node(&registry, "open-a-2")]);
        assert_eq!(registry.dialog("b").map(|d| d.triggers().len()), Some(1));
        assert_eq!(registry.init(None), 0);
    }

    #[test]
    fn register_records_identifier_on_container() {
        let mut registry = registry();
        let id = registry.register("a", None);
        assert_eq!(id, Some(DialogId::new("a")));
        let container = node(&registry, "a");
        assert_eq!(
            registry.dom().attribute(container, DEFAULT_IDENTIFIER).as_deref(),
            Some("a")
        );
        assert!(registry.is_registered(container));
    }

    #[test]
    fn anonymous_container_gets_generated_id() {
        let mut registry = registry();
        let container = registry.dom_mut().append_to_body(el("div").child(el("button")));
        let id = registry.register(container, None).expect("registered");
        assert!(id.as_str().starts_with("dialog-"));
        assert_eq!(registry.register(container, None), Some(id.clone()));
        assert!(registry.show(id.as_str(), None));
        assert!(registry.is_open(container));
    }

    #[test]
    fn identifier_attribute_is_configurable() {
        let mut dom: MemoryDom<Listener> = MemoryDom::new();
        let container = dom.append_to_body(el("div").attr("data-dialog", "prefs"));
        let mut registry = ModalRegistry::new(dom).with_identifier_attribute("data-dialog");
        assert!(registry.show("prefs", None));
        assert!(registry.is_open(container));
    }

    #[test]
    fn trigger_click_opens_and_reports_event() {
        let mut registry = registry();
        registry.init(None);
        let trigger = node(&registry, "open-b");
        registry.dom_mut().focus(trigger);

        let outcome = registry.dispatch(&DomEvent::click(trigger));
        assert_eq!(outcome.handled, 1);
        assert!(registry.is_open("b"));
        assert_eq!(registry.top(), Some(&DialogId::new("b")));
        assert_eq!(
            registry.dialog("b").and_then(Dialog::restore_focus_to),
            Some(trigger)
        );
    }

    #[test]
    fn close_with_target_only_touches_open_dialogs() {
        let mut registry = registry();
        registry.show("a", None);
        registry.register("b", None);
        assert!(!registry.close("b"));
        assert!(!registry.close("zzz"));
        assert!(registry.close("a"));
        assert!(!registry.close_top());
    }

    #[test]
    fn show_patch_updates_registered_dialog() {
        let mut registry = registry();
        registry.register("a", None);
        let patch = ConfigPatch::new().open_class("visible");
        registry.show("a", Some(&patch));
        let container = node(&registry, "a");
        assert!(registry.dom().has_class(container, "visible"));
    }

    #[test]
    fn configure_keeps_triggers() {
        let mut registry = registry();
        registry.init(None);
        assert!(registry.configure("a", &ConfigPatch::new().disable_scroll(true)));
        let dialog = registry.dialog("a").expect("registered");
        assert!(dialog.config().options.disable_scroll);
        assert_eq!(dialog.triggers().len(), 2);
        assert!(!registry.configure("zzz", &ConfigPatch::new()));
    }

    #[test]
    fn unregister_unbinds_everything() {
        let mut registry = registry();
        registry.init(None);
        registry.show("a", None);
        assert!(registry.unregister("a"));
        assert!(!registry.is_registered("a"));
        assert!(registry.open_dialogs().is_empty());

        let trigger = node(&registry, "open-a");
        assert_eq!(registry.dom().listener_count(trigger.into(), EventKind::Click), 0);
        assert_eq!(
            registry.dom().listener_count(EventTarget::Document, EventKind::Keydown),
            0
        );
        assert!(!registry.unregister("a"));
    }

    #[test]
    fn removed_listener_does_not_run_later_in_the_same_dispatch() {
        let mut registry = registry();
        registry.show("a", None);
        let ok = node(&registry, "a-ok");
        registry.dom_mut().focus(ok);
        // The dialog listener closes "a" and unbinds the document listener
        // before the event reaches the document.
        let outcome = registry.dispatch(&DomEvent::keydown(ok, KeyEvent::new(Key::Escape)));
        assert_eq!(outcome.handled, 1);
        assert!(!registry.is_open("a"));
    }

    #[test]
    fn teardown_returns_a_clean_document() {
        let mut registry = registry();
        registry.init(None);
        registry.show("a", Some(&ConfigPatch::new().disable_scroll(true)));
        registry.show("b", None);
        let dom = registry.teardown();
        assert_eq!(dom.total_listeners(), 0);
        assert_eq!(dom.body_style(mmodal_dom::StyleProperty::Overflow), "");
    }
}
