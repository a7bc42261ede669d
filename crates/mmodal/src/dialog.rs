#![forbid(unsafe_code)]

//! Per-container dialog state machine.
//!
//! A [`Dialog`] owns the open/close sequence of one container: ARIA state,
//! the open class, scroll lock, its own click/key listeners, focus on open
//! and focus restoration on close. The registry owns the dialogs and hands
//! each transition a [`DialogCx`] borrowing the shared page state.
//!
//! # State Machine
//!
//! ```text
//!            show()                      close()
//!   Closed ─────────▶ Open ─────────────────────▶ Closed
//!     ▲                 │ await_open_animation       │ await_close_animation
//!     │                 ▼                            ▼
//!     │          OpenAnimation(id)            CloseAnimation(id)
//!     │          (focus on animationend)      (class removed on animationend)
//! ```
//!
//! # Invariants
//!
//! - `state == Open` iff the dialog's id is on the stack.
//! - While open, the container carries `aria-hidden="false"`, the open
//!   class, and exactly one `Click(id)` and one `Keydown(id)` listener.
//! - A dialog without a container is inert: every transition is a no-op.
//! - Close resumes scrolling only if the matching open suspended it, whatever
//!   the config says by then.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Show while open | Repeated trigger | No-op, `on_show` not called again |
//! | Close while closed | Repeated Escape, stray `animationend` | No-op |
//! | Restore target gone | Element removed while open | Focus left where it is |
//! | Late `animationend` | Dialog reopened/closed in between | Stale handler does nothing |

use mmodal_dom::{DomEvent, EventContext, EventKind, EventTarget, ListenerOptions, NodeId};

use crate::config::{ConfigPatch, ModalConfig};
use crate::error::{ModalError, diagnose};
use crate::focus::{FocusScanner, TrapMode};
use crate::listener::{Host, Listener};
use crate::scroll::ScrollLock;
use crate::stack::{DialogId, ModalStack};

/// Role marking content that must be acknowledged explicitly.
pub const ALERT_DIALOG_ROLE: &str = "alertdialog";

/// Whether a dialog is currently shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Closed,
    Open,
}

/// Shared page state a transition needs.
pub(crate) struct DialogCx<'a, D: Host + ?Sized> {
    pub dom: &'a mut D,
    pub stack: &'a mut ModalStack,
    pub scroll: &'a mut ScrollLock,
    pub scanner: &'a FocusScanner,
}

/// One registered dialog.
#[derive(Debug, Clone)]
pub struct Dialog {
    id: DialogId,
    container: Option<NodeId>,
    state: DialogState,
    /// Element focused right before the last open.
    restore_focus_to: Option<NodeId>,
    /// The last open suspended page scrolling.
    locked_scroll: bool,
    triggers: Vec<NodeId>,
    config: ModalConfig,
}

impl Dialog {
    pub(crate) fn new(
        id: DialogId,
        container: Option<NodeId>,
        triggers: Vec<NodeId>,
        config: ModalConfig,
    ) -> Self {
        Self {
            id,
            container,
            state: DialogState::Closed,
            restore_focus_to: None,
            locked_scroll: false,
            triggers,
            config,
        }
    }

    // --- Accessors ---

    pub fn id(&self) -> &DialogId {
        &self.id
    }

    /// The container element, `None` for an inert dialog.
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state == DialogState::Open
    }

    #[inline]
    pub fn is_inert(&self) -> bool {
        self.container.is_none()
    }

    /// Where focus returns on close.
    pub fn restore_focus_to(&self) -> Option<NodeId> {
        self.restore_focus_to
    }

    /// Elements that open this dialog when clicked.
    pub fn triggers(&self) -> &[NodeId] {
        &self.triggers
    }

    pub fn config(&self) -> &ModalConfig {
        &self.config
    }

    pub(crate) fn configure(&mut self, patch: &ConfigPatch) {
        self.config.apply(patch);
    }

    /// Whether the container holds a `role="alertdialog"` element.
    pub fn has_alert_dialog<D: Host + ?Sized>(&self, dom: &D) -> bool {
        self.container.is_some_and(|container| {
            dom.descendants(container)
                .into_iter()
                .any(|node| dom.attribute(node, "role").as_deref() == Some(ALERT_DIALOG_ROLE))
        })
    }

    // --- Triggers ---

    pub(crate) fn bind_triggers<D: Host + ?Sized>(&self, dom: &mut D) {
        for &trigger in &self.triggers {
            dom.add_listener(
                EventTarget::Node(trigger),
                EventKind::Click,
                Listener::Trigger(self.id.clone()),
                ListenerOptions::default(),
            );
        }
    }

    pub(crate) fn unbind_triggers<D: Host + ?Sized>(&self, dom: &mut D) {
        for &trigger in &self.triggers {
            dom.remove_listener(
                EventTarget::Node(trigger),
                EventKind::Click,
                &Listener::Trigger(self.id.clone()),
            );
        }
    }

    // --- Transitions ---

    /// Open the dialog. Returns `false` when nothing happened.
    pub(crate) fn show<D: Host + ?Sized>(
        &mut self,
        cx: &mut DialogCx<'_, D>,
        event: Option<&DomEvent>,
    ) -> bool {
        let Some(container) = self.container else {
            diagnose(
                self.config.options.debug_mode,
                &ModalError::Inert(self.id.to_string()),
            );
            return false;
        };
        if self.is_open() {
            return false;
        }

        // Leftovers of an interrupted close.
        self.remove_own_listeners(cx.dom, container);
        cx.dom.remove_listener(
            EventTarget::Node(container),
            EventKind::AnimationEnd,
            &Listener::CloseAnimation(self.id.clone()),
        );

        self.restore_focus_to = cx.dom.active_element();
        cx.dom.set_attribute(container, "aria-hidden", "false");
        cx.dom.add_class(container, &self.config.options.open_class);
        self.locked_scroll = self.config.options.disable_scroll;
        if self.locked_scroll {
            cx.scroll.suspend(cx.dom);
        }

        let target = EventTarget::Node(container);
        cx.dom.add_listener(
            target,
            EventKind::Click,
            Listener::Click(self.id.clone()),
            ListenerOptions::default(),
        );
        cx.dom.add_listener(
            target,
            EventKind::Keydown,
            Listener::Keydown(self.id.clone()),
            ListenerOptions::default(),
        );

        cx.stack.push(cx.dom, self.id.clone());
        self.state = DialogState::Open;
        tracing::debug!(dialog = %self.id, depth = cx.stack.depth(), "dialog opened");

        if self.config.options.await_open_animation {
            cx.dom.add_listener(
                target,
                EventKind::AnimationEnd,
                Listener::OpenAnimation(self.id.clone()),
                ListenerOptions::ONCE,
            );
        } else {
            self.focus_first_node(cx);
        }

        if let Some(on_show) = &self.config.on_show {
            on_show(container, self.restore_focus_to, event);
        }
        true
    }

    /// Close the dialog. Returns `false` when nothing happened.
    pub(crate) fn close<D: Host + ?Sized>(
        &mut self,
        cx: &mut DialogCx<'_, D>,
        event: Option<&DomEvent>,
    ) -> bool {
        let Some(container) = self.container else {
            diagnose(
                self.config.options.debug_mode,
                &ModalError::Inert(self.id.to_string()),
            );
            return false;
        };
        if !self.is_open() {
            return false;
        }

        cx.stack.remove(cx.dom, &self.id);
        self.state = DialogState::Closed;
        cx.dom.set_attribute(container, "aria-hidden", "true");

        self.remove_own_listeners(cx.dom, container);
        cx.dom.remove_listener(
            EventTarget::Node(container),
            EventKind::AnimationEnd,
            &Listener::OpenAnimation(self.id.clone()),
        );

        if std::mem::take(&mut self.locked_scroll) {
            cx.scroll.resume(cx.dom);
        }
        if let Some(node) = self.restore_focus_to
            && !cx.dom.focus(node)
        {
            tracing::debug!(dialog = %self.id, %node, "focus restore skipped");
        }
        tracing::debug!(dialog = %self.id, depth = cx.stack.depth(), "dialog closed");

        if let Some(on_close) = &self.config.on_close {
            on_close(container, self.restore_focus_to, event);
        }

        if self.config.options.await_close_animation {
            cx.dom.add_listener(
                EventTarget::Node(container),
                EventKind::AnimationEnd,
                Listener::CloseAnimation(self.id.clone()),
                ListenerOptions::ONCE,
            );
        } else {
            cx.dom
                .remove_class(container, &self.config.options.open_class);
        }
        true
    }

    /// Drop pending animation listeners, applying a deferred class removal
    /// right away.
    pub(crate) fn release<D: Host + ?Sized>(&self, dom: &mut D) {
        let Some(container) = self.container else {
            return;
        };
        let target = EventTarget::Node(container);
        let closing = Listener::CloseAnimation(self.id.clone());
        if dom.has_listener(target, EventKind::AnimationEnd, &closing) {
            dom.remove_listener(target, EventKind::AnimationEnd, &closing);
            if !self.is_open() {
                dom.remove_class(container, &self.config.options.open_class);
            }
        }
        dom.remove_listener(
            target,
            EventKind::AnimationEnd,
            &Listener::OpenAnimation(self.id.clone()),
        );
    }

    // --- Event routing ---

    /// Clicks inside the container.
    pub(crate) fn on_click<D: Host + ?Sized>(
        &mut self,
        cx: &mut DialogCx<'_, D>,
        ecx: &mut EventContext<'_>,
    ) {
        let Some(container) = self.container else {
            return;
        };
        let dom = &*cx.dom;
        let target = ecx.event().target;
        let close_attr = self.config.options.close_trigger.as_str();
        let is_overlay = |node: NodeId| node == container || dom.parent(node) == Some(container);

        let overlay_clicked = is_overlay(target);
        let backdrop = overlay_clicked && dom.has_attribute(target, close_attr);
        let close_control = !overlay_clicked
            && dom
                .closest(target, close_attr)
                .is_some_and(|node| !is_overlay(node));

        if backdrop || close_control {
            ecx.prevent_default();
            ecx.stop_propagation();
            self.close(cx, Some(ecx.event()));
        }
    }

    /// Key presses inside the container.
    pub(crate) fn on_keydown<D: Host + ?Sized>(
        &mut self,
        cx: &mut DialogCx<'_, D>,
        ecx: &mut EventContext<'_>,
    ) {
        let Some(container) = self.container else {
            return;
        };
        let event = ecx.event();
        if event.is_escape() && !self.has_alert_dialog(&*cx.dom) {
            self.close(cx, Some(event));
        }
        if event.is_tab() {
            cx.scanner
                .retain_focus(cx.dom, container, ecx, TrapMode::Inside);
        }
    }

    /// Tab pressed while focus is outside every dialog.
    pub(crate) fn pull_focus<D: Host + ?Sized>(
        &self,
        cx: &mut DialogCx<'_, D>,
        ecx: &mut EventContext<'_>,
    ) {
        if let Some(container) = self.container {
            cx.scanner
                .retain_focus(cx.dom, container, ecx, TrapMode::Outside);
        }
    }

    /// `animationend` after an open with `await_open_animation`.
    pub(crate) fn finish_open<D: Host + ?Sized>(&mut self, cx: &mut DialogCx<'_, D>) {
        if self.is_open() {
            self.focus_first_node(cx);
        }
    }

    /// `animationend` after a close with `await_close_animation`.
    pub(crate) fn finish_close<D: Host + ?Sized>(&self, dom: &mut D) {
        if let Some(container) = self.container
            && !self.is_open()
        {
            dom.remove_class(container, &self.config.options.open_class);
        }
    }

    fn focus_first_node<D: Host + ?Sized>(&self, cx: &mut DialogCx<'_, D>) {
        if self.config.options.disable_focus {
            return;
        }
        let Some(container) = self.container else {
            return;
        };
        if let Some(node) =
            cx.scanner
                .initial_target(&*cx.dom, container, &self.config.options.close_trigger)
        {
            cx.dom.focus(node);
        }
    }

    fn remove_own_listeners<D: Host + ?Sized>(&self, dom: &mut D, container: NodeId) {
        let target = EventTarget::Node(container);
        dom.remove_listener(target, EventKind::Click, &Listener::Click(self.id.clone()));
        dom.remove_listener(
            target,
            EventKind::Keydown,
            &Listener::Keydown(self.id.clone()),
        );
    }
}
