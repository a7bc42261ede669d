#![forbid(unsafe_code)]

//! Dialog configuration.
//!
//! [`ModalOptions`] holds every plain setting (attribute names, class name,
//! behavior flags). [`ModalConfig`] adds the `on_show`/`on_close` callbacks.
//! [`ConfigPatch`] is a partial update: only the fields that are `Some`
//! are applied, the rest of the target config is left alone.
//!
//! With the `serde` feature, options and patches (callbacks excluded) read
//! and write the camelCase keys used by page-level JSON options:
//!
//! ```ignore
//! let patch: ConfigPatch = serde_json::from_str(r#"{"disableScroll":true}"#)?;
//! ```

use std::fmt;
use std::rc::Rc;

use mmodal_dom::{DomEvent, NodeId};

/// Default attribute marking trigger elements (`data-micromodal-trigger="<id>"`).
pub const DEFAULT_OPEN_TRIGGER: &str = "data-micromodal-trigger";
/// Default attribute marking close controls and backdrops.
pub const DEFAULT_CLOSE_TRIGGER: &str = "data-micromodal-close";
/// Default explicit identifier attribute on containers.
pub const DEFAULT_IDENTIFIER: &str = "data-micromodal-id";
/// Default class toggled while a dialog is open.
pub const DEFAULT_OPEN_CLASS: &str = "is-open";

/// Callback run after a dialog opens or closes.
///
/// Arguments: the container, the element focused before the dialog opened
/// (if any), and the event that caused the transition (`None` for
/// programmatic calls).
pub type DialogCallback = Rc<dyn Fn(NodeId, Option<NodeId>, Option<&DomEvent>)>;

/// Plain dialog settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct ModalOptions {
    /// Attribute naming the dialog a trigger opens.
    pub open_trigger: String,
    /// Attribute marking close controls.
    pub close_trigger: String,
    /// Class added while open.
    pub open_class: String,
    /// Suspend page scrolling while open.
    pub disable_scroll: bool,
    /// Leave focus alone on open.
    pub disable_focus: bool,
    /// Defer open-time focus until the container's animation ends.
    pub await_open_animation: bool,
    /// Defer removing the open class until the container's animation ends.
    pub await_close_animation: bool,
    /// Emit diagnostics for misuse. No behavioral effect.
    pub debug_mode: bool,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            open_trigger: DEFAULT_OPEN_TRIGGER.to_owned(),
            close_trigger: DEFAULT_CLOSE_TRIGGER.to_owned(),
            open_class: DEFAULT_OPEN_CLASS.to_owned(),
            disable_scroll: false,
            disable_focus: false,
            await_open_animation: false,
            await_close_animation: false,
            debug_mode: false,
        }
    }
}

/// Full per-dialog configuration.
#[derive(Clone, Default)]
pub struct ModalConfig {
    pub options: ModalOptions,
    pub on_show: Option<DialogCallback>,
    pub on_close: Option<DialogCallback>,
}

impl fmt::Debug for ModalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalConfig")
            .field("options", &self.options)
            .field("on_show", &self.on_show.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

impl ModalConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_class(mut self, class: impl Into<String>) -> Self {
        self.options.open_class = class.into();
        self
    }

    pub fn close_trigger(mut self, attribute: impl Into<String>) -> Self {
        self.options.close_trigger = attribute.into();
        self
    }

    pub fn open_trigger(mut self, attribute: impl Into<String>) -> Self {
        self.options.open_trigger = attribute.into();
        self
    }

    pub fn disable_scroll(mut self, disable: bool) -> Self {
        self.options.disable_scroll = disable;
        self
    }

    pub fn disable_focus(mut self, disable: bool) -> Self {
        self.options.disable_focus = disable;
        self
    }

    pub fn await_open_animation(mut self, wait: bool) -> Self {
        self.options.await_open_animation = wait;
        self
    }

    pub fn await_close_animation(mut self, wait: bool) -> Self {
        self.options.await_close_animation = wait;
        self
    }

    pub fn debug_mode(mut self, debug: bool) -> Self {
        self.options.debug_mode = debug;
        self
    }

    /// Run `callback` after the dialog opens.
    pub fn on_show(
        mut self,
        callback: impl Fn(NodeId, Option<NodeId>, Option<&DomEvent>) + 'static,
    ) -> Self {
        self.on_show = Some(Rc::new(callback));
        self
    }

    /// Run `callback` after the dialog closes.
    pub fn on_close(
        mut self,
        callback: impl Fn(NodeId, Option<NodeId>, Option<&DomEvent>) + 'static,
    ) -> Self {
        self.on_close = Some(Rc::new(callback));
        self
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &ConfigPatch) {
        let o = &mut self.options;
        if let Some(v) = &patch.open_trigger {
            o.open_trigger.clone_from(v);
        }
        if let Some(v) = &patch.close_trigger {
            o.close_trigger.clone_from(v);
        }
        if let Some(v) = &patch.open_class {
            o.open_class.clone_from(v);
        }
        if let Some(v) = patch.disable_scroll {
            o.disable_scroll = v;
        }
        if let Some(v) = patch.disable_focus {
            o.disable_focus = v;
        }
        if let Some(v) = patch.await_open_animation {
            o.await_open_animation = v;
        }
        if let Some(v) = patch.await_close_animation {
            o.await_close_animation = v;
        }
        if let Some(v) = patch.debug_mode {
            o.debug_mode = v;
        }
        if let Some(cb) = &patch.on_show {
            self.on_show = Some(Rc::clone(cb));
        }
        if let Some(cb) = &patch.on_close {
            self.on_close = Some(Rc::clone(cb));
        }
    }

    /// A copy with `patch` applied.
    #[must_use]
    pub fn patched(&self, patch: Option<&ConfigPatch>) -> Self {
        let mut config = self.clone();
        if let Some(patch) = patch {
            config.apply(patch);
        }
        config
    }
}

/// Partial configuration update.
#[derive(Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct ConfigPatch {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub open_trigger: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub close_trigger: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub open_class: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub disable_scroll: Option<bool>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub disable_focus: Option<bool>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub await_open_animation: Option<bool>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub await_close_animation: Option<bool>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub debug_mode: Option<bool>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub on_show: Option<DialogCallback>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub on_close: Option<DialogCallback>,
}

impl fmt::Debug for ConfigPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigPatch")
            .field("open_trigger", &self.open_trigger)
            .field("close_trigger", &self.close_trigger)
            .field("open_class", &self.open_class)
            .field("disable_scroll", &self.disable_scroll)
            .field("disable_focus", &self.disable_focus)
            .field("await_open_animation", &self.await_open_animation)
            .field("await_close_animation", &self.await_close_animation)
            .field("debug_mode", &self.debug_mode)
            .field("on_show", &self.on_show.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_trigger(mut self, attribute: impl Into<String>) -> Self {
        self.open_trigger = Some(attribute.into());
        self
    }

    pub fn close_trigger(mut self, attribute: impl Into<String>) -> Self {
        self.close_trigger = Some(attribute.into());
        self
    }

    pub fn open_class(mut self, class: impl Into<String>) -> Self {
        self.open_class = Some(class.into());
        self
    }

    pub fn disable_scroll(mut self, disable: bool) -> Self {
        self.disable_scroll = Some(disable);
        self
    }

    pub fn disable_focus(mut self, disable: bool) -> Self {
        self.disable_focus = Some(disable);
        self
    }

    pub fn await_open_animation(mut self, wait: bool) -> Self {
        self.await_open_animation = Some(wait);
        self
    }

    pub fn await_close_animation(mut self, wait: bool) -> Self {
        self.await_close_animation = Some(wait);
        self
    }

    pub fn debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = Some(debug);
        self
    }

    pub fn on_show(
        mut self,
        callback: impl Fn(NodeId, Option<NodeId>, Option<&DomEvent>) + 'static,
    ) -> Self {
        self.on_show = Some(Rc::new(callback));
        self
    }

    pub fn on_close(
        mut self,
        callback: impl Fn(NodeId, Option<NodeId>, Option<&DomEvent>) + 'static,
    ) -> Self {
        self.on_close = Some(Rc::new(callback));
        self
    }
}

impl From<ModalOptions> for ModalConfig {
    fn from(options: ModalOptions) -> Self {
        Self {
            options,
            on_show: None,
            on_close: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn defaults_match_page_attributes() {
        let options = ModalOptions::default();
        assert_eq!(options.open_trigger, "data-micromodal-trigger");
        assert_eq!(options.close_trigger, "data-micromodal-close");
        assert_eq!(options.open_class, "is-open");
        assert!(!options.disable_scroll);
        assert!(!options.debug_mode);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut config = ModalConfig::new().open_class("visible").disable_focus(true);
        config.apply(&ConfigPatch::new().disable_scroll(true));
        assert_eq!(config.options.open_class, "visible");
        assert!(config.options.disable_focus);
        assert!(config.options.disable_scroll);
    }

    #[test]
    fn patch_replaces_callbacks() {
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let config = ModalConfig::new()
            .patched(Some(&ConfigPatch::new().on_show(move |_, _, _| seen.set(seen.get() + 1))));
        let on_show = config.on_show.expect("callback installed");
        on_show(NodeId::new(1), None, None);
        assert_eq!(hits.get(), 1);
        assert!(config.on_close.is_none());
    }

    #[test]
    fn patched_without_patch_is_a_copy() {
        let config = ModalConfig::new().debug_mode(true);
        let copy = config.patched(None);
        assert_eq!(copy.options, config.options);
    }

    #[test]
    fn debug_output_hides_closures() {
        let config = ModalConfig::new().on_close(|_, _, _| {});
        let text = format!("{config:?}");
        assert!(text.contains("on_close: true"));
        assert!(text.contains("on_show: false"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn options_read_camel_case_json() {
        let options: ModalOptions =
            serde_json::from_str(r#"{"disableScroll":true,"openClass":"shown"}"#)
                .expect("valid options");
        assert!(options.disable_scroll);
        assert_eq!(options.open_class, "shown");
        assert_eq!(options.close_trigger, DEFAULT_CLOSE_TRIGGER);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = ConfigPatch::new().await_close_animation(true);
        let json = serde_json::to_string(&patch).expect("serializable");
        assert_eq!(json, r#"{"awaitCloseAnimation":true}"#);
    }
}
