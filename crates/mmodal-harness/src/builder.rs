#![forbid(unsafe_code)]

//! Terse element builder for test pages.
//!
//! ```ignore
//! let modal = dom.append_to_body(
//!     el("div")
//!         .id("modal-1")
//!         .attr("aria-hidden", "true")
//!         .child(el("div").flag("data-micromodal-close").child(
//!             el("div").attr("role", "dialog").child(el("button").id("ok")),
//!         )),
//! );
//! ```

/// Declarative description of an element subtree.
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    pub(crate) tag: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) classes: Vec<String>,
    pub(crate) display_none: bool,
    pub(crate) children: Vec<ElementSpec>,
}

/// Start describing a `<tag>` element.
pub fn el(tag: &str) -> ElementSpec {
    ElementSpec {
        tag: tag.to_owned(),
        ..ElementSpec::default()
    }
}

impl ElementSpec {
    /// Set an attribute.
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_owned(),
            None => self.attributes.push((name.to_owned(), value.to_owned())),
        }
        self
    }

    /// Set a valueless attribute (`disabled`, `data-micromodal-close`, ...).
    #[must_use]
    pub fn flag(self, name: &str) -> Self {
        self.attr(name, "")
    }

    /// Set the native `id`.
    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_owned());
        self
    }

    /// Render with `display: none`.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.display_none = true;
        self
    }

    #[must_use]
    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children.extend(children);
        self
    }
}
