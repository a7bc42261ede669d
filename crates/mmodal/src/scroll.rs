#![forbid(unsafe_code)]

//! Page scroll suspension while a dialog is open.
//!
//! Suspending hides `<body>` overflow, blocks touch panning, and pads the
//! right edge by the scrollbar width plus a fixed compensation so content
//! does not shift when the scrollbar disappears.
//!
//! # Invariants
//!
//! - `suspend`/`resume` are idempotent. A second `suspend` keeps the
//!   padding measured by the first one.
//! - After `resume` all three inline styles are empty again.

use mmodal_dom::StyleProperty;

use crate::listener::Host;

/// Extra right padding added on top of the measured scrollbar width.
pub const SCROLLBAR_COMPENSATION_PX: u32 = 15;

/// Tracks whether page scrolling is currently suspended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollLock {
    suspended: bool,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Stop the page from scrolling.
    pub fn suspend<D: Host + ?Sized>(&mut self, dom: &mut D) {
        if self.suspended {
            return;
        }
        let padding = dom.scrollbar_width() + SCROLLBAR_COMPENSATION_PX;
        dom.set_body_style(StyleProperty::Overflow, "hidden");
        dom.set_body_style(StyleProperty::TouchAction, "none");
        dom.set_body_style(StyleProperty::PaddingRight, &format!("{padding}px"));
        self.suspended = true;
        tracing::debug!(padding, "scroll suspended");
    }

    /// Let the page scroll again.
    pub fn resume<D: Host + ?Sized>(&mut self, dom: &mut D) {
        if !self.suspended {
            return;
        }
        for property in [
            StyleProperty::Overflow,
            StyleProperty::TouchAction,
            StyleProperty::PaddingRight,
        ] {
            dom.set_body_style(property, "");
        }
        self.suspended = false;
        tracing::debug!("scroll resumed");
    }
}
