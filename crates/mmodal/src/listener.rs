#![forbid(unsafe_code)]

//! Listener values bound through the host DOM.

use mmodal_dom::Dom;

use crate::stack::DialogId;

/// The routine a bound listener runs.
///
/// The host stores these per `(target, event kind)`; the registry's
/// dispatcher turns each one back into a call on the right dialog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Listener {
    /// Click on a trigger element: open the dialog.
    Trigger(DialogId),
    /// Click inside an open dialog's container.
    Click(DialogId),
    /// Key press inside an open dialog's container.
    Keydown(DialogId),
    /// Document-level key press while any dialog is open.
    GlobalKeydown,
    /// One-shot: the open animation finished, set focus.
    OpenAnimation(DialogId),
    /// One-shot: the close animation finished, drop the open class.
    CloseAnimation(DialogId),
}

/// A host DOM able to store [`Listener`] values.
pub trait Host: Dom<Listener> {}

impl<T: Dom<Listener> + ?Sized> Host for T {}
