#![forbid(unsafe_code)]

//! Test harness for mmodal.
//!
//! - [`MemoryDom`]: a deterministic, host-driven in-memory document that
//!   implements [`mmodal_dom::Dom`] for any listener type.
//! - [`el`]: a small element builder for assembling test pages.
//! - [`logs`]: scoped capture of `tracing` diagnostics.
//!
//! Run: `cargo test -p mmodal-harness`

pub mod builder;
pub mod logs;
pub mod memory;

pub use builder::{ElementSpec, el};
pub use logs::{CapturedEvent, capture, capture_warnings};
pub use memory::MemoryDom;
