//! Terminal presentation for progress signals.
//!
//! The engine emits [`crate::events::ProgressEvent`] values; the sinks here
//! map them onto a terminal status line or a JSON-lines stream. The bar
//! renderer is a pure function and carries no terminal state.

pub mod bar;
pub mod icons;
pub mod json;
pub mod status;

pub use json::JsonLines;
pub use status::StatusLine;
