//! Error types and result aliases for Sift.
//!
//! Every crate in the workspace reports failures through [`SiftError`] and
//! the [`SiftResult`] alias.

mod error;

pub use error::{SiftError, SiftResult};
