//! shade-core - rewrites `lighten()`/`darken()` calls in CSS values
//!
//! The engine works on one declaration value at a time:
//!
//! 1. [`value`] tokenizes the value with `cssparser` and builds a tree of
//!    literals, quoted strings, dividers and function calls.
//! 2. [`rewrite`] walks the tree; each `lighten`/`darken` call is checked by
//!    [`validate`] and evaluated by [`transform`] using the conversions in
//!    [`color`].
//! 3. Resolved calls become `hsla(h, s%, l%, 1)` literals and the tree is
//!    serialized back to text.
//!
//! [`stylesheet`] drives the engine over a whole stylesheet, revisiting each
//! declaration until nested calls are fully resolved.

pub mod color;
pub mod config;
pub mod error;
pub mod logging;
pub mod rewrite;
mod scan;
pub mod stylesheet;
pub mod transform;
pub mod validate;
pub mod value;

pub use color::{Hsl, Rgb};
pub use config::Config;
pub use error::{Diagnostic, Error, Result};
pub use logging::LogLevel;
pub use rewrite::{RewriteOutcome, rewrite_value};
pub use stylesheet::{Processed, Processor, Warning};
pub use value::ValueTree;
