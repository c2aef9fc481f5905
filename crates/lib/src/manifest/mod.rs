//! The dependency manifest text format.
//!
//! A manifest records the build a file was made for and every project that build
//! depends on, in a form that is both readable and parseable:
//!
//! ```text
//! ### File created: 2024-03-01 09:30:00
//! ### Project: app
//! ### Build: 42
//! ### SVN: svn://repo/app/trunk     (rev: 1234)
//!
//! lib
//!    Added by: app
//!    Build: 17
//!    SVN/GIT: svn://repo/lib/trunk     (rev: 1200)
//!
//! ```
//!
//! Lines starting with `#` form the header. An unindented line starts an entry and
//! indented lines continue it. [`render`] and [`parse`] are inverse up to the
//! creation timestamp.

mod parse;
mod render;
mod types;

pub use parse::{ParseError, parse};
pub use render::render;
pub use types::*;
