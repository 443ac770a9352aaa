//! Typed access to the loosely-structured version documents returned by the
//! store metadata service.
//!
//! - [`cursor`] walks dotted paths through value wrappers, keeping absent and
//!   null apart.
//! - [`Field`] and [`BINDINGS`] name the scalar fields of a version document
//!   and the decoder each one is read through.

mod binding;
pub mod cursor;
mod error;

pub use binding::{BINDINGS, Decoder, Field, PathBinding};
pub use cursor::{Leaf, WRAPPER_KEY};
pub use error::DocumentError;
