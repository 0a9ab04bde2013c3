//! High-performance collection types for hull construction and boundary assembly.
//!
//! Type aliases over `rustc-hash` and `smallvec` that keep small index tuples
//! on the stack and hash integer keys quickly.

mod aliases;
mod buffers;
mod helpers;

pub use aliases::*;
pub use buffers::*;
pub use helpers::*;
