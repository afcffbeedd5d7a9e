//! Configuration types
//!
//! Link settings fixed at build time. Every constructor is `const` so a
//! link can be placed in a `static`.

pub mod types;

pub use types::*;
