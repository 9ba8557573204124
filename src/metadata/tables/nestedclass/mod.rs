//! The `NestedClass` table (0x29): which type encloses which.

mod raw;

pub use raw::*;
