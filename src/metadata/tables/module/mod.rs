//! The `Module` table (0x00): the single row describing this module.

mod raw;

pub use raw::*;
