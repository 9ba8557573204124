//! The `MethodPtr` table (0x05): method indirection used by uncompressed metadata.

mod raw;

pub use raw::*;
