//! The `FieldPtr` table (0x03): field indirection used by uncompressed metadata.

mod raw;

pub use raw::*;
