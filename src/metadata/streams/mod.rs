//! Metadata streams: the stream directory, the heaps the publicizer reads and the tables
//! stream.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II, Section 24.2.2 - Stream header

mod guid;
mod streamheader;
mod strings;
mod tablesheader;

pub use guid::Guid;
pub use streamheader::{StreamHeader, KNOWN_STREAMS};
pub use strings::Strings;
pub use tablesheader::{TableLayout, TablesHeader, HEAP_SIZES_EXTRA_DATA};
