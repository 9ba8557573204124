//! Metadata parsing and the declaration model of a .NET module.
//!
//! This module reads as much of the ECMA-335 metadata as publicizing requires: the CLR runtime
//! header, the metadata root, the `#Strings` and `#GUID` heaps and the tables stream. Every
//! table is sized so the stream layout is known exactly; the declaration tables are decoded
//! into typed rows and then into the [`typesystem`] graph owned by a [`Module`].
//!
//! # Key Components
//!
//! - [`Module`] - A loaded module with its declaration graph
//! - [`typesystem`] - Types, methods, fields and their visibility classifiers
//! - [`payload`] - Pure CIL versus mixed-mode classification
//! - [`tables`] - Table ids, index widths, the column schema and typed rows
//! - [`streams`] - Heaps and the tables stream header
//! - [`token`] - Metadata table row references
//!
//! # Examples
//!
//! ```rust,no_run
//! use publicizer::Module;
//!
//! let module = Module::from_file("Library.dll".as_ref())?;
//! println!("{} ({})", module.name(), module.runtime_version());
//! if !module.payload().is_il_only() {
//!     for region in module.payload().native_regions() {
//!         println!("native: {region}");
//!     }
//! }
//! # Ok::<(), publicizer::Error>(())
//! ```

/// Implementation of the Header of CIL
pub mod cor20header;
/// Classification of native content
pub mod payload;
/// Implementation of the root metadata structure
pub mod root;
/// Implementation of the metadata streams (tables, heaps)
pub mod streams;
/// Implementation of the .NET metadata tables
pub mod tables;
/// Commonly used metadata token type
pub mod token;
/// Declarations and their visibility
pub mod typesystem;

mod loader;
mod module;

pub use loader::MetadataLayout;
pub use module::{Module, ModuleStats};
