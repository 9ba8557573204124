// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
// - 'file/physical.rs' uses mmap to map the input into memory
// - 'write/output.rs' uses mmap to write the output

//! # publicizer
//!
//! Makes every type, method and field of a .NET module public.
//!
//! A module is loaded from a managed PE/CLI image into a declaration graph, every declaration's
//! visibility is rewritten to its public value, and the result is written back. Only the three
//! visibility bits of each attribute word change; names, tokens, signatures, member order and
//! nesting stay exactly as they were, so code compiled against the publicized module also runs
//! against the original.
//!
//! ## Features
//!
//! - **Memory-mapped input and output** - The input is never copied into the heap to be parsed,
//!   the output is mapped and committed atomically
//! - **Exact table layout** - All 45 ECMA-335 tables are sized, so the tables stream can be
//!   re-emitted byte for byte
//! - **Mixed-mode aware** - Modules with native code are patched in place instead of re-emitted
//! - **Tolerant loading** - Dangling member references become absent slots instead of errors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use publicizer::prelude::*;
//!
//! let mut module = Module::from_file("Library.dll".as_ref())?;
//! let stats = publicize(&mut module, &PublicizeOptions::default());
//! println!("{} declarations made public", stats.total());
//!
//! let report = write_module_to_file(&module, "Library_publicized.dll", &WriteOptions::default())?;
//! for warning in &report.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok::<(), publicizer::Error>(())
//! ```
//!
//! ## Write strategies
//!
//! | Payload      | Strategy                   | Checksum      | Warning                  |
//! |--------------|----------------------------|---------------|--------------------------|
//! | IL-only      | [`WriteStrategy::Managed`]     | recomputed    | none                     |
//! | Mixed-mode   | [`WriteStrategy::NativeAware`] | left as found | native content preserved |
//!
//! Either strategy warns if a strong-name or Authenticode signature is invalidated.
//!
//! ## Fuzzing
//!
//! ```bash
//! cargo +nightly fuzz run module --release
//! ```

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use publicizer::prelude::*;
///
/// let module = Module::from_file("Library.dll".as_ref())?;
/// println!("{} types", module.stats().types);
/// # Ok::<(), publicizer::Error>(())
/// ```
pub mod prelude;

/// Loading of ECMA-335 metadata into a declaration graph
///
/// # Key Components
///
/// - [`Module`] - A loaded module and its types
/// - [`metadata::typesystem`] - Declarations, visibility classifiers and absent slots
/// - [`metadata::payload`] - IL-only versus mixed-mode classification
/// - [`metadata::tables`] - Table ids, index widths and the column schema of every table
///
/// # Examples
///
/// ```rust,no_run
/// use publicizer::Module;
///
/// let module = Module::from_file("Library.dll".as_ref())?;
/// for ty in module.all_types() {
///     println!("{:<40} {:?}", ty.full_name(), ty.visibility());
/// }
/// # Ok::<(), publicizer::Error>(())
/// ```
pub mod metadata;

/// Rewriting declaration visibility
pub mod publicize;

/// Writing a publicized module back to disk
///
/// # Examples
///
/// ```rust,no_run
/// use publicizer::{write_module_to_file, Module, WriteOptions, WriteStrategy};
///
/// let module = Module::from_file("Mixed.dll".as_ref())?;
/// let options = WriteOptions {
///     strategy: Some(WriteStrategy::NativeAware),
/// };
/// let report = write_module_to_file(&module, "out/Mixed.dll", &options)?;
/// println!("{} rows changed, wrote {}", report.rows_changed, report.path.display());
/// # Ok::<(), publicizer::Error>(())
/// ```
pub mod write;

/// `publicizer` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `publicizer` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use publicizer::{Error, Module};
///
/// match Module::from_file(std::path::Path::new("native.dll")) {
///     Ok(module) => println!("Loaded {}", module.name()),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// A loaded .NET module.
///
/// See [`metadata::Module`] for loading and traversal.
pub use metadata::{Module, ModuleStats};

/// The visibility rewrite.
pub use publicize::{publicize, PublicizeOptions, PublicizeStats};

/// The module writer and its report.
pub use write::{write_module_to_file, WriteOptions, WriteReport, WriteStrategy, WriteWarning};

/// Low-level PE access and byte parsing.
pub use file::{parser::Parser, File};
