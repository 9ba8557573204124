use thiserror::Error;

use crate::metadata::tables::TableId;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every failure this library can return.
///
/// # Error Categories
///
/// ## Loading
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of a buffer
/// - [`Error::NotSupported`] - Valid container, but a layout this crate does not handle
/// - [`Error::UnknownTable`] - The tables stream announces a table outside ECMA-335
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::GoblinErr`] - PE parsing errors from the goblin crate
///
/// ## Writing
/// - [`Error::WriteFailed`] - The output file could not be created, mapped or committed
/// - [`Error::LayoutMismatch`] - Re-emitted metadata does not fit the original layout
///
/// ## Shared
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// # Examples
///
/// ```rust,no_run
/// use publicizer::{Error, Module};
/// use std::path::Path;
///
/// match Module::from_file(Path::new("assembly.dll")) {
///     Ok(module) => println!("Loaded {}", module.name()),
///     Err(Error::FileError(io_err)) => eprintln!("I/O error: {}", io_err),
///     Err(Error::Malformed { message, .. }) => eprintln!("Malformed file: {}", message),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// Includes the source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing or patching a buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file uses a layout that is not supported.
    #[error("This file type is not supported - {0}")]
    NotSupported(String),

    /// The valid-table mask of the tables stream references a table id that
    /// ECMA-335 does not define for this kind of stream.
    #[error("Unknown metadata table - 0x{0:02X}")]
    UnknownTable(u8),

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// The output file could not be produced.
    ///
    /// Covers creating the temporary file, sizing and mapping it, flushing
    /// and moving it onto the target path.
    #[error("Failed to write output - {message}")]
    WriteFailed {
        /// What went wrong
        message: String,
    },

    /// The re-emitted content of a table does not match the space the
    /// original layout reserved for it.
    #[error("Re-emitted {table:?} occupies {actual} bytes, layout reserves {expected}")]
    LayoutMismatch {
        /// The table that mismatched
        table: TableId,
        /// Bytes the original layout reserves
        expected: usize,
        /// Bytes that were produced
        actual: usize,
    },
}
