//! # publicizer Prelude
//!
//! The types needed to load, publicize and write a module.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all publicizer operations
pub use crate::Error;

/// The result type used throughout publicizer
pub use crate::Result;

// ================================================================================================
// Loading
// ================================================================================================

/// A loaded module and its declaration counts
pub use crate::{Module, ModuleStats};

/// Low-level PE access
pub use crate::File;

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Pure CIL versus mixed-mode classification
pub use crate::metadata::payload::{NativeRegion, Payload};

// ================================================================================================
// Declarations
// ================================================================================================

/// Declaration graph
pub use crate::metadata::typesystem::{
    FieldDeclaration, MemberAccess, MethodDeclaration, Slot, TypeDeclaration, TypeVisibility,
};

// ================================================================================================
// Publicizing and Writing
// ================================================================================================

/// The visibility rewrite
pub use crate::{publicize, PublicizeOptions, PublicizeStats};

/// The module writer
pub use crate::{write_module_to_file, WriteOptions, WriteReport, WriteStrategy, WriteWarning};
