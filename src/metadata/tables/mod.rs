//! Metadata tables.
//!
//! [`types`] holds what every table shares. The submodules hold typed rows for the tables the
//! publicizer reads directly; all other tables travel through [`GenericRow`].
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II, Section 22 - Metadata logical format: tables

mod field;
mod fieldptr;
mod methoddef;
mod methodptr;
mod module;
mod nestedclass;
mod typedef;
mod types;

pub use field::*;
pub use fieldptr::*;
pub use methoddef::*;
pub use methodptr::*;
pub use module::*;
pub use nestedclass::*;
pub use typedef::*;
pub use types::*;
