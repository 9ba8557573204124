//! Visibility and accessibility classifiers.
//!
//! Types use two disjoint vocabularies in the same three bits: `NotPublic`/`Public` for
//! top-level types and the `Nested*` values for nested ones. Methods and fields share a single
//! seven-value accessibility vocabulary.

use strum::Display;

use crate::metadata::tables::{FieldAttributes, MethodAccessFlags, TypeAttributes};

/// The visibility sub-field of a type's attribute word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum TypeVisibility {
    /// Top-level, assembly only
    NotPublic,
    /// Top-level, everywhere
    Public,
    /// Nested, everywhere the enclosing type is visible
    NestedPublic,
    /// Nested, enclosing type only
    NestedPrivate,
    /// Nested, enclosing type and its subtypes
    NestedFamily,
    /// Nested, assembly only
    NestedAssembly,
    /// Nested, subtypes inside the assembly
    NestedFamAndAssem,
    /// Nested, subtypes or the assembly
    NestedFamOrAssem,
}

impl TypeVisibility {
    /// Classify a `TypeDef` attribute word.
    #[must_use]
    pub fn from_flags(flags: u32) -> Self {
        match flags & TypeAttributes::VISIBILITY_MASK {
            TypeAttributes::NOT_PUBLIC => TypeVisibility::NotPublic,
            TypeAttributes::PUBLIC => TypeVisibility::Public,
            TypeAttributes::NESTED_PUBLIC => TypeVisibility::NestedPublic,
            TypeAttributes::NESTED_PRIVATE => TypeVisibility::NestedPrivate,
            TypeAttributes::NESTED_FAMILY => TypeVisibility::NestedFamily,
            TypeAttributes::NESTED_ASSEMBLY => TypeVisibility::NestedAssembly,
            TypeAttributes::NESTED_FAM_AND_ASSEM => TypeVisibility::NestedFamAndAssem,
            _ => TypeVisibility::NestedFamOrAssem,
        }
    }

    /// The encoded visibility bits
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            TypeVisibility::NotPublic => TypeAttributes::NOT_PUBLIC,
            TypeVisibility::Public => TypeAttributes::PUBLIC,
            TypeVisibility::NestedPublic => TypeAttributes::NESTED_PUBLIC,
            TypeVisibility::NestedPrivate => TypeAttributes::NESTED_PRIVATE,
            TypeVisibility::NestedFamily => TypeAttributes::NESTED_FAMILY,
            TypeVisibility::NestedAssembly => TypeAttributes::NESTED_ASSEMBLY,
            TypeVisibility::NestedFamAndAssem => TypeAttributes::NESTED_FAM_AND_ASSEM,
            TypeVisibility::NestedFamOrAssem => TypeAttributes::NESTED_FAM_OR_ASSEM,
        }
    }

    /// Whether this value belongs to the nested vocabulary
    #[must_use]
    pub fn is_nested_vocabulary(self) -> bool {
        !matches!(self, TypeVisibility::NotPublic | TypeVisibility::Public)
    }

    /// The maximal visibility for a type with the given nesting.
    #[must_use]
    pub fn public_for(is_nested: bool) -> Self {
        if is_nested {
            TypeVisibility::NestedPublic
        } else {
            TypeVisibility::Public
        }
    }
}

/// The accessibility sub-field of a method's or field's attribute word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum MemberAccess {
    /// Not referenceable
    CompilerControlled,
    /// Declaring type only
    Private,
    /// Subtypes inside the assembly
    FamAndAssem,
    /// Assembly only
    Assembly,
    /// Declaring type and subtypes
    Family,
    /// Subtypes or the assembly
    FamOrAssem,
    /// Everywhere
    Public,
}

impl MemberAccess {
    /// Classify a `MethodDef` or `Field` attribute word.
    #[must_use]
    pub fn from_flags(flags: u16) -> Self {
        let access = MethodAccessFlags::from_method_flags(u32::from(flags));
        if access == MethodAccessFlags::PRIVATE {
            MemberAccess::Private
        } else if access == MethodAccessFlags::FAM_AND_ASSEM {
            MemberAccess::FamAndAssem
        } else if access == MethodAccessFlags::ASSEM {
            MemberAccess::Assembly
        } else if access == MethodAccessFlags::FAMILY {
            MemberAccess::Family
        } else if access == MethodAccessFlags::FAM_OR_ASSEM {
            MemberAccess::FamOrAssem
        } else if access == MethodAccessFlags::PUBLIC {
            MemberAccess::Public
        } else {
            // 0 and the reserved value 7
            MemberAccess::CompilerControlled
        }
    }

    /// The encoded accessibility bits
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn bits(self) -> u16 {
        let bits = match self {
            MemberAccess::CompilerControlled => FieldAttributes::COMPILER_CONTROLLED,
            MemberAccess::Private => FieldAttributes::PRIVATE,
            MemberAccess::FamAndAssem => FieldAttributes::FAM_AND_ASSEM,
            MemberAccess::Assembly => FieldAttributes::ASSEMBLY,
            MemberAccess::Family => FieldAttributes::FAMILY,
            MemberAccess::FamOrAssem => FieldAttributes::FAM_OR_ASSEM,
            MemberAccess::Public => FieldAttributes::PUBLIC,
        };
        // access values are below 8
        bits as u16
    }
}
