use strum::{Display, EnumCount, EnumIter};

/// Identifiers of the ECMA-335 metadata tables that can appear in a module's tables stream.
///
/// The discriminant is the table number used in the valid-table mask and in the high byte of
/// a [`crate::metadata::token::Token`]. The `*Ptr` tables and the `EncLog`/`EncMap` tables only
/// appear in uncompressed (`#-`) streams.
///
/// # Reference
/// - ECMA-335 6th Edition, Partition II, Section 22 - Metadata logical format: tables
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash, Display)]
pub enum TableId {
    /// Module definition, exactly one row
    Module = 0x00,
    /// References to types in other modules or assemblies
    TypeRef = 0x01,
    /// Type definitions
    TypeDef = 0x02,
    /// Indirection into the `Field` table
    FieldPtr = 0x03,
    /// Field definitions
    Field = 0x04,
    /// Indirection into the `MethodDef` table
    MethodPtr = 0x05,
    /// Method definitions
    MethodDef = 0x06,
    /// Indirection into the `Param` table
    ParamPtr = 0x07,
    /// Parameter definitions
    Param = 0x08,
    /// Interfaces implemented by types
    InterfaceImpl = 0x09,
    /// References to fields and methods of other types
    MemberRef = 0x0A,
    /// Compile-time constants of fields, parameters and properties
    Constant = 0x0B,
    /// Custom attribute instances
    CustomAttribute = 0x0C,
    /// Marshalling descriptors of fields and parameters
    FieldMarshal = 0x0D,
    /// Declarative security
    DeclSecurity = 0x0E,
    /// Explicit type layout
    ClassLayout = 0x0F,
    /// Explicit field offsets
    FieldLayout = 0x10,
    /// Stand-alone signatures (locals, indirect calls)
    StandAloneSig = 0x11,
    /// Type to event list mapping
    EventMap = 0x12,
    /// Indirection into the `Event` table
    EventPtr = 0x13,
    /// Event definitions
    Event = 0x14,
    /// Type to property list mapping
    PropertyMap = 0x15,
    /// Indirection into the `Property` table
    PropertyPtr = 0x16,
    /// Property definitions
    Property = 0x17,
    /// Accessor methods of events and properties
    MethodSemantics = 0x18,
    /// Explicit method overrides
    MethodImpl = 0x19,
    /// References to other modules
    ModuleRef = 0x1A,
    /// Type specifications
    TypeSpec = 0x1B,
    /// P/Invoke mappings
    ImplMap = 0x1C,
    /// Initial data of static fields
    FieldRVA = 0x1D,
    /// Edit-and-continue log
    EncLog = 0x1E,
    /// Edit-and-continue token map
    EncMap = 0x1F,
    /// Assembly manifest
    Assembly = 0x20,
    /// Unused, processor of the assembly
    AssemblyProcessor = 0x21,
    /// Unused, OS of the assembly
    AssemblyOS = 0x22,
    /// References to other assemblies
    AssemblyRef = 0x23,
    /// Unused, processor of a referenced assembly
    AssemblyRefProcessor = 0x24,
    /// Unused, OS of a referenced assembly
    AssemblyRefOS = 0x25,
    /// Files of a multi-module assembly
    File = 0x26,
    /// Types exported from other modules
    ExportedType = 0x27,
    /// Manifest resources
    ManifestResource = 0x28,
    /// Nested type to enclosing type mapping
    NestedClass = 0x29,
    /// Generic parameters
    GenericParam = 0x2A,
    /// Generic method instantiations
    MethodSpec = 0x2B,
    /// Constraints of generic parameters
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// Map a table number from the valid-table mask to its id.
    #[must_use]
    pub fn from_index(index: u8) -> Option<TableId> {
        use strum::IntoEnumIterator;

        TableId::iter().find(|id| *id as u8 == index)
    }
}
