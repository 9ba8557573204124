//! The `Field` table (0x04): one row per field declared in the module.

mod raw;

pub use raw::*;

/// Flag values of the `Field.Flags` column
#[allow(non_snake_case)]
pub mod FieldAttributes {
    /// Mask of the access bits
    pub const FIELD_ACCESS_MASK: u32 = 0x0007;
    /// Member not referenceable
    pub const COMPILER_CONTROLLED: u32 = 0x0000;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0001;
    /// Accessible by sub-types only in this assembly
    pub const FAM_AND_ASSEM: u32 = 0x0002;
    /// Accessible by anyone in the assembly
    pub const ASSEMBLY: u32 = 0x0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u32 = 0x0004;
    /// Accessible by sub-types anywhere, plus anyone in the assembly
    pub const FAM_OR_ASSEM: u32 = 0x0005;
    /// Accessible by anyone
    pub const PUBLIC: u32 = 0x0006;
    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0010;
    /// Only assignable in a constructor
    pub const INIT_ONLY: u32 = 0x0020;
    /// Compile-time constant
    pub const LITERAL: u32 = 0x0040;
    /// Not serialized when the type is remoted
    pub const NOT_SERIALIZED: u32 = 0x0080;
    /// Field has an RVA
    pub const HAS_FIELD_RVA: u32 = 0x0100;
    /// Name has a special meaning
    pub const SPECIAL_NAME: u32 = 0x0200;
    /// Runtime checks the name encoding
    pub const RTSPECIAL_NAME: u32 = 0x0400;
    /// Field has marshalling information
    pub const HAS_FIELD_MARSHAL: u32 = 0x1000;
    /// Implementation is forwarded through PInvoke
    pub const PINVOKE_IMPL: u32 = 0x2000;
    /// Field has a default value
    pub const HAS_DEFAULT: u32 = 0x8000;
}
