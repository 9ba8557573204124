//! The CLR 2.0 (COR20) runtime header.
//!
//! Data directory 14 of a .NET PE image points at this 72-byte structure. It locates the
//! metadata root and describes the native parts of the image: vtable fixups used by mixed-mode
//! code, the strong name signature, and the managed native header of ReadyToRun images. The
//! loader uses it to decide whether the payload is pure IL.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II, Section 25.3.3 - CLI Header

use bitflags::bitflags;

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// Size of the COR20 header, also the expected value of its `cb` field.
pub const COR20_HEADER_SIZE: usize = 72;

bitflags! {
    /// Runtime flags of the COR20 header (`COMIMAGE_FLAGS_*`).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CorFlags: u32 {
        /// The image contains only IL code
        const IL_ONLY = 0x0000_0001;
        /// The image must be loaded into a 32-bit process
        const REQUIRED_32BIT = 0x0000_0002;
        /// The image is an IL library
        const IL_LIBRARY = 0x0000_0004;
        /// The image carries a strong name signature
        const STRONG_NAME_SIGNED = 0x0000_0008;
        /// The entry point token is a native RVA instead of a method token
        const NATIVE_ENTRYPOINT = 0x0000_0010;
        /// The runtime should track debug data
        const TRACK_DEBUG_DATA = 0x0001_0000;
        /// The image prefers a 32-bit process
        const PREFERRED_32BIT = 0x0002_0000;
    }
}

/// The parsed COR20 header.
#[derive(Clone, Debug)]
pub struct Cor20Header {
    /// Size of the header in bytes, always 72
    pub cb: u32,
    /// Minimum major runtime version
    pub major_runtime_version: u16,
    /// Minimum minor runtime version
    pub minor_runtime_version: u16,
    /// RVA of the metadata root
    pub meta_data_rva: u32,
    /// Size of the metadata
    pub meta_data_size: u32,
    /// Raw runtime flags, see [`CorFlags`]
    pub flags: u32,
    /// Entry point method token, or native RVA with [`CorFlags::NATIVE_ENTRYPOINT`]
    pub entry_point_token: u32,
    /// RVA of the managed resources
    pub resource_rva: u32,
    /// Size of the managed resources
    pub resource_size: u32,
    /// RVA of the strong name signature
    pub strong_name_signature_rva: u32,
    /// Size of the strong name signature
    pub strong_name_signature_size: u32,
    /// Reserved, always zero in conforming images
    pub code_manager_table_rva: u32,
    /// Reserved, always zero in conforming images
    pub code_manager_table_size: u32,
    /// RVA of the vtable fixup array
    pub vtable_fixups_rva: u32,
    /// Size of the vtable fixup array
    pub vtable_fixups_size: u32,
    /// RVA of the export address table jumps
    pub export_address_table_jmp_rva: u32,
    /// Size of the export address table jumps
    pub export_address_table_jmp_size: u32,
    /// RVA of the managed native (ReadyToRun) header
    pub managed_native_header_rva: u32,
    /// Size of the managed native (ReadyToRun) header
    pub managed_native_header_size: u32,
}

impl Cor20Header {
    /// Parse a COR20 header from the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than 72 bytes and
    /// [`crate::Error::Malformed`] if the header fails basic consistency checks.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < COR20_HEADER_SIZE {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if cb as usize != COR20_HEADER_SIZE {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;
        if major_runtime_version == 0 || major_runtime_version > 10 {
            return Err(malformed_error!(
                "Invalid major runtime version: {}",
                major_runtime_version
            ));
        }

        let meta_data_rva = parser.read_le::<u32>()?;
        if meta_data_rva == 0 {
            return Err(malformed_error!("Metadata RVA cannot be zero"));
        }

        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_size == 0 {
            return Err(malformed_error!("Metadata size cannot be zero"));
        } else if meta_data_size > 0x1000_0000 {
            return Err(malformed_error!(
                "Metadata size {} exceeds reasonable limit (256MB)",
                meta_data_size
            ));
        }

        // Unknown flag bits are kept verbatim, the writer never touches this header
        let flags = parser.read_le::<u32>()?;
        let entry_point_token = parser.read_le::<u32>()?;

        let resource_rva = parser.read_le::<u32>()?;
        let resource_size = parser.read_le::<u32>()?;
        if (resource_rva == 0) != (resource_size == 0) {
            return Err(malformed_error!("Resource values are invalid"));
        }

        let strong_name_signature_rva = parser.read_le::<u32>()?;
        let strong_name_signature_size = parser.read_le::<u32>()?;
        if (strong_name_signature_rva == 0) != (strong_name_signature_size == 0) {
            return Err(malformed_error!("Strong name values are invalid"));
        }

        let code_manager_table_rva = parser.read_le::<u32>()?;
        let code_manager_table_size = parser.read_le::<u32>()?;

        let vtable_fixups_rva = parser.read_le::<u32>()?;
        let vtable_fixups_size = parser.read_le::<u32>()?;
        if (vtable_fixups_rva == 0) != (vtable_fixups_size == 0) {
            return Err(malformed_error!("VTable fixups are invalid"));
        }

        let export_address_table_jmp_rva = parser.read_le::<u32>()?;
        let export_address_table_jmp_size = parser.read_le::<u32>()?;

        let managed_native_header_rva = parser.read_le::<u32>()?;
        let managed_native_header_size = parser.read_le::<u32>()?;

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags,
            entry_point_token,
            resource_rva,
            resource_size,
            strong_name_signature_rva,
            strong_name_signature_size,
            code_manager_table_rva,
            code_manager_table_size,
            vtable_fixups_rva,
            vtable_fixups_size,
            export_address_table_jmp_rva,
            export_address_table_jmp_size,
            managed_native_header_rva,
            managed_native_header_size,
        })
    }

    /// The known runtime flags of this header.
    #[must_use]
    pub fn cor_flags(&self) -> CorFlags {
        CorFlags::from_bits_truncate(self.flags)
    }

    /// Returns `true` if the image contains vtable fixups (mixed-mode thunks).
    #[must_use]
    pub fn has_vtable_fixups(&self) -> bool {
        self.vtable_fixups_rva != 0 && self.vtable_fixups_size != 0
    }

    /// Returns `true` if the image carries a ReadyToRun / NGEN managed native header.
    #[must_use]
    pub fn has_managed_native_header(&self) -> bool {
        self.managed_native_header_rva != 0 && self.managed_native_header_size != 0
    }

    /// Returns `true` if the image exports unmanaged entry points through jump thunks.
    #[must_use]
    pub fn has_export_address_table_jumps(&self) -> bool {
        self.export_address_table_jmp_rva != 0 && self.export_address_table_jmp_size != 0
    }
}
