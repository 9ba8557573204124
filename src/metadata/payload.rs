//! Classification of a module's executable content.
//!
//! A module whose code is entirely CIL can have its metadata re-emitted freely. Anything else
//! (mixed-mode C++/CLI images, ReadyToRun images, vtable fixups, export thunks, native method
//! bodies) holds native regions that the writer must leave byte-for-byte intact.

use std::fmt;

use crate::metadata::{
    cor20header::{Cor20Header, CorFlags},
    token::Token,
    typesystem::MethodDeclaration,
};

/// One reason why a module is not pure CIL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeRegion {
    /// The `ILONLY` runtime flag is not set
    NotIlOnly,
    /// The image carries a vtable fixup table
    VTableFixups {
        /// RVA of the fixup table
        rva: u32,
        /// Size of the fixup table
        size: u32,
    },
    /// The entry point is a native RVA instead of a method token
    NativeEntryPoint {
        /// RVA of the native entry point
        rva: u32,
    },
    /// The image carries precompiled native code (ReadyToRun / NGEN header)
    ManagedNativeHeader {
        /// RVA of the header
        rva: u32,
        /// Size of the header
        size: u32,
    },
    /// Unmanaged exports through export address table jump thunks
    ExportAddressTableJumps {
        /// RVA of the jump table
        rva: u32,
        /// Size of the jump table
        size: u32,
    },
    /// A method body is native code
    NativeMethod {
        /// Token of the method
        token: Token,
        /// RVA of the native body
        rva: u32,
    },
}

impl fmt::Display for NativeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeRegion::NotIlOnly => write!(f, "ILONLY flag not set"),
            NativeRegion::VTableFixups { rva, size } => {
                write!(f, "vtable fixups at RVA 0x{rva:08X} ({size} bytes)")
            }
            NativeRegion::NativeEntryPoint { rva } => {
                write!(f, "native entry point at RVA 0x{rva:08X}")
            }
            NativeRegion::ManagedNativeHeader { rva, size } => {
                write!(f, "managed native header at RVA 0x{rva:08X} ({size} bytes)")
            }
            NativeRegion::ExportAddressTableJumps { rva, size } => {
                write!(f, "export address table jumps at RVA 0x{rva:08X} ({size} bytes)")
            }
            NativeRegion::NativeMethod { token, rva } => {
                write!(f, "native method {token} at RVA 0x{rva:08X}")
            }
        }
    }
}

/// Whether a module's executable content is pure CIL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Pure CIL, no native content
    IlOnly,
    /// Native content is present; never empty
    Mixed(Vec<NativeRegion>),
}

impl Payload {
    /// Classify a module from its runtime header and its methods.
    #[must_use]
    pub fn classify<'a>(
        header: &Cor20Header,
        methods: impl IntoIterator<Item = &'a MethodDeclaration>,
    ) -> Payload {
        let mut regions = Vec::new();
        let flags = header.cor_flags();

        if !flags.contains(CorFlags::IL_ONLY) {
            regions.push(NativeRegion::NotIlOnly);
        }
        if header.has_vtable_fixups() {
            regions.push(NativeRegion::VTableFixups {
                rva: header.vtable_fixups_rva,
                size: header.vtable_fixups_size,
            });
        }
        if flags.contains(CorFlags::NATIVE_ENTRYPOINT) {
            regions.push(NativeRegion::NativeEntryPoint {
                rva: header.entry_point_token,
            });
        }
        if header.has_managed_native_header() {
            regions.push(NativeRegion::ManagedNativeHeader {
                rva: header.managed_native_header_rva,
                size: header.managed_native_header_size,
            });
        }
        if header.has_export_address_table_jumps() {
            regions.push(NativeRegion::ExportAddressTableJumps {
                rva: header.export_address_table_jmp_rva,
                size: header.export_address_table_jmp_size,
            });
        }

        regions.extend(
            methods
                .into_iter()
                .filter(|method| method.is_native())
                .map(|method| NativeRegion::NativeMethod {
                    token: method.token,
                    rva: method.rva,
                }),
        );

        if regions.is_empty() {
            Payload::IlOnly
        } else {
            Payload::Mixed(regions)
        }
    }

    /// Returns `true` for [`Payload::IlOnly`]
    #[must_use]
    pub fn is_il_only(&self) -> bool {
        matches!(self, Payload::IlOnly)
    }

    /// The native regions found, empty for [`Payload::IlOnly`]
    #[must_use]
    pub fn native_regions(&self) -> &[NativeRegion] {
        match self {
            Payload::IlOnly => &[],
            Payload::Mixed(regions) => regions,
        }
    }
}
