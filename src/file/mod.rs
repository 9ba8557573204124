//! PE container access for .NET modules.
//!
//! This module wraps a PE/COFF image and exposes what the metadata loader and the writer need
//! from it: the CLR runtime header location, section-based address translation, the PE checksum
//! field and the certificate directory. Header parsing is delegated to `goblin`; the raw bytes
//! come from a [`Backend`], which is a read-only memory mapping for files on disk and an owned
//! buffer otherwise.
//!
//! # Key Components
//!
//! - [`File`] - A loaded PE image together with its parsed headers
//! - [`Backend`] - Source of the raw image bytes
//! - [`io`] - Little-endian read/write helpers shared by all binary structures
//! - [`parser`] - Cursor-based reader for sequential headers
//!
//! # Examples
//!
//! ```rust,no_run
//! use publicizer::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("MyAssembly.dll"))?;
//!
//! let (clr_rva, clr_size) = file.clr();
//! let clr_offset = file.rva_to_offset(clr_rva)?;
//! let clr_data = file.data_slice(clr_offset, clr_size)?;
//! println!("CLR header starts with: {:02x?}", &clr_data[0..8]);
//! # Ok::<(), publicizer::Error>(())
//! ```

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use crate::{
    Error::{Empty, GoblinErr},
    Result,
};
use goblin::pe::{section_table::SectionTable, PE};
use memory::Memory;
use ouroboros::self_referencing;
use physical::Physical;

/// Size of the PE signature (`PE\0\0`) that precedes the COFF header.
const PE_SIGNATURE_SIZE: usize = 4;
/// Size of the COFF file header.
const COFF_HEADER_SIZE: usize = 20;
/// Offset of `CheckSum` within the optional header, identical for PE32 and PE32+.
const OPTIONAL_HEADER_CHECKSUM_OFFSET: usize = 64;

/// Source of the raw bytes of a PE image.
///
/// Implementations must be thread-safe so that a loaded [`File`] can be shared freely.
pub trait Backend: Send + Sync {
    /// Returns a bounds-checked slice of `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

#[self_referencing]
/// A loaded PE file that carries a CLR runtime header.
///
/// Loading fails unless the image has an optional header and a non-empty CLR runtime header
/// data directory, so every accessor below can rely on both being present.
///
/// # Examples
///
/// ```rust,no_run
/// use publicizer::File;
///
/// let data = std::fs::read("MyAssembly.dll")?;
/// let file = File::from_mem(data)?;
///
/// for section in file.sections() {
///     let name = std::str::from_utf8(&section.name)
///         .unwrap_or("<invalid>")
///         .trim_end_matches('\0');
///     println!("{name} at RVA 0x{:x}", section.virtual_address);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
    /// The parsed PE structure, referencing the data.
    #[borrows(data)]
    #[not_covariant]
    pe: PE<'this>,
}

impl File {
    /// Loads and memory-maps the PE file at `file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is empty, is not a PE image or has no
    /// CLR runtime header.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Loads a PE image from an owned buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty, is not a PE image or has no CLR runtime header.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let data = Box::new(data);

        File::try_new(data, |data| match PE::parse(data.data()) {
            Ok(pe) => match pe.header.optional_header {
                Some(optional_header) => {
                    match optional_header.data_directories.get_clr_runtime_header() {
                        Some(clr) if clr.virtual_address != 0 && clr.size != 0 => Ok(pe),
                        _ => Err(malformed_error!(
                            "File does not have a CLR runtime header directory"
                        )),
                    }
                }
                None => Err(malformed_error!("File does not have an OptionalHeader")),
            },
            Err(error) => Err(GoblinErr(error)),
        })
    }

    /// Returns the total size of the loaded image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_data(|data| data.len())
    }

    /// Returns `true` if the image has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the RVA and size (in bytes) of the CLR runtime header.
    #[must_use]
    pub fn clr(&self) -> (usize, usize) {
        self.with_pe(|pe| {
            pe.header
                .optional_header
                .and_then(|optional_header| {
                    optional_header
                        .data_directories
                        .get_clr_runtime_header()
                        .map(|clr| (clr.virtual_address as usize, clr.size as usize))
                })
                // Checked in `load`, a File without a CLR directory is never constructed.
                .unwrap_or_default()
        })
    }

    /// Returns the RVA and size of the attribute certificate table (Authenticode), if any.
    #[must_use]
    pub fn certificate_table(&self) -> Option<(u32, u32)> {
        self.with_pe(|pe| {
            pe.header
                .optional_header
                .and_then(|optional_header| {
                    optional_header
                        .data_directories
                        .get_certificate_table()
                        .map(|dir| (dir.virtual_address, dir.size))
                })
                .filter(|(address, size)| *address != 0 && *size != 0)
        })
    }

    /// Returns the value of the optional header's `CheckSum` field.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        self.with_pe(|pe| {
            pe.header
                .optional_header
                .map(|optional_header| optional_header.windows_fields.check_sum)
                .unwrap_or_default()
        })
    }

    /// Returns the file offset of the optional header's `CheckSum` field.
    #[must_use]
    pub fn checksum_offset(&self) -> usize {
        let pe_pointer = self.with_pe(|pe| pe.header.dos_header.pe_pointer as usize);
        pe_pointer + PE_SIGNATURE_SIZE + COFF_HEADER_SIZE + OPTIONAL_HEADER_CHECKSUM_OFFSET
    }

    /// Returns an iterator over the section headers of the PE file.
    pub fn sections(&self) -> impl Iterator<Item = &SectionTable> {
        self.with_pe(|pe| pe.sections.iter())
    }

    /// Returns the complete image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.with_data(|data| data.data())
    }

    /// Returns `len` bytes of the image starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the range leaves the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.with_data(|data| data.data_slice(offset, len))
    }

    /// Translates a relative virtual address into a file offset using the section table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if no section maps `rva` or a section header is
    /// inconsistent.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        let rva_u32 =
            u32::try_from(rva).map_err(|_| malformed_error!("RVA too large to fit in u32: {}", rva))?;

        self.with_pe(|pe| {
            for section in &pe.sections {
                let span = if section.virtual_size == 0 {
                    section.size_of_raw_data
                } else {
                    section.virtual_size
                };

                let Some(section_max) = section.virtual_address.checked_add(span) else {
                    return Err(malformed_error!(
                        "Section malformed, causing integer overflow - {} + {}",
                        section.virtual_address,
                        span
                    ));
                };

                if section.virtual_address <= rva_u32 && rva_u32 < section_max {
                    let delta = rva_u32 - section.virtual_address;
                    if delta >= section.size_of_raw_data {
                        return Err(malformed_error!(
                            "RVA 0x{:x} points into uninitialized section data",
                            rva
                        ));
                    }

                    return Ok(section.pointer_to_raw_data as usize + delta as usize);
                }
            }

            Err(malformed_error!(
                "RVA could not be converted to offset - {}",
                rva
            ))
        })
    }
}
