//! Writing a publicized module back to disk.
//!
//! The output image always has the size and section layout of the source image, and no token,
//! heap offset or RVA moves. Two strategies exist:
//!
//! - [`WriteStrategy::Managed`] re-emits the whole tables stream from the declaration model
//!   and recomputes the PE checksum. It is chosen for pure-CIL modules.
//! - [`WriteStrategy::NativeAware`] copies the image and patches only the attribute words
//!   that changed. It is chosen for mixed-mode modules and is best effort: the native parts are
//!   preserved byte for byte, but whether they still agree with the rewritten metadata is not
//!   verified, so the report carries a [`WriteWarning::NativeContent`].
//!
//! Output goes to a temporary file next to the target and only replaces the target once it is
//! complete.
//!
//! # Examples
//!
//! ```rust,no_run
//! use publicizer::{publicize, write_module_to_file, Module, PublicizeOptions, WriteOptions};
//!
//! let mut module = Module::from_file("Library.dll".as_ref())?;
//! publicize(&mut module, &PublicizeOptions::default());
//!
//! let report = write_module_to_file(&module, "out/Library.dll", &WriteOptions::default())?;
//! for warning in &report.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok::<(), publicizer::Error>(())
//! ```

mod output;
mod patch;
mod pe;
mod tables;

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::{
    metadata::{
        cor20header::CorFlags,
        payload::{NativeRegion, Payload},
        typesystem::Slot,
        Module,
    },
    Result,
};

/// How a module is serialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum WriteStrategy {
    /// Re-emit the tables stream from the model
    Managed,
    /// Patch attribute words into an untouched copy of the image
    NativeAware,
}

impl WriteStrategy {
    /// The strategy a module with `payload` is written with by default.
    #[must_use]
    pub fn for_payload(payload: &Payload) -> Self {
        if payload.is_il_only() {
            WriteStrategy::Managed
        } else {
            WriteStrategy::NativeAware
        }
    }
}

/// Options of a write.
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteOptions {
    /// Force a strategy instead of deriving it from the payload
    pub strategy: Option<WriteStrategy>,
}

/// Something the caller should know about a completed write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteWarning {
    /// The module holds native content whose consistency with the output is not verified
    NativeContent(Vec<NativeRegion>),
    /// The strong-name signature no longer matches the image
    StrongNameSignature,
    /// The Authenticode signature no longer matches the image
    AuthenticodeSignature,
}

impl fmt::Display for WriteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteWarning::NativeContent(regions) => {
                write!(
                    f,
                    "module contains native content, output is best effort and may not load"
                )?;
                for region in regions {
                    write!(f, "\n  - {region}")?;
                }
                Ok(())
            }
            WriteWarning::StrongNameSignature => write!(
                f,
                "strong-name signature is invalidated, re-sign the module or skip verification"
            ),
            WriteWarning::AuthenticodeSignature => {
                write!(f, "Authenticode signature is invalidated")
            }
        }
    }
}

/// Outcome of a successful write.
#[derive(Clone, Debug)]
pub struct WriteReport {
    /// Where the module was written
    pub path: PathBuf,
    /// Strategy that was used
    pub strategy: WriteStrategy,
    /// Declaration rows whose attribute word changed
    pub rows_changed: usize,
    /// New PE checksum, if one was recomputed
    pub checksum: Option<u32>,
    /// Warnings, empty for a clean write
    pub warnings: Vec<WriteWarning>,
}

/// Attribute words of every present declaration, by row id.
pub(crate) struct AttributeWords {
    pub(crate) types: HashMap<u32, u32>,
    pub(crate) methods: HashMap<u32, u16>,
    pub(crate) fields: HashMap<u32, u16>,
}

impl AttributeWords {
    pub(crate) fn collect(module: &Module) -> Self {
        let mut words = AttributeWords {
            types: HashMap::new(),
            methods: HashMap::new(),
            fields: HashMap::new(),
        };

        for ty in module.all_types() {
            words.types.insert(ty.token.row(), ty.flags);
            for method in ty.methods.iter().filter_map(Slot::as_ref) {
                words.methods.insert(method.token.row(), method.flags);
            }
            for field in ty.fields.iter().filter_map(Slot::as_ref) {
                words.fields.insert(field.token.row(), field.flags);
            }
        }

        words
    }
}

/// Write `module` to `output_path`.
///
/// # Errors
/// Returns [`crate::Error::WriteFailed`] if the output cannot be produced and
/// [`crate::Error::LayoutMismatch`] if the re-emitted tables do not fit the original layout.
/// On error no file is left at `output_path` beyond what was there before.
pub fn write_module_to_file<P: AsRef<Path>>(
    module: &Module,
    output_path: P,
    options: &WriteOptions,
) -> Result<WriteReport> {
    let output_path = output_path.as_ref();
    let strategy = options
        .strategy
        .unwrap_or_else(|| WriteStrategy::for_payload(module.payload()));
    let file = module.file();
    let layout = module.layout();

    // Phase 1: snapshot the model and re-parse the source tables
    let words = AttributeWords::collect(module);
    let source_tables = module.tables()?;

    // Phase 2: copy the source image into the output
    let mut output = output::Output::create(output_path, file.data().len() as u64)?;
    output.write_at(0, file.data())?;
    debug!(
        "Writing {} to {} ({strategy})",
        module.name(),
        output.target_path().display()
    );

    // Phase 3: apply the declaration changes
    let rows_changed = match strategy {
        WriteStrategy::Managed => {
            let emitted = tables::emit_tables(&source_tables, &words)?;
            output.write_at(layout.tables_offset, &emitted.data)?;
            emitted.rows_changed
        }
        WriteStrategy::NativeAware => patch::patch_attribute_words(
            output.as_mut_slice(),
            layout.tables_offset,
            &source_tables,
            &words,
        )?,
    };

    // Phase 4: the checksum is only maintained on the managed path
    let checksum = if strategy == WriteStrategy::Managed && file.checksum() != 0 {
        let checksum_offset = file.checksum_offset();
        let checksum = pe::pe_checksum(output.as_mut_slice(), checksum_offset);
        output.write_at(checksum_offset, &checksum.to_le_bytes())?;
        Some(checksum)
    } else {
        None
    };

    // Phase 5: collect what the caller has to know
    let mut warnings = Vec::new();
    if !module.payload().is_il_only() {
        warnings.push(WriteWarning::NativeContent(
            module.payload().native_regions().to_vec(),
        ));
    }
    if rows_changed != 0 {
        let cor20header = module.cor20header();
        if cor20header.cor_flags().contains(CorFlags::STRONG_NAME_SIGNED)
            || cor20header.strong_name_signature_size != 0
        {
            warnings.push(WriteWarning::StrongNameSignature);
        }
        if file.certificate_table().is_some() {
            warnings.push(WriteWarning::AuthenticodeSignature);
        }
    }
    for warning in &warnings {
        warn!("{}: {warning}", module.name());
    }

    // Phase 6: move the output into place
    let path = output.finalize()?;
    debug!("Wrote {} changed rows to {}", rows_changed, path.display());

    Ok(WriteReport {
        path,
        strategy,
        rows_changed,
        checksum,
        warnings,
    })
}
