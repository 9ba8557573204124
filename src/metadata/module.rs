//! A loaded module: its declaration graph plus the image it came from.

use std::path::Path;

use crate::{
    file::File,
    metadata::{
        cor20header::Cor20Header,
        loader::{self, MetadataLayout},
        payload::Payload,
        streams::TablesHeader,
        typesystem::{Slot, TypeDeclaration, TypeIter},
    },
    Result,
};

/// Declaration totals of a module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModuleStats {
    /// Present types at every nesting level
    pub types: usize,
    /// Present methods
    pub methods: usize,
    /// Present fields
    pub fields: usize,
    /// Absent slots in every collection
    pub absent: usize,
}

/// A managed module loaded for rewriting.
///
/// The module owns its top-level types, which own everything declared inside them. The
/// source image is kept so the writer can reproduce every byte the declarations do not cover.
///
/// # Examples
///
/// ```rust,no_run
/// use publicizer::Module;
/// use std::path::Path;
///
/// let module = Module::from_file(Path::new("Library.dll"))?;
/// let stats = module.stats();
/// println!("{}: {} types, {} methods, {} fields", module.name(), stats.types, stats.methods, stats.fields);
/// # Ok::<(), publicizer::Error>(())
/// ```
pub struct Module {
    pub(crate) file: File,
    pub(crate) layout: MetadataLayout,
    pub(crate) cor20header: Cor20Header,
    pub(crate) runtime_version: String,
    pub(crate) name: String,
    pub(crate) mvid: Option<uguid::Guid>,
    pub(crate) payload: Payload,
    pub(crate) types: Vec<Slot<TypeDeclaration>>,
}

impl Module {
    /// Load the module at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be read, and a format error if it
    /// is not a managed module this crate understands.
    pub fn from_file(path: &Path) -> Result<Module> {
        loader::load(File::from_file(path)?)
    }

    /// Load a module from an in-memory image.
    ///
    /// # Errors
    /// Returns a format error if `data` is not a managed module this crate understands.
    pub fn from_mem(data: Vec<u8>) -> Result<Module> {
        loader::load(File::from_mem(data)?)
    }

    /// Module name from the `Module` table
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module version id, if the module has one
    #[must_use]
    pub fn mvid(&self) -> Option<uguid::Guid> {
        self.mvid
    }

    /// Runtime version string of the metadata root (e.g. `v4.0.30319`)
    #[must_use]
    pub fn runtime_version(&self) -> &str {
        &self.runtime_version
    }

    /// The CLR runtime header
    #[must_use]
    pub fn cor20header(&self) -> &Cor20Header {
        &self.cor20header
    }

    /// Whether the module holds native content
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Top-level types in `TypeDef` order
    #[must_use]
    pub fn types(&self) -> &[Slot<TypeDeclaration>] {
        &self.types
    }

    /// Top-level types, mutably
    pub fn types_mut(&mut self) -> &mut [Slot<TypeDeclaration>] {
        &mut self.types
    }

    /// Every present type, parents before their nested types
    #[must_use]
    pub fn all_types(&self) -> TypeIter<'_> {
        TypeIter::new(&self.types)
    }

    /// Count the declarations and absent slots of the whole graph.
    #[must_use]
    pub fn stats(&self) -> ModuleStats {
        let mut stats = ModuleStats {
            absent: self.types.iter().filter(|slot| slot.is_absent()).count(),
            ..ModuleStats::default()
        };

        for ty in self.all_types() {
            stats.types += 1;
            stats.absent += ty.nested_types.iter().filter(|slot| slot.is_absent()).count();

            for method in &ty.methods {
                if method.is_present() {
                    stats.methods += 1;
                } else {
                    stats.absent += 1;
                }
            }
            for field in &ty.fields {
                if field.is_present() {
                    stats.fields += 1;
                } else {
                    stats.absent += 1;
                }
            }
        }

        stats
    }

    /// The source image
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Location of the metadata inside the source image
    #[must_use]
    pub fn layout(&self) -> &MetadataLayout {
        &self.layout
    }

    /// Parse the tables stream of the source image again.
    ///
    /// # Errors
    /// Only fails if the image changed under the module, which a loaded module rules out.
    pub fn tables(&self) -> Result<TablesHeader<'_>> {
        TablesHeader::from(
            self.file
                .data_slice(self.layout.tables_offset, self.layout.tables_size)?,
        )
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        // nesting depth is unbounded, unwind it without recursion
        let mut pending = std::mem::take(&mut self.types);
        while let Some(slot) = pending.pop() {
            if let Slot::Present(mut ty) = slot {
                pending.append(&mut ty.nested_types);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::tables::TableId,
        test::{ImageBuilder, TypeSpec},
    };

    #[test]
    fn scenario_stats() {
        let module = Module::from_mem(ImageBuilder::scenario().build()).unwrap();

        assert_eq!(
            module.stats(),
            ModuleStats {
                types: 2,
                methods: 1,
                fields: 1,
                absent: 0
            }
        );
        assert_eq!(module.runtime_version(), "v4.0.30319");
        assert!(module.mvid().is_some());

        let names: Vec<String> = module.all_types().map(TypeDeclaration::full_name).collect();
        assert_eq!(names, vec!["Demo.A", "B"]);
    }

    #[test]
    fn tables_reparse() {
        let module = Module::from_mem(ImageBuilder::scenario().build()).unwrap();
        let tables = module.tables().unwrap();

        assert!(!module.layout().uncompressed);
        assert_eq!(tables.table_row_count(TableId::TypeDef), 2);
        assert_eq!(tables.table_row_count(TableId::MethodDef), 1);
        assert!(tables.tables_end() <= tables.data().len());
    }

    #[test]
    fn deep_nesting_loads_and_drops() {
        let mut builder = ImageBuilder::new().ty(TypeSpec::new("<Module>", 0));
        builder = builder.ty(TypeSpec::new("Level0", 0));
        for depth in 1..2_000u32 {
            builder = builder.ty(TypeSpec::new(&format!("Level{depth}"), 3).nested_in(depth + 1));
        }

        let module = Module::from_mem(builder.build()).unwrap();
        assert_eq!(module.types().len(), 2);
        assert_eq!(module.stats().types, 2_001);
    }
}
