//! Column layout of every metadata table.
//!
//! The typed rows in [`crate::metadata::tables`] cover the tables whose contents the model
//! reads. Every other table is carried through [`GenericRow`], which decodes and encodes a row
//! column by column from this schema alone.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II, Sections 22.2 - 22.39

use crate::{
    file::io::{read_le_at, read_le_at_dyn, write_le_at, write_le_at_dyn},
    metadata::tables::types::{CodedIndexType, TableId, TableInfo},
    Result,
};

/// Kind of a single table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// 1-byte constant
    U8,
    /// 2-byte constant
    U16,
    /// 4-byte constant
    U32,
    /// Index into `#Strings`
    Str,
    /// Index into `#GUID`
    Guid,
    /// Index into `#Blob`
    Blob,
    /// Simple index into another table
    Table(TableId),
    /// Coded index
    Coded(CodedIndexType),
}

impl Column {
    /// Width of this column in bytes under `info`.
    #[must_use]
    pub fn size(&self, info: &TableInfo) -> u8 {
        match self {
            Column::U8 => 1,
            Column::U16 => 2,
            Column::U32 => 4,
            Column::Str => info.str_bytes(),
            Column::Guid => info.guid_bytes(),
            Column::Blob => info.blob_bytes(),
            Column::Table(table) => info.table_index_bytes(*table),
            Column::Coded(coded) => info.coded_index_bytes(*coded),
        }
    }
}

impl TableId {
    /// The columns of this table, in storage order.
    #[must_use]
    pub fn columns(&self) -> &'static [Column] {
        use Column::{Blob, Coded, Guid, Str, Table, U16, U32, U8};
        use CodedIndexType as C;

        match self {
            TableId::Module => &[U16, Str, Guid, Guid, Guid],
            TableId::TypeRef => &[Coded(C::ResolutionScope), Str, Str],
            TableId::TypeDef => &[
                U32,
                Str,
                Str,
                Coded(C::TypeDefOrRef),
                Table(TableId::Field),
                Table(TableId::MethodDef),
            ],
            TableId::FieldPtr => &[Table(TableId::Field)],
            TableId::Field => &[U16, Str, Blob],
            TableId::MethodPtr => &[Table(TableId::MethodDef)],
            TableId::MethodDef => &[U32, U16, U16, Str, Blob, Table(TableId::Param)],
            TableId::ParamPtr => &[Table(TableId::Param)],
            TableId::Param => &[U16, U16, Str],
            TableId::InterfaceImpl => &[Table(TableId::TypeDef), Coded(C::TypeDefOrRef)],
            TableId::MemberRef => &[Coded(C::MemberRefParent), Str, Blob],
            TableId::Constant => &[U8, U8, Coded(C::HasConstant), Blob],
            TableId::CustomAttribute => &[
                Coded(C::HasCustomAttribute),
                Coded(C::CustomAttributeType),
                Blob,
            ],
            TableId::FieldMarshal => &[Coded(C::HasFieldMarshal), Blob],
            TableId::DeclSecurity => &[U16, Coded(C::HasDeclSecurity), Blob],
            TableId::ClassLayout => &[U16, U32, Table(TableId::TypeDef)],
            TableId::FieldLayout => &[U32, Table(TableId::Field)],
            TableId::StandAloneSig => &[Blob],
            TableId::EventMap => &[Table(TableId::TypeDef), Table(TableId::Event)],
            TableId::EventPtr => &[Table(TableId::Event)],
            TableId::Event => &[U16, Str, Coded(C::TypeDefOrRef)],
            TableId::PropertyMap => &[Table(TableId::TypeDef), Table(TableId::Property)],
            TableId::PropertyPtr => &[Table(TableId::Property)],
            TableId::Property => &[U16, Str, Blob],
            TableId::MethodSemantics => &[
                U16,
                Table(TableId::MethodDef),
                Coded(C::HasSemantics),
            ],
            TableId::MethodImpl => &[
                Table(TableId::TypeDef),
                Coded(C::MethodDefOrRef),
                Coded(C::MethodDefOrRef),
            ],
            TableId::ModuleRef => &[Str],
            TableId::TypeSpec => &[Blob],
            TableId::ImplMap => &[
                U16,
                Coded(C::MemberForwarded),
                Str,
                Table(TableId::ModuleRef),
            ],
            TableId::FieldRVA => &[U32, Table(TableId::Field)],
            TableId::EncLog => &[U32, U32],
            TableId::EncMap => &[U32],
            TableId::Assembly => &[U32, U16, U16, U16, U16, U32, Blob, Str, Str],
            TableId::AssemblyProcessor => &[U32],
            TableId::AssemblyOS => &[U32, U32, U32],
            TableId::AssemblyRef => &[U16, U16, U16, U16, U32, Blob, Str, Str, Blob],
            TableId::AssemblyRefProcessor => &[U32, Table(TableId::AssemblyRef)],
            TableId::AssemblyRefOS => &[U32, U32, U32, Table(TableId::AssemblyRef)],
            TableId::File => &[U32, Str, Blob],
            TableId::ExportedType => &[U32, U32, Str, Str, Coded(C::Implementation)],
            TableId::ManifestResource => &[U32, U32, Str, Coded(C::Implementation)],
            TableId::NestedClass => &[Table(TableId::TypeDef), Table(TableId::TypeDef)],
            TableId::GenericParam => &[U16, U16, Coded(C::TypeOrMethodDef), Str],
            TableId::MethodSpec => &[Coded(C::MethodDefOrRef), Blob],
            TableId::GenericParamConstraint => &[
                Table(TableId::GenericParam),
                Coded(C::TypeDefOrRef),
            ],
        }
    }
}

/// A table row held as raw column values, for tables the model does not interpret.
///
/// Index columns keep their encoded form; a coded index is neither split nor validated, so
/// encoding a row read under the same [`TableInfo`] reproduces its bytes exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericRow {
    /// Table the row belongs to
    pub table: TableId,
    /// 1-based row id
    pub rid: u32,
    /// Column values in storage order
    pub values: Vec<u32>,
}

impl GenericRow {
    /// Decode one row of `table` at `offset`, advancing it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` ends inside the row.
    pub fn read(
        table: TableId,
        data: &[u8],
        offset: &mut usize,
        rid: u32,
        info: &TableInfo,
    ) -> Result<Self> {
        let columns = table.columns();
        let mut values = Vec::with_capacity(columns.len());

        for column in columns {
            let value = match column {
                Column::U8 => u32::from(read_le_at::<u8>(data, offset)?),
                Column::U16 => u32::from(read_le_at::<u16>(data, offset)?),
                Column::U32 => read_le_at::<u32>(data, offset)?,
                other => read_le_at_dyn(data, offset, other.size(info) == 4)?,
            };
            values.push(value);
        }

        Ok(GenericRow { table, rid, values })
    }

    /// Encode this row at `offset`, advancing it.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the value count does not match the schema or a
    /// value does not fit its column, and [`crate::Error::OutOfBounds`] if `data` is too short.
    pub fn write(&self, data: &mut [u8], offset: &mut usize, info: &TableInfo) -> Result<()> {
        let columns = self.table.columns();
        if columns.len() != self.values.len() {
            return Err(malformed_error!(
                "{} row {} has {} values, expected {}",
                self.table,
                self.rid,
                self.values.len(),
                columns.len()
            ));
        }

        for (column, value) in columns.iter().zip(&self.values) {
            match column {
                Column::U8 => {
                    let Ok(byte) = u8::try_from(*value) else {
                        return Err(malformed_error!(
                            "{} row {}: value 0x{:X} does not fit a byte column",
                            self.table,
                            self.rid,
                            value
                        ));
                    };
                    write_le_at::<u8>(data, offset, byte)?;
                }
                Column::U16 => {
                    let Ok(short) = u16::try_from(*value) else {
                        return Err(malformed_error!(
                            "{} row {}: value 0x{:X} does not fit a 2-byte column",
                            self.table,
                            self.rid,
                            value
                        ));
                    };
                    write_le_at::<u16>(data, offset, short)?;
                }
                Column::U32 => write_le_at::<u32>(data, offset, *value)?,
                other => write_le_at_dyn(data, offset, *value, other.size(info) == 4)?,
            }
        }

        Ok(())
    }
}
