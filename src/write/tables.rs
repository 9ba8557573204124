//! Managed re-emit of the tables stream.
//!
//! The stream is rebuilt from scratch: header, row counts, extra data and every row of every
//! table. Declaration rows are encoded from their typed form with the model's attribute words,
//! every other table column by column from its schema. Heap sizes and row counts do not
//! change, so each table must come out exactly as large as the layout it replaces.

use crate::{
    file::io::write_le_at,
    metadata::{
        streams::TablesHeader,
        tables::{FieldRaw, MethodDefRaw, RowWritable, TableId, TypeDefRaw},
    },
    write::AttributeWords,
    Error::LayoutMismatch,
    Result,
};

/// A re-encoded tables stream.
pub(crate) struct EmittedTables {
    /// Stream bytes, as long as the original stream
    pub(crate) data: Vec<u8>,
    /// Declaration rows whose attribute word changed
    pub(crate) rows_changed: usize,
}

/// Re-encode the whole tables stream of `tables` with the attribute words in `words`.
///
/// # Errors
/// Returns [`crate::Error::LayoutMismatch`] if a table does not re-encode to its original
/// size, and a format error if a row cannot be decoded or a value no longer fits its column.
pub(crate) fn emit_tables(tables: &TablesHeader, words: &AttributeWords) -> Result<EmittedTables> {
    let source = tables.data();
    let mut data = vec![0u8; source.len()];
    let mut rows_changed = 0;

    // reserved fields are carried over as found
    data[..4].copy_from_slice(&source[..4]);
    let mut offset = 4;
    write_le_at(&mut data, &mut offset, tables.major_version)?;
    write_le_at(&mut data, &mut offset, tables.minor_version)?;
    write_le_at(&mut data, &mut offset, tables.heap_sizes)?;
    write_le_at(&mut data, &mut offset, source[7])?;
    write_le_at(&mut data, &mut offset, tables.valid)?;
    write_le_at(&mut data, &mut offset, tables.sorted)?;
    for table_id in tables.present_tables() {
        write_le_at(&mut data, &mut offset, tables.table_row_count(table_id))?;
    }
    if let Some(extra_data) = tables.extra_data {
        write_le_at(&mut data, &mut offset, extra_data)?;
    }

    if offset != tables.header_size() {
        return Err(malformed_error!(
            "Re-emitted tables header has {} bytes, expected {}",
            offset,
            tables.header_size()
        ));
    }

    for table_id in tables.present_tables() {
        let Some(layout) = tables.layout(table_id) else {
            continue;
        };
        let start = offset;

        match table_id {
            TableId::TypeDef => {
                for mut row in tables.rows::<TypeDefRaw>(table_id)? {
                    if let Some(&flags) = words.types.get(&row.rid) {
                        if flags != row.flags {
                            row.flags = flags;
                            rows_changed += 1;
                        }
                    }
                    row.row_write(&mut data, &mut offset, &tables.info)?;
                }
            }
            TableId::MethodDef => {
                for mut row in tables.rows::<MethodDefRaw>(table_id)? {
                    if let Some(&flags) = words.methods.get(&row.rid) {
                        if u32::from(flags) != row.flags {
                            row.flags = u32::from(flags);
                            rows_changed += 1;
                        }
                    }
                    row.row_write(&mut data, &mut offset, &tables.info)?;
                }
            }
            TableId::Field => {
                for mut row in tables.rows::<FieldRaw>(table_id)? {
                    if let Some(&flags) = words.fields.get(&row.rid) {
                        if u32::from(flags) != row.flags {
                            row.flags = u32::from(flags);
                            rows_changed += 1;
                        }
                    }
                    row.row_write(&mut data, &mut offset, &tables.info)?;
                }
            }
            _ => {
                for row in tables.generic_rows(table_id)? {
                    row.write(&mut data, &mut offset, &tables.info)?;
                }
            }
        }

        let actual = offset - start;
        if start != layout.offset || actual != layout.size() {
            return Err(LayoutMismatch {
                table: table_id,
                expected: layout.size(),
                actual,
            });
        }
    }

    // padding after the last table
    data[offset..].copy_from_slice(&source[offset..]);

    Ok(EmittedTables { data, rows_changed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::Module,
        publicize::{publicize, PublicizeOptions},
        test::{ImageBuilder, TypeSpec},
    };

    #[test]
    fn unchanged_model_reproduces_stream() {
        let module = Module::from_mem(ImageBuilder::scenario().with_module_type().build()).unwrap();
        let tables = module.tables().unwrap();

        let emitted = emit_tables(&tables, &AttributeWords::collect(&module)).unwrap();
        assert_eq!(emitted.rows_changed, 0);
        assert_eq!(emitted.data, tables.data());
    }

    #[test]
    fn uncompressed_stream_reproduced() {
        let image = ImageBuilder::new()
            .uncompressed()
            .ty(TypeSpec::new("<Module>", 0))
            .ty(TypeSpec::new("Holder", 0).method("Run", 0x0001).field("state", 0x0001))
            .build();
        let module = Module::from_mem(image).unwrap();
        let tables = module.tables().unwrap();
        assert!(tables.extra_data.is_some());

        let emitted = emit_tables(&tables, &AttributeWords::collect(&module)).unwrap();
        assert_eq!(emitted.data, tables.data());
    }

    #[test]
    fn only_flag_bytes_differ() {
        let mut module = Module::from_mem(ImageBuilder::scenario().build()).unwrap();
        publicize(&mut module, &PublicizeOptions::default());

        let tables = module.tables().unwrap();
        let emitted = emit_tables(&tables, &AttributeWords::collect(&module)).unwrap();
        assert_eq!(emitted.rows_changed, 4);

        let differing: Vec<usize> = emitted
            .data
            .iter()
            .zip(tables.data())
            .enumerate()
            .filter(|(_, (new, old))| new != old)
            .map(|(offset, _)| offset)
            .collect();
        assert_eq!(differing.len(), 4);

        let typedef = tables.layout(TableId::TypeDef).unwrap();
        assert_eq!(emitted.data[typedef.offset] & 0x7, 0x1);
        assert_eq!(emitted.data[typedef.offset + typedef.row_size as usize] & 0x7, 0x2);
    }
}
