use crate::{
    file::io::{read_le_at_dyn, write_le_at_dyn},
    metadata::{
        tables::{RowReadable, RowWritable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// A row of the `NestedClass` table as stored.
#[derive(Clone, Debug)]
pub struct NestedClassRaw {
    /// 1-based row id
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Byte offset of this row inside the table
    pub offset: usize,
    /// `TypeDef` row of the nested type
    pub nested_class: u32,
    /// `TypeDef` row of the enclosing type
    pub enclosing_class: u32,
}

impl RowReadable for NestedClassRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            /* nested_class */      sizes.table_index_bytes(TableId::TypeDef) +
            /* enclosing_class */   sizes.table_index_bytes(TableId::TypeDef)
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(NestedClassRaw {
            rid,
            token: Token::from_parts(TableId::NestedClass, rid),
            offset: *offset,
            nested_class: read_le_at_dyn(data, offset, sizes.is_large(TableId::TypeDef))?,
            enclosing_class: read_le_at_dyn(data, offset, sizes.is_large(TableId::TypeDef))?,
        })
    }
}

impl RowWritable for NestedClassRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        write_le_at_dyn(data, offset, self.nested_class, sizes.is_large(TableId::TypeDef))?;
        write_le_at_dyn(data, offset, self.enclosing_class, sizes.is_large(TableId::TypeDef))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::metadata::tables::{MetadataTable, TableInfo};

    use super::*;

    #[test]
    fn crafted_short() {
        let data = vec![
            0x03, 0x00, // nested_class
            0x02, 0x00, // enclosing_class
        ];

        let sizes = Arc::new(TableInfo::new_test(&[(TableId::TypeDef, 3)], false, false, false));
        let table = MetadataTable::<NestedClassRaw>::new(&data, 1, sizes.clone()).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.token.value(), 0x2900_0001);
        assert_eq!(row.nested_class, 3);
        assert_eq!(row.enclosing_class, 2);

        let mut written = vec![0u8; 4];
        row.row_write(&mut written, &mut 0, &sizes).unwrap();
        assert_eq!(written, data);
    }

    #[test]
    fn truncated() {
        let data = vec![0x03, 0x00, 0x02];
        let sizes = Arc::new(TableInfo::new_test(&[(TableId::TypeDef, 3)], false, false, false));
        assert!(MetadataTable::<NestedClassRaw>::new(&data, 1, sizes).is_err());
    }
}
