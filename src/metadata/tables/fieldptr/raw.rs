use crate::{
    file::io::{read_le_at_dyn, write_le_at_dyn},
    metadata::{
        tables::{RowReadable, RowWritable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// A row of the `FieldPtr` table: the `Field` row that logical position `rid` maps to.
#[derive(Clone, Debug)]
pub struct FieldPtrRaw {
    /// 1-based row id
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Byte offset of this row inside the table
    pub offset: usize,
    /// Target row in the `Field` table
    pub field: u32,
}

impl RowReadable for FieldPtrRaw {
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(sizes.table_index_bytes(TableId::Field))
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(FieldPtrRaw {
            rid,
            token: Token::from_parts(TableId::FieldPtr, rid),
            offset: *offset,
            field: read_le_at_dyn(data, offset, sizes.is_large(TableId::Field))?,
        })
    }
}

impl RowWritable for FieldPtrRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        write_le_at_dyn(data, offset, self.field, sizes.is_large(TableId::Field))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::metadata::tables::{MetadataTable, TableInfo};

    use super::*;

    #[test]
    fn crafted_short() {
        let data = vec![0x02, 0x00, 0x01, 0x00];

        let sizes = Arc::new(TableInfo::new_test(&[(TableId::Field, 2)], false, false, false));
        let table = MetadataTable::<FieldPtrRaw>::new(&data, 2, sizes).unwrap();

        let targets: Vec<u32> = table.iter().map(|row| row.field).collect();
        assert_eq!(targets, vec![2, 1]);
        assert_eq!(table.get(2).unwrap().token.value(), 0x0300_0002);
    }
}
