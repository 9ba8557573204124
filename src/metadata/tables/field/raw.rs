use crate::{
    file::io::{read_le_at, read_le_at_dyn, write_le_at_dyn},
    metadata::{
        tables::{RowReadable, RowWritable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// A row of the `Field` table as stored.
#[derive(Clone, Debug)]
pub struct FieldRaw {
    /// 1-based row id
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Byte offset of this row inside the table
    pub offset: usize,
    /// `FieldAttributes`, a 2-byte column
    pub flags: u32,
    /// `#Strings` index of the name
    pub name: u32,
    /// `#Blob` index of the signature
    pub signature: u32,
}

impl RowReadable for FieldRaw {
    #[rustfmt::skip]
    fn row_size(sizes: &TableInfoRef) -> u32 {
        u32::from(
            /* flags */     2 +
            /* name */      sizes.str_bytes() +
            /* signature */ sizes.blob_bytes()
        )
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(FieldRaw {
            rid,
            token: Token::from_parts(TableId::Field, rid),
            offset: *offset,
            flags: u32::from(read_le_at::<u16>(data, offset)?),
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}

impl RowWritable for FieldRaw {
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()> {
        write_le_at_dyn(data, offset, self.flags, false)?;
        write_le_at_dyn(data, offset, self.name, sizes.is_large_str())?;
        write_le_at_dyn(data, offset, self.signature, sizes.is_large_blob())?;

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
        #[rustfmt::skip]
        let data = vec![
            0x01, 0x00, // flags
            0x12, 0x00, // name
            0x05, 0x00, // signature

            0x11, 0x00,
            0x20, 0x00,
            0x05, 0x00,
        ];

        let sizes = Arc::new(TableInfo::new_test(&[], false, false, false));
        let table = MetadataTable::<FieldRaw>::new(&data, 2, sizes.clone()).unwrap();

        let rows: Vec<FieldRaw> = table.iter().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].flags, 0x0001);
        assert_eq!(rows[0].name, 0x12);
        assert_eq!(rows[1].token.value(), 0x0400_0002);
        assert_eq!(rows[1].offset, 6);
        assert_eq!(rows[1].flags, 0x0011);

        let mut written = vec![0u8; data.len()];
        let mut offset = 0;
        for row in &rows {
            row.row_write(&mut written, &mut offset, &sizes).unwrap();
        }
        assert_eq!(written, data);
    }

    #[test]
    fn crafted_long() {
        #[rustfmt::skip]
        let data = vec![
            0x06, 0x00,
            0x00, 0x00, 0x01, 0x00,
            0x00, 0x00, 0x02, 0x00,
        ];

        let sizes = Arc::new(TableInfo::new_test(&[], true, true, false));
        let table = MetadataTable::<FieldRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.flags, 6);
        assert_eq!(row.name, 0x0001_0000);
        assert_eq!(row.signature, 0x0002_0000);
        assert!(table.get(2).is_none());
    }
}
