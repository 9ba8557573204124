//! The header of the `#~` / `#-` tables stream and the placement of every table inside it.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II, Section 24.2.6 - #~ stream

use std::sync::Arc;
use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::io::read_le,
    metadata::tables::{
        GenericRow, MetadataTable, RowReadable, TableId, TableInfo, TableInfoRef,
    },
    Error::{OutOfBounds, UnknownTable},
    Result,
};

/// Heap-size flag announcing 4 bytes of extra data after the row counts.
pub const HEAP_SIZES_EXTRA_DATA: u8 = 0x40;

/// Where one table lives inside the tables stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableLayout {
    /// Offset of the first row, relative to the start of the tables stream
    pub offset: usize,
    /// Size of one row in bytes
    pub row_size: u32,
    /// Number of rows
    pub rows: u32,
}

impl TableLayout {
    /// Size of the whole table in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.row_size as usize * self.rows as usize
    }

    /// Stream-relative offset of the row with 1-based id `rid`.
    #[must_use]
    pub fn row_offset(&self, rid: u32) -> Option<usize> {
        if rid == 0 || rid > self.rows {
            return None;
        }

        Some(self.offset + (rid as usize - 1) * self.row_size as usize)
    }
}

/// The parsed tables stream header with the layout of every present table.
pub struct TablesHeader<'a> {
    /// Major version of the table schema
    pub major_version: u8,
    /// Minor version of the table schema
    pub minor_version: u8,
    /// Heap-size flags, see [`TableInfo`]
    pub heap_sizes: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// Row counts and index widths
    pub info: TableInfoRef,
    /// Value of the optional extra-data field
    pub extra_data: Option<u32>,
    data: &'a [u8],
    tables_offset: usize,
    layouts: Vec<Option<TableLayout>>,
}

impl<'a> TablesHeader<'a> {
    /// Parse the tables stream in `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownTable`] for a valid bit beyond the known tables,
    /// [`crate::Error::Malformed`] for an empty valid mask and [`crate::Error::OutOfBounds`] if
    /// the tables do not fit into `data`.
    pub fn from(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let valid_bitvec = read_le::<u64>(&data[8..])?;
        if valid_bitvec == 0 {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }

        let unknown = valid_bitvec >> TableId::COUNT;
        if unknown != 0 {
            #[allow(clippy::cast_possible_truncation)]
            let bit = (unknown.trailing_zeros() as usize + TableId::COUNT) as u8;
            return Err(UnknownTable(bit));
        }

        let heap_sizes = read_le::<u8>(&data[6..])?;
        let info = Arc::new(TableInfo::new(data, valid_bitvec)?);

        let mut tables_offset = 24 + valid_bitvec.count_ones() as usize * 4;
        let extra_data = if heap_sizes & HEAP_SIZES_EXTRA_DATA != 0 {
            if data.len() < tables_offset + 4 {
                return Err(OutOfBounds);
            }

            let value = read_le::<u32>(&data[tables_offset..])?;
            tables_offset += 4;
            Some(value)
        } else {
            None
        };

        let mut layouts = vec![None; TableId::COUNT];
        let mut current_offset = tables_offset;
        for table_id in TableId::iter() {
            if valid_bitvec & (1 << table_id as usize) == 0 {
                continue;
            }

            let layout = TableLayout {
                offset: current_offset,
                row_size: info.row_size(table_id),
                rows: info.get(table_id).rows,
            };

            current_offset = match current_offset.checked_add(layout.size()) {
                Some(end) if end <= data.len() => end,
                _ => return Err(OutOfBounds),
            };
            layouts[table_id as usize] = Some(layout);
        }

        Ok(TablesHeader {
            major_version: read_le::<u8>(&data[4..])?,
            minor_version: read_le::<u8>(&data[5..])?,
            heap_sizes,
            valid: valid_bitvec,
            sorted: read_le::<u64>(&data[16..])?,
            info,
            extra_data,
            data,
            tables_offset,
            layouts,
        })
    }

    /// Number of present tables
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Size of the header including row counts and extra data, i.e. the offset of the first
    /// table.
    #[must_use]
    pub fn header_size(&self) -> usize {
        self.tables_offset
    }

    /// Stream-relative offset just past the last table.
    #[must_use]
    pub fn tables_end(&self) -> usize {
        self.layouts
            .iter()
            .flatten()
            .map(|layout| layout.offset + layout.size())
            .max()
            .unwrap_or(self.tables_offset)
    }

    /// The raw tables stream this header was parsed from
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Whether `table_id` is flagged present
    #[must_use]
    pub fn has_table(&self, table_id: TableId) -> bool {
        self.layouts[table_id as usize].is_some()
    }

    /// Layout of `table_id`, `None` if absent.
    #[must_use]
    pub fn layout(&self, table_id: TableId) -> Option<TableLayout> {
        self.layouts[table_id as usize]
    }

    /// Row count of `table_id`, 0 if absent.
    #[must_use]
    pub fn table_row_count(&self, table_id: TableId) -> u32 {
        self.layouts[table_id as usize].map_or(0, |layout| layout.rows)
    }

    /// Iterate over the present tables in stream order.
    pub fn present_tables(&self) -> impl Iterator<Item = TableId> + '_ {
        TableId::iter().filter(|table_id| self.has_table(*table_id))
    }

    /// Typed view of `table_id`, `None` if the table is absent.
    #[must_use]
    pub fn table<T: RowReadable>(&self, table_id: TableId) -> Option<MetadataTable<'a, T>> {
        let layout = self.layout(table_id)?;
        MetadataTable::new(&self.data[layout.offset..], layout.rows, self.info.clone()).ok()
    }

    /// Decode every row of `table_id` as `T`; empty if the table is absent.
    ///
    /// # Errors
    /// Returns the decode error of the first row that does not decode.
    pub fn rows<T: RowReadable>(&self, table_id: TableId) -> Result<Vec<T>> {
        match self.table::<T>(table_id) {
            Some(table) => table.read_all(),
            None => Ok(Vec::new()),
        }
    }

    /// Decode every row of `table_id` column by column; empty if the table is absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if a row is truncated.
    pub fn generic_rows(&self, table_id: TableId) -> Result<Vec<GenericRow>> {
        let Some(layout) = self.layout(table_id) else {
            return Ok(Vec::new());
        };

        let mut offset = layout.offset;
        (1..=layout.rows)
            .map(|rid| GenericRow::read(table_id, self.data, &mut offset, rid, &self.info))
            .collect()
    }
}
