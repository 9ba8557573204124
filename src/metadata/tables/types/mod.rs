//! Building blocks shared by every metadata table: ids, index widths, coded indexes, the
//! column schema, row traits and the typed table view.

mod codedindex;
mod schema;
mod tableid;
mod tableinfo;

use std::marker::PhantomData;

use crate::Result;

pub use codedindex::{CodedIndex, CodedIndexType, CodedIndexTypeIter};
pub use schema::{Column, GenericRow};
pub use tableid::{TableId, TableIdIter};
pub use tableinfo::{TableInfo, TableInfoRef, TableRowInfo};

/// A row type that can be decoded from a table.
pub trait RowReadable: Sized + Send {
    /// Size in bytes of one row under `sizes`.
    fn row_size(sizes: &TableInfoRef) -> u32;

    /// Decode the row with 1-based id `rid` at `offset`, advancing `offset` past it.
    ///
    /// # Errors
    /// Returns an error if `data` ends inside the row or a coded index is invalid.
    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self>;
}

/// A row type that can be encoded back into a table.
pub trait RowWritable: Sized + Send {
    /// Encode this row at `offset`, advancing `offset` past it.
    ///
    /// # Errors
    /// Returns an error if `data` is too short or a value does not fit its column.
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef)
        -> Result<()>;
}

/// A typed, read-only view over the rows of one table.
pub struct MetadataTable<'a, T> {
    data: &'a [u8],
    row_count: u32,
    row_size: u32,
    sizes: TableInfoRef,
    _phantom: PhantomData<T>,
}

impl<'a, T: RowReadable> MetadataTable<'a, T> {
    /// Create a view over `row_count` rows at the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` cannot hold every row.
    pub fn new(data: &'a [u8], row_count: u32, sizes: TableInfoRef) -> Result<Self> {
        let row_size = T::row_size(&sizes);
        if (row_count as usize) * (row_size as usize) > data.len() {
            return Err(crate::Error::OutOfBounds);
        }

        Ok(MetadataTable {
            data,
            row_count,
            row_size,
            sizes,
            _phantom: PhantomData,
        })
    }

    /// Size of the table in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.row_count) * u64::from(self.row_size)
    }

    /// Size of one row in bytes
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.row_size
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Decode the row with 1-based id `index`, `None` if out of range.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<T> {
        if index == 0 || self.row_count < index {
            return None;
        }

        T::row_read(
            self.data,
            &mut ((index as usize - 1) * self.row_size as usize),
            index,
            &self.sizes,
        )
        .ok()
    }

    /// Decode every row, failing on the first row that does not decode.
    ///
    /// # Errors
    /// Returns the decode error of the first bad row.
    pub fn read_all(&self) -> Result<Vec<T>> {
        let mut offset = 0;
        (1..=self.row_count)
            .map(|rid| T::row_read(self.data, &mut offset, rid, &self.sizes))
            .collect()
    }

    /// Iterate over all rows in table order.
    #[must_use]
    pub fn iter(&'a self) -> TableIterator<'a, T> {
        TableIterator {
            table: self,
            current_row: 0,
            current_offset: 0,
        }
    }
}

impl<'a, T: RowReadable> IntoIterator for &'a MetadataTable<'a, T> {
    type Item = T;
    type IntoIter = TableIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sequential iterator over the rows of a [`MetadataTable`]
pub struct TableIterator<'a, T> {
    table: &'a MetadataTable<'a, T>,
    current_row: u32,
    current_offset: usize,
}

impl<T: RowReadable> Iterator for TableIterator<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.table.row_count {
            return None;
        }

        match T::row_read(
            self.table.data,
            &mut self.current_offset,
            self.current_row + 1,
            &self.table.sizes,
        ) {
            Ok(row) => {
                self.current_row += 1;
                Some(row)
            }
            Err(_) => None,
        }
    }
}
