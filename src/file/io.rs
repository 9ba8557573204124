//! Low-level little-endian reading and writing of metadata primitives.
//!
//! ECMA-335 stores every multi-byte value of the metadata layer in little-endian order, and
//! many table columns are either 2 or 4 bytes wide depending on heap and table sizes. The
//! helpers here provide bounds-checked access for both the fixed and the dynamically sized
//! case, in a read and a write flavour, so that row readers and row writers stay symmetric.
//!
//! # Examples
//!
//! ```rust,ignore
//! use publicizer::file::io::{read_le_at, write_le_at};
//!
//! let mut data = [0u8; 4];
//! let mut offset = 0;
//! write_le_at::<u16>(&mut data, &mut offset, 0x1234)?;
//!
//! let mut offset = 0;
//! assert_eq!(read_le_at::<u16>(&data, &mut offset)?, 0x1234);
//! # Ok::<(), publicizer::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Trait for primitive integers that can be moved in and out of a byte buffer.
pub trait CilIO: Sized {
    /// The fixed-size byte representation of this type
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Build a value from its little-endian representation
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Produce the little-endian representation of this value
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cil_io {
    ($($ty:ty => $len:literal),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_cil_io!(u8 => 1, u16 => 2, u32 => 4, u64 => 8);

/// Read a value of type `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Read a value of type `T` at `offset` and advance `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the read would leave `data`.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };

    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Read either a `u16` or a `u32` depending on `is_large`, widening to `u32`.
///
/// This is the shape of every heap index, table index and coded index column.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the read would leave `data`.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    let res = if is_large {
        read_le_at::<u32>(data, offset)?
    } else {
        u32::from(read_le_at::<u16>(data, offset)?)
    };

    Ok(res)
}

/// Write `value` at `offset` and advance `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the write would leave `data`.
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let bytes = value.to_le_bytes();
    let bytes = bytes.as_ref();

    let Some(end) = offset.checked_add(bytes.len()) else {
        return Err(OutOfBounds);
    };

    if end > data.len() {
        return Err(OutOfBounds);
    }

    data[*offset..end].copy_from_slice(bytes);
    *offset = end;

    Ok(())
}

/// Write `value` as either a `u16` or a `u32` depending on `is_large`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the write would leave `data`, or
/// [`crate::Error::Malformed`] if `value` does not fit a small column.
pub fn write_le_at_dyn(
    data: &mut [u8],
    offset: &mut usize,
    value: u32,
    is_large: bool,
) -> Result<()> {
    if is_large {
        write_le_at::<u32>(data, offset, value)?;
    } else {
        let Ok(small) = u16::try_from(value) else {
            return Err(malformed_error!(
                "Value 0x{:X} does not fit a 2-byte column",
                value
            ));
        };
        write_le_at::<u16>(data, offset, small)?;
    }

    Ok(())
}
