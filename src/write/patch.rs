//! Native-aware writing: in-place patching of attribute words.
//!
//! Mixed-mode images hold native code, relocations and vtable fixups that this crate does not
//! model. Instead of re-emitting anything, the original image is copied as is and only the
//! attribute-word bytes of rows whose visibility changed are overwritten.

use crate::{
    file::io::write_le_at,
    metadata::{
        streams::TablesHeader,
        tables::{FieldRaw, MethodDefRaw, TableId, TypeDefRaw, METHOD_DEF_FLAGS_OFFSET},
    },
    write::AttributeWords,
    Error::OutOfBounds,
    Result,
};

/// Patch the changed attribute words into `image`, a copy of the module's source image whose
/// tables stream starts at `tables_offset`. Returns the number of rows patched.
///
/// # Errors
/// Returns a format error if a row cannot be decoded, or [`crate::Error::OutOfBounds`] if a
/// row lies outside `image`.
pub(crate) fn patch_attribute_words(
    image: &mut [u8],
    tables_offset: usize,
    tables: &TablesHeader,
    words: &AttributeWords,
) -> Result<usize> {
    if tables_offset + tables.data().len() > image.len() {
        return Err(OutOfBounds);
    }

    let mut patched = 0;
    if let Some(layout) = tables.layout(TableId::TypeDef) {
        for row in tables.rows::<TypeDefRaw>(TableId::TypeDef)? {
            match words.types.get(&row.rid) {
                Some(&flags) if flags != row.flags => {
                    let mut offset = tables_offset + layout.offset + row.offset;
                    write_le_at(image, &mut offset, flags)?;
                    patched += 1;
                }
                _ => {}
            }
        }
    }

    if let Some(layout) = tables.layout(TableId::MethodDef) {
        for row in tables.rows::<MethodDefRaw>(TableId::MethodDef)? {
            match words.methods.get(&row.rid) {
                Some(&flags) if u32::from(flags) != row.flags => {
                    let mut offset =
                        tables_offset + layout.offset + row.offset + METHOD_DEF_FLAGS_OFFSET;
                    write_le_at(image, &mut offset, flags)?;
                    patched += 1;
                }
                _ => {}
            }
        }
    }

    if let Some(layout) = tables.layout(TableId::Field) {
        for row in tables.rows::<FieldRaw>(TableId::Field)? {
            match words.fields.get(&row.rid) {
                Some(&flags) if u32::from(flags) != row.flags => {
                    let mut offset = tables_offset + layout.offset + row.offset;
                    write_le_at(image, &mut offset, flags)?;
                    patched += 1;
                }
                _ => {}
            }
        }
    }

    Ok(patched)
}
