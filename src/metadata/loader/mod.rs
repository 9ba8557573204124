//! Metadata loader.
//!
//! Turns a PE image into a [`Module`]: the COR20 header and metadata root are parsed, the
//! declaration tables (`Module`, `TypeDef`, `Field`, `MethodDef`, the `*Ptr` indirections and
//! `NestedClass`) are decoded, member runs are handed to their types and nested types are
//! moved under their enclosing types. The loader only reads; the image stays untouched.
//!
//! # Modules
//! - `members`: `FieldList`/`MethodList` run resolution, with or without `*Ptr` tables
//! - `nesting`: bottom-up assembly of the type tree from `NestedClass` rows

mod members;
mod nesting;

use log::debug;

use crate::{
    file::File,
    metadata::{
        cor20header::Cor20Header,
        module::Module,
        payload::Payload,
        root::Root,
        streams::{Guid, StreamHeader, Strings, TablesHeader},
        tables::{
            FieldPtrRaw, FieldRaw, MethodDefRaw, MethodPtrRaw, ModuleRaw, NestedClassRaw,
            TableId, TypeDefRaw,
        },
        token::Token,
        typesystem::{FieldDeclaration, MethodDeclaration, TypeDeclaration},
    },
    Error::OutOfBounds,
    Result,
};
use members::MemberPool;

/// Where the metadata of a loaded module lives inside its image.
///
/// All offsets are file offsets. The writer uses this to find the tables stream again without
/// re-parsing the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataLayout {
    /// File offset of the metadata root
    pub metadata_offset: usize,
    /// Size of the metadata as declared by the COR20 header
    pub metadata_size: usize,
    /// File offset of the tables stream
    pub tables_offset: usize,
    /// Size of the tables stream
    pub tables_size: usize,
    /// Whether the tables stream is the uncompressed `#-` variant
    pub uncompressed: bool,
}

/// Parse `file` into a [`Module`].
///
/// # Errors
/// Returns [`crate::Error::Malformed`], [`crate::Error::OutOfBounds`] or
/// [`crate::Error::UnknownTable`] when the metadata cannot be understood.
pub(crate) fn load(file: File) -> Result<Module> {
    let (clr_rva, clr_size) = file.clr();
    let clr_offset = file.rva_to_offset(clr_rva)?;
    let cor20header = Cor20Header::read(file.data_slice(clr_offset, clr_size)?)?;

    let metadata_offset = file.rva_to_offset(cor20header.meta_data_rva as usize)?;
    let metadata_size = cor20header.meta_data_size as usize;
    let metadata = file.data_slice(metadata_offset, metadata_size)?;
    let root = Root::read(metadata)?;

    let (tables_stream, uncompressed) = match (root.stream("#~"), root.stream("#-")) {
        (Some(stream), None) => (stream, false),
        (None, Some(stream)) => (stream, true),
        (Some(_), Some(_)) => {
            return Err(malformed_error!("Both #~ and #- tables streams are present"));
        }
        (None, None) => return Err(malformed_error!("No tables stream present")),
    };
    let Some(strings_stream) = root.stream("#Strings") else {
        return Err(malformed_error!("No #Strings heap present"));
    };

    let strings = Strings::from(stream_data(metadata, strings_stream)?)?;
    let guids = root
        .stream("#GUID")
        .map(|stream| stream_data(metadata, stream).and_then(Guid::from))
        .transpose()?;
    let tables = TablesHeader::from(stream_data(metadata, tables_stream)?)?;

    debug!(
        "Metadata {} with {} tables in {} stream",
        root.version,
        tables.table_count(),
        tables_stream.name
    );

    let Some(module_row) = tables.rows::<ModuleRaw>(TableId::Module)?
        .into_iter()
        .next()
    else {
        return Err(malformed_error!("Module table is missing or empty"));
    };
    let name = strings.get(module_row.name as usize)?.to_string();
    let mvid = match (module_row.mvid, &guids) {
        (0, _) => None,
        (index, Some(guids)) => Some(guids.get(index as usize)?),
        (_, None) => return Err(malformed_error!("Module MVID set without a #GUID heap")),
    };

    let fields = tables.rows::<FieldRaw>(TableId::Field)?
        .into_iter()
        .map(|row| {
            Ok(FieldDeclaration {
                token: row.token,
                name: strings.get(row.name as usize)?.to_string(),
                flags: attribute_word(row.flags, row.token)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let methods = tables.rows::<MethodDefRaw>(TableId::MethodDef)?
        .into_iter()
        .map(|row| {
            Ok(MethodDeclaration {
                token: row.token,
                name: strings.get(row.name as usize)?.to_string(),
                flags: attribute_word(row.flags, row.token)?,
                impl_flags: attribute_word(row.impl_flags, row.token)?,
                rva: row.rva,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let payload = Payload::classify(&cor20header, &methods);
    for region in payload.native_regions() {
        debug!("Native content: {region}");
    }

    let field_ptr = if tables.has_table(TableId::FieldPtr) {
        let rows = tables.rows::<FieldPtrRaw>(TableId::FieldPtr)?;
        Some(rows.into_iter().map(|row| row.field).collect())
    } else {
        None
    };
    let method_ptr = if tables.has_table(TableId::MethodPtr) {
        let rows = tables.rows::<MethodPtrRaw>(TableId::MethodPtr)?;
        Some(rows.into_iter().map(|row| row.method).collect())
    } else {
        None
    };

    let mut field_pool = MemberPool::new("field", fields, field_ptr);
    let mut method_pool = MemberPool::new("method", methods, method_ptr);

    let typedefs = tables.rows::<TypeDefRaw>(TableId::TypeDef)?;
    let mut types = Vec::with_capacity(typedefs.len());
    for (index, row) in typedefs.iter().enumerate() {
        let next = typedefs.get(index + 1);
        let field_end = next.map_or(field_pool.end(), |next| next.field_list);
        let method_end = next.map_or(method_pool.end(), |next| next.method_list);

        types.push(TypeDeclaration {
            token: row.token,
            name: strings.get(row.type_name as usize)?.to_string(),
            namespace: strings.get(row.type_namespace as usize)?.to_string(),
            flags: row.flags,
            is_nested: false,
            nested_types: Vec::new(),
            methods: method_pool.claim_run(row.token, row.method_list, method_end),
            fields: field_pool.claim_run(row.token, row.field_list, field_end),
        });
    }
    field_pool.report_unclaimed();
    method_pool.report_unclaimed();

    let nested_rows = tables.rows::<NestedClassRaw>(TableId::NestedClass)?;
    let type_count = types.len();
    let roots = nesting::build_tree(types, &nested_rows)?;

    debug!(
        "Loaded module {name}: {type_count} types ({} top level), {} nesting rows",
        roots.len(),
        nested_rows.len()
    );

    let layout = MetadataLayout {
        metadata_offset,
        metadata_size,
        tables_offset: metadata_offset + tables_stream.offset as usize,
        tables_size: tables_stream.size as usize,
        uncompressed,
    };
    let runtime_version = root.version.clone();

    Ok(Module {
        file,
        layout,
        cor20header,
        runtime_version,
        name,
        mvid,
        payload,
        types: roots,
    })
}

fn stream_data<'a>(metadata: &'a [u8], stream: &StreamHeader) -> Result<&'a [u8]> {
    let start = stream.offset as usize;
    let end = start.checked_add(stream.size as usize).ok_or(OutOfBounds)?;
    metadata.get(start..end).ok_or(OutOfBounds)
}

/// Narrow a 2-byte column back to its attribute word.
fn attribute_word(value: u32, token: Token) -> Result<u16> {
    u16::try_from(value).map_err(|_| malformed_error!("{}: attribute word 0x{:X}", token, value))
}
