//! Synthetic PE/CLI images.
//!
//! [`ImageBuilder`] lays out a minimal but complete PE32 DLL: DOS and NT headers, one `.text`
//! section holding the CLR header, the metadata root with `#~` (or `#-`), `#Strings`, `#US`,
//! `#GUID` and `#Blob`, and an optional strong-name signature blob. Types are described with
//! [`TypeSpec`] in `TypeDef` row order.
//!
//! The file only depends on `std`, so benchmarks and integration tests include it directly.
#![allow(dead_code)]

use std::collections::HashMap;

const FILE_ALIGNMENT: usize = 0x200;
const SECTION_ALIGNMENT: usize = 0x2000;
const TEXT_RVA: usize = 0x2000;
const TEXT_FILE_OFFSET: usize = 0x200;
const PE_HEADER_OFFSET: usize = 0x80;
const OPTIONAL_HEADER_SIZE: usize = 0xE0;
const CLR_HEADER_SIZE: usize = 72;
const STRONG_NAME_SIZE: usize = 128;

const TABLE_MODULE: u32 = 0x00;
const TABLE_TYPEREF: u32 = 0x01;
const TABLE_TYPEDEF: u32 = 0x02;
const TABLE_FIELDPTR: u32 = 0x03;
const TABLE_FIELD: u32 = 0x04;
const TABLE_METHODPTR: u32 = 0x05;
const TABLE_METHODDEF: u32 = 0x06;
const TABLE_ASSEMBLY: u32 = 0x20;
const TABLE_NESTEDCLASS: u32 = 0x29;

const MVID: [u8; 16] = [
    0x3C, 0x1F, 0x6B, 0x52, 0x9A, 0x04, 0x4E, 0x1D, 0x8B, 0x6E, 0x21, 0x55, 0x90, 0xC7, 0x3A, 0x0F,
];

/// One `TypeDef` row with its methods and fields.
#[derive(Clone)]
pub(crate) struct TypeSpec {
    name: String,
    namespace: String,
    flags: u32,
    methods: Vec<(String, u16)>,
    fields: Vec<(String, u16)>,
    enclosing: Option<u32>,
}

impl TypeSpec {
    pub(crate) fn new(name: &str, flags: u32) -> Self {
        TypeSpec {
            name: name.to_string(),
            namespace: String::new(),
            flags,
            methods: Vec::new(),
            fields: Vec::new(),
            enclosing: None,
        }
    }

    pub(crate) fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub(crate) fn method(mut self, name: &str, flags: u16) -> Self {
        self.methods.push((name.to_string(), flags));
        self
    }

    pub(crate) fn field(mut self, name: &str, flags: u16) -> Self {
        self.fields.push((name.to_string(), flags));
        self
    }

    /// Nest this type in the type at `TypeDef` row `rid`.
    pub(crate) fn nested_in(mut self, rid: u32) -> Self {
        self.enclosing = Some(rid);
        self
    }
}

enum Checksum {
    Zero,
    Computed,
    Raw(u32),
}

/// Builder for a complete module image.
pub(crate) struct ImageBuilder {
    module_name: String,
    types: Vec<TypeSpec>,
    uncompressed: bool,
    dangling_method_ptr: bool,
    cor_flags: u32,
    vtable_fixups: Option<(u32, u32)>,
    strong_name_signed: bool,
    checksum: Checksum,
    clr_directory: bool,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    /// File offset of the metadata root in every built image
    pub(crate) const METADATA_FILE_OFFSET: usize = TEXT_FILE_OFFSET + 8 + CLR_HEADER_SIZE;

    /// An IL-only module named `Scenario.dll` without types.
    pub(crate) fn new() -> Self {
        ImageBuilder {
            module_name: "Scenario.dll".to_string(),
            types: Vec::new(),
            uncompressed: false,
            dangling_method_ptr: false,
            cor_flags: 0x0000_0001,
            vtable_fixups: None,
            strong_name_signed: false,
            checksum: Checksum::Zero,
            clr_directory: true,
        }
    }

    /// Internal type `Demo.A` with a private method `M`, an internal field `F` and a nested
    /// private type `B`.
    pub(crate) fn scenario() -> Self {
        ImageBuilder::new()
            .ty(TypeSpec::new("A", 0x0000_0000)
                .namespace("Demo")
                .method("M", 0x0001)
                .field("F", 0x0003))
            .ty(TypeSpec::new("B", 0x0000_0003).nested_in(1))
    }

    /// Prepend the `<Module>` type, shifting every enclosing rid.
    pub(crate) fn with_module_type(mut self) -> Self {
        for ty in &mut self.types {
            if let Some(enclosing) = ty.enclosing.as_mut() {
                *enclosing += 1;
            }
        }
        self.types.insert(0, TypeSpec::new("<Module>", 0));
        self
    }

    pub(crate) fn module_name(mut self, name: &str) -> Self {
        self.module_name = name.to_string();
        self
    }

    pub(crate) fn ty(mut self, ty: TypeSpec) -> Self {
        self.types.push(ty);
        self
    }

    /// Emit `#-` with extra data and `FieldPtr`/`MethodPtr` indirection.
    pub(crate) fn uncompressed(mut self) -> Self {
        self.uncompressed = true;
        self
    }

    /// Append a `MethodPtr` entry of 0, owned by the last type.
    pub(crate) fn dangling_method_ptr(mut self) -> Self {
        self.dangling_method_ptr = true;
        self
    }

    pub(crate) fn cor_flags(mut self, flags: u32) -> Self {
        self.cor_flags = flags;
        self
    }

    pub(crate) fn vtable_fixups(mut self, rva: u32, size: u32) -> Self {
        self.vtable_fixups = Some((rva, size));
        self
    }

    /// Set `STRONG_NAME_SIGNED` and reserve a signature blob.
    pub(crate) fn strong_name_signed(mut self) -> Self {
        self.strong_name_signed = true;
        self
    }

    /// Store the correct PE checksum.
    pub(crate) fn checksum(mut self) -> Self {
        self.checksum = Checksum::Computed;
        self
    }

    /// Store `value` as the PE checksum, correct or not.
    pub(crate) fn raw_checksum(mut self, value: u32) -> Self {
        self.checksum = Checksum::Raw(value);
        self
    }

    /// Leave the CLR data directory empty, making the image a native PE.
    pub(crate) fn without_clr_directory(mut self) -> Self {
        self.clr_directory = false;
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let metadata = self.metadata();

        // .text: import address table placeholder, CLR header, metadata, signature
        let metadata_rva = TEXT_RVA + 8 + CLR_HEADER_SIZE;
        let mut text = vec![0u8; 8];
        let strong_name_rva = metadata_rva + metadata.len();
        let mut cor_flags = self.cor_flags;
        if self.strong_name_signed {
            cor_flags |= 0x0000_0008;
        }

        put_u32(&mut text, CLR_HEADER_SIZE as u32);
        put_u16(&mut text, 2);
        put_u16(&mut text, 5);
        put_u32(&mut text, metadata_rva as u32);
        put_u32(&mut text, metadata.len() as u32);
        put_u32(&mut text, cor_flags);
        put_u32(&mut text, 0);
        put_u32(&mut text, 0);
        put_u32(&mut text, 0);
        if self.strong_name_signed {
            put_u32(&mut text, strong_name_rva as u32);
            put_u32(&mut text, STRONG_NAME_SIZE as u32);
        } else {
            put_u32(&mut text, 0);
            put_u32(&mut text, 0);
        }
        put_u32(&mut text, 0);
        put_u32(&mut text, 0);
        let (fixups_rva, fixups_size) = self.vtable_fixups.unwrap_or((0, 0));
        put_u32(&mut text, fixups_rva);
        put_u32(&mut text, fixups_size);
        text.resize(text.len() + 16, 0);

        text.extend_from_slice(&metadata);
        if self.strong_name_signed {
            text.extend((0..STRONG_NAME_SIZE).map(|byte| byte as u8));
        }

        let virtual_size = text.len();
        let raw_size = align(virtual_size, FILE_ALIGNMENT);
        let mut image = self.headers(virtual_size, raw_size);
        image.resize(TEXT_FILE_OFFSET, 0);
        image.extend_from_slice(&text);
        image.resize(TEXT_FILE_OFFSET + raw_size, 0);

        let checksum_offset = PE_HEADER_OFFSET + 4 + 20 + 64;
        let checksum = match self.checksum {
            Checksum::Zero => 0,
            Checksum::Computed => checksum(&image, checksum_offset),
            Checksum::Raw(value) => value,
        };
        image[checksum_offset..checksum_offset + 4].copy_from_slice(&checksum.to_le_bytes());

        image
    }

    fn headers(&self, virtual_size: usize, raw_size: usize) -> Vec<u8> {
        let mut image = Vec::with_capacity(TEXT_FILE_OFFSET);

        // DOS header
        image.extend_from_slice(b"MZ");
        image.resize(0x3C, 0);
        put_u32(&mut image, PE_HEADER_OFFSET as u32);
        image.resize(PE_HEADER_OFFSET, 0);

        // COFF header: i386, one section, executable 32-bit DLL
        image.extend_from_slice(b"PE\0\0");
        put_u16(&mut image, 0x014C);
        put_u16(&mut image, 1);
        put_u32(&mut image, 0);
        put_u32(&mut image, 0);
        put_u32(&mut image, 0);
        put_u16(&mut image, OPTIONAL_HEADER_SIZE as u16);
        put_u16(&mut image, 0x2102);

        // PE32 standard fields
        put_u16(&mut image, 0x010B);
        image.push(8);
        image.push(0);
        put_u32(&mut image, raw_size as u32);
        put_u32(&mut image, 0);
        put_u32(&mut image, 0);
        put_u32(&mut image, 0);
        put_u32(&mut image, TEXT_RVA as u32);
        put_u32(&mut image, (TEXT_RVA + align(virtual_size, SECTION_ALIGNMENT)) as u32);

        // Windows fields
        put_u32(&mut image, 0x1000_0000);
        put_u32(&mut image, SECTION_ALIGNMENT as u32);
        put_u32(&mut image, FILE_ALIGNMENT as u32);
        put_u16(&mut image, 4);
        put_u16(&mut image, 0);
        put_u16(&mut image, 0);
        put_u16(&mut image, 0);
        put_u16(&mut image, 4);
        put_u16(&mut image, 0);
        put_u32(&mut image, 0);
        put_u32(&mut image, (TEXT_RVA + align(virtual_size, SECTION_ALIGNMENT)) as u32);
        put_u32(&mut image, TEXT_FILE_OFFSET as u32);
        put_u32(&mut image, 0);
        put_u16(&mut image, 3);
        put_u16(&mut image, 0x8540);
        put_u32(&mut image, 0x0010_0000);
        put_u32(&mut image, 0x1000);
        put_u32(&mut image, 0x0010_0000);
        put_u32(&mut image, 0x1000);
        put_u32(&mut image, 0);
        put_u32(&mut image, 16);

        // data directories, only the CLR runtime header (14) is set
        for index in 0..16 {
            if index == 14 && self.clr_directory {
                put_u32(&mut image, (TEXT_RVA + 8) as u32);
                put_u32(&mut image, CLR_HEADER_SIZE as u32);
            } else {
                put_u32(&mut image, 0);
                put_u32(&mut image, 0);
            }
        }

        // section table
        image.extend_from_slice(b".text\0\0\0");
        put_u32(&mut image, virtual_size as u32);
        put_u32(&mut image, TEXT_RVA as u32);
        put_u32(&mut image, raw_size as u32);
        put_u32(&mut image, TEXT_FILE_OFFSET as u32);
        put_u32(&mut image, 0);
        put_u32(&mut image, 0);
        put_u16(&mut image, 0);
        put_u16(&mut image, 0);
        put_u32(&mut image, 0x6000_0020);

        image
    }

    fn metadata(&self) -> Vec<u8> {
        let mut strings = StringHeap::default();
        let tables = self.tables(&mut strings);
        let mut strings = strings.data;
        strings.resize(align(strings.len(), 4), 0);

        let mut guids = Vec::new();
        guids.extend_from_slice(&MVID);

        // field signature `int32` at 1, method signature `void ()` at 4
        let blobs = vec![0x00, 0x02, 0x06, 0x08, 0x03, 0x00, 0x00, 0x01];
        let user_strings = vec![0u8; 4];

        let tables_name = if self.uncompressed { "#-" } else { "#~" };
        let streams: [(&str, &[u8]); 5] = [
            (tables_name, &tables),
            ("#Strings", &strings),
            ("#US", &user_strings),
            ("#GUID", &guids),
            ("#Blob", &blobs),
        ];

        let version = b"v4.0.30319\0\0";
        let directory_size: usize = streams
            .iter()
            .map(|(name, _)| 8 + align(name.len() + 1, 4))
            .sum();
        let mut offset = 16 + version.len() + 4 + directory_size;

        let mut root = Vec::new();
        put_u32(&mut root, 0x424A_5342);
        put_u16(&mut root, 1);
        put_u16(&mut root, 1);
        put_u32(&mut root, 0);
        put_u32(&mut root, version.len() as u32);
        root.extend_from_slice(version);
        put_u16(&mut root, 0);
        put_u16(&mut root, streams.len() as u16);

        for (name, data) in &streams {
            put_u32(&mut root, offset as u32);
            put_u32(&mut root, data.len() as u32);
            root.extend_from_slice(name.as_bytes());
            root.resize(root.len() + align(name.len() + 1, 4) - name.len(), 0);
            offset += data.len();
        }
        for (_, data) in &streams {
            root.extend_from_slice(data);
        }

        root
    }

    fn tables(&self, strings: &mut StringHeap) -> Vec<u8> {
        let method_count: usize = self.types.iter().map(|ty| ty.methods.len()).sum();
        let field_count: usize = self.types.iter().map(|ty| ty.fields.len()).sum();
        assert!(self.types.len() < 0x3FFF, "type count needs wide coded indexes");

        let method_ptrs = if self.uncompressed || self.dangling_method_ptr {
            method_count + usize::from(self.dangling_method_ptr)
        } else {
            0
        };
        let field_ptrs = if self.uncompressed { field_count } else { 0 };
        let nested: Vec<(u32, u32)> = self
            .types
            .iter()
            .enumerate()
            .filter_map(|(index, ty)| ty.enclosing.map(|enclosing| (index as u32 + 1, enclosing)))
            .collect();

        let row_counts = [
            (TABLE_MODULE, 1),
            (TABLE_TYPEREF, 1),
            (TABLE_TYPEDEF, self.types.len()),
            (TABLE_FIELDPTR, field_ptrs),
            (TABLE_FIELD, field_count),
            (TABLE_METHODPTR, method_ptrs),
            (TABLE_METHODDEF, method_count),
            (TABLE_ASSEMBLY, 1),
            (TABLE_NESTEDCLASS, nested.len()),
        ];

        let mut valid = 0u64;
        let mut data = Vec::new();
        put_u32(&mut data, 0);
        data.push(2);
        data.push(0);
        data.push(if self.uncompressed { 0x40 } else { 0 });
        data.push(1);
        for (table, rows) in row_counts {
            if rows > 0 {
                valid |= 1 << table;
            }
        }
        put_u64(&mut data, valid);
        put_u64(&mut data, 0x0000_1600_3301_FA00);
        for (_, rows) in row_counts.iter().filter(|(_, rows)| *rows > 0) {
            put_u32(&mut data, *rows as u32);
        }
        if self.uncompressed {
            put_u32(&mut data, 0x0000_0000);
        }

        // Module
        let module_name = strings.add(&self.module_name);
        put_u16(&mut data, 0);
        put_u16(&mut data, module_name);
        put_u16(&mut data, 1);
        put_u16(&mut data, 0);
        put_u16(&mut data, 0);

        // TypeRef System.Object, ResolutionScope null
        let object = strings.add("Object");
        let system = strings.add("System");
        put_u16(&mut data, 0);
        put_u16(&mut data, object);
        put_u16(&mut data, system);

        // TypeDef
        let mut field_list = 1;
        let mut method_list = 1;
        for ty in &self.types {
            let name = strings.add(&ty.name);
            let namespace = strings.add(&ty.namespace);
            // TypeDefOrRef: TypeRef row 1
            let extends = if ty.name == "<Module>" { 0 } else { (1 << 2) | 1 };
            put_u32(&mut data, ty.flags);
            put_u16(&mut data, name);
            put_u16(&mut data, namespace);
            put_u16(&mut data, extends);
            put_u16(&mut data, field_list as u16);
            put_u16(&mut data, method_list as u16);
            field_list += ty.fields.len();
            method_list += ty.methods.len();
        }

        // FieldPtr, identity
        for rid in 1..=field_ptrs {
            put_u16(&mut data, rid as u16);
        }

        // Field
        for (name, flags) in self.types.iter().flat_map(|ty| &ty.fields) {
            let name = strings.add(name);
            put_u16(&mut data, *flags);
            put_u16(&mut data, name);
            put_u16(&mut data, 1);
        }

        // MethodPtr, identity plus the dangling entry
        for rid in 1..=method_count.min(method_ptrs) {
            put_u16(&mut data, rid as u16);
        }
        if self.dangling_method_ptr {
            put_u16(&mut data, 0);
        }

        // MethodDef
        for (name, flags) in self.types.iter().flat_map(|ty| &ty.methods) {
            let name = strings.add(name);
            put_u32(&mut data, 0);
            put_u16(&mut data, 0);
            put_u16(&mut data, *flags);
            put_u16(&mut data, name);
            put_u16(&mut data, 4);
            put_u16(&mut data, 1);
        }

        // Assembly
        let assembly_name = strings.add(
            self.module_name
                .rsplit_once('.')
                .map_or(self.module_name.as_str(), |(stem, _)| stem),
        );
        put_u32(&mut data, 0x8004);
        put_u16(&mut data, 1);
        put_u16(&mut data, 0);
        put_u16(&mut data, 0);
        put_u16(&mut data, 0);
        put_u32(&mut data, 0);
        put_u16(&mut data, 0);
        put_u16(&mut data, assembly_name);
        put_u16(&mut data, 0);

        // NestedClass, sorted by nested rid
        for (nested, enclosing) in nested {
            put_u16(&mut data, nested as u16);
            put_u16(&mut data, enclosing as u16);
        }

        data.resize(align(data.len(), 4), 0);
        assert!(strings.data.len() < 0x1_0000, "strings need wide heap indexes");
        data
    }
}

#[derive(Default)]
struct StringHeap {
    data: Vec<u8>,
    index: HashMap<String, u16>,
}

impl StringHeap {
    fn add(&mut self, value: &str) -> u16 {
        if self.data.is_empty() {
            self.data.push(0);
        }
        if value.is_empty() {
            return 0;
        }
        if let Some(offset) = self.index.get(value) {
            return *offset;
        }

        let offset = self.data.len() as u16;
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        self.index.insert(value.to_string(), offset);
        offset
    }
}

fn checksum(data: &[u8], checksum_offset: usize) -> u32 {
    let mut sum: u64 = 0;
    for (index, chunk) in data.chunks(2).enumerate() {
        let offset = index * 2;
        if offset >= checksum_offset && offset < checksum_offset + 4 {
            continue;
        }
        let word = match chunk {
            [low, high] => u16::from_le_bytes([*low, *high]),
            [low] => u16::from(*low),
            _ => 0,
        };
        sum += u64::from(word);
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum = (sum & 0xFFFF) + (sum >> 16);

    (sum as u32).wrapping_add(data.len() as u32)
}

fn align(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

fn put_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(buffer: &mut Vec<u8>, value: u64) {
    buffer.extend_from_slice(&value.to_le_bytes());
}
