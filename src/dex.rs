//! Top-level `Dex` type: header/index-table parsing and offset resolution.
use std::fs::File;
use std::ops::Range;
use std::path::Path;

use memmap2::Mmap;
use scroll::{ctx, Pread};

use crate::annotation::{
    AnnotationItem, AnnotationSetItem, AnnotationSetRefList, AnnotationsDirectoryItem,
};
use crate::class::{Class, ClassDataItem, ClassDefItemIter, ClassId};
use crate::encoded_value::EncodedArray;
use crate::error;
use crate::error::Error;
use crate::field::EncodedField;
use crate::field::Field;
use crate::field::FieldId;
use crate::field::FieldIdItem;
use crate::jtype::Type;
use crate::jtype::TypeId;
use crate::method::EncodedMethod;
use crate::method::Method;
use crate::method::MethodId;
use crate::method::MethodIdItem;
use crate::method::ProtoId;
use crate::method::ProtoIdItem;
use crate::source::Source;
use crate::string::DexString;
use crate::string::StringId;
use crate::string::Strings;
use crate::ubyte;
use crate::uint;
use crate::ulong;
use crate::ushort;
use crate::Endian;
use crate::NO_INDEX;

const DEX_MAGIC: [ubyte; 8] = [b'd', b'e', b'x', b'\n', b'0', b'3', b'5', b'\0'];
const ENDIAN_CONSTANT: uint = 0x1234_5678;

#[derive(Debug, Pread)]
struct Header {
    magic: [ubyte; 8],
    checksum: uint,
    signature: [ubyte; 20],
    file_size: uint,
    header_size: uint,
    endian_tag: uint,
    link_size: uint,
    link_off: uint,
    map_off: uint,
    string_ids_size: uint,
    string_ids_off: uint,
    type_ids_size: uint,
    type_ids_off: uint,
    proto_ids_size: uint,
    proto_ids_off: uint,
    field_ids_size: uint,
    field_ids_off: uint,
    method_ids_size: uint,
    method_ids_off: uint,
    class_defs_size: uint,
    class_defs_off: uint,
    data_size: uint,
    data_off: uint,
}

#[derive(Debug)]
pub(crate) struct DexInner {
    header: Header,
    endian: Endian,
}

impl DexInner {
    pub(crate) fn get_endian(&self) -> Endian {
        self.endian
    }

    pub(crate) fn strings_offset(&self) -> uint {
        self.header.string_ids_off
    }

    pub(crate) fn strings_len(&self) -> uint {
        self.header.string_ids_size
    }

    pub(crate) fn type_ids_offset(&self) -> uint {
        self.header.type_ids_off
    }

    pub(crate) fn type_ids_len(&self) -> uint {
        self.header.type_ids_size
    }

    pub(crate) fn proto_ids_offset(&self) -> uint {
        self.header.proto_ids_off
    }

    pub(crate) fn proto_ids_len(&self) -> uint {
        self.header.proto_ids_size
    }

    pub(crate) fn field_ids_offset(&self) -> uint {
        self.header.field_ids_off
    }

    pub(crate) fn field_ids_len(&self) -> uint {
        self.header.field_ids_size
    }

    pub(crate) fn method_ids_offset(&self) -> uint {
        self.header.method_ids_off
    }

    pub(crate) fn method_ids_len(&self) -> uint {
        self.header.method_ids_size
    }

    pub(crate) fn class_defs_offset(&self) -> uint {
        self.header.class_defs_off
    }

    pub(crate) fn class_defs_len(&self) -> uint {
        self.header.class_defs_size
    }

    pub(crate) fn data_section(&self) -> Range<uint> {
        self.header.data_off..(self.header.data_off + self.header.data_size)
    }
}

impl<'a> ctx::TryFromCtx<'a, ()> for DexInner {
    type Error = error::Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], _: ()) -> super::Result<(Self, Self::Size)> {
        if source.len() < 112 {
            return Err(Error::MalFormed("dex file too small for a header".to_string()));
        }
        if source[0..8] != DEX_MAGIC {
            return Err(Error::MalFormed("invalid dex magic in dex file".to_string()));
        }
        let endian_tag = u32::from_le_bytes([source[40], source[41], source[42], source[43]]);
        if endian_tag != ENDIAN_CONSTANT {
            return Err(Error::MalFormed(
                "invalid endian-ness/tag in dex file".to_string(),
            ));
        }
        let endian = scroll::LE;
        let header: Header = source.pread_with(0, endian)?;
        Ok((DexInner { header, endian }, 0))
    }
}

/// Parsed dex file: an immutable byte buffer plus its header/index-table
/// descriptors. Derived records are decoded lazily at query time straight out
/// of the buffer, so a `Dex` never materializes the full string/type/class
/// tables into owned vectors.
pub struct Dex<T> {
    pub(crate) source: Source<T>,
    pub(crate) strings: Strings<T>,
    pub(crate) inner: DexInner,
}

impl<T> Dex<T>
where
    T: AsRef<[u8]>,
{
    pub(crate) fn get_source_file(&self, file_id: StringId) -> super::Result<Option<DexString>> {
        if file_id == NO_INDEX {
            Ok(None)
        } else {
            Ok(Some(self.get_string(file_id)?))
        }
    }

    /// Resolves a `StringId` into its decoded (and memoized) string.
    pub fn get_string(&self, string_id: StringId) -> super::Result<DexString> {
        self.strings.get(string_id)
    }

    /// Reverse lookup: `StringId` for an exact string, if the strings table contains it.
    pub fn get_string_id(&self, string: &str) -> super::Result<Option<StringId>> {
        self.strings.get_id(string)
    }

    pub fn get_type(&self, type_id: TypeId) -> super::Result<Type> {
        if type_id >= self.inner.type_ids_len() {
            return Err(Error::InvalidId(format!("invalid type id: {}", type_id)));
        }
        let offset = self.inner.type_ids_offset() as usize + type_id as usize * 4;
        let string_id: StringId = self.source.pread_with(offset, self.get_endian())?;
        Ok(Type {
            id: type_id,
            descriptor: self.get_string(string_id)?,
        })
    }

    /// Resolves a class descriptor (e.g. `"Ljunit/framework/TestCase;"`) to its `TypeId`,
    /// if the dex file has a type with that exact descriptor.
    ///
    /// `type_ids` is sorted by descriptor content, and since `string_ids` is
    /// also sorted by content with one entry per distinct string, a type's
    /// `descriptor_index` is monotonic in the same order as `type_ids` itself
    /// — so once we have the target `StringId` we can binary search directly.
    pub fn get_type_id_by_descriptor(&self, descriptor: &str) -> super::Result<Option<TypeId>> {
        let string_id = match self.get_string_id(descriptor)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let len = self.inner.type_ids_len() as usize;
        let base = self.inner.type_ids_offset() as usize;
        let endian = self.get_endian();
        let source = &self.source;
        let (mut lo, mut hi) = (0usize, len);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let candidate: StringId = source.pread_with(base + mid * 4, endian)?;
            if candidate == string_id {
                return Ok(Some(mid as TypeId));
            } else if candidate < string_id {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(None)
    }

    pub(crate) fn get_interfaces(&self, offset: uint) -> super::Result<Vec<Type>> {
        if offset == 0 {
            return Ok(Vec::new());
        }
        let source = &self.source;
        let endian = self.get_endian();
        let off = &mut (offset as usize);
        let len: uint = source.gread_with(off, endian)?;
        let type_ids: Vec<ushort> = try_gread_vec_with!(source, off, len, endian);
        type_ids
            .iter()
            .map(|id| self.get_type(*id as TypeId))
            .collect()
    }

    pub(crate) fn get_field_item(&self, field_id: FieldId) -> super::Result<FieldIdItem> {
        if field_id >= ulong::from(self.inner.field_ids_len()) {
            return Err(error::Error::InvalidId(format!("invalid field id: {}", field_id)));
        }
        let offset = ulong::from(self.inner.field_ids_offset()) + field_id * 8;
        FieldIdItem::try_from_dex(self, offset)
    }

    pub(crate) fn get_proto_item(&self, proto_id: ProtoId) -> super::Result<ProtoIdItem> {
        if proto_id >= ulong::from(self.inner.proto_ids_len()) {
            return Err(error::Error::InvalidId(format!("invalid proto id: {}", proto_id)));
        }
        let offset = ulong::from(self.inner.proto_ids_offset()) + proto_id * 12;
        ProtoIdItem::try_from_dex(self, offset)
    }

    pub(crate) fn get_method_item(&self, method_id: MethodId) -> super::Result<MethodIdItem> {
        if method_id >= ulong::from(self.inner.method_ids_len()) {
            return Err(error::Error::InvalidId(format!(
                "invalid method id: {}",
                method_id
            )));
        }
        let offset = ulong::from(self.inner.method_ids_offset()) + method_id * 8;
        MethodIdItem::try_from_dex(self, offset)
    }

    /// Every string in the strings table, in id order.
    pub fn strings(&self) -> crate::string::StringsIter<T> {
        crate::string::StringsIter::new(self.strings.clone(), self.inner.strings_len() as usize)
    }

    pub(crate) fn get_field(
        &self,
        encoded_field: &EncodedField,
        initial_value: Option<crate::encoded_value::EncodedValue>,
        annotations: AnnotationSetItem,
    ) -> super::Result<Field> {
        Field::try_from_dex(self, encoded_field, initial_value, annotations)
    }

    pub(crate) fn get_method(
        &self,
        encoded_method: &EncodedMethod,
        annotations: AnnotationSetItem,
        param_annotations: AnnotationSetRefList,
    ) -> super::Result<Method> {
        Method::try_from_dex(self, encoded_method, annotations, param_annotations)
    }

    pub(crate) fn get_class_data(&self, offset: uint) -> super::Result<ClassDataItem> {
        if offset == 0 {
            return Ok(ClassDataItem::default());
        }
        Ok(self.source.pread_with(offset as usize, self)?)
    }

    pub(crate) fn get_static_values(&self, offset: uint) -> super::Result<EncodedArray> {
        if offset == 0 {
            return Ok(EncodedArray::default());
        }
        Ok(self
            .source
            .pread_with(offset as usize, self.get_endian())?)
    }

    pub(crate) fn get_endian(&self) -> Endian {
        self.inner.get_endian()
    }

    /// Every class defined in the file, in `class_defs` order (not necessarily
    /// a valid inheritance traversal order).
    pub fn classes(&self) -> impl Iterator<Item = super::Result<Class>> + '_ {
        let defs_len = self.inner.class_defs_len();
        let defs_offset = self.inner.class_defs_offset();
        let source = self.source.clone();
        let endian = self.get_endian();
        ClassDefItemIter::new(source, defs_offset, defs_len, endian)
            .map(move |class_def_item| Class::try_from_dex(self, &class_def_item?))
    }

    pub(crate) fn get_annotation_item(&self, annotation_off: uint) -> super::Result<AnnotationItem> {
        Ok(self.source.pread_with(annotation_off as usize, self)?)
    }

    pub(crate) fn get_annotation_set_item(
        &self,
        annotation_set_item_off: uint,
    ) -> super::Result<AnnotationSetItem> {
        Ok(self
            .source
            .pread_with(annotation_set_item_off as usize, self)?)
    }

    pub(crate) fn get_annotation_set_ref_list(
        &self,
        annotation_set_ref_list_off: uint,
    ) -> super::Result<AnnotationSetRefList> {
        Ok(self
            .source
            .pread_with(annotation_set_ref_list_off as usize, self)?)
    }

    pub(crate) fn get_annotations_directory_item(
        &self,
        annotations_directory_item_off: uint,
    ) -> super::Result<AnnotationsDirectoryItem> {
        if annotations_directory_item_off == 0 {
            return Ok(AnnotationsDirectoryItem::default());
        }
        Ok(self
            .source
            .pread_with(annotations_directory_item_off as usize, self)?)
    }
}

/// Entry point for opening a dex file (or an in-memory buffer holding one).
pub struct DexReader;

impl DexReader {
    /// Memory-maps `path` and parses its header/index tables.
    pub fn from_file<P: AsRef<Path>>(path: P) -> super::Result<Dex<Mmap>> {
        let map = unsafe { Mmap::map(&File::open(path.as_ref())?)? };
        Self::from_source(map)
    }

    /// Parses a dex file already held in memory. Mainly useful for tests and
    /// for dex bytes extracted from a container (e.g. an APK's classes.dex).
    pub fn from_bytes(bytes: Vec<u8>) -> super::Result<Dex<Vec<u8>>> {
        Self::from_source(bytes)
    }

    fn from_source<T: AsRef<[u8]>>(source: T) -> super::Result<Dex<T>> {
        let inner: DexInner = source.as_ref().pread(0)?;
        let endian = inner.get_endian();
        let source = Source::new(source);
        let strings = Strings::new(
            source.clone(),
            endian,
            inner.strings_offset(),
            inner.strings_len(),
            4096,
            inner.data_section(),
        );
        Ok(Dex {
            source,
            strings,
            inner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DexReader;

    fn empty_dex_bytes() -> Vec<u8> {
        let mut bytes = vec![0u8; 112];
        bytes[0..8].copy_from_slice(b"dex\n035\0");
        bytes[40..44].copy_from_slice(&0x1234_5678u32.to_le_bytes());
        // header_size/file_size are not validated by our parser; every
        // table size/offset field defaults to 0, which models an empty dex.
        bytes
    }

    #[test]
    fn opens_minimal_empty_dex() {
        let dex = DexReader::from_bytes(empty_dex_bytes()).expect("minimal dex should parse");
        assert_eq!(dex.classes().count(), 0);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = empty_dex_bytes();
        bytes[0] = b'X';
        assert!(DexReader::from_bytes(bytes).is_err());
    }

    #[test]
    fn rejects_byte_swapped_endian_tag() {
        let mut bytes = empty_dex_bytes();
        bytes[40..44].copy_from_slice(&[0x12, 0x34, 0x56, 0x78]);
        assert!(DexReader::from_bytes(bytes).is_err());
    }

    #[test]
    fn rejects_truncated_header() {
        let bytes = vec![0u8; 32];
        assert!(DexReader::from_bytes(bytes).is_err());
    }
}
