//! Dex string table: MUTF-8 decoding and id <-> string lookups.
use std::{
    convert::AsRef,
    fmt,
    ops::{Deref, Range},
};
use std::rc::Rc;

use cesu8::{from_java_cesu8, to_java_cesu8};
use scroll::{self, ctx, Pread};

use crate::{cache::Cache, error, error::Error, search::Section, source::Source, uint, Result};

/// Index into the `StringId`s section.
pub type StringId = uint;

/// Strings in a dex file are encoded as MUTF-8 code units. `DexString` wraps
/// the decoded Rust string; it's reference-counted since the same string
/// (e.g. a common type descriptor) is often looked up repeatedly.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#mutf-8)
#[derive(Debug, Hash, Eq, PartialEq, Clone, PartialOrd, Ord)]
pub struct DexString {
    string: Rc<String>,
}

impl PartialEq<str> for DexString {
    fn eq(&self, other: &str) -> bool {
        *self.string == other
    }
}

impl<'a> PartialEq<&'a str> for DexString {
    fn eq(&self, other: &&'a str) -> bool {
        *self.string == **other
    }
}

impl fmt::Display for DexString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string)
    }
}

impl From<String> for DexString {
    fn from(string: String) -> Self {
        DexString {
            string: Rc::new(string),
        }
    }
}

impl Deref for DexString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.string
    }
}

impl<'a> ctx::TryFromCtx<'a, scroll::Endian> for DexString {
    type Error = error::Error;
    type Size = usize;

    // https://source.android.com/devices/tech/dalvik/dex-format#string-data-item
    fn try_from_ctx(source: &'a [u8], _: scroll::Endian) -> Result<(Self, Self::Size)> {
        let offset = &mut 0;
        // utf16_size precedes the MUTF-8 bytes but isn't needed to decode them;
        // the string is NUL-terminated regardless.
        let _utf16_size = crate::utils::read_uleb128(source, offset)?;
        let count = source
            .iter()
            .skip(*offset)
            .take_while(|c| **c != b'\0')
            .count();
        let bytes = &source[*offset..*offset + count];
        let size = *offset + count;
        Ok((
            DexString {
                string: Rc::new(
                    from_java_cesu8(bytes)
                        .map_err(|e| Error::MalFormed(format!("malformed string: {:?}", e)))?
                        .into_owned(),
                ),
            },
            size,
        ))
    }
}

/// Memoizing accessor over the strings section: decoding MUTF-8 and resolving
/// an offset is wasted work if the same string id is looked up again, and
/// descriptors are looked up constantly while walking classes/annotations.
pub(crate) struct Strings<T> {
    source: Source<T>,
    /// Offset of the `string_ids` table.
    offset: uint,
    endian: super::Endian,
    /// Number of entries in the `string_ids` table.
    len: uint,
    cache: Cache<StringId, DexString>,
    /// Byte range of the `data` section; every `string_data_off` must land inside it.
    data_section: Range<uint>,
}

impl<T> Strings<T>
where
    T: AsRef<[u8]>,
{
    pub(crate) fn new(
        source: Source<T>,
        endian: super::Endian,
        offset: uint,
        len: uint,
        cache_size: usize,
        data_section: Range<uint>,
    ) -> Self {
        Self {
            source,
            offset,
            endian,
            len,
            cache: Cache::new(cache_size),
            data_section,
        }
    }

    fn parse(&self, id: StringId) -> Result<DexString> {
        let source = &self.source;
        let offset = self.offset as usize + id as usize * 4;
        let string_data_off: uint = source.pread_with(offset, self.endian)?;
        if !self.data_section.contains(&string_data_off) {
            return Err(Error::MalFormed(format!(
                "string_data_off {} for string id {} is outside the data section",
                string_data_off, id
            )));
        }
        source.pread(string_data_off as usize)
    }

    /// Get the string at `id`, populating the cache on a miss.
    pub(crate) fn get(&self, id: StringId) -> Result<DexString> {
        if id >= self.len {
            return Err(Error::InvalidId(format!("invalid string id: {}", id)));
        }
        if let Some(string) = self.cache.get(&id) {
            Ok((*string).clone())
        } else {
            let parsed = self.parse(id)?;
            self.cache.put(id, parsed.clone());
            Ok(parsed)
        }
    }

    /// Reverse lookup: find the `StringId` for `string`, if present. The
    /// `string_ids` table is sorted by UTF-16 code point, so this binary
    /// searches it instead of scanning linearly. Used to resolve a
    /// caller-supplied class/annotation descriptor into an id before
    /// searching the type table.
    pub(crate) fn get_id(&self, string: &str) -> Result<Option<StringId>> {
        let java_string = to_java_cesu8(string);
        let (offset, len) = (self.offset as usize, self.len as usize);
        let string_section = &self.source[offset..offset + len * std::mem::size_of::<StringId>()];
        let section = Section::new(string_section);
        let source = self.source.clone();
        let index = section.binary_search(
            &java_string,
            self.endian,
            move |data_offset: &uint, element: &std::borrow::Cow<[u8]>| {
                let mut data_offset = *data_offset as usize;
                let _ = crate::utils::read_uleb128(source.as_ref(), &mut data_offset)?;
                let value = &source[data_offset..data_offset + element.len()];
                Ok((**element).cmp(value))
            },
        )?;
        Ok(index.map(|i| i as StringId))
    }
}

impl<T> Clone for Strings<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            offset: self.offset,
            endian: self.endian,
            len: self.len,
            cache: self.cache.clone(),
            data_section: self.data_section.clone(),
        }
    }
}

/// Iterator over every string in the strings section, in id order.
pub struct StringsIter<T> {
    cache: Strings<T>,
    current: usize,
    len: usize,
}

impl<T: AsRef<[u8]>> StringsIter<T> {
    pub(crate) fn new(cache: Strings<T>, len: usize) -> Self {
        Self {
            cache,
            current: 0,
            len,
        }
    }
}

impl<T: AsRef<[u8]>> Iterator for StringsIter<T> {
    type Item = super::Result<DexString>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.len {
            return None;
        }
        let next = self.cache.get(self.current as uint);
        self.current += 1;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::Strings;
    use crate::source::Source;

    fn fixture() -> Vec<u8> {
        vec![
            0x04, 0x00, 0x00, 0x00, // string_ids[0] = data offset 4
            0x04, b'T', b'e', b's', b't', 0x00, // utf16_size=4, "Test", NUL
        ]
    }

    #[test]
    fn get_decodes_and_caches_string() {
        let strings = Strings::new(Source::new(fixture()), scroll::LE, 0, 1, 4, 4..10);
        let value = strings.get(0).expect("decodes string 0");
        assert_eq!(*value, "Test");
        assert_eq!(*strings.get(0).unwrap(), "Test");
    }

    #[test]
    fn get_rejects_out_of_range_id() {
        let strings = Strings::new(Source::new(fixture()), scroll::LE, 0, 1, 4, 4..10);
        assert!(strings.get(1).is_err());
    }
}
