//! Dex `Field` and supporting structures.
use scroll::{ctx, Pread};

use crate::{
    annotation::AnnotationSetItem,
    class::ClassId,
    encoded_item::EncodedItem,
    encoded_value::EncodedValue,
    error::Error,
    jtype::Type,
    string::{DexString, StringId},
    ulong, ushort,
};
use getset::{CopyGetters, Getters};

bitflags! {
    /// Access flags of a field.
    pub struct AccessFlags: ulong {
        const PUBLIC = 0x1;
        const PRIVATE = 0x2;
        const PROTECTED = 0x4;
        const STATIC = 0x8;
        const FINAL = 0x10;
        const VOLATILE = 0x40;
        const TRANSIENT = 0x80;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

/// A field of a class.
#[derive(Debug, Getters, CopyGetters)]
pub struct Field {
    #[get = "pub"]
    name: DexString,
    #[get = "pub"]
    jtype: Type,
    #[get_copy = "pub"]
    class: ClassId,
    #[get_copy = "pub"]
    access_flags: AccessFlags,
    /// Initial value of the field, if it has one in `encoded_array`. Always
    /// `None` for non-static fields; a `None` static field is not necessarily
    /// zero/null at runtime, it may be set up in `<clinit>`.
    #[get = "pub"]
    initial_value: Option<EncodedValue>,
    #[get = "pub"]
    annotations: AnnotationSetItem,
}

impl Field {
    pub(crate) fn try_from_dex<S: AsRef<[u8]>>(
        dex: &super::Dex<S>,
        encoded_field: &EncodedField,
        initial_value: Option<EncodedValue>,
        annotations: AnnotationSetItem,
    ) -> super::Result<Self> {
        debug!(target: "field", "encoded field: {:?}", encoded_field);
        let field_item = dex.get_field_item(encoded_field.field_id)?;
        Ok(Self {
            name: dex.get_string(field_item.name_idx)?,
            jtype: dex.get_type(field_item.type_idx as u32)?,
            class: field_item.class_idx as ClassId,
            access_flags: AccessFlags::from_bits(encoded_field.access_flags).ok_or_else(|| {
                Error::InvalidId(format!(
                    "invalid access flags for field {}",
                    field_item.name_idx
                ))
            })?,
            initial_value,
            annotations,
        })
    }
}

/// `field_id_item`.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#field-id-item)
#[derive(Pread, Debug, Getters, PartialEq)]
#[get = "pub"]
pub struct FieldIdItem {
    /// Index into `type_ids` for the field's defining class.
    class_idx: ushort,
    /// Index into `type_ids` for the field's type.
    type_idx: ushort,
    /// Index into `string_ids` for the field's name.
    name_idx: StringId,
}

impl FieldIdItem {
    pub(crate) fn try_from_dex<T: AsRef<[u8]>>(
        dex: &super::Dex<T>,
        offset: ulong,
    ) -> super::Result<Self> {
        let source = &dex.source;
        Ok(source.pread_with(offset as usize, dex.get_endian())?)
    }
}

/// Index into the `field_ids` table.
pub type FieldId = ulong;

/// `encoded_field`: a `FieldId` plus access flags, as it appears in a class's
/// `static_fields`/`instance_fields` list.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#encoded-field-format)
#[derive(Debug, CopyGetters)]
#[get_copy = "pub"]
pub struct EncodedField {
    pub(crate) field_id: FieldId,
    access_flags: ulong,
}

impl EncodedItem for EncodedField {
    fn id(&self) -> ulong {
        self.field_id
    }
}

impl<'a> ctx::TryFromCtx<'a, ulong> for EncodedField {
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], prev_id: ulong) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let id = crate::utils::read_uleb128(source, offset)?;
        let access_flags = crate::utils::read_uleb128(source, offset)?;
        Ok((
            Self {
                field_id: prev_id + id,
                access_flags,
            },
            *offset,
        ))
    }
}
