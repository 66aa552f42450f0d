//! Dex `EncodedValue` and its container, `EncodedArray`.
//!
//! Per the dex format, the scalar and reference value kinds (byte, short, char,
//! int, long, float, double, string, type, field, method, enum) are each an
//! opaque blob of `value_arg + 1` bytes. None of our queries resolve a field's
//! initial value or an annotation element's payload, so these are kept as raw
//! bytes tagged by their `value_type` rather than eagerly resolved into `Field`,
//! `Method`, `Type` or `DexString` values the way a general-purpose dex library
//! would. The container kinds (array, annotation, null, boolean) are decoded
//! recursively since their *shape* does affect how many bytes follow.
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use scroll::{self, ctx, Pread};

use crate::{annotation::EncodedAnnotation, error::Error, ubyte, Endian, Result};

/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#value-formats)
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub(crate) enum ValueType {
    Byte = 0x00,
    Short = 0x02,
    Char = 0x03,
    Int = 0x04,
    Long = 0x06,
    Float = 0x10,
    Double = 0x11,
    MethodType = 0x15,
    MethodHandle = 0x16,
    String = 0x17,
    Type = 0x18,
    Field = 0x19,
    Method = 0x1a,
    Enum = 0x1b,
    Array = 0x1c,
    Annotation = 0x1d,
    Null = 0x1e,
    Boolean = 0x1f,
}

/// A value appearing in a field's initial value, an encoded array, or an
/// annotation element.
#[derive(Debug, PartialEq)]
pub enum EncodedValue {
    /// One of the scalar/reference kinds (`0x00..=0x1b`), kept as the raw
    /// `value_arg + 1` byte payload tagged by its value type byte.
    Scalar { value_type: ubyte, bytes: Vec<ubyte> },
    Array(Vec<EncodedValue>),
    Annotation(EncodedAnnotation),
    Null,
    Boolean(bool),
}

impl<'a> ctx::TryFromCtx<'a, Endian> for EncodedValue {
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], endian: Endian) -> Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let header: ubyte = source.gread(offset)?;
        let value_arg = (header >> 5) as usize;
        let value_type_tag = 0b0001_1111 & header;
        let value_type = ValueType::from_u8(value_type_tag).ok_or_else(|| {
            Error::MalFormed(format!("Invalid encoded value type: {}", value_type_tag))
        })?;
        debug!(target: "encoded-value", "value type: {:?}, value_arg: {}", value_type, value_arg);
        let value = match value_type {
            ValueType::Array => {
                let encoded_array: EncodedArray = source.gread_with(offset, endian)?;
                EncodedValue::Array(encoded_array.values)
            }
            ValueType::Annotation => EncodedValue::Annotation(source.gread_with(offset, endian)?),
            ValueType::Null => EncodedValue::Null,
            ValueType::Boolean => EncodedValue::Boolean(value_arg != 0),
            _ => {
                let len = value_arg + 1;
                if *offset + len > source.len() {
                    return Err(Error::Scroll(scroll::Error::TooBig {
                        size: *offset + len,
                        len: source.len(),
                    }));
                }
                let bytes = source[*offset..*offset + len].to_vec();
                *offset += len;
                EncodedValue::Scalar {
                    value_type: value_type_tag,
                    bytes,
                }
            }
        };
        Ok((value, *offset))
    }
}

/// List of `EncodedValue`s, used for field initial-value arrays and array-typed
/// annotation elements.
#[derive(Debug, Default, PartialEq)]
pub struct EncodedArray {
    values: Vec<EncodedValue>,
}

impl EncodedArray {
    pub(crate) fn into_values(self) -> Vec<EncodedValue> {
        self.values
    }
}

impl<'a> ctx::TryFromCtx<'a, Endian> for EncodedArray {
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], endian: Endian) -> Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let size = crate::utils::read_uleb128(source, offset)?;
        let mut values = Vec::with_capacity(size as usize);
        for _ in 0..size {
            values.push(source.gread_with(offset, endian)?);
        }
        Ok((Self { values }, *offset))
    }
}

#[cfg(test)]
mod tests {
    use super::{EncodedValue, ValueType};
    use scroll::Pread;

    #[test]
    fn decodes_byte_scalar() {
        // header: value_arg=0 (1 byte follows), value_type=Byte (0x00).
        let bytes: &[u8] = &[0x00u8, 0x2a];
        let value: EncodedValue = bytes.pread_with(0, scroll::LE).unwrap();
        assert_eq!(
            value,
            EncodedValue::Scalar {
                value_type: ValueType::Byte as u8,
                bytes: vec![0x2a],
            }
        );
    }

    #[test]
    fn decodes_boolean_value_from_value_arg() {
        // header: value_arg=1, value_type=Boolean (0x1f) -> true, no trailing byte.
        let bytes: &[u8] = &[(1 << 5) | 0x1f];
        let value: EncodedValue = bytes.pread_with(0, scroll::LE).unwrap();
        assert_eq!(value, EncodedValue::Boolean(true));
    }

    #[test]
    fn rejects_unknown_value_type_tag() {
        // 0x01 is not a valid value_type (valid tags skip it, see ValueType).
        let bytes: &[u8] = &[0x01u8];
        let result: Result<EncodedValue, _> = bytes.pread_with(0, scroll::LE);
        assert!(result.is_err());
    }
}
