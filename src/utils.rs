//! Small macros shared across the domain-object modules (`class`, `field`, `method`).

/// Generates a `pub fn is_xxx(&self) -> bool` that checks a single bit of
/// `self.access_flags`. Used for the standard Java access/modifier flags.
macro_rules! gen_is_flag_set {
    ($fn_name:ident, $flag:ident) => {
        pub fn $fn_name(&self) -> bool {
            self.access_flags.contains(AccessFlags::$flag)
        }
    };
}

/// Small macro used by the item-list parsers (annotation sets, directories,
/// string/type/proto/field/method id tables) to read a `count`-prefixed list
/// of `TryFromCtx` items sharing a single context value.
macro_rules! try_gread_vec_with {
    ($source:expr, $offset:expr, $count:expr, $ctx:expr) => {{
        let count = $count as usize;
        let mut vec = Vec::with_capacity(count);
        for _ in 0..count {
            vec.push($source.gread_with($offset, $ctx)?);
        }
        vec
    }};
}

/// Reads an unsigned LEB128 value at `*offset`, advancing it past the bytes
/// consumed. A dex uleb128 never needs more than 5 bytes to hold a 32-bit
/// value, so a 6th byte with its continuation bit still set is malformed,
/// not merely large.
pub(crate) fn read_uleb128(source: &[u8], offset: &mut usize) -> crate::Result<u64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *source.get(*offset).ok_or_else(|| {
            crate::error::Error::MalFormed(format!(
                "unexpected end of input reading uleb128 at offset {}",
                offset
            ))
        })?;
        *offset += 1;
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 35 {
            return Err(crate::error::Error::MalFormed(format!(
                "uleb128 at offset {} is longer than 5 bytes",
                *offset
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::read_uleb128;

    #[test]
    fn decodes_single_byte_value() {
        let mut offset = 0;
        assert_eq!(read_uleb128(&[0x01], &mut offset).unwrap(), 1);
        assert_eq!(offset, 1);
    }

    #[test]
    fn decodes_multi_byte_value() {
        // 0xac 0x02 -> 0b0000010_0101100 = 300
        let mut offset = 0;
        assert_eq!(read_uleb128(&[0xac, 0x02], &mut offset).unwrap(), 300);
        assert_eq!(offset, 2);
    }

    #[test]
    fn rejects_sequence_longer_than_five_bytes() {
        // Continuation bit still set on the 5th byte: a 6th byte would be required.
        let mut offset = 0;
        assert!(read_uleb128(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01], &mut offset).is_err());
    }

    #[test]
    fn rejects_five_continuation_bytes_via_length_bound_not_eof() {
        // All 5 bytes have the continuation bit set and there is no 6th byte.
        // This must fail via the 5-byte bound, not merely because input ran out.
        let mut offset = 0;
        let err = read_uleb128(&[0x80, 0x80, 0x80, 0x80, 0x80], &mut offset).unwrap_err();
        assert!(matches!(err, crate::error::Error::MalFormed(_)));
    }

    #[test]
    fn accepts_five_byte_terminated_value() {
        let mut offset = 0;
        let result = read_uleb128(&[0xff, 0xff, 0xff, 0xff, 0x0f], &mut offset).unwrap();
        assert_eq!(result, 0xffff_ffff);
        assert_eq!(offset, 5);
    }
}
