//! Cumulative-index decoding shared by `EncodedField` and `EncodedMethod` lists.
//!
//! The DEX format stores each item's `field_idx`/`method_idx` as a delta from the
//! previous item's *absolute* index, resetting to zero at the start of each of the
//! four sub-lists in a class's data (`static_fields`, `instance_fields`,
//! `direct_methods`, `virtual_methods`). `decode_cumulative` folds that delta back
//! into an absolute index while decoding.
use scroll::ctx;
use scroll::Pread;

use crate::error::Error;
use crate::ulong;

pub(crate) trait EncodedItem {
    fn id(&self) -> ulong;
}

pub(crate) fn decode_cumulative<'a, T>(
    source: &'a [u8],
    offset: &mut usize,
    count: ulong,
) -> super::Result<Vec<T>>
where
    T: EncodedItem + ctx::TryFromCtx<'a, ulong, Size = usize, Error = Error>,
{
    let mut prev: ulong = 0;
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let item: T = source.gread_with(offset, prev)?;
        prev = item.id();
        items.push(item);
    }
    Ok(items)
}
