//! Dex `Method` and supporting structures.
use getset::{CopyGetters, Getters};
use scroll::{ctx, Pread};

use crate::{
    annotation::{AnnotationSetItem, AnnotationSetRefList},
    encoded_item::EncodedItem,
    error::Error,
    jtype::{Type, TypeId},
    string::{DexString, StringId},
    ulong, ushort,
};

bitflags! {
    /// Access flags of a method.
    pub struct AccessFlags: ulong {
        const PUBLIC = 0x1;
        const PRIVATE = 0x2;
        const PROTECTED = 0x4;
        const STATIC = 0x8;
        const FINAL = 0x10;
        const SYNCHRONIZED = 0x20;
        const BRIDGE = 0x40;
        const VARARGS = 0x80;
        const NATIVE = 0x100;
        const ABSTRACT = 0x400;
        const STRICT = 0x800;
        const SYNTHETIC = 0x1000;
        const CONSTRUCTOR = 0x10000;
        const DECLARED_SYNCHRONIZED = 0x20000;
    }
}

/// A method of a class.
///
/// Bytecode (`CodeItem`/`DebugInfoItem`) is out of scope: `code_offset` is
/// parsed off of `EncodedMethod` so that the byte layout of a class's data is
/// decoded correctly, but it is never followed into a `CodeItem`.
#[derive(Debug, Getters, CopyGetters)]
pub struct Method {
    #[get = "pub"]
    class: Type,
    #[get = "pub"]
    name: DexString,
    #[get_copy = "pub"]
    access_flags: AccessFlags,
    #[get = "pub"]
    params: Vec<Type>,
    /// [Shorty descriptor](https://source.android.com/devices/tech/dalvik/dex-format#shortydescriptor).
    #[get = "pub"]
    shorty: DexString,
    #[get = "pub"]
    return_type: Type,
    #[get = "pub"]
    annotations: AnnotationSetItem,
    #[get = "pub"]
    param_annotations: AnnotationSetRefList,
}

impl Method {
    gen_is_flag_set!(is_public, PUBLIC);
    gen_is_flag_set!(is_private, PRIVATE);
    gen_is_flag_set!(is_protected, PROTECTED);
    gen_is_flag_set!(is_static, STATIC);
    gen_is_flag_set!(is_final, FINAL);
    gen_is_flag_set!(is_synchronized, SYNCHRONIZED);
    gen_is_flag_set!(is_bridge, BRIDGE);
    gen_is_flag_set!(is_varargs, VARARGS);
    gen_is_flag_set!(is_native, NATIVE);
    gen_is_flag_set!(is_abstract, ABSTRACT);
    gen_is_flag_set!(is_strict, STRICT);
    gen_is_flag_set!(is_synthetic, SYNTHETIC);
    gen_is_flag_set!(is_constructor, CONSTRUCTOR);
    gen_is_flag_set!(is_declared_synchronized, DECLARED_SYNCHRONIZED);

    /// True if this is a virtual method whose name starts with `"test"`, the
    /// predicate the xUnit-3 query collects.
    pub(crate) fn looks_like_junit3_test(&self) -> bool {
        !self.is_static() && self.name.starts_with("test")
    }
}

/// Index into the `proto_ids` table.
pub type ProtoId = ulong;

/// `proto_id_item`.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#proto-id-item)
#[derive(Pread, Debug, CopyGetters, PartialEq)]
#[get_copy = "pub"]
pub struct ProtoIdItem {
    shorty: StringId,
    return_type: TypeId,
    /// Offset to the parameter type list, or `0` if the method takes no parameters.
    params_off: u32,
}

impl ProtoIdItem {
    pub(crate) fn try_from_dex<S: AsRef<[u8]>>(
        dex: &super::Dex<S>,
        offset: ulong,
    ) -> super::Result<Self> {
        Ok(dex.source.pread_with(offset as usize, dex.get_endian())?)
    }
}

impl Method {
    pub(crate) fn try_from_dex<S: AsRef<[u8]>>(
        dex: &super::Dex<S>,
        encoded_method: &EncodedMethod,
        annotations: AnnotationSetItem,
        param_annotations: AnnotationSetRefList,
    ) -> super::Result<Method> {
        debug!(target: "method", "encoded method: {:?}", encoded_method);
        let source = &dex.source;
        let method_item = dex.get_method_item(encoded_method.method_id)?;
        let name = dex.get_string(method_item.name_idx)?;
        debug!(target: "method", "name: {}, method id item: {:?}", name, method_item);
        let proto_item = dex.get_proto_item(ProtoId::from(method_item.proto_idx))?;
        let shorty = dex.get_string(proto_item.shorty)?;
        let return_type = dex.get_type(proto_item.return_type)?;
        let params = if proto_item.params_off != 0 {
            let offset = &mut (proto_item.params_off as usize);
            let endian = dex.get_endian();
            let len: u32 = source.gread_with(offset, endian)?;
            let type_ids: Vec<ushort> = try_gread_vec_with!(source, offset, len, endian);
            type_ids
                .iter()
                .map(|id| dex.get_type(*id as TypeId))
                .collect::<super::Result<_>>()?
        } else {
            Vec::new()
        };
        Ok(Self {
            name,
            class: dex.get_type(TypeId::from(method_item.class_idx))?,
            access_flags: AccessFlags::from_bits(encoded_method.access_flags).ok_or_else(|| {
                Error::InvalidId(format!(
                    "invalid access flags for method {}",
                    method_item.name_idx
                ))
            })?,
            shorty,
            return_type,
            params,
            annotations,
            param_annotations,
        })
    }
}

/// `method_id_item`.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#method-id-item)
#[derive(Pread, Debug, CopyGetters, PartialEq)]
#[get_copy = "pub"]
pub struct MethodIdItem {
    class_idx: ushort,
    proto_idx: ushort,
    name_idx: StringId,
}

impl MethodIdItem {
    pub(crate) fn try_from_dex<S: AsRef<[u8]>>(
        dex: &super::Dex<S>,
        offset: ulong,
    ) -> super::Result<Self> {
        let source = &dex.source;
        Ok(source.pread_with(offset as usize, dex.get_endian())?)
    }
}

/// Index into the `method_ids` table.
pub type MethodId = ulong;

/// `encoded_method`: a `MethodId` plus access flags and code offset, as it
/// appears in a class's `direct_methods`/`virtual_methods` list.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#encoded-method)
#[derive(Debug, Getters, CopyGetters)]
pub struct EncodedMethod {
    #[get_copy = "pub(crate)"]
    pub(crate) method_id: MethodId,
    #[get = "pub"]
    access_flags: ulong,
    /// Offset to the method's `code_item`, or `0` for abstract/native methods.
    /// Never followed: bytecode is out of scope.
    #[get = "pub"]
    code_offset: ulong,
}

impl EncodedItem for EncodedMethod {
    fn id(&self) -> ulong {
        self.method_id
    }
}

impl<'a> ctx::TryFromCtx<'a, ulong> for EncodedMethod {
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], prev_id: ulong) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let id = crate::utils::read_uleb128(source, offset)?;
        let access_flags = crate::utils::read_uleb128(source, offset)?;
        let code_offset = crate::utils::read_uleb128(source, offset)?;
        Ok((
            Self {
                method_id: prev_id + id,
                code_offset,
                access_flags,
            },
            *offset,
        ))
    }
}
