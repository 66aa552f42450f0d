//! Dex `Class` and supporting structures.
use getset::{CopyGetters, Getters};
use scroll::{ctx, Pread};

use crate::{
    annotation::{AnnotationSetItem, AnnotationsDirectoryItem},
    encoded_item::{decode_cumulative, EncodedItem},
    error::Error,
    field::{EncodedField, Field},
    jtype::Type,
    method::{EncodedMethod, Method},
    source::Source,
    string::DexString,
    uint,
};

/// Index into the `type_ids` table. The `Type` it resolves to must be a
/// class type, not a primitive or an array.
pub type ClassId = uint;

bitflags! {
    /// Access flags of a class.
    pub struct AccessFlags: uint {
        const PUBLIC = 0x1;
        const PRIVATE = 0x2;
        const PROTECTED = 0x4;
        const STATIC = 0x8;
        const FINAL = 0x10;
        const INTERFACE = 0x200;
        const ABSTRACT = 0x400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

/// A class defined in the dex file, assembled from a `ClassDefItem` and its
/// `ClassDataItem`.
#[derive(Debug, Getters, CopyGetters)]
pub struct Class {
    #[get_copy = "pub"]
    pub(crate) id: ClassId,
    #[get = "pub"]
    pub(crate) jtype: Type,
    #[get_copy = "pub"]
    pub(crate) access_flags: AccessFlags,
    /// `TypeId` of the superclass, or `None` for `java.lang.Object` (and
    /// interfaces, which have no superclass).
    #[get_copy = "pub"]
    pub(crate) super_class: Option<ClassId>,
    #[get = "pub"]
    pub(crate) interfaces: Vec<Type>,
    pub(crate) source_file: Option<DexString>,
    #[get = "pub"]
    pub(crate) static_fields: Vec<Field>,
    #[get = "pub"]
    pub(crate) instance_fields: Vec<Field>,
    /// Static/private methods and constructors.
    #[get = "pub"]
    pub(crate) direct_methods: Vec<Method>,
    /// Instance methods, including overrides of superclass methods.
    #[get = "pub"]
    pub(crate) virtual_methods: Vec<Method>,
    #[get = "pub"]
    pub(crate) annotations: AnnotationSetItem,
}

impl Class {
    gen_is_flag_set!(is_public, PUBLIC);
    gen_is_flag_set!(is_private, PRIVATE);
    gen_is_flag_set!(is_protected, PROTECTED);
    gen_is_flag_set!(is_static, STATIC);
    gen_is_flag_set!(is_final, FINAL);
    gen_is_flag_set!(is_interface, INTERFACE);
    gen_is_flag_set!(is_abstract, ABSTRACT);
    gen_is_flag_set!(is_synthetic, SYNTHETIC);
    gen_is_flag_set!(is_annotation, ANNOTATION);
    gen_is_flag_set!(is_enum, ENUM);

    pub fn source_file(&self) -> Option<&DexString> {
        self.source_file.as_ref()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.static_fields.iter().chain(self.instance_fields.iter())
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> + '_ {
        self.direct_methods.iter().chain(self.virtual_methods.iter())
    }

    pub(crate) fn try_from_dex<T: AsRef<[u8]>>(
        dex: &super::Dex<T>,
        class_def: &ClassDefItem,
    ) -> super::Result<Self> {
        debug!(target: "class", "loading class type {}", class_def.class_idx);
        let jtype = dex.get_type(class_def.class_idx)?;

        let AnnotationsDirectoryItem {
            class_annotations,
            field_annotations,
            method_annotations,
            parameter_annotations,
        } = dex.get_annotations_directory_item(class_def.annotations_off)?;
        let mut field_annotations = field_annotations;
        let mut method_annotations = method_annotations;
        let mut parameter_annotations = parameter_annotations;

        let mut static_values = dex
            .get_static_values(class_def.static_values_off)?
            .into_values();
        // Reverse so popping from the back yields values in field-declaration order.
        static_values.reverse();

        let class_data = dex.get_class_data(class_def.class_data_off)?;

        fn take_field_annotations(
            field_idx: u64,
            field_annotations: &mut Vec<crate::annotation::FieldAnnotation>,
        ) -> AnnotationSetItem {
            field_annotations
                .iter()
                .position(|f| f.field_idx() == field_idx)
                .map(|i| field_annotations.remove(i).into_annotations())
                .unwrap_or_default()
        }

        fn take_method_annotations(
            method_idx: u64,
            method_annotations: &mut Vec<crate::annotation::MethodAnnotation>,
        ) -> AnnotationSetItem {
            method_annotations
                .iter()
                .position(|m| m.method_idx() == method_idx)
                .map(|i| method_annotations.remove(i).into_annotations())
                .unwrap_or_default()
        }

        fn take_param_annotations(
            method_idx: u64,
            parameter_annotations: &mut Vec<crate::annotation::ParameterAnnotation>,
        ) -> crate::annotation::AnnotationSetRefList {
            parameter_annotations
                .iter()
                .position(|p| p.method_idx() == method_idx)
                .map(|i| parameter_annotations.remove(i).into_annotations())
                .unwrap_or_default()
        }

        let static_fields = class_data
            .static_fields
            .iter()
            .map(|encoded_field| {
                dex.get_field(
                    encoded_field,
                    static_values.pop(),
                    take_field_annotations(encoded_field.id(), &mut field_annotations),
                )
            })
            .collect::<super::Result<Vec<_>>>()?;

        let instance_fields = class_data
            .instance_fields
            .iter()
            .map(|encoded_field| {
                dex.get_field(
                    encoded_field,
                    None,
                    take_field_annotations(encoded_field.id(), &mut field_annotations),
                )
            })
            .collect::<super::Result<Vec<_>>>()?;

        let direct_methods = class_data
            .direct_methods
            .iter()
            .map(|encoded_method| {
                dex.get_method(
                    encoded_method,
                    take_method_annotations(encoded_method.id(), &mut method_annotations),
                    take_param_annotations(encoded_method.id(), &mut parameter_annotations),
                )
            })
            .collect::<super::Result<Vec<_>>>()?;

        let virtual_methods = class_data
            .virtual_methods
            .iter()
            .map(|encoded_method| {
                dex.get_method(
                    encoded_method,
                    take_method_annotations(encoded_method.id(), &mut method_annotations),
                    take_param_annotations(encoded_method.id(), &mut parameter_annotations),
                )
            })
            .collect::<super::Result<Vec<_>>>()?;

        let super_class = if class_def.superclass_idx == super::NO_INDEX {
            None
        } else {
            Some(class_def.superclass_idx)
        };

        Ok(Class {
            id: class_def.class_idx,
            jtype,
            super_class,
            interfaces: dex.get_interfaces(class_def.interfaces_off)?,
            access_flags: AccessFlags::from_bits(class_def.access_flags).ok_or_else(|| {
                Error::InvalidId(format!(
                    "invalid access flags for class {}",
                    class_def.class_idx
                ))
            })?,
            source_file: dex.get_source_file(class_def.source_file_idx)?,
            static_fields,
            instance_fields,
            direct_methods,
            virtual_methods,
            annotations: class_annotations,
        })
    }
}

/// `class_data_item`: the fields and methods of a class.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#class-data-item)
#[derive(Getters, Default)]
#[get = "pub"]
pub struct ClassDataItem {
    static_fields: Vec<EncodedField>,
    instance_fields: Vec<EncodedField>,
    direct_methods: Vec<EncodedMethod>,
    virtual_methods: Vec<EncodedMethod>,
}

impl<'a, S> ctx::TryFromCtx<'a, &super::Dex<S>> for ClassDataItem
where
    S: AsRef<[u8]>,
{
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], _dex: &super::Dex<S>) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let static_field_size = crate::utils::read_uleb128(source, offset)?;
        let instance_field_size = crate::utils::read_uleb128(source, offset)?;
        let direct_methods_size = crate::utils::read_uleb128(source, offset)?;
        let virtual_methods_size = crate::utils::read_uleb128(source, offset)?;

        debug!(target: "class-data", "static: {}, instance: {}, direct: {}, virtual: {}",
            static_field_size, instance_field_size, direct_methods_size, virtual_methods_size);

        Ok((
            ClassDataItem {
                static_fields: decode_cumulative(source, offset, static_field_size)?,
                instance_fields: decode_cumulative(source, offset, instance_field_size)?,
                direct_methods: decode_cumulative(source, offset, direct_methods_size)?,
                virtual_methods: decode_cumulative(source, offset, virtual_methods_size)?,
            },
            *offset,
        ))
    }
}

/// `class_def_item`: locates the contents of a class.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#class-def-item)
#[derive(Copy, Clone, Debug, Pread, CopyGetters)]
#[get_copy = "pub"]
pub struct ClassDefItem {
    pub(crate) class_idx: uint,
    pub(crate) access_flags: uint,
    /// Index into `type_ids`, or `NO_INDEX` if there is no superclass.
    pub(crate) superclass_idx: uint,
    /// Offset to a list of `TypeId`s for the interfaces this class implements.
    pub(crate) interfaces_off: uint,
    /// Index into `string_ids` for the source file name, or `NO_INDEX`.
    pub(crate) source_file_idx: uint,
    /// Offset to this class's `AnnotationsDirectoryItem`, or `0`.
    pub(crate) annotations_off: uint,
    /// Offset to this class's `ClassDataItem`, or `0` if the class has no code/fields.
    pub(crate) class_data_off: uint,
    /// Offset to the `EncodedArrayItem` of static field initial values, or `0`.
    pub(crate) static_values_off: uint,
}

/// Iterates the `class_def_item`s in the `class_defs` section in file order
/// (not necessarily a valid class hierarchy traversal order).
pub(crate) struct ClassDefItemIter<T> {
    source: Source<T>,
    offset: usize,
    len: uint,
    endian: super::Endian,
}

impl<T> ClassDefItemIter<T> {
    pub(crate) fn new(source: Source<T>, offset: uint, len: uint, endian: super::Endian) -> Self {
        Self {
            source,
            offset: offset as usize,
            len,
            endian,
        }
    }
}

impl<T: AsRef<[u8]>> Iterator for ClassDefItemIter<T> {
    type Item = super::Result<ClassDefItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let class_item: super::Result<ClassDefItem> = self
            .source
            .as_ref()
            .gread_with(&mut self.offset, self.endian)
            .map_err(Error::from);
        self.len -= 1;
        Some(class_item)
    }
}
