//! Structures for annotations on a `Class`, `Method`, method parameters and `Field`s.
//!
//! `EncodedAnnotation`/`AnnotationElement`/`AnnotationItem` only need the endianness
//! to decode (the value payload is kept opaque, see `encoded_value`), but the
//! directory-level items (`AnnotationSetItem`, `AnnotationsDirectoryItem`, ...) store
//! *offsets* to other sections and so need a `&Dex<S>` to follow them.
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use scroll::ctx;
use scroll::Pread;

use getset::{CopyGetters, Getters};

use crate::encoded_value::EncodedValue;
use crate::error::Error;
use crate::field::FieldId;
use crate::jtype::TypeId;
use crate::method::MethodId;
use crate::string::StringId;
use crate::{ubyte, uint, Endian};

/// Type and element values of an annotation.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#encoded-annotation)
#[derive(Debug, Getters, CopyGetters, PartialEq)]
pub struct EncodedAnnotation {
    /// Type of the annotation. Should be a class type.
    #[get_copy = "pub"]
    type_idx: TypeId,
    /// Elements of the annotation.
    #[get = "pub"]
    elements: Vec<AnnotationElement>,
}

impl<'a> ctx::TryFromCtx<'a, Endian> for EncodedAnnotation {
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], endian: Endian) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let type_idx = crate::utils::read_uleb128(source, offset)? as TypeId;
        let size = crate::utils::read_uleb128(source, offset)?;
        debug!(target: "encoded-annotation", "type: {}, size: {}", type_idx, size);
        let elements = try_gread_vec_with!(source, offset, size, endian);
        Ok((Self { type_idx, elements }, *offset))
    }
}

/// A single `name = value` pair of an annotation, e.g. `timeout = 500` in
/// `@Test(timeout = 500)`.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#annotation-element)
#[derive(Debug, Getters, CopyGetters, PartialEq)]
pub struct AnnotationElement {
    /// Index into the strings table. Must conform to
    /// <https://source.android.com/devices/tech/dalvik/dex-format#membername>.
    #[get_copy = "pub"]
    name_idx: StringId,
    #[get = "pub"]
    value: EncodedValue,
}

impl<'a> ctx::TryFromCtx<'a, Endian> for AnnotationElement {
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], endian: Endian) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let name_idx = crate::utils::read_uleb128(source, offset)? as StringId;
        debug!(target: "annotation-element", "annotation element: {}", name_idx);
        let value = source.gread_with(offset, endian)?;
        Ok((Self { name_idx, value }, *offset))
    }
}

/// Visibility of an annotation.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#visibility)
#[derive(Debug, FromPrimitive, Copy, Clone, PartialEq)]
pub enum Visibility {
    /// Visible only to the build system.
    Build = 0x0,
    /// Visible at runtime, e.g. `@Retention(RetentionPolicy.RUNTIME)`. This is
    /// the visibility JUnit's `@Test` and friends carry.
    Runtime = 0x1,
    /// Visible only to the virtual machine.
    System = 0x2,
}

/// An annotation along with its visibility.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#annotation-item)
#[derive(Debug, Getters, CopyGetters, PartialEq)]
pub struct AnnotationItem {
    #[get_copy = "pub"]
    visibility: Visibility,
    #[get = "pub"]
    annotation: EncodedAnnotation,
}

impl<'a> ctx::TryFromCtx<'a, Endian> for AnnotationItem {
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], endian: Endian) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let visibility: ubyte = source.gread(offset)?;
        debug!(target: "annotation-item", "visibility: {:?}", visibility);
        let visibility: Visibility = FromPrimitive::from_u8(visibility)
            .ok_or_else(|| Error::InvalidId(format!("Invalid annotation visibility: {}", visibility)))?;
        let annotation = source.gread_with(offset, endian)?;
        Ok((
            Self {
                visibility,
                annotation,
            },
            *offset,
        ))
    }
}

/// List of `AnnotationSetItem`s, used for method parameter annotations.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#set-ref-list)
#[derive(Debug, Default, Getters)]
#[get = "pub"]
pub struct AnnotationSetRefList {
    annotation_sets: Vec<AnnotationSetItem>,
}

impl<'a, S> ctx::TryFromCtx<'a, &super::Dex<S>> for AnnotationSetRefList
where
    S: AsRef<[u8]>,
{
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], dex: &super::Dex<S>) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let endian = dex.get_endian();
        let size: uint = source.gread_with(offset, endian)?;
        debug!(target: "annotation-set-ref-list", "size: {}", size);
        let item_offs: Vec<uint> = try_gread_vec_with!(source, offset, size, endian);
        let annotation_sets = item_offs
            .iter()
            .map(|off| dex.get_annotation_set_item(*off))
            .collect::<super::Result<_>>()?;
        Ok((Self { annotation_sets }, *offset))
    }
}

/// A set of annotations on a single element (a class, field, method, or parameter).
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#annotation-set-item)
#[derive(Debug, Default, Getters)]
#[get = "pub"]
pub struct AnnotationSetItem {
    annotations: Vec<AnnotationItem>,
}

impl<'a, S> ctx::TryFromCtx<'a, &super::Dex<S>> for AnnotationSetItem
where
    S: AsRef<[u8]>,
{
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], dex: &super::Dex<S>) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let endian = dex.get_endian();
        let size: uint = source.gread_with(offset, endian)?;
        debug!(target: "annotation-set-item", "size: {}", size);
        let item_offs: Vec<uint> = try_gread_vec_with!(source, offset, size, endian);
        let annotations = item_offs
            .iter()
            .map(|off| dex.get_annotation_item(*off))
            .collect::<super::Result<_>>()?;
        Ok((Self { annotations }, *offset))
    }
}

impl ParameterAnnotation {
    pub(crate) fn into_annotations(self) -> AnnotationSetRefList {
        self.annotations
    }
}

impl MethodAnnotation {
    pub(crate) fn into_annotations(self) -> AnnotationSetItem {
        self.annotations
    }
}

impl FieldAnnotation {
    pub(crate) fn into_annotations(self) -> AnnotationSetItem {
        self.annotations
    }
}

/// Annotations of a method's parameters.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#parameter-annotation)
#[derive(Debug, Getters, CopyGetters)]
pub struct ParameterAnnotation {
    #[get_copy = "pub"]
    method_idx: MethodId,
    #[get = "pub"]
    annotations: AnnotationSetRefList,
}

impl<'a, S> ctx::TryFromCtx<'a, &super::Dex<S>> for ParameterAnnotation
where
    S: AsRef<[u8]>,
{
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], dex: &super::Dex<S>) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let endian = dex.get_endian();
        let method_idx: uint = source.gread_with(offset, endian)?;
        let list_off: uint = source.gread_with(offset, endian)?;
        debug!(target: "parameter-annotation", "method_idx: {}, ref list offset: {}", method_idx, list_off);
        Ok((
            Self {
                method_idx: method_idx as MethodId,
                annotations: dex.get_annotation_set_ref_list(list_off)?,
            },
            *offset,
        ))
    }
}

/// Annotations of a single method.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#method-annotation)
#[derive(Debug, Getters, CopyGetters)]
pub struct MethodAnnotation {
    #[get_copy = "pub"]
    method_idx: MethodId,
    #[get = "pub"]
    annotations: AnnotationSetItem,
}

impl<'a, S> ctx::TryFromCtx<'a, &super::Dex<S>> for MethodAnnotation
where
    S: AsRef<[u8]>,
{
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], dex: &super::Dex<S>) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let endian = dex.get_endian();
        let method_idx: uint = source.gread_with(offset, endian)?;
        let set_off: uint = source.gread_with(offset, endian)?;
        debug!(target: "method-annotation", "method_idx: {}, set offset: {}", method_idx, set_off);
        Ok((
            Self {
                method_idx: method_idx as MethodId,
                annotations: dex.get_annotation_set_item(set_off)?,
            },
            *offset,
        ))
    }
}

/// Annotations of a single field. Decoded to consume the correct number of
/// bytes in the annotations directory; no query currently inspects it.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#field-annotation)
#[derive(Debug, Getters, CopyGetters)]
pub struct FieldAnnotation {
    #[get_copy = "pub"]
    field_idx: FieldId,
    #[get = "pub"]
    annotations: AnnotationSetItem,
}

impl<'a, S> ctx::TryFromCtx<'a, &super::Dex<S>> for FieldAnnotation
where
    S: AsRef<[u8]>,
{
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], dex: &super::Dex<S>) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let endian = dex.get_endian();
        let field_idx: uint = source.gread_with(offset, endian)?;
        let set_off: uint = source.gread_with(offset, endian)?;
        debug!(target: "field-annotation", "field_idx: {}, set offset: {}", field_idx, set_off);
        Ok((
            Self {
                field_idx: field_idx as FieldId,
                annotations: dex.get_annotation_set_item(set_off)?,
            },
            *offset,
        ))
    }
}

/// Annotations of a class: the class itself, its fields, methods, and method
/// parameters. One class has at most one of these, pointed to by
/// `ClassDefItem::annotations_off`.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#annotations-directory)
#[derive(Debug, Default, Getters)]
pub struct AnnotationsDirectoryItem {
    #[get = "pub"]
    pub(crate) class_annotations: AnnotationSetItem,
    #[get = "pub"]
    pub(crate) field_annotations: Vec<FieldAnnotation>,
    #[get = "pub"]
    pub(crate) method_annotations: Vec<MethodAnnotation>,
    #[get = "pub"]
    pub(crate) parameter_annotations: Vec<ParameterAnnotation>,
}

impl<'a, S> ctx::TryFromCtx<'a, &super::Dex<S>> for AnnotationsDirectoryItem
where
    S: AsRef<[u8]>,
{
    type Error = Error;
    type Size = usize;

    fn try_from_ctx(source: &'a [u8], dex: &super::Dex<S>) -> super::Result<(Self, Self::Size)> {
        let offset = &mut 0;
        let endian = dex.get_endian();
        let class_annotations_off: uint = source.gread_with(offset, endian)?;
        let fields_size: uint = source.gread_with(offset, endian)?;
        let annotated_method_size: uint = source.gread_with(offset, endian)?;
        let annotated_parameters_size: uint = source.gread_with(offset, endian)?;
        debug!(target: "annotations-directory", "fields: {}, methods: {}, params: {}",
            fields_size, annotated_method_size, annotated_parameters_size);
        let class_annotations = if class_annotations_off == 0 {
            AnnotationSetItem::default()
        } else {
            dex.get_annotation_set_item(class_annotations_off)?
        };
        let field_annotations = try_gread_vec_with!(source, offset, fields_size, dex);
        let method_annotations = try_gread_vec_with!(source, offset, annotated_method_size, dex);
        let parameter_annotations =
            try_gread_vec_with!(source, offset, annotated_parameters_size, dex);
        Ok((
            Self {
                class_annotations,
                field_annotations,
                method_annotations,
                parameter_annotations,
            },
            *offset,
        ))
    }
}
