//! Dex `Type` and utilities
use std::clone::Clone;
use std::fmt;

use getset::{CopyGetters, Getters};

use crate::string::DexString;
use crate::uint;

/// Index into the `TypeId`s section.
pub type TypeId = uint;

/// Represents a Java type descriptor, e.g. `Ljunit/framework/TestCase;`.
/// [Android docs](https://source.android.com/devices/tech/dalvik/dex-format#typedescriptor)
#[derive(Debug, Getters, CopyGetters)]
pub struct Type {
    #[get_copy = "pub"]
    pub(crate) id: TypeId,
    /// The type descriptor string for this type.
    #[get = "pub"]
    pub(crate) descriptor: DexString,
}

impl Clone for Type {
    fn clone(&self) -> Self {
        Type {
            id: self.id,
            descriptor: self.descriptor.clone(),
        }
    }
}

impl PartialEq<Type> for Type {
    fn eq(&self, other: &Type) -> bool {
        self.id == other.id
    }
}

impl PartialEq<str> for Type {
    fn eq(&self, other: &str) -> bool {
        *self.descriptor == *other
    }
}

impl<'a> PartialEq<&'a str> for Type {
    fn eq(&self, other: &&'a str) -> bool {
        *self.descriptor == **other
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor)
    }
}

/// Strips the surrounding `L` and `;` from a class type descriptor and replaces
/// `/` with `.`, producing the dotted class name used in `Class#method` display names.
///
/// Descriptors that aren't in `L...;` form are returned unchanged.
pub(crate) fn dotted_class_name(descriptor: &str) -> String {
    let inner = descriptor
        .strip_prefix('L')
        .and_then(|s| s.strip_suffix(';'))
        .unwrap_or(descriptor);
    inner.replace('/', ".")
}

#[cfg(test)]
mod tests {
    use super::dotted_class_name;

    #[test]
    fn strips_l_and_semicolon_and_dots_slashes() {
        assert_eq!(dotted_class_name("Lcom/ex/FooTest;"), "com.ex.FooTest");
        assert_eq!(dotted_class_name("Ljunit/framework/TestCase;"), "junit.framework.TestCase");
    }
}
