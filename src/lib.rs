//! Parses Android dex files and finds xUnit-3 and xUnit-4 instrumentation
//! test method names without running bytecode.
#[macro_use]
extern crate scroll_derive;

#[macro_use]
extern crate bitflags;

#[macro_use]
extern crate log;

use scroll;

pub use error::Error;

pub use crate::dex::Dex;
pub use crate::dex::DexReader;
pub use crate::query::{find_instrumentation_tests, find_instrumentation_tests_in_apk};

#[macro_use]
mod utils;
pub mod annotation;
mod cache;
pub mod class;
mod dex;
mod encoded_item;
pub mod encoded_value;
mod error;
pub mod field;
pub mod jtype;
pub mod method;
pub mod query;
mod search;
mod source;
pub mod string;
mod zipio;

/// Index value meaning "no such index" in the fields that use it
/// (`superclass_idx`, `source_file_idx`, ...).
pub(crate) const NO_INDEX: uint = 0xffff_ffff;

#[allow(non_camel_case_types)]
pub type byte = i8;
#[allow(non_camel_case_types)]
pub type uint = u32;
#[allow(non_camel_case_types)]
pub type int = i32;
#[allow(non_camel_case_types)]
pub type ushort = u16;
#[allow(non_camel_case_types)]
pub type short = i16;
#[allow(non_camel_case_types)]
pub type ubyte = u8;
#[allow(non_camel_case_types)]
pub type ulong = u64;
#[allow(non_camel_case_types)]
pub type long = i64;

pub type Result<T> = std::result::Result<T, error::Error>;

// ref. https://source.android.com/devices/tech/dalvik/dex-format

pub type Endian = scroll::Endian;
