use scroll;
use std::error;
use std::fmt::{self, Display};
use std::io;

#[derive(Debug)]
pub enum Error {
    MalFormed(String),
    IO(io::Error),
    InvalidId(String),
    Scroll(scroll::Error),
    /// An APK couldn't be opened as a zip archive, or didn't contain a `classes*.dex`.
    Zip(zip::result::ZipError),
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IO(ref err) => Some(err),
            Error::Scroll(ref err) => Some(err),
            Error::Zip(ref err) => Some(err),
            Error::MalFormed(_) => None,
            Error::InvalidId(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IO(err)
    }
}

impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Error {
        Error::Scroll(err)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Error {
        Error::Zip(err)
    }
}

impl Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::IO(ref err) => write!(fmt, "{}", err),
            Error::Scroll(ref err) => write!(fmt, "{}", err),
            Error::Zip(ref err) => write!(fmt, "{}", err),
            Error::MalFormed(ref msg) => write!(fmt, "Malformed entity: {}", msg),
            Error::InvalidId(ref msg) => write!(fmt, "{}", msg),
        }
    }
}
