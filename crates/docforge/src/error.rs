//! Error handling for docforge.

use core::fmt;
use std::borrow::Cow;

use ecow::EcoString;

/// The kind of a docforge failure.
///
/// The variants follow how a caller is expected to react: validation errors
/// are reported before anything starts, assembly and I/O errors abort a
/// document build, network and client errors come out of the import adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrKind {
    /// The input was rejected before the operation started.
    Validation(EcoString),
    /// Building the document in memory failed.
    Assembly(EcoString),
    /// Reading or writing a file failed.
    Io(EcoString),
    /// A retryable remote failure that outlived the retry budget.
    Network(EcoString),
    /// The remote endpoint rejected the request (4xx). Never retried.
    Client {
        /// The HTTP status code.
        status: u16,
        /// Whatever detail the endpoint returned.
        detail: EcoString,
    },
    /// A settings or outline file has the wrong shape.
    DataShape(EcoString),
    /// Just a message.
    Msg(EcoString),
}

impl fmt::Display for ErrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrKind::Validation(msg) => write!(f, "invalid input: {msg}"),
            ErrKind::Assembly(msg) => write!(f, "failed to assemble document: {msg}"),
            ErrKind::Io(msg) => write!(f, "{msg}"),
            ErrKind::Network(msg) => write!(f, "request failed: {msg}"),
            ErrKind::Client { status, detail } if detail.is_empty() => {
                write!(f, "request rejected with status {status}")
            }
            ErrKind::Client { status, detail } => {
                write!(f, "request rejected with status {status}: {detail}")
            }
            ErrKind::DataShape(msg) => write!(f, "malformed data: {msg}"),
            ErrKind::Msg(msg) => write!(f, "{msg}"),
        }
    }
}

#[derive(Debug, Clone)]
struct Repr {
    loc: &'static str,
    kind: ErrKind,
}

/// An error that can occur while editing, assembling or importing.
#[derive(Clone)]
pub struct Error(Box<Repr>);

impl Error {
    /// Creates a new error at the given location.
    pub fn new(loc: &'static str, kind: ErrKind) -> Self {
        Self(Box::new(Repr { loc, kind }))
    }

    /// Creates a validation error.
    pub fn validation(loc: &'static str, msg: impl Into<EcoString>) -> Self {
        Self::new(loc, ErrKind::Validation(msg.into()))
    }

    /// Creates an assembly error.
    pub fn assembly(loc: &'static str, msg: impl Into<EcoString>) -> Self {
        Self::new(loc, ErrKind::Assembly(msg.into()))
    }

    /// Returns the location of the error.
    pub fn loc(&self) -> &'static str {
        self.0.loc
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> &ErrKind {
        &self.0.kind
    }

    /// Whether the error was raised before any work started.
    pub fn is_validation(&self) -> bool {
        matches!(self.0.kind, ErrKind::Validation(..))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.loc.is_empty() {
            write!(f, "{}", self.0.kind)
        } else {
            write!(f, "{}: {}", self.0.loc, self.0.kind)
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new("", ErrKind::Io(e.to_string().into()))
    }
}

impl From<&'static str> for Error {
    fn from(s: &'static str) -> Self {
        Error::new("", ErrKind::Msg(s.into()))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new("", ErrKind::Msg(s.into()))
    }
}

impl From<Cow<'static, str>> for Error {
    fn from(s: Cow<'static, str>) -> Self {
        Error::new("", ErrKind::Msg(s.as_ref().into()))
    }
}

/// A trait to convert a foreign error into an error kind.
pub trait ErrKindExt {
    /// Convert the error into an error kind.
    fn to_error_kind(self) -> ErrKind;
}

impl ErrKindExt for ErrKind {
    fn to_error_kind(self) -> Self {
        self
    }
}

impl ErrKindExt for std::io::Error {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Io(self.to_string().into())
    }
}

impl ErrKindExt for toml::de::Error {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::DataShape(self.message().into())
    }
}

impl ErrKindExt for toml::ser::Error {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Msg(self.to_string().into())
    }
}

impl ErrKindExt for serde_json::Error {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::DataShape(self.to_string().into())
    }
}

impl ErrKindExt for String {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Msg(self.into())
    }
}

impl ErrKindExt for &str {
    fn to_error_kind(self) -> ErrKind {
        ErrKind::Msg(self.into())
    }
}

impl ErrKindExt for Error {
    fn to_error_kind(self) -> ErrKind {
        self.0.kind
    }
}

/// A trait to add a location to a result.
pub trait WithContext<T>: Sized {
    /// Attach `loc` to the error, if any.
    fn context(self, loc: &'static str) -> crate::Result<T>;
}

impl<T, E: ErrKindExt> WithContext<T> for Result<T, E> {
    fn context(self, loc: &'static str) -> crate::Result<T> {
        self.map_err(|e| Error::new(loc, e.to_error_kind()))
    }
}

impl<T> WithContext<T> for Option<T> {
    fn context(self, loc: &'static str) -> crate::Result<T> {
        self.ok_or_else(|| Error::new(loc, ErrKind::Msg("missing value".into())))
    }
}

/// The error prelude.
pub mod prelude {
    #![allow(missing_docs)]

    pub use super::{ErrKind, Error, WithContext};
    pub use crate::Result;

    pub use ecow::eco_format as _eco_format;

    pub fn _msg(loc: &'static str, msg: ecow::EcoString) -> Error {
        Error::new(loc, ErrKind::Msg(msg))
    }

    /// Returns early with a message error located at the current file.
    #[macro_export]
    macro_rules! bail {
        ($($arg:tt)+) => {{
            let args = $crate::error::prelude::_eco_format!($($arg)+);
            return Err($crate::error::prelude::_msg(file!(), args))
        }};
    }

    pub use bail;
}
