//! `Error` and `Result` types for this crate.
use std::fmt::{self, Display, Formatter};

pub(crate) type CowStr = ::std::borrow::Cow<'static, str>;

/// Different kinds of errors reported by most faillible operations.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// The `Display` was used after being terminated.
    NotInitialized,
    /// The operation needs a context to be current on the calling thread.
    NoCurrentContext,
    /// An enumerated value was not one the library knows about.
    InvalidEnum,
    /// A value was out of range or otherwise inconsistent with other arguments.
    InvalidValue,
    /// An allocation failed.
    OutOfMemory,
    /// The requested client API is not available on this machine.
    ApiUnavailable,
    /// The requested client API version (or profile) is not available.
    VersionUnavailable,
    /// The native window system or driver reported an error.
    PlatformError,
    /// No pixel format matches the requested framebuffer configuration.
    FormatUnavailable,
    /// The window was created without a client API, so it has no context.
    NoWindowContext,
    /// The requested standard cursor shape is not provided by the platform.
    CursorUnavailable,
    /// The platform does not support the requested feature.
    FeatureUnavailable,
    /// The feature exists on this platform but is not implemented here.
    FeatureUnimplemented,
    /// The requested platform backend was not compiled in or cannot run.
    PlatformUnavailable,
    /// An identifier does not refer to a live object.
    InvalidHandle,
}

/// An `ErrorKind` packed with an optional `reason` string.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Error {
    /// The error kind.
    pub kind: ErrorKind,
    /// A hopefully useful reason string, or `None` if unknown or not meaningful.
    pub reason: Option<CowStr>,
}

/// Alias to `Result<T, Error>`.
pub type Result<T> = ::std::result::Result<T, Error>;

impl ErrorKind {
    pub(crate) fn describe_quick(&self) -> &'static str {
        match *self {
            ErrorKind::NotInitialized => "The library is not initialized",
            ErrorKind::NoCurrentContext => "There is no current context",
            ErrorKind::InvalidEnum => "Invalid argument for enum parameter",
            ErrorKind::InvalidValue => "Invalid value for parameter",
            ErrorKind::OutOfMemory => "Out of memory",
            ErrorKind::ApiUnavailable => "The requested API is unavailable",
            ErrorKind::VersionUnavailable => "The requested API version is unavailable",
            ErrorKind::PlatformError => "A platform-specific error occurred",
            ErrorKind::FormatUnavailable => "The requested format is unavailable",
            ErrorKind::NoWindowContext => "The specified window has no context",
            ErrorKind::CursorUnavailable => "The specified cursor shape is unavailable",
            ErrorKind::FeatureUnavailable => "The requested feature cannot be implemented for this platform",
            ErrorKind::FeatureUnimplemented => "The requested feature has not yet been implemented for this platform",
            ErrorKind::PlatformUnavailable => "The requested platform is unavailable",
            ErrorKind::InvalidHandle => "The handle does not refer to a live object",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.describe_quick())
    }
}

impl ::std::error::Error for ErrorKind {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.kind.describe_quick())?;
        match self.reason {
            None => write!(f, " (no reason given)"),
            Some(ref s) => write!(f, ": {}", s),
        }
    }
}

impl ::std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind, reason: None, }
    }
}

pub(crate) use self::utils::*;

mod utils {
    #![allow(dead_code)]
    use super::*;

    impl Error {
        pub(crate) fn new<S: Into<CowStr>>(kind: ErrorKind, s: S) -> Self {
            Self { kind, reason: Some(s.into()), }
        }
        pub(crate) fn invalid_enum<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::InvalidEnum, s)
        }
        pub(crate) fn invalid_value<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::InvalidValue, s)
        }
        pub(crate) fn invalid_handle<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::InvalidHandle, s)
        }
        pub(crate) fn platform<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::PlatformError, s)
        }
        pub(crate) fn version_unavailable<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::VersionUnavailable, s)
        }
        pub(crate) fn no_current_context() -> Self {
            Self::new(ErrorKind::NoCurrentContext, "No context is current on this thread")
        }
        pub(crate) fn no_window_context() -> Self {
            Self::new(ErrorKind::NoWindowContext, "Cannot use a window that has no rendering context")
        }
    }

    pub(crate) fn invalid_enum<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::invalid_enum(s))
    }
    pub(crate) fn invalid_value<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::invalid_value(s))
    }
    pub(crate) fn platform_failed<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::platform(s))
    }
    pub(crate) fn version_unavailable<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::version_unavailable(s))
    }
}
