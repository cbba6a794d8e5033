use std::fmt;

/// Errors that keep a puzzle instance from being built. Expected and
/// recoverable: the caller keeps its previous instance on failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Source image reported a zero or non-finite pixel dimension.
    EmptyImage,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyImage => write!(f, "source image has no usable pixel dimensions"),
        }
    }
}

impl std::error::Error for Error {}
