/// Domain error shared by every illustrator crate.
///
/// The HTTP layer maps each variant to a status code: `InvalidArgument`
/// and `Validation` are client mistakes, `NotFound` is a missing file or
/// key, `Internal` is a server-side fault the client cannot fix.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An argument names something that does not exist, e.g. an unknown
    /// attribute group.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A value is malformed or out of range.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The named resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
