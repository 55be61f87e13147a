#![forbid(unsafe_code)]

/// Errors produced by the Ulriksdal XML-DSig library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required argument was empty or missing. This is a caller bug.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid algorithm parameters: {0}")]
    InvalidAlgorithmParameters(String),

    /// The XML input does not have the shape of a signature structure.
    #[error("malformed structure: {0}")]
    MalformedStructure(String),

    #[error("canonicalization failed: {0}")]
    CanonicalizationFailed(#[source] Box<Error>),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("algorithm forbidden by secure validation: {0}")]
    ForbiddenAlgorithm(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an engine or I/O failure as a canonicalization failure.
    ///
    /// Errors that are already `CanonicalizationFailed` are returned as-is so
    /// the cause chain does not nest the same wrapper twice.
    pub fn canonicalization(cause: Error) -> Self {
        match cause {
            Error::CanonicalizationFailed(_) => cause,
            other => Error::CanonicalizationFailed(Box::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
