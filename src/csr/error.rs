//! Error type for CSR inspection.

use x509_parser::error::X509Error;

/// An error that may arise decoding and validating a certificate signing request.
///
/// The display strings are returned to the caller, so they only ever describe
/// the caller's own input.
#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum CsrError {
    /// The input holds no PEM block.
    #[error("invalid certificate signing request")]
    MissingPemBlock,

    /// The PEM block is neither a certificate request nor the legacy label.
    #[error("invalid certificate signing request")]
    UnexpectedPemTag(String),

    /// The PEM contents are not a PKCS#10 request.
    #[error("failed to parse certificate signing request: {0}")]
    Parse(#[from] X509Error),

    /// The PEM contents continue past the end of the request.
    #[error("failed to parse certificate signing request: trailing data")]
    TrailingData,

    /// The request is not signed by the key it carries.
    #[error("invalid signature")]
    InvalidSignature,
}
