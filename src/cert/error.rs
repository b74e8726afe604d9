//! Error types for certificate parsing and chain encoding.

use x509_parser::error::X509Error;

/// An error that may arise parsing X.509 certificates or encoding a chain.
#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum CertificateError {
    /// Error returned by the X.509 parsing library.
    #[error("failed parsing X.509 certificate")]
    ParseX509Certificate(#[from] X509Error),

    /// A certificate chain must hold at least the leaf.
    #[error("certificate chain is empty")]
    EmptyChain,
}
