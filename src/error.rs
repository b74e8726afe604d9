//! Error types for the signing pipeline and the server lifecycle.

use crate::ca::SignerError;
use crate::cert::error::CertificateError;
use crate::csr::error::CsrError;
use crate::metrics::FailureStage;
use crate::validator::{RegistryError, ValidatorError};
use std::net::SocketAddr;
use thiserror::Error;
use tonic::{Code, Status};

/// Why a signing request failed.
///
/// This is the single place where pipeline failures are translated into the
/// status a caller observes. Server-side causes are kept as sources for logging
/// and never appear in the display string.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SignError {
    /// No enabled validator could be selected.
    #[error(transparent)]
    Validator(#[from] RegistryError),

    /// The validator rejected the caller.
    #[error(transparent)]
    PermissionDenied(#[from] ValidatorError),

    /// The CSR was malformed or badly signed.
    #[error(transparent)]
    Csr(#[from] CsrError),

    /// The CA failed to issue the certificate.
    #[error("failed to sign certificate")]
    Sign(#[source] SignerError),

    /// The issued chain could not be encoded.
    #[error("failed to encode certificate chain")]
    Encode(#[source] CertificateError),
}

impl SignError {
    /// Returns the status code reported to the caller.
    pub fn code(&self) -> Code {
        match self {
            Self::Validator(_) | Self::Csr(_) => Code::InvalidArgument,
            Self::PermissionDenied(_) => Code::PermissionDenied,
            Self::Sign(_) | Self::Encode(_) => Code::Internal,
        }
    }

    /// Returns the pipeline stage the request failed at.
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::Validator(_) => FailureStage::Validator,
            Self::PermissionDenied(_) => FailureStage::Authentication,
            Self::Csr(_) => FailureStage::Csr,
            Self::Sign(_) => FailureStage::Sign,
            Self::Encode(_) => FailureStage::Encode,
        }
    }
}

impl From<SignError> for Status {
    fn from(err: SignError) -> Self {
        Status::new(err.code(), err.to_string())
    }
}

/// Errors returned by the server lifecycle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("could not listen on {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: SocketAddr,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// No certificate authority was configured.
    #[error("a certificate authority must be configured")]
    MissingSigner,

    /// The serve loop failed.
    #[error("failed to serve: {0}")]
    Serve(#[from] tonic::transport::Error),

    /// In-flight requests did not drain within the configured shutdown timeout.
    #[error("shutdown timeout exceeded")]
    ShutdownTimeout,

    /// The serve task panicked or was aborted.
    #[error("serve task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
