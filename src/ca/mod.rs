//! The certificate authority collaborator.
//!
//! The dispatcher hands every fully resolved request to a [`Signer`]; how the
//! signer stores and rotates its keys is its own business.

use crate::cert::Certificate;
use crate::csr::{PublicKey, SignatureAlgorithm};
use crate::identity::ResolvedIdentity;
use crate::spiffe_id::{SpiffeId, SpiffeIdError, TrustDomain};
use std::error::Error as StdError;
use thiserror::Error;

/// A request to issue a workload certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    /// Public key to certify.
    pub public_key: PublicKey,
    /// Signature algorithm the workload declared in its CSR.
    pub signature_algorithm: SignatureAlgorithm,
    /// Trust domain established by the validator.
    pub trust_domain: TrustDomain,
    /// Namespace of the workload.
    pub namespace: String,
    /// App id of the workload.
    pub app_id: String,
    /// DNS SANs to include.
    pub dns: Vec<String>,
}

impl SignRequest {
    /// Returns the workload's SPIFFE ID, `spiffe://<trust-domain>/ns/<namespace>/<app-id>`.
    ///
    /// # Errors
    ///
    /// Returns a [`SpiffeIdError`] if the namespace or app id are not valid path segments.
    pub fn spiffe_id(&self) -> Result<SpiffeId, SpiffeIdError> {
        SpiffeId::from_segments(
            self.trust_domain.clone(),
            &["ns", &self.namespace, &self.app_id],
        )
    }
}

impl From<ResolvedIdentity> for SignRequest {
    fn from(identity: ResolvedIdentity) -> Self {
        Self {
            public_key: identity.public_key,
            signature_algorithm: identity.signature_algorithm,
            trust_domain: identity.trust_domain,
            namespace: identity.namespace,
            app_id: identity.app_id,
            dns: identity.dns,
        }
    }
}

/// An error reported by a [`Signer`].
///
/// Never shown to callers; the dispatcher logs it and answers with a generic message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SignerError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl SignerError {
    /// Creates an error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Issues workload certificates.
///
/// Shared read-only across all requests for the lifetime of the server.
#[tonic::async_trait]
pub trait Signer: Send + Sync + 'static {
    /// Signs a workload identity and returns the chain, leaf first.
    async fn sign_identity(&self, req: &SignRequest) -> Result<Vec<Certificate>, SignerError>;

    /// Returns the PEM-encoded trust anchors of the CA.
    fn trust_anchors(&self) -> &[u8];
}
