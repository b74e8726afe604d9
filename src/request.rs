//! The signing request as seen by validators and the dispatcher.

use crate::proto::SignCertificateRequest;
use crate::validator::ValidatorKind;
use std::fmt;
use zeroize::Zeroize;

/// Credential presented by the caller.
///
/// The meaning of the token is defined by the validator that checks it.
///
/// This type is zeroized on drop.
#[derive(Clone, Eq, PartialEq, Zeroize)]
#[zeroize(drop)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no token was presented.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("len", &self.0.len())
            .finish()
    }
}

/// A certificate signing request received from a workload.
///
/// Built once from the wire message and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// App id of the workload.
    pub app_id: String,
    /// Namespace of the workload.
    pub namespace: String,
    /// Trust domain the workload claims, checked by validators that support it.
    pub trust_domain: String,
    /// PEM-encoded PKCS#10 request.
    pub csr: Vec<u8>,
    /// Validator the caller asked for; [`ValidatorKind::Unspecified`] selects the default.
    pub validator: ValidatorKind,
    /// Credential checked by the validator.
    pub token: AuthToken,
}

/// A wire request named a validator number this server does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownValidator(pub i32);

impl TryFrom<SignCertificateRequest> for SigningRequest {
    type Error = UnknownValidator;

    fn try_from(req: SignCertificateRequest) -> Result<Self, Self::Error> {
        let validator = ValidatorKind::from_wire(req.token_validator)
            .ok_or(UnknownValidator(req.token_validator))?;

        Ok(Self {
            app_id: req.id,
            namespace: req.namespace,
            trust_domain: req.trust_domain,
            csr: req.certificate_signing_request,
            validator,
            token: AuthToken::new(req.token),
        })
    }
}
