//! A validator that trusts every caller.

use crate::constants::PUBLIC_TRUST_DOMAIN;
use crate::request::SigningRequest;
use crate::spiffe_id::TrustDomain;
use crate::validator::{Validator, ValidatorError};

/// Accepts every request and places the caller in the `public` trust domain.
///
/// Meant for self-hosted development setups where no platform credential is
/// available. Never enable it on a shared cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsecureValidator;

#[tonic::async_trait]
impl Validator for InsecureValidator {
    async fn validate(&self, _req: &SigningRequest) -> Result<TrustDomain, ValidatorError> {
        TrustDomain::new(PUBLIC_TRUST_DOMAIN).map_err(|e| ValidatorError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AuthToken;
    use crate::validator::ValidatorKind;

    #[tokio::test]
    async fn test_accepts_any_caller() {
        let req = SigningRequest {
            app_id: "orders".into(),
            namespace: "default".into(),
            trust_domain: String::new(),
            csr: Vec::new(),
            validator: ValidatorKind::Insecure,
            token: AuthToken::new(""),
        };

        let td = InsecureValidator.validate(&req).await.unwrap();
        assert_eq!(td.as_ref(), "public");
    }
}
