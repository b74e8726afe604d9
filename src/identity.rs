//! Identity resolution: the SAN list and trust domain a workload is issued.

use crate::compat::legacy_dns_override;
use crate::csr::{PublicKey, SignatureAlgorithm};
use crate::spiffe_id::TrustDomain;

/// Everything the CA needs to know about the workload being issued a certificate.
///
/// Only built once the caller has been authenticated and its CSR has passed
/// inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Trust domain returned by the validator.
    pub trust_domain: TrustDomain,
    /// Namespace of the workload.
    pub namespace: String,
    /// App id of the workload.
    pub app_id: String,
    /// DNS SANs of the issued certificate. Always exactly one entry.
    pub dns: Vec<String>,
    /// Public key taken from the CSR.
    pub public_key: PublicKey,
    /// Signature algorithm declared by the CSR.
    pub signature_algorithm: SignatureAlgorithm,
}

/// Derives the DNS SANs for a workload.
///
/// Control-plane workloads in the sentry namespace keep their legacy service
/// name; everything else gets `<app-id>.<namespace>.svc.cluster.local`.
///
/// # Examples
///
/// ```
/// use sentry_ca::identity::resolve_dns_sans;
///
/// assert_eq!(
///     resolve_dns_sans("default", "myapp", "dapr-system"),
///     vec!["myapp.default.svc.cluster.local"]
/// );
/// assert_eq!(
///     resolve_dns_sans("dapr-system", "dapr-injector", "dapr-system"),
///     vec!["dapr-sidecar-injector.dapr-system.svc"]
/// );
/// ```
pub fn resolve_dns_sans(namespace: &str, app_id: &str, current_namespace: &str) -> Vec<String> {
    let dns = legacy_dns_override(namespace, app_id, current_namespace)
        .unwrap_or_else(|| format!("{app_id}.{namespace}.svc.cluster.local"));
    vec![dns]
}

impl ResolvedIdentity {
    /// Combines the validator's trust domain, the request coordinates and the
    /// inspected CSR into a resolved identity.
    pub fn resolve(
        trust_domain: TrustDomain,
        namespace: &str,
        app_id: &str,
        current_namespace: &str,
        public_key: PublicKey,
        signature_algorithm: SignatureAlgorithm,
    ) -> Self {
        Self {
            trust_domain,
            namespace: namespace.to_owned(),
            app_id: app_id.to_owned(),
            dns: resolve_dns_sans(namespace, app_id, current_namespace),
            public_key,
            signature_algorithm,
        }
    }
}
