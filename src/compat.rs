//! Backwards-compatibility table for clients older than v1.12.
//!
//! Every rule that exists only for pre-1.12 sidecars lives here, so the whole
//! compatibility window can be closed by deleting this module and its call sites.
//! Scheduled for removal after v1.14.

/// PEM label older sidecars wrap their CSR in instead of `CERTIFICATE REQUEST`.
pub const LEGACY_CSR_PEM_TAG: &str = "CERTIFICATE";

/// A DNS SAN override for a control-plane workload.
///
/// Older sidecars matched peers on `<app-id>.<namespace>.svc.cluster.local`;
/// control-plane services were instead reached through their Kubernetes
/// service name, which is what these entries pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyDnsOverride {
    /// The app id the caller presents.
    pub app_id: &'static str,
    /// The service the issued certificate must be valid for.
    pub service: &'static str,
}

/// DNS overrides applied when the caller lives in sentry's own namespace.
///
/// Ordered; the first entry matching the app id wins.
pub const LEGACY_DNS_OVERRIDES: &[LegacyDnsOverride] = &[
    LegacyDnsOverride {
        app_id: "dapr-injector",
        service: "dapr-sidecar-injector",
    },
    LegacyDnsOverride {
        app_id: "dapr-operator",
        service: "dapr-webhook",
    },
];

/// Returns the legacy DNS SAN for `app_id`, if it is a control-plane workload
/// running in the sentry namespace.
pub fn legacy_dns_override(
    namespace: &str,
    app_id: &str,
    current_namespace: &str,
) -> Option<String> {
    if namespace != current_namespace {
        return None;
    }

    LEGACY_DNS_OVERRIDES
        .iter()
        .find(|o| o.app_id == app_id)
        .map(|o| format!("{}.{}.svc", o.service, namespace))
}

/// Builds the `trust_chain_certificates` response field.
///
/// Clients from before v1.12 do not validate the returned chain themselves and
/// read the trust anchors from here instead.
pub fn legacy_trust_chain(trust_anchors: &[u8]) -> Vec<Vec<u8>> {
    vec![trust_anchors.to_vec()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_needs_current_namespace() {
        assert_eq!(
            legacy_dns_override("default", "dapr-injector", "dapr-system"),
            None
        );
    }

    #[test]
    fn test_override_matches_control_plane() {
        assert_eq!(
            legacy_dns_override("dapr-system", "dapr-injector", "dapr-system").as_deref(),
            Some("dapr-sidecar-injector.dapr-system.svc")
        );
        assert_eq!(
            legacy_dns_override("dapr-system", "dapr-operator", "dapr-system").as_deref(),
            Some("dapr-webhook.dapr-system.svc")
        );
    }

    #[test]
    fn test_override_ignores_other_apps() {
        assert_eq!(
            legacy_dns_override("dapr-system", "dapr-placement", "dapr-system"),
            None
        );
    }

    #[test]
    fn test_legacy_trust_chain_single_entry() {
        let chain = legacy_trust_chain(b"anchors");
        assert_eq!(chain, vec![b"anchors".to_vec()]);
    }
}
