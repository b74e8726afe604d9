//! Module defining constants used within the sentry CA.

/// Port the sentry gRPC server listens on when none is configured.
pub const DEFAULT_PORT: u16 = 50001;

/// Name of the environment variable holding the namespace the sentry process runs in.
///
/// The value takes part in SAN derivation for control-plane workloads that live in the
/// same namespace as sentry.
pub const NAMESPACE_ENV: &str = "NAMESPACE";

/// Namespace assumed when [`NAMESPACE_ENV`] is not set.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Trust domain returned by the insecure validator.
pub const PUBLIC_TRUST_DOMAIN: &str = "public";

/// Returns the namespace the current process runs in, read from [`NAMESPACE_ENV`].
pub fn current_namespace() -> String {
    std::env::var(NAMESPACE_ENV)
        .ok()
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned())
}
