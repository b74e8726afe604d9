//! Server configuration and its builder.

use crate::ca::Signer;
use crate::constants::{current_namespace, DEFAULT_PORT};
use crate::error::ServerError;
use crate::metrics::MetricsRecorder;
use crate::validator::{Validator, ValidatorKind, ValidatorRegistry};
use std::fmt::Debug;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

/// Configuration of the sentry server.
///
/// Use [`ServerBuilder`] for a fluent way to assemble it.
#[derive(Clone)]
pub struct ServerOptions {
    /// Address the gRPC listener binds to.
    pub bind_addr: SocketAddr,
    /// Enabled validators and the default kind.
    pub validators: ValidatorRegistry,
    /// Certificate authority issuing workload certificates.
    pub ca: Arc<dyn Signer>,
    /// Namespace sentry runs in, used for SAN derivation.
    pub current_namespace: String,
    /// Optional metrics recorder.
    pub metrics: Option<Arc<dyn MetricsRecorder>>,
    /// Optional deadline applied to every RPC by the transport.
    pub request_timeout: Option<Duration>,
    /// Optional bound on how long in-flight requests may drain at shutdown.
    ///
    /// `None` waits for all of them.
    pub shutdown_timeout: Option<Duration>,
}

impl ServerOptions {
    /// Creates options for the given CA with every other setting at its default.
    ///
    /// The server binds to `0.0.0.0:50001`, no validator is enabled, and the
    /// current namespace is read from the `NAMESPACE` environment variable.
    pub fn new(ca: Arc<dyn Signer>) -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            validators: ValidatorRegistry::default(),
            ca,
            current_namespace: current_namespace(),
            metrics: None,
            request_timeout: None,
            shutdown_timeout: None,
        }
    }
}

impl Debug for ServerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerOptions")
            .field("bind_addr", &self.bind_addr)
            .field("validators", &self.validators)
            .field("ca", &"<Signer>")
            .field("current_namespace", &self.current_namespace)
            .field(
                "metrics",
                &self.metrics.as_ref().map(|_| "<MetricsRecorder>"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

/// Builder for [`ServerOptions`].
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use sentry_ca::ca::Signer;
/// use sentry_ca::validator::{InsecureValidator, ValidatorKind};
/// use sentry_ca::ServerBuilder;
///
/// # fn example(ca: Arc<dyn Signer>) -> Result<(), Box<dyn std::error::Error>> {
/// let options = ServerBuilder::new()
///     .port(50001)
///     .with_validator(ValidatorKind::Insecure, Arc::new(InsecureValidator))
///     .default_validator(ValidatorKind::Insecure)
///     .ca(ca)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ServerBuilder {
    bind_addr: Option<SocketAddr>,
    validators: ValidatorRegistry,
    ca: Option<Arc<dyn Signer>>,
    current_namespace: Option<String>,
    metrics: Option<Arc<dyn MetricsRecorder>>,
    request_timeout: Option<Duration>,
    shutdown_timeout: Option<Duration>,
}

impl Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("bind_addr", &self.bind_addr)
            .field("validators", &self.validators)
            .field("ca", &self.ca.as_ref().map(|_| "<Signer>"))
            .field("current_namespace", &self.current_namespace)
            .field(
                "metrics",
                &self.metrics.as_ref().map(|_| "<MetricsRecorder>"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

impl ServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listens on all interfaces on the given port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.bind_addr = Some(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
        self
    }

    /// Listens on the given address.
    #[must_use]
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    /// Enables `validator` under `kind`.
    #[must_use]
    pub fn with_validator(mut self, kind: ValidatorKind, validator: Arc<dyn Validator>) -> Self {
        self.validators.register(kind, validator);
        self
    }

    /// Sets the validator used when a request does not name one.
    #[must_use]
    pub fn default_validator(mut self, kind: ValidatorKind) -> Self {
        self.validators.set_default(kind);
        self
    }

    /// Sets the certificate authority. Required.
    #[must_use]
    pub fn ca(mut self, ca: Arc<dyn Signer>) -> Self {
        self.ca = Some(ca);
        self
    }

    /// Overrides the namespace read from the `NAMESPACE` environment variable.
    #[must_use]
    pub fn current_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.current_namespace = Some(namespace.into());
        self
    }

    /// Sets a metrics recorder.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sets a deadline applied to every RPC.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Bounds how long in-flight requests may drain at shutdown.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Builds the options.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::MissingSigner`] if no CA was set.
    pub fn build(self) -> Result<ServerOptions, ServerError> {
        let ca = self.ca.ok_or(ServerError::MissingSigner)?;
        let mut options = ServerOptions::new(ca);

        if let Some(addr) = self.bind_addr {
            options.bind_addr = addr;
        }
        if let Some(namespace) = self.current_namespace {
            options.current_namespace = namespace;
        }
        options.validators = self.validators;
        options.metrics = self.metrics;
        options.request_timeout = self.request_timeout;
        options.shutdown_timeout = self.shutdown_timeout;

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::{SignRequest, SignerError};
    use crate::cert::Certificate;
    use crate::validator::InsecureValidator;

    struct NoopSigner;

    #[tonic::async_trait]
    impl Signer for NoopSigner {
        async fn sign_identity(&self, _req: &SignRequest) -> Result<Vec<Certificate>, SignerError> {
            Err(SignerError::new("not implemented"))
        }

        fn trust_anchors(&self) -> &[u8] {
            b""
        }
    }

    #[test]
    fn test_build_requires_ca() {
        let err = ServerBuilder::new().port(1234).build().unwrap_err();
        assert!(matches!(err, ServerError::MissingSigner));
    }

    #[test]
    fn test_build_applies_settings() {
        let options = ServerBuilder::new()
            .port(1234)
            .with_validator(ValidatorKind::Insecure, Arc::new(InsecureValidator))
            .default_validator(ValidatorKind::Insecure)
            .current_namespace("dapr-system")
            .shutdown_timeout(Duration::from_secs(5))
            .ca(Arc::new(NoopSigner))
            .build()
            .unwrap();

        assert_eq!(options.bind_addr.port(), 1234);
        assert_eq!(options.current_namespace, "dapr-system");
        assert_eq!(options.validators.default_kind(), ValidatorKind::Insecure);
        assert_eq!(
            options.validators.kinds().collect::<Vec<_>>(),
            vec![ValidatorKind::Insecure]
        );
        assert_eq!(options.shutdown_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.request_timeout, None);
    }

    #[test]
    fn test_default_port() {
        let options = ServerOptions::new(Arc::new(NoopSigner));
        assert_eq!(options.bind_addr.port(), DEFAULT_PORT);
    }
}
