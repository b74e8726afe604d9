//! The `SignCertificate` dispatcher.

use crate::ca::{SignRequest, Signer};
use crate::cert::{encode_chain_pem, leaf_not_after};
use crate::compat::legacy_trust_chain;
use crate::csr;
use crate::error::SignError;
use crate::identity::ResolvedIdentity;
use crate::metrics::{FailureStage, MetricsRecorder};
use crate::prelude::{debug, error};
use crate::proto::ca_server::Ca;
use crate::proto::{SignCertificateRequest, SignCertificateResponse};
use crate::request::{SigningRequest, UnknownValidator};
use crate::server::builder::ServerOptions;
use crate::validator::{RegistryError, ValidatorRegistry};
use prost_types::Timestamp;
use std::fmt::Debug;
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// The `SignCertificate` request dispatcher.
///
/// Runs every request through validator selection, authentication, CSR
/// inspection, identity resolution, signing and response encoding, stopping at
/// the first failing stage.
pub struct SentryService {
    validators: ValidatorRegistry,
    ca: Arc<dyn Signer>,
    current_namespace: String,
    metrics: Option<Arc<dyn MetricsRecorder>>,
}

impl Debug for SentryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryService")
            .field("validators", &self.validators)
            .field("ca", &"<Signer>")
            .field("current_namespace", &self.current_namespace)
            .field(
                "metrics",
                &self.metrics.as_ref().map(|_| "<MetricsRecorder>"),
            )
            .finish()
    }
}

impl SentryService {
    /// Creates a dispatcher.
    pub fn new(
        validators: ValidatorRegistry,
        ca: Arc<dyn Signer>,
        current_namespace: impl Into<String>,
    ) -> Self {
        Self {
            validators,
            ca,
            current_namespace: current_namespace.into(),
            metrics: None,
        }
    }

    /// Creates a dispatcher from server options.
    pub fn from_options(options: &ServerOptions) -> Self {
        Self {
            validators: options.validators.clone(),
            ca: Arc::clone(&options.ca),
            current_namespace: options.current_namespace.clone(),
            metrics: options.metrics.clone(),
        }
    }

    /// Records counters on `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Processes a signing request end to end.
    ///
    /// Records one request counter on entry and one success or failure counter on exit.
    ///
    /// # Errors
    ///
    /// Returns the [`SignError`] of the first failing stage.
    pub async fn sign(
        &self,
        req: SignCertificateRequest,
    ) -> Result<SignCertificateResponse, SignError> {
        if let Some(m) = self.metrics.as_deref() {
            m.record_request();
        }
        let outcome = OutcomeGuard::new(self.metrics.as_deref());

        let result = self.sign_inner(req).await;

        match &result {
            Ok(_) => outcome.succeeded(),
            Err(e) => outcome.failed(e.stage()),
        }
        result
    }

    async fn sign_inner(
        &self,
        req: SignCertificateRequest,
    ) -> Result<SignCertificateResponse, SignError> {
        let req = SigningRequest::try_from(req).map_err(|UnknownValidator(value)| {
            debug!("Unknown validator requested: {}", value);
            RegistryError::NotEnabled
        })?;

        let (kind, validator) = self.validators.select(req.validator)?;

        debug!(
            "Processing SignCertificate request for {}/{} (validator: {})",
            req.namespace, req.app_id, kind
        );

        let trust_domain = validator.validate(&req).await.map_err(|e| {
            debug!(
                "Validator {} rejected {}/{}: {}",
                kind, req.namespace, req.app_id, e
            );
            e
        })?;

        let inspected = csr::inspect(&req.csr)?;

        let identity = ResolvedIdentity::resolve(
            trust_domain,
            &req.namespace,
            &req.app_id,
            &self.current_namespace,
            inspected.public_key,
            inspected.signature_algorithm,
        );

        let chain = self
            .ca
            .sign_identity(&SignRequest::from(identity))
            .await
            .map_err(|e| {
                error!("Error signing identity: {}", e);
                SignError::Sign(e)
            })?;

        let chain_pem = encode_chain_pem(&chain).map_err(|e| {
            error!("Error encoding certificate chain: {}", e);
            SignError::Encode(e)
        })?;
        let valid_until = leaf_not_after(&chain).map_err(|e| {
            error!("Error reading leaf certificate expiry: {}", e);
            SignError::Encode(e)
        })?;

        Ok(SignCertificateResponse {
            workload_certificate: chain_pem,
            trust_chain_certificates: legacy_trust_chain(self.ca.trust_anchors()),
            valid_until: Some(Timestamp {
                seconds: valid_until.unix_timestamp(),
                nanos: 0,
            }),
        })
    }
}

/// Records exactly one terminal counter per request.
///
/// Dropped without an outcome, the request counts as [`FailureStage::Cancelled`].
struct OutcomeGuard<'a> {
    metrics: Option<&'a dyn MetricsRecorder>,
}

impl<'a> OutcomeGuard<'a> {
    fn new(metrics: Option<&'a dyn MetricsRecorder>) -> Self {
        Self { metrics }
    }

    fn succeeded(mut self) {
        if let Some(m) = self.metrics.take() {
            m.record_success();
        }
    }

    fn failed(mut self, stage: FailureStage) {
        if let Some(m) = self.metrics.take() {
            m.record_failure(stage);
        }
    }
}

impl Drop for OutcomeGuard<'_> {
    fn drop(&mut self) {
        if let Some(m) = self.metrics.take() {
            debug!("Signing request dropped before completion");
            m.record_failure(FailureStage::Cancelled);
        }
    }
}

#[tonic::async_trait]
impl Ca for SentryService {
    async fn sign_certificate(
        &self,
        request: Request<SignCertificateRequest>,
    ) -> Result<Response<SignCertificateResponse>, Status> {
        self.sign(request.into_inner())
            .await
            .map(Response::new)
            .map_err(Status::from)
    }
}
