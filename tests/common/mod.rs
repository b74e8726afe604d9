#![allow(dead_code)]

use once_cell::sync::Lazy;
use pem::Pem;
use rcgen::{BasicConstraints, CertificateParams, IsCa, KeyPair};
use sentry_ca::cert::Certificate;
use sentry_ca::metrics::{FailureStage, MetricsRecorder};
use sentry_ca::proto::SignCertificateRequest;
use sentry_ca::request::SigningRequest;
use sentry_ca::spiffe_id::TrustDomain;
use sentry_ca::validator::{Validator, ValidatorError};
use sentry_ca::{SignRequest, Signer, SignerError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Year in which every leaf issued by [`FakeSigner`] expires, on January 1st.
pub const LEAF_EXPIRY_YEAR: i32 = 2030;

pub static CSR_PEM: Lazy<Vec<u8>> = Lazy::new(|| csr_pem("CERTIFICATE REQUEST"));

pub fn csr_der() -> Vec<u8> {
    let key = KeyPair::generate().unwrap();
    let params = CertificateParams::new(vec!["workload.test".to_owned()]).unwrap();
    params.serialize_request(&key).unwrap().der().to_vec()
}

pub fn csr_pem(tag: &str) -> Vec<u8> {
    pem::encode(&Pem::new(tag, csr_der())).into_bytes()
}

pub fn request(namespace: &str, app_id: &str, token_validator: i32) -> SignCertificateRequest {
    SignCertificateRequest {
        id: app_id.to_owned(),
        token: "token".to_owned(),
        trust_domain: "public".to_owned(),
        namespace: namespace.to_owned(),
        certificate_signing_request: CSR_PEM.clone(),
        token_validator,
    }
}

pub struct RecordingValidator {
    outcome: Result<TrustDomain, ValidatorError>,
    calls: AtomicUsize,
}

impl RecordingValidator {
    pub fn accept(trust_domain: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(TrustDomain::new(trust_domain).unwrap()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn reject(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(ValidatorError::new(reason)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[tonic::async_trait]
impl Validator for RecordingValidator {
    async fn validate(&self, _req: &SigningRequest) -> Result<TrustDomain, ValidatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

pub enum SignerBehavior {
    Issue,
    Fail,
    EmptyChain,
    Stall(Arc<Notify>),
    Slow(Arc<Notify>, Duration),
    LongChain(usize),
}

pub struct FakeSigner {
    behavior: SignerBehavior,
    issuer: Certificate,
    anchors: Vec<u8>,
    calls: AtomicUsize,
    last_request: Mutex<Option<SignRequest>>,
}

impl FakeSigner {
    pub fn new(behavior: SignerBehavior) -> Arc<Self> {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["sentry.test".to_owned()]).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let cert = params.self_signed(&key).unwrap();

        Arc::new(Self {
            behavior,
            issuer: Certificate::try_from(cert.der().to_vec()).unwrap(),
            anchors: cert.pem().into_bytes(),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn issuing() -> Arc<Self> {
        Self::new(SignerBehavior::Issue)
    }

    pub fn anchors(&self) -> &[u8] {
        &self.anchors
    }

    pub fn issuer(&self) -> &Certificate {
        &self.issuer
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SignRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn issue_leaf(&self, req: &SignRequest) -> Result<Certificate, SignerError> {
        let key = KeyPair::generate().map_err(|e| SignerError::with_source("keygen", e))?;
        let mut params = CertificateParams::new(req.dns.clone())
            .map_err(|e| SignerError::with_source("bad SANs", e))?;
        params.not_after = rcgen::date_time_ymd(LEAF_EXPIRY_YEAR, 1, 1);
        let cert = params
            .self_signed(&key)
            .map_err(|e| SignerError::with_source("self sign", e))?;
        Certificate::try_from(cert.der().to_vec())
            .map_err(|e| SignerError::with_source("leaf", e))
    }
}

#[tonic::async_trait]
impl Signer for FakeSigner {
    async fn sign_identity(&self, req: &SignRequest) -> Result<Vec<Certificate>, SignerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(req.clone());

        match &self.behavior {
            SignerBehavior::Issue => Ok(vec![self.issue_leaf(req)?, self.issuer.clone()]),
            SignerBehavior::Fail => Err(SignerError::new("issuer key unavailable")),
            SignerBehavior::EmptyChain => Ok(Vec::new()),
            SignerBehavior::Slow(started, delay) => {
                started.notify_one();
                tokio::time::sleep(*delay).await;
                Ok(vec![self.issue_leaf(req)?, self.issuer.clone()])
            }
            SignerBehavior::LongChain(len) => {
                let mut chain = vec![self.issue_leaf(req)?];
                chain.resize(*len, self.issuer.clone());
                Ok(chain)
            }
            SignerBehavior::Stall(started) => {
                started.notify_one();
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(SignerError::new("stalled"))
            }
        }
    }

    fn trust_anchors(&self) -> &[u8] {
        &self.anchors
    }
}

#[derive(Default)]
pub struct CountingMetrics {
    requests: AtomicUsize,
    successes: AtomicUsize,
    failures: Mutex<Vec<FailureStage>>,
}

impl CountingMetrics {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> Vec<FailureStage> {
        self.failures.lock().unwrap().clone()
    }
}

impl MetricsRecorder for CountingMetrics {
    fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn record_failure(&self, stage: FailureStage) {
        self.failures.lock().unwrap().push(stage);
    }
}
