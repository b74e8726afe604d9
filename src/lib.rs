#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

//! A certificate signing service for workload identities.
//!
//! Workloads send a PEM-encoded PKCS#10 request together with a credential over
//! gRPC. The server authenticates the caller with a pluggable [`Validator`],
//! checks the CSR, derives the workload's SPIFFE ID and DNS SANs and asks a
//! [`Signer`] to issue the certificate chain.
//!
//! # Examples
//!
//! ```no_run
//! use sentry_ca::ca::Signer;
//! use sentry_ca::validator::{InsecureValidator, ValidatorKind};
//! use sentry_ca::ServerBuilder;
//! use std::error::Error;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn some_function(ca: Arc<dyn Signer>) -> Result<(), Box<dyn Error>> {
//! let options = ServerBuilder::new()
//!     .port(50001)
//!     .with_validator(ValidatorKind::Insecure, Arc::new(InsecureValidator))
//!     .default_validator(ValidatorKind::Insecure)
//!     .ca(ca)
//!     .build()?;
//!
//! // run until the token is cancelled
//! let cancel = CancellationToken::new();
//! sentry_ca::start(cancel, options).await?;
//! # Ok(())
//! # }
//! ```

pub mod ca;
pub mod cert;
pub mod compat;
pub mod constants;
pub mod csr;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod proto;
pub mod request;
pub mod server;
pub mod spiffe_id;
pub mod validator;

mod observability;
mod prelude;

pub use ca::{SignRequest, Signer, SignerError};
pub use error::{ServerError, SignError};
pub use metrics::{FailureStage, MetricsRecorder};
pub use server::{start, SentryService, Server, ServerBuilder, ServerOptions};
pub use spiffe_id::{SpiffeId, TrustDomain};
pub use validator::{Validator, ValidatorKind, ValidatorRegistry};
