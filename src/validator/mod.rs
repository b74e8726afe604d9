//! Pluggable authentication of signing requests.
//!
//! Every authentication mechanism implements [`Validator`] and is registered in
//! a [`ValidatorRegistry`] under a [`ValidatorKind`]. A request names the kind it
//! wants to be checked with, or leaves it unspecified to get the configured
//! default.

use crate::proto::sign_certificate_request::TokenValidator;
use crate::request::SigningRequest;
use crate::spiffe_id::TrustDomain;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod insecure;

pub use insecure::InsecureValidator;

/// Identifies an authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidatorKind {
    /// No validator requested; the registry default applies.
    #[default]
    Unspecified,
    /// Accepts every caller. Development only.
    Insecure,
    /// Kubernetes service account tokens.
    Kubernetes,
    /// JWTs verified against a static JWKS.
    Jwks,
}

impl ValidatorKind {
    /// Returns a stable string representation, usable as a log field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Insecure => "insecure",
            Self::Kubernetes => "kubernetes",
            Self::Jwks => "jwks",
        }
    }

    /// Maps a wire enum number to a kind, `None` for numbers this server does not know.
    pub fn from_wire(value: i32) -> Option<Self> {
        let kind = match TokenValidator::try_from(value).ok()? {
            TokenValidator::Unknown => Self::Unspecified,
            TokenValidator::Insecure => Self::Insecure,
            TokenValidator::Kubernetes => Self::Kubernetes,
            TokenValidator::Jwks => Self::Jwks,
        };
        Some(kind)
    }

    /// Returns the wire enum number of the kind.
    pub fn to_wire(self) -> i32 {
        let wire = match self {
            Self::Unspecified => TokenValidator::Unknown,
            Self::Insecure => TokenValidator::Insecure,
            Self::Kubernetes => TokenValidator::Kubernetes,
            Self::Jwks => TokenValidator::Jwks,
        };
        wire as i32
    }
}

impl fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validator refused to authenticate the caller.
///
/// The reason is returned to the caller as is, so implementations must only
/// describe the caller's own credential in it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct ValidatorError {
    reason: String,
}

impl ValidatorError {
    /// Creates a rejection with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the rejection reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Authenticates the caller of a signing request.
///
/// Implementations are shared across concurrent requests and are responsible
/// for their own synchronization if they hold state.
///
/// # Example
///
/// ```no_run
/// use sentry_ca::request::SigningRequest;
/// use sentry_ca::spiffe_id::TrustDomain;
/// use sentry_ca::validator::{Validator, ValidatorError};
///
/// struct StaticToken {
///     token: String,
///     trust_domain: TrustDomain,
/// }
///
/// #[tonic::async_trait]
/// impl Validator for StaticToken {
///     async fn validate(&self, req: &SigningRequest) -> Result<TrustDomain, ValidatorError> {
///         if req.token.expose() != self.token {
///             return Err(ValidatorError::new("token is not valid"));
///         }
///         Ok(self.trust_domain.clone())
///     }
/// }
/// ```
#[tonic::async_trait]
pub trait Validator: Send + Sync + 'static {
    /// Checks the caller's credential and returns the trust domain it belongs to.
    async fn validate(&self, req: &SigningRequest) -> Result<TrustDomain, ValidatorError>;
}

/// Errors returned when no validator can be selected for a request.
///
/// Neither message reveals which validators are configured.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    /// The request named no validator and there is no default.
    #[error("a validator name must be specified in this environment")]
    NotSpecified,

    /// The requested validator is not registered.
    #[error("the requested validator is not enabled")]
    NotEnabled,
}

/// Returns the validator kind a request is checked with.
///
/// The requested kind wins unless it is [`ValidatorKind::Unspecified`], in which
/// case `default` is used.
///
/// # Errors
///
/// Returns [`RegistryError::NotSpecified`] if both are unspecified.
pub fn resolve_kind(
    requested: ValidatorKind,
    default: ValidatorKind,
) -> Result<ValidatorKind, RegistryError> {
    let kind = match requested {
        ValidatorKind::Unspecified => default,
        kind => kind,
    };
    if kind == ValidatorKind::Unspecified {
        return Err(RegistryError::NotSpecified);
    }
    Ok(kind)
}

/// The validators enabled on this server, keyed by kind.
///
/// Built once at startup and shared read-only by all requests.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<ValidatorKind, Arc<dyn Validator>>,
    default: ValidatorKind,
}

impl ValidatorRegistry {
    /// Creates an empty registry using `default` for requests that do not name a validator.
    pub fn new(default: ValidatorKind) -> Self {
        Self {
            validators: HashMap::new(),
            default,
        }
    }

    /// Registers `validator` under `kind`, replacing any previous entry.
    ///
    /// Registering under [`ValidatorKind::Unspecified`] has no effect, as that
    /// kind is never selected.
    pub fn register(&mut self, kind: ValidatorKind, validator: Arc<dyn Validator>) {
        if kind == ValidatorKind::Unspecified {
            return;
        }
        self.validators.insert(kind, validator);
    }

    /// Builder-style variant of [`ValidatorRegistry::register`].
    #[must_use]
    pub fn with_validator(mut self, kind: ValidatorKind, validator: Arc<dyn Validator>) -> Self {
        self.register(kind, validator);
        self
    }

    /// Sets the kind used for requests that do not name a validator.
    pub fn set_default(&mut self, default: ValidatorKind) {
        self.default = default;
    }

    /// Returns the default kind.
    pub fn default_kind(&self) -> ValidatorKind {
        self.default
    }

    /// Returns the registered kinds.
    pub fn kinds(&self) -> impl Iterator<Item = ValidatorKind> + '_ {
        self.validators.keys().copied()
    }

    /// Returns the kind a request naming `requested` is checked with.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotSpecified`] if neither the request nor the
    /// registry names a validator.
    pub fn resolve(&self, requested: ValidatorKind) -> Result<ValidatorKind, RegistryError> {
        resolve_kind(requested, self.default)
    }

    /// Returns the validator registered under `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotEnabled`] if nothing is registered under `kind`.
    pub fn lookup(&self, kind: ValidatorKind) -> Result<&Arc<dyn Validator>, RegistryError> {
        self.validators.get(&kind).ok_or(RegistryError::NotEnabled)
    }

    /// Resolves and looks up the validator for `requested` in one step.
    ///
    /// # Errors
    ///
    /// See [`ValidatorRegistry::resolve`] and [`ValidatorRegistry::lookup`].
    pub fn select(
        &self,
        requested: ValidatorKind,
    ) -> Result<(ValidatorKind, &Arc<dyn Validator>), RegistryError> {
        let kind = self.resolve(requested)?;
        Ok((kind, self.lookup(kind)?))
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field("default", &self.default)
            .finish()
    }
}
