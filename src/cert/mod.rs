//! `Certificate` type and chain helpers.
//!
//! Certificates wrap DER-encoded bytes and are validated at construction time.
//! A certificate chain is an ordered slice of certificates, leaf first.

use crate::cert::error::CertificateError;
use crate::cert::parsing::parse_der_encoded_bytes_as_x509_certificate;
use pem::{EncodeConfig, LineEnding, Pem};
use std::convert::TryFrom;
use time::OffsetDateTime;

pub mod error;
pub(crate) mod parsing;

/// PEM label of an X.509 certificate.
pub const CERTIFICATE_PEM_TAG: &str = "CERTIFICATE";

/// A single DER-encoded X.509 certificate.
///
/// Invariant: instances are always validated as parseable DER-encoded X.509.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    /// Returns the certificate bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the `NotAfter` bound of the certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::ParseX509Certificate`] if the bytes cannot be parsed.
    pub fn not_after(&self) -> Result<OffsetDateTime, CertificateError> {
        let x509 = parse_der_encoded_bytes_as_x509_certificate(&self.0)?;
        Ok(x509.validity().not_after.to_datetime())
    }
}

impl AsRef<[u8]> for Certificate {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(der_bytes)?;
        Ok(Self(Vec::from(der_bytes)))
    }
}

impl TryFrom<Vec<u8>> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: Vec<u8>) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(&der_bytes)?;
        Ok(Self(der_bytes))
    }
}

/// Encodes a certificate chain as concatenated PEM blocks, leaf first.
///
/// # Errors
///
/// Returns [`CertificateError::EmptyChain`] if `chain` holds no certificate.
pub fn encode_chain_pem(chain: &[Certificate]) -> Result<Vec<u8>, CertificateError> {
    if chain.is_empty() {
        return Err(CertificateError::EmptyChain);
    }

    let blocks: Vec<Pem> = chain
        .iter()
        .map(|cert| Pem::new(CERTIFICATE_PEM_TAG, cert.as_bytes()))
        .collect();
    let config = EncodeConfig::new().set_line_ending(LineEnding::LF);

    Ok(pem::encode_many_config(&blocks, config).into_bytes())
}

/// Returns the expiry of the leaf, the first certificate of `chain`.
///
/// # Errors
///
/// - [`CertificateError::EmptyChain`] if `chain` holds no certificate.
/// - [`CertificateError::ParseX509Certificate`] if the leaf cannot be parsed.
pub fn leaf_not_after(chain: &[Certificate]) -> Result<OffsetDateTime, CertificateError> {
    chain
        .first()
        .ok_or(CertificateError::EmptyChain)?
        .not_after()
}
