//! Inspection of certificate signing requests.
//!
//! [`inspect`] turns the PEM bytes sent by a workload into the public key and
//! signature algorithm handed to the CA, after checking that the request is a
//! well-formed PKCS#10 structure signed by the key it carries.

use crate::compat::LEGACY_CSR_PEM_TAG;
use crate::csr::error::CsrError;
use crate::prelude::debug;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::error::X509Error;
use x509_parser::nom::Err;
use x509_parser::prelude::FromDer;

pub mod error;

/// PEM label of a PKCS#10 certificate signing request.
pub const CSR_PEM_TAG: &str = "CERTIFICATE REQUEST";

/// A DER-encoded `SubjectPublicKeyInfo` taken from a CSR.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Wraps DER-encoded `SubjectPublicKeyInfo` bytes.
    pub fn from_der(der: Vec<u8>) -> Self {
        Self(der)
    }

    /// Returns the DER-encoded `SubjectPublicKeyInfo`.
    pub fn as_der(&self) -> &[u8] {
        &self.0
    }
}

/// The signature algorithm a CSR declares, identified by its OID.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignatureAlgorithm {
    oid: String,
}

impl SignatureAlgorithm {
    /// Creates a signature algorithm from its dotted OID string.
    pub fn from_oid_string(oid: impl Into<String>) -> Self {
        Self { oid: oid.into() }
    }

    /// Returns the dotted OID string, e.g. `1.2.840.10045.4.3.2`.
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// Returns a short name for well-known algorithms.
    pub fn name(&self) -> Option<&'static str> {
        let name = match self.oid.as_str() {
            "1.2.840.10045.4.3.2" => "ECDSA-SHA256",
            "1.2.840.10045.4.3.3" => "ECDSA-SHA384",
            "1.2.840.10045.4.3.4" => "ECDSA-SHA512",
            "1.2.840.113549.1.1.11" => "SHA256-RSA",
            "1.2.840.113549.1.1.12" => "SHA384-RSA",
            "1.2.840.113549.1.1.13" => "SHA512-RSA",
            "1.3.101.112" => "Ed25519",
            _ => return None,
        };
        Some(name)
    }
}

/// The parts of a validated CSR the CA consumes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InspectedCsr {
    /// Public key the certificate is issued for.
    pub public_key: PublicKey,
    /// Signature algorithm declared by the request.
    pub signature_algorithm: SignatureAlgorithm,
}

/// Decodes and validates a PEM-encoded certificate signing request.
///
/// Only the first PEM block is considered. Both `CERTIFICATE REQUEST` and the
/// legacy `CERTIFICATE` label are accepted.
///
/// # Errors
///
/// - [`CsrError::MissingPemBlock`] if the input holds no PEM block.
/// - [`CsrError::UnexpectedPemTag`] if the block has any other label.
/// - [`CsrError::Parse`] if the contents are not a PKCS#10 request.
/// - [`CsrError::InvalidSignature`] if the self-signature does not verify.
pub fn inspect(pem_bytes: &[u8]) -> Result<InspectedCsr, CsrError> {
    let block = pem::parse(pem_bytes).map_err(|e| {
        debug!("Invalid CSR: no PEM block: {}", e);
        CsrError::MissingPemBlock
    })?;

    let tag = block.tag();
    if tag != CSR_PEM_TAG && tag != LEGACY_CSR_PEM_TAG {
        debug!("Invalid CSR: PEM block type is invalid: {:?}", tag);
        return Err(CsrError::UnexpectedPemTag(tag.to_owned()));
    }

    let csr = parse_certification_request(block.contents()).map_err(|e| {
        debug!("Failed to parse CSR: {}", e);
        e
    })?;

    if csr.verify_signature().is_err() {
        debug!("Invalid CSR: invalid signature");
        return Err(CsrError::InvalidSignature);
    }

    Ok(InspectedCsr {
        public_key: PublicKey(csr.certification_request_info.subject_pki.raw.to_vec()),
        signature_algorithm: SignatureAlgorithm {
            oid: csr.signature_algorithm.algorithm.to_id_string(),
        },
    })
}

fn parse_certification_request(der: &[u8]) -> Result<X509CertificationRequest<'_>, CsrError> {
    match X509CertificationRequest::from_der(der) {
        Ok((rest, _)) if !rest.is_empty() => Err(CsrError::TrailingData),
        Ok((_, csr)) => Ok(csr),
        Err(Err::Incomplete(_)) => Err(CsrError::Parse(X509Error::InvalidCertificate)),
        Err(Err::Error(e) | Err::Failure(e)) => Err(CsrError::Parse(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pem::Pem;
    use rcgen::{CertificateParams, KeyPair};

    fn csr_der(name: &str) -> Vec<u8> {
        let key = KeyPair::generate().unwrap();
        let params = CertificateParams::new(vec![name.to_owned()]).unwrap();
        params.serialize_request(&key).unwrap().der().to_vec()
    }

    fn wrap(tag: &str, der: Vec<u8>) -> Vec<u8> {
        pem::encode(&Pem::new(tag, der)).into_bytes()
    }

    #[test]
    fn test_inspect_valid_csr() {
        let inspected = inspect(&wrap(CSR_PEM_TAG, csr_der("orders"))).unwrap();

        assert!(!inspected.public_key.as_der().is_empty());
        assert_eq!(inspected.signature_algorithm.name(), Some("ECDSA-SHA256"));
    }

    #[test]
    fn test_inspect_accepts_legacy_tag() {
        assert!(inspect(&wrap(LEGACY_CSR_PEM_TAG, csr_der("orders"))).is_ok());
    }

    #[test]
    fn test_inspect_not_pem() {
        assert_eq!(
            inspect(b"definitely not pem").unwrap_err(),
            CsrError::MissingPemBlock
        );
        assert_eq!(inspect(b"").unwrap_err(), CsrError::MissingPemBlock);
    }

    #[test]
    fn test_inspect_wrong_tag() {
        let err = inspect(&wrap("PRIVATE KEY", csr_der("orders"))).unwrap_err();
        assert_eq!(err, CsrError::UnexpectedPemTag("PRIVATE KEY".to_owned()));
        assert_eq!(err.to_string(), "invalid certificate signing request");
    }

    #[test]
    fn test_inspect_unparsable() {
        let err = inspect(&wrap(CSR_PEM_TAG, vec![0x30, 0x03, 0x02, 0x01, 0x01])).unwrap_err();
        assert!(matches!(err, CsrError::Parse(..)));
        assert!(err
            .to_string()
            .starts_with("failed to parse certificate signing request: "));
    }

    #[test]
    fn test_inspect_bad_signature() {
        let mut der = csr_der("orders");
        let last = der.len() - 1;
        der[last] ^= 0x01;

        let err = inspect(&wrap(CSR_PEM_TAG, der)).unwrap_err();
        assert_eq!(err, CsrError::InvalidSignature);
        assert_eq!(err.to_string(), "invalid signature");
    }

    #[test]
    fn test_signature_algorithm_unknown_name() {
        let alg = SignatureAlgorithm::from_oid_string("1.2.3.4");
        assert_eq!(alg.oid(), "1.2.3.4");
        assert_eq!(alg.name(), None);
    }
}
