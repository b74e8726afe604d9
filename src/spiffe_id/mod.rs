//! SPIFFE-ID and TrustDomain types.
//!
//! A [`TrustDomain`] is only ever produced by a successful validator; the CA
//! turns it, together with the workload's namespace and app id, into the
//! [`SpiffeId`] placed in the issued certificate.

use std::convert::TryFrom;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

const SPIFFE_SCHEME: &str = "spiffe";

const VALID_TRUST_DOMAIN_CHARS: &str = "abcdefghijklmnopqrstuvwxyz0123456789-._";
const VALID_PATH_SEGMENT_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._";

/// Represents a [SPIFFE ID](https://github.com/spiffe/spiffe/blob/main/standards/SPIFFE-ID.md#2-spiffe-identity).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SpiffeId {
    trust_domain: TrustDomain,
    path: String,
}

/// Represents a [SPIFFE Trust domain](https://github.com/spiffe/spiffe/blob/main/standards/SPIFFE-ID.md#21-trust-domain).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TrustDomain {
    name: String,
}

/// An error that can arise building a SPIFFE ID or parsing a trust domain.
#[derive(Debug, Error, PartialEq, Clone)]
#[non_exhaustive]
pub enum SpiffeIdError {
    /// The trust domain name cannot be empty.
    #[error("trust domain is missing")]
    MissingTrustDomain,

    /// A trust domain name can only contain chars in a limited char set.
    #[error(
        "trust domain characters are limited to lowercase letters, numbers, dots, dashes, and \
         underscores"
    )]
    BadTrustDomainChar,

    /// A path segment can only contain chars in a limited char set.
    #[error(
        "path segment characters are limited to letters, numbers, dots, dashes, and underscores"
    )]
    BadPathSegmentChar,

    /// Path segments cannot be empty.
    #[error("path cannot contain empty segments")]
    EmptySegment,

    /// Path segments cannot be `.` or `..`.
    #[error("path cannot contain dot segments")]
    DotSegment,
}

impl SpiffeId {
    /// Returns a new SPIFFE ID in the given trust domain with joined path segments.
    ///
    /// # Errors
    ///
    /// If a segment is empty, a dot segment or contains characters outside the
    /// allowed set, a [`SpiffeIdError`] variant will be returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentry_ca::spiffe_id::{SpiffeId, TrustDomain};
    ///
    /// let trust_domain = TrustDomain::new("cluster.local").unwrap();
    /// let spiffe_id = SpiffeId::from_segments(trust_domain, &["ns", "default", "orders"]).unwrap();
    /// assert_eq!("spiffe://cluster.local/ns/default/orders", spiffe_id.to_string());
    /// ```
    pub fn from_segments(
        trust_domain: TrustDomain,
        segments: &[&str],
    ) -> Result<Self, SpiffeIdError> {
        let mut path = String::new();
        for segment in segments {
            validate_segment(segment)?;
            path.push('/');
            path.push_str(segment);
        }

        Ok(SpiffeId { trust_domain, path })
    }

    /// Returns the trust domain of the SPIFFE ID.
    pub fn trust_domain(&self) -> &TrustDomain {
        &self.trust_domain
    }

    /// Returns the path of the SPIFFE ID.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Display for SpiffeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", SPIFFE_SCHEME, self.trust_domain, self.path)
    }
}

fn validate_segment(segment: &str) -> Result<(), SpiffeIdError> {
    match segment {
        "" => Err(SpiffeIdError::EmptySegment),
        "." | ".." => Err(SpiffeIdError::DotSegment),
        s if s.chars().all(|c| VALID_PATH_SEGMENT_CHARS.contains(c)) => Ok(()),
        _ => Err(SpiffeIdError::BadPathSegmentChar),
    }
}

impl TrustDomain {
    /// Attempts to parse a trust domain from its bare name.
    ///
    /// # Errors
    ///
    /// Returns [`SpiffeIdError::MissingTrustDomain`] for an empty name and
    /// [`SpiffeIdError::BadTrustDomainChar`] for names outside the allowed set.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentry_ca::spiffe_id::TrustDomain;
    ///
    /// let trust_domain = TrustDomain::new("cluster.local").unwrap();
    /// assert_eq!("cluster.local", trust_domain.to_string());
    /// ```
    pub fn new(name: &str) -> Result<Self, SpiffeIdError> {
        if name.is_empty() {
            return Err(SpiffeIdError::MissingTrustDomain);
        }

        if !name.chars().all(|c| VALID_TRUST_DOMAIN_CHARS.contains(c)) {
            return Err(SpiffeIdError::BadTrustDomainChar);
        }

        Ok(TrustDomain {
            name: name.to_owned(),
        })
    }
}

impl Display for TrustDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for TrustDomain {
    fn as_ref(&self) -> &str {
        self.name.as_str()
    }
}

impl FromStr for TrustDomain {
    type Err = SpiffeIdError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        TrustDomain::new(name)
    }
}

impl TryFrom<&str> for TrustDomain {
    type Error = SpiffeIdError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl TryFrom<String> for TrustDomain {
    type Error = SpiffeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value.as_ref())
    }
}

#[cfg(test)]
mod spiffe_id_tests {
    use std::str::FromStr;

    use super::*;

    macro_rules! spiffe_id_error_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (segments, expected) = $value;
                let td = TrustDomain::new("public").unwrap();
                let err = SpiffeId::from_segments(td, segments).unwrap_err();
                assert_eq!(err, expected);
            }
        )*
        }
    }

    spiffe_id_error_tests! {
        from_empty_segment: (&["ns", "", "orders"], SpiffeIdError::EmptySegment),
        from_dot_segment: (&["ns", ".", "orders"], SpiffeIdError::DotSegment),
        from_dot_dot_segment: (&["ns", "..", "orders"], SpiffeIdError::DotSegment),
        from_bad_segment_char: (&["ns", "a$b"], SpiffeIdError::BadPathSegmentChar),
        from_separator_in_segment: (&["ns", "a/b"], SpiffeIdError::BadPathSegmentChar),
    }

    #[test]
    fn test_from_segments() {
        let td = TrustDomain::new("example.org").unwrap();
        let spiffe_id = SpiffeId::from_segments(td.clone(), &["ns", "default", "orders"]).unwrap();

        assert_eq!(spiffe_id.trust_domain(), &td);
        assert_eq!(spiffe_id.path(), "/ns/default/orders");
        assert_eq!(spiffe_id.to_string(), "spiffe://example.org/ns/default/orders");
    }

    #[test]
    fn test_from_no_segments() {
        let td = TrustDomain::new("public").unwrap();
        let spiffe_id = SpiffeId::from_segments(td, &[]).unwrap();
        assert_eq!(spiffe_id.path(), "");
        assert_eq!(spiffe_id.to_string(), "spiffe://public");
    }

    #[test]
    fn test_trust_domain_errors() {
        assert_eq!(
            TrustDomain::new("").unwrap_err(),
            SpiffeIdError::MissingTrustDomain
        );
        assert_eq!(
            TrustDomain::new("Public").unwrap_err(),
            SpiffeIdError::BadTrustDomainChar
        );
        assert_eq!(
            TrustDomain::new("spiffe://example.org").unwrap_err(),
            SpiffeIdError::BadTrustDomainChar
        );
    }

    #[test]
    fn test_trust_domain_conversions() {
        let td = TrustDomain::new("public").unwrap();
        assert_eq!(TrustDomain::from_str("public").unwrap(), td);
        assert_eq!(TrustDomain::try_from("public".to_owned()).unwrap(), td);
        assert_eq!(td.as_ref(), "public");
    }
}
