//! Signature algorithms and the signature verifier
//!
//! Only asymmetric algorithms are recognized: the vehicle holds a public key
//! and nothing that could mint a token. JWS ECDSA signatures are the fixed
//! `R || S` encoding (RFC 7518 §3.4), not ASN.1 DER.

use crate::error::{Error, Result};
use crate::key::TrustedKey;
use crate::limits::MAX_ALG_LENGTH;

use aws_lc_rs::signature::{self, UnparsedPublicKey, VerificationAlgorithm};

/// Signature algorithm named by the `alg` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmType {
    RS256,
    RS384,
    RS512,
    ES256,
    ES384,
    ES512,
}

impl AlgorithmType {
    pub const ALL: [AlgorithmType; 6] = [
        AlgorithmType::RS256,
        AlgorithmType::RS384,
        AlgorithmType::RS512,
        AlgorithmType::ES256,
        AlgorithmType::ES384,
        AlgorithmType::ES512,
    ];

    /// Look up an algorithm by its exact, case-sensitive header name
    pub fn from_name(name: &str) -> Result<Self> {
        if name.len() > MAX_ALG_LENGTH {
            let mut end = MAX_ALG_LENGTH;
            while !name.is_char_boundary(end) {
                end -= 1;
            }
            return Err(Error::AlgorithmUnsupported(format!(
                "{}... ({} bytes)",
                &name[..end],
                name.len()
            )));
        }
        if name == "none" {
            return Err(Error::AlgorithmNoneRejected);
        }

        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == name)
            .ok_or_else(|| Error::AlgorithmUnsupported(name.to_owned()))
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            AlgorithmType::RS256 => "RS256",
            AlgorithmType::RS384 => "RS384",
            AlgorithmType::RS512 => "RS512",
            AlgorithmType::ES256 => "ES256",
            AlgorithmType::ES384 => "ES384",
            AlgorithmType::ES512 => "ES512",
        }
    }

    fn verifier(&self) -> &'static dyn VerificationAlgorithm {
        match self {
            AlgorithmType::RS256 => &signature::RSA_PKCS1_2048_8192_SHA256,
            AlgorithmType::RS384 => &signature::RSA_PKCS1_2048_8192_SHA384,
            AlgorithmType::RS512 => &signature::RSA_PKCS1_2048_8192_SHA512,
            AlgorithmType::ES256 => &signature::ECDSA_P256_SHA256_FIXED,
            AlgorithmType::ES384 => &signature::ECDSA_P384_SHA384_FIXED,
            AlgorithmType::ES512 => &signature::ECDSA_P521_SHA512_FIXED,
        }
    }

    /// Check `signature` over the exact wire bytes `header.payload`
    ///
    /// Any failure, including a key of the wrong family, is
    /// [`Error::SignatureInvalid`]. Comparison happens inside aws-lc.
    pub(crate) fn verify_signature(
        &self,
        signing_input: &[u8],
        signature: &[u8],
        key: &TrustedKey,
    ) -> Result<()> {
        UnparsedPublicKey::new(self.verifier(), key.as_der())
            .verify(signing_input, signature)
            .map_err(|_| Error::SignatureInvalid)
    }
}

impl std::fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of algorithms a gate recognizes
///
/// Anything outside the set is reported as an invalid algorithm, even when
/// the algorithm itself is supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmPolicy {
    allowed: Vec<AlgorithmType>,
}

impl AlgorithmPolicy {
    pub fn only(algorithm: AlgorithmType) -> Self {
        Self {
            allowed: vec![algorithm],
        }
    }

    pub fn any_of(algorithms: impl IntoIterator<Item = AlgorithmType>) -> Self {
        let mut allowed = Vec::new();
        for algorithm in algorithms {
            if !allowed.contains(&algorithm) {
                allowed.push(algorithm);
            }
        }
        Self { allowed }
    }

    /// Build a policy from header names such as `"RS256"`
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        names
            .iter()
            .map(|name| {
                AlgorithmType::from_name(name.as_ref()).map_err(|e| {
                    Error::ConfigurationInvalid(format!("algorithm '{}': {e}", name.as_ref()))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::any_of)
    }

    pub fn permits(&self, algorithm: AlgorithmType) -> bool {
        self.allowed.contains(&algorithm)
    }

    pub fn algorithms(&self) -> &[AlgorithmType] {
        &self.allowed
    }

    pub(crate) fn check(&self, algorithm: AlgorithmType) -> Result<()> {
        if !self.permits(algorithm) {
            return Err(Error::AlgorithmNotAllowed {
                found: algorithm.to_string(),
                allowed: self.allowed.iter().map(ToString::to_string).collect(),
            });
        }
        Ok(())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// RS256 only
impl Default for AlgorithmPolicy {
    fn default() -> Self {
        Self::only(AlgorithmType::RS256)
    }
}
