//! Trusted public key material
//!
//! The key is loaded once at startup and never mutated afterwards. Clones share
//! the same bytes, so any number of concurrent arming attempts can read it.

use crate::error::{Error, Result};
use der::asn1::UintRef;
use der::{Decode, DecodePem, Encode, Reader, SliceReader};
use spki::{SubjectPublicKeyInfoOwned, SubjectPublicKeyInfoRef};
use std::path::Path;
use std::sync::Arc;

const PEM_PREAMBLE: &[u8] = b"-----BEGIN";

/// SEC1 uncompressed point tag
const EC_POINT_UNCOMPRESSED: u8 = 0x04;

/// Uncompressed P-256, P-384 and P-521 point lengths
const EC_POINT_LENGTHS: [usize; 3] = [65, 97, 133];

/// The public key every token signature is verified against
#[derive(Clone, PartialEq, Eq)]
pub struct TrustedKey {
    der: Arc<[u8]>,
}

impl TrustedKey {
    /// Use DER key bytes as-is
    ///
    /// Accepts anything aws-lc can verify with: SubjectPublicKeyInfo, a PKCS#1
    /// `RSAPublicKey`, or an uncompressed EC point. Anything else is rejected
    /// here, at load time, rather than at the first signature check.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        if der.is_empty() {
            return Err(Error::KeyInvalid("key material is empty".into()));
        }
        if !(is_spki(der) || is_pkcs1_rsa(der) || is_ec_point(der)) {
            return Err(Error::KeyInvalid(format!(
                "{} bytes are not a recognized public key encoding",
                der.len()
            )));
        }
        Ok(Self { der: der.into() })
    }

    /// Decode a `-----BEGIN PUBLIC KEY-----` document
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoOwned::from_pem(pem)
            .map_err(|e| Error::KeyInvalid(format!("PEM decode failed: {e}")))?;
        let der = spki
            .to_der()
            .map_err(|e| Error::KeyInvalid(format!("DER encode failed: {e}")))?;
        Self::from_der(&der)
    }

    /// Detect PEM by its preamble, otherwise treat the bytes as DER
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.trim_ascii_start().starts_with(PEM_PREAMBLE) {
            Self::from_pem(bytes)
        } else {
            Self::from_der(bytes)
        }
    }

    /// Read key material from a provisioning artifact
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::KeyInvalid(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    /// DER-encoded key bytes
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }
}

fn is_spki(der: &[u8]) -> bool {
    SubjectPublicKeyInfoRef::from_der(der).is_ok()
}

/// `RSAPublicKey ::= SEQUENCE { modulus INTEGER, publicExponent INTEGER }`
fn is_pkcs1_rsa(der: &[u8]) -> bool {
    let parse = || -> der::Result<()> {
        let mut reader = SliceReader::new(der)?;
        reader.sequence(|fields| {
            UintRef::decode(fields)?;
            UintRef::decode(fields)?;
            Ok(())
        })?;
        reader.finish(())
    };
    parse().is_ok()
}

fn is_ec_point(der: &[u8]) -> bool {
    der.first() == Some(&EC_POINT_UNCOMPRESSED) && EC_POINT_LENGTHS.contains(&der.len())
}

impl std::fmt::Debug for TrustedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustedKey")
            .field("der_len", &self.der.len())
            .finish()
    }
}
