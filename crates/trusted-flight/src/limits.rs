//! Input limits applied before and during decoding

/// Raw artifact, after trailing whitespace is trimmed
pub(crate) const MAX_TOKEN_LENGTH: usize = 64 * 1024;

/// Decoded header JSON. A trusted-flight header has two short fields.
pub(crate) const MAX_DECODED_HEADER_SIZE: usize = 8 * 1024;
pub(crate) const MAX_DECODED_PAYLOAD_SIZE: usize = 64 * 1024;
/// RSA-8192 produces 1024 signature bytes; P-521 in fixed form 132
pub(crate) const MAX_DECODED_SIGNATURE_SIZE: usize = 1024;

pub(crate) const MAX_ALG_LENGTH: usize = 16;
pub(crate) const MAX_TYP_LENGTH: usize = 64;
pub(crate) const MAX_ISSUER_LENGTH: usize = 2048;

/// Accepted `iat`/`nbf`/`exp` range: the epoch up to 2100-01-01T00:00:00Z
pub(crate) const MIN_TIMESTAMP: i64 = 0;
pub(crate) const MAX_TIMESTAMP: i64 = 4_102_444_800;

/// Upper bound on configured skew, in seconds
pub(crate) const MAX_CLOCK_SKEW_SECONDS: u64 = 300;
