//! Errors for trusted-flight
//!
//! `Error` is the fine-grained internal failure. It is what gets logged. The
//! operator only ever sees the coarser [`Denial`] produced by [`Error::denial`].

use crate::claims::Claim;
use crate::verdict::Denial;
use thiserror::Error;

/// Trusted-flight errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Gate Errors
    // ============================================================================
    #[error("Trusted key or issuer was not loaded at startup")]
    NotInitialized,

    #[error("No trusted time source is available")]
    ClockUnavailable,

    // ============================================================================
    // Loader Errors
    // ============================================================================
    #[error("Cannot read token file {path}: {reason}")]
    TokenUnreadable { path: String, reason: String },

    #[error("Token file {0} is empty")]
    TokenEmpty(String),

    #[error("Token too large: {size} bytes (maximum: {max} bytes)")]
    TokenTooLarge { size: usize, max: usize },

    // ============================================================================
    // Format Errors
    // ============================================================================
    #[error("Invalid token format: expected three parts separated by '.', found {found}")]
    FormatInvalid { found: usize },

    #[error("Invalid token format: {0} segment is empty")]
    FormatEmptySegment(&'static str),

    #[error("Base64URL decoding failed: {0}")]
    FormatInvalidBase64(String),

    #[error("JSON parsing failed: {0}")]
    FormatInvalidJson(String),

    #[error("Token {0} is not a JSON object")]
    FormatNotAnObject(&'static str),

    #[error("Token has no signature")]
    SignatureMissing,

    // ============================================================================
    // Header Errors
    // ============================================================================
    #[error("Token type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    #[error("Algorithm '{0}' is not supported")]
    AlgorithmUnsupported(String),

    #[error("The 'none' algorithm is rejected for security reasons (RFC 8725)")]
    AlgorithmNoneRejected,

    #[error("Algorithm '{found}' not allowed. Allowed: {allowed:?}")]
    AlgorithmNotAllowed { found: String, allowed: Vec<String> },

    // ============================================================================
    // Claim Errors
    // ============================================================================
    #[error("Required claim '{0}' is missing")]
    ClaimMissing(Claim),

    #[error("Claim '{claim}' is malformed: {reason}")]
    ClaimMalformed { claim: Claim, reason: String },

    #[error("Issuer mismatch: expected '{expected}', found '{found}'")]
    IssuerMismatch { expected: String, found: String },

    #[error("Token issued in future at {issued_at} (now: {now}, skew: {skew}s)")]
    TokenIssuedInFuture { issued_at: i64, now: i64, skew: u64 },

    #[error("Token not valid until {not_before} (now: {now}, skew: {skew}s)")]
    TokenNotYetValid { not_before: i64, now: i64, skew: u64 },

    #[error("Token expired at {expired_at} (now: {now})")]
    TokenExpired { expired_at: i64, now: i64 },

    #[error("Claim '{claim}' timestamp out of bounds: {value} (valid range: {min} to {max})")]
    TimestampOutOfBounds {
        claim: Claim,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Integer overflow in '{0}' timestamp arithmetic")]
    TimestampOverflow(Claim),

    // ============================================================================
    // Signature Errors
    // ============================================================================
    #[error("Signature verification failed")]
    SignatureInvalid,

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid trusted key: {0}")]
    KeyInvalid(String),

    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("Clock skew too large: {value} seconds (maximum: {max} seconds)")]
    ClockSkewTooLarge { value: u64, max: u64 },
}

impl Error {
    /// The operator-facing reason this error is reported as
    ///
    /// Missing, malformed and out-of-range variants of the same claim all collapse
    /// onto that claim's single denial.
    pub fn denial(&self) -> Denial {
        match self {
            Error::NotInitialized | Error::KeyInvalid(_) | Error::ConfigurationInvalid(_) => {
                Denial::NotInitialized
            }
            Error::ClockSkewTooLarge { .. } => Denial::NotInitialized,
            Error::ClockUnavailable => Denial::RtcNotAvailable,

            Error::TokenUnreadable { .. } | Error::TokenEmpty(_) => Denial::MissingToken,

            Error::TokenTooLarge { .. }
            | Error::FormatInvalid { .. }
            | Error::FormatEmptySegment(_)
            | Error::FormatInvalidBase64(_)
            | Error::FormatInvalidJson(_)
            | Error::FormatNotAnObject(_)
            | Error::SignatureMissing => Denial::InvalidTokenFormat,

            Error::TypeMismatch { .. } => Denial::InvalidTokenType,
            Error::AlgorithmUnsupported(_)
            | Error::AlgorithmNoneRejected
            | Error::AlgorithmNotAllowed { .. } => Denial::InvalidTokenAlgorithm,

            Error::ClaimMissing(claim)
            | Error::ClaimMalformed { claim, .. }
            | Error::TimestampOutOfBounds { claim, .. }
            | Error::TimestampOverflow(claim) => claim.denial(),
            Error::IssuerMismatch { .. } => Denial::InvalidTokenIssuer,
            Error::TokenIssuedInFuture { .. } => Denial::InvalidTokenIatClaim,
            Error::TokenNotYetValid { .. } => Denial::InvalidTokenNbfClaim,
            Error::TokenExpired { .. } => Denial::InvalidTokenExpClaim,

            Error::SignatureInvalid => Denial::InvalidTokenSignature,
        }
    }

    /// A claim that was present and well-formed but failed its rule
    ///
    /// Only these can be waived by force-arm.
    pub fn is_waivable(&self) -> bool {
        matches!(
            self,
            Error::IssuerMismatch { .. }
                | Error::TokenIssuedInFuture { .. }
                | Error::TokenNotYetValid { .. }
                | Error::TokenExpired { .. }
        )
    }
}

/// Result type alias for trusted-flight operations
pub type Result<T> = std::result::Result<T, Error>;
