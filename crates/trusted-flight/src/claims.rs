//! Claims validation for trusted-flight tokens
//!
//! The validator is an ordered pipeline over the decoded header and payload:
//!
//! 1. `typ` equals the recognized token type
//! 2. `alg` names a supported algorithm allowed by the policy
//! 3. `iss` equals the trusted issuer
//! 4. `iat` is not in the future
//! 5. `nbf`, when present, is not in the future
//! 6. `exp` is in the future
//!
//! The first failing rule decides the outcome. Missing, malformed and
//! out-of-range values of one claim all surface as that claim's [`Denial`].

use crate::algorithm::{AlgorithmPolicy, AlgorithmType};
use crate::error::{Error, Result};
use crate::header::DecodedHeader;
use crate::limits::MAX_ISSUER_LENGTH;
use crate::utils::bounds::{apply_clock_skew, validate_field_size, validate_timestamp_bounds};
use crate::verdict::{Authorization, Denial};
use miniserde::json::{Number, Object, Value};
use std::collections::BTreeSet;

/// A header or payload field the validator inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Typ,
    Alg,
    Iss,
    Iat,
    Nbf,
    Exp,
}

impl Claim {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Claim::Typ => "typ",
            Claim::Alg => "alg",
            Claim::Iss => "iss",
            Claim::Iat => "iat",
            Claim::Nbf => "nbf",
            Claim::Exp => "exp",
        }
    }

    /// The denial every failure of this claim is reported as
    pub const fn denial(&self) -> Denial {
        match self {
            Claim::Typ => Denial::InvalidTokenType,
            Claim::Alg => Denial::InvalidTokenAlgorithm,
            Claim::Iss => Denial::InvalidTokenIssuer,
            Claim::Iat => Denial::InvalidTokenIatClaim,
            Claim::Nbf => Denial::InvalidTokenNbfClaim,
            Claim::Exp => Denial::InvalidTokenExpClaim,
        }
    }
}

impl std::fmt::Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token payload
#[derive(Debug, Clone)]
pub struct DecodedPayload {
    fields: Object,
}

impl DecodedPayload {
    pub(crate) fn new(fields: Object) -> Self {
        Self { fields }
    }

    /// Issuer (`iss`)
    pub fn issuer(&self) -> Result<&str> {
        string_value(&self.fields, Claim::Iss, MAX_ISSUER_LENGTH)
    }

    /// Issued-at (`iat`), required
    pub fn issued_at(&self) -> Result<i64> {
        self.required_timestamp(Claim::Iat)
    }

    /// Not-before (`nbf`), `None` when absent
    pub fn not_before(&self) -> Result<Option<i64>> {
        self.optional_timestamp(Claim::Nbf)
    }

    /// Expiration (`exp`), required
    pub fn expires_at(&self) -> Result<i64> {
        self.required_timestamp(Claim::Exp)
    }

    fn required_timestamp(&self, claim: Claim) -> Result<i64> {
        self.optional_timestamp(claim)?
            .ok_or(Error::ClaimMissing(claim))
    }

    fn optional_timestamp(&self, claim: Claim) -> Result<Option<i64>> {
        self.fields
            .get(claim.as_str())
            .map(|value| timestamp_value(claim, value))
            .transpose()
    }
}

/// Read a string field out of a decoded segment
pub(crate) fn string_value(fields: &Object, claim: Claim, max: usize) -> Result<&str> {
    match fields.get(claim.as_str()) {
        None => Err(Error::ClaimMissing(claim)),
        Some(Value::String(s)) => {
            validate_field_size(claim, s, max)?;
            Ok(s.as_str())
        }
        Some(other) => Err(Error::ClaimMalformed {
            claim,
            reason: format!("expected a string, found {}", value_kind(other)),
        }),
    }
}

/// Interpret a JSON value as a NumericDate in whole seconds
///
/// Fractional seconds are truncated toward zero.
fn timestamp_value(claim: Claim, value: &Value) -> Result<i64> {
    let seconds = match value {
        Value::Number(Number::U64(n)) => i64::try_from(*n).unwrap_or(i64::MAX),
        Value::Number(Number::I64(n)) => *n,
        Value::Number(Number::F64(f)) if f.is_finite() && *f >= 0.0 => f.trunc() as i64,
        Value::Number(Number::F64(f)) => {
            return Err(Error::ClaimMalformed {
                claim,
                reason: format!("{f} is not a valid timestamp"),
            })
        }
        other => {
            return Err(Error::ClaimMalformed {
                claim,
                reason: format!("expected a number, found {}", value_kind(other)),
            })
        }
    };

    validate_timestamp_bounds(claim, seconds)?;
    Ok(seconds)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// What a token's claims are checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClaimsValidation {
    pub(crate) token_type: String,
    pub(crate) algorithms: AlgorithmPolicy,
    pub(crate) issuer: String,
    pub(crate) clock_skew_seconds: u64,
}

/// Decides whether a claim rule failure stops the pipeline
pub(crate) struct Waiver<'a> {
    force: bool,
    bypass: &'a BTreeSet<Denial>,
}

impl<'a> Waiver<'a> {
    pub(crate) fn new(force: bool, bypass: &'a BTreeSet<Denial>) -> Self {
        Self { force, bypass }
    }

    fn covers(&self, err: &Error) -> bool {
        self.force && err.is_waivable() && self.bypass.contains(&err.denial())
    }

    /// Pass a rule result through, absorbing it if force-arm covers its denial
    fn apply(&self, result: Result<()>, waived: &mut Vec<Denial>) -> Result<()> {
        match result {
            Err(err) if self.covers(&err) => {
                tracing::warn!(
                    reason = %err.denial(),
                    error = %err,
                    "claim failure waived by force"
                );
                waived.push(err.denial());
                Ok(())
            }
            other => other,
        }
    }
}

/// Claims that passed (or were waived through) every rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidatedClaims {
    pub(crate) algorithm: AlgorithmType,
    pub(crate) issuer: String,
    pub(crate) issued_at: i64,
    pub(crate) not_before: Option<i64>,
    pub(crate) expires_at: i64,
    pub(crate) waived: Vec<Denial>,
}

impl ValidatedClaims {
    pub(crate) fn into_authorization(self) -> Authorization {
        Authorization {
            issuer: self.issuer,
            algorithm: self.algorithm,
            issued_at: self.issued_at,
            not_before: self.not_before,
            expires_at: self.expires_at,
            waived: self.waived,
        }
    }
}

/// Run the ordered claim rules
pub(crate) fn validate_claims(
    header: &DecodedHeader,
    payload: &DecodedPayload,
    config: &ClaimsValidation,
    now: i64,
    waiver: &Waiver<'_>,
) -> Result<ValidatedClaims> {
    let skew = config.clock_skew_seconds;
    let mut waived = Vec::new();

    check_token_type(header, &config.token_type)?;
    let algorithm = check_algorithm(header, &config.algorithms)?;

    let issuer = payload.issuer()?;
    waiver.apply(check_issuer(issuer, &config.issuer), &mut waived)?;

    let issued_at = payload.issued_at()?;
    waiver.apply(check_issued_at(issued_at, now, skew), &mut waived)?;

    let not_before = payload.not_before()?;
    if let Some(nbf) = not_before {
        waiver.apply(check_not_before(nbf, now, skew), &mut waived)?;
    }

    let expires_at = payload.expires_at()?;
    waiver.apply(check_expiration(expires_at, now), &mut waived)?;

    Ok(ValidatedClaims {
        algorithm,
        issuer: issuer.to_owned(),
        issued_at,
        not_before,
        expires_at,
        waived,
    })
}

fn check_token_type(header: &DecodedHeader, expected: &str) -> Result<()> {
    let found = header.token_type()?;
    if found != expected {
        return Err(Error::TypeMismatch {
            expected: expected.to_owned(),
            found: found.to_owned(),
        });
    }
    Ok(())
}

fn check_algorithm(header: &DecodedHeader, policy: &AlgorithmPolicy) -> Result<AlgorithmType> {
    let algorithm = AlgorithmType::from_name(header.algorithm()?)?;
    policy.check(algorithm)?;
    Ok(algorithm)
}

fn check_issuer(found: &str, expected: &str) -> Result<()> {
    if found != expected {
        return Err(Error::IssuerMismatch {
            expected: expected.to_owned(),
            found: found.to_owned(),
        });
    }
    Ok(())
}

fn check_issued_at(issued_at: i64, now: i64, skew: u64) -> Result<()> {
    if issued_at > apply_clock_skew(Claim::Iat, now, skew)? {
        return Err(Error::TokenIssuedInFuture {
            issued_at,
            now,
            skew,
        });
    }
    Ok(())
}

fn check_not_before(not_before: i64, now: i64, skew: u64) -> Result<()> {
    if not_before > apply_clock_skew(Claim::Nbf, now, skew)? {
        return Err(Error::TokenNotYetValid {
            not_before,
            now,
            skew,
        });
    }
    Ok(())
}

// No skew on expiry: a token is never accepted past its stated lifetime.
fn check_expiration(expired_at: i64, now: i64) -> Result<()> {
    if expired_at <= now {
        return Err(Error::TokenExpired { expired_at, now });
    }
    Ok(())
}
