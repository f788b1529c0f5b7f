//! Gate configuration
//!
//! A [`GateConfig`] is everything a gate checks tokens against. It is built
//! once, validated once, and then shared read-only by every arming attempt.

use crate::algorithm::AlgorithmPolicy;
use crate::claims::ClaimsValidation;
use crate::error::{Error, Result};
use crate::key::TrustedKey;
use crate::limits::MAX_CLOCK_SKEW_SECONDS;
use crate::verdict::Denial;
use std::collections::BTreeSet;

/// Token type tag expected in the `typ` header field unless configured otherwise
pub const DEFAULT_TOKEN_TYPE: &str = "JWT";

/// Validated, immutable gate configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    claims: ClaimsValidation,
    key: TrustedKey,
    force_bypass: BTreeSet<Denial>,
}

impl GateConfig {
    /// Start a configuration trusting `issuer` and `key`
    ///
    /// Defaults: token type `JWT`, RS256 only, no clock skew, nothing
    /// bypassable by force-arm.
    pub fn builder(issuer: impl Into<String>, key: TrustedKey) -> GateConfigBuilder {
        GateConfigBuilder {
            issuer: issuer.into(),
            key,
            token_type: DEFAULT_TOKEN_TYPE.to_owned(),
            algorithms: AlgorithmPolicy::default(),
            clock_skew_seconds: 0,
            force_bypass: BTreeSet::new(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.claims.issuer
    }

    pub fn key(&self) -> &TrustedKey {
        &self.key
    }

    pub fn token_type(&self) -> &str {
        &self.claims.token_type
    }

    pub fn algorithms(&self) -> &AlgorithmPolicy {
        &self.claims.algorithms
    }

    pub fn clock_skew_seconds(&self) -> u64 {
        self.claims.clock_skew_seconds
    }

    /// Denials force-arm is allowed to waive
    pub fn force_bypass(&self) -> &BTreeSet<Denial> {
        &self.force_bypass
    }

    /// Whether force-arm would waive this failure
    pub fn is_force_bypassable(&self, err: &Error) -> bool {
        err.is_waivable() && self.force_bypass.contains(&err.denial())
    }

    pub(crate) fn claims(&self) -> &ClaimsValidation {
        &self.claims
    }
}

/// Builder for [`GateConfig`]
#[derive(Debug, Clone)]
pub struct GateConfigBuilder {
    issuer: String,
    key: TrustedKey,
    token_type: String,
    algorithms: AlgorithmPolicy,
    clock_skew_seconds: u64,
    force_bypass: BTreeSet<Denial>,
}

impl GateConfigBuilder {
    /// Configure the algorithm policy
    pub fn algorithms(&mut self, policy: AlgorithmPolicy) -> &mut Self {
        self.algorithms = policy;
        self
    }

    /// Configure the expected `typ` header value
    pub fn token_type(&mut self, token_type: impl Into<String>) -> &mut Self {
        self.token_type = token_type.into();
        self
    }

    /// Set clock skew tolerance for `iat` and `nbf`
    ///
    /// # Security
    /// Limited to 300 seconds; larger values are rejected by [`build`](Self::build).
    /// Expiry never gets skew.
    pub fn clock_skew(&mut self, seconds: u64) -> &mut Self {
        self.clock_skew_seconds = seconds;
        self
    }

    /// Let force-arm waive these claim denials
    ///
    /// Only issuer and time-claim denials are eligible.
    pub fn force_bypass(&mut self, denials: impl IntoIterator<Item = Denial>) -> &mut Self {
        self.force_bypass = denials.into_iter().collect();
        self
    }

    /// Validate and freeze the configuration
    pub fn build(&self) -> Result<GateConfig> {
        if self.clock_skew_seconds > MAX_CLOCK_SKEW_SECONDS {
            return Err(Error::ClockSkewTooLarge {
                value: self.clock_skew_seconds,
                max: MAX_CLOCK_SKEW_SECONDS,
            });
        }
        if self.issuer.is_empty() {
            return Err(Error::ConfigurationInvalid("issuer is empty".into()));
        }
        if self.token_type.is_empty() {
            return Err(Error::ConfigurationInvalid("token type is empty".into()));
        }
        if self.algorithms.is_empty() {
            return Err(Error::ConfigurationInvalid(
                "algorithm policy allows nothing".into(),
            ));
        }
        if let Some(denial) = self.force_bypass.iter().find(|d| !d.is_waivable()) {
            return Err(Error::ConfigurationInvalid(format!(
                "'{denial}' can never be bypassed by force"
            )));
        }

        Ok(GateConfig {
            claims: ClaimsValidation {
                token_type: self.token_type.clone(),
                algorithms: self.algorithms.clone(),
                issuer: self.issuer.clone(),
                clock_skew_seconds: self.clock_skew_seconds,
            },
            key: self.key.clone(),
            force_bypass: self.force_bypass.clone(),
        })
    }
}
