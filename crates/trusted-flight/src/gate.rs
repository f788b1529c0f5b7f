//! The arming gate
//!
//! Every arming attempt runs the same fixed sequence and stops at the first
//! failure:
//!
//! 1. initialization check (trusted key and issuer loaded)
//! 2. trusted clock available
//! 3. load the token artifact fresh from its source
//! 4. decode it
//! 5. validate claims
//! 6. verify the signature
//!
//! Nothing is cached between attempts. The configuration is shared read-only,
//! so a gate can be cloned and evaluated from several threads at once.

use crate::claims::{validate_claims, Waiver};
use crate::clock::{Clock, SystemClock};
use crate::config::GateConfig;
use crate::error::{Error, Result};
use crate::loader::TokenSource;
use crate::settings::GateSettings;
use crate::token::DecodedToken;
use crate::verdict::{Authorization, Verdict};
use std::sync::Arc;

#[derive(Clone)]
pub struct ArmingGate {
    config: Option<Arc<GateConfig>>,
    source: Arc<dyn TokenSource>,
    clock: Arc<dyn Clock>,
}

impl ArmingGate {
    /// Create an initialized gate using the system clock
    pub fn new(config: GateConfig, source: impl TokenSource + 'static) -> Self {
        Self {
            config: Some(Arc::new(config)),
            source: Arc::new(source),
            clock: Arc::new(SystemClock),
        }
    }

    /// Load the trusted key and issuer described by `settings`
    ///
    /// This never fails. If an artifact is missing or invalid the error is
    /// logged and the gate denies every attempt as not initialized.
    pub fn initialize(settings: &GateSettings) -> Self {
        let config = match settings.gate_config() {
            Ok(config) => {
                tracing::info!(
                    issuer = config.issuer(),
                    key = %settings.public_key_path.display(),
                    "trusted flight initialized"
                );
                Some(Arc::new(config))
            }
            Err(err) => {
                tracing::error!(error = %err, "trusted flight initialization failed");
                None
            }
        };

        Self {
            config,
            source: Arc::new(settings.token_source()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the source of trusted time
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    pub fn config(&self) -> Option<&GateConfig> {
        self.config.as_deref()
    }

    /// Decide one arming attempt
    ///
    /// With `force` set, claim failures the configuration marks as bypassable
    /// are waived. A signature failure is always a denial.
    pub fn evaluate(&self, force: bool) -> Verdict {
        let span = tracing::info_span!("trusted_flight.evaluate", force);
        let _enter = span.enter();

        match self.authorize(force) {
            Ok(authorization) => {
                tracing::info!(
                    issuer = %authorization.issuer,
                    algorithm = %authorization.algorithm,
                    expires_at = authorization.expires_at,
                    waived = ?authorization.waived,
                    "Token is valid."
                );
                Verdict::Authorized(authorization)
            }
            Err(err) => {
                let reason = err.denial();
                let force_bypassable = self
                    .config
                    .as_deref()
                    .is_some_and(|config| config.is_force_bypassable(&err));
                tracing::warn!(%reason, error = %err, force_bypassable, "arming denied");
                Verdict::Denied {
                    reason,
                    force_bypassable,
                }
            }
        }
    }

    /// Run one attempt and keep the detailed error on failure
    pub fn authorize(&self, force: bool) -> Result<Authorization> {
        let config = self.config.as_deref().ok_or(Error::NotInitialized)?;

        let now = self.clock.now().ok_or(Error::ClockUnavailable)?;
        tracing::debug!(now, "trusted time");

        let raw = self.source.load()?;
        let token = DecodedToken::decode(&raw)?;

        let waiver = Waiver::new(force, config.force_bypass());
        let claims = validate_claims(
            token.header(),
            token.payload(),
            config.claims(),
            now,
            &waiver,
        )?;

        claims.algorithm.verify_signature(
            token.segments().signing_input(),
            token.signature(),
            config.key(),
        )?;

        Ok(claims.into_authorization())
    }
}

impl std::fmt::Debug for ArmingGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmingGate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
