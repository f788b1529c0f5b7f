//! Arming verdicts and their operator-facing reasons
//!
//! The `Display` text of every [`Denial`] is a compatibility contract: arming
//! checks and automated test harnesses match on it verbatim.

use crate::algorithm::AlgorithmType;
use serde::Deserialize;

/// Prefix the arming subsystem puts in front of every trusted-flight message
pub const PREARM_PREFIX: &str = "TrustedFlight";

/// Why an arming attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    NotInitialized,
    RtcNotAvailable,
    MissingToken,
    InvalidTokenFormat,
    InvalidTokenType,
    InvalidTokenAlgorithm,
    InvalidTokenIssuer,
    InvalidTokenIatClaim,
    InvalidTokenNbfClaim,
    InvalidTokenExpClaim,
    InvalidTokenSignature,
}

impl Denial {
    /// Stable operator-facing message
    pub const fn as_str(&self) -> &'static str {
        match self {
            Denial::NotInitialized => "Initialization is not done yet",
            Denial::RtcNotAvailable => "RTC not available",
            Denial::MissingToken => "Unable to read token",
            Denial::InvalidTokenFormat => "Invalid token format",
            Denial::InvalidTokenType => "Invalid token type",
            Denial::InvalidTokenAlgorithm => "Invalid token algorithm",
            Denial::InvalidTokenIssuer => "Invalid token issuer",
            Denial::InvalidTokenIatClaim => "Invalid token iat claim",
            Denial::InvalidTokenNbfClaim => "Invalid token nbf claim",
            Denial::InvalidTokenExpClaim => "Invalid token exp claim",
            Denial::InvalidTokenSignature => "Invalid token signature",
        }
    }

    /// Whether a gate may ever be configured to let force-arm waive this reason
    ///
    /// Only payload claims qualify. Everything before them leaves nothing to
    /// verify, and the signature is the one check force never relaxes.
    pub const fn is_waivable(&self) -> bool {
        matches!(
            self,
            Denial::InvalidTokenIssuer
                | Denial::InvalidTokenIatClaim
                | Denial::InvalidTokenNbfClaim
                | Denial::InvalidTokenExpClaim
        )
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful arming authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub issuer: String,
    pub algorithm: AlgorithmType,
    pub issued_at: i64,
    pub not_before: Option<i64>,
    pub expires_at: i64,
    /// Claim failures waived by force-arm (empty unless forced)
    pub waived: Vec<Denial>,
}

impl Authorization {
    /// True when force-arm waived at least one claim failure
    pub fn is_forced(&self) -> bool {
        !self.waived.is_empty()
    }
}

/// The outcome of one arming attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Authorized(Authorization),
    Denied {
        reason: Denial,
        /// Whether force-arm would have waived this reason
        force_bypassable: bool,
    },
}

impl Verdict {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Verdict::Authorized(_))
    }

    pub fn reason(&self) -> Option<Denial> {
        match self {
            Verdict::Authorized(_) => None,
            Verdict::Denied { reason, .. } => Some(*reason),
        }
    }

    /// The message the arming subsystem reports, e.g. `TrustedFlight: Invalid token format`
    pub fn prearm_message(&self) -> Option<String> {
        self.reason()
            .map(|reason| format!("{PREARM_PREFIX}: {reason}"))
    }
}
