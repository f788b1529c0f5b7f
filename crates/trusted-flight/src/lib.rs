//! Arm-time authorization gate for signed trusted-flight tokens.
//!
//! A vehicle may only arm when an operator-provisioned token is present, well
//! formed, issued by the trusted issuer, inside its validity window, and signed
//! by the trusted key. [`ArmingGate::evaluate`] checks all of that on every
//! attempt and answers with a [`Verdict`] whose denial text is stable.
//!
//! ```no_run
//! use trusted_flight::{ArmingGate, GateSettings};
//!
//! let settings = GateSettings::load(None)?;
//! let gate = ArmingGate::initialize(&settings);
//!
//! if let Some(message) = gate.evaluate(false).prearm_message() {
//!     eprintln!("{message}");
//! }
//! # Ok::<(), trusted_flight::Error>(())
//! ```

mod error;

// Internal modules
pub(crate) mod algorithm;
pub(crate) mod claims;
pub(crate) mod clock;
pub(crate) mod config;
pub(crate) mod gate;
pub(crate) mod header;
pub(crate) mod key;
pub(crate) mod loader;
pub(crate) mod settings;
pub(crate) mod token;
pub(crate) mod utils;
pub(crate) mod verdict;

// Public Interface
pub use algorithm::{AlgorithmPolicy, AlgorithmType};
pub use claims::{Claim, DecodedPayload};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{GateConfig, GateConfigBuilder, DEFAULT_TOKEN_TYPE};
pub use error::{Error, Result};
pub use gate::ArmingGate;
pub use header::DecodedHeader;
pub use key::TrustedKey;
pub use loader::{FileTokenSource, TokenSource};
pub use settings::GateSettings;
pub use token::{decode_segment, encode_segment, parse_json, DecodedToken, RawToken, TokenSegments};
pub use verdict::{Authorization, Denial, Verdict, PREARM_PREFIX};

pub(crate) mod limits;
