//! Provisioning settings
//!
//! Where the token, trusted key and issuer artifacts live, plus the policy
//! knobs of the gate. Sources are layered: built-in defaults, then an
//! optional TOML file, then `TRUSTED_FLIGHT_*` environment variables.
//!
//! ```toml
//! token_path = "/mnt/sd/trusted_flight/token"
//! public_key_path = "/mnt/sd/trusted_flight/key.pem"
//! issuer_path = "/mnt/sd/trusted_flight/token_issuer"
//! algorithms = ["ES256"]
//! clock_skew_seconds = 5
//! force_bypass = ["invalid_token_exp_claim"]
//! ```

use crate::algorithm::AlgorithmPolicy;
use crate::config::{GateConfig, DEFAULT_TOKEN_TYPE};
use crate::error::{Error, Result};
use crate::key::TrustedKey;
use crate::loader::FileTokenSource;
use crate::verdict::Denial;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "TRUSTED_FLIGHT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    pub token_path: PathBuf,
    pub public_key_path: PathBuf,
    pub issuer_path: PathBuf,
    /// Inline issuer; takes precedence over `issuer_path`
    pub issuer: Option<String>,
    pub token_type: String,
    pub algorithms: Vec<String>,
    pub clock_skew_seconds: u64,
    pub force_bypass: Vec<Denial>,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("trusted_flight/token"),
            public_key_path: PathBuf::from("trusted_flight/key.pem"),
            issuer_path: PathBuf::from("trusted_flight/token_issuer"),
            issuer: None,
            token_type: DEFAULT_TOKEN_TYPE.to_owned(),
            algorithms: vec!["RS256".to_owned()],
            clock_skew_seconds: 0,
            force_bypass: Vec::new(),
        }
    }
}

impl GateSettings {
    /// Load settings from the environment and, if given, a TOML file
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder =
                builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("algorithms")
                .with_list_parse_key("force_bypass"),
        );

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| Error::ConfigurationInvalid(e.to_string()))
    }

    /// Token source reading `token_path` on every attempt
    pub fn token_source(&self) -> FileTokenSource {
        FileTokenSource::new(&self.token_path)
    }

    /// The trusted issuer, from the inline value or the issuer artifact
    pub fn read_issuer(&self) -> Result<String> {
        if let Some(issuer) = &self.issuer {
            return Ok(issuer.clone());
        }

        let contents = std::fs::read_to_string(&self.issuer_path).map_err(|e| {
            Error::ConfigurationInvalid(format!(
                "cannot read issuer {}: {e}",
                self.issuer_path.display()
            ))
        })?;
        Ok(contents.trim_end().to_owned())
    }

    /// Read the key and issuer artifacts and build a validated gate config
    pub fn gate_config(&self) -> Result<GateConfig> {
        let key = TrustedKey::from_file(&self.public_key_path)?;
        let issuer = self.read_issuer()?;
        let algorithms = AlgorithmPolicy::from_names(self.algorithms.as_slice())?;

        GateConfig::builder(issuer, key)
            .algorithms(algorithms)
            .token_type(&self.token_type)
            .clock_skew(self.clock_skew_seconds)
            .force_bypass(self.force_bypass.iter().copied())
            .build()
    }
}
