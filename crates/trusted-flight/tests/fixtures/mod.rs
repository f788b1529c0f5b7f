//! Test fixtures: key pairs, token minting and provisioned vehicles
//!
//! Tokens are signed locally with aws-lc-rs, so every scenario exercises a
//! real signature. A [`Vehicle`] lays out the provisioning artifacts (trusted
//! key, issuer, token) in a temporary directory the way an operator would.

#![allow(dead_code)]

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{
    EcdsaKeyPair, KeyPair, RsaKeyPair, ECDSA_P256_SHA256_FIXED_SIGNING, RSA_PKCS1_SHA256,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};
use tempfile::TempDir;
use trusted_flight::{ArmingGate, FixedClock, GateSettings, Verdict};

pub const ISSUER: &str = "https://trusted-flight.example/issuer";

/// The vehicle's trusted time in every scenario
pub const NOW: i64 = 1_735_689_600;

/// A signing key pair
pub enum Signer {
    Es256(EcdsaKeyPair),
    Rs256 {
        keypair: RsaKeyPair,
        public_pem: String,
    },
}

impl Signer {
    pub fn es256() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .expect("Failed to generate key");
        let keypair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref())
            .expect("Failed to load key");
        Signer::Es256(keypair)
    }

    pub fn rs256() -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate key");
        let pkcs8_doc = private_key
            .to_pkcs8_der()
            .expect("Failed to serialize to PKCS#8");
        let keypair = RsaKeyPair::from_pkcs8(pkcs8_doc.as_bytes()).expect("Failed to load key");
        let public_pem = RsaPublicKey::from(&private_key)
            .to_public_key_pem(LineEnding::LF)
            .expect("Failed to encode public key");
        Signer::Rs256 {
            keypair,
            public_pem,
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            Signer::Es256(_) => "ES256",
            Signer::Rs256 { .. } => "RS256",
        }
    }

    /// Key artifact as provisioned: PEM for RSA, the raw EC point for ECDSA
    pub fn public_key_artifact(&self) -> Vec<u8> {
        match self {
            Signer::Es256(keypair) => keypair.public_key().as_ref().to_vec(),
            Signer::Rs256 { public_pem, .. } => public_pem.as_bytes().to_vec(),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let rng = SystemRandom::new();
        match self {
            Signer::Es256(keypair) => keypair
                .sign(&rng, message)
                .expect("Failed to sign")
                .as_ref()
                .to_vec(),
            Signer::Rs256 { keypair, .. } => {
                let mut signature = vec![0u8; keypair.public_modulus_len()];
                keypair
                    .sign(&RSA_PKCS1_SHA256, &rng, message, &mut signature)
                    .expect("Failed to sign");
                signature
            }
        }
    }
}

/// Route gate logs to the test harness; filter with `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Builder for trusted-flight tokens
///
/// Starts from a token that a correctly provisioned vehicle accepts at [`NOW`].
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    header: Value,
    claims: Value,
}

impl TokenBuilder {
    pub fn new(algorithm: &str) -> Self {
        Self {
            header: json!({ "typ": "JWT", "alg": algorithm }),
            claims: json!({
                "iss": ISSUER,
                "iat": NOW - 60,
                "nbf": NOW - 60,
                "exp": NOW + 3600,
            }),
        }
    }

    pub fn for_signer(signer: &Signer) -> Self {
        Self::new(signer.algorithm())
    }

    pub fn header(mut self, key: &str, value: Value) -> Self {
        self.header[key] = value;
        self
    }

    pub fn without_header(mut self, key: &str) -> Self {
        if let Some(header) = self.header.as_object_mut() {
            header.remove(key);
        }
        self
    }

    pub fn claim(mut self, key: &str, value: Value) -> Self {
        self.claims[key] = value;
        self
    }

    pub fn without_claim(mut self, key: &str) -> Self {
        if let Some(claims) = self.claims.as_object_mut() {
            claims.remove(key);
        }
        self
    }

    pub fn encoded_header(&self) -> String {
        encode(self.header.to_string().as_bytes())
    }

    pub fn encoded_claims(&self) -> String {
        encode(self.claims.to_string().as_bytes())
    }

    /// Sign `header.payload` and append the signature segment
    pub fn sign(&self, signer: &Signer) -> String {
        let signing_input = format!("{}.{}", self.encoded_header(), self.encoded_claims());
        let signature = signer.sign(signing_input.as_bytes());
        format!("{signing_input}.{}", encode(&signature))
    }
}

/// A vehicle with trusted-flight artifacts provisioned in a temp directory
pub struct Vehicle {
    dir: TempDir,
    settings: GateSettings,
}

impl Vehicle {
    /// Trust `signer`'s public key and [`ISSUER`]
    pub fn provision(signer: &Signer) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let key_path = dir.path().join("key.pem");
        let issuer_path = dir.path().join("token_issuer");

        std::fs::write(&key_path, signer.public_key_artifact()).expect("Failed to write key");
        std::fs::write(&issuer_path, format!("{ISSUER}\n")).expect("Failed to write issuer");

        let settings = GateSettings {
            token_path: dir.path().join("token"),
            public_key_path: key_path,
            issuer_path,
            algorithms: vec![signer.algorithm().to_owned()],
            ..GateSettings::default()
        };

        Self { dir, settings }
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut GateSettings {
        &mut self.settings
    }

    pub fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }

    pub fn install_token(&self, token: &str) {
        std::fs::write(&self.settings.token_path, token).expect("Failed to write token");
    }

    pub fn remove_token(&self) {
        let _ = std::fs::remove_file(&self.settings.token_path);
    }

    /// Boot the gate against the provisioned artifacts
    pub fn gate(&self) -> ArmingGate {
        ArmingGate::initialize(&self.settings).with_clock(FixedClock::at(NOW))
    }

    pub fn arm(&self, force: bool) -> Verdict {
        self.gate().evaluate(force)
    }
}

/// Assert that arming fails with exactly `message` as reported to the operator
#[track_caller]
pub fn assert_arming_fails(vehicle: &Vehicle, message: &str, force: bool) {
    let verdict = vehicle.arm(force);
    assert_eq!(
        verdict.prearm_message().as_deref(),
        Some(format!("TrustedFlight: {message}").as_str()),
        "unexpected verdict: {verdict:?}"
    );
}

#[track_caller]
pub fn assert_arming_succeeds(vehicle: &Vehicle) {
    let verdict = vehicle.arm(false);
    assert!(verdict.is_authorized(), "arming denied: {verdict:?}");
}
