//! Arming scenarios against a provisioned vehicle
//!
//! Each test provisions a trusted key and issuer, installs one token, and
//! checks the exact message the arming subsystem would report.

mod fixtures;

use fixtures::{
    assert_arming_fails, assert_arming_succeeds, encode, Signer, TokenBuilder, Vehicle, NOW,
};
use serde_json::json;
use trusted_flight::Denial;

fn vehicle_with_token(build: impl FnOnce(TokenBuilder) -> TokenBuilder) -> Vehicle {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    vehicle.install_token(&build(TokenBuilder::for_signer(&signer)).sign(&signer));
    vehicle
}

#[test]
fn test_missing_token() {
    let vehicle = Vehicle::provision(&Signer::es256());
    assert_arming_fails(&vehicle, "Unable to read token", false);
}

#[test]
fn test_empty_token_file() {
    let vehicle = Vehicle::provision(&Signer::es256());
    vehicle.install_token("");
    assert_arming_fails(&vehicle, "Unable to read token", false);
}

#[test]
fn test_token_with_invalid_base64() {
    let vehicle = Vehicle::provision(&Signer::es256());
    vehicle.install_token("eyJ0eXAi$.eyJpc3Mi%.c2lnbmF0dXJl!");
    assert_arming_fails(&vehicle, "Invalid token format", false);
}

#[test]
fn test_token_with_invalid_json() {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    let valid = TokenBuilder::for_signer(&signer);

    let signing_input = format!(
        "{}.{}",
        encode(br#"{"typ":"JWT","alg":"ES256""#),
        valid.encoded_claims()
    );
    let signature = encode(&signer.sign(signing_input.as_bytes()));
    vehicle.install_token(&format!("{signing_input}.{signature}"));

    assert_arming_fails(&vehicle, "Invalid token format", false);
}

#[test]
fn test_token_without_payload() {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    let token = TokenBuilder::for_signer(&signer).sign(&signer);
    let mut parts = token.split('.');
    let header = parts.next().unwrap();
    let signature = parts.nth(1).unwrap();

    vehicle.install_token(&format!("{header}.{signature}"));
    assert_arming_fails(&vehicle, "Invalid token format", false);

    vehicle.install_token(&format!("{header}..{signature}"));
    assert_arming_fails(&vehicle, "Invalid token format", false);
}

#[test]
fn test_token_without_signature() {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    let builder = TokenBuilder::for_signer(&signer);
    let unsigned = format!("{}.{}", builder.encoded_header(), builder.encoded_claims());

    vehicle.install_token(&unsigned);
    assert_arming_fails(&vehicle, "Invalid token format", false);

    vehicle.install_token(&format!("{unsigned}."));
    assert_arming_fails(&vehicle, "Invalid token format", false);
}

#[test]
fn test_token_without_type() {
    let vehicle = vehicle_with_token(|t| t.without_header("typ"));
    assert_arming_fails(&vehicle, "Invalid token type", false);
}

#[test]
fn test_token_with_invalid_type() {
    let vehicle = vehicle_with_token(|t| t.header("typ", json!("JWS")));
    assert_arming_fails(&vehicle, "Invalid token type", false);
}

#[test]
fn test_token_without_algorithm() {
    let vehicle = vehicle_with_token(|t| t.without_header("alg"));
    assert_arming_fails(&vehicle, "Invalid token algorithm", false);
}

#[test]
fn test_token_with_invalid_algorithm() {
    for alg in ["HS256", "none", "ES999", ""] {
        let vehicle = vehicle_with_token(|t| t.header("alg", json!(alg)));
        assert_arming_fails(&vehicle, "Invalid token algorithm", false);
    }
}

#[test]
fn test_token_without_issuer() {
    let vehicle = vehicle_with_token(|t| t.without_claim("iss"));
    assert_arming_fails(&vehicle, "Invalid token issuer", false);
}

#[test]
fn test_token_with_invalid_issuer() {
    let vehicle = vehicle_with_token(|t| t.claim("iss", json!("https://rogue.example")));
    assert_arming_fails(&vehicle, "Invalid token issuer", false);
}

#[test]
fn test_token_without_iat() {
    let vehicle = vehicle_with_token(|t| t.without_claim("iat"));
    assert_arming_fails(&vehicle, "Invalid token iat claim", false);
}

#[test]
fn test_token_with_invalid_iat() {
    let vehicle = vehicle_with_token(|t| t.claim("iat", json!("yesterday")));
    assert_arming_fails(&vehicle, "Invalid token iat claim", false);
}

#[test]
fn test_token_with_iat_in_future() {
    let vehicle = vehicle_with_token(|t| t.claim("iat", json!(NOW + 3600)));
    assert_arming_fails(&vehicle, "Invalid token iat claim", false);
}

#[test]
fn test_token_without_nbf() {
    let vehicle = vehicle_with_token(|t| t.without_claim("nbf"));
    assert_arming_succeeds(&vehicle);
}

#[test]
fn test_token_with_invalid_nbf() {
    let vehicle = vehicle_with_token(|t| t.claim("nbf", json!("soon")));
    assert_arming_fails(&vehicle, "Invalid token nbf claim", false);
}

#[test]
fn test_token_with_nbf_in_future() {
    let vehicle = vehicle_with_token(|t| t.claim("nbf", json!(NOW + 3600)));
    assert_arming_fails(&vehicle, "Invalid token nbf claim", false);
}

#[test]
fn test_token_without_exp() {
    let vehicle = vehicle_with_token(|t| t.without_claim("exp"));
    assert_arming_fails(&vehicle, "Invalid token exp claim", false);
}

#[test]
fn test_token_with_invalid_exp() {
    let vehicle = vehicle_with_token(|t| t.claim("exp", json!({ "in": "1h" })));
    assert_arming_fails(&vehicle, "Invalid token exp claim", false);
}

#[test]
fn test_token_with_exp_in_past() {
    let vehicle = vehicle_with_token(|t| t.claim("exp", json!(NOW - 1)));
    assert_arming_fails(&vehicle, "Invalid token exp claim", false);
}

#[test]
fn test_token_signed_with_different_key() {
    let vehicle = Vehicle::provision(&Signer::es256());
    let rogue = Signer::es256();
    vehicle.install_token(&TokenBuilder::for_signer(&rogue).sign(&rogue));

    assert_arming_fails(&vehicle, "Invalid token signature", false);
}

#[test]
fn test_token_signed_with_different_key_force_arm() {
    let vehicle = Vehicle::provision(&Signer::es256());
    let rogue = Signer::es256();
    vehicle.install_token(&TokenBuilder::for_signer(&rogue).sign(&rogue));

    assert_arming_fails(&vehicle, "Invalid token signature", true);
}

#[test]
fn test_valid_token() {
    let vehicle = vehicle_with_token(|t| t);
    assert_arming_succeeds(&vehicle);
}

#[test]
fn test_valid_rs256_token_with_pem_key() {
    let signer = Signer::rs256();
    let vehicle = Vehicle::provision(&signer);
    vehicle.install_token(&TokenBuilder::for_signer(&signer).sign(&signer));

    assert_arming_succeeds(&vehicle);
}

#[test]
fn test_valid_token_with_trailing_newline() {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    let token = TokenBuilder::for_signer(&signer).sign(&signer);
    vehicle.install_token(&format!("{token}\n"));

    assert_arming_succeeds(&vehicle);
}

#[test]
fn test_tampered_payload_fails_signature() {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    let token = TokenBuilder::for_signer(&signer).sign(&signer);
    let signature = token.rsplit('.').next().unwrap();

    let tampered = TokenBuilder::for_signer(&signer).claim("exp", json!(NOW + 86_400));
    vehicle.install_token(&format!(
        "{}.{}.{signature}",
        tampered.encoded_header(),
        tampered.encoded_claims()
    ));

    assert_arming_fails(&vehicle, "Invalid token signature", false);
}

#[test]
fn test_algorithm_checked_before_issuer() {
    let vehicle = vehicle_with_token(|t| {
        t.header("alg", json!("XX999"))
            .claim("iss", json!("https://rogue.example"))
    });
    assert_arming_fails(&vehicle, "Invalid token algorithm", false);
}

#[test]
fn test_claims_checked_before_signature() {
    let vehicle = Vehicle::provision(&Signer::es256());
    let rogue = Signer::es256();
    vehicle.install_token(
        &TokenBuilder::for_signer(&rogue)
            .claim("exp", json!(NOW - 1))
            .sign(&rogue),
    );

    assert_arming_fails(&vehicle, "Invalid token exp claim", false);
}

#[test]
fn test_token_replaced_between_attempts() {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    let gate = vehicle.gate();

    vehicle.install_token(
        &TokenBuilder::for_signer(&signer)
            .claim("exp", json!(NOW - 1))
            .sign(&signer),
    );
    assert!(!gate.evaluate(false).is_authorized());

    vehicle.install_token(&TokenBuilder::for_signer(&signer).sign(&signer));
    assert!(gate.evaluate(false).is_authorized());

    vehicle.remove_token();
    assert_eq!(
        gate.evaluate(false).prearm_message().as_deref(),
        Some("TrustedFlight: Unable to read token")
    );
}

#[test]
fn test_not_initialized_without_key() {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    vehicle.install_token(&TokenBuilder::for_signer(&signer).sign(&signer));
    std::fs::remove_file(&vehicle.settings().public_key_path).unwrap();

    assert_arming_fails(&vehicle, "Initialization is not done yet", false);
    assert_arming_fails(&vehicle, "Initialization is not done yet", true);
}

#[test]
fn test_not_initialized_with_corrupt_key() {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    vehicle.install_token(&TokenBuilder::for_signer(&signer).sign(&signer));
    std::fs::write(&vehicle.settings().public_key_path, b"not a key at all").unwrap();

    assert!(!vehicle.gate().is_initialized());
    assert_arming_fails(&vehicle, "Initialization is not done yet", false);
}

#[test]
fn test_same_artifact_same_verdict() {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    let gate = vehicle.gate();

    vehicle.install_token(&TokenBuilder::for_signer(&signer).sign(&signer));
    let first = gate.evaluate(false);
    assert!(first.is_authorized());
    assert_eq!(gate.evaluate(false), first);

    vehicle.install_token(
        &TokenBuilder::for_signer(&signer)
            .claim("exp", json!(NOW - 1))
            .sign(&signer),
    );
    let first = gate.evaluate(false);
    assert_eq!(first.reason(), Some(Denial::InvalidTokenExpClaim));
    assert_eq!(gate.evaluate(false), first);
}

#[test]
fn test_oversized_token_file() {
    let vehicle = Vehicle::provision(&Signer::es256());
    vehicle.install_token(&"a".repeat(2 * 1024 * 1024));
    assert_arming_fails(&vehicle, "Invalid token format", false);
}

#[test]
fn test_not_initialized_without_issuer() {
    let signer = Signer::es256();
    let vehicle = Vehicle::provision(&signer);
    vehicle.install_token(&TokenBuilder::for_signer(&signer).sign(&signer));
    std::fs::remove_file(&vehicle.settings().issuer_path).unwrap();

    assert_arming_fails(&vehicle, "Initialization is not done yet", false);
}
