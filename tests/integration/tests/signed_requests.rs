//! Integration test: signed envelopes carrying registry calls and queries.
//!
//! Mirrors what the node does with a request: check the signature, derive
//! the caller from the key, then act on the body.

use kycvault_core::{Caller, RegistryCall, Submission, VerifyQuery};
use kycvault_crypto::{fingerprint_bytes, FingerprintAlgorithm, SignedEnvelope};
use kycvault_integration_tests::{memory_registry, Account};

fn execute(
    registry: &kycvault_registry::CredentialRegistry<kycvault_registry::MemoryStore>,
    envelope: SignedEnvelope<Submission>,
) -> bool {
    let Ok((signer, submission)) = envelope.open() else {
        return false;
    };
    let caller = Caller::new(signer).unwrap();
    registry.execute(&caller, &submission.call).is_ok()
}

#[test]
fn test_signed_flow_over_json() {
    let issuer = Account::new("issuer");
    let holder = Account::new("holder");
    let verifier = Account::new("verifier");
    let registry = memory_registry();
    let fp = fingerprint_bytes(FingerprintAlgorithm::Keccak256, b"utility bill");

    let issue = SignedEnvelope::seal(
        &issuer.keypair,
        Submission {
            nonce: 0,
            call: RegistryCall::IssueCredential {
                holder: holder.address(),
                fingerprint: fp,
            },
        },
    )
    .unwrap();
    let wire = serde_json::to_string(&issue).unwrap();
    assert!(execute(&registry, serde_json::from_str(&wire).unwrap()));

    let grant = SignedEnvelope::seal(
        &holder.keypair,
        Submission {
            nonce: 0,
            call: RegistryCall::GrantConsent {
                verifier: verifier.address(),
            },
        },
    )
    .unwrap();
    assert!(execute(&registry, grant));

    let query = SignedEnvelope::seal(
        &verifier.keypair,
        VerifyQuery {
            holder: holder.address(),
            fingerprint: fp,
            issued_at: 1_700_000_000,
        },
    )
    .unwrap();
    let (signer, body) = query.open().unwrap();
    assert_eq!(signer, verifier.address());
    assert!(registry.verify_credential(&Caller::new(signer).unwrap(), body.holder, body.fingerprint));
}

#[test]
fn test_forged_signer_cannot_act_as_holder() {
    let issuer = Account::new("issuer");
    let holder = Account::new("holder");
    let attacker = Account::new("attacker");
    let registry = memory_registry();
    let fp = fingerprint_bytes(FingerprintAlgorithm::Keccak256, b"utility bill");
    registry
        .issue_credential(&issuer.caller(), holder.address(), fp)
        .unwrap();

    // The attacker signs a consent grant but swaps in the holder's public key.
    let mut envelope = SignedEnvelope::seal(
        &attacker.keypair,
        Submission {
            nonce: 0,
            call: RegistryCall::GrantConsent {
                verifier: attacker.address(),
            },
        },
    )
    .unwrap();
    envelope.public_key = holder.keypair.public_key().to_hex();
    assert!(!execute(&registry, envelope));
    assert!(!registry
        .has_consent(&holder.address(), &attacker.address())
        .unwrap());

    // Signed honestly, the grant lands on the attacker's own consent set.
    let honest = SignedEnvelope::seal(
        &attacker.keypair,
        Submission {
            nonce: 0,
            call: RegistryCall::GrantConsent {
                verifier: holder.address(),
            },
        },
    )
    .unwrap();
    assert!(execute(&registry, honest));
    assert!(registry
        .has_consent(&attacker.address(), &holder.address())
        .unwrap());
    assert!(!registry.verify_credential(&attacker.caller(), holder.address(), fp));
}
