//! Integration test: the issuer → holder → verifier lifecycle across crates.
//!
//! Accounts are real Ed25519 key pairs, fingerprints come from the crypto
//! crate and all state lives in the registry's in-memory store.

use kycvault_core::{EventFilter, RecordState, RegistryCall, RegistryEvent};
use kycvault_crypto::{fingerprint_bytes, FingerprintAlgorithm};
use kycvault_integration_tests::{memory_registry, Account};
use kycvault_registry::RegistryError;

const PASSPORT: &[u8] = b"%PDF-1.7 passport scan of the holder";

// =========================================================================
// The end-to-end consent scenario
// =========================================================================

#[test]
fn test_full_consent_scenario() {
    let issuer = Account::new("issuer");
    let holder = Account::new("holder");
    let verifier = Account::new("verifier");
    let registry = memory_registry();
    let fp = fingerprint_bytes(FingerprintAlgorithm::Keccak256, PASSPORT);

    registry
        .issue_credential(&issuer.caller(), holder.address(), fp)
        .expect("issuance should succeed");
    registry
        .grant_consent(&holder.caller(), verifier.address())
        .unwrap();
    assert!(registry.verify_credential(&verifier.caller(), holder.address(), fp));

    registry
        .revoke_consent(&holder.caller(), verifier.address())
        .unwrap();
    assert!(!registry.verify_credential(&verifier.caller(), holder.address(), fp));

    registry
        .revoke_credential(&issuer.caller(), holder.address())
        .unwrap();
    registry
        .grant_consent(&holder.caller(), verifier.address())
        .unwrap();
    assert!(!registry.verify_credential(&verifier.caller(), holder.address(), fp));

    let record = registry.get_record(&holder.address()).unwrap();
    assert_eq!(record.issuer, issuer.address());
    assert!(!record.valid);
    assert_eq!(registry.get_fingerprint(&holder.address()).unwrap(), fp);
    assert_eq!(
        registry.record_state(&holder.address()).unwrap(),
        RecordState::Revoked
    );

    let names: Vec<&str> = registry
        .events(&EventFilter::all())
        .unwrap()
        .iter()
        .map(|e| e.event.name())
        .collect();
    assert_eq!(
        names,
        vec![
            "CredentialIssued",
            "ConsentGranted",
            "ConsentRevoked",
            "CredentialRevoked",
            "ConsentGranted",
        ]
    );
}

#[test]
fn test_document_change_requires_reissue() {
    let issuer = Account::new("issuer");
    let holder = Account::new("holder");
    let verifier = Account::new("verifier");
    let registry = memory_registry();

    let original = fingerprint_bytes(FingerprintAlgorithm::Keccak256, PASSPORT);
    let renewed = fingerprint_bytes(FingerprintAlgorithm::Keccak256, b"renewed passport");

    registry
        .issue_credential(&issuer.caller(), holder.address(), original)
        .unwrap();
    registry
        .grant_consent(&holder.caller(), verifier.address())
        .unwrap();
    assert!(!registry.verify_credential(&verifier.caller(), holder.address(), renewed));

    registry
        .issue_credential(&issuer.caller(), holder.address(), renewed)
        .unwrap();
    assert!(registry.verify_credential(&verifier.caller(), holder.address(), renewed));
    assert!(!registry.verify_credential(&verifier.caller(), holder.address(), original));
}

#[test]
fn test_algorithms_are_not_interchangeable() {
    let issuer = Account::new("issuer");
    let holder = Account::new("holder");
    let verifier = Account::new("verifier");
    let registry = memory_registry();

    registry
        .issue_credential(
            &issuer.caller(),
            holder.address(),
            fingerprint_bytes(FingerprintAlgorithm::Keccak256, PASSPORT),
        )
        .unwrap();
    registry
        .grant_consent(&holder.caller(), verifier.address())
        .unwrap();
    assert!(!registry.verify_credential(
        &verifier.caller(),
        holder.address(),
        fingerprint_bytes(FingerprintAlgorithm::Blake3, PASSPORT)
    ));
}

// =========================================================================
// Authority and isolation
// =========================================================================

#[test]
fn test_only_issuer_can_revoke() {
    let issuer = Account::new("issuer");
    let other_issuer = Account::new("other-issuer");
    let holder = Account::new("holder");
    let registry = memory_registry();
    let fp = fingerprint_bytes(FingerprintAlgorithm::Keccak256, PASSPORT);

    registry
        .issue_credential(&issuer.caller(), holder.address(), fp)
        .unwrap();

    for account in [&other_issuer, &holder] {
        let err = registry
            .revoke_credential(&account.caller(), holder.address())
            .unwrap_err();
        assert!(
            matches!(err, RegistryError::Unauthorized { .. }),
            "{} should not be able to revoke",
            account.name
        );
    }
    assert!(registry.get_record(&holder.address()).unwrap().valid);

    // Reissuing hands revocation authority to the new issuer.
    registry
        .issue_credential(&other_issuer.caller(), holder.address(), fp)
        .unwrap();
    assert!(registry
        .revoke_credential(&issuer.caller(), holder.address())
        .is_err());
    assert!(registry
        .revoke_credential(&other_issuer.caller(), holder.address())
        .is_ok());
}

#[test]
fn test_consent_does_not_leak_between_holders() {
    let issuer = Account::new("issuer");
    let alice = Account::new("alice");
    let bob = Account::new("bob");
    let verifier = Account::new("verifier");
    let registry = memory_registry();
    let fp = fingerprint_bytes(FingerprintAlgorithm::Keccak256, PASSPORT);

    registry
        .issue_credential(&issuer.caller(), alice.address(), fp)
        .unwrap();
    registry
        .issue_credential(&issuer.caller(), bob.address(), fp)
        .unwrap();
    registry
        .grant_consent(&alice.caller(), verifier.address())
        .unwrap();

    assert!(registry.verify_credential(&verifier.caller(), alice.address(), fp));
    assert!(!registry.verify_credential(&verifier.caller(), bob.address(), fp));
}

#[test]
fn test_events_by_participant() {
    let issuer = Account::new("issuer");
    let holder = Account::new("holder");
    let verifier = Account::new("verifier");
    let registry = memory_registry();
    let fp = fingerprint_bytes(FingerprintAlgorithm::Keccak256, PASSPORT);

    registry
        .execute(
            &issuer.caller(),
            &RegistryCall::IssueCredential {
                holder: holder.address(),
                fingerprint: fp,
            },
        )
        .unwrap();
    registry
        .execute(
            &holder.caller(),
            &RegistryCall::GrantConsent {
                verifier: verifier.address(),
            },
        )
        .unwrap();

    let for_verifier = registry
        .events(&EventFilter::all().involving(verifier.address()))
        .unwrap();
    assert_eq!(for_verifier.len(), 1);
    assert_eq!(
        for_verifier[0].event,
        RegistryEvent::ConsentGranted {
            holder: holder.address(),
            verifier: verifier.address(),
        }
    );

    let for_issuer = registry
        .events(&EventFilter::all().involving(issuer.address()))
        .unwrap();
    assert_eq!(for_issuer.len(), 1);
    assert_eq!(for_issuer[0].sequence, 1);

    // Events survive a JSON round trip for the events endpoint.
    let json = serde_json::to_string(&for_issuer).unwrap();
    assert!(json.contains("credential_issued"));
}
