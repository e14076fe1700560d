//! Integration test: allow-list issuance configured the way the node does it.

use std::sync::Arc;

use kycvault_core::{IssuancePolicyKind, RegistryConfig};
use kycvault_crypto::{fingerprint_bytes, FingerprintAlgorithm};
use kycvault_integration_tests::Account;
use kycvault_registry::{
    policy_from_config, CredentialRegistry, IssuerAllowList, MemoryStore, RegistryError,
};

#[test]
fn test_allow_list_from_config() {
    let trusted = Account::new("trusted");
    let rogue = Account::new("rogue");
    let holder = Account::new("holder");
    let fp = fingerprint_bytes(FingerprintAlgorithm::Keccak256, b"id card");

    let config = RegistryConfig {
        issuance: IssuancePolicyKind::AllowList,
        trusted_issuers: vec![trusted.address().to_hex()],
    };
    let registry =
        CredentialRegistry::with_policy(MemoryStore::new(), policy_from_config(&config).unwrap());
    assert_eq!(registry.issuance_policy(), IssuancePolicyKind::AllowList);

    let err = registry
        .issue_credential(&rogue.caller(), holder.address(), fp)
        .unwrap_err();
    assert!(matches!(err, RegistryError::IssuerNotAllowed(a) if a == rogue.address()));
    assert!(registry.get_record(&holder.address()).unwrap().issuer.is_zero());
    assert_eq!(registry.last_sequence().unwrap(), 0);

    registry
        .issue_credential(&trusted.caller(), holder.address(), fp)
        .unwrap();
    assert_eq!(
        registry.get_record(&holder.address()).unwrap().issuer,
        trusted.address()
    );
}

#[test]
fn test_delisted_issuer_can_still_revoke() {
    let issuer = Account::new("issuer");
    let holder = Account::new("holder");
    let fp = fingerprint_bytes(FingerprintAlgorithm::Keccak256, b"id card");

    let allow_list = Arc::new(IssuerAllowList::new([issuer.address()]));
    let registry = CredentialRegistry::with_policy(MemoryStore::new(), allow_list.clone());
    registry
        .issue_credential(&issuer.caller(), holder.address(), fp)
        .unwrap();

    allow_list.remove(&issuer.address());
    assert!(registry
        .issue_credential(&issuer.caller(), holder.address(), fp)
        .is_err());
    registry
        .revoke_credential(&issuer.caller(), holder.address())
        .unwrap();
    assert!(!registry.get_record(&holder.address()).unwrap().valid);
}

#[test]
fn test_open_policy_is_default() {
    let registry = CredentialRegistry::new(MemoryStore::new());
    assert_eq!(registry.issuance_policy(), IssuancePolicyKind::Open);

    let anyone = Account::new("anyone");
    let holder = Account::new("holder");
    registry
        .issue_credential(
            &anyone.caller(),
            holder.address(),
            fingerprint_bytes(FingerprintAlgorithm::Blake3, b"selfie"),
        )
        .unwrap();
}
