//! Signed request envelopes.
//!
//! The node derives a caller's address from the envelope's public key after
//! checking the signature; it never accepts a caller-supplied address.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use kycvault_core::Address;

use crate::error::CryptoError;
use crate::keys::{address_of, KeyPair, PublicKey};
use crate::signing::{sign, verify, Signature};

/// Domain separator prepended to every signed body.
const DOMAIN: &[u8] = b"kycvault:envelope:v1:";

/// A body signed by the key pair of the calling account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEnvelope<T> {
    /// Hex-encoded Ed25519 public key of the signer.
    pub public_key: String,
    /// Hex-encoded signature over the domain separator and the JSON body.
    pub signature: String,
    pub body: T,
}

fn signing_bytes<T: Serialize>(body: &T) -> Result<Vec<u8>, CryptoError> {
    let mut message = DOMAIN.to_vec();
    message.extend_from_slice(&serde_json::to_vec(body)?);
    Ok(message)
}

impl<T: Serialize + DeserializeOwned> SignedEnvelope<T> {
    /// Sign `body` with `keypair`.
    pub fn seal(keypair: &KeyPair, body: T) -> Result<Self, CryptoError> {
        let signature = sign(&signing_bytes(&body)?, keypair);
        Ok(Self {
            public_key: keypair.public_key().to_hex(),
            signature: signature.to_hex(),
            body,
        })
    }

    /// Check the signature and return the signer's address.
    pub fn signer(&self) -> Result<Address, CryptoError> {
        let public_key = PublicKey::from_hex(&self.public_key)?;
        let signature = Signature::from_hex(&self.signature)?;
        verify(&signing_bytes(&self.body)?, &signature, &public_key)?;
        Ok(address_of(&public_key))
    }

    /// Check the signature and split into the signer's address and the body.
    pub fn open(self) -> Result<(Address, T), CryptoError> {
        let signer = self.signer()?;
        Ok((signer, self.body))
    }
}
