pub mod envelope;
pub mod error;
pub mod fingerprint;
pub mod keys;
pub mod signing;

pub use envelope::SignedEnvelope;
pub use error::CryptoError;
pub use fingerprint::{fingerprint_bytes, fingerprint_file, hash, FingerprintAlgorithm};
pub use keys::{address_of, KeyPair, PublicKey};
pub use signing::{sign, verify, Signature};
