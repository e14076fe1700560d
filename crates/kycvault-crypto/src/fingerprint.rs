//! Document fingerprinting.
//!
//! Fingerprints are computed client-side over the raw document bytes. Only
//! the 32-byte digest is ever submitted to the registry.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use kycvault_core::Fingerprint;

use crate::error::CryptoError;

/// Read buffer size used when streaming files.
const CHUNK_SIZE: usize = 64 * 1024;

/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Digest used to fingerprint documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    /// Keccak-256, as used by EVM wallets and ledger clients.
    #[default]
    Keccak256,
    /// BLAKE3.
    Blake3,
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keccak256 => write!(f, "keccak256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

impl FromStr for FingerprintAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keccak256" | "keccak" => Ok(Self::Keccak256),
            "blake3" => Ok(Self::Blake3),
            other => Err(CryptoError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Incremental hasher over either algorithm.
enum DocumentHasher {
    Keccak(Keccak256),
    Blake3(Box<blake3::Hasher>),
}

impl DocumentHasher {
    fn new(algorithm: FingerprintAlgorithm) -> Self {
        match algorithm {
            FingerprintAlgorithm::Keccak256 => Self::Keccak(Keccak256::new()),
            FingerprintAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Keccak(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Fingerprint {
        let bytes: [u8; 32] = match self {
            Self::Keccak(h) => h.finalize().into(),
            Self::Blake3(h) => *h.finalize().as_bytes(),
        };
        Fingerprint::from_bytes(bytes)
    }
}

/// Fingerprint an in-memory document.
pub fn fingerprint_bytes(algorithm: FingerprintAlgorithm, document: &[u8]) -> Fingerprint {
    let mut hasher = DocumentHasher::new(algorithm);
    hasher.update(document);
    hasher.finalize()
}

/// Fingerprint a document on disk, streaming it in chunks.
pub fn fingerprint_file(
    algorithm: FingerprintAlgorithm,
    path: &Path,
) -> Result<Fingerprint, CryptoError> {
    let mut file = File::open(path)?;
    let mut hasher = DocumentHasher::new(algorithm);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    let fingerprint = hasher.finalize();
    tracing::debug!(
        path = %path.display(),
        bytes = total,
        %algorithm,
        %fingerprint,
        "document fingerprinted"
    );
    Ok(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash(b"kyc document"), hash(b"kyc document"));
        assert_ne!(hash(b"data A"), hash(b"data B"));
    }

    #[test]
    fn test_keccak_empty_known_vector() {
        let fp = fingerprint_bytes(FingerprintAlgorithm::Keccak256, b"");
        assert_eq!(
            fp.to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_blake3_empty_known_vector() {
        let fp = fingerprint_bytes(FingerprintAlgorithm::Blake3, b"");
        assert_eq!(
            fp.to_hex(),
            "0xaf1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_single_byte_change_changes_fingerprint() {
        for algorithm in [FingerprintAlgorithm::Keccak256, FingerprintAlgorithm::Blake3] {
            let a = fingerprint_bytes(algorithm, b"passport scan v1");
            let b = fingerprint_bytes(algorithm, b"passport scan v2");
            assert_ne!(a, b);
            assert!(!a.is_zero());
        }
    }

    #[test]
    fn test_algorithms_differ() {
        let a = fingerprint_bytes(FingerprintAlgorithm::Keccak256, b"doc");
        let b = fingerprint_bytes(FingerprintAlgorithm::Blake3, b"doc");
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_matches_bytes() {
        let path = std::env::temp_dir().join(format!("kycvault-fp-{}", rand::random::<u64>()));
        // Larger than one chunk to exercise streaming.
        let document: Vec<u8> = (0..(CHUNK_SIZE * 2 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &document).unwrap();

        for algorithm in [FingerprintAlgorithm::Keccak256, FingerprintAlgorithm::Blake3] {
            let from_file = fingerprint_file(algorithm, &path).unwrap();
            assert_eq!(from_file, fingerprint_bytes(algorithm, &document));
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_file_missing() {
        let result = fingerprint_file(
            FingerprintAlgorithm::Blake3,
            Path::new("/nonexistent/kycvault/document.pdf"),
        );
        assert!(matches!(result, Err(CryptoError::Io(_))));
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!(
            "keccak256".parse::<FingerprintAlgorithm>().unwrap(),
            FingerprintAlgorithm::Keccak256
        );
        assert_eq!(
            "BLAKE3".parse::<FingerprintAlgorithm>().unwrap(),
            FingerprintAlgorithm::Blake3
        );
        assert!("md5".parse::<FingerprintAlgorithm>().is_err());
        assert_eq!(FingerprintAlgorithm::default().to_string(), "keccak256");
    }
}
