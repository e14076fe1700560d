use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Length of a document fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// Decode an optionally `0x`-prefixed hex string into a fixed-size array.
fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], String> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.len() != N * 2 {
        return Err(format!(
            "expected {} hex characters, got {}",
            N * 2,
            digits.len()
        ));
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out).map_err(|e| format!("invalid hex: {}", e))?;
    Ok(out)
}

/// A 20-byte account identity on the registry.
///
/// The all-zero address is the "absent" sentinel: it marks a holder with no
/// record and is never a well-formed caller, holder or verifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The zero address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Create an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an address from a byte slice of exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            CoreError::InvalidAddress(format!(
                "address must be {} bytes, got {}",
                ADDRESS_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Encode as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Short display form, e.g. `0x1234...abcd`.
    pub fn short(&self) -> String {
        let full = self.to_hex();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<ADDRESS_LEN>(s.trim())
            .map(Self)
            .map_err(|e| CoreError::InvalidAddress(format!("{}: {}", s, e)))
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_hex()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

/// A 32-byte content fingerprint of a document.
///
/// Only the fingerprint is ever stored; raw documents never reach the registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// The zero fingerprint, returned for holders without a record.
    pub const ZERO: Fingerprint = Fingerprint([0u8; FINGERPRINT_LEN]);

    /// Create a fingerprint from raw digest bytes.
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Whether this is the zero fingerprint.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; FINGERPRINT_LEN]
    }

    /// Encode as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Fingerprint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<FINGERPRINT_LEN>(s.trim())
            .map(Self)
            .map_err(|e| CoreError::InvalidFingerprint(format!("{}: {}", s, e)))
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.to_hex()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

/// The authenticated identity on whose behalf an operation runs.
///
/// Registry operations never read an ambient "current sender"; the caller is
/// always passed in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Caller(Address);

impl Caller {
    /// Wrap an authenticated address. The zero address cannot act as a caller.
    pub fn new(address: Address) -> Result<Self, CoreError> {
        if address.is_zero() {
            return Err(CoreError::InvalidAddress(
                "the zero address cannot act as a caller".into(),
            ));
        }
        Ok(Self(address))
    }

    /// The caller's address.
    pub fn address(&self) -> Address {
        self.0
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The credential record stored for one holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Address that created or last reissued the record; zero means "no record".
    pub issuer: Address,
    /// Fingerprint of the attested document.
    pub document_fingerprint: Fingerprint,
    /// Seconds since the Unix epoch at issuance.
    pub issued_at: u64,
    /// True after issuance, false after revocation.
    pub valid: bool,
}

impl CredentialRecord {
    /// Whether this record has ever been issued.
    pub fn exists(&self) -> bool {
        !self.issuer.is_zero()
    }

    /// The public `(issuer, issued_at, valid)` view of this record.
    pub fn view(&self) -> RecordView {
        RecordView {
            issuer: self.issuer,
            issued_at: self.issued_at,
            valid: self.valid,
        }
    }
}

/// The `(issuer, issued_at, valid)` triple returned by record lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordView {
    pub issuer: Address,
    pub issued_at: u64,
    pub valid: bool,
}
