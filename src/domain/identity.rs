//! Engine-assigned record identifiers.
//!
//! Every stored entity is keyed by a 12-byte [`Identity`]: a 4-byte
//! big-endian creation timestamp, a 5-byte per-process random value, and a
//! 3-byte counter. The layout makes identifiers globally unique and
//! orderable by creation time, and round-trips losslessly through a
//! 24-character lowercase hex form at the API boundary.

use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of bytes in a generated identifier.
pub const IDENTITY_LEN: usize = 12;

const HEX_LEN: usize = IDENTITY_LEN * 2;

/// Errors returned by [`Identity::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityParseError {
    /// Input was not exactly 24 characters long.
    InvalidLength { len: usize },
    /// Input contained characters outside `[0-9a-fA-F]`.
    InvalidEncoding,
}

impl fmt::Display for IdentityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { len } => {
                write!(f, "identifier must be {HEX_LEN} hex characters, got {len}")
            }
            Self::InvalidEncoding => write!(f, "identifier must be hexadecimal"),
        }
    }
}

impl std::error::Error for IdentityParseError {}

/// Unique, immutable key for a stored record.
///
/// ## Invariants
/// - The byte layout never changes after generation; the textual form is the
///   lowercase hex encoding of the 12 bytes.
/// - The derived total order follows the byte order, so identifiers generated
///   later sort after earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity([u8; IDENTITY_LEN]);

fn process_random() -> &'static [u8; 5] {
    static RANDOM: OnceLock<[u8; 5]> = OnceLock::new();
    RANDOM.get_or_init(|| {
        let mut bytes = [0u8; 5];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    })
}

fn next_counter() -> u32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU32::new(rand::thread_rng().next_u32()));
    counter.fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF
}

impl Identity {
    /// Generate a fresh identifier. Called by the stores on first insert.
    pub fn generate() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or_default();

        let mut bytes = [0u8; IDENTITY_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process_random());
        bytes[9..].copy_from_slice(&next_counter().to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parse the 24-character hex form used at the API boundary.
    pub fn parse(text: &str) -> Result<Self, IdentityParseError> {
        if text.len() != HEX_LEN {
            return Err(IdentityParseError::InvalidLength { len: text.len() });
        }
        let decoded = hex::decode(text).map_err(|_| IdentityParseError::InvalidEncoding)?;
        let mut bytes = [0u8; IDENTITY_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// Build an identifier from raw bytes.
    pub const fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Lowercase hex encoding of the identifier.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Raw byte view of the identifier.
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.to_hex()
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn generated_identifiers_are_unique_and_round_trip() {
        let first = Identity::generate();
        let second = Identity::generate();
        assert_ne!(first, second);
        assert_eq!(Identity::parse(&first.to_hex()).expect("round trip"), first);
    }

    #[test]
    fn later_identifiers_sort_after_earlier_ones() {
        let earlier = Identity::generate();
        let later = Identity::generate();
        assert!(earlier < later);
    }

    #[test]
    fn byte_order_defines_the_total_order() {
        let low = Identity::from_bytes([0u8; IDENTITY_LEN]);
        let high = Identity::from_bytes([0xffu8; IDENTITY_LEN]);
        assert!(low < high);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("00112233445566778899aabbcc")]
    fn parse_rejects_wrong_length(#[case] text: &str) {
        let err = Identity::parse(text).expect_err("length check");
        assert_eq!(err, IdentityParseError::InvalidLength { len: text.len() });
    }

    #[test]
    fn parse_rejects_non_hex_input() {
        let err = Identity::parse("zz112233445566778899aabb").expect_err("encoding check");
        assert_eq!(err, IdentityParseError::InvalidEncoding);
    }

    #[test]
    fn parse_accepts_uppercase_but_emits_lowercase() {
        let id = Identity::parse("00112233445566778899AABB").expect("uppercase accepted");
        assert_eq!(id.to_hex(), "00112233445566778899aabb");
    }

    #[test]
    fn serde_uses_the_hex_form() {
        let id = Identity::generate();
        let encoded = serde_json::to_string(&id).expect("serialize");
        assert_eq!(encoded, format!("\"{id}\""));
        let decoded: Identity = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, id);
    }

    #[test]
    fn serde_rejects_malformed_text() {
        let result: Result<Identity, _> = serde_json::from_str("\"not-hex\"");
        assert!(result.is_err());
    }
}
