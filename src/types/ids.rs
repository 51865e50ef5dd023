//! Fixed-size identifiers for users, pages and posts.
//! Uses base62 encoding [0-9a-zA-Z] so an id is its own human-readable string
//! while keeping a fixed `Copy` layout that is cheap to hash and compare.

use std::fmt;
use std::str::FromStr;
use rand::{rng, Rng};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Length of every id in characters
pub const ID16_LENGTH: usize = 16;

/// Alphabet used for id generation and validation
pub const BASE62_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Fixed-size 16-character base62 identifier.
///
/// Memory Layout:
/// - [u8; 16] - Fixed array of ASCII bytes, all drawn from [`BASE62_CHARS`]
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ID16([u8; ID16_LENGTH]);

/// Identifies a user
pub type UserId = ID16;
/// Identifies a userpage document
pub type PageId = ID16;
/// Identifies a stored post
pub type PostId = ID16;

impl ID16 {
    /// Generate a random 16-character base62 ID
    pub fn random() -> Self {
        let mut rng = rng();
        let mut bytes = [0u8; ID16_LENGTH];

        for byte in bytes.iter_mut() {
            *byte = BASE62_CHARS[rng.random_range(0..BASE62_CHARS.len())];
        }

        ID16(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; ID16_LENGTH] {
        &self.0
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &str {
        // Construction only admits ASCII alphanumerics
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for ID16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ID16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID16({})", self.as_str())
    }
}

impl FromStr for ID16 {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID16_LENGTH {
            return Err("id must be exactly 16 characters");
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err("id must be base62 [0-9a-zA-Z]");
        }

        let mut bytes = [0u8; ID16_LENGTH];
        bytes.copy_from_slice(s.as_bytes());
        Ok(ID16(bytes))
    }
}

impl Serialize for ID16 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ID16 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ID16::from_str(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_are_valid_base62() {
        let id = ID16::random();
        assert_eq!(id.as_str().len(), ID16_LENGTH);
        assert_eq!(ID16::from_str(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_rejects_wrong_length_and_alphabet() {
        assert!(ID16::from_str("short").is_err());
        assert!(ID16::from_str("abcdefgh-jklmnop").is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ID16::from_str("abcDEF0123456789").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abcDEF0123456789\"");
        let back: ID16 = serde_json::from_str("\"abcDEF0123456789\"").unwrap();
        assert_eq!(back, id);
    }
}
