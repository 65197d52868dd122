//! Domain types for the vault with strong typing.
//!
//! Newtypes keep user ids and bearer tokens from being mixed up with plain
//! integers and strings as they travel from the gate to the stores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a registered user.
///
/// # Examples
///
/// ```rust
/// use pam::domain::UserId;
///
/// let id = UserId::new(7);
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserId(i32);

impl UserId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Opaque bearer credential handed out on register/login.
///
/// `Debug` never prints the value so tokens don't end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh token: 32 random bytes, hex encoded.
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;

        let mut rng = rand::rng();
        let bytes: [u8; 32] = rng.random();

        let value = bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        });

        Self(value)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Kind of a stored blob, carried on the wire as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Text,
    Binary,
    Credential,
}

impl DataKind {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Text => 0,
            Self::Binary => 1,
            Self::Credential => 2,
        }
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Text),
            1 => Some(Self::Binary),
            2 => Some(Self::Credential),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Credential => "credential",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for DataKind {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

impl Serialize for DataKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for DataKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = i32::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown data kind: {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_kind_codes_are_stable() {
        for kind in [DataKind::Text, DataKind::Binary, DataKind::Credential] {
            assert_eq!(DataKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(DataKind::Text.code(), 0);
        assert_eq!(DataKind::from_code(42), None);
        assert_eq!(DataKind::try_from(-1), Err(-1));
    }

    #[test]
    fn data_kind_rejects_unknown_code_on_deserialize() {
        let parsed: Result<DataKind, _> = serde_json::from_str("7");
        assert!(parsed.is_err());

        let parsed: DataKind = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, DataKind::Binary);
    }

    #[test]
    fn generated_tokens_are_long_and_distinct() {
        let a = AuthToken::generate();
        let b = AuthToken::generate();
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = AuthToken::new("secret-value");
        assert_eq!(format!("{token:?}"), "AuthToken(***)");
    }
}
