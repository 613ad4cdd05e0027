use crate::error::Error;
use crate::knox::ecc_group::ScalarOps;
use crate::utils::random_decimal;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::fmt::{self, Formatter};
use std::hash::{Hash, Hasher};

lazy_static! {
    static ref NONCE_REGEX: Regex = Regex::new("^[0-9]+$").expect("valid nonce regex");
}

/// The bit length of generated nonces
pub const NONCE_BITS: u32 = 80;

/// A single use random number written in decimal.
/// The scalar used in proofs is derived by hashing the decimal string
#[derive(Clone)]
pub struct Nonce {
    strval: String,
    scalar: Scalar,
}

impl Nonce {
    /// Generate a fresh nonce
    pub fn new() -> Self {
        let strval = random_decimal(NONCE_BITS, rand::thread_rng());
        let scalar = Scalar::from_hash(strval.as_bytes());
        Self { strval, scalar }
    }

    /// Parse a decimal nonce
    pub fn from_dec<S: Into<String>>(value: S) -> AnonCredsResult<Self> {
        let strval = value.into();
        if !NONCE_REGEX.is_match(&strval) {
            return Err(Error::input(format!("invalid nonce '{}'", strval)));
        }
        let scalar = Scalar::from_hash(strval.as_bytes());
        Ok(Self { strval, scalar })
    }

    /// The nonce as a field element
    pub fn as_scalar(&self) -> Scalar {
        self.scalar
    }

    /// The nonce in decimal
    pub fn as_str(&self) -> &str {
        &self.strval
    }
}

impl Default for Nonce {
    fn default() -> Self {
        Self::new()
    }
}

impl Hash for Nonce {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.strval.hash(state);
    }
}

impl PartialEq for Nonce {
    fn eq(&self, other: &Nonce) -> bool {
        self.strval == other.strval
    }
}

impl Eq for Nonce {}

impl TryFrom<&str> for Nonce {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_dec(value)
    }
}

impl TryFrom<u64> for Nonce {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_dec(value.to_string())
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Nonce").field(&self.strval).finish()
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.strval.fmt(f)
    }
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.strval)
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NonceVisitor;

        impl<'de> Visitor<'de> for NonceVisitor {
            type Value = Nonce;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a decimal nonce")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Nonce, E> {
                Nonce::try_from(value).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Nonce, E> {
                Nonce::from_dec(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(NonceVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_nonces_are_decimal() {
        let a = Nonce::new();
        let b = Nonce::new();
        assert_ne!(a, b);
        assert!(NONCE_REGEX.is_match(a.as_str()));
        assert_eq!(Nonce::from_dec(a.as_str()).unwrap().as_scalar(), a.as_scalar());
    }

    #[test]
    fn parse_nonces() {
        assert!(Nonce::from_dec("").is_err());
        assert!(Nonce::from_dec("12a").is_err());
        assert!(Nonce::from_dec("-1").is_err());
        let n: Nonce = serde_json::from_str("\"1234567890\"").unwrap();
        assert_eq!(n.to_string(), "1234567890");
        let m: Nonce = serde_json::from_str("1234567890").unwrap();
        assert_eq!(n, m);
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"1234567890\"");
    }
}
