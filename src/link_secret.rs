use crate::error::Error;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use elliptic_curve::Field;
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroize;

/// The holder's secret binding all of its credentials together.
/// Serialized as a decimal string
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct LinkSecret(pub(crate) Scalar);

impl LinkSecret {
    /// Create a new random link secret
    pub fn new() -> Self {
        Self(Scalar::random(rand_core::OsRng))
    }

    /// Parse a decimal link secret
    pub fn from_dec(value: &str) -> AnonCredsResult<Self> {
        let n = BigUint::parse_bytes(value.as_bytes(), 10)
            .ok_or_else(|| Error::input("link secret is not a decimal number"))?;
        let bytes = n.to_bytes_be();
        if bytes.len() > 32 {
            return Err(Error::input("link secret is too large"));
        }
        let mut be = [0u8; 32];
        be[32 - bytes.len()..].copy_from_slice(&bytes);
        Option::<Scalar>::from(Scalar::from_be_bytes(&be))
            .map(Self)
            .ok_or_else(|| Error::input("link secret is not a field element"))
    }

    /// The decimal representation
    pub fn to_dec(&self) -> String {
        BigUint::from_bytes_be(&self.0.to_be_bytes()).to_str_radix(10)
    }
}

impl Default for LinkSecret {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LinkSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LinkSecret").field(&"****").finish()
    }
}

impl PartialEq for LinkSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for LinkSecret {}

impl TryFrom<&str> for LinkSecret {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_dec(value)
    }
}

impl Serialize for LinkSecret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_dec())
    }
}

impl<'de> Deserialize<'de> for LinkSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_dec(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_round_trip() {
        let ls = LinkSecret::new();
        let dec = ls.to_dec();
        assert!(dec.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(LinkSecret::from_dec(&dec).unwrap(), ls);

        let json = serde_json::to_string(&ls).unwrap();
        assert_eq!(json, format!("\"{}\"", dec));
        assert_eq!(serde_json::from_str::<LinkSecret>(&json).unwrap(), ls);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(LinkSecret::from_dec("abc").is_err());
        assert!(LinkSecret::from_dec(&"9".repeat(90)).is_err());
        assert_eq!(LinkSecret::from_dec("0").unwrap().0, Scalar::ZERO);
    }

    #[test]
    fn debug_hides_secret() {
        let ls = LinkSecret::from_dec("123456789").unwrap();
        let printed = format!("{:?}", ls);
        assert_eq!(printed, "LinkSecret(\"****\")");
        assert!(!printed.contains("123456789"));
        assert!(!printed.contains(&format!("{:?}", ls.0)));
    }
}
