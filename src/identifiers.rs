use crate::error::Error;
use crate::AnonCredsResult;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Display, Formatter};

macro_rules! impl_anoncreds_id {
    ($name:ident, $label:expr) => {
        #[doc = concat!("An opaque non-empty ", $label, " identifier")]
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, empty strings are rejected
            pub fn new<S: Into<String>>(id: S) -> AnonCredsResult<Self> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(Error::input(concat!("empty ", $label, " identifier")));
                }
                Ok(Self(id))
            }

            /// The identifier as a string slice
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_anoncreds_id!(SchemaId, "schema");
impl_anoncreds_id!(IssuerId, "issuer");
impl_anoncreds_id!(CredentialDefinitionId, "credential definition");
impl_anoncreds_id!(RevocationRegistryDefinitionId, "revocation registry definition");
