use crate::error::Error;
use crate::knox::ecc_group::ScalarOps;
use crate::utils::{attr_common_view, get_num_scalar};
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use zeroize::Zeroize;

/// Encode a raw attribute value. 32-bit integers encode to themselves,
/// anything else to the decimal SHA-256 digest of the value
pub fn encode_credential_attribute(raw_value: &str) -> String {
    if let Ok(val) = raw_value.parse::<i32>() {
        val.to_string()
    } else {
        let digest = Sha256::digest(raw_value.as_bytes());
        BigUint::from_bytes_be(&digest).to_str_radix(10)
    }
}

/// Map an encoded value to the message that is signed.
/// Values that fit an `i64` stay integers so they can be range proven
pub fn encoded_to_scalar(encoded: &str) -> AnonCredsResult<Scalar> {
    let digits = encoded.strip_prefix('-').unwrap_or(encoded);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::input(format!(
            "encoded value '{}' is not a decimal number",
            encoded
        )));
    }
    match encoded.parse::<i64>() {
        Ok(n) => Ok(get_num_scalar(n)),
        Err(_) => Ok(Scalar::from_hash(encoded.as_bytes())),
    }
}

/// The raw and encoded forms of one attribute
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Zeroize)]
#[zeroize(drop)]
pub struct AttributeValues {
    /// The value as issued
    pub raw: String,
    /// The decimal encoding that is signed
    pub encoded: String,
}

/// Attribute name to value
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialValues(pub BTreeMap<String, AttributeValues>);

impl CredentialValues {
    /// Lookup an attribute, names compare case insensitively ignoring spaces
    pub fn get(&self, name: &str) -> Option<&AttributeValues> {
        self.0.get(name).or_else(|| {
            let name = attr_common_view(name);
            self.0
                .iter()
                .find(|(k, _)| attr_common_view(k) == name)
                .map(|(_, v)| v)
        })
    }

    /// The number of attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// There are no attributes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build values from parallel name, raw and optional encoded lists
    pub fn from_lists(
        names: &[String],
        raw: &[String],
        encoded: Option<&[String]>,
    ) -> AnonCredsResult<Self> {
        if names.len() != raw.len() {
            return Err(Error::input(
                "attribute names and raw values differ in length",
            ));
        }
        let mut values = MakeCredentialValues::default();
        match encoded {
            Some(encoded) => {
                if encoded.len() != names.len() {
                    return Err(Error::input(
                        "attribute names and encoded values differ in length",
                    ));
                }
                for ((n, r), e) in names.iter().zip(raw).zip(encoded) {
                    values.add_encoded(n, r, e.clone())?;
                }
            }
            None => {
                for (n, r) in names.iter().zip(raw) {
                    values.add_raw(n, r)?;
                }
            }
        }
        Ok(values.into())
    }
}

/// Incrementally collect credential values
#[derive(Debug, Default)]
pub struct MakeCredentialValues(CredentialValues);

impl MakeCredentialValues {
    /// Add a value and encode it
    pub fn add_raw(&mut self, name: impl Into<String>, raw: impl Into<String>) -> AnonCredsResult<()> {
        let raw = raw.into();
        let encoded = encode_credential_attribute(&raw);
        self.add_encoded(name, raw, encoded)
    }

    /// Add a value with a caller supplied encoding
    pub fn add_encoded(
        &mut self,
        name: impl Into<String>,
        raw: impl Into<String>,
        encoded: String,
    ) -> AnonCredsResult<()> {
        let name = name.into();
        encoded_to_scalar(&encoded)?;
        if self.0.get(&name).is_some() {
            return Err(Error::input(format!("duplicate attribute '{}'", name)));
        }
        self.0 .0.insert(
            name,
            AttributeValues {
                raw: raw.into(),
                encoded,
            },
        );
        Ok(())
    }
}

impl From<MakeCredentialValues> for CredentialValues {
    fn from(m: MakeCredentialValues) -> Self {
        m.0
    }
}
