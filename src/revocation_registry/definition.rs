use crate::error::Error;
use crate::identifiers::{CredentialDefinitionId, IssuerId};
use crate::knox::accumulator::vb20::{self, Element};
use crate::AnonCredsResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The accumulator scheme of a registry
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum RegistryType {
    /// VB20 positive accumulator over BLS12-381
    VB20_ACCUM,
}

impl FromStr for RegistryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VB20_ACCUM" => Ok(Self::VB20_ACCUM),
            _ => Err(Error::input(format!("unsupported registry type '{}'", s))),
        }
    }
}

/// Derive the accumulator element of a registry index
pub fn registry_element(accum_key: &vb20::PublicKey, index: u32) -> Element {
    let mut data = accum_key.to_bytes().to_vec();
    data.extend_from_slice(&index.to_be_bytes());
    Element::hash(&data)
}

/// The public keys of a registry
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinitionValuePublicKeys {
    /// The accumulator verification key
    pub accum_key: vb20::PublicKey,
}

/// The registry parameters
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinitionValue {
    /// The size of the index space
    pub max_cred_num: u32,
    /// Public keys
    pub public_keys: RevocationRegistryDefinitionValuePublicKeys,
    /// Hex SHA-256 of the tails file
    pub tails_hash: String,
    /// Where the tails file was written
    pub tails_location: String,
}

/// A revocation registry definition
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinition {
    /// The issuer owning the registry
    pub issuer_id: IssuerId,
    /// The accumulator scheme
    pub revoc_def_type: RegistryType,
    /// Distinguishes registries of the same credential definition
    pub tag: String,
    /// The credential definition the registry serves
    pub cred_def_id: CredentialDefinitionId,
    /// Registry parameters
    pub value: RevocationRegistryDefinitionValue,
}

impl RevocationRegistryDefinition {
    /// The size of the index space
    pub fn max_cred_num(&self) -> u32 {
        self.value.max_cred_num
    }

    /// The accumulator element for `index`, `InvalidUserRevocId` when out of range
    pub fn element(&self, index: u32) -> AnonCredsResult<Element> {
        self.check_index(index)?;
        Ok(registry_element(&self.value.public_keys.accum_key, index))
    }

    /// Every element in index order
    pub fn elements(&self) -> Vec<Element> {
        (0..self.value.max_cred_num)
            .map(|i| registry_element(&self.value.public_keys.accum_key, i))
            .collect()
    }

    pub(crate) fn check_index(&self, index: u32) -> AnonCredsResult<()> {
        if index >= self.value.max_cred_num {
            return Err(Error::InvalidUserRevocId(format!(
                "index {} is outside the registry of {}",
                index, self.value.max_cred_num
            )));
        }
        Ok(())
    }
}

/// The registry's accumulator secret
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RevocationRegistryDefinitionPrivate {
    /// VB20 secret key
    pub value: vb20::SecretKey,
}
