use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps every requested referent to the sub proof answering it
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestedProof {
    /// Revealed single attributes
    #[serde(default)]
    pub revealed_attrs: BTreeMap<String, RevealedAttributeInfo>,
    /// Revealed attribute groups
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub revealed_attr_groups: BTreeMap<String, RevealedAttributeGroupInfo>,
    /// Values the holder attests without a credential
    #[serde(default)]
    pub self_attested_attrs: BTreeMap<String, String>,
    /// Attributes proven known but not revealed
    #[serde(default)]
    pub unrevealed_attrs: BTreeMap<String, SubProofReferent>,
    /// Predicates
    #[serde(default)]
    pub predicates: BTreeMap<String, SubProofReferent>,
}

impl RequestedProof {
    /// The sub proof answering an attribute referent, if any
    pub fn attribute_sub_proof(&self, referent: &str) -> Option<u32> {
        self.revealed_attrs
            .get(referent)
            .map(|a| a.sub_proof_index)
            .or_else(|| {
                self.revealed_attr_groups
                    .get(referent)
                    .map(|g| g.sub_proof_index)
            })
            .or_else(|| {
                self.unrevealed_attrs
                    .get(referent)
                    .map(|u| u.sub_proof_index)
            })
    }
}

/// A revealed attribute
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RevealedAttributeInfo {
    /// The sub proof revealing it
    pub sub_proof_index: u32,
    /// The raw value
    pub raw: String,
    /// The encoded value that was signed
    pub encoded: String,
}

/// A revealed attribute group
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RevealedAttributeGroupInfo {
    /// The sub proof revealing it
    pub sub_proof_index: u32,
    /// Attribute name to value
    pub values: BTreeMap<String, AttributeValue>,
}

/// A revealed value within a group
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttributeValue {
    /// The raw value
    pub raw: String,
    /// The encoded value that was signed
    pub encoded: String,
}

/// Points at a sub proof
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubProofReferent {
    /// The sub proof index
    pub sub_proof_index: u32,
}
