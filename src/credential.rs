mod offer;
mod request;
mod values;

pub use offer::*;
pub use request::*;
pub use values::*;

use crate::cred_def::CredentialDefinition;
use crate::error::Error;
use crate::identifiers::{CredentialDefinitionId, RevocationRegistryDefinitionId, SchemaId};
use crate::knox::accumulator::vb20::{self, Accumulator, Element, MembershipWitness};
use crate::knox::ps::{BlindSignature, Signature};
use crate::revocation_registry::registry_element;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use serde::{Deserialize, Serialize};

/// The credential signature, blinded until the holder processes it
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSignature {
    /// As returned by the issuer
    Blinded(BlindSignature),
    /// After the holder removed its blinding factor
    Unblinded(Signature),
}

/// Binds a credential to an index of a revocation registry
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialRevocationInfo {
    /// The registry index
    pub rev_reg_index: u32,
    /// The registry accumulator key the index element derives from
    pub accum_key: vb20::PublicKey,
    /// The accumulator the witness was issued against
    pub accumulator: Accumulator,
    /// The membership witness at issuance
    pub witness: MembershipWitness,
}

impl CredentialRevocationInfo {
    /// The accumulator element signed into the credential
    pub fn element(&self) -> Element {
        registry_element(&self.accum_key, self.rev_reg_index)
    }
}

/// A credential
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credential {
    /// The schema of the credential
    pub schema_id: SchemaId,
    /// The credential definition that signed it
    pub cred_def_id: CredentialDefinitionId,
    /// The revocation registry, if revocable
    pub rev_reg_id: Option<RevocationRegistryDefinitionId>,
    /// The signed attribute values
    pub values: CredentialValues,
    /// The signature over link secret, attributes and revocation element
    pub signature: CredentialSignature,
    /// Revocation data, present iff `rev_reg_id` is
    pub rev_reg: Option<CredentialRevocationInfo>,
}

impl Credential {
    /// The tags a presentation request restriction may filter on
    pub const QUALIFIABLE_TAGS: [&'static str; 5] = [
        "issuer_id",
        "cred_def_id",
        "schema_id",
        "schema_issuer_id",
        "rev_reg_id",
    ];

    /// Check the credential is internally consistent
    pub fn validate(&self) -> AnonCredsResult<()> {
        if self.values.is_empty() {
            return Err(Error::input("credential values are empty"));
        }
        if self.rev_reg_id.is_some() != self.rev_reg.is_some() {
            return Err(Error::input(
                "revocable credentials require both a registry id and revocation data",
            ));
        }
        Ok(())
    }

    /// The processed signature, `Input` when the holder has not processed it yet
    pub fn unblinded_signature(&self) -> AnonCredsResult<&Signature> {
        match &self.signature {
            CredentialSignature::Unblinded(s) => Ok(s),
            CredentialSignature::Blinded(_) => Err(Error::input("credential has not been processed")),
        }
    }

    /// The revocation registry index, if any
    pub fn rev_reg_index(&self) -> Option<u32> {
        self.rev_reg.map(|r| r.rev_reg_index)
    }

    /// The message vector this credential signs
    pub(crate) fn messages(
        &self,
        cred_def: &CredentialDefinition,
        link_secret: Scalar,
    ) -> AnonCredsResult<Vec<Scalar>> {
        let element = self.rev_reg.map(|r| r.element());
        signed_messages(&self.values, cred_def, link_secret, element)
    }
}

/// Order `values` by the credential definition: `[link_secret, attributes.., revocation?]`.
/// A credential without a registry under a revocable definition signs zero
pub(crate) fn signed_messages(
    values: &CredentialValues,
    cred_def: &CredentialDefinition,
    link_secret: Scalar,
    rev_element: Option<Element>,
) -> AnonCredsResult<Vec<Scalar>> {
    let attr_names = &cred_def.value.attr_names;
    if values.len() != attr_names.len() {
        return Err(Error::input(format!(
            "expected {} attribute values, found {}",
            attr_names.len(),
            values.len()
        )));
    }
    let mut messages = Vec::with_capacity(cred_def.message_count());
    messages.push(link_secret);
    for name in attr_names.iter() {
        let value = values
            .get(name)
            .ok_or_else(|| Error::input(format!("missing value for attribute '{}'", name)))?;
        messages.push(encoded_to_scalar(&value.encoded)?);
    }
    match (cred_def.supports_revocation(), rev_element) {
        (true, Some(e)) => messages.push(e.0),
        (true, None) => messages.push(Scalar::ZERO),
        (false, None) => {}
        (false, Some(_)) => {
            return Err(Error::input(
                "credential definition does not support revocation",
            ))
        }
    }
    Ok(messages)
}
