mod key_correctness;

pub use key_correctness::*;

use crate::error::Error;
use crate::identifiers::{IssuerId, SchemaId};
use crate::knox::ps;
use crate::schema::AttributeNames;
use crate::AnonCredsResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The signature scheme of a credential definition
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum SignatureType {
    /// Pointcheval-Sanders over BLS12-381
    PS,
}

impl FromStr for SignatureType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PS" => Ok(Self::PS),
            _ => Err(Error::input(format!("unsupported signature type '{}'", s))),
        }
    }
}

/// Options for creating a credential definition
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialDefinitionConfig {
    /// Reserve a signed message for a revocation registry element
    pub support_revocation: bool,
}

impl CredentialDefinitionConfig {
    /// Create the config
    pub fn new(support_revocation: bool) -> Self {
        Self { support_revocation }
    }
}

/// The public key material of a credential definition
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialDefinitionData {
    /// Verifies `[link_secret, attributes.., revocation element?]`
    pub primary: ps::PublicKey,
    /// The attribute order the key signs
    pub attr_names: AttributeNames,
    /// The last message is a revocation registry element
    pub revocation: bool,
}

/// A credential definition
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinition {
    /// The schema this definition signs
    pub schema_id: SchemaId,
    /// The signature scheme
    #[serde(rename = "type")]
    pub signature_type: SignatureType,
    /// Distinguishes definitions of the same schema
    pub tag: String,
    /// The public key material
    pub value: CredentialDefinitionData,
    /// The issuer owning the definition
    pub issuer_id: IssuerId,
}

impl CredentialDefinition {
    /// Index of the link secret message
    pub const LINK_SECRET_INDEX: usize = 0;

    /// Does this definition support revocation
    pub fn supports_revocation(&self) -> bool {
        self.value.revocation
    }

    /// The signature index of an attribute
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.value.attr_names.index_of(name).map(|i| i + 1)
    }

    /// The signature index of the revocation element
    pub fn revocation_index(&self) -> Option<usize> {
        if self.value.revocation {
            Some(self.value.attr_names.len() + 1)
        } else {
            None
        }
    }

    /// The number of signed messages
    pub fn message_count(&self) -> usize {
        self.value.attr_names.len() + 1 + usize::from(self.value.revocation)
    }

    /// Check the key matches the declared attributes
    pub fn validate(&self) -> AnonCredsResult<()> {
        if self.value.primary.message_count() != self.message_count() {
            return Err(Error::input(
                "credential definition key does not match its attributes",
            ));
        }
        if self.value.primary.is_invalid().unwrap_u8() == 1 {
            return Err(Error::input("invalid credential definition key"));
        }
        Ok(())
    }
}

/// The issuer's signing key
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CredentialDefinitionPrivate {
    /// The PS secret key
    pub value: ps::SecretKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::Issuer;
    use crate::schema::Schema;

    #[test]
    fn message_layout() {
        let issuer_id = IssuerId::new("did:example:issuer").unwrap();
        let schema = Schema::new(issuer_id.clone(), "gvt", "1.0", ["name", "age"]).unwrap();
        let schema_id = SchemaId::new("schema:gvt").unwrap();
        let (cred_def, _, proof) = Issuer::create_credential_definition(
            schema_id,
            &schema,
            issuer_id,
            "default",
            SignatureType::PS,
            CredentialDefinitionConfig::new(true),
        )
        .unwrap();
        assert_eq!(cred_def.message_count(), 4);
        assert_eq!(cred_def.attribute_index("age"), Some(2));
        assert_eq!(cred_def.revocation_index(), Some(3));
        proof.verify(&cred_def.value.primary).unwrap();

        let json = serde_json::to_string(&cred_def).unwrap();
        assert!(json.contains("\"type\":\"PS\""));
        let back: CredentialDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cred_def);
        back.validate().unwrap();
    }

    #[test]
    fn signature_type_from_str() {
        assert_eq!("PS".parse::<SignatureType>().unwrap(), SignatureType::PS);
        assert!("CL".parse::<SignatureType>().is_err());
    }
}
