use crate::cred_def::KeyCorrectnessProof;
use crate::identifiers::{CredentialDefinitionId, SchemaId};
use crate::nonce::Nonce;
use serde::{Deserialize, Serialize};

/// An issuer's offer to issue a credential
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialOffer {
    /// The schema of the offered credential
    pub schema_id: SchemaId,
    /// The credential definition that will sign it
    pub cred_def_id: CredentialDefinitionId,
    /// Proof the credential definition key is well formed
    pub key_correctness_proof: KeyCorrectnessProof,
    /// Fresh single use nonce the request must be bound to
    pub nonce: Nonce,
    /// Optional DID method hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
}
