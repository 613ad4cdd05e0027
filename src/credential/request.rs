use crate::error::Error;
use crate::identifiers::CredentialDefinitionId;
use crate::knox::ps::BlindSignatureContext;
use crate::nonce::Nonce;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The holder's request for a credential. The link secret is hidden in
/// `blinded_ms` together with a proof of knowledge bound to the offer nonce
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CredentialRequest {
    /// Random entropy identifying the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy: Option<String>,
    /// Legacy prover identifier used instead of entropy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prover_did: Option<String>,
    /// The credential definition being requested
    pub cred_def_id: CredentialDefinitionId,
    /// The blinded link secret commitment and its proof
    pub blinded_ms: BlindSignatureContext,
    /// The offer nonce this request answers
    pub nonce: Nonce,
}

impl CredentialRequest {
    /// Exactly one of `entropy` and `prover_did` must be present
    pub fn validate(&self) -> AnonCredsResult<()> {
        match (&self.entropy, &self.prover_did) {
            (Some(_), Some(_)) => Err(Error::input(
                "entropy and prover_did are mutually exclusive",
            )),
            (None, None) => Err(Error::input("one of entropy or prover_did is required")),
            (Some(e), None) | (None, Some(e)) if e.is_empty() => {
                Err(Error::input("request identity must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Data the holder keeps to process the issued credential
#[derive(Clone, Deserialize, Serialize)]
pub struct CredentialRequestMetadata {
    /// Blinding factor removed from the issued signature
    pub link_secret_blinding_data: Scalar,
    /// The offer nonce
    pub nonce: Nonce,
    /// The name of the link secret used
    pub link_secret_name: String,
}

impl fmt::Debug for CredentialRequestMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRequestMetadata")
            .field("link_secret_blinding_data", &"<hidden>")
            .field("nonce", &self.nonce)
            .field("link_secret_name", &self.link_secret_name)
            .finish()
    }
}
