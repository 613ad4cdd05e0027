mod commitment;
mod create;
mod present;
mod range;
mod requested_proof;
mod revocation;
mod signature;

pub use commitment::CommitmentProof;
pub use present::*;
pub use range::RangeProof;
pub use requested_proof::*;

pub(crate) use commitment::{add_commitment_contribution, CommitmentBuilder, PedersenGenerators};
pub(crate) use range::{
    add_range_contribution, adjusted_commitments, RangeBuilder, RANGE_BITS, RANGE_TRANSCRIPT,
};
pub(crate) use revocation::{membership_params, RevocationProofBuilder};
pub(crate) use signature::{add_revealed_contribution, SignatureBuilder};

use crate::identifiers::{CredentialDefinitionId, RevocationRegistryDefinitionId, SchemaId};
use crate::knox::accumulator::vb20::MembershipProof;
use crate::knox::ps::PokSignatureProof;
use crate::nonce::Nonce;
use crate::presentation_request::PredicateType;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label of the transcript the presentation challenge is drawn from
pub(crate) const PRESENTATION_TRANSCRIPT: &[u8] = b"anoncreds presentation";

/// Implementers turn their commitments into proofs once the challenge is known
pub(crate) trait PresentationBuilder {
    /// The finished proof
    type Proof;

    /// Finalize the proof
    fn gen_proof(self, challenge: Scalar) -> AnonCredsResult<Self::Proof>;
}

/// A zero-knowledge presentation answering a [`PresentationRequest`](crate::presentation_request::PresentationRequest)
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Presentation {
    /// The request nonce the proof is bound to
    pub nonce: Nonce,
    /// The cryptographic proof
    pub proof: AggregatedProof,
    /// Which sub proof answers which referent
    pub requested_proof: RequestedProof,
    /// The objects each sub proof was made against
    pub identifiers: Vec<Identifier>,
}

/// One proof per credential sharing a single Fiat-Shamir challenge
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AggregatedProof {
    /// The Fiat-Shamir challenge
    pub challenge: Scalar,
    /// The sub proofs in credential order
    pub proofs: Vec<SubProof>,
}

/// The proof for one credential
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SubProof {
    /// Proof of knowledge of the credential signature
    pub signature: PokSignatureProof,
    /// Revealed attribute name to encoded value
    pub revealed_attrs: BTreeMap<String, String>,
    /// Predicate proofs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<PredicateProof>,
    /// Proof the credential is in the registry accumulator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revocation: Option<MembershipProof>,
}

/// Proves a hidden attribute satisfies a predicate
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PredicateProof {
    /// The attribute name
    pub attr_name: String,
    /// The comparison
    pub p_type: PredicateType,
    /// The threshold
    pub p_value: i32,
    /// Commitment to the attribute bound to the signature proof
    pub commitment: CommitmentProof,
    /// Range proof over the committed value
    pub range: RangeProof,
}

/// The ledger objects a sub proof was made against
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identifier {
    /// The credential schema
    pub schema_id: SchemaId,
    /// The credential definition
    pub cred_def_id: CredentialDefinitionId,
    /// The revocation registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<RevocationRegistryDefinitionId>,
    /// The status list timestamp the non-revocation proof uses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}
