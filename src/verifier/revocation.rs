use crate::error::Error;
use crate::identifiers::RevocationRegistryDefinitionId;
use crate::knox::accumulator::vb20::{Accumulator, MembershipProof, ProofParams, PublicKey};
use crate::presentation::membership_params;
use crate::verifier::ProofVerifier;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;

pub(crate) struct RevocationVerifier<'a> {
    proof: &'a MembershipProof,
    params: ProofParams,
    accum_key: PublicKey,
    accumulator: Accumulator,
    /// The signature proof response for the revocation message
    element_proof: Scalar,
}

impl<'a> RevocationVerifier<'a> {
    pub fn new(
        proof: &'a MembershipProof,
        accum_key: PublicKey,
        rev_reg_id: &RevocationRegistryDefinitionId,
        accumulator: Accumulator,
        element_proof: Scalar,
    ) -> Self {
        Self {
            proof,
            params: membership_params(accum_key, rev_reg_id),
            accum_key,
            accumulator,
            element_proof,
        }
    }
}

impl ProofVerifier for RevocationVerifier<'_> {
    fn add_challenge_contribution(
        &self,
        challenge: Scalar,
        transcript: &mut Transcript,
    ) -> AnonCredsResult<()> {
        self.params.add_to_transcript(transcript);
        self.proof
            .finalize(self.accumulator, self.params, self.accum_key, challenge)
            .get_bytes_for_challenge(transcript);
        Ok(())
    }

    fn verify(&self, _challenge: Scalar) -> AnonCredsResult<()> {
        if self.proof.element_proof() == self.element_proof {
            Ok(())
        } else {
            Err(Error::rejected(
                "membership proof is not bound to the credential signature",
            ))
        }
    }
}
