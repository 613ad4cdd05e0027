use crate::identifiers::RevocationRegistryDefinitionId;
use crate::knox::accumulator::vb20::{
    MembershipProof, MembershipProofCommitting, MembershipWitness, ProofParams, PublicKey,
};
use crate::knox::short_group_sig_core::ProofMessage;
use crate::presentation::PresentationBuilder;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};

/// Membership proof parameters are bound to the registry
pub(crate) fn membership_params(
    accum_key: PublicKey,
    rev_reg_id: &RevocationRegistryDefinitionId,
) -> ProofParams {
    ProofParams::new(accum_key, Some(rev_reg_id.as_str().as_bytes()))
}

/// Proves the credential's registry element is in the accumulator
pub(crate) struct RevocationProofBuilder {
    committing: MembershipProofCommitting,
}

impl PresentationBuilder for RevocationProofBuilder {
    type Proof = MembershipProof;

    fn gen_proof(self, challenge: Scalar) -> AnonCredsResult<MembershipProof> {
        Ok(self.committing.gen_proof(challenge))
    }
}

impl RevocationProofBuilder {
    /// `message` must carry the blinder of the revocation message in the signature proof
    pub fn commit(
        message: ProofMessage,
        witness: MembershipWitness,
        accum_key: PublicKey,
        rev_reg_id: &RevocationRegistryDefinitionId,
        rng: impl RngCore + CryptoRng,
        transcript: &mut Transcript,
    ) -> AnonCredsResult<Self> {
        let params = membership_params(accum_key, rev_reg_id);
        let committing = MembershipProofCommitting::new(message, witness, params, accum_key, rng)?;
        params.add_to_transcript(transcript);
        committing.get_bytes_for_challenge(transcript);
        Ok(Self { committing })
    }
}
