use crate::error::Error;
use crate::presentation::{add_commitment_contribution, CommitmentProof, PedersenGenerators};
use crate::verifier::ProofVerifier;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;

pub(crate) struct CommitmentVerifier<'a> {
    pub attr_name: &'a str,
    pub generators: PedersenGenerators,
    pub proof: &'a CommitmentProof,
    /// The signature proof response for the committed message
    pub message_proof: Scalar,
}

impl ProofVerifier for CommitmentVerifier<'_> {
    fn add_challenge_contribution(
        &self,
        challenge: Scalar,
        transcript: &mut Transcript,
    ) -> AnonCredsResult<()> {
        let blind_commitment = self.proof.commitment * -challenge
            + self.generators.message * self.message_proof
            + self.generators.blinder * self.proof.blinder_proof;
        add_commitment_contribution(
            self.attr_name,
            self.proof.commitment,
            blind_commitment,
            transcript,
        );
        Ok(())
    }

    fn verify(&self, _challenge: Scalar) -> AnonCredsResult<()> {
        if self.proof.message_proof == self.message_proof {
            Ok(())
        } else {
            Err(Error::rejected(format!(
                "commitment to '{}' is not bound to the signature proof",
                self.attr_name
            )))
        }
    }
}
