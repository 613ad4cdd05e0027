use crate::error::Error;
use crate::presentation::{
    add_range_contribution, adjusted_commitments, PedersenGenerators, RangeProof, RANGE_BITS,
    RANGE_TRANSCRIPT,
};
use crate::verifier::ProofVerifier;
use crate::AnonCredsResult;
use blsful::inner_types::{G1Projective, Scalar};
use merlin::Transcript;

pub(crate) struct RangeProofVerifier<'a> {
    pub generators: PedersenGenerators,
    pub proof: &'a RangeProof,
    pub commitment: G1Projective,
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl ProofVerifier for RangeProofVerifier<'_> {
    fn add_challenge_contribution(
        &self,
        _challenge: Scalar,
        transcript: &mut Transcript,
    ) -> AnonCredsResult<()> {
        add_range_contribution(
            self.generators,
            self.commitment,
            self.lower,
            self.upper,
            transcript,
        )
    }

    fn verify(&self, challenge: Scalar) -> AnonCredsResult<()> {
        let pedersen_gen = self.generators.bulletproof_gens();
        let mut transcript = Transcript::new(RANGE_TRANSCRIPT);
        transcript.append_message(b"challenge", &challenge.to_be_bytes());

        match adjusted_commitments(self.generators, self.commitment, self.lower, self.upper) {
            (Some(lower), Some(upper)) => {
                let bulletproof_gens = bulletproofs::BulletproofGens::new(RANGE_BITS, 2);
                self.proof.proof.verify_multiple(
                    &bulletproof_gens,
                    &pedersen_gen,
                    &mut transcript,
                    &[upper, lower],
                    RANGE_BITS,
                )
            }
            (Some(adjusted), None) | (None, Some(adjusted)) => {
                let bulletproof_gens = bulletproofs::BulletproofGens::new(RANGE_BITS, 1);
                self.proof.proof.verify_single(
                    &bulletproof_gens,
                    &pedersen_gen,
                    &mut transcript,
                    &adjusted,
                    RANGE_BITS,
                )
            }
            (None, None) => return Err(Error::rejected("range proof without bounds")),
        }
        .map_err(|_| Error::rejected("invalid range proof"))
    }
}
