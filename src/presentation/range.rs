use crate::error::Error;
use crate::presentation::{CommitmentBuilder, PedersenGenerators, PresentationBuilder};
use crate::utils::{get_num_scalar, zero_center};
use crate::AnonCredsResult;
use blsful::inner_types::{group::Curve, G1Projective, Scalar};
use bulletproofs::RangeProof as RangeProofBulletproof;
use merlin::Transcript;
use serde::{Deserialize, Serialize};

pub(crate) const RANGE_TRANSCRIPT: &[u8] = b"anoncreds range proof";
pub(crate) const RANGE_BITS: usize = 64;

/// Proves a committed value lies within predicate bounds
pub(crate) struct RangeBuilder {
    generators: PedersenGenerators,
    blinder: Scalar,
    adjusted_lower: Option<u64>,
    adjusted_upper: Option<u64>,
}

impl PresentationBuilder for RangeBuilder {
    type Proof = RangeProof;

    fn gen_proof(self, challenge: Scalar) -> AnonCredsResult<RangeProof> {
        let pedersen_gen = self.generators.bulletproof_gens();
        let mut transcript = Transcript::new(RANGE_TRANSCRIPT);
        transcript.append_message(b"challenge", &challenge.to_be_bytes());

        let blinder = self.blinder;
        let proof = match (self.adjusted_upper, self.adjusted_lower) {
            (Some(upper), Some(lower)) => {
                let bulletproof_gens = bulletproofs::BulletproofGens::new(RANGE_BITS, 2);
                RangeProofBulletproof::prove_multiple(
                    &bulletproof_gens,
                    &pedersen_gen,
                    &mut transcript,
                    &[upper, lower],
                    &[blinder, blinder],
                    RANGE_BITS,
                )
                .map(|(proof, _)| proof)
            }
            (Some(value), None) | (None, Some(value)) => {
                let bulletproof_gens = bulletproofs::BulletproofGens::new(RANGE_BITS, 1);
                RangeProofBulletproof::prove_single(
                    &bulletproof_gens,
                    &pedersen_gen,
                    &mut transcript,
                    value,
                    &blinder,
                    RANGE_BITS,
                )
                .map(|(proof, _)| proof)
            }
            (None, None) => return Err(Error::unexpected("range proof without bounds")),
        }
        .map_err(|e| Error::unexpected(format!("range proof failed: {:?}", e)))?;
        Ok(RangeProof { proof })
    }
}

impl RangeBuilder {
    /// Commit to `value - lower` and `value + (MAX - upper)`, both of which
    /// fit 64 bits exactly when `lower <= value <= upper`
    pub fn commit(
        commitment_builder: &CommitmentBuilder,
        value: i64,
        lower: Option<i64>,
        upper: Option<i64>,
        transcript: &mut Transcript,
    ) -> AnonCredsResult<Self> {
        let unsatisfied = || Error::rejected("predicate is not satisfied");
        let adjusted_lower = lower
            .map(|l| zero_center(value).checked_sub(zero_center(l)))
            .map(|a| a.ok_or_else(unsatisfied))
            .transpose()?;
        let adjusted_upper = upper
            .map(|u| zero_center(value).checked_add(u64::MAX - zero_center(u)))
            .map(|a| a.ok_or_else(unsatisfied))
            .transpose()?;

        add_range_contribution(
            commitment_builder.generators,
            commitment_builder.commitment,
            lower,
            upper,
            transcript,
        )?;
        Ok(Self {
            generators: commitment_builder.generators,
            blinder: commitment_builder.b,
            adjusted_lower,
            adjusted_upper,
        })
    }
}

/// The commitments the range proof is checked against, `(lower, upper)`
pub(crate) fn adjusted_commitments(
    generators: PedersenGenerators,
    commitment: G1Projective,
    lower: Option<i64>,
    upper: Option<i64>,
) -> (Option<G1Projective>, Option<G1Projective>) {
    let lower = lower.map(|l| commitment - generators.message * get_num_scalar(l));
    let upper = upper
        .map(|u| commitment + generators.message * Scalar::from(u64::MAX - zero_center(u)));
    (lower, upper)
}

pub(crate) fn add_range_contribution(
    generators: PedersenGenerators,
    commitment: G1Projective,
    lower: Option<i64>,
    upper: Option<i64>,
    transcript: &mut Transcript,
) -> AnonCredsResult<()> {
    transcript.append_message(
        b"used commitment",
        &commitment.to_affine().to_compressed(),
    );
    transcript.append_u64(b"range proof bits", RANGE_BITS as u64);
    // negation zero centers in the positive range
    match adjusted_commitments(generators, commitment, lower, upper) {
        (Some(adjusted_lower), Some(adjusted_upper)) => {
            transcript.append_message(b"range proof version", &[3]);
            transcript.append_message(
                b"adjusted upper commitment",
                &adjusted_upper.to_affine().to_compressed(),
            );
            transcript.append_message(
                b"adjusted lower commitment",
                &adjusted_lower.to_affine().to_compressed(),
            );
        }
        (None, Some(adjusted_upper)) => {
            transcript.append_message(b"range proof version", &[2]);
            transcript.append_message(
                b"adjusted upper commitment",
                &adjusted_upper.to_affine().to_compressed(),
            );
        }
        (Some(adjusted_lower), None) => {
            transcript.append_message(b"range proof version", &[1]);
            transcript.append_message(
                b"adjusted lower commitment",
                &adjusted_lower.to_affine().to_compressed(),
            );
        }
        (None, None) => return Err(Error::input("a range needs at least one bound")),
    }
    Ok(())
}

/// A bulletproofs range proof over a predicate commitment
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RangeProof {
    /// The range proof
    pub proof: RangeProofBulletproof,
}

#[cfg(test)]
mod tests {
    use super::*;
    use blsful::inner_types::ff::Field;
    use rand_core::OsRng;

    fn builder(value: i64) -> CommitmentBuilder {
        let mut transcript = Transcript::new(b"test");
        CommitmentBuilder::commit(
            "age",
            PedersenGenerators::new(),
            get_num_scalar(value),
            Scalar::random(OsRng),
            OsRng,
            &mut transcript,
        )
    }

    #[test]
    fn unsatisfied_bounds_are_refused() {
        let c = builder(17);
        let mut transcript = Transcript::new(b"test");
        let err = RangeBuilder::commit(&c, 17, Some(18), None, &mut transcript)
            .err()
            .unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::ProofRejected);
        assert!(RangeBuilder::commit(&c, 17, None, Some(16), &mut transcript).is_err());
        assert!(RangeBuilder::commit(&c, 17, Some(17), Some(17), &mut transcript).is_ok());
    }

    #[test]
    fn proof_verifies_against_adjusted_commitment() {
        let c = builder(-40);
        let mut transcript = Transcript::new(b"test");
        let range = RangeBuilder::commit(&c, -40, Some(-100), None, &mut transcript).unwrap();
        let challenge = Scalar::from(99u64);
        let proof = range.gen_proof(challenge).unwrap();

        let (lower, _) = adjusted_commitments(c.generators, c.commitment, Some(-100), None);
        let mut transcript = Transcript::new(RANGE_TRANSCRIPT);
        transcript.append_message(b"challenge", &challenge.to_be_bytes());
        assert!(proof
            .proof
            .verify_single(
                &bulletproofs::BulletproofGens::new(RANGE_BITS, 1),
                &c.generators.bulletproof_gens(),
                &mut transcript,
                &lower.unwrap(),
                RANGE_BITS,
            )
            .is_ok());
    }
}
