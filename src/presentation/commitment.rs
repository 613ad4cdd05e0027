use crate::knox::Knox;
use crate::presentation::PresentationBuilder;
use crate::AnonCredsResult;
use blsful::inner_types::{ff::Field, group::Curve, G1Projective, Scalar};
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

const GENERATOR_DST: &[u8] = b"ANONCREDS_PEDERSEN_BLS12381G1_XOF:SHAKE-256_SSWU_RO_";

/// The Pedersen generators predicate commitments and range proofs share
#[derive(Copy, Clone, Debug)]
pub(crate) struct PedersenGenerators {
    pub message: G1Projective,
    pub blinder: G1Projective,
}

impl PedersenGenerators {
    pub fn new() -> Self {
        Self {
            message: Knox::hash_to_g1(b"predicate message generator", GENERATOR_DST),
            blinder: Knox::hash_to_g1(b"predicate blinder generator", GENERATOR_DST),
        }
    }

    pub fn bulletproof_gens(&self) -> bulletproofs::PedersenGens {
        bulletproofs::PedersenGens {
            B: self.message,
            B_blinding: self.blinder,
        }
    }
}

/// Commits to a hidden message with the blinder it uses in the signature proof
pub(crate) struct CommitmentBuilder {
    pub generators: PedersenGenerators,
    pub commitment: G1Projective,
    pub message: Scalar,
    pub b: Scalar,
    r: Scalar,
}

impl PresentationBuilder for CommitmentBuilder {
    type Proof = CommitmentProof;

    fn gen_proof(self, challenge: Scalar) -> AnonCredsResult<CommitmentProof> {
        let message_proof = self.b + challenge * self.message;
        let blinder_proof = self.r + challenge * self.b;
        Ok(CommitmentProof {
            commitment: self.commitment,
            message_proof,
            blinder_proof,
        })
    }
}

impl CommitmentBuilder {
    pub fn commit(
        attr_name: &str,
        generators: PedersenGenerators,
        message: Scalar,
        b: Scalar,
        mut rng: impl RngCore + CryptoRng,
        transcript: &mut Transcript,
    ) -> Self {
        let r = Scalar::random(&mut rng);

        let commitment = generators.message * message + generators.blinder * b;
        let blind_commitment = generators.message * b + generators.blinder * r;

        add_commitment_contribution(attr_name, commitment, blind_commitment, transcript);
        Self {
            generators,
            commitment,
            message,
            b,
            r,
        }
    }
}

pub(crate) fn add_commitment_contribution(
    attr_name: &str,
    commitment: G1Projective,
    blind_commitment: G1Projective,
    transcript: &mut Transcript,
) {
    transcript.append_message(b"predicate attribute", attr_name.as_bytes());
    transcript.append_message(
        b"commitment",
        commitment.to_affine().to_compressed().as_slice(),
    );
    transcript.append_message(
        b"blind commitment",
        blind_commitment.to_affine().to_compressed().as_slice(),
    );
}

/// A Pedersen commitment to a hidden attribute with its Schnorr responses
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommitmentProof {
    /// The commitment
    pub commitment: G1Projective,
    /// The schnorr message proof, equal to the signature proof response
    pub message_proof: Scalar,
    /// The schnorr blinder proof
    pub blinder_proof: Scalar,
}
