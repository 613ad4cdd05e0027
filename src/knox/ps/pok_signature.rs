use super::{PublicKey, Signature};
use crate::error::Error;
use crate::knox::short_group_sig_core::*;
use crate::AnonCredsResult;
use blsful::inner_types::*;
use elliptic_curve::Field;
use merlin::Transcript;
use rand_core::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Proof of Knowledge of a Signature that is used by the prover
/// to construct `PokSignatureProof`.
pub struct PokSignature {
    secrets: Vec<Scalar>,
    proof: ProofCommittedBuilder<G2Projective>,
    commitment: G2Projective,
    sigma_1: G1Projective,
    sigma_2: G1Projective,
}

impl PokSignature {
    /// Creates the initial proof data before a Fiat-Shamir calculation.
    /// `messages` holds one entry per signed message
    pub fn commit(
        signature: &Signature,
        public_key: &PublicKey,
        messages: &[ProofMessage],
        mut rng: impl RngCore + CryptoRng,
    ) -> AnonCredsResult<Self> {
        if public_key.y.len() != messages.len() {
            return Err(Error::input(format!(
                "public key signs {} messages, {} given",
                public_key.y.len(),
                messages.len()
            )));
        }

        let r = Scalar::random(&mut rng);
        let t = Scalar::random(&mut rng);

        // Randomize the signature
        let sigma_1 = signature.sigma_1 * r;
        let sigma_2 = (signature.sigma_2 + (signature.sigma_1 * t)) * r;

        // Prove knowledge of t, m_tick and each hidden m_i in
        // J = g_tilde^t * W_tilde^m_tick * Y_tilde_1^m_1 * ...
        let mut proof = ProofCommittedBuilder::new(G2Projective::sum_of_products);
        let mut points = Vec::new();
        let mut secrets = Vec::new();

        proof.commit_random(G2Projective::GENERATOR, &mut rng);
        points.push(G2Projective::GENERATOR);
        secrets.push(t);

        proof.commit_random(public_key.w, &mut rng);
        points.push(public_key.w);
        secrets.push(signature.m_tick);

        for (m, y) in messages.iter().zip(&public_key.y) {
            match m {
                ProofMessage::Hidden(HiddenMessage::ProofSpecificBlinding(msg)) => {
                    proof.commit_random(*y, &mut rng);
                    points.push(*y);
                    secrets.push(*msg);
                }
                ProofMessage::Hidden(HiddenMessage::ExternalBlinding(msg, n)) => {
                    proof.commit(*y, *n);
                    points.push(*y);
                    secrets.push(*msg);
                }
                ProofMessage::Revealed(_) => {}
            }
        }
        let commitment = G2Projective::sum_of_products(&points, &secrets);
        Ok(Self {
            secrets,
            proof,
            commitment,
            sigma_1,
            sigma_2,
        })
    }

    /// Convert the committed values to bytes for the fiat-shamir challenge
    pub fn add_proof_contribution(&self, transcript: &mut Transcript) {
        transcript.append_message(b"sigma_1", &self.sigma_1.to_affine().to_compressed());
        transcript.append_message(b"sigma_2", &self.sigma_2.to_affine().to_compressed());
        transcript.append_message(
            b"random commitment",
            &self.commitment.to_affine().to_compressed(),
        );
        self.proof
            .add_challenge_contribution(b"blind commitment", transcript);
    }

    /// Generate the Schnorr responses for the selective disclosure proofs
    pub fn generate_proof(self, challenge: Scalar) -> AnonCredsResult<PokSignatureProof> {
        let proof = self
            .proof
            .generate_proof(challenge, &self.secrets)
            .ok_or_else(|| Error::unexpected("signature proof length mismatch"))?;
        Ok(PokSignatureProof {
            sigma_1: self.sigma_1,
            sigma_2: self.sigma_2,
            commitment: self.commitment,
            proof,
        })
    }
}

/// The actual proof that is sent from prover to verifier.
///
/// `proof` holds the responses for `t`, `m_tick` and then every
/// hidden message in index order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PokSignatureProof {
    pub(crate) sigma_1: G1Projective,
    pub(crate) sigma_2: G1Projective,
    pub(crate) commitment: G2Projective,
    pub(crate) proof: Vec<Scalar>,
}

impl PokSignatureProof {
    /// Recompute the prover's commitment and add it to the transcript
    pub fn add_challenge_contribution(
        &self,
        public_key: &PublicKey,
        rvl_msgs: &[(usize, Scalar)],
        challenge: Scalar,
        transcript: &mut Transcript,
    ) {
        transcript.append_message(b"sigma_1", &self.sigma_1.to_affine().to_compressed());
        transcript.append_message(b"sigma_2", &self.sigma_2.to_affine().to_compressed());
        transcript.append_message(
            b"random commitment",
            &self.commitment.to_affine().to_compressed(),
        );

        let known = rvl_msgs.iter().map(|(i, _)| *i).collect::<BTreeSet<usize>>();
        let mut points = vec![G2Projective::GENERATOR, public_key.w];
        for (i, y) in public_key.y.iter().enumerate() {
            if !known.contains(&i) {
                points.push(*y);
            }
        }
        points.push(self.commitment);

        let mut scalars = self.proof.clone();
        scalars.push(-challenge);
        // A malformed proof yields a garbage commitment and the challenge check fails
        let len = points.len().min(scalars.len());
        let commitment = G2Projective::sum_of_products(&points[..len], &scalars[..len]);
        transcript.append_message(
            b"blind commitment",
            &commitment.to_affine().to_compressed(),
        );
    }

    /// Check the pairing equation of the randomized signature. The selective
    /// disclosure responses are checked by recomputing the challenge
    pub fn verify(&self, rvl_msgs: &[(usize, Scalar)], public_key: &PublicKey) -> bool {
        if (self.sigma_1.is_identity() | self.sigma_2.is_identity()).unwrap_u8() == 1 {
            return false;
        }
        if public_key.is_invalid().unwrap_u8() == 1u8 {
            return false;
        }
        let hidden = public_key.y.len().saturating_sub(rvl_msgs.len());
        if self.proof.len() != hidden + 2 {
            return false;
        }

        let mut points = Vec::with_capacity(rvl_msgs.len() + 2);
        let mut scalars = Vec::with_capacity(rvl_msgs.len() + 2);
        for (idx, msg) in rvl_msgs {
            match public_key.y.get(*idx) {
                Some(y) => points.push(*y),
                None => return false,
            }
            scalars.push(*msg);
        }
        points.push(public_key.x);
        scalars.push(Scalar::ONE);
        points.push(self.commitment);
        scalars.push(Scalar::ONE);

        let j = G2Projective::sum_of_products(&points, &scalars);

        multi_miller_loop(&[
            (&self.sigma_1.to_affine(), &G2Prepared::from(j.to_affine())),
            (
                &self.sigma_2.to_affine(),
                &G2Prepared::from(-G2Affine::generator()),
            ),
        ])
        .final_exponentiation()
        .is_identity()
        .unwrap_u8()
            == 1
    }

    /// Return the Schnorr responses for all hidden messages keyed by message index
    pub fn get_hidden_message_proofs(
        &self,
        public_key: &PublicKey,
        rvl_msgs: &[(usize, Scalar)],
    ) -> AnonCredsResult<BTreeMap<usize, Scalar>> {
        let known = rvl_msgs.iter().map(|(i, _)| *i).collect::<BTreeSet<usize>>();
        let mut hidden = BTreeMap::new();
        let mut rank = 0;
        for i in 0..public_key.y.len() {
            if known.contains(&i) {
                continue;
            }
            let message = self
                .proof
                .get(rank + 2)
                .ok_or_else(|| Error::rejected("signature proof is missing responses"))?;
            hidden.insert(i, *message);
            rank += 1;
        }
        Ok(hidden)
    }
}
