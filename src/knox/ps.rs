mod blind_signature;
mod pok_signature;
mod public_key;
mod secret_key;
mod signature;

pub use blind_signature::*;
pub use pok_signature::*;
pub use public_key::*;
pub use secret_key::*;
pub use signature::*;

use crate::error::Error;
use crate::AnonCredsResult;
use blsful::inner_types::{ff::Field, G1Projective, Scalar};
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};

use super::short_group_sig_core::ProofCommittedBuilder;

/// Signer operations: key generation, signing and blind signing
pub struct Issuer;

impl Issuer {
    /// Create a keypair capable of signing up to `count` messages
    pub fn new_keys(
        count: usize,
        rng: impl RngCore + CryptoRng,
    ) -> AnonCredsResult<(PublicKey, SecretKey)> {
        let sk = SecretKey::random(count, rng)
            .ok_or_else(|| Error::input(format!("cannot create keys for {} messages", count)))?;
        Ok((PublicKey::from(&sk), sk))
    }

    /// Verify a proof of committed messages and generate a blind signature
    pub fn blind_sign(
        ctx: &BlindSignatureContext,
        sk: &SecretKey,
        msgs: &[(usize, Scalar)],
        nonce: Scalar,
    ) -> AnonCredsResult<BlindSignature> {
        let known = msgs.iter().map(|(i, _)| *i).collect::<Vec<usize>>();
        if ctx.verify(&known, sk, nonce)? {
            BlindSignature::new(ctx.commitment, sk, msgs)
        } else {
            Err(Error::input("blind signature context proof is invalid"))
        }
    }
}

/// Holder operations: blinding messages before issuance
pub struct Prover;

impl Prover {
    /// Commit to the messages only the holder knows and prove knowledge of them.
    /// `messages` maps a signature index to its message
    pub fn new_blind_signature_context(
        messages: &[(usize, Scalar)],
        public_key: &PublicKey,
        nonce: Scalar,
        mut rng: impl RngCore + CryptoRng,
    ) -> AnonCredsResult<(BlindSignatureContext, Scalar)> {
        let mut points = Vec::with_capacity(messages.len() + 1);
        let mut secrets = Vec::with_capacity(messages.len() + 1);
        let mut committing = ProofCommittedBuilder::<G1Projective>::new(G1Projective::sum_of_products);

        for (i, m) in messages {
            let generator = public_key
                .y_blinds
                .get(*i)
                .ok_or_else(|| Error::input(format!("no blinding generator for index {}", i)))?;
            secrets.push(*m);
            points.push(*generator);
            committing.commit_random(*generator, &mut rng);
        }

        let blinding = Scalar::random(&mut rng);
        secrets.push(blinding);
        points.push(G1Projective::GENERATOR);
        committing.commit_random(G1Projective::GENERATOR, &mut rng);

        let commitment = G1Projective::sum_of_products(&points, &secrets);
        let mut transcript = Transcript::new(BlindSignatureContext::TRANSCRIPT_LABEL);
        committing.add_challenge_contribution(b"random commitment", &mut transcript);
        BlindSignatureContext::add_statement(&mut transcript, commitment, nonce);
        let challenge = BlindSignatureContext::challenge(&mut transcript);
        let proofs = committing
            .generate_proof(challenge, &secrets)
            .ok_or_else(|| Error::unexpected("blind signature proof length mismatch"))?;
        Ok((
            BlindSignatureContext {
                commitment,
                challenge,
                proofs,
            },
            blinding,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knox::ecc_group::ScalarOps;
    use rand_core::OsRng;

    #[test]
    fn blind_signature_context_roundtrip() {
        let mut rng = OsRng;
        let (pk, sk) = Issuer::new_keys(4, &mut rng).unwrap();
        let nonce = Scalar::random(&mut rng);

        let link_secret = Scalar::from_hash(b"link secret");
        let (ctx, blinding) =
            Prover::new_blind_signature_context(&[(0, link_secret)], &pk, nonce, &mut rng)
                .unwrap();

        let known = [
            (1, Scalar::from_hash(b"firstname")),
            (2, Scalar::from_hash(b"age")),
            (3, Scalar::from(0u64)),
        ];
        let blind_signature = Issuer::blind_sign(&ctx, &sk, &known, nonce).unwrap();
        let signature = blind_signature.to_unblinded(blinding);

        let msgs = [link_secret, known[0].1, known[1].1, known[2].1];
        assert_eq!(signature.verify(&pk, &msgs).unwrap_u8(), 1);

        // A stale nonce fails the context proof
        let other = Scalar::random(&mut rng);
        assert!(Issuer::blind_sign(&ctx, &sk, &known, other).is_err());
    }

    #[test]
    fn key_count_limits() {
        assert!(Issuer::new_keys(0, OsRng).is_err());
        assert!(Issuer::new_keys(129, OsRng).is_err());
        assert!(Issuer::new_keys(128, OsRng).is_ok());
    }
}
