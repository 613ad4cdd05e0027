use crate::error::Error;
use crate::knox::{ps, short_group_sig_core::challenge_from_transcript};
use crate::AnonCredsResult;
use blsful::inner_types::*;
use elliptic_curve::Field;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Proves the credential definition key was generated honestly: knowledge of
/// `w` and `x`, and that every blinding generator in G1 shares its discrete
/// log with the verifying generator in G2
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeyCorrectnessProof {
    challenge: Scalar,
    s_w: Scalar,
    s_x: Scalar,
    s_y: Vec<Scalar>,
}

impl KeyCorrectnessProof {
    const TRANSCRIPT_LABEL: &'static [u8] = b"anoncreds key correctness proof";

    pub(crate) fn new(
        public_key: &ps::PublicKey,
        secret_key: &ps::SecretKey,
        mut rng: impl RngCore + CryptoRng,
    ) -> AnonCredsResult<Self> {
        if public_key.message_count() != secret_key.message_count() {
            return Err(Error::unexpected("key sizes differ"));
        }
        let r_w = Scalar::random(&mut rng);
        let r_x = Scalar::random(&mut rng);
        let r_y = (0..secret_key.message_count())
            .map(|_| Scalar::random(&mut rng))
            .collect::<Vec<_>>();

        let mut transcript = Transcript::new(Self::TRANSCRIPT_LABEL);
        public_key.add_challenge_contribution(&mut transcript);
        add_commitments(
            &mut transcript,
            G2Projective::GENERATOR * r_w,
            G2Projective::GENERATOR * r_x,
            r_y.iter()
                .map(|r| (G2Projective::GENERATOR * r, G1Projective::GENERATOR * r)),
        );
        let challenge = challenge_from_transcript(b"challenge", &mut transcript);

        Ok(Self {
            challenge,
            s_w: r_w + challenge * secret_key.w,
            s_x: r_x + challenge * secret_key.x,
            s_y: r_y
                .iter()
                .zip(&secret_key.y)
                .map(|(r, y)| *r + challenge * y)
                .collect(),
        })
    }

    /// Check the proof against a credential definition key
    pub fn verify(&self, public_key: &ps::PublicKey) -> AnonCredsResult<()> {
        if public_key.is_invalid().unwrap_u8() == 1 {
            return Err(Error::input("invalid credential definition key"));
        }
        if self.s_y.len() != public_key.message_count() {
            return Err(Error::input("key correctness proof does not match the key"));
        }
        let c = -self.challenge;
        let t_w = G2Projective::GENERATOR * self.s_w + public_key.w * c;
        let t_x = G2Projective::GENERATOR * self.s_x + public_key.x * c;
        let t_y = self
            .s_y
            .iter()
            .zip(public_key.y.iter().zip(&public_key.y_blinds))
            .map(|(s, (y, y_blind))| {
                (
                    G2Projective::GENERATOR * s + *y * c,
                    G1Projective::GENERATOR * s + *y_blind * c,
                )
            });

        let mut transcript = Transcript::new(Self::TRANSCRIPT_LABEL);
        public_key.add_challenge_contribution(&mut transcript);
        add_commitments(&mut transcript, t_w, t_x, t_y);
        let challenge = challenge_from_transcript(b"challenge", &mut transcript);

        if challenge.ct_eq(&self.challenge).unwrap_u8() == 1 {
            Ok(())
        } else {
            Err(Error::input("invalid key correctness proof"))
        }
    }
}

fn add_commitments(
    transcript: &mut Transcript,
    t_w: G2Projective,
    t_x: G2Projective,
    t_y: impl Iterator<Item = (G2Projective, G1Projective)>,
) {
    transcript.append_message(b"commitment w", &t_w.to_affine().to_compressed());
    transcript.append_message(b"commitment x", &t_x.to_affine().to_compressed());
    for (g2, g1) in t_y {
        transcript.append_message(b"commitment y", &g2.to_affine().to_compressed());
        transcript.append_message(b"commitment y blind", &g1.to_affine().to_compressed());
    }
}
