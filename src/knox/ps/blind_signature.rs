use super::{SecretKey, Signature};
use crate::error::Error;
use crate::knox::ecc_group::ScalarOps;
use crate::AnonCredsResult;
use blsful::inner_types::*;
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use std::collections::BTreeSet;
use subtle::ConstantTimeEq;

/// A PS blind signature
/// structurally identical to `Signature` but is used to
/// help with misuse and confusion.
///
/// 1 or more messages have been hidden by the signature recipient
/// so the signer only knows a subset of the messages to be signed
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct BlindSignature(pub(crate) Signature);

impl BlindSignature {
    /// Sign the known messages together with the holder's commitment
    pub fn new(
        commitment: G1Projective,
        sk: &SecretKey,
        msgs: &[(usize, Scalar)],
    ) -> AnonCredsResult<Self> {
        if sk.is_invalid() {
            return Err(Error::input("invalid signing key"));
        }
        if msgs.iter().any(|(i, _)| *i >= sk.y.len()) {
            return Err(Error::input("message index exceeds the signing key"));
        }

        let known = msgs.iter().map(|(_, m)| *m).collect::<Vec<Scalar>>();
        let m_tick = Signature::compute_m_tick(&known);

        // u is derived from the key and messages so signing is deterministic
        let mut hasher = sha3::Shake256::default();
        hasher.update(&sk.x.to_be_bytes());
        hasher.update(&sk.w.to_be_bytes());
        hasher.update(&commitment.to_affine().to_compressed());
        known.iter().for_each(|m| hasher.update(&m.to_be_bytes()));
        let mut reader = hasher.finalize_xof();
        let mut okm = [0u8; 64];
        reader.read(&mut okm);
        let u = Scalar::from_bytes_wide(&okm);
        let sigma_1 = G1Projective::GENERATOR * u;

        let mut exp = sk.x + m_tick * sk.w;
        for (i, msg) in msgs {
            exp += sk.y[*i] * msg;
        }
        let sigma_2 = ((G1Projective::GENERATOR * exp) + commitment) * u;
        Ok(Self(Signature {
            sigma_1,
            sigma_2,
            m_tick,
        }))
    }

    /// Remove the holder's blinding factor
    pub fn to_unblinded(self, blinding: Scalar) -> Signature {
        Signature {
            sigma_1: self.0.sigma_1,
            sigma_2: self.0.sigma_2 - (self.0.sigma_1 * blinding),
            m_tick: self.0.m_tick,
        }
    }
}

/// The holder's commitment to its hidden messages with a proof of knowledge
/// of the committed values, bound to the issuer's nonce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlindSignatureContext {
    /// The blinded signature commitment
    pub commitment: G1Projective,
    /// The challenge hash for the Fiat-Shamir heuristic
    pub challenge: Scalar,
    /// The proofs for the hidden messages
    pub proofs: Vec<Scalar>,
}

impl BlindSignatureContext {
    pub(crate) const TRANSCRIPT_LABEL: &'static [u8] = b"new blind signature";

    pub(crate) fn add_statement(transcript: &mut Transcript, commitment: G1Projective, nonce: Scalar) {
        transcript.append_message(
            b"blind commitment",
            commitment.to_affine().to_compressed().as_ref(),
        );
        transcript.append_message(b"nonce", nonce.to_be_bytes().as_ref());
    }

    pub(crate) fn challenge(transcript: &mut Transcript) -> Scalar {
        Scalar::from_transcript(b"blind signature context challenge", transcript)
    }

    /// Check the proof of hidden messages. Every index of the key that is
    /// not in `known_messages` must be committed by the holder
    pub fn verify(
        &self,
        known_messages: &[usize],
        sk: &SecretKey,
        nonce: Scalar,
    ) -> AnonCredsResult<bool> {
        let mut known = BTreeSet::new();
        for idx in known_messages {
            if *idx >= sk.y.len() {
                return Err(Error::input(format!("unknown message index {}", idx)));
            }
            known.insert(*idx);
        }
        let mut points = Vec::new();
        for (i, y) in sk.y.iter().enumerate() {
            if !known.contains(&i) {
                points.push(G1Projective::GENERATOR * y);
            }
        }
        points.push(G1Projective::GENERATOR);
        if points.len() != self.proofs.len() {
            return Ok(false);
        }
        points.push(self.commitment);

        let mut scalars = self.proofs.clone();
        scalars.push(-self.challenge);

        let commitment = G1Projective::sum_of_products(&points, &scalars);
        let mut transcript = Transcript::new(Self::TRANSCRIPT_LABEL);
        transcript.append_message(
            b"random commitment",
            &commitment.to_affine().to_compressed(),
        );
        Self::add_statement(&mut transcript, self.commitment, nonce);
        let challenge = Self::challenge(&mut transcript);

        Ok(self.challenge.ct_eq(&challenge).unwrap_u8() == 1)
    }
}
