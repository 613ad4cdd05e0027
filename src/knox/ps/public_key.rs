use super::SecretKey;
use blsful::inner_types::*;
use serde::{Deserialize, Serialize};
use subtle::Choice;

/// The public key contains a generator point for each
/// message that is signed and two extra.
/// See section 4.2 in
/// <https://eprint.iacr.org/2015/525.pdf> and
/// <https://eprint.iacr.org/2017/1197.pdf>
///
/// `w` corresponds to m' in the paper to achieve
/// EUF-CMA security level.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct PublicKey {
    /// The secret for m'
    pub w: G2Projective,
    /// The blinding secret
    pub x: G2Projective,
    /// The secrets for each signed message
    pub y: Vec<G2Projective>,
    /// The secrets for each signed message for blinding purposes
    pub y_blinds: Vec<G1Projective>,
}

impl From<&SecretKey> for PublicKey {
    fn from(sk: &SecretKey) -> Self {
        let w = G2Projective::GENERATOR * sk.w;
        let x = G2Projective::GENERATOR * sk.x;
        let y = sk.y.iter().map(|s| G2Projective::GENERATOR * s).collect();
        let y_blinds = sk.y.iter().map(|s| G1Projective::GENERATOR * s).collect();
        Self { w, x, y, y_blinds }
    }
}

impl PublicKey {
    /// The number of messages this key verifies
    pub fn message_count(&self) -> usize {
        self.y.len()
    }

    /// Check if this public key is invalid
    pub fn is_invalid(&self) -> Choice {
        let mut res = self.w.is_identity() | self.x.is_identity();
        for y in &self.y {
            res |= y.is_identity();
        }
        for y in &self.y_blinds {
            res |= y.is_identity();
        }
        res |= Choice::from((self.y.len() != self.y_blinds.len()) as u8);
        res
    }

    /// Append the key to a transcript
    pub fn add_challenge_contribution(&self, transcript: &mut merlin::Transcript) {
        transcript.append_message(b"public key w", &self.w.to_affine().to_compressed());
        transcript.append_message(b"public key x", &self.x.to_affine().to_compressed());
        transcript.append_u64(b"public key message count", self.y.len() as u64);
        for (y, y_blind) in self.y.iter().zip(&self.y_blinds) {
            transcript.append_message(b"public key y", &y.to_affine().to_compressed());
            transcript.append_message(
                b"public key y blind",
                &y_blind.to_affine().to_compressed(),
            );
        }
    }
}
