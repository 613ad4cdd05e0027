use crate::knox::ecc_group::ScalarOps;
use blsful::inner_types::{
    ff::Field,
    group::{Curve, GroupEncoding},
    Scalar,
};
use core::fmt::Debug;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};

/// Two types of hidden messages
#[derive(Copy, Clone, Debug)]
pub enum HiddenMessage {
    /// The message is hidden and only used by one proof,
    /// a blinding factor is generated specifically for it
    ProofSpecificBlinding(Scalar),
    /// The message is hidden and shared with other proofs
    /// (predicates, accumulator membership) so the blinding
    /// factor is supplied by the caller
    ExternalBlinding(Scalar, Scalar),
}

/// A message classification by the prover
#[derive(Copy, Clone, Debug)]
pub enum ProofMessage {
    /// Message will be revealed to a verifier
    Revealed(Scalar),
    /// Message will be hidden from a verifier
    Hidden(HiddenMessage),
}

impl ProofMessage {
    /// Extract the internal message
    pub fn get_message(&self) -> Scalar {
        match *self {
            ProofMessage::Revealed(r) => r,
            ProofMessage::Hidden(HiddenMessage::ProofSpecificBlinding(p)) => p,
            ProofMessage::Hidden(HiddenMessage::ExternalBlinding(p, _)) => p,
        }
    }

    /// Get the blinding factor, revealed messages have none
    pub fn get_blinder(&self, rng: impl RngCore + CryptoRng) -> Option<Scalar> {
        match *self {
            ProofMessage::Revealed(_) => None,
            ProofMessage::Hidden(HiddenMessage::ProofSpecificBlinding(_)) => {
                Some(Scalar::random(rng))
            }
            ProofMessage::Hidden(HiddenMessage::ExternalBlinding(_, s)) => Some(s),
        }
    }

    /// Is this message hidden from the verifier
    pub fn is_hidden(&self) -> bool {
        matches!(self, ProofMessage::Hidden(_))
    }
}

/// A builder struct for creating a proof of knowledge
/// of messages in a vector commitment
/// each message has a blinding factor
pub struct ProofCommittedBuilder<B>
where
    B: Copy + Debug + Curve,
    B::AffineRepr: GroupEncoding,
{
    points: Vec<B>,
    scalars: Vec<Scalar>,
    sum_of_products: fn(&[B], &[Scalar]) -> B,
}

impl<B> ProofCommittedBuilder<B>
where
    B: Copy + Debug + Curve,
    B::AffineRepr: GroupEncoding,
{
    /// Create a new builder
    pub fn new(sum_of_products: fn(&[B], &[Scalar]) -> B) -> Self {
        Self {
            points: Vec::new(),
            scalars: Vec::new(),
            sum_of_products,
        }
    }

    /// Add a specified point and generate a random blinding factor
    pub fn commit_random(&mut self, point: B, rng: impl RngCore) {
        self.points.push(point);
        self.scalars.push(Scalar::random(rng));
    }

    /// Commit a specified point with the specified scalar
    pub fn commit(&mut self, point: B, scalar: Scalar) {
        self.points.push(point);
        self.scalars.push(scalar);
    }

    /// The number of committed points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// No points have been committed
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The commitment to the random blinding factors
    pub fn commitment(&self) -> B {
        (self.sum_of_products)(&self.points, &self.scalars)
    }

    /// Convert the committed values to bytes for the fiat-shamir challenge
    pub fn add_challenge_contribution(&self, label: &'static [u8], transcript: &mut Transcript) {
        transcript.append_message(label, self.commitment().to_affine().to_bytes().as_ref());
    }

    /// Generate the Schnorr responses `p = r + c * s` for the given secrets
    pub fn generate_proof(&self, challenge: Scalar, secrets: &[Scalar]) -> Option<Vec<Scalar>> {
        if secrets.len() != self.scalars.len() {
            return None;
        }
        Some(
            self.scalars
                .iter()
                .zip(secrets)
                .map(|(r, s)| *r + *s * challenge)
                .collect(),
        )
    }
}

/// Fiat-Shamir challenge from the transcript
pub fn challenge_from_transcript(label: &'static [u8], transcript: &mut Transcript) -> Scalar {
    <Scalar as ScalarOps>::from_transcript(label, transcript)
}
