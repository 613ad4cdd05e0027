use crate::error::Error;
use crate::knox::ps::{PokSignatureProof, PublicKey};
use crate::presentation::add_revealed_contribution;
use crate::verifier::ProofVerifier;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;
use std::collections::BTreeMap;

pub(crate) struct SignatureVerifier<'a> {
    public_key: &'a PublicKey,
    proof: &'a PokSignatureProof,
    revealed: Vec<(usize, Scalar)>,
}

impl<'a> SignatureVerifier<'a> {
    /// `revealed` must be in message index order
    pub fn new(
        public_key: &'a PublicKey,
        proof: &'a PokSignatureProof,
        revealed: Vec<(usize, Scalar)>,
    ) -> Self {
        Self {
            public_key,
            proof,
            revealed,
        }
    }

    /// Schnorr responses of the hidden messages by index
    pub fn hidden_responses(&self) -> AnonCredsResult<BTreeMap<usize, Scalar>> {
        self.proof
            .get_hidden_message_proofs(self.public_key, &self.revealed)
    }
}

impl ProofVerifier for SignatureVerifier<'_> {
    fn add_challenge_contribution(
        &self,
        challenge: Scalar,
        transcript: &mut Transcript,
    ) -> AnonCredsResult<()> {
        add_revealed_contribution(&self.revealed, transcript);
        self.proof
            .add_challenge_contribution(self.public_key, &self.revealed, challenge, transcript);
        Ok(())
    }

    fn verify(&self, _challenge: Scalar) -> AnonCredsResult<()> {
        if self.proof.verify(&self.revealed, self.public_key) {
            Ok(())
        } else {
            Err(Error::rejected("invalid signature proof"))
        }
    }
}
