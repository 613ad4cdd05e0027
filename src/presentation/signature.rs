use crate::knox::ps::{PokSignature, PokSignatureProof, PublicKey, Signature};
use crate::knox::short_group_sig_core::ProofMessage;
use crate::presentation::PresentationBuilder;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};

/// Proves knowledge of a credential signature, revealing some messages
pub(crate) struct SignatureBuilder {
    pok_sig: PokSignature,
}

impl PresentationBuilder for SignatureBuilder {
    type Proof = PokSignatureProof;

    fn gen_proof(self, challenge: Scalar) -> AnonCredsResult<PokSignatureProof> {
        self.pok_sig.generate_proof(challenge)
    }
}

impl SignatureBuilder {
    pub fn commit(
        signature: &Signature,
        public_key: &PublicKey,
        messages: &[ProofMessage],
        rng: impl RngCore + CryptoRng,
        transcript: &mut Transcript,
    ) -> AnonCredsResult<Self> {
        let pok_sig = PokSignature::commit(signature, public_key, messages, rng)?;
        let revealed = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_hidden())
            .map(|(i, m)| (i, m.get_message()))
            .collect::<Vec<_>>();
        add_revealed_contribution(&revealed, transcript);
        pok_sig.add_proof_contribution(transcript);
        Ok(Self { pok_sig })
    }
}

/// Bind the revealed messages, in index order, to the challenge
pub(crate) fn add_revealed_contribution(revealed: &[(usize, Scalar)], transcript: &mut Transcript) {
    transcript.append_u64(b"disclosed messages length", revealed.len() as u64);
    for (i, m) in revealed {
        transcript.append_u64(b"disclosed message index", *i as u64);
        transcript.append_message(b"disclosed message value", &m.to_be_bytes());
    }
}
