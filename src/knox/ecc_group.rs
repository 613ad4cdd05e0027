use blsful::inner_types::Scalar;
use sha2::{Digest, Sha512};

/// Scalar helpers shared by the signature and accumulator code
pub trait ScalarOps {
    /// The scalar value to be returned
    type Scalar;

    /// Convert 64 bytes into a scalar element
    fn from_bytes_wide(input: &[u8; 64]) -> Self::Scalar;

    /// Perform a cryptographic hashing operation to produce a scalar element
    fn from_hash(input: &[u8]) -> Self::Scalar {
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&Sha512::digest(input));
        Self::from_bytes_wide(&bytes)
    }

    /// Read a scalar from a 64 byte merlin challenge
    fn from_transcript(label: &'static [u8], transcript: &mut merlin::Transcript) -> Self::Scalar {
        let mut okm = [0u8; 64];
        transcript.challenge_bytes(label, &mut okm);
        Self::from_bytes_wide(&okm)
    }
}

impl ScalarOps for Scalar {
    type Scalar = Scalar;

    fn from_bytes_wide(input: &[u8; 64]) -> Self::Scalar {
        Scalar::from_bytes_wide(input)
    }
}
