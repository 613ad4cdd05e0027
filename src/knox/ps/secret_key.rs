use blsful::inner_types::{ff::Field, Scalar};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// The secret key contains a field element for each
/// message that is signed and two extra.
/// See section 4.2 in
/// <https://eprint.iacr.org/2015/525.pdf> and
/// <https://eprint.iacr.org/2017/1197.pdf>
///
/// `w` corresponds to m' in the paper to achieve
/// EUF-CMA security level.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey {
    pub(crate) w: Scalar,
    pub(crate) x: Scalar,
    pub(crate) y: Vec<Scalar>,
}

impl SecretKey {
    /// The most messages a key can sign
    pub const MAX_MESSAGES: usize = 128;

    /// Compute a secret key from a CS-PRNG
    pub fn random(count: usize, mut rng: impl RngCore + CryptoRng) -> Option<Self> {
        if count == 0 || count > Self::MAX_MESSAGES {
            return None;
        }
        let w = Scalar::random(&mut rng);
        let x = Scalar::random(&mut rng);
        let y = (0..count).map(|_| Scalar::random(&mut rng)).collect();
        Some(Self { w, x, y })
    }

    /// The number of messages this key signs
    pub fn message_count(&self) -> usize {
        self.y.len()
    }

    /// Check if any component of this key is zero
    pub fn is_invalid(&self) -> bool {
        let mut res = self.w.is_zero() | self.x.is_zero();
        for y in &self.y {
            res |= y.is_zero();
        }
        res.unwrap_u8() == 1u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_count_is_bounded() {
        assert!(SecretKey::random(0, rand_core::OsRng).is_none());
        assert!(SecretKey::random(SecretKey::MAX_MESSAGES + 1, rand_core::OsRng).is_none());
        let key = SecretKey::random(3, rand_core::OsRng).unwrap();
        assert_eq!(key.message_count(), 3);
        assert!(!key.is_invalid());
    }
}
