use super::{PublicKey, SecretKey};
use crate::error::Error;
use crate::knox::Knox;
use crate::AnonCredsResult;
use blsful::inner_types::*;
use serde::{Deserialize, Serialize};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use subtle::Choice;

/// A Pointcheval Saunders signature
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub(crate) sigma_1: G1Projective,
    pub(crate) sigma_2: G1Projective,
    pub(crate) m_tick: Scalar,
}

impl Signature {
    const DST: &'static [u8] = b"PS_SIG_BLS12381G1_XOF:SHAKE256_SSWU_RO_";

    /// Generate a new signature where all messages are known to the signer
    pub fn new(sk: &SecretKey, msgs: &[Scalar]) -> AnonCredsResult<Self> {
        if sk.is_invalid() {
            return Err(Error::input("invalid signing key"));
        }
        if sk.y.len() < msgs.len() {
            return Err(Error::input(format!(
                "signing key supports {} messages, {} given",
                sk.y.len(),
                msgs.len()
            )));
        }

        let m_tick = Self::compute_m_tick(msgs);
        let sigma_1 = Knox::hash_to_g1(&m_tick.to_be_bytes(), Self::DST);
        let mut exp = sk.x + sk.w * m_tick;
        for (m, y) in msgs.iter().zip(sk.y.iter()) {
            exp += *m * *y;
        }
        let sigma_2 = sigma_1 * exp;
        Ok(Self {
            sigma_1,
            sigma_2,
            m_tick,
        })
    }

    /// Verify a signature
    pub fn verify(&self, pk: &PublicKey, msgs: &[Scalar]) -> Choice {
        if pk.y.len() < msgs.len() {
            return Choice::from(0);
        }
        if pk.is_invalid().unwrap_u8() == 1 {
            return Choice::from(0);
        }
        if (self.sigma_1.is_identity() | self.sigma_2.is_identity()).unwrap_u8() == 1u8 {
            return Choice::from(0);
        }

        let mut points = Vec::with_capacity(msgs.len() + 2);
        let mut scalars = Vec::with_capacity(msgs.len() + 2);
        points.push(pk.x);
        scalars.push(Scalar::ONE);
        points.push(pk.w);
        scalars.push(self.m_tick);
        for (y, m) in pk.y.iter().zip(msgs) {
            points.push(*y);
            scalars.push(*m);
        }

        // Y_m = X_tilde * W_tilde^m' * Y_tilde[1]^m_1 * Y_tilde[2]^m_2 * ...Y_tilde[i]^m_i
        let y_m = G2Projective::sum_of_products(&points, &scalars);

        // e(sigma_1, Y_m) == e(sigma_2, G2)
        multi_miller_loop(&[
            (
                &self.sigma_1.to_affine(),
                &G2Prepared::from(y_m.to_affine()),
            ),
            (
                &self.sigma_2.to_affine(),
                &G2Prepared::from(-G2Affine::generator()),
            ),
        ])
        .final_exponentiation()
        .is_identity()
    }

    pub(crate) fn compute_m_tick(msgs: &[Scalar]) -> Scalar {
        let mut hasher = sha3::Shake256::default();
        for m in msgs {
            hasher.update(&m.to_be_bytes());
        }
        let mut reader = hasher.finalize_xof();
        let mut out = [0u8; 64];
        reader.read(&mut out);
        let a = Scalar::from_bytes_wide(&out);
        reader.read(&mut out);
        Scalar::from_bytes_wide(&out) + a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn sign_and_verify() {
        let sk = SecretKey::random(3, OsRng).unwrap();
        let pk = PublicKey::from(&sk);
        let msgs = [Scalar::from(1u64), Scalar::from(2u64), Scalar::from(3u64)];
        let sig = Signature::new(&sk, &msgs).unwrap();
        assert_eq!(sig.verify(&pk, &msgs).unwrap_u8(), 1);

        let tampered = [Scalar::from(1u64), Scalar::from(2u64), Scalar::from(4u64)];
        assert_eq!(sig.verify(&pk, &tampered).unwrap_u8(), 0);
    }

    #[test]
    fn too_many_messages() {
        let sk = SecretKey::random(1, OsRng).unwrap();
        assert!(Signature::new(&sk, &[Scalar::ONE, Scalar::ONE]).is_err());
    }
}
