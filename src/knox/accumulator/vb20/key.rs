use super::{accumulator::Element, generate_fr, Polynomial};
use blsful::inner_types::*;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Represents \alpha (secret key) on page 6 in
/// <https://eprint.iacr.org/2020/777.pdf>
#[derive(Clone, Debug, Zeroize, Serialize, Deserialize)]
#[zeroize(drop)]
pub struct SecretKey(pub Scalar);

impl SecretKey {
    /// Create a new secret key, from a seed when given
    pub fn new(seed: Option<&[u8]>) -> Self {
        // Giuseppe Vitto, Alex Biryukov = VB
        // Accumulator = ACC
        Self(generate_fr(b"VB-ACC-KEYGEN-SALT-", seed, rand_core::OsRng))
    }

    /// Compute the batch add elements value
    pub fn batch_additions(&self, additions: &[Element]) -> Element {
        Element(
            additions
                .iter()
                .map(|v| v.0 + self.0)
                .fold(Scalar::ONE, |a, y| a * y),
        )
    }

    /// Compute the batch remove elements value, `None` when an element equals `-alpha`
    pub fn batch_deletions(&self, deletions: &[Element]) -> Option<Element> {
        Option::<Scalar>::from(self.batch_additions(deletions).0.invert()).map(Element)
    }

    /// Create the Batch Polynomial coefficients
    pub fn create_coefficients(
        &self,
        additions: &[Element],
        deletions: &[Element],
    ) -> Option<Vec<Element>> {
        // vD(x) = ∑^{m}_{s=1}{ ∏ 1..s {yD_i + alpha}^-1 ∏ 1 ..s-1 {yD_j - x}
        let one = Scalar::ONE;
        let m1 = -one;
        let mut v_d = Polynomial::with_capacity(deletions.len());
        for s in 0..deletions.len() {
            // ∏ 1..s (yD_i + alpha)^-1
            let c = self.batch_deletions(&deletions[0..s + 1])?.0;
            let mut poly = Polynomial::with_capacity(deletions.len());
            poly.push(one);
            // ∏ 1..(s-1) (yD_j - x)
            for j in deletions.iter().take(s) {
                poly *= &[j.0, m1];
            }
            poly *= c;
            v_d += poly;
        }
        //v_d(x) * ∏ 1..n (yA_i + alpha)
        v_d *= self.batch_additions(additions).0;

        // vA(x) = ∑^n_{s=1}{ ∏ 1..s-1 {yA_i + alpha} ∏ s+1..n {yA_j - x} }
        let mut v_a = Polynomial::with_capacity(additions.len());
        for s in 0..additions.len() {
            // ∏ 1..s-1 {yA_i + alpha}
            let c = self.batch_additions(&additions[0..s]).0;
            let mut poly = Polynomial::with_capacity(additions.len());
            poly.push(one);
            // ∏ s+1..n {yA_j - x}
            for j in additions.iter().skip(s + 1) {
                poly *= &[j.0, m1];
            }
            poly *= c;
            v_a += poly;
        }
        // vA - vD
        v_a -= v_d;
        Some(v_a.0.into_iter().map(Element).collect())
    }

    /// The powers `alpha^k * P` for `k` in `0..count`
    pub fn powers(&self, count: usize) -> impl Iterator<Item = G1Projective> + '_ {
        (0..count).scan(G1Projective::GENERATOR, move |p, _| {
            let current = *p;
            *p *= self.0;
            Some(current)
        })
    }
}

/// Represents \overline{Q} = \overline{P}*\alpha (public key) on page 6 in
/// <https://eprint.iacr.org/2020/777.pdf>
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PublicKey(pub G2Projective);

impl PublicKey {
    /// Return the byte representation for this public key
    pub fn to_bytes(&self) -> [u8; 96] {
        self.0.to_affine().to_compressed()
    }
}

impl From<&SecretKey> for PublicKey {
    fn from(sk: &SecretKey) -> Self {
        Self(G2Projective::GENERATOR * sk.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_test() {
        let key = SecretKey::new(None);
        let data = vec![Element::hash(b"value1"), Element::hash(b"value2")];
        let add = key.batch_additions(&data);
        let del = key.batch_deletions(&data).unwrap();
        assert_eq!(add.0 * del.0, Scalar::ONE);
    }

    #[test]
    fn powers_of_alpha() {
        let key = SecretKey::new(Some(b"powers_of_alpha"));
        let powers = key.powers(3).collect::<Vec<_>>();
        assert_eq!(powers.len(), 3);
        assert_eq!(powers[0], G1Projective::GENERATOR);
        assert_eq!(powers[2], G1Projective::GENERATOR * (key.0 * key.0));
    }
}
