/// Accumulator elements
mod accumulator;
/// Signing and Verification keys
mod key;
/// Proofs of inclusion
mod proof;
/// Witnesses
mod witness;

pub use accumulator::*;
pub use key::*;
pub use proof::*;
pub use witness::*;

use crate::knox::Knox;
use blsful::inner_types::{G1Projective, Scalar};
use rand_core::{CryptoRng, RngCore};
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

/// Similar to https://tools.ietf.org/html/draft-irtf-cfrg-bls-signature-04#section-2.3
/// info is left blank
fn generate_fr(salt: &[u8], ikm: Option<&[u8]>, mut rng: impl RngCore + CryptoRng) -> Scalar {
    let mut hasher = Shake256::default();
    hasher.update(salt);
    match ikm {
        Some(v) => hasher.update(v),
        None => {
            let mut arr = [0u8; 32];
            rng.fill_bytes(&mut arr);
            hasher.update(&arr);
        }
    };
    let mut okm = [0u8; 64];
    let mut xof = hasher.finalize_xof();
    xof.read(&mut okm);
    Scalar::from_bytes_wide(&okm)
}

fn hash_to_g1<I: AsRef<[u8]>>(data: I) -> G1Projective {
    const DST: &[u8] = b"BLS12381G1_XOF:SHAKE256_SSWU_RO_VB_ACCUMULATOR:1_0_0";
    Knox::hash_to_g1(data.as_ref(), DST)
}

/// dA(x) and dD(x)
fn dad(values: &[Element], y: Scalar) -> Scalar {
    values.iter().fold(Scalar::ONE, |a, v| a * (v.0 - y))
}

/// Salt used for hashing values into the accumulator
/// Giuseppe Vitto, Alex Biryukov = VB
/// Accumulator = ACC
const SALT: &[u8] = b"VB-ACC-HASH-SALT-";

/// A Polynomial for Points
pub struct PolynomialG1(pub Vec<G1Projective>);

impl PolynomialG1 {
    /// Return the result of evaluating the polynomial with the specified point
    pub fn evaluate(&self, x: Scalar) -> Option<G1Projective> {
        let (first, rest) = self.0.split_first()?;
        let mut p = x;
        let mut res = *first;
        for c in rest {
            res += *c * p;
            p *= x;
        }
        Some(res)
    }
}

/// A Polynomial for scalars, lowest degree first
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Polynomial(pub Vec<Scalar>);

impl Polynomial {
    /// Initialize this polynomial with the expected capacity
    pub fn with_capacity(size: usize) -> Self {
        Self(Vec::with_capacity(size))
    }

    /// Add the scalar to the end of the polynomial
    pub fn push(&mut self, value: Scalar) {
        self.0.push(value);
    }

    /// Expand `∏ (r_i + x)` into its coefficients
    pub fn from_roots_shifted(roots: impl IntoIterator<Item = Scalar>) -> Self {
        let mut poly = Self(vec![Scalar::ONE]);
        for r in roots {
            poly *= &[r, Scalar::ONE];
        }
        poly
    }

    /// The number of coefficients
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// There are no coefficients
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Scalar>> for Polynomial {
    fn from(scalars: Vec<Scalar>) -> Self {
        Self(scalars)
    }
}

impl core::ops::AddAssign for Polynomial {
    fn add_assign(&mut self, rhs: Self) {
        if self.0.len() < rhs.0.len() {
            self.0.resize(rhs.0.len(), Scalar::ZERO);
        }
        for (l, r) in self.0.iter_mut().zip(rhs.0) {
            *l += r;
        }
    }
}

impl core::ops::SubAssign for Polynomial {
    fn sub_assign(&mut self, rhs: Self) {
        if self.0.len() < rhs.0.len() {
            self.0.resize(rhs.0.len(), Scalar::ZERO);
        }
        for (l, r) in self.0.iter_mut().zip(rhs.0) {
            *l -= r;
        }
    }
}

impl core::ops::MulAssign<&[Scalar; 2]> for Polynomial {
    fn mul_assign(&mut self, rhs: &[Scalar; 2]) {
        *self *= &rhs[..];
    }
}

impl core::ops::MulAssign<&[Scalar]> for Polynomial {
    fn mul_assign(&mut self, rhs: &[Scalar]) {
        if self.0.is_empty() || rhs.is_empty() {
            self.0.clear();
            return;
        }
        let mut product = vec![Scalar::ZERO; self.0.len() + rhs.len() - 1];
        for (i, l) in self.0.iter().enumerate() {
            for (j, r) in rhs.iter().enumerate() {
                product[i + j] += *l * *r;
            }
        }
        self.0 = product;
    }
}

impl core::ops::MulAssign<Scalar> for Polynomial {
    fn mul_assign(&mut self, rhs: Scalar) {
        for c in self.0.iter_mut() {
            *c *= rhs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_roots() {
        // (2 + x)(3 + x) = 6 + 5x + x^2
        let poly = Polynomial::from_roots_shifted([Scalar::from(2u64), Scalar::from(3u64)]);
        assert_eq!(
            poly.0,
            vec![Scalar::from(6u64), Scalar::from(5u64), Scalar::ONE]
        );
        assert_eq!(Polynomial::from_roots_shifted([]).0, vec![Scalar::ONE]);
    }

    #[test]
    fn evaluate_points() {
        let g = G1Projective::GENERATOR;
        let poly = PolynomialG1(vec![g, g * Scalar::from(2u64)]);
        assert_eq!(poly.evaluate(Scalar::from(3u64)), Some(g * Scalar::from(7u64)));
        assert!(PolynomialG1(Vec::new()).evaluate(Scalar::ONE).is_none());
    }
}
