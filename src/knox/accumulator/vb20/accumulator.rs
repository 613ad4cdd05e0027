use super::{generate_fr, key::SecretKey, SALT};
use blsful::inner_types::*;
use serde::{Deserialize, Serialize};

/// An element in the accumulator
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Element(pub Scalar);

impl core::fmt::Display for Element {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Element {{ {} }}", self.0)
    }
}

impl From<Scalar> for Element {
    fn from(s: Scalar) -> Self {
        Self(s)
    }
}

impl Element {
    /// Return the byte representation
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    /// Construct an element by hashing the specified bytes
    pub fn hash(d: &[u8]) -> Self {
        Self(generate_fr(SALT, Some(d), rand_core::OsRng))
    }
}

/// A coefficent for updating witnesses
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Coefficient(pub G1Projective);

/// Represents a Universal Bilinear Accumulator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Accumulator(pub G1Projective);

impl core::fmt::Display for Accumulator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Accumulator {{ {} }}", hex::encode(self.to_bytes()))
    }
}

impl From<G1Projective> for Accumulator {
    fn from(g: G1Projective) -> Self {
        Self(g)
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self(G1Projective::GENERATOR)
    }
}

impl Accumulator {
    /// The number of bytes in an accumulator
    pub const BYTES: usize = 48;

    /// Initialize a new accumulator prefilled with entries
    pub fn with_elements(key: &SecretKey, m: &[Element]) -> Self {
        let y = key.batch_additions(m);
        Self(G1Projective::GENERATOR * y.0)
    }

    /// Add a value to the accumulator
    pub fn add(&self, key: &SecretKey, value: Element) -> Self {
        Self(self.0 * (key.0 + value.0))
    }

    /// Remove a value from the accumulator and return
    /// a new accumulator without `value`
    pub fn remove(&self, key: &SecretKey, value: Element) -> Option<Self> {
        Option::<Scalar>::from((key.0 + value.0).invert()).map(|v| Self(self.0 * v))
    }

    /// Performs a batch addition and deletion as described on page 11, section 5 in
    /// https://eprint.iacr.org/2020/777.pdf
    ///
    /// Returns the coefficients holders use to update their witnesses
    pub fn update_assign(
        &mut self,
        key: &SecretKey,
        additions: &[Element],
        deletions: &[Element],
    ) -> Option<Vec<Coefficient>> {
        let a = key.batch_additions(additions);
        let d = key.batch_deletions(deletions)?;
        let coefficients = key
            .create_coefficients(additions, deletions)?
            .iter()
            .map(|c| Coefficient(self.0 * c.0))
            .collect();
        self.0 *= a.0 * d.0;
        Some(coefficients)
    }

    /// Convert accumulator to bytes
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        self.0.to_affine().to_compressed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accumulator_100() {
        let key = SecretKey::new(None);
        let elems = (0..100u8).map(|i| Element::hash(&[i])).collect::<Vec<Element>>();
        let acc = Accumulator::with_elements(&key, &elems);
        assert_ne!(acc.0, G1Projective::GENERATOR);
    }

    #[test]
    fn update_matches_rebuild() {
        let key = SecretKey::new(Some(b"update_matches_rebuild"));
        let elems = (0..5)
            .map(|i: u8| Element::hash(&[i]))
            .collect::<Vec<Element>>();
        let mut acc = Accumulator::with_elements(&key, &elems[..3]);
        acc.update_assign(&key, &elems[3..], &elems[..1]).unwrap();
        assert_eq!(acc, Accumulator::with_elements(&key, &elems[1..]));
    }
}
