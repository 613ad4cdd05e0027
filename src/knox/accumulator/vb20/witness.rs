use super::{
    accumulator::{Accumulator, Coefficient, Element},
    dad,
    key::{PublicKey, SecretKey},
    PolynomialG1,
};
use crate::error::Error;
use crate::AnonCredsResult;
use blsful::inner_types::*;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A membership witness that can be used for membership proof generation
/// as described in section 4 in
/// <https://eprint.iacr.org/2020/777>
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MembershipWitness(pub G1Projective);

impl fmt::Display for MembershipWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MembershipWitness {{ {} }}",
            hex::encode(self.0.to_affine().to_compressed())
        )
    }
}

impl From<G1Projective> for MembershipWitness {
    fn from(g: G1Projective) -> Self {
        Self(g)
    }
}

impl MembershipWitness {
    /// Compute the witness using a prehashed element
    pub fn new(element: Element, accumulator: Accumulator, secret_key: &SecretKey) -> Option<Self> {
        accumulator.remove(secret_key, element).map(|a| Self(a.0))
    }

    /// Verify this is a valid witness as per section 4 in
    /// <https://eprint.iacr.org/2020/777>
    pub fn verify(&self, y: Element, pubkey: PublicKey, accumulator: Accumulator) -> bool {
        let p = G2Projective::GENERATOR * y.0 + pubkey.0;

        // e(C, yP~ + Q~) == e(V, P~)
        multi_miller_loop(&[
            (&self.0.to_affine(), &G2Prepared::from(p.to_affine())),
            (
                &accumulator.0.to_affine(),
                &G2Prepared::from(-G2Affine::generator()),
            ),
        ])
        .final_exponentiation()
        .is_identity()
        .unwrap_u8()
            == 1
    }

    /// Apply the specified delta to this witness
    pub fn apply_delta_assign(&mut self, delta: Delta) {
        // C * dA(x) / dD(x)
        self.0 *= delta.d;
        // C + 1 / dD *〈Υy,Ω〉
        self.0 += delta.p;
    }

    /// Batch update this witness with the coefficients published
    /// alongside an accumulator update
    pub fn batch_update_assign(
        &mut self,
        y: Element,
        additions: &[Element],
        deletions: &[Element],
        coefficients: &[Coefficient],
    ) -> AnonCredsResult<()> {
        let delta = evaluate_delta(y, additions, deletions, coefficients)?;
        self.apply_delta_assign(delta);
        Ok(())
    }
}

/// A compressed delta
#[derive(Debug, Copy, Clone)]
pub struct Delta {
    d: Scalar,
    p: G1Projective,
}

/// Computes the compressed delta needed to update a witness
pub fn evaluate_delta(
    y: Element,
    additions: &[Element],
    deletions: &[Element],
    coefficients: &[Coefficient],
) -> AnonCredsResult<Delta> {
    // dD(x) = ∏ 1..m (yD_i - x)
    // If this fails, then this value was removed
    let d_d = Option::<Scalar>::from(dad(deletions, y.0).invert())
        .ok_or_else(|| Error::CredentialRevoked("witness element was removed".into()))?;

    //dA(x) =  ∏ 1..n (yA_i - x)
    let d_a = dad(additions, y.0) * d_d;

    let poly = PolynomialG1(coefficients.iter().map(|c| c.0).collect());
    //〈Υy,Ω〉
    let v = poly
        .evaluate(y.0)
        .ok_or_else(|| Error::InvalidState("no update coefficients".into()))?;
    // C + 1 / dD *〈Υy,Ω〉
    Ok(Delta { d: d_a, p: v * d_d })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements() -> Vec<Element> {
        (3..10u8).map(|i| Element::hash(&[i])).collect()
    }

    #[test]
    fn membership_batch_update() {
        let key = SecretKey::new(Some(b"membership_batch_update"));
        let pubkey = PublicKey::from(&key);
        let elements = elements();
        let y = elements[0];
        let mut acc = Accumulator::with_elements(&key, &elements[..4]);
        let mut wit = MembershipWitness::new(y, acc, &key).unwrap();
        assert!(wit.verify(y, pubkey, acc));

        let additions = &elements[4..];
        let deletions = &elements[1..3];
        let coefficients = acc.update_assign(&key, additions, deletions).unwrap();
        assert!(!wit.verify(y, pubkey, acc));

        wit.batch_update_assign(y, additions, deletions, &coefficients)
            .unwrap();
        assert!(wit.verify(y, pubkey, acc));
    }

    #[test]
    fn removed_element_cannot_update() {
        let key = SecretKey::new(Some(b"removed_element_cannot_update"));
        let elements = elements();
        let y = elements[1];
        let mut acc = Accumulator::with_elements(&key, &elements);
        let mut wit = MembershipWitness::new(y, acc, &key).unwrap();
        let coefficients = acc.update_assign(&key, &[], &[y]).unwrap();
        let res = wit.batch_update_assign(y, &[], &[y], &coefficients);
        assert!(res.is_err());
    }
}
