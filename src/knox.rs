/// Accumulator methods
pub mod accumulator;
/// ECC group operations
pub mod ecc_group;
/// Pointcheval Sanders signatures
pub mod ps;
/// Operations for short group signatures
pub mod short_group_sig_core;

use blsful::inner_types::G1Projective;
use elliptic_curve::hash2curve::ExpandMsgXof;

/// General purpose crypto operations
pub struct Knox {}

impl Knox {
    /// Hash arbitrary bytes to a point in G1 with the given domain separation tag
    pub fn hash_to_g1(input: &[u8], dst: &[u8]) -> G1Projective {
        G1Projective::hash::<ExpandMsgXof<sha3::Shake256>>(input, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_to_g1_is_domain_separated() {
        let a = Knox::hash_to_g1(b"message generator", b"DST-A");
        let b = Knox::hash_to_g1(b"message generator", b"DST-B");
        assert_ne!(a, b);
        assert_eq!(a, Knox::hash_to_g1(b"message generator", b"DST-A"));
    }
}
