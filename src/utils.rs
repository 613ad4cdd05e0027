use blsful::inner_types::Scalar;
use indexmap::IndexSet;
use rand::Rng;
use serde::{
    de::{DeserializeOwned, SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserializer, Serialize, Serializer,
};
use std::{
    fmt::{self, Formatter},
    hash::Hash,
    marker::PhantomData,
    time::{SystemTime, UNIX_EPOCH},
};

pub const TOP_BIT: u64 = i64::MIN as u64;

/// Maps a signed integer into the positive range preserving order
pub fn zero_center(num: i64) -> u64 {
    num as u64 ^ TOP_BIT
}

pub fn get_num_scalar(num: i64) -> Scalar {
    Scalar::from(zero_center(num))
}

/// A random number of `bits` bits as a decimal string
pub fn random_decimal(bits: u32, mut rng: impl Rng) -> String {
    let mut bytes = vec![0u8; bits.div_ceil(8) as usize];
    rng.fill(bytes.as_mut_slice());
    let excess = bytes.len() as u32 * 8 - bits;
    if let Some(first) = bytes.first_mut() {
        *first &= 0xFF >> excess;
    }
    num_bigint::BigUint::from_bytes_be(&bytes).to_str_radix(10)
}

/// Attribute names compare case insensitively, ignoring spaces
pub fn attr_common_view(attr: &str) -> String {
    attr.replace(' ', "").to_lowercase()
}

pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub fn serialize_indexset<T: Serialize, S: Serializer>(
    set: &IndexSet<T>,
    s: S,
) -> Result<S::Ok, S::Error> {
    let mut i = s.serialize_seq(Some(set.len()))?;
    for e in set {
        i.serialize_element(e)?;
    }
    i.end()
}

/// Rejects duplicate entries instead of silently merging them
pub fn deserialize_indexset<'de, T: Eq + Hash + DeserializeOwned, D: Deserializer<'de>>(
    d: D,
) -> Result<IndexSet<T>, D::Error> {
    struct IndexSetVisitor<TT: Eq + DeserializeOwned> {
        _marker: PhantomData<TT>,
    }

    impl<'de, TT: Eq + Hash + DeserializeOwned> Visitor<'de> for IndexSetVisitor<TT> {
        type Value = IndexSet<TT>;

        fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
            write!(formatter, "a sequence of unique values")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut set = IndexSet::new();
            while let Some(e) = seq.next_element()? {
                if !set.insert(e) {
                    return Err(serde::de::Error::custom("duplicate entry"));
                }
            }
            Ok(set)
        }
    }

    d.deserialize_seq(IndexSetVisitor::<T> {
        _marker: PhantomData,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_center_preserves_order() {
        assert!(zero_center(-1) < zero_center(0));
        assert!(zero_center(17) < zero_center(18));
        assert_eq!(zero_center(i64::MIN), 0);
        assert_eq!(zero_center(i64::MAX), u64::MAX);
    }

    #[test]
    fn common_view() {
        assert_eq!(attr_common_view("First Name"), "firstname");
        assert_eq!(attr_common_view("age"), attr_common_view("AGE"));
    }

    #[test]
    fn random_decimal_is_bounded() {
        for _ in 0..20 {
            let n = random_decimal(80, rand::thread_rng());
            assert!(n.chars().all(|c| c.is_ascii_digit()));
            let v = n.parse::<u128>().unwrap();
            assert!(v < 1u128 << 80);
        }
    }
}
