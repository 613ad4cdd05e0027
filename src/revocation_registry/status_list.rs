use super::{RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate};
use crate::error::Error;
use crate::identifiers::{IssuerId, RevocationRegistryDefinitionId};
use crate::knox::accumulator::vb20::{Accumulator, Coefficient, Element};
use crate::utils::now_timestamp;
use crate::AnonCredsResult;
use bitvec::{slice::BitSlice, vec::BitVec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The accumulator change published with a status list, letting holders
/// advance a witness from the previous list without the tails
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationStatusListUpdate {
    /// The accumulator of the preceding list
    pub prev_accumulator: Accumulator,
    /// Indices added to the accumulator, ascending
    pub issued: Vec<u32>,
    /// Indices removed from the accumulator, ascending
    pub revoked: Vec<u32>,
    /// VB20 batch update coefficients
    pub coefficients: Vec<Coefficient>,
}

/// A snapshot of a registry at a timestamp.
///
/// Bit `i` of the revocation list is set when index `i` is revoked or was never
/// issued. Updates produce a new list, the previous one stays valid for the
/// timestamps it was published at. Accumulator updates do not commute so a
/// registry must have a single writer.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationStatusList {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub(crate) rev_reg_def_id: Option<RevocationRegistryDefinitionId>,
    pub(crate) issuer_id: IssuerId,
    #[serde(with = "serde_revocation_list")]
    pub(crate) revocation_list: BitVec,
    #[serde(default)]
    pub(crate) issuance_by_default: bool,
    #[serde(rename = "currentAccumulator")]
    pub(crate) accumulator: Accumulator,
    pub(crate) timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub(crate) update: Option<RevocationStatusListUpdate>,
}

impl RevocationStatusList {
    pub(crate) fn create(
        rev_reg_def_id: Option<RevocationRegistryDefinitionId>,
        rev_reg_def: &RevocationRegistryDefinition,
        rev_reg_private: &RevocationRegistryDefinitionPrivate,
        issuer_id: IssuerId,
        issuance_by_default: bool,
        timestamp: Option<u64>,
    ) -> AnonCredsResult<Self> {
        if issuer_id != rev_reg_def.issuer_id {
            return Err(Error::input(format!(
                "issuer id '{}' does not own the revocation registry of '{}'",
                issuer_id, rev_reg_def.issuer_id
            )));
        }
        let max_cred_num = rev_reg_def.max_cred_num() as usize;
        let (revocation_list, accumulator) = if issuance_by_default {
            let elements = rev_reg_def.elements();
            (
                BitVec::repeat(false, max_cred_num),
                Accumulator::with_elements(&rev_reg_private.value, &elements),
            )
        } else {
            (BitVec::repeat(true, max_cred_num), Accumulator::default())
        };
        Ok(Self {
            rev_reg_def_id,
            issuer_id,
            revocation_list,
            issuance_by_default,
            accumulator,
            timestamp: timestamp.unwrap_or_else(now_timestamp),
            update: None,
        })
    }

    /// Apply `issued` and `revoked` to a copy of this list
    pub(crate) fn apply(
        &self,
        rev_reg_def: &RevocationRegistryDefinition,
        rev_reg_private: &RevocationRegistryDefinitionPrivate,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
        timestamp: Option<u64>,
    ) -> AnonCredsResult<Self> {
        let timestamp = timestamp.unwrap_or_else(now_timestamp);
        if timestamp < self.timestamp {
            return Err(Error::input(format!(
                "timestamp {} precedes the previous list at {}",
                timestamp, self.timestamp
            )));
        }
        if rev_reg_def.max_cred_num() as usize != self.revocation_list.len() {
            return Err(Error::input(
                "status list does not match the registry definition",
            ));
        }
        for &i in issued.iter().chain(revoked.iter()) {
            rev_reg_def.check_index(i)?;
        }
        if let Some(i) = issued.intersection(revoked).next() {
            return Err(Error::input(format!(
                "index {} is both issued and revoked",
                i
            )));
        }

        let mut next = self.clone();
        let mut added = Vec::new();
        let mut removed = Vec::new();
        for &i in issued {
            if self.revocation_list[i as usize] {
                next.revocation_list.set(i as usize, false);
                added.push(i);
            }
        }
        for &i in revoked {
            if !self.revocation_list[i as usize] {
                next.revocation_list.set(i as usize, true);
                removed.push(i);
            }
        }
        let additions = elements_of(rev_reg_def, &added)?;
        let deletions = elements_of(rev_reg_def, &removed)?;
        let coefficients = next
            .accumulator
            .update_assign(&rev_reg_private.value, &additions, &deletions)
            .ok_or_else(|| Error::unexpected("accumulator update failed"))?;
        next.timestamp = timestamp;
        next.update = Some(RevocationStatusListUpdate {
            prev_accumulator: self.accumulator,
            issued: added,
            revoked: removed,
            coefficients,
        });
        Ok(next)
    }

    /// A copy published at another timestamp, bits and accumulator unchanged
    pub(crate) fn with_timestamp(&self, timestamp: u64) -> Self {
        let mut next = self.clone();
        next.timestamp = timestamp;
        next
    }

    /// The registry this list belongs to
    pub fn rev_reg_def_id(&self) -> Option<&RevocationRegistryDefinitionId> {
        self.rev_reg_def_id.as_ref()
    }

    /// The issuer that published the list
    pub fn issuer_id(&self) -> &IssuerId {
        &self.issuer_id
    }

    /// When the list was published
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The accumulator value
    pub fn accumulator(&self) -> Accumulator {
        self.accumulator
    }

    /// Whether the registry was created with every index issued
    pub fn issuance_by_default(&self) -> bool {
        self.issuance_by_default
    }

    /// The raw bits
    pub fn revocation_list(&self) -> &BitSlice {
        &self.revocation_list
    }

    /// The number of indices
    pub fn len(&self) -> usize {
        self.revocation_list.len()
    }

    /// The list has no indices
    pub fn is_empty(&self) -> bool {
        self.revocation_list.is_empty()
    }

    /// `None` when the index is out of range
    pub fn is_revoked(&self, index: u32) -> Option<bool> {
        self.revocation_list.get(index as usize).map(|b| *b)
    }

    /// The indices currently in the accumulator
    pub fn active_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.revocation_list.iter_zeros().map(|i| i as u32)
    }

    /// The update that produced this list, if any
    pub fn last_update(&self) -> Option<&RevocationStatusListUpdate> {
        self.update.as_ref()
    }
}

fn elements_of(def: &RevocationRegistryDefinition, indices: &[u32]) -> AnonCredsResult<Vec<Element>> {
    indices.iter().map(|&i| def.element(i)).collect()
}

pub(crate) mod serde_revocation_list {
    use bitvec::vec::BitVec;
    use serde::{
        de::{Deserializer, Error as DeError, SeqAccess, Visitor},
        ser::{SerializeSeq, Serializer},
    };
    use std::fmt::{self, Formatter};

    pub fn serialize<S>(state: &BitVec, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = s.serialize_seq(Some(state.len()))?;
        for bit in state.iter() {
            seq.serialize_element(&u8::from(*bit))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RevocationListVisitor;

        impl<'de> Visitor<'de> for RevocationListVisitor {
            type Value = BitVec;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                write!(formatter, "a sequence of revocation bits, i.e. [1, 0, 1]")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut bits = BitVec::with_capacity(seq.size_hint().unwrap_or_default());
                while let Some(bit) = seq.next_element::<u8>()? {
                    match bit {
                        0 => bits.push(false),
                        1 => bits.push(true),
                        _ => return Err(A::Error::custom("invalid revocation bit")),
                    }
                }
                Ok(bits)
            }
        }

        deserializer.deserialize_seq(RevocationListVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::registry;
    use super::*;
    use maplit::btreeset;

    #[test]
    fn by_default_and_on_demand() {
        let (def, private, _dir) = registry(4);
        let issuer_id = def.issuer_id.clone();
        let list =
            RevocationStatusList::create(None, &def, &private, issuer_id.clone(), true, Some(1))
                .unwrap();
        assert_eq!(list.active_indices().count(), 4);
        assert_eq!(
            list.accumulator(),
            Accumulator::with_elements(&private.value, &def.elements())
        );

        let list = RevocationStatusList::create(None, &def, &private, issuer_id, false, Some(1))
            .unwrap();
        assert_eq!(list.active_indices().count(), 0);
        assert_eq!(list.accumulator(), Accumulator::default());
        assert_eq!(list.is_revoked(3), Some(true));
        assert_eq!(list.is_revoked(4), None);
    }

    #[test]
    fn wrong_issuer() {
        let (def, private, _dir) = registry(2);
        let other = IssuerId::new("did:example:other").unwrap();
        let err = RevocationStatusList::create(None, &def, &private, other, true, None).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
    }

    #[test]
    fn apply_updates_bits_and_accumulator() {
        let (def, private, _dir) = registry(5);
        let list =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), false, Some(10))
                .unwrap();
        let next = list
            .apply(&def, &private, &btreeset! {0, 2, 4}, &btreeset! {}, Some(11))
            .unwrap();
        assert_eq!(next.active_indices().collect::<Vec<_>>(), vec![0, 2, 4]);
        let elements = [def.element(0).unwrap(), def.element(2).unwrap(), def.element(4).unwrap()];
        assert_eq!(
            next.accumulator(),
            Accumulator::with_elements(&private.value, &elements)
        );
        // untouched
        assert_eq!(list.active_indices().count(), 0);

        let again = next
            .apply(&def, &private, &btreeset! {0}, &btreeset! {2}, Some(12))
            .unwrap();
        let update = again.last_update().unwrap();
        assert!(update.issued.is_empty());
        assert_eq!(update.revoked, vec![2]);
        assert_eq!(update.prev_accumulator, next.accumulator());
    }

    #[test]
    fn apply_rejects_bad_input() {
        let (def, private, _dir) = registry(3);
        let list =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), true, Some(10))
                .unwrap();
        let err = list
            .apply(&def, &private, &btreeset! {}, &btreeset! {1}, Some(9))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
        let err = list
            .apply(&def, &private, &btreeset! {}, &btreeset! {3}, Some(10))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidUserRevocId);
        let err = list
            .apply(&def, &private, &btreeset! {1}, &btreeset! {1}, Some(10))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
    }

    #[test]
    fn serialized_bits() {
        let (def, private, _dir) = registry(3);
        let list =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), false, Some(7))
                .unwrap()
                .apply(&def, &private, &btreeset! {1}, &btreeset! {}, Some(8))
                .unwrap();
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["revocationList"], serde_json::json!([1, 0, 1]));
        assert_eq!(json["timestamp"], 8);
        let back: RevocationStatusList = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, list);

        let mut bad = json;
        bad["revocationList"] = serde_json::json!([1, 2, 1]);
        assert!(serde_json::from_value::<RevocationStatusList>(bad).is_err());
    }

    #[test]
    fn timestamp_only() {
        let (def, private, _dir) = registry(2);
        let list =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), true, Some(5))
                .unwrap();
        let later = list.with_timestamp(9);
        assert_eq!(later.revocation_list(), list.revocation_list());
        assert_eq!(later.accumulator(), list.accumulator());
        assert_eq!(later.timestamp(), 9);
    }
}
