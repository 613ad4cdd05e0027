use super::RevocationStatusList;
use crate::error::Error;
use crate::knox::accumulator::vb20::Accumulator;
use crate::AnonCredsResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The difference between two status lists of a registry
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDelta {
    /// The accumulator the delta applies to, `None` from the registry's start
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prev_accum: Option<Accumulator>,
    /// The accumulator after the delta
    pub accum: Accumulator,
    /// Indices that became active
    pub issued: BTreeSet<u32>,
    /// Indices that became revoked
    pub revoked: BTreeSet<u32>,
}

impl RevocationRegistryDelta {
    /// The changes from `from`, or from the registry's start, to `to`
    pub fn from_status_lists(
        from: Option<&RevocationStatusList>,
        to: &RevocationStatusList,
    ) -> AnonCredsResult<Self> {
        let Some(from) = from else {
            let issued = to.active_indices().collect();
            let revoked = if to.issuance_by_default() {
                to.revocation_list().iter_ones().map(|i| i as u32).collect()
            } else {
                BTreeSet::new()
            };
            return Ok(Self {
                prev_accum: None,
                accum: to.accumulator(),
                issued,
                revoked,
            });
        };
        if from.rev_reg_def_id() != to.rev_reg_def_id() || from.len() != to.len() {
            return Err(Error::input(
                "status lists belong to different registries",
            ));
        }
        if from.timestamp() > to.timestamp() {
            return Err(Error::input("status lists are out of order"));
        }
        let mut issued = BTreeSet::new();
        let mut revoked = BTreeSet::new();
        for (i, (a, b)) in from
            .revocation_list()
            .iter()
            .zip(to.revocation_list().iter())
            .enumerate()
        {
            match (*a, *b) {
                (true, false) => {
                    issued.insert(i as u32);
                }
                (false, true) => {
                    revoked.insert(i as u32);
                }
                _ => {}
            }
        }
        Ok(Self {
            prev_accum: Some(from.accumulator()),
            accum: to.accumulator(),
            issued,
            revoked,
        })
    }

    /// Append `other`, which must start where this delta ends
    pub fn merge(&mut self, other: &RevocationRegistryDelta) -> AnonCredsResult<()> {
        if other.prev_accum != Some(self.accum) {
            return Err(Error::InvalidState(
                "deltas do not share an accumulator state".into(),
            ));
        }
        for i in &other.revoked {
            if !self.issued.remove(i) {
                self.revoked.insert(*i);
            }
        }
        for i in &other.issued {
            if !self.revoked.remove(i) {
                self.issued.insert(*i);
            }
        }
        self.accum = other.accum;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::registry;
    use super::*;
    use crate::error::ErrorKind;
    use maplit::btreeset;

    #[test]
    fn delta_between_lists() {
        let (def, private, _dir) = registry(5);
        let l0 =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), false, Some(1))
                .unwrap();
        let l1 = l0
            .apply(&def, &private, &btreeset! {0, 1, 2}, &btreeset! {}, Some(2))
            .unwrap();
        let l2 = l1
            .apply(&def, &private, &btreeset! {3}, &btreeset! {1}, Some(3))
            .unwrap();

        let d1 = RevocationRegistryDelta::from_status_lists(Some(&l0), &l1).unwrap();
        assert_eq!(d1.issued, btreeset! {0, 1, 2});
        let d2 = RevocationRegistryDelta::from_status_lists(Some(&l1), &l2).unwrap();
        assert_eq!(d2.issued, btreeset! {3});
        assert_eq!(d2.revoked, btreeset! {1});

        let mut merged = d1.clone();
        merged.merge(&d2).unwrap();
        assert_eq!(merged.issued, btreeset! {0, 2, 3});
        assert!(merged.revoked.is_empty());
        assert_eq!(merged.accum, l2.accumulator());
        assert_eq!(
            merged,
            RevocationRegistryDelta::from_status_lists(Some(&l0), &l2).unwrap()
        );

        let full = RevocationRegistryDelta::from_status_lists(None, &l2).unwrap();
        assert_eq!(full.prev_accum, None);
        assert_eq!(full.issued, btreeset! {0, 2, 3});
    }

    #[test]
    fn divergent_merge() {
        let (def, private, _dir) = registry(3);
        let l0 =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), true, Some(1))
                .unwrap();
        let l1 = l0
            .apply(&def, &private, &btreeset! {}, &btreeset! {0}, Some(2))
            .unwrap();
        let l2 = l0
            .apply(&def, &private, &btreeset! {}, &btreeset! {1}, Some(2))
            .unwrap();
        let mut a = RevocationRegistryDelta::from_status_lists(Some(&l0), &l1).unwrap();
        let b = RevocationRegistryDelta::from_status_lists(Some(&l0), &l2).unwrap();
        assert_eq!(a.merge(&b).unwrap_err().kind(), ErrorKind::InvalidState);
    }
}
