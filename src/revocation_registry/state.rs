use super::{
    registry_element, RevocationRegistryDefinition, RevocationStatusList, TailsReader,
};
use crate::error::Error;
use crate::knox::accumulator::vb20::{Accumulator, MembershipWitness, Polynomial};
use crate::AnonCredsResult;
use blsful::inner_types::{G1Projective, Scalar};
use serde::{Deserialize, Serialize};

/// A holder's membership witness for one registry index at a timestamp
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationState {
    /// The VB20 membership witness
    pub witness: MembershipWitness,
    /// The accumulator the witness is valid for
    pub accumulator: Accumulator,
    /// The registry index
    pub rev_reg_index: u32,
    /// The timestamp of the status list the state was computed from
    pub timestamp: u64,
}

impl RevocationState {
    /// Check the witness proves membership of the index
    pub fn verify(&self, rev_reg_def: &RevocationRegistryDefinition) -> bool {
        match rev_reg_def.element(self.rev_reg_index) {
            Ok(y) => self
                .witness
                .verify(y, rev_reg_def.value.public_keys.accum_key, self.accumulator),
            Err(_) => false,
        }
    }

    /// Compute the state for `index` from `list`, advancing `prev_state` when the
    /// list directly succeeds it and falling back to the tails otherwise
    pub(crate) fn create_or_update(
        rev_reg_def: &RevocationRegistryDefinition,
        list: &RevocationStatusList,
        index: u32,
        tails: &mut dyn TailsReader,
        prev_state: Option<&RevocationState>,
        prev_list: Option<&RevocationStatusList>,
    ) -> AnonCredsResult<Self> {
        rev_reg_def.check_index(index)?;
        if list.len() != rev_reg_def.max_cred_num() as usize {
            return Err(Error::input(
                "status list does not match the registry definition",
            ));
        }
        if let Some(prev) = prev_state {
            if prev.rev_reg_index != index {
                return Err(Error::input(format!(
                    "previous state is for index {}, not {}",
                    prev.rev_reg_index, index
                )));
            }
            if prev.timestamp > list.timestamp() {
                return Err(Error::input(format!(
                    "previous state at {} is newer than the status list at {}",
                    prev.timestamp,
                    list.timestamp()
                )));
            }
            if let Some(state) = Self::advance(rev_reg_def, list, prev, prev_list) {
                return Ok(state);
            }
            log::debug!(
                "cannot advance witness of index {} incrementally, recomputing from tails",
                index
            );
        }
        Self::from_tails(rev_reg_def, list, index, tails)
    }

    fn advance(
        rev_reg_def: &RevocationRegistryDefinition,
        list: &RevocationStatusList,
        prev: &RevocationState,
        prev_list: Option<&RevocationStatusList>,
    ) -> Option<Self> {
        if list.is_revoked(prev.rev_reg_index) != Some(false) {
            return None;
        }
        if prev.accumulator == list.accumulator() {
            return Some(Self {
                timestamp: list.timestamp(),
                ..*prev
            });
        }
        let update = list.last_update()?;
        if update.prev_accumulator != prev.accumulator {
            return None;
        }
        if let Some(p) = prev_list {
            if p.accumulator() != prev.accumulator || p.rev_reg_def_id() != list.rev_reg_def_id() {
                return None;
            }
        }
        let y = rev_reg_def.element(prev.rev_reg_index).ok()?;
        let additions = update
            .issued
            .iter()
            .map(|&i| rev_reg_def.element(i))
            .collect::<AnonCredsResult<Vec<_>>>()
            .ok()?;
        let deletions = update
            .revoked
            .iter()
            .map(|&i| rev_reg_def.element(i))
            .collect::<AnonCredsResult<Vec<_>>>()
            .ok()?;
        let mut witness = prev.witness;
        witness
            .batch_update_assign(y, &additions, &deletions, &update.coefficients)
            .ok()?;
        let state = Self {
            witness,
            accumulator: list.accumulator(),
            rev_reg_index: prev.rev_reg_index,
            timestamp: list.timestamp(),
        };
        state.verify(rev_reg_def).then_some(state)
    }

    /// The witness is `∏ (y_j + α)·P` over the other active indices, expanded
    /// against the tails `α^k·P`. A revoked index yields a state that fails to verify
    fn from_tails(
        rev_reg_def: &RevocationRegistryDefinition,
        list: &RevocationStatusList,
        index: u32,
        tails: &mut dyn TailsReader,
    ) -> AnonCredsResult<Self> {
        let hash = tails.hash()?;
        if hash != rev_reg_def.value.tails_hash {
            return Err(Error::IOError(format!(
                "tails hash {} does not match the registry definition",
                hash
            )));
        }
        let accum_key = &rev_reg_def.value.public_keys.accum_key;
        let roots = list
            .active_indices()
            .filter(|&j| j != index)
            .map(|j| registry_element(accum_key, j).0)
            .collect::<Vec<Scalar>>();
        let poly = Polynomial::from_roots_shifted(roots);
        let points = tails.read(poly.len())?;
        let witness = poly
            .0
            .iter()
            .zip(points.iter())
            .fold(G1Projective::IDENTITY, |acc, (c, p)| acc + *p * *c);
        Ok(Self {
            witness: MembershipWitness(witness),
            accumulator: list.accumulator(),
            rev_reg_index: index,
            timestamp: list.timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::registry;
    use super::super::TailsFileReader;
    use super::*;
    use crate::error::ErrorKind;
    use maplit::btreeset;

    #[test]
    fn witness_from_tails() {
        let (def, private, _dir) = registry(6);
        let list =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), true, Some(1))
                .unwrap();
        let mut tails = TailsFileReader::new(&def.value.tails_location);
        let state = RevocationState::create_or_update(&def, &list, 3, &mut tails, None, None).unwrap();
        assert!(state.verify(&def));
        let expected =
            MembershipWitness::new(def.element(3).unwrap(), list.accumulator(), &private.value)
                .unwrap();
        assert_eq!(state.witness, expected);

        let err = RevocationState::create_or_update(&def, &list, 6, &mut tails, None, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUserRevocId);
    }

    #[test]
    fn revoked_index_does_not_verify() {
        let (def, private, _dir) = registry(4);
        let list =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), true, Some(1))
                .unwrap()
                .apply(&def, &private, &btreeset! {}, &btreeset! {2}, Some(2))
                .unwrap();
        let mut tails = TailsFileReader::new(&def.value.tails_location);
        let state = RevocationState::create_or_update(&def, &list, 2, &mut tails, None, None).unwrap();
        assert!(!state.verify(&def));
        let state = RevocationState::create_or_update(&def, &list, 1, &mut tails, None, None).unwrap();
        assert!(state.verify(&def));
    }

    #[test]
    fn incremental_update_matches_tails() {
        let (def, private, _dir) = registry(8);
        let first =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), false, Some(1))
                .unwrap()
                .apply(&def, &private, &btreeset! {0, 1, 2, 3}, &btreeset! {}, Some(2))
                .unwrap();
        let mut tails = TailsFileReader::new(&def.value.tails_location);
        let state = RevocationState::create_or_update(&def, &first, 1, &mut tails, None, None).unwrap();
        assert!(state.verify(&def));

        let second = first
            .apply(&def, &private, &btreeset! {5, 6}, &btreeset! {0, 3}, Some(3))
            .unwrap();
        // no tails are needed for a direct successor
        let mut missing = TailsFileReader::new("/nonexistent/anoncreds/tails");
        let advanced = RevocationState::create_or_update(
            &def,
            &second,
            1,
            &mut missing,
            Some(&state),
            Some(&first),
        )
        .unwrap();
        assert!(advanced.verify(&def));
        assert_eq!(advanced.timestamp, 3);
        let recomputed =
            RevocationState::create_or_update(&def, &second, 1, &mut tails, None, None).unwrap();
        assert_eq!(advanced.witness, recomputed.witness);

        let stale = RevocationState::create_or_update(&def, &first, 1, &mut tails, Some(&advanced), None)
            .unwrap_err();
        assert_eq!(stale.kind(), ErrorKind::Input);
    }

    #[test]
    fn unchanged_accumulator_keeps_witness() {
        let (def, private, _dir) = registry(3);
        let list =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), true, Some(1))
                .unwrap();
        let mut tails = TailsFileReader::new(&def.value.tails_location);
        let state = RevocationState::create_or_update(&def, &list, 0, &mut tails, None, None).unwrap();
        let later = list.with_timestamp(50);
        let mut missing = TailsFileReader::new("/nonexistent/anoncreds/tails");
        let next =
            RevocationState::create_or_update(&def, &later, 0, &mut missing, Some(&state), None)
                .unwrap();
        assert_eq!(next.witness, state.witness);
        assert_eq!(next.timestamp, 50);
    }

    #[test]
    fn missing_tails() {
        let (def, private, _dir) = registry(2);
        let list =
            RevocationStatusList::create(None, &def, &private, def.issuer_id.clone(), true, Some(1))
                .unwrap();
        let mut missing = TailsFileReader::new("/nonexistent/anoncreds/tails");
        let err = RevocationState::create_or_update(&def, &list, 0, &mut missing, None, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IOError);
    }
}
