use crate::credential::Credential;
use crate::error::Error;
use crate::revocation_registry::RevocationState;
use crate::AnonCredsResult;
use std::collections::{BTreeMap, HashSet};

/// The credentials a holder presents, each with the referents it answers
#[derive(Debug, Default)]
pub struct PresentCredentials<'p>(pub(crate) Vec<PresentCredential<'p>>);

impl<'p> PresentCredentials<'p> {
    /// Present `cred`. A revocable credential proving non-revocation needs
    /// the status list `timestamp` and the matching `rev_state`
    pub fn add_credential(
        &mut self,
        cred: &'p Credential,
        timestamp: Option<u64>,
        rev_state: Option<&'p RevocationState>,
    ) -> AddCredential<'_, 'p> {
        let idx = self.0.len();
        self.0.push(PresentCredential {
            cred,
            timestamp,
            rev_state,
            requested_attributes: BTreeMap::new(),
            requested_predicates: Vec::new(),
        });
        AddCredential {
            present: &mut self.0[idx],
        }
    }

    /// No credential answers a referent
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(PresentCredential::is_empty)
    }

    /// The number of credentials answering at least one referent
    pub fn len(&self) -> usize {
        self.0.iter().filter(|p| !p.is_empty()).count()
    }

    /// Every referent is answered once
    pub fn validate(&self) -> AnonCredsResult<()> {
        let mut attr_refs = HashSet::new();
        let mut pred_refs = HashSet::new();
        for present in &self.0 {
            for referent in present.requested_attributes.keys() {
                if !attr_refs.insert(referent.as_str()) {
                    return Err(Error::input(format!(
                        "attribute referent '{}' is answered by more than one credential",
                        referent
                    )));
                }
            }
            for referent in &present.requested_predicates {
                if !pred_refs.insert(referent.as_str()) {
                    return Err(Error::input(format!(
                        "predicate referent '{}' is answered by more than one credential",
                        referent
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct PresentCredential<'p> {
    pub cred: &'p Credential,
    pub timestamp: Option<u64>,
    pub rev_state: Option<&'p RevocationState>,
    /// Referent to whether it is revealed
    pub requested_attributes: BTreeMap<String, bool>,
    pub requested_predicates: Vec<String>,
}

impl PresentCredential<'_> {
    pub fn is_empty(&self) -> bool {
        self.requested_attributes.is_empty() && self.requested_predicates.is_empty()
    }
}

/// Assigns referents to a presented credential
#[derive(Debug)]
pub struct AddCredential<'a, 'p> {
    present: &'a mut PresentCredential<'p>,
}

impl AddCredential<'_, '_> {
    /// Answer an attribute referent, revealing its value or proving it is known
    pub fn add_requested_attribute(&mut self, referent: impl Into<String>, revealed: bool) {
        self.present
            .requested_attributes
            .insert(referent.into(), revealed);
    }

    /// Answer a predicate referent
    pub fn add_requested_predicate(&mut self, referent: impl Into<String>) {
        self.present.requested_predicates.push(referent.into());
    }
}
