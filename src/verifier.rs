mod commitment;
mod range;
mod revocation;
mod signature;

use commitment::CommitmentVerifier;
use range::RangeProofVerifier;
use revocation::RevocationVerifier;
use signature::SignatureVerifier;

use crate::cred_def::CredentialDefinition;
use crate::credential::encoded_to_scalar;
use crate::error::Error;
use crate::identifiers::{CredentialDefinitionId, RevocationRegistryDefinitionId, SchemaId};
use crate::knox::ecc_group::ScalarOps;
use crate::nonce::Nonce;
use crate::presentation::{
    Identifier, PedersenGenerators, Presentation, RequestedProof, SubProof,
    PRESENTATION_TRANSCRIPT,
};
use crate::presentation_request::{PresentationRequest, Query, RestrictionContext};
use crate::revocation_registry::{RevocationRegistryDefinition, RevocationStatusList};
use crate::schema::Schema;
use crate::utils::attr_common_view;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use log::{debug, warn};
use merlin::Transcript;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A trait for indication of proof verifier logic
pub(crate) trait ProofVerifier {
    /// Recompute the challenge contribution
    fn add_challenge_contribution(
        &self,
        challenge: Scalar,
        transcript: &mut Transcript,
    ) -> AnonCredsResult<()>;
    /// Verify any additional proof material
    fn verify(&self, challenge: Scalar) -> AnonCredsResult<()>;
}

pub(crate) enum ProofVerifiers<'a> {
    Signature(SignatureVerifier<'a>),
    Commitment(CommitmentVerifier<'a>),
    Range(RangeProofVerifier<'a>),
    Revocation(RevocationVerifier<'a>),
}

impl ProofVerifier for ProofVerifiers<'_> {
    fn add_challenge_contribution(
        &self,
        challenge: Scalar,
        transcript: &mut Transcript,
    ) -> AnonCredsResult<()> {
        match self {
            Self::Signature(s) => s.add_challenge_contribution(challenge, transcript),
            Self::Commitment(c) => c.add_challenge_contribution(challenge, transcript),
            Self::Range(r) => r.add_challenge_contribution(challenge, transcript),
            Self::Revocation(r) => r.add_challenge_contribution(challenge, transcript),
        }
    }

    fn verify(&self, challenge: Scalar) -> AnonCredsResult<()> {
        match self {
            Self::Signature(s) => s.verify(challenge),
            Self::Commitment(c) => c.verify(challenge),
            Self::Range(r) => r.verify(challenge),
            Self::Revocation(r) => r.verify(challenge),
        }
    }
}

/// Why a presentation does not satisfy its request
enum Failure {
    /// Well formed but not what was requested
    Unsatisfied(String),
    /// Missing inputs or a cryptographically invalid proof
    Error(Error),
}

impl From<Error> for Failure {
    fn from(e: Error) -> Self {
        Self::Error(e)
    }
}

macro_rules! unsatisfied {
    ($($arg:tt)+) => {
        return Err(Failure::Unsatisfied(format!($($arg)+)))
    };
}

/// Verifier operations
pub struct Verifier;

impl Verifier {
    /// A fresh nonce for a presentation request
    pub fn generate_nonce() -> Nonce {
        Nonce::new()
    }

    /// Check `presentation` answers `pres_req`.
    ///
    /// Returns `Ok(false)` when the presentation is well formed but does not
    /// satisfy the request: wrong nonce, missing or mistyped referents,
    /// predicates or restrictions that differ from the request, and
    /// non-revocation timestamps outside the requested interval or without a
    /// supplied status list. Returns [`Error::ProofRejected`] when the proof
    /// itself is invalid and [`Error::Input`] when a referenced schema,
    /// credential definition or registry definition is not supplied.
    ///
    /// `nonrevoke_interval_override` maps a registry and a requested `from`
    /// to an earlier `from` the verifier accepts.
    pub fn verify_presentation(
        presentation: &Presentation,
        pres_req: &PresentationRequest,
        schemas: &HashMap<SchemaId, &Schema>,
        cred_defs: &HashMap<CredentialDefinitionId, &CredentialDefinition>,
        rev_reg_defs: Option<&HashMap<RevocationRegistryDefinitionId, &RevocationRegistryDefinition>>,
        rev_status_lists: Option<Vec<&RevocationStatusList>>,
        nonrevoke_interval_override: Option<
            &HashMap<RevocationRegistryDefinitionId, HashMap<u64, u64>>,
        >,
    ) -> AnonCredsResult<bool> {
        debug!(
            "verifying presentation of {} sub proofs for '{}'",
            presentation.proof.proofs.len(),
            pres_req.name
        );
        let ledger = Ledger {
            schemas,
            cred_defs,
            rev_reg_defs,
            rev_status_lists: rev_status_lists.unwrap_or_default(),
            overrides: nonrevoke_interval_override,
        };
        match ledger.verify(presentation, pres_req) {
            Ok(()) => Ok(true),
            Err(Failure::Unsatisfied(reason)) => {
                warn!("presentation does not satisfy '{}': {}", pres_req.name, reason);
                Ok(false)
            }
            Err(Failure::Error(e)) => {
                warn!("presentation for '{}' is invalid: {}", pres_req.name, e);
                Err(e)
            }
        }
    }
}

/// The public objects a presentation is checked against
struct Ledger<'a> {
    schemas: &'a HashMap<SchemaId, &'a Schema>,
    cred_defs: &'a HashMap<CredentialDefinitionId, &'a CredentialDefinition>,
    rev_reg_defs: Option<&'a HashMap<RevocationRegistryDefinitionId, &'a RevocationRegistryDefinition>>,
    rev_status_lists: Vec<&'a RevocationStatusList>,
    overrides: Option<&'a HashMap<RevocationRegistryDefinitionId, HashMap<u64, u64>>>,
}

/// The referents one sub proof answers
#[derive(Default)]
struct SubProofReferents<'r> {
    revealed: Vec<&'r str>,
    groups: Vec<&'r str>,
    unrevealed: Vec<&'r str>,
    predicates: Vec<&'r str>,
}

impl<'r> SubProofReferents<'r> {
    fn attributes(&self) -> impl Iterator<Item = &'r str> + '_ {
        self.revealed
            .iter()
            .chain(&self.groups)
            .chain(&self.unrevealed)
            .copied()
    }
}

/// The registry objects a non-revocation proof is checked against
struct RevocationContext<'a> {
    rev_reg_id: &'a RevocationRegistryDefinitionId,
    rev_reg_def: &'a RevocationRegistryDefinition,
    status_list: &'a RevocationStatusList,
}

impl<'a> Ledger<'a> {
    fn verify(&self, presentation: &Presentation, pres_req: &PresentationRequest) -> Result<(), Failure> {
        pres_req.validate()?;
        if presentation.nonce != pres_req.nonce {
            unsatisfied!(
                "nonce '{}' does not match the request",
                presentation.nonce.as_str()
            );
        }
        let proofs = &presentation.proof.proofs;
        if proofs.len() != presentation.identifiers.len() {
            return Err(Error::rejected("sub proofs and identifiers differ in number").into());
        }

        let referents = check_requested_proof(pres_req, &presentation.requested_proof, proofs.len())?;

        let mut transcript = Transcript::new(PRESENTATION_TRANSCRIPT);
        transcript.append_message(b"nonce", pres_req.nonce.as_str().as_bytes());
        let challenge = presentation.proof.challenge;
        let generators = PedersenGenerators::new();
        let mut verifiers = Vec::new();
        let mut link_secret_response = None;

        for ((sub_proof, identifier), referents) in
            proofs.iter().zip(&presentation.identifiers).zip(&referents)
        {
            let cred_def = self.check_sub_proof(
                pres_req,
                &presentation.requested_proof,
                sub_proof,
                identifier,
                referents,
            )?;
            let revocation = self.revocation_context(pres_req, sub_proof, identifier, cred_def, referents)?;

            let signature = SignatureVerifier::new(
                &cred_def.value.primary,
                &sub_proof.signature,
                revealed_messages(sub_proof, cred_def)?,
            );
            let hidden = signature.hidden_responses()?;
            let response = |index: usize| {
                hidden.get(&index).copied().ok_or_else(|| {
                    Error::rejected(format!("message {} is not hidden in the signature proof", index))
                })
            };

            let link_secret = response(CredentialDefinition::LINK_SECRET_INDEX)?;
            match link_secret_response {
                None => link_secret_response = Some(link_secret),
                Some(r) if r != link_secret => {
                    return Err(Error::rejected("sub proofs use different link secrets").into())
                }
                Some(_) => {}
            }

            let mut sub_verifiers = Vec::with_capacity(2 * sub_proof.predicates.len() + 1);
            for predicate in &sub_proof.predicates {
                let index = cred_def.attribute_index(&predicate.attr_name).ok_or_else(|| {
                    Error::rejected(format!("unknown predicate attribute '{}'", predicate.attr_name))
                })?;
                sub_verifiers.push(ProofVerifiers::Commitment(CommitmentVerifier {
                    attr_name: &predicate.attr_name,
                    generators,
                    proof: &predicate.commitment,
                    message_proof: response(index)?,
                }));
                let (lower, upper) = predicate.p_type.bounds(predicate.p_value);
                sub_verifiers.push(ProofVerifiers::Range(RangeProofVerifier {
                    generators,
                    proof: &predicate.range,
                    commitment: predicate.commitment.commitment,
                    lower,
                    upper,
                }));
            }
            if let (Some(proof), Some(ctx)) = (sub_proof.non_revocation.as_ref(), revocation) {
                let index = cred_def
                    .revocation_index()
                    .ok_or_else(|| Error::rejected("credential definition is not revocable"))?;
                sub_verifiers.push(ProofVerifiers::Revocation(RevocationVerifier::new(
                    proof,
                    ctx.rev_reg_def.value.public_keys.accum_key,
                    ctx.rev_reg_id,
                    ctx.status_list.accumulator(),
                    response(index)?,
                )));
            }

            verifiers.push(ProofVerifiers::Signature(signature));
            verifiers.extend(sub_verifiers);
        }

        for verifier in &verifiers {
            verifier.add_challenge_contribution(challenge, &mut transcript)?;
        }
        let expected = Scalar::from_transcript(b"challenge bytes", &mut transcript);
        if expected != challenge {
            return Err(Error::rejected("presentation challenge does not match").into());
        }
        for verifier in &verifiers {
            verifier.verify(challenge)?;
        }
        Ok(())
    }

    /// Check the request level facts of one sub proof, returning its credential definition
    fn check_sub_proof(
        &self,
        pres_req: &PresentationRequest,
        requested_proof: &RequestedProof,
        sub_proof: &SubProof,
        identifier: &Identifier,
        referents: &SubProofReferents<'_>,
    ) -> Result<&'a CredentialDefinition, Failure> {
        let schema = *self.schemas.get(&identifier.schema_id).ok_or_else(|| {
            Error::input(format!("schema '{}' is not provided", identifier.schema_id))
        })?;
        let cred_def = *self.cred_defs.get(&identifier.cred_def_id).ok_or_else(|| {
            Error::input(format!(
                "credential definition '{}' is not provided",
                identifier.cred_def_id
            ))
        })?;
        if cred_def.schema_id != identifier.schema_id {
            unsatisfied!(
                "credential definition '{}' is not for schema '{}'",
                identifier.cred_def_id,
                identifier.schema_id
            );
        }

        let mut attr_values = BTreeMap::new();
        for referent in &referents.revealed {
            let info = &requested_proof.revealed_attrs[*referent];
            let name = pres_req.requested_attributes[*referent].names()[0];
            check_revealed(sub_proof, cred_def, name, &info.encoded)?;
            attr_values.insert(attr_common_view(name), info.raw.as_str());
        }
        for referent in &referents.groups {
            let group = &requested_proof.revealed_attr_groups[*referent];
            for name in pres_req.requested_attributes[*referent].names() {
                let value = match group.values.get(name) {
                    Some(v) => v,
                    None => unsatisfied!("group '{}' does not reveal '{}'", referent, name),
                };
                check_revealed(sub_proof, cred_def, name, &value.encoded)?;
                attr_values.insert(attr_common_view(name), value.raw.as_str());
            }
        }
        for referent in &referents.unrevealed {
            let name = pres_req.requested_attributes[*referent].names()[0];
            if cred_def.attribute_index(name).is_none() {
                unsatisfied!("credential has no attribute '{}' for '{}'", name, referent);
            }
        }
        for referent in &referents.predicates {
            let info = &pres_req.requested_predicates[*referent];
            let canonical = canonical_name(cred_def, &info.name);
            let proven = sub_proof.predicates.iter().any(|p| {
                Some(p.attr_name.as_str()) == canonical
                    && p.p_type == info.p_type
                    && p.p_value == info.p_value
            });
            if !proven {
                unsatisfied!(
                    "predicate '{}' ({} {} {}) is not proven",
                    referent,
                    info.name,
                    info.p_type,
                    info.p_value
                );
            }
        }

        let ctx = RestrictionContext {
            schema_id: &identifier.schema_id,
            schema,
            cred_def_id: &identifier.cred_def_id,
            cred_def,
            rev_reg_id: identifier.rev_reg_id.as_ref(),
            attr_values,
        };
        let attr_restrictions = referents
            .attributes()
            .map(|r| (r, pres_req.requested_attributes[r].restrictions()));
        let pred_restrictions = referents
            .predicates
            .iter()
            .map(|r| (*r, pres_req.requested_predicates[*r].restrictions()));
        for (referent, restrictions) in attr_restrictions.chain(pred_restrictions) {
            if !restrictions_hold(restrictions, &ctx)? {
                unsatisfied!("restrictions of '{}' are not met", referent);
            }
        }
        Ok(cred_def)
    }

    /// Resolve the status list a non-revocation proof is checked against.
    /// `None` when non-revocation is not required and not proven
    fn revocation_context<'p>(
        &self,
        pres_req: &PresentationRequest,
        sub_proof: &SubProof,
        identifier: &'p Identifier,
        cred_def: &CredentialDefinition,
        referents: &SubProofReferents<'_>,
    ) -> Result<Option<RevocationContext<'p>>, Failure>
    where
        'a: 'p,
    {
        let interval = pres_req
            .strictest_interval(referents.attributes(), referents.predicates.iter().copied())
            .filter(|_| cred_def.supports_revocation());
        let mut interval = match (interval, sub_proof.non_revocation.is_some()) {
            (None, false) => {
                if identifier.timestamp.is_some() {
                    unsatisfied!("timestamp given for a proof without non-revocation");
                }
                return Ok(None);
            }
            (None, true) => unsatisfied!("non-revocation is proven but not requested"),
            (Some(_), false) => unsatisfied!(
                "non-revocation is requested but not proven for '{}'",
                identifier.cred_def_id
            ),
            (Some(interval), true) => interval,
        };
        let (rev_reg_id, timestamp) = match (&identifier.rev_reg_id, identifier.timestamp) {
            (Some(id), Some(ts)) => (id, ts),
            _ => unsatisfied!("non-revocation proof without a registry and timestamp"),
        };
        let rev_reg_def = self
            .rev_reg_defs
            .and_then(|defs| defs.get(rev_reg_id))
            .copied()
            .ok_or_else(|| {
                Error::input(format!(
                    "revocation registry definition '{}' is not provided",
                    rev_reg_id
                ))
            })?;
        if rev_reg_def.cred_def_id != identifier.cred_def_id {
            unsatisfied!(
                "revocation registry '{}' is not for '{}'",
                rev_reg_id,
                identifier.cred_def_id
            );
        }
        if let Some(overrides) = self.overrides.and_then(|o| o.get(rev_reg_id)) {
            interval.update_with_override(overrides);
        }
        if !interval.is_valid(timestamp) {
            unsatisfied!(
                "timestamp {} of '{}' is outside {:?}..{:?}",
                timestamp,
                rev_reg_id,
                interval.from,
                interval.to
            );
        }
        let status_list = match self
            .rev_status_lists
            .iter()
            .find(|l| l.rev_reg_def_id() == Some(rev_reg_id) && l.timestamp() == timestamp)
        {
            Some(l) => *l,
            None => unsatisfied!(
                "no status list of '{}' at timestamp {}",
                rev_reg_id,
                timestamp
            ),
        };
        Ok(Some(RevocationContext {
            rev_reg_id,
            rev_reg_def,
            status_list,
        }))
    }
}

/// Check every referent is answered once with the kind it was requested as,
/// grouping the referents by sub proof
fn check_requested_proof<'r>(
    pres_req: &'r PresentationRequest,
    requested_proof: &'r RequestedProof,
    sub_proofs: usize,
) -> Result<Vec<SubProofReferents<'r>>, Failure> {
    let mut referents = Vec::with_capacity(sub_proofs);
    referents.resize_with(sub_proofs, SubProofReferents::default);
    let sub_proof = |index: u32, referent: &str| -> Result<usize, Failure> {
        let index = index as usize;
        if index >= sub_proofs {
            unsatisfied!("'{}' points at missing sub proof {}", referent, index);
        }
        Ok(index)
    };

    let mut answered = BTreeSet::new();
    for (referent, info) in &requested_proof.revealed_attrs {
        let i = sub_proof(info.sub_proof_index, referent)?;
        referents[i].revealed.push(referent.as_str());
        answered.insert(referent.as_str());
    }
    for (referent, info) in &requested_proof.revealed_attr_groups {
        let i = sub_proof(info.sub_proof_index, referent)?;
        referents[i].groups.push(referent.as_str());
        if !answered.insert(referent.as_str()) {
            unsatisfied!("attribute '{}' is answered twice", referent);
        }
    }
    for (referent, info) in &requested_proof.unrevealed_attrs {
        let i = sub_proof(info.sub_proof_index, referent)?;
        referents[i].unrevealed.push(referent.as_str());
        if !answered.insert(referent.as_str()) {
            unsatisfied!("attribute '{}' is answered twice", referent);
        }
    }
    for referent in requested_proof.self_attested_attrs.keys() {
        if !answered.insert(referent.as_str()) {
            unsatisfied!("attribute '{}' is answered twice", referent);
        }
    }

    for (referent, info) in &pres_req.requested_attributes {
        if !answered.remove(referent.as_str()) {
            unsatisfied!("requested attribute '{}' is not answered", referent);
        }
        let kind_matches = if info.is_group() {
            requested_proof.revealed_attr_groups.contains_key(referent)
        } else if requested_proof.self_attested_attrs.contains_key(referent) {
            info.restrictions().is_none()
        } else {
            !requested_proof.revealed_attr_groups.contains_key(referent)
        };
        if !kind_matches {
            unsatisfied!("attribute '{}' is not answered as requested", referent);
        }
    }
    if let Some(referent) = answered.iter().next() {
        unsatisfied!("'{}' is not in the presentation request", referent);
    }

    for (referent, info) in &requested_proof.predicates {
        if !pres_req.requested_predicates.contains_key(referent) {
            unsatisfied!("predicate '{}' is not in the presentation request", referent);
        }
        let i = sub_proof(info.sub_proof_index, referent)?;
        referents[i].predicates.push(referent.as_str());
    }
    if let Some(referent) = pres_req
        .requested_predicates
        .keys()
        .find(|r| !requested_proof.predicates.contains_key(*r))
    {
        unsatisfied!("requested predicate '{}' is not answered", referent);
    }
    Ok(referents)
}

/// The schema attribute name a requested name refers to
fn canonical_name<'c>(cred_def: &'c CredentialDefinition, name: &str) -> Option<&'c str> {
    let index = cred_def.attribute_index(name)?;
    cred_def
        .value
        .attr_names
        .0
        .get_index(index - 1)
        .map(String::as_str)
}

/// A revealed value in the requested proof must be the one the sub proof reveals
fn check_revealed(
    sub_proof: &SubProof,
    cred_def: &CredentialDefinition,
    name: &str,
    encoded: &str,
) -> Result<(), Failure> {
    let canonical = match canonical_name(cred_def, name) {
        Some(c) => c,
        None => unsatisfied!("credential has no attribute '{}'", name),
    };
    match sub_proof.revealed_attrs.get(canonical) {
        Some(proven) if same_encoding(proven, encoded) => Ok(()),
        _ => Err(Error::rejected(format!(
            "revealed value of '{}' does not match the proof",
            name
        ))
        .into()),
    }
}

/// Compare encoded values ignoring leading zeros
fn same_encoding(a: &str, b: &str) -> bool {
    fn trimmed(s: &str) -> &str {
        match s.trim_start_matches('0') {
            "" if !s.is_empty() => "0",
            t => t,
        }
    }
    trimmed(a) == trimmed(b)
}

/// The revealed messages of a sub proof in index order
fn revealed_messages(
    sub_proof: &SubProof,
    cred_def: &CredentialDefinition,
) -> AnonCredsResult<Vec<(usize, Scalar)>> {
    let mut revealed = sub_proof
        .revealed_attrs
        .iter()
        .map(|(name, encoded)| {
            let index = cred_def
                .attribute_index(name)
                .ok_or_else(|| Error::rejected(format!("unknown revealed attribute '{}'", name)))?;
            let message = encoded_to_scalar(encoded)
                .map_err(|e| Error::rejected(e.message().to_string()))?;
            Ok((index, message))
        })
        .collect::<AnonCredsResult<Vec<_>>>()?;
    revealed.sort_by_key(|(i, _)| *i);
    if revealed.windows(2).any(|w| w[0].0 == w[1].0) {
        return Err(Error::rejected("an attribute is revealed twice"));
    }
    Ok(revealed)
}

fn restrictions_hold(
    restrictions: Option<&Query>,
    ctx: &RestrictionContext<'_>,
) -> AnonCredsResult<bool> {
    restrictions.map_or(Ok(true), |r| r.matches(ctx))
}
