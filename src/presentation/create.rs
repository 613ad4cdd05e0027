use super::present::PresentCredential;
use super::*;
use crate::cred_def::CredentialDefinition;
use crate::credential::{AttributeValues, Credential, CredentialRevocationInfo};
use crate::error::Error;
use crate::knox::ecc_group::ScalarOps;
use crate::knox::ps::Signature;
use crate::knox::short_group_sig_core::{HiddenMessage, ProofMessage};
use crate::link_secret::LinkSecret;
use crate::presentation_request::{PresentationRequest, Query, RestrictionContext};
use crate::revocation_registry::RevocationState;
use crate::schema::Schema;
use crate::utils::attr_common_view;
use blsful::inner_types::ff::Field;
use log::debug;
use merlin::Transcript;
use rand_core::{CryptoRng, OsRng, RngCore};
use std::collections::{BTreeSet, HashMap};

impl Presentation {
    /// Build the proofs for `credentials`, one sub proof per credential
    /// answering at least one referent
    pub(crate) fn create(
        pres_req: &PresentationRequest,
        credentials: PresentCredentials<'_>,
        self_attested: HashMap<String, String>,
        link_secret: &LinkSecret,
        schemas: &HashMap<SchemaId, &Schema>,
        cred_defs: &HashMap<CredentialDefinitionId, &CredentialDefinition>,
    ) -> AnonCredsResult<Self> {
        pres_req.validate()?;
        credentials.validate()?;
        if credentials.is_empty() && self_attested.is_empty() {
            return Err(Error::input(
                "no credentials or self attested attributes are presented",
            ));
        }
        check_referents(pres_req, &credentials, &self_attested)?;

        let mut rng = OsRng;
        let mut transcript = Transcript::new(PRESENTATION_TRANSCRIPT);
        transcript.append_message(b"nonce", pres_req.nonce.as_str().as_bytes());

        // one blinder proves every sub proof hides the same link secret
        let link_secret_blinder = Scalar::random(&mut rng);
        let mut requested_proof = RequestedProof {
            self_attested_attrs: self_attested.into_iter().collect(),
            ..Default::default()
        };
        let mut identifiers = Vec::with_capacity(credentials.len());
        let mut builders = Vec::with_capacity(credentials.len());

        for present in credentials.0.iter().filter(|p| !p.is_empty()) {
            let sub_proof_index = identifiers.len() as u32;
            let schema = schemas.get(&present.cred.schema_id).ok_or_else(|| {
                Error::input(format!("schema '{}' is not provided", present.cred.schema_id))
            })?;
            let cred_def = cred_defs.get(&present.cred.cred_def_id).ok_or_else(|| {
                Error::input(format!(
                    "credential definition '{}' is not provided",
                    present.cred.cred_def_id
                ))
            })?;
            let plan = SubProofPlan::resolve(
                pres_req,
                present,
                schema,
                cred_def,
                sub_proof_index,
                &mut requested_proof,
            )?;
            identifiers.push(plan.identifier());
            builders.push(plan.commit(
                link_secret,
                link_secret_blinder,
                &mut rng,
                &mut transcript,
            )?);
        }

        let challenge = Scalar::from_transcript(b"challenge bytes", &mut transcript);
        let proofs = builders
            .into_iter()
            .map(|b| b.gen_proof(challenge))
            .collect::<AnonCredsResult<Vec<_>>>()?;

        debug!(
            "created presentation with {} sub proofs for '{}'",
            proofs.len(),
            pres_req.name
        );
        Ok(Self {
            nonce: pres_req.nonce.clone(),
            proof: AggregatedProof { challenge, proofs },
            requested_proof,
            identifiers,
        })
    }
}

/// Every requested referent is answered exactly once, by a credential or
/// a self attested value where that is allowed
fn check_referents(
    pres_req: &PresentationRequest,
    credentials: &PresentCredentials<'_>,
    self_attested: &HashMap<String, String>,
) -> AnonCredsResult<()> {
    let mut attrs = BTreeSet::new();
    let mut preds = BTreeSet::new();
    for present in &credentials.0 {
        attrs.extend(present.requested_attributes.keys().map(String::as_str));
        preds.extend(present.requested_predicates.iter().map(String::as_str));
    }
    for referent in self_attested.keys() {
        let info = pres_req.requested_attributes.get(referent).ok_or_else(|| {
            Error::input(format!(
                "self attested attribute '{}' is not requested",
                referent
            ))
        })?;
        if info.is_group() || info.restrictions().is_some() {
            return Err(Error::input(format!(
                "attribute '{}' cannot be self attested",
                referent
            )));
        }
        if !attrs.insert(referent.as_str()) {
            return Err(Error::input(format!(
                "attribute '{}' is both self attested and answered by a credential",
                referent
            )));
        }
    }
    for referent in pres_req.requested_attributes.keys() {
        if !attrs.remove(referent.as_str()) {
            return Err(Error::input(format!(
                "requested attribute '{}' is not answered",
                referent
            )));
        }
    }
    for referent in pres_req.requested_predicates.keys() {
        if !preds.remove(referent.as_str()) {
            return Err(Error::input(format!(
                "requested predicate '{}' is not answered",
                referent
            )));
        }
    }
    if let Some(referent) = attrs.iter().chain(preds.iter()).next() {
        return Err(Error::input(format!(
            "referent '{}' is not in the presentation request",
            referent
        )));
    }
    Ok(())
}

struct PlannedPredicate {
    attr_name: String,
    index: usize,
    value: i64,
    p_type: PredicateType,
    p_value: i32,
}

struct PlannedRevocation<'p> {
    info: CredentialRevocationInfo,
    rev_reg_id: &'p RevocationRegistryDefinitionId,
    state: &'p RevocationState,
    timestamp: u64,
}

/// What one credential must prove, resolved against the request
struct SubProofPlan<'p> {
    cred: &'p Credential,
    cred_def: &'p CredentialDefinition,
    signature: Signature,
    revealed: BTreeSet<usize>,
    revealed_attrs: BTreeMap<String, String>,
    predicates: Vec<PlannedPredicate>,
    revocation: Option<PlannedRevocation<'p>>,
}

impl<'p> SubProofPlan<'p> {
    fn resolve(
        pres_req: &PresentationRequest,
        present: &PresentCredential<'p>,
        schema: &'p Schema,
        cred_def: &'p CredentialDefinition,
        sub_proof_index: u32,
        requested_proof: &mut RequestedProof,
    ) -> AnonCredsResult<Self> {
        let cred = present.cred;
        cred.validate()?;
        let signature = *cred.unblinded_signature()?;
        let mut plan = Self {
            cred,
            cred_def,
            signature,
            revealed: BTreeSet::new(),
            revealed_attrs: BTreeMap::new(),
            predicates: Vec::new(),
            revocation: None,
        };

        let mut restrictions = Vec::new();
        let mut revealed_raw = BTreeMap::new();
        for (referent, revealed) in &present.requested_attributes {
            let info = pres_req
                .requested_attributes
                .get(referent)
                .ok_or_else(|| Error::input(format!("unknown attribute referent '{}'", referent)))?;
            restrictions.push((referent, info.restrictions()));
            if info.is_group() && !revealed {
                return Err(Error::input(format!(
                    "attribute group '{}' must be revealed",
                    referent
                )));
            }
            let mut group_values = BTreeMap::new();
            for name in info.names() {
                let (index, canonical, values) = plan.attribute(name)?;
                if *revealed {
                    revealed_raw.insert(attr_common_view(name), values.raw.as_str());
                    plan.revealed.insert(index);
                    plan.revealed_attrs
                        .insert(canonical, values.encoded.clone());
                }
                group_values.insert(
                    name.to_string(),
                    AttributeValue {
                        raw: values.raw.clone(),
                        encoded: values.encoded.clone(),
                    },
                );
            }
            match (revealed, info.is_group()) {
                (true, true) => {
                    requested_proof.revealed_attr_groups.insert(
                        referent.clone(),
                        RevealedAttributeGroupInfo {
                            sub_proof_index,
                            values: group_values,
                        },
                    );
                }
                (true, false) => {
                    let value = group_values
                        .into_values()
                        .next()
                        .ok_or_else(|| Error::unexpected("attribute without a value"))?;
                    requested_proof.revealed_attrs.insert(
                        referent.clone(),
                        RevealedAttributeInfo {
                            sub_proof_index,
                            raw: value.raw,
                            encoded: value.encoded,
                        },
                    );
                }
                (false, _) => {
                    requested_proof
                        .unrevealed_attrs
                        .insert(referent.clone(), SubProofReferent { sub_proof_index });
                }
            }
        }

        for referent in &present.requested_predicates {
            let info = pres_req
                .requested_predicates
                .get(referent)
                .ok_or_else(|| Error::input(format!("unknown predicate referent '{}'", referent)))?;
            restrictions.push((referent, info.restrictions()));
            let (index, canonical, values) = plan.attribute(&info.name)?;
            let value = values.encoded.parse::<i64>().map_err(|_| {
                Error::input(format!(
                    "attribute '{}' is not an integer and cannot be used in a predicate",
                    info.name
                ))
            })?;
            if !info.p_type.is_satisfied(value, info.p_value) {
                return Err(Error::rejected(format!(
                    "credential does not satisfy predicate '{}': {} {} {}",
                    referent, info.name, info.p_type, info.p_value
                )));
            }
            plan.predicates.push(PlannedPredicate {
                attr_name: canonical,
                index,
                value,
                p_type: info.p_type,
                p_value: info.p_value,
            });
            requested_proof
                .predicates
                .insert(referent.clone(), SubProofReferent { sub_proof_index });
        }

        // restrictions see the same revealed values the verifier will
        let ctx = RestrictionContext {
            schema_id: &cred.schema_id,
            schema,
            cred_def_id: &cred.cred_def_id,
            cred_def,
            rev_reg_id: cred.rev_reg_id.as_ref(),
            attr_values: revealed_raw,
        };
        for (referent, query) in restrictions {
            check_restrictions(query, &ctx, referent)?;
        }

        if let Some(p) = plan
            .predicates
            .iter()
            .find(|p| plan.revealed.contains(&p.index))
        {
            return Err(Error::input(format!(
                "attribute '{}' is both revealed and used in a predicate",
                p.attr_name
            )));
        }

        let interval = pres_req.strictest_interval(
            present.requested_attributes.keys().map(String::as_str),
            present.requested_predicates.iter().map(String::as_str),
        );
        if interval.is_some() && cred_def.supports_revocation() {
            plan.revocation = Some(PlannedRevocation::resolve(present)?);
        }
        Ok(plan)
    }

    /// Signature index, schema name and values of a credential attribute
    fn attribute(&self, name: &str) -> AnonCredsResult<(usize, String, &'p AttributeValues)> {
        let index = self.cred_def.attribute_index(name).ok_or_else(|| {
            Error::input(format!("credential has no attribute '{}'", name))
        })?;
        let canonical = self
            .cred_def
            .value
            .attr_names
            .0
            .get_index(index - 1)
            .cloned()
            .ok_or_else(|| Error::unexpected("attribute index out of range"))?;
        let cred: &'p Credential = self.cred;
        let values = cred.values.get(name).ok_or_else(|| {
            Error::input(format!("credential has no value for '{}'", name))
        })?;
        Ok((index, canonical, values))
    }

    fn identifier(&self) -> Identifier {
        Identifier {
            schema_id: self.cred.schema_id.clone(),
            cred_def_id: self.cred.cred_def_id.clone(),
            rev_reg_id: self.cred.rev_reg_id.clone(),
            timestamp: self.revocation.as_ref().map(|r| r.timestamp),
        }
    }

    fn commit(
        self,
        link_secret: &LinkSecret,
        link_secret_blinder: Scalar,
        mut rng: impl RngCore + CryptoRng,
        transcript: &mut Transcript,
    ) -> AnonCredsResult<SubProofBuilder> {
        let messages = self.cred.messages(self.cred_def, link_secret.0)?;
        let revocation_index = self
            .revocation
            .as_ref()
            .and(self.cred_def.revocation_index());

        // messages shared with a predicate or membership proof use an external blinder
        let mut blinders = BTreeMap::new();
        for index in self
            .predicates
            .iter()
            .map(|p| p.index)
            .chain(revocation_index)
        {
            blinders
                .entry(index)
                .or_insert_with(|| Scalar::random(&mut rng));
        }

        let proof_messages = messages
            .iter()
            .enumerate()
            .map(|(i, m)| {
                if i == CredentialDefinition::LINK_SECRET_INDEX {
                    ProofMessage::Hidden(HiddenMessage::ExternalBlinding(*m, link_secret_blinder))
                } else if self.revealed.contains(&i) {
                    ProofMessage::Revealed(*m)
                } else if let Some(b) = blinders.get(&i) {
                    ProofMessage::Hidden(HiddenMessage::ExternalBlinding(*m, *b))
                } else {
                    ProofMessage::Hidden(HiddenMessage::ProofSpecificBlinding(*m))
                }
            })
            .collect::<Vec<_>>();

        let signature = SignatureBuilder::commit(
            &self.signature,
            &self.cred_def.value.primary,
            &proof_messages,
            &mut rng,
            transcript,
        )?;

        let generators = PedersenGenerators::new();
        let mut predicates = Vec::with_capacity(self.predicates.len());
        for p in self.predicates {
            let commitment = CommitmentBuilder::commit(
                &p.attr_name,
                generators,
                messages[p.index],
                blinders[&p.index],
                &mut rng,
                transcript,
            );
            let (lower, upper) = p.p_type.bounds(p.p_value);
            let range = RangeBuilder::commit(&commitment, p.value, lower, upper, transcript)?;
            predicates.push(PredicateBuilder {
                attr_name: p.attr_name,
                p_type: p.p_type,
                p_value: p.p_value,
                commitment,
                range,
            });
        }

        let non_revocation = match (self.revocation, revocation_index) {
            (Some(r), Some(index)) => Some(RevocationProofBuilder::commit(
                proof_messages[index],
                r.state.witness,
                r.info.accum_key,
                r.rev_reg_id,
                &mut rng,
                transcript,
            )?),
            _ => None,
        };

        Ok(SubProofBuilder {
            signature,
            revealed_attrs: self.revealed_attrs,
            predicates,
            non_revocation,
        })
    }
}

impl<'p> PlannedRevocation<'p> {
    fn resolve(present: &PresentCredential<'p>) -> AnonCredsResult<Self> {
        let cred = present.cred;
        let (info, rev_reg_id) = match (cred.rev_reg, cred.rev_reg_id.as_ref()) {
            (Some(info), Some(id)) => (info, id),
            _ => {
                return Err(Error::input(
                    "non-revocation is requested but the credential has no revocation registry",
                ))
            }
        };
        let state = present.rev_state.ok_or_else(|| {
            Error::input(format!(
                "non-revocation is requested but no revocation state is given for registry '{}'",
                rev_reg_id
            ))
        })?;
        let timestamp = present.timestamp.unwrap_or(state.timestamp);
        if timestamp != state.timestamp {
            return Err(Error::input(format!(
                "revocation state is for timestamp {}, not {}",
                state.timestamp, timestamp
            )));
        }
        if state.rev_reg_index != info.rev_reg_index {
            return Err(Error::input(format!(
                "revocation state is for index {}, the credential has index {}",
                state.rev_reg_index, info.rev_reg_index
            )));
        }
        if !state
            .witness
            .verify(info.element(), info.accum_key, state.accumulator)
        {
            return Err(Error::CredentialRevoked(format!(
                "credential at index {} of '{}' is revoked at {}",
                info.rev_reg_index, rev_reg_id, timestamp
            )));
        }
        Ok(Self {
            info,
            rev_reg_id,
            state,
            timestamp,
        })
    }
}

fn check_restrictions(
    restrictions: Option<&Query>,
    ctx: &RestrictionContext<'_>,
    referent: &str,
) -> AnonCredsResult<()> {
    match restrictions {
        Some(r) if !r.matches(ctx)? => Err(Error::input(format!(
            "credential does not satisfy the restrictions of '{}'",
            referent
        ))),
        _ => Ok(()),
    }
}

struct PredicateBuilder {
    attr_name: String,
    p_type: PredicateType,
    p_value: i32,
    commitment: CommitmentBuilder,
    range: RangeBuilder,
}

struct SubProofBuilder {
    signature: SignatureBuilder,
    revealed_attrs: BTreeMap<String, String>,
    predicates: Vec<PredicateBuilder>,
    non_revocation: Option<RevocationProofBuilder>,
}

impl PresentationBuilder for SubProofBuilder {
    type Proof = SubProof;

    fn gen_proof(self, challenge: Scalar) -> AnonCredsResult<SubProof> {
        let predicates = self
            .predicates
            .into_iter()
            .map(|p| {
                Ok(PredicateProof {
                    attr_name: p.attr_name,
                    p_type: p.p_type,
                    p_value: p.p_value,
                    commitment: p.commitment.gen_proof(challenge)?,
                    range: p.range.gen_proof(challenge)?,
                })
            })
            .collect::<AnonCredsResult<Vec<_>>>()?;
        Ok(SubProof {
            signature: self.signature.gen_proof(challenge)?,
            revealed_attrs: self.revealed_attrs,
            predicates,
            non_revocation: self
                .non_revocation
                .map(|n| n.gen_proof(challenge))
                .transpose()?,
        })
    }
}
