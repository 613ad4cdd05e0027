use crate::cred_def::{
    CredentialDefinition, CredentialDefinitionConfig, CredentialDefinitionData,
    CredentialDefinitionPrivate, KeyCorrectnessProof, SignatureType,
};
use crate::credential::{
    signed_messages, Credential, CredentialOffer, CredentialRequest, CredentialRevocationInfo,
    CredentialSignature, CredentialValues,
};
use crate::error::Error;
use crate::identifiers::{
    CredentialDefinitionId, IssuerId, RevocationRegistryDefinitionId, SchemaId,
};
use crate::knox::accumulator::vb20::{self, MembershipWitness};
use crate::knox::ps;
use crate::nonce::Nonce;
use crate::revocation_registry::{
    RegistryType, RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate,
    RevocationRegistryDefinitionValue, RevocationRegistryDefinitionValuePublicKeys,
    RevocationStatusList, TailsWriter,
};
use crate::schema::Schema;
use crate::AnonCredsResult;
use blsful::inner_types::Scalar;
use log::debug;
use rand_core::OsRng;
use std::collections::BTreeSet;

/// The registry data needed to issue a revocable credential
#[derive(Clone, Copy, Debug)]
pub struct CredentialRevocationConfig<'a> {
    /// The registry id written into the credential
    pub rev_reg_def_id: &'a RevocationRegistryDefinitionId,
    /// The registry definition
    pub reg_def: &'a RevocationRegistryDefinition,
    /// The registry accumulator secret
    pub reg_def_private: &'a RevocationRegistryDefinitionPrivate,
    /// The current status list of the registry
    pub status_list: &'a RevocationStatusList,
    /// The index to issue at
    pub registry_idx: u32,
}

/// Issuer operations
pub struct Issuer;

impl Issuer {
    /// Create a schema
    pub fn create_schema<I, S>(
        issuer_id: IssuerId,
        schema_name: &str,
        schema_version: &str,
        attr_names: I,
    ) -> AnonCredsResult<Schema>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        debug!(
            "create_schema: name = {}, version = {}, issuer_id = {}",
            schema_name, schema_version, issuer_id
        );
        Schema::new(issuer_id, schema_name, schema_version, attr_names)
    }

    /// Create a credential definition with its signing key and key correctness proof
    pub fn create_credential_definition(
        schema_id: SchemaId,
        schema: &Schema,
        issuer_id: IssuerId,
        tag: &str,
        signature_type: SignatureType,
        config: CredentialDefinitionConfig,
    ) -> AnonCredsResult<(
        CredentialDefinition,
        CredentialDefinitionPrivate,
        KeyCorrectnessProof,
    )> {
        debug!(
            "create_credential_definition: schema_id = {}, issuer_id = {}, tag = {}, type = {:?}, config = {:?}",
            schema_id, issuer_id, tag, signature_type, config
        );
        schema.validate()?;
        let count = schema.attr_names.len() + 1 + usize::from(config.support_revocation);
        let (public_key, secret_key) = ps::Issuer::new_keys(count, OsRng)?;
        let proof = KeyCorrectnessProof::new(&public_key, &secret_key, OsRng)?;
        let cred_def = CredentialDefinition {
            schema_id,
            signature_type,
            tag: tag.to_string(),
            value: CredentialDefinitionData {
                primary: public_key,
                attr_names: schema.attr_names.clone(),
                revocation: config.support_revocation,
            },
            issuer_id,
        };
        Ok((
            cred_def,
            CredentialDefinitionPrivate { value: secret_key },
            proof,
        ))
    }

    /// Create a revocation registry for a credential definition, writing its tails
    pub fn create_revocation_registry_def(
        cred_def: &CredentialDefinition,
        cred_def_id: CredentialDefinitionId,
        issuer_id: IssuerId,
        tag: &str,
        rev_reg_type: RegistryType,
        max_cred_num: u32,
        tails_writer: &mut dyn TailsWriter,
    ) -> AnonCredsResult<(
        RevocationRegistryDefinition,
        RevocationRegistryDefinitionPrivate,
    )> {
        debug!(
            "create_revocation_registry_def: cred_def_id = {}, issuer_id = {}, tag = {}, type = {:?}, max_cred_num = {}",
            cred_def_id, issuer_id, tag, rev_reg_type, max_cred_num
        );
        if issuer_id != cred_def.issuer_id {
            return Err(Error::input(format!(
                "issuer id '{}' does not own the credential definition of '{}'",
                issuer_id, cred_def.issuer_id
            )));
        }
        if !cred_def.supports_revocation() {
            return Err(Error::input(
                "credential definition does not support revocation",
            ));
        }
        if max_cred_num == 0 {
            return Err(Error::input("a registry needs at least one index"));
        }

        let secret_key = vb20::SecretKey::new(None);
        let accum_key = vb20::PublicKey::from(&secret_key);
        let (tails_location, tails_hash) =
            tails_writer.write(&mut secret_key.powers(max_cred_num as usize + 1))?;

        let rev_reg_def = RevocationRegistryDefinition {
            issuer_id,
            revoc_def_type: rev_reg_type,
            tag: tag.to_string(),
            cred_def_id,
            value: RevocationRegistryDefinitionValue {
                max_cred_num,
                public_keys: RevocationRegistryDefinitionValuePublicKeys { accum_key },
                tails_hash,
                tails_location,
            },
        };
        Ok((
            rev_reg_def,
            RevocationRegistryDefinitionPrivate { value: secret_key },
        ))
    }

    /// Create the first status list of a registry. With `issuance_by_default`
    /// every index starts issued, otherwise every index waits to be issued
    pub fn create_revocation_status_list(
        rev_reg_def_id: RevocationRegistryDefinitionId,
        rev_reg_def: &RevocationRegistryDefinition,
        rev_reg_private: &RevocationRegistryDefinitionPrivate,
        issuer_id: IssuerId,
        issuance_by_default: bool,
        timestamp: Option<u64>,
    ) -> AnonCredsResult<RevocationStatusList> {
        debug!(
            "create_revocation_status_list: rev_reg_def_id = {}, issuer_id = {}, issuance_by_default = {}, timestamp = {:?}",
            rev_reg_def_id, issuer_id, issuance_by_default, timestamp
        );
        RevocationStatusList::create(
            Some(rev_reg_def_id),
            rev_reg_def,
            rev_reg_private,
            issuer_id,
            issuance_by_default,
            timestamp,
        )
    }

    /// Publish a successor of `current_list` with `issued` activated and `revoked` removed
    pub fn update_revocation_status_list(
        rev_reg_def: &RevocationRegistryDefinition,
        rev_reg_private: &RevocationRegistryDefinitionPrivate,
        current_list: &RevocationStatusList,
        issued: Option<BTreeSet<u32>>,
        revoked: Option<BTreeSet<u32>>,
        timestamp: Option<u64>,
    ) -> AnonCredsResult<RevocationStatusList> {
        debug!(
            "update_revocation_status_list: issued = {:?}, revoked = {:?}, timestamp = {:?}",
            issued, revoked, timestamp
        );
        current_list.apply(
            rev_reg_def,
            rev_reg_private,
            &issued.unwrap_or_default(),
            &revoked.unwrap_or_default(),
            timestamp,
        )
    }

    /// Republish `current_list` unchanged at `timestamp`
    pub fn update_revocation_status_list_timestamp_only(
        timestamp: u64,
        current_list: &RevocationStatusList,
    ) -> AnonCredsResult<RevocationStatusList> {
        debug!(
            "update_revocation_status_list_timestamp_only: timestamp = {}",
            timestamp
        );
        if timestamp < current_list.timestamp() {
            return Err(Error::input(format!(
                "timestamp {} precedes the current list at {}",
                timestamp,
                current_list.timestamp()
            )));
        }
        Ok(current_list.with_timestamp(timestamp))
    }

    /// Create an offer with a fresh nonce
    pub fn create_credential_offer(
        schema_id: SchemaId,
        cred_def_id: CredentialDefinitionId,
        correctness_proof: &KeyCorrectnessProof,
    ) -> AnonCredsResult<CredentialOffer> {
        debug!(
            "create_credential_offer: schema_id = {}, cred_def_id = {}",
            schema_id, cred_def_id
        );
        Ok(CredentialOffer {
            schema_id,
            cred_def_id,
            key_correctness_proof: correctness_proof.clone(),
            nonce: Nonce::new(),
            method_name: None,
        })
    }

    /// Sign `values` for the holder of `cred_request`
    pub fn create_credential(
        cred_def: &CredentialDefinition,
        cred_def_private: &CredentialDefinitionPrivate,
        cred_offer: &CredentialOffer,
        cred_request: &CredentialRequest,
        values: CredentialValues,
        revocation_config: Option<CredentialRevocationConfig<'_>>,
    ) -> AnonCredsResult<Credential> {
        debug!(
            "create_credential: cred_def_id = {}, attributes = {}, revocable = {}",
            cred_offer.cred_def_id,
            values.len(),
            revocation_config.is_some()
        );
        cred_request.validate()?;
        if cred_request.cred_def_id != cred_offer.cred_def_id {
            return Err(Error::input(
                "credential request is for another credential definition",
            ));
        }
        if cred_request.nonce != cred_offer.nonce {
            return Err(Error::input("credential request does not answer this offer"));
        }

        let (rev_reg_id, rev_reg) = match revocation_config {
            Some(config) => {
                let info = Self::revocation_info(cred_def, &cred_offer.cred_def_id, &config)?;
                (Some(config.rev_reg_def_id.clone()), Some(info))
            }
            None => (None, None),
        };

        let messages = signed_messages(
            &values,
            cred_def,
            Scalar::ZERO,
            rev_reg.map(|r| r.element()),
        )?;
        let known = messages
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, m)| (i, *m))
            .collect::<Vec<_>>();
        let signature = ps::Issuer::blind_sign(
            &cred_request.blinded_ms,
            &cred_def_private.value,
            &known,
            cred_offer.nonce.as_scalar(),
        )?;

        Ok(Credential {
            schema_id: cred_offer.schema_id.clone(),
            cred_def_id: cred_offer.cred_def_id.clone(),
            rev_reg_id,
            values,
            signature: CredentialSignature::Blinded(signature),
            rev_reg,
        })
    }

    fn revocation_info(
        cred_def: &CredentialDefinition,
        cred_def_id: &CredentialDefinitionId,
        config: &CredentialRevocationConfig<'_>,
    ) -> AnonCredsResult<CredentialRevocationInfo> {
        if !cred_def.supports_revocation() {
            return Err(Error::input(
                "credential definition does not support revocation",
            ));
        }
        if &config.reg_def.cred_def_id != cred_def_id {
            return Err(Error::input(
                "revocation registry belongs to another credential definition",
            ));
        }
        if let Some(id) = config.status_list.rev_reg_def_id() {
            if id != config.rev_reg_def_id {
                return Err(Error::input("status list belongs to another registry"));
            }
        }
        let index = config.registry_idx;
        if index >= config.reg_def.max_cred_num() {
            return Err(Error::RevocationRegistryFull(format!(
                "index {} exceeds the registry size {}",
                index,
                config.reg_def.max_cred_num()
            )));
        }
        let revoked = config
            .status_list
            .is_revoked(index)
            .ok_or_else(|| Error::input("status list does not match the registry definition"))?;
        let element = config.reg_def.element(index)?;
        let key = &config.reg_def_private.value;
        let current = config.status_list.accumulator();

        let (accumulator, witness) = if config.status_list.issuance_by_default() {
            if revoked {
                return Err(Error::input(format!(
                    "index {} was revoked and cannot be reused",
                    index
                )));
            }
            let witness = MembershipWitness::new(element, current, key)
                .ok_or_else(|| Error::unexpected("cannot compute a membership witness"))?;
            (current, witness)
        } else {
            if !revoked {
                return Err(Error::input(format!("index {} is already issued", index)));
            }
            (current.add(key, element), MembershipWitness(current.0))
        };

        Ok(CredentialRevocationInfo {
            rev_reg_index: index,
            accum_key: config.reg_def.value.public_keys.accum_key,
            accumulator,
            witness,
        })
    }
}
