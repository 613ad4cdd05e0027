use super::error::{catch_error, ErrorCode};
use super::object::{AnonCredsObject, AnonCredsObjectList, ObjectHandle};
use super::{required, FfiList, FfiStrList};
use crate::cred_def::CredentialDefinition;
use crate::credential::{Credential, CredentialOffer, CredentialRequestMetadata};
use crate::error::Error;
use crate::identifiers::{CredentialDefinitionId, SchemaId};
use crate::link_secret::LinkSecret;
use crate::presentation::PresentCredentials;
use crate::presentation_request::PresentationRequest;
use crate::prover::Prover;
use crate::revocation_registry::{
    RevocationRegistryDefinition, RevocationState, RevocationStatusList,
};
use crate::schema::Schema;
use crate::AnonCredsResult;
use ffi_support::{rust_string_to_c, FfiStr};
use std::collections::HashMap;
use std::os::raw::c_char;

/// A credential offered in a presentation
#[repr(C)]
#[derive(Debug)]
pub struct FfiCredentialEntry {
    /// The credential
    pub credential: ObjectHandle,
    /// The status list timestamp, negative for none
    pub timestamp: i64,
    /// The revocation state at `timestamp`, zero for none
    pub rev_state: ObjectHandle,
}

/// A referent answered by one of the credential entries
#[repr(C)]
pub struct FfiCredentialProve {
    /// Index into the credential entries
    pub entry_idx: i64,
    /// The attribute or predicate referent
    pub referent: FfiStr<\'_>,
    /// Non-zero for a predicate referent
    pub is_predicate: i8,
    /// Non-zero to reveal an attribute
    pub reveal: i8,
}

/// Create a link secret as a decimal string, release with `anoncreds_string_free`
#[no_mangle]
pub extern "C" fn anoncreds_create_link_secret(link_secret_p: *mut *const c_char) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(link_secret_p);
        let secret = Prover::create_link_secret()?;
        write_out!(link_secret_p, rust_string_to_c(secret.to_dec()));
        Ok(())
    })
}

/// Create a credential request and its metadata. `entropy` or `prover_did`
/// may be null but not both
#[no_mangle]
pub extern "C" fn anoncreds_create_credential_request(
    entropy: FfiStr<\'_>,
    prover_did: FfiStr<\'_>,
    cred_def: ObjectHandle,
    link_secret: FfiStr<\'_>,
    link_secret_id: FfiStr<\'_>,
    cred_offer: ObjectHandle,
    cred_req_p: *mut ObjectHandle,
    cred_req_meta_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(cred_req_p);
        check_useful_c_ptr!(cred_req_meta_p);
        let entropy = entropy.as_opt_str();
        let prover_did = prover_did.as_opt_str();
        let link_secret = LinkSecret::from_dec(required(&link_secret, "link_secret")?)?;
        let link_secret_id = required(&link_secret_id, "link_secret_id")?;
        let cred_def = cred_def.load()?;
        let cred_offer = cred_offer.load()?;
        let (request, metadata) = Prover::create_credential_request(
            entropy,
            prover_did,
            cred_def.cast_ref::<CredentialDefinition>()?,
            &link_secret,
            link_secret_id,
            cred_offer.cast_ref::<CredentialOffer>()?,
        )?;
        let request = ObjectHandle::create(request)?;
        let metadata = ObjectHandle::create(metadata)?;
        write_out!(cred_req_p, request);
        write_out!(cred_req_meta_p, metadata);
        Ok(())
    })
}

/// Process an issued credential into a new handle. `rev_reg_def` is zero for
/// a credential without a registry
#[no_mangle]
pub extern "C" fn anoncreds_process_credential(
    cred: ObjectHandle,
    cred_req_metadata: ObjectHandle,
    link_secret: FfiStr<\'_>,
    cred_def: ObjectHandle,
    rev_reg_def: ObjectHandle,
    cred_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(cred_p);
        let link_secret = LinkSecret::from_dec(required(&link_secret, "link_secret")?)?;
        let mut credential = cred.load()?.cast_ref::<Credential>()?.clone();
        let metadata = cred_req_metadata.load()?;
        let cred_def = cred_def.load()?;
        let rev_reg_def = rev_reg_def.opt_load()?;
        Prover::process_credential(
            &mut credential,
            metadata.cast_ref::<CredentialRequestMetadata>()?,
            &link_secret,
            cred_def.cast_ref::<CredentialDefinition>()?,
            rev_reg_def
                .as_ref()
                .map(AnonCredsObject::cast_ref::<RevocationRegistryDefinition>)
                .transpose()?,
        )?;
        write_out!(cred_p, ObjectHandle::create(credential)?);
        Ok(())
    })
}

/// Compute the revocation state of `rev_reg_index` at `rev_status_list`.
/// `rev_state` and `old_rev_status_list` are zero to build from the tails file
#[no_mangle]
pub extern "C" fn anoncreds_create_or_update_revocation_state(
    rev_reg_def: ObjectHandle,
    rev_status_list: ObjectHandle,
    rev_reg_index: i64,
    tails_path: FfiStr<\'_>,
    rev_state: ObjectHandle,
    old_rev_status_list: ObjectHandle,
    rev_state_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(rev_state_p);
        let rev_reg_index = u32::try_from(rev_reg_index)
            .map_err(|_| Error::InvalidUserRevocId(format!("invalid registry index {}", rev_reg_index)))?;
        let tails_path = required(&tails_path, "tails_path")?;
        let rev_reg_def = rev_reg_def.load()?;
        let rev_status_list = rev_status_list.load()?;
        let rev_state = rev_state.opt_load()?;
        let old_rev_status_list = old_rev_status_list.opt_load()?;
        let state = Prover::create_or_update_revocation_state(
            tails_path,
            rev_reg_def.cast_ref::<RevocationRegistryDefinition>()?,
            rev_status_list.cast_ref::<RevocationStatusList>()?,
            rev_reg_index,
            rev_state
                .as_ref()
                .map(AnonCredsObject::cast_ref::<RevocationState>)
                .transpose()?,
            old_rev_status_list
                .as_ref()
                .map(AnonCredsObject::cast_ref::<RevocationStatusList>)
                .transpose()?,
        )?;
        write_out!(rev_state_p, ObjectHandle::create(state)?);
        Ok(())
    })
}

/// Loaded objects for one credential entry
struct LoadedEntry {
    credential: AnonCredsObject,
    timestamp: Option<u64>,
    rev_state: Option<AnonCredsObject>,
}

impl LoadedEntry {
    fn load(entry: &FfiCredentialEntry) -> AnonCredsResult<Self> {
        Ok(Self {
            credential: entry.credential.load()?,
            timestamp: u64::try_from(entry.timestamp).ok(),
            rev_state: entry.rev_state.opt_load()?,
        })
    }
}

fn self_attested(
    names: &FfiStrList<'_>,
    values: &FfiStrList<'_>,
) -> AnonCredsResult<Option<HashMap<String, String>>> {
    let names = names.to_string_vec()?;
    let values = values.to_string_vec()?;
    if names.len() != values.len() {
        return Err(Error::input(
            "self attested names and values differ in length",
        ));
    }
    Ok((!names.is_empty()).then(|| names.into_iter().zip(values).collect()))
}

/// Create a presentation. Each prove entry assigns a referent to the
/// credential entry at `entry_idx`
#[no_mangle]
pub extern "C" fn anoncreds_create_presentation(
    pres_req: ObjectHandle,
    credentials: FfiList<'_, FfiCredentialEntry>,
    credentials_prove: FfiList<'_, FfiCredentialProve<'_>>,
    self_attest_names: FfiStrList<'_>,
    self_attest_values: FfiStrList<'_>,
    link_secret: FfiStr<\'_>,
    schemas: FfiList<'_, ObjectHandle>,
    schema_ids: FfiStrList<'_>,
    cred_defs: FfiList<'_, ObjectHandle>,
    cred_def_ids: FfiStrList<'_>,
    presentation_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(presentation_p);
        let link_secret = LinkSecret::from_dec(required(&link_secret, "link_secret")?)?;
        let self_attested = self_attested(&self_attest_names, &self_attest_values)?;
        let pres_req = pres_req.load()?;

        let entries = credentials
            .as_slice()?
            .iter()
            .map(LoadedEntry::load)
            .collect::<AnonCredsResult<Vec<_>>>()?;
        let mut present = PresentCredentials::default();
        let mut added = Vec::with_capacity(entries.len());
        for entry in &entries {
            let rev_state = entry
                .rev_state
                .as_ref()
                .map(AnonCredsObject::cast_ref::<RevocationState>)
                .transpose()?;
            added.push((
                entry.credential.cast_ref::<Credential>()?,
                entry.timestamp,
                rev_state,
            ));
        }
        let mut by_entry = vec![Vec::new(); added.len()];
        for prove in credentials_prove.as_slice()? {
            let idx = usize::try_from(prove.entry_idx)
                .ok()
                .filter(|i| *i < added.len())
                .ok_or_else(|| {
                    Error::input(format!("invalid credential entry index {}", prove.entry_idx))
                })?;
            by_entry[idx].push((
                required(&prove.referent, "referent")?.to_owned(),
                prove.is_predicate != 0,
                prove.reveal != 0,
            ));
        }
        for ((cred, timestamp, rev_state), proves) in added.into_iter().zip(by_entry) {
            let mut add = present.add_credential(cred, timestamp, rev_state);
            for (referent, is_predicate, reveal) in proves {
                if is_predicate {
                    add.add_requested_predicate(referent);
                } else {
                    add.add_requested_attribute(referent, reveal);
                }
            }
        }

        let schema_ids = schema_ids.to_string_vec()?
            .into_iter()
            .map(SchemaId::new)
            .collect::<AnonCredsResult<Vec<_>>>()?;
        let cred_def_ids = cred_def_ids.to_string_vec()?
            .into_iter()
            .map(CredentialDefinitionId::new)
            .collect::<AnonCredsResult<Vec<_>>>()?;
        let schemas = AnonCredsObjectList::load(schemas.as_slice()?)?;
        let cred_defs = AnonCredsObjectList::load(cred_defs.as_slice()?)?;
        let schemas = schemas.refs_map::<_, Schema>(schema_ids)?;
        let cred_defs = cred_defs.refs_map::<_, CredentialDefinition>(cred_def_ids)?;

        let presentation = Prover::create_presentation(
            pres_req.cast_ref::<PresentationRequest>()?,
            present,
            self_attested,
            &link_secret,
            &schemas,
            &cred_defs,
        )?;
        write_out!(presentation_p, ObjectHandle::create(presentation)?);
        Ok(())
    })
}
