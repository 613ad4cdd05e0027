use super::error::{catch_error, ErrorCode};
use super::object::ObjectHandle;
use super::{required, FfiList, FfiStrList};
use crate::cred_def::{
    CredentialDefinition, CredentialDefinitionConfig, CredentialDefinitionPrivate,
    KeyCorrectnessProof, SignatureType,
};
use crate::credential::{CredentialOffer, CredentialRequest, CredentialValues};
use crate::error::Error;
use crate::identifiers::{
    CredentialDefinitionId, IssuerId, RevocationRegistryDefinitionId, SchemaId,
};
use crate::issuer::{CredentialRevocationConfig, Issuer};
use crate::revocation_registry::{
    RegistryType, RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate,
    RevocationRegistryDelta, RevocationStatusList, TailsFileWriter,
};
use crate::schema::Schema;
use crate::AnonCredsResult;
use ffi_support::FfiStr;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Registry data for issuing a revocable credential
#[repr(C)]
#[derive(Debug)]
pub struct FfiCredRevInfo {
    /// The registry definition
    pub reg_def: ObjectHandle,
    /// The registry private key
    pub reg_def_private: ObjectHandle,
    /// The current status list
    pub status_list: ObjectHandle,
    /// The index to issue at
    pub reg_idx: u32,
}

/// Timestamps are passed as `i64`, negative meaning now
fn timestamp(ts: i64) -> Option<u64> {
    u64::try_from(ts).ok()
}

fn index_set(list: &FfiList<'_, i32>) -> AnonCredsResult<Option<BTreeSet<u32>>> {
    let list = list.as_slice()?;
    if list.is_empty() {
        return Ok(None);
    }
    list.iter()
        .map(|i| {
            u32::try_from(*i).map_err(|_| {
                Error::InvalidUserRevocId(format!("invalid registry index {}", i))
            })
        })
        .collect::<AnonCredsResult<_>>()
        .map(Some)
}

/// Create a schema
#[no_mangle]
pub extern "C" fn anoncreds_create_schema(
    schema_name: FfiStr<\'_>,
    schema_version: FfiStr<\'_>,
    issuer_id: FfiStr<\'_>,
    attr_names: FfiStrList<'_>,
    result_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(result_p);
        let schema = Issuer::create_schema(
            IssuerId::new(required(&issuer_id, "issuer_id")?)?,
            required(&schema_name, "schema_name")?,
            required(&schema_version, "schema_version")?,
            attr_names.to_string_vec()?,
        )?;
        write_out!(result_p, ObjectHandle::create(schema)?);
        Ok(())
    })
}

/// Create a credential definition, its private key and key correctness proof
#[no_mangle]
pub extern "C" fn anoncreds_create_credential_definition(
    schema_id: FfiStr<\'_>,
    schema: ObjectHandle,
    tag: FfiStr<\'_>,
    issuer_id: FfiStr<\'_>,
    signature_type: FfiStr<\'_>,
    support_revocation: i8,
    cred_def_p: *mut ObjectHandle,
    cred_def_pvt_p: *mut ObjectHandle,
    key_proof_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(cred_def_p);
        check_useful_c_ptr!(cred_def_pvt_p);
        check_useful_c_ptr!(key_proof_p);
        let signature_type = match signature_type.as_opt_str() {
            Some(s) => s.parse::<SignatureType>()?,
            None => SignatureType::PS,
        };
        let schema = schema.load()?;
        let (cred_def, cred_def_pvt, key_proof) = Issuer::create_credential_definition(
            SchemaId::new(required(&schema_id, "schema_id")?)?,
            schema.cast_ref::<Schema>()?,
            IssuerId::new(required(&issuer_id, "issuer_id")?)?,
            required(&tag, "tag")?,
            signature_type,
            CredentialDefinitionConfig::new(support_revocation != 0),
        )?;
        let cred_def = ObjectHandle::create(cred_def)?;
        let cred_def_pvt = ObjectHandle::create(cred_def_pvt)?;
        let key_proof = ObjectHandle::create(key_proof)?;
        write_out!(cred_def_p, cred_def);
        write_out!(cred_def_pvt_p, cred_def_pvt);
        write_out!(key_proof_p, key_proof);
        Ok(())
    })
}

/// Create a credential offer
#[no_mangle]
pub extern "C" fn anoncreds_create_credential_offer(
    schema_id: FfiStr<\'_>,
    cred_def_id: FfiStr<\'_>,
    key_proof: ObjectHandle,
    result_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(result_p);
        let key_proof = key_proof.load()?;
        let offer = Issuer::create_credential_offer(
            SchemaId::new(required(&schema_id, "schema_id")?)?,
            CredentialDefinitionId::new(required(&cred_def_id, "cred_def_id")?)?,
            key_proof.cast_ref::<KeyCorrectnessProof>()?,
        )?;
        write_out!(result_p, ObjectHandle::create(offer)?);
        Ok(())
    })
}

/// Issue a credential. `attr_enc_values` may be empty to encode the raw values,
/// `revocation` may be null for a credential without a registry
#[no_mangle]
pub extern "C" fn anoncreds_create_credential(
    cred_def: ObjectHandle,
    cred_def_private: ObjectHandle,
    cred_offer: ObjectHandle,
    cred_request: ObjectHandle,
    attr_names: FfiStrList<'_>,
    attr_raw_values: FfiStrList<'_>,
    attr_enc_values: FfiStrList<'_>,
    rev_reg_id: FfiStr<\'_>,
    revocation: *const FfiCredRevInfo,
    cred_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(cred_p);
        let names = attr_names.to_string_vec()?;
        let raw = attr_raw_values.to_string_vec()?;
        let encoded = attr_enc_values.to_string_vec()?;
        let encoded = (!encoded.is_empty()).then_some(encoded.as_slice());
        let values = CredentialValues::from_lists(&names, &raw, encoded)?;

        let cred_def = cred_def.load()?;
        let cred_def_private = cred_def_private.load()?;
        let cred_offer = cred_offer.load()?;
        let cred_request = cred_request.load()?;

        // SAFETY: a non-null pointer refers to a caller owned struct
        let revocation = unsafe { revocation.as_ref() };
        let rev_objects = match revocation {
            Some(info) => Some((
                info.reg_def.load()?,
                info.reg_def_private.load()?,
                info.status_list.load()?,
                info.reg_idx,
                RevocationRegistryDefinitionId::new(required(&rev_reg_id, "rev_reg_id")?)?,
            )),
            None => None,
        };
        let revocation_config = match &rev_objects {
            Some((reg_def, reg_def_private, status_list, registry_idx, rev_reg_def_id)) => {
                Some(CredentialRevocationConfig {
                    rev_reg_def_id,
                    reg_def: reg_def.cast_ref::<RevocationRegistryDefinition>()?,
                    reg_def_private: reg_def_private
                        .cast_ref::<RevocationRegistryDefinitionPrivate>()?,
                    status_list: status_list.cast_ref::<RevocationStatusList>()?,
                    registry_idx: *registry_idx,
                })
            }
            None => None,
        };

        let cred = Issuer::create_credential(
            cred_def.cast_ref::<CredentialDefinition>()?,
            cred_def_private.cast_ref::<CredentialDefinitionPrivate>()?,
            cred_offer.cast_ref::<CredentialOffer>()?,
            cred_request.cast_ref::<CredentialRequest>()?,
            values,
            revocation_config,
        )?;
        write_out!(cred_p, ObjectHandle::create(cred)?);
        Ok(())
    })
}

/// Create a revocation registry, writing its tails file under `tails_dir_path`
/// or the default tails directory when null
#[no_mangle]
pub extern "C" fn anoncreds_create_revocation_registry_def(
    cred_def: ObjectHandle,
    cred_def_id: FfiStr<\'_>,
    issuer_id: FfiStr<\'_>,
    tag: FfiStr<\'_>,
    rev_reg_type: FfiStr<\'_>,
    max_cred_num: i64,
    tails_dir_path: FfiStr<\'_>,
    reg_def_p: *mut ObjectHandle,
    reg_def_private_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(reg_def_p);
        check_useful_c_ptr!(reg_def_private_p);
        let rev_reg_type = required(&rev_reg_type, "rev_reg_type")?.parse::<RegistryType>()?;
        let max_cred_num = u32::try_from(max_cred_num)
            .map_err(|_| Error::input(format!("invalid max_cred_num {}", max_cred_num)))?;
        let mut tails_writer = TailsFileWriter::new(tails_dir_path.as_opt_str().map(PathBuf::from));
        let cred_def = cred_def.load()?;
        let (reg_def, reg_def_private) = Issuer::create_revocation_registry_def(
            cred_def.cast_ref::<CredentialDefinition>()?,
            CredentialDefinitionId::new(required(&cred_def_id, "cred_def_id")?)?,
            IssuerId::new(required(&issuer_id, "issuer_id")?)?,
            required(&tag, "tag")?,
            rev_reg_type,
            max_cred_num,
            &mut tails_writer,
        )?;
        let reg_def = ObjectHandle::create(reg_def)?;
        let reg_def_private = ObjectHandle::create(reg_def_private)?;
        write_out!(reg_def_p, reg_def);
        write_out!(reg_def_private_p, reg_def_private);
        Ok(())
    })
}

/// Create the first status list of a registry
#[no_mangle]
pub extern "C" fn anoncreds_create_revocation_status_list(
    rev_reg_def_id: FfiStr<\'_>,
    rev_reg_def: ObjectHandle,
    reg_rev_priv: ObjectHandle,
    issuer_id: FfiStr<\'_>,
    issuance_by_default: i8,
    timestamp_: i64,
    rev_status_list_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(rev_status_list_p);
        let rev_reg_def = rev_reg_def.load()?;
        let reg_rev_priv = reg_rev_priv.load()?;
        let list = Issuer::create_revocation_status_list(
            RevocationRegistryDefinitionId::new(required(&rev_reg_def_id, "rev_reg_def_id")?)?,
            rev_reg_def.cast_ref::<RevocationRegistryDefinition>()?,
            reg_rev_priv.cast_ref::<RevocationRegistryDefinitionPrivate>()?,
            IssuerId::new(required(&issuer_id, "issuer_id")?)?,
            issuance_by_default != 0,
            timestamp(timestamp_),
        )?;
        write_out!(rev_status_list_p, ObjectHandle::create(list)?);
        Ok(())
    })
}

/// Publish issued and revoked indices as a new status list
#[no_mangle]
pub extern "C" fn anoncreds_update_revocation_status_list(
    rev_reg_def: ObjectHandle,
    rev_reg_priv: ObjectHandle,
    rev_current_list: ObjectHandle,
    issued: FfiList<'_, i32>,
    revoked: FfiList<'_, i32>,
    timestamp_: i64,
    new_rev_status_list_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(new_rev_status_list_p);
        let rev_reg_def = rev_reg_def.load()?;
        let rev_reg_priv = rev_reg_priv.load()?;
        let current = rev_current_list.load()?;
        let list = Issuer::update_revocation_status_list(
            rev_reg_def.cast_ref::<RevocationRegistryDefinition>()?,
            rev_reg_priv.cast_ref::<RevocationRegistryDefinitionPrivate>()?,
            current.cast_ref::<RevocationStatusList>()?,
            index_set(&issued)?,
            index_set(&revoked)?,
            timestamp(timestamp_),
        )?;
        write_out!(new_rev_status_list_p, ObjectHandle::create(list)?);
        Ok(())
    })
}

/// Republish a status list under a new timestamp
#[no_mangle]
pub extern "C" fn anoncreds_update_revocation_status_list_timestamp_only(
    timestamp_: i64,
    rev_current_list: ObjectHandle,
    rev_status_list_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(rev_status_list_p);
        let timestamp = timestamp(timestamp_)
            .ok_or_else(|| Error::input(format!("invalid timestamp {}", timestamp_)))?;
        let current = rev_current_list.load()?;
        let list = Issuer::update_revocation_status_list_timestamp_only(
            timestamp,
            current.cast_ref::<RevocationStatusList>()?,
        )?;
        write_out!(rev_status_list_p, ObjectHandle::create(list)?);
        Ok(())
    })
}

/// The legacy delta between two status lists, `from_list` may be zero
#[no_mangle]
pub extern "C" fn anoncreds_create_revocation_registry_delta(
    from_list: ObjectHandle,
    to_list: ObjectHandle,
    delta_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(delta_p);
        let from = from_list.opt_load()?;
        let to = to_list.load()?;
        let delta = RevocationRegistryDelta::from_status_lists(
            from.as_ref()
                .map(|f| f.cast_ref::<RevocationStatusList>())
                .transpose()?,
            to.cast_ref::<RevocationStatusList>()?,
        )?;
        write_out!(delta_p, ObjectHandle::create(delta)?);
        Ok(())
    })
}

/// Merge `other` onto `delta` into a new delta
#[no_mangle]
pub extern "C" fn anoncreds_merge_revocation_registry_deltas(
    delta: ObjectHandle,
    other: ObjectHandle,
    merged_p: *mut ObjectHandle,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(merged_p);
        let mut merged = delta.load()?.cast_ref::<RevocationRegistryDelta>()?.clone();
        merged.merge(other.load()?.cast_ref::<RevocationRegistryDelta>()?)?;
        write_out!(merged_p, ObjectHandle::create(merged)?);
        Ok(())
    })
}
