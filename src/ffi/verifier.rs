use super::error::{catch_error, ErrorCode};
use super::object::{AnonCredsObjectList, ObjectHandle};
use super::{required, FfiList, FfiStrList};
use crate::cred_def::CredentialDefinition;
use crate::credential::encode_credential_attribute;
use crate::error::Error;
use crate::identifiers::{CredentialDefinitionId, RevocationRegistryDefinitionId, SchemaId};
use crate::presentation::Presentation;
use crate::presentation_request::PresentationRequest;
use crate::revocation_registry::{RevocationRegistryDefinition, RevocationStatusList};
use crate::schema::Schema;
use crate::verifier::Verifier;
use crate::AnonCredsResult;
use ffi_support::{rust_string_to_c, FfiStr};
use std::collections::HashMap;
use std::os::raw::c_char;

/// Accept status lists from `override_rev_status_list_ts` for requests whose
/// interval starts at `requested_from_ts`
#[repr(C)]
#[derive(Debug)]
pub struct FfiNonrevokedIntervalOverride {
    /// The registry the override applies to
    pub rev_reg_def_id: FfiStr<\'_>,
    /// The requested `from`
    pub requested_from_ts: i32,
    /// The `from` the verifier accepts instead
    pub override_rev_status_list_ts: i32,
}

/// A fresh presentation request nonce, release with `anoncreds_string_free`
#[no_mangle]
pub extern "C" fn anoncreds_generate_nonce(nonce_p: *mut *const c_char) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(nonce_p);
        let nonce = Verifier::generate_nonce();
        write_out!(nonce_p, rust_string_to_c(nonce.as_str()));
        Ok(())
    })
}

/// Encode raw attribute values, returned comma separated
#[no_mangle]
pub extern "C" fn anoncreds_encode_credential_attributes(
    attr_raw_values: FfiStrList<'_>,
    result_p: *mut *const c_char,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(result_p);
        let encoded = attr_raw_values.to_string_vec()?
            .iter()
            .map(|raw| encode_credential_attribute(raw))
            .collect::<Vec<_>>()
            .join(",");
        write_out!(result_p, rust_string_to_c(encoded));
        Ok(())
    })
}

fn overrides(
    list: &FfiList<'_, FfiNonrevokedIntervalOverride<'_>>,
) -> AnonCredsResult<Option<HashMap<RevocationRegistryDefinitionId, HashMap<u64, u64>>>> {
    let list = list.as_slice()?;
    if list.is_empty() {
        return Ok(None);
    }
    let mut map: HashMap<RevocationRegistryDefinitionId, HashMap<u64, u64>> = HashMap::new();
    for entry in list {
        let id = RevocationRegistryDefinitionId::new(required(
            &entry.rev_reg_def_id,
            "rev_reg_def_id",
        )?)?;
        let requested = u64::try_from(entry.requested_from_ts)
            .map_err(|_| Error::input("negative requested timestamp"))?;
        let accepted = u64::try_from(entry.override_rev_status_list_ts)
            .map_err(|_| Error::input("negative override timestamp"))?;
        map.entry(id).or_default().insert(requested, accepted);
    }
    Ok(Some(map))
}

/// Verify a presentation, writing 1 to `result_p` when it satisfies the request
/// and 0 when it does not
#[no_mangle]
pub extern "C" fn anoncreds_verify_presentation(
    presentation: ObjectHandle,
    pres_req: ObjectHandle,
    schemas: FfiList<'_, ObjectHandle>,
    schema_ids: FfiStrList<'_>,
    cred_defs: FfiList<'_, ObjectHandle>,
    cred_def_ids: FfiStrList<'_>,
    rev_reg_defs: FfiList<'_, ObjectHandle>,
    rev_reg_def_ids: FfiStrList<'_>,
    rev_status_lists: FfiList<'_, ObjectHandle>,
    nonrevoked_interval_override: FfiList<'_, FfiNonrevokedIntervalOverride<'_>>,
    result_p: *mut i8,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(result_p);
        let presentation = presentation.load()?;
        let pres_req = pres_req.load()?;

        let schema_ids = schema_ids.to_string_vec()?
            .into_iter()
            .map(SchemaId::new)
            .collect::<AnonCredsResult<Vec<_>>>()?;
        let cred_def_ids = cred_def_ids.to_string_vec()?
            .into_iter()
            .map(CredentialDefinitionId::new)
            .collect::<AnonCredsResult<Vec<_>>>()?;
        let rev_reg_def_ids = rev_reg_def_ids.to_string_vec()?
            .into_iter()
            .map(RevocationRegistryDefinitionId::new)
            .collect::<AnonCredsResult<Vec<_>>>()?;

        let schemas = AnonCredsObjectList::load(schemas.as_slice()?)?;
        let schemas = schemas.refs_map::<_, Schema>(schema_ids)?;
        let cred_defs = AnonCredsObjectList::load(cred_defs.as_slice()?)?;
        let cred_defs = cred_defs.refs_map::<_, CredentialDefinition>(cred_def_ids)?;
        let rev_reg_defs = AnonCredsObjectList::load(rev_reg_defs.as_slice()?)?;
        let rev_reg_defs = rev_reg_defs.refs_map::<_, RevocationRegistryDefinition>(rev_reg_def_ids)?;
        let rev_status_lists = AnonCredsObjectList::load(rev_status_lists.as_slice()?)?;
        let rev_status_lists = rev_status_lists.refs::<RevocationStatusList>()?;
        let overrides = overrides(&nonrevoked_interval_override)?;

        let verified = Verifier::verify_presentation(
            presentation.cast_ref::<Presentation>()?,
            pres_req.cast_ref::<PresentationRequest>()?,
            &schemas,
            &cred_defs,
            (!rev_reg_defs.is_empty()).then_some(&rev_reg_defs),
            (!rev_status_lists.is_empty()).then_some(rev_status_lists),
            overrides.as_ref(),
        )?;
        write_out!(result_p, i8::from(verified));
        Ok(())
    })
}
