use super::error::{catch_error, ErrorCode};
use crate::cred_def::{CredentialDefinition, CredentialDefinitionPrivate, KeyCorrectnessProof};
use crate::credential::{Credential, CredentialOffer, CredentialRequest, CredentialRequestMetadata};
use crate::error::Error;
use crate::presentation::Presentation;
use crate::presentation_request::PresentationRequest;
use crate::revocation_registry::{
    RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate, RevocationRegistryDelta,
    RevocationState, RevocationStatusList,
};
use crate::schema::Schema;
use crate::AnonCredsResult;
use ffi_support::{rust_string_to_c, ByteBuffer};
use lazy_static::lazy_static;
use serde::Serialize;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use std::os::raw::c_char;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

lazy_static! {
    static ref FFI_OBJECTS: Mutex<BTreeMap<ObjectHandle, AnonCredsObject>> =
        Mutex::new(BTreeMap::new());
}

static FFI_OBJECT_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// An opaque reference to an object held by the library. Zero is no object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ObjectHandle(pub usize);

impl ObjectHandle {
    fn next() -> Self {
        Self(FFI_OBJECT_COUNTER.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub(crate) fn create<O: AnyAnonCredsObject>(value: O) -> AnonCredsResult<Self> {
        let handle = Self::next();
        objects()?.insert(handle, AnonCredsObject::new(value));
        Ok(handle)
    }

    pub(crate) fn load(self) -> AnonCredsResult<AnonCredsObject> {
        objects()?
            .get(&self)
            .cloned()
            .ok_or_else(|| Error::input(format!("invalid object handle {}", self.0)))
    }

    pub(crate) fn opt_load(self) -> AnonCredsResult<Option<AnonCredsObject>> {
        if self.0 == 0 {
            Ok(None)
        } else {
            self.load().map(Some)
        }
    }

    pub(crate) fn remove(self) -> AnonCredsResult<AnonCredsObject> {
        objects()?
            .remove(&self)
            .ok_or_else(|| Error::input(format!("invalid object handle {}", self.0)))
    }
}

fn objects() -> AnonCredsResult<std::sync::MutexGuard<'static, BTreeMap<ObjectHandle, AnonCredsObject>>>
{
    FFI_OBJECTS
        .lock()
        .map_err(|_| Error::unexpected("object store lock is poisoned"))
}

/// A stored object. Clones share the value
#[derive(Clone, Debug)]
pub(crate) struct AnonCredsObject(Arc<dyn AnyAnonCredsObject>);

impl AnonCredsObject {
    fn new<O: AnyAnonCredsObject>(value: O) -> Self {
        Self(Arc::new(value))
    }

    pub fn cast_ref<O: AnyAnonCredsObject>(&self) -> AnonCredsResult<&O> {
        self.0.as_any().downcast_ref::<O>().ok_or_else(|| {
            Error::input(format!(
                "expected {} instance, received {}",
                std::any::type_name::<O>().rsplit("::").next().unwrap_or_default(),
                self.0.type_name()
            ))
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub fn to_json(&self) -> AnonCredsResult<Vec<u8>> {
        self.0.to_json()
    }
}

/// Objects the store can hold
pub(crate) trait AnyAnonCredsObject: Debug + Send + Sync + 'static {
    fn type_name(&self) -> &'static str;

    fn to_json(&self) -> AnonCredsResult<Vec<u8>>;

    fn as_any(&self) -> &dyn Any;
}

fn to_json<T: Serialize>(value: &T) -> AnonCredsResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::unexpected(format!("error serializing object: {}", e)))
}

macro_rules! impl_anoncreds_object {
    ($ident:ty, $name:expr) => {
        impl AnyAnonCredsObject for $ident {
            fn type_name(&self) -> &'static str {
                $name
            }

            fn to_json(&self) -> AnonCredsResult<Vec<u8>> {
                to_json(self)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

/// Defines `$method(json, result_p)` loading a `$ident` from JSON into a new handle
macro_rules! impl_anoncreds_object_from_json {
    ($ident:ty, $method:ident) => {
        #[doc = concat!("Load a `", stringify!($ident), "` from JSON")]
        #[no_mangle]
        pub extern "C" fn $method(json: ByteBuffer, result_p: *mut ObjectHandle) -> ErrorCode {
            catch_error(|| {
                check_useful_c_ptr!(result_p);
                let obj = serde_json::from_slice::<$ident>(json.as_slice())?;
                let handle = ObjectHandle::create(obj)?;
                write_out!(result_p, handle);
                Ok(())
            })
        }
    };
}

impl_anoncreds_object!(Schema, "Schema");
impl_anoncreds_object!(CredentialDefinition, "CredentialDefinition");
impl_anoncreds_object!(CredentialDefinitionPrivate, "CredentialDefinitionPrivate");
impl_anoncreds_object!(KeyCorrectnessProof, "KeyCorrectnessProof");
impl_anoncreds_object!(CredentialOffer, "CredentialOffer");
impl_anoncreds_object!(CredentialRequest, "CredentialRequest");
impl_anoncreds_object!(CredentialRequestMetadata, "CredentialRequestMetadata");
impl_anoncreds_object!(Credential, "Credential");
impl_anoncreds_object!(RevocationRegistryDefinition, "RevocationRegistryDefinition");
impl_anoncreds_object!(
    RevocationRegistryDefinitionPrivate,
    "RevocationRegistryDefinitionPrivate"
);
impl_anoncreds_object!(RevocationStatusList, "RevocationStatusList");
impl_anoncreds_object!(RevocationRegistryDelta, "RevocationRegistryDelta");
impl_anoncreds_object!(RevocationState, "RevocationState");
impl_anoncreds_object!(PresentationRequest, "PresentationRequest");
impl_anoncreds_object!(Presentation, "Presentation");

impl_anoncreds_object_from_json!(Schema, anoncreds_schema_from_json);
impl_anoncreds_object_from_json!(CredentialDefinition, anoncreds_credential_definition_from_json);
impl_anoncreds_object_from_json!(
    CredentialDefinitionPrivate,
    anoncreds_credential_definition_private_from_json
);
impl_anoncreds_object_from_json!(KeyCorrectnessProof, anoncreds_key_correctness_proof_from_json);
impl_anoncreds_object_from_json!(CredentialOffer, anoncreds_credential_offer_from_json);
impl_anoncreds_object_from_json!(CredentialRequest, anoncreds_credential_request_from_json);
impl_anoncreds_object_from_json!(
    CredentialRequestMetadata,
    anoncreds_credential_request_metadata_from_json
);
impl_anoncreds_object_from_json!(Credential, anoncreds_credential_from_json);
impl_anoncreds_object_from_json!(
    RevocationRegistryDefinition,
    anoncreds_revocation_registry_definition_from_json
);
impl_anoncreds_object_from_json!(
    RevocationRegistryDefinitionPrivate,
    anoncreds_revocation_registry_definition_private_from_json
);
impl_anoncreds_object_from_json!(RevocationStatusList, anoncreds_revocation_status_list_from_json);
impl_anoncreds_object_from_json!(RevocationRegistryDelta, anoncreds_revocation_registry_delta_from_json);
impl_anoncreds_object_from_json!(RevocationState, anoncreds_revocation_state_from_json);
impl_anoncreds_object_from_json!(PresentationRequest, anoncreds_presentation_request_from_json);
impl_anoncreds_object_from_json!(Presentation, anoncreds_presentation_from_json);

/// Serialize an object to JSON, release the buffer with `anoncreds_buffer_free`
#[no_mangle]
pub extern "C" fn anoncreds_object_get_json(
    handle: ObjectHandle,
    result_p: *mut ByteBuffer,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(result_p);
        let json = handle.load()?.to_json()?;
        write_out!(result_p, ByteBuffer::from_vec(json));
        Ok(())
    })
}

/// The type name of an object, release with `anoncreds_string_free`
#[no_mangle]
pub extern "C" fn anoncreds_object_get_type_name(
    handle: ObjectHandle,
    result_p: *mut *const c_char,
) -> ErrorCode {
    catch_error(|| {
        check_useful_c_ptr!(result_p);
        let name = handle.load()?.type_name();
        write_out!(result_p, rust_string_to_c(name));
        Ok(())
    })
}

/// Release an object. Freeing an unknown handle is an `Input` error
#[no_mangle]
pub extern "C" fn anoncreds_object_free(handle: ObjectHandle) -> ErrorCode {
    catch_error(|| handle.remove().map(|_| ()))
}

/// Objects loaded from a list of handles
pub(crate) struct AnonCredsObjectList(Vec<AnonCredsObject>);

impl AnonCredsObjectList {
    pub fn load(handles: &[ObjectHandle]) -> AnonCredsResult<Self> {
        handles
            .iter()
            .map(|h| h.load())
            .collect::<AnonCredsResult<_>>()
            .map(Self)
    }

    pub fn refs<T: AnyAnonCredsObject>(&self) -> AnonCredsResult<Vec<&T>> {
        self.0.iter().map(|o| o.cast_ref::<T>()).collect()
    }

    /// Pair each object with the id at the same position
    pub fn refs_map<'a, I, T>(&'a self, ids: Vec<I>) -> AnonCredsResult<HashMap<I, &'a T>>
    where
        T: AnyAnonCredsObject,
        I: Eq + Hash,
    {
        if ids.len() != self.0.len() {
            return Err(Error::input("object and id lists differ in length"));
        }
        ids.into_iter()
            .zip(&self.0)
            .map(|(id, o)| Ok((id, o.cast_ref::<T>()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::IssuerId;

    #[test]
    fn handles_are_freed_once() {
        let issuer_id = IssuerId::new("did:example:issuer").unwrap();
        let schema = Schema::new(issuer_id, "gvt", "1.0", ["name"]).unwrap();
        let handle = ObjectHandle::create(schema.clone()).unwrap();
        let loaded = handle.load().unwrap();
        assert_eq!(loaded.type_name(), "Schema");
        assert_eq!(loaded.cast_ref::<Schema>().unwrap(), &schema);
        assert_eq!(
            loaded.cast_ref::<Credential>().unwrap_err().kind(),
            crate::error::ErrorKind::Input
        );

        assert_eq!(anoncreds_object_free(handle), ErrorCode::Success);
        assert_eq!(anoncreds_object_free(handle), ErrorCode::Input);
        assert!(handle.load().is_err());
        assert_eq!(ObjectHandle(0).opt_load().unwrap().map(|o| o.type_name()), None);
    }
}
