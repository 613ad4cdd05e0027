use crate::error::{Error, ErrorKind};
use crate::AnonCredsResult;
use ffi_support::rust_string_to_c;
use log::trace;
use serde::Serialize;
use std::cell::RefCell;
use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};

thread_local! {
    static LAST_ERROR: RefCell<Option<Error>> = const { RefCell::new(None) };
}

/// Status of a C call
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize)]
#[repr(usize)]
pub enum ErrorCode {
    /// The call succeeded
    Success = 0,
    /// See [`ErrorKind::Input`]
    Input = 1,
    /// See [`ErrorKind::IOError`]
    IOError = 2,
    /// See [`ErrorKind::InvalidState`]
    InvalidState = 3,
    /// See [`ErrorKind::Unexpected`]
    Unexpected = 4,
    /// See [`ErrorKind::CredentialRevoked`]
    CredentialRevoked = 5,
    /// See [`ErrorKind::InvalidUserRevocId`]
    InvalidUserRevocId = 6,
    /// See [`ErrorKind::ProofRejected`]
    ProofRejected = 7,
    /// See [`ErrorKind::RevocationRegistryFull`]
    RevocationRegistryFull = 8,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Input => Self::Input,
            ErrorKind::IOError => Self::IOError,
            ErrorKind::InvalidState => Self::InvalidState,
            ErrorKind::Unexpected => Self::Unexpected,
            ErrorKind::CredentialRevoked => Self::CredentialRevoked,
            ErrorKind::InvalidUserRevocId => Self::InvalidUserRevocId,
            ErrorKind::ProofRejected => Self::ProofRejected,
            ErrorKind::RevocationRegistryFull => Self::RevocationRegistryFull,
        }
    }
}

/// Write the last error of this thread as `{"code", "message"}` JSON and clear it.
/// Release the string with `anoncreds_string_free`
#[no_mangle]
pub extern "C" fn anoncreds_get_current_error(error_json_p: *mut *const c_char) -> ErrorCode {
    trace!("anoncreds_get_current_error");
    if error_json_p.is_null() {
        return ErrorCode::Input;
    }
    let error = rust_string_to_c(get_current_error_json());
    write_out!(error_json_p, error);
    ErrorCode::Success
}

/// Run `f`, recording its error or panic for `anoncreds_get_current_error`
pub(crate) fn catch_error<F>(f: F) -> ErrorCode
where
    F: FnOnce() -> AnonCredsResult<()> + UnwindSafe,
{
    match catch_unwind(f) {
        Ok(Ok(())) => ErrorCode::Success,
        Ok(Err(err)) => set_last_error(Some(err)),
        Err(_) => set_last_error(Some(Error::unexpected("panic during execution"))),
    }
}

pub(crate) fn get_current_error_json() -> String {
    match LAST_ERROR.with(|e| e.borrow_mut().take()) {
        Some(err) => {
            let code = ErrorCode::from(err.kind()) as usize;
            serde_json::json!({"code": code, "message": err.message()}).to_string()
        }
        None => serde_json::json!({"code": 0, "message": null}).to_string(),
    }
}

pub(crate) fn set_last_error(error: Option<Error>) -> ErrorCode {
    let code = error
        .as_ref()
        .map_or(ErrorCode::Success, |err| err.kind().into());
    LAST_ERROR.with(|e| *e.borrow_mut() = error);
    code
}
