//! A flat C interface over the engine.
//!
//! Every function returns an [`ErrorCode`] and writes results through out
//! pointers. Objects cross the boundary as [`ObjectHandle`]s into a process
//! wide store; strings returned to the caller are released with
//! [`anoncreds_string_free`] and buffers with [`anoncreds_buffer_free`].
#![allow(clippy::not_unsafe_ptr_arg_deref, clippy::too_many_arguments)]

#[macro_use]
mod macros;

mod error;
mod issuer;
mod object;
mod prover;
mod verifier;

pub use error::{anoncreds_get_current_error, ErrorCode};
pub use issuer::*;
pub use object::*;
pub use prover::*;
pub use verifier::*;

use crate::error::Error;
use crate::AnonCredsResult;
use error::catch_error;
use ffi_support::{rust_string_to_c, ByteBuffer, FfiStr};
use log::debug;
use std::marker::PhantomData;
use std::os::raw::c_char;
use zeroize::Zeroize;

/// The crate version
pub static LIB_VERSION: &str = env!("CARGO_PKG_VERSION");

ffi_support::define_string_destructor!(anoncreds_string_free);

/// Release a buffer returned by this library
#[no_mangle]
pub extern "C" fn anoncreds_buffer_free(buffer: ByteBuffer) {
    ffi_support::abort_on_panic::with_abort_on_panic(|| {
        buffer.destroy_into_vec().zeroize();
    });
}

/// A `count` and `data` pointer pair describing a list passed in by the caller
#[repr(C)]
#[derive(Debug)]
pub struct FfiList<'a, T> {
    count: usize,
    data: *const T,
    _pd: PhantomData<&'a [T]>,
}

impl<'a, T> FfiList<'a, T> {
    /// Describe a Rust slice
    pub fn from_slice(slice: &'a [T]) -> Self {
        Self {
            count: slice.len(),
            data: slice.as_ptr(),
            _pd: PhantomData,
        }
    }

    /// Borrow the list, `Input` when a non empty list has no data
    pub fn as_slice(&self) -> AnonCredsResult<&'a [T]> {
        if self.count == 0 {
            Ok(&[])
        } else if self.data.is_null() {
            Err(Error::input("list has a count but no data"))
        } else {
            // SAFETY: the caller guarantees `count` readable elements
            Ok(unsafe { std::slice::from_raw_parts(self.data, self.count) })
        }
    }

    /// Map every entry, stopping at the first error
    pub fn try_collect<R>(&self, f: impl FnMut(&T) -> AnonCredsResult<R>) -> AnonCredsResult<Vec<R>> {
        self.as_slice()?.iter().map(f).collect()
    }
}

/// A list of strings
pub type FfiStrList<'a> = FfiList<'a, FfiStr<'a>>;

impl FfiStrList<'_> {
    /// Copy out the strings, `Input` on a null entry
    pub fn to_string_vec(&self) -> AnonCredsResult<Vec<String>> {
        self.try_collect(|s| required(s, "list entry").map(str::to_owned))
    }
}

/// A required string argument
pub(crate) fn required<'a>(s: &FfiStr<'a>, name: &str) -> AnonCredsResult<&'a str> {
    s.as_opt_str()
        .ok_or_else(|| Error::input(format!("missing required argument '{}'", name)))
}

/// Install `env_logger`, filtered by `RUST_LOG`
#[no_mangle]
pub extern "C" fn anoncreds_set_default_logger() -> ErrorCode {
    catch_error(|| {
        env_logger::try_init().map_err(|e| Error::unexpected(e.to_string()))?;
        debug!("initialized default logger");
        Ok(())
    })
}

/// The library version, release with [`anoncreds_string_free`]
#[no_mangle]
pub extern "C" fn anoncreds_version() -> *mut c_char {
    rust_string_to_c(LIB_VERSION)
}
