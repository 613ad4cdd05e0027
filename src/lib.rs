//! AnonCreds credential issuance, presentation and revocation built on
//! Pointcheval-Sanders signatures and the VB20 accumulator over BLS12-381.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_qualifications
)]
#![deny(unused_import_braces)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Credential definitions and their key correctness proofs
pub mod cred_def;
/// Credentials, offers, requests and attribute values
pub mod credential;
/// Errors produced by this crate
pub mod error;
/// The flat C interface
pub mod ffi;
/// Object identifiers
pub mod identifiers;
/// Issuer operations
pub mod issuer;
/// Cryptographic primitives
pub mod knox;
/// The holder's link secret
pub mod link_secret;
/// Presentation request and verifier nonces
pub mod nonce;
/// Zero-knowledge presentations
pub mod presentation;
/// Presentation requests from a verifier
pub mod presentation_request;
/// Holder operations
pub mod prover;
/// Revocation registries, status lists and witnesses
pub mod revocation_registry;
/// Credential schemas
pub mod schema;
/// Verifier operations
pub mod verifier;

mod utils;

/// The result type for this crate
pub type AnonCredsResult<T> = Result<T, error::Error>;

/// Commonly used types
pub mod prelude {
    pub use super::{
        cred_def::*,
        credential::*,
        error::{Error, ErrorKind},
        identifiers::*,
        issuer::*,
        link_secret::*,
        nonce::*,
        presentation::*,
        presentation_request::*,
        prover::*,
        revocation_registry::*,
        schema::*,
        verifier::*,
        AnonCredsResult,
    };
}
