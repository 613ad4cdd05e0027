use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// The category of an [`Error`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ErrorKind {
    /// Caller supplied data is malformed or out of policy
    Input,
    /// Tails data or another external resource is unavailable
    IOError,
    /// Object preconditions were violated
    InvalidState,
    /// Internal invariant violation
    Unexpected,
    /// A revoked credential was used
    CredentialRevoked,
    /// The revocation index is outside the registry
    InvalidUserRevocId,
    /// Cryptographic verification failed
    ProofRejected,
    /// No free revocation index remains
    RevocationRegistryFull,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "Input error",
            Self::IOError => "IO error",
            Self::InvalidState => "Invalid state",
            Self::Unexpected => "Unexpected error",
            Self::CredentialRevoked => "Credential revoked",
            Self::InvalidUserRevocId => "Invalid revocation index",
            Self::ProofRejected => "Proof rejected",
            Self::RevocationRegistryFull => "Revocation registry full",
        };
        write!(f, "{}", s)
    }
}

/// Errors created by this library
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Caller supplied data is malformed or out of policy
    Input(String),
    /// Tails data or another external resource is unavailable
    IOError(String),
    /// Object preconditions were violated, e.g. merging divergent deltas
    InvalidState(String),
    /// Internal invariant violation or randomness failure
    Unexpected(String),
    /// Attempted to present or use a revoked credential
    CredentialRevoked(String),
    /// Revocation index is outside `[0, max_cred_num)`
    InvalidUserRevocId(String),
    /// Cryptographic verification failed
    ProofRejected(String),
    /// The revocation registry has no free index
    RevocationRegistryFull(String),
}

impl Error {
    /// The category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::IOError(_) => ErrorKind::IOError,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Unexpected(_) => ErrorKind::Unexpected,
            Self::CredentialRevoked(_) => ErrorKind::CredentialRevoked,
            Self::InvalidUserRevocId(_) => ErrorKind::InvalidUserRevocId,
            Self::ProofRejected(_) => ErrorKind::ProofRejected,
            Self::RevocationRegistryFull(_) => ErrorKind::RevocationRegistryFull,
        }
    }

    /// The human readable message
    pub fn message(&self) -> &str {
        match self {
            Self::Input(m)
            | Self::IOError(m)
            | Self::InvalidState(m)
            | Self::Unexpected(m)
            | Self::CredentialRevoked(m)
            | Self::InvalidUserRevocId(m)
            | Self::ProofRejected(m)
            | Self::RevocationRegistryFull(m) => m.as_str(),
        }
    }

    pub(crate) fn input<M: Into<String>>(msg: M) -> Self {
        Self::Input(msg.into())
    }

    pub(crate) fn unexpected<M: Into<String>>(msg: M) -> Self {
        Self::Unexpected(msg.into())
    }

    pub(crate) fn rejected<M: Into<String>>(msg: M) -> Self {
        Self::ProofRejected(msg.into())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.message().is_empty() {
            write!(f, "{}", self.kind())
        } else {
            write!(f, "{}: {}", self.kind(), self.message())
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Input(format!("invalid json: {}", e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(e.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Self::Unexpected(format!("invalid regular expression: {}", e))
    }
}
