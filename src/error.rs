//! Error type shared across the calibration pipeline.
//!
//! Every fatal condition gets its own variant so callers (and tests) can
//! distinguish a misconfiguration from a missing input or a store-key
//! collision. Non-fatal conditions (a single object's correction failing,
//! a broken provenance link) are logged at the call site and never surface
//! here.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CalibError {
    /// Bad configuration detected before or during `initialize`.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A lifecycle entry point was called out of order.
    #[error("lifecycle violation: {0}")]
    Lifecycle(String),

    /// A required object was absent from the event store.
    #[error("missing required input '{0}' in the event store")]
    MissingInput(String),

    /// A store key resolved to an object of the wrong kind.
    #[error("store object '{key}' is a {found}, expected a {expected}")]
    WrongKind {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Recording under an already-used key. The store never overwrites.
    #[error("store key '{0}' is already recorded")]
    KeyCollision(String),

    /// The smearing tool does not support the requested variation.
    #[error("unsupported systematic variation '{0}'")]
    UnsupportedVariation(String),

    /// Origin-link bookkeeping found mismatched collection sizes.
    #[error("cannot link copies to originals: input has {input} entries, copy has {copy}")]
    LinkMismatch { input: usize, copy: usize },

    /// Filesystem/serialization failure during export.
    #[error("{0}")]
    Io(String),
}

impl CalibError {
    /// Process exit code for the `taucal` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            CalibError::Config(_) | CalibError::Lifecycle(_) => 2,
            CalibError::MissingInput(_) | CalibError::WrongKind { .. } => 3,
            CalibError::KeyCollision(_)
            | CalibError::UnsupportedVariation(_)
            | CalibError::LinkMismatch { .. } => 4,
            CalibError::Io(_) => 2,
        }
    }
}
