use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a machine backend while loading or running a program.
#[derive(Error, Debug)]
pub enum MachineError {
    #[error("failed to access program file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("program image codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("bad program magic {found:?}")]
    BadMagic { found: [u8; 4] },

    #[error("program image exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("program has no instructions")]
    EmptyProgram,

    #[error("instruction {pc} jumps to {target}, outside of program")]
    InvalidJump { pc: usize, target: u64 },

    /// A deferred load failed; every later call returns the same cause.
    #[error("machine at {} failed to load: {source}", .path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: Arc<MachineError>,
    },

    #[error("backends diverged on {context}: reference {reference}, native {native}")]
    Divergence {
        context: String,
        reference: String,
        native: String,
    },
}

/// Errors returned by the machine loader.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// The backend selector matched none of the known machine types.
    #[error("invalid machine type specified {0:?}")]
    UnrecognizedBackend(String),

    /// The selected backend failed; passed through untouched.
    #[error(transparent)]
    Backend(#[from] MachineError),
}

/// Convenience alias
pub type MachineResult<T> = std::result::Result<T, MachineError>;
