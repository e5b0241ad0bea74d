//! Machine module: the capability set every backend produces, and the backends.
//!
//! - Machine: object-safe trait the loader hands back to callers.
//! - MachineBackend: one constructor per backend, with a uniform signature.
//! - BackendKind: the closed set of backends and the only place raw
//!   machine-type strings are interpreted.
//! - reference ("go"), native ("cpp"), instrumented ("test").

pub mod reference;
pub mod native;
pub mod instrumented;

pub use reference::{ReferenceBackend, ReferenceMachine};
pub use native::{NativeBackend, NativeMachine};
pub use instrumented::{InstrumentedBackend, InstrumentedMachine};

use crate::runtime::{Assertion, MachineHash, MachineStatus};
use crate::utils::errors::{LoaderError, MachineResult};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A loaded, independently executable program.
pub trait Machine: Send + fmt::Debug {
    fn backend(&self) -> BackendKind;

    /// File the machine was loaded from.
    fn program_path(&self) -> &Path;

    fn hash(&self) -> MachineResult<MachineHash>;

    fn status(&self) -> MachineResult<MachineStatus>;

    /// Run for at most `max_steps` instructions.
    fn execute(&mut self, max_steps: u64) -> MachineResult<Assertion>;

    /// Deep copy; the clone and the original evolve independently.
    fn clone_machine(&self) -> Box<dyn Machine>;
}

/// Constructor for one backend. Adapters absorb their backend's quirks so the
/// loader can call every backend the same way.
pub trait MachineBackend: Send + Sync {
    fn load(&self, path: &Path, warn_mode: bool) -> MachineResult<Box<dyn Machine>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Interpreted reference machine ("go").
    Reference,
    /// Native machine with deferred loading ("cpp").
    Native,
    /// Reference and native run side by side ("test").
    Instrumented,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] =
        [BackendKind::Reference, BackendKind::Native, BackendKind::Instrumented];

    /// Case-insensitive match against `go`, `cpp` and `test`, in that order,
    /// under Unicode simple case folding. No trimming or aliasing.
    pub fn parse(vm_type: &str) -> Result<Self, LoaderError> {
        Self::ALL
            .into_iter()
            .find(|kind| eq_fold_ascii(vm_type, kind.as_str()))
            .ok_or_else(|| LoaderError::UnrecognizedBackend(vm_type.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Reference => "go",
            BackendKind::Native => "cpp",
            BackendKind::Instrumented => "test",
        }
    }

    pub fn metric_name(&self) -> &'static str {
        match self {
            BackendKind::Reference => "loader.go",
            BackendKind::Native => "loader.cpp",
            BackendKind::Instrumented => "loader.test",
        }
    }
}

/// Simple case folding onto ASCII. Outside ASCII only KELVIN SIGN (folds to `k`)
/// and LATIN SMALL LETTER LONG S (folds to `s`) land on an ASCII letter.
fn fold_to_ascii(c: char) -> Option<char> {
    match c {
        '\u{212A}' => Some('k'),
        '\u{017F}' => Some('s'),
        c if c.is_ascii() => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

/// `input` equals the ASCII `literal` under simple case folding.
fn eq_fold_ascii(input: &str, literal: &str) -> bool {
    input
        .chars()
        .map(fold_to_ascii)
        .eq(literal.chars().map(|c| Some(c.to_ascii_lowercase())))
}

impl FromStr for BackendKind {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
