//! Backend selection for validator AVM machines.
//!
//! [`load_machine_from_file`] takes a program path, a diagnostic (warn) flag and a
//! machine type (`go`, `cpp` or `test`, case-insensitive) and returns a boxed
//! [`Machine`] from the matching backend.

pub mod cli;
pub mod loader;
pub mod machine;
pub mod runtime;
pub mod utils;

pub use loader::{load_machine_from_file, MachineLoader};
pub use machine::{BackendKind, Machine, MachineBackend};
pub use utils::errors::{LoaderError, MachineError};
