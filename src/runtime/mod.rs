//! Runtime module: the program image format and the execution core.
//!
//! Exposes:
//! - ProgramLoader / ProgramImage: reads and validates AVM program files.
//! - Core: the stack-machine stepping engine every backend drives.
//! - runtime_types: instructions, statuses and assertions.

pub mod program_loader;
pub mod interpreter;
pub mod runtime_types;

pub use program_loader::{ProgramImage, ProgramLoader, IMAGE_MAGIC};
pub use interpreter::Core;
pub use runtime_types::{Assertion, Instruction, MachineHash, MachineStatus};
