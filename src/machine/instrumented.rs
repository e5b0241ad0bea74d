//! Instrumented ("test") backend.
//!
//! Runs a reference machine and a native machine over the same program in
//! lockstep and fails with `MachineError::Divergence` as soon as their hashes,
//! statuses or assertions disagree.

use crate::machine::{BackendKind, Machine, MachineBackend, NativeMachine, ReferenceMachine};
use crate::runtime::{Assertion, MachineHash, MachineStatus};
use crate::utils::errors::{MachineError, MachineResult};
use std::path::Path;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct InstrumentedMachine {
    reference: ReferenceMachine,
    native: NativeMachine,
    runs: u64,
}

impl InstrumentedMachine {
    pub fn new(path: impl AsRef<Path>, warn_mode: bool) -> MachineResult<Self> {
        let path = path.as_ref();
        let reference = ReferenceMachine::load_from_file(path, warn_mode)?;
        let native = NativeMachine::new(path);
        let machine = Self { reference, native, runs: 0 };
        machine.check("load")?;
        debug!(path = %path.display(), "instrumented machine loaded");
        Ok(machine)
    }

    /// Number of successful `execute` calls so far.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    fn check(&self, context: &str) -> MachineResult<MachineHash> {
        let reference = self.reference.hash()?;
        let native = self.native.hash()?;
        if reference != native {
            return Err(divergence(context, hex::encode(reference), hex::encode(native)));
        }
        let (rs, ns) = (self.reference.status()?, self.native.status()?);
        if rs != ns {
            return Err(divergence(context, rs.to_string(), ns.to_string()));
        }
        Ok(reference)
    }
}

fn divergence(context: &str, reference: String, native: String) -> MachineError {
    error!(context, %reference, %native, "backend divergence");
    MachineError::Divergence { context: context.to_string(), reference, native }
}

impl Machine for InstrumentedMachine {
    fn backend(&self) -> BackendKind {
        BackendKind::Instrumented
    }

    fn program_path(&self) -> &Path {
        self.reference.program_path()
    }

    fn hash(&self) -> MachineResult<MachineHash> {
        self.check("hash")
    }

    fn status(&self) -> MachineResult<MachineStatus> {
        self.check("status")?;
        self.reference.status()
    }

    fn execute(&mut self, max_steps: u64) -> MachineResult<Assertion> {
        let expected = self.reference.execute(max_steps)?;
        let actual = self.native.execute(max_steps)?;
        if expected != actual {
            return Err(divergence("execute", format!("{:?}", expected), format!("{:?}", actual)));
        }
        self.check("execute")?;
        self.runs += 1;
        Ok(expected)
    }

    fn clone_machine(&self) -> Box<dyn Machine> {
        Box::new(self.clone())
    }
}

pub struct InstrumentedBackend;

impl MachineBackend for InstrumentedBackend {
    fn load(&self, path: &Path, warn_mode: bool) -> MachineResult<Box<dyn Machine>> {
        Ok(Box::new(InstrumentedMachine::new(path, warn_mode)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Instruction::*, ProgramImage, ProgramLoader};

    #[test]
    fn lockstep_run_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.bin");
        let code = vec![Push(3), Push(1), Sub, Dup, JumpIf(1), Halt];
        ProgramLoader::write_image(&path, &ProgramImage::new(code)).unwrap();

        let mut m = InstrumentedMachine::new(&path, false).unwrap();
        m.execute(5).unwrap();
        let a = m.execute(100).unwrap();
        assert_eq!(m.runs(), 2);
        assert_eq!(m.status().unwrap(), MachineStatus::Halted);
        assert_eq!(a.after_hash, m.hash().unwrap());
    }

    #[test]
    fn file_swapped_after_reference_load_diverges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.bin");
        ProgramLoader::write_image(&path, &ProgramImage::new(vec![Halt])).unwrap();
        let reference = ReferenceMachine::load_from_file(&path, false).unwrap();

        ProgramLoader::write_image(&path, &ProgramImage::new(vec![Nop, Halt])).unwrap();
        let m = InstrumentedMachine { reference, native: NativeMachine::new(&path), runs: 0 };
        let err = m.hash().unwrap_err();
        assert!(matches!(err, MachineError::Divergence { ref context, .. } if context == "hash"));
    }

    #[test]
    fn missing_file_fails_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let err = InstrumentedMachine::new(dir.path().join("nope.bin"), true).unwrap_err();
        assert!(matches!(err, MachineError::Io { .. }));
    }
}
