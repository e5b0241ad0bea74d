//! Native ("cpp") backend.
//!
//! Construction never fails and never touches the file: the image is read on the
//! first call that needs machine state. A failed load is remembered and returned
//! from every later call as `MachineError::LoadFailed`. There is no diagnostic
//! mode on this path.

use crate::machine::{BackendKind, Machine, MachineBackend};
use crate::runtime::{Assertion, Core, MachineHash, MachineStatus, ProgramLoader};
use crate::utils::errors::{MachineError, MachineResult};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

type LoadSlot = Option<Result<Core, Arc<MachineError>>>;

#[derive(Debug)]
pub struct NativeMachine {
    path: PathBuf,
    state: Mutex<LoadSlot>,
}

impl NativeMachine {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), state: Mutex::new(None) }
    }

    /// Whether a load has been attempted yet (successful or not).
    pub fn is_loaded(&self) -> bool {
        self.state.lock().is_some()
    }

    fn load(path: &Path) -> MachineResult<Core> {
        let image = ProgramLoader::read_image(path)?;
        image.validate()?;
        debug!(path = %path.display(), instructions = image.code.len(), "native machine loaded");
        Ok(Core::new(&image))
    }

    fn with_core<T>(&self, f: impl FnOnce(&mut Core) -> T) -> MachineResult<T> {
        let mut state = self.state.lock();
        let slot = state.get_or_insert_with(|| {
            Self::load(&self.path).map_err(|err| {
                warn!(path = %self.path.display(), %err, "native machine failed to load");
                Arc::new(err)
            })
        });
        match slot {
            Ok(core) => Ok(f(core)),
            Err(source) => Err(MachineError::LoadFailed {
                path: self.path.clone(),
                source: Arc::clone(source),
            }),
        }
    }
}

impl Clone for NativeMachine {
    fn clone(&self) -> Self {
        Self { path: self.path.clone(), state: Mutex::new(self.state.lock().clone()) }
    }
}

impl Machine for NativeMachine {
    fn backend(&self) -> BackendKind {
        BackendKind::Native
    }

    fn program_path(&self) -> &Path {
        &self.path
    }

    fn hash(&self) -> MachineResult<MachineHash> {
        self.with_core(|core| core.hash())
    }

    fn status(&self) -> MachineResult<MachineStatus> {
        self.with_core(|core| core.status())
    }

    fn execute(&mut self, max_steps: u64) -> MachineResult<Assertion> {
        self.with_core(|core| core.run(max_steps))
    }

    fn clone_machine(&self) -> Box<dyn Machine> {
        Box::new(self.clone())
    }
}

/// Adapter for the native constructor; `warn_mode` is not forwarded.
pub struct NativeBackend;

impl MachineBackend for NativeBackend {
    fn load(&self, path: &Path, _warn_mode: bool) -> MachineResult<Box<dyn Machine>> {
        Ok(Box::new(NativeMachine::new(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Instruction::*, ProgramImage};

    #[test]
    fn construction_is_lazy_and_infallible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        let m = NativeMachine::new(&path);
        assert!(!m.is_loaded());

        let err = m.hash().unwrap_err();
        assert!(m.is_loaded());
        assert!(matches!(err, MachineError::LoadFailed { .. }));
        assert!(err.to_string().contains("missing.bin"));
    }

    #[test]
    fn load_failure_keeps_its_cause() {
        use std::error::Error;

        let dir = tempfile::tempdir().unwrap();
        let m = NativeMachine::new(dir.path().join("missing.bin"));
        let err = m.status().unwrap_err();
        let cause = err.source().unwrap();
        assert!(cause.to_string().starts_with("failed to access program file"));
        let io = cause.source().unwrap();
        assert_eq!(
            io.downcast_ref::<std::io::Error>().unwrap().kind(),
            std::io::ErrorKind::NotFound
        );

        // a second call reports the same cause
        let again = m.hash().unwrap_err();
        assert_eq!(again.to_string(), err.to_string());
    }

    #[test]
    fn load_failure_is_sticky() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.bin");
        let mut m = NativeMachine::new(&path);
        assert!(m.status().is_err());

        // the file appearing later does not revive the machine
        ProgramLoader::write_image(&path, &ProgramImage::new(vec![Halt])).unwrap();
        assert!(matches!(m.execute(10), Err(MachineError::LoadFailed { .. })));
    }

    #[test]
    fn runs_once_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.bin");
        ProgramLoader::write_image(&path, &ProgramImage::new(vec![Push(9), Log, Halt])).unwrap();
        let mut m = NativeMachine::new(&path);
        let a = m.execute(10).unwrap();
        assert_eq!(a.logs, vec![9]);
        assert_eq!(m.status().unwrap(), MachineStatus::Halted);
    }

    #[test]
    fn clone_before_load_loads_separately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.bin");
        ProgramLoader::write_image(&path, &ProgramImage::new(vec![Push(1), Halt])).unwrap();
        let m = NativeMachine::new(&path);
        let copy = m.clone();
        assert!(copy.hash().is_ok());
        assert!(copy.is_loaded());
        assert!(!m.is_loaded());
    }
}
