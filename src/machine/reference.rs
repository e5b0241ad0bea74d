//! Reference ("go") backend: eager load, interpreted execution.

use crate::machine::{BackendKind, Machine, MachineBackend};
use crate::runtime::{Assertion, Core, MachineHash, MachineStatus, ProgramLoader};
use crate::utils::errors::MachineResult;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ReferenceMachine {
    path: PathBuf,
    warn_mode: bool,
    core: Core,
}

impl ReferenceMachine {
    /// Read, decode and validate the image at `path`. With `warn_mode` set, the
    /// image's non-fatal findings are logged at warn level.
    pub fn load_from_file(path: impl AsRef<Path>, warn_mode: bool) -> MachineResult<Self> {
        let path = path.as_ref();
        let image = ProgramLoader::read_image(path)?;
        let warnings = image.validate()?;
        if warn_mode {
            for w in &warnings {
                warn!(path = %path.display(), "{}", w);
            }
        }
        debug!(path = %path.display(), instructions = image.code.len(), "reference machine loaded");
        Ok(Self { path: path.to_path_buf(), warn_mode, core: Core::new(&image) })
    }

    pub fn warn_mode(&self) -> bool {
        self.warn_mode
    }
}

impl Machine for ReferenceMachine {
    fn backend(&self) -> BackendKind {
        BackendKind::Reference
    }

    fn program_path(&self) -> &Path {
        &self.path
    }

    fn hash(&self) -> MachineResult<MachineHash> {
        Ok(self.core.hash())
    }

    fn status(&self) -> MachineResult<MachineStatus> {
        Ok(self.core.status())
    }

    fn execute(&mut self, max_steps: u64) -> MachineResult<Assertion> {
        let was_running = self.core.status() == MachineStatus::Extensive;
        let assertion = self.core.run(max_steps);
        if self.warn_mode && was_running && self.core.status() == MachineStatus::ErrorStop {
            warn!(path = %self.path.display(), pc = self.core.pc(), "machine stopped with error");
        }
        Ok(assertion)
    }

    fn clone_machine(&self) -> Box<dyn Machine> {
        Box::new(self.clone())
    }
}

pub struct ReferenceBackend;

impl MachineBackend for ReferenceBackend {
    fn load(&self, path: &Path, warn_mode: bool) -> MachineResult<Box<dyn Machine>> {
        Ok(Box::new(ReferenceMachine::load_from_file(path, warn_mode)?))
    }
}
