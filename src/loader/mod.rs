//! Machine loader: turns (program path, warn flag, machine type) into a machine.
//!
//! The machine type is matched case-insensitively against `go`, `cpp` and `test`.
//! Exactly one backend constructor runs per call, and none runs when the type is
//! not recognized. Backend errors are returned unchanged. The loader keeps no
//! state between calls, so concurrent use needs no coordination.

use crate::machine::{
    BackendKind, InstrumentedBackend, Machine, MachineBackend, NativeBackend, ReferenceBackend,
};
use crate::utils::errors::LoaderError;
use crate::utils::metrics::METRICS;
use std::path::Path;
use tracing::{info, warn};

/// Load a machine from `path` using the built-in backends.
pub fn load_machine_from_file(
    path: impl AsRef<Path>,
    warn_mode: bool,
    vm_type: &str,
) -> Result<Box<dyn Machine>, LoaderError> {
    MachineLoader::default().load(path, warn_mode, vm_type)
}

/// Dispatch table from [`BackendKind`] to backend constructors.
pub struct MachineLoader {
    reference: Box<dyn MachineBackend>,
    native: Box<dyn MachineBackend>,
    instrumented: Box<dyn MachineBackend>,
}

impl Default for MachineLoader {
    fn default() -> Self {
        Self::new(
            Box::new(ReferenceBackend),
            Box::new(NativeBackend),
            Box::new(InstrumentedBackend),
        )
    }
}

impl MachineLoader {
    pub fn new(
        reference: Box<dyn MachineBackend>,
        native: Box<dyn MachineBackend>,
        instrumented: Box<dyn MachineBackend>,
    ) -> Self {
        Self { reference, native, instrumented }
    }

    pub fn backend(&self, kind: BackendKind) -> &dyn MachineBackend {
        match kind {
            BackendKind::Reference => self.reference.as_ref(),
            BackendKind::Native => self.native.as_ref(),
            BackendKind::Instrumented => self.instrumented.as_ref(),
        }
    }

    pub fn load(
        &self,
        path: impl AsRef<Path>,
        warn_mode: bool,
        vm_type: &str,
    ) -> Result<Box<dyn Machine>, LoaderError> {
        METRICS.inc_counter("loader.requests");
        let kind = BackendKind::parse(vm_type).map_err(|e| {
            METRICS.inc_counter("loader.rejected");
            warn!(vm_type, "rejected unknown machine type");
            e
        })?;
        self.load_kind(path, warn_mode, kind)
    }

    /// Load with an already-parsed backend kind.
    pub fn load_kind(
        &self,
        path: impl AsRef<Path>,
        warn_mode: bool,
        kind: BackendKind,
    ) -> Result<Box<dyn Machine>, LoaderError> {
        let path = path.as_ref();
        info!(backend = %kind, path = %path.display(), warn_mode, "loading machine");
        METRICS.inc_counter(kind.metric_name());
        Ok(self.backend(kind).load(path, warn_mode)?)
    }
}
