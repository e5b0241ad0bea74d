//! Program loader: reads AVM program images from disk.
//!
//! An image is the bincode (fixed-int) encoding of [`ProgramImage`], starting with
//! the four magic bytes `AVM1`. Trailing bytes are rejected.

use crate::runtime::runtime_types::Instruction;
use crate::utils::errors::{MachineError, MachineResult};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

pub const IMAGE_MAGIC: [u8; 4] = *b"AVM1";

/// Upper bound on an image file, checked before decoding.
pub const MAX_IMAGE_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramImage {
    pub magic: [u8; 4],
    pub code: Vec<Instruction>,
}

impl ProgramImage {
    pub fn new(code: Vec<Instruction>) -> Self {
        Self { magic: IMAGE_MAGIC, code }
    }

    /// Check structural validity. Returns the non-fatal findings that diagnostic
    /// mode reports; fatal problems are errors.
    pub fn validate(&self) -> MachineResult<Vec<String>> {
        if self.code.is_empty() {
            return Err(MachineError::EmptyProgram);
        }

        let len = self.code.len() as u64;
        let mut targets = HashSet::new();
        for (pc, ins) in self.code.iter().enumerate() {
            if let Some(target) = ins.jump_target() {
                if target >= len {
                    return Err(MachineError::InvalidJump { pc, target });
                }
                targets.insert(target as usize);
            }
        }

        let mut warnings = Vec::new();
        if !self.code.iter().any(|i| *i == Instruction::Halt) {
            warnings.push("program has no halt instruction".to_string());
        }
        for pc in 1..self.code.len() {
            let falls_through = !matches!(
                self.code[pc - 1],
                Instruction::Halt | Instruction::Error | Instruction::Jump(_)
            );
            if !falls_through && !targets.contains(&pc) {
                warnings.push(format!("instruction {} is unreachable", pc));
            }
        }
        Ok(warnings)
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding()
}

/// Read at most `limit` bytes; a longer file is `TooLarge` without reading the rest.
fn read_bounded(path: &Path, limit: u64) -> MachineResult<Vec<u8>> {
    let io_err = |source: std::io::Error| MachineError::Io { path: path.to_path_buf(), source };
    let file = File::open(path).map_err(io_err)?;
    let mut bytes = Vec::new();
    file.take(limit + 1).read_to_end(&mut bytes).map_err(io_err)?;
    if bytes.len() as u64 > limit {
        return Err(MachineError::TooLarge { limit });
    }
    Ok(bytes)
}

pub struct ProgramLoader;

impl ProgramLoader {
    pub fn read_image(path: &Path) -> MachineResult<ProgramImage> {
        let bytes = read_bounded(path, MAX_IMAGE_BYTES)?;
        Self::decode(&bytes)
    }

    pub fn decode(bytes: &[u8]) -> MachineResult<ProgramImage> {
        let image: ProgramImage = codec().with_limit(MAX_IMAGE_BYTES).deserialize(bytes)?;
        if image.magic != IMAGE_MAGIC {
            return Err(MachineError::BadMagic { found: image.magic });
        }
        Ok(image)
    }

    pub fn encode(image: &ProgramImage) -> MachineResult<Vec<u8>> {
        Ok(codec().serialize(image)?)
    }

    pub fn write_image(path: &Path, image: &ProgramImage) -> MachineResult<()> {
        let bytes = Self::encode(image)?;
        fs::write(path, bytes).map_err(|source| MachineError::Io { path: path.to_path_buf(), source })
    }
}
