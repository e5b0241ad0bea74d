use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::runtime::Instruction;

/// Loader defaults read from a TOML file with a `[machine]` table.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct LoaderConfig {
    #[serde(default)]
    pub machine: MachineSection,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MachineSection {
    /// Passed to the loader as-is; the loader decides whether it is valid.
    pub vm_type: String,
    pub warn_mode: bool,
    pub max_steps: u64,
}

impl Default for MachineSection {
    fn default() -> Self {
        Self { vm_type: "go".to_string(), warn_mode: false, max_steps: 10_000 }
    }
}

impl LoaderConfig {
    /// Load loader config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self> {
        let cfg: LoaderConfig = toml::from_str(data)?;
        Ok(cfg)
    }
}

/// Instruction listing accepted by `avm-loader assemble`:
///
/// ```toml
/// code = ["nop", { push = 5 }, "log", "halt"]
/// ```
#[derive(Debug, Deserialize, Clone)]
pub struct Listing {
    pub code: Vec<Instruction>,
}

impl Listing {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let listing: Listing = toml::from_str(&data)?;
        Ok(listing)
    }
}
