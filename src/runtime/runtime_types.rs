//! Common runtime types: instructions, machine status, assertions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA-256 digest of a machine's full state.
pub type MachineHash = [u8; 32];

/// One AVM instruction. Immediates are absolute program counters or literal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Nop,
    Push(u64),
    Pop,
    Dup,
    Swap,
    Add,
    Sub,
    Mul,
    Jump(u64),
    JumpIf(u64),
    /// Pop the top value into the assertion's log.
    Log,
    Halt,
    Error,
}

impl Instruction {
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Nop => 0x00,
            Instruction::Push(_) => 0x01,
            Instruction::Pop => 0x02,
            Instruction::Dup => 0x03,
            Instruction::Swap => 0x04,
            Instruction::Add => 0x10,
            Instruction::Sub => 0x11,
            Instruction::Mul => 0x12,
            Instruction::Jump(_) => 0x20,
            Instruction::JumpIf(_) => 0x21,
            Instruction::Log => 0x30,
            Instruction::Halt => 0x40,
            Instruction::Error => 0x41,
        }
    }

    pub fn immediate(&self) -> Option<u64> {
        match self {
            Instruction::Push(v) | Instruction::Jump(v) | Instruction::JumpIf(v) => Some(*v),
            _ => None,
        }
    }

    pub fn jump_target(&self) -> Option<u64> {
        match self {
            Instruction::Jump(t) | Instruction::JumpIf(t) => Some(*t),
            _ => None,
        }
    }

    pub fn gas_cost(&self) -> u64 {
        match self {
            Instruction::Mul => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    /// Runnable.
    Extensive,
    Halted,
    ErrorStop,
}

impl MachineStatus {
    pub fn tag(&self) -> u8 {
        match self {
            MachineStatus::Extensive => 0,
            MachineStatus::Halted => 1,
            MachineStatus::ErrorStop => 2,
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MachineStatus::Extensive => "extensive",
            MachineStatus::Halted => "halted",
            MachineStatus::ErrorStop => "error-stop",
        };
        f.write_str(s)
    }
}

/// Summary of one bounded run of a machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    #[serde(serialize_with = "crate::utils::serde_helpers::hash_as_hex")]
    #[serde(deserialize_with = "crate::utils::serde_helpers::hash_from_hex")]
    pub before_hash: MachineHash,
    #[serde(serialize_with = "crate::utils::serde_helpers::hash_as_hex")]
    #[serde(deserialize_with = "crate::utils::serde_helpers::hash_from_hex")]
    pub after_hash: MachineHash,
    pub num_steps: u64,
    pub num_gas: u64,
    pub logs: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_json_uses_hex_hashes() {
        let a = Assertion {
            before_hash: [0xab; 32],
            after_hash: [0x01; 32],
            num_steps: 4,
            num_gas: 6,
            logs: vec![7],
        };
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains(&"ab".repeat(32)));
        let back: Assertion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn short_hex_hash_is_rejected() {
        let json = r#"{"before_hash":"abcd","after_hash":"abcd","num_steps":0,"num_gas":0,"logs":[]}"#;
        assert!(serde_json::from_str::<Assertion>(json).is_err());
    }
}
