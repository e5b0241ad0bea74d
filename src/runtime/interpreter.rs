//! Stack-machine core shared by every backend.
//!
//! Arithmetic wraps. A stack underflow, stack overflow, an `error` instruction or
//! running off the end of the code moves the machine to `ErrorStop`.

use crate::runtime::program_loader::ProgramImage;
use crate::runtime::runtime_types::{Assertion, Instruction, MachineHash, MachineStatus};
use sha2::{Digest, Sha256};
use std::sync::Arc;

pub const MAX_STACK_DEPTH: usize = 1 << 16;

#[derive(Debug, Clone)]
pub struct Core {
    code: Arc<[Instruction]>,
    code_digest: [u8; 32],
    pc: u64,
    stack: Vec<u64>,
    status: MachineStatus,
}

impl Core {
    pub fn new(image: &ProgramImage) -> Self {
        let mut hasher = Sha256::new();
        for ins in &image.code {
            hasher.update([ins.opcode()]);
            if let Some(imm) = ins.immediate() {
                hasher.update(imm.to_le_bytes());
            }
        }
        Self {
            code: image.code.clone().into(),
            code_digest: hasher.finalize().into(),
            pc: 0,
            stack: Vec::new(),
            status: MachineStatus::Extensive,
        }
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    pub fn pc(&self) -> u64 {
        self.pc
    }

    pub fn stack(&self) -> &[u64] {
        &self.stack
    }

    pub fn hash(&self) -> MachineHash {
        let mut hasher = Sha256::new();
        hasher.update(self.code_digest);
        hasher.update(self.pc.to_le_bytes());
        hasher.update([self.status.tag()]);
        hasher.update((self.stack.len() as u64).to_le_bytes());
        for v in &self.stack {
            hasher.update(v.to_le_bytes());
        }
        hasher.finalize().into()
    }

    /// Run until the machine stops or `max_steps` instructions have executed.
    pub fn run(&mut self, max_steps: u64) -> Assertion {
        let before_hash = self.hash();
        let mut num_steps = 0;
        let mut num_gas = 0;
        let mut logs = Vec::new();

        while num_steps < max_steps && self.status == MachineStatus::Extensive {
            match self.step(&mut logs) {
                Some(gas) => num_gas += gas,
                None => break,
            }
            num_steps += 1;
        }

        Assertion { before_hash, after_hash: self.hash(), num_steps, num_gas, logs }
    }

    /// Execute one instruction, returning the gas it consumed. Running past the
    /// last instruction executes nothing and returns `None`.
    fn step(&mut self, logs: &mut Vec<u64>) -> Option<u64> {
        let ins = match self.code.get(self.pc as usize) {
            Some(ins) => *ins,
            None => {
                self.status = MachineStatus::ErrorStop;
                return None;
            }
        };

        let mut next_pc = self.pc + 1;
        let ok = match ins {
            Instruction::Nop => true,
            Instruction::Push(v) => self.push(v),
            Instruction::Pop => self.stack.pop().is_some(),
            Instruction::Dup => match self.stack.last().copied() {
                Some(v) => self.push(v),
                None => false,
            },
            Instruction::Swap => {
                let n = self.stack.len();
                if n < 2 {
                    false
                } else {
                    self.stack.swap(n - 1, n - 2);
                    true
                }
            }
            Instruction::Add => self.binary(u64::wrapping_add),
            Instruction::Sub => self.binary(u64::wrapping_sub),
            Instruction::Mul => self.binary(u64::wrapping_mul),
            Instruction::Jump(target) => {
                next_pc = target;
                true
            }
            Instruction::JumpIf(target) => match self.stack.pop() {
                Some(cond) => {
                    if cond != 0 {
                        next_pc = target;
                    }
                    true
                }
                None => false,
            },
            Instruction::Log => match self.stack.pop() {
                Some(v) => {
                    logs.push(v);
                    true
                }
                None => false,
            },
            Instruction::Halt => {
                self.status = MachineStatus::Halted;
                return Some(ins.gas_cost());
            }
            Instruction::Error => false,
        };

        if ok {
            self.pc = next_pc;
        } else {
            self.status = MachineStatus::ErrorStop;
        }
        Some(ins.gas_cost())
    }

    fn push(&mut self, v: u64) -> bool {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return false;
        }
        self.stack.push(v);
        true
    }

    // operands are popped b then a; result is f(a, b)
    fn binary(&mut self, f: fn(u64, u64) -> u64) -> bool {
        if self.stack.len() < 2 {
            return false;
        }
        let (b, a) = match (self.stack.pop(), self.stack.pop()) {
            (Some(b), Some(a)) => (b, a),
            _ => return false,
        };
        self.stack.push(f(a, b));
        true
    }
}
