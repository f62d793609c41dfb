use super::instruction::Instruction;
use crate::config::PopulationConfig;
use crate::error::{Result, TickbreedError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Ordered instruction list plus the register file size it runs against.
///
/// A program owns its instructions; cloning one for a child never aliases
/// the parent's storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
    register_count: usize,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>, register_count: usize) -> Self {
        Self {
            instructions,
            register_count,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn register_count(&self) -> usize {
        self.register_count
    }

    /// Register count line followed by one line per instruction
    pub fn listing(&self) -> String {
        let mut out = format!("registers {}\n", self.register_count);
        for instruction in &self.instructions {
            out.push_str(&instruction.to_string());
            out.push('\n');
        }
        out
    }
}

/// Creates and checks programs against the population's bounds and the
/// shape of the loaded market data
#[derive(Debug, Clone)]
pub struct ProgramFactory {
    minimum_instructions: usize,
    maximum_instructions: usize,
    maximum_registers: usize,
    maximum_data_offset: usize,
    columns: usize,
}

impl ProgramFactory {
    pub fn new(config: &PopulationConfig, columns: usize) -> Self {
        Self {
            minimum_instructions: config.minimum_robot_instructions,
            maximum_instructions: config.maximum_robot_instructions,
            maximum_registers: config.maximum_registers.max(1),
            maximum_data_offset: config.maximum_data_offset,
            columns,
        }
    }

    pub fn minimum_instructions(&self) -> usize {
        self.minimum_instructions
    }

    pub fn maximum_instructions(&self) -> usize {
        self.maximum_instructions
    }

    pub fn random_instruction<R: Rng>(&self, register_count: usize, rng: &mut R) -> Instruction {
        Instruction::random(
            register_count,
            self.columns,
            self.maximum_data_offset,
            self.maximum_instructions,
            rng,
        )
    }

    pub fn random_program<R: Rng>(&self, rng: &mut R) -> Program {
        let length = rng.gen_range(self.minimum_instructions..=self.maximum_instructions);
        let register_count = rng.gen_range(1..=self.maximum_registers);
        let instructions = (0..length)
            .map(|_| self.random_instruction(register_count, rng))
            .collect();
        Program::new(instructions, register_count)
    }

    /// Reject programs (e.g. loaded from disk) that break length or operand bounds
    pub fn check(&self, program: &Program) -> Result<()> {
        let len = program.len();
        if len < self.minimum_instructions || len > self.maximum_instructions {
            return Err(TickbreedError::Validation(format!(
                "Program length {} outside [{}, {}]",
                len, self.minimum_instructions, self.maximum_instructions
            )));
        }
        if program.register_count() == 0 || program.register_count() > self.maximum_registers {
            return Err(TickbreedError::Validation(format!(
                "Program register count {} outside [1, {}]",
                program.register_count(),
                self.maximum_registers
            )));
        }
        if let Some((index, instruction)) = program.instructions().iter().enumerate().find(|(_, i)| {
            !i.is_within(program.register_count(), self.columns, self.maximum_data_offset)
        }) {
            return Err(TickbreedError::Validation(format!(
                "Instruction {} ({}) references data or registers out of range",
                index, instruction
            )));
        }
        Ok(())
    }
}
