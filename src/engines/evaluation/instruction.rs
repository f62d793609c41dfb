use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A read from the market window: which column, how many bars back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRef {
    pub column: usize,
    pub offset: usize,
}

/// The closed robot instruction set.
///
/// Register operands index the program's register file, jump targets are
/// taken modulo the program length when executed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    // Data reads
    MoveDataToRegister { data: DataRef, register: usize },
    AddDataToRegister { data: DataRef, register: usize },
    SubtractDataFromRegister { data: DataRef, register: usize },
    AverageOfColumn { column: usize, length: usize, register: usize },
    HighestOfColumn { column: usize, length: usize, register: usize },
    LowestOfColumn { column: usize, length: usize, register: usize },

    // Register arithmetic
    MoveConstant { value: f64, register: usize },
    MoveRegister { from: usize, to: usize },
    AddRegisters { from: usize, to: usize },
    SubtractRegisters { from: usize, to: usize },
    MultiplyRegisters { from: usize, to: usize },
    DivideRegisters { from: usize, to: usize },
    AddConstant { value: f64, register: usize },
    MultiplyByConstant { value: f64, register: usize },
    Negate { register: usize },
    Absolute { register: usize },
    SquareRoot { register: usize },
    NaturalLogarithm { register: usize },
    Minimum { from: usize, to: usize },
    Maximum { from: usize, to: usize },
    ZeroOut { register: usize },

    // Control flow
    JumpTo { target: usize },
    JumpIfZero { register: usize, target: usize },
    JumpIfPositive { register: usize, target: usize },
    JumpIfGreater { left: usize, right: usize, target: usize },

    // Terminal
    EmitLong,
    EmitShort,
    EmitOut,
    EmitSignOf { register: usize },
    EmitIfGreater { left: usize, right: usize },
}

const KIND_COUNT: usize = 30;
const CONSTANT_RANGE: f64 = 100.0;

impl Instruction {
    /// Uniformly sample one instruction whose operands are all in range
    pub fn random<R: Rng>(
        registers: usize,
        columns: usize,
        maximum_data_offset: usize,
        maximum_jump: usize,
        rng: &mut R,
    ) -> Self {
        let registers = registers.max(1);
        let columns = columns.max(1);
        let maximum_data_offset = maximum_data_offset.max(1);
        let maximum_jump = maximum_jump.max(1);

        let reg = |rng: &mut R| rng.gen_range(0..registers);
        let data = |rng: &mut R| DataRef {
            column: rng.gen_range(0..columns),
            offset: rng.gen_range(0..maximum_data_offset),
        };

        match rng.gen_range(0..KIND_COUNT) {
            0 => Instruction::MoveDataToRegister { data: data(rng), register: reg(rng) },
            1 => Instruction::AddDataToRegister { data: data(rng), register: reg(rng) },
            2 => Instruction::SubtractDataFromRegister { data: data(rng), register: reg(rng) },
            3 => Instruction::AverageOfColumn {
                column: rng.gen_range(0..columns),
                length: rng.gen_range(1..=maximum_data_offset),
                register: reg(rng),
            },
            4 => Instruction::HighestOfColumn {
                column: rng.gen_range(0..columns),
                length: rng.gen_range(1..=maximum_data_offset),
                register: reg(rng),
            },
            5 => Instruction::LowestOfColumn {
                column: rng.gen_range(0..columns),
                length: rng.gen_range(1..=maximum_data_offset),
                register: reg(rng),
            },
            6 => Instruction::MoveConstant {
                value: rng.gen_range(-CONSTANT_RANGE..CONSTANT_RANGE),
                register: reg(rng),
            },
            7 => Instruction::MoveRegister { from: reg(rng), to: reg(rng) },
            8 => Instruction::AddRegisters { from: reg(rng), to: reg(rng) },
            9 => Instruction::SubtractRegisters { from: reg(rng), to: reg(rng) },
            10 => Instruction::MultiplyRegisters { from: reg(rng), to: reg(rng) },
            11 => Instruction::DivideRegisters { from: reg(rng), to: reg(rng) },
            12 => Instruction::AddConstant {
                value: rng.gen_range(-CONSTANT_RANGE..CONSTANT_RANGE),
                register: reg(rng),
            },
            13 => Instruction::MultiplyByConstant {
                value: rng.gen_range(-CONSTANT_RANGE..CONSTANT_RANGE),
                register: reg(rng),
            },
            14 => Instruction::Negate { register: reg(rng) },
            15 => Instruction::Absolute { register: reg(rng) },
            16 => Instruction::SquareRoot { register: reg(rng) },
            17 => Instruction::NaturalLogarithm { register: reg(rng) },
            18 => Instruction::Minimum { from: reg(rng), to: reg(rng) },
            19 => Instruction::Maximum { from: reg(rng), to: reg(rng) },
            20 => Instruction::ZeroOut { register: reg(rng) },
            21 => Instruction::JumpTo { target: rng.gen_range(0..maximum_jump) },
            22 => Instruction::JumpIfZero {
                register: reg(rng),
                target: rng.gen_range(0..maximum_jump),
            },
            23 => Instruction::JumpIfPositive {
                register: reg(rng),
                target: rng.gen_range(0..maximum_jump),
            },
            24 => Instruction::JumpIfGreater {
                left: reg(rng),
                right: reg(rng),
                target: rng.gen_range(0..maximum_jump),
            },
            25 => Instruction::EmitLong,
            26 => Instruction::EmitShort,
            27 => Instruction::EmitOut,
            28 => Instruction::EmitSignOf { register: reg(rng) },
            _ => Instruction::EmitIfGreater { left: reg(rng), right: reg(rng) },
        }
    }

    /// True when every register, column and offset operand is inside the given bounds
    pub fn is_within(&self, registers: usize, columns: usize, maximum_data_offset: usize) -> bool {
        let reg = |r: &usize| *r < registers;
        let data = |d: &DataRef| d.column < columns && d.offset < maximum_data_offset;
        let span = |c: &usize, l: &usize| *c < columns && *l >= 1 && *l <= maximum_data_offset;

        match self {
            Instruction::MoveDataToRegister { data: d, register }
            | Instruction::AddDataToRegister { data: d, register }
            | Instruction::SubtractDataFromRegister { data: d, register } => data(d) && reg(register),
            Instruction::AverageOfColumn { column, length, register }
            | Instruction::HighestOfColumn { column, length, register }
            | Instruction::LowestOfColumn { column, length, register } => {
                span(column, length) && reg(register)
            }
            Instruction::MoveConstant { value, register }
            | Instruction::AddConstant { value, register }
            | Instruction::MultiplyByConstant { value, register } => value.is_finite() && reg(register),
            Instruction::MoveRegister { from, to }
            | Instruction::AddRegisters { from, to }
            | Instruction::SubtractRegisters { from, to }
            | Instruction::MultiplyRegisters { from, to }
            | Instruction::DivideRegisters { from, to }
            | Instruction::Minimum { from, to }
            | Instruction::Maximum { from, to } => reg(from) && reg(to),
            Instruction::Negate { register }
            | Instruction::Absolute { register }
            | Instruction::SquareRoot { register }
            | Instruction::NaturalLogarithm { register }
            | Instruction::ZeroOut { register }
            | Instruction::EmitSignOf { register }
            | Instruction::JumpIfZero { register, .. }
            | Instruction::JumpIfPositive { register, .. } => reg(register),
            Instruction::JumpIfGreater { left, right, .. }
            | Instruction::EmitIfGreater { left, right } => reg(left) && reg(right),
            Instruction::JumpTo { .. }
            | Instruction::EmitLong
            | Instruction::EmitShort
            | Instruction::EmitOut => true,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::MoveDataToRegister { data, register } => write!(
                f,
                "MoveDataToRegister column={} offset={} register={}",
                data.column, data.offset, register
            ),
            Instruction::AddDataToRegister { data, register } => write!(
                f,
                "AddDataToRegister column={} offset={} register={}",
                data.column, data.offset, register
            ),
            Instruction::SubtractDataFromRegister { data, register } => write!(
                f,
                "SubtractDataFromRegister column={} offset={} register={}",
                data.column, data.offset, register
            ),
            Instruction::AverageOfColumn { column, length, register } => write!(
                f,
                "AverageOfColumn column={} length={} register={}",
                column, length, register
            ),
            Instruction::HighestOfColumn { column, length, register } => write!(
                f,
                "HighestOfColumn column={} length={} register={}",
                column, length, register
            ),
            Instruction::LowestOfColumn { column, length, register } => write!(
                f,
                "LowestOfColumn column={} length={} register={}",
                column, length, register
            ),
            Instruction::MoveConstant { value, register } => {
                write!(f, "MoveConstant value={} register={}", value, register)
            }
            Instruction::MoveRegister { from, to } => write!(f, "MoveRegister from={} to={}", from, to),
            Instruction::AddRegisters { from, to } => write!(f, "AddRegisters from={} to={}", from, to),
            Instruction::SubtractRegisters { from, to } => {
                write!(f, "SubtractRegisters from={} to={}", from, to)
            }
            Instruction::MultiplyRegisters { from, to } => {
                write!(f, "MultiplyRegisters from={} to={}", from, to)
            }
            Instruction::DivideRegisters { from, to } => {
                write!(f, "DivideRegisters from={} to={}", from, to)
            }
            Instruction::AddConstant { value, register } => {
                write!(f, "AddConstant value={} register={}", value, register)
            }
            Instruction::MultiplyByConstant { value, register } => {
                write!(f, "MultiplyByConstant value={} register={}", value, register)
            }
            Instruction::Negate { register } => write!(f, "Negate register={}", register),
            Instruction::Absolute { register } => write!(f, "Absolute register={}", register),
            Instruction::SquareRoot { register } => write!(f, "SquareRoot register={}", register),
            Instruction::NaturalLogarithm { register } => {
                write!(f, "NaturalLogarithm register={}", register)
            }
            Instruction::Minimum { from, to } => write!(f, "Minimum from={} to={}", from, to),
            Instruction::Maximum { from, to } => write!(f, "Maximum from={} to={}", from, to),
            Instruction::ZeroOut { register } => write!(f, "ZeroOut register={}", register),
            Instruction::JumpTo { target } => write!(f, "JumpTo target={}", target),
            Instruction::JumpIfZero { register, target } => {
                write!(f, "JumpIfZero register={} target={}", register, target)
            }
            Instruction::JumpIfPositive { register, target } => {
                write!(f, "JumpIfPositive register={} target={}", register, target)
            }
            Instruction::JumpIfGreater { left, right, target } => write!(
                f,
                "JumpIfGreater left={} right={} target={}",
                left, right, target
            ),
            Instruction::EmitLong => write!(f, "EmitLong"),
            Instruction::EmitShort => write!(f, "EmitShort"),
            Instruction::EmitOut => write!(f, "EmitOut"),
            Instruction::EmitSignOf { register } => write!(f, "EmitSignOf register={}", register),
            Instruction::EmitIfGreater { left, right } => {
                write!(f, "EmitIfGreater left={} right={}", left, right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_random_instructions_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5_000 {
            let instruction = Instruction::random(3, 4, 16, 32, &mut rng);
            assert!(instruction.is_within(3, 4, 16), "{}", instruction);
        }
    }

    #[test]
    fn test_random_covers_every_kind() {
        let mut rng = StdRng::seed_from_u64(5);
        let kinds: HashSet<String> = (0..20_000)
            .map(|_| {
                let text = Instruction::random(2, 2, 8, 8, &mut rng).to_string();
                text.split(' ').next().unwrap_or_default().to_string()
            })
            .collect();
        assert_eq!(kinds.len(), KIND_COUNT);
    }

    #[test]
    fn test_display_is_one_line() {
        let instruction = Instruction::MoveDataToRegister {
            data: DataRef { column: 1, offset: 4 },
            register: 2,
        };
        assert_eq!(
            instruction.to_string(),
            "MoveDataToRegister column=1 offset=4 register=2"
        );
    }

    #[test]
    fn test_out_of_range_operands_detected() {
        let instruction = Instruction::AddRegisters { from: 0, to: 5 };
        assert!(!instruction.is_within(4, 1, 1));
        let read = Instruction::MoveDataToRegister {
            data: DataRef { column: 0, offset: 8 },
            register: 0,
        };
        assert!(!read.is_within(1, 1, 8));
    }
}
