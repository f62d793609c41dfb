//! Budgeted interpreter for robot programs.
//!
//! One execution runs a [`Program`] against a read-only [`MarketWindow`] and
//! yields a [`Signal`]. The register file is sized once from the program's
//! declared register count; nothing else is allocated while running.
//!
//! Execution stops when:
//! - a terminal `Emit*` instruction fixes the signal,
//! - the program counter runs off the end (`Out`),
//! - a data read needs history the window does not have (`Out`),
//! - `len × maximum_processor_instruction_factor` dispatches are used up (`Out`).

use super::instruction::{DataRef, Instruction};
use super::program::Program;
use crate::data::MarketWindow;
use crate::types::Signal;

/// Why an execution stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Emitted,
    RanOffEnd,
    MissingData,
    BudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    pub signal: Signal,
    pub dispatched: usize,
    pub termination: Termination,
}

/// Result of executing a single instruction
enum Step {
    Continue,
    Jump(usize),
    Emit(Signal),
    MissingData,
}

#[derive(Debug, Clone, Copy)]
pub struct Processor {
    instruction_factor: usize,
}

impl Processor {
    pub fn new(maximum_processor_instruction_factor: usize) -> Self {
        Self {
            instruction_factor: maximum_processor_instruction_factor,
        }
    }

    pub fn budget_for(&self, program: &Program) -> usize {
        program.len().saturating_mul(self.instruction_factor)
    }

    pub fn execute(&self, program: &Program, window: &MarketWindow<'_>) -> Execution {
        let mut machine = Machine {
            registers: vec![0.0; program.register_count()],
            window,
        };
        let budget = self.budget_for(program);
        let len = program.len();
        let mut pc = 0;
        let mut dispatched = 0;

        loop {
            let Some(instruction) = program.get(pc) else {
                return Execution {
                    signal: Signal::Out,
                    dispatched,
                    termination: Termination::RanOffEnd,
                };
            };
            if dispatched >= budget {
                log::trace!("Execution budget of {} dispatches exhausted", budget);
                return Execution {
                    signal: Signal::Out,
                    dispatched,
                    termination: Termination::BudgetExhausted,
                };
            }
            dispatched += 1;

            match machine.step(instruction) {
                Step::Continue => pc += 1,
                Step::Jump(target) => pc = target % len,
                Step::Emit(signal) => {
                    return Execution {
                        signal,
                        dispatched,
                        termination: Termination::Emitted,
                    }
                }
                Step::MissingData => {
                    return Execution {
                        signal: Signal::Out,
                        dispatched,
                        termination: Termination::MissingData,
                    }
                }
            }
        }
    }
}

struct Machine<'w, 'a> {
    registers: Vec<f64>,
    window: &'w MarketWindow<'a>,
}

impl Machine<'_, '_> {
    fn get(&self, register: usize) -> f64 {
        match self.registers.len() {
            0 => 0.0,
            n => self.registers[register % n],
        }
    }

    /// Non-finite results collapse to 0
    fn set(&mut self, register: usize, value: f64) {
        let n = self.registers.len();
        if n > 0 {
            self.registers[register % n] = if value.is_finite() { value } else { 0.0 };
        }
    }

    fn column(&self, column: usize) -> Option<usize> {
        match self.window.column_count() {
            0 => None,
            n => Some(column.min(n - 1)),
        }
    }

    fn read(&self, data: DataRef) -> Option<f64> {
        let column = self.column(data.column)?;
        let offset = data.offset.min(self.window.maximum_data_offset().saturating_sub(1));
        self.window.value(column, offset)
    }

    /// Fold the first `length` offsets of a column; `None` if any is unavailable
    fn fold_column(&self, column: usize, length: usize, init: f64, f: fn(f64, f64) -> f64) -> Option<f64> {
        let column = self.column(column)?;
        let length = length.clamp(1, self.window.maximum_data_offset().max(1));
        let mut acc = init;
        for offset in 0..length {
            acc = f(acc, self.window.value(column, offset)?);
        }
        Some(acc)
    }

    fn step(&mut self, instruction: &Instruction) -> Step {
        match *instruction {
            Instruction::MoveDataToRegister { data, register } => match self.read(data) {
                Some(v) => self.set(register, v),
                None => return Step::MissingData,
            },
            Instruction::AddDataToRegister { data, register } => match self.read(data) {
                Some(v) => self.set(register, self.get(register) + v),
                None => return Step::MissingData,
            },
            Instruction::SubtractDataFromRegister { data, register } => match self.read(data) {
                Some(v) => self.set(register, self.get(register) - v),
                None => return Step::MissingData,
            },
            Instruction::AverageOfColumn { column, length, register } => {
                match self.fold_column(column, length, 0.0, |a, v| a + v) {
                    Some(sum) => {
                        let n = length.clamp(1, self.window.maximum_data_offset().max(1));
                        self.set(register, sum / n as f64);
                    }
                    None => return Step::MissingData,
                }
            }
            Instruction::HighestOfColumn { column, length, register } => {
                match self.fold_column(column, length, f64::NEG_INFINITY, f64::max) {
                    Some(v) => self.set(register, v),
                    None => return Step::MissingData,
                }
            }
            Instruction::LowestOfColumn { column, length, register } => {
                match self.fold_column(column, length, f64::INFINITY, f64::min) {
                    Some(v) => self.set(register, v),
                    None => return Step::MissingData,
                }
            }

            Instruction::MoveConstant { value, register } => self.set(register, value),
            Instruction::MoveRegister { from, to } => self.set(to, self.get(from)),
            Instruction::AddRegisters { from, to } => self.set(to, self.get(to) + self.get(from)),
            Instruction::SubtractRegisters { from, to } => self.set(to, self.get(to) - self.get(from)),
            Instruction::MultiplyRegisters { from, to } => self.set(to, self.get(to) * self.get(from)),
            Instruction::DivideRegisters { from, to } => {
                let divisor = self.get(from);
                if divisor != 0.0 {
                    self.set(to, self.get(to) / divisor);
                }
            }
            Instruction::AddConstant { value, register } => self.set(register, self.get(register) + value),
            Instruction::MultiplyByConstant { value, register } => {
                self.set(register, self.get(register) * value)
            }
            Instruction::Negate { register } => self.set(register, -self.get(register)),
            Instruction::Absolute { register } => self.set(register, self.get(register).abs()),
            Instruction::SquareRoot { register } => self.set(register, self.get(register).abs().sqrt()),
            Instruction::NaturalLogarithm { register } => {
                self.set(register, self.get(register).abs().ln())
            }
            Instruction::Minimum { from, to } => self.set(to, self.get(to).min(self.get(from))),
            Instruction::Maximum { from, to } => self.set(to, self.get(to).max(self.get(from))),
            Instruction::ZeroOut { register } => self.set(register, 0.0),

            Instruction::JumpTo { target } => return Step::Jump(target),
            Instruction::JumpIfZero { register, target } => {
                if self.get(register) == 0.0 {
                    return Step::Jump(target);
                }
            }
            Instruction::JumpIfPositive { register, target } => {
                if self.get(register) > 0.0 {
                    return Step::Jump(target);
                }
            }
            Instruction::JumpIfGreater { left, right, target } => {
                if self.get(left) > self.get(right) {
                    return Step::Jump(target);
                }
            }

            Instruction::EmitLong => return Step::Emit(Signal::Long),
            Instruction::EmitShort => return Step::Emit(Signal::Short),
            Instruction::EmitOut => return Step::Emit(Signal::Out),
            Instruction::EmitSignOf { register } => return Step::Emit(Signal::from_sign(self.get(register))),
            Instruction::EmitIfGreater { left, right } => {
                let (l, r) = (self.get(left), self.get(right));
                return Step::Emit(Signal::from_sign(l - r));
            }
        }
        Step::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Vec<f64>> {
        vec![vec![10.0, 11.0, 12.0, 15.0], vec![1.0, 2.0, 3.0, 4.0]]
    }

    fn run(program: &Program, columns: &[Vec<f64>]) -> Execution {
        let window = MarketWindow::new(columns, 3, 4, None);
        Processor::new(8).execute(program, &window)
    }

    fn read(column: usize, offset: usize, register: usize) -> Instruction {
        Instruction::MoveDataToRegister {
            data: DataRef { column, offset },
            register,
        }
    }

    #[test]
    fn test_emit_stops_immediately() {
        let program = Program::new(
            vec![Instruction::EmitShort, Instruction::EmitLong, Instruction::EmitLong],
            1,
        );
        let execution = run(&program, &columns());
        assert_eq!(execution.signal, Signal::Short);
        assert_eq!(execution.dispatched, 1);
        assert_eq!(execution.termination, Termination::Emitted);
    }

    #[test]
    fn test_running_off_end_is_out() {
        let program = Program::new(vec![Instruction::ZeroOut { register: 0 }; 3], 1);
        let execution = run(&program, &columns());
        assert_eq!(execution.signal, Signal::Out);
        assert_eq!(execution.dispatched, 3);
        assert_eq!(execution.termination, Termination::RanOffEnd);
    }

    #[test]
    fn test_momentum_program() {
        // r0 = close[0] - close[3]
        let program = Program::new(
            vec![
                read(0, 0, 0),
                read(0, 3, 1),
                Instruction::SubtractRegisters { from: 1, to: 0 },
                Instruction::EmitSignOf { register: 0 },
            ],
            2,
        );
        assert_eq!(run(&program, &columns()).signal, Signal::Long);
    }

    #[test]
    fn test_missing_history_is_out() {
        let program = Program::new(vec![read(0, 3, 0), Instruction::EmitLong], 1);
        let short = vec![vec![1.0, 2.0]];
        let window = MarketWindow::new(&short, 1, 8, None);
        let execution = Processor::new(8).execute(&program, &window);
        assert_eq!(execution.signal, Signal::Out);
        assert_eq!(execution.termination, Termination::MissingData);
    }

    #[test]
    fn test_out_of_range_operands_are_clamped() {
        let program = Program::new(vec![read(9, 99, 0), Instruction::EmitSignOf { register: 0 }], 1);
        // column 9 -> 1, offset 99 -> 3: value 1.0
        assert_eq!(run(&program, &columns()).signal, Signal::Long);
    }

    #[test]
    fn test_column_aggregates() {
        let program = Program::new(
            vec![
                Instruction::AverageOfColumn { column: 1, length: 4, register: 0 },
                Instruction::HighestOfColumn { column: 1, length: 4, register: 1 },
                Instruction::LowestOfColumn { column: 1, length: 2, register: 2 },
                // avg 2.5 - low 3 = -0.5
                Instruction::SubtractRegisters { from: 2, to: 0 },
                Instruction::EmitSignOf { register: 0 },
            ],
            3,
        );
        assert_eq!(run(&program, &columns()).signal, Signal::Short);
    }

    #[test]
    fn test_division_by_zero_leaves_register() {
        let program = Program::new(
            vec![
                Instruction::MoveConstant { value: -3.0, register: 0 },
                Instruction::DivideRegisters { from: 1, to: 0 },
                Instruction::EmitSignOf { register: 0 },
            ],
            2,
        );
        assert_eq!(run(&program, &columns()).signal, Signal::Short);
    }

    #[test]
    fn test_non_finite_results_collapse_to_zero() {
        let program = Program::new(
            vec![
                Instruction::ZeroOut { register: 0 },
                Instruction::NaturalLogarithm { register: 0 },
                Instruction::EmitSignOf { register: 0 },
            ],
            1,
        );
        assert_eq!(run(&program, &columns()).signal, Signal::Out);
    }

    #[test]
    fn test_conditional_jump() {
        let program = Program::new(
            vec![
                Instruction::MoveConstant { value: 5.0, register: 0 },
                Instruction::JumpIfPositive { register: 0, target: 3 },
                Instruction::EmitShort,
                Instruction::EmitLong,
            ],
            1,
        );
        assert_eq!(run(&program, &columns()).signal, Signal::Long);
    }

    #[test]
    fn test_jump_loop_hits_budget() {
        let program = Program::new(
            vec![Instruction::AddConstant { value: 1.0, register: 0 }, Instruction::JumpTo { target: 0 }],
            1,
        );
        let execution = run(&program, &columns());
        assert_eq!(execution.signal, Signal::Out);
        assert_eq!(execution.termination, Termination::BudgetExhausted);
        assert_eq!(execution.dispatched, 2 * 8);
    }

    #[test]
    fn test_zero_registers_read_as_zero() {
        let program = Program::new(vec![Instruction::EmitIfGreater { left: 0, right: 1 }], 0);
        assert_eq!(run(&program, &columns()).signal, Signal::Out);
    }

    #[test]
    fn test_empty_program_is_out() {
        let execution = run(&Program::empty(), &columns());
        assert_eq!(execution.signal, Signal::Out);
        assert_eq!(execution.dispatched, 0);
    }
}
