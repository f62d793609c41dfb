use crate::config::EvolutionConfig;
use crate::engines::evaluation::{Program, ProgramFactory};
use rand::Rng;

/// Roulette wheel selection: probability proportional to weight.
///
/// Returns an index into `weights`, or `None` when there is nothing to pick.
pub fn roulette_selection<R: Rng>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let total_weight: f64 = weights.iter().map(|w| w.max(0.0)).sum();

    if total_weight <= 0.0 || !total_weight.is_finite() {
        // No weight anywhere, pick uniformly
        return Some(rng.gen_range(0..weights.len()));
    }

    let mut spin = rng.gen::<f64>() * total_weight;

    for (index, weight) in weights.iter().enumerate() {
        let weight = weight.max(0.0);
        if weight == 0.0 {
            continue;
        }
        spin -= weight;
        if spin <= 0.0 {
            return Some(index);
        }
    }

    // Rounding left a sliver of wheel, take the last weighted entry
    weights.iter().rposition(|w| *w > 0.0)
}

/// Single-point crossover: each child keeps one parent's head and takes the
/// other parent's tail. Register count is the larger of the two.
pub fn crossover<R: Rng>(parent1: &Program, parent2: &Program, rng: &mut R) -> (Program, Program) {
    let registers = parent1.register_count().max(parent2.register_count());
    let len = parent1.len().min(parent2.len());
    if len <= 1 {
        return (
            Program::new(parent1.instructions().to_vec(), registers),
            Program::new(parent2.instructions().to_vec(), registers),
        );
    }

    let point = rng.gen_range(1..len);
    let (head1, tail1) = parent1.instructions().split_at(point);
    let (head2, tail2) = parent2.instructions().split_at(point);

    let child1 = [head1, tail2].concat();
    let child2 = [head2, tail1].concat();

    (Program::new(child1, registers), Program::new(child2, registers))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationRates {
    pub new_instruction: f64,
    pub instruction_mutation: f64,
    pub skip_instruction: f64,
}

impl MutationRates {
    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self {
            new_instruction: config.new_instruction_probability,
            instruction_mutation: config.instruction_mutation_probability,
            skip_instruction: config.skip_instruction_probability,
        }
    }
}

/// Copy a program, mutating along the way.
///
/// Per source instruction: maybe insert a fresh one before it, maybe drop it,
/// maybe replace it. One more insertion slot follows the last instruction.
/// Deletions stop at the factory's minimum length and insertions at its maximum.
pub fn mutate<R: Rng>(
    program: &Program,
    rates: &MutationRates,
    factory: &ProgramFactory,
    rng: &mut R,
) -> Program {
    let registers = program.register_count();
    let source = program.instructions();
    let mut out = Vec::with_capacity(source.len() + 1);

    for (i, instruction) in source.iter().enumerate() {
        let remaining = source.len() - i;

        if rng.gen::<f64>() < rates.new_instruction && out.len() + remaining < factory.maximum_instructions() {
            out.push(factory.random_instruction(registers, rng));
        }

        if rng.gen::<f64>() < rates.skip_instruction
            && out.len() + remaining - 1 >= factory.minimum_instructions()
        {
            continue;
        }

        if rng.gen::<f64>() < rates.instruction_mutation {
            out.push(factory.random_instruction(registers, rng));
        } else {
            out.push(*instruction);
        }
    }

    if rng.gen::<f64>() < rates.new_instruction && out.len() < factory.maximum_instructions() {
        out.push(factory.random_instruction(registers, rng));
    }

    Program::new(out, registers)
}
