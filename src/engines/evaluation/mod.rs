pub mod instruction;
pub mod processor;
pub mod program;

pub use instruction::{DataRef, Instruction};
pub use processor::{Execution, Processor, Termination};
pub use program::{Program, ProgramFactory};
