//! Access assignment adapters.

mod instructions;

pub use instructions::InstructionAccessAssigner;
