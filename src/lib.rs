#![deny(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_panics_doc, clippy::module_name_repetitions)]

use std::{
    fmt::Display,
    process::{ExitCode, Termination},
};

#[macro_use]
pub mod spec;
pub mod basis;
mod clause;
pub mod cli;
mod datastructure;
mod literal;
pub mod qdimacs;
mod quantifier;
mod sat;
pub mod synth;

// Re-export
pub use datastructure::Assignment;
pub use quantifier::QuantTy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SynthesisResult {
    /// A valid Skolem basis was synthesized and verified.
    Realized = 0,
    /// The repair loop reached the iteration cap without a valid basis.
    BudgetExhausted = 1,
    /// The specification admits no Skolem functions.
    Unsatisfiable = 2,
}

impl Display for SynthesisResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthesisResult::Realized => write!(f, "realized"),
            SynthesisResult::BudgetExhausted => write!(f, "iteration budget exhausted"),
            SynthesisResult::Unsatisfiable => write!(f, "unsatisfiable"),
        }
    }
}

impl Termination for SynthesisResult {
    fn report(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}
