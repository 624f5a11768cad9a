use crate::synth::{Options, RepairStrategy};
use clap::{Parser, ValueEnum};
use miette::{Diagnostic, Result};
use std::{
    io::Read,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ArgError {
    #[error("Path {} does not exist", path.display())]
    FileDoesNotExist { path: PathBuf },

    #[error("{} is not a file", path.display())]
    NotAFile { path: PathBuf },

    #[error("Cannot read file {}: {}", path.display(), err)]
    CannotReadFile { path: PathBuf, err: std::io::Error },

    #[error("Cannot read from stdin: {}", err)]
    CannotReadStdIn { err: std::io::Error },
}

#[derive(Debug, Parser)]
#[command(about = "Data-driven Skolem basis synthesis for 2QBF", version)]
pub struct Args {
    /// Path to the QDIMACS input; reads from stdin when omitted
    pub spec_file: Option<PathBuf>,

    /// Number of training samples
    #[arg(long, default_value_t = 500)]
    pub samples: usize,

    /// Maximum number of repair iterations
    #[arg(long, default_value_t = 50)]
    pub iterations: usize,

    /// Synthesize in topological dependency order (default)
    #[arg(long, overrides_with = "no_topo_sort")]
    pub topo_sort: bool,

    /// Keep the file order of the existential variables
    #[arg(long, overrides_with = "topo_sort")]
    pub no_topo_sort: bool,

    /// Repair policy when a candidate must be shrunk
    #[arg(long, value_enum, default_value = "opposing-cube")]
    pub repair_strategy: StrategyArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// expand the opposing side first, escalate on recurrence
    OpposingCube,
    /// block the failing point with a clause immediately
    SelfClause,
}

impl Args {
    pub fn options(&self) -> Options {
        Options {
            samples: self.samples,
            iterations: self.iterations,
            topo_sort: !self.no_topo_sort,
            strategy: match self.repair_strategy {
                StrategyArg::OpposingCube => RepairStrategy::OpposingCube,
                StrategyArg::SelfClause => RepairStrategy::SelfClause,
            },
        }
    }
}

/// Reads the input from the provided path or, when absent, stdin.
pub fn read_input(spec_file: Option<&Path>) -> Result<Vec<u8>> {
    let Some(path) = spec_file else {
        tracing::info!("no input path provided, reading from stdin");
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .map_err(|err| ArgError::CannotReadStdIn { err })?;
        return Ok(buffer);
    };
    if !path.exists() {
        return Err(ArgError::FileDoesNotExist { path: path.to_owned() }.into());
    }
    if !path.is_file() {
        return Err(ArgError::NotAFile { path: path.to_owned() }.into());
    }
    let contents =
        std::fs::read(path).map_err(|err| ArgError::CannotReadFile { path: path.to_owned(), err })?;
    Ok(contents)
}
