//! Data-driven synthesis of Skolem bases.
//!
//! The pipeline samples satisfying models of the matrix, labels every
//! output against an incremental oracle, learns per-output Must-1 and
//! Must-0 approximations from the labels, and then repairs the
//! candidates against verifier counterexamples until the basis is
//! valid or the iteration budget runs out.

use self::{
    learn::BasisLearner,
    repair::{RepairError, RepairKind, Repairer},
    sample::{BlockingGenerator, IncrementalOracle, Label, ModelGenerator, OracleSampler},
    stats::Statistics,
    tree::TreeParams,
    verify::{Verdict, Verifier},
};
use crate::{literal::Var, sat::varisat::Varisat, spec::Spec, SynthesisResult};
use miette::Diagnostic;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

pub(crate) mod learn;
pub(crate) mod order;
pub(crate) mod repair;
pub(crate) mod sample;
pub(crate) mod stats;
pub(crate) mod tree;
pub(crate) mod verify;


// Re-export
pub use self::{
    learn::{Candidate, Candidates},
    repair::RepairStrategy,
};

/// Backend of the sample generator; cryptominisat brings randomized
/// restarts for more varied samples.
#[cfg(feature = "cryptominisat")]
type GeneratorBackend = crate::sat::cmsat::CryptoMiniSat;
#[cfg(not(feature = "cryptominisat"))]
type GeneratorBackend = Varisat<'static>;

type OracleBackend = Varisat<'static>;

#[derive(Debug, Error, Diagnostic)]
pub enum SynthesisError {
    #[error("SAT backend failure")]
    Backend(#[from] varisat::solver::SolverError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// number of training samples to draw
    pub samples: usize,
    /// iteration cap of the repair loop
    pub iterations: usize,
    /// synthesize in dependency order instead of file order
    pub topo_sort: bool,
    pub strategy: RepairStrategy,
}

impl Default for Options {
    fn default() -> Self {
        Self { samples: 500, iterations: 50, topo_sort: true, strategy: RepairStrategy::default() }
    }
}

#[derive(Debug)]
pub struct Synthesizer {
    spec: Spec,
    options: Options,
    stats: Statistics,
    solution: Option<Candidates>,
}

impl Synthesizer {
    pub fn new(spec: Spec, options: Options) -> Self {
        Self { spec, options, stats: Statistics::default(), solution: None }
    }

    /// The verified candidate map after a successful run.
    pub fn solution(&self) -> Option<&Candidates> {
        self.solution.as_ref()
    }

    /// Runs the full pipeline: sample, learn, verify and repair.
    pub fn synthesize(&mut self) -> Result<SynthesisResult, SynthesisError> {
        let instant = Instant::now();
        let result = self.run();
        self.stats.global.synthesis_time = instant.elapsed();
        info!("\n{:#?}", self.stats);
        result
    }

    fn run(&mut self) -> Result<SynthesisResult, SynthesisError> {
        info!(
            "input dimensions: |X|={}, |Y|={}",
            self.spec.universals().len(),
            self.spec.existentials().len()
        );
        let order = if self.options.topo_sort {
            order::dependency_order(&self.spec)
        } else {
            self.spec.existentials().to_vec()
        };

        info!("starting sampling phase ({} samples)", self.options.samples);
        let inputs: Vec<Var> = self.spec.universals().iter().copied().collect();
        let mut generator = BlockingGenerator::<GeneratorBackend>::new(self.spec.num_vars());
        generator.add_clauses(self.spec.matrix());
        let oracle =
            IncrementalOracle::<OracleBackend>::new(self.spec.num_vars(), self.spec.matrix());
        let mut sampler = OracleSampler::new(generator, oracle, inputs.clone(), order.clone());
        let data = sampler.generate_samples(self.options.samples)?;
        self.stats.global.samples = data.samples.len().try_into().unwrap();
        for &label in data.labels.iter().flatten() {
            match label {
                Label::DontCare => self.stats.labels.dont_care += 1,
                Label::MustOne => self.stats.labels.must_one += 1,
                Label::MustZero => self.stats.labels.must_zero += 1,
            }
        }
        if data.samples.is_empty() {
            error!("the generator produced no model: UNSAT specification");
            return Ok(SynthesisResult::Unsatisfiable);
        }

        info!("starting learning phase");
        let learner = BasisLearner::new(inputs, order.clone(), TreeParams::default());
        let mut candidates = learner.learn(&data);
        for &output in &order {
            let candidate = candidates.get(output);
            self.stats.learn.must_one_cubes +=
                u32::try_from(candidate.must_one.cubes().len()).unwrap();
            self.stats.learn.must_zero_cubes +=
                u32::try_from(candidate.must_zero.cubes().len()).unwrap();
        }

        info!("starting verification and repair loop");
        let verifier = Verifier::new(&self.spec, &order);
        let mut repairer = Repairer::new(&self.spec, &order, self.options.strategy);
        for iteration in 1..=self.options.iterations {
            debug!("iteration {iteration}/{}", self.options.iterations);
            self.stats.global.iterations = iteration.try_into().unwrap();
            match verifier.verify::<OracleBackend>(&candidates)? {
                Verdict::Safe => {
                    info!("valid Skolem basis synthesized after {iteration} iterations");
                    print_solution(&candidates, &order);
                    self.solution = Some(candidates);
                    return Ok(SynthesisResult::Realized);
                }
                Verdict::Unsafe(cex) => {
                    debug!("counterexample blames {} matrix clauses", cex.blame.len());
                    match repairer.localize_and_repair(candidates, &cex) {
                        Ok((repaired, action)) => {
                            candidates = repaired;
                            match action.kind {
                                RepairKind::ExpandMustOne | RepairKind::ExpandMustZero => {
                                    self.stats.repair.expansions += 1;
                                }
                                RepairKind::ShrinkMustOne | RepairKind::ShrinkMustZero => {
                                    self.stats.repair.shrinks += 1;
                                }
                            }
                        }
                        Err(RepairError::Unrepairable { index }) => {
                            error!("matrix clause {index} is falsifiable by the inputs alone");
                            return Ok(SynthesisResult::Unsatisfiable);
                        }
                    }
                }
            }
        }
        error!("synthesis loop exceeded the iteration budget");
        Ok(SynthesisResult::BudgetExhausted)
    }
}

fn print_solution(candidates: &Candidates, order: &[Var]) {
    println!("\n--- Synthesized Skolem Basis ---");
    for &output in order {
        let candidate = candidates.get(output);
        println!("y_{output}:");
        println!(
            "  Must-1 (A): {} cubes, {} clauses",
            candidate.must_one.cubes().len(),
            candidate.must_one.clauses().len()
        );
        println!(
            "  Must-0 (C): {} cubes, {} clauses",
            candidate.must_zero.cubes().len(),
            candidate.must_zero.clauses().len()
        );
    }
}
