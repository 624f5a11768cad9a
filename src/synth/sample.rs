//! Oracle sampling and labelling of the training data.
//!
//! Two collaborators drive this phase: a *generator* producing
//! satisfying models of the matrix and an incremental *oracle*
//! answering assumption queries against it. For every sampled model
//! and every output, the oracle decides whether the prefix over
//! `X ∪ Y_<i` forces the output, leaves it free, or forces it low.

use crate::{
    clause::Clause,
    datastructure::Assignment,
    literal::{Lit, Var},
    sat::{DenseSolver, SatSolver},
};
use derivative::Derivative;
use tracing::{info, warn};

/// Classification of an output under a sampled prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Label {
    /// both values keep the matrix satisfiable
    DontCare,
    /// the prefix forces the output to 1
    MustOne,
    /// the prefix forces the output to 0
    MustZero,
}

impl Label {
    pub(crate) fn index(self) -> usize {
        match self {
            Label::DontCare => 0,
            Label::MustOne => 1,
            Label::MustZero => 2,
        }
    }
}

/// Produces satisfying models of the matrix.
pub(crate) trait ModelGenerator {
    fn add_clauses(&mut self, clauses: &[Clause]);
    /// Returns true iff a model was produced.
    fn solve(&mut self) -> bool;
    /// The model of the last successful [`ModelGenerator::solve`].
    fn model(&self) -> &Assignment;
}

/// Incremental satisfiability oracle over the matrix.
pub(crate) trait Oracle {
    type Err: std::error::Error + 'static;
    fn solve(&mut self, assumptions: &[Lit]) -> Result<bool, Self::Err>;
}

/// Model generator that enumerates distinct total models by blocking
/// each returned one. Sampling stays deterministic while the
/// assignments still vary from call to call.
#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct BlockingGenerator<S: SatSolver> {
    #[derivative(Debug = "ignore")]
    solver: DenseSolver<S>,
    model: Assignment,
    num_vars: u32,
}

impl<S: SatSolver> BlockingGenerator<S> {
    pub(crate) fn new(num_vars: u32) -> Self {
        Self {
            solver: DenseSolver::with_var_count(num_vars as usize),
            model: Assignment::default(),
            num_vars,
        }
    }
}

impl<S: SatSolver> ModelGenerator for BlockingGenerator<S> {
    fn add_clauses(&mut self, clauses: &[Clause]) {
        for clause in clauses {
            self.solver.add_clause(clause.lits());
        }
    }

    fn solve(&mut self) -> bool {
        match self.solver.solve() {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                warn!("generator backend failed: {err}");
                return false;
            }
        }
        self.model = self.solver.model().expect("model is available after a successful solve");
        // block the model so the next call yields a different one
        let blocking: Vec<Lit> = (1..=self.num_vars)
            .map(|var| {
                let var = Var::from_dimacs(i32::try_from(var).unwrap());
                !self.model.to_lit(var)
            })
            .collect();
        self.solver.add_clause(&blocking);
        true
    }

    fn model(&self) -> &Assignment {
        &self.model
    }
}

/// Assumption oracle backed by a single long-lived solver instance.
#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct IncrementalOracle<S: SatSolver> {
    #[derivative(Debug = "ignore")]
    solver: DenseSolver<S>,
}

impl<S: SatSolver> IncrementalOracle<S> {
    pub(crate) fn new(num_vars: u32, matrix: &[Clause]) -> Self {
        let mut solver = DenseSolver::with_var_count(num_vars as usize);
        for clause in matrix {
            solver.add_clause(clause.lits());
        }
        Self { solver }
    }
}

impl<S: SatSolver> Oracle for IncrementalOracle<S> {
    type Err = S::Err;

    fn solve(&mut self, assumptions: &[Lit]) -> Result<bool, Self::Err> {
        self.solver.solve_with_assumptions(assumptions)
    }
}

/// Labelled training data: full models and, per output in synthesis
/// order, one label per model.
#[derive(Debug, Clone, Default)]
pub(crate) struct TrainingData {
    pub(crate) samples: Vec<Assignment>,
    pub(crate) labels: Vec<Vec<Label>>,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct OracleSampler<G, O> {
    #[derivative(Debug = "ignore")]
    generator: G,
    #[derivative(Debug = "ignore")]
    oracle: O,
    inputs: Vec<Var>,
    outputs: Vec<Var>,
}

impl<G: ModelGenerator, O: Oracle> OracleSampler<G, O> {
    pub(crate) fn new(generator: G, oracle: O, inputs: Vec<Var>, outputs: Vec<Var>) -> Self {
        Self { generator, oracle, inputs, outputs }
    }

    /// Draws up to `num_samples` models and labels every output under
    /// its prefix. Generator exhaustion ends sampling early with
    /// whatever was accumulated; oracle failures are fatal.
    pub(crate) fn generate_samples(&mut self, num_samples: usize) -> Result<TrainingData, O::Err> {
        let mut data =
            TrainingData { samples: Vec::new(), labels: vec![Vec::new(); self.outputs.len()] };
        info!("starting sample generation, target {num_samples}");
        while data.samples.len() < num_samples {
            if !self.generator.solve() {
                warn!("generator exhausted after {} of {num_samples} samples", data.samples.len());
                break;
            }
            let model = self.generator.model().clone();

            let mut assumptions: Vec<Lit> =
                Vec::with_capacity(self.inputs.len() + self.outputs.len() + 1);
            for (idx, &output) in self.outputs.iter().enumerate() {
                assumptions.clear();
                assumptions.extend(self.inputs.iter().map(|&input| model.to_lit(input)));
                assumptions.extend(self.outputs[..idx].iter().map(|&prev| model.to_lit(prev)));

                assumptions.push(output.negative());
                let can_be_zero = self.oracle.solve(&assumptions)?;
                *assumptions.last_mut().expect("assumptions hold the queried output") =
                    output.positive();
                let can_be_one = self.oracle.solve(&assumptions)?;

                let label = match (can_be_zero, can_be_one) {
                    (true, true) => Label::DontCare,
                    (false, true) => Label::MustOne,
                    (true, false) => Label::MustZero,
                    (false, false) => {
                        // unreachable when the model satisfies the
                        // matrix; classified as don't-care
                        warn!("oracle rejects both values of {output} under its prefix");
                        Label::DontCare
                    }
                };
                data.labels[idx].push(label);
            }
            data.samples.push(model);
            if data.samples.len() % 50 == 0 {
                info!("generated {}/{num_samples} samples", data.samples.len());
            }
        }
        info!("finished sampling, total samples: {}", data.samples.len());
        Ok(data)
    }
}
