//! Verification of the candidate basis and counterexample extraction.
//!
//! Each iteration builds a fresh SAT instance over the original
//! variables, one gate variable per output, and the Tseitin
//! auxiliaries of the basis encodings. The instance is satisfiable
//! exactly when some input assignment falsifies the substituted
//! matrix under the candidate gates.

use super::learn::Candidates;
use crate::{
    basis::FreshVars,
    datastructure::{Assignment, VarVec},
    literal::{Lit, Var},
    sat::{DenseSolver, SatSolver},
    spec::Spec,
};
use tracing::trace;

/// A witness against the current candidates.
#[derive(Debug, Clone)]
pub(crate) struct Counterexample {
    /// model over the original variables
    pub(crate) assignment: Assignment,
    /// candidate gate value per output, in synthesis order
    pub(crate) outputs: Vec<(Var, bool)>,
    /// indices of matrix clauses falsified under the gates
    pub(crate) blame: Vec<usize>,
}

#[derive(Debug)]
pub(crate) enum Verdict {
    Safe,
    Unsafe(Counterexample),
}

#[derive(Debug)]
pub(crate) struct Verifier<'a> {
    spec: &'a Spec,
    order: &'a [Var],
}

impl<'a> Verifier<'a> {
    pub(crate) fn new(spec: &'a Spec, order: &'a [Var]) -> Self {
        Self { spec, order }
    }

    /// Encodes the candidates and the negated substituted matrix
    /// into a fresh solver instance and decides safety.
    pub(crate) fn verify<S: SatSolver>(&self, candidates: &Candidates) -> Result<Verdict, S::Err> {
        let num_vars = self.spec.num_vars();
        let mut fresh = FreshVars::after(num_vars);
        let mut gates: VarVec<Option<Var>> = VarVec::default();
        gates.set_var_count(num_vars as usize);
        for &output in self.order {
            gates[output] = Some(fresh.fresh());
        }

        let mut cnf: Vec<Vec<Lit>> = Vec::new();
        for &output in self.order {
            let candidate = candidates.get(output);
            let (must_one_cnf, a) = candidate.must_one.to_cnf(&mut fresh);
            cnf.extend(must_one_cnf);
            let (must_zero_cnf, c) = candidate.must_zero.to_cnf(&mut fresh);
            cnf.extend(must_zero_cnf);
            let gate = gates[output].expect("every output has a gate").positive();
            // gate ↔ a ∧ ¬c
            cnf.push(vec![!gate, a]);
            cnf.push(vec![!gate, !c]);
            cnf.push(vec![!a, c, gate]);
            // the feature variable of later candidates carries the
            // gate's value, so the gate vector is a function of the
            // inputs alone
            let feature = output.positive();
            cnf.push(vec![!feature, gate]);
            cnf.push(vec![feature, !gate]);
        }

        // negation of the matrix with outputs replaced by their
        // gates: a selector per clause forces all its literals false,
        // and at least one selector must fire
        let mut selectors = Vec::with_capacity(self.spec.matrix().len());
        for clause in self.spec.matrix() {
            let selector = fresh.fresh().positive();
            for &lit in clause {
                cnf.push(vec![!selector, !substitute(lit, &gates)]);
            }
            selectors.push(selector);
        }
        cnf.push(selectors);

        let mut solver = DenseSolver::<S>::with_var_count(fresh.allocated() as usize);
        for clause in &cnf {
            solver.add_clause(clause);
        }
        if !solver.solve()? {
            return Ok(Verdict::Safe);
        }
        let model = solver.model().expect("model is available after a successful solve");

        let mut assignment = Assignment::with_var_count(num_vars as usize);
        for idx in 0..num_vars {
            let var = Var::from_index(idx);
            if model.value(var) {
                assignment.assign(var.positive());
            }
        }
        let outputs: Vec<(Var, bool)> = self
            .order
            .iter()
            .map(|&output| {
                (output, model.value(gates[output].expect("every output has a gate")))
            })
            .collect();
        let blame: Vec<usize> = self
            .spec
            .matrix()
            .iter()
            .enumerate()
            .filter(|(_, clause)| {
                !clause.iter().any(|&lit| model.lit_is_true(substitute(lit, &gates)))
            })
            .map(|(idx, _)| idx)
            .collect();
        debug_assert!(!blame.is_empty(), "a counterexample falsifies at least one clause");
        trace!("counterexample blames clauses {blame:?}");
        Ok(Verdict::Unsafe(Counterexample { assignment, outputs, blame }))
    }
}

fn substitute(lit: Lit, gates: &VarVec<Option<Var>>) -> Lit {
    match gates[lit.var()] {
        Some(gate) => gate.lit(lit.is_positive()),
        None => lit,
    }
}
