//! Generic SAT solver interface that supports incremental solving

use derivative::Derivative;

use crate::{
    datastructure::Assignment,
    literal::{Lit, Var},
};

#[cfg(feature = "cryptominisat")]
pub(crate) mod cmsat;
pub(crate) mod varisat;

/// Incremental SAT solver interface.
///
/// We assume variables to be index-based, such that mapping from
/// [`crate::literal::Lit`] to [`SatSolver::Lit`] is cheap.
pub(crate) trait SatSolver: Default {
    type Lit: SatSolverLit;
    type Err: std::error::Error + 'static;

    fn add_variable(&mut self) -> Self::Lit;
    fn add_clause(&mut self, lits: &[Self::Lit]);
    fn solve_with_assumptions(&mut self, assumptions: &[Self::Lit]) -> Result<bool, Self::Err>;
    fn model(&mut self) -> Option<&[Self::Lit]>;

    fn solve(&mut self) -> Result<bool, Self::Err> {
        self.solve_with_assumptions(&[])
    }
}

pub(crate) trait SatSolverLit: Copy + Eq + std::ops::Not<Output = Self> {}

/// Maps the crate's contiguous DIMACS variable range onto backend
/// literals. All users of this engine work over a range known up
/// front (matrix variables, gate variables, Tseitin auxiliaries), so
/// variables are allocated eagerly in index order.
#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct DenseSolver<S: SatSolver> {
    #[derivative(Debug = "ignore")]
    sat_solver: S,
    #[derivative(Debug = "ignore")]
    vars: Vec<S::Lit>,
}

impl<S: SatSolver> DenseSolver<S> {
    pub(crate) fn with_var_count(count: usize) -> Self {
        let mut sat_solver = S::default();
        let vars = (0..count).map(|_| sat_solver.add_variable()).collect();
        Self { sat_solver, vars }
    }

    fn lookup(&self, lit: Lit) -> S::Lit {
        let sat_lit = self.vars[lit.var().as_index()];
        if lit.is_negative() {
            !sat_lit
        } else {
            sat_lit
        }
    }

    pub(crate) fn add_clause(&mut self, lits: &[Lit]) {
        let mapped: Vec<S::Lit> = lits.iter().map(|&lit| self.lookup(lit)).collect();
        self.sat_solver.add_clause(&mapped);
    }

    pub(crate) fn solve(&mut self) -> Result<bool, S::Err> {
        self.sat_solver.solve()
    }

    pub(crate) fn solve_with_assumptions(&mut self, assumptions: &[Lit]) -> Result<bool, S::Err> {
        let mapped: Vec<S::Lit> = assumptions.iter().map(|&lit| self.lookup(lit)).collect();
        self.sat_solver.solve_with_assumptions(&mapped)
    }

    /// The model of the last successful solve, projected back onto
    /// the crate's variables. Unassigned variables read as false.
    pub(crate) fn model(&mut self) -> Option<Assignment> {
        let model = self.sat_solver.model()?;
        let mut assignment = Assignment::with_var_count(self.vars.len());
        for (idx, &sat_lit) in self.vars.iter().enumerate() {
            if model.contains(&sat_lit) {
                assignment.assign(Var::from_index(idx.try_into().unwrap()).positive());
            }
        }
        Some(assignment)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    pub(crate) fn test_basic<S: SatSolver>() -> Result<(), Box<dyn std::error::Error>> {
        let mut solver = S::default();

        // create variables
        let x = solver.add_variable();
        let y = solver.add_variable();
        let z = solver.add_variable();

        solver.add_clause(&[!x, y]);
        solver.add_clause(&[!y, z]);
        assert!(solver.solve()?);

        solver.add_clause(&[!z, x]);
        assert!(solver.solve()?);

        let model = solver.model().unwrap();
        assert!(
            [x, y, z].into_iter().all(|lit| model.contains(&lit))
                || [!x, !y, !z].into_iter().all(|lit| model.contains(&lit))
        );

        // solve with assumptions
        let ignore_clauses = solver.add_variable();
        solver.add_clause(&[ignore_clauses, !z, !y]);
        solver.add_clause(&[ignore_clauses, z, y]);

        assert!(!solver.solve_with_assumptions(&[!ignore_clauses])?);

        solver.add_clause(&[ignore_clauses]);
        assert!(solver.solve()?);

        Ok(())
    }

    pub(crate) fn test_dense<S: SatSolver>() -> Result<(), Box<dyn std::error::Error>> {
        let mut solver = DenseSolver::<S>::with_var_count(3);
        let lits = |lits: &[i32]| lits.iter().map(|&l| Lit::from_dimacs(l)).collect::<Vec<_>>();

        solver.add_clause(&lits(&[1, 2]));
        solver.add_clause(&lits(&[-1, 3]));
        assert!(solver.solve()?);
        let model = solver.model().unwrap();
        assert!(model.lit_is_true(Lit::from_dimacs(1)) || model.lit_is_true(Lit::from_dimacs(2)));

        assert!(solver.solve_with_assumptions(&lits(&[1]))?);
        let model = solver.model().unwrap();
        assert!(model.lit_is_true(Lit::from_dimacs(1)));
        assert!(model.lit_is_true(Lit::from_dimacs(3)));

        assert!(!solver.solve_with_assumptions(&lits(&[-1, -2]))?);
        Ok(())
    }
}
