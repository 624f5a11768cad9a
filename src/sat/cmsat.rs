//! Implementation of SAT solver interface for [cryptominisat](https://crates.io/crates/cryptominisat).
//! Mainly useful as the sample-generator backend: CryptoMiniSat's
//! randomized restarts give CMSGen-style model variety.

use std::convert::Infallible;

use cryptominisat::Lbool;

use super::{SatSolver, SatSolverLit};

pub(crate) struct CryptoMiniSat {
    solver: cryptominisat::Solver,
    model: Vec<cryptominisat::Lit>,
}

impl SatSolver for CryptoMiniSat {
    type Lit = cryptominisat::Lit;
    type Err = Infallible;

    fn add_variable(&mut self) -> Self::Lit {
        self.solver.new_var()
    }

    fn add_clause(&mut self, lits: &[Self::Lit]) {
        self.solver.add_clause(lits);
    }

    fn solve_with_assumptions(&mut self, assumptions: &[Self::Lit]) -> Result<bool, Self::Err> {
        match self.solver.solve_with_assumptions(assumptions) {
            Lbool::True => Ok(true),
            Lbool::False => Ok(false),
            // no time or conflict budget is ever configured
            Lbool::Undef => unreachable!("solver returned undef without a budget"),
        }
    }

    fn model(&mut self) -> Option<&[Self::Lit]> {
        self.model = self
            .solver
            .get_model()
            .iter()
            .enumerate()
            .filter_map(|(idx, &value)| {
                let negated = match value {
                    Lbool::True => false,
                    Lbool::False => true,
                    Lbool::Undef => return None,
                };
                Some(cryptominisat::Lit::new(idx.try_into().unwrap(), negated).unwrap())
            })
            .collect();
        Some(&self.model)
    }
}

impl Default for CryptoMiniSat {
    fn default() -> Self {
        Self { solver: cryptominisat::Solver::new(), model: Vec::default() }
    }
}

impl SatSolverLit for cryptominisat::Lit {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_basic() -> Result<(), Box<dyn std::error::Error>> {
        crate::sat::test::test_basic::<CryptoMiniSat>()
    }

    #[test]
    fn test_dense() -> Result<(), Box<dyn std::error::Error>> {
        crate::sat::test::test_dense::<CryptoMiniSat>()
    }
}
