//! Dual DNF/CNF representation of a candidate approximation.
//!
//! A basis stores `F = (⋁ cubes) ∧ (⋀ clauses)`. Cubes grow the
//! function's true-set (expansion), clauses shrink it (constraint).
//! With no cubes the function is constant false.

use crate::{
    datastructure::Assignment,
    literal::{Lit, LitSlice, Var},
};
use tracing::debug;

/// Allocator for Tseitin auxiliary variables above the input range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshVars {
    next: u32,
}

impl FreshVars {
    /// Starts handing out variables directly above `num_vars`.
    pub fn after(num_vars: u32) -> Self {
        Self { next: num_vars + 1 }
    }

    pub fn fresh(&mut self) -> Var {
        let var = Var::from_dimacs(self.next.try_into().unwrap());
        self.next += 1;
        var
    }

    /// The highest variable id handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicBasis {
    name: String,
    cubes: Vec<Vec<Lit>>,
    clauses: Vec<Vec<Lit>>,
}

impl SymbolicBasis {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), cubes: Vec::new(), clauses: Vec::new() }
    }

    pub fn cubes(&self) -> &[Vec<Lit>] {
        &self.cubes
    }

    pub fn clauses(&self) -> &[Vec<Lit>] {
        &self.clauses
    }

    /// Sorts and deduplicates a literal set. A set mentioning a
    /// variable in both polarities violates the basis invariants.
    fn normalize(lits: &[Lit]) -> Vec<Lit> {
        let mut lits = lits.to_vec();
        lits.sort_unstable();
        lits.dedup();
        assert!(
            !lits.iter().zip(lits.iter().skip(1)).any(|(&left, &right)| left == !right),
            "literal set contains a variable in both polarities"
        );
        lits
    }

    /// Expands the true-set by a cube. Stored clauses wholly negated
    /// by the cube (`K ⇒ ¬C`) would block the expansion and are
    /// removed first.
    pub fn add_cube(&mut self, lits: &[Lit]) {
        let cube = Self::normalize(lits);
        debug!("[{}] expand with cube {}", self.name, LitSlice::from(&cube[..]));
        let before = self.clauses.len();
        self.clauses.retain(|clause| !clause.iter().all(|&l| cube.binary_search(&!l).is_ok()));
        let removed = before - self.clauses.len();
        if removed > 0 {
            debug!("[{}] removed {removed} clauses to allow the expansion", self.name);
        }
        self.cubes.push(cube);
    }

    /// Shrinks the true-set by a clause. The caller is responsible
    /// for adding clauses that actually restrict the function at the
    /// point being repaired.
    pub fn add_clause(&mut self, lits: &[Lit]) {
        let clause = Self::normalize(lits);
        debug!("[{}] shrink with clause {}", self.name, LitSlice::from(&clause[..]));
        self.clauses.push(clause);
    }

    /// Evaluates the basis under a total assignment. Variables the
    /// assignment does not cover read as false.
    pub fn evaluate(&self, assignment: &Assignment) -> bool {
        let expansion =
            self.cubes.iter().any(|cube| cube.iter().all(|&lit| assignment.lit_is_true(lit)));
        if !expansion {
            return false;
        }
        self.clauses.iter().all(|clause| clause.iter().any(|&lit| assignment.lit_is_true(lit)))
    }

    /// Tseitin-encodes `out ↔ F` into CNF clauses, drawing auxiliary
    /// variables from `fresh`: one selector per cube, a disjunction
    /// variable for the DNF part, and one selector per stored clause.
    pub fn constrain_onto(&self, out: Lit, fresh: &mut FreshVars) -> Vec<Vec<Lit>> {
        let mut cnf = Vec::new();

        let mut cube_lits = Vec::with_capacity(self.cubes.len());
        for cube in &self.cubes {
            let selector = fresh.fresh().positive();
            for &lit in cube {
                cnf.push(vec![!selector, lit]);
            }
            let mut reverse: Vec<Lit> = cube.iter().map(|&lit| !lit).collect();
            reverse.push(selector);
            cnf.push(reverse);
            cube_lits.push(selector);
        }

        let disjunction = fresh.fresh().positive();
        if cube_lits.is_empty() {
            cnf.push(vec![!disjunction]);
        } else {
            let mut any_cube = vec![!disjunction];
            any_cube.extend_from_slice(&cube_lits);
            cnf.push(any_cube);
            for &selector in &cube_lits {
                cnf.push(vec![!selector, disjunction]);
            }
        }

        let mut clause_lits = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            let selector = fresh.fresh().positive();
            let mut implies = vec![!selector];
            implies.extend_from_slice(clause);
            cnf.push(implies);
            for &lit in clause {
                cnf.push(vec![!lit, selector]);
            }
            clause_lits.push(selector);
        }

        cnf.push(vec![!out, disjunction]);
        for &selector in &clause_lits {
            cnf.push(vec![!out, selector]);
        }
        let mut closure = vec![!disjunction];
        closure.extend(clause_lits.iter().map(|&selector| !selector));
        closure.push(out);
        cnf.push(closure);

        cnf
    }

    /// Like [`SymbolicBasis::constrain_onto`], with the output
    /// literal allocated from `fresh`.
    pub fn to_cnf(&self, fresh: &mut FreshVars) -> (Vec<Vec<Lit>>, Lit) {
        let out = fresh.fresh().positive();
        (self.constrain_onto(out, fresh), out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::{collection, prelude::*};

    fn lits(lits: &[i32]) -> Vec<Lit> {
        lits.iter().map(|&l| Lit::from_dimacs(l)).collect()
    }

    /// Assignment over `count` variables encoded in the bits of `mask`.
    fn assignment(mask: u32, count: u32) -> Assignment {
        (0..count).map(|idx| Var::from_index(idx).lit(mask & (1 << idx) != 0)).collect()
    }

    #[test]
    fn empty_basis_is_false() {
        let basis = SymbolicBasis::new("F");
        assert!(!basis.evaluate(&assignment(0b1111, 4)));
    }

    #[test]
    fn dnf_and_cnf_part() {
        let mut basis = SymbolicBasis::new("F");
        basis.add_cube(&lits(&[1]));
        basis.add_cube(&lits(&[2, 3]));
        basis.add_clause(&lits(&[-4]));
        // cube [1] satisfied, clause [-4] satisfied
        assert!(basis.evaluate(&assignment(0b0001, 4)));
        // cube [2, 3] satisfied
        assert!(basis.evaluate(&assignment(0b0110, 4)));
        // no cube satisfied
        assert!(!basis.evaluate(&assignment(0b0010, 4)));
        // clause [-4] falsified
        assert!(!basis.evaluate(&assignment(0b1001, 4)));
    }

    #[test]
    fn expansion_purges_blocking_clause() {
        let mut basis = SymbolicBasis::new("F");
        basis.add_cube(&lits(&[3]));
        basis.add_clause(&lits(&[-1, -2]));
        basis.add_cube(&lits(&[1, 2]));
        assert!(basis.clauses().is_empty());
        assert_eq!(basis.cubes().len(), 2);
        assert!(basis.evaluate(&assignment(0b011, 3)));
    }

    #[test]
    fn compatible_clause_survives_expansion() {
        let mut basis = SymbolicBasis::new("F");
        basis.add_cube(&lits(&[3]));
        basis.add_clause(&lits(&[-1, -2]));
        basis.add_cube(&lits(&[1]));
        assert_eq!(basis.clauses().len(), 1);
    }

    #[test]
    #[should_panic]
    fn inconsistent_cube() {
        let mut basis = SymbolicBasis::new("F");
        basis.add_cube(&lits(&[1, -1]));
    }

    #[test]
    fn fresh_vars() {
        let mut fresh = FreshVars::after(4);
        assert_eq!(fresh.fresh().to_dimacs(), 5);
        assert_eq!(fresh.fresh().to_dimacs(), 6);
        assert_eq!(fresh.allocated(), 6);
    }

    /// A consistent literal set over the first four variables.
    fn lit_set() -> impl Strategy<Value = Vec<Lit>> {
        collection::vec(proptest::option::of(proptest::bool::ANY), 4).prop_map(|polarities| {
            polarities
                .into_iter()
                .enumerate()
                .filter_map(|(idx, polarity)| {
                    polarity.map(|value| Var::from_index(idx.try_into().unwrap()).lit(value))
                })
                .collect()
        })
    }

    fn basis() -> impl Strategy<Value = SymbolicBasis> {
        (collection::vec(lit_set(), 0..3), collection::vec(lit_set(), 0..3)).prop_map(
            |(cubes, clauses)| {
                let mut basis = SymbolicBasis::new("F");
                for cube in &cubes {
                    basis.add_cube(cube);
                }
                for clause in &clauses {
                    basis.add_clause(clause);
                }
                basis
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn expansion_is_monotone(mut basis in basis(), cube in lit_set()) {
            let before = basis.clone();
            basis.add_cube(&cube);
            for mask in 0..16u32 {
                let point = assignment(mask, 4);
                if before.evaluate(&point) || cube.iter().all(|&lit| point.lit_is_true(lit)) {
                    assert!(basis.evaluate(&point));
                }
            }
        }

        #[test]
        fn shrinking_is_antitone(mut basis in basis(), clause in lit_set()) {
            let before = basis.clone();
            basis.add_clause(&clause);
            for mask in 0..16u32 {
                let point = assignment(mask, 4);
                if basis.evaluate(&point) {
                    assert!(before.evaluate(&point));
                }
            }
        }

        #[test]
        fn expansion_leaves_no_blocked_clause(mut basis in basis(), cube in lit_set()) {
            basis.add_cube(&cube);
            let cube = basis.cubes().last().unwrap();
            for clause in basis.clauses() {
                assert!(!clause.iter().all(|&l| cube.contains(&!l)));
            }
        }

        /// Every satisfying extension of the encoding agrees with the
        /// basis on the output literal, and every input point has a
        /// satisfying extension.
        #[test]
        fn tseitin_is_faithful(basis in basis()) {
            let mut fresh = FreshVars::after(4);
            let (cnf, out) = basis.to_cnf(&mut fresh);
            let total = fresh.allocated();
            let mut covered = vec![false; 16];
            for mask in 0..(1u32 << total) {
                let point = assignment(mask, total);
                let satisfied = cnf
                    .iter()
                    .all(|clause| clause.iter().any(|&lit| point.lit_is_true(lit)));
                if satisfied {
                    assert_eq!(point.lit_is_true(out), basis.evaluate(&point));
                    covered[(mask & 0b1111) as usize] = true;
                }
            }
            assert!(covered.iter().all(|&reached| reached));
        }
    }
}
