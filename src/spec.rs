//! An immutable 2QBF view of a QDIMACS input: the quantifier prefix
//! collapsed into a universal set and a file-ordered existential
//! sequence, plus the normalized matrix.

use crate::{
    clause::Clause,
    literal::{Lit, Var},
    qdimacs::FromQdimacs,
    QuantTy,
};
use miette::Diagnostic;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Diagnostic)]
pub enum SpecError {
    #[error("quantifier prefix has an alternation beyond a single forall-exists block")]
    UnsupportedPrefix,

    #[error("variable {var} is bound more than once")]
    BoundTwice { var: Var },

    #[error("variable {var} exceeds the declared variable count {num_vars}")]
    OutOfRange { var: Var, num_vars: u32 },

    #[error("matrix variable {var} is not bound by the prefix")]
    Unbound { var: Var },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spec {
    num_vars: u32,
    universals: BTreeSet<Var>,
    /// existential variables in file-appearance order
    existentials: Vec<Var>,
    matrix: Vec<Clause>,
    /// quantifier kinds in input order, adjacent repetitions merged
    blocks: Vec<QuantTy>,
}

impl Spec {
    #[must_use]
    pub fn new(prefix: &[(QuantTy, &[u32])], matrix: &[&[i32]]) -> Self {
        let mut spec = Spec::default();
        for &(quant, vars) in prefix {
            let vars: Vec<Var> =
                vars.iter().map(|&var| Var::from_dimacs(var.try_into().unwrap())).collect();
            spec.quantify(quant, &vars);
        }
        for &lits in matrix {
            let lits: Vec<Lit> = lits.iter().map(|&lit| Lit::from_dimacs(lit)).collect();
            spec.add_clause(&lits);
        }
        spec.num_vars = spec.max_var();
        spec
    }

    fn max_var(&self) -> u32 {
        self.universals
            .iter()
            .chain(self.existentials.iter())
            .map(|var| var.to_dimacs())
            .chain(self.matrix.iter().flat_map(Clause::lits).map(|lit| lit.var().to_dimacs()))
            .max()
            .unwrap_or_default()
            .try_into()
            .unwrap()
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn universals(&self) -> &BTreeSet<Var> {
        &self.universals
    }

    pub fn existentials(&self) -> &[Var] {
        &self.existentials
    }

    pub fn matrix(&self) -> &[Clause] {
        &self.matrix
    }

    /// Checks the invariants assumed by the synthesis engine: every
    /// variable bound exactly once, within the declared range, and a
    /// prefix with at most one ∀∃ alternation.
    pub fn validate(&self) -> Result<(), SpecError> {
        match self.blocks[..] {
            []
            | [QuantTy::Forall]
            | [QuantTy::Exists]
            | [QuantTy::Forall, QuantTy::Exists] => {}
            _ => return Err(SpecError::UnsupportedPrefix),
        }
        let mut bound = BTreeSet::new();
        for &var in self.universals.iter().chain(self.existentials.iter()) {
            if !bound.insert(var) {
                return Err(SpecError::BoundTwice { var });
            }
            if var.as_index() >= self.num_vars as usize {
                return Err(SpecError::OutOfRange { var, num_vars: self.num_vars });
            }
        }
        for clause in &self.matrix {
            for &lit in clause {
                let var = lit.var();
                if var.as_index() >= self.num_vars as usize {
                    return Err(SpecError::OutOfRange { var, num_vars: self.num_vars });
                }
                if !bound.contains(&var) {
                    return Err(SpecError::Unbound { var });
                }
            }
        }
        Ok(())
    }

    fn quantify(&mut self, quant: QuantTy, vars: &[Var]) {
        if vars.is_empty() {
            return;
        }
        if self.blocks.last() != Some(&quant) {
            self.blocks.push(quant);
        }
        match quant {
            QuantTy::Forall => self.universals.extend(vars.iter().copied()),
            QuantTy::Exists => self.existentials.extend_from_slice(vars),
        }
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        let clause = Clause::new(lits);
        if clause.is_tautology() {
            debug!("dropping tautological clause {clause}");
            return;
        }
        self.matrix.push(clause);
    }
}

impl FromQdimacs for Spec {
    fn set_num_variables(&mut self, variables: u32) {
        self.num_vars = variables;
    }

    fn set_num_clauses(&mut self, _: u32) {}

    fn quantify(&mut self, quant: QuantTy, vars: &[Var]) {
        self.quantify(quant, vars);
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        self.add_clause(lits);
    }
}

impl std::fmt::Display for Spec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.matrix.len())?;
        for (quant, vars) in [
            (QuantTy::Forall, self.universals.iter().copied().collect::<Vec<_>>()),
            (QuantTy::Exists, self.existentials.clone()),
        ] {
            if vars.is_empty() {
                continue;
            }
            writeln!(
                f,
                "{quant} {} 0",
                vars.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
            )?;
        }
        for clause in &self.matrix {
            writeln!(f, "{clause}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
macro_rules! spec_core {
    ($prefix:expr, $matrix:expr,) => {
		(crate::spec::Spec::new(&$prefix, &$matrix))
	};
    ($prefix:expr, $matrix:expr, a $( $x:literal )* ; $($tail:tt)* ) => {{
		$prefix.push((crate::quantifier::QuantTy::Forall, &[ $( $x ),* ]));
        spec_core![$prefix, $matrix, $($tail)*]
    }};
    ($prefix:expr, $matrix:expr, e $( $x:literal )* ; $($tail:tt)* ) => {{
		$prefix.push((crate::quantifier::QuantTy::Exists, &[ $( $x ),* ]));
        spec_core![$prefix, $matrix,$($tail)*]
    }};
    ($prefix:expr, $matrix:expr, $( $x:literal )* ; $($tail:tt)* ) => {{
		$matrix.push(&[ $( $x ),* ]);
        spec_core![$prefix, $matrix, $($tail)*]
    }};
}

/// Macro that creates a [`Spec`] instance from a QDIMACS-like representation.
/// The main differences are:
/// * No support for comments
/// * No header line
/// * Lines are seperated by `;`, whereas QDIMACS uses `0`.
///
/// # Example
/// ```
/// let spec = spec_formula![
///     a 1 2;
///     e 3;
///     1 2;
/// ];
/// ```
///
#[cfg(test)]
macro_rules! spec_formula {
	($($tail:tt)*) => {
		 {
			 let mut prefix: Vec<(crate::quantifier::QuantTy, &[u32])> = Vec::new();
			 let mut matrix: Vec<&[i32]> = Vec::new();
			 spec_core![prefix, matrix, $($tail)*]
		 }

	};
}
