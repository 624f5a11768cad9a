use crate::literal::{Lit, Var};
use std::ops::{Index, IndexMut};

/// Wrapper around a `Vec` that is indexed by [`Var`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct VarVec<T>(Vec<T>);

impl<T: Default> VarVec<T> {
    pub(crate) fn set_var_count(&mut self, count: usize) {
        self.0.resize_with(count, Default::default);
    }

    pub(crate) fn get_var_count(&self) -> usize {
        self.0.len()
    }
}

impl<T> VarVec<T> {
    pub(crate) fn get(&self, index: Var) -> Option<&T> {
        self.0.get(index.as_index())
    }
}

impl<T> Index<Var> for VarVec<T> {
    type Output = T;

    fn index(&self, index: Var) -> &Self::Output {
        &self.0[index.as_index()]
    }
}

impl<T> IndexMut<Var> for VarVec<T> {
    fn index_mut(&mut self, index: Var) -> &mut Self::Output {
        &mut self.0[index.as_index()]
    }
}

/// A total assignment over a contiguous variable range.
/// Variables outside the range read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: VarVec<bool>,
}

impl Assignment {
    pub(crate) fn with_var_count(count: usize) -> Self {
        let mut values = VarVec::default();
        values.set_var_count(count);
        Self { values }
    }

    /// Sets the literal's variable to the literal's polarity,
    /// growing the range as needed.
    pub(crate) fn assign(&mut self, lit: Lit) {
        if lit.var().as_index() >= self.values.get_var_count() {
            self.values.set_var_count(lit.var().as_index() + 1);
        }
        self.values[lit.var()] = lit.is_positive();
    }

    pub fn value(&self, var: Var) -> bool {
        self.values.get(var).copied().unwrap_or(false)
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.value(lit.var()) == lit.is_positive()
    }

    /// The literal of `var` under this assignment.
    pub(crate) fn to_lit(&self, var: Var) -> Lit {
        var.lit(self.value(var))
    }
}

impl FromIterator<Lit> for Assignment {
    fn from_iter<I: IntoIterator<Item = Lit>>(iter: I) -> Self {
        let mut assignment = Assignment::default();
        for lit in iter {
            assignment.assign(lit);
        }
        assignment
    }
}
