//! Counterexample localization and candidate repair.

use super::{learn::Candidates, verify::Counterexample};
use crate::{
    datastructure::VarVec,
    literal::{Lit, Var},
    spec::Spec,
};
use thiserror::Error;
use tracing::debug;

/// Which side is updated when a counterexample demands the gate to
/// fall. Rising repairs always expand the Must-1 side first, since a
/// clause can never raise the gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepairStrategy {
    /// Add the point cube to the opposing side first; escalate to a
    /// blocking clause on the original side when the point recurs.
    #[default]
    OpposingCube,
    /// Block the point directly with a clause on the Must-1 side.
    SelfClause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RepairKind {
    ExpandMustOne,
    ExpandMustZero,
    ShrinkMustOne,
    ShrinkMustZero,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RepairAction {
    pub(crate) target: Var,
    pub(crate) kind: RepairKind,
}

#[derive(Debug, Error)]
pub(crate) enum RepairError {
    #[error("counterexample clause {index} contains no existential literal")]
    Unrepairable { index: usize },
}

/// A failing point: the repair target together with the cube
/// asserting its feature values. The desired polarity is left out on
/// purpose, so a 0/1 flip-flop on one point counts as a recurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RepairPoint {
    target: Var,
    cube: Vec<Lit>,
}

pub(crate) struct Repairer<'a> {
    spec: &'a Spec,
    order: &'a [Var],
    strategy: RepairStrategy,
    /// position of each output in the synthesis order
    positions: VarVec<Option<usize>>,
    last: Option<RepairPoint>,
}

impl<'a> Repairer<'a> {
    pub(crate) fn new(spec: &'a Spec, order: &'a [Var], strategy: RepairStrategy) -> Self {
        let mut positions: VarVec<Option<usize>> = VarVec::default();
        positions.set_var_count(spec.num_vars() as usize);
        for (idx, &output) in order.iter().enumerate() {
            positions[output] = Some(idx);
        }
        Self { spec, order, strategy, positions, last: None }
    }

    /// Picks the earliest output (in synthesis order) occurring in a
    /// blamed clause and updates its candidate so the clause would
    /// have been satisfied at the counterexample point.
    pub(crate) fn localize_and_repair(
        &mut self,
        mut candidates: Candidates,
        cex: &Counterexample,
    ) -> Result<(Candidates, RepairAction), RepairError> {
        let (target, position, desired) = self.localize(cex)?;
        let point = RepairPoint { target, cube: self.point_cube(cex, position) };
        let repeated = self.last.as_ref() == Some(&point);
        let candidate = candidates.get_mut(target);
        let kind = if desired {
            // the gate is low but the clause needs it high: Must-1 is
            // too small, unless the point recurs because Must-0
            // still covers it
            if repeated {
                candidate.must_zero.add_clause(&negated(&point.cube));
                RepairKind::ShrinkMustZero
            } else {
                candidate.must_one.add_cube(&point.cube);
                RepairKind::ExpandMustOne
            }
        } else {
            match self.strategy {
                RepairStrategy::SelfClause => {
                    candidate.must_one.add_clause(&negated(&point.cube));
                    RepairKind::ShrinkMustOne
                }
                RepairStrategy::OpposingCube if repeated => {
                    candidate.must_one.add_clause(&negated(&point.cube));
                    RepairKind::ShrinkMustOne
                }
                RepairStrategy::OpposingCube => {
                    candidate.must_zero.add_cube(&point.cube);
                    RepairKind::ExpandMustZero
                }
            }
        };
        self.last = Some(point);
        debug!("repair {target}: {kind:?}");
        Ok((candidates, RepairAction { target, kind }))
    }

    fn localize(&self, cex: &Counterexample) -> Result<(Var, usize, bool), RepairError> {
        let mut first_blame = None;
        for &index in &cex.blame {
            let clause = &self.spec.matrix()[index];
            first_blame.get_or_insert(index);
            let earliest = clause
                .iter()
                .filter_map(|&lit| self.positions[lit.var()].map(|position| (position, lit)))
                .min_by_key(|&(position, _)| position);
            if let Some((position, lit)) = earliest {
                // the clause is falsified, so the gate disagrees with
                // the literal's polarity
                debug_assert_ne!(cex.outputs[position].1, lit.is_positive());
                return Ok((lit.var(), position, lit.is_positive()));
            }
        }
        Err(RepairError::Unrepairable {
            index: first_blame.expect("counterexamples carry at least one blamed clause"),
        })
    }

    /// Cube asserting the counterexample's values on the features
    /// available to the output at `position`: all inputs plus the
    /// outputs synthesized before it.
    fn point_cube(&self, cex: &Counterexample, position: usize) -> Vec<Lit> {
        self.spec
            .universals()
            .iter()
            .chain(self.order[..position].iter())
            .map(|&var| cex.assignment.to_lit(var))
            .collect()
    }
}

fn negated(cube: &[Lit]) -> Vec<Lit> {
    cube.iter().map(|&lit| !lit).collect()
}
