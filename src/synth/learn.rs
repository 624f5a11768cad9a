//! Learns the initial Must-1/Must-0 approximations from the
//! labelled samples, one decision tree per output.

use super::{
    sample::{Label, TrainingData},
    tree::{DecisionTree, TreeParams},
};
use crate::{
    basis::SymbolicBasis,
    datastructure::Assignment,
    literal::{Lit, Var},
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Candidate approximation pair of one output: `must_one` covers the
/// prefixes forcing the output to 1, `must_zero` those forcing it
/// to 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub must_one: SymbolicBasis,
    pub must_zero: SymbolicBasis,
}

impl Candidate {
    /// The synthesized gate value at a point: `A ∧ ¬C`.
    pub fn output(&self, point: &Assignment) -> bool {
        self.must_one.evaluate(point) && !self.must_zero.evaluate(point)
    }
}

/// The candidate map, keyed by output variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    map: BTreeMap<Var, Candidate>,
}

impl Candidates {
    pub fn get(&self, var: Var) -> &Candidate {
        &self.map[&var]
    }

    pub(crate) fn get_mut(&mut self, var: Var) -> &mut Candidate {
        self.map.get_mut(&var).expect("candidates cover every output")
    }

    pub(crate) fn insert(&mut self, var: Var, candidate: Candidate) {
        self.map.insert(var, candidate);
    }
}

#[derive(Debug)]
pub(crate) struct BasisLearner {
    inputs: Vec<Var>,
    outputs: Vec<Var>,
    params: TreeParams,
}

impl BasisLearner {
    pub(crate) fn new(inputs: Vec<Var>, outputs: Vec<Var>, params: TreeParams) -> Self {
        Self { inputs, outputs, params }
    }

    /// Fits one tree per output over the features `X ∪ Y_<i` and
    /// extracts the Must-1/Must-0 leaf paths as cubes.
    pub(crate) fn learn(&self, data: &TrainingData) -> Candidates {
        info!("starting decision-tree learning phase");
        let mut candidates = Candidates::default();
        for (idx, &output) in self.outputs.iter().enumerate() {
            // dependency-respecting features
            let features: Vec<Var> =
                self.inputs.iter().chain(self.outputs[..idx].iter()).copied().collect();
            let rows: Vec<Vec<bool>> = data
                .samples
                .iter()
                .map(|sample| features.iter().map(|&var| sample.value(var)).collect())
                .collect();
            let tree = DecisionTree::fit(&rows, &data.labels[idx], &self.params);

            let mut must_one = SymbolicBasis::new(format!("A_{output}"));
            let mut must_zero = SymbolicBasis::new(format!("C_{output}"));
            for (path, label) in tree.paths() {
                let basis = match label {
                    Label::MustOne => &mut must_one,
                    Label::MustZero => &mut must_zero,
                    Label::DontCare => continue,
                };
                let cube: Vec<Lit> = path
                    .iter()
                    .map(|&(feature, value)| features[feature].lit(value))
                    .collect();
                basis.add_cube(&cube);
            }
            debug!(
                "learned {output}: {} cubes for A, {} cubes for C",
                must_one.cubes().len(),
                must_zero.cubes().len()
            );
            candidates.insert(output, Candidate { must_one, must_zero });
        }
        info!("learning phase complete");
        candidates
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn var(var: i32) -> Var {
        Var::from_dimacs(var)
    }

    fn sample(lits: &[i32]) -> Assignment {
        lits.iter().map(|&lit| Lit::from_dimacs(lit)).collect()
    }

    fn data(samples: &[&[i32]], labels: &[&[Label]]) -> TrainingData {
        TrainingData {
            samples: samples.iter().map(|lits| sample(lits)).collect(),
            labels: labels.iter().map(|column| column.to_vec()).collect(),
        }
    }

    #[test]
    fn forced_input_becomes_cube() {
        let learner = BasisLearner::new(vec![var(1)], vec![var(2)], TreeParams::default());
        let data = data(
            &[&[1, 2], &[-1, -2]],
            &[&[Label::DontCare, Label::MustZero]],
        );
        let candidates = learner.learn(&data);
        let candidate = candidates.get(var(2));
        assert!(candidate.must_one.cubes().is_empty());
        assert_eq!(candidate.must_zero.cubes(), &[vec![Lit::from_dimacs(-1)]]);
    }

    #[test]
    fn later_outputs_may_depend_on_earlier_ones() {
        let learner = BasisLearner::new(vec![var(1)], vec![var(2), var(3)], TreeParams::default());
        // x_1 is constant across the samples, y_2 separates them
        let data = data(
            &[&[-1, 2, 3], &[-1, -2, -3]],
            &[
                &[Label::DontCare, Label::DontCare],
                &[Label::MustOne, Label::MustZero],
            ],
        );
        let candidates = learner.learn(&data);
        let candidate = candidates.get(var(3));
        assert_eq!(candidate.must_one.cubes(), &[vec![Lit::from_dimacs(2)]]);
        assert_eq!(candidate.must_zero.cubes(), &[vec![Lit::from_dimacs(-2)]]);
    }

    #[test]
    fn learned_bases_are_sound_on_the_samples() {
        let learner = BasisLearner::new(vec![var(1), var(2)], vec![var(3)], TreeParams::default());
        let data = data(
            &[&[1, 2, 3], &[1, -2, 3], &[-1, 2, -3], &[-1, -2, 3]],
            &[&[Label::MustOne, Label::DontCare, Label::MustZero, Label::MustOne]],
        );
        let candidates = learner.learn(&data);
        let candidate = candidates.get(var(3));
        for (sample, &label) in data.samples.iter().zip(&data.labels[0]) {
            match label {
                Label::MustOne => assert!(candidate.must_one.evaluate(sample)),
                Label::MustZero => assert!(candidate.must_zero.evaluate(sample)),
                Label::DontCare => {}
            }
            // the sides never overlap on a labelled point
            if label != Label::DontCare {
                assert!(
                    !(candidate.must_one.evaluate(sample) && candidate.must_zero.evaluate(sample))
                );
            }
        }
    }

    #[test]
    fn unconstrained_output_learns_empty_bases() {
        let learner = BasisLearner::new(vec![var(1)], vec![var(2)], TreeParams::default());
        let data = data(&[&[1, 2], &[-1, 2]], &[&[Label::DontCare, Label::DontCare]]);
        let candidates = learner.learn(&data);
        let candidate = candidates.get(var(2));
        assert!(candidate.must_one.cubes().is_empty());
        assert!(candidate.must_zero.cubes().is_empty());
        assert!(!candidate.output(&sample(&[1])));
    }
}
