//! Axis-aligned decision-tree classifier over boolean features.
//!
//! A hand-rolled CART-style learner: balanced class weighting,
//! weighted Gini impurity, bounded depth, and tie-breaking on the
//! lowest feature index. Splitting a 0/1 feature at threshold 0.5
//! sends value 0 to the zero branch and value 1 to the one branch,
//! so every root-to-leaf path is a cube over the features.

use super::sample::Label;
use ordered_float::NotNan;

const CLASSES: [Label; 3] = [Label::DontCare, Label::MustOne, Label::MustZero];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TreeParams {
    pub(crate) max_depth: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self { max_depth: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Split { feature: usize, zero: usize, one: usize },
    Leaf { label: Label },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecisionTree {
    nodes: Vec<Node>,
    root: usize,
}

impl DecisionTree {
    /// Fits a tree on binary feature rows. `rows` and `labels` run in
    /// parallel; every row has the same width.
    pub(crate) fn fit(rows: &[Vec<bool>], labels: &[Label], params: &TreeParams) -> Self {
        let mut class_counts = [0usize; 3];
        for &label in labels {
            class_counts[label.index()] += 1;
        }
        let present = class_counts.iter().filter(|&&count| count > 0).count();
        // balanced class weighting: samples / (classes * count)
        let mut class_weights = [0.0f64; 3];
        for (weight, &count) in class_weights.iter_mut().zip(&class_counts) {
            if count > 0 {
                *weight = labels.len() as f64 / (present * count) as f64;
            }
        }

        let mut tree = Self { nodes: Vec::new(), root: 0 };
        let indices: Vec<usize> = (0..labels.len()).collect();
        tree.root = tree.build(rows, labels, &class_weights, &indices, 0, params);
        tree
    }

    fn build(
        &mut self,
        rows: &[Vec<bool>],
        labels: &[Label],
        class_weights: &[f64; 3],
        indices: &[usize],
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let counts = weighted_counts(labels, class_weights, indices);
        let pure = counts.iter().filter(|&&weight| weight > 0.0).count() <= 1;
        let split = if pure || depth >= params.max_depth {
            None
        } else {
            best_split(rows, labels, class_weights, indices)
        };
        let node = match split {
            None => Node::Leaf { label: majority(&counts) },
            Some(feature) => {
                let (ones, zeros): (Vec<usize>, Vec<usize>) =
                    indices.iter().copied().partition(|&idx| rows[idx][feature]);
                let zero = self.build(rows, labels, class_weights, &zeros, depth + 1, params);
                let one = self.build(rows, labels, class_weights, &ones, depth + 1, params);
                Node::Split { feature, zero, one }
            }
        };
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub(crate) fn classify(&self, row: &[bool]) -> Label {
        let mut node = self.root;
        loop {
            match self.nodes[node] {
                Node::Leaf { label } => return label,
                Node::Split { feature, zero, one } => {
                    node = if row[feature] { one } else { zero };
                }
            }
        }
    }

    /// Root-to-leaf paths as (feature, value) constraints together
    /// with the leaf's class. Zero branches come first.
    pub(crate) fn paths(&self) -> Vec<(Vec<(usize, bool)>, Label)> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        self.collect_paths(self.root, &mut prefix, &mut paths);
        paths
    }

    fn collect_paths(
        &self,
        node: usize,
        prefix: &mut Vec<(usize, bool)>,
        paths: &mut Vec<(Vec<(usize, bool)>, Label)>,
    ) {
        match self.nodes[node] {
            Node::Leaf { label } => paths.push((prefix.clone(), label)),
            Node::Split { feature, zero, one } => {
                prefix.push((feature, false));
                self.collect_paths(zero, prefix, paths);
                prefix.pop();
                prefix.push((feature, true));
                self.collect_paths(one, prefix, paths);
                prefix.pop();
            }
        }
    }
}

fn weighted_counts(labels: &[Label], class_weights: &[f64; 3], indices: &[usize]) -> [f64; 3] {
    let mut counts = [0.0f64; 3];
    for &idx in indices {
        counts[labels[idx].index()] += class_weights[labels[idx].index()];
    }
    counts
}

fn gini(counts: &[f64; 3]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|&weight| (weight / total).powi(2)).sum::<f64>()
}

/// The first maximal class wins, matching the class order of the
/// label encoding.
fn majority(counts: &[f64; 3]) -> Label {
    let mut best = 0;
    for (idx, &weight) in counts.iter().enumerate().skip(1) {
        if weight > counts[best] {
            best = idx;
        }
    }
    CLASSES[best]
}

/// The feature minimizing the weighted Gini impurity of the induced
/// partition, or `None` if every feature is constant on `indices`.
/// Ties keep the lowest feature index.
fn best_split(
    rows: &[Vec<bool>],
    labels: &[Label],
    class_weights: &[f64; 3],
    indices: &[usize],
) -> Option<usize> {
    let width = rows[indices[0]].len();
    let mut best: Option<(NotNan<f64>, usize)> = None;
    for feature in 0..width {
        let mut zeros = [0.0f64; 3];
        let mut ones = [0.0f64; 3];
        let mut zero_count = 0usize;
        let mut one_count = 0usize;
        for &idx in indices {
            let class = labels[idx].index();
            if rows[idx][feature] {
                ones[class] += class_weights[class];
                one_count += 1;
            } else {
                zeros[class] += class_weights[class];
                zero_count += 1;
            }
        }
        if zero_count == 0 || one_count == 0 {
            continue;
        }
        let zero_total: f64 = zeros.iter().sum();
        let one_total: f64 = ones.iter().sum();
        let score = NotNan::new(zero_total * gini(&zeros) + one_total * gini(&ones))
            .expect("impurity scores are finite");
        match best {
            Some((best_score, _)) if best_score <= score => {}
            _ => best = Some((score, feature)),
        }
    }
    best.map(|(_, feature)| feature)
}

#[cfg(test)]
mod test {
    use super::*;

    fn rows(rows: &[&[bool]]) -> Vec<Vec<bool>> {
        rows.iter().map(|row| row.to_vec()).collect()
    }

    #[test]
    fn single_feature_split() {
        let rows = rows(&[&[true], &[false]]);
        let labels = [Label::MustOne, Label::MustZero];
        let tree = DecisionTree::fit(&rows, &labels, &TreeParams::default());
        assert_eq!(tree.classify(&[true]), Label::MustOne);
        assert_eq!(tree.classify(&[false]), Label::MustZero);
    }

    #[test]
    fn xor_needs_two_levels() {
        let rows = rows(&[&[false, false], &[false, true], &[true, false], &[true, true]]);
        let labels = [Label::MustZero, Label::MustOne, Label::MustOne, Label::MustZero];
        let tree = DecisionTree::fit(&rows, &labels, &TreeParams::default());
        for (row, &label) in rows.iter().zip(&labels) {
            assert_eq!(tree.classify(row), label);
        }
    }

    #[test]
    fn depth_cap_limits_paths() {
        let rows = rows(&[&[false, false], &[false, true], &[true, false], &[true, true]]);
        let labels = [Label::MustZero, Label::MustOne, Label::MustOne, Label::MustZero];
        let tree = DecisionTree::fit(&rows, &labels, &TreeParams { max_depth: 1 });
        assert!(tree.paths().len() <= 2);
    }

    #[test]
    fn leaf_majority_prefers_lower_class_on_ties() {
        // balanced weighting equalizes the class masses, so the tie
        // resolves to the earlier class in the label encoding
        let rows = rows(&[&[], &[], &[]]);
        let labels = [Label::MustOne, Label::MustOne, Label::MustZero];
        let tree = DecisionTree::fit(&rows, &labels, &TreeParams { max_depth: 0 });
        assert_eq!(tree.classify(&[]), Label::MustOne);
    }

    #[test]
    fn paths_cover_every_leaf() {
        let rows = rows(&[&[true, false], &[false, false]]);
        let labels = [Label::MustOne, Label::DontCare];
        let tree = DecisionTree::fit(&rows, &labels, &TreeParams::default());
        let paths = tree.paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], (vec![(0, false)], Label::DontCare));
        assert_eq!(paths[1], (vec![(0, true)], Label::MustOne));
    }

    #[test]
    fn fitting_is_deterministic() {
        let rows = rows(&[&[true, true], &[false, true], &[true, false], &[false, false]]);
        let labels = [Label::MustOne, Label::DontCare, Label::MustZero, Label::DontCare];
        let first = DecisionTree::fit(&rows, &labels, &TreeParams::default());
        let second = DecisionTree::fit(&rows, &labels, &TreeParams::default());
        assert_eq!(first, second);
    }

    #[test]
    fn empty_training_data_yields_dont_care() {
        let tree = DecisionTree::fit(&[], &[], &TreeParams::default());
        assert_eq!(tree.classify(&[]), Label::DontCare);
    }
}
