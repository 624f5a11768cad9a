//! Topological dependency ordering of the existential variables.

use crate::{datastructure::VarVec, literal::Var, spec::Spec};
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, info};

/// Orders the existentials by clause-connectivity BFS from the
/// universal variables: outputs close to the inputs are synthesized
/// first, so later outputs may depend on earlier ones.
pub(crate) fn dependency_order(spec: &Spec) -> Vec<Var> {
    // variable interaction graph: pairwise edges within each clause
    let mut adjacency: VarVec<BTreeSet<Var>> = VarVec::default();
    adjacency.set_var_count(spec.num_vars() as usize);
    for clause in spec.matrix() {
        let lits = clause.lits();
        for (idx, &left) in lits.iter().enumerate() {
            for &right in &lits[idx + 1..] {
                adjacency[left.var()].insert(right.var());
                adjacency[right.var()].insert(left.var());
            }
        }
    }

    let mut is_existential: VarVec<bool> = VarVec::default();
    is_existential.set_var_count(spec.num_vars() as usize);
    for &output in spec.existentials() {
        is_existential[output] = true;
    }

    let mut order = Vec::with_capacity(spec.existentials().len());
    let mut visited: VarVec<bool> = VarVec::default();
    visited.set_var_count(spec.num_vars() as usize);
    let mut queue: VecDeque<Var> = VecDeque::new();
    for &input in spec.universals() {
        visited[input] = true;
        queue.push_back(input);
    }

    if queue.is_empty() {
        // no universal seed, start from the most connected
        // existential; ties keep the file order
        let mut seed: Option<Var> = None;
        for &output in spec.existentials() {
            match seed {
                Some(best) if adjacency[best].len() >= adjacency[output].len() => {}
                _ => seed = Some(output),
            }
        }
        if let Some(seed) = seed {
            visited[seed] = true;
            order.push(seed);
            queue.push_back(seed);
        }
    }

    while let Some(var) = queue.pop_front() {
        // neighbours in ascending numeric order for determinism
        for &next in &adjacency[var] {
            if !visited[next] {
                visited[next] = true;
                queue.push_back(next);
                if is_existential[next] {
                    order.push(next);
                }
            }
        }
    }

    // unreached existentials keep their file order
    let remaining: Vec<Var> =
        spec.existentials().iter().copied().filter(|&output| !visited[output]).collect();
    if !remaining.is_empty() {
        info!("appending {} disconnected variables to the order", remaining.len());
        order.extend(remaining);
    }
    debug!("synthesis order: {:?}", order.iter().map(ToString::to_string).collect::<Vec<_>>());
    order
}
