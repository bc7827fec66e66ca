//! Save-order planning for a change set.
//!
//! Inserts must run parents-first so every child can carry its parent's
//! store key. The planner takes the dependency edges gathered from the
//! relation graph and produces one deterministic order.

use relmap_core::{Error, Result};

/// Topologically order `labels.len()` nodes under `edges`, where an edge
/// `(a, b)` means `a` must be saved before `b`.
///
/// Ties break toward the smallest node index, so the order is deterministic
/// for a given change set. A cycle is reported as `Error::RelationCycle`
/// naming one of the tables involved.
pub(crate) fn compute_save_order(labels: &[&str], edges: &[(usize, usize)]) -> Result<Vec<usize>> {
    let count = labels.len();
    let mut in_degree = vec![0usize; count];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    for &(parent, child) in edges {
        in_degree[child] += 1;
        successors[parent].push(child);
    }

    // Kahn's algorithm over a sorted ready set.
    let mut ready: Vec<usize> = (0..count).filter(|&n| in_degree[n] == 0).collect();
    let mut order = Vec::with_capacity(count);
    while let Some(&node) = ready.iter().min() {
        ready.retain(|&n| n != node);
        order.push(node);
        for &next in &successors[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(next);
            }
        }
    }

    if order.len() < count {
        let stuck = (0..count)
            .find(|&n| in_degree[n] > 0)
            .map_or("", |n| labels[n]);
        return Err(Error::RelationCycle(stuck.to_string()));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parents_come_first() {
        // post -> comment -> score, post -> tag
        let labels = ["comment", "post", "score", "tag"];
        let edges = [(1, 0), (0, 2), (1, 3)];
        let order = compute_save_order(&labels, &edges).unwrap();
        let pos = |n: usize| order.iter().position(|&x| x == n).unwrap();
        assert!(pos(1) < pos(0));
        assert!(pos(0) < pos(2));
        assert!(pos(1) < pos(3));
    }

    #[test]
    fn test_order_is_deterministic() {
        let labels = ["a", "b", "c"];
        let order = compute_save_order(&labels, &[]).unwrap();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_cycle_is_detected() {
        let labels = ["a", "b"];
        let err = compute_save_order(&labels, &[(0, 1), (1, 0)]);
        assert!(matches!(err, Err(Error::RelationCycle(_))));
    }
}
