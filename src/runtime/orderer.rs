//! Execution ordering for workflow graphs
//!
//! Turns a node/edge set into a linear sequence of node ids. The ordering is
//! a breadth-first walk from the nodes nobody points at, not a strict
//! topological sort: a node reached early through one path runs before a
//! second predecessor that is reached later. Callers rely on that tie-break,
//! so keep it.

use crate::workflow::types::{NodeKind, WorkflowDefinition};
use std::collections::{HashMap, HashSet, VecDeque};

/// Compute the execution order of a definition
///
/// 1. Count incoming edges per node and collect outgoing adjacency (edge order).
/// 2. Start from every node with no incoming edge, in input order. If there
///    is none, the order is just the first UserQuery node, without any walk;
///    if there is no UserQuery either, it is every node id in input order.
/// 3. Walk breadth-first, marking a node visited when it is dequeued.
/// 4. Append nodes the walk never reached, in input order.
///
/// Edge targets missing from the node list can still appear in the result;
/// the coordinator skips ids it cannot resolve.
pub fn execution_order(definition: &WorkflowDefinition) -> Vec<String> {
    let nodes = &definition.nodes;

    let mut in_degree: HashMap<&str, usize> = nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> =
        nodes.iter().map(|n| (n.id.as_str(), Vec::new())).collect();

    for edge in &definition.edges {
        if let Some(count) = in_degree.get_mut(edge.target.as_str()) {
            *count += 1;
        }
        if let Some(targets) = adjacency.get_mut(edge.source.as_str()) {
            targets.push(edge.target.as_str());
        }
    }

    let start: Vec<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree.get(id).copied() == Some(0))
        .collect();

    if start.is_empty() {
        match nodes.iter().find(|n| n.kind == NodeKind::UserQuery) {
            Some(user_query) => {
                tracing::debug!("🔁 No node without incoming edges, running only UserQuery '{}'", user_query.id);
                return vec![user_query.id.clone()];
            }
            None => {
                tracing::debug!("🔁 No start node and no UserQuery, using input order");
                return nodes.iter().map(|n| n.id.clone()).collect();
            }
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut order: Vec<String> = Vec::with_capacity(nodes.len());
    let mut queue: VecDeque<&str> = start.into_iter().collect();

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        order.push(current.to_string());

        if let Some(targets) = adjacency.get(current) {
            for &target in targets {
                if !visited.contains(target) {
                    queue.push_back(target);
                }
            }
        }
    }

    for node in nodes {
        if !visited.contains(node.id.as_str()) {
            order.push(node.id.clone());
        }
    }

    order
}
