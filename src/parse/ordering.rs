//! Modifier ordering
//!
//! Modifiers hint at their relative order through `before` and `after` name
//! sets. The orderer turns those partial hints into a total order with a
//! depth-first topological sort. Without constraints the order is ascending
//! by name: nodes are consumed in descending name order, each one appended
//! after everything it must precede, and the final list reversed.
//!
//! Hints naming modifiers that are not present are ignored. Under the
//! lenient policy contradictory hints are not detected; the consumed-node
//! guard keeps the traversal finite but one of the conflicting hints is then
//! silently violated. The strict policy reports such cycles instead.

use crate::config::OrderingPolicy;
use crate::step::ModifierHints;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Modifiers whose hints contradict each other
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingCycle {
    /// Names of the modifiers in the cycle, ascending
    pub names: Vec<String>,
}

/// For every present modifier, the present modifiers it must precede
fn successor_sets<'a>(
    modifiers: &BTreeMap<&'a str, &'a ModifierHints>,
) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
    let mut successors: BTreeMap<&str, BTreeSet<&str>> = modifiers
        .keys()
        .map(|&name| (name, BTreeSet::new()))
        .collect();

    for (&name, hints) in modifiers {
        for other in hints.before() {
            if let Some((&other, _)) = modifiers.get_key_value(other.as_str()) {
                if other != name {
                    successors.entry(name).or_default().insert(other);
                }
            }
        }

        for other in hints.after() {
            if let Some((&other, _)) = modifiers.get_key_value(other.as_str()) {
                if other != name {
                    successors.entry(other).or_default().insert(name);
                }
            }
        }
    }

    successors
}

/// Order modifier names so every satisfiable hint is honoured
///
/// Never fails: contradictory hints are resolved by traversal order.
pub fn order_modifiers<'a>(modifiers: &BTreeMap<&'a str, &'a ModifierHints>) -> Vec<&'a str> {
    // Neighbours are visited in descending name order
    let mut pool: BTreeMap<&str, Vec<&str>> = successor_sets(modifiers)
        .into_iter()
        .map(|(name, successors)| (name, successors.into_iter().rev().collect()))
        .collect();

    let mut result = Vec::with_capacity(pool.len());
    while let Some((root, neighbours)) = pool.pop_last() {
        let mut stack = vec![(root, neighbours.into_iter())];

        while let Some((node, neighbours)) = stack.last_mut() {
            let node = *node;
            match neighbours.next() {
                Some(next) => {
                    // Already consumed nodes are skipped, which also breaks cycles
                    if let Some(next_neighbours) = pool.remove(next) {
                        stack.push((next, next_neighbours.into_iter()));
                    }
                }
                None => {
                    stack.pop();
                    result.push(node);
                }
            }
        }
    }

    result.reverse();
    result
}

/// Find the first set of modifiers whose hints form a cycle
pub fn find_cycle(modifiers: &BTreeMap<&str, &ModifierHints>) -> Option<OrderingCycle> {
    let successors = successor_sets(modifiers);

    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let nodes: HashMap<&str, NodeIndex> = successors
        .keys()
        .map(|&name| (name, graph.add_node(name)))
        .collect();
    for (name, targets) in &successors {
        for target in targets {
            graph.add_edge(nodes[name], nodes[target], ());
        }
    }

    // Self references were dropped, so only multi-node components are cycles
    tarjan_scc(&graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut names: Vec<String> = component
                .into_iter()
                .map(|index| graph[index].to_string())
                .collect();
            names.sort();
            OrderingCycle { names }
        })
        .min_by(|a, b| a.names.cmp(&b.names))
}

/// Order modifier names under a policy
pub fn order_with_policy<'a>(
    modifiers: &BTreeMap<&'a str, &'a ModifierHints>,
    policy: OrderingPolicy,
) -> Result<Vec<&'a str>, OrderingCycle> {
    if policy == OrderingPolicy::Strict {
        if let Some(cycle) = find_cycle(modifiers) {
            return Err(cycle);
        }
    }

    Ok(order_modifiers(modifiers))
}
