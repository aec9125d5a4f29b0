//! Coupling counts and dependency cycles.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::ClassNode;

/// Distinct neighbour counts for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coupling {
    pub identity: String,
    /// Classes referencing this one.
    pub fan_in: usize,
    /// Classes this one references.
    pub fan_out: usize,
}

/// Fan-in and fan-out per node, in node order.
///
/// Edges come from both `outgoing` and `incoming` lists; self references
/// are ignored.
pub fn coupling(nodes: &[ClassNode]) -> Vec<Coupling> {
    let mut fan_in: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut fan_out: HashMap<String, BTreeSet<String>> = HashMap::new();

    for node in nodes {
        let id = node.identity();
        for target in node.external_outgoing() {
            fan_out.entry(id.clone()).or_default().insert(target.clone());
            fan_in.entry(target.clone()).or_default().insert(id.clone());
        }
        for source in node.external_incoming() {
            fan_in.entry(id.clone()).or_default().insert(source.clone());
            fan_out.entry(source.clone()).or_default().insert(id.clone());
        }
    }

    let count = |map: &HashMap<String, BTreeSet<String>>, id: &str| {
        map.get(id).map(BTreeSet::len).unwrap_or(0)
    };

    nodes
        .iter()
        .map(|node| {
            let identity = node.identity();
            Coupling {
                fan_in: count(&fan_in, &identity),
                fan_out: count(&fan_out, &identity),
                identity,
            }
        })
        .collect()
}

/// Strongly connected groups of two or more classes.
///
/// Only edges between known nodes are considered. Each cycle lists its
/// members sorted; the cycles themselves are sorted.
pub fn find_cycles(nodes: &[ClassNode]) -> Vec<Vec<String>> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut index: HashMap<String, NodeIndex> = HashMap::new();

    for node in nodes {
        let id = node.identity();
        if !index.contains_key(&id) {
            let ix = graph.add_node(id.clone());
            index.insert(id, ix);
        }
    }

    for node in nodes {
        let Some(&from) = index.get(&node.identity()) else {
            continue;
        };
        for target in node.external_outgoing() {
            if let Some(&to) = index.get(target) {
                graph.update_edge(from, to, ());
            }
        }
        for source in node.external_incoming() {
            if let Some(&src) = index.get(source) {
                graph.update_edge(src, from, ());
            }
        }
    }

    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut members: Vec<String> =
                component.into_iter().map(|ix| graph[ix].clone()).collect();
            members.sort();
            members
        })
        .collect();

    cycles.sort();
    cycles
}
