//! Cycle detection with excision.
//!
//! # Algorithm
//!
//! Depth-first traversal from every module (roots in registration order,
//! edges in declaration order) with an on-stack marker. Each edge that
//! reaches an on-stack module closes a loop: the loop is reported as a
//! [`DiagnosticKind::DependencyCycle`](crate::diagnostics::DiagnosticKind)
//! with its full path, and the closing edge is excised from the working
//! graph so traversal continues. One cycle therefore never hides another,
//! and propagation still runs for modules outside any loop.
//!
//! Removing every back-edge of a DFS leaves only tree, forward and cross
//! edges, so the graph is acyclic once [`excise_cycles`] returns.
//!
//! The traversal is iterative; long dependency chains cannot overflow the
//! call stack.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashSet;

use petgraph::stable_graph::NodeIndex;
use tracing::{debug, instrument};

use super::build::{Dependency, ModuleGraph};
use crate::descriptor::Visibility;
use crate::diagnostics::{Diagnostic, DiagnosticEdge, Diagnostics};

/// An edge removed from the working graph because it closed a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcisedEdge {
    pub from: String,
    pub to: String,
    pub visibility: Visibility,
    /// Closed loop the edge completed, e.g. `["A", "B", "A"]`.
    pub cycle: Vec<String>,
}

/// Report and excise every cycle in `graph`.
///
/// Returns the excised edges in detection order. Each one has a matching
/// diagnostic in `diagnostics`.
#[instrument(skip_all, fields(modules = graph.node_count()))]
pub fn excise_cycles(graph: &mut ModuleGraph, diagnostics: &mut Diagnostics) -> Vec<ExcisedEdge> {
    let roots: Vec<NodeIndex> = graph.node_indices().collect();

    let mut visited: HashSet<NodeIndex> = HashSet::with_capacity(roots.len());
    let mut on_stack: HashSet<NodeIndex> = HashSet::new(); // for O(1) ancestor lookup
    let mut path: Vec<NodeIndex> = Vec::new(); // current DFS path
    let mut excised: Vec<ExcisedEdge> = Vec::new();

    // Each stack entry: (node, its dependencies, index of the next one).
    let mut call_stack: Vec<(NodeIndex, Vec<Dependency>, usize)> = Vec::new();

    for root in roots {
        if !visited.insert(root) {
            continue;
        }
        on_stack.insert(root);
        path.push(root);
        call_stack.push((root, graph.dependencies(root), 0));

        while let Some(frame) = call_stack.last_mut() {
            let current = frame.0;

            if frame.2 < frame.1.len() {
                let dep = frame.1[frame.2];
                frame.2 += 1;

                if on_stack.contains(&dep.target) {
                    let start = path
                        .iter()
                        .position(|&idx| idx == dep.target)
                        .unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|&idx| node_id(graph, idx)).collect();
                    cycle.push(node_id(graph, dep.target));

                    let from = node_id(graph, current);
                    let to = node_id(graph, dep.target);
                    graph.excise(dep.edge);

                    diagnostics.push(Diagnostic::dependency_cycle(
                        cycle.clone(),
                        DiagnosticEdge::new(&from, &to, dep.visibility),
                    ));
                    excised.push(ExcisedEdge {
                        from,
                        to,
                        visibility: dep.visibility,
                        cycle,
                    });
                } else if visited.insert(dep.target) {
                    on_stack.insert(dep.target);
                    path.push(dep.target);
                    let next = graph.dependencies(dep.target);
                    call_stack.push((dep.target, next, 0));
                }
            } else {
                call_stack.pop();
                path.pop(); // current is always the top when we finish it
                on_stack.remove(&current);
            }
        }
    }

    debug!(excised = excised.len(), "cycle detection complete");
    excised
}

fn node_id(graph: &ModuleGraph, idx: NodeIndex) -> String {
    graph
        .module_name(idx)
        .map_or_else(|| format!("#{}", idx.index()), str::to_string)
}
