//! Dependency propagation over the acyclic module graph.
//!
//! # Overview
//!
//! Runs after [`crate::graph::cycles::excise_cycles`] and computes, for every
//! module, a [`ResolvedModule`]:
//!
//! - the transitive closure of its **public** dependencies;
//! - its effective include paths;
//! - whether it may reuse a shared precompiled header.
//!
//! ## Closure memoization
//!
//! Closures are computed in dependency order with an explicit stack. Each
//! module's slot in the memo is written exactly once, after every public
//! dependency's slot is filled, and then only read. Dependents reuse the
//! stored result instead of re-walking the subgraph, which keeps deep
//! diamonds linear instead of exponential.
//!
//! ## Include-path order
//!
//! Own public paths, own private paths, then the public paths of each
//! closure member in closure order. Closure order is a pre-order walk of the
//! public edges in declaration order. Duplicates keep their first position.
//! Private include paths of other modules never appear.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use petgraph::stable_graph::NodeIndex;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::ResolveConfig;
use crate::descriptor::{ModuleDescriptor, PchUsage};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::ModuleGraph;

// ---------------------------------------------------------------------------
// ResolvedModule
// ---------------------------------------------------------------------------

/// Per-module results of a successful resolution pass. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModule {
    pub name: String,
    pub pch_usage: PchUsage,
    /// Whether the module may reuse a shared PCH.
    pub pch_eligible: bool,
    /// Every module reachable through public edges only.
    pub public_closure: BTreeSet<String>,
    pub effective_include_paths: Vec<String>,
    /// Weak runtime references; never part of the build order.
    pub dynamically_loaded_modules: Vec<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

/// Compute a [`ResolvedModule`] for every module, in registration order.
///
/// `graph` must be acyclic; run [`crate::graph::cycles::excise_cycles`]
/// first. PCH conflicts are reported to `diagnostics` as warnings when
/// `config.report_pch_conflicts` is set.
#[instrument(skip_all, fields(modules = graph.node_count()))]
pub fn propagate(
    graph: &ModuleGraph,
    config: &ResolveConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<ResolvedModule> {
    let closures = public_closures(graph);

    let mut resolved = Vec::with_capacity(graph.node_count());
    for idx in graph.node_indices() {
        let Some(descriptor) = graph.descriptor(idx) else {
            continue;
        };
        let closure = closures.get(idx.index()).map_or(&[][..], Vec::as_slice);

        let closure_descriptors: Vec<&ModuleDescriptor> = closure
            .iter()
            .filter_map(|&member| graph.descriptor(member))
            .collect();

        let pch_eligible = pch_eligibility(graph, descriptor, config, diagnostics);

        resolved.push(ResolvedModule {
            name: descriptor.name.clone(),
            pch_usage: descriptor.pch_usage,
            pch_eligible,
            public_closure: closure_descriptors
                .iter()
                .map(|d| d.name.clone())
                .collect(),
            effective_include_paths: effective_include_paths(descriptor, &closure_descriptors),
            dynamically_loaded_modules: graph.dynamically_loaded_modules(idx).to_vec(),
            metadata: descriptor.metadata.clone(),
        });
    }

    debug!(
        resolved = resolved.len(),
        shared_pch = resolved.iter().filter(|m| m.pch_eligible).count(),
        "propagation complete"
    );
    resolved
}

/// Ordered public closure of every node, indexed by `NodeIndex::index()`.
///
/// closure(A) = for each public edge A → B in declaration order: B, then
/// closure(B); first occurrence wins.
#[must_use]
pub fn public_closures(graph: &ModuleGraph) -> Vec<Vec<NodeIndex>> {
    let mut memo: Vec<Option<Vec<NodeIndex>>> = vec![None; graph.node_count()];

    for root in graph.node_indices() {
        if memo[root.index()].is_some() {
            continue;
        }

        // (node, dependencies already scheduled)
        let mut stack: Vec<(NodeIndex, bool)> = vec![(root, false)];
        while let Some((node, expanded)) = stack.pop() {
            if memo[node.index()].is_some() {
                continue;
            }
            let deps = graph.public_dependencies(node);

            if expanded {
                let mut seen: HashSet<NodeIndex> = HashSet::new();
                let mut closure: Vec<NodeIndex> = Vec::new();
                for dep in deps {
                    if seen.insert(dep) {
                        closure.push(dep);
                    }
                    let inherited = memo[dep.index()].as_deref().unwrap_or(&[]);
                    for &member in inherited {
                        if seen.insert(member) {
                            closure.push(member);
                        }
                    }
                }
                memo[node.index()] = Some(closure);
            } else {
                stack.push((node, true));
                for dep in deps.into_iter().rev() {
                    if memo[dep.index()].is_none() {
                        stack.push((dep, false));
                    }
                }
            }
        }
    }

    memo.into_iter().map(Option::unwrap_or_default).collect()
}

fn effective_include_paths(
    descriptor: &ModuleDescriptor,
    closure: &[&ModuleDescriptor],
) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    descriptor
        .own_include_paths()
        .chain(
            closure
                .iter()
                .flat_map(|member| member.public_include_paths.iter().map(String::as_str)),
        )
        .filter(|path| seen.insert(*path))
        .map(str::to_string)
        .collect()
}

/// A `UseSharedOrExplicit` module shares a PCH only if every resolvable
/// direct dependency uses some PCH. Declared edges count even when they
/// were excised for closing a cycle.
fn pch_eligibility(
    graph: &ModuleGraph,
    descriptor: &ModuleDescriptor,
    config: &ResolveConfig,
    diagnostics: &mut Diagnostics,
) -> bool {
    if !descriptor.pch_usage.wants_shared() {
        return false;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let offenders: Vec<(String, PchUsage)> = descriptor
        .dependencies()
        .filter(|(name, _)| *name != descriptor.name && seen.insert(*name))
        .filter_map(|(name, _)| graph.registry().get(name))
        .filter(|dep| !dep.pch_usage.uses_pch())
        .map(|dep| (dep.name.clone(), dep.pch_usage))
        .collect();

    if offenders.is_empty() {
        return true;
    }

    if config.report_pch_conflicts {
        diagnostics.push(Diagnostic::incompatible_pch_policy(
            &descriptor.name,
            &offenders,
        ));
    }
    false
}
