//! Dependency graph construction from a populated registry.
//!
//! # Edge Direction
//!
//! An edge `A → B` means "A **depends on** B": B must be built before A.
//! Each edge carries the [`Visibility`] it was declared with.
//!
//! # Determinism
//!
//! Nodes are added in registration order, so `NodeIndex::index()` equals a
//! module's registry position. Edges are added per module in declaration
//! order (public list, then private list). [`ModuleGraph::dependencies`]
//! returns edges sorted by `EdgeIndex`, which reproduces that order; the
//! graph is a [`StableDiGraph`] so excising an edge never renumbers the rest.
//!
//! # Partial failure
//!
//! Unresolvable names, self-dependencies and public/private conflicts are
//! reported to the [`Diagnostics`] reporter and skipped. Construction never
//! fails outright, so every problem in the module set surfaces in one pass.
//!
//! ## Weak references
//!
//! Dynamically-loaded module names are recorded beside the graph and never
//! become edges.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use tracing::{debug, instrument, trace};

use crate::config::ResolveConfig;
use crate::descriptor::{ModuleDescriptor, Visibility};
use crate::diagnostics::{Diagnostic, DiagnosticEdge, Diagnostics};
use crate::registry::ModuleRegistry;

// ---------------------------------------------------------------------------
// ModuleGraph
// ---------------------------------------------------------------------------

/// One outgoing dependency edge of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub edge: EdgeIndex,
    pub target: NodeIndex,
    pub visibility: Visibility,
}

/// Directed dependency graph over every registered module.
///
/// Owns the [`ModuleRegistry`] for the rest of the pass.
#[derive(Debug)]
pub struct ModuleGraph {
    registry: ModuleRegistry,
    graph: StableDiGraph<String, Visibility>,
    node_map: HashMap<String, NodeIndex>,
    /// Resolvable dynamically-loaded names, indexed by node index.
    dynamic_loads: Vec<Vec<String>>,
    content_hash: String,
}

impl ModuleGraph {
    /// Build the graph from every descriptor in `registry`.
    ///
    /// The content hash is a BLAKE3 digest of the sorted resolvable edge
    /// set, so callers can use it to decide whether a cached plan is stale.
    #[instrument(skip_all, fields(modules = registry.len()))]
    pub fn build(
        registry: ModuleRegistry,
        config: &ResolveConfig,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut graph = StableDiGraph::<String, Visibility>::with_capacity(registry.len(), 0);
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(registry.len());

        for descriptor in &registry {
            let idx = graph.add_node(descriptor.name.clone());
            node_map.insert(descriptor.name.clone(), idx);
        }

        let mut declared: Vec<(String, String, Visibility)> = Vec::new();
        let mut dynamic_loads: Vec<Vec<String>> = Vec::with_capacity(registry.len());

        for descriptor in &registry {
            let Some(&from) = node_map.get(&descriptor.name) else {
                continue;
            };

            for (dep, visibility) in descriptor.dependencies() {
                if !check_edge(descriptor, dep, visibility, diagnostics) {
                    continue;
                }

                let Some(&to) = node_map.get(dep) else {
                    diagnostics.push(Diagnostic::missing_dependency(
                        &descriptor.name,
                        dep,
                        visibility,
                    ));
                    continue;
                };

                trace!(from = %descriptor.name, to = dep, %visibility, "edge");
                graph.add_edge(from, to, visibility);
                declared.push((descriptor.name.clone(), dep.to_string(), visibility));
            }

            let mut loads = Vec::new();
            for name in &descriptor.dynamically_loaded_modules {
                if node_map.contains_key(name) {
                    loads.push(name.clone());
                } else {
                    diagnostics.push(Diagnostic::unresolved_dynamic_module(
                        &descriptor.name,
                        name,
                        config.strict_dynamic_modules,
                    ));
                }
            }
            dynamic_loads.push(loads);
        }

        let content_hash = compute_edge_hash(&mut declared);
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "dependency graph built"
        );

        Self {
            registry,
            graph,
            node_map,
            dynamic_loads,
            content_hash,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// BLAKE3 hash of the declared, resolvable edge set.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    #[must_use]
    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.node_map.get(name).copied()
    }

    #[must_use]
    pub fn module_name(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    #[must_use]
    pub fn descriptor(&self, idx: NodeIndex) -> Option<&ModuleDescriptor> {
        self.registry.get(self.module_name(idx)?)
    }

    /// Every node, in registration order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Outgoing edges of `idx` in declaration order.
    #[must_use]
    pub fn dependencies(&self, idx: NodeIndex) -> Vec<Dependency> {
        let mut deps: Vec<Dependency> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| Dependency {
                edge: edge.id(),
                target: edge.target(),
                visibility: *edge.weight(),
            })
            .collect();
        deps.sort_unstable_by_key(|dep| dep.edge);
        deps
    }

    /// Targets of the public outgoing edges of `idx`, in declaration order.
    #[must_use]
    pub fn public_dependencies(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.dependencies(idx)
            .into_iter()
            .filter(|dep| dep.visibility == Visibility::Public)
            .map(|dep| dep.target)
            .collect()
    }

    /// Modules that depend directly on `idx`.
    #[must_use]
    pub fn dependents(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| (edge.id(), edge.source()))
            .collect();
        edges.sort_unstable();
        edges.into_iter().map(|(_, source)| source).collect()
    }

    /// Number of outgoing dependency edges of `idx`.
    #[must_use]
    pub fn dependency_count(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    /// Resolvable dynamically-loaded module names declared by `idx`.
    #[must_use]
    pub fn dynamically_loaded_modules(&self, idx: NodeIndex) -> &[String] {
        self.dynamic_loads
            .get(idx.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Every current edge as `(from, to, visibility)` in declaration order.
    #[must_use]
    pub fn edge_list(&self) -> Vec<(String, String, Visibility)> {
        let mut edges: Vec<_> = self.graph.edge_references().collect();
        edges.sort_unstable_by_key(|edge| edge.id());
        edges
            .into_iter()
            .filter_map(|edge| {
                let from = self.module_name(edge.source())?;
                let to = self.module_name(edge.target())?;
                Some((from.to_string(), to.to_string(), *edge.weight()))
            })
            .collect()
    }

    /// Whether any cycle remains among the current edges.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        petgraph::algo::toposort(&self.graph, None).is_err()
    }

    /// Remove an edge from the working graph, leaving every other index
    /// untouched.
    pub(crate) fn excise(&mut self, edge: EdgeIndex) -> Option<Visibility> {
        self.graph.remove_edge(edge)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Validate one declared edge against the descriptor invariants. Returns
/// `false` (after reporting) when the edge must not be added.
fn check_edge(
    descriptor: &ModuleDescriptor,
    dep: &str,
    visibility: Visibility,
    diagnostics: &mut Diagnostics,
) -> bool {
    let declared_public = || descriptor.public_dependencies.iter().any(|p| p == dep);

    if dep == descriptor.name {
        // A self-dependency listed in both lists is reported once.
        if visibility == Visibility::Public || !declared_public() {
            diagnostics.push(Diagnostic::dependency_cycle(
                vec![descriptor.name.clone(), descriptor.name.clone()],
                DiagnosticEdge::new(&descriptor.name, dep, visibility),
            ));
        }
        return false;
    }

    if visibility == Visibility::Private && declared_public() {
        // The public edge was already added; keep it so later stages still
        // see the dependency.
        diagnostics.push(Diagnostic::conflicting_visibility(&descriptor.name, dep));
        return false;
    }

    true
}

/// Compute a BLAKE3 hash of the sorted edge list for cache invalidation.
fn compute_edge_hash(edges: &mut [(String, String, Visibility)]) -> String {
    edges.sort_unstable();
    let mut hasher = blake3::Hasher::new();
    for (from, to, visibility) in edges.iter() {
        hasher.update(from.as_bytes());
        hasher.update(b"\x00");
        hasher.update(to.as_bytes());
        hasher.update(b"\x00");
        hasher.update(visibility.as_str().as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
