//! Wave partitioning of the acyclic module graph.
//!
//! # Overview
//!
//! A [`BuildPlan`] is an ordered list of waves. Wave *k* holds every module
//! whose complete dependency set (public and private) is placed in waves
//! `0..k`. Modules inside a wave have no edges between them and can be
//! compiled in parallel; waves run in sequence. The concatenation of all
//! waves is a topological order of the graph.
//!
//! Each wave is as large as possible: a module is placed in the first wave
//! after its last dependency. Ties inside a wave are broken by ascending
//! name so identical inputs always produce identical plans.
//!
//! ## Fingerprint
//!
//! [`BuildPlan::fingerprint`] is a BLAKE3 hash of the wave contents. Two
//! plans with equal fingerprints schedule the same modules in the same
//! waves.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::stable_graph::NodeIndex;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::diagnostics::Diagnostic;
use crate::graph::ModuleGraph;

// ---------------------------------------------------------------------------
// BuildPlan
// ---------------------------------------------------------------------------

/// Ordered, parallelizable build schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    waves: Vec<Vec<String>>,
    fingerprint: String,
}

impl BuildPlan {
    fn from_waves(waves: Vec<Vec<String>>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for (i, wave) in waves.iter().enumerate() {
            hasher.update(&(i as u64).to_le_bytes());
            for name in wave {
                hasher.update(name.as_bytes());
                hasher.update(b"\x00");
            }
            hasher.update(b"\x01");
        }
        let fingerprint = format!("blake3:{}", hasher.finalize());
        Self { waves, fingerprint }
    }

    /// Waves in execution order; each wave is sorted by name.
    #[must_use]
    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    #[must_use]
    pub fn into_waves(self) -> Vec<Vec<String>> {
        self.waves
    }

    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    #[must_use]
    pub fn module_count(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Size of the widest wave.
    #[must_use]
    pub fn max_parallelism(&self) -> usize {
        self.waves.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Index of the wave containing `name`.
    #[must_use]
    pub fn wave_of(&self, name: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.binary_search_by(|m| m.as_str().cmp(name)).is_ok())
    }

    /// All modules as one topological order.
    pub fn topological_order(&self) -> impl Iterator<Item = &str> {
        self.waves.iter().flatten().map(String::as_str)
    }

    /// BLAKE3 hash of the wave contents.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Partition `graph` into waves.
///
/// # Errors
///
/// Returns an [`InternalConsistency`](crate::diagnostics::DiagnosticKind)
/// diagnostic naming the unplaced modules if an iteration places nothing
/// while modules remain. That only happens if the graph still has a cycle,
/// which [`crate::graph::cycles::excise_cycles`] rules out.
#[instrument(skip_all, fields(modules = graph.node_count()))]
pub fn compile(graph: &ModuleGraph) -> Result<BuildPlan, Diagnostic> {
    // Unplaced dependencies per module.
    let mut remaining: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|idx| (idx, graph.dependency_count(idx)))
        .collect();

    let mut ready: Vec<NodeIndex> = remaining
        .iter()
        .filter_map(|(idx, count)| (*count == 0).then_some(*idx))
        .collect();

    let mut waves: Vec<Vec<String>> = Vec::new();

    while !ready.is_empty() {
        let current = std::mem::take(&mut ready);
        let mut wave: Vec<String> = Vec::with_capacity(current.len());

        for idx in current {
            remaining.remove(&idx);
            if let Some(name) = graph.module_name(idx) {
                wave.push(name.to_string());
            }

            for dependent in graph.dependents(idx) {
                if let Some(count) = remaining.get_mut(&dependent) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.push(dependent);
                    }
                }
            }
        }

        wave.sort_unstable();
        waves.push(wave);
    }

    if !remaining.is_empty() {
        let mut stuck: Vec<String> = remaining
            .keys()
            .filter_map(|&idx| graph.module_name(idx).map(str::to_string))
            .collect();
        stuck.sort_unstable();
        return Err(Diagnostic::internal_consistency(stuck));
    }

    let plan = BuildPlan::from_waves(waves);
    debug!(
        waves = plan.wave_count(),
        max_parallelism = plan.max_parallelism(),
        "build plan compiled"
    );
    Ok(plan)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolveConfig;
    use crate::descriptor::ModuleDescriptor;
    use crate::diagnostics::{DiagnosticKind, Diagnostics};
    use crate::registry::ModuleRegistry;

    fn graph(descriptors: Vec<ModuleDescriptor>) -> ModuleGraph {
        let mut diagnostics = Diagnostics::new();
        let registry = ModuleRegistry::from_descriptors(descriptors, &mut diagnostics);
        ModuleGraph::build(registry, &ResolveConfig::default(), &mut diagnostics)
    }

    fn waves(items: &[&[&str]]) -> Vec<Vec<String>> {
        items
            .iter()
            .map(|wave| wave.iter().map(|s| (*s).to_string()).collect())
            .collect()
    }

    #[test]
    fn empty_graph_gives_empty_plan() {
        let plan = compile(&graph(vec![])).expect("plan");
        assert!(plan.is_empty());
        assert_eq!(plan.module_count(), 0);
        assert_eq!(plan.max_parallelism(), 0);
    }

    #[test]
    fn linear_chain_is_one_module_per_wave() {
        let plan = compile(&graph(vec![
            ModuleDescriptor::new("Editor").with_public_dependencies(["Engine"]),
            ModuleDescriptor::new("Engine").with_public_dependencies(["Core"]),
            ModuleDescriptor::new("Core"),
        ]))
        .expect("plan");

        assert_eq!(plan.waves(), waves(&[&["Core"], &["Engine"], &["Editor"]]));
        assert_eq!(plan.wave_of("Engine"), Some(1));
        assert_eq!(plan.wave_of("Missing"), None);
    }

    #[test]
    fn independent_modules_share_a_wave_sorted_by_name() {
        let plan = compile(&graph(vec![
            ModuleDescriptor::new("Zlib"),
            ModuleDescriptor::new("App").with_private_dependencies(["Zlib", "Core", "Json"]),
            ModuleDescriptor::new("Json").with_public_dependencies(["Core"]),
            ModuleDescriptor::new("Core"),
        ]))
        .expect("plan");

        assert_eq!(
            plan.waves(),
            waves(&[&["Core", "Zlib"], &["Json"], &["App"]])
        );
        assert_eq!(plan.max_parallelism(), 2);
        let order: Vec<&str> = plan.topological_order().collect();
        assert_eq!(order, vec!["Core", "Zlib", "Json", "App"]);
    }

    #[test]
    fn module_waits_for_its_deepest_dependency() {
        // D depends on A (wave 0) and C (wave 2): it lands in wave 3.
        let plan = compile(&graph(vec![
            ModuleDescriptor::new("A"),
            ModuleDescriptor::new("B").with_public_dependencies(["A"]),
            ModuleDescriptor::new("C").with_private_dependencies(["B"]),
            ModuleDescriptor::new("D").with_public_dependencies(["A", "C"]),
        ]))
        .expect("plan");

        assert_eq!(plan.waves(), waves(&[&["A"], &["B"], &["C"], &["D"]]));
    }

    #[test]
    fn residual_cycle_is_an_internal_consistency_failure() {
        // No excision pass: the cycle is still in the graph.
        let diagnostic = compile(&graph(vec![
            ModuleDescriptor::new("Free"),
            ModuleDescriptor::new("A").with_public_dependencies(["B"]),
            ModuleDescriptor::new("B").with_public_dependencies(["A"]),
        ]))
        .expect_err("cycle must stall wave construction");

        assert_eq!(diagnostic.kind, DiagnosticKind::InternalConsistency);
        assert_eq!(diagnostic.modules, vec!["A", "B"]);
        assert!(diagnostic.is_fatal());
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let build = |extra: bool| {
            let mut descriptors = vec![
                ModuleDescriptor::new("Core"),
                ModuleDescriptor::new("Engine").with_public_dependencies(["Core"]),
            ];
            if extra {
                descriptors.push(ModuleDescriptor::new("Tools"));
            }
            compile(&graph(descriptors)).expect("plan")
        };

        assert_eq!(build(false).fingerprint(), build(false).fingerprint());
        assert_ne!(build(false).fingerprint(), build(true).fingerprint());
        assert!(build(false).fingerprint().starts_with("blake3:"));
    }
}
