//! Dependency graph over registered modules.
//!
//! # Overview
//!
//! ```text
//! ModuleRegistry
//!        ↓  build::ModuleGraph::build()
//! ModuleGraph (StableDiGraph, edges tagged public/private, may hold cycles)
//!        ↓  cycles::excise_cycles()
//! ModuleGraph (acyclic; every excised edge reported as a cycle)
//! ```
//!
//! Edge direction is `dependent → dependency`.

pub mod build;
pub mod cycles;

pub use build::{Dependency, ModuleGraph};
pub use cycles::{ExcisedEdge, excise_cycles};
