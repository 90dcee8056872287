#![forbid(unsafe_code)]
//! modplan-core library.
//!
//! Resolves a set of declarative module descriptors into per-module
//! propagation results (public closures, effective include paths, PCH
//! eligibility) and a wave-ordered [`BuildPlan`].
//!
//! ```
//! use modplan_core::{ModuleDescriptor, resolve};
//!
//! let resolution = resolve([
//!     ModuleDescriptor::new("Core").with_public_include_paths(["Core/Public"]),
//!     ModuleDescriptor::new("Engine").with_public_dependencies(["Core"]),
//! ])
//! .expect("acyclic and complete");
//!
//! assert_eq!(resolution.plan().waves()[0], vec!["Core".to_string()]);
//! assert_eq!(
//!     resolution.effective_include_paths("Engine").expect("known module"),
//!     ["Core/Public".to_string()]
//! );
//! ```
//!
//! # Conventions
//!
//! - **Errors**: Resolution problems are [`Diagnostic`]s collected into a
//!   [`DiagnosticList`]; API misuse returns [`RegistryError`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod config;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod plan;
pub mod propagate;
pub mod registry;
pub mod resolve;

pub use config::ResolveConfig;
pub use descriptor::{ModuleDescriptor, PchUsage, Visibility};
pub use diagnostics::{Diagnostic, DiagnosticEdge, DiagnosticKind, DiagnosticList, Severity};
pub use error::ErrorCode;
pub use plan::BuildPlan;
pub use propagate::ResolvedModule;
pub use registry::{ModuleRegistry, RegistryError};
pub use resolve::{Resolution, Resolver, resolve};
