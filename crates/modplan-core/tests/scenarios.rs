//! End-to-end resolution scenarios with hand-computed expectations.
//!
//! Each test builds a small module set, runs the full pass through
//! [`modplan_core::resolve`] and checks the plan, the per-module query
//! results or the diagnostics against values derived by hand.

use modplan_core::{
    DiagnosticKind, ModuleDescriptor, PchUsage, RegistryError, ResolveConfig, Resolver, Severity,
    resolve,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn waves(items: &[&[&str]]) -> Vec<Vec<String>> {
    items.iter().map(|wave| strings(wave)).collect()
}

/// Core ← Engine ← Editor, with Editor also depending privately on Core.
fn editor_stack() -> Vec<ModuleDescriptor> {
    vec![
        ModuleDescriptor::new("Core")
            .with_public_include_paths(["Core/Public"])
            .with_private_include_paths(["Core/Private"]),
        ModuleDescriptor::new("Engine")
            .with_public_include_paths(["Engine/Public"])
            .with_private_include_paths(["Engine/Private"])
            .with_public_dependencies(["Core"]),
        ModuleDescriptor::new("Editor")
            .with_public_include_paths(["Editor/Public"])
            .with_public_dependencies(["Engine"])
            .with_private_dependencies(["Core"]),
    ]
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[test]
fn editor_stack_plans_one_module_per_wave() {
    let resolution = resolve(editor_stack()).expect("editor stack resolves");

    assert_eq!(
        resolution.plan().waves(),
        waves(&[&["Core"], &["Engine"], &["Editor"]])
    );
    assert!(resolution.warnings().is_empty());
}

#[test]
fn editor_includes_core_and_engine_public_paths() {
    let resolution = resolve(editor_stack()).expect("editor stack resolves");

    assert_eq!(
        resolution
            .effective_include_paths("Editor")
            .expect("Editor is registered"),
        strings(&["Editor/Public", "Engine/Public", "Core/Public"])
    );
}

#[test]
fn editor_private_edge_stays_out_of_engine_closure() {
    let resolution = resolve(editor_stack()).expect("editor stack resolves");

    let engine = resolution
        .transitive_public_dependencies("Engine")
        .expect("Engine is registered");
    assert_eq!(engine.iter().collect::<Vec<_>>(), vec!["Core"]);
    assert!(!engine.contains("Editor"));

    let editor = resolution
        .transitive_public_dependencies("Editor")
        .expect("Editor is registered");
    assert_eq!(editor.iter().collect::<Vec<_>>(), vec!["Core", "Engine"]);
}

#[test]
fn resolution_is_idempotent() {
    let first = resolve(editor_stack()).expect("first pass");
    let second = resolve(editor_stack()).expect("second pass");

    assert_eq!(first.plan().waves(), second.plan().waves());
    assert_eq!(first.plan().fingerprint(), second.plan().fingerprint());
    assert_eq!(first.content_hash(), second.content_hash());
}

#[test]
fn dynamic_loads_never_order_the_plan() {
    // Plugin is loaded by Core at runtime yet depends on Core at build time.
    let resolution = resolve([
        ModuleDescriptor::new("Core").with_dynamically_loaded_modules(["Plugin"]),
        ModuleDescriptor::new("Plugin").with_public_dependencies(["Core"]),
    ])
    .expect("dynamic loads are weak references");

    assert_eq!(resolution.plan().waves(), waves(&[&["Core"], &["Plugin"]]));
    assert_eq!(
        resolution
            .dynamically_loaded_modules("Core")
            .expect("Core is registered"),
        strings(&["Plugin"])
    );
}

// ---------------------------------------------------------------------------
// Closures and include paths
// ---------------------------------------------------------------------------

#[test]
fn public_chain_is_transitive_and_private_link_is_not() {
    let public_chain = resolve([
        ModuleDescriptor::new("A").with_public_dependencies(["B"]),
        ModuleDescriptor::new("B").with_public_dependencies(["C"]),
        ModuleDescriptor::new("C"),
    ])
    .expect("resolves");
    assert!(
        public_chain
            .transitive_public_dependencies("A")
            .expect("A")
            .contains("C")
    );

    let private_link = resolve([
        ModuleDescriptor::new("A").with_public_dependencies(["B"]),
        ModuleDescriptor::new("B").with_private_dependencies(["C"]),
        ModuleDescriptor::new("C"),
    ])
    .expect("resolves");
    let closure = private_link
        .transitive_public_dependencies("A")
        .expect("A");
    assert!(closure.contains("B"));
    assert!(!closure.contains("C"));
}

#[test]
fn private_include_paths_never_leak_to_dependents() {
    let resolution = resolve(editor_stack()).expect("editor stack resolves");

    for name in ["Engine", "Editor"] {
        let paths = resolution.effective_include_paths(name).expect(name);
        assert!(!paths.iter().any(|p| p == "Core/Private"), "{name}: {paths:?}");
    }
    let editor = resolution.effective_include_paths("Editor").expect("Editor");
    assert!(!editor.iter().any(|p| p == "Engine/Private"));

    // Own private paths are kept.
    let engine = resolution.effective_include_paths("Engine").expect("Engine");
    assert_eq!(
        engine,
        strings(&["Engine/Public", "Engine/Private", "Core/Public"])
    );
}

#[test]
fn shared_include_paths_appear_once() {
    let resolution = resolve([
        ModuleDescriptor::new("Json")
            .with_public_include_paths(["ThirdParty/Include"])
            .with_public_dependencies(["Core"]),
        ModuleDescriptor::new("Core").with_public_include_paths(["ThirdParty/Include", "Core"]),
        ModuleDescriptor::new("App").with_public_dependencies(["Json", "Core"]),
    ])
    .expect("resolves");

    assert_eq!(
        resolution.effective_include_paths("App").expect("App"),
        strings(&["ThirdParty/Include", "Core"])
    );
}

// ---------------------------------------------------------------------------
// PCH
// ---------------------------------------------------------------------------

#[test]
fn pch_sharing_requires_pch_capable_dependencies() {
    let resolution = resolve([
        ModuleDescriptor::new("Core").with_pch_usage(PchUsage::UseExplicitOnly),
        ModuleDescriptor::new("Legacy"),
        ModuleDescriptor::new("Engine")
            .with_pch_usage(PchUsage::UseSharedOrExplicit)
            .with_public_dependencies(["Core"]),
        ModuleDescriptor::new("Tools")
            .with_pch_usage(PchUsage::UseSharedOrExplicit)
            .with_public_dependencies(["Core"])
            .with_private_dependencies(["Legacy"]),
    ])
    .expect("PCH conflicts are not fatal");

    assert_eq!(resolution.is_pch_eligible("Engine"), Ok(true));
    assert_eq!(resolution.is_pch_eligible("Tools"), Ok(false));
    assert_eq!(resolution.is_pch_eligible("Core"), Ok(false));

    let warnings = resolution.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, DiagnosticKind::IncompatiblePchPolicy);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert_eq!(warnings[0].modules, strings(&["Tools", "Legacy"]));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn two_module_cycle_withholds_the_plan() {
    let err = resolve([
        ModuleDescriptor::new("A").with_public_dependencies(["B"]),
        ModuleDescriptor::new("B").with_public_dependencies(["A"]),
    ])
    .expect_err("cycle is fatal");

    let cycles: Vec<_> = err.of_kind(DiagnosticKind::DependencyCycle).collect();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].cycle_path(), Some(strings(&["A", "B", "A"]).as_slice()));
    assert_eq!(cycles[0].code, "E2002");
    assert!(err.has_fatal());
}

#[test]
fn self_dependency_is_a_cycle() {
    let err = resolve([ModuleDescriptor::new("Loop").with_private_dependencies(["Loop"])])
        .expect_err("self dependency is fatal");

    let cycle = err
        .of_kind(DiagnosticKind::DependencyCycle)
        .next()
        .expect("cycle reported");
    assert_eq!(cycle.cycle_path(), Some(strings(&["Loop", "Loop"]).as_slice()));
}

#[test]
fn three_missing_dependencies_reported_together() {
    let err = resolve([
        ModuleDescriptor::new("A").with_public_dependencies(["Ghost1"]),
        ModuleDescriptor::new("B").with_private_dependencies(["Ghost2"]),
        ModuleDescriptor::new("C").with_public_dependencies(["A", "Ghost3"]),
    ])
    .expect_err("missing dependencies are fatal");

    let missing: Vec<Vec<String>> = err
        .of_kind(DiagnosticKind::MissingDependency)
        .map(|d| d.modules.clone())
        .collect();
    assert_eq!(
        missing,
        vec![
            strings(&["A", "Ghost1"]),
            strings(&["B", "Ghost2"]),
            strings(&["C", "Ghost3"]),
        ]
    );
    assert_eq!(err.error_count(), 3);
}

#[test]
fn duplicate_names_are_fatal() {
    let err = resolve([ModuleDescriptor::new("Core"), ModuleDescriptor::new("Core")])
        .expect_err("duplicate is fatal");

    assert_eq!(err.len(), 1);
    assert_eq!(err.iter().next().map(|d| d.kind), Some(DiagnosticKind::DuplicateModule));
}

#[test]
fn public_and_private_declaration_conflicts() {
    let err = resolve([
        ModuleDescriptor::new("Core"),
        ModuleDescriptor::new("Engine")
            .with_public_dependencies(["Core"])
            .with_private_dependencies(["Core"]),
    ])
    .expect_err("visibility conflict is fatal");

    let conflicts: Vec<_> = err
        .of_kind(DiagnosticKind::ConflictingDependencyVisibility)
        .collect();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].modules, strings(&["Engine", "Core"]));
}

#[test]
fn strict_dynamic_modules_makes_unknown_loads_fatal() {
    let descriptors = || vec![ModuleDescriptor::new("Core").with_dynamically_loaded_modules(["Ghost"])];

    let lenient = resolve(descriptors()).expect("warning only");
    assert_eq!(lenient.warnings().len(), 1);

    let strict = Resolver::new(ResolveConfig {
        strict_dynamic_modules: true,
        ..ResolveConfig::default()
    });
    let err = strict.resolve(descriptors()).expect_err("strict mode");
    assert!(err.has_fatal());
    assert_eq!(
        err.iter().next().map(|d| d.severity),
        Some(Severity::Error)
    );
}

#[test]
fn queries_reject_unknown_modules() {
    let resolution = resolve(editor_stack()).expect("editor stack resolves");

    assert_eq!(
        resolution.transitive_public_dependencies("Slate").map(|_| ()),
        Err(RegistryError::UnknownModule("Slate".to_string()))
    );
    assert!(resolution.module("Slate").is_err());
    assert!(resolution.module("Core").is_ok());
}

#[test]
fn editor_plugin_module_with_many_private_dependencies() {
    let private = [
        "Projects",
        "InputCore",
        "EditorFramework",
        "UnrealEd",
        "ToolMenus",
        "CoreUObject",
        "Engine",
        "Slate",
        "SlateCore",
        "DeveloperSettings",
    ];
    let mut descriptors = vec![
        ModuleDescriptor::new("Core")
            .with_pch_usage(PchUsage::UseSharedOrExplicit)
            .with_public_include_paths(["Runtime/Core/Public"]),
    ];
    descriptors.extend(private.iter().map(|name| {
        ModuleDescriptor::new(*name)
            .with_pch_usage(PchUsage::UseSharedOrExplicit)
            .with_public_include_paths([format!("{name}/Public")])
            .with_public_dependencies(["Core"])
    }));
    descriptors.push(
        ModuleDescriptor::new("CommonMaps")
            .with_pch_usage(PchUsage::UseSharedOrExplicit)
            .with_public_dependencies(["Core"])
            .with_private_dependencies(private),
    );

    let resolution = resolve(descriptors).expect("plugin resolves");

    assert_eq!(resolution.plan().wave_count(), 3);
    assert_eq!(resolution.plan().wave_of("CommonMaps"), Some(2));
    assert_eq!(resolution.plan().waves()[1].len(), private.len());
    assert_eq!(resolution.is_pch_eligible("CommonMaps"), Ok(true));

    // Private dependencies feed the build order but not the include set.
    assert_eq!(
        resolution
            .effective_include_paths("CommonMaps")
            .expect("CommonMaps is registered"),
        strings(&["Runtime/Core/Public"])
    );
    assert_eq!(
        resolution
            .transitive_public_dependencies("CommonMaps")
            .expect("CommonMaps is registered")
            .len(),
        1
    );
}
