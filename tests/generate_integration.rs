//! End-to-end generation through the public API

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use stencil::syntax::{parse, to_source};
use stencil::{
    generate, Config, DirectiveError, GenerateError, GenerateOptions, Generator, MergeError,
    Source, StructureKind, TemplateConfig, TemplateStore,
};

const STACK_TEMPLATE: &str = include_str!("../templates/stack.rs");
const HEAP_TEMPLATE: &str = include_str!("../templates/heap.rs");

fn shipped_templates() -> TemplateConfig {
    Config::default()
        .templates
        .with_dir(Path::new(env!("CARGO_MANIFEST_DIR")).join("templates"))
}

fn shipped_store() -> TemplateStore {
    TemplateStore::from_sources([
        (StructureKind::Stack, STACK_TEMPLATE),
        (StructureKind::Heap, HEAP_TEMPLATE),
    ])
}

fn run(store: &TemplateStore, directive: &str, destination: &Source) -> Result<String, GenerateError> {
    run_with(store, directive, destination, &GenerateOptions::default())
}

fn run_with(
    store: &TemplateStore,
    directive: &str,
    destination: &Source,
    options: &GenerateOptions,
) -> Result<String, GenerateError> {
    let mut out = Vec::new();
    generate(store, directive, destination, &mut out, options)?;
    Ok(String::from_utf8(out).expect("output is UTF-8"))
}

/// Canonical rendering of a hand-instantiated fixture
fn canonical(fixture: &str) -> String {
    to_source(&parse(fixture).expect("fixture parses")).expect("fixture renders")
}

#[test]
fn test_stack_from_shipped_template() {
    let out = run(&shipped_store(), "Stack[Widget]", &Source::empty("widgets.rs")).unwrap();

    assert!(out.contains("pub struct WidgetStack(Vec<Widget>);"));
    assert!(out.contains("fn push(&mut self, item: Widget) -> bool {"));
    assert!(out.contains("fn pop(&mut self) -> Option<Widget> {"));
    assert!(out.contains("pub fn peek(&self) -> Option<&Widget> {"));
    assert!(!out.contains("StackTemplate"));
    assert!(!out.contains("Element"));
    assert_eq!(out, canonical(include_str!("fixtures/widget_stack.rs")));
}

#[test]
fn test_heap_from_shipped_template() {
    let mut out = Vec::new();
    let outcome = generate(
        &shipped_store(),
        "heap[Node]",
        &Source::empty("nodes.rs"),
        &mut out,
        &GenerateOptions::default(),
    )
    .unwrap();
    let out = String::from_utf8(out).unwrap();

    assert_eq!(outcome.kind, StructureKind::Heap);
    assert_eq!(outcome.type_name, "NodeHeap");
    assert_eq!(outcome.file_name(), "node_heap.rs");
    assert!(!outcome.degraded);
    assert_eq!(outcome.report.renamed_declarations, 1);
    assert_eq!(outcome.report.sequence_elements, 1);
    assert_eq!(out, canonical(include_str!("fixtures/node_heap.rs")));
}

#[test]
fn test_templates_loaded_from_disk() {
    let generator = Generator::from_config(&Config {
        templates: shipped_templates(),
        ..Config::default()
    });
    assert_eq!(
        generator.store().kinds().collect::<Vec<_>>(),
        vec![StructureKind::Stack, StructureKind::Heap]
    );

    let mut out = Vec::new();
    let outcome = generator
        .generate("Stack[Widget]", &Source::empty("widgets.rs"), &mut out)
        .unwrap();
    assert!(!outcome.degraded);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        canonical(include_str!("fixtures/widget_stack.rs"))
    );
}

#[test]
fn test_missing_heap_template_falls_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("stack.rs"), STACK_TEMPLATE).expect("write template");
    let templates = Config::default().templates.with_dir(dir.path());

    let store = TemplateStore::load_from(&templates);
    assert!(!store.load(StructureKind::Stack).unwrap().is_degraded());

    let mut out = Vec::new();
    let outcome = generate(
        &store,
        "Heap[Widget]",
        &Source::empty("widgets.rs"),
        &mut out,
        &GenerateOptions::default(),
    )
    .unwrap();
    assert!(outcome.degraded);
    assert_eq!(outcome.type_name, "WidgetHeap");
    assert_eq!(String::from_utf8(out).unwrap(), "pub struct WidgetHeap;\n");
}

#[test]
fn test_strict_mode_rejects_fallback() {
    let templates = TemplateConfig {
        dir: PathBuf::from("/nonexistent/stencil-templates"),
        ..Config::default().templates
    };
    let store = TemplateStore::load_from(&templates);

    let mut out = Vec::new();
    let err = generate(
        &store,
        "Stack[Widget]",
        &Source::empty("widgets.rs"),
        &mut out,
        &GenerateOptions::default().with_strict(true),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        GenerateError::TemplateDegraded {
            kind: StructureKind::Stack,
            ..
        }
    ));
    assert!(out.is_empty());
}

#[test]
fn test_unknown_kind_aborts_before_loading() {
    let err = run(&TemplateStore::empty(), "foo[Widget]", &Source::empty("w.rs")).unwrap_err();
    let GenerateError::DirectiveMalformed { raw, source } = err else {
        panic!("Expected DirectiveMalformed");
    };
    assert_eq!(raw, "foo[Widget]");
    assert!(matches!(source, DirectiveError::UnknownKind { .. }));
}

#[test]
fn test_digit_element_rejected() {
    let err = run(&shipped_store(), "Stack[2]", &Source::empty("w.rs")).unwrap_err();
    assert!(matches!(
        err,
        GenerateError::DirectiveMalformed {
            source: DirectiveError::Syntax { .. },
            ..
        }
    ));
    assert_eq!(stencil::directive::parse("Stack[2]").kind(), StructureKind::Unknown);
}

#[test]
fn test_merges_into_existing_destination() {
    let destination = Source::new(
        "registry.rs",
        "//! Widget registry\n\nuse std::collections::HashMap;\n\n/// Registry\npub struct Registry {\n    widgets: HashMap<String, u32>,\n}\n",
    );
    let out = run(&shipped_store(), "Stack[Widget]", &destination).unwrap();

    assert!(out.starts_with(
        "//! Widget registry\n\nuse std::collections::HashMap;\nuse std::fmt;\n\n/// Registry\npub struct Registry {\n    widgets: HashMap<String, u32>,\n}\n\n/// Types that can describe their contents as text\npub trait Render {"
    ));
    assert!(out.contains("pub struct WidgetStack(Vec<Widget>);"));
}

#[test]
fn test_destination_with_foreign_items_merges() {
    let destination = Source::new(
        "ffi.rs",
        "extern \"C\" {\n    fn abs(x: i32) -> i32;\n}\n\n#[repr(C)]\npub union Bits {\n    int: u32,\n    float: f32,\n}\n",
    );
    let out = run(&shipped_store(), "Stack[Widget]", &destination).unwrap();

    assert!(out.starts_with(
        "use std::fmt;\n\nextern \"C\" {\n    fn abs(x: i32) -> i32;\n}\n\n#[repr(C)]\npub union Bits {\n    int: u32,\n    float: f32,\n}\n"
    ));
    assert!(out.contains("pub struct WidgetStack(Vec<Widget>);"));
    assert_eq!(to_source(&parse(&out).expect("output parses")).unwrap(), out);
}

#[test]
fn test_regeneration_is_idempotent() {
    let store = shipped_store();
    let first = run(&store, "Stack[Widget]", &Source::empty("widget_stack.rs")).unwrap();
    let second = run(&store, "Stack[Widget]", &Source::new("widget_stack.rs", first.clone())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_output_is_deterministic_and_reparses() {
    let store = shipped_store();
    let a = run(&store, "Heap[Widget]", &Source::empty("w.rs")).unwrap();
    let b = run(&store, "Heap[Widget]", &Source::empty("w.rs")).unwrap();
    assert_eq!(a, b);
    let reparsed = parse(&a).expect("output parses");
    assert_eq!(to_source(&reparsed).unwrap(), a);
}

#[test]
fn test_conflicting_destination_writes_nothing() {
    let destination = Source::new("w.rs", "pub struct WidgetStack;\n");
    let mut out = Vec::new();
    let err = generate(
        &shipped_store(),
        "Stack[Widget]",
        &destination,
        &mut out,
        &GenerateOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        GenerateError::Merge(MergeError::Conflict { name }) if name == "WidgetStack"
    ));
    assert!(out.is_empty());
}

#[test]
fn test_store_shared_across_threads() {
    let store = shipped_store();
    let expected = run(&store, "Stack[Widget]", &Source::empty("w.rs")).unwrap();

    let outputs: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| run(&store, "Stack[Widget]", &Source::empty("w.rs")).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for output in outputs {
        assert_eq!(output, expected);
    }
}
