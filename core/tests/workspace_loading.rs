//! End-to-end workspace loading over fixture directories.

use fern_loader_core::collaborators::DependenciesConfigurationLoader;
use fern_loader_core::{
    AbsoluteFilePath, DependenciesConfiguration, Diagnostic, DiagnosticKind, LoadStage,
    LoaderOptions, RelativeFilePath, Severity, SourceReader, WorkspaceDefinition, WorkspaceKind,
    WorkspaceLoadResult, WorkspaceLoader,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, text) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
    dir
}

fn loader() -> WorkspaceLoader {
    WorkspaceLoader::new(LoaderOptions::default())
}

fn failure(result: WorkspaceLoadResult) -> Vec<Diagnostic> {
    match result {
        WorkspaceLoadResult::Failure(diagnostics) => diagnostics,
        WorkspaceLoadResult::Success(ws) => panic!("expected failure, loaded {}", ws.name),
    }
}

fn kinds(diagnostics: &[Diagnostic]) -> Vec<(&str, DiagnosticKind)> {
    diagnostics.iter().map(|d| (d.file.as_str(), d.kind)).collect()
}

const PETSTORE: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    get:
      responses:
        "200":
          description: ok
"#;

#[test]
fn test_declarative_workspace_loads() {
    let dir = workspace(&[
        ("generators.yml", "groups:\n  sdk:\n    generators: []\n"),
        ("dependencies.yml", "dependencies:\n  payments: \"1.0.0\"\n"),
        ("definition/api.yml", "name: petstore\nimports:\n  c: commons.yml\n"),
        ("definition/__package__.yml", "display-name: Pets\nexport: payments\n"),
        ("definition/commons.yml", "types:\n  PetId: string\n"),
        (
            "definition/pets/pets.yml",
            concat!(
                "imports:\n  c: ../commons.yml\n",
                "types:\n  Pet:\n    properties:\n      id: c.PetId\n      tags: list<string>\n",
                "service:\n  base-path: /pets\n  auth: false\n  endpoints:\n",
                "    get:\n      method: GET\n      path: /{petId}\n",
                "      path-parameters:\n        petId: c.PetId\n      response: Pet\n",
            ),
        ),
    ]);

    let (result, stages) = loader().load_recording(dir.path(), Some("staging".into()));
    assert_eq!(
        stages,
        vec![
            LoadStage::KindDetected(WorkspaceKind::Fern),
            LoadStage::Discovering,
            LoadStage::Parsing,
            LoadStage::Validating,
            LoadStage::ResolvingImports,
            LoadStage::ComposingMarkers,
            LoadStage::Assembled,
        ]
    );

    let ws = result.into_result().unwrap();
    assert_eq!(ws.name, "petstore");
    assert_eq!(ws.workspace_name.as_deref(), Some("staging"));
    assert_eq!(
        kinds(&ws.warnings),
        vec![("api.yml", DiagnosticKind::UnusedImport)]
    );
    assert_eq!(ws.warnings[0].severity, Severity::Warning);
    assert!(ws.generators_configuration.raw.get("groups").is_some());

    let WorkspaceDefinition::Fern(def) = &ws.definition else {
        panic!("expected a declarative definition");
    };
    let files: Vec<&str> = def
        .named_definition_files
        .keys()
        .map(RelativeFilePath::as_str)
        .collect();
    assert_eq!(files, vec!["commons.yml", "pets/pets.yml"]);

    let edges: Vec<(&str, &str)> = def
        .imported_definitions
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(edges, vec![("api.yml", "commons.yml"), ("pets/pets.yml", "commons.yml")]);

    let marker = def
        .package_marker_for(&RelativeFilePath::parse("pets/pets.yml").unwrap())
        .unwrap();
    assert_eq!(marker.display_name.as_deref(), Some("Pets"));
    assert_eq!(marker.export, vec!["payments"]);
    assert!(def.dependencies_configuration.contains("payments"));
}

#[test]
fn test_openapi_workspace_skips_declarative_pipeline() {
    let dir = workspace(&[
        ("openapi/openapi.yml", PETSTORE),
        ("definition/__package__.yml", "display-name: [unterminated\n"),
        ("dependencies.yml", "dependencies: [\n"),
    ]);

    let (result, stages) = loader().load_recording(dir.path(), None);
    assert_eq!(
        stages,
        vec![
            LoadStage::KindDetected(WorkspaceKind::OpenApi),
            LoadStage::Loading,
            LoadStage::Validating,
            LoadStage::Assembled,
        ]
    );

    let ws = result.into_result().unwrap();
    assert_eq!(ws.name, "api");
    let WorkspaceDefinition::OpenApi(def) = &ws.definition else {
        panic!("expected an OpenAPI definition");
    };
    assert_eq!(def.title, "Petstore");
    assert_eq!(def.paths, vec!["/pets"]);
}

#[test]
fn test_openapi_failures_are_reported() {
    let dir = workspace(&[
        ("openapi/a.yml", PETSTORE),
        ("openapi/b.yml", PETSTORE),
        ("generators.yml", "groups: [\n"),
    ]);
    let diags = failure(loader().load(dir.path(), None));
    assert_eq!(
        kinds(&diags),
        vec![
            ("generators.yml", DiagnosticKind::ConfigurationError),
            ("openapi", DiagnosticKind::StructuralError),
        ]
    );
    assert_eq!(diags[1].message, "found multiple OpenAPI documents: a.yml, b.yml");
}

#[test]
fn test_import_cycles_are_rejected() {
    let dir = workspace(&[
        ("definition/api.yml", "name: cycles\n"),
        ("definition/a.yml", "imports:\n  b: b.yml\n"),
        ("definition/b.yml", "imports:\n  c: c.yml\n"),
        ("definition/c.yml", "imports:\n  a: a.yml\n"),
        ("definition/m/x.yml", "imports:\n  y: y.yml\n"),
        ("definition/m/y.yml", "imports:\n  x: x.yml\n"),
        ("definition/self.yml", "imports:\n  me: ./self.yml\n"),
    ]);

    let (result, stages) = loader().load_recording(dir.path(), None);
    assert_eq!(
        stages[stages.len() - 2..].to_vec(),
        vec![LoadStage::ResolvingImports, LoadStage::Failed]
    );

    let diags: Vec<Diagnostic> = failure(result)
        .into_iter()
        .filter(Diagnostic::is_error)
        .collect();
    let messages: Vec<(&str, &str)> = diags
        .iter()
        .map(|d| (d.file.as_str(), d.message.as_str()))
        .collect();
    assert_eq!(
        messages,
        vec![
            ("a.yml", "import cycle: a.yml -> b.yml -> c.yml -> a.yml"),
            ("m/x.yml", "import cycle: m/x.yml -> m/y.yml -> m/x.yml"),
            ("self.yml", "import cycle: self.yml -> self.yml"),
        ]
    );
    assert!(diags.iter().all(|d| d.kind == DiagnosticKind::CyclicImportError));
}

#[test]
fn test_acyclic_diamond_loads() {
    let dir = workspace(&[
        ("definition/api.yml", "name: diamond\n"),
        ("definition/top.yml", "imports:\n  l: left.yml\n  r: right.yml\n"),
        ("definition/left.yml", "imports:\n  b: bottom.yml\n"),
        ("definition/right.yml", "imports:\n  b: bottom.yml\n"),
        ("definition/bottom.yml", "types:\n  Leaf: string\n"),
    ]);
    let ws = loader().load(dir.path(), None).into_result().unwrap();
    let WorkspaceDefinition::Fern(def) = ws.definition else {
        panic!("expected a declarative definition");
    };
    assert_eq!(def.imported_definitions.len(), 4);
}

#[test]
fn test_marker_precedence() {
    let dir = workspace(&[
        (
            "dependencies.yml",
            "dependencies:\n  a: \"1\"\n  b: \"1\"\n",
        ),
        ("definition/api.yml", "name: markers\n"),
        (
            "definition/__package__.yml",
            "display-name: Top\ndocs: top docs\nexport: [a]\ndefaults:\n  timeout: 30\n  retries: 1\n",
        ),
        (
            "definition/users/__package__.yml",
            "display-name: Users\nexport: [b, a]\ndefaults:\n  retries: 3\nnavigation: [users.yml]\n",
        ),
        ("definition/users/users.yml", "types:\n  User: string\n"),
        ("definition/users/admin/admin.yml", "types:\n  Admin: string\n"),
        ("definition/orders/orders.yml", "types:\n  Order: string\n"),
    ]);
    let ws = loader().load(dir.path(), None).into_result().unwrap();
    let WorkspaceDefinition::Fern(def) = ws.definition else {
        panic!("expected a declarative definition");
    };
    let dirs: Vec<&str> = def.package_markers.keys().map(RelativeFilePath::as_str).collect();
    assert_eq!(dirs, vec!["", "orders", "users", "users/admin"]);

    let users = &def.package_markers[&RelativeFilePath::parse("users").unwrap()];
    assert_eq!(users.display_name.as_deref(), Some("Users"));
    assert_eq!(users.docs.as_deref(), Some("top docs"));
    assert_eq!(users.export, vec!["a", "b"]);
    assert_eq!(users.defaults["timeout"], serde_json::json!(30));
    assert_eq!(users.defaults["retries"], serde_json::json!(3));
    assert_eq!(users.navigation, vec!["users.yml"]);

    let admin = &def.package_markers[&RelativeFilePath::parse("users/admin").unwrap()];
    assert_eq!(admin.display_name.as_deref(), Some("Users"));
    assert!(admin.navigation.is_empty());

    let orders = &def.package_markers[&RelativeFilePath::parse("orders").unwrap()];
    assert_eq!(orders.display_name.as_deref(), Some("Top"));
    assert_eq!(orders.export, vec!["a"]);
    assert_eq!(orders.defaults["retries"], serde_json::json!(1));
}

#[test]
fn test_marker_failure_ends_in_composing_stage() {
    let dir = workspace(&[
        ("definition/api.yml", "name: markers\n"),
        ("definition/__package__.yml", "export: [unknown]\n"),
        ("definition/a.yml", "types:\n  A: string\n"),
    ]);
    let (result, stages) = loader().load_recording(dir.path(), None);
    assert_eq!(
        stages[stages.len() - 3..].to_vec(),
        vec![LoadStage::ResolvingImports, LoadStage::ComposingMarkers, LoadStage::Failed]
    );
    assert_eq!(
        kinds(&failure(result)),
        vec![("__package__.yml", DiagnosticKind::ConfigurationError)]
    );
}

#[test]
fn test_replace_policy_overrides_lists() {
    let dir = workspace(&[
        ("dependencies.yml", "dependencies:\n  a: \"1\"\n  b: \"1\"\n"),
        ("definition/api.yml", "name: markers\n"),
        ("definition/__package__.yml", "export: [a]\n"),
        ("definition/users/__package__.yml", "export: [b]\n"),
        ("definition/users/users.yml", "types:\n  User: string\n"),
    ]);
    let options = LoaderOptions {
        list_merge_policy: fern_loader_core::ListMergePolicy::Replace,
        ..LoaderOptions::default()
    };
    let ws = WorkspaceLoader::new(options)
        .load(dir.path(), None)
        .into_result()
        .unwrap();
    let WorkspaceDefinition::Fern(def) = ws.definition else {
        panic!("expected a declarative definition");
    };
    let users = &def.package_markers[&RelativeFilePath::parse("users").unwrap()];
    assert_eq!(users.export, vec!["b"]);
}

/// Reads from disk, delaying earlier files longer so reads finish out of order.
struct DelayingReader;

impl SourceReader for DelayingReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let delay = match name.chars().next() {
            Some('a') => 40,
            Some('b') => 20,
            _ => 0,
        };
        thread::sleep(Duration::from_millis(delay));
        fs::read_to_string(path)
    }
}

#[test]
fn test_output_is_deterministic() {
    let dir = workspace(&[
        ("definition/api.yml", "name: stable\n"),
        ("definition/alpha.yml", "imports:\n  z: zeta.yml\ntypes:\n  A: z.Z\n"),
        ("definition/beta.yml", "imports:\n  z: zeta.yml\ntypes:\n  B: z.Z\n"),
        ("definition/zeta.yml", "types:\n  Z: integer\n"),
        ("definition/broken/one.yml", "types: [\n"),
        ("definition/broken/two.yml", "types: [\n"),
    ]);
    let options = LoaderOptions {
        parse_threads: Some(4),
        ..LoaderOptions::default()
    };
    let slow = WorkspaceLoader::new(options.clone()).with_reader(DelayingReader);
    let fast = WorkspaceLoader::new(options);

    let first = serde_json::to_string(&slow.load(dir.path(), None)).unwrap();
    let second = serde_json::to_string(&fast.load(dir.path(), None)).unwrap();
    assert_eq!(first, second);

    let diags = failure(fast.load(dir.path(), None));
    assert_eq!(
        kinds(&diags),
        vec![
            ("broken/one.yml", DiagnosticKind::ParseError),
            ("broken/two.yml", DiagnosticKind::ParseError),
        ]
    );

    fs::remove_dir_all(dir.path().join("definition/broken")).unwrap();
    let first = serde_json::to_string(&slow.load(dir.path(), None)).unwrap();
    let second = serde_json::to_string(&fast.load(dir.path(), None)).unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with(r#"{"didSucceed":true"#));
}

#[test]
fn test_root_file_must_be_unique() {
    let dir = workspace(&[("definition/users.yml", "types:\n  U: string\n")]);
    let diags = failure(loader().load(dir.path(), None));
    assert_eq!(kinds(&diags), vec![("api.yml", DiagnosticKind::StructuralError)]);
    assert_eq!(diags[0].message, "missing root API file 'api.yml'");

    let dir = workspace(&[
        ("definition/api.yml", "name: one\n"),
        ("definition/api.yaml", "name: two\n"),
    ]);
    let diags = failure(loader().load(dir.path(), None));
    assert_eq!(diags[0].message, "found multiple root API files: api.yaml, api.yml");
}

#[test]
fn test_import_escaping_root_is_invalid() {
    let dir = workspace(&[
        ("definition/api.yml", "name: escape\n"),
        ("definition/pkg/a.yml", "imports:\n  out: ../../outside.yml\n"),
        ("outside.yml", "types:\n  X: string\n"),
    ]);
    let diags = failure(loader().load(dir.path(), None));
    assert_eq!(kinds(&diags), vec![("pkg/a.yml", DiagnosticKind::InvalidPath)]);
    assert!(diags[0].message.starts_with("import 'out': "));
}

#[test]
fn test_dangling_imports() {
    let dir = workspace(&[
        ("definition/api.yml", "name: dangling\n"),
        ("definition/__package__.yml", "docs: top\n"),
        ("definition/a.yml", "imports:\n  gone: missing.yml\n  pkg: __package__.yml\n"),
    ]);
    let (result, stages) = loader().load_recording(dir.path(), None);
    assert_eq!(
        stages,
        vec![
            LoadStage::KindDetected(WorkspaceKind::Fern),
            LoadStage::Discovering,
            LoadStage::Parsing,
            LoadStage::Validating,
            LoadStage::ResolvingImports,
            LoadStage::Failed,
        ]
    );
    let diags = failure(result);
    let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "import 'gone' ('missing.yml') resolves to 'missing.yml', which does not exist",
            "import 'pkg' ('__package__.yml') resolves to '__package__.yml', which is a package marker, which cannot be imported",
        ]
    );
    assert!(diags.iter().all(|d| d.kind == DiagnosticKind::DanglingImportError));
}

struct FailingDependencies;

impl DependenciesConfigurationLoader for FailingDependencies {
    fn load(&self, _root: &AbsoluteFilePath) -> Result<DependenciesConfiguration, Diagnostic> {
        Err(Diagnostic::error(
            DiagnosticKind::ConfigurationError,
            "registry",
            "dependency registry unavailable",
        ))
    }
}

#[test]
fn test_configuration_errors_are_fatal() {
    let dir = workspace(&[
        ("generators.yml", "groups: [\n"),
        ("definition/api.yml", "name: config\n"),
    ]);
    let (result, stages) = loader()
        .with_dependencies_loader(FailingDependencies)
        .load_recording(dir.path(), None);
    assert_eq!(
        stages,
        vec![
            LoadStage::KindDetected(WorkspaceKind::Fern),
            LoadStage::Discovering,
            LoadStage::Failed,
        ]
    );
    let diags = failure(result);
    assert_eq!(
        kinds(&diags),
        vec![
            ("generators.yml", DiagnosticKind::ConfigurationError),
            ("registry", DiagnosticKind::ConfigurationError),
        ]
    );
    assert!(diags[0].message.starts_with("Invalid generators configuration: "));
}

#[test]
fn test_missing_directories() {
    let dir = workspace(&[("README.md", "nothing here\n")]);
    let diags = failure(loader().load(dir.path(), None));
    assert_eq!(kinds(&diags), vec![("definition", DiagnosticKind::DirectoryNotFound)]);

    let diags = failure(loader().load(&dir.path().join("missing"), None));
    assert_eq!(diags[0].kind, DiagnosticKind::DirectoryNotFound);
}

#[test]
fn test_structural_errors_one_per_file() {
    let dir = workspace(&[
        ("definition/api.yml", "name: shapes\n"),
        ("definition/a.yml", "types:\n  A: Missing\n  B: list<\n"),
        ("definition/b.yml", "colour: blue\n"),
        ("definition/c.yml", "types:\n  C: string\n"),
    ]);
    let diags = failure(loader().load(dir.path(), None));
    assert_eq!(
        kinds(&diags),
        vec![
            ("a.yml", DiagnosticKind::StructuralError),
            ("b.yml", DiagnosticKind::StructuralError),
        ]
    );
    assert_eq!(diags[0].message.lines().count(), 2);
}
