//! Import resolution, cross-file name checks and cycle detection.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::ir::{
    DeclaredName, DefinitionFileSchema, NamedDefinitionFile, TypeReference, TypeShape,
};
use crate::paths::{resolve_import_path, RelativeFilePath};
use crate::validation::StructuralValidationResult;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

/// A resolved import edge between two files of the definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedDefinition {
    /// The importing file.
    pub from: RelativeFilePath,
    /// Alias the import is declared under.
    pub alias: String,
    /// The imported file.
    pub to: RelativeFilePath,
    /// The import path as written.
    pub declared_as: String,
}

/// Resolves every import of the root file and the named definition files.
///
/// Returns the edges ordered by `(from, alias)` plus one diagnostic per import
/// that escapes the root or does not land on a named definition file.
pub fn resolve_imports(
    validated: &StructuralValidationResult,
) -> (Vec<ImportedDefinition>, Vec<Diagnostic>) {
    let root_file = &validated.root_api_file;
    let marker_files: HashSet<&RelativeFilePath> =
        validated.package_markers.values().map(|m| &m.file).collect();

    let sources = std::iter::once((&root_file.file, &root_file.contents.imports)).chain(
        validated
            .named_definition_files
            .values()
            .map(|named| (&named.file, &named.contents.imports)),
    );

    let mut edges = Vec::new();
    let mut diagnostics = Vec::new();
    for (from, imports) in sources {
        for (alias, import_path) in imports {
            let to = match resolve_import_path(from, import_path) {
                Ok(to) => to,
                Err(e) => {
                    let mut diag = Diagnostic::from_app_error(from.as_str(), &e);
                    diag.message = format!("import '{}': {}", alias, diag.message);
                    diagnostics.push(diag);
                    continue;
                }
            };

            if validated.named_definition_files.contains_key(&to) {
                debug!(from = %from, to = %to, alias = %alias, "resolved import");
                edges.push(ImportedDefinition {
                    from: from.clone(),
                    alias: alias.clone(),
                    to,
                    declared_as: import_path.clone(),
                });
                continue;
            }

            let reason = if to == root_file.file {
                "is the root API file, which cannot be imported".to_string()
            } else if marker_files.contains(&to) {
                "is a package marker, which cannot be imported".to_string()
            } else {
                "does not exist".to_string()
            };
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::DanglingImportError,
                from.as_str(),
                format!(
                    "import '{}' ('{}') resolves to '{}', which {}",
                    alias, import_path, to, reason
                ),
            ));
        }
    }

    edges.sort();
    (edges, diagnostics)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ReferenceKind {
    Type,
    Error,
}

struct NameReference<'a> {
    location: String,
    name: &'a DeclaredName,
    kind: ReferenceKind,
}

fn push_type_refs<'a>(out: &mut Vec<NameReference<'a>>, location: String, ty: &'a TypeReference) {
    for name in ty.named_references() {
        out.push(NameReference {
            location: location.clone(),
            name,
            kind: ReferenceKind::Type,
        });
    }
}

fn collect_references(schema: &DefinitionFileSchema) -> Vec<NameReference<'_>> {
    let mut out = Vec::new();
    for (name, decl) in &schema.types {
        let at = format!("types.{}", name);
        match &decl.shape {
            TypeShape::Alias { type_reference } => push_type_refs(&mut out, at, type_reference),
            TypeShape::Object {
                extends,
                properties,
            } => {
                for ty in extends {
                    push_type_refs(&mut out, format!("{}.extends", at), ty);
                }
                for (prop, decl) in properties {
                    push_type_refs(
                        &mut out,
                        format!("{}.properties.{}", at, prop),
                        &decl.type_reference,
                    );
                }
            }
            TypeShape::Union { members } => {
                for (member, ty) in members {
                    push_type_refs(&mut out, format!("{}.union.{}", at, member), ty);
                }
            }
            TypeShape::Enum { .. } => {}
        }
    }
    for (name, decl) in &schema.errors {
        if let Some(ty) = &decl.type_reference {
            push_type_refs(&mut out, format!("errors.{}", name), ty);
        }
    }
    if let Some(service) = &schema.service {
        for (name, endpoint) in &service.endpoints {
            let at = format!("service.endpoints.{}", name);
            for (param, ty) in &endpoint.path_parameters {
                push_type_refs(&mut out, format!("{}.path-parameters.{}", at, param), ty);
            }
            if let Some(ty) = &endpoint.request {
                push_type_refs(&mut out, format!("{}.request", at), ty);
            }
            if let Some(ty) = &endpoint.response {
                push_type_refs(&mut out, format!("{}.response", at), ty);
            }
            for error in &endpoint.errors {
                out.push(NameReference {
                    location: format!("{}.errors", at),
                    name: error,
                    kind: ReferenceKind::Error,
                });
            }
        }
    }
    out
}

/// Name references of the root file (headers) and of every named definition file.
fn references_by_file(
    validated: &StructuralValidationResult,
) -> Vec<(&RelativeFilePath, Vec<NameReference<'_>>)> {
    let root = &validated.root_api_file;
    let mut root_refs = Vec::new();
    for (header, decl) in &root.contents.headers {
        push_type_refs(&mut root_refs, format!("headers.{}", header), &decl.type_reference);
    }
    std::iter::once((&root.file, root_refs))
        .chain(
            validated
                .named_definition_files
                .values()
                .map(|named| (&named.file, collect_references(&named.contents))),
        )
        .collect()
}

/// Warns about resolved imports whose alias no reference in the importing file uses.
pub fn find_unused_imports(
    validated: &StructuralValidationResult,
    edges: &[ImportedDefinition],
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (file, references) in references_by_file(validated) {
        let used: HashSet<&str> = references
            .iter()
            .filter_map(|reference| reference.name.import_alias.as_deref())
            .collect();
        let lines: Vec<String> = edges
            .iter()
            .filter(|edge| &edge.from == file && !used.contains(edge.alias.as_str()))
            .map(|edge| format!("import '{}' ('{}') is never used", edge.alias, edge.declared_as))
            .collect();
        if !lines.is_empty() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::UnusedImport,
                file.as_str(),
                lines.join("\n"),
            ));
        }
    }
    diagnostics
}

/// Checks that every `alias.Name` reference names a declaration of the imported file.
pub fn check_imported_names(
    validated: &StructuralValidationResult,
    edges: &[ImportedDefinition],
) -> Vec<Diagnostic> {
    let targets: HashMap<(&RelativeFilePath, &str), &NamedDefinitionFile> = edges
        .iter()
        .filter_map(|edge| {
            validated
                .named_definition_files
                .get(&edge.to)
                .map(|target| ((&edge.from, edge.alias.as_str()), target))
        })
        .collect();

    let sources = references_by_file(validated);

    let mut diagnostics = Vec::new();
    for (file, references) in sources {
        let mut lines = Vec::new();
        for reference in references {
            let Some(alias) = &reference.name.import_alias else {
                continue;
            };
            // Unresolved aliases were already reported as dangling imports.
            let Some(target) = targets.get(&(file, alias.as_str())) else {
                continue;
            };
            let declared = match reference.kind {
                ReferenceKind::Type => target.contents.types.contains_key(&reference.name.name),
                ReferenceKind::Error => target.contents.errors.contains_key(&reference.name.name),
            };
            if !declared {
                let what = match reference.kind {
                    ReferenceKind::Type => "type",
                    ReferenceKind::Error => "error",
                };
                lines.push(format!(
                    "{}: {} '{}' is not declared in '{}'",
                    reference.location, what, reference.name, target.file
                ));
            }
        }
        if !lines.is_empty() {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::StructuralError,
                file.as_str(),
                lines.join("\n"),
            ));
        }
    }
    diagnostics
}

/// Enumerates elementary cycles. A search rooted at `start` only walks files
/// ordered after it, so each cycle is found once, from its first file.
struct CycleSearch<'a> {
    graph: &'a BTreeMap<&'a RelativeFilePath, BTreeSet<&'a RelativeFilePath>>,
    start: &'a RelativeFilePath,
    on_path: HashSet<&'a RelativeFilePath>,
    stack: Vec<&'a RelativeFilePath>,
    cycles: BTreeSet<Vec<&'a RelativeFilePath>>,
}

impl<'a> CycleSearch<'a> {
    fn visit(&mut self, node: &'a RelativeFilePath) {
        self.stack.push(node);
        self.on_path.insert(node);
        let graph = self.graph;
        for &target in graph.get(node).into_iter().flatten() {
            if target == self.start {
                self.cycles.insert(self.stack.clone());
            } else if target > self.start && !self.on_path.contains(target) {
                self.visit(target);
            }
        }
        self.on_path.remove(node);
        self.stack.pop();
    }
}

/// Finds import cycles. Every elementary cycle is reported once, on its
/// lexicographically first file, as `a.yml -> b.yml -> a.yml`. Cycles that
/// share files are reported separately.
pub fn detect_cycles(edges: &[ImportedDefinition]) -> Vec<Diagnostic> {
    let mut graph: BTreeMap<&RelativeFilePath, BTreeSet<&RelativeFilePath>> = BTreeMap::new();
    for edge in edges {
        graph.entry(&edge.from).or_default().insert(&edge.to);
    }

    let mut cycles = BTreeSet::new();
    for &start in graph.keys() {
        let mut search = CycleSearch {
            graph: &graph,
            start,
            on_path: HashSet::new(),
            stack: Vec::new(),
            cycles: BTreeSet::new(),
        };
        search.visit(start);
        cycles.append(&mut search.cycles);
    }

    cycles
        .into_iter()
        .map(|cycle| {
            let path: Vec<&str> = cycle
                .iter()
                .chain(cycle.first())
                .map(|file| file.as_str())
                .collect();
            Diagnostic::error(
                DiagnosticKind::CyclicImportError,
                cycle[0].as_str(),
                format!("import cycle: {}", path.join(" -> ")),
            )
        })
        .collect()
}
