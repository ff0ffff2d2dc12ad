//! Top-down composition of package markers.

use crate::collaborators::DependenciesConfiguration;
use crate::config::ListMergePolicy;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::ir::{NamedDefinitionFile, PackageMarkerDeclaration};
use crate::paths::RelativeFilePath;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// The effective package marker of one directory after inheritance.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedPackageMarker {
    /// Directory this marker applies to.
    pub directory: RelativeFilePath,
    /// Marker files that contributed, outermost first.
    pub declared_in: Vec<RelativeFilePath>,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Human readable package name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Effective defaults.
    pub defaults: IndexMap<String, serde_json::Value>,
    /// Effective re-exports.
    pub export: Vec<String>,
    /// File ordering declared for this directory only.
    pub navigation: Vec<String>,
}

impl ComposedPackageMarker {
    /// Derives a child directory's marker from this one and the child's own declaration.
    pub fn inherit(
        &self,
        directory: RelativeFilePath,
        local: Option<&PackageMarkerDeclaration>,
        policy: ListMergePolicy,
    ) -> ComposedPackageMarker {
        let mut declared_in = self.declared_in.clone();
        let mut defaults = self.defaults.clone();
        let Some(local) = local else {
            return ComposedPackageMarker {
                directory,
                declared_in,
                docs: self.docs.clone(),
                display_name: self.display_name.clone(),
                defaults,
                export: self.export.clone(),
                navigation: Vec::new(),
            };
        };

        declared_in.push(local.file.clone());
        for (key, value) in &local.defaults {
            defaults.insert(key.clone(), value.clone());
        }

        ComposedPackageMarker {
            directory,
            declared_in,
            docs: local.docs.clone().or_else(|| self.docs.clone()),
            display_name: local
                .display_name
                .clone()
                .or_else(|| self.display_name.clone()),
            defaults,
            export: merge_lists(&self.export, &local.export, policy),
            navigation: local.navigation.clone(),
        }
    }
}

fn merge_lists(inherited: &[String], local: &[String], policy: ListMergePolicy) -> Vec<String> {
    match policy {
        ListMergePolicy::Replace if !local.is_empty() => local.to_vec(),
        ListMergePolicy::Replace => inherited.to_vec(),
        ListMergePolicy::Concatenate => {
            let mut seen = BTreeSet::new();
            inherited
                .iter()
                .chain(local)
                .filter(|item| seen.insert(item.as_str()))
                .cloned()
                .collect()
        }
    }
}

/// Composes a marker for the definition root, every directory that holds a
/// definition file or marker, and all of their ancestors.
pub fn compose_package_markers(
    declared: &BTreeMap<RelativeFilePath, PackageMarkerDeclaration>,
    named_definition_files: &BTreeMap<RelativeFilePath, NamedDefinitionFile>,
    policy: ListMergePolicy,
) -> BTreeMap<RelativeFilePath, ComposedPackageMarker> {
    let directories: BTreeSet<RelativeFilePath> = named_definition_files
        .keys()
        .map(RelativeFilePath::dirname)
        .chain(declared.keys().cloned())
        .flat_map(|dir| dir.ancestor_directories())
        .chain(std::iter::once(RelativeFilePath::root()))
        .collect();

    // Lexicographic order visits every parent before its children.
    directories
        .into_iter()
        .fold(BTreeMap::new(), |mut composed, dir| {
            let marker = if dir.is_root() {
                ComposedPackageMarker::default().inherit(dir.clone(), declared.get(&dir), policy)
            } else {
                let parent = composed.get(&dir.dirname()).cloned().unwrap_or_default();
                parent.inherit(dir.clone(), declared.get(&dir), policy)
            };
            composed.insert(dir, marker);
            composed
        })
}

/// Checks marker exports against the dependencies configuration and navigation
/// entries against the definition files of the marker's directory.
pub fn check_package_markers(
    declared: &BTreeMap<RelativeFilePath, PackageMarkerDeclaration>,
    named_definition_files: &BTreeMap<RelativeFilePath, NamedDefinitionFile>,
    dependencies: &DependenciesConfiguration,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (dir, marker) in declared {
        let missing: Vec<&str> = marker
            .export
            .iter()
            .map(String::as_str)
            .filter(|name| !dependencies.contains(name))
            .collect();
        if !missing.is_empty() {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::ConfigurationError,
                marker.file.as_str(),
                missing
                    .iter()
                    .map(|name| format!("export '{}' is not a declared dependency", name))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ));
        }

        let unknown: Vec<String> = marker
            .navigation
            .iter()
            .filter(|entry| {
                entry.contains('/')
                    || dir
                        .join(entry)
                        .map_or(true, |file| !named_definition_files.contains_key(&file))
            })
            .map(|entry| {
                format!(
                    "navigation: '{}' is not a definition file in '{}'",
                    entry, dir
                )
            })
            .collect();
        if !unknown.is_empty() {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::StructuralError,
                marker.file.as_str(),
                unknown.join("\n"),
            ));
        }
    }
    diagnostics
}
