#![deny(missing_docs)]

//! # Package Markers
//!
//! Validates `__package__.yml` overlays as declared in their own directory.
//! Inheritance and cross-checks against dependencies happen later, in
//! [`package_markers`](crate::package_markers).

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::document::{NodeValue, RawDocument, RawNode};
use crate::ir::PackageMarkerDeclaration;
use crate::validation::{optional_string, reject_unknown_keys, IssueCollector};
use indexmap::IndexMap;

const MARKER_KEYS: [&str; 5] = ["docs", "display-name", "defaults", "export", "navigation"];

/// Validates one package marker file.
pub fn validate_package_marker(doc: &RawDocument) -> Result<PackageMarkerDeclaration, Diagnostic> {
    let root = &doc.root;
    if root.is_null() {
        return Ok(PackageMarkerDeclaration {
            file: doc.file.clone(),
            ..Default::default()
        });
    }
    if let Err(issue) = root.as_mapping() {
        return Err(Diagnostic::error(
            DiagnosticKind::StructuralError,
            doc.file.as_str(),
            issue.to_string(),
        ));
    }

    let mut issues = IssueCollector::default();
    reject_unknown_keys(root, &MARKER_KEYS, &mut issues);

    let mut defaults = IndexMap::new();
    if let Some(map) = root.get("defaults").and_then(|n| issues.check(n.as_mapping())) {
        for (key, value) in map {
            if matches!(value.value(), NodeValue::Scalar(_)) {
                defaults.insert(key.clone(), value.to_json());
            } else {
                issues.push(value.issue(format!(
                    "default '{}' must be a scalar, found {}",
                    key,
                    value.kind_name()
                )));
            }
        }
    }

    let export = string_list(root, "export", &mut issues);
    let navigation = string_list(root, "navigation", &mut issues);

    let marker = PackageMarkerDeclaration {
        file: doc.file.clone(),
        docs: optional_string(root, "docs", &mut issues),
        display_name: optional_string(root, "display-name", &mut issues),
        defaults,
        export,
        navigation,
    };

    match issues.into_diagnostic(&doc.file) {
        Some(diag) => Err(diag),
        None => Ok(marker),
    }
}

fn string_list(node: &RawNode, key: &str, issues: &mut IssueCollector) -> Vec<String> {
    node.get(key)
        .and_then(|n| issues.check(n.as_string_list()))
        .map(|items| items.into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}
