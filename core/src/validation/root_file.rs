#![deny(missing_docs)]

//! # Root API File
//!
//! Validates `api.yml`: API name, version, imports, environments, global headers
//! and the error discrimination strategy.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::document::{RawDocument, RawNode};
use crate::ir::{Environment, ErrorDiscrimination, HeaderDeclaration, RootApiFile, RootApiFileSchema};
use crate::validation::type_reference::{parse_type_reference, Scope};
use crate::validation::{optional_string, read_imports, reject_unknown_keys, IssueCollector};
use indexmap::IndexMap;
use std::collections::HashSet;
use url::Url;

const ROOT_KEYS: [&str; 10] = [
    "name",
    "display-name",
    "version",
    "docs",
    "imports",
    "auth",
    "default-environment",
    "environments",
    "headers",
    "error-discrimination",
];

/// Validates the root API file.
pub fn validate_root_api_file(doc: &RawDocument) -> Result<RootApiFile, Diagnostic> {
    let mut issues = IssueCollector::default();
    let root = &doc.root;

    if let Err(issue) = root.as_mapping() {
        return Err(Diagnostic::error(
            DiagnosticKind::StructuralError,
            doc.file.as_str(),
            issue.to_string(),
        ));
    }
    reject_unknown_keys(root, &ROOT_KEYS, &mut issues);

    let name = issues
        .check(root.require("name").and_then(RawNode::as_str))
        .map(str::to_string);
    if let Some(name) = &name {
        if name.trim().is_empty() {
            issues.push(root.issue("'name' must not be empty"));
        }
    }

    let imports = read_imports(root, &mut issues);
    let environments = read_environments(root, &mut issues);
    let default_environment = optional_string(root, "default-environment", &mut issues);
    if let Some(default) = &default_environment {
        if !environments.contains_key(default) {
            issues.push(root.issue(format!(
                "default-environment '{}' is not a declared environment",
                default
            )));
        }
    }

    let scope = Scope {
        local_types: HashSet::new(),
        local_errors: HashSet::new(),
        imports: &imports,
    };
    let headers = read_headers(root, &scope, &mut issues);
    let error_discrimination = read_error_discrimination(root, &mut issues);

    let contents = RootApiFileSchema {
        name: name.unwrap_or_default(),
        display_name: optional_string(root, "display-name", &mut issues),
        version: optional_string(root, "version", &mut issues),
        docs: optional_string(root, "docs", &mut issues),
        auth: optional_string(root, "auth", &mut issues),
        imports,
        default_environment,
        environments,
        headers,
        error_discrimination,
    };

    match issues.into_diagnostic(&doc.file) {
        Some(diag) => Err(diag),
        None => Ok(RootApiFile {
            file: doc.file.clone(),
            contents,
        }),
    }
}

fn read_environments(root: &RawNode, issues: &mut IssueCollector) -> IndexMap<String, Environment> {
    let mut out = IndexMap::new();
    let Some(map) = root.get("environments").and_then(|n| issues.check(n.as_mapping())) else {
        return out;
    };

    for (name, node) in map {
        let env = match node.as_str() {
            Ok(url) => Some(Environment {
                url: url.to_string(),
                docs: None,
            }),
            Err(_) => issues.check(node.as_mapping()).and_then(|_| {
                reject_unknown_keys(node, &["url", "docs"], issues);
                let url = issues.check(node.require("url").and_then(RawNode::as_str))?;
                Some(Environment {
                    url: url.to_string(),
                    docs: optional_string(node, "docs", issues),
                })
            }),
        };
        if let Some(env) = env {
            if let Err(e) = Url::parse(&env.url) {
                issues.push(node.issue(format!("invalid environment URL '{}': {}", env.url, e)));
                continue;
            }
            out.insert(name.clone(), env);
        }
    }
    out
}

fn read_headers(
    root: &RawNode,
    scope: &Scope<'_>,
    issues: &mut IssueCollector,
) -> IndexMap<String, HeaderDeclaration> {
    let mut out = IndexMap::new();
    let Some(map) = root.get("headers").and_then(|n| issues.check(n.as_mapping())) else {
        return out;
    };

    for (header, node) in map {
        let (type_node, name, docs) = match node.as_str() {
            Ok(_) => (node, None, None),
            Err(_) => {
                if issues.check(node.as_mapping()).is_none() {
                    continue;
                }
                reject_unknown_keys(node, &["type", "name", "docs"], issues);
                let Some(type_node) = issues.check(node.require("type")) else {
                    continue;
                };
                (
                    type_node,
                    optional_string(node, "name", issues),
                    optional_string(node, "docs", issues),
                )
            }
        };

        let Some(raw) = issues.check(type_node.as_str()) else {
            continue;
        };
        match parse_type_reference(raw) {
            Ok(type_reference) => {
                issues.extend(scope.check_type(&type_reference, type_node.breadcrumb()));
                out.insert(
                    header.clone(),
                    HeaderDeclaration {
                        type_reference,
                        name,
                        docs,
                    },
                );
            }
            Err(e) => issues.push(type_node.issue(format!("invalid type '{}': {}", raw, e))),
        }
    }
    out
}

fn read_error_discrimination(
    root: &RawNode,
    issues: &mut IssueCollector,
) -> Option<ErrorDiscrimination> {
    let node = root.get("error-discrimination")?;
    issues.check(node.as_mapping())?;
    reject_unknown_keys(node, &["strategy", "property-name"], issues);

    let strategy = issues.check(node.require("strategy").and_then(RawNode::as_str))?;
    match strategy {
        "status-code" => Some(ErrorDiscrimination::StatusCode),
        "property" => {
            let property_name =
                issues.check(node.require("property-name").and_then(RawNode::as_str))?;
            Some(ErrorDiscrimination::Property {
                property_name: property_name.to_string(),
            })
        }
        other => {
            issues.push(node.issue(format!(
                "unknown strategy '{}' (expected 'status-code' or 'property')",
                other
            )));
            None
        }
    }
}
