#![deny(missing_docs)]

//! # OpenAPI Validation
//!
//! Structural checks over an OpenAPI document. Unlike the declarative path,
//! nothing here stops at the first problem: every check appends to a list of
//! messages and the caller folds them into one failure.
//!
//! Checks performed:
//! - `openapi: 3.x` or `swagger: "2.0"` is declared.
//! - `info.title` and `info.version` are present.
//! - OAS 3 documents define at least one of `components`, `paths` or `webhooks`.
//! - Tag names are unique; tag parents resolve and are acyclic.
//! - Server URL variables are declared; variable enums are non-empty and contain the default.
//! - Every operation declares at least one response.
//! - OAS 3 `components` deserialize into the `utoipa` model.

use crate::openapi::normalization::normalize_components;
use crate::openapi::shims::{ShimOpenApi, ShimServer};
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

const OPERATION_METHODS: [&str; 9] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace", "query",
];

/// Runs every check, returning all problems found.
pub(crate) fn validate_openapi_document(openapi: &ShimOpenApi) -> Vec<String> {
    let mut problems = Vec::new();
    validate_openapi_root(openapi, &mut problems);
    validate_tags_unique(openapi, &mut problems);
    validate_tag_hierarchy(openapi, &mut problems);
    validate_servers(openapi, &mut problems);
    validate_operation_responses(openapi, &mut problems);
    validate_components_model(openapi, &mut problems);
    problems
}

fn validate_openapi_root(openapi: &ShimOpenApi, problems: &mut Vec<String>) {
    match (&openapi.openapi, &openapi.swagger) {
        (Some(version), _) if version.starts_with("3.") => {}
        (Some(version), _) => problems.push(format!(
            "Unsupported OpenAPI version '{}' (expected 3.x)",
            version
        )),
        (None, Some(version)) if version == "2.0" => {}
        (None, Some(version)) => problems.push(format!(
            "Unsupported Swagger version '{}' (expected 2.0)",
            version
        )),
        (None, None) => {
            problems.push("Document declares neither 'openapi' nor 'swagger' version".into())
        }
    }

    match &openapi.info {
        None => problems.push("OpenAPI document missing required 'info' object".into()),
        Some(info) => {
            if info.title.as_deref().map_or(true, str::is_empty) {
                problems.push("info: missing required field 'title'".into());
            }
            if info.version.as_deref().map_or(true, str::is_empty) {
                problems.push("info: missing required field 'version'".into());
            }
        }
    }

    let no_paths = openapi.paths.as_ref().map_or(true, |p| p.is_empty());
    if openapi.is_oas3() && openapi.components.is_none() && no_paths && openapi.webhooks.is_none()
    {
        problems.push(
            "OpenAPI document must define at least one of 'components', 'paths', or 'webhooks'"
                .into(),
        );
    }
    if !openapi.is_oas3() && openapi.swagger.is_some() && openapi.paths.is_none() {
        problems.push("Swagger document missing required 'paths' object".into());
    }
}

fn validate_tags_unique(openapi: &ShimOpenApi, problems: &mut Vec<String>) {
    let Some(tags) = &openapi.tags else {
        return;
    };

    let mut seen = HashSet::new();
    for tag in tags {
        if !seen.insert(tag.name.as_str()) {
            problems.push(format!("Duplicate tag name '{}' detected", tag.name));
        }
    }
}

fn validate_tag_hierarchy(openapi: &ShimOpenApi, problems: &mut Vec<String>) {
    let Some(tags) = &openapi.tags else {
        return;
    };

    let parents: HashMap<&str, Option<&str>> = tags
        .iter()
        .map(|tag| (tag.name.as_str(), tag.parent.as_deref()))
        .collect();

    for tag in tags {
        if let Some(parent) = &tag.parent {
            if !parents.contains_key(parent.as_str()) {
                problems.push(format!(
                    "Tag '{}' references missing parent tag '{}'",
                    tag.name, parent
                ));
            }
        }
    }

    let mut visiting = HashSet::new();
    let mut visited = HashSet::new();
    for tag in tags {
        if let Some(at) = find_tag_cycle(&tag.name, &parents, &mut visiting, &mut visited) {
            problems.push(format!("Tag hierarchy contains a cycle at '{}'", at));
            // Later tags on the same cycle are already marked visiting; start clean.
            visiting.clear();
        }
    }
}

/// Returns the tag at which a parent cycle closes, if any.
fn find_tag_cycle<'a>(
    tag: &'a str,
    parents: &HashMap<&'a str, Option<&'a str>>,
    visiting: &mut HashSet<&'a str>,
    visited: &mut HashSet<&'a str>,
) -> Option<&'a str> {
    if visited.contains(tag) {
        return None;
    }
    if !visiting.insert(tag) {
        return Some(tag);
    }

    if let Some(Some(parent)) = parents.get(tag) {
        if let Some(at) = find_tag_cycle(*parent, parents, visiting, visited) {
            visited.insert(tag);
            return Some(at);
        }
    }

    visiting.remove(tag);
    visited.insert(tag);
    None
}

fn placeholder_re() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{([^}]+)}").expect("Invalid regex constant"))
}

fn validate_servers(openapi: &ShimOpenApi, problems: &mut Vec<String>) {
    if let Some(servers) = &openapi.servers {
        validate_server_list(servers, "servers", problems);
    }

    let Some(paths) = &openapi.paths else {
        return;
    };
    for (path, item) in &paths.items {
        let Some(servers) = item.get("servers") else {
            continue;
        };
        match serde_json::from_value::<Vec<ShimServer>>(servers.clone()) {
            Ok(servers) => {
                validate_server_list(&servers, &format!("paths.{}.servers", path), problems)
            }
            Err(e) => problems.push(format!("paths.{}.servers: {}", path, e)),
        }
    }
}

fn validate_server_list(servers: &[ShimServer], context: &str, problems: &mut Vec<String>) {
    for (idx, server) in servers.iter().enumerate() {
        let context = format!("{}[{}]", context, idx);
        let placeholders: Vec<&str> = placeholder_re()
            .captures_iter(&server.url)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
            .collect();

        for name in &placeholders {
            let declared = server
                .variables
                .as_ref()
                .is_some_and(|vars| vars.contains_key(*name));
            if !declared {
                problems.push(format!(
                    "Server URL '{}' in {} references undefined variable '{}'",
                    server.url, context, name
                ));
            }
        }

        for (name, var) in server.variables.iter().flatten() {
            if let Some(enum_vals) = &var.enum_values {
                if enum_vals.is_empty() {
                    problems.push(format!(
                        "Server variable '{}' in {} has an empty enum",
                        name, context
                    ));
                } else if !enum_vals.contains(&var.default) {
                    problems.push(format!(
                        "Server variable '{}' in {} has default '{}' not in enum",
                        name, context, var.default
                    ));
                }
            }
        }
    }
}

fn validate_operation_responses(openapi: &ShimOpenApi, problems: &mut Vec<String>) {
    let Some(paths) = &openapi.paths else {
        return;
    };
    for (path, item) in &paths.items {
        for method in OPERATION_METHODS {
            let Some(operation) = item.get(method) else {
                continue;
            };
            let has_responses = operation
                .get("responses")
                .and_then(Value::as_object)
                .is_some_and(|r| r.keys().any(|k| !k.starts_with("x-")));
            if !has_responses {
                problems.push(format!(
                    "paths.{}.{}: operation must declare at least one response",
                    path, method
                ));
            }
        }
    }
}

fn validate_components_model(openapi: &ShimOpenApi, problems: &mut Vec<String>) {
    if !openapi.is_oas3() {
        return;
    }
    let Some(components) = &openapi.components else {
        return;
    };
    let mut components = components.clone();
    normalize_components(&mut components);
    if let Err(e) = serde_json::from_value::<utoipa::openapi::Components>(components) {
        problems.push(format!("components: Failed to parse OpenAPI components: {}", e));
    }
}
