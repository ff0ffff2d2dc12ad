#![deny(missing_docs)]

//! # Named Definition Files
//!
//! Validates leaf schema files: imports, type declarations, error declarations and
//! an optional service with its endpoints. Type references are parsed and checked
//! against the file's own declarations and import aliases; whether an imported
//! name actually exists is checked later, once imports are resolved.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::document::{RawDocument, RawNode, StructuralIssue};
use crate::ir::{
    DefinitionFileSchema, EndpointDeclaration, EnumValue, ErrorDeclaration, HttpMethod,
    NamedDefinitionFile, PropertyDeclaration, ServiceDeclaration, TypeDeclaration, TypeReference,
    TypeShape,
};
use crate::validation::type_reference::{
    is_identifier, parse_declared_name, parse_type_reference, Scope,
};
use crate::validation::{optional_string, read_imports, reject_unknown_keys, IssueCollector};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const FILE_KEYS: [&str; 5] = ["docs", "imports", "types", "errors", "service"];
const TYPE_KEYS: [&str; 6] = ["docs", "type", "properties", "extends", "enum", "union"];
const SERVICE_KEYS: [&str; 4] = ["auth", "base-path", "docs", "endpoints"];
const ENDPOINT_KEYS: [&str; 7] = [
    "method",
    "path",
    "path-parameters",
    "request",
    "response",
    "errors",
    "docs",
];

/// Validates a named definition file. A file with no content is an empty definition.
pub fn validate_definition_file(doc: &RawDocument) -> Result<NamedDefinitionFile, Diagnostic> {
    let root = &doc.root;
    if root.is_null() {
        return Ok(NamedDefinitionFile {
            file: doc.file.clone(),
            contents: DefinitionFileSchema::default(),
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
    reject_unknown_keys(root, &FILE_KEYS, &mut issues);

    let imports = read_imports(root, &mut issues);
    let types_node = root.get("types").and_then(|n| issues.check(n.as_mapping()));
    let errors_node = root.get("errors").and_then(|n| issues.check(n.as_mapping()));

    let scope = Scope {
        local_types: types_node
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default(),
        local_errors: errors_node
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default(),
        imports: &imports,
    };

    let mut types = IndexMap::new();
    for (name, node) in types_node.into_iter().flatten() {
        if !is_identifier(name) {
            issues.push(node.issue(format!("invalid type name '{}'", name)));
            continue;
        }
        if let Some(decl) = read_type_declaration(node, &scope, &mut issues) {
            types.insert(name.clone(), decl);
        }
    }

    let mut errors = IndexMap::new();
    for (name, node) in errors_node.into_iter().flatten() {
        if !is_identifier(name) {
            issues.push(node.issue(format!("invalid error name '{}'", name)));
            continue;
        }
        if let Some(decl) = read_error_declaration(node, &scope, &mut issues) {
            errors.insert(name.clone(), decl);
        }
    }

    let service = root
        .get("service")
        .and_then(|node| read_service(node, &scope, &mut issues));

    let contents = DefinitionFileSchema {
        docs: optional_string(root, "docs", &mut issues),
        imports,
        types,
        errors,
        service,
    };

    match issues.into_diagnostic(&doc.file) {
        Some(diag) => Err(diag),
        None => Ok(NamedDefinitionFile {
            file: doc.file.clone(),
            contents,
        }),
    }
}

/// Parses a type reference held by `node` and checks it against `scope`.
fn read_type_reference(
    node: &RawNode,
    scope: &Scope<'_>,
    issues: &mut IssueCollector,
) -> Option<TypeReference> {
    let raw = issues.check(node.as_str())?;
    match parse_type_reference(raw) {
        Ok(ty) => {
            issues.extend(scope.check_type(&ty, node.breadcrumb()));
            Some(ty)
        }
        Err(e) => {
            issues.push(node.issue(format!("invalid type '{}': {}", raw, e)));
            None
        }
    }
}

/// Accepts `Type` or `{ <key>: Type, docs?: ... }`.
fn read_documented_reference(
    node: &RawNode,
    key: &str,
    scope: &Scope<'_>,
    issues: &mut IssueCollector,
) -> Option<(TypeReference, Option<String>)> {
    if node.as_str().is_ok() {
        return read_type_reference(node, scope, issues).map(|ty| (ty, None));
    }
    issues.check(node.as_mapping())?;
    reject_unknown_keys(node, &[key, "docs"], issues);
    let docs = optional_string(node, "docs", issues);
    let type_node = issues.check(node.require(key))?;
    read_type_reference(type_node, scope, issues).map(|ty| (ty, docs))
}

fn read_type_declaration(
    node: &RawNode,
    scope: &Scope<'_>,
    issues: &mut IssueCollector,
) -> Option<TypeDeclaration> {
    if node.as_str().is_ok() {
        let type_reference = read_type_reference(node, scope, issues)?;
        return Some(TypeDeclaration {
            docs: None,
            shape: TypeShape::Alias { type_reference },
        });
    }

    issues.check(node.as_mapping())?;
    reject_unknown_keys(node, &TYPE_KEYS, issues);
    let docs = optional_string(node, "docs", issues);

    let declared: Vec<&str> = ["type", "properties", "enum", "union"]
        .into_iter()
        .filter(|key| node.get(key).is_some())
        .collect();
    let has_extends = node.get("extends").is_some();
    if declared.len() > 1 {
        issues.push(node.issue(format!(
            "a type declares exactly one of type, properties, enum or union (found {})",
            declared.join(", ")
        )));
        return None;
    }

    let shape = match (declared.first().copied(), has_extends) {
        (Some("type" | "enum" | "union"), true) => {
            issues.push(node.issue("'extends' is only allowed on object types"));
            return None;
        }
        (Some("type"), _) => {
            let type_reference = read_type_reference(node.get("type")?, scope, issues)?;
            TypeShape::Alias { type_reference }
        }
        (Some("enum"), _) => TypeShape::Enum {
            values: read_enum_values(node.get("enum")?, issues)?,
        },
        (Some("union"), _) => TypeShape::Union {
            members: read_union_members(node.get("union")?, scope, issues)?,
        },
        (Some(_), _) | (None, true) => read_object(node, scope, issues)?,
        (None, false) => {
            issues.push(node.issue(
                "a type must declare one of type, properties, enum, union or extends",
            ));
            return None;
        }
    };

    Some(TypeDeclaration { docs, shape })
}

fn read_object(
    node: &RawNode,
    scope: &Scope<'_>,
    issues: &mut IssueCollector,
) -> Option<TypeShape> {
    let mut extends = Vec::new();
    if let Some(extends_node) = node.get("extends") {
        let entries: Vec<&RawNode> = match extends_node.as_sequence() {
            Ok(items) => items.iter().collect(),
            Err(_) => vec![extends_node],
        };
        for entry in entries {
            if let Some(ty) = read_type_reference(entry, scope, issues) {
                if matches!(ty, TypeReference::Named(_)) {
                    extends.push(ty);
                } else {
                    issues.push(entry.issue(format!("cannot extend non-object type '{}'", ty)));
                }
            }
        }
    }

    let mut properties = IndexMap::new();
    if let Some(props) = node.get("properties").and_then(|n| issues.check(n.as_mapping())) {
        for (name, prop) in props {
            if let Some((type_reference, docs)) =
                read_documented_reference(prop, "type", scope, issues)
            {
                properties.insert(
                    name.clone(),
                    PropertyDeclaration {
                        type_reference,
                        docs,
                    },
                );
            }
        }
    }

    Some(TypeShape::Object {
        extends,
        properties,
    })
}

fn read_enum_values(node: &RawNode, issues: &mut IssueCollector) -> Option<Vec<EnumValue>> {
    let items = issues.check(node.as_sequence())?;
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for item in items {
        let value = match item.as_str() {
            Ok(value) => EnumValue {
                value: value.to_string(),
                name: None,
            },
            Err(_) => {
                if issues.check(item.as_mapping()).is_none() {
                    continue;
                }
                reject_unknown_keys(item, &["value", "name"], issues);
                let Some(value) = issues.check(item.require("value").and_then(RawNode::as_str))
                else {
                    continue;
                };
                EnumValue {
                    value: value.to_string(),
                    name: optional_string(item, "name", issues),
                }
            }
        };
        if !seen.insert(value.value.clone()) {
            issues.push(item.issue(format!("duplicate enum value '{}'", value.value)));
            continue;
        }
        values.push(value);
    }
    if items.is_empty() {
        issues.push(node.issue("an enum needs at least one value"));
    }
    Some(values)
}

fn read_union_members(
    node: &RawNode,
    scope: &Scope<'_>,
    issues: &mut IssueCollector,
) -> Option<IndexMap<String, TypeReference>> {
    let map = issues.check(node.as_mapping())?;
    let mut members = IndexMap::new();
    for (discriminant, member) in map {
        if let Some((ty, _docs)) = read_documented_reference(member, "type", scope, issues) {
            members.insert(discriminant.clone(), ty);
        }
    }
    if map.is_empty() {
        issues.push(node.issue("a union needs at least one member"));
    }
    Some(members)
}

fn read_error_declaration(
    node: &RawNode,
    scope: &Scope<'_>,
    issues: &mut IssueCollector,
) -> Option<ErrorDeclaration> {
    issues.check(node.as_mapping())?;
    reject_unknown_keys(node, &["status-code", "type", "docs"], issues);
    let status_code = issues.check(node.require("status-code").and_then(RawNode::as_u16))?;
    if !(400..600).contains(&status_code) {
        issues.push(node.issue(format!(
            "status-code {} is not an error status (expected 400-599)",
            status_code
        )));
    }
    let type_reference = match node.get("type") {
        Some(ty) => Some(read_type_reference(ty, scope, issues)?),
        None => None,
    };
    Some(ErrorDeclaration {
        status_code,
        type_reference,
        docs: optional_string(node, "docs", issues),
    })
}

fn path_placeholders(path: &str) -> Vec<String> {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE
        .get_or_init(|| Regex::new(r"\{([^}]+)}").expect("Invalid regex constant"))
        .captures_iter(path)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn check_path(node: &RawNode, path: &str) -> Result<(), StructuralIssue> {
    if path.is_empty() || path.starts_with('/') {
        Ok(())
    } else {
        Err(node.issue(format!("path '{}' must be empty or start with '/'", path)))
    }
}

fn read_service(
    node: &RawNode,
    scope: &Scope<'_>,
    issues: &mut IssueCollector,
) -> Option<ServiceDeclaration> {
    issues.check(node.as_mapping())?;
    reject_unknown_keys(node, &SERVICE_KEYS, issues);

    let auth = issues.check(node.require("auth").and_then(RawNode::as_bool));
    let base_path_node = issues.check(node.require("base-path"));
    let base_path = base_path_node.and_then(|n| issues.check(n.as_str()));
    if let (Some(n), Some(path)) = (base_path_node, base_path) {
        issues.check(check_path(n, path));
    }
    let endpoints_node = issues.check(node.require("endpoints").and_then(RawNode::as_mapping));

    let mut endpoints = IndexMap::new();
    for (name, endpoint) in endpoints_node.into_iter().flatten() {
        if let Some(decl) = read_endpoint(endpoint, scope, issues) {
            endpoints.insert(name.clone(), decl);
        }
    }

    Some(ServiceDeclaration {
        auth: auth?,
        base_path: base_path?.to_string(),
        docs: optional_string(node, "docs", issues),
        endpoints,
    })
}

fn read_endpoint(
    node: &RawNode,
    scope: &Scope<'_>,
    issues: &mut IssueCollector,
) -> Option<EndpointDeclaration> {
    issues.check(node.as_mapping())?;
    reject_unknown_keys(node, &ENDPOINT_KEYS, issues);

    let method_node = issues.check(node.require("method"));
    let method = method_node.and_then(|n| {
        let raw = issues.check(n.as_str())?;
        let parsed = HttpMethod::parse(raw);
        if parsed.is_none() {
            issues.push(n.issue(format!(
                "unknown method '{}' (expected GET, POST, PUT, PATCH or DELETE)",
                raw
            )));
        }
        parsed
    });

    let path_node = issues.check(node.require("path"));
    let path = path_node.and_then(|n| issues.check(n.as_str()));
    if let (Some(n), Some(p)) = (path_node, path) {
        issues.check(check_path(n, p));
    }

    let params_node = node
        .get("path-parameters")
        .and_then(|n| issues.check(n.as_mapping()));
    let declared_params: Vec<&String> = params_node.into_iter().flat_map(|m| m.keys()).collect();
    let mut path_parameters = IndexMap::new();
    for (name, param) in params_node.into_iter().flatten() {
        if let Some((ty, _docs)) = read_documented_reference(param, "type", scope, issues) {
            path_parameters.insert(name.clone(), ty);
        }
    }

    if let Some(path) = path {
        let placeholders = path_placeholders(path);
        for placeholder in &placeholders {
            if !declared_params.contains(&placeholder) {
                issues.push(node.issue(format!(
                    "path parameter '{}' is not declared in path-parameters",
                    placeholder
                )));
            }
        }
        for declared in declared_params {
            if !placeholders.contains(declared) {
                issues.push(node.issue(format!(
                    "path parameter '{}' does not appear in path '{}'",
                    declared, path
                )));
            }
        }
    }

    let request = match node.get("request") {
        Some(req) => Some(read_documented_reference(req, "body", scope, issues)?.0),
        None => None,
    };
    let response = match node.get("response") {
        Some(resp) => Some(read_documented_reference(resp, "type", scope, issues)?.0),
        None => None,
    };

    let mut errors = Vec::new();
    if let Some(list) = node.get("errors").and_then(|n| issues.check(n.as_sequence())) {
        for item in list {
            let Some(raw) = issues.check(item.as_str()) else {
                continue;
            };
            match parse_declared_name(raw) {
                Ok(name) => {
                    if let Some(issue) = scope.check_error(&name, item.breadcrumb()) {
                        issues.push(issue);
                    } else {
                        errors.push(name);
                    }
                }
                Err(e) => issues.push(item.issue(e)),
            }
        }
    }

    Some(EndpointDeclaration {
        method: method?,
        path: path?.to_string(),
        path_parameters,
        request,
        response,
        errors,
        docs: optional_string(node, "docs", issues),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::ir::DeclaredName;
    use crate::paths::RelativeFilePath;

    fn validate(text: &str) -> Result<NamedDefinitionFile, Diagnostic> {
        let doc = parse_document(RelativeFilePath::parse("users.yml").unwrap(), text).unwrap();
        validate_definition_file(&doc)
    }

    const USERS: &str = r#"
docs: User management
imports:
  commons: ../commons.yml
types:
  UserId: string
  User:
    docs: A user
    extends: commons.Entity
    properties:
      id: UserId
      email:
        type: optional<string>
        docs: primary email
      tags: set<string>
  Role:
    enum:
      - ADMIN
      - value: read-only
        name: ReadOnly
  Principal:
    union:
      user: User
      service:
        type: commons.ServiceAccount
errors:
  UserNotFound:
    status-code: 404
    type: UserId
service:
  auth: true
  base-path: /users
  endpoints:
    get:
      method: GET
      path: /{userId}
      path-parameters:
        userId: UserId
      response: User
      errors:
        - UserNotFound
        - commons.Unauthorized
    create:
      method: POST
      path: ""
      request:
        body: User
      response: User
"#;

    #[test]
    fn test_full_definition_file() {
        let file = validate(USERS).unwrap();
        let contents = file.contents;

        let names: Vec<&str> = contents.types.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["UserId", "User", "Role", "Principal"]);

        match &contents.types["User"].shape {
            TypeShape::Object {
                extends,
                properties,
            } => {
                assert_eq!(extends[0].to_string(), "commons.Entity");
                assert_eq!(properties["email"].docs.as_deref(), Some("primary email"));
            }
            other => panic!("expected object, got {:?}", other),
        }
        match &contents.types["Role"].shape {
            TypeShape::Enum { values } => {
                assert_eq!(values[1].name.as_deref(), Some("ReadOnly"));
            }
            other => panic!("expected enum, got {:?}", other),
        }

        let service = contents.service.unwrap();
        assert_eq!(service.base_path, "/users");
        let get = &service.endpoints["get"];
        assert_eq!(get.method, HttpMethod::Get);
        assert_eq!(
            get.errors[1],
            DeclaredName {
                import_alias: Some("commons".into()),
                name: "Unauthorized".into()
            }
        );
        assert_eq!(service.endpoints["create"].request.as_ref().unwrap().to_string(), "User");
    }

    #[test]
    fn test_empty_file_is_valid() {
        let file = validate("").unwrap();
        assert!(file.contents.types.is_empty());
    }

    #[test]
    fn test_reference_errors_are_collected() {
        let diag = validate(
            r#"
types:
  A: list<Missing>
  B:
    properties:
      x: other.Thing
  C:
    type: string
    enum: [a]
"#,
        )
        .unwrap_err();
        let lines: Vec<&str> = diag.message.lines().collect();
        assert_eq!(lines.len(), 3, "{:?}", lines);
        assert_eq!(lines[0], "types.A: unknown type 'Missing'");
        assert!(lines[1].starts_with("types.B.properties.x:"));
        assert!(lines[2].contains("exactly one of"));
    }

    #[test]
    fn test_endpoint_checks() {
        let diag = validate(
            r#"
service:
  auth: false
  base-path: users
  endpoints:
    get:
      method: FETCH
      path: /{id}/{other}
      path-parameters:
        id: string
        unused: string
      errors: [NotDeclared]
"#,
        )
        .unwrap_err();
        let msg = diag.message;
        assert!(msg.contains("path 'users' must be empty or start with '/'"));
        assert!(msg.contains("unknown method 'FETCH'"));
        assert!(msg.contains("path parameter 'other' is not declared"));
        assert!(msg.contains("path parameter 'unused' does not appear"));
        assert!(msg.contains("unknown error 'NotDeclared'"));
    }

    #[test]
    fn test_error_status_range() {
        let diag = validate("errors:\n  Weird:\n    status-code: 200\n").unwrap_err();
        assert!(diag.message.contains("is not an error status"));
    }

    #[test]
    fn test_unknown_top_level_key() {
        let diag = validate("servce: {}\n").unwrap_err();
        assert!(diag.message.starts_with("servce: unknown field 'servce'"));
    }
}
