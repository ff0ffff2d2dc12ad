#![deny(missing_docs)]

//! # Type Reference Parsing
//!
//! Parses reference strings such as `optional<map<string, users.User>>` and checks
//! the names they mention against the declaring file's scope.

use crate::document::StructuralIssue;
use crate::ir::{DeclaredName, PrimitiveType, TypeReference};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_]*$";

/// True when `name` is a valid declaration or alias identifier.
pub(crate) fn is_identifier(name: &str) -> bool {
    static IDENT_RE: OnceLock<Regex> = OnceLock::new();
    IDENT_RE
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("Invalid regex constant"))
        .is_match(name)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, ch: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), String> {
        if self.eat(ch) {
            Ok(())
        } else {
            Err(format!("expected '{}' at offset {}", ch, self.pos))
        }
    }

    fn word(&mut self) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn parse(&mut self) -> Result<TypeReference, String> {
        let word = self.word();
        if word.is_empty() {
            return Err(format!("expected a type at offset {}", self.pos));
        }

        if self.eat('<') {
            let ty = match word {
                "list" => TypeReference::List(Box::new(self.parse()?)),
                "set" => TypeReference::Set(Box::new(self.parse()?)),
                "optional" => TypeReference::Optional(Box::new(self.parse()?)),
                "map" => {
                    let key = self.parse()?;
                    self.expect(',')?;
                    let value = self.parse()?;
                    TypeReference::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                    }
                }
                "literal" => {
                    self.expect('"')?;
                    let rest = self.rest();
                    let end = rest
                        .find('"')
                        .ok_or_else(|| "unterminated literal".to_string())?;
                    let value = rest[..end].to_string();
                    self.pos += end + 1;
                    if !self.rest().trim_start().starts_with('>') {
                        return Err("literal values cannot contain '\"'".to_string());
                    }
                    TypeReference::Literal(value)
                }
                other => return Err(format!("unknown container type '{}'", other)),
            };
            self.expect('>')?;
            return Ok(ty);
        }

        if let Some(primitive) = PrimitiveType::from_keyword(word) {
            return Ok(TypeReference::Primitive(primitive));
        }

        let declared = parse_declared_name(word)?;
        Ok(TypeReference::Named(declared))
    }
}

/// Parses `Name` or `alias.Name`.
pub(crate) fn parse_declared_name(raw: &str) -> Result<DeclaredName, String> {
    let mut parts = raw.split('.');
    let (alias, name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(name), None, None) => (None, name),
        (Some(alias), Some(name), None) => (Some(alias), name),
        _ => return Err(format!("'{}' has too many '.' segments", raw)),
    };

    if let Some(alias) = alias {
        if !is_identifier(alias) {
            return Err(format!("invalid import alias '{}'", alias));
        }
    }
    if !is_identifier(name) {
        return Err(format!("invalid type name '{}'", name));
    }

    Ok(DeclaredName {
        import_alias: alias.map(str::to_string),
        name: name.to_string(),
    })
}

/// Parses a type reference string.
pub fn parse_type_reference(raw: &str) -> Result<TypeReference, String> {
    let mut parser = Parser { src: raw, pos: 0 };
    let ty = parser.parse()?;
    parser.skip_ws();
    if !parser.rest().is_empty() {
        return Err(format!("unexpected '{}' after type", parser.rest()));
    }
    Ok(ty)
}

/// Names visible from one file: its own declarations and its import aliases.
pub(crate) struct Scope<'a> {
    pub local_types: HashSet<&'a str>,
    pub local_errors: HashSet<&'a str>,
    pub imports: &'a IndexMap<String, String>,
}

impl<'a> Scope<'a> {
    fn check_alias(&self, name: &DeclaredName, breadcrumb: &str) -> Option<StructuralIssue> {
        match &name.import_alias {
            Some(alias) if !self.imports.contains_key(alias) => Some(StructuralIssue::new(
                breadcrumb,
                format!("'{}' uses undeclared import '{}'", name, alias),
            )),
            _ => None,
        }
    }

    /// Checks every named reference inside `ty`.
    pub fn check_type(&self, ty: &TypeReference, breadcrumb: &str) -> Vec<StructuralIssue> {
        let mut issues = Vec::new();
        for name in ty.named_references() {
            if let Some(issue) = self.check_alias(name, breadcrumb) {
                issues.push(issue);
            } else if name.import_alias.is_none() && !self.local_types.contains(name.name.as_str()) {
                issues.push(StructuralIssue::new(
                    breadcrumb,
                    format!("unknown type '{}'", name.name),
                ));
            }
        }
        issues
    }

    /// Checks an error reference.
    pub fn check_error(&self, name: &DeclaredName, breadcrumb: &str) -> Option<StructuralIssue> {
        if let Some(issue) = self.check_alias(name, breadcrumb) {
            return Some(issue);
        }
        if name.import_alias.is_none() && !self.local_errors.contains(name.name.as_str()) {
            return Some(StructuralIssue::new(
                breadcrumb,
                format!("unknown error '{}'", name.name),
            ));
        }
        None
    }
}
