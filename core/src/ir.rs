#![deny(missing_docs)]

//! # Definition IR
//!
//! Typed artifacts produced by structural validation: the root API file, named
//! definition files and package marker declarations, plus the type reference
//! grammar they share. Code generators and documentation tooling consume these
//! through [`FernDefinition`](crate::workspace::FernDefinition).

use crate::paths::RelativeFilePath;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `long`
    Long,
    /// `double`
    Double,
    /// `boolean`
    Boolean,
    /// `datetime`
    DateTime,
    /// `date`
    Date,
    /// `uuid`
    Uuid,
    /// `base64`
    Base64,
    /// `unknown`
    Unknown,
}

impl PrimitiveType {
    /// All primitives with their keyword.
    pub const ALL: [(&'static str, PrimitiveType); 10] = [
        ("string", PrimitiveType::String),
        ("integer", PrimitiveType::Integer),
        ("long", PrimitiveType::Long),
        ("double", PrimitiveType::Double),
        ("boolean", PrimitiveType::Boolean),
        ("datetime", PrimitiveType::DateTime),
        ("date", PrimitiveType::Date),
        ("uuid", PrimitiveType::Uuid),
        ("base64", PrimitiveType::Base64),
        ("unknown", PrimitiveType::Unknown),
    ];

    /// Looks up a primitive by keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(kw, _)| *kw == keyword)
            .map(|(_, p)| *p)
    }

    /// The keyword for this primitive.
    pub fn keyword(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, p)| *p == self)
            .map(|(kw, _)| *kw)
            .unwrap_or("unknown")
    }
}

/// A reference to a declared type or error, optionally through an import alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclaredName {
    /// Import alias (`users` in `users.User`), or `None` for a local declaration.
    pub import_alias: Option<String>,
    /// Declared name.
    pub name: String,
}

impl fmt::Display for DeclaredName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.import_alias {
            Some(alias) => write!(f, "{}.{}", alias, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl Serialize for DeclaredName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A parsed type reference such as `map<string, list<users.User>>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeReference {
    /// A built-in scalar.
    Primitive(PrimitiveType),
    /// `list<T>`
    List(Box<TypeReference>),
    /// `set<T>`
    Set(Box<TypeReference>),
    /// `optional<T>`
    Optional(Box<TypeReference>),
    /// `map<K, V>`
    Map {
        /// Key type.
        key: Box<TypeReference>,
        /// Value type.
        value: Box<TypeReference>,
    },
    /// `literal<"value">`
    Literal(String),
    /// A declared type, local or imported.
    Named(DeclaredName),
}

impl TypeReference {
    /// Visits every named reference inside this type, depth first.
    pub fn named_references(&self) -> Vec<&DeclaredName> {
        let mut out = Vec::new();
        self.collect_named(&mut out);
        out
    }

    fn collect_named<'a>(&'a self, out: &mut Vec<&'a DeclaredName>) {
        match self {
            TypeReference::Primitive(_) | TypeReference::Literal(_) => {}
            TypeReference::List(inner)
            | TypeReference::Set(inner)
            | TypeReference::Optional(inner) => inner.collect_named(out),
            TypeReference::Map { key, value } => {
                key.collect_named(out);
                value.collect_named(out);
            }
            TypeReference::Named(name) => out.push(name),
        }
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeReference::Primitive(p) => write!(f, "{}", p.keyword()),
            TypeReference::List(inner) => write!(f, "list<{}>", inner),
            TypeReference::Set(inner) => write!(f, "set<{}>", inner),
            TypeReference::Optional(inner) => write!(f, "optional<{}>", inner),
            TypeReference::Map { key, value } => write!(f, "map<{}, {}>", key, value),
            TypeReference::Literal(value) => write!(f, "literal<\"{}\">", value),
            TypeReference::Named(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for TypeReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An environment declared in the root API file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Base URL.
    pub url: String,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

/// A global header declared in the root API file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderDeclaration {
    /// Header type.
    #[serde(rename = "type")]
    pub type_reference: TypeReference,
    /// Name used in generated code, when different from the wire name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

/// How error responses are told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum ErrorDiscrimination {
    /// By HTTP status code.
    StatusCode,
    /// By a property of the response body.
    #[serde(rename_all = "camelCase")]
    Property {
        /// Name of the discriminating property.
        property_name: String,
    },
}

/// Contents of the root API file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootApiFileSchema {
    /// API name.
    pub name: String,
    /// Human readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// API version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Import alias to import path.
    pub imports: IndexMap<String, String>,
    /// Authentication scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    /// Default environment name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_environment: Option<String>,
    /// Declared environments.
    pub environments: IndexMap<String, Environment>,
    /// Global headers.
    pub headers: IndexMap<String, HeaderDeclaration>,
    /// Error discrimination strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_discrimination: Option<ErrorDiscrimination>,
}

/// The validated root API file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootApiFile {
    /// Identifier of the file.
    pub file: RelativeFilePath,
    /// Validated contents.
    pub contents: RootApiFileSchema,
}

/// An object property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDeclaration {
    /// Property type.
    #[serde(rename = "type")]
    pub type_reference: TypeReference,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

/// One enum member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue {
    /// Wire value.
    pub value: String,
    /// Name used in generated code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The shape of a type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeShape {
    /// Another name for an existing type.
    Alias {
        /// Aliased type.
        #[serde(rename = "type")]
        type_reference: TypeReference,
    },
    /// A record type.
    Object {
        /// Extended object types.
        extends: Vec<TypeReference>,
        /// Properties in declaration order.
        properties: IndexMap<String, PropertyDeclaration>,
    },
    /// A string enumeration.
    Enum {
        /// Members in declaration order.
        values: Vec<EnumValue>,
    },
    /// A discriminated union.
    Union {
        /// Discriminant value to member type.
        members: IndexMap<String, TypeReference>,
    },
}

/// A named type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDeclaration {
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Shape.
    pub shape: TypeShape,
}

/// A named error declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDeclaration {
    /// HTTP status code.
    pub status_code: u16,
    /// Body type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_reference: Option<TypeReference>,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

/// HTTP methods accepted on endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Parses an upper-case method name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// An endpoint within a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDeclaration {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the service base path.
    pub path: String,
    /// Path parameter name to type.
    pub path_parameters: IndexMap<String, TypeReference>,
    /// Request body type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<TypeReference>,
    /// Response body type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<TypeReference>,
    /// Errors the endpoint may return.
    pub errors: Vec<DeclaredName>,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

/// A service declared in a definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeclaration {
    /// Whether endpoints require auth.
    pub auth: bool,
    /// Path prefix for every endpoint.
    pub base_path: String,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Endpoints in declaration order.
    pub endpoints: IndexMap<String, EndpointDeclaration>,
}

/// Contents of a named definition file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionFileSchema {
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Import alias to import path.
    pub imports: IndexMap<String, String>,
    /// Types in declaration order.
    pub types: IndexMap<String, TypeDeclaration>,
    /// Errors in declaration order.
    pub errors: IndexMap<String, ErrorDeclaration>,
    /// Service, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceDeclaration>,
}

/// A validated named definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedDefinitionFile {
    /// Identifier of the file.
    pub file: RelativeFilePath,
    /// Validated contents.
    pub contents: DefinitionFileSchema,
}

/// A package marker as declared in one directory, before inheritance.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMarkerDeclaration {
    /// Identifier of the marker file.
    pub file: RelativeFilePath,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Human readable package name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Scalar defaults inherited by nested packages.
    pub defaults: IndexMap<String, serde_json::Value>,
    /// Dependencies re-exported by this package.
    pub export: Vec<String>,
    /// Ordering of definition files in this directory.
    pub navigation: Vec<String>,
}
