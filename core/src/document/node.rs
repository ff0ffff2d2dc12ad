#![deny(missing_docs)]

//! # Raw Document Nodes
//!
//! A language-agnostic value tree built from parsed YAML. Every node remembers the
//! breadcrumb (e.g. `types.User.properties[0]`) that leads to it, so projection
//! failures can say exactly where a file has the wrong shape.
//!
//! Projections never coerce: a number is not a string, a string is not a list.

use crate::paths::RelativeFilePath;
use indexmap::IndexMap;
use std::fmt;

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `~`, `null` or an absent value.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// Any YAML number.
    Number(serde_yaml::Number),
    /// A string.
    String(String),
}

/// The shape of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// A leaf.
    Scalar(Scalar),
    /// An ordered list of nodes.
    Sequence(Vec<RawNode>),
    /// String keys in file order.
    Mapping(IndexMap<String, RawNode>),
}

/// A value plus the breadcrumb that locates it in its document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    breadcrumb: String,
    value: NodeValue,
}

/// A shape problem found at one location of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralIssue {
    /// Where the problem is (empty for the document root).
    pub breadcrumb: String,
    /// What is wrong.
    pub message: String,
}

impl StructuralIssue {
    /// Creates an issue at `breadcrumb`.
    pub fn new(breadcrumb: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            breadcrumb: breadcrumb.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.breadcrumb.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.breadcrumb, self.message)
        }
    }
}

/// A parsed file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Identifier of the source file.
    pub file: RelativeFilePath,
    /// Root node.
    pub root: RawNode,
}

fn child_crumb(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn mapping_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

impl RawNode {
    /// Builds a node tree from a YAML value.
    pub fn from_yaml(value: serde_yaml::Value, breadcrumb: String) -> Self {
        let value = match value {
            serde_yaml::Value::Null => NodeValue::Scalar(Scalar::Null),
            serde_yaml::Value::Bool(b) => NodeValue::Scalar(Scalar::Bool(b)),
            serde_yaml::Value::Number(n) => NodeValue::Scalar(Scalar::Number(n)),
            serde_yaml::Value::String(s) => NodeValue::Scalar(Scalar::String(s)),
            serde_yaml::Value::Sequence(items) => NodeValue::Sequence(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| Self::from_yaml(item, format!("{}[{}]", breadcrumb, i)))
                    .collect(),
            ),
            serde_yaml::Value::Mapping(map) => NodeValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| {
                        let key = mapping_key(k);
                        let crumb = child_crumb(&breadcrumb, &key);
                        (key, Self::from_yaml(v, crumb))
                    })
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => return Self::from_yaml(tagged.value, breadcrumb),
        };
        Self { breadcrumb, value }
    }

    /// Where this node sits in its document.
    pub fn breadcrumb(&self) -> &str {
        &self.breadcrumb
    }

    /// The node's value.
    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// A short name for the node's kind, used in messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.value {
            NodeValue::Scalar(Scalar::Null) => "null",
            NodeValue::Scalar(Scalar::Bool(_)) => "boolean",
            NodeValue::Scalar(Scalar::Number(_)) => "number",
            NodeValue::Scalar(Scalar::String(_)) => "string",
            NodeValue::Sequence(_) => "list",
            NodeValue::Mapping(_) => "mapping",
        }
    }

    /// Builds an issue located at this node.
    pub fn issue(&self, message: impl Into<String>) -> StructuralIssue {
        StructuralIssue::new(self.breadcrumb.clone(), message)
    }

    fn expected(&self, what: &str) -> StructuralIssue {
        self.issue(format!("expected {}, found {}", what, self.kind_name()))
    }

    /// True for null.
    pub fn is_null(&self) -> bool {
        matches!(self.value, NodeValue::Scalar(Scalar::Null))
    }

    /// Projects a string.
    pub fn as_str(&self) -> Result<&str, StructuralIssue> {
        match &self.value {
            NodeValue::Scalar(Scalar::String(s)) => Ok(s),
            _ => Err(self.expected("string")),
        }
    }

    /// Projects a boolean.
    pub fn as_bool(&self) -> Result<bool, StructuralIssue> {
        match &self.value {
            NodeValue::Scalar(Scalar::Bool(b)) => Ok(*b),
            _ => Err(self.expected("boolean")),
        }
    }

    /// Projects an integer in `u16` range.
    pub fn as_u16(&self) -> Result<u16, StructuralIssue> {
        match &self.value {
            NodeValue::Scalar(Scalar::Number(n)) => n
                .as_u64()
                .and_then(|v| u16::try_from(v).ok())
                .ok_or_else(|| self.issue(format!("expected an integer between 0 and 65535, found {}", n))),
            _ => Err(self.expected("integer")),
        }
    }

    /// Projects a mapping.
    pub fn as_mapping(&self) -> Result<&IndexMap<String, RawNode>, StructuralIssue> {
        match &self.value {
            NodeValue::Mapping(map) => Ok(map),
            _ => Err(self.expected("mapping")),
        }
    }

    /// Projects a sequence.
    pub fn as_sequence(&self) -> Result<&[RawNode], StructuralIssue> {
        match &self.value {
            NodeValue::Sequence(items) => Ok(items),
            _ => Err(self.expected("list")),
        }
    }

    /// Accepts either a single string or a list of strings.
    pub fn as_string_list(&self) -> Result<Vec<&str>, StructuralIssue> {
        match &self.value {
            NodeValue::Scalar(Scalar::String(s)) => Ok(vec![s.as_str()]),
            NodeValue::Sequence(items) => items.iter().map(RawNode::as_str).collect(),
            _ => Err(self.expected("string or list of strings")),
        }
    }

    /// Looks up a mapping key. Returns `None` when this node is not a mapping, when
    /// the key is absent, or when its value is null.
    pub fn get(&self, key: &str) -> Option<&RawNode> {
        match &self.value {
            NodeValue::Mapping(map) => map.get(key).filter(|node| !node.is_null()),
            _ => None,
        }
    }

    /// Looks up a required mapping key.
    pub fn require(&self, key: &str) -> Result<&RawNode, StructuralIssue> {
        self.get(key).ok_or_else(|| {
            self.issue(format!("missing required field '{}'", key))
        })
    }

    /// Converts the subtree into JSON, preserving mapping order.
    pub fn to_json(&self) -> serde_json::Value {
        match &self.value {
            NodeValue::Scalar(Scalar::Null) => serde_json::Value::Null,
            NodeValue::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
            NodeValue::Scalar(Scalar::Number(n)) => {
                serde_json::to_value(n).unwrap_or(serde_json::Value::Null)
            }
            NodeValue::Scalar(Scalar::String(s)) => serde_json::Value::String(s.clone()),
            NodeValue::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(RawNode::to_json).collect())
            }
            NodeValue::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}
