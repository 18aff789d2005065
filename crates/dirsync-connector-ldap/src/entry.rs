//! Directory entry and request types shared by every client implementation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A directory entry: a DN plus multi-valued string attributes.
///
/// Attribute names are matched case-insensitively, as LDAP does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// Create an entry with no attributes.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute using builder pattern.
    pub fn with<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(name, values);
        self
    }

    /// Set (replace) an attribute's values.
    pub fn set<I, S>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let values = values.into_iter().map(Into::into).collect();
        let existing = self
            .attributes
            .keys()
            .find(|k| k.eq_ignore_ascii_case(&name))
            .cloned();
        self.attributes.insert(existing.unwrap_or(name), values);
    }

    /// Get all values of an attribute, if present.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// All values of an attribute, empty when absent.
    pub fn values(&self, name: &str) -> &[String] {
        self.get(name).unwrap_or(&[])
    }

    /// First value of an attribute.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Whether the attribute is present (even with no values).
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Mutable access to an attribute's values.
    pub fn values_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        self.attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Iterate over attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// The base entry only.
    Base,
    /// Direct children of the base.
    OneLevel,
    /// The base and its whole subtree.
    Subtree,
}

/// Kind of single-attribute modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifyOp {
    /// Add a value to the attribute.
    Add,
    /// Delete a value from the attribute.
    Delete,
}

impl std::fmt::Display for ModifyOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModifyOp::Add => write!(f, "add"),
            ModifyOp::Delete => write!(f, "delete"),
        }
    }
}
