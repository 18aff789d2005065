//! Distinguished-name derivation.
//!
//! Every DN the engine touches is produced here, from the configured base DN
//! and an identifier. Nothing else concatenates DN strings.

use dirsync_connector_ldap::escape_dn_value;
use serde::{Deserialize, Serialize};

/// Organizational containers managed under the base DN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    Users,
    Groups,
}

impl Container {
    /// The `ou` value of the container.
    pub fn name(self) -> &'static str {
        match self {
            Container::Users => "users",
            Container::Groups => "groups",
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Layout of the managed subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTree {
    base_dn: String,
}

impl DirectoryTree {
    pub fn new(base_dn: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
        }
    }

    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// `ou=<name>,<base>`
    pub fn container_dn(&self, container: Container) -> String {
        format!("ou={},{}", container.name(), self.base_dn)
    }

    /// `uid=<uid>,ou=users,<base>`
    pub fn user_dn(&self, uid: &str) -> String {
        format!(
            "uid={},{}",
            escape_dn_value(uid),
            self.container_dn(Container::Users)
        )
    }

    /// `cn=<identifier>,ou=groups,<base>`
    pub fn group_dn(&self, identifier: &str) -> String {
        format!(
            "cn={},{}",
            escape_dn_value(identifier),
            self.container_dn(Container::Groups)
        )
    }
}
