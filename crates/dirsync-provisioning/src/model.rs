//! User and group value objects.

use dirsync_connector_ldap::DirectoryEntry;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::naming::DirectoryTree;
use crate::normalize::{normalize_phone, normalize_text};

pub(crate) const USER_OBJECT_CLASSES: [&str; 4] =
    ["top", "person", "organizationalPerson", "inetOrgPerson"];
pub(crate) const GROUP_OBJECT_CLASSES: [&str; 2] = ["top", "groupOfNames"];

/// A directory user.
///
/// Fields are normalized on construction and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    uid: String,
    full_name: String,
    surname: String,
    phone: String,
}

impl User {
    /// Build a user from raw upstream values.
    ///
    /// Fails when the identifier or the full name is empty after
    /// normalization.
    pub fn new(uid: &str, full_name: &str, phone: &str) -> ModelResult<Self> {
        let normalized_uid = normalize_text(uid).trim().to_string();
        if normalized_uid.is_empty() {
            return Err(ModelError::empty("uid", uid));
        }

        let normalized_name = normalize_text(full_name).trim().to_string();
        if normalized_name.is_empty() {
            return Err(ModelError::empty("full name", full_name));
        }

        let surname = normalized_name
            .split_whitespace()
            .last()
            .unwrap_or(&normalized_name)
            .to_string();

        Ok(Self {
            uid: normalized_uid,
            full_name: normalized_name,
            surname,
            phone: normalize_phone(phone),
        })
    }

    /// Rebuild a user from a directory entry (`uid`, `cn`, `telephoneNumber`).
    pub fn from_entry(entry: &DirectoryEntry) -> ModelResult<Self> {
        Self::new(
            entry.first("uid").unwrap_or_default(),
            entry.first("cn").unwrap_or_default(),
            entry.first("telephoneNumber").unwrap_or_default(),
        )
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Last whitespace-separated token of the full name.
    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn dn(&self, tree: &DirectoryTree) -> String {
        tree.user_dn(&self.uid)
    }

    /// The entry written when the user is created.
    ///
    /// `telephoneNumber` is left out when the phone is empty.
    pub fn to_entry(&self, tree: &DirectoryTree) -> DirectoryEntry {
        let mut entry = DirectoryEntry::new(self.dn(tree))
            .with("objectClass", USER_OBJECT_CLASSES)
            .with("uid", [self.uid.as_str()])
            .with("cn", [self.full_name.as_str()])
            .with("sn", [self.surname.as_str()]);
        if !self.phone.is_empty() {
            entry.set("telephoneNumber", [self.phone.as_str()]);
        }
        entry
    }
}

/// A directory group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    identifier: String,
    description: String,
    members: Vec<String>,
}

impl Group {
    /// Build a group from raw upstream values.
    ///
    /// Fails when the identifier is empty after normalization.
    pub fn new(identifier: &str, description: &str) -> ModelResult<Self> {
        let normalized = normalize_text(identifier).trim().to_string();
        if normalized.is_empty() {
            return Err(ModelError::empty("group identifier", identifier));
        }

        Ok(Self {
            identifier: normalized,
            description: description.trim().to_string(),
            members: Vec::new(),
        })
    }

    /// Rebuild a group from a directory entry, members included.
    pub fn from_entry(entry: &DirectoryEntry) -> ModelResult<Self> {
        let mut group = Self::new(
            entry.first("cn").unwrap_or_default(),
            entry.first("description").unwrap_or_default(),
        )?;
        for member in entry.values("member") {
            if !member.trim().is_empty() {
                group.add_member(member.clone());
            }
        }
        Ok(group)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Member DNs in insertion order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Append a member DN. Duplicates are not rejected here.
    pub fn add_member(&mut self, dn: impl Into<String>) {
        self.members.push(dn.into());
    }

    /// Remove the first member matching `dn` (case-insensitive).
    ///
    /// Returns whether a member was removed.
    pub fn remove_member(&mut self, dn: &str) -> bool {
        match self.members.iter().position(|m| m.eq_ignore_ascii_case(dn)) {
            Some(index) => {
                self.members.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn dn(&self, tree: &DirectoryTree) -> String {
        tree.group_dn(&self.identifier)
    }

    /// The entry written when the group is created.
    ///
    /// Initial members are stored as a single comma-joined `member` value,
    /// empty when there are none. Later membership writes add one DN per
    /// value. An empty description is left out.
    pub fn to_entry(&self, tree: &DirectoryTree, initial_members: &[User]) -> DirectoryEntry {
        let member = initial_members
            .iter()
            .map(|u| u.dn(tree))
            .collect::<Vec<_>>()
            .join(",");

        let mut entry = DirectoryEntry::new(self.dn(tree))
            .with("objectClass", GROUP_OBJECT_CLASSES)
            .with("cn", [self.identifier.as_str()])
            .with("member", [member]);
        if !self.description.is_empty() {
            entry.set("description", [self.description.as_str()]);
        }
        entry
    }
}
