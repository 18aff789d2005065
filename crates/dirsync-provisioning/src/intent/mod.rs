//! Provisioning intents and their extraction from change documents.

mod xml;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

pub use xml::XmlIntentExtractor;

/// One requested change, as read from a change document.
///
/// Values are kept as written upstream; normalization happens when the
/// engine builds entities from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Create a user and enroll it in the listed groups.
    AddUser {
        uid: String,
        full_name: String,
        phone: String,
        #[serde(default)]
        group_ids: Vec<String>,
    },
    /// Create a group.
    AddGroup {
        identifier: String,
        description: String,
    },
    /// Change an existing user's group memberships.
    ModifyMembership {
        uid: String,
        #[serde(default)]
        groups_to_remove: Vec<String>,
        #[serde(default)]
        groups_to_add: Vec<String>,
    },
}

impl Intent {
    /// Short name of the intent kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::AddUser { .. } => "add_user",
            Intent::AddGroup { .. } => "add_group",
            Intent::ModifyMembership { .. } => "modify_membership",
        }
    }

    /// The identifier the intent is about.
    pub fn subject(&self) -> &str {
        match self {
            Intent::AddUser { uid, .. } => uid,
            Intent::AddGroup { identifier, .. } => identifier,
            Intent::ModifyMembership { uid, .. } => uid,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::AddUser {
                uid,
                full_name,
                phone,
                group_ids,
            } => write!(
                f,
                "add user '{}' ({}, phone '{}') groups [{}]",
                uid,
                full_name,
                phone,
                group_ids.join(", ")
            ),
            Intent::AddGroup {
                identifier,
                description,
            } => write!(f, "add group '{}' ({})", identifier, description),
            Intent::ModifyMembership {
                uid,
                groups_to_remove,
                groups_to_add,
            } => write!(
                f,
                "modify user '{}' remove [{}] add [{}]",
                uid,
                groups_to_remove.join(", "),
                groups_to_add.join(", ")
            ),
        }
    }
}

/// Turns one change document into one intent.
pub trait IntentExtractor {
    /// Extract the intent described by `document`.
    fn extract(&self, document: &str) -> ExtractResult<Intent>;

    /// Read `path` and extract its intent.
    fn extract_file(&self, path: &Path) -> ExtractResult<Intent> {
        let document = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.extract(&document)
    }
}
