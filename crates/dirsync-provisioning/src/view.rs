//! Read-back of the directory: listings and the group/user join.

use serde::Serialize;

use crate::model::{Group, User};
use crate::naming::DirectoryTree;

/// Result of a listing query.
///
/// When the search fails part-way, `items` holds what was read before the
/// failure and `failure` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl<T> Listing<T> {
    pub fn complete(items: Vec<T>) -> Self {
        Self {
            items,
            failure: None,
        }
    }

    pub fn partial(items: Vec<T>, failure: impl Into<String>) -> Self {
        Self {
            items,
            failure: Some(failure.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// A group with its members resolved to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMembers {
    pub identifier: String,
    pub description: String,
    pub members: Vec<User>,
    /// Member DNs with no matching user entry.
    pub unresolved: Vec<String>,
}

/// Every user, and every group with its resolved members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MembershipView {
    pub users: Vec<User>,
    pub groups: Vec<GroupMembers>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

impl MembershipView {
    /// Join groups to users by case-insensitive DN comparison.
    pub fn build(tree: &DirectoryTree, users: &[User], groups: &[Group]) -> Self {
        let user_dns: Vec<(String, &User)> = users.iter().map(|u| (u.dn(tree), u)).collect();

        let groups = groups
            .iter()
            .map(|group| {
                let mut members = Vec::new();
                let mut unresolved = Vec::new();
                for dn in group.members() {
                    match user_dns.iter().find(|(udn, _)| udn.eq_ignore_ascii_case(dn)) {
                        Some((_, user)) => members.push((*user).clone()),
                        None => unresolved.push(dn.clone()),
                    }
                }
                GroupMembers {
                    identifier: group.identifier().to_string(),
                    description: group.description().to_string(),
                    members,
                    unresolved,
                }
            })
            .collect();

        Self {
            users: users.to_vec(),
            groups,
            failures: Vec::new(),
        }
    }
}
