//! Shared test fixtures: an in-memory directory with failure injection.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use dirsync_connector_ldap::{
    DirectoryClient, DirectoryConfig, DirectoryEntry, DirectoryError, DirectoryResult,
    EntryStream, ModifyOp, SearchScope,
};
use dirsync_provisioning::ProvisioningEngine;

pub const BASE_DN: &str = "dc=example,dc=com";
pub const USERS_DN: &str = "ou=users,dc=example,dc=com";
pub const GROUPS_DN: &str = "ou=groups,dc=example,dc=com";

// =============================================================================
// In-memory directory
// =============================================================================

/// Number of calls per primitive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub connect: usize,
    pub bind: usize,
    pub read: usize,
    pub search: usize,
    pub add: usize,
    pub modify: usize,
    pub unbind: usize,
}

/// A search that breaks after yielding `after` entries.
#[derive(Debug, Clone)]
pub struct SearchFailure {
    pub base: String,
    pub after: usize,
    pub code: u32,
}

/// Directory held in a map keyed by lowercase DN.
///
/// Mirrors the server behaviors the engine depends on: result code 32 for
/// missing entries and parents, 68 for duplicate adds, and rejection of
/// duplicate or missing values on modify.
pub struct InMemoryDirectory {
    entries: BTreeMap<String, DirectoryEntry>,
    connected: bool,
    bound: bool,
    pub calls: Calls,
    pub fail_connect: bool,
    pub fail_bind: bool,
    failing_reads: HashSet<String>,
    failing_adds: HashSet<String>,
    failing_modifies: HashSet<String>,
    search_failure: Option<SearchFailure>,
}

impl InMemoryDirectory {
    /// A directory containing only the base entry.
    pub fn new() -> Self {
        let mut dir = Self {
            entries: BTreeMap::new(),
            connected: false,
            bound: false,
            calls: Calls::default(),
            fail_connect: false,
            fail_bind: false,
            failing_reads: HashSet::new(),
            failing_adds: HashSet::new(),
            failing_modifies: HashSet::new(),
            search_failure: None,
        };
        dir.insert(DirectoryEntry::new(BASE_DN).with("objectClass", ["top", "domain"]));
        dir
    }

    /// A directory with both managed containers in place.
    pub fn with_containers() -> Self {
        let mut dir = Self::new();
        dir.insert(ou("users"));
        dir.insert(ou("groups"));
        dir
    }

    pub fn insert(&mut self, entry: DirectoryEntry) {
        self.entries.insert(entry.dn.to_ascii_lowercase(), entry);
    }

    pub fn entry(&self, dn: &str) -> Option<&DirectoryEntry> {
        self.entries.get(&dn.to_ascii_lowercase())
    }

    pub fn contains(&self, dn: &str) -> bool {
        self.entry(dn).is_some()
    }

    /// Entries directly or indirectly below `base`.
    pub fn count_under(&self, base: &str) -> usize {
        self.entries
            .values()
            .filter(|e| in_scope(&e.dn, base, SearchScope::Subtree) && !e.dn.eq_ignore_ascii_case(base))
            .count()
    }

    pub fn members(&self, group_dn: &str) -> Vec<String> {
        self.entry(group_dn)
            .map(|e| e.values("member").to_vec())
            .unwrap_or_default()
    }

    /// Simulate the server closing the session.
    pub fn drop_connection(&mut self) {
        self.connected = false;
        self.bound = false;
    }

    pub fn fail_read(&mut self, dn: &str) {
        self.failing_reads.insert(dn.to_ascii_lowercase());
    }

    pub fn fail_add(&mut self, dn: &str) {
        self.failing_adds.insert(dn.to_ascii_lowercase());
    }

    pub fn fail_modify(&mut self, dn: &str) {
        self.failing_modifies.insert(dn.to_ascii_lowercase());
    }

    pub fn fail_search(&mut self, base: &str, after: usize, code: u32) {
        self.search_failure = Some(SearchFailure {
            base: base.to_ascii_lowercase(),
            after,
            code,
        });
    }

    pub fn clear_failures(&mut self) {
        self.fail_connect = false;
        self.fail_bind = false;
        self.failing_reads.clear();
        self.failing_adds.clear();
        self.failing_modifies.clear();
        self.search_failure = None;
    }

    fn require_bound(&self) -> DirectoryResult<()> {
        if self.connected && self.bound {
            Ok(())
        } else {
            Err(DirectoryError::NotConnected)
        }
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    fn is_bound(&mut self) -> bool {
        self.connected && self.bound
    }

    async fn connect(&mut self, host: &str, port: u16) -> DirectoryResult<()> {
        self.calls.connect += 1;
        self.bound = false;
        if self.fail_connect {
            self.connected = false;
            return Err(DirectoryError::connection_failed(format!(
                "connection refused: {}:{}",
                host, port
            )));
        }
        self.connected = true;
        Ok(())
    }

    async fn bind(&mut self, dn: &str, _password: &str) -> DirectoryResult<()> {
        self.calls.bind += 1;
        if !self.connected {
            return Err(DirectoryError::NotConnected);
        }
        if self.fail_bind {
            return Err(DirectoryError::AuthenticationFailed {
                bind_dn: dn.to_string(),
            });
        }
        self.bound = true;
        Ok(())
    }

    async fn read(&mut self, dn: &str) -> DirectoryResult<DirectoryEntry> {
        self.calls.read += 1;
        self.require_bound()?;
        if self.failing_reads.contains(&dn.to_ascii_lowercase()) {
            return Err(DirectoryError::OperationFailed {
                operation: "read",
                code: 80,
                message: "injected read failure".to_string(),
            });
        }
        self.entry(dn)
            .cloned()
            .ok_or_else(|| DirectoryError::NoSuchObject { dn: dn.to_string() })
    }

    async fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        _attrs: &[&str],
    ) -> DirectoryResult<EntryStream> {
        self.calls.search += 1;
        self.require_bound()?;

        let mut items: Vec<DirectoryResult<DirectoryEntry>> = Vec::new();
        if !self.contains(base) {
            items.push(Err(DirectoryError::NoSuchObject {
                dn: base.to_string(),
            }));
            return Ok(stream::iter(items).boxed());
        }

        let assertions = parse_filter(filter);
        for entry in self.entries.values() {
            if in_scope(&entry.dn, base, scope) && matches_filter(entry, &assertions) {
                items.push(Ok(entry.clone()));
            }
        }

        if let Some(failure) = &self.search_failure {
            if failure.base == base.to_ascii_lowercase() {
                items.truncate(failure.after);
                items.push(Err(DirectoryError::OperationFailed {
                    operation: "search",
                    code: failure.code,
                    message: "injected search failure".to_string(),
                }));
            }
        }

        Ok(stream::iter(items).boxed())
    }

    async fn add(&mut self, entry: &DirectoryEntry) -> DirectoryResult<()> {
        self.calls.add += 1;
        self.require_bound()?;

        if self.failing_adds.contains(&entry.dn.to_ascii_lowercase()) {
            return Err(DirectoryError::OperationFailed {
                operation: "add",
                code: 50,
                message: "insufficient access rights".to_string(),
            });
        }
        if self.contains(&entry.dn) {
            return Err(DirectoryError::AlreadyExists {
                dn: entry.dn.clone(),
            });
        }
        let parent = parent_dn(&entry.dn);
        if !self.contains(parent) {
            return Err(DirectoryError::NoSuchObject {
                dn: parent.to_string(),
            });
        }

        self.insert(entry.clone());
        Ok(())
    }

    async fn modify(
        &mut self,
        dn: &str,
        op: ModifyOp,
        attribute: &str,
        value: &str,
    ) -> DirectoryResult<()> {
        self.calls.modify += 1;
        self.require_bound()?;

        if self.failing_modifies.contains(&dn.to_ascii_lowercase()) {
            return Err(DirectoryError::OperationFailed {
                operation: "modify",
                code: 50,
                message: "insufficient access rights".to_string(),
            });
        }

        let entry = self
            .entries
            .get_mut(&dn.to_ascii_lowercase())
            .ok_or_else(|| DirectoryError::NoSuchObject { dn: dn.to_string() })?;

        let present = entry
            .values(attribute)
            .iter()
            .any(|v| v.eq_ignore_ascii_case(value));

        match op {
            ModifyOp::Add => {
                if present {
                    return Err(DirectoryError::OperationFailed {
                        operation: "modify",
                        code: 20,
                        message: "attribute or value exists".to_string(),
                    });
                }
                match entry.values_mut(attribute) {
                    Some(values) => values.push(value.to_string()),
                    None => entry.set(attribute, [value]),
                }
            }
            ModifyOp::Delete => {
                if !present {
                    return Err(DirectoryError::OperationFailed {
                        operation: "modify",
                        code: 16,
                        message: "no such attribute".to_string(),
                    });
                }
                if let Some(values) = entry.values_mut(attribute) {
                    values.retain(|v| !v.eq_ignore_ascii_case(value));
                }
            }
        }
        Ok(())
    }

    async fn unbind(&mut self) -> DirectoryResult<()> {
        self.calls.unbind += 1;
        self.connected = false;
        self.bound = false;
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn ou(name: &str) -> DirectoryEntry {
    DirectoryEntry::new(format!("ou={},{}", name, BASE_DN))
        .with("objectClass", ["top", "organizationalUnit"])
        .with("ou", [name])
}

pub fn user_entry(uid: &str, full_name: &str, phone: &str) -> DirectoryEntry {
    let surname = full_name.split_whitespace().last().unwrap_or(full_name);
    DirectoryEntry::new(format!("uid={},{}", uid, USERS_DN))
        .with(
            "objectClass",
            ["top", "person", "organizationalPerson", "inetOrgPerson"],
        )
        .with("uid", [uid])
        .with("cn", [full_name])
        .with("sn", [surname])
        .with("telephoneNumber", [phone])
}

pub fn group_entry(cn: &str, members: &[&str]) -> DirectoryEntry {
    let entry = DirectoryEntry::new(format!("cn={},{}", cn, GROUPS_DN))
        .with("objectClass", ["top", "groupOfNames"])
        .with("cn", [cn])
        .with("description", [format!("{} group", cn)]);
    if members.is_empty() {
        entry
    } else {
        entry.with("member", members.iter().copied())
    }
}

pub fn user_dn(uid: &str) -> String {
    format!("uid={},{}", uid, USERS_DN)
}

pub fn group_dn(cn: &str) -> String {
    format!("cn={},{}", cn, GROUPS_DN)
}

pub fn config() -> DirectoryConfig {
    DirectoryConfig::new("ldap.test", BASE_DN, "cn=admin,dc=example,dc=com").with_password("secret")
}

pub fn engine(directory: InMemoryDirectory) -> ProvisioningEngine<InMemoryDirectory> {
    ProvisioningEngine::new(directory, config())
}

fn parent_dn(dn: &str) -> &str {
    let bytes = dn.as_bytes();
    let mut escaped = false;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'\\' if !escaped => escaped = true,
            b',' if !escaped => return &dn[i + 1..],
            _ => escaped = false,
        }
    }
    ""
}

fn in_scope(dn: &str, base: &str, scope: SearchScope) -> bool {
    let dn = dn.to_ascii_lowercase();
    let base = base.to_ascii_lowercase();
    match scope {
        SearchScope::Base => dn == base,
        SearchScope::OneLevel => parent_dn(&dn) == base,
        SearchScope::Subtree => dn == base || dn.ends_with(&format!(",{}", base)),
    }
}

/// Equality assertions of `(a=v)` or `(&(a=v)(b=w)...)`.
fn parse_filter(filter: &str) -> Vec<(String, String)> {
    let inner = filter
        .strip_prefix("(&")
        .and_then(|f| f.strip_suffix(')'))
        .unwrap_or(filter);
    inner
        .split(')')
        .filter_map(|part| {
            let part = part.trim_start_matches('(');
            let (attr, value) = part.split_once('=')?;
            Some((attr.to_string(), unescape_filter(value)))
        })
        .collect()
}

fn unescape_filter(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if let Some(Ok(b)) = value
                .get(i + 1..i + 3)
                .map(|hex| u8::from_str_radix(hex, 16))
            {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn matches_filter(entry: &DirectoryEntry, assertions: &[(String, String)]) -> bool {
    assertions.iter().all(|(attr, value)| {
        entry
            .values(attr)
            .iter()
            .any(|v| v.eq_ignore_ascii_case(value))
    })
}
