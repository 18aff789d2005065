//! Provisioning engine
//!
//! Applies users, groups and membership changes to the directory without
//! creating duplicates. Every public operation first makes sure a bound
//! session exists, reconnecting when the previous one was lost, and returns an
//! explicit [`Outcome`] instead of aborting the caller's batch.

use dirsync_connector_ldap::{
    escape_filter_value, DirectoryClient, DirectoryConfig, DirectoryEntry, DirectoryError,
    DirectoryResult, ModifyOp, SearchScope,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::intent::Intent;
use crate::model::{Group, User};
use crate::naming::{Container, DirectoryTree};
use crate::normalize::normalize_text;
use crate::report::{MembershipChange, Operation, Outcome, ReconciliationReport, Step};
use crate::view::{Listing, MembershipView};

const CONTAINER_OBJECT_CLASSES: [&str; 2] = ["top", "organizationalUnit"];
const USER_ATTRS: [&str; 3] = ["uid", "cn", "telephoneNumber"];
const GROUP_ATTRS: [&str; 3] = ["cn", "description", "member"];
const MEMBER: &str = "member";
const USER_FILTER: &str = "(objectClass=inetOrgPerson)";
const GROUP_FILTER: &str = "(objectClass=groupOfNames)";

/// Session state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Bound,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Bound => write!(f, "bound"),
        }
    }
}

/// Idempotent provisioning on top of a [`DirectoryClient`].
///
/// The engine owns its client and runs one operation at a time; use one
/// engine per concurrent caller.
pub struct ProvisioningEngine<C> {
    client: C,
    config: DirectoryConfig,
    tree: DirectoryTree,
    state: ConnectionState,
    /// Container outcomes captured while `apply` runs.
    container_log: Option<Vec<(Container, Outcome)>>,
}

impl<C: DirectoryClient> ProvisioningEngine<C> {
    /// Create a disconnected engine. No I/O happens until the first operation.
    pub fn new(client: C, config: DirectoryConfig) -> Self {
        let tree = DirectoryTree::new(config.base_dn.clone());
        Self {
            client,
            config,
            tree,
            state: ConnectionState::Disconnected,
            container_log: None,
        }
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Make sure a bound session exists, connecting and binding if not.
    pub async fn ensure_connected(&mut self) -> DirectoryResult<()> {
        if self.client.is_bound() {
            self.state = ConnectionState::Bound;
            return Ok(());
        }

        if self.state == ConnectionState::Bound {
            warn!("Directory session lost, reconnecting");
        }
        self.state = ConnectionState::Connecting;
        debug!(host = %self.config.host, port = self.config.port(), "Connecting to directory");

        if let Err(e) = self.client.connect(&self.config.host, self.config.port()).await {
            self.state = ConnectionState::Disconnected;
            warn!(
                host = %self.config.host,
                code = e.error_code(),
                error = %e,
                "Directory connection failed"
            );
            return Err(e);
        }

        if let Err(e) = self
            .client
            .bind(&self.config.bind_dn, self.config.password())
            .await
        {
            self.state = ConnectionState::Disconnected;
            warn!(
                bind_dn = %self.config.bind_dn,
                code = e.error_code(),
                error = %e,
                "Directory bind failed"
            );
            return Err(e);
        }

        self.state = ConnectionState::Bound;
        info!(host = %self.config.host, bind_dn = %self.config.bind_dn, "Directory session established");
        Ok(())
    }

    async fn connect_or_fail(&mut self) -> Option<Outcome> {
        self.ensure_connected()
            .await
            .err()
            .map(|e| Outcome::failed(format!("connection failed: {e}")))
    }

    /// End the session.
    pub async fn disconnect(&mut self) -> DirectoryResult<()> {
        let result = self.client.unbind().await;
        self.state = ConnectionState::Disconnected;
        info!("Disconnected from directory");
        result
    }

    /// Make sure an organizational container exists under the base DN.
    ///
    /// A read failure other than "no such object" is reported as failed
    /// without attempting a create; callers carry on regardless.
    #[instrument(skip(self))]
    pub async fn ensure_container(&mut self, container: Container) -> Outcome {
        let outcome = match self.connect_or_fail().await {
            Some(failed) => failed,
            None => self.ensure_container_exists(container).await,
        };
        if let Some(log) = self.container_log.as_mut() {
            log.push((container, outcome.clone()));
        }
        outcome
    }

    async fn ensure_container_exists(&mut self, container: Container) -> Outcome {
        let dn = self.tree.container_dn(container);
        match self.client.read(&dn).await {
            Ok(_) => Outcome::AlreadyPresent,
            Err(e) if e.is_not_found() => {
                let entry = DirectoryEntry::new(dn.as_str())
                    .with("objectClass", CONTAINER_OBJECT_CLASSES)
                    .with("ou", [container.name()]);
                match self.client.add(&entry).await {
                    Ok(()) => {
                        info!(dn = %dn, "Container created");
                        Outcome::Created
                    }
                    Err(e) => {
                        warn!(
                            dn = %dn,
                            code = e.error_code(),
                            error = %e,
                            "Failed to create container"
                        );
                        Outcome::failed(e)
                    }
                }
            }
            Err(e) => {
                warn!(
                    dn = %dn,
                    code = e.error_code(),
                    error = %e,
                    "Container lookup failed, not creating it"
                );
                Outcome::failed(e)
            }
        }
    }

    /// Create a user unless an entry with its DN already exists.
    #[instrument(skip(self, user), fields(uid = %user.uid()))]
    pub async fn add_user(&mut self, user: &User) -> Outcome {
        if let Some(failed) = self.connect_or_fail().await {
            return failed;
        }
        self.ensure_container(Container::Users).await;
        let entry = user.to_entry(&self.tree);
        self.create_if_absent(&entry).await
    }

    /// Create a group unless an entry with its DN already exists.
    ///
    /// `initial_members` are written once, at creation, as a single
    /// comma-joined `member` value.
    #[instrument(skip(self, group, initial_members), fields(group = %group.identifier()))]
    pub async fn add_group(&mut self, group: &Group, initial_members: &[User]) -> Outcome {
        if let Some(failed) = self.connect_or_fail().await {
            return failed;
        }
        self.ensure_container(Container::Groups).await;
        let entry = group.to_entry(&self.tree, initial_members);
        self.create_if_absent(&entry).await
    }

    async fn create_if_absent(&mut self, entry: &DirectoryEntry) -> Outcome {
        match self.client.read(&entry.dn).await {
            Ok(_) => {
                debug!(dn = %entry.dn, "Entry already present");
                return Outcome::AlreadyPresent;
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                warn!(dn = %entry.dn, code = e.error_code(), error = %e, "Existence check failed");
                return Outcome::failed(e);
            }
        }

        match self.client.add(entry).await {
            Ok(()) => {
                info!(dn = %entry.dn, "Entry created");
                Outcome::Created
            }
            Err(e) => {
                warn!(dn = %entry.dn, code = e.error_code(), error = %e, "Failed to create entry");
                Outcome::failed(e)
            }
        }
    }

    /// Whether the user's DN is among the group's members.
    ///
    /// A missing group, or one without members, yields `false`.
    #[instrument(skip(self, user, group), fields(uid = %user.uid(), group = %group.identifier()))]
    pub async fn is_user_in_group(&mut self, user: &User, group: &Group) -> DirectoryResult<bool> {
        self.ensure_connected().await?;
        let user_dn = user.dn(&self.tree);
        Ok(self
            .find_group(group.identifier())
            .await?
            .is_some_and(|entry| has_member(&entry, &user_dn)))
    }

    /// Add the user to the group's members.
    #[instrument(skip(self, user, group), fields(uid = %user.uid(), group = %group.identifier()))]
    pub async fn add_user_to_group(&mut self, user: &User, group: &Group) -> Outcome {
        self.change_membership(user, group, ModifyOp::Add).await
    }

    /// Remove the user from the group's members.
    #[instrument(skip(self, user, group), fields(uid = %user.uid(), group = %group.identifier()))]
    pub async fn remove_user_from_group(&mut self, user: &User, group: &Group) -> Outcome {
        self.change_membership(user, group, ModifyOp::Delete).await
    }

    async fn change_membership(&mut self, user: &User, group: &Group, op: ModifyOp) -> Outcome {
        if let Some(failed) = self.connect_or_fail().await {
            return failed;
        }

        let entry = match self.find_group(group.identifier()).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                return Outcome::NotFound(format!("group '{}' not found", group.identifier()))
            }
            Err(e) => return Outcome::failed(e),
        };

        let user_dn = user.dn(&self.tree);
        let is_member = has_member(&entry, &user_dn);
        if matches!(
            (op, is_member),
            (ModifyOp::Add, true) | (ModifyOp::Delete, false)
        ) {
            debug!(group = %entry.dn, member = %user_dn, op = %op, "Membership already as requested");
            return Outcome::NoOp;
        }

        match self.client.modify(&entry.dn, op, MEMBER, &user_dn).await {
            Ok(()) => {
                info!(group = %entry.dn, member = %user_dn, op = %op, "Group membership changed");
                Outcome::Modified
            }
            Err(e) => {
                warn!(
                    group = %entry.dn,
                    member = %user_dn,
                    code = e.error_code(),
                    error = %e,
                    "Failed to change group membership"
                );
                Outcome::failed(e)
            }
        }
    }

    /// Apply a user's membership changes: removals first, then additions.
    ///
    /// The aggregate outcome is `Modified` when any step modified a group,
    /// `NoOp` otherwise. Every step is returned alongside.
    #[instrument(skip(self, groups_to_remove, groups_to_add))]
    pub async fn modify_user_groups(
        &mut self,
        uid: &str,
        groups_to_remove: &[String],
        groups_to_add: &[String],
    ) -> MembershipChange {
        if let Some(failed) = self.connect_or_fail().await {
            return MembershipChange {
                outcome: failed,
                steps: Vec::new(),
            };
        }

        let user = match self.find_user(uid).await {
            Ok(user) => user,
            Err(outcome) => {
                return MembershipChange {
                    outcome,
                    steps: Vec::new(),
                }
            }
        };

        let mut steps = Vec::with_capacity(groups_to_remove.len() + groups_to_add.len());
        for identifier in groups_to_remove {
            let operation = Operation::RemoveUserFromGroup {
                uid: user.uid().to_string(),
                group: identifier.clone(),
            };
            let outcome = match Group::new(identifier, "") {
                Ok(group) => self.remove_user_from_group(&user, &group).await,
                Err(e) => Outcome::failed(e),
            };
            steps.push(Step::new(operation, outcome));
        }
        for identifier in groups_to_add {
            let operation = Operation::AddUserToGroup {
                uid: user.uid().to_string(),
                group: identifier.clone(),
            };
            let outcome = match Group::new(identifier, "") {
                Ok(group) => self.add_user_to_group(&user, &group).await,
                Err(e) => Outcome::failed(e),
            };
            steps.push(Step::new(operation, outcome));
        }

        let outcome = if steps.iter().any(|s| s.outcome == Outcome::Modified) {
            Outcome::Modified
        } else {
            Outcome::NoOp
        };
        info!(uid = %user.uid(), outcome = %outcome, steps = steps.len(), "User memberships processed");

        MembershipChange { outcome, steps }
    }

    /// Every user under the users container.
    #[instrument(skip(self))]
    pub async fn list_users(&mut self) -> Listing<User> {
        if let Err(e) = self.ensure_connected().await {
            return Listing::partial(Vec::new(), format!("connection failed: {e}"));
        }

        let base = self.tree.container_dn(Container::Users);
        let (entries, error) = self.search_all(&base, USER_FILTER, &USER_ATTRS).await;
        let users = entries
            .iter()
            .filter(|entry| {
                USER_ATTRS
                    .iter()
                    .any(|attr| entry.first(attr).is_some_and(|v| !v.is_empty()))
            })
            .filter_map(|entry| match User::from_entry(entry) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(
                        dn = %entry.dn,
                        code = e.error_code(),
                        error = %e,
                        "Skipping unreadable user entry"
                    );
                    None
                }
            })
            .collect();

        finish_listing(&base, users, error)
    }

    /// Every group under the groups container, with its member DNs.
    #[instrument(skip(self))]
    pub async fn list_groups(&mut self) -> Listing<Group> {
        if let Err(e) = self.ensure_connected().await {
            return Listing::partial(Vec::new(), format!("connection failed: {e}"));
        }

        let base = self.tree.container_dn(Container::Groups);
        let (entries, error) = self.search_all(&base, GROUP_FILTER, &GROUP_ATTRS).await;
        let groups = entries
            .iter()
            .filter_map(|entry| match Group::from_entry(entry) {
                Ok(group) => Some(group),
                Err(e) => {
                    warn!(
                        dn = %entry.dn,
                        code = e.error_code(),
                        error = %e,
                        "Skipping unreadable group entry"
                    );
                    None
                }
            })
            .collect();

        finish_listing(&base, groups, error)
    }

    /// Groups joined with the users they contain.
    pub async fn membership_view(&mut self) -> MembershipView {
        let users = self.list_users().await;
        let groups = self.list_groups().await;

        let mut view = MembershipView::build(&self.tree, &users.items, &groups.items);
        if let Some(failure) = users.failure {
            view.failures.push(format!("users: {failure}"));
        }
        if let Some(failure) = groups.failure {
            view.failures.push(format!("groups: {failure}"));
        }
        view
    }

    /// Apply intents in order, recording every operation's outcome.
    ///
    /// No failure stops the batch.
    #[instrument(skip(self, intents), fields(intents = intents.len()))]
    pub async fn apply(&mut self, intents: &[Intent]) -> ReconciliationReport {
        let mut report = ReconciliationReport::new(intents.len());

        for (index, intent) in intents.iter().enumerate() {
            debug!(index, kind = intent.kind(), subject = intent.subject(), "Applying intent");
            self.container_log = Some(Vec::new());
            let steps = self.apply_intent(intent).await;

            // only container changes and failures are worth a report line
            for (container, outcome) in self.container_log.take().unwrap_or_default() {
                if outcome != Outcome::AlreadyPresent {
                    report.record(index, Operation::EnsureContainer { container }, outcome);
                }
            }
            for step in steps {
                report.push(index, step);
            }
        }

        report.complete();
        info!(
            total = report.summary.total,
            created = report.summary.created,
            modified = report.summary.modified,
            failed = report.summary.failed,
            not_found = report.summary.not_found,
            "Intents applied"
        );
        report
    }

    async fn apply_intent(&mut self, intent: &Intent) -> Vec<Step> {
        match intent {
            Intent::AddGroup {
                identifier,
                description,
            } => {
                let operation = Operation::AddGroup {
                    identifier: identifier.clone(),
                };
                let outcome = match Group::new(identifier, description) {
                    Ok(group) => self.add_group(&group, &[]).await,
                    Err(e) => Outcome::failed(e),
                };
                vec![Step::new(operation, outcome)]
            }
            Intent::AddUser {
                uid,
                full_name,
                phone,
                group_ids,
            } => {
                let user = match User::new(uid, full_name, phone) {
                    Ok(user) => user,
                    Err(e) => {
                        return vec![Step::new(
                            Operation::AddUser { uid: uid.clone() },
                            Outcome::failed(e),
                        )]
                    }
                };

                let outcome = self.add_user(&user).await;
                let present = outcome.is_present();
                let mut steps = vec![Step::new(
                    Operation::AddUser {
                        uid: user.uid().to_string(),
                    },
                    outcome,
                )];
                if !present {
                    return steps;
                }

                for group_id in group_ids {
                    let operation = Operation::AddUserToGroup {
                        uid: user.uid().to_string(),
                        group: group_id.clone(),
                    };
                    let outcome = match Group::new(group_id, "") {
                        Ok(group) => self.add_user_to_group(&user, &group).await,
                        Err(e) => Outcome::failed(e),
                    };
                    steps.push(Step::new(operation, outcome));
                }
                steps
            }
            Intent::ModifyMembership {
                uid,
                groups_to_remove,
                groups_to_add,
            } => {
                let change = self
                    .modify_user_groups(uid, groups_to_remove, groups_to_add)
                    .await;
                let mut steps = change.steps;
                steps.push(Step::new(
                    Operation::ModifyUserGroups { uid: uid.clone() },
                    change.outcome,
                ));
                steps
            }
        }
    }

    /// Resolve a user by `uid` under the users container.
    async fn find_user(&mut self, uid: &str) -> Result<User, Outcome> {
        let uid = normalize_text(uid).trim().to_string();
        let base = self.tree.container_dn(Container::Users);
        let filter = format!(
            "(&{}(uid={}))",
            USER_FILTER,
            escape_filter_value(&uid)
        );

        let (entries, error) = self.search_all(&base, &filter, &USER_ATTRS).await;
        if let Some(e) = error {
            if !e.is_not_found() {
                return Err(Outcome::failed(e));
            }
        }

        match entries.first() {
            Some(entry) => User::from_entry(entry).map_err(Outcome::failed),
            None => Err(Outcome::NotFound(format!("user '{}' not found", uid))),
        }
    }

    /// Locate a group entry by identifier. A missing container means no group.
    async fn find_group(&mut self, identifier: &str) -> DirectoryResult<Option<DirectoryEntry>> {
        let base = self.tree.container_dn(Container::Groups);
        let filter = format!(
            "(&{}(cn={}))",
            GROUP_FILTER,
            escape_filter_value(identifier)
        );

        let (entries, error) = self.search_all(&base, &filter, &GROUP_ATTRS).await;
        match error {
            Some(e) if !e.is_not_found() => Err(e),
            _ => Ok(entries.into_iter().next()),
        }
    }

    /// Drain a subtree search, keeping entries read before any error.
    async fn search_all(
        &mut self,
        base: &str,
        filter: &str,
        attrs: &[&str],
    ) -> (Vec<DirectoryEntry>, Option<DirectoryError>) {
        let mut stream = match self
            .client
            .search(base, SearchScope::Subtree, filter, attrs)
            .await
        {
            Ok(stream) => stream,
            Err(e) => return (Vec::new(), Some(e)),
        };

        let mut entries = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(entry) => entries.push(entry),
                Err(e) => return (entries, Some(e)),
            }
        }
        (entries, None)
    }
}

fn has_member(entry: &DirectoryEntry, member_dn: &str) -> bool {
    entry
        .values(MEMBER)
        .iter()
        .any(|m| m.eq_ignore_ascii_case(member_dn))
}

fn finish_listing<T>(base: &str, items: Vec<T>, error: Option<DirectoryError>) -> Listing<T> {
    match error {
        None => Listing::complete(items),
        Some(e) if e.is_not_found() => {
            debug!(base = %base, "Container not found, nothing to list");
            Listing::complete(items)
        }
        Some(e) => {
            warn!(
                base = %base,
                code = e.error_code(),
                error = %e,
                read = items.len(),
                "Listing interrupted"
            );
            Listing::partial(items, e.to_string())
        }
    }
}
