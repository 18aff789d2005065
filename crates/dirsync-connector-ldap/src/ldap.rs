//! ldap3-backed directory client

use std::collections::HashSet;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Mod, ResultEntry, Scope, SearchEntry};
use tracing::{debug, info, warn};

use crate::client::{DirectoryClient, EntryStream};
use crate::config::DirectoryConfig;
use crate::entry::{DirectoryEntry, ModifyOp, SearchScope};
use crate::error::{DirectoryError, DirectoryResult};

/// Directory client speaking LDAP v3 through `ldap3`.
pub struct LdapClient {
    config: DirectoryConfig,
    ldap: Option<Ldap>,
    bound: bool,
}

impl LdapClient {
    /// Create a disconnected client.
    ///
    /// Transport options (TLS mode, timeouts) are taken from `config`; the
    /// target host and credentials are supplied to `connect` and `bind`.
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            config,
            ldap: None,
            bound: false,
        }
    }

    fn url(&self, host: &str, port: u16) -> String {
        let scheme = if self.config.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, host, port)
    }

    /// Session handle with the operation timeout applied to the next request.
    fn session(&mut self) -> DirectoryResult<&mut Ldap> {
        let timeout = self.config.connection.operation_timeout();
        let ldap = self.ldap.as_mut().ok_or(DirectoryError::NotConnected)?;
        if let Some(timeout) = timeout {
            ldap.with_timeout(timeout);
        }
        Ok(ldap)
    }

    fn to_entry(entry: ResultEntry) -> DirectoryEntry {
        let entry = SearchEntry::construct(entry);
        let mut out = DirectoryEntry::new(entry.dn);
        for (name, values) in entry.attrs {
            out.set(name, values);
        }
        out
    }
}

fn to_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

#[async_trait]
impl DirectoryClient for LdapClient {
    fn is_bound(&mut self) -> bool {
        match self.ldap.as_mut() {
            Some(ldap) => self.bound && !ldap.is_closed(),
            None => false,
        }
    }

    async fn connect(&mut self, host: &str, port: u16) -> DirectoryResult<()> {
        if let Some(mut old) = self.ldap.take() {
            // the previous session is being replaced; a failed unbind is irrelevant
            let _ = old.unbind().await;
        }
        self.bound = false;

        let url = self.url(host, port);
        debug!(url = %url, "Connecting to directory server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.connection.connection_timeout())
            .set_starttls(self.config.use_starttls);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                DirectoryError::connection_failed_with_source(
                    format!("Failed to connect to directory server at {}", url),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        self.ldap = Some(ldap);
        Ok(())
    }

    async fn bind(&mut self, dn: &str, password: &str) -> DirectoryResult<()> {
        debug!(bind_dn = %dn, "Performing LDAP bind");

        let result = self
            .session()?
            .simple_bind(dn, password)
            .await
            .map_err(|e| {
                DirectoryError::connection_failed_with_source(
                    format!("LDAP bind failed for {}", dn),
                    e,
                )
            })?;

        if let Some(err) = DirectoryError::from_result_code("bind", dn, result.rc, &result.text) {
            return Err(match err {
                DirectoryError::AuthenticationFailed { .. } => err,
                other => DirectoryError::connection_failed(other.to_string()),
            });
        }

        self.bound = true;
        info!(bind_dn = %dn, "Directory session bound");
        Ok(())
    }

    async fn read(&mut self, dn: &str) -> DirectoryResult<DirectoryEntry> {
        debug!(dn = %dn, "Reading directory entry");

        let result = self
            .session()?
            .search(dn, Scope::Base, "(objectClass=*)", vec!["*"])
            .await
            .map_err(|e| DirectoryError::protocol_with_source("read", e))?;

        let ldap3::SearchResult(entries, res) = result;
        if let Some(err) = DirectoryError::from_result_code("read", dn, res.rc, &res.text) {
            return Err(err);
        }

        entries
            .into_iter()
            .next()
            .map(Self::to_entry)
            .ok_or_else(|| DirectoryError::NoSuchObject { dn: dn.to_string() })
    }

    async fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attrs: &[&str],
    ) -> DirectoryResult<EntryStream> {
        debug!(base = %base, filter = %filter, "Searching directory");

        let attrs: Vec<String> = attrs.iter().map(|a| a.to_string()).collect();
        let search = self
            .session()?
            .streaming_search(base, to_scope(scope), filter, attrs)
            .await
            .map_err(|e| DirectoryError::protocol_with_source("search", e))?;

        let base = base.to_string();
        let entries = stream::unfold(Some(search), move |state| {
            let base = base.clone();
            async move {
                let mut search = state?;
                match search.next().await {
                    Ok(Some(entry)) => Some((Ok(Self::to_entry(entry)), Some(search))),
                    Ok(None) => {
                        let res = search.finish().await;
                        DirectoryError::from_result_code("search", &base, res.rc, &res.text)
                            .map(|err| (Err(err), None))
                    }
                    Err(e) => Some((Err(DirectoryError::protocol_with_source("search", e)), None)),
                }
            }
        });

        Ok(entries.boxed())
    }

    async fn add(&mut self, entry: &DirectoryEntry) -> DirectoryResult<()> {
        debug!(dn = %entry.dn, "Adding directory entry");

        let attrs: Vec<(&str, HashSet<&str>)> = entry
            .attributes()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| (name, values.iter().map(String::as_str).collect()))
            .collect();

        let result = self
            .session()?
            .add(&entry.dn, attrs)
            .await
            .map_err(|e| DirectoryError::protocol_with_source("add", e))?;

        if let Some(err) = DirectoryError::from_result_code("add", &entry.dn, result.rc, &result.text)
        {
            return Err(err);
        }

        info!(dn = %entry.dn, "Directory entry created");
        Ok(())
    }

    async fn modify(
        &mut self,
        dn: &str,
        op: ModifyOp,
        attribute: &str,
        value: &str,
    ) -> DirectoryResult<()> {
        debug!(dn = %dn, op = %op, attribute = %attribute, "Modifying directory entry");

        let values = HashSet::from([value.to_string()]);
        let change = match op {
            ModifyOp::Add => Mod::Add(attribute.to_string(), values),
            ModifyOp::Delete => Mod::Delete(attribute.to_string(), values),
        };

        let result = self
            .session()?
            .modify(dn, vec![change])
            .await
            .map_err(|e| DirectoryError::protocol_with_source("modify", e))?;

        if let Some(err) = DirectoryError::from_result_code("modify", dn, result.rc, &result.text) {
            return Err(err);
        }

        info!(dn = %dn, op = %op, attribute = %attribute, "Directory entry modified");
        Ok(())
    }

    async fn unbind(&mut self) -> DirectoryResult<()> {
        self.bound = false;
        if let Some(mut ldap) = self.ldap.take() {
            ldap.unbind()
                .await
                .map_err(|e| DirectoryError::protocol_with_source("unbind", e))?;
            info!("Directory session closed");
        }
        Ok(())
    }
}
