//! The directory client abstraction
//!
//! Everything the provisioning engine needs from a directory server, kept to
//! the handful of primitives it actually issues.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::entry::{DirectoryEntry, ModifyOp, SearchScope};
use crate::error::DirectoryResult;

/// Lazily produced search results.
///
/// The stream is finite. An error item ends it; entries yielded before the
/// error remain valid.
pub type EntryStream = BoxStream<'static, DirectoryResult<DirectoryEntry>>;

/// Primitive operations against a directory server.
///
/// A client holds at most one session. Callers are expected to check
/// [`DirectoryClient::is_bound`] and run `connect` + `bind` again when the
/// session has gone away.
#[async_trait]
pub trait DirectoryClient: Send {
    /// Whether a live, authenticated session is currently held.
    fn is_bound(&mut self) -> bool;

    /// Open the transport to `host:port` and complete the protocol handshake.
    ///
    /// Any previous session is dropped first.
    async fn connect(&mut self, host: &str, port: u16) -> DirectoryResult<()>;

    /// Authenticate the open session (LDAP v3 simple bind).
    async fn bind(&mut self, dn: &str, password: &str) -> DirectoryResult<()>;

    /// Read a single entry by DN.
    ///
    /// Returns [`crate::DirectoryError::NoSuchObject`] when the entry is absent.
    async fn read(&mut self, dn: &str) -> DirectoryResult<DirectoryEntry>;

    /// Search under `base`.
    ///
    /// A missing base may be reported either up front or as the stream's
    /// terminal error item.
    async fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attrs: &[&str],
    ) -> DirectoryResult<EntryStream>;

    /// Create an entry.
    async fn add(&mut self, entry: &DirectoryEntry) -> DirectoryResult<()>;

    /// Add or delete one value of one attribute.
    async fn modify(
        &mut self,
        dn: &str,
        op: ModifyOp,
        attribute: &str,
        value: &str,
    ) -> DirectoryResult<()>;

    /// End the session. A no-op when nothing is connected.
    async fn unbind(&mut self) -> DirectoryResult<()>;
}
