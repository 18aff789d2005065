//! # Directory Connector
//!
//! LDAP directory access for the dirsync provisioning engine.
//!
//! The crate exposes a small [`DirectoryClient`] trait covering the
//! primitives provisioning needs (connect, bind, read, search, add, modify)
//! and [`LdapClient`], its `ldap3` implementation.
//!
//! ## Features
//!
//! - LDAP v3 simple bind
//! - SSL/TLS and STARTTLS
//! - Lazily streamed search results
//! - Result-code classification into typed errors
//!
//! ## Example
//!
//! ```ignore
//! use dirsync_connector_ldap::{DirectoryClient, DirectoryConfig, LdapClient};
//!
//! let config = DirectoryConfig::new(
//!     "ldap.example.com",
//!     "dc=example,dc=com",
//!     "cn=admin,dc=example,dc=com",
//! )
//! .with_password("secret");
//!
//! let mut client = LdapClient::new(config.clone());
//! client.connect(&config.host, config.port()).await?;
//! client.bind(&config.bind_dn, config.password()).await?;
//! ```

pub mod client;
pub mod config;
pub mod entry;
pub mod error;
pub mod escape;
pub mod ldap;

// Re-exports
pub use client::{DirectoryClient, EntryStream};
pub use config::{ConnectionSettings, DirectoryConfig};
pub use entry::{DirectoryEntry, ModifyOp, SearchScope};
pub use error::{DirectoryError, DirectoryResult};
pub use escape::{escape_dn_value, escape_filter_value};
pub use ldap::LdapClient;
