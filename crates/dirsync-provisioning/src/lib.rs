//! # Directory Provisioning
//!
//! Idempotent provisioning of users, groups and group memberships into an
//! LDAP directory, driven by declarative change documents.
//!
//! ## Flow
//!
//! 1. An [`IntentExtractor`] turns each change document into an [`Intent`].
//! 2. [`ProvisioningEngine::apply`] applies the intents in order, checking
//!    directory state before every write.
//! 3. The returned [`ReconciliationReport`] lists one outcome per operation.
//! 4. [`ProvisioningEngine::membership_view`] reads the result back.
//!
//! ## Example
//!
//! ```ignore
//! use dirsync_connector_ldap::{DirectoryConfig, LdapClient};
//! use dirsync_provisioning::{IntentExtractor, ProvisioningEngine, XmlIntentExtractor};
//!
//! let intent = XmlIntentExtractor::new().extract_file("inputs/AddGrupo1.xml".as_ref())?;
//! let mut engine = ProvisioningEngine::new(LdapClient::new(config.clone()), config);
//! let report = engine.apply(&[intent]).await;
//! ```

pub mod engine;
pub mod error;
pub mod intent;
pub mod model;
pub mod naming;
pub mod normalize;
pub mod report;
pub mod view;

pub use engine::{ConnectionState, ProvisioningEngine};
pub use error::{ExtractError, ExtractResult, ModelError, ModelResult};
pub use intent::{Intent, IntentExtractor, XmlIntentExtractor};
pub use model::{Group, User};
pub use naming::{Container, DirectoryTree};
pub use normalize::{normalize_phone, normalize_text};
pub use report::{
    MembershipChange, Operation, Outcome, ReconciliationReport, ReportEntry, ReportSummary, Step,
};
pub use view::{GroupMembers, Listing, MembershipView};
