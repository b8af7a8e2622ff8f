//! `coursedesk-auth`: the access-control engine.
//!
//! Decoupled from HTTP and from any concrete storage: persistence is reached
//! through the async ports in [`store`], implemented by `coursedesk-infra`.
//!
//! Enforcement lives in [`authorize`]. Menu rendering lives in [`navigation`]
//! and is advisory only; nothing in [`authorize`] depends on it.

pub mod account;
pub mod action;
pub mod admin;
pub mod authorize;
pub mod cache;
pub mod credential;
pub mod grant;
pub mod group;
pub mod navigation;
pub mod operations;
pub mod resource;
pub mod session;
pub mod store;

pub use account::{AccountStatus, UserAccount, account_is_active};
pub use action::Action;
pub use admin::{AdminError, PermissionAdmin};
pub use authorize::{Actor, AuthorizationService, AuthzError, Decision, DenialKind, OperationResolver};
pub use cache::CachedGrantStore;
pub use credential::{Credential, CredentialError, IssuedCredential};
pub use grant::{Grant, GrantFlags, GrantMatrix};
pub use group::{GroupName, PermissionGroup};
pub use navigation::{NavNode, project, view_grants};
pub use operations::{OperationTable, OperationTableBuilder, OperationTableError};
pub use resource::{ResourceNode, ResourceTree, TreeError, UrlPath};
pub use session::SessionGate;
pub use store::{AdminStore, CredentialStore, GrantStore, ResourceStore, StoreError, StoreResult, UserStore};

pub use coursedesk_core::{CredentialId, GroupId, ResourceNodeId, UserId};
