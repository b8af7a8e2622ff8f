//! `coursedesk-core`: shared primitives for the access-control workspace.
//!
//! This crate contains identifiers and the domain error model only (no IO).

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{CredentialId, GroupId, ResourceNodeId, UserId};
