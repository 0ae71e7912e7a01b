//! WorkProfit domain model
//!
//! Roles, lifecycle enums and the pure rules that decide who may do what to
//! a project or task. Nothing here touches the database; callers load a
//! [`ProjectMembership`] snapshot and hand it to the policy and validation
//! functions.

pub mod error;
pub mod membership;
pub mod patch;
pub mod policy;
pub mod progress;
pub mod roles;
pub mod status;
pub mod validate;

pub use error::{DomainError, DomainResult, UnknownVariant};
pub use membership::{dedupe_ids, missing_ids, Actor, ProjectMembership};
pub use policy::Visibility;
pub use roles::{Department, Role};
pub use status::{ProjectStatus, TaskPriority, TaskStatus};
pub use validate::{FieldError, ValidationErrors};
