//! Role hierarchy and departments

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[cfg(feature = "orm")]
use sea_orm::entity::prelude::StringLen;
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::UnknownVariant;

/// Fixed role hierarchy of the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "orm", derive(sea_orm::EnumIter, sea_orm::DeriveActiveEnum))]
#[cfg_attr(
    feature = "orm",
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access to every resource
    #[cfg_attr(feature = "orm", sea_orm(string_value = "ADMIN"))]
    Admin,
    /// Manages all projects
    #[cfg_attr(feature = "orm", sea_orm(string_value = "PROJECT_MANAGER"))]
    ProjectManager,
    /// Manages the projects they lead
    #[cfg_attr(feature = "orm", sea_orm(string_value = "TEAM_LEAD"))]
    TeamLead,
    /// Works on the projects they belong to
    #[cfg_attr(feature = "orm", sea_orm(string_value = "STAFF"))]
    Staff,
    /// External customer of a project
    #[cfg_attr(feature = "orm", sea_orm(string_value = "CLIENT"))]
    Client,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::ProjectManager,
        Role::TeamLead,
        Role::Staff,
        Role::Client,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::ProjectManager => "PROJECT_MANAGER",
            Role::TeamLead => "TEAM_LEAD",
            Role::Staff => "STAFF",
            Role::Client => "CLIENT",
        }
    }

    /// ADMIN and PROJECT_MANAGER see and manage everything.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::ProjectManager)
    }

    /// Internal staff roles must belong to a department.
    pub fn requires_department(&self) -> bool {
        match self {
            Role::Staff | Role::TeamLead | Role::ProjectManager => true,
            Role::Admin | Role::Client => false,
        }
    }

    /// Roles a project's team lead may hold.
    pub fn can_lead_projects(&self) -> bool {
        matches!(self, Role::TeamLead | Role::Staff)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant::new("role", s))
    }
}

/// Department an internal user belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "orm", derive(sea_orm::EnumIter, sea_orm::DeriveActiveEnum))]
#[cfg_attr(
    feature = "orm",
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Department {
    #[cfg_attr(feature = "orm", sea_orm(string_value = "ACCOUNT"))]
    Account,
    #[cfg_attr(feature = "orm", sea_orm(string_value = "SALES"))]
    Sales,
    #[cfg_attr(feature = "orm", sea_orm(string_value = "MARKETING"))]
    Marketing,
    #[cfg_attr(feature = "orm", sea_orm(string_value = "QA"))]
    Qa,
    #[cfg_attr(feature = "orm", sea_orm(string_value = "DEVELOPER"))]
    Developer,
    #[cfg_attr(feature = "orm", sea_orm(string_value = "SUPPORT"))]
    Support,
    #[cfg_attr(feature = "orm", sea_orm(string_value = "HR"))]
    Hr,
}

impl Department {
    pub const ALL: [Department; 7] = [
        Department::Account,
        Department::Sales,
        Department::Marketing,
        Department::Qa,
        Department::Developer,
        Department::Support,
        Department::Hr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Account => "ACCOUNT",
            Department::Sales => "SALES",
            Department::Marketing => "MARKETING",
            Department::Qa => "QA",
            Department::Developer => "DEVELOPER",
            Department::Support => "SUPPORT",
            Department::Hr => "HR",
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant::new("department", s))
    }
}
