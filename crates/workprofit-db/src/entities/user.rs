//! User accounts

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use workprofit_core::{Department, Role};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Login name and token subject
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: Role,

    /// Required for STAFF, TEAM_LEAD and PROJECT_MANAGER
    pub department: Option<Department>,

    pub avatar_url: Option<String>,

    /// Cleared by soft delete
    pub is_active: bool,

    pub last_login: Option<ChronoDateTimeUtc>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_member::Entity")]
    ProjectMemberships,

    #[sea_orm(has_many = "super::task::Entity")]
    AssignedTasks,
}

impl Related<super::project_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectMemberships.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedTasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
