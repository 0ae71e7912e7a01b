//! Projects

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use workprofit_core::ProjectStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Nulled when the client user is deleted
    pub client_id: Option<i32>,

    /// Nulled when the team lead user is deleted
    pub team_lead_id: Option<i32>,

    pub start_date: ChronoDate,

    /// Always after `start_date`
    pub end_date: ChronoDate,

    pub status: ProjectStatus,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeamLeadId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    TeamLead,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ClientId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Client,

    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,

    #[sea_orm(has_many = "super::project_member::Entity")]
    Members,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::project_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
