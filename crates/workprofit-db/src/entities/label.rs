//! Task labels

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLOR: &str = "#3B82F6";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "labels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub color: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::task_label::Entity")]
    TaskLabels,
}

impl Related<super::task_label::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskLabels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
