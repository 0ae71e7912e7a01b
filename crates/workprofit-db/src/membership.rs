//! Membership resolution and junction-table maintenance.
//!
//! Every function takes a generic connection so handlers can pass their
//! request-scoped transaction.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::debug;
use workprofit_core::ProjectMembership;

use crate::entities::{project, project_member, task_label};

/// Member ids of a project in insertion order
pub async fn member_ids<C: ConnectionTrait>(conn: &C, project_id: i32) -> Result<Vec<i32>, DbErr> {
    project_member::Entity::find()
        .select_only()
        .column(project_member::Column::UserId)
        .filter(project_member::Column::ProjectId.eq(project_id))
        .order_by_asc(project_member::Column::Position)
        .order_by_asc(project_member::Column::JoinedAt)
        .into_tuple::<i32>()
        .all(conn)
        .await
}

/// Snapshot of who leads, sponsors and works on `project`.
pub async fn load_membership<C: ConnectionTrait>(
    conn: &C,
    project: &project::Model,
) -> Result<ProjectMembership, DbErr> {
    let member_ids = member_ids(conn, project.id).await?;
    Ok(ProjectMembership {
        project_id: project.id,
        team_lead_id: project.team_lead_id,
        client_id: project.client_id,
        member_ids,
    })
}

/// Make `user_ids` the exact member list, in that order.
///
/// Users who stay keep their original join time.
pub async fn replace_members<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
    user_ids: &[i32],
) -> Result<(), DbErr> {
    let existing: HashMap<i32, project_member::Model> = project_member::Entity::find()
        .filter(project_member::Column::ProjectId.eq(project_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.user_id, m))
        .collect();

    project_member::Entity::delete_many()
        .filter(project_member::Column::ProjectId.eq(project_id))
        .exec(conn)
        .await?;

    if user_ids.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let rows = user_ids.iter().enumerate().map(|(position, user_id)| {
        let joined_at = existing.get(user_id).map(|m| m.joined_at).unwrap_or(now);
        project_member::ActiveModel {
            project_id: Set(project_id),
            user_id: Set(*user_id),
            position: Set(position as i32),
            joined_at: Set(joined_at),
        }
    });
    project_member::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;

    debug!(project_id, count = user_ids.len(), "Replaced project members");
    Ok(())
}

/// Add users after the current members. Returns the ids actually added.
pub async fn append_members<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
    user_ids: &[i32],
) -> Result<Vec<i32>, DbErr> {
    let current = project_member::Entity::find()
        .filter(project_member::Column::ProjectId.eq(project_id))
        .all(conn)
        .await?;

    let mut next_position = current.iter().map(|m| m.position + 1).max().unwrap_or(0);
    let added: Vec<i32> = user_ids
        .iter()
        .copied()
        .filter(|id| !current.iter().any(|m| m.user_id == *id))
        .collect();

    if added.is_empty() {
        return Ok(added);
    }

    let now = Utc::now();
    let mut rows = Vec::with_capacity(added.len());
    for user_id in &added {
        rows.push(project_member::ActiveModel {
            project_id: Set(project_id),
            user_id: Set(*user_id),
            position: Set(next_position),
            joined_at: Set(now),
        });
        next_position += 1;
    }
    project_member::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;

    debug!(project_id, ?added, "Added project members");
    Ok(added)
}

/// Returns the number of memberships removed.
pub async fn remove_members<C: ConnectionTrait>(
    conn: &C,
    project_id: i32,
    user_ids: &[i32],
) -> Result<u64, DbErr> {
    if user_ids.is_empty() {
        return Ok(0);
    }
    let result = project_member::Entity::delete_many()
        .filter(project_member::Column::ProjectId.eq(project_id))
        .filter(project_member::Column::UserId.is_in(user_ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn task_label_ids<C: ConnectionTrait>(conn: &C, task_id: i32) -> Result<Vec<i32>, DbErr> {
    task_label::Entity::find()
        .select_only()
        .column(task_label::Column::LabelId)
        .filter(task_label::Column::TaskId.eq(task_id))
        .order_by_asc(task_label::Column::LabelId)
        .into_tuple::<i32>()
        .all(conn)
        .await
}

pub async fn replace_task_labels<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    label_ids: &[i32],
) -> Result<(), DbErr> {
    task_label::Entity::delete_many()
        .filter(task_label::Column::TaskId.eq(task_id))
        .exec(conn)
        .await?;

    if label_ids.is_empty() {
        return Ok(());
    }

    let rows = label_ids.iter().map(|label_id| task_label::ActiveModel {
        task_id: Set(task_id),
        label_id: Set(*label_id),
    });
    task_label::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}
