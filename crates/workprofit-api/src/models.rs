use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use workprofit_core::patch::double_option;
use workprofit_core::progress::{duration_days, progress_percentage};
use workprofit_core::{Department, FieldError, ProjectStatus, Role, TaskPriority, TaskStatus};
use workprofit_db::entities::{label, project, task, user};

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Per-field validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Root banner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
}

// ============================================================
// Auth
// ============================================================

/// Self-service signup
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub role: Role,
    /// Required for STAFF, TEAM_LEAD and PROJECT_MANAGER
    #[serde(default)]
    pub department: Option<Department>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token issued on login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always "bearer"
    pub token_type: String,
}

// ============================================================
// Users
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub department: Option<Department>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            phone_number: u.phone_number,
            role: u.role,
            department: u.department,
            avatar_url: u.avatar_url,
            is_active: u.is_active,
            last_login: u.last_login,
            created_at: u.created_at,
        }
    }
}

/// Admin-created account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub department: Option<Department>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Partial user update. `null` clears nullable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone_number: Option<Option<String>>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Department>)]
    pub department: Option<Option<Department>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub avatar_url: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Offset pagination
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Rows to skip (default 0)
    pub skip: Option<u64>,
    /// Maximum rows (default 100, capped at 1000)
    pub limit: Option<u64>,
}

impl PageQuery {
    /// Row offset; the store binds offsets as signed 64-bit integers.
    pub fn offset(&self) -> u64 {
        self.skip.unwrap_or(0).min(i64::MAX as u64)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(100).clamp(1, 1000)
    }
}

// ============================================================
// Projects
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_id: Option<i32>,
    #[serde(default)]
    pub team_lead_id: Option<i32>,
    pub start_date: NaiveDate,
    /// Must be after `start_date`
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Initial members, deduplicated in order
    #[serde(default)]
    pub member_ids: Vec<i32>,
}

/// Partial project update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub client_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub team_lead_id: Option<Option<i32>>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    /// Replaces the whole member list when present
    #[serde(default)]
    pub member_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub client_id: Option<i32>,
    pub team_lead_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    /// Members in the order they joined
    pub member_ids: Vec<i32>,
    /// Elapsed share of the timeline, 0 to 100
    pub progress_percentage: f64,
    pub duration_days: i64,
}

impl ProjectResponse {
    pub fn from_model(p: project::Model, member_ids: Vec<i32>, today: NaiveDate) -> Self {
        Self {
            progress_percentage: progress_percentage(p.start_date, p.end_date, today),
            duration_days: duration_days(p.start_date, p.end_date),
            id: p.id,
            name: p.name,
            description: p.description,
            client_id: p.client_id,
            team_lead_id: p.team_lead_id,
            start_date: p.start_date,
            end_date: p.end_date,
            status: p.status,
            created_at: p.created_at,
            member_ids,
        }
    }
}

/// User ids to add to or remove from a project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectMembersRequest {
    pub user_ids: Vec<i32>,
}

// ============================================================
// Tasks
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub project_id: i32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee_id: Option<i32>,
    #[serde(default)]
    pub label_ids: Vec<i32>,
}

/// Partial task update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub assignee_id: Option<Option<i32>>,
    /// Replaces the task's labels when present
    #[serde(default)]
    pub label_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub id: i32,
    pub project_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<i32>,
    pub labels: Vec<LabelResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    pub fn from_model(t: task::Model, labels: Vec<label::Model>) -> Self {
        Self {
            id: t.id,
            project_id: t.project_id,
            title: t.title,
            description: t.description,
            status: t.status,
            priority: t.priority,
            due_date: t.due_date,
            assignee_id: t.assignee_id,
            labels: labels.into_iter().map(LabelResponse::from).collect(),
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    /// Only tasks of this project
    pub project_id: Option<i32>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

// ============================================================
// Labels
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LabelResponse {
    pub id: i32,
    pub name: String,
    pub color: String,
}

impl From<label::Model> for LabelResponse {
    fn from(l: label::Model) -> Self {
        Self {
            id: l.id,
            name: l.name,
            color: l.color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateLabelRequest {
    pub name: String,
    /// Defaults to `#3B82F6`
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateLabelRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

// ============================================================
// Files
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Public path of the stored blob, under `/static/`
    pub url: String,
    /// Name the client uploaded
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_bounds() {
        let page = PageQuery::default();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 100);

        let page = PageQuery {
            skip: Some(u64::MAX),
            limit: Some(0),
        };
        assert_eq!(page.offset(), i64::MAX as u64);
        assert_eq!(page.limit(), 1);

        let page = PageQuery {
            skip: Some(20),
            limit: Some(5000),
        };
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 1000);
    }
}
