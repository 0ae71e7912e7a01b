//! HTTP surface of WorkProfit
//!
//! Public routes cover the banner, health and the signup/login pair. Every
//! other `/api/v1` route sits behind [`middleware::require_auth`].

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use sea_orm::DatabaseConnection;
use workprofit_auth::JwtValidator;

use crate::error::ApiError;
use crate::storage::BlobStore;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt: JwtValidator,
    /// Whether `POST /api/v1/auth/register` accepts new accounts
    pub allow_signup: bool,
    pub blobs: Arc<dyn BlobStore>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "WorkProfit API",
        version = "0.1.0",
        description = "Role-based project and task management"
    ),
    paths(
        handlers::system::root,
        handlers::system::health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::projects::create_project,
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::projects::list_members,
        handlers::projects::add_members,
        handlers::projects::remove_project_members,
        handlers::tasks::create_task,
        handlers::tasks::list_tasks,
        handlers::tasks::get_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        handlers::labels::list_labels,
        handlers::labels::create_label,
        handlers::labels::update_label,
        handlers::labels::delete_label,
        handlers::lookups::roles,
        handlers::lookups::departments,
        handlers::lookups::statuses,
        handlers::lookups::priorities,
        handlers::lookups::project_statuses,
        handlers::files::upload_file,
    ),
    components(
        schemas(
            models::ErrorResponse,
            models::HealthResponse,
            models::RootResponse,
            models::RegisterRequest,
            models::LoginRequest,
            models::TokenResponse,
            models::UserResponse,
            models::CreateUserRequest,
            models::UpdateUserRequest,
            models::CreateProjectRequest,
            models::UpdateProjectRequest,
            models::ProjectResponse,
            models::ProjectMembersRequest,
            models::CreateTaskRequest,
            models::UpdateTaskRequest,
            models::TaskResponse,
            models::LabelResponse,
            models::CreateLabelRequest,
            models::UpdateLabelRequest,
            models::UploadResponse,
            workprofit_core::FieldError,
            workprofit_core::Role,
            workprofit_core::Department,
            workprofit_core::ProjectStatus,
            workprofit_core::TaskStatus,
            workprofit_core::TaskPriority,
        )
    ),
    tags(
        (name = "auth", description = "Signup, login and the current user"),
        (name = "users", description = "User administration"),
        (name = "projects", description = "Projects and their members"),
        (name = "tasks", description = "Tasks within projects"),
        (name = "labels", description = "Task labels"),
        (name = "lookups", description = "Enumerations for form dropdowns"),
        (name = "files", description = "File uploads"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Allowed CORS origins; empty disables the CORS layer
    pub cors_origins: Vec<String>,
    /// Request body cap, which bounds uploads
    pub max_upload_bytes: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_origins: Vec::new(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        use handlers::{auth, files, labels, lookups, projects, system, tasks, users};

        let public_router = Router::new()
            .route("/", get(system::root))
            .route("/api/health", get(system::health_check))
            .route("/api/v1/auth/register", post(auth::register))
            .route("/api/v1/auth/login", post(auth::login))
            .with_state(self.state.clone());

        let protected_router = Router::new()
            .route("/api/v1/auth/me", get(auth::me))
            .route("/api/v1/users/me", get(auth::me))
            .route(
                "/api/v1/users",
                get(users::list_users).post(users::create_user),
            )
            .route(
                "/api/v1/users/{id}",
                get(users::get_user)
                    .patch(users::update_user)
                    .delete(users::delete_user),
            )
            .route(
                "/api/v1/projects",
                get(projects::list_projects).post(projects::create_project),
            )
            .route(
                "/api/v1/projects/{id}",
                get(projects::get_project)
                    .patch(projects::update_project)
                    .delete(projects::delete_project),
            )
            .route(
                "/api/v1/projects/{id}/members",
                get(projects::list_members)
                    .post(projects::add_members)
                    .delete(projects::remove_project_members),
            )
            .route(
                "/api/v1/tasks",
                get(tasks::list_tasks).post(tasks::create_task),
            )
            .route(
                "/api/v1/tasks/{id}",
                get(tasks::get_task)
                    .patch(tasks::update_task)
                    .delete(tasks::delete_task),
            )
            .route(
                "/api/v1/labels",
                get(labels::list_labels).post(labels::create_label),
            )
            .route(
                "/api/v1/labels/{id}",
                axum::routing::patch(labels::update_label).delete(labels::delete_label),
            )
            .route("/api/v1/roles", get(lookups::roles))
            .route("/api/v1/departments", get(lookups::departments))
            .route("/api/v1/statuses", get(lookups::statuses))
            .route("/api/v1/priorities", get(lookups::priorities))
            .route(
                "/api/v1/project-statuses",
                get(lookups::project_statuses),
            )
            .route("/api/v1/files/upload", post(files::upload_file))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                self.state.clone(),
                middleware::require_auth,
            ));

        let mut router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
            .merge(public_router)
            .merge(protected_router);

        if let Some(dir) = self.state.blobs.public_dir() {
            router = router.nest_service("/static", ServeDir::new(dir));
        }

        let mut router = router
            .fallback(|| async { ApiError::NotFound("Not Found".to_string()) })
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = self.cors_layer() {
            router = router.layer(cors);
        }

        router
    }

    fn cors_layer(&self) -> Option<CorsLayer> {
        let origins: Vec<HeaderValue> = self
            .config
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        if origins.is_empty() {
            return None;
        }

        Some(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::list(origins)),
        )
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::storage::LocalBlobStore;
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, Set};
    use workprofit_core::{Department, Role};
    use workprofit_db::entities::user;

    pub const TEST_PASSWORD: &str = "password123";

    pub async fn test_state() -> Arc<AppState> {
        let db = workprofit_db::connect("sqlite::memory:").await.unwrap();
        workprofit_db::migrate(&db).await.unwrap();
        let dir = std::env::temp_dir().join(format!("workprofit-test-{}", uuid::Uuid::new_v4()));
        Arc::new(AppState {
            db,
            jwt: JwtValidator::new(b"test-secret"),
            allow_signup: true,
            blobs: Arc::new(LocalBlobStore::new(dir).unwrap()),
        })
    }

    pub async fn insert_user(db: &DatabaseConnection, email: &str, role: Role) -> user::Model {
        user::ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(workprofit_auth::hash_password(TEST_PASSWORD).unwrap()),
            first_name: Set("Test".to_string()),
            last_name: Set("User".to_string()),
            phone_number: Set(None),
            role: Set(role),
            department: Set(role.requires_department().then_some(Department::Developer)),
            avatar_url: Set(None),
            is_active: Set(true),
            last_login: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }
}
