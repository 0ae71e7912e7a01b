//! Database entities

pub mod label;
pub mod project;
pub mod project_member;
pub mod task;
pub mod task_label;
pub mod user;

pub mod prelude {
    pub use super::label::Entity as Label;
    pub use super::project::Entity as Project;
    pub use super::project_member::Entity as ProjectMember;
    pub use super::task::Entity as Task;
    pub use super::task_label::Entity as TaskLabel;
    pub use super::user::Entity as User;
}
