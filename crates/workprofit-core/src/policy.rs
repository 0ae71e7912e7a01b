//! Access policy decisions.
//!
//! Every function here is pure: it looks at an [`Actor`] and an already
//! loaded [`ProjectMembership`] and answers yes or no. Callers turn `false`
//! into a 403.

use tracing::instrument;

use crate::membership::{Actor, ProjectMembership};
use crate::roles::Role;

/// Which rows a listing may return for an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every row
    All,
    /// Only projects (and their tasks) led by or including this user
    Scoped(i32),
}

/// ADMIN, PROJECT_MANAGER, or the project's team lead.
#[instrument(
    level = "debug",
    skip(project, actor),
    fields(user_id = actor.id, role = %actor.role, project_id = project.project_id)
)]
pub fn can_manage_project(project: &ProjectMembership, actor: &Actor) -> bool {
    actor.role.is_privileged() || project.is_team_lead(actor.id)
}

/// Managers plus plain members. Gates reads and task creation.
#[instrument(
    level = "debug",
    skip(project, actor),
    fields(user_id = actor.id, role = %actor.role, project_id = project.project_id)
)]
pub fn can_access_project(project: &ProjectMembership, actor: &Actor) -> bool {
    actor.role.is_privileged() || project.is_team_lead(actor.id) || project.is_member(actor.id)
}

/// True when the actor manages the project only because they lead it.
pub fn manages_through_leadership(project: &ProjectMembership, actor: &Actor) -> bool {
    !actor.role.is_privileged() && project.is_team_lead(actor.id)
}

pub fn can_create_project(actor: &Actor) -> bool {
    actor.role.is_privileged()
}

pub fn can_manage_labels(actor: &Actor) -> bool {
    actor.role.is_privileged()
}

pub fn can_administer_users(actor: &Actor) -> bool {
    actor.role == Role::Admin
}

/// Users may read their own record; admins may read anyone's.
#[instrument(level = "debug", skip(actor), fields(user_id = actor.id, target = user_id))]
pub fn can_view_user(actor: &Actor, user_id: i32) -> bool {
    actor.id == user_id || can_administer_users(actor)
}

pub fn visibility(actor: &Actor) -> Visibility {
    if actor.role.is_privileged() {
        Visibility::All
    } else {
        Visibility::Scoped(actor.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ProjectMembership {
        ProjectMembership {
            project_id: 10,
            team_lead_id: Some(2),
            client_id: Some(3),
            member_ids: vec![4, 5],
        }
    }

    #[test]
    fn test_privileged_roles_manage_any_project() {
        let p = project();
        assert!(can_manage_project(&p, &Actor::new(100, Role::Admin)));
        assert!(can_manage_project(&p, &Actor::new(101, Role::ProjectManager)));
    }

    #[test]
    fn test_team_lead_manages_own_project_only() {
        let p = project();
        assert!(can_manage_project(&p, &Actor::new(2, Role::TeamLead)));
        assert!(!can_manage_project(&p, &Actor::new(6, Role::TeamLead)));
    }

    #[test]
    fn test_members_access_but_do_not_manage() {
        let p = project();
        let member = Actor::new(4, Role::Staff);
        assert!(can_access_project(&p, &member));
        assert!(!can_manage_project(&p, &member));
    }

    #[test]
    fn test_client_is_not_implicitly_a_member() {
        let p = project();
        let client = Actor::new(3, Role::Client);
        assert!(!can_access_project(&p, &client));
    }

    #[test]
    fn test_leadership_only_management() {
        let p = project();
        assert!(manages_through_leadership(&p, &Actor::new(2, Role::Staff)));
        assert!(!manages_through_leadership(&p, &Actor::new(2, Role::ProjectManager)));
        assert!(!manages_through_leadership(&p, &Actor::new(4, Role::Staff)));
    }

    #[test]
    fn test_user_and_label_gates() {
        let admin = Actor::new(1, Role::Admin);
        let pm = Actor::new(2, Role::ProjectManager);
        let staff = Actor::new(3, Role::Staff);

        assert!(can_administer_users(&admin));
        assert!(!can_administer_users(&pm));
        assert!(can_manage_labels(&pm));
        assert!(!can_manage_labels(&staff));
        assert!(can_create_project(&pm));
        assert!(!can_create_project(&staff));
        assert!(can_view_user(&staff, 3));
        assert!(!can_view_user(&staff, 1));
        assert!(can_view_user(&admin, 3));
    }

    #[test]
    fn test_visibility() {
        assert_eq!(visibility(&Actor::new(1, Role::Admin)), Visibility::All);
        assert_eq!(
            visibility(&Actor::new(7, Role::TeamLead)),
            Visibility::Scoped(7)
        );
        assert_eq!(visibility(&Actor::new(8, Role::Client)), Visibility::Scoped(8));
    }
}
