//! Structural and role-scoped rules on user, project and task mutations.
//!
//! Structural checks accumulate into [`ValidationErrors`] so one pass can
//! report every violation. Rules that depend on another entity's role return
//! a [`DomainError`] directly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{DomainError, DomainResult};
use crate::membership::{Actor, ProjectMembership};
use crate::policy::manages_through_leadership;
use crate::roles::{Department, Role};

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every structural violation found in a single validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

pub fn check_not_blank(field: &str, value: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.push(field, format!("{} must not be empty", field));
    }
}

/// Loose shape check: one `@` with text on both sides and a dotted domain.
pub fn check_email(email: &str, errors: &mut ValidationErrors) {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        errors.push("email", format!("'{}' is not a valid email address", email));
    }
}

pub fn check_timeline(start: NaiveDate, end: NaiveDate, errors: &mut ValidationErrors) {
    if end <= start {
        errors.push(
            "end_date",
            format!(
                "End date ({}) must be after start date ({})",
                end, start
            ),
        );
    }
}

/// Dates to re-check after a patch, or `None` when neither date is patched.
pub fn effective_timeline(
    stored_start: NaiveDate,
    stored_end: NaiveDate,
    patch_start: Option<NaiveDate>,
    patch_end: Option<NaiveDate>,
) -> Option<(NaiveDate, NaiveDate)> {
    if patch_start.is_none() && patch_end.is_none() {
        return None;
    }
    Some((
        patch_start.unwrap_or(stored_start),
        patch_end.unwrap_or(stored_end),
    ))
}

pub fn check_department(role: Role, department: Option<Department>, errors: &mut ValidationErrors) {
    if role.requires_department() && department.is_none() {
        errors.push(
            "department",
            format!("Department is required for role '{}'", role),
        );
    }
}

pub fn check_team_lead_role(user_id: i32, role: Role) -> DomainResult<()> {
    if role.can_lead_projects() {
        Ok(())
    } else {
        Err(DomainError::Rule(format!(
            "User {} has role '{}'. Team Lead must have role TEAM_LEAD or STAFF.",
            user_id, role
        )))
    }
}

pub fn check_client_role(user_id: i32, role: Role) -> DomainResult<()> {
    if role == Role::Client {
        Ok(())
    } else {
        Err(DomainError::Rule(format!(
            "User {} has role '{}'. Client must have role CLIENT.",
            user_id, role
        )))
    }
}

/// Leaders who are not ADMIN/PM may edit their project but not reassign
/// its team lead or client.
///
/// A patch that repeats the stored value is not a change.
pub fn check_field_locks(
    project: &ProjectMembership,
    actor: &Actor,
    team_lead_patch: Option<Option<i32>>,
    client_patch: Option<Option<i32>>,
) -> DomainResult<()> {
    if !manages_through_leadership(project, actor) {
        return Ok(());
    }
    if let Some(requested) = team_lead_patch {
        if requested != project.team_lead_id {
            return Err(DomainError::FieldLocked(
                "Team leads cannot change the team lead of a project".to_string(),
            ));
        }
    }
    if let Some(requested) = client_patch {
        if requested != project.client_id {
            return Err(DomainError::FieldLocked(
                "Team leads cannot change the client of a project".to_string(),
            ));
        }
    }
    Ok(())
}

/// An assignee works on the project (lead or member) or oversees every project.
pub fn check_assignee(
    project: &ProjectMembership,
    assignee_id: i32,
    assignee_role: Role,
) -> DomainResult<()> {
    if assignee_role.is_privileged()
        || project.is_team_lead(assignee_id)
        || project.is_member(assignee_id)
    {
        Ok(())
    } else {
        Err(DomainError::Rule(format!(
            "User {} is not a member of project {} and cannot be assigned its tasks",
            assignee_id, project.project_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project() -> ProjectMembership {
        ProjectMembership {
            project_id: 1,
            team_lead_id: Some(2),
            client_id: Some(3),
            member_ids: vec![4],
        }
    }

    #[test]
    fn test_timeline_rejects_equal_dates() {
        let mut errors = ValidationErrors::new();
        check_timeline(date(2025, 1, 1), date(2025, 1, 1), &mut errors);
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(
            errors.errors()[0].message,
            "End date (2025-01-01) must be after start date (2025-01-01)"
        );

        let mut errors = ValidationErrors::new();
        check_timeline(date(2025, 1, 1), date(2025, 1, 2), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_effective_timeline_only_when_patched() {
        let start = date(2025, 1, 1);
        let end = date(2025, 3, 1);
        assert_eq!(effective_timeline(start, end, None, None), None);
        assert_eq!(
            effective_timeline(start, end, None, Some(date(2024, 12, 1))),
            Some((start, date(2024, 12, 1)))
        );
        assert_eq!(
            effective_timeline(start, end, Some(date(2025, 2, 1)), None),
            Some((date(2025, 2, 1), end))
        );
    }

    #[test]
    fn test_department_rule() {
        for role in [Role::Staff, Role::TeamLead, Role::ProjectManager] {
            let mut errors = ValidationErrors::new();
            check_department(role, None, &mut errors);
            assert!(!errors.is_empty(), "{} without department must fail", role);

            let mut errors = ValidationErrors::new();
            check_department(role, Some(Department::Qa), &mut errors);
            assert!(errors.is_empty());
        }
        for role in [Role::Admin, Role::Client] {
            let mut errors = ValidationErrors::new();
            check_department(role, None, &mut errors);
            assert!(errors.is_empty());
        }
    }

    #[test]
    fn test_errors_accumulate() {
        let mut errors = ValidationErrors::new();
        check_not_blank("name", "  ", &mut errors);
        check_email("nobody", &mut errors);
        check_timeline(date(2025, 2, 1), date(2025, 1, 1), &mut errors);
        assert_eq!(errors.errors().len(), 3);
        assert!(errors.clone().into_result().is_err());
    }

    #[test]
    fn test_email_shape() {
        let mut errors = ValidationErrors::new();
        check_email("alice@example.com", &mut errors);
        assert!(errors.is_empty());
        for bad in ["@example.com", "alice@", "alice@example", "a@b@c.com"] {
            let mut errors = ValidationErrors::new();
            check_email(bad, &mut errors);
            assert!(!errors.is_empty(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_reference_roles() {
        assert!(check_team_lead_role(1, Role::TeamLead).is_ok());
        assert!(check_team_lead_role(1, Role::Staff).is_ok());
        let err = check_team_lead_role(1, Role::Client).unwrap_err();
        assert_eq!(
            err.to_string(),
            "User 1 has role 'CLIENT'. Team Lead must have role TEAM_LEAD or STAFF."
        );
        assert!(check_client_role(2, Role::Client).is_ok());
        assert!(matches!(
            check_client_role(2, Role::Staff),
            Err(DomainError::Rule(_))
        ));
    }

    #[test]
    fn test_team_lead_cannot_reassign_locked_fields() {
        let p = project();
        let lead = Actor::new(2, Role::TeamLead);

        assert!(matches!(
            check_field_locks(&p, &lead, Some(Some(9)), None),
            Err(DomainError::FieldLocked(_))
        ));
        assert!(matches!(
            check_field_locks(&p, &lead, None, Some(None)),
            Err(DomainError::FieldLocked(_))
        ));
        assert!(check_field_locks(&p, &lead, Some(Some(2)), Some(Some(3))).is_ok());
        assert!(check_field_locks(&p, &lead, None, None).is_ok());
    }

    #[test]
    fn test_privileged_roles_bypass_field_locks() {
        let p = project();
        let pm = Actor::new(2, Role::ProjectManager);
        assert!(check_field_locks(&p, &pm, Some(Some(9)), Some(None)).is_ok());
    }

    #[test]
    fn test_assignee_rule() {
        let p = project();
        assert!(check_assignee(&p, 4, Role::Staff).is_ok());
        assert!(check_assignee(&p, 2, Role::TeamLead).is_ok());
        assert!(check_assignee(&p, 50, Role::ProjectManager).is_ok());
        assert!(check_assignee(&p, 51, Role::Admin).is_ok());
        assert!(matches!(
            check_assignee(&p, 6, Role::Staff),
            Err(DomainError::Rule(_))
        ));
        assert!(check_assignee(&p, 3, Role::Client).is_err());
    }
}
