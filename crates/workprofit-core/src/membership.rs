//! Project membership snapshots

use crate::roles::Role;

/// The authenticated user as seen by policy decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i32, role: Role) -> Self {
        Self { id, role }
    }
}

/// Who is attached to a project, materialized from the store.
///
/// `member_ids` keeps insertion order and never contains duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMembership {
    pub project_id: i32,
    pub team_lead_id: Option<i32>,
    pub client_id: Option<i32>,
    pub member_ids: Vec<i32>,
}

impl ProjectMembership {
    pub fn is_team_lead(&self, user_id: i32) -> bool {
        self.team_lead_id == Some(user_id)
    }

    pub fn is_member(&self, user_id: i32) -> bool {
        self.member_ids.contains(&user_id)
    }
}

/// Drop repeated ids, keeping the first occurrence of each.
pub fn dedupe_ids(ids: &[i32]) -> Vec<i32> {
    let mut out: Vec<i32> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

/// Ids from `requested` that are absent from `found`, in request order.
pub fn missing_ids(requested: &[i32], found: &[i32]) -> Vec<i32> {
    requested
        .iter()
        .filter(|id| !found.contains(id))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_preserves_first_occurrence_order() {
        assert_eq!(dedupe_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedupe_ids(&[]).is_empty());
    }

    #[test]
    fn test_missing_ids_reports_all_unresolved() {
        assert_eq!(missing_ids(&[1, 7, 2, 9], &[2, 1]), vec![7, 9]);
        assert!(missing_ids(&[1, 2], &[1, 2]).is_empty());
    }

    #[test]
    fn test_membership_lookups() {
        let membership = ProjectMembership {
            project_id: 1,
            team_lead_id: Some(5),
            client_id: Some(9),
            member_ids: vec![6, 7],
        };
        assert!(membership.is_team_lead(5));
        assert!(!membership.is_team_lead(6));
        assert!(membership.is_member(7));
        assert!(!membership.is_member(9));
    }
}
