use serde::{Deserialize, Serialize};

use crate::model::{Group, GroupId, GroupStatus};

/// One row of a member's dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
    pub organizer_name: String,
    pub status: GroupStatus,
    pub my_match: Option<String>,
}

impl GroupSummary {
    pub fn for_viewer(group: &Group, viewer_email: &str) -> Self {
        let organizer_name = if group.organizer_name.trim().is_empty() {
            group.organizer_email.clone()
        } else {
            group.organizer_name.clone()
        };
        let my_match = match group.status {
            GroupStatus::Generated => group.assignments.get(viewer_email).cloned(),
            GroupStatus::Open => None,
        };

        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            organizer_name,
            status: group.status,
            my_match,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupDraft, Identity, Member};

    fn group() -> Group {
        let draft = GroupDraft::new("Family", &Identity::new("a@x", "Ann")).unwrap();
        let mut group = Group::from_draft("g1", draft, 0);
        group.add_member(Member {
            email: "b@x".into(),
            name: "Ben".into(),
        });
        group
    }

    #[test]
    fn open_group_has_no_match() {
        let summary = GroupSummary::for_viewer(&group(), "b@x");
        assert_eq!(summary.status, GroupStatus::Open);
        assert_eq!(summary.organizer_name, "Ann");
        assert_eq!(summary.my_match, None);
    }

    #[test]
    fn generated_group_shows_own_recipient_only() {
        let mut group = group();
        group.status = GroupStatus::Generated;
        group.assignments.insert("a@x".into(), "Ben".into());
        group.assignments.insert("b@x".into(), "Ann".into());

        let summary = GroupSummary::for_viewer(&group, "b@x");
        assert_eq!(summary.my_match.as_deref(), Some("Ann"));
        assert_eq!(GroupSummary::for_viewer(&group, "c@x").my_match, None);
    }

    #[test]
    fn blank_organizer_name_falls_back_to_email() {
        let mut group = group();
        group.organizer_name = String::new();
        assert_eq!(GroupSummary::for_viewer(&group, "a@x").organizer_name, "a@x");
    }
}
