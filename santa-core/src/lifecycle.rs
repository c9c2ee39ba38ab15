//! Status-gated transitions on a [`Group`].
//!
//! A group is `Open` until its organizer runs the draw, then `Generated` for
//! good. Joins are only accepted while open; the draw happens exactly once.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::draw::{draw, into_assignments};
use crate::error::{SantaError, SantaResult};
use crate::model::{Group, GroupId, GroupStatus, Identity, Member};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GroupEvent {
    MemberJoined { group_id: GroupId, member: Member },
    DrawCompleted { group_id: GroupId, member_count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "state", content = "recipient")]
pub enum AssignmentView {
    /// The draw has not run yet.
    Pending,
    Recipient(String),
    /// The draw ran without this viewer in it.
    NotIncluded,
}

pub fn join(group: &mut Group, member: Member) -> SantaResult<(JoinOutcome, Vec<GroupEvent>)> {
    if !group.is_open() {
        return Err(SantaError::DrawAlreadyCompleted);
    }

    // A returning member keeps the name they joined with.
    if !group.add_member(member.clone()) {
        return Ok((JoinOutcome::AlreadyMember, Vec::new()));
    }

    Ok((
        JoinOutcome::Joined,
        vec![GroupEvent::MemberJoined {
            group_id: group.id.clone(),
            member,
        }],
    ))
}

/// Checks whether `requester` may run the draw on `group` right now.
pub(crate) fn check_draw(group: &Group, requester: &Identity) -> SantaResult<()> {
    if !group.is_organizer(&requester.email) {
        return Err(SantaError::NotAuthorized);
    }
    if !group.is_open() {
        return Err(SantaError::AlreadyGenerated);
    }
    if group.members.len() < 2 {
        return Err(SantaError::InsufficientMembers {
            found: group.members.len(),
        });
    }
    Ok(())
}

pub fn request_draw<R: Rng + ?Sized>(
    group: &mut Group,
    requester: &Identity,
    rng: &mut R,
) -> SantaResult<Vec<GroupEvent>> {
    check_draw(group, requester)?;

    let assignments = into_assignments(draw(&group.members, rng)?);

    group.assignments = assignments;
    group.status = GroupStatus::Generated;

    Ok(vec![GroupEvent::DrawCompleted {
        group_id: group.id.clone(),
        member_count: group.members.len(),
    }])
}

pub fn view_assignment(group: &Group, viewer: &Identity) -> AssignmentView {
    match group.status {
        GroupStatus::Open => AssignmentView::Pending,
        GroupStatus::Generated => group
            .assignments
            .get(&viewer.email)
            .cloned()
            .map(AssignmentView::Recipient)
            .unwrap_or(AssignmentView::NotIncluded),
    }
}
