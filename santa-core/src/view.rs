//! Client-side view of a single group, fed by change notifications.

use crate::lifecycle::{view_assignment, AssignmentView};
use crate::model::{Group, Identity};

/// What one viewer currently knows about a group.
///
/// Notifications may arrive more than once, so [`ViewerState::apply`] only
/// reports a change when the snapshot differs from the one already held.
#[derive(Debug, Clone)]
pub struct ViewerState {
    viewer: Identity,
    group: Option<Group>,
    assignment: AssignmentView,
}

impl ViewerState {
    pub fn new(viewer: Identity) -> Self {
        Self {
            viewer,
            group: None,
            assignment: AssignmentView::Pending,
        }
    }

    /// Replaces the held snapshot. Returns `false` if nothing changed.
    pub fn apply(&mut self, group: Group) -> bool {
        if self.group.as_ref() == Some(&group) {
            return false;
        }
        self.assignment = view_assignment(&group, &self.viewer);
        self.group = Some(group);
        true
    }

    pub fn group(&self) -> Option<&Group> {
        self.group.as_ref()
    }

    pub fn assignment(&self) -> &AssignmentView {
        &self.assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{join, request_draw};
    use crate::model::GroupDraft;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn open_group() -> Group {
        let organizer = Identity::new("a@x", "A");
        let draft = GroupDraft::new("Friends", &organizer).unwrap();
        let mut group = Group::from_draft("g1", draft, 0);
        join(&mut group, Identity::new("b@x", "B").as_member()).unwrap();
        group
    }

    #[test]
    fn repeated_snapshot_is_ignored() {
        let mut state = ViewerState::new(Identity::new("b@x", "B"));
        let group = open_group();

        assert!(state.apply(group.clone()));
        assert!(!state.apply(group));
        assert_eq!(state.assignment(), &AssignmentView::Pending);
    }

    #[test]
    fn draw_snapshot_reveals_recipient() {
        let viewer = Identity::new("b@x", "B");
        let mut state = ViewerState::new(viewer);
        let mut group = open_group();
        state.apply(group.clone());

        request_draw(
            &mut group,
            &Identity::new("a@x", "A"),
            &mut ChaCha8Rng::seed_from_u64(3),
        )
        .unwrap();

        assert!(state.apply(group));
        assert_eq!(state.assignment(), &AssignmentView::Recipient("A".into()));
        assert!(!state.group().unwrap().is_open());
    }
}
