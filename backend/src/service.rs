//! Group operations over a [`GroupStore`].
//!
//! Each operation reads the group, runs the matching `santa_core` transition
//! on a copy, and writes the result back with a status precondition. A write
//! that loses a race to the draw fails instead of landing on a locked group.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use santa_core::lifecycle;
use santa_core::{
    AssignmentView, Group, GroupDraft, GroupEvent, GroupId, GroupStatus, GroupSummary, Identity,
    JoinOutcome, SantaError,
};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{Condition, GroupPatch, GroupStore, Subscription};

const WHILE_OPEN: Option<Condition> = Some(Condition::StatusIs(GroupStatus::Open));

pub struct GroupService<S> {
    store: S,
    draw_seed: Option<u64>,
}

impl<S: GroupStore> GroupService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            draw_seed: None,
        }
    }

    pub fn with_draw_seed(mut self, seed: Option<u64>) -> Self {
        self.draw_seed = seed;
        self
    }

    pub async fn create_group(&self, organizer: &Identity, name: &str) -> ServiceResult<GroupId> {
        let draft = GroupDraft::new(name, organizer)?;
        let id = self.store.create(draft).await?;
        tracing::info!(group_id = %id, organizer = %organizer.email, "group created");
        Ok(id)
    }

    pub async fn group(&self, group_id: &str) -> ServiceResult<Group> {
        Ok(self.store.get_by_id(group_id).await?)
    }

    /// Adds the caller to an open group. Joining a group one already belongs
    /// to succeeds without writing anything.
    pub async fn join(&self, group_id: &str, caller: &Identity) -> ServiceResult<JoinOutcome> {
        let member = caller.validated()?.as_member();
        let mut group = self.store.get_by_id(group_id).await?;

        let (outcome, events) = lifecycle::join(&mut group, member.clone()).map_err(|err| {
            tracing::info!(group_id, email = %caller.email, %err, "join rejected");
            err
        })?;

        if outcome == JoinOutcome::Joined {
            self.store
                .update_by_id(group_id, GroupPatch::AddMember(member), WHILE_OPEN)
                .await
                .map_err(|err| ServiceError::from_store(err, SantaError::DrawAlreadyCompleted))?;
            record(&events);
        }
        Ok(outcome)
    }

    /// Runs the draw and locks the group. Only the organizer may do this, and
    /// only once.
    pub async fn request_draw(&self, group_id: &str, requester: &Identity) -> ServiceResult<Group> {
        let mut group = self.store.get_by_id(group_id).await?;

        let events = {
            let mut rng = self.rng();
            lifecycle::request_draw(&mut group, requester, &mut rng).map_err(|err| {
                tracing::info!(group_id, email = %requester.email, %err, "draw rejected");
                err
            })?
        };

        let stored = self
            .store
            .update_by_id(
                group_id,
                GroupPatch::CompleteDraw(group.assignments),
                WHILE_OPEN,
            )
            .await
            .map_err(|err| ServiceError::from_store(err, SantaError::AlreadyGenerated))?;

        record(&events);
        Ok(stored)
    }

    pub async fn view_assignment(
        &self,
        group_id: &str,
        viewer: &Identity,
    ) -> ServiceResult<AssignmentView> {
        let group = self.store.get_by_id(group_id).await?;
        Ok(lifecycle::view_assignment(&group, viewer))
    }

    /// Dashboard rows for every group the viewer belongs to.
    pub async fn groups_for(&self, viewer: &Identity) -> ServiceResult<Vec<GroupSummary>> {
        let groups = self.store.query_by_member_email(&viewer.email).await?;
        Ok(groups
            .iter()
            .map(|g| GroupSummary::for_viewer(g, &viewer.email))
            .collect())
    }

    pub async fn subscribe(&self, group_id: &str) -> ServiceResult<Subscription> {
        Ok(self.store.subscribe(group_id).await?)
    }

    fn rng(&self) -> ChaCha8Rng {
        self.draw_seed
            .map(ChaCha8Rng::seed_from_u64)
            .unwrap_or_else(ChaCha8Rng::from_entropy)
    }
}

fn record(events: &[GroupEvent]) {
    for event in events {
        match event {
            GroupEvent::MemberJoined { group_id, member } => {
                tracing::info!(%group_id, email = %member.email, "member joined");
            }
            GroupEvent::DrawCompleted {
                group_id,
                member_count,
            } => {
                tracing::info!(%group_id, member_count, "draw completed");
            }
        }
    }
}
