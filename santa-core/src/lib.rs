//! Group lifecycle and gift-assignment draw for Secret Santa groups.
//!
//! Everything in this crate is pure: transitions take a [`Group`] and an
//! explicit caller identity, and the draw takes an injected random source.
//! Persistence and change delivery live with the caller.

pub mod draw;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod summary;
pub mod view;

pub use draw::{draw, into_assignments, pair_in_order, shuffled, Pairing};
pub use error::{SantaError, SantaResult};
pub use lifecycle::{
    join, request_draw, view_assignment, AssignmentView, GroupEvent, JoinOutcome,
};
pub use model::{Assignments, Group, GroupDraft, GroupId, GroupStatus, Identity, Member};
pub use summary::GroupSummary;
pub use view::ViewerState;
