use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use santa_core::{
    AssignmentView, Group, GroupStatus, GroupSummary, Identity, JoinOutcome, Member, ViewerState,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod service;
pub mod store;

use auth::Caller;
use error::ServiceResult;
use service::GroupService;
use store::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    service: Arc<GroupService<MemoryStore>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GroupService::new(MemoryStore::default()))
    }
}

impl AppState {
    pub fn new(service: GroupService<MemoryStore>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/group", post(create_group))
        .route("/groups", get(list_groups))
        .route("/group/:id", get(get_group))
        .route("/group/:id/join", post(join_group))
        .route("/group/:id/draw", post(draw))
        .route("/group/:id/assignment", get(get_assignment))
        .route("/ws/:id", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateGroupRequest {
    name: String,
}

#[derive(Serialize)]
struct CreateGroupResponse {
    group_id: String,
}

#[derive(Serialize)]
struct JoinResponse {
    group_id: String,
    joined: bool,
}

#[derive(Serialize)]
struct DrawResponse {
    status: GroupStatus,
    member_count: usize,
}

#[derive(Serialize)]
struct AssignmentResponse {
    assignment: AssignmentView,
}

/// Everything about a group except who drew whom.
#[derive(Clone, Debug, Serialize)]
struct GroupView {
    id: String,
    name: String,
    organizer_email: String,
    organizer_name: String,
    members: Vec<Member>,
    status: GroupStatus,
    created_at: u64,
}

impl From<&Group> for GroupView {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            organizer_email: group.organizer_email.clone(),
            organizer_name: group.organizer_name.clone(),
            members: group.members.clone(),
            status: group.status,
            created_at: group.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    State {
        group: GroupView,
        assignment: AssignmentView,
    },
    Error {
        message: String,
    },
}

async fn create_group(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(payload): Json<CreateGroupRequest>,
) -> ServiceResult<impl IntoResponse> {
    let group_id = state.service.create_group(&caller, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(CreateGroupResponse { group_id })))
}

async fn list_groups(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ServiceResult<Json<Vec<GroupSummary>>> {
    Ok(Json(state.service.groups_for(&caller).await?))
}

async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Caller(_caller): Caller,
) -> ServiceResult<Json<GroupView>> {
    let group = state.service.group(group_id.trim()).await?;
    Ok(Json(GroupView::from(&group)))
}

async fn join_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Caller(caller): Caller,
) -> ServiceResult<Json<JoinResponse>> {
    let group_id = group_id.trim().to_string();
    let outcome = state.service.join(&group_id, &caller).await?;
    Ok(Json(JoinResponse {
        group_id,
        joined: outcome == JoinOutcome::Joined,
    }))
}

async fn draw(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Caller(caller): Caller,
) -> ServiceResult<Json<DrawResponse>> {
    let group = state.service.request_draw(group_id.trim(), &caller).await?;
    Ok(Json(DrawResponse {
        status: group.status,
        member_count: group.assignments.len(),
    }))
}

async fn get_assignment(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Caller(caller): Caller,
) -> ServiceResult<Json<AssignmentResponse>> {
    let assignment = state
        .service
        .view_assignment(group_id.trim(), &caller)
        .await?;
    Ok(Json(AssignmentResponse { assignment }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Caller(caller): Caller,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, group_id, caller))
}

async fn handle_socket(stream: WebSocket, state: AppState, group_id: String, caller: Identity) {
    let (mut sender, mut receiver) = stream.split();

    // Subscribe before reading the snapshot so no change slips in between.
    let subscription = state.service.subscribe(&group_id).await;
    let snapshot = state.service.group(&group_id).await;
    let (mut subscription, snapshot) = match (subscription, snapshot) {
        (Ok(sub), Ok(group)) if group.has_member(&caller.email) => (sub, group),
        (Ok(_), Ok(_)) => {
            let _ = send(&mut sender, &ServerMessage::Error {
                message: "not a member of this group".into(),
            })
            .await;
            return;
        }
        (Err(err), _) | (_, Err(err)) => {
            let _ = send(&mut sender, &ServerMessage::Error {
                message: err.to_string(),
            })
            .await;
            return;
        }
    };

    let mut view = ViewerState::new(caller);
    view.apply(snapshot);
    if send(&mut sender, &state_message(&view)).await.is_err() {
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(group) = subscription.next().await {
            if view.apply(group) && send(&mut sender, &state_message(&view)).await.is_err() {
                break;
            }
        }
    });

    // Nothing is expected from the client; read only to notice the close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

fn state_message(view: &ViewerState) -> ServerMessage {
    match view.group() {
        Some(group) => ServerMessage::State {
            group: GroupView::from(group),
            assignment: view.assignment().clone(),
        },
        None => ServerMessage::Error {
            message: "no snapshot yet".into(),
        },
    }
}

async fn send<S>(sender: &mut S, message: &ServerMessage) -> Result<(), ()>
where
    S: futures::Sink<Message> + Unpin,
{
    let text = serde_json::to_string(message).map_err(|err| {
        tracing::error!(%err, "could not encode server message");
    })?;
    sender.send(Message::Text(text)).await.map_err(|_| ())
}
