//! Methods called by the delivery server and browser clients.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use roomcast_core::subscribe::get_user_info as user_info;
use roomcast_core::{RealtimeError, UserInfo};

use crate::error::ApiError;
use crate::state::AppState;

/// Response envelope shared by every method.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MethodResponse<T> {
    pub message: T,
}

impl<T> MethodResponse<T> {
    pub fn new(message: T) -> Json<Self> {
        Json(Self { message })
    }
}

#[derive(Debug, Deserialize)]
pub struct DocQuery {
    pub doctype: String,
    pub docname: String,
}

/// Names of queued or running tasks for a document. Logged-in users only.
pub async fn get_pending_tasks_for_doc(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DocQuery>,
) -> Result<Json<MethodResponse<Vec<String>>>, ApiError> {
    let session = state.session(&headers).await?;
    if session.is_guest() {
        return Err(RealtimeError::permission_denied("login required").into());
    }

    let tasks = state
        .tasks
        .pending_tasks_for_doc(&query.doctype, &query.docname)
        .await?;
    Ok(MethodResponse::new(tasks))
}

/// Whether the caller may join the room of a document.
pub async fn can_subscribe_doc(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DocQuery>,
) -> Result<Json<MethodResponse<bool>>, ApiError> {
    // Decided before any session lookup.
    if state.subscriptions.is_bypassed() {
        return Ok(MethodResponse::new(true));
    }

    let session = state.session(&headers).await?;
    let allowed = state
        .subscriptions
        .can_subscribe_doc(&session, &query.doctype, &query.docname)
        .await?;
    debug!(user = %session.user, doctype = %query.doctype, docname = %query.docname, "Document subscription allowed");
    Ok(MethodResponse::new(allowed))
}

/// The user behind the caller's session.
pub async fn get_user_info(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MethodResponse<UserInfo>>, ApiError> {
    let session = state.session(&headers).await?;
    Ok(MethodResponse::new(user_info(&session)))
}
