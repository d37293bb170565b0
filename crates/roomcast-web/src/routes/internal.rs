//! Internal publish endpoint for processes that cannot reach Redis directly.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Serialize;
use tracing::info;

use roomcast_core::session::ADMINISTRATOR;
use roomcast_core::{PublishRequest, RealtimeError};

use crate::error::ApiError;
use crate::routes::method::MethodResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub dispatch: &'static str,
    pub flushed: usize,
}

/// Route and publish one event. Deferred events are flushed when the
/// request completes.
pub async fn publish(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PublishRequest>,
) -> Result<(StatusCode, Json<MethodResponse<PublishResponse>>), ApiError> {
    let session = state.session(&headers).await?;
    if session.user != ADMINISTRATOR {
        return Err(RealtimeError::permission_denied("only Administrator may publish").into());
    }

    let mut ctx = state.context(&session);
    let dispatch = state.publisher.publish_realtime(&mut ctx, request).await;
    let flushed = ctx.commit(&state.publisher).await;

    info!(dispatch = dispatch.as_str(), flushed, "Internal publish handled");

    Ok((
        StatusCode::ACCEPTED,
        MethodResponse::new(PublishResponse {
            dispatch: dispatch.as_str(),
            flushed,
        }),
    ))
}
