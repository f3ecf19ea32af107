use super::super::dto::{ErrorResponse, RestChatRequest, RestChatResponse};
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{error, info};

#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = RestChatRequest,
    responses(
        (status = 200, description = "Instruction planned, executed and narrated", body = RestChatResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Model or tool servers could not complete the turn", body = ErrorResponse)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<RestChatRequest>,
) -> Result<Json<RestChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    info!("Received /chat request");

    let prompt = payload.prompt.trim();
    if prompt.is_empty() {
        error!("Rejecting /chat request due to empty prompt");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("prompt cannot be empty")),
        ));
    }

    match state.orchestrator().handle_turn(prompt).await {
        Ok(outcome) => {
            info!(turn_id = outcome.turn_id.as_str(), "Chat request completed");
            Ok(Json(outcome.into()))
        }
        Err(err) => {
            error!(%err, "Chat request failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: err.user_message(),
                    raw_result: err.raw_result().map(str::to_string),
                }),
            ))
        }
    }
}
