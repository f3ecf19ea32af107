use super::super::dto::{ErrorResponse, ToolListResponse};
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{debug, error};

#[utoipa::path(
    get,
    path = "/tools",
    tag = "tools",
    responses(
        (status = 200, description = "Capabilities advertised by the configured MCP servers", body = ToolListResponse),
        (status = 502, description = "Capability listing failed", body = ErrorResponse)
    )
)]
pub async fn tools_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ToolListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let orchestrator = state.orchestrator();
    match orchestrator.directory().list().await {
        Ok(tools) => {
            debug!(tool_count = tools.len(), "Serving /tools request");
            Ok(Json(ToolListResponse {
                tools: tools.to_vec(),
            }))
        }
        Err(err) => {
            error!(%err, "Capability listing failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(err.user_message())),
            ))
        }
    }
}
