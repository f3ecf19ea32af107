//! REST front end: `/chat`, `/tools` and the OpenAPI document.

mod dto;
mod error;
mod routes;
mod state;

pub use dto::{ErrorResponse, RestChatRequest, RestChatResponse, ToolListResponse};
pub use error::ServerError;

use crate::application::bridge::{Orchestrator, StepRecord};
use crate::domain::capability::CapabilityDescriptor;
use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use routes::{chat_handler, tools_handler};
use state::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(routes::chat::chat_handler, routes::tools::tools_handler),
    components(schemas(
        RestChatRequest,
        RestChatResponse,
        ErrorResponse,
        ToolListResponse,
        StepRecord,
        CapabilityDescriptor
    )),
    tags(
        (name = "chat", description = "Plan, execute and narrate one instruction"),
        (name = "tools", description = "Capabilities available to the planner")
    )
)]
struct ApiDoc;

/// Build the application router without binding a socket.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let state = Arc::new(ServerState::new(orchestrator));
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/chat", post(chat_handler))
        .route("/tools", get(tools_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(orchestrator: Arc<Orchestrator>, addr: SocketAddr) -> Result<(), ServerError> {
    info!(%addr, "Binding REST server");
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "REST server ready to accept connections");

    axum::serve(listener, router(orchestrator).into_make_service())
        .await
        .map_err(ServerError::Serve)
}
