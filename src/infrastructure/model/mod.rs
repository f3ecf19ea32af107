//! Planning model infrastructure
//!
//! # Structure
//! - `types` - Request, Response, Error types
//! - `traits` - ChatCompletionClient trait
//! - `clients` - HTTP client implementations

pub mod clients;
pub mod traits;
pub mod types;

pub use clients::OpenAICompatibleClient;
pub use traits::ChatCompletionClient;
pub use types::{CompletionMessage, CompletionRequest, ModelError};
