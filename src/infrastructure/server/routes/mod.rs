pub mod chat;
pub mod tools;

pub use chat::chat_handler;
pub use tools::tools_handler;
