pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_ENDPOINT: &str = "https://api.deepseek.com";
pub const DEFAULT_API_PATH: &str = "/v1/chat/completions";
pub const DEFAULT_API_KEY_ENV: &str = "DEEPSEEK_API_KEY";
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_NARRATION_PROMPT: &str = "把回复改成一条简洁口语化的表达";
