use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("price provider error ({provider}): {msg}")]
    Provider { provider: String, msg: String },

    #[error("WebSocket error: {0}")]
    WebSocket(String),
}
