// Error types for setup and the window/GPU front end

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    /// Bad command-line input
    #[error("Config error: {0}")]
    Config(String),

    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("No suitable graphics adapter found")]
    Adapter,

    #[error("Device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, GameError>;
