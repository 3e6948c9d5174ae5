use shilu_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error at {path}: {message}")]
    Storage { path: String, message: String },

    #[error("batch article not found: {0}")]
    BatchArticleNotFound(String),
}
