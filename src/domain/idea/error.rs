use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum IdeaServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("idea not found")]
    NotFound,
}

impl From<AppError> for IdeaServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => IdeaServiceError::Invalid(msg),
            AppError::NotFound(_) => IdeaServiceError::NotFound,
            _ => IdeaServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<IdeaServiceError> for AppError {
    fn from(err: IdeaServiceError) -> Self {
        match err {
            IdeaServiceError::Invalid(msg) => AppError::BadRequest(msg),
            IdeaServiceError::NotFound => AppError::NotFound("Idea not found".to_string()),
            IdeaServiceError::Dependency(msg) => AppError::Internal(msg),
        }
    }
}
