use super::error::IdeaServiceError;
use crate::domain::idea::{IdeaRequest, IdeaResponse};
use crate::infrastructure::repositories::IdeaRepository;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

const MAX_TITLE_LENGTH: usize = 200;

pub struct IdeaService {
    idea_repo: Arc<IdeaRepository>,
}

impl IdeaService {
    pub fn new(idea_repo: Arc<IdeaRepository>) -> Self {
        Self { idea_repo }
    }
}

#[async_trait]
pub trait IdeaServiceApi: Send + Sync {
    async fn list_ideas(&self) -> Result<Vec<IdeaResponse>, IdeaServiceError>;

    async fn get_idea(&self, idea_id: Uuid) -> Result<IdeaResponse, IdeaServiceError>;

    async fn create_idea(&self, request: IdeaRequest) -> Result<IdeaResponse, IdeaServiceError>;

    async fn update_idea(
        &self,
        idea_id: Uuid,
        request: IdeaRequest,
    ) -> Result<IdeaResponse, IdeaServiceError>;

    async fn delete_idea(&self, idea_id: Uuid) -> Result<(), IdeaServiceError>;
}

#[async_trait]
impl IdeaServiceApi for IdeaService {
    async fn list_ideas(&self) -> Result<Vec<IdeaResponse>, IdeaServiceError> {
        let ideas = self.idea_repo.find_all().await?;
        Ok(ideas.into_iter().map(IdeaResponse::from).collect())
    }

    async fn get_idea(&self, idea_id: Uuid) -> Result<IdeaResponse, IdeaServiceError> {
        self.idea_repo
            .find_by_id(idea_id)
            .await?
            .map(IdeaResponse::from)
            .ok_or(IdeaServiceError::NotFound)
    }

    async fn create_idea(&self, request: IdeaRequest) -> Result<IdeaResponse, IdeaServiceError> {
        let request = normalize(request)?;

        let idea = self
            .idea_repo
            .create(Uuid::new_v4(), &request.title, request.description.as_deref())
            .await?;

        tracing::info!(idea_id = %idea.id, "Idea created");
        Ok(idea.into())
    }

    async fn update_idea(
        &self,
        idea_id: Uuid,
        request: IdeaRequest,
    ) -> Result<IdeaResponse, IdeaServiceError> {
        let request = normalize(request)?;

        self.idea_repo
            .update(idea_id, &request.title, request.description.as_deref())
            .await?
            .map(IdeaResponse::from)
            .ok_or(IdeaServiceError::NotFound)
    }

    async fn delete_idea(&self, idea_id: Uuid) -> Result<(), IdeaServiceError> {
        if !self.idea_repo.delete(idea_id).await? {
            return Err(IdeaServiceError::NotFound);
        }

        tracing::info!(idea_id = %idea_id, "Idea deleted");
        Ok(())
    }
}

/// Trim fields, drop blank descriptions and enforce the title bounds.
fn normalize(request: IdeaRequest) -> Result<IdeaRequest, IdeaServiceError> {
    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(IdeaServiceError::Invalid("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(IdeaServiceError::Invalid(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }

    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(IdeaRequest { title, description })
}
