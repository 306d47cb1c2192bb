use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::idea::{IdeaRequest, IdeaResponse};
use crate::{
    domain::idea::{IdeaService, IdeaServiceApi},
    error::AppResult,
};

pub struct IdeaController {
    idea_service: Arc<IdeaService>,
}

impl IdeaController {
    pub fn new(idea_service: Arc<IdeaService>) -> Self {
        Self { idea_service }
    }

    /// GET /api/ideas - List ideas
    pub async fn list_ideas(
        State(controller): State<Arc<IdeaController>>,
    ) -> AppResult<Json<Vec<IdeaResponse>>> {
        let ideas = controller.idea_service.list_ideas().await?;
        Ok(Json(ideas))
    }

    /// POST /api/ideas - Create idea
    pub async fn create_idea(
        State(controller): State<Arc<IdeaController>>,
        request: Result<Json<IdeaRequest>, JsonRejection>,
    ) -> AppResult<(StatusCode, Json<IdeaResponse>)> {
        let Json(request) = request?;
        let idea = controller.idea_service.create_idea(request).await?;
        Ok((StatusCode::CREATED, Json(idea)))
    }

    /// GET /api/ideas/{ideaId}
    pub async fn get_idea(
        State(controller): State<Arc<IdeaController>>,
        idea_id: Result<Path<Uuid>, PathRejection>,
    ) -> AppResult<Json<IdeaResponse>> {
        let Path(idea_id) = idea_id?;
        let idea = controller.idea_service.get_idea(idea_id).await?;
        Ok(Json(idea))
    }

    /// PUT /api/ideas/{ideaId} - Replace title and description
    pub async fn update_idea(
        State(controller): State<Arc<IdeaController>>,
        idea_id: Result<Path<Uuid>, PathRejection>,
        request: Result<Json<IdeaRequest>, JsonRejection>,
    ) -> AppResult<Json<IdeaResponse>> {
        let Path(idea_id) = idea_id?;
        let Json(request) = request?;
        let idea = controller.idea_service.update_idea(idea_id, request).await?;
        Ok(Json(idea))
    }

    /// DELETE /api/ideas/{ideaId}
    pub async fn delete_idea(
        State(controller): State<Arc<IdeaController>>,
        idea_id: Result<Path<Uuid>, PathRejection>,
    ) -> AppResult<StatusCode> {
        let Path(idea_id) = idea_id?;
        controller.idea_service.delete_idea(idea_id).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
