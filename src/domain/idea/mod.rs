pub mod error;
pub mod model;
pub mod service;

pub use error::IdeaServiceError;
pub use model::Idea;
pub use service::{IdeaService, IdeaServiceApi};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for idea endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct IdeaResponse {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of POST /api/ideas and PUT /api/ideas/{id}
#[derive(Debug, Serialize, Deserialize)]
pub struct IdeaRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<Idea> for IdeaResponse {
    fn from(idea: Idea) -> Self {
        Self {
            id: idea.id,
            title: idea.title,
            description: idea.description,
            created_at: idea.created_at,
            updated_at: idea.updated_at,
        }
    }
}
