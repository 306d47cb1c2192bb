use axum::Router;
use std::sync::Arc;

use crate::controllers::idea::IdeaController;
use crate::domain::idea::IdeaService;
use crate::error::AppResult;
use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;
use crate::infrastructure::http::build_router;
use crate::infrastructure::repositories::IdeaRepository;

/// A fully wired application: configuration, database pool and router.
pub struct App {
    pub config: Arc<Config>,
    pub pool: Arc<DbPool>,
    pub router: Router,
}

impl App {
    /// Compose repositories, services, controllers and routes.
    ///
    /// Performs no I/O. Nothing in here fails today; the `Result` leaves room
    /// for components that validate their configuration on construction.
    pub fn new(config: Config, pool: DbPool) -> AppResult<Self> {
        let config = Arc::new(config);
        let pool = Arc::new(pool);

        // 1. Repositories (inject db pool)
        let idea_repo = Arc::new(IdeaRepository::new(pool.clone()));

        // 2. Services (inject repositories)
        let idea_service = Arc::new(IdeaService::new(idea_repo));

        // 3. Controllers (inject services)
        let idea_controller = Arc::new(IdeaController::new(idea_service));

        // 4. Routes
        let router = build_router(pool.clone(), idea_controller);

        tracing::debug!("Application assembled");

        Ok(Self {
            config,
            pool,
            router,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
