mod handlers;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::engine::Engine;
use crate::generator::ProjectGenerator;

/// The engine as shared between handlers and the clock task.
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Handler state: the engine plus the generation service.
#[derive(Clone)]
pub struct AppContext {
    engine: SharedEngine,
    generator: Arc<dyn ProjectGenerator>,
}

impl AppContext {
    pub fn new(engine: Engine, generator: Arc<dyn ProjectGenerator>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            generator,
        }
    }

    pub fn shared_engine(&self) -> SharedEngine {
        self.engine.clone()
    }

    /// Lock the engine. A panic in another handler leaves the state usable,
    /// so poisoning is ignored.
    pub fn engine(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn create_router(ctx: AppContext) -> Router {
    let api = Router::new()
        // State
        .route("/state", get(handlers::get_state))
        .route("/logs", get(handlers::list_logs))
        .route("/flush", post(handlers::flush))
        // Navigation and palette
        .route("/navigate", post(handlers::navigate))
        .route("/commands", post(handlers::dispatch_command))
        .route("/palette/toggle", post(handlers::toggle_palette))
        .route("/palette/close", post(handlers::close_palette))
        .route("/mobile-menu", put(handlers::set_mobile_menu))
        .route("/antigravity/exit", post(handlers::exit_antigravity))
        // Progression
        .route("/xp", post(handlers::award_xp))
        .route("/modules/advance", post(handlers::advance_module))
        .route("/modules/{id}/current", put(handlers::set_current_module))
        // Project
        .route("/project", put(handlers::update_project))
        .route("/project", delete(handlers::terminate_project))
        .route("/project/generate", post(handlers::generate_project))
        .route("/tasks/{id}/toggle", post(handlers::toggle_task))
        .route("/intensity", put(handlers::set_intensity))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(ctx)
}

/// Advance the engine clock in real time, once per `tick`.
pub fn spawn_clock(engine: SharedEngine, tick: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        let mut last = tokio::time::Instant::now();
        loop {
            let now = interval.tick().await;
            let elapsed = now.saturating_duration_since(last);
            last = now;
            engine
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .advance(elapsed);
        }
    })
}
