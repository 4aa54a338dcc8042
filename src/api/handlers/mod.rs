use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppContext;
use crate::engine::{Advance, EngineError, GenerationRequest, Snapshot};
use crate::generator;
use crate::models::{Action, LogEntry, Tab};
use crate::store::FlushReport;

// ============================================================
// Error Handling
// ============================================================

type ApiError = (StatusCode, String);

/// Map engine rejections onto client-facing status codes.
fn engine_error(e: EngineError) -> ApiError {
    let status = match e {
        EngineError::EmptyIdea | EngineError::NonPositiveAmount => StatusCode::BAD_REQUEST,
        EngineError::TaskNotFound(_) | EngineError::ModuleUnavailable(_) => StatusCode::NOT_FOUND,
        EngineError::GenerationInFlight => StatusCode::CONFLICT,
    };
    tracing::warn!("Rejected request: {}", e);
    (status, e.to_string())
}

// ============================================================
// Request / response bodies
// ============================================================

#[derive(Debug, Deserialize)]
pub struct NavigateInput {
    pub tab: Tab,
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub resolution: String,
    pub snapshot: Snapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaletteResponse {
    pub open: bool,
}

#[derive(Debug, Deserialize)]
pub struct MobileMenuInput {
    pub open: bool,
}

#[derive(Debug, Deserialize)]
pub struct AwardXpInput {
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AwardXpResponse {
    pub xp: u64,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceInput {
    pub delta: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdvanceResponse {
    pub module_id: Option<String>,
    pub progress: Option<u8>,
    pub completed: bool,
}

/// Partial project update. Absent fields are left alone.
#[derive(Debug, Deserialize)]
pub struct UpdateProjectInput {
    pub idea: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateInput {
    pub idea: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub applied: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleTaskResponse {
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct IntensityInput {
    pub value: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IntensityResponse {
    pub value: u8,
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// State
// ============================================================

pub async fn get_state(State(ctx): State<AppContext>) -> Json<Snapshot> {
    Json(ctx.engine().snapshot())
}

pub async fn list_logs(State(ctx): State<AppContext>) -> Json<Vec<LogEntry>> {
    Json(ctx.engine().state().logs.to_vec())
}

pub async fn flush(State(ctx): State<AppContext>) -> Json<FlushReport> {
    Json(ctx.engine().flush())
}

// ============================================================
// Navigation and palette
// ============================================================

pub async fn navigate(
    State(ctx): State<AppContext>,
    Json(input): Json<NavigateInput>,
) -> Json<Snapshot> {
    let mut engine = ctx.engine();
    engine.navigate(input.tab);
    Json(engine.snapshot())
}

pub async fn dispatch_command(
    State(ctx): State<AppContext>,
    Json(action): Json<Action>,
) -> Json<DispatchResponse> {
    let mut engine = ctx.engine();
    let resolution = engine.dispatch(&action);
    Json(DispatchResponse {
        resolution: resolution.as_str().to_string(),
        snapshot: engine.snapshot(),
    })
}

pub async fn toggle_palette(State(ctx): State<AppContext>) -> Json<PaletteResponse> {
    let open = ctx.engine().toggle_palette();
    Json(PaletteResponse { open })
}

pub async fn close_palette(State(ctx): State<AppContext>) -> Json<PaletteResponse> {
    ctx.engine().close_palette();
    Json(PaletteResponse { open: false })
}

pub async fn set_mobile_menu(
    State(ctx): State<AppContext>,
    Json(input): Json<MobileMenuInput>,
) -> StatusCode {
    ctx.engine().set_mobile_menu(input.open);
    StatusCode::NO_CONTENT
}

pub async fn exit_antigravity(State(ctx): State<AppContext>) -> StatusCode {
    ctx.engine().exit_antigravity();
    StatusCode::NO_CONTENT
}

// ============================================================
// Progression
// ============================================================

pub async fn award_xp(
    State(ctx): State<AppContext>,
    Json(input): Json<AwardXpInput>,
) -> Result<Json<AwardXpResponse>, ApiError> {
    let xp = ctx.engine().award_xp(input.amount).map_err(engine_error)?;
    Ok(Json(AwardXpResponse { xp }))
}

pub async fn advance_module(
    State(ctx): State<AppContext>,
    Json(input): Json<AdvanceInput>,
) -> Result<Json<AdvanceResponse>, ApiError> {
    let result = ctx
        .engine()
        .advance_current_module(input.delta)
        .map_err(engine_error)?;

    let response = match result {
        Advance::NoCurrent => AdvanceResponse {
            module_id: None,
            progress: None,
            completed: false,
        },
        Advance::Progressed { module_id, progress } => AdvanceResponse {
            module_id: Some(module_id),
            progress: Some(progress),
            completed: false,
        },
        Advance::Completed { module_id } => AdvanceResponse {
            module_id: Some(module_id),
            progress: Some(100),
            completed: true,
        },
    };
    Ok(Json(response))
}

pub async fn set_current_module(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.engine().set_current_module(&id).map_err(engine_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Project
// ============================================================

pub async fn update_project(
    State(ctx): State<AppContext>,
    Json(input): Json<UpdateProjectInput>,
) -> Json<Snapshot> {
    let mut engine = ctx.engine();
    if let Some(idea) = input.idea {
        engine.set_project_idea(&idea);
    }
    if let Some(notes) = input.notes {
        engine.set_project_notes(&notes);
    }
    Json(engine.snapshot())
}

pub async fn terminate_project(State(ctx): State<AppContext>) -> StatusCode {
    ctx.engine().terminate_project();
    StatusCode::NO_CONTENT
}

/// Aborts the run if the handler is dropped (client gone) before it reports.
struct PendingGeneration {
    ctx: AppContext,
    request: Option<GenerationRequest>,
}

impl Drop for PendingGeneration {
    fn drop(&mut self) {
        if let Some(request) = self.request.take() {
            self.ctx.engine().abort_generation(&request);
        }
    }
}

/// Run a generation without holding the engine lock across the service calls.
pub async fn generate_project(
    State(ctx): State<AppContext>,
    Json(input): Json<GenerateInput>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let request = ctx
        .engine()
        .begin_generation(&input.idea)
        .map_err(engine_error)?;
    let mut pending = PendingGeneration {
        ctx: ctx.clone(),
        request: Some(request.clone()),
    };

    let outcome =
        generator::generate_project(ctx.generator.as_ref(), &request.idea, request.count).await;
    pending.request = None;

    let applied = ctx.engine().finish_generation(&request, outcome);
    Ok(Json(GenerateResponse { applied }))
}

pub async fn toggle_task(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<ToggleTaskResponse>, ApiError> {
    let completed = ctx.engine().toggle_task(&id).map_err(engine_error)?;
    Ok(Json(ToggleTaskResponse { completed }))
}

pub async fn set_intensity(
    State(ctx): State<AppContext>,
    Json(input): Json<IntensityInput>,
) -> Json<IntensityResponse> {
    let value = ctx.engine().set_neural_intensity(input.value);
    Json(IntensityResponse { value })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::generator::{GeneratorError, ProjectGenerator};
    use crate::models::Task;
    use crate::store::PersistentStore;

    /// Service whose responses never arrive.
    struct Unresponsive;

    #[async_trait]
    impl ProjectGenerator for Unresponsive {
        async fn generate_project_tasks(
            &self,
            _idea: &str,
            _count: usize,
        ) -> Result<Vec<Task>, GeneratorError> {
            std::future::pending().await
        }

        async fn generate_project_blueprint(&self, _idea: &str) -> Result<String, GeneratorError> {
            std::future::pending().await
        }
    }

    fn context() -> AppContext {
        let store = PersistentStore::open_memory().unwrap();
        let engine = Engine::new(EngineConfig::default(), store);
        AppContext::new(engine, Arc::new(Unresponsive))
    }

    #[test]
    fn disconnected_client_releases_the_generation_slot() {
        let ctx = context();
        let input = GenerateInput {
            idea: "Chess engine".to_string(),
        };

        let mut request = tokio_test::task::spawn(generate_project(State(ctx.clone()), Json(input)));
        assert!(request.poll().is_pending());
        assert!(ctx.engine().is_generating());

        drop(request);

        let mut engine = ctx.engine();
        assert!(!engine.is_generating());
        let last = engine.state().logs.latest().unwrap();
        assert_eq!(last.text, "System Crash during generation.");
        assert!(engine.begin_generation("Chess engine").is_ok());
    }
}
