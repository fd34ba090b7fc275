use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use studyplan_core::generation::RoleKey;
use studyplan_core::plan::{
    DEFAULT_DURATION_DAYS, PlanOrchestrator, PlanRecord, PlanRequest, PlanSummary,
};
use studyplan_core::render::{DocumentRenderer, PdfRenderer};
use studyplan_core::store::{PlanId, PlanStore};

const GENERATION_FAILED: &str = "Failed to generate study plan";
const PLAN_NOT_FOUND: &str = "Plan not found";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    /// Log the full error chain and answer with `public` only.
    pub fn internal(public: &str, err: anyhow::Error) -> Self {
        error!(error = %format!("{err:#}"), "{public}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: public.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: PlanOrchestrator,
    pub store: PlanStore,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    /// Fresh state with an empty store and the PDF renderer.
    pub fn new(orchestrator: PlanOrchestrator) -> Self {
        Self {
            orchestrator,
            store: PlanStore::new(),
            renderer: Arc::new(PdfRenderer::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /api/generate-plan`, from JSON or a URL-encoded form.
#[derive(Debug, Default, Deserialize)]
pub struct GeneratePlanBody {
    #[serde(default)]
    pub syllabus_text: String,
    #[serde(default)]
    pub learning_preferences: String,
    #[serde(default)]
    pub study_duration_days: Option<DurationField>,
}

/// Forms send every value as text; JSON clients may send either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DurationField {
    Days(i64),
    Text(String),
}

impl GeneratePlanBody {
    fn duration_days(&self) -> Result<i64, AppError> {
        match &self.study_duration_days {
            None => Ok(i64::from(DEFAULT_DURATION_DAYS)),
            Some(DurationField::Days(days)) => Ok(*days),
            Some(DurationField::Text(text)) if text.trim().is_empty() => {
                Ok(i64::from(DEFAULT_DURATION_DAYS))
            }
            Some(DurationField::Text(text)) => text.trim().parse().map_err(|_| {
                AppError::bad_request(format!(
                    "Study duration must be a whole number of days (got {text:?})"
                ))
            }),
        }
    }
}

/// Extracts [`GeneratePlanBody`] as a form when the request says so, and as
/// JSON otherwise.
pub struct PlanForm(pub GeneratePlanBody);

impl<S> FromRequest<S> for PlanForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(body) = Form::<GeneratePlanBody>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            Ok(Self(body))
        } else {
            let Json(body) = Json::<GeneratePlanBody>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            Ok(Self(body))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GeneratePlanResponse {
    pub success: bool,
    pub plan_id: PlanId,
    pub message: &'static str,
    pub summary: PlanSummary,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse<'a> {
    pub success: bool,
    pub plan: &'a PlanRecord,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub agents: usize,
    pub llm: String,
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/generate-plan", post(generate_plan))
        .route("/api/plan/{id}", get(get_plan))
        .route("/api/plan/{id}/pdf", get(get_plan_pdf))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let model = state.orchestrator.model().to_string();
    let app = build_router(state);
    let ip: IpAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind:?}"))?;
    let addr = SocketAddr::new(ip, port);
    info!(%model, "studyplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("studyplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C; shutting down");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html>\
<html><head><title>Study Plan Generator</title></head><body>\
<h1>Study Plan Generator</h1>\
<p>POST <code>/api/generate-plan</code> with <code>syllabus_text</code>, \
<code>learning_preferences</code> and optional <code>study_duration_days</code>.</p>\
<ul>\
<li>GET <code>/api/plan/{id}</code> returns a stored plan</li>\
<li>GET <code>/api/plan/{id}/pdf</code> downloads it as PDF</li>\
<li>GET <a href=\"/api/health\">/api/health</a></li>\
</ul>\
</body></html>",
    )
}

async fn generate_plan(
    State(state): State<AppState>,
    PlanForm(body): PlanForm,
) -> Result<Response, AppError> {
    let days = body.duration_days()?;
    let request = PlanRequest::new(&body.syllabus_text, &body.learning_preferences, days)
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    let record = state
        .orchestrator
        .generate(&request)
        .await
        .map_err(|e| AppError::internal(GENERATION_FAILED, e.into()))?;

    let summary = record.summary();
    let plan_id = state.store.insert(record).await;
    info!(%plan_id, "plan generated");

    Ok(Json(GeneratePlanResponse {
        success: true,
        plan_id,
        message: "Study plan generated successfully",
        summary,
    })
    .into_response())
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let plan = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| AppError::not_found(PLAN_NOT_FOUND))?;

    Ok(Json(PlanResponse {
        success: true,
        plan: &plan,
    })
    .into_response())
}

async fn get_plan_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let plan = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| AppError::not_found(PLAN_NOT_FOUND))?;

    let renderer = Arc::clone(&state.renderer);
    let content_type = renderer.content_type();
    let filename = format!("study_plan_{id}.{}", renderer.file_extension());

    let bytes = tokio::task::spawn_blocking(move || renderer.render(&plan))
        .await
        .map_err(|e| AppError::internal("Failed to render plan", e.into()))?
        .map_err(|e| AppError::internal("Failed to render plan", e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "Study Plan Generator",
        agents: RoleKey::ALL.len(),
        llm: state.orchestrator.model().to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
