//! HTTP route handlers for the `/api/v1` surface.
//!
//! Record routes are all scoped to the authenticated user: another user's
//! record id answers exactly like a missing one.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use mindcoach_shared::records::{
    ChatReply, ChatRequest, EmergencyRequest, ErrorCreate, ErrorEntry, MessengerCreate,
    MessengerEntry, MoodCreate, MoodEntry, PaintingCreate, PaintingEntry, Report, ReportCreate,
    ScenarioRequest, TokenResponse, User, UserCreate, UserUpdate,
};
use mindcoach_shared::{EmergencyGuidance, MoodAnalysisResult, ScenarioPlan};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::auth::{self, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

// ============================================================================
// Root and auth
// ============================================================================

pub fn root_routes() -> Router<AppState> {
    Router::new().route("/", get(root))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to KaoYan MindCoach API" }))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<UserCreate>,
) -> ApiResult<Json<TokenResponse>> {
    // PBKDF2 is CPU-bound; run it off the async workers
    let response = tokio::task::spawn_blocking(move || {
        auth::register(&state.store, &state.config.auth, &request)
    })
    .await
    .map_err(anyhow::Error::from)??;
    Ok(Json(response))
}

/// OAuth2 password form; `username` carries the email.
#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<TokenResponse>> {
    let response = tokio::task::spawn_blocking(move || {
        auth::login(&state.store, &state.config.auth, &form.username, &form.password)
    })
    .await
    .map_err(anyhow::Error::from)??;
    info!("User {} logged in", response.user.id);
    Ok(Json(response))
}

// ============================================================================
// Users
// ============================================================================

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me).put(update_me))
}

async fn get_me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Json<User>> {
    let updated = state
        .store
        .update_user(user.id, &update)?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(updated))
}

// ============================================================================
// Moods
// ============================================================================

pub fn mood_routes() -> Router<AppState> {
    Router::new()
        .route("/moods", post(create_mood).get(list_moods))
        .route("/moods/latest", get(latest_mood))
        .route("/moods/:id", get(get_mood).delete(delete_mood))
}

async fn create_mood(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<MoodCreate>,
) -> ApiResult<Json<MoodEntry>> {
    let analysis = match request.analyze {
        true => Some(state.ai.analyze_mood(request.analysis_text()).await),
        false => None,
    };
    let entry = state.store.create_mood(user.id, &request, analysis.as_ref())?;
    debug!("Mood {} recorded for user {}", entry.id, user.id);
    Ok(Json(entry))
}

async fn list_moods(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<MoodEntry>>> {
    Ok(Json(state.store.list_moods(user.id)?))
}

async fn latest_mood(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<MoodEntry>> {
    let entry = state
        .store
        .latest_mood(user.id)?
        .ok_or_else(|| ApiError::NotFound("No mood records found".to_string()))?;
    Ok(Json(entry))
}

async fn get_mood(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<MoodEntry>> {
    let entry = state
        .store
        .get_mood(user.id, id)?
        .ok_or_else(|| ApiError::not_found("Mood"))?;
    Ok(Json(entry))
}

async fn delete_mood(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    deleted(state.store.delete_mood(user.id, id)?, "Mood")
}

fn deleted(found: bool, what: &str) -> ApiResult<StatusCode> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(what))
    }
}

// ============================================================================
// Errors (mistake log)
// ============================================================================

pub fn error_routes() -> Router<AppState> {
    Router::new()
        .route("/errors", post(create_error).get(list_errors))
        .route("/errors/:id", get(get_error).delete(delete_error))
}

async fn create_error(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<ErrorCreate>,
) -> ApiResult<Json<ErrorEntry>> {
    let analysis = match request.analyze {
        true => Some(state.ai.analyze_mood(&request.description).await),
        false => None,
    };
    let entry = state.store.create_error(user.id, &request, analysis.as_ref())?;
    Ok(Json(entry))
}

async fn list_errors(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ErrorEntry>>> {
    Ok(Json(state.store.list_errors(user.id)?))
}

async fn get_error(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ErrorEntry>> {
    let entry = state
        .store
        .get_error(user.id, id)?
        .ok_or_else(|| ApiError::not_found("Error"))?;
    Ok(Json(entry))
}

async fn delete_error(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    deleted(state.store.delete_error(user.id, id)?, "Error")
}

// ============================================================================
// Messengers
// ============================================================================

pub fn messenger_routes() -> Router<AppState> {
    Router::new()
        .route("/messengers", post(create_messenger).get(list_messengers))
        .route("/messengers/:id", get(get_messenger).delete(delete_messenger))
}

async fn create_messenger(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<MessengerCreate>,
) -> ApiResult<Json<MessengerEntry>> {
    // Media payloads are URLs or base64, not worth a model call
    let analysis = match request.analyze && request.message_type == "text" {
        true => Some(state.ai.analyze_mood(&request.content).await),
        false => None,
    };
    let entry = state.store.create_messenger(user.id, &request, analysis.as_ref())?;
    Ok(Json(entry))
}

async fn list_messengers(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<MessengerEntry>>> {
    Ok(Json(state.store.list_messengers(user.id)?))
}

async fn get_messenger(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessengerEntry>> {
    let entry = state
        .store
        .get_messenger(user.id, id)?
        .ok_or_else(|| ApiError::not_found("Messenger"))?;
    Ok(Json(entry))
}

async fn delete_messenger(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    deleted(state.store.delete_messenger(user.id, id)?, "Messenger")
}

// ============================================================================
// Paintings
// ============================================================================

pub fn painting_routes() -> Router<AppState> {
    Router::new()
        .route("/paintings", post(create_painting).get(list_paintings))
        .route("/paintings/:id", get(get_painting).delete(delete_painting))
}

async fn create_painting(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<PaintingCreate>,
) -> ApiResult<Json<PaintingEntry>> {
    if !request.image_data_url.starts_with("data:") {
        return Err(ApiError::BadRequest(
            "image_data_url must be a data: URL".to_string(),
        ));
    }
    let entry = state.store.create_painting(user.id, &request)?;
    debug!(
        "Painting {} stored ({} bytes) for user {}",
        entry.id,
        request.image_data_url.len(),
        user.id
    );
    Ok(Json(entry))
}

async fn list_paintings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<PaintingEntry>>> {
    Ok(Json(state.store.list_paintings(user.id)?))
}

async fn get_painting(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<PaintingEntry>> {
    let entry = state
        .store
        .get_painting(user.id, id)?
        .ok_or_else(|| ApiError::not_found("Painting"))?;
    Ok(Json(entry))
}

async fn delete_painting(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    deleted(state.store.delete_painting(user.id, id)?, "Painting")
}

// ============================================================================
// Reports
// ============================================================================

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports", post(create_report).get(list_reports))
        .route("/reports/:id", get(get_report).delete(delete_report))
}

async fn create_report(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<ReportCreate>,
) -> ApiResult<Json<Report>> {
    if request.end_date < request.start_date {
        return Err(ApiError::BadRequest(
            "end_date must not precede start_date".to_string(),
        ));
    }
    Ok(Json(state.store.create_report(user.id, &request)?))
}

async fn list_reports(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.store.list_reports(user.id)?))
}

async fn get_report(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Report>> {
    let report = state
        .store
        .get_report(user.id, id)?
        .ok_or_else(|| ApiError::not_found("Report"))?;
    Ok(Json(report))
}

async fn delete_report(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    deleted(state.store.delete_report(user.id, id)?, "Report")
}

// ============================================================================
// AI
// ============================================================================

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/ai/analyze-mood", post(analyze_mood))
        .route("/ai/chat", post(chat))
}

#[derive(Debug, Deserialize)]
struct AnalyzeQuery {
    text: String,
}

async fn analyze_mood(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<AnalyzeQuery>,
) -> Json<MoodAnalysisResult> {
    Json(state.ai.analyze_mood(&query.text).await)
}

async fn chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatReply>> {
    if request.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".to_string()));
    }
    let reply = state.ai.chat(user.id, request.messages).await?;
    Ok(Json(reply))
}

// ============================================================================
// Emotional aid
// ============================================================================

pub fn emotional_aid_routes() -> Router<AppState> {
    Router::new()
        .route("/emergency-guidance", post(emergency_guidance))
        .route("/scenario-simulation", post(scenario_simulation))
}

async fn emergency_guidance(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(request): Json<EmergencyRequest>,
) -> Json<EmergencyGuidance> {
    Json(
        state
            .ai
            .emergency_guidance(&request.emotion_state, request.intensity)
            .await,
    )
}

async fn scenario_simulation(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(request): Json<ScenarioRequest>,
) -> Json<ScenarioPlan> {
    Json(
        state
            .ai
            .scenario_simulation(&request.scenario_type, &request.user_concerns)
            .await,
    )
}
