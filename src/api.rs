use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::extract::{today, Extractor};
use crate::record::{
    EventRecord, Extracted, Extraction, ExtractionInput, FieldOrigins, PartialEvent,
    PartialResource, ResourceRecord,
};
use crate::replies::HotReloadReplies;
use crate::store::{InMemoryStore, RecordId, RecordStore, Stored};
use crate::taxonomy::{Taxonomy, TaxonomyHandle};

/// Upcoming events listed in a chat answer.
const CHAT_EVENT_LIMIT: usize = 5;

#[derive(Clone)]
pub struct AppState {
    pub taxonomy: TaxonomyHandle,
    pub events: Arc<dyn RecordStore<EventRecord>>,
    pub resources: Arc<dyn RecordStore<ResourceRecord>>,
    pub replies: Arc<HotReloadReplies>,
}

impl AppState {
    /// In-memory stores around the given taxonomy handle.
    pub fn new(taxonomy: TaxonomyHandle, replies: HotReloadReplies) -> Self {
        Self {
            taxonomy,
            events: Arc::new(InMemoryStore::new()),
            resources: Arc::new(InMemoryStore::new()),
            replies: Arc::new(replies),
        }
    }

    /// Taxonomy from TAXONOMY_CONFIG_PATH (embedded default if the file is missing),
    /// replies from REPLIES_CONFIG_PATH.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(
            TaxonomyHandle::from_env()?,
            HotReloadReplies::from_env(),
        ))
    }

    /// Extractor over the current taxonomy snapshot.
    fn extractor(&self) -> Extractor {
        Extractor::from_shared(self.taxonomy.current())
    }
}

/// Router over an already-built state (the binary's path).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/extract", post(extract))
        .route("/validate/event", post(validate_event))
        .route("/validate/resource", post(validate_resource))
        .route("/taxonomy", get(taxonomy))
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", put(update_event).delete(delete_event))
        .route("/resources", get(list_resources).post(create_resource))
        .route("/resources/{id}", put(update_resource).delete(delete_resource))
        .route("/chat", post(chat))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Router with state from the environment; an invalid taxonomy file falls back
/// to the embedded one.
pub fn create_router() -> Router {
    let state = AppState::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "invalid taxonomy config, using embedded default");
        AppState::new(
            TaxonomyHandle::new(Taxonomy::default()),
            HotReloadReplies::from_env(),
        )
    });
    router(state)
}

// --- errors ---

pub enum ApiError {
    NotFound,
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
            ApiError::Internal(e) => {
                error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

// --- extraction ---

async fn extract(State(state): State<AppState>, Json(input): Json<ExtractionInput>) -> Json<Extracted> {
    Json(state.extractor().extract(&input))
}

async fn validate_event(
    State(state): State<AppState>,
    Json(partial): Json<PartialEvent>,
) -> Json<Extraction<EventRecord>> {
    Json(state.extractor().validate_event(&partial, today()))
}

async fn validate_resource(
    State(state): State<AppState>,
    Json(partial): Json<PartialResource>,
) -> Json<Extraction<ResourceRecord>> {
    Json(state.extractor().validate_resource(&partial))
}

#[derive(Serialize)]
struct TaxonomyView {
    categories: Vec<String>,
    resource_types: Vec<String>,
    subjects: Vec<String>,
    defaults: crate::taxonomy::Defaults,
}

async fn taxonomy(State(state): State<AppState>) -> Json<TaxonomyView> {
    let t = state.taxonomy.current();
    let names = |table: &crate::taxonomy::KeywordTable| -> Vec<String> {
        table.names().into_iter().map(String::from).collect()
    };
    Json(TaxonomyView {
        categories: names(&t.categories),
        resource_types: names(&t.resource_types),
        subjects: names(&t.subjects),
        defaults: t.defaults.clone(),
    })
}

// --- records ---

/// Either free text (natural-language path) or form fields (validation path).
#[derive(Deserialize)]
#[serde(untagged)]
enum Submission<P> {
    Text { text: String },
    Form(P),
}

#[derive(Serialize)]
struct Saved<T> {
    #[serde(flatten)]
    stored: Stored<T>,
    origins: FieldOrigins,
}

impl AppState {
    fn event_from(&self, sub: Submission<PartialEvent>) -> Extraction<EventRecord> {
        let ex = self.extractor();
        match sub {
            Submission::Text { text } => ex.extract_event(&text, today()),
            Submission::Form(p) => ex.validate_event(&p, today()),
        }
    }

    fn resource_from(&self, sub: Submission<PartialResource>) -> Extraction<ResourceRecord> {
        let ex = self.extractor();
        match sub {
            Submission::Text { text } => ex.extract_resource(&text),
            Submission::Form(p) => ex.validate_resource(&p),
        }
    }
}

async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<Stored<EventRecord>>>> {
    Ok(Json(state.events.list().await?))
}

async fn create_event(
    State(state): State<AppState>,
    Json(sub): Json<Submission<PartialEvent>>,
) -> ApiResult<(StatusCode, Json<Saved<EventRecord>>)> {
    let Extraction { record, origins } = state.event_from(sub);
    let stored = state.events.insert(record).await?;
    info!(target: "api", id = stored.id, "event created");
    Ok((StatusCode::CREATED, Json(Saved { stored, origins })))
}

async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(sub): Json<Submission<PartialEvent>>,
) -> ApiResult<Json<Saved<EventRecord>>> {
    let Extraction { record, origins } = state.event_from(sub);
    let stored = state.events.update(id, record).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(Saved { stored, origins }))
}

async fn delete_event(State(state): State<AppState>, Path(id): Path<RecordId>) -> ApiResult<StatusCode> {
    if state.events.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

async fn list_resources(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Stored<ResourceRecord>>>> {
    Ok(Json(state.resources.list().await?))
}

async fn create_resource(
    State(state): State<AppState>,
    Json(sub): Json<Submission<PartialResource>>,
) -> ApiResult<(StatusCode, Json<Saved<ResourceRecord>>)> {
    let Extraction { record, origins } = state.resource_from(sub);
    let stored = state.resources.insert(record).await?;
    info!(target: "api", id = stored.id, "resource created");
    Ok((StatusCode::CREATED, Json(Saved { stored, origins })))
}

async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(sub): Json<Submission<PartialResource>>,
) -> ApiResult<Json<Saved<ResourceRecord>>> {
    let Extraction { record, origins } = state.resource_from(sub);
    let stored = state
        .resources
        .update(id, record)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(Saved { stored, origins }))
}

async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    if state.resources.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- chat ---

#[derive(Deserialize)]
struct ChatReq {
    message: String,
}

#[derive(Serialize)]
struct ChatResp {
    reply: Option<String>,
    tags: Vec<String>,
    /// True when the message needs the generative service.
    forward: bool,
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatReq>) -> ApiResult<Json<ChatResp>> {
    let outcome = state.replies.current().respond(&req.message);

    let mut reply = outcome.reply.clone();
    if reply.is_none() && outcome.has_tag("event_query") {
        reply = upcoming_events_reply(&state).await?;
    }
    if reply.is_some() {
        counter!("chat_canned_replies_total").increment(1);
    }

    Ok(Json(ChatResp {
        forward: reply.is_none(),
        reply,
        tags: outcome.tags,
    }))
}

/// Stored events dated today or later, soonest first.
async fn upcoming_events_reply(state: &AppState) -> anyhow::Result<Option<String>> {
    let from = today().format(crate::extract::datetime::DATE_FORMAT).to_string();
    let mut upcoming: Vec<EventRecord> = state
        .events
        .list()
        .await?
        .into_iter()
        .map(|s| s.record)
        .filter(|e| e.date >= from)
        .collect();
    if upcoming.is_empty() {
        return Ok(None);
    }
    upcoming.sort_by(|a, b| a.scheduled_at().cmp(&b.scheduled_at()));

    let mut out = String::from("Here are the upcoming events:\n");
    for e in upcoming.iter().take(CHAT_EVENT_LIMIT) {
        out.push_str(&format!(
            "\n• {} ({}) on {} at {}, {}",
            e.title, e.category, e.date, e.time, e.location
        ));
    }
    Ok(Some(out))
}
