use autolocale::{
    BulkRequest, DenyReason, Document, DocumentStatus, DocumentStore, Orchestrator, Principal,
    STATUS_KEY, TranslateError, TranslationRequest, WriteContext, authorize, authorize_system,
};
use autolocale_mt::{MtError, TranslationSettings};
use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Identity headers set by the authenticating proxy in front of the server
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Store the document routes write to; the orchestrator reads the same records
    pub store: Arc<dyn DocumentStore>,
}

/// Build the application router
///
/// Translation routes exist only while the plugin is enabled. `/health` and
/// the document routes are always served.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route(
            "/collections/{collection_slug}/documents/{id}",
            get(read_document).put(write_document),
        );
    if state.orchestrator.config().enabled {
        router = router
            .route("/collections/{collection_slug}/translate", post(translate))
            .route(
                "/collections/{collection_slug}/translate-missing",
                post(translate_missing),
            )
            .route("/generate-text", post(generate_text));
    }
    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The caller identified by the proxy headers, if any
pub struct CurrentUser(pub Option<Principal>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let Some(id) = header(USER_ID_HEADER) else {
            return Ok(CurrentUser(None));
        };
        let mut principal = Principal::new(id);
        if let Some(role) = header(USER_ROLE_HEADER) {
            principal = principal.with_role(role);
        }
        if let Some(roles) = header(USER_ROLES_HEADER) {
            principal = principal.with_roles(
                roles
                    .split(',')
                    .map(str::trim)
                    .filter(|role| !role.is_empty()),
            );
        }
        Ok(CurrentUser(Some(principal)))
    }
}

/// Envelope shared by every translation endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Internal { message: String, error: String },
}

impl ApiError {
    fn internal(message: &str, error: impl ToString) -> Self {
        ApiError::Internal {
            message: message.to_string(),
            error: error.to_string(),
        }
    }
}

impl From<TranslateError> for ApiError {
    fn from(e: TranslateError) -> Self {
        match e {
            TranslateError::NotFound { .. } => ApiError::NotFound("Document not found".to_string()),
            TranslateError::NoDocuments { .. } => {
                ApiError::NotFound("No documents found".to_string())
            }
            TranslateError::CollectionNotConfigured(_) => {
                ApiError::BadRequest("Collection not configured for translation".to_string())
            }
            TranslateError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            TranslateError::AccessDenied(reason) => {
                ApiError::Forbidden(format!("Access denied: {}", reason))
            }
            other => ApiError::internal("Translation failed", other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, error) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message, None),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            ApiError::Internal { message, error } => {
                error!(%error, "{}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message, Some(error))
            }
        };
        let body: ApiResponse = ApiResponse {
            success: false,
            message,
            data: None,
            error,
        };
        (status, Json(body)).into_response()
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateBody {
    pub id: Option<String>,
    pub locale: Option<String>,
    pub codes: Option<Vec<String>>,
    #[serde(default)]
    pub settings: TranslationSettings,
    pub only_missing: Option<bool>,
}

async fn translate(
    State(state): State<AppState>,
    Path(collection_slug): Path<String>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<TranslateBody>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Json(body) = body?;
    let (Some(id), Some(locale)) = (required(body.id), required(body.locale)) else {
        return Err(
            TranslateError::InvalidRequest("Document ID and locale are required".to_string())
                .into(),
        );
    };

    let config = state.orchestrator.config();
    if let Err(denied) =
        authorize(user.as_ref(), config, &collection_slug).into_result(&collection_slug)
    {
        warn!(collection = %collection_slug, user = ?user.as_ref().map(|u| &u.id), "Translation denied");
        return Err(denied.into());
    }

    info!(collection = %collection_slug, %id, %locale, "Translating document");
    let request = TranslationRequest {
        collection: collection_slug,
        id,
        source_locale: locale,
        codes: body.codes,
        settings: body.settings,
        only_missing: body.only_missing,
    };
    let report = state.orchestrator.translate_document(&request).await?;

    let message = if report.success() {
        "Translation completed successfully".to_string()
    } else {
        format!(
            "Translation completed with failures for: {}",
            report.failed_locales().join(", ")
        )
    };
    Ok(Json(ApiResponse {
        success: report.success(),
        message,
        data: Some(serde_json::to_value(&report).map_err(|e| {
            ApiError::internal("Translation failed", e)
        })?),
        error: None,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateMissingBody {
    pub locale: Option<String>,
    pub codes: Option<Vec<String>>,
    #[serde(default)]
    pub settings: TranslationSettings,
    pub only_missing: Option<bool>,
}

async fn translate_missing(
    State(state): State<AppState>,
    Path(collection_slug): Path<String>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<TranslateMissingBody>, JsonRejection>,
) -> Result<Json<ApiResponse>, ApiError> {
    let Json(body) = body?;
    let config = state.orchestrator.config();
    authorize(user.as_ref(), config, &collection_slug).into_result(&collection_slug)?;

    let request = BulkRequest {
        collection: collection_slug,
        source_locale: required(body.locale)
            .unwrap_or_else(|| config.localization.default_locale.clone()),
        codes: body.codes,
        settings: body.settings,
        only_missing: Some(body.only_missing.unwrap_or(true)),
    };
    let report = state.orchestrator.translate_collection(&request).await?;

    let message = if report.success() {
        "Bulk translation completed".to_string()
    } else {
        format!(
            "Bulk translation completed, {} of {} documents had failures",
            report.failed_documents.len(),
            report.documents
        )
    };
    Ok(Json(ApiResponse {
        success: report.success(),
        message,
        data: Some(serde_json::to_value(&report).map_err(|e| {
            ApiError::internal("Bulk translation failed", e)
        })?),
        error: None,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextBody {
    pub text: Option<String>,
    pub target_language: Option<String>,
    pub source_language: Option<String>,
    #[serde(default)]
    pub settings: TranslationSettings,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Translate one ad-hoc text
///
/// Gateway failures are reported in the body with `success: false`; only
/// malformed or unauthorized requests get an error status.
async fn generate_text(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<GenerateTextBody>, JsonRejection>,
) -> Result<Json<GenerateTextResponse>, ApiError> {
    authorize_system(user.as_ref()).into_result("generate-text")?;
    let Json(body) = body?;
    let (Some(text), Some(target)) = (body.text, required(body.target_language)) else {
        return Err(
            TranslateError::InvalidRequest("Text and target language are required".to_string())
                .into(),
        );
    };

    let translator = state.orchestrator.translator();
    info!(
        target = %target,
        source = ?body.source_language,
        length = text.len(),
        provider = translator.provider_name(),
        "Generating text"
    );
    let result: Result<String, MtError> = translator
        .translate(&text, body.source_language.as_deref(), &target, &body.settings)
        .await;

    Ok(Json(match result {
        Ok(translated) => GenerateTextResponse {
            success: true,
            translated_text: Some(translated),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "Text generation failed");
            GenerateTextResponse {
                success: false,
                translated_text: None,
                error: Some(e.to_string()),
            }
        }
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

impl LocaleQuery {
    fn resolve(self, state: &AppState) -> String {
        required(self.locale)
            .unwrap_or_else(|| state.orchestrator.config().localization.default_locale.clone())
    }
}

async fn read_document(
    State(state): State<AppState>,
    Path((collection_slug, id)): Path<(String, String)>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<Document>, ApiError> {
    let locale = query.resolve(&state);
    state
        .store
        .find_by_id(&collection_slug, &id, &locale)
        .await
        .map_err(|e| ApiError::internal("Failed to read document", e))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))
}

/// Create or update one locale record as a user edit
///
/// This is the write path change hooks listen to: an edit of the default
/// locale starts a translation pass in the background. A `_status` entry in
/// the body sets the record status.
async fn write_document(
    State(state): State<AppState>,
    Path((collection_slug, id)): Path<(String, String)>,
    Query(query): Query<LocaleQuery>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Document>, ApiError> {
    if user.is_none() {
        return Err(TranslateError::AccessDenied(DenyReason::Unauthenticated.to_string()).into());
    }
    let Json(mut fields) = body?;
    fields.remove("id");
    let status = fields
        .remove(STATUS_KEY)
        .map(serde_json::from_value::<Option<DocumentStatus>>)
        .transpose()
        .map_err(|e| TranslateError::InvalidRequest(format!("Invalid {}: {}", STATUS_KEY, e)))?;
    let locale = query.resolve(&state);
    let context = WriteContext::user_edit();

    let existing = state
        .store
        .find_by_id(&collection_slug, &id, &locale)
        .await
        .map_err(|e| ApiError::internal("Failed to write document", e))?;
    let written = match existing {
        Some(_) => {
            if let Some(status) = status {
                fields.insert(STATUS_KEY.to_string(), json!(status));
            }
            state
                .store
                .update(&collection_slug, &id, fields, &locale, context)
                .await
        }
        None => {
            let document = Document {
                id: id.clone(),
                status: status.flatten(),
                fields,
            };
            state
                .store
                .create(&collection_slug, document, &locale, context)
                .await
        }
    }
    .map_err(|e| ApiError::internal("Failed to write document", e))?;

    info!(collection = %collection_slug, %id, %locale, "Document written");
    Ok(Json(written))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub provider: String,
    pub healthy: bool,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let translator = state.orchestrator.translator();
    let healthy = translator.health_check().await;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            provider: translator.provider_name().to_string(),
            healthy,
        }),
    )
}
