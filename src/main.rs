//! Agency Admin - backend for the agency marketing site and its CMS admin panel.

mod auth;
mod captcha;
mod editor;
mod invoice;
mod media;
mod menu;
mod schema;
mod seo;
mod store;
mod supabase;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::AdminAuth;
use captcha::{CaptchaChallenge, CaptchaSigner};
use editor::MenuEditor;
use invoice::FinancialSummary;
use menu::{MenuError, MoveDirection};
use schema::{
    ContactMessage, MenuItem, MenuItemPatch, MenuNode, MenuSlot, NewMenuItem, SeoInput,
};
use seo::{SeoReport, SeoScorer};
use store::MenuStore;
use supabase::SupabaseClient;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    editor: Arc<MenuEditor>,
    supabase: Arc<SupabaseClient>,
    scorer: Arc<SeoScorer>,
    captcha: Arc<CaptchaSigner>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agency_admin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let supabase = Arc::new(SupabaseClient::from_env()?);
    info!("Supabase client initialized");

    let menu_store: Arc<dyn MenuStore> = supabase.clone();
    let state = AppState {
        editor: Arc::new(MenuEditor::new(menu_store)),
        supabase: supabase.clone(),
        scorer: Arc::new(SeoScorer::new()),
        captcha: Arc::new(CaptchaSigner::from_env()),
    };

    let admin_auth = Arc::new(AdminAuth::from_env()?);
    let admin = Router::new()
        .route("/menu", get(list_menu).post(create_menu_item))
        .route("/menu/reorder", post(reorder_menu))
        .route("/menu/:id", patch(update_menu_item).delete(delete_menu_item))
        .route("/menu/:id/move", post(move_menu_item))
        .route("/seo/score", post(score_seo))
        .route("/invoices/summary", get(invoice_summary))
        .route("/media", post(upload_media))
        .route_layer(middleware::from_fn_with_state(
            admin_auth,
            auth::require_admin,
        ));

    let app = Router::new()
        .route("/health", get(health))
        .route("/menu/:slot", get(public_menu))
        .route("/captcha", get(new_captcha))
        .route("/contact", post(submit_contact))
        .nest("/admin", admin)
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB uploads
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Public handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Nested, active-only menu for one render slot (header or footer).
async fn public_menu(
    State(state): State<AppState>,
    Path(slot): Path<MenuSlot>,
) -> Result<Json<Vec<MenuNode>>, (StatusCode, String)> {
    state
        .editor
        .render(slot)
        .await
        .map(Json)
        .map_err(menu_error_response)
}

/// Issue a fresh contact-form captcha challenge.
async fn new_captcha(State(state): State<AppState>) -> Json<CaptchaChallenge> {
    Json(state.captcha.challenge())
}

#[derive(serde::Deserialize)]
struct ContactRequest {
    name: String,
    email: String,
    message: String,
    captcha_answer: i64,
    captcha_token: String,
}

/// Captcha-gated contact submission.
async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    if !state
        .captcha
        .verify(request.captcha_answer, &request.captcha_token)
    {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Captcha answer is incorrect".to_string(),
        ));
    }

    let message = ContactMessage {
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        message: request.message.trim().to_string(),
    };
    if message.name.is_empty() || message.email.is_empty() || message.message.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Name, email, and message are required".to_string(),
        ));
    }

    state
        .supabase
        .insert_contact_message(&message)
        .await
        .map_err(|e| {
            error!("Failed to store contact message: {}", e);
            (StatusCode::BAD_GATEWAY, format!("Failed to store message: {}", e))
        })?;

    Ok(Json(serde_json::json!({ "status": "received" })))
}

// ============================================================================
// Admin handlers
// ============================================================================

/// Flat menu listing for the admin table, inactive items included.
async fn list_menu(
    State(state): State<AppState>,
) -> Result<Json<Vec<MenuItem>>, (StatusCode, String)> {
    state
        .editor
        .list()
        .await
        .map(Json)
        .map_err(menu_error_response)
}

/// Create a root item or a submenu entry.
async fn create_menu_item(
    State(state): State<AppState>,
    Json(input): Json<NewMenuItem>,
) -> Result<Json<MenuItem>, (StatusCode, String)> {
    state
        .editor
        .create(input)
        .await
        .map(Json)
        .map_err(menu_error_response)
}

/// Edit fields or re-parent an item; responds with the refreshed record.
async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<MenuItemPatch>,
) -> Result<Json<MenuItem>, (StatusCode, String)> {
    state
        .editor
        .update(&id, patch)
        .await
        .map(Json)
        .map_err(menu_error_response)
}

/// Cascading delete of an item and its whole subtree.
async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    state
        .editor
        .delete(&id)
        .await
        .map(|deleted| Json(serde_json::json!({ "deleted": deleted })))
        .map_err(menu_error_response)
}

#[derive(serde::Deserialize)]
struct ReorderRequest {
    dragged_id: String,
    target_id: String,
}

/// Drag-drop reorder: dragged item lands immediately after the target.
async fn reorder_menu(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .editor
        .reorder_by_drop(&request.dragged_id, &request.target_id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(menu_error_response)
}

#[derive(serde::Deserialize)]
struct MoveRequest {
    direction: MoveDirection,
}

/// One-step up/down move within a sibling group.
async fn move_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MoveRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .editor
        .move_adjacent(&id, request.direction)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(menu_error_response)
}

/// Score an editor's current content fields against the SEO rubric.
async fn score_seo(
    State(state): State<AppState>,
    Json(input): Json<SeoInput>,
) -> Json<SeoReport> {
    Json(state.scorer.score(&input))
}

/// Financial roll-up for the admin dashboard.
async fn invoice_summary(
    State(state): State<AppState>,
) -> Result<Json<FinancialSummary>, (StatusCode, String)> {
    let invoices = state.supabase.list_invoices().await.map_err(|e| {
        error!("Failed to fetch invoices: {}", e);
        (StatusCode::BAD_GATEWAY, format!("Failed to fetch invoices: {}", e))
    })?;
    Ok(Json(invoice::summarize(&invoices)))
}

/// Upload a media file and return its public URL.
async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let mut filename = String::new();
    let mut content_type = "application/octet-stream".to_string();
    let mut file_data = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().unwrap_or("upload").to_string();
            if let Some(ct) = field.content_type() {
                content_type = ct.to_string();
            }
            file_data = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e)))?
                .to_vec();
            break;
        }
    }

    if file_data.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
    }

    let key = media::storage_key(&filename, &file_data).ok_or_else(|| {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("Unsupported file type: {}", filename),
        )
    })?;

    let url = state
        .supabase
        .upload_media(&key, file_data, &content_type)
        .await
        .map_err(|e| {
            error!("Media upload failed: {}", e);
            (StatusCode::BAD_GATEWAY, format!("Upload failed: {}", e))
        })?;

    Ok(Json(serde_json::json!({ "key": key, "url": url })))
}

// ============================================================================
// Helper functions
// ============================================================================

/// Map menu errors onto HTTP statuses. Validation and cycle rejections are
/// the caller's to fix; store failures surface as gateway errors.
fn menu_error_response(err: MenuError) -> (StatusCode, String) {
    let status = match &err {
        MenuError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MenuError::Cycle { .. } => StatusCode::CONFLICT,
        MenuError::NotFound(_) => StatusCode::NOT_FOUND,
        MenuError::Store(_) => {
            error!("Store operation failed: {}", err);
            StatusCode::BAD_GATEWAY
        }
    };
    (status, err.to_string())
}
