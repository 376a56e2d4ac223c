use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::{self, OracleError};
use crate::errors::AppError;
use crate::export::{export_pdf, ExportError, PageSize};
use crate::layout::templates::{PAGE_HEIGHT_PX, PAGE_WIDTH_PX};
use crate::layout::{Page, TemplateStyle};
use crate::models::resume::{AtsAnalysis, ResumeContent};
use crate::render::render_document;
use crate::session::controller::{
    Completion, ControllerError, Operation, ResultsTab, Ticket, FORMAT_FAILED_MESSAGE,
    REOPTIMIZE_FAILED_MESSAGE,
};
use crate::session::store::SessionSnapshot;
use crate::state::AppState;

pub const PDF_UPLOAD_MESSAGE: &str =
    "PDF parsing is not supported. Please paste your résumé content into the text box instead.";

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let snapshot = state.sessions.create().await;
    info!(
        "Created session {} ({} active)",
        snapshot.id,
        state.sessions.len().await
    );
    (StatusCode::CREATED, Json(snapshot))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .sessions
        .read(id, |s| s.snapshot())
        .await
        .ok_or_else(|| session_not_found(id))?;
    Ok(Json(snapshot))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .sessions
        .update(id, |s| {
            s.controller.reset();
            s.snapshot()
        })
        .await
        .ok_or_else(|| session_not_found(id))?;
    Ok(Json(snapshot))
}

// ────────────────────────────────────────────────────────────────────────────
// Input
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/upload
/// Reads the first file field as UTF-8 text into the session's raw résumé text.
pub async fn handle_upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionSnapshot>, AppError> {
    let mut text = None;
    while let Some(field) = multipart.next_field().await? {
        let is_pdf = field.content_type() == Some("application/pdf")
            || field
                .file_name()
                .is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"));
        if is_pdf {
            return Err(AppError::UnprocessableEntity(PDF_UPLOAD_MESSAGE.to_string()));
        }
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }
        let bytes = field.bytes().await?;
        let decoded = String::from_utf8(bytes.to_vec()).map_err(|_| {
            AppError::UnprocessableEntity("Uploaded file must be UTF-8 text".to_string())
        })?;
        text = Some(decoded);
        break;
    }

    let text = text.ok_or_else(|| AppError::Validation("No file was uploaded".to_string()))?;
    info!("Session {id}: uploaded {} bytes of résumé text", text.len());

    let snapshot = state
        .sessions
        .update(id, |s| {
            s.controller.set_raw_text(text)?;
            Ok::<_, AppError>(s.snapshot())
        })
        .await
        .ok_or_else(|| session_not_found(id))??;
    Ok(Json(snapshot))
}

#[derive(Debug, Default, Deserialize)]
pub struct FormatRequest {
    pub raw_text: Option<String>,
    pub job_description: Option<String>,
}

/// POST /api/v1/sessions/:id/format
pub async fn handle_format(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FormatRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let ticket = state
        .sessions
        .update(id, |s| s.controller.begin_format(req.raw_text, req.job_description))
        .await
        .ok_or_else(|| session_not_found(id))??;

    run_ticket(&state, id, ticket).await
}

#[derive(Debug, Deserialize)]
pub struct ReoptimizeRequest {
    #[serde(default)]
    pub job_description: String,
}

/// POST /api/v1/sessions/:id/reoptimize
pub async fn handle_reoptimize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReoptimizeRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let ticket = state
        .sessions
        .update(id, |s| s.controller.begin_reoptimize(&req.job_description))
        .await
        .ok_or_else(|| session_not_found(id))??;

    run_ticket(&state, id, ticket).await
}

/// Runs both oracle round-trips for a ticket without holding the session lock, then hands
/// the outcome back to the controller.
///
/// The pass runs on its own task, so it reaches `complete` even if the client disconnects
/// and this handler future is dropped.
async fn run_ticket(
    state: &AppState,
    id: Uuid,
    ticket: Ticket,
) -> Result<Json<SessionSnapshot>, AppError> {
    let operation = ticket.operation;
    info!("Session {id}: starting {operation}");

    let oracle = state.oracle.clone();
    let sessions = state.sessions.clone();
    let pass = tokio::spawn(async move {
        let outcome: Result<(ResumeContent, AtsAnalysis), OracleError> =
            analysis::format_and_score(
                oracle.as_ref(),
                &ticket.raw_text,
                ticket.job_description.as_deref(),
            )
            .await;

        let completed = sessions
            .update(id, |s| {
                let completion = s.controller.complete(ticket, &outcome);
                (completion, s.snapshot())
            })
            .await;
        if completed.is_none() {
            info!("Session {id} no longer exists; dropping its {operation} result");
        }
        completed.map(|(completion, snapshot)| (completion, snapshot, outcome))
    });

    let (completion, snapshot, outcome) = pass
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::Error::new(e).context("oracle pass did not complete"))
        })?
        .ok_or_else(|| session_not_found(id))?;

    match (completion, outcome) {
        (Completion::Discarded, _) => Err(AppError::Conflict(format!(
            "Session was reset while the {operation} request was running"
        ))),
        (Completion::Applied, Ok(_)) => Ok(Json(snapshot)),
        (Completion::Applied, Err(_)) => Err(AppError::Oracle(
            match operation {
                Operation::Format => FORMAT_FAILED_MESSAGE,
                Operation::Reoptimize => REOPTIMIZE_FAILED_MESSAGE,
            }
            .to_string(),
        )),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Presentation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PreferencesRequest {
    pub template: Option<TemplateStyle>,
    pub page_size: Option<PageSize>,
    pub tab: Option<ResultsTab>,
}

/// PATCH /api/v1/sessions/:id/preferences
pub async fn handle_preferences(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PreferencesRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .sessions
        .update(id, |s| {
            if let Some(template) = req.template {
                s.controller.select_template(template);
            }
            if let Some(page_size) = req.page_size {
                s.controller.select_page_size(page_size);
            }
            if let Some(tab) = req.tab {
                s.controller.select_tab(tab);
            }
            s.snapshot()
        })
        .await
        .ok_or_else(|| session_not_found(id))?;
    Ok(Json(snapshot))
}

#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub id: TemplateStyle,
    pub display_name: &'static str,
    pub container_id: String,
    pub capacity: f32,
}

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateInfo>> {
    Json(
        TemplateStyle::ALL
            .iter()
            .map(|&style| TemplateInfo {
                id: style,
                display_name: style.display_name(),
                container_id: style.container_id(),
                capacity: style.topology().capacity,
            })
            .collect(),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct TemplateQuery {
    pub template: Option<TemplateStyle>,
}

#[derive(Debug, Serialize)]
pub struct PagesResponse {
    pub template: TemplateStyle,
    pub display_name: &'static str,
    pub container_id: String,
    pub page_size: PageSize,
    pub page_width: f32,
    pub page_height: f32,
    pub capacity: f32,
    pub page_count: usize,
    pub pages: Vec<Page>,
}

/// GET /api/v1/sessions/:id/pages
pub async fn handle_pages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<PagesResponse>, AppError> {
    let measurement = state.measurement;
    let response = state
        .sessions
        .read(id, |s| {
            let template = query.template.unwrap_or(s.controller.template());
            let pages = s.controller.pages(measurement, Some(template))?;
            Ok::<_, AppError>(PagesResponse {
                template,
                display_name: template.display_name(),
                container_id: template.container_id(),
                page_size: s.controller.page_size(),
                page_width: PAGE_WIDTH_PX,
                page_height: PAGE_HEIGHT_PX,
                capacity: template.topology().capacity,
                page_count: pages.len(),
                pages,
            })
        })
        .await
        .ok_or_else(|| session_not_found(id))??;
    Ok(Json(response))
}

/// GET /api/v1/sessions/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TemplateQuery>,
) -> Result<Html<String>, AppError> {
    let measurement = state.measurement;
    let html = state
        .sessions
        .read(id, |s| {
            let template = query.template.unwrap_or(s.controller.template());
            let pages = s.controller.pages(measurement, Some(template))?;
            let content = s.controller.content().ok_or(ControllerError::NoResume)?;
            Ok::<_, AppError>(render_document(content, template, &pages))
        })
        .await
        .ok_or_else(|| session_not_found(id))??;
    Ok(Html(html))
}

// ────────────────────────────────────────────────────────────────────────────
// Export
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/export
/// Multipart body: one image part per rendered page, in page order. An optional text part
/// named `page_size` overrides the session's page size for this download.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut surfaces: Vec<Bytes> = Vec::new();
    let mut size_override = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("page_size") {
            let value = field.text().await?;
            size_override = Some(parse_page_size(&value)?);
            continue;
        }
        surfaces.push(field.bytes().await?);
    }

    let (session_size, file_name) = state
        .sessions
        .read(id, |s| (s.controller.page_size(), s.controller.export_file_name()))
        .await
        .ok_or_else(|| session_not_found(id))?;
    let file_name = file_name.ok_or(ControllerError::NoResume)?;
    let size = size_override.unwrap_or(session_size);

    // Decoding and compression are CPU-bound; keep them off the async workers.
    let page_count = surfaces.len();
    let pdf = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ExportError> {
        export_pdf(surfaces.iter().map(|b| b.as_ref()), size)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    info!(
        "Session {id}: exported {page_count} page(s) as {size} ({} bytes)",
        pdf.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file_name)),
        ],
        pdf,
    )
        .into_response())
}

fn parse_page_size(value: &str) -> Result<PageSize, AppError> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_string()))
        .map_err(|_| AppError::Validation(format!("Unknown page size '{value}'")))
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8 name in
/// `filename*`.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}
