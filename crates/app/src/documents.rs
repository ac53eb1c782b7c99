use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use tracing::info;
use workright_core::document::{merge_extra_context, render_template};
use workright_core::types::{
    DocumentTemplate, DocumentTemplatePatch, GenerateDocument, GeneratedDocument,
    NewDocumentTemplate, NewGeneratedDocument, RecordId,
};
use workright_storage::UnitOfWork;

use crate::employees::fetch_employee;
use crate::problem::ApiError;
use crate::profile::load_employee_context;
use crate::router::AppState;
use crate::telemetry::record_write;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/templates", get(list_templates).post(create_template))
        .route(
            "/templates/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/generate", post(generate_document))
        .route("/generated", get(list_generated))
        .route(
            "/generated/:id",
            get(get_generated).delete(delete_generated),
        )
}

async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentTemplate>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let templates = uow.templates().list().await?;
    Ok(Json(templates))
}

async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<NewDocumentTemplate>,
) -> Result<(StatusCode, Json<DocumentTemplate>), ApiError> {
    let mut uow = state.storage().begin().await?;
    let template = uow.templates().insert(&payload).await?;
    uow.commit().await?;

    record_write("document_template", "create");
    info!(stage = "documents", template_id = template.id, name = %template.name, "template created");
    Ok((StatusCode::CREATED, Json(template)))
}

async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<DocumentTemplate>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let template = fetch_template(&mut uow, id).await?;
    Ok(Json(template))
}

async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<DocumentTemplatePatch>,
) -> Result<Json<DocumentTemplate>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut template = fetch_template(&mut uow, id).await?;
    patch.apply(&mut template);
    uow.templates().update(&template).await?;
    uow.commit().await?;

    record_write("document_template", "update");
    Ok(Json(template))
}

async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.templates().delete(id).await? {
        return Err(ApiError::NotFound("Template"));
    }
    uow.commit().await?;

    record_write("document_template", "delete");
    Ok(StatusCode::NO_CONTENT)
}

/// Renders a template against an employee's context and stores the result.
async fn generate_document(
    State(state): State<AppState>,
    Json(payload): Json<GenerateDocument>,
) -> Result<(StatusCode, Json<GeneratedDocument>), ApiError> {
    let mut uow = state.storage().begin().await?;
    let employee = fetch_employee(&mut uow, payload.employee_id).await?;
    let template = fetch_template(&mut uow, payload.template_id).await?;

    let mut context = load_employee_context(&mut uow, &employee).await?;
    if let Some(extra) = payload.extra_context {
        merge_extra_context(&mut context, extra);
    }
    let content = render_template(&template.content, &context);

    let document = uow
        .generated_documents()
        .insert(&NewGeneratedDocument {
            employee_id: employee.id,
            template_id: template.id,
            generated_at: state.now(),
            content,
            filename: payload.filename,
        })
        .await?;
    uow.commit().await?;

    counter!("documents_generated_total").increment(1);
    record_write("generated_document", "create");
    info!(
        stage = "documents",
        document_id = document.id,
        employee_id = document.employee_id,
        template_id = document.template_id,
        filename = %document.filename,
        "document generated"
    );
    Ok((StatusCode::CREATED, Json(document)))
}

async fn list_generated(
    State(state): State<AppState>,
) -> Result<Json<Vec<GeneratedDocument>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let documents = uow.generated_documents().list().await?;
    Ok(Json(documents))
}

async fn get_generated(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<GeneratedDocument>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let document = uow
        .generated_documents()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Document"))?;
    Ok(Json(document))
}

async fn delete_generated(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.generated_documents().delete(id).await? {
        return Err(ApiError::NotFound("Document"));
    }
    uow.commit().await?;

    record_write("generated_document", "delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_template(uow: &mut UnitOfWork, id: RecordId) -> Result<DocumentTemplate, ApiError> {
    uow.templates()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Template"))
}
