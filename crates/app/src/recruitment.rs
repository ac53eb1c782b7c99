use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;
use workright_core::types::{
    Candidate, CandidatePatch, JobRequisition, JobRequisitionPatch, NewCandidate,
    NewJobRequisition, RecordId,
};
use workright_storage::UnitOfWork;

use crate::employees::ensure_department;
use crate::problem::ApiError;
use crate::router::AppState;
use crate::telemetry::record_write;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(get_job).put(update_job).delete(delete_job))
        .route(
            "/jobs/:id/candidates",
            get(list_candidates).post(create_candidate),
        )
        .route(
            "/candidates/:id",
            get(get_candidate)
                .patch(update_candidate)
                .delete(delete_candidate),
        )
}

async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobRequisition>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let jobs = uow.jobs().list().await?;
    Ok(Json(jobs))
}

async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<NewJobRequisition>,
) -> Result<(StatusCode, Json<JobRequisition>), ApiError> {
    payload.validate()?;
    let mut uow = state.storage().begin().await?;
    if let Some(department_id) = payload.department_id {
        ensure_department(&mut uow, department_id).await?;
    }
    let job = uow.jobs().insert(&payload, state.today()).await?;
    uow.commit().await?;

    record_write("job_requisition", "create");
    info!(stage = "recruitment", job_id = job.id, openings = job.openings, "requisition opened");
    Ok((StatusCode::CREATED, Json(job)))
}

async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<JobRequisition>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let job = fetch_job(&mut uow, id).await?;
    Ok(Json(job))
}

async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<JobRequisitionPatch>,
) -> Result<Json<JobRequisition>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut job = fetch_job(&mut uow, id).await?;
    if let Some(department_id) = patch.department_id {
        ensure_department(&mut uow, department_id).await?;
    }
    patch.apply(&mut job)?;
    uow.jobs().update(&job).await?;
    uow.commit().await?;

    record_write("job_requisition", "update");
    Ok(Json(job))
}

async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.jobs().delete(id).await? {
        return Err(ApiError::NotFound("Job"));
    }
    uow.commit().await?;

    record_write("job_requisition", "delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<RecordId>,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    fetch_job(&mut uow, job_id).await?;
    let candidates = uow.candidates().list_for_job(job_id).await?;
    Ok(Json(candidates))
}

async fn create_candidate(
    State(state): State<AppState>,
    Path(job_id): Path<RecordId>,
    Json(payload): Json<NewCandidate>,
) -> Result<(StatusCode, Json<Candidate>), ApiError> {
    let mut uow = state.storage().begin().await?;
    fetch_job(&mut uow, job_id).await?;
    let candidate = uow.candidates().insert(job_id, &payload).await?;
    uow.commit().await?;

    record_write("candidate", "create");
    info!(stage = "recruitment", job_id, candidate_id = candidate.id, "candidate applied");
    Ok((StatusCode::CREATED, Json(candidate)))
}

async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<Candidate>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let candidate = fetch_candidate(&mut uow, id).await?;
    Ok(Json(candidate))
}

async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<CandidatePatch>,
) -> Result<Json<Candidate>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut candidate = fetch_candidate(&mut uow, id).await?;
    patch.apply(&mut candidate);
    uow.candidates().update(&candidate).await?;
    uow.commit().await?;

    record_write("candidate", "update");
    info!(stage = "recruitment", candidate_id = id, status = %candidate.status, "candidate updated");
    Ok(Json(candidate))
}

async fn delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.candidates().delete(id).await? {
        return Err(ApiError::NotFound("Candidate"));
    }
    uow.commit().await?;

    record_write("candidate", "delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_job(uow: &mut UnitOfWork, id: RecordId) -> Result<JobRequisition, ApiError> {
    uow.jobs().fetch(id).await?.ok_or(ApiError::NotFound("Job"))
}

async fn fetch_candidate(uow: &mut UnitOfWork, id: RecordId) -> Result<Candidate, ApiError> {
    uow.candidates()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Candidate"))
}
