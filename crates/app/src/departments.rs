use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;
use workright_core::types::{Department, DepartmentPatch, NewDepartment, RecordId};

use crate::problem::ApiError;
use crate::router::AppState;
use crate::telemetry::record_write;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route(
            "/:id",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
}

async fn list_departments(State(state): State<AppState>) -> Result<Json<Vec<Department>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let departments = uow.departments().list().await?;
    Ok(Json(departments))
}

async fn create_department(
    State(state): State<AppState>,
    Json(payload): Json<NewDepartment>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    let mut uow = state.storage().begin().await?;
    let department = uow.departments().insert(&payload).await?;
    uow.commit().await?;

    record_write("department", "create");
    info!(stage = "departments", department_id = department.id, "department created");
    Ok((StatusCode::CREATED, Json(department)))
}

async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<Department>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let department = uow
        .departments()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Department"))?;
    Ok(Json(department))
}

async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<DepartmentPatch>,
) -> Result<Json<Department>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut department = uow
        .departments()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Department"))?;
    patch.apply(&mut department);
    uow.departments().update(&department).await?;
    uow.commit().await?;

    record_write("department", "update");
    Ok(Json(department))
}

async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.departments().delete(id).await? {
        return Err(ApiError::NotFound("Department"));
    }
    uow.commit().await?;

    record_write("department", "delete");
    info!(stage = "departments", department_id = id, "department deleted");
    Ok(StatusCode::NO_CONTENT)
}
