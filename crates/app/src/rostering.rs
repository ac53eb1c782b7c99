use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;
use workright_core::types::{NewScheduleShift, RecordId, ScheduleShift, ScheduleShiftPatch};
use workright_storage::UnitOfWork;

use crate::employees::fetch_employee;
use crate::problem::ApiError;
use crate::router::AppState;
use crate::telemetry::record_write;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shifts", get(list_shifts).post(create_shift))
        .route(
            "/shifts/:id",
            get(get_shift).put(update_shift).delete(delete_shift),
        )
        .route("/employees/:id", get(employee_shifts))
}

async fn list_shifts(State(state): State<AppState>) -> Result<Json<Vec<ScheduleShift>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let shifts = uow.shifts().list().await?;
    Ok(Json(shifts))
}

async fn create_shift(
    State(state): State<AppState>,
    Json(payload): Json<NewScheduleShift>,
) -> Result<(StatusCode, Json<ScheduleShift>), ApiError> {
    let mut uow = state.storage().begin().await?;
    fetch_employee(&mut uow, payload.employee_id).await?;
    payload.validate()?;
    let shift = uow.shifts().insert(&payload).await?;
    uow.commit().await?;

    record_write("schedule_shift", "create");
    info!(
        stage = "rostering",
        shift_id = shift.id,
        employee_id = shift.employee_id,
        start = %shift.start_time,
        "shift scheduled"
    );
    Ok((StatusCode::CREATED, Json(shift)))
}

async fn get_shift(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<ScheduleShift>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let shift = fetch_shift(&mut uow, id).await?;
    Ok(Json(shift))
}

async fn update_shift(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<ScheduleShiftPatch>,
) -> Result<Json<ScheduleShift>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut shift = fetch_shift(&mut uow, id).await?;
    patch.apply(&mut shift)?;
    uow.shifts().update(&shift).await?;
    uow.commit().await?;

    record_write("schedule_shift", "update");
    Ok(Json(shift))
}

async fn delete_shift(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.shifts().delete(id).await? {
        return Err(ApiError::NotFound("Shift"));
    }
    uow.commit().await?;

    record_write("schedule_shift", "delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn employee_shifts(
    State(state): State<AppState>,
    Path(employee_id): Path<RecordId>,
) -> Result<Json<Vec<ScheduleShift>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let shifts = uow.shifts().list_for_employee(employee_id).await?;
    Ok(Json(shifts))
}

async fn fetch_shift(uow: &mut UnitOfWork, id: RecordId) -> Result<ScheduleShift, ApiError> {
    uow.shifts()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Shift"))
}

#[cfg(test)]
mod tests {
    use crate::router::testing::setup_app;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn shift_window_must_be_ordered() {
        let app = setup_app().await;
        let alice = app.hire("Alice", None).await;

        let (status, body) = app
            .post(
                "/rostering/shifts",
                json!({
                    "employee_id": alice,
                    "start_time": "2024-01-16T17:00:00Z",
                    "end_time": "2024-01-16T09:00:00Z",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "End time must be after start time");

        let (status, _) = app
            .post(
                "/rostering/shifts",
                json!({
                    "employee_id": alice,
                    "start_time": "2024-01-16T09:00:00Z",
                    "end_time": "2024-01-16T09:00:00Z",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn shift_is_stored_and_listed_per_employee() {
        let app = setup_app().await;
        let alice = app.hire("Alice", None).await;

        let (status, shift) = app
            .post(
                "/rostering/shifts",
                json!({
                    "employee_id": alice,
                    "start_time": "2024-01-16T09:00:00",
                    "end_time": "2024-01-16T17:00:00+02:00",
                    "location": "Store 4",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(shift["start_time"], "2024-01-16T09:00:00Z");
        assert_eq!(shift["end_time"], "2024-01-16T15:00:00Z");

        let (_, fetched) = app.get(&format!("/rostering/shifts/{}", shift["id"])).await;
        assert_eq!(fetched, shift);

        let (_, listed) = app.get(&format!("/rostering/employees/{alice}")).await;
        assert_eq!(listed, json!([shift]));
    }

    #[tokio::test]
    async fn update_cannot_invert_the_window() {
        let app = setup_app().await;
        let alice = app.hire("Alice", None).await;
        let (_, shift) = app
            .post(
                "/rostering/shifts",
                json!({
                    "employee_id": alice,
                    "start_time": "2024-01-16T09:00:00Z",
                    "end_time": "2024-01-16T17:00:00Z",
                }),
            )
            .await;

        let (status, _) = app
            .put(
                &format!("/rostering/shifts/{}", shift["id"]),
                json!({ "end_time": "2024-01-16T08:00:00Z" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, updated) = app
            .put(
                &format!("/rostering/shifts/{}", shift["id"]),
                json!({ "role": "Supervisor" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["role"], "Supervisor");
        assert_eq!(updated["end_time"], "2024-01-16T17:00:00Z");
    }

    #[tokio::test]
    async fn shift_for_missing_employee_is_not_found() {
        let app = setup_app().await;

        let (status, _) = app
            .post(
                "/rostering/shifts",
                json!({
                    "employee_id": 8,
                    "start_time": "2024-01-16T09:00:00Z",
                    "end_time": "2024-01-16T17:00:00Z",
                }),
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_employee_is_reported_before_window_order() {
        let app = setup_app().await;

        let (status, body) = app
            .post(
                "/rostering/shifts",
                json!({
                    "employee_id": 8,
                    "start_time": "2024-01-16T17:00:00Z",
                    "end_time": "2024-01-16T09:00:00Z",
                }),
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Employee not found");
    }
}
