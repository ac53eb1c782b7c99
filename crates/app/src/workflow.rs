use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use workright_core::types::{
    ChangeRequestDecision, EmployeeChangeRequest, NewChangeRequest, RecordId,
};
use workright_storage::UnitOfWork;

use crate::employees::fetch_employee;
use crate::problem::ApiError;
use crate::router::AppState;
use crate::telemetry::record_write;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/:id", get(get_request).delete(delete_request))
        .route("/requests/:id/decision", post(decide_request))
        .route("/employees/:id", get(employee_requests))
}

async fn list_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmployeeChangeRequest>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let requests = uow.change_requests().list().await?;
    Ok(Json(requests))
}

async fn create_request(
    State(state): State<AppState>,
    Json(payload): Json<NewChangeRequest>,
) -> Result<(StatusCode, Json<EmployeeChangeRequest>), ApiError> {
    let mut uow = state.storage().begin().await?;
    fetch_employee(&mut uow, payload.employee_id).await?;
    let request = uow.change_requests().insert(&payload, state.now()).await?;
    uow.commit().await?;

    record_write("change_request", "create");
    info!(
        stage = "workflow",
        request_id = request.id,
        employee_id = request.employee_id,
        request_type = %request.request_type,
        "change request submitted"
    );
    Ok((StatusCode::CREATED, Json(request)))
}

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<EmployeeChangeRequest>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let request = fetch_request(&mut uow, id).await?;
    Ok(Json(request))
}

async fn decide_request(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(decision): Json<ChangeRequestDecision>,
) -> Result<Json<EmployeeChangeRequest>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut request = fetch_request(&mut uow, id).await?;
    decision.apply(&mut request, state.now());
    uow.change_requests().update(&request).await?;
    uow.commit().await?;

    record_write("change_request", "update");
    info!(
        stage = "workflow",
        request_id = id,
        status = request.status.as_str(),
        "change request decided"
    );
    Ok(Json(request))
}

async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.change_requests().delete(id).await? {
        return Err(ApiError::NotFound("Change request"));
    }
    uow.commit().await?;

    record_write("change_request", "delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn employee_requests(
    State(state): State<AppState>,
    Path(employee_id): Path<RecordId>,
) -> Result<Json<Vec<EmployeeChangeRequest>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let requests = uow.change_requests().list_for_employee(employee_id).await?;
    Ok(Json(requests))
}

async fn fetch_request(
    uow: &mut UnitOfWork,
    id: RecordId,
) -> Result<EmployeeChangeRequest, ApiError> {
    uow.change_requests()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Change request"))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    };

    use crate::router::{
        app_router,
        testing::{fixed_now, setup_app},
    };
    use axum::http::StatusCode;
    use chrono::Duration;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn request_starts_pending() {
        let app = setup_app().await;
        let alice = app.hire("Alice", None).await;

        let (status, request) = app
            .post(
                "/workflow/requests",
                json!({
                    "employee_id": alice,
                    "request_type": "Address change",
                    "details": "Moved to 12 High St",
                }),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(request["status"], "Pending");
        assert_eq!(request["submitted_at"], "2024-01-15T09:30:00Z");
        assert_eq!(request["decided_at"], Value::Null);
    }

    #[tokio::test]
    async fn redeciding_overwrites_status_and_timestamp() {
        let mut app = setup_app().await;
        let alice = app.hire("Alice", None).await;
        let (_, request) = app
            .post(
                "/workflow/requests",
                json!({
                    "employee_id": alice,
                    "request_type": "Promotion",
                    "details": "Senior Engineer",
                }),
            )
            .await;
        let uri = format!("/workflow/requests/{}/decision", request["id"]);

        let minutes = Arc::new(AtomicI64::new(0));
        let clock_minutes = minutes.clone();
        let state = app.state.clone().with_clock(Arc::new(move || {
            fixed_now() + Duration::minutes(clock_minutes.load(Ordering::SeqCst))
        }));
        app.router = app_router(state);

        minutes.store(5, Ordering::SeqCst);
        let (status, first) = app.post(&uri, json!({ "status": "Approved" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["status"], "Approved");
        assert_eq!(first["decided_at"], "2024-01-15T09:35:00Z");

        minutes.store(60, Ordering::SeqCst);
        let (_, notes_only) = app
            .post(&uri, json!({ "approver_notes": "Backdated to January" }))
            .await;
        assert_eq!(notes_only["decided_at"], "2024-01-15T09:35:00Z");
        assert_eq!(notes_only["approver_notes"], "Backdated to January");

        let (_, second) = app.post(&uri, json!({ "status": "Rejected" })).await;
        assert_eq!(second["status"], "Rejected");
        assert_eq!(second["decided_at"], "2024-01-15T10:30:00Z");
        assert_eq!(second["approver_notes"], "Backdated to January");

        let (_, listed) = app.get(&format!("/workflow/employees/{alice}")).await;
        assert_eq!(listed[0]["status"], "Rejected");
    }

    #[tokio::test]
    async fn unknown_status_is_rejected_by_the_extractor() {
        let app = setup_app().await;
        let alice = app.hire("Alice", None).await;
        let (_, request) = app
            .post(
                "/workflow/requests",
                json!({ "employee_id": alice, "request_type": "Leave", "details": "Two weeks" }),
            )
            .await;

        let (status, _) = app
            .post(
                &format!("/workflow/requests/{}/decision", request["id"]),
                json!({ "status": "Maybe" }),
            )
            .await;

        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn request_for_missing_employee_is_not_found() {
        let app = setup_app().await;

        let (status, body) = app
            .post(
                "/workflow/requests",
                json!({ "employee_id": 77, "request_type": "Leave", "details": "One week" }),
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Employee not found");
        let (_, requests) = app.get("/workflow/requests").await;
        assert_eq!(requests, json!([]));
    }

    #[tokio::test]
    async fn deciding_missing_request_is_not_found() {
        let app = setup_app().await;

        let (status, body) = app
            .post("/workflow/requests/5/decision", json!({ "status": "Approved" }))
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Change request not found");
    }
}
