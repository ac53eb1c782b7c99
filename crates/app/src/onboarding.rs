use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use workright_core::types::{NewOnboardingTask, OnboardingTask, OnboardingTaskPatch, RecordId};
use workright_storage::UnitOfWork;

use crate::employees::fetch_employee;
use crate::problem::ApiError;
use crate::router::AppState;
use crate::telemetry::record_write;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/:id/complete", post(complete_task))
        .route("/employees/:id", get(employee_tasks))
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<OnboardingTask>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let tasks = uow.onboarding_tasks().list().await?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<NewOnboardingTask>,
) -> Result<(StatusCode, Json<OnboardingTask>), ApiError> {
    let mut uow = state.storage().begin().await?;
    fetch_employee(&mut uow, payload.employee_id).await?;
    let task = uow.onboarding_tasks().insert(&payload).await?;
    uow.commit().await?;

    record_write("onboarding_task", "create");
    info!(stage = "onboarding", task_id = task.id, employee_id = task.employee_id, "task assigned");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<OnboardingTask>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let task = fetch_task(&mut uow, id).await?;
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<OnboardingTaskPatch>,
) -> Result<Json<OnboardingTask>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut task = fetch_task(&mut uow, id).await?;
    patch.apply(&mut task);
    uow.onboarding_tasks().update(&task).await?;
    uow.commit().await?;

    record_write("onboarding_task", "update");
    Ok(Json(task))
}

async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<OnboardingTask>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut task = fetch_task(&mut uow, id).await?;
    task.completed = true;
    uow.onboarding_tasks().update(&task).await?;
    uow.commit().await?;

    record_write("onboarding_task", "update");
    info!(stage = "onboarding", task_id = id, "task completed");
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.onboarding_tasks().delete(id).await? {
        return Err(ApiError::NotFound("Task"));
    }
    uow.commit().await?;

    record_write("onboarding_task", "delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn employee_tasks(
    State(state): State<AppState>,
    Path(employee_id): Path<RecordId>,
) -> Result<Json<Vec<OnboardingTask>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let tasks = uow.onboarding_tasks().list_for_employee(employee_id).await?;
    Ok(Json(tasks))
}

async fn fetch_task(uow: &mut UnitOfWork, id: RecordId) -> Result<OnboardingTask, ApiError> {
    uow.onboarding_tasks()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Task"))
}

#[cfg(test)]
mod tests {
    use crate::router::testing::setup_app;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn task_is_assigned_and_completed() {
        let app = setup_app().await;
        let alice = app.hire("Alice", None).await;

        let (status, task) = app
            .post(
                "/onboarding/tasks",
                json!({
                    "employee_id": alice,
                    "title": "Sign contract",
                    "due_date": "2024-01-20",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["completed"], false);
        assert_eq!(task["due_date"], "2024-01-20");

        let (status, completed) = app
            .post(&format!("/onboarding/tasks/{}/complete", task["id"]), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(completed["completed"], true);

        let (_, tasks) = app.get(&format!("/onboarding/employees/{alice}")).await;
        assert_eq!(tasks[0]["completed"], true);
    }

    #[tokio::test]
    async fn task_for_missing_employee_is_not_found() {
        let app = setup_app().await;

        let (status, body) = app
            .post(
                "/onboarding/tasks",
                json!({ "employee_id": 12, "title": "Sign contract" }),
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Employee not found");
    }

    #[tokio::test]
    async fn employee_without_tasks_lists_empty() {
        let app = setup_app().await;

        let (status, tasks) = app.get("/onboarding/employees/77").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(tasks, json!([]));
    }

    #[tokio::test]
    async fn completing_missing_task_is_not_found() {
        let app = setup_app().await;

        let (status, _) = app.post("/onboarding/tasks/3/complete", json!({})).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
