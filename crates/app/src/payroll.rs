use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use workright_core::types::{
    NewPayrollEntry, NewPayrollRun, PayrollEntry, PayrollRun, PayrollRunPatch, RecordId,
};
use workright_storage::UnitOfWork;

use crate::employees::fetch_employee;
use crate::problem::ApiError;
use crate::router::AppState;
use crate::telemetry::record_write;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/runs", get(list_runs).post(create_run))
        .route("/runs/:id", get(get_run).put(update_run).delete(delete_run))
        .route("/runs/:id/finalise", post(finalise_run))
        .route("/runs/:id/entries", get(run_entries))
        .route("/entries", post(create_entry))
        .route("/entries/:id", get(get_entry).delete(delete_entry))
}

async fn list_runs(State(state): State<AppState>) -> Result<Json<Vec<PayrollRun>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let runs = uow.payroll_runs().list().await?;
    Ok(Json(runs))
}

async fn create_run(
    State(state): State<AppState>,
    Json(payload): Json<NewPayrollRun>,
) -> Result<(StatusCode, Json<PayrollRun>), ApiError> {
    payload.validate()?;
    let mut uow = state.storage().begin().await?;
    let run = uow.payroll_runs().insert(&payload).await?;
    uow.commit().await?;

    record_write("payroll_run", "create");
    info!(
        stage = "payroll",
        run_id = run.id,
        period_start = %run.period_start,
        period_end = %run.period_end,
        "payroll run drafted"
    );
    Ok((StatusCode::CREATED, Json(run)))
}

async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<PayrollRun>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let run = fetch_run(&mut uow, id).await?;
    Ok(Json(run))
}

async fn update_run(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<PayrollRunPatch>,
) -> Result<Json<PayrollRun>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut run = fetch_run(&mut uow, id).await?;
    patch.apply(&mut run);
    uow.payroll_runs().update(&run).await?;
    uow.commit().await?;

    record_write("payroll_run", "update");
    Ok(Json(run))
}

async fn finalise_run(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<PayrollRun>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut run = fetch_run(&mut uow, id).await?;
    run.finalise(state.now());
    uow.payroll_runs().update(&run).await?;
    uow.commit().await?;

    record_write("payroll_run", "update");
    info!(stage = "payroll", run_id = id, "payroll run finalised");
    Ok(Json(run))
}

async fn delete_run(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.payroll_runs().delete(id).await? {
        return Err(ApiError::NotFound("Payroll run"));
    }
    uow.commit().await?;

    record_write("payroll_run", "delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn run_entries(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<Vec<PayrollEntry>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    fetch_run(&mut uow, id).await?;
    let entries = uow.payroll_entries().list_for_run(id).await?;
    Ok(Json(entries))
}

async fn create_entry(
    State(state): State<AppState>,
    Json(payload): Json<NewPayrollEntry>,
) -> Result<(StatusCode, Json<PayrollEntry>), ApiError> {
    let mut uow = state.storage().begin().await?;
    fetch_run(&mut uow, payload.payroll_run_id).await?;
    fetch_employee(&mut uow, payload.employee_id).await?;
    let net_pay = payload.net_pay()?;
    let entry = uow
        .payroll_entries()
        .insert(
            payload.payroll_run_id,
            payload.employee_id,
            payload.gross_pay,
            payload.tax_withheld,
            net_pay,
        )
        .await?;
    uow.commit().await?;

    record_write("payroll_entry", "create");
    info!(
        stage = "payroll",
        entry_id = entry.id,
        run_id = entry.payroll_run_id,
        employee_id = entry.employee_id,
        "payroll entry recorded"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<PayrollEntry>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let entry = uow
        .payroll_entries()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Payroll entry"))?;
    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.payroll_entries().delete(id).await? {
        return Err(ApiError::NotFound("Payroll entry"));
    }
    uow.commit().await?;

    record_write("payroll_entry", "delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_run(uow: &mut UnitOfWork, id: RecordId) -> Result<PayrollRun, ApiError> {
    uow.payroll_runs()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Payroll run"))
}

#[cfg(test)]
mod tests {
    use crate::router::testing::setup_app;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn draft_run(app: &crate::router::testing::TestApp) -> i64 {
        let (status, run) = app
            .post(
                "/payroll/runs",
                json!({ "period_start": "2024-01-01", "period_end": "2024-01-31" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        run["id"].as_i64().expect("id")
    }

    #[tokio::test]
    async fn run_lifecycle() {
        let app = setup_app().await;
        let run_id = draft_run(&app).await;

        let (_, run) = app.get(&format!("/payroll/runs/{run_id}")).await;
        assert_eq!(run["status"], "Draft");
        assert_eq!(run["processed_at"], Value::Null);

        let (status, finalised) = app
            .post(&format!("/payroll/runs/{run_id}/finalise"), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(finalised["status"], "Finalised");
        assert_eq!(finalised["processed_at"], "2024-01-15T09:30:00Z");
    }

    #[tokio::test]
    async fn inverted_period_is_rejected() {
        let app = setup_app().await;

        let (status, _) = app
            .post(
                "/payroll/runs",
                json!({ "period_start": "2024-02-01", "period_end": "2024-01-01" }),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn entry_net_pay_is_gross_minus_tax() {
        let app = setup_app().await;
        let alice = app.hire("Alice", None).await;
        let run_id = draft_run(&app).await;

        let (status, entry) = app
            .post(
                "/payroll/entries",
                json!({
                    "payroll_run_id": run_id,
                    "employee_id": alice,
                    "gross_pay": 5000.0,
                    "tax_withheld": 1250.5,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["net_pay"], 3749.5);

        let (_, entries) = app.get(&format!("/payroll/runs/{run_id}/entries")).await;
        assert_eq!(entries.as_array().map(Vec::len), Some(1));

        let (status, _) = app
            .delete(&format!("/payroll/entries/{}", entry["id"]))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn invalid_amounts_are_rejected() {
        let app = setup_app().await;
        let alice = app.hire("Alice", None).await;
        let run_id = draft_run(&app).await;

        for (gross, tax) in [(-1.0, 0.0), (100.0, -5.0), (100.0, 150.0)] {
            let (status, _) = app
                .post(
                    "/payroll/entries",
                    json!({
                        "payroll_run_id": run_id,
                        "employee_id": alice,
                        "gross_pay": gross,
                        "tax_withheld": tax,
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "gross={gross} tax={tax}");
        }
    }

    #[tokio::test]
    async fn entry_for_missing_run_is_not_found() {
        let app = setup_app().await;
        let alice = app.hire("Alice", None).await;

        let (status, body) = app
            .post(
                "/payroll/entries",
                json!({
                    "payroll_run_id": 9,
                    "employee_id": alice,
                    "gross_pay": 10.0,
                    "tax_withheld": 1.0,
                }),
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Payroll run not found");
    }

    #[tokio::test]
    async fn entry_for_missing_employee_is_not_found() {
        let app = setup_app().await;
        let run_id = draft_run(&app).await;

        for (gross, tax) in [(10.0, 1.0), (10.0, 50.0)] {
            let (status, body) = app
                .post(
                    "/payroll/entries",
                    json!({
                        "payroll_run_id": run_id,
                        "employee_id": 42,
                        "gross_pay": gross,
                        "tax_withheld": tax,
                    }),
                )
                .await;

            assert_eq!(status, StatusCode::NOT_FOUND, "gross={gross} tax={tax}");
            assert_eq!(body["detail"], "Employee not found");
        }

        let (_, entries) = app.get(&format!("/payroll/runs/{run_id}/entries")).await;
        assert_eq!(entries, json!([]));
    }
}
