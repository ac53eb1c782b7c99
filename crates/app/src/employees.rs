use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;
use workright_core::document::TemplateContext;
use workright_core::org::{OrgChart, OrgNode};
use workright_core::types::{Employee, EmployeePatch, NewEmployee, RecordId};
use workright_core::ValidationError;
use workright_storage::UnitOfWork;

use crate::problem::ApiError;
use crate::profile::{build_employee_profile, load_employee_context, EmployeeProfile};
use crate::router::AppState;
use crate::telemetry::record_write;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route("/org/structure", get(org_structure))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/:id/profile", get(employee_profile))
        .route("/:id/document-context", get(document_context))
        .route("/:id/org", get(employee_org))
}

async fn list_employees(State(state): State<AppState>) -> Result<Json<Vec<Employee>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let employees = uow.employees().list().await?;
    Ok(Json(employees))
}

async fn create_employee(
    State(state): State<AppState>,
    Json(payload): Json<NewEmployee>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    let mut uow = state.storage().begin().await?;
    if let Some(department_id) = payload.department_id {
        ensure_department(&mut uow, department_id).await?;
    }
    if let Some(manager_id) = payload.manager_id {
        ensure_manager(&mut uow, manager_id).await?;
    }

    let employee = uow.employees().insert(&payload, state.today()).await?;
    uow.commit().await?;

    record_write("employee", "create");
    info!(
        stage = "employees",
        employee_id = employee.id,
        manager_id = ?employee.manager_id,
        "employee hired"
    );
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<Employee>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let employee = fetch_employee(&mut uow, id).await?;
    Ok(Json(employee))
}

async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<EmployeePatch>,
) -> Result<Json<Employee>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut employee = fetch_employee(&mut uow, id).await?;

    if let Some(department_id) = patch.department_id {
        ensure_department(&mut uow, department_id).await?;
    }
    if let Some(manager_id) = patch.manager_id {
        ensure_manager(&mut uow, manager_id).await?;
        ensure_no_cycle(&mut uow, id, manager_id).await?;
    }

    patch.apply(&mut employee);
    uow.employees().update(&employee).await?;
    uow.commit().await?;

    record_write("employee", "update");
    Ok(Json(employee))
}

async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.employees().delete(id).await? {
        return Err(ApiError::NotFound("Employee"));
    }
    uow.commit().await?;

    record_write("employee", "delete");
    info!(stage = "employees", employee_id = id, "employee deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn employee_profile(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<EmployeeProfile>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let profile = build_employee_profile(&mut uow, id).await?;
    Ok(Json(profile))
}

async fn document_context(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<TemplateContext>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let employee = fetch_employee(&mut uow, id).await?;
    let context = load_employee_context(&mut uow, &employee).await?;
    Ok(Json(context))
}

async fn org_structure(State(state): State<AppState>) -> Result<Json<Vec<OrgNode>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let employees = uow.employees().list().await?;
    let forest = OrgChart::new(&employees).forest()?;
    Ok(Json(forest))
}

async fn employee_org(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<OrgNode>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let employees = uow.employees().list().await?;
    let node = OrgChart::new(&employees).subtree(id)?;
    Ok(Json(node))
}

pub(crate) async fn fetch_employee(
    uow: &mut UnitOfWork,
    id: RecordId,
) -> Result<Employee, ApiError> {
    uow.employees()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Employee"))
}

pub(crate) async fn ensure_department(uow: &mut UnitOfWork, id: RecordId) -> Result<(), ApiError> {
    match uow.departments().fetch(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Department")),
    }
}

async fn ensure_manager(uow: &mut UnitOfWork, id: RecordId) -> Result<(), ApiError> {
    match uow.employees().fetch(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Manager")),
    }
}

async fn ensure_no_cycle(
    uow: &mut UnitOfWork,
    employee_id: RecordId,
    manager_id: RecordId,
) -> Result<(), ApiError> {
    if employee_id == manager_id {
        return Err(ValidationError::SelfManaged(employee_id).into());
    }
    let employees = uow.employees().list().await?;
    if OrgChart::new(&employees).would_create_cycle(employee_id, manager_id) {
        return Err(ValidationError::ManagerCycle {
            employee_id,
            manager_id,
        }
        .into());
    }
    Ok(())
}
