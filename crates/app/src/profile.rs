use serde::Serialize;
use workright_core::document::{employee_context, TemplateContext};
use workright_core::types::{
    AccommodationBooking, Department, Employee, EmployeeChangeRequest, FlightBooking,
    OnboardingTask, PayrollEntry, RecordId, ScheduleShift,
};
use workright_storage::{StorageError, UnitOfWork};

use crate::problem::ApiError;

/// Everything known about one employee, gathered in a single unit of work.
#[derive(Debug, Serialize)]
pub struct EmployeeProfile {
    pub employee: Employee,
    pub manager: Option<Employee>,
    pub department: Option<Department>,
    pub direct_reports: Vec<Employee>,
    pub onboarding_tasks: Vec<OnboardingTask>,
    pub scheduled_shifts: Vec<ScheduleShift>,
    pub accommodation_bookings: Vec<AccommodationBooking>,
    pub flight_bookings: Vec<FlightBooking>,
    pub change_requests: Vec<EmployeeChangeRequest>,
    pub payroll_history: Vec<PayrollEntry>,
}

pub async fn build_employee_profile(
    uow: &mut UnitOfWork,
    employee_id: RecordId,
) -> Result<EmployeeProfile, ApiError> {
    let employee = uow
        .employees()
        .fetch(employee_id)
        .await?
        .ok_or(ApiError::NotFound("Employee"))?;
    let (department, manager) = resolve_relations(uow, &employee).await?;

    Ok(EmployeeProfile {
        direct_reports: uow.employees().list_reports(employee_id).await?,
        onboarding_tasks: uow.onboarding_tasks().list_for_employee(employee_id).await?,
        scheduled_shifts: uow.shifts().list_for_employee(employee_id).await?,
        accommodation_bookings: uow.accommodations().list_for_employee(employee_id).await?,
        flight_bookings: uow.flights().list_for_employee(employee_id).await?,
        change_requests: uow.change_requests().list_for_employee(employee_id).await?,
        payroll_history: uow.payroll_entries().list_for_employee(employee_id).await?,
        employee,
        manager,
        department,
    })
}

/// Templating context for an employee with its department and manager resolved.
pub async fn load_employee_context(
    uow: &mut UnitOfWork,
    employee: &Employee,
) -> Result<TemplateContext, StorageError> {
    let (department, manager) = resolve_relations(uow, employee).await?;
    Ok(employee_context(
        employee,
        department.as_ref(),
        manager.as_ref(),
    ))
}

async fn resolve_relations(
    uow: &mut UnitOfWork,
    employee: &Employee,
) -> Result<(Option<Department>, Option<Employee>), StorageError> {
    let department = match employee.department_id {
        Some(department_id) => uow.departments().fetch(department_id).await?,
        None => None,
    };
    let manager = match employee.manager_id {
        Some(manager_id) => uow.employees().fetch(manager_id).await?,
        None => None,
    };
    Ok((department, manager))
}
