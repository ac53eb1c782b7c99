use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::time::flexible_utc;
use crate::validation::{ensure_non_negative, ValidationError};

/// Surrogate identity assigned by the store on insert.
pub type RecordId = i64;

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub cost_center: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    pub description: Option<String>,
    pub cost_center: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost_center: Option<String>,
}

impl DepartmentPatch {
    pub fn apply(self, department: &mut Department) {
        if let Some(name) = self.name {
            department.name = name;
        }
        if let Some(description) = self.description {
            department.description = Some(description);
        }
        if let Some(cost_center) = self.cost_center {
            department.cost_center = Some(cost_center);
        }
    }
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub hire_date: NaiveDate,
    pub department_id: Option<RecordId>,
    pub position: Option<String>,
    pub manager_id: Option<RecordId>,
    pub status: String,
    pub location: Option<String>,
    pub employment_type: String,
}

impl Employee {
    pub const DEFAULT_STATUS: &'static str = "Active";
    pub const DEFAULT_EMPLOYMENT_TYPE: &'static str = "Full-time";

    /// Display name used by documents and the org chart.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Payload for hiring a new employee. `hire_date` defaults to the current day.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub department_id: Option<RecordId>,
    pub position: Option<String>,
    pub manager_id: Option<RecordId>,
    #[serde(default = "default_employee_status")]
    pub status: String,
    pub location: Option<String>,
    #[serde(default = "default_employment_type")]
    pub employment_type: String,
}

fn default_employee_status() -> String {
    Employee::DEFAULT_STATUS.to_string()
}

fn default_employment_type() -> String {
    Employee::DEFAULT_EMPLOYMENT_TYPE.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub department_id: Option<RecordId>,
    pub position: Option<String>,
    pub manager_id: Option<RecordId>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
}

impl EmployeePatch {
    pub fn apply(self, employee: &mut Employee) {
        if let Some(first_name) = self.first_name {
            employee.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            employee.last_name = last_name;
        }
        if let Some(email) = self.email {
            employee.email = email;
        }
        if let Some(phone) = self.phone {
            employee.phone = Some(phone);
        }
        if let Some(hire_date) = self.hire_date {
            employee.hire_date = hire_date;
        }
        if let Some(department_id) = self.department_id {
            employee.department_id = Some(department_id);
        }
        if let Some(position) = self.position {
            employee.position = Some(position);
        }
        if let Some(manager_id) = self.manager_id {
            employee.manager_id = Some(manager_id);
        }
        if let Some(status) = self.status {
            employee.status = status;
        }
        if let Some(location) = self.location {
            employee.location = Some(location);
        }
        if let Some(employment_type) = self.employment_type {
            employee.employment_type = employment_type;
        }
    }
}

// ---------------------------------------------------------------------------
// Recruitment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequisition {
    pub id: RecordId,
    pub title: String,
    pub department_id: Option<RecordId>,
    pub description: Option<String>,
    pub status: String,
    pub openings: i64,
    pub date_opened: NaiveDate,
}

impl JobRequisition {
    pub const DEFAULT_STATUS: &'static str = "Open";
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJobRequisition {
    pub title: String,
    pub department_id: Option<RecordId>,
    pub description: Option<String>,
    #[serde(default = "default_openings")]
    pub openings: i64,
}

fn default_openings() -> i64 {
    1
}

impl NewJobRequisition {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_openings(self.openings)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobRequisitionPatch {
    pub title: Option<String>,
    pub department_id: Option<RecordId>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub openings: Option<i64>,
}

impl JobRequisitionPatch {
    pub fn apply(self, job: &mut JobRequisition) -> Result<(), ValidationError> {
        if let Some(openings) = self.openings {
            ensure_openings(openings)?;
            job.openings = openings;
        }
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(department_id) = self.department_id {
            job.department_id = Some(department_id);
        }
        if let Some(description) = self.description {
            job.description = Some(description);
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        Ok(())
    }
}

fn ensure_openings(openings: i64) -> Result<(), ValidationError> {
    if openings >= 1 {
        Ok(())
    } else {
        Err(ValidationError::InvalidOpenings)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: RecordId,
    pub job_id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: String,
    pub notes: Option<String>,
}

impl Candidate {
    pub const DEFAULT_STATUS: &'static str = "Applied";
}

/// Candidate application; the job comes from the request path.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCandidate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePatch {
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl CandidatePatch {
    pub fn apply(self, candidate: &mut Candidate) {
        if let Some(status) = self.status {
            candidate.status = status;
        }
        if let Some(notes) = self.notes {
            candidate.notes = Some(notes);
        }
    }
}

// ---------------------------------------------------------------------------
// Onboarding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingTask {
    pub id: RecordId,
    pub employee_id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOnboardingTask {
    pub employee_id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnboardingTaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed: Option<bool>,
}

impl OnboardingTaskPatch {
    pub fn apply(self, task: &mut OnboardingTask) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = Some(description);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

// ---------------------------------------------------------------------------
// Payroll
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRun {
    pub id: RecordId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub processed_at: Option<DateTime<Utc>>,
    pub status: String,
}

impl PayrollRun {
    pub const STATUS_DRAFT: &'static str = "Draft";
    pub const STATUS_FINALISED: &'static str = "Finalised";

    /// Marks the run as processed at `now`.
    pub fn finalise(&mut self, now: DateTime<Utc>) {
        self.status = Self::STATUS_FINALISED.to_string();
        self.processed_at = Some(now);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPayrollRun {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

impl NewPayrollRun {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.period_end < self.period_start {
            return Err(ValidationError::PeriodEndBeforeStart);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayrollRunPatch {
    pub status: Option<String>,
}

impl PayrollRunPatch {
    pub fn apply(self, run: &mut PayrollRun) {
        if let Some(status) = self.status {
            run.status = status;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollEntry {
    pub id: RecordId,
    pub payroll_run_id: RecordId,
    pub employee_id: RecordId,
    pub gross_pay: f64,
    pub tax_withheld: f64,
    pub net_pay: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPayrollEntry {
    pub payroll_run_id: RecordId,
    pub employee_id: RecordId,
    pub gross_pay: f64,
    pub tax_withheld: f64,
}

impl NewPayrollEntry {
    /// Validates the amounts and returns the resulting net pay.
    pub fn net_pay(&self) -> Result<f64, ValidationError> {
        ensure_non_negative("gross_pay", self.gross_pay)?;
        ensure_non_negative("tax_withheld", self.tax_withheld)?;
        if self.tax_withheld > self.gross_pay {
            return Err(ValidationError::TaxExceedsGross);
        }
        Ok(self.gross_pay - self.tax_withheld)
    }
}

// ---------------------------------------------------------------------------
// Rostering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleShift {
    pub id: RecordId,
    pub employee_id: RecordId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewScheduleShift {
    pub employee_id: RecordId,
    #[serde(deserialize_with = "flexible_utc::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "flexible_utc::deserialize")]
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub role: Option<String>,
}

impl NewScheduleShift {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_shift_order(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleShiftPatch {
    #[serde(default, deserialize_with = "flexible_utc::option::deserialize")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_utc::option::deserialize")]
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub role: Option<String>,
}

impl ScheduleShiftPatch {
    /// Merges the patch, rejecting it when the resulting window is empty or inverted.
    pub fn apply(self, shift: &mut ScheduleShift) -> Result<(), ValidationError> {
        let start = self.start_time.unwrap_or(shift.start_time);
        let end = self.end_time.unwrap_or(shift.end_time);
        ensure_shift_order(start, end)?;

        shift.start_time = start;
        shift.end_time = end;
        if let Some(location) = self.location {
            shift.location = Some(location);
        }
        if let Some(role) = self.role {
            shift.role = Some(role);
        }
        Ok(())
    }
}

fn ensure_shift_order(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::ShiftEndBeforeStart);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Travel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationBooking {
    pub id: RecordId,
    pub employee_id: RecordId,
    pub property_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccommodationBooking {
    pub employee_id: RecordId,
    pub property_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl NewAccommodationBooking {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_stay_order(self.check_in, self.check_out)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccommodationBookingPatch {
    pub property_name: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl AccommodationBookingPatch {
    pub fn apply(self, booking: &mut AccommodationBooking) -> Result<(), ValidationError> {
        let check_in = self.check_in.unwrap_or(booking.check_in);
        let check_out = self.check_out.unwrap_or(booking.check_out);
        ensure_stay_order(check_in, check_out)?;

        booking.check_in = check_in;
        booking.check_out = check_out;
        if let Some(property_name) = self.property_name {
            booking.property_name = property_name;
        }
        if let Some(reference) = self.reference {
            booking.reference = Some(reference);
        }
        if let Some(notes) = self.notes {
            booking.notes = Some(notes);
        }
        Ok(())
    }
}

fn ensure_stay_order(check_in: NaiveDate, check_out: NaiveDate) -> Result<(), ValidationError> {
    if check_out <= check_in {
        return Err(ValidationError::CheckOutBeforeCheckIn);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightBooking {
    pub id: RecordId,
    pub employee_id: RecordId,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub airline: Option<String>,
    pub confirmation_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFlightBooking {
    pub employee_id: RecordId,
    pub departure_airport: String,
    pub arrival_airport: String,
    #[serde(deserialize_with = "flexible_utc::deserialize")]
    pub departure_time: DateTime<Utc>,
    #[serde(deserialize_with = "flexible_utc::deserialize")]
    pub arrival_time: DateTime<Utc>,
    pub airline: Option<String>,
    pub confirmation_number: Option<String>,
}

impl NewFlightBooking {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_flight_order(self.departure_time, self.arrival_time)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightBookingPatch {
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    #[serde(default, deserialize_with = "flexible_utc::option::deserialize")]
    pub departure_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_utc::option::deserialize")]
    pub arrival_time: Option<DateTime<Utc>>,
    pub airline: Option<String>,
    pub confirmation_number: Option<String>,
}

impl FlightBookingPatch {
    pub fn apply(self, flight: &mut FlightBooking) -> Result<(), ValidationError> {
        let departure = self.departure_time.unwrap_or(flight.departure_time);
        let arrival = self.arrival_time.unwrap_or(flight.arrival_time);
        ensure_flight_order(departure, arrival)?;

        flight.departure_time = departure;
        flight.arrival_time = arrival;
        if let Some(departure_airport) = self.departure_airport {
            flight.departure_airport = departure_airport;
        }
        if let Some(arrival_airport) = self.arrival_airport {
            flight.arrival_airport = arrival_airport;
        }
        if let Some(airline) = self.airline {
            flight.airline = Some(airline);
        }
        if let Some(confirmation_number) = self.confirmation_number {
            flight.confirmation_number = Some(confirmation_number);
        }
        Ok(())
    }
}

fn ensure_flight_order(
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if arrival <= departure {
        return Err(ValidationError::ArrivalBeforeDeparture);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Lifecycle of an employee change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl ChangeRequestStatus {
    /// Returns the canonical database representation for the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Parses the stored representation; unknown values read back as pending.
    pub fn from_db(value: &str) -> Self {
        match value {
            "Approved" => Self::Approved,
            "Rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeChangeRequest {
    pub id: RecordId,
    pub employee_id: RecordId,
    pub request_type: String,
    pub details: String,
    pub status: ChangeRequestStatus,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub approver_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewChangeRequest {
    pub employee_id: RecordId,
    pub request_type: String,
    pub details: String,
}

/// A decision on a change request. Re-deciding is allowed and overwrites the
/// previous status and decision time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeRequestDecision {
    pub status: Option<ChangeRequestStatus>,
    pub approver_notes: Option<String>,
}

impl ChangeRequestDecision {
    pub fn apply(self, request: &mut EmployeeChangeRequest, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            request.status = status;
            request.decided_at = Some(now);
        }
        if let Some(notes) = self.approver_notes {
            request.approver_notes = Some(notes);
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTemplate {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDocumentTemplate {
    pub name: String,
    pub description: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentTemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

impl DocumentTemplatePatch {
    pub fn apply(self, template: &mut DocumentTemplate) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(description) = self.description {
            template.description = Some(description);
        }
        if let Some(content) = self.content {
            template.content = content;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub id: RecordId,
    pub employee_id: RecordId,
    pub template_id: RecordId,
    pub generated_at: DateTime<Utc>,
    pub content: String,
    pub filename: String,
}

/// Request to render a template for an employee.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateDocument {
    pub employee_id: RecordId,
    pub template_id: RecordId,
    pub filename: String,
    pub extra_context: Option<BTreeMap<String, String>>,
}

/// Rendered document ready to be stored.
#[derive(Debug, Clone)]
pub struct NewGeneratedDocument {
    pub employee_id: RecordId,
    pub template_id: RecordId,
    pub generated_at: DateTime<Utc>,
    pub content: String,
    pub filename: String,
}
