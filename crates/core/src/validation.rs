use thiserror::Error;

use crate::types::RecordId;

/// Field-level validation failures surfaced to clients as bad requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("End time must be after start time")]
    ShiftEndBeforeStart,
    #[error("Check-out must be after check-in")]
    CheckOutBeforeCheckIn,
    #[error("Arrival must be after departure")]
    ArrivalBeforeDeparture,
    #[error("Payroll period must end on or after its start")]
    PeriodEndBeforeStart,
    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },
    #[error("Tax withheld must not exceed gross pay")]
    TaxExceedsGross,
    #[error("Openings must be at least 1")]
    InvalidOpenings,
    #[error("Employee {0} cannot be their own manager")]
    SelfManaged(RecordId),
    #[error("Assigning manager {manager_id} to employee {employee_id} would create a reporting cycle")]
    ManagerCycle {
        employee_id: RecordId,
        manager_id: RecordId,
    },
}

/// Rejects monetary amounts below zero (NaN is treated as invalid too).
pub fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NegativeAmount { field })
    }
}
