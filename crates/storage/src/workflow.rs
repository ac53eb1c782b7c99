use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use workright_core::types::{
    ChangeRequestStatus, EmployeeChangeRequest, NewChangeRequest, RecordId,
};

use crate::{to_rfc3339, StorageError};

const REQUEST_COLUMNS: &str =
    "id, employee_id, request_type, details, status, submitted_at, decided_at, approver_notes";

/// Repository for the `change_requests` table.
pub struct ChangeRequestRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ChangeRequestRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<EmployeeChangeRequest>, StorageError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM change_requests ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_request)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_employee(
        &mut self,
        employee_id: RecordId,
    ) -> Result<Vec<EmployeeChangeRequest>, StorageError> {
        let sql =
            format!("SELECT {REQUEST_COLUMNS} FROM change_requests WHERE employee_id = ? ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(employee_id)
            .try_map(map_request)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(
        &mut self,
        id: RecordId,
    ) -> Result<Option<EmployeeChangeRequest>, StorageError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM change_requests WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_request)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    /// Files a pending request submitted at `submitted_at`.
    pub async fn insert(
        &mut self,
        record: &NewChangeRequest,
        submitted_at: DateTime<Utc>,
    ) -> Result<EmployeeChangeRequest, StorageError> {
        let sql = format!(
            "INSERT INTO change_requests (employee_id, request_type, details, status, submitted_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {REQUEST_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(record.employee_id)
            .bind(&record.request_type)
            .bind(&record.details)
            .bind(ChangeRequestStatus::Pending.as_str())
            .bind(to_rfc3339(submitted_at))
            .try_map(map_request)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    /// Persists the decision fields of a request.
    pub async fn update(&mut self, request: &EmployeeChangeRequest) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE change_requests SET status = ?, decided_at = ?, approver_notes = ? WHERE id = ?",
        )
        .bind(request.status.as_str())
        .bind(request.decided_at.map(to_rfc3339))
        .bind(&request.approver_notes)
        .bind(request.id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM change_requests WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_request(row: SqliteRow) -> Result<EmployeeChangeRequest, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(EmployeeChangeRequest {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        request_type: row.try_get("request_type")?,
        details: row.try_get("details")?,
        status: ChangeRequestStatus::from_db(&status),
        submitted_at: row.try_get("submitted_at")?,
        decided_at: row.try_get("decided_at")?,
        approver_notes: row.try_get("approver_notes")?,
    })
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use chrono::{Duration, TimeZone, Utc};
    use workright_core::types::{ChangeRequestDecision, ChangeRequestStatus, NewChangeRequest};

    #[tokio::test]
    async fn decision_is_persisted() {
        let test = setup_db().await;
        let mut uow = test.db.begin().await.expect("begin");
        let alice = uow
            .employees()
            .insert(&new_employee("Alice", None), today())
            .await
            .expect("employee");

        let submitted = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let mut request = uow
            .change_requests()
            .insert(
                &NewChangeRequest {
                    employee_id: alice.id,
                    request_type: "Promotion".to_string(),
                    details: "Promote to Senior Engineer".to_string(),
                },
                submitted,
            )
            .await
            .expect("insert");
        assert_eq!(request.status, ChangeRequestStatus::Pending);
        assert_eq!(request.submitted_at, submitted);
        assert!(request.decided_at.is_none());

        let decided = submitted + Duration::hours(2);
        ChangeRequestDecision {
            status: Some(ChangeRequestStatus::Rejected),
            approver_notes: Some("Next cycle".to_string()),
        }
        .apply(&mut request, decided);
        uow.change_requests().update(&request).await.expect("update");

        let stored = uow
            .change_requests()
            .fetch(request.id)
            .await
            .expect("fetch")
            .expect("present");
        assert_eq!(stored.status, ChangeRequestStatus::Rejected);
        assert_eq!(stored.decided_at, Some(decided));
        assert_eq!(stored.approver_notes.as_deref(), Some("Next cycle"));
    }
}
