use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use workright_core::types::{NewPayrollRun, PayrollEntry, PayrollRun, RecordId};

use crate::{to_rfc3339, StorageError};

const RUN_COLUMNS: &str = "id, period_start, period_end, processed_at, status";
const ENTRY_COLUMNS: &str = "id, payroll_run_id, employee_id, gross_pay, tax_withheld, net_pay";

/// Repository for the `payroll_runs` table.
pub struct PayrollRunRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PayrollRunRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<PayrollRun>, StorageError> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM payroll_runs ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_run)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<PayrollRun>, StorageError> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM payroll_runs WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_run)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    /// Creates a run in the draft state.
    pub async fn insert(&mut self, record: &NewPayrollRun) -> Result<PayrollRun, StorageError> {
        let sql = format!(
            "INSERT INTO payroll_runs (period_start, period_end, processed_at, status) \
             VALUES (?, ?, NULL, ?) RETURNING {RUN_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(record.period_start)
            .bind(record.period_end)
            .bind(PayrollRun::STATUS_DRAFT)
            .try_map(map_run)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn update(&mut self, run: &PayrollRun) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE payroll_runs SET period_start = ?, period_end = ?, processed_at = ?, status = ? WHERE id = ?",
        )
        .bind(run.period_start)
        .bind(run.period_end)
        .bind(run.processed_at.map(to_rfc3339))
        .bind(&run.status)
        .bind(run.id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    /// Deletes the run together with its entries.
    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM payroll_runs WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Repository for the `payroll_entries` table.
pub struct PayrollEntryRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PayrollEntryRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_run(&mut self, run_id: RecordId) -> Result<Vec<PayrollEntry>, StorageError> {
        let sql =
            format!("SELECT {ENTRY_COLUMNS} FROM payroll_entries WHERE payroll_run_id = ? ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(run_id)
            .try_map(map_entry)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_employee(
        &mut self,
        employee_id: RecordId,
    ) -> Result<Vec<PayrollEntry>, StorageError> {
        let sql =
            format!("SELECT {ENTRY_COLUMNS} FROM payroll_entries WHERE employee_id = ? ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(employee_id)
            .try_map(map_entry)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<PayrollEntry>, StorageError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM payroll_entries WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_entry)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    /// Stores an entry whose net pay has already been computed and validated.
    pub async fn insert(
        &mut self,
        payroll_run_id: RecordId,
        employee_id: RecordId,
        gross_pay: f64,
        tax_withheld: f64,
        net_pay: f64,
    ) -> Result<PayrollEntry, StorageError> {
        let sql = format!(
            "INSERT INTO payroll_entries (payroll_run_id, employee_id, gross_pay, tax_withheld, net_pay) \
             VALUES (?, ?, ?, ?, ?) RETURNING {ENTRY_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(payroll_run_id)
            .bind(employee_id)
            .bind(gross_pay)
            .bind(tax_withheld)
            .bind(net_pay)
            .try_map(map_entry)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM payroll_entries WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_run(row: SqliteRow) -> Result<PayrollRun, sqlx::Error> {
    Ok(PayrollRun {
        id: row.try_get("id")?,
        period_start: row.try_get("period_start")?,
        period_end: row.try_get("period_end")?,
        processed_at: row.try_get("processed_at")?,
        status: row.try_get("status")?,
    })
}

fn map_entry(row: SqliteRow) -> Result<PayrollEntry, sqlx::Error> {
    Ok(PayrollEntry {
        id: row.try_get("id")?,
        payroll_run_id: row.try_get("payroll_run_id")?,
        employee_id: row.try_get("employee_id")?,
        gross_pay: row.try_get("gross_pay")?,
        tax_withheld: row.try_get("tax_withheld")?,
        net_pay: row.try_get("net_pay")?,
    })
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use workright_core::types::NewPayrollRun;

    #[tokio::test]
    async fn finalised_run_round_trips_processed_at() {
        let test = setup_db().await;
        let mut uow = test.db.begin().await.expect("begin");

        let mut run = uow
            .payroll_runs()
            .insert(&NewPayrollRun {
                period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                period_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            })
            .await
            .expect("insert");
        assert_eq!(run.status, "Draft");
        assert!(run.processed_at.is_none());

        let processed = Utc.with_ymd_and_hms(2024, 2, 1, 12, 30, 0).unwrap();
        run.finalise(processed);
        uow.payroll_runs().update(&run).await.expect("update");

        let stored = uow
            .payroll_runs()
            .fetch(run.id)
            .await
            .expect("fetch")
            .expect("present");
        assert_eq!(stored.status, "Finalised");
        assert_eq!(stored.processed_at, Some(processed));
    }

    #[tokio::test]
    async fn entries_cascade_with_their_run() {
        let test = setup_db().await;
        let mut uow = test.db.begin().await.expect("begin");
        let alice = uow
            .employees()
            .insert(&new_employee("Alice", None), today())
            .await
            .expect("employee");
        let run = uow
            .payroll_runs()
            .insert(&NewPayrollRun {
                period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                period_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            })
            .await
            .expect("run");

        let entry = uow
            .payroll_entries()
            .insert(run.id, alice.id, 5000.0, 1000.0, 4000.0)
            .await
            .expect("entry");
        assert_eq!(entry.net_pay, 4000.0);
        assert_eq!(
            uow.payroll_entries().list_for_employee(alice.id).await.expect("history"),
            vec![entry.clone()]
        );

        assert!(uow.payroll_runs().delete(run.id).await.expect("delete"));
        assert!(uow.payroll_entries().fetch(entry.id).await.expect("fetch").is_none());
    }
}
