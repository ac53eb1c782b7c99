use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use workright_core::types::{NewScheduleShift, RecordId, ScheduleShift};

use crate::{to_rfc3339, StorageError};

const SHIFT_COLUMNS: &str = "id, employee_id, start_time, end_time, location, role";

/// Repository for the `schedule_shifts` table.
pub struct ShiftRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ShiftRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<ScheduleShift>, StorageError> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM schedule_shifts ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_shift)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    /// Lists an employee's shifts in chronological order.
    pub async fn list_for_employee(
        &mut self,
        employee_id: RecordId,
    ) -> Result<Vec<ScheduleShift>, StorageError> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM schedule_shifts WHERE employee_id = ? ORDER BY start_time, id"
        );
        let rows = sqlx::query(&sql)
            .bind(employee_id)
            .try_map(map_shift)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<ScheduleShift>, StorageError> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM schedule_shifts WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_shift)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn insert(&mut self, record: &NewScheduleShift) -> Result<ScheduleShift, StorageError> {
        let sql = format!(
            "INSERT INTO schedule_shifts (employee_id, start_time, end_time, location, role) \
             VALUES (?, ?, ?, ?, ?) RETURNING {SHIFT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(record.employee_id)
            .bind(to_rfc3339(record.start_time))
            .bind(to_rfc3339(record.end_time))
            .bind(&record.location)
            .bind(&record.role)
            .try_map(map_shift)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn update(&mut self, shift: &ScheduleShift) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE schedule_shifts SET start_time = ?, end_time = ?, location = ?, role = ? WHERE id = ?",
        )
        .bind(to_rfc3339(shift.start_time))
        .bind(to_rfc3339(shift.end_time))
        .bind(&shift.location)
        .bind(&shift.role)
        .bind(shift.id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM schedule_shifts WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_shift(row: SqliteRow) -> Result<ScheduleShift, sqlx::Error> {
    Ok(ScheduleShift {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        location: row.try_get("location")?,
        role: row.try_get("role")?,
    })
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use chrono::{Duration, TimeZone, Utc};
    use workright_core::types::NewScheduleShift;

    #[tokio::test]
    async fn employee_shifts_come_back_in_start_order() {
        let test = setup_db().await;
        let mut uow = test.db.begin().await.expect("begin");
        let alice = uow
            .employees()
            .insert(&new_employee("Alice", None), today())
            .await
            .expect("employee");

        let monday = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let tuesday = monday + Duration::days(1);
        for start in [tuesday, monday] {
            uow.shifts()
                .insert(&NewScheduleShift {
                    employee_id: alice.id,
                    start_time: start,
                    end_time: start + Duration::hours(8),
                    location: Some("HQ".to_string()),
                    role: None,
                })
                .await
                .expect("insert");
        }

        let shifts = uow.shifts().list_for_employee(alice.id).await.expect("list");
        let starts: Vec<_> = shifts.iter().map(|shift| shift.start_time).collect();
        assert_eq!(starts, vec![monday, tuesday]);
        assert_eq!(shifts[0].end_time, monday + Duration::hours(8));
    }
}
