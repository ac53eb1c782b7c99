use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use workright_core::types::{NewOnboardingTask, OnboardingTask, RecordId};

use crate::StorageError;

const TASK_COLUMNS: &str = "id, employee_id, title, description, due_date, completed";

/// Repository for the `onboarding_tasks` table.
pub struct OnboardingTaskRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> OnboardingTaskRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<OnboardingTask>, StorageError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM onboarding_tasks ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_task)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_employee(
        &mut self,
        employee_id: RecordId,
    ) -> Result<Vec<OnboardingTask>, StorageError> {
        let sql =
            format!("SELECT {TASK_COLUMNS} FROM onboarding_tasks WHERE employee_id = ? ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(employee_id)
            .try_map(map_task)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<OnboardingTask>, StorageError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM onboarding_tasks WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_task)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn insert(&mut self, record: &NewOnboardingTask) -> Result<OnboardingTask, StorageError> {
        let sql = format!(
            "INSERT INTO onboarding_tasks (employee_id, title, description, due_date, completed) \
             VALUES (?, ?, ?, ?, 0) RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(record.employee_id)
            .bind(&record.title)
            .bind(&record.description)
            .bind(record.due_date)
            .try_map(map_task)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn update(&mut self, task: &OnboardingTask) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE onboarding_tasks SET title = ?, description = ?, due_date = ?, completed = ? WHERE id = ?",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.completed)
        .bind(task.id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM onboarding_tasks WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_task(row: SqliteRow) -> Result<OnboardingTask, sqlx::Error> {
    Ok(OnboardingTask {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        due_date: row.try_get("due_date")?,
        completed: row.try_get("completed")?,
    })
}
