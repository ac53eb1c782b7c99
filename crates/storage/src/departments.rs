use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use workright_core::types::{Department, NewDepartment, RecordId};

use crate::StorageError;

const SELECT_DEPARTMENTS: &str = "SELECT id, name, description, cost_center FROM departments";

/// Repository for the `departments` table.
pub struct DepartmentRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> DepartmentRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<Department>, StorageError> {
        let sql = format!("{SELECT_DEPARTMENTS} ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_department)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<Department>, StorageError> {
        let sql = format!("{SELECT_DEPARTMENTS} WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_department)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn insert(&mut self, record: &NewDepartment) -> Result<Department, StorageError> {
        let row = sqlx::query(
            "INSERT INTO departments (name, description, cost_center) VALUES (?, ?, ?) \
             RETURNING id, name, description, cost_center",
        )
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.cost_center)
        .try_map(map_department)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(row)
    }

    pub async fn update(&mut self, department: &Department) -> Result<(), StorageError> {
        sqlx::query("UPDATE departments SET name = ?, description = ?, cost_center = ? WHERE id = ?")
            .bind(&department.name)
            .bind(&department.description)
            .bind(&department.cost_center)
            .bind(department.id)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    /// Deletes the department, returning `false` when no row matched.
    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_department(row: SqliteRow) -> Result<Department, sqlx::Error> {
    Ok(Department {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        cost_center: row.try_get("cost_center")?,
    })
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use workright_core::types::{DepartmentPatch, NewDepartment};

    #[tokio::test]
    async fn insert_update_delete_department() {
        let test = setup_db().await;
        let mut uow = test.db.begin().await.expect("begin");

        let mut department = uow
            .departments()
            .insert(&NewDepartment {
                name: "Engineering".to_string(),
                description: Some("Product development".to_string()),
                cost_center: None,
            })
            .await
            .expect("insert");
        assert!(department.id > 0);

        DepartmentPatch {
            cost_center: Some("CC-100".to_string()),
            ..Default::default()
        }
        .apply(&mut department);
        uow.departments().update(&department).await.expect("update");

        let fetched = uow
            .departments()
            .fetch(department.id)
            .await
            .expect("fetch")
            .expect("present");
        assert_eq!(fetched.cost_center.as_deref(), Some("CC-100"));
        assert_eq!(fetched.description.as_deref(), Some("Product development"));

        assert!(uow.departments().delete(department.id).await.expect("delete"));
        assert!(!uow.departments().delete(department.id).await.expect("delete again"));
        assert!(uow.departments().fetch(department.id).await.expect("fetch").is_none());
    }
}
