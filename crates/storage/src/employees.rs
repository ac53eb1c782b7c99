use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use workright_core::types::{Employee, NewEmployee, RecordId};

use crate::StorageError;

const EMPLOYEE_COLUMNS: &str = "id, first_name, last_name, email, phone, hire_date, department_id, \
     position, manager_id, status, location, employment_type";

/// Repository for the `employees` table.
pub struct EmployeeRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> EmployeeRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Lists every employee ordered by identity.
    pub async fn list(&mut self) -> Result<Vec<Employee>, StorageError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_employee)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<Employee>, StorageError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_employee)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    /// Lists the employees whose manager is `manager_id`.
    pub async fn list_reports(&mut self, manager_id: RecordId) -> Result<Vec<Employee>, StorageError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE manager_id = ? ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(manager_id)
            .try_map(map_employee)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    /// Inserts a new employee; a missing hire date becomes `today`.
    pub async fn insert(
        &mut self,
        record: &NewEmployee,
        today: NaiveDate,
    ) -> Result<Employee, StorageError> {
        let sql = format!(
            "INSERT INTO employees \
             (first_name, last_name, email, phone, hire_date, department_id, position, manager_id, status, location, employment_type) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {EMPLOYEE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&record.first_name)
            .bind(&record.last_name)
            .bind(&record.email)
            .bind(&record.phone)
            .bind(record.hire_date.unwrap_or(today))
            .bind(record.department_id)
            .bind(&record.position)
            .bind(record.manager_id)
            .bind(&record.status)
            .bind(&record.location)
            .bind(&record.employment_type)
            .try_map(map_employee)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn update(&mut self, employee: &Employee) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE employees \
             SET first_name = ?, last_name = ?, email = ?, phone = ?, hire_date = ?, department_id = ?, \
                 position = ?, manager_id = ?, status = ?, location = ?, employment_type = ? \
             WHERE id = ?",
        )
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(employee.hire_date)
        .bind(employee.department_id)
        .bind(&employee.position)
        .bind(employee.manager_id)
        .bind(&employee.status)
        .bind(&employee.location)
        .bind(&employee.employment_type)
        .bind(employee.id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    /// Deletes the employee. Reports lose their manager link and owned records cascade.
    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_employee(row: SqliteRow) -> Result<Employee, sqlx::Error> {
    Ok(Employee {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        hire_date: row.try_get("hire_date")?,
        department_id: row.try_get("department_id")?,
        position: row.try_get("position")?,
        manager_id: row.try_get("manager_id")?,
        status: row.try_get("status")?,
        location: row.try_get("location")?,
        employment_type: row.try_get("employment_type")?,
    })
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use crate::StorageError;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn insert_defaults_hire_date_to_today() {
        let test = setup_db().await;
        let mut uow = test.db.begin().await.expect("begin");

        let alice = uow
            .employees()
            .insert(&new_employee("Alice", None), today())
            .await
            .expect("insert");
        assert_eq!(alice.hire_date, today());
        assert_eq!(alice.status, "Active");

        let mut payload = new_employee("Bob", Some(alice.id));
        payload.hire_date = NaiveDate::from_ymd_opt(2020, 2, 29);
        let bob = uow.employees().insert(&payload, today()).await.expect("insert");
        assert_eq!(bob.hire_date, NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
        assert_eq!(bob.manager_id, Some(alice.id));
    }

    #[tokio::test]
    async fn deleting_manager_detaches_reports() {
        let test = setup_db().await;
        let mut uow = test.db.begin().await.expect("begin");

        let alice = uow
            .employees()
            .insert(&new_employee("Alice", None), today())
            .await
            .expect("insert");
        let bob = uow
            .employees()
            .insert(&new_employee("Bob", Some(alice.id)), today())
            .await
            .expect("insert");

        let reports = uow.employees().list_reports(alice.id).await.expect("reports");
        assert_eq!(reports, vec![bob.clone()]);

        assert!(uow.employees().delete(alice.id).await.expect("delete"));
        let bob = uow
            .employees()
            .fetch(bob.id)
            .await
            .expect("fetch")
            .expect("bob survives");
        assert_eq!(bob.manager_id, None);
    }

    #[tokio::test]
    async fn unknown_manager_violates_foreign_key() {
        let test = setup_db().await;
        let mut uow = test.db.begin().await.expect("begin");

        let err = uow
            .employees()
            .insert(&new_employee("Carol", Some(999)), today())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Database(_)));
    }
}
