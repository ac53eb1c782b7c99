use std::{str::FromStr, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Sqlite, SqlitePool, Transaction,
};
use thiserror::Error;

mod departments;
mod documents;
mod employees;
mod onboarding;
mod payroll;
mod recruitment;
mod rostering;
mod travel;
mod workflow;

pub use departments::DepartmentRepository;
pub use documents::{DocumentTemplateRepository, GeneratedDocumentRepository};
pub use employees::EmployeeRepository;
pub use onboarding::OnboardingTaskRepository;
pub use payroll::{PayrollEntryRepository, PayrollRunRepository};
pub use recruitment::{CandidateRepository, JobRequisitionRepository};
pub use rostering::ShiftRepository;
pub use travel::{AccommodationRepository, FlightRepository};
pub use workflow::ChangeRequestRepository;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        Self::connect_with(database_url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Same as [`Database::connect`] with an explicit pool size.
    ///
    /// The database file is created when missing. Every pooled connection runs
    /// with foreign keys enforced, WAL journaling and a 5 second busy timeout.
    pub async fn connect_with(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Opens a unit of work. Dropping it without [`UnitOfWork::commit`] rolls back.
    pub async fn begin(&self) -> Result<UnitOfWork, StorageError> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork { tx })
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// One request's transactional scope. Repositories borrow its connection.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub fn departments(&mut self) -> DepartmentRepository<'_> {
        DepartmentRepository::new(&mut self.tx)
    }

    pub fn employees(&mut self) -> EmployeeRepository<'_> {
        EmployeeRepository::new(&mut self.tx)
    }

    pub fn jobs(&mut self) -> JobRequisitionRepository<'_> {
        JobRequisitionRepository::new(&mut self.tx)
    }

    pub fn candidates(&mut self) -> CandidateRepository<'_> {
        CandidateRepository::new(&mut self.tx)
    }

    pub fn onboarding_tasks(&mut self) -> OnboardingTaskRepository<'_> {
        OnboardingTaskRepository::new(&mut self.tx)
    }

    pub fn payroll_runs(&mut self) -> PayrollRunRepository<'_> {
        PayrollRunRepository::new(&mut self.tx)
    }

    pub fn payroll_entries(&mut self) -> PayrollEntryRepository<'_> {
        PayrollEntryRepository::new(&mut self.tx)
    }

    pub fn shifts(&mut self) -> ShiftRepository<'_> {
        ShiftRepository::new(&mut self.tx)
    }

    pub fn accommodations(&mut self) -> AccommodationRepository<'_> {
        AccommodationRepository::new(&mut self.tx)
    }

    pub fn flights(&mut self) -> FlightRepository<'_> {
        FlightRepository::new(&mut self.tx)
    }

    pub fn change_requests(&mut self) -> ChangeRequestRepository<'_> {
        ChangeRequestRepository::new(&mut self.tx)
    }

    pub fn templates(&mut self) -> DocumentTemplateRepository<'_> {
        DocumentTemplateRepository::new(&mut self.tx)
    }

    pub fn generated_documents(&mut self) -> GeneratedDocumentRepository<'_> {
        GeneratedDocumentRepository::new(&mut self.tx)
    }

    /// Commits every write performed through this unit of work.
    pub async fn commit(self) -> Result<(), StorageError> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use workright_core::types::NewDepartment;

    #[tokio::test]
    async fn migrations_apply() {
        let test = setup_db().await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '_sqlx%' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_one(test.db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 13, "expected one table per entity");
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let test = setup_db().await;

        {
            let mut uow = test.db.begin().await.expect("begin");
            uow.departments()
                .insert(&NewDepartment {
                    name: "Finance".to_string(),
                    description: None,
                    cost_center: None,
                })
                .await
                .expect("insert");
        }

        let mut uow = test.db.begin().await.expect("begin");
        assert!(uow.departments().list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn committed_unit_of_work_is_visible() {
        let test = setup_db().await;

        let mut uow = test.db.begin().await.expect("begin");
        let employee = uow
            .employees()
            .insert(&new_employee("Alice", None), today())
            .await
            .expect("insert");
        uow.commit().await.expect("commit");

        let mut uow = test.db.begin().await.expect("begin");
        let fetched = uow.employees().fetch(employee.id).await.expect("fetch");
        assert_eq!(fetched, Some(employee));
    }
}
