use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use workright_core::types::{
    Candidate, JobRequisition, NewCandidate, NewJobRequisition, RecordId,
};

use crate::StorageError;

const JOB_COLUMNS: &str = "id, title, department_id, description, status, openings, date_opened";
const CANDIDATE_COLUMNS: &str = "id, job_id, first_name, last_name, email, phone, status, notes";

/// Repository for the `job_requisitions` table.
pub struct JobRequisitionRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> JobRequisitionRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<JobRequisition>, StorageError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM job_requisitions ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_job)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<JobRequisition>, StorageError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM job_requisitions WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_job)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    /// Opens a requisition on `opened_on` with the default "Open" status.
    pub async fn insert(
        &mut self,
        record: &NewJobRequisition,
        opened_on: NaiveDate,
    ) -> Result<JobRequisition, StorageError> {
        let sql = format!(
            "INSERT INTO job_requisitions (title, department_id, description, status, openings, date_opened) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {JOB_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&record.title)
            .bind(record.department_id)
            .bind(&record.description)
            .bind(JobRequisition::DEFAULT_STATUS)
            .bind(record.openings)
            .bind(opened_on)
            .try_map(map_job)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn update(&mut self, job: &JobRequisition) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE job_requisitions \
             SET title = ?, department_id = ?, description = ?, status = ?, openings = ? \
             WHERE id = ?",
        )
        .bind(&job.title)
        .bind(job.department_id)
        .bind(&job.description)
        .bind(&job.status)
        .bind(job.openings)
        .bind(job.id)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    /// Deletes the requisition together with its candidates.
    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM job_requisitions WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Repository for the `candidates` table.
pub struct CandidateRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CandidateRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_job(&mut self, job_id: RecordId) -> Result<Vec<Candidate>, StorageError> {
        let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE job_id = ? ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(job_id)
            .try_map(map_candidate)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<Candidate>, StorageError> {
        let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_candidate)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn insert(
        &mut self,
        job_id: RecordId,
        record: &NewCandidate,
    ) -> Result<Candidate, StorageError> {
        let sql = format!(
            "INSERT INTO candidates (job_id, first_name, last_name, email, phone, status, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {CANDIDATE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .bind(&record.first_name)
            .bind(&record.last_name)
            .bind(&record.email)
            .bind(&record.phone)
            .bind(Candidate::DEFAULT_STATUS)
            .bind(&record.notes)
            .try_map(map_candidate)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn update(&mut self, candidate: &Candidate) -> Result<(), StorageError> {
        sqlx::query("UPDATE candidates SET status = ?, notes = ? WHERE id = ?")
            .bind(&candidate.status)
            .bind(&candidate.notes)
            .bind(candidate.id)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_job(row: SqliteRow) -> Result<JobRequisition, sqlx::Error> {
    Ok(JobRequisition {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        department_id: row.try_get("department_id")?,
        description: row.try_get("description")?,
        status: row.try_get("status")?,
        openings: row.try_get("openings")?,
        date_opened: row.try_get("date_opened")?,
    })
}

fn map_candidate(row: SqliteRow) -> Result<Candidate, sqlx::Error> {
    Ok(Candidate {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        status: row.try_get("status")?,
        notes: row.try_get("notes")?,
    })
}
