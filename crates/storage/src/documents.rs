use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use workright_core::types::{
    DocumentTemplate, GeneratedDocument, NewDocumentTemplate, NewGeneratedDocument, RecordId,
};

use crate::{to_rfc3339, StorageError};

const TEMPLATE_COLUMNS: &str = "id, name, description, content";
const DOCUMENT_COLUMNS: &str = "id, employee_id, template_id, generated_at, content, filename";

/// Repository for the `document_templates` table.
pub struct DocumentTemplateRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> DocumentTemplateRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<DocumentTemplate>, StorageError> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM document_templates ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_template)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<DocumentTemplate>, StorageError> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM document_templates WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_template)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn insert(
        &mut self,
        record: &NewDocumentTemplate,
    ) -> Result<DocumentTemplate, StorageError> {
        let sql = format!(
            "INSERT INTO document_templates (name, description, content) VALUES (?, ?, ?) \
             RETURNING {TEMPLATE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&record.name)
            .bind(&record.description)
            .bind(&record.content)
            .try_map(map_template)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn update(&mut self, template: &DocumentTemplate) -> Result<(), StorageError> {
        sqlx::query("UPDATE document_templates SET name = ?, description = ?, content = ? WHERE id = ?")
            .bind(&template.name)
            .bind(&template.description)
            .bind(&template.content)
            .bind(template.id)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    /// Deletes the template and every document generated from it.
    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM document_templates WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Repository for the `generated_documents` table.
pub struct GeneratedDocumentRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> GeneratedDocumentRepository<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<GeneratedDocument>, StorageError> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM generated_documents ORDER BY id");
        let rows = sqlx::query(&sql)
            .try_map(map_document)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn fetch(&mut self, id: RecordId) -> Result<Option<GeneratedDocument>, StorageError> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM generated_documents WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .try_map(map_document)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn insert(
        &mut self,
        record: &NewGeneratedDocument,
    ) -> Result<GeneratedDocument, StorageError> {
        let sql = format!(
            "INSERT INTO generated_documents (employee_id, template_id, generated_at, content, filename) \
             VALUES (?, ?, ?, ?, ?) RETURNING {DOCUMENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(record.employee_id)
            .bind(record.template_id)
            .bind(to_rfc3339(record.generated_at))
            .bind(&record.content)
            .bind(&record.filename)
            .try_map(map_document)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(row)
    }

    pub async fn delete(&mut self, id: RecordId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM generated_documents WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_template(row: SqliteRow) -> Result<DocumentTemplate, sqlx::Error> {
    Ok(DocumentTemplate {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        content: row.try_get("content")?,
    })
}

fn map_document(row: SqliteRow) -> Result<GeneratedDocument, sqlx::Error> {
    Ok(GeneratedDocument {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        template_id: row.try_get("template_id")?,
        generated_at: row.try_get("generated_at")?,
        content: row.try_get("content")?,
        filename: row.try_get("filename")?,
    })
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use chrono::{TimeZone, Utc};
    use workright_core::types::{NewDocumentTemplate, NewGeneratedDocument};

    #[tokio::test]
    async fn deleting_template_removes_generated_documents() {
        let test = setup_db().await;
        let mut uow = test.db.begin().await.expect("begin");
        let alice = uow
            .employees()
            .insert(&new_employee("Alice", None), today())
            .await
            .expect("employee");
        let template = uow
            .templates()
            .insert(&NewDocumentTemplate {
                name: "Offer Letter".to_string(),
                description: None,
                content: "Welcome {{full_name}}".to_string(),
            })
            .await
            .expect("template");

        let generated_at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let document = uow
            .generated_documents()
            .insert(&NewGeneratedDocument {
                employee_id: alice.id,
                template_id: template.id,
                generated_at,
                content: "Welcome Alice Smith".to_string(),
                filename: "offer-letter.txt".to_string(),
            })
            .await
            .expect("document");
        assert_eq!(document.generated_at, generated_at);
        assert_eq!(uow.generated_documents().list().await.expect("list").len(), 1);

        assert!(uow.templates().delete(template.id).await.expect("delete"));
        assert!(uow
            .generated_documents()
            .fetch(document.id)
            .await
            .expect("fetch")
            .is_none());
    }
}
