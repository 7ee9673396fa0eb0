//! Certificate database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{map_constraint, Database, DbError, DbResult};
use crate::models::{Certificate, CertificateWithPatient, NewCertificate};

const JOINED_SELECT: &str = r#"
    SELECT c.id, c.patient_id, c.issue_date, c.leave_duration_days,
           c.diagnosis, c.pdf_path, c.created_at,
           p.full_name, p.birth_date
    FROM certificates c
    JOIN patients p ON p.id = c.patient_id
"#;

/// Map one joined row; column order matches [`JOINED_SELECT`].
fn joined_row(row: &Row<'_>) -> rusqlite::Result<CertificateWithPatient> {
    Ok(CertificateWithPatient {
        certificate: Certificate {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            issue_date: row.get(2)?,
            leave_duration_days: row.get(3)?,
            diagnosis: row.get(4)?,
            pdf_path: row.get(5)?,
            created_at: row.get(6)?,
        },
        patient_full_name: row.get(7)?,
        patient_birth_date: row.get(8)?,
    })
}

impl Database {
    /// Insert a new certificate. A missing patient surfaces as a
    /// constraint violation from the foreign key.
    pub fn add_certificate(&self, new: &NewCertificate) -> DbResult<Certificate> {
        self.conn
            .execute(
                r#"
                INSERT INTO certificates (
                    patient_id, issue_date, leave_duration_days, diagnosis, pdf_path
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    new.patient_id,
                    new.issue_date,
                    new.leave_duration_days,
                    new.diagnosis,
                    new.pdf_path,
                ],
            )
            .map_err(map_constraint)?;

        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, issue_date, leave_duration_days,
                       diagnosis, pdf_path, created_at
                FROM certificates
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(Certificate {
                        id: row.get(0)?,
                        patient_id: row.get(1)?,
                        issue_date: row.get(2)?,
                        leave_duration_days: row.get(3)?,
                        diagnosis: row.get(4)?,
                        pdf_path: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| DbError::NotFound(format!("certificate {}", id)))
    }

    /// Get a certificate joined with its patient's name and birth date.
    pub fn get_certificate(&self, id: i64) -> DbResult<Option<CertificateWithPatient>> {
        self.conn
            .query_row(&format!("{} WHERE c.id = ?", JOINED_SELECT), [id], joined_row)
            .optional()
            .map_err(Into::into)
    }

    /// List all certificates, most recently created first.
    pub fn list_certificates(&self) -> DbResult<Vec<CertificateWithPatient>> {
        // id tiebreak keeps the ordering deterministic within one second
        let mut stmt = self.conn.prepare(&format!(
            "{} ORDER BY c.created_at DESC, c.id DESC",
            JOINED_SELECT
        ))?;

        let rows = stmt.query_map([], joined_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List one patient's certificates, most recently created first.
    pub fn list_certificates_for_patient(
        &self,
        patient_id: i64,
    ) -> DbResult<Vec<CertificateWithPatient>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE c.patient_id = ? ORDER BY c.created_at DESC, c.id DESC",
            JOINED_SELECT
        ))?;

        let rows = stmt.query_map([patient_id], joined_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Update a certificate's editable fields. `created_at` is immutable.
    pub fn update_certificate(&self, certificate: &Certificate) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE certificates SET
                    issue_date = ?2,
                    leave_duration_days = ?3,
                    diagnosis = ?4,
                    pdf_path = ?5
                WHERE id = ?1
                "#,
                params![
                    certificate.id,
                    certificate.issue_date,
                    certificate.leave_duration_days,
                    certificate.diagnosis,
                    certificate.pdf_path,
                ],
            )
            .map_err(map_constraint)?;
        Ok(rows_affected > 0)
    }

    /// Change just the issue date.
    pub fn update_certificate_issue_date(&self, id: i64, issue_date: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE certificates SET issue_date = ?2 WHERE id = ?1",
            params![id, issue_date],
        )?;
        Ok(rows_affected > 0)
    }

    /// Record the path of a generated PDF.
    pub fn update_certificate_pdf_path(&self, id: i64, pdf_path: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE certificates SET pdf_path = ?2 WHERE id = ?1",
            params![id, pdf_path],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a certificate.
    pub fn delete_certificate(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM certificates WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
