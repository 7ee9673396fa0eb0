//! Patient database operations.

use rusqlite::{params, OptionalExtension};

use super::{map_constraint, Database, DbError, DbResult};
use crate::models::{NewPatient, Patient};

impl Database {
    /// Insert a new patient. Fails with [`DbError::Constraint`] when the
    /// national id collides with an existing patient.
    pub fn add_patient(&self, new: &NewPatient) -> DbResult<Patient> {
        self.conn
            .execute(
                "INSERT INTO patients (full_name, birth_date, national_id) VALUES (?1, ?2, ?3)",
                params![new.full_name, new.birth_date, new.national_id],
            )
            .map_err(map_constraint)?;

        let id = self.conn.last_insert_rowid();
        self.get_patient(id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", id)))
    }

    /// Look up a patient by exact `(full_name, birth_date)` identity;
    /// create one if no match exists. Case-sensitive, no fuzzy matching.
    pub fn find_or_create_patient(&self, new: &NewPatient) -> DbResult<Patient> {
        let existing = self
            .conn
            .query_row(
                r#"
                SELECT id, full_name, birth_date, national_id, created_at
                FROM patients
                WHERE full_name = ?1 AND birth_date IS ?2
                "#,
                params![new.full_name, new.birth_date],
                |row| {
                    Ok(Patient {
                        id: row.get(0)?,
                        full_name: row.get(1)?,
                        birth_date: row.get(2)?,
                        national_id: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;

        match existing {
            Some(patient) => Ok(patient),
            None => self.add_patient(new),
        }
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                r#"
                SELECT id, full_name, birth_date, national_id, created_at
                FROM patients
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(Patient {
                        id: row.get(0)?,
                        full_name: row.get(1)?,
                        birth_date: row.get(2)?,
                        national_id: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients, sorted by full name.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, full_name, birth_date, national_id, created_at
            FROM patients
            ORDER BY full_name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Patient {
                id: row.get(0)?,
                full_name: row.get(1)?,
                birth_date: row.get(2)?,
                national_id: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Update a patient's editable fields.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE patients SET
                    full_name = ?2,
                    birth_date = ?3,
                    national_id = ?4
                WHERE id = ?1
                "#,
                params![
                    patient.id,
                    patient.full_name,
                    patient.birth_date,
                    patient.national_id,
                ],
            )
            .map_err(map_constraint)?;
        Ok(rows_affected > 0)
    }

    /// Explicitly backdate (or forward-date) a patient's creation
    /// timestamp.
    pub fn update_patient_created_at(&self, id: i64, created_at: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET created_at = ?2 WHERE id = ?1",
            params![id, created_at],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a patient; their certificates go with them.
    pub fn delete_patient(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
