//! Patient models.

use serde::{Deserialize, Serialize};

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Surrogate row id, assigned by the store on insert, never reused
    pub id: i64,
    /// Full name as printed on certificates
    pub full_name: String,
    /// Date of birth, ISO `YYYY-MM-DD`
    pub birth_date: Option<String>,
    /// National identity number, unique across patients when present
    pub national_id: Option<String>,
    /// Creation timestamp; operator-editable to support historical backfill
    pub created_at: String,
}

/// Fields required to register a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub full_name: String,
    pub birth_date: Option<String>,
    pub national_id: Option<String>,
}

impl NewPatient {
    /// Create a registration payload with just a name.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            birth_date: None,
            national_id: None,
        }
    }

    pub fn with_birth_date(mut self, birth_date: impl Into<String>) -> Self {
        self.birth_date = Some(birth_date.into());
        self
    }

    pub fn with_national_id(mut self, national_id: impl Into<String>) -> Self {
        self.national_id = Some(national_id.into());
        self
    }
}
