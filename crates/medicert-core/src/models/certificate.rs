//! Certificate models.

use serde::{Deserialize, Serialize};

/// A sick-leave certificate. Cannot outlive its patient: deleting the
/// patient cascades to all of their certificates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Certificate {
    /// Surrogate row id
    pub id: i64,
    /// Owning patient
    pub patient_id: i64,
    /// Issue date, ISO `YYYY-MM-DD`, operator-editable after creation
    pub issue_date: String,
    /// Prescribed leave in days; callers validate that it is positive
    pub leave_duration_days: i64,
    /// Free-text diagnosis
    pub diagnosis: Option<String>,
    /// Absolute path of the generated PDF; None until one has been produced
    pub pdf_path: Option<String>,
    /// Creation timestamp, immutable
    pub created_at: String,
}

/// Fields required to record a certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCertificate {
    pub patient_id: i64,
    pub issue_date: String,
    pub leave_duration_days: i64,
    pub diagnosis: Option<String>,
    pub pdf_path: Option<String>,
}

/// A certificate joined with the patient fields the listing views and the
/// renderer need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertificateWithPatient {
    pub certificate: Certificate,
    pub patient_full_name: String,
    pub patient_birth_date: Option<String>,
}

impl NewCertificate {
    /// Create a certificate payload without a PDF yet.
    pub fn new(patient_id: i64, issue_date: impl Into<String>, leave_duration_days: i64) -> Self {
        Self {
            patient_id,
            issue_date: issue_date.into(),
            leave_duration_days,
            diagnosis: None,
            pdf_path: None,
        }
    }

    pub fn with_diagnosis(mut self, diagnosis: impl Into<String>) -> Self {
        self.diagnosis = Some(diagnosis.into());
        self
    }
}
