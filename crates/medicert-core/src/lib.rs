//! Medicert Core Library
//!
//! Patient registry and French sick-leave certificate issuance for a
//! single-operator clinic, backed by a local SQLite store.
//!
//! # Architecture
//!
//! ```text
//! Operator input
//!       │
//!       ▼
//! Command Surface (uniffi, this file)
//!       │
//!       ├──► Persistence Store ── patients / certificates / audit_log
//!       │
//!       ├──► Certificate Renderer ── fixed French HTML template
//!       │
//!       └──► PDF Issuance Workflow
//!               resolve-or-create patient → render markup →
//!               rasterize (medicert-pdf) → write certificate-<id>-<ts>.pdf
//!               → persist certificate row with the path
//!               (or hand the markup to the native print dialog)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite store with referential integrity
//! - [`models`]: domain types (Patient, Certificate)
//! - [`render`]: deterministic certificate markup rendering
//! - [`issue`]: PDF issuance workflow
//! - [`config`]: clinic letterhead and storage directory

pub mod config;
pub mod db;
pub mod issue;
pub mod models;
pub mod render;

// Re-export commonly used types
pub use config::{ConfigError, IssuerConfig};
pub use db::Database;
pub use issue::{CertificateIssuer, IssueOutcome, IssueRequest, PrintOutcome, Printer};
pub use models::{Certificate, CertificateWithPatient, NewCertificate, NewPatient, Patient};
pub use render::{CertificateRenderer, CertificateView};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedicertError {
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Render failure: {0}")]
    RenderFailure(String),

    #[error("I/O failure: {0}")]
    IoFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<db::DbError> for MedicertError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::Constraint(msg) => MedicertError::ConstraintViolation(msg),
            db::DbError::NotFound(msg) => MedicertError::NotFound(msg),
            other => MedicertError::DatabaseError(other.to_string()),
        }
    }
}

impl From<render::RenderError> for MedicertError {
    fn from(e: render::RenderError) -> Self {
        MedicertError::RenderFailure(e.to_string())
    }
}

impl From<issue::IssueError> for MedicertError {
    fn from(e: issue::IssueError) -> Self {
        match e {
            issue::IssueError::Db(db) => db.into(),
            issue::IssueError::Render(e) => MedicertError::RenderFailure(e.to_string()),
            issue::IssueError::Pdf(e) => MedicertError::RenderFailure(e.to_string()),
            issue::IssueError::Io(e) => MedicertError::IoFailure(e.to_string()),
            issue::IssueError::Print(msg) => MedicertError::RenderFailure(msg),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedicertError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedicertError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Print Dialog Callback
// =========================================================================

/// Native print dialog, implemented by the host shell and handed in via
/// [`MedicertCore::set_printer`]. Methods return `true` when the operator
/// cancelled the dialog.
#[uniffi::export(with_foreign)]
pub trait FfiPrinter: Send + Sync {
    fn print_html(&self, html: String) -> Result<bool, MedicertError>;
    fn print_file(&self, path: String) -> Result<bool, MedicertError>;
}

/// Adapts the foreign dialog to the workflow's [`Printer`] trait.
struct PrinterBridge(Arc<dyn FfiPrinter>);

impl Printer for PrinterBridge {
    fn print_html(&self, html: &str) -> Result<PrintOutcome, String> {
        match self.0.print_html(html.to_string()) {
            Ok(true) => Ok(PrintOutcome::Cancelled),
            Ok(false) => Ok(PrintOutcome::Completed),
            Err(e) => Err(e.to_string()),
        }
    }

    fn print_file(&self, path: &Path) -> Result<PrintOutcome, String> {
        match self.0.print_file(path.to_string_lossy().into_owned()) {
            Ok(true) => Ok(PrintOutcome::Cancelled),
            Ok(false) => Ok(PrintOutcome::Completed),
            Err(e) => Err(e.to_string()),
        }
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a store at the given path.
#[uniffi::export]
pub fn open_store(db_path: String, config: FfiConfig) -> Result<Arc<MedicertCore>, MedicertError> {
    let db = Database::open(&db_path)?;
    Ok(Arc::new(MedicertCore::with_database(db, config)))
}

/// Create an in-memory store (for testing).
#[uniffi::export]
pub fn open_store_in_memory(config: FfiConfig) -> Result<Arc<MedicertCore>, MedicertError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(MedicertCore::with_database(db, config)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe store wrapper exposed to the host shell. One instance per
/// process; the shell serializes operator actions.
#[derive(uniffi::Object)]
pub struct MedicertCore {
    db: Arc<Mutex<Database>>,
    config: IssuerConfig,
    printer: Mutex<Option<Arc<dyn FfiPrinter>>>,
}

impl MedicertCore {
    fn with_database(db: Database, config: FfiConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: config.into(),
            printer: Mutex::new(None),
        }
    }

    fn printer(&self) -> Result<Arc<dyn FfiPrinter>, MedicertError> {
        self.printer
            .lock()?
            .clone()
            .ok_or_else(|| MedicertError::RenderFailure("No printer configured".into()))
    }
}

#[uniffi::export]
impl MedicertCore {
    /// Register the host shell's print dialog.
    pub fn set_printer(&self, printer: Arc<dyn FfiPrinter>) -> Result<(), MedicertError> {
        *self.printer.lock()? = Some(printer);
        Ok(())
    }

    // =====================================================================
    // Patient Operations
    // =====================================================================

    /// Register a new patient.
    pub fn add_patient(&self, patient: FfiNewPatient) -> Result<FfiPatient, MedicertError> {
        let new = validated_patient(patient)?;
        let db = self.db.lock()?;
        Ok(db.add_patient(&new)?.into())
    }

    /// All patients, sorted by full name.
    pub fn get_patients(&self) -> Result<Vec<FfiPatient>, MedicertError> {
        let db = self.db.lock()?;
        Ok(db.list_patients()?.into_iter().map(Into::into).collect())
    }

    /// Look up by exact `(full_name, birth_date)`, creating on miss.
    pub fn find_or_create_patient(
        &self,
        patient: FfiNewPatient,
    ) -> Result<FfiPatient, MedicertError> {
        let new = validated_patient(patient)?;
        let db = self.db.lock()?;
        Ok(db.find_or_create_patient(&new)?.into())
    }

    /// Update a patient's editable fields.
    pub fn update_patient(&self, patient: FfiPatient) -> Result<bool, MedicertError> {
        if patient.full_name.trim().is_empty() {
            return Err(MedicertError::InvalidInput("full_name is required".into()));
        }
        let db = self.db.lock()?;
        Ok(db.update_patient(&patient.into())?)
    }

    /// Backdate (or forward-date) a patient's creation timestamp.
    pub fn update_patient_created_at(
        &self,
        id: i64,
        created_at: String,
    ) -> Result<bool, MedicertError> {
        let db = self.db.lock()?;
        Ok(db.update_patient_created_at(id, &created_at)?)
    }

    /// Delete a patient and, by cascade, all of their certificates.
    pub fn delete_patient(&self, id: i64) -> Result<bool, MedicertError> {
        let db = self.db.lock()?;
        Ok(db.delete_patient(id)?)
    }

    // =====================================================================
    // Certificate Operations
    // =====================================================================

    /// Record a certificate. `issue_date` defaults to today when absent.
    pub fn add_certificate(
        &self,
        certificate: FfiNewCertificate,
    ) -> Result<FfiCertificate, MedicertError> {
        let new = validated_certificate(certificate)?;
        let db = self.db.lock()?;
        Ok(db.add_certificate(&new)?.into())
    }

    /// All certificates joined with patient identity, most recent first.
    pub fn get_certificates(&self) -> Result<Vec<FfiCertificateWithPatient>, MedicertError> {
        let db = self.db.lock()?;
        Ok(db.list_certificates()?.into_iter().map(Into::into).collect())
    }

    /// One patient's certificates, most recent first.
    pub fn get_certificates_by_patient(
        &self,
        patient_id: i64,
    ) -> Result<Vec<FfiCertificateWithPatient>, MedicertError> {
        let db = self.db.lock()?;
        Ok(db
            .list_certificates_for_patient(patient_id)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Update a certificate's editable fields.
    pub fn update_certificate(&self, certificate: FfiCertificate) -> Result<bool, MedicertError> {
        if certificate.leave_duration_days <= 0 {
            return Err(MedicertError::InvalidInput(
                "leave_duration_days must be positive".into(),
            ));
        }
        let db = self.db.lock()?;
        Ok(db.update_certificate(&certificate.into())?)
    }

    /// Change just a certificate's issue date.
    pub fn update_certificate_issue_date(
        &self,
        id: i64,
        issue_date: String,
    ) -> Result<bool, MedicertError> {
        let db = self.db.lock()?;
        Ok(db.update_certificate_issue_date(id, &issue_date)?)
    }

    /// Delete a certificate.
    pub fn delete_certificate(&self, id: i64) -> Result<bool, MedicertError> {
        let db = self.db.lock()?;
        Ok(db.delete_certificate(id)?)
    }

    // =====================================================================
    // Issuance Operations
    // =====================================================================

    /// Render the certificate markup for a live preview. Touches nothing.
    pub fn render_certificate_html(
        &self,
        request: FfiIssueRequest,
    ) -> Result<String, MedicertError> {
        let request = validated_request(request)?;
        let db = self.db.lock()?;
        let issuer = CertificateIssuer::new(&db, self.config.clone())?;
        Ok(issuer.render_preview(&request)?)
    }

    /// Full issuance: resolve the patient, render, rasterize, write the
    /// PDF, persist the certificate row.
    pub fn issue_certificate(
        &self,
        request: FfiIssueRequest,
    ) -> Result<FfiIssueResult, MedicertError> {
        let request = validated_request(request)?;
        let db = self.db.lock()?;
        let issuer = CertificateIssuer::new(&db, self.config.clone())?;
        Ok(issuer.issue_and_save(&request)?.into())
    }

    /// Issuance through the native print dialog; no file is stored.
    pub fn issue_certificate_to_printer(
        &self,
        request: FfiIssueRequest,
    ) -> Result<FfiIssueResult, MedicertError> {
        let request = validated_request(request)?;
        let printer = PrinterBridge(self.printer()?);
        let db = self.db.lock()?;
        let issuer = CertificateIssuer::new(&db, self.config.clone())?;
        Ok(issuer.issue_and_print(&request, &printer)?.into())
    }

    /// Rasterize caller-supplied markup and persist the certificate row
    /// with the resulting file path.
    pub fn generate_and_save_pdf(
        &self,
        html: String,
        certificate: FfiNewCertificate,
    ) -> Result<FfiIssueResult, MedicertError> {
        let new = validated_certificate(certificate)?;
        let db = self.db.lock()?;
        let issuer = CertificateIssuer::new(&db, self.config.clone())?;
        Ok(issuer.save_pdf(&html, &new)?.into())
    }

    /// Re-render an existing certificate and write a fresh PDF for it.
    pub fn generate_pdf_from_certificate(
        &self,
        certificate_id: i64,
    ) -> Result<FfiIssueResult, MedicertError> {
        let db = self.db.lock()?;
        let issuer = CertificateIssuer::new(&db, self.config.clone())?;
        Ok(issuer.regenerate_pdf(certificate_id)?.into())
    }

    /// Send an already-generated PDF file to the print dialog.
    pub fn print_pdf(&self, path: String) -> Result<FfiPrintResult, MedicertError> {
        if !Path::new(&path).is_file() {
            return Err(MedicertError::NotFound(format!("PDF file {}", path)));
        }
        let printer = self.printer()?;
        let cancelled = printer.print_file(path)?;
        Ok(FfiPrintResult {
            success: true,
            cancelled,
        })
    }

    /// Send markup straight to the print dialog without storing anything.
    pub fn print_direct(&self, html: String) -> Result<FfiPrintResult, MedicertError> {
        let printer = self.printer()?;
        let cancelled = printer.print_html(html)?;
        Ok(FfiPrintResult {
            success: true,
            cancelled,
        })
    }
}

// =========================================================================
// Validation
// =========================================================================

fn validated_patient(patient: FfiNewPatient) -> Result<NewPatient, MedicertError> {
    if patient.full_name.trim().is_empty() {
        return Err(MedicertError::InvalidInput("full_name is required".into()));
    }
    Ok(NewPatient {
        full_name: patient.full_name,
        birth_date: patient.birth_date,
        national_id: patient.national_id,
    })
}

fn validated_certificate(certificate: FfiNewCertificate) -> Result<NewCertificate, MedicertError> {
    if certificate.leave_duration_days <= 0 {
        return Err(MedicertError::InvalidInput(
            "leave_duration_days must be positive".into(),
        ));
    }
    Ok(NewCertificate {
        patient_id: certificate.patient_id,
        issue_date: certificate.issue_date.unwrap_or_else(today),
        leave_duration_days: certificate.leave_duration_days,
        diagnosis: certificate.diagnosis,
        pdf_path: None,
    })
}

fn validated_request(request: FfiIssueRequest) -> Result<IssueRequest, MedicertError> {
    if request.patient_full_name.trim().is_empty() {
        return Err(MedicertError::InvalidInput(
            "patient_full_name is required".into(),
        ));
    }
    if request.leave_duration_days <= 0 {
        return Err(MedicertError::InvalidInput(
            "leave_duration_days must be positive".into(),
        ));
    }
    Ok(IssueRequest {
        patient_full_name: request.patient_full_name,
        patient_birth_date: request.patient_birth_date,
        patient_birth_place: request.patient_birth_place,
        patient_national_id: request.patient_national_id,
        issue_date: request.issue_date.unwrap_or_else(today),
        leave_duration_days: request.leave_duration_days,
        diagnosis: request.diagnosis,
    })
}

/// Today's date, ISO `YYYY-MM-DD`, UTC.
fn today() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

// =========================================================================
// FFI Types
// =========================================================================

/// Store configuration handed in at open time. Absent letterhead fields
/// fall back to the built-in defaults.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConfig {
    pub pdf_dir: String,
    pub clinic_name: Option<String>,
    pub doctor_name: Option<String>,
    pub issue_place: Option<String>,
}

impl From<FfiConfig> for IssuerConfig {
    fn from(config: FfiConfig) -> Self {
        let mut issuer = IssuerConfig::new(config.pdf_dir);
        if let Some(clinic_name) = config.clinic_name {
            issuer.clinic_name = clinic_name;
        }
        if let Some(doctor_name) = config.doctor_name {
            issuer.doctor_name = doctor_name;
        }
        if let Some(issue_place) = config.issue_place {
            issuer.issue_place = issue_place;
        }
        issuer
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub full_name: String,
    pub birth_date: Option<String>,
    pub national_id: Option<String>,
    pub created_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            full_name: patient.full_name,
            birth_date: patient.birth_date,
            national_id: patient.national_id,
            created_at: patient.created_at,
        }
    }
}

impl From<FfiPatient> for Patient {
    fn from(patient: FfiPatient) -> Self {
        Patient {
            id: patient.id,
            full_name: patient.full_name,
            birth_date: patient.birth_date,
            national_id: patient.national_id,
            created_at: patient.created_at,
        }
    }
}

/// FFI-safe patient registration payload.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub full_name: String,
    pub birth_date: Option<String>,
    pub national_id: Option<String>,
}

/// FFI-safe certificate.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCertificate {
    pub id: i64,
    pub patient_id: i64,
    pub issue_date: String,
    pub leave_duration_days: i64,
    pub diagnosis: Option<String>,
    pub pdf_path: Option<String>,
    pub created_at: String,
}

impl From<Certificate> for FfiCertificate {
    fn from(certificate: Certificate) -> Self {
        Self {
            id: certificate.id,
            patient_id: certificate.patient_id,
            issue_date: certificate.issue_date,
            leave_duration_days: certificate.leave_duration_days,
            diagnosis: certificate.diagnosis,
            pdf_path: certificate.pdf_path,
            created_at: certificate.created_at,
        }
    }
}

impl From<FfiCertificate> for Certificate {
    fn from(certificate: FfiCertificate) -> Self {
        Certificate {
            id: certificate.id,
            patient_id: certificate.patient_id,
            issue_date: certificate.issue_date,
            leave_duration_days: certificate.leave_duration_days,
            diagnosis: certificate.diagnosis,
            pdf_path: certificate.pdf_path,
            created_at: certificate.created_at,
        }
    }
}

/// FFI-safe certificate payload. `issue_date` empty means today.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewCertificate {
    pub patient_id: i64,
    pub issue_date: Option<String>,
    pub leave_duration_days: i64,
    pub diagnosis: Option<String>,
}

/// FFI-safe certificate joined with patient identity.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCertificateWithPatient {
    pub certificate: FfiCertificate,
    pub patient_full_name: String,
    pub patient_birth_date: Option<String>,
}

impl From<CertificateWithPatient> for FfiCertificateWithPatient {
    fn from(row: CertificateWithPatient) -> Self {
        Self {
            certificate: row.certificate.into(),
            patient_full_name: row.patient_full_name,
            patient_birth_date: row.patient_birth_date,
        }
    }
}

/// FFI-safe issuance request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIssueRequest {
    pub patient_full_name: String,
    pub patient_birth_date: Option<String>,
    pub patient_birth_place: Option<String>,
    pub patient_national_id: Option<String>,
    pub issue_date: Option<String>,
    pub leave_duration_days: i64,
    pub diagnosis: Option<String>,
}

/// FFI-safe issuance result. `cancelled` is a normal outcome, not an
/// error.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIssueResult {
    pub success: bool,
    pub certificate: Option<FfiCertificate>,
    pub pdf_path: Option<String>,
    pub cancelled: bool,
}

impl From<IssueOutcome> for FfiIssueResult {
    fn from(outcome: IssueOutcome) -> Self {
        Self {
            success: true,
            certificate: outcome.certificate.map(Into::into),
            pdf_path: outcome
                .pdf_path
                .map(|p| p.to_string_lossy().into_owned()),
            cancelled: outcome.cancelled,
        }
    }
}

/// FFI-safe print result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrintResult {
    pub success: bool,
    pub cancelled: bool,
}
