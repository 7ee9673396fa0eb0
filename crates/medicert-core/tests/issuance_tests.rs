//! End-to-end issuance workflow tests against an in-memory store.
//!
//! Rasterization needs font files on the machine; tests that produce
//! actual PDF bytes skip themselves when none are installed.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tempfile::TempDir;

use medicert_core::issue::{CertificateIssuer, IssueRequest, PrintOutcome, Printer};
use medicert_core::models::{NewCertificate, NewPatient};
use medicert_core::{Database, IssuerConfig};

fn setup() -> Result<(Database, TempDir)> {
    Ok((Database::open_in_memory()?, tempfile::tempdir()?))
}

fn ahmed_request() -> IssueRequest {
    IssueRequest {
        patient_full_name: "Ahmed Ali".into(),
        patient_birth_date: Some("1990-01-01".into()),
        patient_birth_place: Some("In Salah".into()),
        patient_national_id: None,
        issue_date: "2024-03-01".into(),
        leave_duration_days: 5,
        diagnosis: None,
    }
}

/// Captures what reached the print dialog and reports a fixed outcome.
struct FakeDialog {
    cancel: bool,
    seen_html: Mutex<Option<String>>,
}

impl FakeDialog {
    fn new(cancel: bool) -> Self {
        Self {
            cancel,
            seen_html: Mutex::new(None),
        }
    }

    fn outcome(&self) -> PrintOutcome {
        if self.cancel {
            PrintOutcome::Cancelled
        } else {
            PrintOutcome::Completed
        }
    }
}

impl Printer for FakeDialog {
    fn print_html(&self, html: &str) -> Result<PrintOutcome, String> {
        *self.seen_html.lock().unwrap() = Some(html.to_string());
        Ok(self.outcome())
    }

    fn print_file(&self, _path: &Path) -> Result<PrintOutcome, String> {
        Ok(self.outcome())
    }
}

#[test]
fn issue_and_save_persists_certificate_and_pdf() -> Result<()> {
    if !medicert_pdf::fonts_available() {
        eprintln!("skipping: no fonts installed");
        return Ok(());
    }

    let (db, dir) = setup()?;
    let issuer = CertificateIssuer::new(&db, IssuerConfig::new(dir.path()))?;

    let outcome = issuer.issue_and_save(&ahmed_request())?;
    assert!(!outcome.cancelled);

    let certificate = outcome.certificate.expect("certificate persisted");
    let patient = db.find_or_create_patient(
        &NewPatient::new("Ahmed Ali").with_birth_date("1990-01-01"),
    )?;
    assert_eq!(certificate.patient_id, patient.id);

    let path = outcome.pdf_path.expect("pdf written");
    let filename = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(filename.starts_with(&format!("certificate-{}-", patient.id)));

    let bytes = std::fs::read(&path)?;
    assert!(bytes.starts_with(b"%PDF"));

    let stored = db.get_certificate(certificate.id)?.unwrap();
    assert_eq!(
        stored.certificate.pdf_path.as_deref(),
        Some(path.to_string_lossy().as_ref())
    );
    Ok(())
}

#[test]
fn issue_and_print_renders_expected_markup() -> Result<()> {
    let (db, dir) = setup()?;
    let issuer = CertificateIssuer::new(&db, IssuerConfig::new(dir.path()))?;
    let dialog = FakeDialog::new(false);

    let outcome = issuer.issue_and_print(&ahmed_request(), &dialog)?;
    assert!(!outcome.cancelled);

    let certificate = outcome.certificate.expect("certificate persisted");
    assert!(certificate.pdf_path.is_none());
    assert!(outcome.pdf_path.is_none());

    let html = dialog.seen_html.lock().unwrap().clone().expect("dialog saw markup");
    assert!(html.contains("Ahmed Ali"));
    assert!(html.contains("5"));
    assert!(html.contains("01/03/2024"));
    Ok(())
}

#[test]
fn cancelled_print_persists_nothing() -> Result<()> {
    let (db, dir) = setup()?;
    let issuer = CertificateIssuer::new(&db, IssuerConfig::new(dir.path()))?;
    let dialog = FakeDialog::new(true);

    let outcome = issuer.issue_and_print(&ahmed_request(), &dialog)?;
    assert!(outcome.cancelled);
    assert!(outcome.certificate.is_none());
    assert!(outcome.pdf_path.is_none());

    assert!(db.list_certificates()?.is_empty());
    // Not even the patient row: resolution waits for the dialog
    assert!(db.list_patients()?.is_empty());
    Ok(())
}

#[test]
fn issuing_twice_reuses_the_same_patient() -> Result<()> {
    let (db, dir) = setup()?;
    let issuer = CertificateIssuer::new(&db, IssuerConfig::new(dir.path()))?;
    let dialog = FakeDialog::new(false);

    let first = issuer.issue_and_print(&ahmed_request(), &dialog)?;
    let second = issuer.issue_and_print(&ahmed_request(), &dialog)?;

    assert_eq!(
        first.certificate.unwrap().patient_id,
        second.certificate.unwrap().patient_id
    );
    assert_eq!(db.list_patients()?.len(), 1);
    Ok(())
}

#[test]
fn updated_issue_date_shows_up_in_rerender() -> Result<()> {
    let (db, dir) = setup()?;
    let issuer = CertificateIssuer::new(&db, IssuerConfig::new(dir.path()))?;

    let patient = db.add_patient(&NewPatient::new("Ahmed Ali"))?;
    let certificate =
        db.add_certificate(&NewCertificate::new(patient.id, "2024-03-01", 5))?;

    assert!(db.update_certificate_issue_date(certificate.id, "2024-03-15")?);

    let row = db.get_certificate(certificate.id)?.unwrap();
    assert_eq!(row.certificate.issue_date, "2024-03-15");
    assert_eq!(row.certificate.leave_duration_days, 5);

    let view = medicert_core::CertificateView::from_certificate(
        &row,
        issuer.config(),
    );
    let html = medicert_core::CertificateRenderer::new()?.render(&view)?;
    assert!(html.contains("15/03/2024"));
    assert!(!html.contains("01/03/2024"));
    Ok(())
}

#[test]
fn regenerate_pdf_uses_name_based_filename() -> Result<()> {
    if !medicert_pdf::fonts_available() {
        eprintln!("skipping: no fonts installed");
        return Ok(());
    }

    let (db, dir) = setup()?;
    let issuer = CertificateIssuer::new(&db, IssuerConfig::new(dir.path()))?;

    let patient = db.add_patient(&NewPatient::new("Ahmed Ali"))?;
    let certificate =
        db.add_certificate(&NewCertificate::new(patient.id, "2024-03-01", 5))?;
    assert!(certificate.pdf_path.is_none());

    let outcome = issuer.regenerate_pdf(certificate.id)?;
    let path = outcome.pdf_path.expect("pdf written");
    let filename = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(filename.starts_with("certificate_Ahmed_Ali_"));

    let stored = db.get_certificate(certificate.id)?.unwrap();
    assert!(stored.certificate.pdf_path.is_some());
    Ok(())
}

#[test]
fn save_pdf_records_supplied_certificate() -> Result<()> {
    if !medicert_pdf::fonts_available() {
        eprintln!("skipping: no fonts installed");
        return Ok(());
    }

    let (db, dir) = setup()?;
    let issuer = CertificateIssuer::new(&db, IssuerConfig::new(dir.path()))?;

    let patient = db.add_patient(&NewPatient::new("Ahmed Ali"))?;
    let html = issuer.render_preview(&ahmed_request())?;

    let outcome = issuer.save_pdf(
        &html,
        &NewCertificate::new(patient.id, "2024-03-01", 5).with_diagnosis("Grippe"),
    )?;

    let certificate = outcome.certificate.expect("certificate persisted");
    assert_eq!(certificate.diagnosis.as_deref(), Some("Grippe"));
    assert!(certificate.pdf_path.is_some());
    assert!(outcome.pdf_path.unwrap().is_file());
    Ok(())
}
