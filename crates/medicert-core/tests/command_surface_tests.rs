//! Tests for the FFI command surface, driven exactly the way a host
//! shell would drive it.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use tempfile::TempDir;

use medicert_core::{
    open_store_in_memory, FfiConfig, FfiIssueRequest, FfiNewCertificate, FfiNewPatient,
    FfiPrinter, MedicertCore, MedicertError,
};

fn config(dir: &TempDir) -> FfiConfig {
    FfiConfig {
        pdf_dir: dir.path().to_string_lossy().into_owned(),
        clinic_name: None,
        doctor_name: None,
        issue_place: None,
    }
}

fn setup() -> Result<(Arc<MedicertCore>, TempDir)> {
    let dir = tempfile::tempdir()?;
    let core = open_store_in_memory(config(&dir))?;
    Ok((core, dir))
}

fn new_patient(full_name: &str) -> FfiNewPatient {
    FfiNewPatient {
        full_name: full_name.into(),
        birth_date: None,
        national_id: None,
    }
}

struct FakeDialog {
    cancel: bool,
    printed: Mutex<Vec<String>>,
}

impl FakeDialog {
    fn new(cancel: bool) -> Arc<Self> {
        Arc::new(Self {
            cancel,
            printed: Mutex::new(Vec::new()),
        })
    }
}

impl FfiPrinter for FakeDialog {
    fn print_html(&self, html: String) -> Result<bool, MedicertError> {
        self.printed.lock().unwrap().push(html);
        Ok(self.cancel)
    }

    fn print_file(&self, path: String) -> Result<bool, MedicertError> {
        self.printed.lock().unwrap().push(path);
        Ok(self.cancel)
    }
}

#[test]
fn duplicate_national_id_is_constraint_violation() -> Result<()> {
    let (core, _dir) = setup()?;

    let mut first = new_patient("Ahmed Ali");
    first.national_id = Some("123".into());
    core.add_patient(first)?;

    let mut second = new_patient("Someone Else");
    second.national_id = Some("123".into());
    let result = core.add_patient(second);
    assert!(matches!(
        result,
        Err(MedicertError::ConstraintViolation(_))
    ));

    // First patient remains retrievable, unmodified
    let patients = core.get_patients()?;
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].full_name, "Ahmed Ali");
    Ok(())
}

#[test]
fn empty_full_name_is_invalid_input() -> Result<()> {
    let (core, _dir) = setup()?;

    let result = core.add_patient(new_patient("   "));
    assert!(matches!(result, Err(MedicertError::InvalidInput(_))));
    Ok(())
}

#[test]
fn non_positive_leave_duration_is_invalid_input() -> Result<()> {
    let (core, _dir) = setup()?;
    let patient = core.add_patient(new_patient("Ahmed Ali"))?;

    let result = core.add_certificate(FfiNewCertificate {
        patient_id: patient.id,
        issue_date: Some("2024-03-01".into()),
        leave_duration_days: 0,
        diagnosis: None,
    });
    assert!(matches!(result, Err(MedicertError::InvalidInput(_))));
    Ok(())
}

#[test]
fn missing_issue_date_defaults_to_today() -> Result<()> {
    let (core, _dir) = setup()?;
    let patient = core.add_patient(new_patient("Ahmed Ali"))?;

    let certificate = core.add_certificate(FfiNewCertificate {
        patient_id: patient.id,
        issue_date: None,
        leave_duration_days: 3,
        diagnosis: None,
    })?;

    let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(certificate.issue_date, today);
    Ok(())
}

#[test]
fn certificates_listed_most_recent_first() -> Result<()> {
    let (core, _dir) = setup()?;
    let patient = core.add_patient(new_patient("Ahmed Ali"))?;

    let mut ids = Vec::new();
    for day in 1..=3 {
        let certificate = core.add_certificate(FfiNewCertificate {
            patient_id: patient.id,
            issue_date: Some(format!("2024-03-0{}", day)),
            leave_duration_days: day,
            diagnosis: None,
        })?;
        ids.push(certificate.id);
    }
    ids.reverse();

    let all = core.get_certificates()?;
    let listed: Vec<i64> = all.iter().map(|c| c.certificate.id).collect();
    assert_eq!(listed, ids);
    assert_eq!(all[0].patient_full_name, "Ahmed Ali");

    let by_patient = core.get_certificates_by_patient(patient.id)?;
    let listed: Vec<i64> = by_patient.iter().map(|c| c.certificate.id).collect();
    assert_eq!(listed, ids);
    Ok(())
}

#[test]
fn delete_patient_cascades_over_the_surface() -> Result<()> {
    let (core, _dir) = setup()?;
    let patient = core.add_patient(new_patient("Ahmed Ali"))?;

    for _ in 0..2 {
        core.add_certificate(FfiNewCertificate {
            patient_id: patient.id,
            issue_date: Some("2024-03-01".into()),
            leave_duration_days: 5,
            diagnosis: None,
        })?;
    }

    assert!(core.delete_patient(patient.id)?);
    assert!(core.get_certificates_by_patient(patient.id)?.is_empty());
    assert!(core.get_certificates()?.is_empty());
    Ok(())
}

#[test]
fn update_certificate_issue_date_over_the_surface() -> Result<()> {
    let (core, _dir) = setup()?;
    let patient = core.add_patient(new_patient("Ahmed Ali"))?;
    let certificate = core.add_certificate(FfiNewCertificate {
        patient_id: patient.id,
        issue_date: Some("2024-03-01".into()),
        leave_duration_days: 5,
        diagnosis: None,
    })?;

    assert!(core.update_certificate_issue_date(certificate.id, "2024-03-15".into())?);

    let fetched = core.get_certificates_by_patient(patient.id)?;
    assert_eq!(fetched[0].certificate.issue_date, "2024-03-15");
    assert_eq!(fetched[0].certificate.leave_duration_days, 5);
    Ok(())
}

#[test]
fn print_direct_without_printer_fails() -> Result<()> {
    let (core, _dir) = setup()?;

    let result = core.print_direct("<p>x</p>".into());
    assert!(matches!(result, Err(MedicertError::RenderFailure(_))));
    Ok(())
}

#[test]
fn print_direct_reports_cancellation_as_success() -> Result<()> {
    let (core, _dir) = setup()?;
    core.set_printer(FakeDialog::new(true))?;

    let result = core.print_direct("<p>x</p>".into())?;
    assert!(result.success);
    assert!(result.cancelled);
    Ok(())
}

#[test]
fn issue_certificate_to_printer_round_trip() -> Result<()> {
    let (core, _dir) = setup()?;
    let dialog = FakeDialog::new(false);
    core.set_printer(dialog.clone())?;

    let result = core.issue_certificate_to_printer(FfiIssueRequest {
        patient_full_name: "Ahmed Ali".into(),
        patient_birth_date: Some("1990-01-01".into()),
        patient_birth_place: None,
        patient_national_id: None,
        issue_date: Some("2024-03-01".into()),
        leave_duration_days: 5,
        diagnosis: Some("Grippe".into()),
    })?;

    assert!(result.success);
    assert!(!result.cancelled);
    let certificate = result.certificate.expect("persisted");
    assert!(certificate.pdf_path.is_none());

    let printed = dialog.printed.lock().unwrap();
    assert_eq!(printed.len(), 1);
    assert!(printed[0].contains("Diagnostic : Grippe"));
    Ok(())
}

#[test]
fn print_pdf_missing_file_is_not_found() -> Result<()> {
    let (core, _dir) = setup()?;
    core.set_printer(FakeDialog::new(false))?;

    let result = core.print_pdf("/nonexistent/certificate.pdf".into());
    assert!(matches!(result, Err(MedicertError::NotFound(_))));
    Ok(())
}

#[test]
fn generate_pdf_from_missing_certificate_is_not_found() -> Result<()> {
    let (core, _dir) = setup()?;

    let result = core.generate_pdf_from_certificate(999);
    assert!(matches!(result, Err(MedicertError::NotFound(_))));
    Ok(())
}

#[test]
fn render_certificate_html_preview() -> Result<()> {
    let (core, _dir) = setup()?;

    let html = core.render_certificate_html(FfiIssueRequest {
        patient_full_name: "Ahmed Ali".into(),
        patient_birth_date: Some("1990-01-01".into()),
        patient_birth_place: None,
        patient_national_id: None,
        issue_date: Some("2024-03-01".into()),
        leave_duration_days: 5,
        diagnosis: None,
    })?;

    assert!(html.contains("Ahmed Ali"));
    assert!(html.contains("01/03/2024"));
    // Absent birth place falls back to the fixed placeholder
    assert!(html.contains("non spécifié"));
    // Nothing was stored
    assert!(core.get_patients()?.is_empty());
    Ok(())
}
