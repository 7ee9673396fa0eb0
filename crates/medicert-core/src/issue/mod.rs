//! PDF issuance workflow.
//!
//! Orchestrates patient resolution, markup rendering, rasterization and
//! certificate persistence as one logical (not transactional) unit. There
//! is no rollback: when rasterization succeeds but the store write fails,
//! the PDF file stays on disk and the failure is logged.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::IssuerConfig;
use crate::db::{Database, DbError};
use crate::models::{Certificate, NewCertificate, NewPatient};
use crate::render::{
    french_date, CertificateRenderer, CertificateView, RenderError, MISSING_FIELD,
};
use medicert_pdf::{rasterize, PdfError, PdfOptions};

/// Issuance errors. The originating cause is preserved; nothing is
/// retried automatically.
#[derive(Error, Debug)]
pub enum IssueError {
    #[error("Store error: {0}")]
    Db(#[from] DbError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Rasterization error: {0}")]
    Pdf(#[from] PdfError),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Print error: {0}")]
    Print(String),
}

pub type IssueResult<T> = Result<T, IssueError>;

/// What the native print dialog reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintOutcome {
    Completed,
    /// The operator dismissed the dialog. A normal outcome, never an error.
    Cancelled,
}

/// Native print dialog, implemented by the host shell.
pub trait Printer: Send + Sync {
    /// Show the dialog for rendered markup.
    fn print_html(&self, html: &str) -> Result<PrintOutcome, String>;

    /// Show the dialog for an existing PDF file.
    fn print_file(&self, path: &Path) -> Result<PrintOutcome, String>;
}

/// What the operator asked to issue.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub patient_full_name: String,
    pub patient_birth_date: Option<String>,
    pub patient_birth_place: Option<String>,
    pub patient_national_id: Option<String>,
    /// ISO `YYYY-MM-DD`
    pub issue_date: String,
    pub leave_duration_days: i64,
    pub diagnosis: Option<String>,
}

/// Result of one issuance.
#[derive(Debug, Clone)]
pub struct IssueOutcome {
    /// The persisted certificate; None when the operator cancelled before
    /// anything was recorded.
    pub certificate: Option<Certificate>,
    /// Where the PDF landed; None on the direct-print path.
    pub pdf_path: Option<PathBuf>,
    pub cancelled: bool,
}

/// Drives the resolve → render → rasterize → persist flow.
pub struct CertificateIssuer<'a> {
    db: &'a Database,
    renderer: CertificateRenderer,
    config: IssuerConfig,
}

impl<'a> CertificateIssuer<'a> {
    pub fn new(db: &'a Database, config: IssuerConfig) -> IssueResult<Self> {
        Ok(Self {
            db,
            renderer: CertificateRenderer::new()?,
            config,
        })
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Render the certificate markup for a request without touching the
    /// store. Used for live preview.
    pub fn render_preview(&self, request: &IssueRequest) -> IssueResult<String> {
        let view = self.view_for(
            request,
            &request.patient_full_name,
            request.patient_birth_date.as_deref(),
        );
        Ok(self.renderer.render(&view)?)
    }

    /// Full issuance: resolve-or-create the patient, render, rasterize,
    /// write the PDF and persist the certificate row with its path.
    pub fn issue_and_save(&self, request: &IssueRequest) -> IssueResult<IssueOutcome> {
        let patient = self.db.find_or_create_patient(&new_patient(request))?;
        tracing::debug!(patient_id = patient.id, "patient resolved");

        let view = self.view_for(request, &patient.full_name, patient.birth_date.as_deref());
        let html = self.renderer.render(&view)?;
        let bytes = rasterize(&html, &self.pdf_options())?;

        let path = self.write_pdf(&bytes, &id_filename(patient.id))?;
        let certificate = self
            .db
            .add_certificate(&NewCertificate {
                patient_id: patient.id,
                issue_date: request.issue_date.clone(),
                leave_duration_days: request.leave_duration_days,
                diagnosis: request.diagnosis.clone(),
                pdf_path: Some(path.to_string_lossy().into_owned()),
            })
            .map_err(|e| {
                tracing::warn!(
                    path = %path.display(),
                    "certificate insert failed after rasterization; PDF left on disk"
                );
                e
            })?;

        tracing::info!(certificate_id = certificate.id, path = %path.display(), "certificate issued");
        Ok(IssueOutcome {
            certificate: Some(certificate),
            pdf_path: Some(path),
            cancelled: false,
        })
    }

    /// Issuance through the native print dialog: no file is produced and
    /// `pdf_path` stays empty. Cancellation persists nothing, so the
    /// patient is only resolved after the dialog completes; rendering uses
    /// the request fields, which are the patient's identity either way.
    pub fn issue_and_print(
        &self,
        request: &IssueRequest,
        printer: &dyn Printer,
    ) -> IssueResult<IssueOutcome> {
        let view = self.view_for(
            request,
            &request.patient_full_name,
            request.patient_birth_date.as_deref(),
        );
        let html = self.renderer.render(&view)?;

        match printer.print_html(&html).map_err(IssueError::Print)? {
            PrintOutcome::Cancelled => Ok(IssueOutcome {
                certificate: None,
                pdf_path: None,
                cancelled: true,
            }),
            PrintOutcome::Completed => {
                let patient = self.db.find_or_create_patient(&new_patient(request))?;
                let certificate = self.db.add_certificate(&NewCertificate {
                    patient_id: patient.id,
                    issue_date: request.issue_date.clone(),
                    leave_duration_days: request.leave_duration_days,
                    diagnosis: request.diagnosis.clone(),
                    pdf_path: None,
                })?;
                Ok(IssueOutcome {
                    certificate: Some(certificate),
                    pdf_path: None,
                    cancelled: false,
                })
            }
        }
    }

    /// Rasterize caller-supplied markup and persist the certificate row
    /// with the resulting path.
    pub fn save_pdf(&self, html: &str, new: &NewCertificate) -> IssueResult<IssueOutcome> {
        let bytes = rasterize(html, &self.pdf_options())?;
        let path = self.write_pdf(&bytes, &id_filename(new.patient_id))?;

        let certificate = self
            .db
            .add_certificate(&NewCertificate {
                pdf_path: Some(path.to_string_lossy().into_owned()),
                ..new.clone()
            })
            .map_err(|e| {
                tracing::warn!(
                    path = %path.display(),
                    "certificate insert failed after rasterization; PDF left on disk"
                );
                e
            })?;

        Ok(IssueOutcome {
            certificate: Some(certificate),
            pdf_path: Some(path),
            cancelled: false,
        })
    }

    /// Re-render and rasterize an existing certificate, then record the
    /// new file path on its row.
    pub fn regenerate_pdf(&self, certificate_id: i64) -> IssueResult<IssueOutcome> {
        let row = self
            .db
            .get_certificate(certificate_id)?
            .ok_or_else(|| DbError::NotFound(format!("certificate {}", certificate_id)))?;

        let view = CertificateView::from_certificate(&row, &self.config);
        let html = self.renderer.render(&view)?;
        let bytes = rasterize(&html, &self.pdf_options())?;

        let path = self.write_pdf(&bytes, &name_filename(&row.patient_full_name))?;
        self.db
            .update_certificate_pdf_path(certificate_id, &path.to_string_lossy())?;

        let certificate = Certificate {
            pdf_path: Some(path.to_string_lossy().into_owned()),
            ..row.certificate
        };
        Ok(IssueOutcome {
            certificate: Some(certificate),
            pdf_path: Some(path),
            cancelled: false,
        })
    }

    fn view_for(
        &self,
        request: &IssueRequest,
        full_name: &str,
        birth_date: Option<&str>,
    ) -> CertificateView {
        CertificateView {
            clinic_name: self.config.clinic_name.clone(),
            doctor_name: self.config.doctor_name.clone(),
            patient_full_name: full_name.to_string(),
            patient_birth_date: birth_date
                .map(french_date)
                .unwrap_or_else(|| MISSING_FIELD.to_string()),
            patient_birth_place: request
                .patient_birth_place
                .clone()
                .unwrap_or_else(|| MISSING_FIELD.to_string()),
            leave_duration_days: request.leave_duration_days,
            diagnosis: request.diagnosis.clone().filter(|d| !d.trim().is_empty()),
            issue_place: self.config.issue_place.clone(),
            issue_date: french_date(&request.issue_date),
        }
    }

    fn pdf_options(&self) -> PdfOptions {
        PdfOptions::default()
    }

    fn write_pdf(&self, bytes: &[u8], filename: &str) -> IssueResult<PathBuf> {
        fs::create_dir_all(&self.config.pdf_dir)?;
        let path = self.config.pdf_dir.join(filename);
        fs::write(&path, bytes)?;
        // The stored path must be absolute; fall back to the joined path
        // when canonicalization is not possible
        let path = path.canonicalize().unwrap_or(path);
        tracing::info!(path = %path.display(), "certificate PDF written");
        Ok(path)
    }
}

fn new_patient(request: &IssueRequest) -> NewPatient {
    NewPatient {
        full_name: request.patient_full_name.clone(),
        birth_date: request.patient_birth_date.clone(),
        national_id: request.patient_national_id.clone(),
    }
}

/// `certificate-<patientId>-<timestamp>.pdf`
fn id_filename(patient_id: i64) -> String {
    format!("certificate-{}-{}.pdf", patient_id, safe_timestamp())
}

/// `certificate_<patientName>_<timestamp>.pdf`, spaces replaced with
/// underscores.
fn name_filename(patient_name: &str) -> String {
    format!(
        "certificate_{}_{}.pdf",
        sanitize_name(patient_name),
        safe_timestamp()
    )
}

/// RFC 3339 timestamp with the characters filesystems dislike replaced.
fn safe_timestamp() -> String {
    chrono::Utc::now().to_rfc3339().replace([':', '.'], "-")
}

/// Replace spaces with underscores and drop path-hostile characters.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_id_filename_shape() {
        let name = id_filename(7);
        assert!(name.starts_with("certificate-7-"));
        assert!(name.ends_with(".pdf"));
        // Only the extension dot survives
        assert_eq!(name.matches('.').count(), 1);
        assert!(!name.contains(':'));
    }

    #[test]
    fn test_name_filename_replaces_spaces() {
        let name = name_filename("Ahmed Ali");
        assert!(name.starts_with("certificate_Ahmed_Ali_"));
        assert!(!name[..name.len() - 4].contains(' '));
    }

    proptest! {
        #[test]
        fn prop_sanitized_names_are_path_safe(name in ".{0,64}") {
            let sanitized = sanitize_name(&name);
            prop_assert!(!sanitized.contains(' '));
            prop_assert!(!sanitized.contains('/'));
            prop_assert!(!sanitized.contains('\\'));
            prop_assert!(!sanitized.contains(':'));
            prop_assert!(!sanitized.contains('*'));
            prop_assert!(!sanitized.contains('?'));
            prop_assert!(!sanitized.contains('"'));
            prop_assert!(!sanitized.contains('<'));
            prop_assert!(!sanitized.contains('>'));
            prop_assert!(!sanitized.contains('|'));
        }
    }
}
