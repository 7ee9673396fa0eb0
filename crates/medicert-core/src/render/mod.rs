//! Certificate markup rendering.
//!
//! Deterministic substitution of certificate and patient fields into the
//! fixed French template. Same input always yields byte-identical markup:
//! dates are formatted with a fixed locale, never the system's, and every
//! substituted field is HTML-escaped.

mod template;

pub use template::TEMPLATE;

use chrono::NaiveDate;
use serde::Serialize;
use tera::Tera;
use thiserror::Error;

use crate::config::IssuerConfig;
use crate::models::CertificateWithPatient;

/// Rendering errors.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Fixed placeholder for absent optional fields; keeps the printed layout
/// stable.
pub const MISSING_FIELD: &str = "non spécifié";

const TEMPLATE_NAME: &str = "certificate.html";

/// Everything the template needs, already formatted for display.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CertificateView {
    pub clinic_name: String,
    pub doctor_name: String,
    pub patient_full_name: String,
    /// [`french_date`] output or [`MISSING_FIELD`]; substituted unescaped,
    /// so it must be markup-safe already
    pub patient_birth_date: String,
    pub patient_birth_place: String,
    pub leave_duration_days: i64,
    /// None (or empty) omits the diagnosis line entirely
    pub diagnosis: Option<String>,
    pub issue_place: String,
    /// [`french_date`] output; substituted unescaped
    pub issue_date: String,
}

impl CertificateView {
    /// Build a view from a stored certificate. The store does not keep a
    /// birth place, so re-rendered certificates show the placeholder there.
    pub fn from_certificate(row: &CertificateWithPatient, config: &IssuerConfig) -> Self {
        Self {
            clinic_name: config.clinic_name.clone(),
            doctor_name: config.doctor_name.clone(),
            patient_full_name: row.patient_full_name.clone(),
            patient_birth_date: row
                .patient_birth_date
                .as_deref()
                .map(french_date)
                .unwrap_or_else(|| MISSING_FIELD.to_string()),
            patient_birth_place: MISSING_FIELD.to_string(),
            leave_duration_days: row.certificate.leave_duration_days,
            diagnosis: row
                .certificate
                .diagnosis
                .clone()
                .filter(|d| !d.trim().is_empty()),
            issue_place: config.issue_place.clone(),
            issue_date: french_date(&row.certificate.issue_date),
        }
    }
}

/// Renders certificate views against the embedded template.
pub struct CertificateRenderer {
    tera: Tera,
}

impl CertificateRenderer {
    pub fn new() -> RenderResult<Self> {
        let mut tera = Tera::default();
        // .html name keeps tera's autoescaping on for all substituted fields
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self { tera })
    }

    /// Produce the final markup, every placeholder substituted.
    pub fn render(&self, view: &CertificateView) -> RenderResult<String> {
        let context = tera::Context::from_serialize(view)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}

/// Reformat an ISO `YYYY-MM-DD` date as French `DD/MM/YYYY`. Text that is
/// not an ISO date passes through with markup specials escaped, so the
/// result is always safe to substitute unescaped. The template relies on
/// this: escaping date fields again would corrupt the slashes.
pub fn french_date(iso: &str) -> String {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| escape_html(iso))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
