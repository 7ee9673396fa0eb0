//! Issuer configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Clinic letterhead values and the directory generated PDFs are written
/// to. Provided by the host shell at startup; the defaults are the values
/// of the clinic this tool was first written for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Establishment name printed at the top of every certificate
    pub clinic_name: String,
    /// Signing doctor
    pub doctor_name: String,
    /// "Fait à ..." place on the certificate
    pub issue_place: String,
    /// Storage directory for generated PDF files
    pub pdf_dir: PathBuf,
}

impl IssuerConfig {
    pub fn new(pdf_dir: impl Into<PathBuf>) -> Self {
        Self {
            clinic_name: "EPSP IN SALAH".into(),
            doctor_name: "HAMADI".into(),
            issue_place: "In Salah".into(),
            pdf_dir: pdf_dir.into(),
        }
    }

    /// Load letterhead and storage settings from a JSON file kept next to
    /// the store.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
