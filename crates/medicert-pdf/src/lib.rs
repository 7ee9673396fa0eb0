//! Markup-to-PDF rasterizer for certificate documents.
//!
//! Takes the block-level HTML produced by the certificate renderer, reduces
//! it to a sequence of text blocks, and lays them out on a fixed A4 page.
//! The rasterizer handles exactly the markup subset the renderer emits;
//! it is not a general HTML engine.

pub mod markup;

mod layout;

pub use markup::{blocks_from_html, Block};

use std::path::Path;

use thiserror::Error;

/// Rasterization errors.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("No usable fonts found; install Liberation or DejaVu fonts")]
    FontsUnavailable,

    #[error("PDF rendering error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PdfResult<T> = Result<T, PdfError>;

/// Page setup for rasterized certificates.
#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// Document title written into PDF metadata.
    pub title: String,
    /// Uniform page margin in millimeters.
    pub margin_mm: u32,
    /// Body font size in points.
    pub base_font_size: u8,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            title: "Certificat Médical".into(),
            margin_mm: 20,
            base_font_size: 12,
        }
    }
}

/// Check whether a usable font family is installed on this machine.
pub fn fonts_available() -> bool {
    layout::load_fonts().is_some()
}

/// Rasterize markup into a PDF byte buffer.
pub fn rasterize(html: &str, options: &PdfOptions) -> PdfResult<Vec<u8>> {
    let doc = layout::build_document(html, options)?;
    let mut buf = Vec::new();
    doc.render(&mut buf)
        .map_err(|e| PdfError::Render(e.to_string()))?;
    tracing::debug!(bytes = buf.len(), "rasterized certificate markup");
    Ok(buf)
}

/// Rasterize markup straight to a file.
pub fn rasterize_to_file(html: &str, path: &Path, options: &PdfOptions) -> PdfResult<()> {
    let bytes = rasterize(html, options)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
