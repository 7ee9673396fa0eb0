//! Page layout on top of genpdf.

use genpdf::style::Style;
use genpdf::{elements, fonts, Alignment, Document, Element, SimplePageDecorator};

use crate::markup::{blocks_from_html, Block};
use crate::{PdfError, PdfOptions, PdfResult};

// genpdf needs real font files for metrics; probe the usual locations.
const FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/TTF",
    "/System/Library/Fonts/Supplemental",
    "/Library/Fonts",
];

const FONT_FAMILIES: &[&str] = &["LiberationSans", "DejaVuSans", "Arial"];

pub(crate) fn load_fonts() -> Option<fonts::FontFamily<fonts::FontData>> {
    FONT_DIRS
        .iter()
        .filter(|dir| std::path::Path::new(dir).exists())
        .find_map(|dir| {
            FONT_FAMILIES
                .iter()
                .find_map(|name| fonts::from_files(dir, name, None).ok())
        })
}

/// Build an A4 document from certificate markup.
pub(crate) fn build_document(html: &str, options: &PdfOptions) -> PdfResult<Document> {
    let font_family = load_fonts().ok_or(PdfError::FontsUnavailable)?;

    let mut doc = Document::new(font_family);
    doc.set_title(options.title.clone());
    doc.set_font_size(options.base_font_size);

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(options.margin_mm as i32);
    doc.set_page_decorator(decorator);

    let heading_style = Style::new()
        .bold()
        .with_font_size(options.base_font_size + 6);

    for block in blocks_from_html(html) {
        match block {
            Block::Heading(text) => {
                doc.push(
                    elements::Paragraph::new(text)
                        .aligned(Alignment::Center)
                        .styled(heading_style),
                );
                doc.push(elements::Break::new(1.0));
            }
            Block::Paragraph(text) => {
                doc.push(elements::Paragraph::new(text));
                doc.push(elements::Break::new(0.5));
            }
        }
    }

    Ok(doc)
}
