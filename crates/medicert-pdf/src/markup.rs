//! Minimal block-level HTML reader.
//!
//! The certificate renderer emits a small, fixed subset of HTML. This module
//! reduces it to a flat sequence of text blocks for page layout: `<head>`,
//! `<style>` and `<script>` content is dropped, inline tags are stripped,
//! `<br>` starts a new block, and character entities are decoded back to
//! plain text.

/// A laid-out block of certificate text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `<h1>`..`<h3>` content, rendered larger and centered.
    Heading(String),
    /// `<p>` content or bare text between block tags.
    Paragraph(String),
}

impl Block {
    /// The block's text, whichever kind it is.
    pub fn text(&self) -> &str {
        match self {
            Block::Heading(t) | Block::Paragraph(t) => t,
        }
    }
}

/// Extract text blocks from markup, in document order.
pub fn blocks_from_html(html: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut heading = false;
    // Depth of <head>/<style>/<script> nesting; text is dropped while > 0.
    let mut skip_depth = 0usize;

    let mut rest = html;
    while let Some(tag_start) = rest.find('<') {
        let (text, after) = rest.split_at(tag_start);
        if skip_depth == 0 {
            current.push_str(&decode_entities(text));
        }

        let Some(tag_end) = after.find('>') else {
            // Unterminated tag; treat the remainder as consumed.
            rest = "";
            break;
        };
        let tag = &after[1..tag_end];
        rest = &after[tag_end + 1..];

        let name = tag_name(tag);
        let closing = tag.starts_with('/');

        match name {
            "head" | "style" | "script" => {
                if closing {
                    skip_depth = skip_depth.saturating_sub(1);
                } else {
                    skip_depth += 1;
                }
            }
            "h1" | "h2" | "h3" => {
                flush(&mut blocks, &mut current, heading);
                heading = !closing;
            }
            "p" | "br" | "div" | "body" | "html" | "table" | "tr" => {
                flush(&mut blocks, &mut current, heading);
            }
            // Inline tags (span, strong, em, ...) are stripped.
            _ => {}
        }
    }
    if skip_depth == 0 {
        current.push_str(&decode_entities(rest));
    }
    flush(&mut blocks, &mut current, heading);

    blocks
}

/// Push the accumulated text as a block, collapsing whitespace runs.
fn flush(blocks: &mut Vec<Block>, current: &mut String, heading: bool) {
    let text = collapse_whitespace(current);
    current.clear();
    if text.is_empty() {
        return;
    }
    blocks.push(if heading {
        Block::Heading(text)
    } else {
        Block::Paragraph(text)
    });
}

/// Tag name without the leading slash or any attributes.
fn tag_name(tag: &str) -> &str {
    let tag = tag.strip_prefix('/').unwrap_or(tag);
    let end = tag
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(tag.len());
    &tag[..end]
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Decode the entities the renderer's escaping can produce, both named
/// and numeric forms.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';') {
            Some(semi) if semi <= 10 => {
                let entity = &tail[1..semi];
                match decode_entity(entity) {
                    Some(c) => out.push(c),
                    None => out.push_str(&tail[..semi + 1]),
                }
                rest = &tail[semi + 1..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = entity.strip_prefix('#')?;
            let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_and_heading() {
        let blocks = blocks_from_html(
            "<html><body><h1>Certificat Médical</h1><p>Première ligne.</p>\
             <p>Deuxième ligne.</p></body></html>",
        );
        assert_eq!(
            blocks,
            vec![
                Block::Heading("Certificat Médical".into()),
                Block::Paragraph("Première ligne.".into()),
                Block::Paragraph("Deuxième ligne.".into()),
            ]
        );
    }

    #[test]
    fn test_head_and_style_dropped() {
        let blocks = blocks_from_html(
            "<html><head><title>x</title><style>p { color: red; }</style></head>\
             <body><p>Visible</p></body></html>",
        );
        assert_eq!(blocks, vec![Block::Paragraph("Visible".into())]);
    }

    #[test]
    fn test_br_starts_new_block() {
        let blocks = blocks_from_html("<p>EPSP IN SALAH<br>Dr. HAMADI</p>");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("EPSP IN SALAH".into()),
                Block::Paragraph("Dr. HAMADI".into()),
            ]
        );
    }

    #[test]
    fn test_inline_tags_stripped() {
        let blocks = blocks_from_html("<p>arrêt de <strong>5</strong> jours</p>");
        assert_eq!(blocks, vec![Block::Paragraph("arrêt de 5 jours".into())]);
    }

    #[test]
    fn test_entities_decoded() {
        let blocks = blocks_from_html("<p>Jours d&#x27;arr&ecirc;t &amp; repos &#233;</p>");
        // &ecirc; is not in the renderer's escape set and stays verbatim.
        assert_eq!(
            blocks,
            vec![Block::Paragraph("Jours d'arr&ecirc;t & repos é".into())]
        );
    }

    #[test]
    fn test_whitespace_collapsed() {
        let blocks = blocks_from_html("<p>\n    un   deux\n    trois\n  </p>");
        assert_eq!(blocks, vec![Block::Paragraph("un deux trois".into())]);
    }

    #[test]
    fn test_bare_ampersand_kept() {
        let blocks = blocks_from_html("<p>Dupont & Fils</p>");
        assert_eq!(blocks, vec![Block::Paragraph("Dupont & Fils".into())]);
    }
}
