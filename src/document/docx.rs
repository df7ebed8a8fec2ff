//! Local checks on Word packages. Nothing here translates; it only makes
//! sure a file is a `.docx` before it is uploaded, and pulls paragraph text
//! out for previews.

use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::Context;
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

const MAIN_PART: &str = "word/document.xml";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Upper bound on the decompressed main part. Previews only need the first
/// few thousand characters, and the upload limit applies to compressed bytes.
const MAX_MAIN_PART_BYTES: u64 = 8 * 1024 * 1024;

pub fn has_docx_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"))
}

/// A zip container holding a WordprocessingML main part.
pub fn is_docx_container(bytes: &[u8]) -> bool {
    if !bytes.starts_with(ZIP_MAGIC) {
        return false;
    }
    let Ok(mut zip) = ZipArchive::new(Cursor::new(bytes)) else {
        return false;
    };
    let found = zip.by_name(MAIN_PART).is_ok();
    found
}

fn main_part(bytes: &[u8], limit: u64) -> anyhow::Result<String> {
    let mut zip = ZipArchive::new(Cursor::new(bytes)).context("read zip")?;
    let part = zip.by_name(MAIN_PART).context("docx main part")?;
    if part.size() > limit {
        anyhow::bail!("docx main part is {} bytes, over the {} byte limit", part.size(), limit);
    }

    // The declared size can lie; never inflate more than the limit
    let mut xml = Vec::new();
    part.take(limit + 1)
        .read_to_end(&mut xml)
        .context("read docx main part")?;
    if xml.len() as u64 > limit {
        anyhow::bail!("docx main part exceeds the {} byte limit", limit);
    }
    String::from_utf8(xml).context("docx main part is not UTF-8")
}

/// Text of each non-empty paragraph of the document body, in order.
pub fn paragraphs(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
    paragraphs_within(bytes, MAX_MAIN_PART_BYTES)
}

fn paragraphs_within(bytes: &[u8], limit: u64) -> anyhow::Result<Vec<String>> {
    let xml = main_part(bytes, limit)?;
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event().context("read xml event")? {
            Event::Eof => break,
            Event::Start(s) => match s.name().as_ref() {
                b"w:p" => current.clear(),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(s) => match s.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().context("unescape text")?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let text = current.trim();
                    if !text.is_empty() {
                        paragraphs.push(text.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            _ => {}
        }
    }
    Ok(paragraphs)
}

/// Paragraph text joined by newlines, capped at `max_chars`.
pub fn preview(bytes: &[u8], max_chars: usize) -> Option<String> {
    let text = paragraphs(bytes).ok()?.join("\n");
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= max_chars {
        return Some(text);
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    Some(cut)
}
