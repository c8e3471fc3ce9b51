//! Paragraph text from DOCX (Office Open XML) packages

use crate::error::ProcessingError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

/// Text of every body-level paragraph, in document order.
///
/// Only direct children of `w:body` count, so table cells, headers and text
/// boxes are not included. Empty paragraphs yield empty strings.
pub fn read_paragraphs(path: &Path) -> Result<Vec<String>, ProcessingError> {
    let file = File::open(path)
        .map_err(|e| ProcessingError::DocumentParse(format!("Failed to open document: {}", e)))?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        ProcessingError::DocumentParse(format!(
            "Not a DOCX package (legacy binary .doc is not supported): {}",
            e
        ))
    })?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ProcessingError::DocumentParse(format!("Missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ProcessingError::DocumentParse(format!("Failed to read {}: {}", DOCUMENT_PART, e)))?;

    paragraphs_from_xml(&xml)
}

/// Parse the main document part.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ProcessingError> {
    let mut reader = Reader::from_str(xml);

    // Local names of the currently open elements
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    // Open body-level paragraph and the stack depth it starts at
    let mut current: Option<(String, usize)> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ProcessingError::DocumentParse(format!(
                "Malformed XML at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"p" && current.is_none() && is_body(&stack) {
                    current = Some((String::new(), stack.len()));
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = e.local_name();
                if name.as_ref() == b"p" && current.is_none() && is_body(&stack) {
                    paragraphs.push(String::new());
                } else if let Some((text, depth)) = current.as_mut() {
                    if in_run(&stack, *depth) {
                        if let Some(special) = run_content(&e) {
                            text.push_str(special);
                        }
                    }
                }
            }
            Event::Text(e) => {
                if let Some((text, depth)) = current.as_mut() {
                    if stack.last().map(|n| n.as_slice()) == Some(b"t".as_slice())
                        && in_run(&stack[..stack.len() - 1], *depth)
                    {
                        let unescaped = e.unescape().map_err(|e| {
                            ProcessingError::DocumentParse(format!("Invalid text content: {}", e))
                        })?;
                        text.push_str(&unescaped);
                    }
                }
            }
            Event::End(_) => {
                stack.pop();
                let closes = matches!(&current, Some((_, depth)) if stack.len() == *depth);
                if closes {
                    if let Some((text, _)) = current.take() {
                        paragraphs.push(text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn is_body(stack: &[Vec<u8>]) -> bool {
    matches!(stack, [document, body] if document == b"document" && body == b"body")
}

/// True when `stack` ends in a run of the paragraph opened at `depth`,
/// either directly (`p/r`) or through a hyperlink (`p/hyperlink/r`).
fn in_run(stack: &[Vec<u8>], depth: usize) -> bool {
    match stack.get(depth..) {
        Some([p, r]) => p == b"p" && r == b"r",
        Some([p, link, r]) => p == b"p" && link == b"hyperlink" && r == b"r",
        _ => false,
    }
}

/// Text contributed by empty run children
fn run_content(e: &BytesStart) -> Option<&'static str> {
    match e.local_name().as_ref() {
        b"tab" | b"ptab" => Some("\t"),
        b"cr" => Some("\n"),
        b"noBreakHyphen" => Some("-"),
        // Page and column breaks contribute nothing
        b"br" => {
            let kind = e
                .attributes()
                .flatten()
                .find(|a| a.key.local_name().as_ref() == b"type")
                .map(|a| a.value.into_owned());
            match kind.as_deref() {
                None | Some(b"textWrapping") => Some("\n"),
                _ => None,
            }
        }
        _ => None,
    }
}
