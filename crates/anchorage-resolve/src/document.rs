//! Splitting a YAML stream into documents with their raw textual spans.
//!
//! Each document keeps the exact bytes it occupied in the input so that
//! untouched content (comments, indentation, key order, block style) is
//! reproduced verbatim on output. The parsed tree is used only for
//! discovery and filtering, never for re-serialization.

use std::collections::BTreeMap;

use anchorage_common::error::{AnchorageError, Result};
use serde_yaml::Value;

/// One parsed YAML document plus its raw span and stream position.
#[derive(Debug, Clone)]
pub struct Document {
    index: usize,
    /// The marker line that opened this document, verbatim, including any
    /// trailing comment and line ending. `None` for a document that starts
    /// the stream without a marker.
    marker: Option<String>,
    raw: String,
    node: Value,
}

impl Document {
    /// Returns the zero-based ordinal of this document in the input stream.
    ///
    /// The ordinal is stable and determines output order among retained
    /// documents.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the marker line that opened this document, if any.
    #[must_use]
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// Returns the raw textual span of this document.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed node tree.
    #[must_use]
    pub const fn node(&self) -> &Value {
        &self.node
    }

    /// Replaces the raw span after a rewrite pass.
    pub(crate) fn set_raw(&mut self, raw: String) {
        self.raw = raw;
    }

    /// Returns the document's `metadata.labels` mapping.
    ///
    /// Only string-to-string pairs are considered; a document without the
    /// conventional location has the empty label map.
    #[must_use]
    pub fn labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        if let Some(Value::Mapping(mapping)) =
            self.node.get("metadata").and_then(|m| m.get("labels"))
        {
            for (key, value) in mapping {
                if let (Value::String(key), Value::String(value)) = (key, value) {
                    let _ = labels.insert(key.clone(), value.clone());
                }
            }
        }
        labels
    }
}

/// How a `---` line at column zero relates to the document stream.
enum MarkerLine<'a> {
    /// A plain marker, possibly followed by whitespace or a comment.
    Bare,
    /// A marker whose line carries real content after the dashes.
    Inline(&'a str),
}

/// Classifies `content` (one line with the ending stripped) as a marker.
fn classify_marker(content: &str) -> Option<MarkerLine<'_>> {
    let rest = content.strip_prefix("---")?;
    if rest.is_empty() {
        return Some(MarkerLine::Bare);
    }
    if !rest.starts_with([' ', '\t']) {
        // A longer run of dashes or "---x" is an ordinary scalar.
        return None;
    }
    let trimmed = rest.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        Some(MarkerLine::Bare)
    } else {
        Some(MarkerLine::Inline(trimmed))
    }
}

/// Splits raw input into ordered documents.
///
/// Document-start markers (`---` at column zero) delimit spans. A marker
/// line followed only by whitespace or a comment is kept verbatim with
/// the document it opens, so reassembly reproduces it byte for byte.
/// Spans that are blank or parse to null are dropped uniformly, which
/// covers the trailing empty document produced by a terminal bare marker.
///
/// # Errors
///
/// Returns [`AnchorageError::Parse`] with the offending document's ordinal
/// if a span is not valid YAML.
pub fn split_documents(input: &str) -> Result<Vec<Document>> {
    let mut spans: Vec<(Option<String>, String)> = Vec::new();
    let mut marker: Option<String> = None;
    let mut current = String::new();

    for line in input.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        match classify_marker(content) {
            Some(MarkerLine::Bare) => {
                spans.push((marker.take(), std::mem::take(&mut current)));
                marker = Some(line.to_string());
            }
            Some(MarkerLine::Inline(inline)) => {
                // Inline content starts the next document on the marker
                // line itself; the marker is normalized and the content
                // becomes the document's first line.
                spans.push((marker.take(), std::mem::take(&mut current)));
                marker = Some("---\n".to_string());
                current.push_str(inline);
                current.push('\n');
            }
            None => current.push_str(line),
        }
    }
    spans.push((marker, current));

    let mut documents = Vec::new();
    for (index, (marker, raw)) in spans.into_iter().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let node: Value =
            serde_yaml::from_str(&raw).map_err(|source| AnchorageError::Parse { index, source })?;
        if node.is_null() {
            continue;
        }
        documents.push(Document {
            index,
            marker,
            raw,
            node,
        });
    }
    Ok(documents)
}

/// Reassembles retained documents into one output stream.
///
/// Each document is preceded by its own marker line when it had one, so
/// untouched streams round-trip byte for byte; a document that lost its
/// marker (never the case for split output) falls back to the plain
/// separator between neighbours.
#[must_use]
pub fn join_documents(documents: &[Document]) -> String {
    let mut output = String::new();
    for (position, document) in documents.iter().enumerate() {
        match document.marker() {
            Some(marker) => output.push_str(marker),
            None if position > 0 => output.push_str("---\n"),
            None => {}
        }
        output.push_str(document.raw());
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_single_document() {
        let docs = split_documents("apiVersion: v1\nkind: Pod\n").expect("split failed");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].index(), 0);
        assert_eq!(docs[0].raw(), "apiVersion: v1\nkind: Pod\n");
        assert!(docs[0].marker().is_none());
    }

    #[test]
    fn split_two_documents_preserves_order_and_spans() {
        let input = "a: 1\n---\nb: 2\n";
        let docs = split_documents(input).expect("split failed");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].raw(), "a: 1\n");
        assert_eq!(docs[1].raw(), "b: 2\n");
        assert!(docs[0].index() < docs[1].index());
    }

    #[test]
    fn split_drops_trailing_empty_document() {
        let docs = split_documents("a: 1\n---\nb: 2\n---").expect("split failed");
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn split_keeps_leading_marker_with_first_document() {
        let docs = split_documents("---\na: 1\n").expect("split failed");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].raw(), "a: 1\n");
        assert_eq!(docs[0].marker(), Some("---\n"));
        assert_eq!(join_documents(&docs), "---\na: 1\n");
    }

    #[test]
    fn split_drops_comment_only_document() {
        let docs = split_documents("# nothing here\n---\na: 1\n").expect("split failed");
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn split_preserves_comments_inside_document() {
        let input = "a: 1 # keep me\n# and me\nb: 2\n";
        let docs = split_documents(input).expect("split failed");
        assert_eq!(docs[0].raw(), input);
    }

    #[test]
    fn split_indented_dashes_are_not_markers() {
        let input = "text: |\n  ---\n  not a marker\n";
        let docs = split_documents(input).expect("split failed");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].raw(), input);
    }

    #[test]
    fn split_marker_with_inline_content() {
        let docs = split_documents("a: 1\n--- b: 2\n").expect("split failed");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].raw(), "b: 2\n");
        assert_eq!(docs[1].marker(), Some("---\n"));
    }

    #[test]
    fn split_marker_with_trailing_comment_stays_bare() {
        let input = "a: 1\n--- # boundary note\nb: 2\n";
        let docs = split_documents(input).expect("split failed");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].raw(), "b: 2\n");
        assert_eq!(docs[1].marker(), Some("--- # boundary note\n"));
    }

    #[test]
    fn join_reproduces_marker_comment_byte_for_byte() {
        let input = "a: 1\n--- # boundary note\nb: 2\n";
        let docs = split_documents(input).expect("split failed");
        assert_eq!(join_documents(&docs), input);
    }

    #[test]
    fn split_invalid_yaml_reports_document_index() {
        let err = split_documents("a: 1\n---\n{ not: valid\n").expect_err("should fail");
        assert!(matches!(err, AnchorageError::Parse { index: 1, .. }));
    }

    #[test]
    fn labels_read_from_metadata() {
        let docs = split_documents("metadata:\n  labels:\n    qux: baz\n").expect("split failed");
        let labels = docs[0].labels();
        assert_eq!(labels.get("qux").map(String::as_str), Some("baz"));
    }

    #[test]
    fn labels_empty_when_metadata_missing() {
        let docs = split_documents("kind: Bar\n").expect("split failed");
        assert!(docs[0].labels().is_empty());
    }

    #[test]
    fn join_two_documents_uses_separator() {
        let docs = split_documents("a: 1\n---\nb: 2\n").expect("split failed");
        assert_eq!(join_documents(&docs), "a: 1\n---\nb: 2\n");
    }

    #[test]
    fn join_single_document_has_no_separator() {
        let docs = split_documents("a: 1\n").expect("split failed");
        assert_eq!(join_documents(&docs), "a: 1\n");
    }
}
