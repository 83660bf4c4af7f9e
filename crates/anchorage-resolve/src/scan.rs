//! Reference discovery over a parsed document tree.

use anchorage_common::types::Reference;
use serde_yaml::Value;

/// One occurrence of a reference inside a document.
///
/// The same reference may occur many times; every occurrence is recorded
/// separately so all are rewritten consistently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// The recognized reference.
    pub reference: Reference,
    /// Stable path of the scalar within the document, e.g.
    /// `$.spec.containers[0].image`.
    pub path: String,
}

/// Walks a parsed document and returns every reference occurrence.
///
/// A reference is recognized only when a string scalar's full text is the
/// reserved prefix plus a non-empty remainder. Mapping values and sequence
/// items are scanned; mapping keys are not.
#[must_use]
pub fn scan_references(node: &Value) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    walk(node, "$", &mut occurrences);
    occurrences
}

fn walk(node: &Value, path: &str, occurrences: &mut Vec<Occurrence>) {
    match node {
        Value::String(scalar) => {
            if let Some(reference) = Reference::recognize(scalar) {
                occurrences.push(Occurrence {
                    reference,
                    path: path.to_string(),
                });
            }
        }
        Value::Sequence(items) => {
            for (position, item) in items.iter().enumerate() {
                walk(item, &format!("{path}[{position}]"), occurrences);
            }
        }
        Value::Mapping(mapping) => {
            for (key, value) in mapping {
                let segment = key.as_str().map_or_else(|| "?".to_string(), |k| k.to_string());
                walk(value, &format!("{path}.{segment}"), occurrences);
            }
        }
        Value::Tagged(tagged) => walk(&tagged.value, path, occurrences),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
