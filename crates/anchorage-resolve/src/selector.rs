//! Label selector expressions for document filtering.
//!
//! A selector is a comma-separated conjunction of `key=value` and
//! `key!=value` constraints evaluated against a document's
//! `metadata.labels` mapping. Documents failing the selector are excluded
//! from the output entirely.

use std::collections::BTreeMap;
use std::fmt;

use anchorage_common::error::{AnchorageError, Result};

/// One constraint of a selector expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Constraint {
    /// Key must be present with exactly this value.
    Eq { key: String, value: String },
    /// Key must be absent or carry a different value.
    NotEq { key: String, value: String },
}

impl Constraint {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Self::Eq { key, value } => labels.get(key) == Some(value),
            Self::NotEq { key, value } => labels.get(key) != Some(value),
        }
    }
}

/// Parsed label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    constraints: Vec<Constraint>,
}

impl Selector {
    /// Parses a selector expression such as `qux=baz,tier!=cache`.
    ///
    /// Also accepts the `==` spelling for equality. Parsing happens before
    /// any build starts so a malformed expression fails fast.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorageError::Selector`] if the expression or any of its
    /// terms is malformed.
    pub fn parse(expression: &str) -> Result<Self> {
        if expression.trim().is_empty() {
            return Err(AnchorageError::Selector {
                message: "empty selector expression".into(),
            });
        }

        let mut constraints = Vec::new();
        for term in expression.split(',') {
            let term = term.trim();
            if term.is_empty() {
                return Err(AnchorageError::Selector {
                    message: format!("empty term in selector expression: {expression}"),
                });
            }
            constraints.push(parse_term(term)?);
        }
        Ok(Self { constraints })
    }

    /// Returns whether the given label map satisfies every constraint.
    #[must_use]
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.constraints.iter().all(|c| c.matches(labels))
    }
}

fn parse_term(term: &str) -> Result<Constraint> {
    let (key, value, negated) = if let Some((key, value)) = term.split_once("!=") {
        (key, value, true)
    } else if let Some((key, value)) = term.split_once("==") {
        (key, value, false)
    } else if let Some((key, value)) = term.split_once('=') {
        (key, value, false)
    } else {
        return Err(AnchorageError::Selector {
            message: format!("expected key=value or key!=value, got: {term}"),
        });
    };

    let key = key.trim();
    let value = value.trim();
    if key.is_empty() {
        return Err(AnchorageError::Selector {
            message: format!("missing key in selector term: {term}"),
        });
    }
    if negated {
        Ok(Constraint::NotEq {
            key: key.to_string(),
            value: value.to_string(),
        })
    } else {
        Ok(Constraint::Eq {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, constraint) in self.constraints.iter().enumerate() {
            if position > 0 {
                write!(f, ",")?;
            }
            match constraint {
                Constraint::Eq { key, value } => write!(f, "{key}={value}")?,
                Constraint::NotEq { key, value } => write!(f, "{key}!={value}")?,
            }
        }
        Ok(())
    }
}
