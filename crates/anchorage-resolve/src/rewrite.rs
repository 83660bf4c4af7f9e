//! Targeted text substitution for reference scalars.
//!
//! Rewrites are applied to the raw document span instead of re-serializing
//! the parsed tree, so every byte outside the rewritten scalars survives
//! untouched. A match counts only when the reference forms a whole scalar
//! token outside a comment; substrings inside larger strings and mentions
//! in comments are left alone.

/// Characters that may legally precede a reference scalar in the raw text.
const BOUNDARY_BEFORE: &[char] = &[' ', '\t', '\n', '\r', '"', '\'', '[', '{', ','];

/// Characters that may legally follow a reference scalar in the raw text.
const BOUNDARY_AFTER: &[char] = &[' ', '\t', '\n', '\r', '"', '\'', ']', '}', ','];

/// Replaces every whole-scalar occurrence of `from` with `to`.
///
/// Returns the rewritten text and the number of substitutions applied; the
/// caller compares that count against the parsed occurrence count and
/// fails the run on mismatch instead of guessing.
pub(crate) fn substitute_scalar(raw: &str, from: &str, to: &str) -> (String, usize) {
    let mut output = String::with_capacity(raw.len());
    let mut replaced = 0;

    for line in raw.split_inclusive('\n') {
        let limit = comment_start(line).unwrap_or(line.len());
        let (code, comment) = line.split_at(limit);

        let mut cursor = 0;
        while let Some(offset) = code[cursor..].find(from) {
            let start = cursor + offset;
            let end = start + from.len();

            let before_ok = code[..start]
                .chars()
                .next_back()
                .is_none_or(|c| BOUNDARY_BEFORE.contains(&c));
            let after_ok = code[end..]
                .chars()
                .next()
                .is_none_or(|c| BOUNDARY_AFTER.contains(&c));

            output.push_str(&code[cursor..start]);
            if before_ok && after_ok {
                output.push_str(to);
                replaced += 1;
            } else {
                output.push_str(from);
            }
            cursor = end;
        }
        output.push_str(&code[cursor..]);
        output.push_str(comment);
    }
    (output, replaced)
}

/// Returns the byte offset where a trailing comment begins on `line`.
///
/// A `#` starts a comment when it sits at the start of the line or after
/// whitespace, outside single or double quotes.
fn comment_start(line: &str) -> Option<usize> {
    let mut in_single = false;
    let mut in_double = false;
    let mut previous: Option<char> = None;
    for (position, c) in line.char_indices() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single
                && !in_double
                && previous.is_none_or(|p| p == ' ' || p == '\t') =>
            {
                return Some(position);
            }
            _ => {}
        }
        previous = Some(c);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const FROM: &str = "anc://example.com/app";
    const TO: &str = "gcr.io/base/example.com/app@sha256:abc";

    #[test]
    fn substitute_plain_value() {
        let (out, n) = substitute_scalar("image: anc://example.com/app\n", FROM, TO);
        assert_eq!(n, 1);
        assert_eq!(out, format!("image: {TO}\n"));
    }

    #[test]
    fn substitute_quoted_value() {
        let (out, n) = substitute_scalar("image: \"anc://example.com/app\"\n", FROM, TO);
        assert_eq!(n, 1);
        assert_eq!(out, format!("image: \"{TO}\"\n"));
    }

    #[test]
    fn substitute_sequence_item() {
        let (out, n) = substitute_scalar("- anc://example.com/app\n", FROM, TO);
        assert_eq!(n, 1);
        assert_eq!(out, format!("- {TO}\n"));
    }

    #[test]
    fn substitute_flow_mapping_value() {
        let (out, n) = substitute_scalar("{image: anc://example.com/app}\n", FROM, TO);
        assert_eq!(n, 1);
        assert_eq!(out, format!("{{image: {TO}}}\n"));
    }

    #[test]
    fn substitute_with_trailing_comment() {
        let (out, n) = substitute_scalar("image: anc://example.com/app # main\n", FROM, TO);
        assert_eq!(n, 1);
        assert_eq!(out, format!("image: {TO} # main\n"));
    }

    #[test]
    fn substring_inside_larger_scalar_is_not_replaced() {
        let input = "cmd: run-anc://example.com/app-now\n";
        let (out, n) = substitute_scalar(input, FROM, TO);
        assert_eq!(n, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn longer_reference_is_not_clipped() {
        let input = "image: anc://example.com/app-extra\n";
        let (out, n) = substitute_scalar(input, FROM, TO);
        assert_eq!(n, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let input = "a: anc://example.com/app\nb: anc://example.com/app\n";
        let (out, n) = substitute_scalar(input, FROM, TO);
        assert_eq!(n, 2);
        assert_eq!(out, format!("a: {TO}\nb: {TO}\n"));
    }

    #[test]
    fn scalar_at_end_of_input_without_newline() {
        let (out, n) = substitute_scalar("image: anc://example.com/app", FROM, TO);
        assert_eq!(n, 1);
        assert_eq!(out, format!("image: {TO}"));
    }

    #[test]
    fn reference_in_full_line_comment_is_not_replaced() {
        let input = "# migrated from anc://example.com/app\n";
        let (out, n) = substitute_scalar(input, FROM, TO);
        assert_eq!(n, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn comment_mention_does_not_inflate_count() {
        let input = "# see anc://example.com/app\nimage: anc://example.com/app\n";
        let (out, n) = substitute_scalar(input, FROM, TO);
        assert_eq!(n, 1);
        assert_eq!(out, format!("# see anc://example.com/app\nimage: {TO}\n"));
    }

    #[test]
    fn trailing_comment_mention_is_preserved() {
        let input = "image: anc://example.com/app # was anc://example.com/app\n";
        let (out, n) = substitute_scalar(input, FROM, TO);
        assert_eq!(n, 1);
        assert_eq!(out, format!("image: {TO} # was anc://example.com/app\n"));
    }

    #[test]
    fn hash_inside_quotes_is_not_a_comment() {
        let input = "note: \"tag #1\"\nimage: anc://example.com/app\n";
        let (out, n) = substitute_scalar(input, FROM, TO);
        assert_eq!(n, 1);
        assert_eq!(out, format!("note: \"tag #1\"\nimage: {TO}\n"));
    }
}
