//! SPARQL literal/IRI escaping.
//!
//! spec.md §4.C2 leaves substitution into loaded templates unsafe by
//! contract and requires the implementer to make it safe; this module is
//! that safety layer. Every value reaching [`super::template::Template::render`]
//! passes through here before it touches the query string.

/// Escape a string for use inside a SPARQL string literal (between `"`s),
/// per the SPARQL 1.1 grammar's `STRING_LITERAL_QUOTE` production.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Wrap an absolute IRI in `<>`, rejecting characters that would let it
/// escape the delimiters or inject additional triples/clauses.
///
/// # Errors
/// Returns an error message if `iri` contains whitespace, `<`, `>`, or `"`.
pub fn format_iri(iri: &str) -> Result<String, String> {
    if iri.is_empty() {
        return Err("IRI must not be empty".to_string());
    }
    if iri.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}')) {
        return Err(format!("IRI contains illegal characters: {iri}"));
    }
    Ok(format!("<{iri}>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_literal_escapes_quotes_and_backslashes() {
        let escaped = escape_literal("she said \"hi\\bye\"");
        assert_eq!(escaped, "\"she said \\\"hi\\\\bye\\\"\"");
    }

    #[test]
    fn escape_literal_neutralizes_newlines() {
        assert_eq!(escape_literal("line1\nline2"), "\"line1\\nline2\"");
    }

    #[test]
    fn format_iri_wraps_valid_iri() {
        assert_eq!(
            format_iri("http://example.org/foo").unwrap(),
            "<http://example.org/foo>"
        );
    }

    #[test]
    fn format_iri_rejects_injection_attempt() {
        assert!(format_iri("http://example.org> } INSERT DATA { <http://x").is_err());
        assert!(format_iri("http://example.org/with space").is_err());
    }
}
