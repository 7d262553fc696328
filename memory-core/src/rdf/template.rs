//! Parse-once-structured template loading and typed `${placeholder}`
//! substitution (spec.md §9 design note).

use std::collections::HashMap;

use super::escape::{escape_literal, format_iri};
use crate::error::{Error, Result};

/// A typed value to splice into a template placeholder. The type determines
/// the escaping rule applied, so callers can't accidentally inject a raw IRI
/// where a literal was expected or vice versa.
#[derive(Debug, Clone)]
pub enum TemplateValue {
    Iri(String),
    Literal(String),
    /// Already-valid SPARQL syntax (a variable name, a prefixed name); used
    /// sparingly and never for user-controlled input.
    Raw(String),
    /// A `LIMIT` bound (spec.md §4.C2): `Some(n)` substitutes the plain
    /// integer; `None` strips the enclosing `LIMIT ${name}` clause (keyword,
    /// placeholder and surrounding line whitespace) from the rendered query
    /// entirely, rather than leaving a dangling `LIMIT`.
    Limit(Option<u64>),
}

/// A loaded SPARQL query/update template with `${name}` placeholders.
///
/// Templates are parsed once at construction (the placeholder list is
/// extracted up front) so `render` only needs a single substitution pass
/// instead of re-scanning the source text per call.
pub struct Template {
    name: &'static str,
    source: &'static str,
    placeholders: Vec<String>,
}

impl Template {
    /// Parse `source`, recording every `${name}` placeholder it contains.
    #[must_use]
    pub fn parse(name: &'static str, source: &'static str) -> Self {
        let mut placeholders = Vec::new();
        let bytes = source.as_bytes();
        let mut i = 0;
        while i + 1 < bytes.len() {
            if bytes[i] == b'$' && bytes[i + 1] == b'{' {
                if let Some(end) = source[i + 2..].find('}') {
                    let placeholder = source[i + 2..i + 2 + end].to_string();
                    if !placeholders.contains(&placeholder) {
                        placeholders.push(placeholder);
                    }
                    i += 2 + end + 1;
                    continue;
                }
            }
            i += 1;
        }
        Self {
            name,
            source,
            placeholders,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    #[must_use]
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Substitute every declared placeholder with its escaped value.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if a placeholder the template
    /// declares is missing from `vars`, or an IRI value fails validation.
    pub fn render(&self, vars: &HashMap<&str, TemplateValue>) -> Result<String> {
        let mut rendered = self.source.to_string();
        for placeholder in &self.placeholders {
            let value = vars.get(placeholder.as_str()).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "template {} missing value for placeholder ${{{placeholder}}}",
                    self.name
                ))
            })?;
            match value {
                TemplateValue::Iri(iri) => {
                    let substitution = format_iri(iri).map_err(Error::InvalidArgument)?;
                    rendered = rendered.replace(&format!("${{{placeholder}}}"), &substitution);
                }
                TemplateValue::Literal(text) => {
                    rendered = rendered.replace(&format!("${{{placeholder}}}"), &escape_literal(text));
                }
                TemplateValue::Raw(raw) => {
                    rendered = rendered.replace(&format!("${{{placeholder}}}"), raw);
                }
                TemplateValue::Limit(Some(n)) => {
                    rendered = rendered.replace(&format!("${{{placeholder}}}"), &n.to_string());
                }
                TemplateValue::Limit(None) => {
                    rendered = strip_limit_clause(&rendered, placeholder);
                }
            }
        }
        Ok(rendered)
    }
}

/// Remove the `LIMIT ${name}` clause that encloses `placeholder`, spec.md
/// §4.C2's "a `null` value for the `limit` placeholder removes the
/// enclosing `LIMIT` clause entirely". Also consumes the clause's
/// surrounding line whitespace so the removal doesn't leave a blank line.
fn strip_limit_clause(source: &str, placeholder: &str) -> String {
    let needle = format!("LIMIT ${{{placeholder}}}");
    let Some(start) = source.find(&needle) else {
        return source.to_string();
    };
    let bytes = source.as_bytes();

    let mut left = start;
    while left > 0 && (bytes[left - 1] == b' ' || bytes[left - 1] == b'\t') {
        left -= 1;
    }

    let mut right = start + needle.len();
    while right < bytes.len() && (bytes[right] == b' ' || bytes[right] == b'\t') {
        right += 1;
    }
    if source[right..].starts_with("\r\n") {
        right += 2;
    } else if right < bytes.len() && bytes[right] == b'\n' {
        right += 1;
    }

    format!("{}{}", &source[..left], &source[right..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "INSERT DATA { ${subject} a ${kind} ; ${predicate} ${value} . }";

    #[test]
    fn parse_extracts_unique_placeholders_in_order() {
        let template = Template::parse("sample", SAMPLE);
        assert_eq!(
            template.placeholders(),
            &["subject", "kind", "predicate", "value"]
        );
    }

    #[test]
    fn render_substitutes_every_placeholder() {
        let template = Template::parse("sample", SAMPLE);
        let mut vars = HashMap::new();
        vars.insert("subject", TemplateValue::Iri("http://ex.org/s1".into()));
        vars.insert("kind", TemplateValue::Raw("ragno:Corpuscle".into()));
        vars.insert("predicate", TemplateValue::Raw("ragno:prompt".into()));
        vars.insert("value", TemplateValue::Literal("hello \"world\"".into()));

        let rendered = template.render(&vars).unwrap();
        assert!(rendered.contains("<http://ex.org/s1>"));
        assert!(rendered.contains("\\\"world\\\""));
    }

    #[test]
    fn render_rejects_missing_placeholder() {
        let template = Template::parse("sample", SAMPLE);
        let vars = HashMap::new();
        assert!(template.render(&vars).is_err());
    }

    #[test]
    fn render_substitutes_a_concrete_limit() {
        let template = Template::parse("limited", "SELECT * WHERE { ?s ?p ?o } LIMIT ${limit}");
        let mut vars = HashMap::new();
        vars.insert("limit", TemplateValue::Limit(Some(10)));
        let rendered = template.render(&vars).unwrap();
        assert_eq!(rendered, "SELECT * WHERE { ?s ?p ?o } LIMIT 10");
    }

    #[test]
    fn render_with_null_limit_strips_the_limit_clause_entirely() {
        let template = Template::parse(
            "limited",
            "SELECT * WHERE { ?s ?p ?o }\nORDER BY ?s\nLIMIT ${limit}\n",
        );
        let mut vars = HashMap::new();
        vars.insert("limit", TemplateValue::Limit(None));
        let rendered = template.render(&vars).unwrap();
        assert_eq!(rendered, "SELECT * WHERE { ?s ?p ?o }\nORDER BY ?s\n");
        assert!(!rendered.contains("LIMIT"));
    }

    #[test]
    fn render_with_null_limit_on_the_same_line_as_other_clauses_only_removes_the_limit_text() {
        let template = Template::parse("limited", "SELECT * WHERE { ?s ?p ?o } LIMIT ${limit} OFFSET 0");
        let mut vars = HashMap::new();
        vars.insert("limit", TemplateValue::Limit(None));
        let rendered = template.render(&vars).unwrap();
        assert_eq!(rendered, "SELECT * WHERE { ?s ?p ?o }OFFSET 0");
    }

    #[test]
    fn render_rejects_unsafe_iri() {
        let template = Template::parse("sample", "${subject} a ragno:Corpuscle .");
        let mut vars = HashMap::new();
        vars.insert(
            "subject",
            TemplateValue::Iri("http://ex.org> } ; DROP ALL ; INSERT { <http://x".into()),
        );
        assert!(template.render(&vars).is_err());
    }
}
