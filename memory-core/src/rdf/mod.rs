//! RDF Store Gateway (spec.md §4.C2): a SPARQL 1.1 Query+Update seam that
//! every other component talks to instead of an HTTP client directly.

pub mod escape;
pub mod fake;
pub mod template;

use std::collections::BTreeMap;

use async_trait::async_trait;

pub use template::{Template, TemplateValue};

use crate::error::Result;

/// One bound value in a SPARQL SELECT result row.
#[derive(Debug, Clone, PartialEq)]
pub enum RdfTerm {
    Iri(String),
    Literal {
        value: String,
        datatype: Option<String>,
        lang: Option<String>,
    },
    BlankNode(String),
}

impl RdfTerm {
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        RdfTerm::Literal {
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            RdfTerm::Iri(s) | RdfTerm::BlankNode(s) => s,
            RdfTerm::Literal { value, .. } => value,
        }
    }
}

/// One SPARQL SELECT result row, keyed by variable name (without the `?`).
pub type Bindings = BTreeMap<String, RdfTerm>;

/// SPARQL 1.1 Query+Update gateway (spec.md §4.C2).
///
/// Implementations propagate transport/timeout failures as
/// [`crate::Error::StoreUnavailable`] (§7's propagation rule: C2 errors
/// propagate up unmodified). A 30s request timeout and HTTP Basic auth are
/// part of the contract for HTTP-backed implementations, not expressed in
/// this trait itself.
#[async_trait]
pub trait RdfGateway: Send + Sync {
    /// Run a SPARQL SELECT query, returning its result rows.
    async fn execute_select(&self, query: &str) -> Result<Vec<Bindings>>;

    /// Run a SPARQL 1.1 Update operation (INSERT DATA / DELETE DATA / ...).
    async fn execute_update(&self, update: &str) -> Result<()>;
}

/// Registry of the templates compiled into the binary. Each is parsed once
/// at first use (spec.md §9: parse-once-structured template loading).
pub mod templates {
    use std::sync::OnceLock;

    use super::Template;

    macro_rules! template_fn {
        ($fn_name:ident, $const_name:ident, $file:literal) => {
            static $const_name: OnceLock<Template> = OnceLock::new();
            pub fn $fn_name() -> &'static Template {
                $const_name.get_or_init(|| Template::parse($file, include_str!(concat!("templates/", $file))))
            }
        };
    }

    template_fn!(insert_interaction, INSERT_INTERACTION, "insert_interaction.rq");
    template_fn!(
        insert_navigation_view,
        INSERT_NAVIGATION_VIEW,
        "insert_navigation_view.rq"
    );
    template_fn!(select_by_session, SELECT_BY_SESSION, "select_by_session.rq");
}
