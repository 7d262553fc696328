//! HTTP-backed [`RdfGateway`] implementing SPARQL 1.1 Query+Update over
//! `reqwest` (spec.md §4.C2), grounded on the teacher's separate
//! `memory-storage-turso` remote-backend crate pattern: the engine
//! (`memory-core`) defines the gateway trait, this crate is one concrete
//! transport for it alongside `memory_core::rdf::fake::InMemoryRdfGateway`.
//!
//! Query results use the standard SPARQL 1.1 Query Results JSON Format
//! (`application/sparql-results+json`); updates are submitted as
//! `application/sparql-update` bodies. Any transport failure, timeout, or
//! non-2xx response becomes [`memory_core::Error::StoreUnavailable`] — C2
//! errors propagate up unmodified per spec.md §7.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use memory_core::config::SparqlEndpoint;
use memory_core::rdf::{Bindings, RdfGateway, RdfTerm};
use memory_core::{Error, Result};
use serde::Deserialize;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A SPARQL 1.1 Query+Update endpoint pair reached over HTTP, with optional
/// HTTP Basic auth and a 30s request timeout (spec.md §4.C2).
pub struct SparqlHttpGateway {
    client: reqwest::Client,
    query_url: String,
    update_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl SparqlHttpGateway {
    /// Build a gateway with the default 30s timeout.
    ///
    /// # Errors
    /// Returns an error if the underlying `reqwest::Client` fails to build.
    pub fn new(endpoint: &SparqlEndpoint) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// # Errors
    /// Returns an error if the underlying `reqwest::Client` fails to build.
    pub fn with_timeout(endpoint: &SparqlEndpoint, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::StoreUnavailable(format!("failed to build SPARQL http client: {e}")))?;

        Ok(Self {
            client,
            query_url: endpoint.query_url.clone(),
            update_url: endpoint.update_url.clone(),
            username: endpoint.username.clone(),
            password: endpoint.password.clone(),
        })
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_ref()),
            None => builder,
        }
    }
}

#[async_trait]
impl RdfGateway for SparqlHttpGateway {
    async fn execute_select(&self, query: &str) -> Result<Vec<Bindings>> {
        let request = self
            .client
            .post(&self.query_url)
            .header("Content-Type", "application/sparql-query")
            .header("Accept", "application/sparql-results+json")
            .body(query.to_string());

        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("SPARQL select request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::StoreUnavailable(format!(
                "SPARQL select endpoint returned {}",
                response.status()
            )));
        }

        let body: SparqlResultsJson = response
            .json()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("invalid SPARQL results body: {e}")))?;

        Ok(body.results.bindings.into_iter().map(parse_row).collect())
    }

    async fn execute_update(&self, update: &str) -> Result<()> {
        let request = self
            .client
            .post(&self.update_url)
            .header("Content-Type", "application/sparql-update")
            .body(update.to_string());

        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("SPARQL update request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::StoreUnavailable(format!(
                "SPARQL update endpoint returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// SPARQL 1.1 Query Results JSON Format, trimmed to the fields this gateway
/// reads (the `head.vars` list isn't needed since bindings are self-keyed).
#[derive(Debug, Deserialize)]
struct SparqlResultsJson {
    results: SparqlResultsBody,
}

#[derive(Debug, Deserialize)]
struct SparqlResultsBody {
    bindings: Vec<BTreeMap<String, SparqlTermJson>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTermJson {
    #[serde(rename = "type")]
    term_type: String,
    value: String,
    #[serde(default)]
    datatype: Option<String>,
    #[serde(rename = "xml:lang", default)]
    lang: Option<String>,
}

fn parse_row(row: BTreeMap<String, SparqlTermJson>) -> Bindings {
    row.into_iter()
        .map(|(var, term)| {
            let parsed = match term.term_type.as_str() {
                "uri" => RdfTerm::Iri(term.value),
                "bnode" => RdfTerm::BlankNode(term.value),
                _ => RdfTerm::Literal {
                    value: term.value,
                    datatype: term.datatype,
                    lang: term.lang,
                },
            };
            (var, parsed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> SparqlEndpoint {
        SparqlEndpoint {
            name: Some("test".to_string()),
            query_url: "http://localhost:9999/sparql".to_string(),
            update_url: "http://localhost:9999/sparql/update".to_string(),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
        }
    }

    #[test]
    fn builds_with_default_and_custom_timeouts() {
        assert!(SparqlHttpGateway::new(&endpoint()).is_ok());
        assert!(SparqlHttpGateway::with_timeout(&endpoint(), Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn parse_row_distinguishes_uri_bnode_and_literal_terms() {
        let mut row = BTreeMap::new();
        row.insert(
            "s".to_string(),
            SparqlTermJson {
                term_type: "uri".to_string(),
                value: "urn:interaction:1".to_string(),
                datatype: None,
                lang: None,
            },
        );
        row.insert(
            "b".to_string(),
            SparqlTermJson {
                term_type: "bnode".to_string(),
                value: "b0".to_string(),
                datatype: None,
                lang: None,
            },
        );
        row.insert(
            "o".to_string(),
            SparqlTermJson {
                term_type: "literal".to_string(),
                value: "turquoise".to_string(),
                datatype: Some("http://www.w3.org/2001/XMLSchema#string".to_string()),
                lang: None,
            },
        );

        let bindings = parse_row(row);
        assert_eq!(bindings.get("s"), Some(&RdfTerm::Iri("urn:interaction:1".to_string())));
        assert_eq!(bindings.get("b"), Some(&RdfTerm::BlankNode("b0".to_string())));
        assert!(matches!(bindings.get("o"), Some(RdfTerm::Literal { value, .. }) if value == "turquoise"));
    }
}
