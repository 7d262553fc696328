//! In-process [`RdfGateway`] used by `storage.type = memory`/`json`
//! deployments and by tests that need to simulate a flaky or unreachable
//! store without standing up a real SPARQL endpoint.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Bindings, RdfGateway};
use crate::error::{Error, Result};

#[derive(Default)]
pub struct InMemoryRdfGateway {
    updates: Mutex<Vec<String>>,
    canned_results: Mutex<Vec<Bindings>>,
    fail_updates: AtomicBool,
    fail_selects: AtomicBool,
}

impl InMemoryRdfGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `execute_update` call fail, to exercise C5's
    /// `persisted: false` fallback and C6's best-effort cursor commit.
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_selects(&self, fail: bool) {
        self.fail_selects.store(fail, Ordering::SeqCst);
    }

    /// Queue a result row to be returned by the next `execute_select` call.
    pub fn push_canned_result(&self, row: Bindings) {
        self.canned_results.lock().push(row);
    }

    /// Every update string accepted so far, in submission order.
    #[must_use]
    pub fn updates_log(&self) -> Vec<String> {
        self.updates.lock().clone()
    }
}

#[async_trait]
impl RdfGateway for InMemoryRdfGateway {
    async fn execute_select(&self, _query: &str) -> Result<Vec<Bindings>> {
        if self.fail_selects.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("select endpoint unreachable".into()));
        }
        Ok(self.canned_results.lock().clone())
    }

    async fn execute_update(&self, update: &str) -> Result<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("update endpoint unreachable".into()));
        }
        self.updates.lock().push(update.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepted_updates_are_logged_in_order() {
        let gateway = InMemoryRdfGateway::new();
        gateway.execute_update("INSERT DATA { <a> <b> <c> }").await.unwrap();
        gateway.execute_update("INSERT DATA { <d> <e> <f> }").await.unwrap();
        assert_eq!(gateway.updates_log().len(), 2);
    }

    #[tokio::test]
    async fn fail_updates_surfaces_store_unavailable() {
        let gateway = InMemoryRdfGateway::new();
        gateway.set_fail_updates(true);
        let err = gateway.execute_update("INSERT DATA { <a> <b> <c> }").await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn select_returns_canned_rows() {
        let gateway = InMemoryRdfGateway::new();
        let mut row = Bindings::new();
        row.insert("view".to_string(), crate::rdf::RdfTerm::literal("v1"));
        gateway.push_canned_result(row);
        let rows = gateway.execute_select("SELECT ?view WHERE {}").await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
