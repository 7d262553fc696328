//! ZPT State Manager (spec.md §4.C6): owns the process-wide navigation
//! cursor, applies the `zoom`/`pan`/`tilt`/`ask` transition rules, and
//! appends best-effort provenance to the RDF store on every mutation.
//!
//! The cursor itself ([`crate::types::ZptCursor`]) is a plain data type; this
//! module is where its single-exclusive-lock-per-session concurrency policy
//! (spec.md §5) and persistence side effects live.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::rdf::{templates, RdfGateway, TemplateValue};
use crate::types::{
    NavigationSession, NavigationView, PanParams, Tilt, Zoom, ZptCursor, ZptCursorSnapshot,
};

/// Owns one session's [`ZptCursor`] plus its append-only [`NavigationSession`]
/// log (spec.md §3 ownership rules: C6 exclusively owns the cursor).
pub struct ZptStateManager {
    cursor: RwLock<ZptCursor>,
    session_log: RwLock<NavigationSession>,
    rdf: Arc<dyn RdfGateway>,
    graph_iri: String,
}

impl ZptStateManager {
    #[must_use]
    pub fn new(session_id: String, history_cap: usize, rdf: Arc<dyn RdfGateway>, graph_iri: String) -> Self {
        let session_log = NavigationSession {
            session_id: session_id.clone(),
            views: Vec::new(),
        };
        Self {
            cursor: RwLock::new(ZptCursor::new(session_id, history_cap)),
            session_log: RwLock::new(session_log),
            rdf,
            graph_iri,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ZptCursorSnapshot {
        self.cursor.read().snapshot()
    }

    /// Last N recorded navigation views, most recent last (used by `inspect`).
    #[must_use]
    pub fn recent_views(&self, limit: usize) -> Vec<NavigationView> {
        let log = self.session_log.read();
        let start = log.views.len().saturating_sub(limit);
        log.views[start..].to_vec()
    }

    /// `zoom(level, query?)` (spec.md §4.C6): set `zoom`; if `query` is
    /// present, also set `last_query` and report that a re-navigate is owed.
    pub async fn zoom(&self, level: Zoom, query: Option<&str>, now_ms: i64) -> (ZptCursorSnapshot, bool) {
        let renavigate = query.is_some();
        {
            let mut cursor = self.cursor.write();
            cursor.push_history();
            cursor.zoom = level;
            if let Some(q) = query {
                cursor.last_query = Some(q.to_string());
            }
        }
        let snapshot = self.snapshot();
        self.record_view(snapshot.last_query.clone(), &snapshot, now_ms, None).await;
        (snapshot, renavigate)
    }

    /// `pan(params)` (spec.md §4.C6): merge filters (replace, not union);
    /// re-navigate only if `last_query` was already non-empty. `pan({})` is a
    /// no-op on the cursor (spec.md §8) but still records a view, matching
    /// "every mutation appends one `NavigationView`" — an empty `pan` is
    /// still an invoked verb.
    pub async fn pan(&self, params: &PanParams, now_ms: i64) -> (ZptCursorSnapshot, bool) {
        let renavigate = {
            let mut cursor = self.cursor.write();
            cursor.push_history();
            cursor.pan.merge(params);
            cursor.last_query.is_some()
        };
        let snapshot = self.snapshot();
        self.record_view(snapshot.last_query.clone(), &snapshot, now_ms, None).await;
        (snapshot, renavigate)
    }

    /// `tilt(style, query?)` (spec.md §4.C6): same re-navigate rule as `zoom`.
    pub async fn tilt(&self, style: Tilt, query: Option<&str>, now_ms: i64) -> (ZptCursorSnapshot, bool) {
        let renavigate = query.is_some();
        {
            let mut cursor = self.cursor.write();
            cursor.push_history();
            cursor.tilt = style;
            if let Some(q) = query {
                cursor.last_query = Some(q.to_string());
            }
        }
        let snapshot = self.snapshot();
        self.record_view(snapshot.last_query.clone(), &snapshot, now_ms, None).await;
        (snapshot, renavigate)
    }

    /// `ask(question)` (spec.md §4.C6): sets `last_query`, never touches
    /// zoom/pan/tilt. Returns the snapshot taken *before* the answer is
    /// known; call [`Self::attach_answer_digest`] once synthesis completes.
    pub async fn ask(&self, question: &str, now_ms: i64) -> ZptCursorSnapshot {
        {
            let mut cursor = self.cursor.write();
            cursor.push_history();
            cursor.last_query = Some(question.to_string());
        }
        let snapshot = self.snapshot();
        self.record_view(Some(question.to_string()), &snapshot, now_ms, None).await;
        snapshot
    }

    /// `tell(...)` does **not** mutate the cursor (spec.md §4.C6, §8 "ZPT
    /// invariance on tell"); exposed so C7 can fetch the unchanged snapshot
    /// for the envelope without anyone being tempted to call a mutator.
    #[must_use]
    pub fn peek(&self) -> ZptCursorSnapshot {
        self.snapshot()
    }

    /// Update the answer digest on the most recently recorded in-memory
    /// view, once `ask`'s LLM step has produced an answer. Best-effort: does
    /// not re-persist (the view row itself was already committed).
    pub fn attach_answer_digest(&self, digest: &str) {
        if let Some(view) = self.session_log.write().views.last_mut() {
            view.answer_digest = Some(digest.to_string());
        }
    }

    /// Admin reset verb (spec.md §4.C6 "a reset admin verb"): back to
    /// defaults, same session id and history cap, log untouched.
    pub fn reset(&self) -> ZptCursorSnapshot {
        let mut cursor = self.cursor.write();
        let session_id = cursor.session_id.clone();
        let history_cap = cursor.history_cap();
        *cursor = ZptCursor::new(session_id, history_cap);
        cursor.snapshot()
    }

    async fn record_view(
        &self,
        query: Option<String>,
        snapshot: &ZptCursorSnapshot,
        now_ms: i64,
        answer_digest: Option<String>,
    ) {
        let view = NavigationView {
            timestamp_ms: now_ms,
            query: query.clone(),
            zoom: snapshot.zoom,
            pan: snapshot.pan.clone(),
            tilt: snapshot.tilt,
            answer_digest: answer_digest.clone(),
        };
        self.session_log.write().views.push(view);

        let subject = format!("urn:navigation-view:{}:{now_ms}", snapshot.session_id);
        let mut vars: HashMap<&str, TemplateValue> = HashMap::new();
        vars.insert("graph", TemplateValue::Iri(self.graph_iri.clone()));
        vars.insert("subject", TemplateValue::Iri(subject));
        vars.insert("session", TemplateValue::Literal(snapshot.session_id.clone()));
        vars.insert("zoom", TemplateValue::Raw(format!("\"{}\"", snapshot.zoom)));
        vars.insert("tilt", TemplateValue::Raw(format!("\"{}\"", snapshot.tilt)));
        vars.insert("created", TemplateValue::Raw(now_ms.to_string()));

        let Ok(query_str) = templates::insert_navigation_view().render(&vars) else {
            tracing::warn!(session = %snapshot.session_id, "failed to render navigation view template");
            return;
        };

        if let Err(err) = self.rdf.execute_update(&query_str).await {
            // The cursor is the source of truth; provenance is best-effort
            // (spec.md §4.C6).
            tracing::warn!(session = %snapshot.session_id, error = %err, "navigation view not persisted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::fake::InMemoryRdfGateway;

    fn manager() -> ZptStateManager {
        ZptStateManager::new(
            "session-1".to_string(),
            20,
            Arc::new(InMemoryRdfGateway::new()),
            "urn:graph:test".to_string(),
        )
    }

    #[tokio::test]
    async fn tell_never_mutates_the_cursor() {
        // ZPT invariance on `tell` (spec.md §8): peek before/after is unchanged.
        let manager = manager();
        let before = manager.peek();
        let after = manager.peek();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn zoom_without_query_does_not_touch_last_query() {
        let manager = manager();
        manager.ask("first question", 0).await;
        let (snapshot, renavigate) = manager.zoom(Zoom::Unit, None, 1).await;
        assert_eq!(snapshot.last_query.as_deref(), Some("first question"));
        assert!(!renavigate);
    }

    #[tokio::test]
    async fn zoom_with_query_sets_last_query_and_requests_renavigate() {
        let manager = manager();
        let (snapshot, renavigate) = manager.zoom(Zoom::Unit, Some("automated machine learning"), 0).await;
        assert_eq!(snapshot.last_query.as_deref(), Some("automated machine learning"));
        assert!(renavigate);
    }

    #[tokio::test]
    async fn pan_replaces_not_unions_and_only_renavigates_with_a_pending_query() {
        let manager = manager();
        let params = PanParams {
            domains: Some(vec!["technology".to_string()]),
            keywords: Some(vec!["AI".to_string(), "ML".to_string()]),
            temporal: None,
        };
        let (snapshot, renavigate) = manager.pan(&params, 0).await;
        assert_eq!(snapshot.pan.domains, vec!["technology".to_string()]);
        assert!(!renavigate);

        manager.ask("q", 1).await;
        let (_, renavigate_after_ask) = manager.pan(&PanParams::default(), 2).await;
        assert!(renavigate_after_ask);
    }

    #[tokio::test]
    async fn empty_pan_is_a_cursor_noop() {
        let manager = manager();
        let params = PanParams {
            domains: Some(vec!["technology".to_string()]),
            ..Default::default()
        };
        manager.pan(&params, 0).await;
        let before = manager.peek();
        manager.pan(&PanParams::default(), 1).await;
        let after = manager.peek();
        assert_eq!(before.pan, after.pan);
    }

    #[tokio::test]
    async fn lastquery_provenance_survives_a_tell_after_zoom_with_query() {
        // Scenario 3 (spec.md §8): ask, then zoom-with-query, then tell; the
        // zoom's query wins and a later tell doesn't change it.
        let manager = manager();
        manager.ask("What is neural architecture search?", 0).await;
        manager.zoom(Zoom::Unit, Some("automated machine learning"), 1).await;
        let after_tell = manager.peek();
        assert_eq!(after_tell.last_query.as_deref(), Some("automated machine learning"));
    }

    #[tokio::test]
    async fn zpt_state_persists_across_zoom_pan_tilt_then_tell() {
        // Scenario 2 (spec.md §8).
        let manager = manager();
        manager.zoom(Zoom::Community, None, 0).await;
        manager
            .pan(
                &PanParams {
                    domains: Some(vec!["technology".to_string()]),
                    keywords: Some(vec!["AI".to_string(), "ML".to_string()]),
                    temporal: None,
                },
                1,
            )
            .await;
        manager.tilt(Tilt::Temporal, None, 2).await;
        let snapshot = manager.peek();
        assert_eq!(snapshot.zoom, Zoom::Community);
        assert_eq!(snapshot.tilt, Tilt::Temporal);
        assert_eq!(snapshot.pan.domains, vec!["technology".to_string()]);
        assert_eq!(snapshot.pan.keywords, vec!["AI".to_string(), "ML".to_string()]);
    }

    #[tokio::test]
    async fn idempotent_zoom_yields_identical_cursor() {
        // Idempotent verb invariant (spec.md §8): zoom(l) applied twice is
        // the same cursor (modulo history depth, which both calls grow
        // identically).
        let manager = manager();
        manager.zoom(Zoom::Unit, None, 0).await;
        let first = manager.peek();
        manager.zoom(Zoom::Unit, None, 1).await;
        let second = manager.peek();
        assert_eq!(first.zoom, second.zoom);
        assert_eq!(first.pan, second.pan);
        assert_eq!(first.tilt, second.tilt);
    }

    #[tokio::test]
    async fn reset_restores_defaults_but_keeps_session_id() {
        let manager = manager();
        manager.zoom(Zoom::Corpus, Some("q"), 0).await;
        let snapshot = manager.reset();
        assert_eq!(snapshot.session_id, "session-1");
        assert_eq!(snapshot.zoom, Zoom::default());
        assert!(snapshot.last_query.is_none());
    }

    #[tokio::test]
    async fn recent_views_reflects_recorded_mutations() {
        let manager = manager();
        manager.ask("q1", 0).await;
        manager.zoom(Zoom::Unit, None, 1).await;
        let views = manager.recent_views(10);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].query.as_deref(), Some("q1"));
    }

    #[tokio::test]
    async fn attach_answer_digest_updates_the_last_view_only() {
        let manager = manager();
        manager.ask("q1", 0).await;
        manager.ask("q2", 1).await;
        manager.attach_answer_digest("digest-for-q2");
        let views = manager.recent_views(10);
        assert_eq!(views[0].answer_digest, None);
        assert_eq!(views[1].answer_digest.as_deref(), Some("digest-for-q2"));
    }
}
