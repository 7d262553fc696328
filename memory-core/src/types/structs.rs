use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::enums::{Tier, Tilt, Zoom};

/// One stored (prompt, output, embedding, concepts, metadata) tuple (spec.md §3).
///
/// `access_count` starts at 1 and is monotone non-decreasing for the lifetime
/// of the interaction (the "monotone access" testable property, spec.md §8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub prompt: String,
    pub output: String,
    pub embedding: Vec<f32>,
    /// Monotonic epoch-ms timestamp at creation.
    pub timestamp_ms: i64,
    pub access_count: u64,
    pub concepts: BTreeSet<String>,
    /// In `(0, 1]`; multiplies the retrieval score and decays retention (§4.C3/C4).
    pub decay_factor: f32,
    pub tier: Tier,
}

impl Interaction {
    /// Build a freshly-ingested interaction, always starting in `short-term`
    /// with `access_count = 1` and `decay_factor = 1.0`.
    #[must_use]
    pub fn new(
        id: String,
        prompt: String,
        output: String,
        embedding: Vec<f32>,
        concepts: BTreeSet<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            id,
            prompt,
            output,
            embedding,
            timestamp_ms,
            access_count: 1,
            concepts,
            decay_factor: 1.0,
            tier: Tier::ShortTerm,
        }
    }

    /// Age of the interaction relative to `now_ms`, in hours. Never negative.
    #[must_use]
    pub fn age_hours(&self, now_ms: i64) -> f32 {
        let age_ms = (now_ms - self.timestamp_ms).max(0);
        age_ms as f32 / 3_600_000.0
    }
}

/// A start/end pair in ISO-8601 form, as carried in `pan` requests and cursors.
/// Kept as opaque strings: the engine passes them through to the RDF layer and
/// to the `tilt: temporal` retrieval style without needing to parse them itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalRange {
    pub start: String,
    pub end: String,
}

/// Client-supplied `pan` request body (spec.md §6). Every field is optional so
/// that an empty `{}` body can be distinguished from an explicit empty list —
/// the former is a no-op, the latter clears that filter (spec.md §8: `pan({})`
/// is a no-op on the cursor).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanParams {
    pub domains: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub temporal: Option<TemporalRange>,
}

impl PanParams {
    /// `true` when no field was supplied — the no-op case.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_none() && self.keywords.is_none() && self.temporal.is_none()
    }
}

/// Resolved pan filter set held by the cursor. Unlike [`PanParams`], every
/// field always has a value (empty sequences rather than `None`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pan {
    pub domains: Vec<String>,
    pub keywords: Vec<String>,
    pub temporal: Option<TemporalRange>,
}

impl Pan {
    /// Apply a `pan` request: replace (never union) each field that was
    /// supplied, leaving unsupplied fields untouched.
    pub fn merge(&mut self, params: &PanParams) {
        if let Some(domains) = &params.domains {
            self.domains = domains.clone();
        }
        if let Some(keywords) = &params.keywords {
            self.keywords = keywords.clone();
        }
        if params.temporal.is_some() {
            self.temporal = params.temporal.clone();
        }
    }
}

/// Immutable snapshot of the ZPT cursor, the shape carried in every verb
/// envelope's `zptState` field and stored in the bounded history (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZptCursorSnapshot {
    pub session_id: String,
    pub zoom: Zoom,
    pub pan: Pan,
    pub tilt: Tilt,
    pub last_query: Option<String>,
}

/// Process-wide navigation cursor, one per session (spec.md §3, C6).
///
/// `history` is newest-first and never grows past its configured cap — the
/// oldest entry is dropped on overflow.
#[derive(Debug, Clone)]
pub struct ZptCursor {
    pub session_id: String,
    pub zoom: Zoom,
    pub pan: Pan,
    pub tilt: Tilt,
    pub last_query: Option<String>,
    pub history: VecDeque<ZptCursorSnapshot>,
    history_cap: usize,
}

impl ZptCursor {
    /// A freshly initialised cursor: default zoom/tilt, empty pan, no history.
    #[must_use]
    pub fn new(session_id: String, history_cap: usize) -> Self {
        Self {
            session_id,
            zoom: Zoom::default(),
            pan: Pan::default(),
            tilt: Tilt::default(),
            last_query: None,
            history: VecDeque::new(),
            history_cap,
        }
    }

    /// Take an immutable snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ZptCursorSnapshot {
        ZptCursorSnapshot {
            session_id: self.session_id.clone(),
            zoom: self.zoom,
            pan: self.pan.clone(),
            tilt: self.tilt,
            last_query: self.last_query.clone(),
        }
    }

    /// The configured history cap, exposed so callers (e.g. an admin reset)
    /// can rebuild a cursor with the same bound.
    #[must_use]
    pub fn history_cap(&self) -> usize {
        self.history_cap
    }

    /// Push the current state onto `history` (called before a mutation takes
    /// effect), dropping the oldest entry if the cap is exceeded.
    pub fn push_history(&mut self) {
        let snap = self.snapshot();
        self.history.push_front(snap);
        while self.history.len() > self.history_cap {
            self.history.pop_back();
        }
    }
}

/// One recorded navigation event, append-only provenance for diagnostics and
/// the `inspect` verb (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationView {
    pub timestamp_ms: i64,
    pub query: Option<String>,
    pub zoom: Zoom,
    pub pan: Pan,
    pub tilt: Tilt,
    pub answer_digest: Option<String>,
}

/// Groups the views recorded within one session's lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationSession {
    pub session_id: String,
    pub views: Vec<NavigationView>,
}

/// Uniform envelope returned by every verb (spec.md §4.C7, §9):
/// `{success, verb, ...payload, zptState}`. `payload` is flattened into the
/// top-level object on serialization so each verb's fields sit alongside
/// `success`/`verb`/`zptState` rather than nested under a `payload` key.
#[derive(Debug, Clone, Serialize)]
pub struct VerbResult {
    pub success: bool,
    pub verb: String,
    #[serde(flatten)]
    pub payload: serde_json::Value,
    #[serde(rename = "zptState")]
    pub zpt_state: ZptCursorSnapshot,
}

impl VerbResult {
    /// Build a successful envelope.
    #[must_use]
    pub fn ok(verb: &str, payload: serde_json::Value, zpt_state: ZptCursorSnapshot) -> Self {
        Self {
            success: true,
            verb: verb.to_string(),
            payload,
            zpt_state,
        }
    }

    /// Build a failure envelope. The verb boundary never lets a raw [`crate::Error`]
    /// escape unwrapped (spec.md §7's propagation rule) — callers convert to this.
    #[must_use]
    pub fn err(verb: &str, message: impl Into<String>, zpt_state: ZptCursorSnapshot) -> Self {
        Self {
            success: false,
            verb: verb.to_string(),
            payload: serde_json::json!({ "error": message.into() }),
            zpt_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_starts_with_access_count_one() {
        let i = Interaction::new(
            "id1".into(),
            "p".into(),
            "o".into(),
            vec![0.0; 4],
            BTreeSet::new(),
            0,
        );
        assert_eq!(i.access_count, 1);
        assert_eq!(i.decay_factor, 1.0);
        assert_eq!(i.tier, Tier::ShortTerm);
    }

    #[test]
    fn age_hours_never_negative() {
        let i = Interaction::new(
            "id1".into(),
            "p".into(),
            "o".into(),
            vec![],
            BTreeSet::new(),
            10_000,
        );
        assert_eq!(i.age_hours(0), 0.0);
    }

    #[test]
    fn empty_pan_params_is_noop() {
        let mut pan = Pan::default();
        pan.domains.push("technology".into());
        let empty = PanParams::default();
        assert!(empty.is_empty());
        pan.merge(&empty);
        assert_eq!(pan.domains, vec!["technology".to_string()]);
    }

    #[test]
    fn pan_merge_replaces_not_unions() {
        let mut pan = Pan {
            domains: vec!["a".into()],
            keywords: vec!["old".into()],
            temporal: None,
        };
        let params = PanParams {
            domains: Some(vec!["technology".into()]),
            keywords: Some(vec!["AI".into(), "ML".into()]),
            temporal: None,
        };
        pan.merge(&params);
        assert_eq!(pan.domains, vec!["technology".to_string()]);
        assert_eq!(pan.keywords, vec!["AI".to_string(), "ML".to_string()]);
    }

    #[test]
    fn history_respects_cap() {
        let mut cursor = ZptCursor::new("s1".into(), 2);
        cursor.zoom = Zoom::Unit;
        cursor.push_history();
        cursor.zoom = Zoom::Text;
        cursor.push_history();
        cursor.zoom = Zoom::Community;
        cursor.push_history();
        assert_eq!(cursor.history.len(), 2);
        assert_eq!(cursor.history.front().unwrap().zoom, Zoom::Text);
    }

    #[test]
    fn verb_result_flattens_payload_alongside_zpt_state() {
        let cursor = ZptCursor::new("s1".into(), 20);
        let result = VerbResult::ok(
            "tell",
            serde_json::json!({ "stored": true, "contentLength": 5 }),
            cursor.snapshot(),
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["verb"], "tell");
        assert_eq!(value["stored"], true);
        assert!(value["zptState"].is_object());
    }
}
