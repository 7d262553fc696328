#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unused_self)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::borrowed_box)]
#![allow(clippy::float_cmp)]
#![allow(clippy::ref_option)]

//! # Memory Core
//!
//! Engine for a semantic-memory server: embeds and stores `(prompt, output)`
//! interactions, retrieves relevant context by cosine similarity and concept
//! overlap, and exposes it through a small uniform verb API (`tell`/`ask`/
//! `augment`/`zoom`/`pan`/`tilt`/`recall`/`inspect`).
//!
//! ## Module Organization
//!
//! - [`config`]: recognised configuration options and their defaults
//! - [`embeddings`]: embedding generation, concept extraction, caching (C1)
//! - [`rdf`]: SPARQL 1.1 query/update gateway and template substitution (C2)
//! - [`store`]: short/long-term interaction store, retention, eviction (C3)
//! - [`retrieval`]: similarity scoring and ranked retrieval (C4)
//! - [`manager`]: ingest/retrieve/answer orchestration (C5)
//! - [`zpt`]: zoom/pan/tilt navigation cursor and provenance log (C6)
//! - [`verbs`]: verb dispatch, validation, and envelope construction (C7)
//! - [`enhance`]: HyDE/Wikipedia/Wikidata/web-search enhancement pipelines (C8)
//! - [`retry`]: shared retry/backoff policy used by every outbound call
//! - [`types`]: shared record and enum types
//! - [`error`]: the crate's error type and recoverability rules
//!
//! ## Error Handling
//!
//! Most functions return [`Result<T>`] for proper error handling:
//!
//! ```no_run
//! use memory_core::{Error, Result};
//!
//! async fn example() -> Result<()> {
//!     // Operations that can fail
//!     // .await?
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `http-providers`: enable `reqwest`-backed embedding/chat/enhancement
//!   providers and the SPARQL HTTP gateway client
//! - `full`: enable all features

pub mod config;
pub mod constants;
pub mod embeddings;
pub mod enhance;
pub mod error;
pub mod llm;
pub mod manager;
pub mod rdf;
pub mod retrieval;
pub mod retry;
pub mod store;
pub mod types;
pub mod verbs;
pub mod zpt;

pub use config::Configuration;
pub use error::{Error, Result};
pub use manager::MemoryManager;
pub use store::InteractionStore;
pub use types::{
    AskMode, AugmentOperation, Interaction, NavigationSession, NavigationView, PanParams,
    TellContentType, TemporalRange, Tier, Tilt, VerbResult, Zoom, ZptCursor, ZptCursorSnapshot,
};
pub use verbs::VerbsService;
pub use zpt::ZptStateManager;
