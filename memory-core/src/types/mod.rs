//! Shared data types for the semantic-memory engine.
//!
//! Split into `enums` (closed vocabularies: zoom level, tilt style, tier, ...)
//! and `structs` (the record types: `Interaction`, `ZptCursor`, `VerbResult`, ...).
//! Re-exported here so callers can `use memory_core::types::{...}`.

pub mod enums;
pub mod structs;

pub use enums::{AskMode, AugmentOperation, TellContentType, Tier, Tilt, Zoom};
pub use structs::{
    Interaction, NavigationSession, NavigationView, PanParams, TemporalRange, VerbResult,
    ZptCursor, ZptCursorSnapshot,
};
