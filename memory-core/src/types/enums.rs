use serde::{Deserialize, Serialize};

/// Zoom level of the ZPT navigation cursor (spec.md §3, glossary).
///
/// Defaults to [`Zoom::Entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zoom {
    Entity,
    Unit,
    Text,
    Community,
    Corpus,
    Micro,
}

impl Default for Zoom {
    fn default() -> Self {
        Zoom::Entity
    }
}

impl std::fmt::Display for Zoom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Zoom::Entity => "entity",
            Zoom::Unit => "unit",
            Zoom::Text => "text",
            Zoom::Community => "community",
            Zoom::Corpus => "corpus",
            Zoom::Micro => "micro",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Zoom {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "entity" => Ok(Zoom::Entity),
            "unit" => Ok(Zoom::Unit),
            "text" => Ok(Zoom::Text),
            "community" => Ok(Zoom::Community),
            "corpus" => Ok(Zoom::Corpus),
            "micro" => Ok(Zoom::Micro),
            other => Err(format!("unknown zoom level: {other}")),
        }
    }
}

/// Retrieval/presentation style of the ZPT navigation cursor (spec.md §3).
///
/// Defaults to [`Tilt::Keywords`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tilt {
    Keywords,
    Embedding,
    Graph,
    Temporal,
}

impl Default for Tilt {
    fn default() -> Self {
        Tilt::Keywords
    }
}

impl std::fmt::Display for Tilt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tilt::Keywords => "keywords",
            Tilt::Embedding => "embedding",
            Tilt::Graph => "graph",
            Tilt::Temporal => "temporal",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Tilt {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "keywords" => Ok(Tilt::Keywords),
            "embedding" => Ok(Tilt::Embedding),
            "graph" => Ok(Tilt::Graph),
            "temporal" => Ok(Tilt::Temporal),
            other => Err(format!("unknown tilt style: {other}")),
        }
    }
}

/// Which compartment of the interaction store an [`crate::types::Interaction`]
/// currently lives in (spec.md §3). Every interaction is in exactly one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    ShortTerm,
    LongTerm,
}

/// Retrieval depth for the `ask` verb (spec.md §4.C7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AskMode {
    /// No retrieval at all; the question goes straight to the LLM.
    Basic,
    /// Retrieval plus LLM synthesis.
    #[default]
    Standard,
    /// Retrieval, every enhancement pipeline, then LLM synthesis.
    Comprehensive,
}

/// `tell{type}` content classification (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TellContentType {
    #[default]
    Interaction,
    Document,
    Concept,
}

/// `augment{operation}` values (spec.md §4.C7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AugmentOperation {
    Concepts,
    Embedding,
    Auto,
    Relationships,
    Remember,
    Forget,
    EnhanceConcepts,
    FullProcessing,
    BatchExtractConcepts,
    AnalyzeRelationships,
}

impl std::str::FromStr for AugmentOperation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "concepts" => Ok(Self::Concepts),
            "embedding" => Ok(Self::Embedding),
            "auto" => Ok(Self::Auto),
            "relationships" => Ok(Self::Relationships),
            "remember" => Ok(Self::Remember),
            "forget" => Ok(Self::Forget),
            "enhance_concepts" => Ok(Self::EnhanceConcepts),
            "full_processing" => Ok(Self::FullProcessing),
            "batch_extract_concepts" => Ok(Self::BatchExtractConcepts),
            "analyze_relationships" => Ok(Self::AnalyzeRelationships),
            other => Err(format!("unknown augment operation: {other}")),
        }
    }
}
