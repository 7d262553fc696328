//! Request bodies for the eight verbs (spec.md §6), shared by the HTTP
//! router and the STDIO JSON-RPC dispatcher so both transports parse the
//! same shape.

use memory_core::{AskMode, AugmentOperation, PanParams, TellContentType, Tilt, Zoom};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TellRequest {
    pub content: String,
    #[serde(rename = "type")]
    pub content_type: TellContentType,
    pub metadata: Option<Value>,
    pub lazy: bool,
}

impl Default for TellRequest {
    fn default() -> Self {
        Self {
            content: String::new(),
            content_type: TellContentType::default(),
            metadata: None,
            lazy: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AskRequest {
    pub question: String,
    pub mode: AskMode,
    #[serde(rename = "useHyDE")]
    pub use_hyde: bool,
    #[serde(rename = "useWikipedia")]
    pub use_wikipedia: bool,
    #[serde(rename = "useWikidata")]
    pub use_wikidata: bool,
    #[serde(rename = "useWebSearch")]
    pub use_web_search: bool,
}

impl Default for AskRequest {
    fn default() -> Self {
        Self {
            question: String::new(),
            mode: AskMode::default(),
            use_hyde: false,
            use_wikipedia: false,
            use_wikidata: false,
            use_web_search: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AugmentRequest {
    pub target: String,
    pub operation: AugmentOperation,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ZoomRequest {
    pub level: Zoom,
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TiltRequest {
    pub style: Tilt,
    pub query: Option<String>,
}

pub type PanRequest = PanParams;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RecallRequest {
    pub query: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct InspectRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub target: Option<String>,
    #[serde(rename = "includeRecommendations")]
    pub include_recommendations: bool,
}
