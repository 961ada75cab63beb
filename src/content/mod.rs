pub mod catalog;
pub mod fixtures;
pub mod models;
pub mod report;

pub use catalog::{attach_model_ids, resolve_model_id, FALLBACK_MODEL_ID};
pub use fixtures::FileContentSource;
pub use models::{scene_config_schema, ConceptModel, Label, Question, SceneConfig, SubTopic};
pub use report::{IntelligenceReport, ReportError, ReportGenerator};

use std::path::PathBuf;

use futures::future::BoxFuture;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content source unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed content payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid content: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ContentError>;

/// Lesson decomposition and scene generation boundary
pub trait ContentSource: Send + Sync {
    /// Break lesson text into selectable sub-topics with models attached
    fn analyze_lesson<'a>(&'a self, lesson: &'a str) -> BoxFuture<'a, Result<Vec<SubTopic>>>;

    /// Build the validated scene for one sub-topic
    fn scene_config<'a>(&'a self, topic: &'a SubTopic) -> BoxFuture<'a, Result<SceneConfig>>;
}

/// Parse a sub-topic payload and enrich it from the model catalog
pub fn parse_sub_topics(raw: &str) -> Result<Vec<SubTopic>> {
    let mut topics = models::sub_topics_from_json(raw)?;
    attach_model_ids(&mut topics);
    Ok(topics)
}
