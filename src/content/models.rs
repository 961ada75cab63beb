use log::{debug, warn};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::catalog::FALLBACK_MODEL_ID;
use super::{ContentError, Result};

/// A unit of study extracted from the lesson text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubTopic {
    pub id: u32,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 3D model identifier resolved from the model catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sketchfab_id: Option<String>,
}

/// Anchor point for an annotation over the 3D model (x/y in percent, z simulated depth)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Label {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConceptModel {
    pub main_concept: String,
    pub subtopics: Vec<String>,
    pub difficulty_level: u8,
    pub concept_density: f64,
    pub cognitive_load: f64,
    pub potential_misconceptions: Vec<String>,
}

/// One adaptive multiple-choice question, immutable once issued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_correct_index"))]
pub struct Question {
    pub id: String,
    #[validate(length(min = 1))]
    pub question: String,
    #[validate(length(min = 2))]
    pub options: Vec<String>,
    pub correct_index: usize,
    #[validate(range(min = 1, max = 10))]
    pub difficulty: u8,
    #[validate(range(min = 1, max = 10))]
    pub trickiness: u8,
    #[serde(default)]
    pub concept_tag: String,
    /// Seconds; zero means the session default applies
    #[serde(default)]
    pub expected_solve_time: u32,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misconception_type: Option<String>,
}

impl Question {
    /// `None` is a timeout and never correct
    pub fn is_correct(&self, chosen: Option<usize>) -> bool {
        chosen == Some(self.correct_index)
    }

    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.correct_index)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

fn validate_correct_index(question: &Question) -> std::result::Result<(), ValidationError> {
    if question.correct_index >= question.options.len() {
        let mut error = ValidationError::new("correct_index_out_of_range");
        error.add_param("correctIndex".into(), &question.correct_index);
        error.add_param("options".into(), &question.options.len());
        return Err(error);
    }
    Ok(())
}

/// Everything one AR session needs: narration, model, questions and caption keywords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_scene"))]
pub struct SceneConfig {
    #[serde(default)]
    pub model_type: String,
    /// Always replaced by the topic's resolved model
    #[serde(default)]
    pub sketchfab_id: String,
    pub intro_script: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub concept_model: ConceptModel,
    #[validate]
    pub adaptive_questions: Vec<Question>,
    #[serde(default)]
    pub technical_keywords: Vec<String>,
}

fn validate_scene(scene: &SceneConfig) -> std::result::Result<(), ValidationError> {
    if scene.intro_script.trim().is_empty() {
        return Err(ValidationError::new("empty_intro_script"));
    }
    if scene.adaptive_questions.is_empty() {
        return Err(ValidationError::new("no_questions"));
    }
    Ok(())
}

impl SceneConfig {
    /// Parse and validate a scene payload, then pin its model to the topic's
    pub fn from_json(raw: &str, topic: &SubTopic) -> Result<Self> {
        let mut scene: SceneConfig = serde_json::from_str(raw)?;
        scene.validate()?;

        let model_id = topic
            .sketchfab_id
            .clone()
            .unwrap_or_else(|| FALLBACK_MODEL_ID.to_string());
        if !scene.sketchfab_id.is_empty() && scene.sketchfab_id != model_id {
            warn!(
                "Ignoring payload model id {} for topic {}, using {}",
                scene.sketchfab_id, topic.id, model_id
            );
        }
        scene.sketchfab_id = model_id;
        if scene.model_type.trim().is_empty() {
            scene.model_type = topic.title.clone();
        }

        debug!(
            "Scene for '{}' parsed: {} questions, {} labels, {} keywords",
            topic.title,
            scene.adaptive_questions.len(),
            scene.labels.len(),
            scene.technical_keywords.len()
        );
        Ok(scene)
    }

    pub fn question_count(&self) -> usize {
        self.adaptive_questions.len()
    }
}

/// JSON Schema of the scene payload, for backends that support structured output
pub fn scene_config_schema() -> serde_json::Value {
    serde_json::to_value(schema_for!(SceneConfig)).unwrap_or_default()
}

/// Parse a sub-topic list payload
pub fn sub_topics_from_json(raw: &str) -> Result<Vec<SubTopic>> {
    let topics: Vec<SubTopic> = serde_json::from_str(raw)?;
    for topic in &topics {
        topic.validate()?;
    }
    if topics.is_empty() {
        return Err(ContentError::Unavailable(
            "lesson produced no sub-topics".to_string(),
        ));
    }
    Ok(topics)
}
