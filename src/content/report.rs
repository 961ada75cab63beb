use std::path::PathBuf;
use std::time::Duration;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::interview::profile::SkillProfile;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report generator unavailable: {0}")]
    Unavailable(String),
    #[error("Report generator did not answer within {0:?}")]
    TimedOut(Duration),
    #[error("Malformed report payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid report: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptStrength {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CognitiveSpeed {
    Fast,
    Moderate,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationType {
    Overconfident,
    Underconfident,
    #[serde(rename = "Well-Calibrated")]
    WellCalibrated,
    Erratic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessPrediction {
    #[serde(rename = "Not Ready")]
    NotReady,
    #[serde(rename = "Needs Practice")]
    NeedsPractice,
    #[serde(rename = "Interview Ready")]
    InterviewReady,
    #[serde(rename = "Danger: Fragile Knowledge")]
    FragileKnowledge,
}

impl ReadinessPrediction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessPrediction::NotReady => "Not Ready",
            ReadinessPrediction::NeedsPractice => "Needs Practice",
            ReadinessPrediction::InterviewReady => "Interview Ready",
            ReadinessPrediction::FragileKnowledge => "Danger: Fragile Knowledge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropoutRisk {
    Low,
    Medium,
    High,
}

/// Final candidate report produced from a finished skill profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceReport {
    #[validate(range(min = 0.0, max = 100.0))]
    pub overall_score: f64,
    #[serde(default)]
    pub concept_strength_map: IndexMap<String, ConceptStrength>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub trick_handling_ability: f64,
    pub cognitive_speed: CognitiveSpeed,
    #[serde(default)]
    pub learning_velocity: f64,
    pub calibration_type: CalibrationType,
    pub readiness_prediction: ReadinessPrediction,
    #[serde(default)]
    pub readiness_reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cognitive_load: Option<f64>,
    /// Fraction 0..1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub guess_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropout_risk_index: Option<DropoutRisk>,
}

impl IntelligenceReport {
    /// Deterministic report used whenever the generator fails
    pub fn fallback() -> Self {
        Self {
            overall_score: 0.0,
            concept_strength_map: IndexMap::new(),
            trick_handling_ability: 0.0,
            cognitive_speed: CognitiveSpeed::Slow,
            learning_velocity: 0.0,
            calibration_type: CalibrationType::Erratic,
            readiness_prediction: ReadinessPrediction::FragileKnowledge,
            readiness_reasoning: "Analysis engine failure. Insufficient telemetry.".to_string(),
            avg_cognitive_load: None,
            guess_probability: None,
            dropout_risk_index: None,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ReportError> {
        let report: IntelligenceReport = serde_json::from_str(raw)?;
        report.validate()?;
        Ok(report)
    }
}

/// Produces the final report. Callers must expect failure.
pub trait ReportGenerator: Send + Sync {
    fn generate_report<'a>(
        &'a self,
        profile: &'a SkillProfile,
        topic: &'a str,
    ) -> BoxFuture<'a, Result<IntelligenceReport, ReportError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fallback_report() {
        let report = IntelligenceReport::fallback();
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.calibration_type, CalibrationType::Erratic);
        assert_eq!(report.readiness_prediction.as_str(), "Danger: Fragile Knowledge");

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["readinessPrediction"], "Danger: Fragile Knowledge");
        assert_eq!(value["calibrationType"], "Erratic");
        assert_eq!(value["readinessReasoning"], "Analysis engine failure. Insufficient telemetry.");
    }

    #[test]
    fn test_parse_report_keeps_concept_order() {
        // raw text, since json! objects come back with sorted keys
        let raw = r#"{
            "overallScore": 82,
            "conceptStrengthMap": {"valves": "strong", "pressure": "weak", "rhythm": "moderate"},
            "trickHandlingAbility": 7.5,
            "cognitiveSpeed": "Fast",
            "learningVelocity": 1.2,
            "calibrationType": "Well-Calibrated",
            "readinessPrediction": "Interview Ready",
            "readinessReasoning": "Consistent and fast.",
            "dropoutRiskIndex": "Low"
        }"#;

        let report = IntelligenceReport::from_json(raw).unwrap();
        assert_eq!(report.overall_score, 82.0);
        assert_eq!(
            report.concept_strength_map.keys().collect::<Vec<_>>(),
            vec!["valves", "pressure", "rhythm"]
        );
        assert_eq!(report.concept_strength_map["pressure"], ConceptStrength::Weak);
        assert_eq!(report.calibration_type, CalibrationType::WellCalibrated);
        assert_eq!(report.readiness_prediction, ReadinessPrediction::InterviewReady);
        assert_eq!(report.dropout_risk_index, Some(DropoutRisk::Low));
        assert_eq!(report.guess_probability, None);
    }

    #[test]
    fn test_out_of_range_score_is_invalid() {
        let raw = json!({
            "overallScore": 140,
            "trickHandlingAbility": 3,
            "cognitiveSpeed": "Slow",
            "calibrationType": "Overconfident",
            "readinessPrediction": "Not Ready"
        })
        .to_string();
        assert!(matches!(
            IntelligenceReport::from_json(&raw),
            Err(ReportError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_enum_label_is_malformed() {
        let raw = json!({
            "overallScore": 50,
            "trickHandlingAbility": 3,
            "cognitiveSpeed": "Glacial",
            "calibrationType": "Overconfident",
            "readinessPrediction": "Not Ready"
        })
        .to_string();
        assert!(matches!(
            IntelligenceReport::from_json(&raw),
            Err(ReportError::Malformed(_))
        ));
    }
}
