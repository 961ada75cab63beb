use serde::{Deserialize, Serialize};

use crate::content::Question;

/// The single answer accepted for a question
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvent {
    pub question_index: usize,
    /// `None` when the timer expired
    pub chosen_option: Option<usize>,
    pub elapsed_ms: u64,
    pub confidence: Option<u8>,
}

impl AnswerEvent {
    pub fn timed_out(&self) -> bool {
        self.chosen_option.is_none()
    }

    /// Chosen option with -1 standing for a timeout
    pub fn chosen_option_index(&self) -> i64 {
        self.chosen_option.map_or(-1, |i| i as i64)
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }
}

/// What the learner sees right after answering
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub question_index: usize,
    pub is_correct: bool,
    pub chosen_option: Option<usize>,
    pub correct_option: usize,
    pub correct_answer: String,
    pub explanation: String,
    pub timed_out: bool,
}

impl AnswerFeedback {
    pub fn new(question: &Question, answer: &AnswerEvent) -> Self {
        Self {
            question_index: answer.question_index,
            is_correct: question.is_correct(answer.chosen_option),
            chosen_option: answer.chosen_option,
            correct_option: question.correct_index,
            correct_answer: question.correct_option().to_string(),
            explanation: question.explanation.clone(),
            timed_out: answer.timed_out(),
        }
    }

    pub fn text(&self) -> String {
        if self.is_correct {
            format!("✓ {}", self.explanation)
        } else {
            format!("✗ Answer: {}. {}", self.correct_answer, self.explanation)
        }
    }
}

/// How stated confidence compares with the actual outcome
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CalibrationInsight {
    CorrectButUncertain,
    Overconfident,
    ConfidentMastery,
}

impl CalibrationInsight {
    pub fn evaluate(is_correct: bool, confidence: u8) -> Option<Self> {
        if is_correct && confidence < 40 {
            Some(CalibrationInsight::CorrectButUncertain)
        } else if !is_correct && confidence > 70 {
            Some(CalibrationInsight::Overconfident)
        } else if is_correct && confidence > 80 {
            Some(CalibrationInsight::ConfidentMastery)
        } else {
            None
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            CalibrationInsight::CorrectButUncertain => {
                "🔍 Correct but uncertain: trust your instincts more."
            }
            CalibrationInsight::Overconfident => "⚠️ Overconfidence detected: review this concept.",
            CalibrationInsight::ConfidentMastery => {
                "🎯 High confidence and correct: strong mastery!"
            }
        }
    }
}

pub const DEFAULT_MISCONCEPTION: &str = "a common conceptual trap";

/// Hint shown after repeated wrong answers
pub fn micro_explanation(question: &Question) -> String {
    let misconception = question
        .misconception_type
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MISCONCEPTION);
    format!(
        "💡 Quick insight: This tests understanding of \"{}\". Watch out for {}.",
        question.concept_tag, misconception
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(misconception: Option<&str>) -> Question {
        Question {
            id: "q1".to_string(),
            question: "Which valve closes first?".to_string(),
            options: vec!["mitral".to_string(), "aortic".to_string()],
            correct_index: 0,
            difficulty: 4,
            trickiness: 6,
            concept_tag: "valve timing".to_string(),
            expected_solve_time: 0,
            explanation: "The mitral valve closes at systole onset.".to_string(),
            misconception_type: misconception.map(str::to_string),
        }
    }

    #[test]
    fn test_insight_rules() {
        assert_eq!(
            CalibrationInsight::evaluate(true, 39),
            Some(CalibrationInsight::CorrectButUncertain)
        );
        assert_eq!(CalibrationInsight::evaluate(true, 40), None);
        assert_eq!(
            CalibrationInsight::evaluate(false, 71),
            Some(CalibrationInsight::Overconfident)
        );
        assert_eq!(CalibrationInsight::evaluate(false, 70), None);
        assert_eq!(
            CalibrationInsight::evaluate(true, 81),
            Some(CalibrationInsight::ConfidentMastery)
        );
        assert_eq!(CalibrationInsight::evaluate(true, 80), None);
        assert_eq!(CalibrationInsight::evaluate(false, 10), None);
    }

    #[test]
    fn test_micro_explanation_default_trap() {
        assert_eq!(
            micro_explanation(&question(None)),
            "💡 Quick insight: This tests understanding of \"valve timing\". Watch out for a common conceptual trap."
        );
        assert!(micro_explanation(&question(Some("pressure inversion")))
            .ends_with("Watch out for pressure inversion."));
    }

    #[test]
    fn test_timeout_answer() {
        let q = question(None);
        let answer = AnswerEvent {
            question_index: 2,
            chosen_option: None,
            elapsed_ms: 30_000,
            confidence: None,
        };
        assert_eq!(answer.chosen_option_index(), -1);
        assert_eq!(answer.elapsed_seconds(), 30.0);

        let feedback = AnswerFeedback::new(&q, &answer);
        assert!(!feedback.is_correct);
        assert!(feedback.timed_out);
        assert_eq!(feedback.correct_answer, "mitral");
        assert_eq!(
            feedback.text(),
            "✗ Answer: mitral. The mitral valve closes at systole onset."
        );
    }

    #[test]
    fn test_correct_feedback_text() {
        let answer = AnswerEvent {
            question_index: 0,
            chosen_option: Some(0),
            elapsed_ms: 4_000,
            confidence: None,
        };
        let feedback = AnswerFeedback::new(&question(None), &answer);
        assert!(feedback.is_correct);
        assert_eq!(feedback.text(), "✓ The mitral valve closes at systole onset.");
    }
}
