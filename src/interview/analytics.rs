use serde::{Deserialize, Serialize};

use super::profile::round_to_tenth;

/// Confidence above this on a wrong answer counts as a likely guess
const GUESS_CONFIDENCE_THRESHOLD: u8 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub question_index: usize,
    pub correct: bool,
    pub response_ms: u64,
    /// Pending until the learner submits it
    pub confidence: Option<u8>,
    pub trickiness: u8,
}

/// Per-question outcome log with the metrics derived from it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnalytics {
    pub question_log: Vec<OutcomeRecord>,
    pub learning_velocity_slope: f64,
    /// Percent, 0..=100
    pub guess_probability: u32,
    pub consecutive_wrong: u32,
}

impl SessionAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        question_index: usize,
        correct: bool,
        response_ms: u64,
        confidence: Option<u8>,
        trickiness: u8,
    ) {
        self.question_log.push(OutcomeRecord {
            question_index,
            correct,
            response_ms,
            confidence,
            trickiness,
        });
        self.consecutive_wrong = if correct { 0 } else { self.consecutive_wrong + 1 };
        self.learning_velocity_slope = self.velocity_slope();
    }

    /// Attach confidence to the latest entry and recompute guess probability
    pub fn record_confidence(&mut self, confidence: u8) {
        if let Some(last) = self.question_log.last_mut() {
            last.confidence = Some(confidence);
        }
        let guesses = self
            .question_log
            .iter()
            .filter(|r| {
                !r.correct && r.confidence.map_or(false, |c| c > GUESS_CONFIDENCE_THRESHOLD)
            })
            .count();
        let total = self.question_log.len().max(1);
        self.guess_probability = (guesses as f64 * 100.0 / total as f64).round() as u32;
    }

    /// (last - first) / count over the 1-based positions of correct answers
    fn velocity_slope(&self) -> f64 {
        let positions: Vec<usize> = self
            .question_log
            .iter()
            .enumerate()
            .filter(|(_, r)| r.correct)
            .map(|(i, _)| i + 1)
            .collect();

        match (positions.first(), positions.last()) {
            (Some(first), Some(last)) if positions.len() > 1 => {
                round_to_tenth((last - first) as f64 / positions.len() as f64)
            }
            _ => 0.0,
        }
    }

    /// Two or more wrong answers in a row
    pub fn needs_micro_explanation(&self) -> bool {
        self.consecutive_wrong >= 2
    }

    pub fn len(&self) -> usize {
        self.question_log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.question_log.is_empty()
    }
}
