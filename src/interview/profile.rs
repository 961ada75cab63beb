use serde::{Deserialize, Serialize};

/// Running picture of the learner, sent to the report generator at the end
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillProfile {
    /// Percent correct, 0..=100
    pub accuracy: u32,
    /// Seconds, one decimal
    pub avg_response_time: f64,
    pub streak: u32,
    pub total_questions: u32,
    pub misconception_tags: Vec<String>,
    pub learning_velocity: f64,
    pub confidence_history: Vec<u8>,
    /// Response time in seconds per answered question
    pub hesitation_patterns: Vec<f64>,
}

pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Folds answer events into a `SkillProfile`. Updates are never rolled back.
#[derive(Debug, Default)]
pub struct SkillProfileTracker {
    profile: SkillProfile,
}

impl SkillProfileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> &SkillProfile {
        &self.profile
    }

    pub fn snapshot(&self) -> SkillProfile {
        self.profile.clone()
    }

    pub fn absorb(&mut self, is_correct: bool, elapsed_seconds: f64) {
        let p = &mut self.profile;
        let previous = p.total_questions as f64;
        let total = p.total_questions + 1;

        let accuracy =
            (p.accuracy as f64 * previous + if is_correct { 100.0 } else { 0.0 }) / total as f64;
        let avg = (p.avg_response_time * previous + elapsed_seconds) / total as f64;

        p.total_questions = total;
        p.accuracy = accuracy.round().clamp(0.0, 100.0) as u32;
        p.avg_response_time = round_to_tenth(avg);
        p.streak = if is_correct { p.streak + 1 } else { 0 };
        p.hesitation_patterns.push(elapsed_seconds);
    }

    /// Record the confidence for the latest answer; callers clamp to 0..=100
    pub fn absorb_confidence(&mut self, value: u8) {
        self.profile.confidence_history.push(value);
    }

    /// Remember a misconception the learner fell for, once
    pub fn note_misconception(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() || self.profile.misconception_tags.iter().any(|t| t == tag) {
            return;
        }
        self.profile.misconception_tags.push(tag.to_string());
    }

    pub fn set_learning_velocity(&mut self, velocity: f64) {
        self.profile.learning_velocity = velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streak_sequence() {
        let mut tracker = SkillProfileTracker::new();
        let mut streaks = Vec::new();
        for correct in [true, true, false, true] {
            tracker.absorb(correct, 4.0);
            streaks.push(tracker.profile().streak);
        }
        assert_eq!(streaks, vec![1, 2, 0, 1]);
        assert_eq!(tracker.profile().total_questions, 4);
    }

    #[test]
    fn test_accuracy_rounds_each_step() {
        let mut tracker = SkillProfileTracker::new();
        tracker.absorb(true, 1.0);
        assert_eq!(tracker.profile().accuracy, 100);
        tracker.absorb(false, 1.0);
        assert_eq!(tracker.profile().accuracy, 50);
        tracker.absorb(false, 1.0);
        // (50 * 2 + 0) / 3 = 33.3
        assert_eq!(tracker.profile().accuracy, 33);
        tracker.absorb(true, 1.0);
        // (33 * 3 + 100) / 4 = 49.75
        assert_eq!(tracker.profile().accuracy, 50);
    }

    #[test]
    fn test_accuracy_stays_in_bounds() {
        let mut tracker = SkillProfileTracker::new();
        for i in 0..40 {
            tracker.absorb(i % 3 != 0, 2.5);
            let accuracy = tracker.profile().accuracy;
            assert!(accuracy <= 100);
        }
        assert_eq!(tracker.profile().total_questions, 40);
        assert_eq!(tracker.profile().hesitation_patterns.len(), 40);
    }

    #[test]
    fn test_average_response_time_one_decimal() {
        let mut tracker = SkillProfileTracker::new();
        tracker.absorb(true, 2.34);
        assert_eq!(tracker.profile().avg_response_time, 2.3);

        let mut tracker = SkillProfileTracker::new();
        tracker.absorb(true, 2.0);
        tracker.absorb(true, 5.0);
        assert_eq!(tracker.profile().avg_response_time, 3.5);
        tracker.absorb(false, 3.2);
        // (3.5 * 2 + 3.2) / 3 = 3.4
        assert_eq!(tracker.profile().avg_response_time, 3.4);
        assert_eq!(tracker.profile().hesitation_patterns, vec![2.0, 5.0, 3.2]);
    }

    #[test]
    fn test_misconceptions_are_deduplicated() {
        let mut tracker = SkillProfileTracker::new();
        tracker.note_misconception("reversed flow");
        tracker.note_misconception(" ");
        tracker.note_misconception("reversed flow");
        tracker.note_misconception("pressure vs volume");
        assert_eq!(
            tracker.profile().misconception_tags,
            vec!["reversed flow".to_string(), "pressure vs volume".to_string()]
        );
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let mut tracker = SkillProfileTracker::new();
        tracker.absorb(true, 3.0);
        tracker.absorb_confidence(80);
        let value = serde_json::to_value(tracker.snapshot()).unwrap();
        assert_eq!(value["totalQuestions"], 1);
        assert_eq!(value["confidenceHistory"][0], 80);
        assert_eq!(value["avgResponseTime"], 3.0);
    }
}
