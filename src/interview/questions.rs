use std::fmt;

use serde::{Deserialize, Serialize};

use super::profile::SkillProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty label for the current profile. Hard is checked before easy.
pub fn adapt_difficulty(streak: u32, total_questions: u32) -> Difficulty {
    if streak >= 3 {
        Difficulty::Hard
    } else if streak == 0 && total_questions > 2 {
        Difficulty::Easy
    } else {
        Difficulty::Medium
    }
}

pub fn difficulty_for(profile: &SkillProfile) -> Difficulty {
    adapt_difficulty(profile.streak, profile.total_questions)
}
