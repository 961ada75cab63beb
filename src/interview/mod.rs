pub mod analytics;
pub mod answers;
pub mod engine;
pub mod profile;
pub mod questions;
pub mod timer;

pub use analytics::{OutcomeRecord, SessionAnalytics};
pub use answers::{micro_explanation, AnswerEvent, AnswerFeedback, CalibrationInsight};
pub use engine::{AdaptiveSessionController, SessionState};
pub use profile::{SkillProfile, SkillProfileTracker};
pub use questions::{adapt_difficulty, difficulty_for, Difficulty};
pub use timer::{QuestionTimer, TimerEvent, TimerEventKind};
