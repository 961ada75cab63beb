pub mod manager;

pub use manager::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::caption_buffer::CaptionSegment;
use crate::content::{ContentError, IntelligenceReport, Question};
use crate::interview::analytics::SessionAnalytics;
use crate::interview::answers::{AnswerEvent, AnswerFeedback, CalibrationInsight};
use crate::interview::engine::{ControllerEvent, SessionState};
use crate::interview::profile::SkillProfile;
use crate::interview::questions::Difficulty;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to prepare session: {0}")]
    Content(#[from] ContentError),
    #[error("Session is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Which signal ended the narration phase
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NarrationSignal {
    Ended,
    Failed,
    Failsafe,
}

/// Everything the controller tells the outside world, in order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionNotice {
    SessionStarted {
        session_id: Uuid,
        topic: String,
        total_questions: usize,
    },
    NarrationStarted,
    CaptionsUpdated {
        segments: Vec<CaptionSegment>,
    },
    NarrationFinished {
        signal: NarrationSignal,
    },
    QuestionStarted {
        index: usize,
        total: usize,
        question: Question,
        difficulty: Difficulty,
        solve_secs: u32,
    },
    TimerTick {
        index: usize,
        remaining_secs: u32,
    },
    AnswerEvaluated {
        feedback: AnswerFeedback,
        difficulty: Difficulty,
        profile: SkillProfile,
    },
    MicroExplanation {
        index: usize,
        text: String,
    },
    ConfidenceRecorded {
        index: usize,
        confidence: u8,
        insight: Option<CalibrationInsight>,
        guess_probability: u32,
    },
    ReportRequested {
        topic: String,
    },
    SessionComplete {
        report: IntelligenceReport,
        fallback: bool,
    },
    TornDown,
}

/// User input side of a running session
#[derive(Clone, Debug)]
pub struct SessionHandle {
    events: UnboundedSender<ControllerEvent>,
}

impl SessionHandle {
    pub(crate) fn new(events: UnboundedSender<ControllerEvent>) -> Self {
        Self { events }
    }

    /// Pick an option for the active question; ignored once an answer was accepted
    pub fn select_answer(&self, option: usize) -> Result<()> {
        self.send(ControllerEvent::SelectAnswer(option))
    }

    /// Confidence for the last answer, clamped to 100
    pub fn submit_confidence(&self, value: u8) -> Result<()> {
        self.send(ControllerEvent::SubmitConfidence(value.min(100)))
    }

    /// Tear the session down from any state
    pub fn exit(&self) -> Result<()> {
        self.send(ControllerEvent::Exit)
    }

    fn send(&self, event: ControllerEvent) -> Result<()> {
        self.events.send(event).map_err(|_| SessionError::Closed)
    }
}

/// Final record of a session, whether it completed or was exited
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub session_id: Uuid,
    pub topic: String,
    pub final_state: SessionState,
    pub profile: SkillProfile,
    pub analytics: SessionAnalytics,
    pub answers: Vec<AnswerEvent>,
    pub report: Option<IntelligenceReport>,
    pub used_fallback_report: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionOutcome {
    pub fn completed(&self) -> bool {
        self.final_state == SessionState::Complete
    }
}
