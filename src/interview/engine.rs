use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use super::analytics::SessionAnalytics;
use super::answers::{micro_explanation, AnswerEvent, AnswerFeedback, CalibrationInsight};
use super::profile::SkillProfileTracker;
use super::questions::{difficulty_for, Difficulty};
use super::timer::{QuestionTimer, TimerEvent, TimerEventKind};
use crate::caption_buffer::{CaptionAccumulator, TechnicalVocabulary};
use crate::config::{SessionSettings, TrainerConfig};
use crate::content::{IntelligenceReport, ReportError, ReportGenerator, SceneConfig, SubTopic};
use crate::narration::{word_count, NarrationEvent, NarrationSource};
use crate::session::{NarrationSignal, SessionHandle, SessionNotice, SessionOutcome};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionState {
    Narrating,
    QuestionActive {
        index: usize,
    },
    /// `confidence` is set once submitted, while the feedback is on screen
    AwaitingConfidence {
        index: usize,
        confidence: Option<u8>,
    },
    Finalizing,
    Complete,
}

/// Inputs the controller reacts to, from the user and from its own helper tasks
#[derive(Debug)]
pub(crate) enum ControllerEvent {
    Narration(NarrationEvent),
    NarrationFailsafe,
    BeginQuestions,
    Timer(TimerEvent),
    SelectAnswer(usize),
    SubmitConfidence(u8),
    Advance { next_index: usize },
    ReportReady(Result<IntelligenceReport, ReportError>),
    Exit,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Drives one session: narration, the adaptive question loop, then the report.
///
/// All state lives here and changes only inside `run()`, one event at a time.
/// Timers, narration and report requests run as tasks that report back through
/// the event channel; `dispose()` aborts every one of them.
pub struct AdaptiveSessionController {
    session_id: Uuid,
    topic: String,
    scene: SceneConfig,
    settings: SessionSettings,
    narrator: Arc<dyn NarrationSource>,
    reports: Arc<dyn ReportGenerator>,

    state: SessionState,
    difficulty: Difficulty,
    narration_done: bool,
    question_started_at: Instant,
    solve_secs: u32,

    captions: CaptionAccumulator,
    vocabulary: TechnicalVocabulary,
    timer: QuestionTimer,
    profile: SkillProfileTracker,
    analytics: SessionAnalytics,
    answers: Vec<AnswerEvent>,
    report: Option<IntelligenceReport>,
    used_fallback: bool,

    events_tx: UnboundedSender<ControllerEvent>,
    events_rx: UnboundedReceiver<ControllerEvent>,
    notices: UnboundedSender<SessionNotice>,

    narration_task: Option<JoinHandle<()>>,
    failsafe_task: Option<JoinHandle<()>>,
    delay_task: Option<JoinHandle<()>>,
    report_task: Option<JoinHandle<()>>,

    started_at: DateTime<Utc>,
    disposed: bool,
}

impl AdaptiveSessionController {
    pub fn new(
        topic: &SubTopic,
        scene: SceneConfig,
        config: &TrainerConfig,
        narrator: Arc<dyn NarrationSource>,
        reports: Arc<dyn ReportGenerator>,
    ) -> (Self, SessionHandle, UnboundedReceiver<SessionNotice>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices, notices_rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(events_tx.clone());

        let controller = Self {
            session_id: Uuid::new_v4(),
            topic: topic.title.clone(),
            vocabulary: TechnicalVocabulary::new(&scene.technical_keywords),
            scene,
            settings: config.session.clone(),
            narrator,
            reports,
            state: SessionState::Narrating,
            difficulty: Difficulty::default(),
            narration_done: false,
            question_started_at: Instant::now(),
            solve_secs: 0,
            captions: CaptionAccumulator::new(&config.captions),
            timer: QuestionTimer::new(),
            profile: SkillProfileTracker::new(),
            analytics: SessionAnalytics::new(),
            answers: Vec::new(),
            report: None,
            used_fallback: false,
            events_tx,
            events_rx,
            notices,
            narration_task: None,
            failsafe_task: None,
            delay_task: None,
            report_task: None,
            started_at: Utc::now(),
            disposed: false,
        };
        (controller, handle, notices_rx)
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run until the session completes or the user exits
    pub async fn run(mut self) -> SessionOutcome {
        self.start_narration();

        while let Some(event) = self.events_rx.recv().await {
            if self.handle_event(event) == Flow::Stop {
                break;
            }
        }

        self.dispose();
        self.outcome()
    }

    /// Cancel the timer and every helper task. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.timer.cancel();
        for task in [
            self.narration_task.take(),
            self.failsafe_task.take(),
            self.delay_task.take(),
            self.report_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
        info!("🧹 Session {} torn down in state {:?}", self.session_id, self.state);
        self.notify(SessionNotice::TornDown);
    }

    fn handle_event(&mut self, event: ControllerEvent) -> Flow {
        match event {
            ControllerEvent::Narration(event) => self.on_narration(event),
            ControllerEvent::NarrationFailsafe => {
                self.complete_narration(NarrationSignal::Failsafe)
            }
            ControllerEvent::BeginQuestions => self.on_begin_questions(),
            ControllerEvent::Timer(event) => self.on_timer(event),
            ControllerEvent::SelectAnswer(option) => self.on_select_answer(option),
            ControllerEvent::SubmitConfidence(value) => self.on_confidence(value),
            ControllerEvent::Advance { next_index } => self.on_advance(next_index),
            ControllerEvent::ReportReady(result) => return self.on_report(result),
            ControllerEvent::Exit => {
                info!("🚪 Exit requested for session {}", self.session_id);
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    // Narration

    fn start_narration(&mut self) {
        let script = self.scene.intro_script.clone();
        let words = word_count(&script);
        info!(
            "🚀 Session {} started: '{}' ({} questions, {} narration words)",
            self.session_id,
            self.topic,
            self.scene.question_count(),
            words
        );
        self.notify(SessionNotice::SessionStarted {
            session_id: self.session_id,
            topic: self.topic.clone(),
            total_questions: self.scene.question_count(),
        });

        let mut stream = self.narrator.narrate(&script);
        let tx = self.events_tx.clone();
        self.narration_task = Some(tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                let terminal = event.is_terminal();
                if tx.send(ControllerEvent::Narration(event)).is_err() || terminal {
                    return;
                }
            }
            let _ = tx.send(ControllerEvent::Narration(NarrationEvent::Failed(
                "narration stream ended without a terminal event".to_string(),
            )));
        }));

        let deadline = self.settings.narration_failsafe(words);
        let tx = self.events_tx.clone();
        self.failsafe_task = Some(tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            let _ = tx.send(ControllerEvent::NarrationFailsafe);
        }));
    }

    fn on_narration(&mut self, event: NarrationEvent) {
        if self.narration_done || self.state != SessionState::Narrating {
            debug!("Ignoring late narration event {:?}", event);
            return;
        }
        match event {
            NarrationEvent::Started => self.notify(SessionNotice::NarrationStarted),
            NarrationEvent::WordBoundary { word, .. } => {
                let is_technical = self.vocabulary.is_technical(&word);
                self.captions.push(&word, is_technical);
                self.notify(SessionNotice::CaptionsUpdated {
                    segments: self.captions.segments(),
                });
            }
            NarrationEvent::Ended => self.complete_narration(NarrationSignal::Ended),
            NarrationEvent::Failed(reason) => {
                warn!("⚠️ Narration failed, continuing to questions: {}", reason);
                self.complete_narration(NarrationSignal::Failed);
            }
        }
    }

    /// First completion signal wins; later ones are no-ops
    fn complete_narration(&mut self, signal: NarrationSignal) {
        if self.narration_done {
            debug!("Narration already complete, ignoring {:?}", signal);
            return;
        }
        self.narration_done = true;

        match signal {
            NarrationSignal::Failsafe => abort_task(&mut self.narration_task),
            _ => abort_task(&mut self.failsafe_task),
        }
        info!("🔇 Narration complete via {:?}", signal);
        self.notify(SessionNotice::NarrationFinished { signal });

        let delay = self.settings.caption_clear_delay();
        let tx = self.events_tx.clone();
        self.delay_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ControllerEvent::BeginQuestions);
        }));
    }

    fn on_begin_questions(&mut self) {
        if self.state != SessionState::Narrating || !self.narration_done {
            debug!("Ignoring stale begin-questions event in {:?}", self.state);
            return;
        }
        self.captions.clear();
        self.notify(SessionNotice::CaptionsUpdated { segments: Vec::new() });
        self.begin_question(0);
    }

    // Question loop

    fn begin_question(&mut self, index: usize) {
        let total = self.scene.question_count();
        let Some(question) = self.scene.adaptive_questions.get(index).cloned() else {
            info!("🏁 All {} questions answered", total);
            self.finalize();
            return;
        };

        self.solve_secs = self.settings.solve_secs_for(question.expected_solve_time);
        self.state = SessionState::QuestionActive { index };
        self.question_started_at = Instant::now();
        self.timer.arm(self.solve_secs, self.events_tx.clone(), ControllerEvent::Timer);

        info!(
            "❓ Question {}/{} [{}] '{}' ({}s)",
            index + 1,
            total,
            self.difficulty,
            question.question.chars().take(50).collect::<String>(),
            self.solve_secs
        );
        self.notify(SessionNotice::QuestionStarted {
            index,
            total,
            question,
            difficulty: self.difficulty,
            solve_secs: self.solve_secs,
        });
    }

    fn on_timer(&mut self, event: TimerEvent) {
        let SessionState::QuestionActive { index } = self.state else {
            debug!("Ignoring timer #{} outside an active question", event.timer_id);
            return;
        };
        if self.timer.active_id() != Some(event.timer_id) {
            debug!("Ignoring stale timer #{}", event.timer_id);
            return;
        }

        match event.kind {
            TimerEventKind::Tick { remaining_secs } => {
                self.notify(SessionNotice::TimerTick { index, remaining_secs });
            }
            TimerEventKind::Expired => {
                info!("⏰ Time is up for question {}", index + 1);
                self.timer.cancel();
                self.accept_answer(index, None, u64::from(self.solve_secs) * 1000);
            }
        }
    }

    fn on_select_answer(&mut self, option: usize) {
        let SessionState::QuestionActive { index } = self.state else {
            debug!("Ignoring answer {} in {:?}", option, self.state);
            return;
        };
        let options = self.scene.adaptive_questions[index].options.len();
        if option >= options {
            warn!("Ignoring option {} for question {} with {} options", option, index + 1, options);
            return;
        }

        self.timer.cancel();
        let elapsed_ms = self.question_started_at.elapsed().as_millis() as u64;
        self.accept_answer(index, Some(option), elapsed_ms);
    }

    /// The single accepted answer for `index`
    fn accept_answer(&mut self, index: usize, chosen_option: Option<usize>, elapsed_ms: u64) {
        let question = &self.scene.adaptive_questions[index];
        let answer = AnswerEvent {
            question_index: index,
            chosen_option,
            elapsed_ms,
            confidence: None,
        };
        let is_correct = question.is_correct(chosen_option);

        self.profile.absorb(is_correct, answer.elapsed_seconds());
        self.difficulty = difficulty_for(self.profile.profile());
        self.analytics.record(index, is_correct, elapsed_ms, None, question.trickiness);
        self.profile.set_learning_velocity(self.analytics.learning_velocity_slope);
        if !is_correct {
            if let Some(tag) = question.misconception_type.as_deref() {
                self.profile.note_misconception(tag);
            }
        }

        let feedback = AnswerFeedback::new(question, &answer);
        let micro = (!is_correct && self.analytics.needs_micro_explanation())
            .then(|| micro_explanation(question));
        self.answers.push(answer);
        self.state = SessionState::AwaitingConfidence {
            index,
            confidence: None,
        };

        info!(
            "{} Question {} {} in {:.1}s, streak {}, next difficulty {}",
            if is_correct { "✅" } else { "❌" },
            index + 1,
            match (is_correct, chosen_option) {
                (true, _) => "correct",
                (false, None) => "timed out",
                (false, Some(_)) => "wrong",
            },
            elapsed_ms as f64 / 1000.0,
            self.profile.profile().streak,
            self.difficulty
        );
        self.notify(SessionNotice::AnswerEvaluated {
            feedback,
            difficulty: self.difficulty,
            profile: self.profile.snapshot(),
        });

        if let Some(text) = micro {
            info!(
                "💡 {} wrong in a row, showing micro-explanation",
                self.analytics.consecutive_wrong
            );
            self.notify(SessionNotice::MicroExplanation { index, text });
        }
    }

    fn on_confidence(&mut self, value: u8) {
        let SessionState::AwaitingConfidence { index, confidence: None } = self.state else {
            debug!("Ignoring confidence {} in {:?}", value, self.state);
            return;
        };
        let value = value.min(100);

        self.state = SessionState::AwaitingConfidence {
            index,
            confidence: Some(value),
        };
        self.profile.absorb_confidence(value);
        self.analytics.record_confidence(value);
        if let Some(answer) = self.answers.last_mut() {
            answer.confidence = Some(value);
        }

        let is_correct = self
            .analytics
            .question_log
            .last()
            .map_or(false, |r| r.correct);
        let insight = CalibrationInsight::evaluate(is_correct, value);
        if let Some(insight) = insight {
            info!("{}", insight.message());
        }
        self.notify(SessionNotice::ConfidenceRecorded {
            index,
            confidence: value,
            insight,
            guess_probability: self.analytics.guess_probability,
        });

        let delay = self.settings.feedback_display_delay();
        let tx = self.events_tx.clone();
        let next_index = index + 1;
        self.delay_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ControllerEvent::Advance { next_index });
        }));
    }

    fn on_advance(&mut self, next_index: usize) {
        match self.state {
            SessionState::AwaitingConfidence {
                index,
                confidence: Some(_),
            } if index + 1 == next_index => self.begin_question(next_index),
            _ => debug!("Ignoring stale advance to {} in {:?}", next_index, self.state),
        }
    }

    // Report

    fn finalize(&mut self) {
        self.state = SessionState::Finalizing;
        self.timer.cancel();

        let profile = self.profile.snapshot();
        let topic = self.topic.clone();
        let reports = self.reports.clone();
        let limit = self.settings.report_timeout();
        let tx = self.events_tx.clone();

        info!(
            "📊 Requesting report for '{}' (accuracy {}%, {} answered)",
            topic, profile.accuracy, profile.total_questions
        );
        self.notify(SessionNotice::ReportRequested { topic: topic.clone() });

        self.report_task = Some(tokio::spawn(async move {
            let request = reports.generate_report(&profile, &topic);
            let result = match tokio::time::timeout(limit, request).await {
                Ok(result) => result,
                Err(_) => Err(ReportError::TimedOut(limit)),
            };
            let _ = tx.send(ControllerEvent::ReportReady(result));
        }));
    }

    fn on_report(&mut self, result: Result<IntelligenceReport, ReportError>) -> Flow {
        if self.state != SessionState::Finalizing {
            debug!("Ignoring report outside finalizing state");
            return Flow::Continue;
        }

        let (report, fallback) = match result {
            Ok(report) => (report, false),
            Err(e) => {
                warn!("⚠️ Report generation failed, using fallback report: {}", e);
                (IntelligenceReport::fallback(), true)
            }
        };
        info!(
            "🎓 Session {} complete: score {}, {}",
            self.session_id,
            report.overall_score,
            report.readiness_prediction.as_str()
        );

        self.state = SessionState::Complete;
        self.used_fallback = fallback;
        self.report = Some(report.clone());
        self.notify(SessionNotice::SessionComplete { report, fallback });
        Flow::Stop
    }

    fn notify(&self, notice: SessionNotice) {
        let _ = self.notices.send(notice);
    }

    fn outcome(&self) -> SessionOutcome {
        SessionOutcome {
            session_id: self.session_id,
            topic: self.topic.clone(),
            final_state: self.state,
            profile: self.profile.snapshot(),
            analytics: self.analytics.clone(),
            answers: self.answers.clone(),
            report: self.report.clone(),
            used_fallback_report: self.used_fallback,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

impl Drop for AdaptiveSessionController {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn abort_task(task: &mut Option<JoinHandle<()>>) {
    if let Some(task) = task.take() {
        task.abort();
    }
}
