use std::sync::Arc;
use std::time::Duration;

use ar_trainer_lib::content::report::ReadinessPrediction;
use ar_trainer_lib::content::ConceptModel;
use ar_trainer_lib::interview::SkillProfile;
use ar_trainer_lib::{
    AdaptiveSessionController, Difficulty, IntelligenceReport, PacedNarrator, Question,
    ReportError, ReportGenerator, SceneConfig, SessionNotice, SessionState, SubTopic,
    TrainerConfig,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

/// Records the profile it was given and answers with a canned report
#[derive(Default)]
struct RecordingReports {
    seen: Mutex<Option<(SkillProfile, String)>>,
}

impl ReportGenerator for RecordingReports {
    fn generate_report<'a>(
        &'a self,
        profile: &'a SkillProfile,
        topic: &'a str,
    ) -> BoxFuture<'a, Result<IntelligenceReport, ReportError>> {
        async move {
            *self.seen.lock() = Some((profile.clone(), topic.to_string()));
            let mut report = IntelligenceReport::fallback();
            report.overall_score = 96.0;
            report.readiness_prediction = ReadinessPrediction::InterviewReady;
            report.readiness_reasoning = "Fast and accurate.".to_string();
            Ok(report)
        }
        .boxed()
    }
}

fn question(n: usize) -> Question {
    Question {
        id: format!("q{}", n),
        question: format!("Step {} of the cardiac cycle?", n),
        options: vec![
            "Atrial systole".to_string(),
            "Ventricular systole".to_string(),
            "Diastole".to_string(),
        ],
        correct_index: n % 3,
        difficulty: 5,
        trickiness: 5,
        concept_tag: "cardiac cycle".to_string(),
        expected_solve_time: 30,
        explanation: "Follow the pressure changes.".to_string(),
        misconception_type: None,
    }
}

fn scene() -> SceneConfig {
    SceneConfig {
        model_type: "Heart".to_string(),
        sketchfab_id: String::new(),
        intro_script: "The heart contracts in a fixed cycle. Atria fill the ventricles, \
                       ventricles eject blood, then the muscle relaxes."
            .to_string(),
        labels: Vec::new(),
        concept_model: ConceptModel::default(),
        adaptive_questions: (0..5).map(question).collect(),
        technical_keywords: vec!["ventricle".to_string(), "atri".to_string()],
    }
}

fn topic() -> SubTopic {
    SubTopic {
        id: 1,
        title: "Cardiac Cycle".to_string(),
        description: "Systole and diastole".to_string(),
        sketchfab_id: None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_five_correct_answers_end_to_end() {
    let config = TrainerConfig::default();
    let reports = Arc::new(RecordingReports::default());
    let (controller, handle, mut notices) = AdaptiveSessionController::new(
        &topic(),
        scene(),
        &config,
        Arc::new(PacedNarrator::new(config.narration.words_per_second)),
        reports.clone(),
    );
    let session = tokio::spawn(controller.run());

    let mut difficulties = Vec::new();
    let mut questions_started = Vec::new();
    let mut caption_updates = 0;
    let mut report = None;

    while let Some(notice) = notices.recv().await {
        match notice {
            SessionNotice::CaptionsUpdated { segments } => {
                assert!(segments.len() <= 4);
                assert!(segments.iter().all(|s| s.word_count <= 8));
                caption_updates += 1;
            }
            SessionNotice::QuestionStarted { index, question, .. } => {
                questions_started.push(index);
                // answer after two seconds, well within the 30s limit
                tokio::time::sleep(Duration::from_secs(2)).await;
                handle.select_answer(question.correct_index).unwrap();
            }
            SessionNotice::AnswerEvaluated {
                feedback,
                difficulty,
                ..
            } => {
                assert!(feedback.is_correct);
                difficulties.push(difficulty);
                handle.submit_confidence(90).unwrap();
            }
            SessionNotice::SessionComplete { report: r, fallback } => {
                assert!(!fallback);
                report = Some(r);
            }
            _ => {}
        }
    }

    let outcome = session.await.unwrap();

    assert!(caption_updates > 0);
    assert_eq!(questions_started, vec![0, 1, 2, 3, 4]);
    assert_eq!(
        difficulties,
        vec![
            Difficulty::Medium,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Hard,
            Difficulty::Hard,
        ]
    );

    assert_eq!(outcome.final_state, SessionState::Complete);
    assert_eq!(outcome.profile.streak, 5);
    assert_eq!(outcome.profile.accuracy, 100);
    assert_eq!(outcome.profile.total_questions, 5);
    assert_eq!(outcome.profile.confidence_history, vec![90; 5]);
    assert_eq!(outcome.profile.avg_response_time, 2.0);
    assert_eq!(outcome.analytics.len(), 5);
    assert_eq!(outcome.analytics.guess_probability, 0);
    // correct positions 1..=5 -> (5 - 1) / 5
    assert_eq!(outcome.analytics.learning_velocity_slope, 0.8);
    assert_eq!(outcome.profile.learning_velocity, 0.8);

    let report = report.expect("report notice");
    assert_eq!(report.readiness_prediction, ReadinessPrediction::InterviewReady);
    assert_eq!(outcome.report, Some(report));

    let (profile, topic) = reports.seen.lock().clone().expect("report generator was called");
    assert_eq!(topic, "Cardiac Cycle");
    assert_eq!(profile.total_questions, 5);
}

#[tokio::test(start_paused = true)]
async fn test_total_answered_matches_analytics_on_mixed_session() {
    let config = TrainerConfig::default();
    let (controller, handle, mut notices) = AdaptiveSessionController::new(
        &topic(),
        scene(),
        &config,
        Arc::new(PacedNarrator::new(10.0)),
        Arc::new(RecordingReports::default()),
    );
    let session = tokio::spawn(controller.run());

    let mut streaks = Vec::new();
    while let Some(notice) = notices.recv().await {
        match notice {
            SessionNotice::QuestionStarted { index, question, .. } => {
                // wrong on the second question, time out on the fourth
                match index {
                    1 => handle.select_answer((question.correct_index + 1) % 3).unwrap(),
                    3 => {}
                    _ => handle.select_answer(question.correct_index).unwrap(),
                }
            }
            SessionNotice::AnswerEvaluated { profile, .. } => {
                assert!(profile.confidence_history.len() <= profile.total_questions as usize);
                streaks.push(profile.streak);
                handle.submit_confidence(50).unwrap();
            }
            _ => {}
        }
    }

    let outcome = session.await.unwrap();
    assert_eq!(streaks, vec![1, 0, 1, 0, 1]);
    assert_eq!(outcome.profile.total_questions as usize, outcome.analytics.len());
    assert_eq!(outcome.profile.accuracy, 60);
    assert!(outcome.answers[3].chosen_option.is_none());
    assert_eq!(outcome.answers[3].elapsed_ms, 30_000);
}
