use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::caption_buffer::CaptionSegment;
use crate::config::TrainerConfig;
use crate::content::{ContentSource, FileContentSource, SubTopic};
use crate::narration::PacedNarrator;
use crate::session::{prepare_session, SessionError, SessionHandle, SessionNotice, SessionOutcome};

/// Optional lesson text shown to the content source
pub const LESSON_FILE: &str = "lesson.txt";

const OPTION_LETTERS: &[char] = &['A', 'B', 'C', 'D', 'E', 'F'];

/// What typed input currently means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prompt {
    Idle,
    Answer { options: usize },
    Confidence,
}

/// Interactive terminal trainer over a directory of recorded content
pub async fn run(content_dir: PathBuf, config: TrainerConfig) -> Result<()> {
    let source = Arc::new(FileContentSource::new(content_dir.clone()));
    let lesson = tokio::fs::read_to_string(content_dir.join(LESSON_FILE))
        .await
        .unwrap_or_default();

    let topics = source
        .analyze_lesson(&lesson)
        .await
        .with_context(|| format!("Failed to load topics from {}", content_dir.display()))?;
    info!("📚 {} topics available", topics.len());

    let mut lines = spawn_stdin_reader();

    loop {
        println!("\n=== AR Interview Trainer ===");
        for (i, topic) in topics.iter().enumerate() {
            println!("  {}. {} - {}", i + 1, topic.title, topic.description);
        }
        println!("Pick a topic number (q to quit):");

        let Some(line) = lines.recv().await else {
            return Ok(());
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            println!("👋 Bye");
            return Ok(());
        }
        let Some(topic) = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| topics.get(i))
        else {
            println!("Unknown topic '{}'", line);
            continue;
        };

        match run_session(topic, &config, source.clone(), &mut lines).await {
            Ok(outcome) => print_summary(&outcome),
            Err(SessionError::Content(e)) => {
                error!("❌ Could not start '{}': {}", topic.title, e);
                println!("⚠️ Could not load this topic: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn spawn_stdin_reader() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut reader = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run_session(
    topic: &SubTopic,
    config: &TrainerConfig,
    source: Arc<FileContentSource>,
    lines: &mut UnboundedReceiver<String>,
) -> Result<SessionOutcome, SessionError> {
    let narrator = Arc::new(PacedNarrator::new(config.narration.words_per_second));
    let (controller, handle, mut notices) =
        prepare_session(source.as_ref(), topic, config, narrator, source.clone()).await?;
    let session = tokio::spawn(controller.run());

    let mut prompt = Prompt::Idle;
    let mut captions = CaptionPrinter::default();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Some(notice) => prompt = render(&notice, prompt, &mut captions),
                None => break,
            },
            line = lines.recv(), if stdin_open => match line {
                Some(line) => handle_input(&handle, prompt, line.trim()),
                None => {
                    stdin_open = false;
                    let _ = handle.exit();
                }
            },
        }
    }

    session.await.map_err(|e| {
        error!("Session task failed: {}", e);
        SessionError::Closed
    })
}

fn handle_input(handle: &SessionHandle, prompt: Prompt, input: &str) {
    if input.eq_ignore_ascii_case("q") {
        let _ = handle.exit();
        return;
    }
    match prompt {
        Prompt::Answer { options } => {
            let choice = input
                .chars()
                .next()
                .map(|c| c.to_ascii_uppercase())
                .and_then(|c| OPTION_LETTERS.iter().position(|l| *l == c))
                .filter(|i| *i < options);
            match choice {
                Some(i) => {
                    let _ = handle.select_answer(i);
                }
                None => println!("Type one of {}", letters(options)),
            }
        }
        Prompt::Confidence => match input.parse::<u16>() {
            Ok(value) => {
                let _ = handle.submit_confidence(value.min(100) as u8);
            }
            Err(_) => println!("Confidence is a number from 0 to 100"),
        },
        Prompt::Idle => {}
    }
}

fn letters(options: usize) -> String {
    OPTION_LETTERS
        .iter()
        .take(options)
        .map(char::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

/// Prints caption segments once they are closed
#[derive(Default)]
struct CaptionPrinter {
    printed_up_to: Option<u64>,
    open: Option<CaptionSegment>,
}

impl CaptionPrinter {
    fn update(&mut self, segments: &[CaptionSegment]) {
        let Some((open, closed)) = segments.split_last() else {
            self.flush();
            return;
        };
        for segment in closed {
            self.print(segment);
        }
        if self.open.as_ref().map(|s| s.id) != Some(open.id) {
            if let Some(previous) = self.open.take() {
                self.print(&previous);
            }
        }
        self.open = Some(open.clone());
    }

    fn flush(&mut self) {
        if let Some(open) = self.open.take() {
            self.print(&open);
        }
    }

    fn print(&mut self, segment: &CaptionSegment) {
        if self.printed_up_to.map_or(false, |id| segment.id <= id) {
            return;
        }
        self.printed_up_to = Some(segment.id);
        let marker = if segment.is_technical { "🔬" } else { "  " };
        println!("  {} {}", marker, segment.text);
    }
}

fn render(notice: &SessionNotice, prompt: Prompt, captions: &mut CaptionPrinter) -> Prompt {
    match notice {
        SessionNotice::SessionStarted { topic, total_questions, .. } => {
            println!(
                "\n🎬 {} ({} questions). Type q at any time to leave.",
                topic, total_questions
            );
            prompt
        }
        SessionNotice::NarrationStarted => {
            println!("🔊 Narration:");
            prompt
        }
        SessionNotice::CaptionsUpdated { segments } => {
            captions.update(segments);
            prompt
        }
        SessionNotice::NarrationFinished { .. } => {
            captions.flush();
            prompt
        }
        SessionNotice::QuestionStarted {
            index,
            total,
            question,
            difficulty,
            solve_secs,
        } => {
            println!(
                "\n❓ Question {}/{} [{}] ({}s)\n{}",
                index + 1,
                total,
                difficulty,
                solve_secs,
                question.question
            );
            for (letter, option) in OPTION_LETTERS.iter().zip(&question.options) {
                println!("   {}) {}", letter, option);
            }
            Prompt::Answer {
                options: question.options.len().min(OPTION_LETTERS.len()),
            }
        }
        SessionNotice::TimerTick { remaining_secs, .. } => {
            if *remaining_secs <= 5 || remaining_secs % 10 == 0 {
                println!("   ⏱️ {}s left", remaining_secs);
            }
            prompt
        }
        SessionNotice::AnswerEvaluated { feedback, .. } => {
            if feedback.timed_out {
                println!("⏰ Time is up!");
            }
            println!("{}", feedback.text());
            println!("How confident were you? (0-100)");
            Prompt::Confidence
        }
        SessionNotice::MicroExplanation { text, .. } => {
            println!("{}", text);
            prompt
        }
        SessionNotice::ConfidenceRecorded { insight, .. } => {
            if let Some(insight) = insight {
                println!("{}", insight.message());
            }
            Prompt::Idle
        }
        SessionNotice::ReportRequested { .. } => {
            println!("\n🧠 Generating intelligence report...");
            Prompt::Idle
        }
        SessionNotice::SessionComplete { report, fallback } => {
            println!("\n=== Intelligence Report{} ===", if *fallback { " (fallback)" } else { "" });
            println!("Overall score:   {}", report.overall_score);
            println!("Readiness:       {}", report.readiness_prediction.as_str());
            println!("Reasoning:       {}", report.readiness_reasoning);
            println!("Calibration:     {:?}", report.calibration_type);
            println!("Cognitive speed: {:?}", report.cognitive_speed);
            println!("Trick handling:  {}/10", report.trick_handling_ability);
            for (concept, strength) in &report.concept_strength_map {
                println!("  - {}: {:?}", concept, strength);
            }
            Prompt::Idle
        }
        SessionNotice::TornDown => Prompt::Idle,
    }
}

fn print_summary(outcome: &SessionOutcome) {
    let profile = &outcome.profile;
    println!("\n=== Session summary: {} ===", outcome.topic);
    println!("Answered:          {}", profile.total_questions);
    println!("Accuracy:          {}%", profile.accuracy);
    println!("Avg response time: {}s", profile.avg_response_time);
    println!("Final streak:      {}", profile.streak);
    println!("Learning velocity: {}", outcome.analytics.learning_velocity_slope);
    println!("Guess probability: {}%", outcome.analytics.guess_probability);
    if !profile.misconception_tags.is_empty() {
        println!("Misconceptions:    {}", profile.misconception_tags.join(", "));
    }
    if !outcome.completed() {
        println!("(session left before the report)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters() {
        assert_eq!(letters(3), "A/B/C");
        assert_eq!(letters(10), "A/B/C/D/E/F");
    }

    #[tokio::test]
    async fn test_answer_input_maps_letters() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(tx);

        handle_input(&handle, Prompt::Answer { options: 4 }, "c");
        handle_input(&handle, Prompt::Answer { options: 4 }, "E");
        handle_input(&handle, Prompt::Confidence, "250");
        handle_input(&handle, Prompt::Idle, "b");
        handle_input(&handle, Prompt::Idle, "Q");
        drop(handle);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(format!("{:?}", event));
        }
        assert_eq!(events, vec!["SelectAnswer(2)", "SubmitConfidence(100)", "Exit"]);
    }
}
