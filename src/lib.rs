pub mod caption_buffer;
pub mod config;
pub mod console;
pub mod content;
pub mod interview;
pub mod narration;
pub mod session;

pub use caption_buffer::{CaptionAccumulator, CaptionSegment, TechnicalVocabulary};
pub use config::TrainerConfig;
pub use content::{
    ContentError, ContentSource, FileContentSource, IntelligenceReport, Question, ReportError,
    ReportGenerator, SceneConfig, SubTopic,
};
pub use interview::{AdaptiveSessionController, Difficulty, SessionState, SkillProfile};
pub use narration::{NarrationEvent, NarrationSource, PacedNarrator};
pub use session::{
    prepare_session, NarrationSignal, SessionError, SessionHandle, SessionNotice, SessionOutcome,
};

use std::path::PathBuf;

use anyhow::Result;
use log::info;

/// Run the terminal trainer over a content directory
pub async fn run(content_dir: PathBuf, config: TrainerConfig) -> Result<()> {
    info!("AR Interview Trainer starting with content from {}", content_dir.display());
    console::run(content_dir, config).await
}
