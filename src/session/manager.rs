use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::mpsc::UnboundedReceiver;

use super::{Result, SessionHandle, SessionNotice};
use crate::config::TrainerConfig;
use crate::content::{ContentSource, ReportGenerator, SceneConfig, SubTopic};
use crate::interview::engine::AdaptiveSessionController;
use crate::narration::NarrationSource;

/// Fetch and validate the scene for a topic. Any content failure aborts the
/// session before a controller exists, so no partial state is left behind.
pub async fn load_scene(
    source: &dyn ContentSource,
    topic: &SubTopic,
    config: &TrainerConfig,
) -> Result<SceneConfig> {
    info!("🧩 Preparing scene for topic {} '{}'", topic.id, topic.title);

    let scene = source.scene_config(topic).await.map_err(|e| {
        error!("❌ Scene generation failed for '{}': {}", topic.title, e);
        e
    })?;

    let expected = config.session.expected_questions;
    if expected > 0 && scene.question_count() != expected {
        warn!(
            "Scene for '{}' has {} questions, expected {}",
            topic.title,
            scene.question_count(),
            expected
        );
    }
    Ok(scene)
}

/// Load the scene and build a controller ready to `run()`
pub async fn prepare_session(
    source: &dyn ContentSource,
    topic: &SubTopic,
    config: &TrainerConfig,
    narrator: Arc<dyn NarrationSource>,
    reports: Arc<dyn ReportGenerator>,
) -> Result<(AdaptiveSessionController, SessionHandle, UnboundedReceiver<SessionNotice>)> {
    let scene = load_scene(source, topic, config).await?;
    Ok(AdaptiveSessionController::new(topic, scene, config, narrator, reports))
}
