use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use log::{info, warn};

use super::report::{IntelligenceReport, ReportError, ReportGenerator};
use super::{parse_sub_topics, ContentError, ContentSource, Result, SceneConfig, SubTopic};
use crate::interview::profile::SkillProfile;

pub const TOPICS_FILE: &str = "topics.json";
pub const SCENES_DIR: &str = "scenes";
pub const REPORT_FILE: &str = "report.json";

/// Replays recorded payloads from a directory:
/// `topics.json`, `scenes/<topic id>.json` and an optional `report.json`
#[derive(Debug, Clone)]
pub struct FileContentSource {
    root: PathBuf,
}

impl FileContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn scene_path(&self, topic: &SubTopic) -> PathBuf {
        self.root.join(SCENES_DIR).join(format!("{}.json", topic.id))
    }

    async fn read(path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

impl ContentSource for FileContentSource {
    fn analyze_lesson<'a>(&'a self, lesson: &'a str) -> BoxFuture<'a, Result<Vec<SubTopic>>> {
        async move {
            let path = self.root.join(TOPICS_FILE);
            info!(
                "📚 Replaying topic breakdown from {} ({} chars of lesson text)",
                path.display(),
                lesson.len()
            );
            let raw = Self::read(&path)
                .await
                .map_err(|source| ContentError::Io { path: path.clone(), source })?;
            parse_sub_topics(&raw)
        }
        .boxed()
    }

    fn scene_config<'a>(&'a self, topic: &'a SubTopic) -> BoxFuture<'a, Result<SceneConfig>> {
        async move {
            let path = self.scene_path(topic);
            info!("🎬 Loading scene for topic {} from {}", topic.id, path.display());
            let raw = Self::read(&path)
                .await
                .map_err(|source| ContentError::Io { path: path.clone(), source })?;
            SceneConfig::from_json(&raw, topic)
        }
        .boxed()
    }
}

impl ReportGenerator for FileContentSource {
    fn generate_report<'a>(
        &'a self,
        profile: &'a SkillProfile,
        topic: &'a str,
    ) -> BoxFuture<'a, std::result::Result<IntelligenceReport, ReportError>> {
        async move {
            let path = self.root.join(REPORT_FILE);
            info!(
                "📊 Report for '{}' requested (accuracy {}%, {} answered)",
                topic, profile.accuracy, profile.total_questions
            );
            match Self::read(&path).await {
                Ok(raw) => IntelligenceReport::from_json(&raw),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!("No recorded report at {}", path.display());
                    Err(ReportError::Unavailable(format!(
                        "no recorded report at {}",
                        path.display()
                    )))
                }
                Err(source) => Err(ReportError::Io { path, source }),
            }
        }
        .boxed()
    }
}
