use std::time::Duration;

use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, info};

/// Events emitted while a script is being spoken
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationEvent {
    Started,
    /// A word is about to be spoken; offsets are in characters of the script
    WordBoundary {
        word: String,
        char_index: usize,
        char_length: usize,
    },
    Ended,
    Failed(String),
}

impl NarrationEvent {
    /// Both a clean end and a failure finish the narration
    pub fn is_terminal(&self) -> bool {
        matches!(self, NarrationEvent::Ended | NarrationEvent::Failed(_))
    }
}

/// Speech output boundary. Implementations emit `Started`, word boundaries in
/// order, then exactly one `Ended` or `Failed`.
pub trait NarrationSource: Send + Sync {
    fn narrate(&self, script: &str) -> BoxStream<'static, NarrationEvent>;
}

/// Character offset and length of every whitespace separated word
pub fn word_boundaries(script: &str) -> Vec<(usize, usize)> {
    let mut boundaries = Vec::new();
    let mut start: Option<usize> = None;
    let mut index = 0;

    for c in script.chars() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                boundaries.push((s, index - s));
            }
        } else if start.is_none() {
            start = Some(index);
        }
        index += 1;
    }
    if let Some(s) = start {
        boundaries.push((s, index - s));
    }
    boundaries
}

/// Extract the word a boundary event points at
pub fn word_at(script: &str, char_index: usize, char_length: usize) -> String {
    script.chars().skip(char_index).take(char_length).collect()
}

pub fn word_count(script: &str) -> usize {
    script.split_whitespace().count()
}

/// Narrator that "speaks" by pacing word boundaries on the Tokio clock
#[derive(Debug, Clone)]
pub struct PacedNarrator {
    word_interval: Duration,
}

impl PacedNarrator {
    pub fn new(words_per_second: f64) -> Self {
        let wps = if words_per_second > 0.0 { words_per_second } else { 2.4 };
        Self {
            word_interval: Duration::from_secs_f64(1.0 / wps),
        }
    }

    pub fn word_interval(&self) -> Duration {
        self.word_interval
    }
}

impl NarrationSource for PacedNarrator {
    fn narrate(&self, script: &str) -> BoxStream<'static, NarrationEvent> {
        let script = script.to_string();
        let interval = self.word_interval;
        info!("🔊 Narrating {} words", word_count(&script));

        stream! {
            yield NarrationEvent::Started;
            for (char_index, char_length) in word_boundaries(&script) {
                tokio::time::sleep(interval).await;
                yield NarrationEvent::WordBoundary {
                    word: word_at(&script, char_index, char_length),
                    char_index,
                    char_length,
                };
            }
            tokio::time::sleep(interval).await;
            debug!("Narration finished");
            yield NarrationEvent::Ended;
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_boundaries_use_char_offsets() {
        let script = "  Mitochondria  produce ATP.\nCafé energy";
        let boundaries = word_boundaries(script);
        assert_eq!(boundaries, vec![(2, 12), (16, 7), (24, 4), (29, 4), (34, 6)]);
        assert_eq!(word_at(script, 24, 4), "ATP.");
        assert_eq!(word_at(script, 29, 4), "Café");
        assert_eq!(word_count(script), 5);
    }

    #[test]
    fn test_empty_script_has_no_words() {
        assert!(word_boundaries("   ").is_empty());
        assert_eq!(word_count(""), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_narrator_emits_ordered_events() {
        let narrator = PacedNarrator::new(2.0);
        assert_eq!(narrator.word_interval(), Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        let events: Vec<NarrationEvent> = narrator.narrate("cells divide fast").collect().await;

        assert_eq!(events.len(), 5);
        assert_eq!(events[0], NarrationEvent::Started);
        assert_eq!(
            events[2],
            NarrationEvent::WordBoundary {
                word: "divide".to_string(),
                char_index: 6,
                char_length: 6,
            }
        );
        assert!(events[4].is_terminal());
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
