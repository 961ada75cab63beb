use std::collections::VecDeque;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::CaptionSettings;

/// One line of the live transcript window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub id: u64,
    pub text: String,
    /// True when any word in the segment matched the technical vocabulary
    pub is_technical: bool,
    pub word_count: usize,
}

impl CaptionSegment {
    fn open(id: u64, word: &str, is_technical: bool) -> Self {
        Self {
            id,
            text: word.to_string(),
            is_technical,
            word_count: 1,
        }
    }

    fn append(&mut self, word: &str, is_technical: bool) {
        self.text.push(' ');
        self.text.push_str(word);
        self.is_technical |= is_technical;
        self.word_count += 1;
    }
}

/// Keyword matcher used to flag technical words in captions
#[derive(Debug, Clone, Default)]
pub struct TechnicalVocabulary {
    keywords: Vec<String>,
}

impl TechnicalVocabulary {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// A word is technical when it contains any keyword, ignoring case
    pub fn is_technical(&self, word: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let word = word.to_lowercase();
        self.keywords.iter().any(|k| word.contains(k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Folds narrated words into a bounded sliding window of caption segments
#[derive(Debug)]
pub struct CaptionAccumulator {
    segments: VecDeque<CaptionSegment>,
    next_id: u64,
    max_words_per_segment: usize,
    retained_segments: usize,
}

impl CaptionAccumulator {
    pub fn new(settings: &CaptionSettings) -> Self {
        let retained_segments = settings.retained_segments.max(1);
        Self {
            segments: VecDeque::with_capacity(retained_segments),
            next_id: 0,
            max_words_per_segment: settings.max_words_per_segment.max(1),
            retained_segments,
        }
    }

    /// Append one narrated word. A full segment or a word ending in `.` or `,`
    /// opens a new segment, and the oldest segments fall off the window.
    pub fn push(&mut self, word: &str, is_technical: bool) {
        let word = word.trim();
        if word.is_empty() {
            return;
        }

        let starts_segment = match self.segments.back() {
            None => true,
            Some(last) => {
                last.word_count >= self.max_words_per_segment
                    || word.ends_with('.')
                    || word.ends_with(',')
            }
        };

        if starts_segment {
            while self.segments.len() >= self.retained_segments {
                self.segments.pop_front();
            }
            let id = self.next_id;
            self.next_id += 1;
            self.segments.push_back(CaptionSegment::open(id, word, is_technical));
        } else if let Some(last) = self.segments.back_mut() {
            last.append(word, is_technical);
        }
    }

    pub fn segments(&self) -> Vec<CaptionSegment> {
        self.segments.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Drop every visible segment; ids keep increasing across clears
    pub fn clear(&mut self) {
        debug!("Clearing {} caption segments", self.segments.len());
        self.segments.clear();
    }
}
