//! Story text segmentation.
//!
//! Splits free-form story text into ordered, 1-indexed scene units on
//! runs of sentence-terminal punctuation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Pattern matching one or more consecutive sentence terminators.
pub const SENTENCE_BREAK_PATTERN: &str = r"[.!?]+";

/// Compiled sentence-break regex. Compiled once, reused forever.
static SENTENCE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SENTENCE_BREAK_PATTERN).expect("valid regex"));

/// One scene of a story: its 1-based position and its sentence text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneUnit {
    pub index: u32,
    pub text: String,
}

/// Split `text` into scene units.
///
/// - Fragments are trimmed; empty and whitespace-only fragments are dropped.
/// - If no fragment survives, the trimmed input becomes the single scene.
/// - `max_scenes` keeps only the first N fragments. `Some(0)` means no limit.
///
/// # Examples
///
/// ```
/// use illustrator_core::segment::segment_story;
///
/// let scenes = segment_story("A boy finds a dragon. The dragon is friendly!", None);
/// assert_eq!(scenes.len(), 2);
/// assert_eq!(scenes[1].text, "The dragon is friendly");
/// ```
pub fn segment_story(text: &str, max_scenes: Option<usize>) -> Vec<SceneUnit> {
    let mut fragments: Vec<&str> = SENTENCE_BREAK_RE
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if fragments.is_empty() {
        fragments.push(text.trim());
    }

    if let Some(limit) = max_scenes.filter(|&n| n > 0) {
        fragments.truncate(limit);
    }

    fragments
        .into_iter()
        .enumerate()
        .map(|(i, fragment)| SceneUnit {
            index: i as u32 + 1,
            text: fragment.to_string(),
        })
        .collect()
}

/// Convenience wrapper returning only the sentence strings.
pub fn story_sentences(text: &str, max_scenes: Option<usize>) -> Vec<String> {
    segment_story(text, max_scenes)
        .into_iter()
        .map(|unit| unit.text)
        .collect()
}
