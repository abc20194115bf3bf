//! Output filename conventions.
//!
//! Generates deterministic filenames for generated images based on call
//! type and scene index or demographic label, and validates filenames
//! requested back over HTTP.

/// Extension of every image written by the pipeline.
pub const IMAGE_EXTENSION: &str = "png";

/// `story_scene_{index}.png`
///
/// # Examples
///
/// ```
/// use illustrator_core::naming::scene_filename;
///
/// assert_eq!(scene_filename(3), "story_scene_3.png");
/// ```
pub fn scene_filename(index: u32) -> String {
    format!("story_scene_{index}.{IMAGE_EXTENSION}")
}

/// `style_transfer_{timestamp}_{index}.png`
pub fn style_filename(timestamp: i64, index: u32) -> String {
    format!("style_transfer_{timestamp}_{index}.{IMAGE_EXTENSION}")
}

/// `bias_{attribute}_{sanitized_label}_{replicate}.png`
///
/// # Examples
///
/// ```
/// use illustrator_core::naming::bias_filename;
///
/// assert_eq!(bias_filename("gender", "a non-binary person", 2), "bias_gender_anonbinaryperson_2.png");
/// ```
pub fn bias_filename(attribute: &str, label: &str, replicate: u32) -> String {
    format!(
        "bias_{attribute}_{}_{replicate}.{IMAGE_EXTENSION}",
        sanitize_label(label)
    )
}

/// Keep only ASCII alphanumeric characters.
pub fn sanitize_label(label: &str) -> String {
    label.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Whether `segment` is safe to use as a single path component under the
/// output directory.
///
/// Accepts `[A-Za-z0-9_-]+` optionally followed by one `.ext` of ASCII
/// alphanumerics. Rejects separators, `..`, hidden files, and empty input.
pub fn is_safe_path_segment(segment: &str) -> bool {
    let (stem, ext) = match segment.split_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (segment, None),
    };

    let stem_ok = !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    let ext_ok = match ext {
        None => true,
        Some(e) => !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()),
    };

    stem_ok && ext_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_names() {
        assert_eq!(scene_filename(1), "story_scene_1.png");
        assert_eq!(scene_filename(12), "story_scene_12.png");
    }

    #[test]
    fn style_names() {
        assert_eq!(style_filename(1_700_000_000, 4), "style_transfer_1700000000_4.png");
    }

    #[test]
    fn bias_names_strip_non_alphanumerics() {
        assert_eq!(bias_filename("gender", "a man", 1), "bias_gender_aman_1.png");
        assert_eq!(
            bias_filename("age", "a middle-aged person", 3),
            "bias_age_amiddleagedperson_3.png"
        );
    }

    #[test]
    fn sanitize_drops_unicode_and_punctuation() {
        assert_eq!(sanitize_label("Zoë's (café)!"), "Zoscaf");
    }

    #[test]
    fn safe_segments() {
        assert!(is_safe_path_segment("story_scene_1.png"));
        assert!(is_safe_path_segment("0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b"));
    }

    #[test]
    fn unsafe_segments() {
        assert!(!is_safe_path_segment(""));
        assert!(!is_safe_path_segment(".."));
        assert!(!is_safe_path_segment(".env"));
        assert!(!is_safe_path_segment("../secret.png"));
        assert!(!is_safe_path_segment("a/b.png"));
        assert!(!is_safe_path_segment("a\\b.png"));
        assert!(!is_safe_path_segment("file.tar.gz"));
        assert!(!is_safe_path_segment("file."));
    }
}
