//! Product subject extraction for comparisons and detail lookups
//!
//! A subject is a token naming a shoe line ("run", "speed" or "cloud" inside
//! the word), optionally followed by a "pro" model token. The appended token
//! is still scanned as a subject of its own.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Subject used when a comparison names nothing recognizable
pub const DEFAULT_SUBJECT: &str = "running shoes";

const SUBJECT_STEMS: [&str; 3] = ["run", "speed", "cloud"];

static LEAD_IN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:tell\s+me\s+about|show\s+me\s+details|the)\b").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn is_subject(word: &str) -> bool {
    SUBJECT_STEMS.iter().any(|stem| word.contains(stem))
}

/// All subjects in order of appearance
pub fn extract_subjects(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    let words: Vec<&str> = lower.unicode_words().collect();
    let mut subjects = Vec::new();

    for (i, word) in words.iter().enumerate() {
        if !is_subject(word) {
            continue;
        }
        let mut name = word.to_string();
        if let Some(next) = words.get(i + 1).filter(|w| w.contains("pro")) {
            name.push(' ');
            name.push_str(next);
        }
        subjects.push(name);
    }

    subjects
}

/// Subjects for a comparison, never empty
pub fn comparison_subjects(query: &str) -> Vec<String> {
    let subjects = extract_subjects(query);
    if subjects.is_empty() {
        vec![DEFAULT_SUBJECT.to_string()]
    } else {
        subjects
    }
}

/// Product name for a detail lookup
///
/// The first subject when there is one, otherwise the query with lead-in
/// phrases removed.
pub fn extract_subject(query: &str) -> String {
    if let Some(first) = extract_subjects(query).into_iter().next() {
        return first;
    }
    let stripped = LEAD_IN.replace_all(query, " ");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}
