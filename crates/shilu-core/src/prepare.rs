/// Corpus preparation helpers for raw article listings.
///
/// These work on whole texts, one article per line, and never touch the
/// classified store.
use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;
use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::UnicodeNormalization;

use crate::segmenter::ARTICLE_MARKER;

/// Outcome of [`clean_corpus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CleanedCorpus {
    pub lines: Vec<String>,
    /// Non-empty input lines.
    pub raw_count: usize,
    pub duplicate_count: usize,
}

/// Strips article numbering from a line, leaving a single leading `○`.
///
/// `"○1○123  文本"` → `"○文本"`, `"123 文本"` → `"○123 文本"`.
struct LineCleaner {
    numbered: Regex,
    repeated: Regex,
}

impl LineCleaner {
    fn new() -> Self {
        Self {
            numbered: Regex::new(r"○\d+").expect("valid regex"),
            repeated: Regex::new(r"○+").expect("valid regex"),
        }
    }

    fn clean(&self, line: &str) -> String {
        let line = self.numbered.replace_all(line.trim_start(), "");
        let line = self.repeated.replace_all(&line, ARTICLE_MARKER);
        let line = line.trim();

        if line.starts_with(ARTICLE_MARKER) {
            line.to_string()
        } else {
            format!("{ARTICLE_MARKER}{line}")
        }
    }
}

/// Comparison key for duplicate detection.
///
/// Drops every "other" character (control, format, private use, unassigned),
/// then applies NFKC, which also folds full-width ASCII and the ideographic space.
pub fn normalize_for_dedup(line: &str) -> String {
    line.trim()
        .chars()
        .filter(|c| !is_other(*c))
        .nfkc()
        .collect()
}

fn is_other(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
    )
}

/// Clean every non-empty line and drop later duplicates by normalized key.
pub fn clean_corpus(text: &str) -> CleanedCorpus {
    let cleaner = LineCleaner::new();
    let cleaned: Vec<String> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| cleaner.clean(l))
        .collect();
    let raw_count = cleaned.len();

    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(raw_count);
    for line in cleaned {
        if seen.insert(normalize_for_dedup(&line)) {
            lines.push(line);
        }
    }
    let duplicate_count = raw_count - lines.len();

    info!(
        raw = raw_count,
        duplicates = duplicate_count,
        kept = lines.len(),
        "corpus cleaned"
    );

    CleanedCorpus {
        lines,
        raw_count,
        duplicate_count,
    }
}

/// Prefix each non-empty line with `○{n}`, n counting from 1. Blank lines stay
/// blank and are not counted. Surrounding whitespace of numbered lines is
/// trimmed.
pub fn number_lines(text: &str) -> String {
    let mut n = 0usize;
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            n += 1;
            out.push_str(ARTICLE_MARKER);
            out.push_str(&n.to_string());
            out.push_str(trimmed);
        }
        out.push('\n');
    }
    out
}

/// Lines whose leading `○<n>` falls within `start..=end`, unchanged.
///
/// Lines are assumed to be numbered in ascending order: scanning stops at the
/// first number past `end`. Unnumbered lines are skipped.
pub fn extract_range(text: &str, start: u64, end: u64) -> Vec<String> {
    let leading = Regex::new(r"^○(\d+)").expect("valid regex");

    let mut extracted = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        let Some(n) = leading
            .captures(trimmed)
            .and_then(|caps| caps[1].parse::<u64>().ok())
        else {
            continue;
        };

        if n > end {
            break;
        }
        if n >= start {
            extracted.push(line.trim_end().to_string());
        }
    }
    extracted
}

/// Default number of lines taken by [`random_draw`].
pub const DEFAULT_DRAW_COUNT: usize = 100;

/// Draw `count` lines at random from the non-empty lines of `text`, without
/// picking the same line twice. Trailing whitespace is trimmed.
///
/// `count` defaults to [`DEFAULT_DRAW_COUNT`] and is capped at the number of
/// available lines.
pub fn random_draw<R: Rng + ?Sized>(text: &str, count: Option<usize>, rng: &mut R) -> Vec<String> {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::trim_end)
        .collect();
    let count = count.unwrap_or(DEFAULT_DRAW_COUNT).min(lines.len());

    let drawn: Vec<String> = lines
        .choose_multiple(rng, count)
        .map(|l| l.to_string())
        .collect();

    info!(total = lines.len(), drawn = drawn.len(), "lines drawn");
    drawn
}
