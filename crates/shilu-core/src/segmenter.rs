/// Article segmenter for multi-article documents.
///
/// Articles are introduced by the marker `○`, optionally followed by a numeral
/// (`○`, `○1`, `○123`). Every marker occurrence opens a new article that runs up
/// to the next marker or the end of the document. Text in front of the first
/// marker becomes article 1 under a synthetic `○1 ` marker, so nothing is dropped.
///
/// The numeral is kept as part of the article text and otherwise ignored;
/// identifiers come from document order, not from the numerals.
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::model::SegmentedArticle;

/// The article marker glyph.
pub const ARTICLE_MARKER: &str = "○";

/// Boundary put in front of text that precedes the first explicit marker.
const PREAMBLE_MARKER: &str = "○1 ";

/// Split `text` into articles with ids `"{base}_{n}"`, where `base` is derived
/// from `document_name` by [`document_base_name`].
///
/// Empty or whitespace-only input yields no articles; input without any marker
/// yields exactly one.
pub fn segment_document(text: &str, document_name: &str) -> Vec<SegmentedArticle> {
    let marker_re = Regex::new(r"○\d*").expect("valid regex");

    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let markers: Vec<regex::Match<'_>> = marker_re.find_iter(text).collect();

    // (marker token, span content)
    let mut spans: Vec<(&str, &str)> = Vec::with_capacity(markers.len() + 1);

    let first_marker = markers.first().map(|m| m.start()).unwrap_or(text.len());
    let preamble = &text[..first_marker];
    if !preamble.trim().is_empty() {
        spans.push((PREAMBLE_MARKER, preamble));
    }

    for (i, marker) in markers.iter().enumerate() {
        let end = markers
            .get(i + 1)
            .map(|next| next.start())
            .unwrap_or(text.len());
        spans.push((marker.as_str(), &text[marker.end()..end]));
    }

    let base = document_base_name(document_name);
    let articles: Vec<SegmentedArticle> = spans
        .into_iter()
        .enumerate()
        .map(|(i, (marker, content))| SegmentedArticle {
            article_id: format!("{base}_{}", i + 1),
            original_text: format!("{marker}{content}").trim().to_string(),
        })
        .collect();

    debug!(
        document = document_name,
        markers = markers.len(),
        articles = articles.len(),
        "document segmented"
    );

    articles
}

/// The identifier stem for a document: its file name up to the first `.`.
///
/// - `"/data/卷一.txt"` → `"卷一"`
/// - `"doc"` → `"doc"`
/// - `"archive.2024.txt"` → `"archive"`
pub fn document_base_name(document_name: &str) -> String {
    let file_name = Path::new(document_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(document_name);

    match file_name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ if !file_name.is_empty() => file_name.to_string(),
        _ => "document".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(articles: &[SegmentedArticle]) -> Vec<&str> {
        articles.iter().map(|a| a.original_text.as_str()).collect()
    }

    #[test]
    fn test_numbered_markers_on_one_line() {
        let articles = segment_document("○1前言 ○2正文甲 ○3正文乙", "doc");
        assert_eq!(articles.len(), 3);

        let ids: Vec<&str> = articles.iter().map(|a| a.article_id.as_str()).collect();
        assert_eq!(ids, ["doc_1", "doc_2", "doc_3"]);
        assert_eq!(texts(&articles), ["○1前言", "○2正文甲", "○3正文乙"]);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let doc = "卷首说明\n○1直隶总督奏报被灾。\n○2谕内阁。\n○上谕。";
        assert_eq!(segment_document(doc, "doc"), segment_document(doc, "doc"));
    }

    #[test]
    fn test_no_marker_yields_single_article() {
        let articles = segment_document("  谕内阁：直隶被灾，著加恩抚恤。\n", "卷一.txt");
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].article_id, "卷一_1");
        assert_eq!(articles[0].original_text, "○1 谕内阁：直隶被灾，著加恩抚恤。");
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        assert!(segment_document("", "doc").is_empty());
        assert!(segment_document(" \n\t \n", "doc").is_empty());
    }

    #[test]
    fn test_preamble_becomes_first_article() {
        let articles = segment_document("卷首说明\n○1第一条\n○2第二条", "doc");
        assert_eq!(texts(&articles), ["○1 卷首说明", "○1第一条", "○2第二条"]);
        assert_eq!(articles[2].article_id, "doc_3");
    }

    #[test]
    fn test_markers_with_and_without_numerals() {
        let articles = segment_document("○甲条\n○12 乙条\n○丙条", "doc");
        assert_eq!(texts(&articles), ["○甲条", "○12 乙条", "○丙条"]);
    }

    #[test]
    fn test_malformed_numerals_are_kept_as_text() {
        let articles = segment_document("○1a2 条文\n○００3条文", "doc");
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].original_text, "○1a2 条文");
        assert!(articles[1].original_text.starts_with('○'));
    }

    #[test]
    fn test_multiline_article_text_is_preserved() {
        let articles = segment_document("○1第一行\n第二行\n\n○2下一条", "doc");
        assert_eq!(articles[0].original_text, "○1第一行\n第二行");
    }

    #[test]
    fn test_document_base_name() {
        assert_eq!(document_base_name("doc"), "doc");
        assert_eq!(document_base_name("/data/卷一.txt"), "卷一");
        assert_eq!(document_base_name("archive.2024.txt"), "archive");
        assert_eq!(document_base_name(".hidden"), ".hidden");
        assert_eq!(document_base_name(""), "document");
    }
}
