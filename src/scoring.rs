//! Main-content selection.
//!
//! Every plausible body region of a page is turned into a
//! [`ContentCandidate`] and the largest one wins. Nothing short-circuits:
//! semantic tags, class-name guesses and paragraph density are all scored
//! side by side so the region that actually holds the most prose is chosen.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::types::{CandidateOrigin, ContentCandidate};

/// Class-name fragments that commonly wrap an article body. Matched as a
/// case-insensitive substring of the whole `class` attribute.
pub const CONTENT_CLASS_HINTS: &[&str] = &[
    "content",
    "post-content",
    "entry-content",
    "article-content",
    "blog-content",
    "post-body",
    "article-body",
    "blog-post",
    "post",
    "single-post",
    "main-content",
    "page-content",
];

/// Minimum number of `<p>` descendants for a container to count as a
/// paragraph cluster.
pub const MIN_CLUSTER_PARAGRAPHS: usize = 3;

const PARAGRAPH: &str = "p";
const BLOCK_CONTAINERS: &str = "div, section";

/// Elements that end a line when flattened to text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p",
    "pre", "section", "summary", "table", "td", "th", "tr", "ul",
];

/// Visible character count: every text node trimmed, then counted.
pub fn text_len(element: &ElementRef<'_>) -> usize {
    element.text().map(|t| t.trim().chars().count()).sum()
}

/// Flatten an element to text, breaking lines at block boundaries.
///
/// Whitespace inside inline text collapses to single spaces; `<pre>` keeps
/// its original layout.
pub fn block_text(element: &ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(element, false, &mut out);
    out
}

fn push_text(element: &ElementRef<'_>, in_pre: bool, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            let is_block = BLOCK_TAGS.contains(&name);
            if is_block {
                out.push('\n');
            }
            push_text(&child_element, in_pre || name == "pre", out);
            if is_block {
                out.push('\n');
            }
        } else if let Some(text) = child.value().as_text() {
            if in_pre {
                out.push_str(text);
            } else {
                push_inline(text, out);
            }
        }
    }
}

fn push_inline(text: &str, out: &mut String) {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        if !text.is_empty() {
            push_space(out);
        }
        return;
    }
    if text.starts_with(char::is_whitespace) {
        push_space(out);
    }
    out.push_str(&words.join(" "));
    if text.ends_with(char::is_whitespace) {
        push_space(out);
    }
}

fn push_space(out: &mut String) {
    if !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn has_content_class(element: &ElementRef<'_>) -> bool {
    match element.value().attr("class") {
        Some(class) => {
            let class = class.to_lowercase();
            CONTENT_CLASS_HINTS.iter().any(|hint| class.contains(hint))
        }
        None => false,
    }
}

/// Enumerate every candidate region in document order of the four origin
/// kinds: articles, the first main, class matches, then paragraph clusters.
pub fn collect_candidates(document: &Html) -> Vec<ContentCandidate<'_>> {
    let mut candidates = Vec::new();

    if let Ok(selector) = Selector::parse("article") {
        for node in document.select(&selector) {
            candidates.push(ContentCandidate {
                origin: CandidateOrigin::Article,
                node,
                estimated_size: text_len(&node),
            });
        }
    }

    if let Ok(selector) = Selector::parse("main") {
        if let Some(node) = document.select(&selector).next() {
            candidates.push(ContentCandidate {
                origin: CandidateOrigin::Main,
                node,
                estimated_size: text_len(&node),
            });
        }
    }

    if let Ok(selector) = Selector::parse("[class]") {
        for node in document.select(&selector).filter(has_content_class) {
            candidates.push(ContentCandidate {
                origin: CandidateOrigin::ClassMatch,
                node,
                estimated_size: text_len(&node),
            });
        }
    }

    if let (Ok(containers), Ok(paragraph)) =
        (Selector::parse(BLOCK_CONTAINERS), Selector::parse(PARAGRAPH))
    {
        for node in document.select(&containers) {
            let mut count = 0;
            let mut size = 0;
            for p in node.select(&paragraph) {
                count += 1;
                size += text_len(&p);
            }
            if count >= MIN_CLUSTER_PARAGRAPHS {
                candidates.push(ContentCandidate {
                    origin: CandidateOrigin::ParagraphCluster,
                    node,
                    estimated_size: size,
                });
            }
        }
    }

    candidates
}

/// Rank candidates by size, largest first. Equal sizes keep first-seen
/// order; empty candidates are dropped.
pub fn rank_candidates(mut candidates: Vec<ContentCandidate<'_>>) -> Vec<ContentCandidate<'_>> {
    candidates.retain(|c| c.estimated_size > 0);
    // sort_by is stable
    candidates.sort_by(|a, b| b.estimated_size.cmp(&a.estimated_size));
    candidates
}

pub fn best_candidate(document: &Html) -> Option<ContentCandidate<'_>> {
    rank_candidates(collect_candidates(document)).into_iter().next()
}

/// Raw text of the region most likely to be the article body, falling back
/// to `<body>` and then to the whole document.
pub fn select_content(document: &Html) -> String {
    if let Some(best) = best_candidate(document) {
        debug!(
            "Selected {:?} candidate <{}> ({} chars)",
            best.origin,
            best.node.value().name(),
            best.estimated_size
        );
        return block_text(&best.node);
    }

    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            debug!("No content candidates, using <body>");
            return block_text(&body);
        }
    }

    debug!("No <body>, using whole document");
    block_text(&document.root_element())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str, n: usize) -> String {
        (0..n).map(|i| format!("<p>{} {}</p>", text, i)).collect()
    }

    #[test]
    fn test_text_len_ignores_layout_whitespace() {
        let doc = Html::parse_fragment("<div>\n   <p> abc </p>\n  <p>de</p>\n</div>");
        let sel = Selector::parse("div").unwrap();
        let div = doc.select(&sel).next().unwrap();
        assert_eq!(text_len(&div), 5);
    }

    #[test]
    fn test_block_text_breaks_blocks() {
        let doc = Html::parse_document(
            "<body><h1>Title</h1><p>One <b>bold</b>\n   word.</p><p>Two</p></body>",
        );
        let text = select_content(&doc);
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["Title", "One bold word.", "Two"]);
    }

    #[test]
    fn test_pre_keeps_layout() {
        let doc = Html::parse_document("<body><pre>fn main() {\n    run();\n}</pre></body>");
        let text = select_content(&doc);
        assert!(text.contains("fn main() {\n    run();\n}"));
    }

    #[test]
    fn test_all_origins_enumerated() {
        let html = format!(
            "<body><main><article class=\"post\"><div>{}</div></article></main></body>",
            para("Paragraph", 3)
        );
        let doc = Html::parse_document(&html);
        let origins: Vec<CandidateOrigin> =
            collect_candidates(&doc).iter().map(|c| c.origin).collect();
        assert_eq!(
            origins,
            vec![
                CandidateOrigin::Article,
                CandidateOrigin::Main,
                CandidateOrigin::ClassMatch,
                CandidateOrigin::ParagraphCluster,
            ]
        );
    }

    #[test]
    fn test_only_first_main() {
        let doc = Html::parse_document("<body><main>one</main><main>two two</main></body>");
        let mains: Vec<_> = collect_candidates(&doc)
            .into_iter()
            .filter(|c| c.origin == CandidateOrigin::Main)
            .collect();
        assert_eq!(mains.len(), 1);
        assert_eq!(mains[0].estimated_size, 3);
    }

    #[test]
    fn test_class_match_case_insensitive() {
        let doc = Html::parse_document(
            "<body><div class=\"Entry-Content wide\">Body text</div><div class=\"sidebar\">x</div></body>",
        );
        let matches: Vec<_> = collect_candidates(&doc)
            .into_iter()
            .filter(|c| c.origin == CandidateOrigin::ClassMatch)
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].node.value().attr("class"), Some("Entry-Content wide"));
    }

    #[test]
    fn test_cluster_needs_three_paragraphs() {
        let html = format!("<body><div>{}</div><section>{}</section></body>", para("a", 2), para("b", 3));
        let doc = Html::parse_document(&html);
        let clusters: Vec<_> = collect_candidates(&doc)
            .into_iter()
            .filter(|c| c.origin == CandidateOrigin::ParagraphCluster)
            .collect();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].node.value().name(), "section");
        // "b 0", "b 1", "b 2"
        assert_eq!(clusters[0].estimated_size, 9);
    }

    #[test]
    fn test_cluster_size_counts_paragraphs_only() {
        let html = format!("<body><div><span>lots of extra chrome text</span>{}</div></body>", para("p", 3));
        let doc = Html::parse_document(&html);
        let cluster = collect_candidates(&doc)
            .into_iter()
            .find(|c| c.origin == CandidateOrigin::ParagraphCluster)
            .unwrap();
        assert_eq!(cluster.estimated_size, 9);
    }

    #[test]
    fn test_largest_candidate_wins() {
        let html = format!(
            "<body><article>Short teaser</article><div id=\"story\">{}</div></body>",
            para("A much longer paragraph of real prose", 4)
        );
        let doc = Html::parse_document(&html);
        let best = best_candidate(&doc).unwrap();
        assert_eq!(best.origin, CandidateOrigin::ParagraphCluster);
        assert_eq!(best.node.value().id(), Some("story"));
        let text = select_content(&doc);
        assert!(text.contains("A much longer paragraph of real prose 3"));
        assert!(!text.contains("Short teaser"));
    }

    #[test]
    fn test_tie_breaks_on_first_seen() {
        let doc = Html::parse_document(
            "<body><article id=\"first\">same size</article><article id=\"second\">size same</article></body>",
        );
        for _ in 0..5 {
            let best = best_candidate(&doc).unwrap();
            assert_eq!(best.node.value().id(), Some("first"));
        }
    }

    #[test]
    fn test_tie_prefers_earlier_origin() {
        // The article and its cluster measure the same; the article was seen first.
        let html = format!("<body><article id=\"a\"><div id=\"d\">{}</div></article></body>", para("x", 3));
        let doc = Html::parse_document(&html);
        let best = best_candidate(&doc).unwrap();
        assert_eq!(best.origin, CandidateOrigin::Article);
    }

    #[test]
    fn test_fallback_to_body() {
        let doc = Html::parse_document("<body><span>Just some loose text</span></body>");
        assert!(collect_candidates(&doc).is_empty());
        assert_eq!(select_content(&doc).trim(), "Just some loose text");
    }

    #[test]
    fn test_fallback_to_document() {
        let doc = Html::parse_fragment("<span>loose</span> text");
        assert!(collect_candidates(&doc).is_empty());
        let text = select_content(&doc);
        assert!(!text.trim().is_empty());
        assert!(text.contains("loose"));
        assert_eq!(text.trim(), "loose text");
    }

    #[test]
    fn test_empty_candidates_fall_back() {
        let doc = Html::parse_document("<body><article></article><span>Loose text</span></body>");
        assert!(best_candidate(&doc).is_none());
        assert_eq!(select_content(&doc).trim(), "Loose text");
    }
}
