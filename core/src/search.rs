use crate::index::InvertedIndex;
use crate::tokenizer::tokenize;
use crate::PageNumber;
use serde::Serialize;
use std::collections::BTreeMap;

/// Characters of raw page text carried in a result preview.
pub const PREVIEW_CHARS: usize = 500;
/// Appended to every preview, truncated or not.
pub const PREVIEW_ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub page_number: PageNumber,
    pub score: usize,
    pub matched_terms: Vec<String>,
    pub content_preview: String,
    pub word_count: usize,
    pub text_length: usize,
}

/// Rank pages by the number of query-term hits.
///
/// Each query term (repeats included) adds one point to every page in its
/// posting. Results are ordered by score descending, then page number ascending.
pub fn search(index: &InvertedIndex, query: &str) -> Vec<SearchResult> {
    let mut hits: BTreeMap<PageNumber, (usize, Vec<String>)> = BTreeMap::new();
    for term in tokenize(query) {
        let Some(posting) = index.postings(&term) else {
            continue;
        };
        for &page_number in posting {
            let (score, matched) = hits.entry(page_number).or_default();
            *score += 1;
            matched.push(term.clone());
        }
    }

    let mut results: Vec<SearchResult> = hits
        .into_iter()
        .filter_map(|(page_number, (score, matched_terms))| {
            let page = index.page(page_number)?;
            Some(SearchResult {
                page_number,
                score,
                matched_terms,
                content_preview: preview(&page.raw_text),
                word_count: page.word_count,
                text_length: page.text_length,
            })
        })
        .collect();

    // stable sort keeps the ascending page order from the BTreeMap for ties
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

fn preview(text: &str) -> String {
    let mut s: String = text.chars().take(PREVIEW_CHARS).collect();
    s.push_str(PREVIEW_ELLIPSIS);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.append(1, "alpha beta");
        index.append(2, "alpha gamma delta");
        index.append(3, "gamma delta epsilon");
        index
    }

    #[test]
    fn ranks_by_hit_count_then_page() {
        let results = search(&sample(), "gamma delta alpha");
        let order: Vec<(u32, usize)> = results.iter().map(|r| (r.page_number, r.score)).collect();
        assert_eq!(order, vec![(2, 3), (3, 2), (1, 1)]);
        assert_eq!(results[0].matched_terms, vec!["gamma", "delta", "alpha"]);
    }

    #[test]
    fn repeated_query_terms_count_each_time() {
        let results = search(&sample(), "Alpha ALPHA");
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score == 2));
        assert_eq!(results[0].page_number, 1);
        assert_eq!(results[0].matched_terms, vec!["alpha", "alpha"]);
    }

    #[test]
    fn empty_or_short_queries_match_nothing() {
        let index = sample();
        assert!(search(&index, "").is_empty());
        assert!(search(&index, "a an of").is_empty());
        assert!(search(&index, "zeta").is_empty());
    }

    #[test]
    fn preview_always_carries_ellipsis() {
        let mut index = InvertedIndex::new();
        index.append(1, "short text");
        index.append(2, format!("long {}", "x".repeat(600)));

        let short = &search(&index, "short")[0];
        assert_eq!(short.content_preview, "short text...");
        assert_eq!(short.text_length, 10);

        let long = &search(&index, "long")[0];
        assert_eq!(long.content_preview.chars().count(), PREVIEW_CHARS + PREVIEW_ELLIPSIS.len());
        assert!(long.content_preview.starts_with("long xxx"));
    }
}
