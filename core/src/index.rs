use crate::tokenizer::{text_length, tokenize, word_count};
use crate::PageNumber;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One extracted page, immutable once stored in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    pub page_number: PageNumber,
    pub raw_text: String,
    pub word_count: usize,
    pub text_length: usize,
    pub terms: BTreeSet<String>,
}

impl PageEntry {
    pub fn from_text(page_number: PageNumber, raw_text: String) -> Self {
        let terms = tokenize(&raw_text).into_iter().collect();
        Self {
            page_number,
            word_count: word_count(&raw_text),
            text_length: text_length(&raw_text),
            raw_text,
            terms,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_pages: usize,
    pub total_words: usize,
    pub total_text_length: usize,
    pub indexed_terms: usize,
}

/// Term -> pages mapping for a single document, built one page at a time.
///
/// Every page number listed in a posting is present in `pages`, and that page's
/// term set contains the posting's term.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvertedIndex {
    postings: BTreeMap<String, BTreeSet<PageNumber>>,
    pages: BTreeMap<PageNumber, PageEntry>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Tokenize `raw_text` and add it as `page_number`.
    ///
    /// A page number that is already present is replaced, and unlinked from the
    /// postings of terms it no longer contains.
    pub fn append(&mut self, page_number: PageNumber, raw_text: impl Into<String>) -> &PageEntry {
        let entry = PageEntry::from_text(page_number, raw_text.into());

        if let Some(previous) = self.pages.remove(&page_number) {
            for term in previous.terms.difference(&entry.terms) {
                if let Some(posting) = self.postings.get_mut(term) {
                    posting.remove(&page_number);
                    if posting.is_empty() {
                        self.postings.remove(term);
                    }
                }
            }
        }

        for term in &entry.terms {
            self.postings.entry(term.clone()).or_default().insert(page_number);
        }
        tracing::trace!(page_number, terms = entry.terms.len(), "page indexed");
        self.pages.entry(page_number).or_insert(entry)
    }

    pub fn postings(&self, term: &str) -> Option<&BTreeSet<PageNumber>> {
        self.postings.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &BTreeSet<PageNumber>)> {
        self.postings.iter().map(|(t, p)| (t.as_str(), p))
    }

    pub fn page(&self, page_number: PageNumber) -> Option<&PageEntry> {
        self.pages.get(&page_number)
    }

    /// Pages in ascending page-number order.
    pub fn pages(&self) -> impl Iterator<Item = &PageEntry> {
        self.pages.values()
    }

    pub fn len(&self) -> usize { self.pages.len() }

    pub fn is_empty(&self) -> bool { self.pages.is_empty() }

    pub fn stats(&self) -> IndexStats {
        let (total_words, total_text_length) = self
            .pages
            .values()
            .fold((0, 0), |(w, l), p| (w + p.word_count, l + p.text_length));
        IndexStats {
            total_pages: self.pages.len(),
            total_words,
            total_text_length,
            indexed_terms: self.postings.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(index: &InvertedIndex) {
        for (term, pages) in index.terms() {
            assert!(!pages.is_empty(), "empty posting for {term}");
            for n in pages {
                let entry = index.page(*n).expect("posting points at a known page");
                assert!(entry.terms.contains(term));
            }
        }
        for entry in index.pages() {
            for term in &entry.terms {
                assert!(index.postings(term).is_some_and(|p| p.contains(&entry.page_number)));
            }
        }
    }

    #[test]
    fn append_builds_postings_and_entries() {
        let mut index = InvertedIndex::new();
        index.append(1, "Alpha beta of");
        index.append(3, "beta gamma gamma");

        assert_eq!(index.postings("beta").unwrap().iter().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(index.postings("alpha").unwrap().len(), 1);
        assert!(index.postings("of").is_none());

        let entry = index.page(3).unwrap();
        assert_eq!(entry.word_count, 3);
        assert_eq!(entry.text_length, 16);
        assert_eq!(entry.terms.len(), 2);
        assert_consistent(&index);
    }

    #[test]
    fn stats_aggregate_over_pages() {
        let mut index = InvertedIndex::new();
        index.append(1, "one two three");
        index.append(2, "three four");
        let stats = index.stats();
        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.total_words, 5);
        assert_eq!(stats.total_text_length, 13 + 10);
        assert_eq!(stats.indexed_terms, 4);
    }

    #[test]
    fn reappending_a_page_keeps_postings_consistent() {
        let mut index = InvertedIndex::new();
        index.append(1, "apple banana");
        index.append(2, "banana");
        index.append(1, "cherry banana");

        assert!(index.postings("apple").is_none());
        assert_eq!(index.postings("banana").unwrap().len(), 2);
        assert_eq!(index.len(), 2);
        assert_consistent(&index);
    }

    #[test]
    fn indexing_is_a_pure_function_of_text() {
        let pages = [(1, "Rust search engine"), (2, "search twice search"), (4, "")];
        let build = || {
            let mut index = InvertedIndex::new();
            for (n, text) in pages {
                index.append(n, text);
            }
            index
        };
        assert_eq!(build(), build());
    }
}
