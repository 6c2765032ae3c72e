//! Text search over text elements
//!
//! Only text elements are searched, in document order. Offsets are character
//! offsets into the element's text, not byte offsets.

use doc_model::{Element, ElementId, ElementKind};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Characters of surrounding text kept on each side of a match
pub const CONTEXT_CHARS: usize = 20;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    Pattern(String),
}

/// Options for text search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    /// Only match whole words (literal queries only)
    pub whole_words: bool,
    /// Treat the query as a regular expression
    pub use_regex: bool,
    /// Restrict the search to one page
    pub page: Option<u32>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = value;
        self
    }

    pub fn with_whole_words(mut self, value: bool) -> Self {
        self.whole_words = value;
        self
    }

    pub fn with_regex(mut self, value: bool) -> Self {
        self.use_regex = value;
        self
    }

    pub fn on_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// A single match inside a text element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub element_id: ElementId,
    pub page: u32,
    /// Full text of the element
    pub text: String,
    /// Character offset of the first matched character
    pub start: usize,
    /// Character offset one past the last matched character
    pub end: usize,
    /// Up to 20 characters either side, with a leading "..." when cut
    pub context: String,
}

impl SearchMatch {
    pub fn matched_text(&self) -> String {
        self.text.chars().skip(self.start).take(self.end - self.start).collect()
    }
}

/// Ordered search results with circular navigation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    matches: Vec<SearchMatch>,
    current: Option<usize>,
}

impl SearchResults {
    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn current(&self) -> Option<&SearchMatch> {
        self.matches.get(self.current?)
    }

    /// 1-based position of the current match, for "3 of 7" style display
    pub fn position(&self) -> Option<usize> {
        self.current.map(|index| index + 1)
    }

    /// Advance to the next match, wrapping from the last to the first.
    pub fn next(&mut self) -> Option<&SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        let next = match self.current {
            Some(index) => (index + 1) % self.matches.len(),
            None => 0,
        };
        self.current = Some(next);
        self.matches.get(next)
    }

    /// Step back to the previous match, wrapping from the first to the last.
    pub fn previous(&mut self) -> Option<&SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        let len = self.matches.len();
        let previous = match self.current {
            Some(index) => (index + len - 1) % len,
            None => len - 1,
        };
        self.current = Some(previous);
        self.matches.get(previous)
    }
}

/// Compile the query into a pattern.
///
/// Literal queries are escaped and, with `whole_words`, wrapped in word
/// boundaries. Matching is case-insensitive unless `case_sensitive` is set.
pub fn build_pattern(query: &str, options: &SearchOptions) -> Result<Regex, SearchError> {
    let pattern = if options.use_regex {
        query.to_owned()
    } else {
        let escaped = regex::escape(query);
        if options.whole_words {
            format!(r"\b{escaped}\b")
        } else {
            escaped
        }
    };

    RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map_err(|err| SearchError::Pattern(err.to_string()))
}

/// Search text elements, reporting a malformed pattern as an error.
pub fn try_search(
    elements: &[Element],
    query: &str,
    options: &SearchOptions,
) -> Result<SearchResults, SearchError> {
    if query.is_empty() {
        return Ok(SearchResults::default());
    }
    let regex = build_pattern(query, options)?;

    let mut matches = Vec::new();
    for element in elements {
        if options.page.is_some_and(|page| page != element.page) {
            continue;
        }
        let ElementKind::Text(content) = &element.kind else {
            continue;
        };
        collect_matches(&regex, element, &content.text, &mut matches);
    }

    log::debug!("search {query:?} found {} match(es)", matches.len());
    Ok(SearchResults { matches, current: None })
}

/// Search text elements. A malformed pattern is logged and yields no
/// matches.
pub fn search(elements: &[Element], query: &str, options: &SearchOptions) -> SearchResults {
    try_search(elements, query, options).unwrap_or_else(|err| {
        log::warn!("{err}");
        SearchResults::default()
    })
}

fn collect_matches(regex: &Regex, element: &Element, text: &str, out: &mut Vec<SearchMatch>) {
    // find_iter steps past empty matches on its own
    for found in regex.find_iter(text) {
        let start = text[..found.start()].chars().count();
        let end = start + found.as_str().chars().count();
        out.push(SearchMatch {
            element_id: element.id.clone(),
            page: element.page,
            text: text.to_owned(),
            start,
            end,
            context: context(text, start, end),
        });
    }
}

fn context(text: &str, start: usize, end: usize) -> String {
    let from = start.saturating_sub(CONTEXT_CHARS);
    let snippet: String = text.chars().skip(from).take(end + CONTEXT_CHARS - from).collect();
    if from > 0 {
        format!("{ELLIPSIS}{snippet}")
    } else {
        snippet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Rect, ShapeContent, ShapeKind, TextContent};

    const CATS: &str = "Cat, cats, and caterpillars";

    fn text(page: u32, content: &str) -> Element {
        Element::new(page, Rect::new(0.0, 0.0, 100.0, 20.0), ElementKind::Text(TextContent::new(content)))
    }

    fn offsets(results: &SearchResults) -> Vec<(usize, usize)> {
        results.matches().iter().map(|m| (m.start, m.end)).collect()
    }

    #[test]
    fn test_literal_case_insensitive() {
        let elements = vec![text(1, CATS)];
        let results = search(&elements, "cat", &SearchOptions::new());
        assert_eq!(offsets(&results), vec![(0, 3), (5, 8), (15, 18)]);
        assert_eq!(results.matches()[0].matched_text(), "Cat");
    }

    #[test]
    fn test_literal_case_sensitive() {
        let elements = vec![text(1, CATS)];
        let results = search(&elements, "cat", &SearchOptions::new().with_case_sensitive(true));
        assert_eq!(offsets(&results), vec![(5, 8), (15, 18)]);
    }

    #[test]
    fn test_whole_words() {
        let elements = vec![text(1, CATS)];

        let insensitive = search(&elements, "cat", &SearchOptions::new().with_whole_words(true));
        assert_eq!(offsets(&insensitive), vec![(0, 3)]);

        let sensitive = search(
            &elements,
            "cat",
            &SearchOptions::new().with_whole_words(true).with_case_sensitive(true),
        );
        assert!(sensitive.is_empty());

        let standalone = vec![text(1, "the cat sat")];
        let found = search(
            &standalone,
            "cat",
            &SearchOptions::new().with_whole_words(true).with_case_sensitive(true),
        );
        assert_eq!(offsets(&found), vec![(4, 7)]);
    }

    #[test]
    fn test_regex() {
        let elements = vec![text(1, CATS)];
        let results = search(&elements, "c.t", &SearchOptions::new().with_regex(true));
        assert_eq!(results.len(), 3);

        let sensitive = search(
            &elements,
            "c.t",
            &SearchOptions::new().with_regex(true).with_case_sensitive(true),
        );
        assert_eq!(offsets(&sensitive), vec![(5, 8), (15, 18)]);
    }

    #[test]
    fn test_literal_escapes_metacharacters() {
        let elements = vec![text(1, "total (net): $5.00")];
        let results = search(&elements, "$5.00", &SearchOptions::new());
        assert_eq!(offsets(&results), vec![(13, 18)]);
    }

    #[test]
    fn test_malformed_regex_yields_nothing() {
        let elements = vec![text(1, CATS)];
        let options = SearchOptions::new().with_regex(true);

        assert!(matches!(try_search(&elements, "(unclosed", &options), Err(SearchError::Pattern(_))));
        assert!(search(&elements, "(unclosed", &options).is_empty());
    }

    #[test]
    fn test_zero_width_matches_terminate() {
        let elements = vec![text(1, "abc")];
        let results = search(&elements, "x*", &SearchOptions::new().with_regex(true));
        assert_eq!(results.len(), 4);
        assert!(results.matches().iter().all(|m| m.start == m.end));
    }

    #[test]
    fn test_only_text_elements_in_document_order() {
        let shape = Element::new(
            1,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            ElementKind::Shape(ShapeContent::new(ShapeKind::Circle)),
        );
        let second = text(2, "cat two");
        let first = text(1, "cat one");
        let elements = vec![second.clone(), shape, first.clone()];

        let results = search(&elements, "cat", &SearchOptions::new());
        let ids: Vec<&ElementId> = results.matches().iter().map(|m| &m.element_id).collect();
        assert_eq!(ids, vec![&second.id, &first.id]);

        let page_one = search(&elements, "cat", &SearchOptions::new().on_page(1));
        assert_eq!(page_one.len(), 1);
        assert_eq!(page_one.matches()[0].page, 1);
    }

    #[test]
    fn test_context_is_truncated_with_ellipsis() {
        let long = "0123456789012345678901234567890123456789 needle 0123456789012345678901234567890";
        let elements = vec![text(1, long)];
        let results = search(&elements, "needle", &SearchOptions::new());

        let found = &results.matches()[0];
        assert!(found.context.starts_with("..."));
        assert_eq!(found.context, "...1234567890123456789 needle 0123456789012345678");
    }

    #[test]
    fn test_unicode_offsets_are_characters() {
        let elements = vec![text(1, "größe Größe")];
        let results = search(&elements, "größe", &SearchOptions::new());
        assert_eq!(offsets(&results), vec![(0, 5), (6, 11)]);
    }

    #[test]
    fn test_navigation_wraps() {
        let elements = vec![text(1, CATS)];
        let mut results = search(&elements, "cat", &SearchOptions::new());

        assert_eq!(results.position(), None);
        assert_eq!(results.next().map(|m| m.start), Some(0));
        assert_eq!(results.next().map(|m| m.start), Some(5));
        assert_eq!(results.next().map(|m| m.start), Some(15));
        assert_eq!(results.next().map(|m| m.start), Some(0));
        assert_eq!(results.previous().map(|m| m.start), Some(15));
        assert_eq!(results.position(), Some(3));

        let mut empty = SearchResults::default();
        assert!(empty.next().is_none());
        assert!(empty.previous().is_none());
    }
}
