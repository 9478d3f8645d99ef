//! Records flowing through the pipeline: classified articles, citation
//! histograms, and the output rows built from them.

use std::collections::BTreeMap;

/// Written in place of a citation count when no usable data exists.
pub const SENTINEL: i64 = -1;

/// A publication selected from the profile listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRef {
    pub title: String,
    /// Absolute URL of the article detail page.
    pub url: String,
    pub publication_year: String,
}

/// Citation counts keyed by year, as read from one detail page.
///
/// An empty histogram is a valid parse result (the article has no bars),
/// not a load failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationHistogram {
    counts: BTreeMap<String, u32>,
}

impl CitationHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bar. A repeated year keeps the last value seen.
    pub fn insert(&mut self, year: impl Into<String>, count: u32) {
        self.counts.insert(year.into(), count);
    }

    pub fn get(&self, year: &str) -> Option<u32> {
        self.counts.get(year).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<Y: Into<String>> FromIterator<(Y, u32)> for CitationHistogram {
    fn from_iter<I: IntoIterator<Item = (Y, u32)>>(iter: I) -> Self {
        let mut histogram = Self::new();
        for (year, count) in iter {
            histogram.insert(year, count);
        }
        histogram
    }
}

/// One year slot of an output row.
///
/// `NoBar` and `Unavailable` are kept apart internally but both serialize
/// to [`SENTINEL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationCell {
    Count(u32),
    /// The page loaded but its histogram had no bar for this year.
    NoBar,
    /// The article page never loaded.
    Unavailable,
}

impl CitationCell {
    pub fn value(self) -> i64 {
        match self {
            Self::Count(n) => i64::from(n),
            Self::NoBar | Self::Unavailable => SENTINEL,
        }
    }
}

/// A row of the final citation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub scholar_id: String,
    pub title: String,
    pub publication_year: String,
    pub citations: Vec<CitationCell>,
}

impl OutputRow {
    /// Build a row from a parsed histogram, one cell per target year.
    pub fn from_histogram(
        scholar_id: &str,
        article: ArticleRef,
        histogram: &CitationHistogram,
        target_years: &[String],
    ) -> Self {
        let citations = target_years
            .iter()
            .map(|year| {
                histogram
                    .get(year)
                    .map_or(CitationCell::NoBar, CitationCell::Count)
            })
            .collect();
        Self::with_cells(scholar_id, article, citations)
    }

    /// Row for an article whose page could not be loaded.
    pub fn unavailable(scholar_id: &str, article: ArticleRef, year_count: usize) -> Self {
        Self::with_cells(scholar_id, article, vec![CitationCell::Unavailable; year_count])
    }

    fn with_cells(scholar_id: &str, article: ArticleRef, citations: Vec<CitationCell>) -> Self {
        Self {
            scholar_id: scholar_id.to_string(),
            title: article.title,
            publication_year: article.publication_year,
            citations,
        }
    }

    /// Serialized citation values, sentinel included.
    pub fn citation_values(&self) -> Vec<i64> {
        self.citations.iter().map(|cell| cell.value()).collect()
    }

    pub fn is_unavailable(&self) -> bool {
        !self.citations.is_empty()
            && self
                .citations
                .iter()
                .all(|cell| *cell == CitationCell::Unavailable)
    }
}

/// Column headers for a table covering `target_years`.
pub fn column_headers(target_years: &[String]) -> Vec<String> {
    let mut headers = vec![
        "scholar_id".to_string(),
        "title".to_string(),
        "publication_year".to_string(),
    ];
    headers.extend(target_years.iter().map(|year| format!("citations_{year}")));
    headers
}
