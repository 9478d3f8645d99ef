//! Select publications by year from a fully loaded profile listing.

use crate::model::ArticleRef;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Origin prepended to relative article links.
pub const ARTICLE_ORIGIN: &str = "https://scholar.google.co.id";

static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr.gsc_a_tr").unwrap());
static YEAR_CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.gsc_a_y").unwrap());
static YEAR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.gsc_a_h").unwrap());
static TITLE_CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.gsc_a_t").unwrap());
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.gsc_a_at").unwrap());

/// Parse `markup` and select its rows published in `target_years`.
pub fn select_articles_from_markup(markup: &str, target_years: &[String]) -> Vec<ArticleRef> {
    let document = Html::parse_document(markup);
    select_articles(&document, target_years)
}

/// Rows whose year label exactly matches one of `target_years`, in
/// document order. Rows lacking a year, title, or link are skipped.
pub fn select_articles(document: &Html, target_years: &[String]) -> Vec<ArticleRef> {
    let mut articles = Vec::new();
    let mut skipped = 0usize;

    for row in document.select(&ROW_SEL) {
        match classify_row(row, target_years) {
            RowClass::Selected(article) => articles.push(article),
            RowClass::OtherYear => {}
            RowClass::Malformed => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "skipped listing rows without year or title link");
    }
    articles
}

enum RowClass {
    Selected(ArticleRef),
    OtherYear,
    Malformed,
}

fn classify_row(row: ElementRef<'_>, target_years: &[String]) -> RowClass {
    let Some(year) = row
        .select(&YEAR_CELL_SEL)
        .next()
        .and_then(|cell| cell.select(&YEAR_SEL).next())
        .map(text_of)
    else {
        return RowClass::Malformed;
    };

    if !target_years.iter().any(|y| *y == year) {
        return RowClass::OtherYear;
    }

    let Some(link) = row
        .select(&TITLE_CELL_SEL)
        .next()
        .and_then(|cell| cell.select(&TITLE_SEL).next())
    else {
        return RowClass::Malformed;
    };

    let Some(url) = link.value().attr("href").and_then(resolve_article_url) else {
        return RowClass::Malformed;
    };

    RowClass::Selected(ArticleRef {
        title: text_of(link),
        url,
        publication_year: year,
    })
}

/// Absolute links pass through; relative ones are joined to the origin.
fn resolve_article_url(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http") {
        return Some(href.to_string());
    }
    Url::parse(ARTICLE_ORIGIN)
        .and_then(|base| base.join(href))
        .map(String::from)
        .ok()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
