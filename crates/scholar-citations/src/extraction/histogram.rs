//! Read the per-year citation bars from an article detail page.

use crate::model::CitationHistogram;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static BAR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#gsc_oci_graph_bars .gsc_oci_g_a").unwrap());
static LABEL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".gsc_oci_g_al").unwrap());

/// Query parameter carrying a bar's year in its link.
const YEAR_MARKER: &str = "as_ylo=";

pub fn parse_histogram_markup(markup: &str) -> CitationHistogram {
    parse_histogram(&Html::parse_document(markup))
}

/// Year → count for every well-formed bar. No bars yields an empty
/// histogram; bars missing a year or a numeric label are ignored.
pub fn parse_histogram(document: &Html) -> CitationHistogram {
    let mut histogram = CitationHistogram::new();

    for bar in document.select(&BAR_SEL) {
        let Some(year) = bar.value().attr("href").and_then(year_from_href) else {
            continue;
        };
        let Some(count) = bar
            .select(&LABEL_SEL)
            .next()
            .and_then(|label| parse_count(&label.text().collect::<String>()))
        else {
            continue;
        };
        histogram.insert(year, count);
    }

    histogram
}

/// The four characters following `as_ylo=`, if they are all digits.
fn year_from_href(href: &str) -> Option<&str> {
    let start = href.find(YEAR_MARKER)? + YEAR_MARKER.len();
    let year = href.get(start..start + 4)?;
    year.bytes().all(|b| b.is_ascii_digit()).then_some(year)
}

fn parse_count(text: &str) -> Option<u32> {
    let digits: String = text.trim().chars().filter(|c| *c != ',').collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
