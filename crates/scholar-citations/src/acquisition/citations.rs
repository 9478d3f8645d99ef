//! Fetch each selected article's detail page and build citation rows.
//!
//! Articles are processed one at a time. A page that fails to load gets a
//! row of sentinel cells and the batch moves on; only a dead session ends
//! the batch early, returning the rows built so far.

use crate::config::FetchConfig;
use crate::error::RenderError;
use crate::extraction::histogram;
use crate::model::{ArticleRef, OutputRow};
use crate::renderer::{RenderContext, RenderResult, WaitOutcome};
use indicatif::ProgressBar;
use tracing::{error, info, warn};

/// Present once an article page has rendered its citation block.
pub const CITATION_READY_SELECTOR: &str = ".gsc_oci_value";

/// Rows produced by a batch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Every article was visited.
    Complete(Vec<OutputRow>),
    /// The session died; `rows` covers the articles handled before that.
    Partial {
        rows: Vec<OutputRow>,
        error: RenderError,
    },
}

impl FetchOutcome {
    pub fn rows(&self) -> &[OutputRow] {
        match self {
            Self::Complete(rows) | Self::Partial { rows, .. } => rows,
        }
    }

    pub fn into_rows(self) -> Vec<OutputRow> {
        match self {
            Self::Complete(rows) | Self::Partial { rows, .. } => rows,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial { .. })
    }
}

/// Visit every article in order and collect one row per article.
pub async fn fetch_all(
    ctx: &mut dyn RenderContext,
    scholar_id: &str,
    articles: Vec<ArticleRef>,
    target_years: &[String],
    config: &FetchConfig,
    progress: &ProgressBar,
) -> FetchOutcome {
    let mut rows = Vec::with_capacity(articles.len());

    for article in articles {
        info!(title = %article.title, "extracting citation data");
        progress.set_message(article.title.clone());

        match load_article(ctx, &article.url, config).await {
            Ok(markup) => {
                let histogram = histogram::parse_histogram_markup(&markup);
                rows.push(OutputRow::from_histogram(
                    scholar_id,
                    article,
                    &histogram,
                    target_years,
                ));
                progress.inc(1);
                tokio::time::sleep(config.inter_article_delay).await;
            }
            Err(e) if e.is_session_fatal() => {
                error!("error extracting citation data: {e}");
                return FetchOutcome::Partial { rows, error: e };
            }
            Err(e) => {
                error!(url = %article.url, "error loading article page: {e}");
                rows.push(OutputRow::unavailable(
                    scholar_id,
                    article,
                    target_years.len(),
                ));
                progress.inc(1);
            }
        }
    }

    FetchOutcome::Complete(rows)
}

/// Navigate to an article and return its markup once the citation block
/// is present.
async fn load_article(
    ctx: &mut dyn RenderContext,
    url: &str,
    config: &FetchConfig,
) -> RenderResult<String> {
    ctx.navigate(url).await?;
    match ctx
        .wait_for_element(CITATION_READY_SELECTOR, config.article_timeout)
        .await?
    {
        WaitOutcome::Found => ctx.content().await,
        WaitOutcome::TimedOut => {
            warn!(url, "citation block did not render within {:?}", config.article_timeout);
            Err(RenderError::Timeout(format!(
                "{CITATION_READY_SELECTOR} on {url}"
            )))
        }
    }
}
