//! End-to-end harvesting run for one scholar.
//!
//! The pipeline owns the single browser session of a run: it acquires the
//! session, lends it to the paginator and the citation fetcher, and closes
//! it on every exit path. A failed close is logged and never replaces the
//! run's own result.

use crate::acquisition::citations::{self, FetchOutcome};
use crate::acquisition::paginator::{self, PaginationStop};
use crate::config::ScrapeConfig;
use crate::error::PipelineError;
use crate::extraction::listing;
use crate::model::OutputRow;
use crate::output::{self, OutputTarget};
use crate::renderer::{RenderContext, Renderer};
use crate::years::YearSpec;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// What to harvest and where to put it.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub scholar_id: String,
    pub years: YearSpec,
    pub output: OutputTarget,
    /// Also save the paginated listing markup next to the table.
    pub save_html: bool,
    pub show_progress: bool,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scholar_id: String,
    pub target_years: Vec<String>,
    pub pagination: PaginationStop,
    pub show_more_clicks: usize,
    pub articles_found: usize,
    pub rows_written: usize,
    /// Articles whose detail page never loaded.
    pub unavailable_articles: usize,
    pub output_path: Option<PathBuf>,
    pub listing_snapshot: Option<PathBuf>,
    /// Set when the session died before every article was visited.
    pub partial: Option<String>,
}

pub struct Pipeline<'r> {
    renderer: &'r dyn Renderer,
    config: ScrapeConfig,
}

impl<'r> Pipeline<'r> {
    pub fn new(renderer: &'r dyn Renderer, config: ScrapeConfig) -> Self {
        Self { renderer, config }
    }

    /// Run one scholar from profile to written table.
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport, PipelineError> {
        let target_years = request.years.expand();

        let mut context = self
            .renderer
            .new_context()
            .await
            .map_err(|e| {
                error!("failed to start browser session: {e}");
                PipelineError::SessionAcquire(e)
            })?;

        let result = self.harvest(context.as_mut(), request, target_years).await;
        release(context).await;
        result
    }

    async fn harvest(
        &self,
        ctx: &mut dyn RenderContext,
        request: &RunRequest,
        target_years: Vec<String>,
    ) -> Result<RunReport, PipelineError> {
        let url = paginator::profile_url(&request.scholar_id);
        let listing_outcome =
            paginator::load_full_listing(ctx, &url, &self.config.pagination).await;

        let listing_snapshot = if request.save_html {
            save_snapshot(&listing_outcome.markup, request)
        } else {
            None
        };

        let articles = listing::select_articles_from_markup(&listing_outcome.markup, &target_years);
        let articles_found = articles.len();
        info!(
            "found {articles_found} articles for the year(s) {}",
            target_years.join(", ")
        );

        let (rows, partial) = if let PaginationStop::SessionLost { reason } = &listing_outcome.stop
        {
            warn!("browser session lost during pagination, skipping article pages");
            (Vec::new(), Some(reason.clone()))
        } else {
            let progress = progress_bar(request.show_progress, articles_found);
            let outcome = citations::fetch_all(
                ctx,
                &request.scholar_id,
                articles,
                &target_years,
                &self.config.fetch,
                &progress,
            )
            .await;
            progress.finish_and_clear();

            let partial = match &outcome {
                FetchOutcome::Partial { error, .. } => Some(error.to_string()),
                FetchOutcome::Complete(_) => None,
            };
            (outcome.into_rows(), partial)
        };
        let unavailable_articles = rows.iter().filter(|r| r.is_unavailable()).count();

        let output_path = write_table(&rows, &target_years, &request.output)?;

        Ok(RunReport {
            scholar_id: request.scholar_id.clone(),
            target_years,
            pagination: listing_outcome.stop,
            show_more_clicks: listing_outcome.clicks,
            articles_found,
            rows_written: if output_path.is_some() { rows.len() } else { 0 },
            unavailable_articles,
            output_path,
            listing_snapshot,
            partial,
        })
    }
}

fn write_table(
    rows: &[OutputRow],
    target_years: &[String],
    target: &OutputTarget,
) -> Result<Option<PathBuf>, PipelineError> {
    if rows.is_empty() {
        info!("no citation rows produced, skipping output");
        return Ok(None);
    }
    info!(
        "table built with {} rows and {} columns",
        rows.len(),
        3 + target_years.len()
    );
    Ok(Some(output::write_rows(rows, target_years, target)?))
}

fn save_snapshot(markup: &str, request: &RunRequest) -> Option<PathBuf> {
    match output::save_listing_snapshot(
        markup,
        &request.scholar_id,
        &request.output.output_dir,
        Local::now(),
    ) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("could not save listing html: {e}");
            None
        }
    }
}

async fn release(context: Box<dyn RenderContext>) {
    match context.close().await {
        Ok(()) => info!("browser session closed"),
        Err(e) => error!("error closing browser session: {e}"),
    }
}

fn progress_bar(enabled: bool, len: usize) -> ProgressBar {
    if !enabled || len == 0 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} {wide_msg}") {
        bar.set_style(style);
    }
    bar
}
