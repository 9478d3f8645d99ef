//! `scholar-citations` main command: harvest one scholar or a batch file.

use crate::cli::{self, output, Cli};
use crate::config::ScrapeConfig;
use crate::output::{default_save_name, OutputTarget};
use crate::pipeline::{Pipeline, RunRequest};
use crate::renderer::chromium::ChromiumRenderer;
use anyhow::{bail, Context, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::{error, info};

/// One scholar id with where its table goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub scholar_id: String,
    pub save_path: PathBuf,
}

/// Resolve the ids to harvest and their save paths. Runs before any
/// browser is started so bad input fails fast.
pub fn plan_jobs(cli: &Cli) -> Result<Vec<Job>> {
    if let Some(file) = &cli.from_txt {
        let ids = cli::load_batch_ids(file)?;
        info!("loaded {} scholar ids from {}", ids.len(), file.display());
        return Ok(ids
            .into_iter()
            .map(|id| Job {
                save_path: cli::batch_save_path(cli.save_path.as_deref(), &id),
                scholar_id: id,
            })
            .collect());
    }

    let Some(scholar_id) = cli.scholar_id.clone() else {
        bail!("either --scholar-id or --from-txt is required");
    };
    let save_path = cli
        .save_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_save_name(Local::now())));
    Ok(vec![Job {
        scholar_id,
        save_path,
    }])
}

/// Run every planned job in order. A failed id in a batch does not stop
/// the ones after it; the command fails at the end if any id failed.
pub async fn run(cli: &Cli) -> Result<()> {
    let jobs = plan_jobs(cli)?;

    let config = ScrapeConfig::from_env();
    let renderer = ChromiumRenderer::new(config.browser.clone());
    let pipeline = Pipeline::new(&renderer, config);

    let styled = output::Styled::new();
    let show_progress = output::progress_enabled(cli.quiet, cli.json);
    let mut reports = Vec::with_capacity(jobs.len());
    let mut failed = Vec::new();

    for job in &jobs {
        let request = RunRequest {
            scholar_id: job.scholar_id.clone(),
            years: cli.year,
            output: OutputTarget::new(job.save_path.clone(), cli.overwrite),
            save_html: cli.save_html,
            show_progress,
        };

        match pipeline
            .run(&request)
            .await
            .with_context(|| format!("harvest failed for {}", job.scholar_id))
        {
            Ok(report) => {
                if !cli.quiet && !cli.json {
                    output::print_report(&styled, &report);
                }
                reports.push(report);
            }
            Err(e) => {
                error!("{e:#}");
                if !cli.json {
                    output::print_failure(&styled, &job.scholar_id, &e);
                }
                failed.push(job.scholar_id.clone());
            }
        }
    }

    if cli.json {
        output::print_json(&serde_json::json!({
            "reports": reports,
            "failed": failed,
        }));
    }

    if !failed.is_empty() {
        bail!("{} of {} scholar ids failed: {}", failed.len(), jobs.len(), failed.join(", "));
    }
    Ok(())
}
