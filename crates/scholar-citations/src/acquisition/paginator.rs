//! Materialize a complete profile listing.
//!
//! The profile page renders its first rows on load and reveals the rest
//! through a "show more" button. After a short scroll to trigger lazy
//! rendering, the paginator runs a small automaton:
//!
//! ```text
//! Searching --control present, enabled--> Found --click--> Searching
//! Searching --control disabled----------> Disabled   (all rows loaded)
//! Searching --control never appeared----> TimedOut   (treated as done)
//! ```
//!
//! Any UI error along the way ends pagination with whatever rows are
//! already rendered; losing the browser itself is reported separately.
//! A fixed click budget bounds the loop.

use crate::config::PaginationConfig;
use crate::error::RenderError;
use crate::renderer::{ElementHandle, RenderContext, RenderResult, WaitOutcome};
use serde::Serialize;
use tracing::{error, info, warn};

/// Present once the profile header has rendered.
pub const PROFILE_READY_SELECTOR: &str = "#gsc_prf_w";
/// The button that reveals further listing rows.
pub const SHOW_MORE_SELECTOR: &str = "#gsc_bpf_more";

const PROFILE_ORIGIN: &str = "https://scholar.google.com";

/// Profile listing URL for a scholar id.
pub fn profile_url(scholar_id: &str) -> String {
    format!("{PROFILE_ORIGIN}/citations?user={scholar_id}&hl=en")
}

/// How pagination ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaginationStop {
    /// The profile never reached its ready marker; markup is partial.
    ProfileNotReady,
    /// The show-more control reported itself disabled.
    Exhausted,
    /// The control did not appear within its wait.
    ControlMissing,
    /// A UI error cut pagination short.
    Interrupted { reason: String },
    /// The click budget ran out while the control was still enabled.
    BudgetSpent,
    /// The browser session died; no further page can be loaded.
    SessionLost { reason: String },
}

impl PaginationStop {
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::SessionLost { .. })
    }
}

/// Rendered listing plus how it was obtained.
#[derive(Debug, Clone)]
pub struct ListingOutcome {
    pub markup: String,
    pub stop: PaginationStop,
    pub clicks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShowMoreState {
    Searching,
    Found(ElementHandle),
    Disabled,
    TimedOut,
}

/// Load `profile_url` and expand it until every row is rendered.
///
/// Never fails: a profile that does not load or a pagination error yields
/// whatever markup the session holds at that point. A dead session is
/// reported as [`PaginationStop::SessionLost`].
pub async fn load_full_listing(
    ctx: &mut dyn RenderContext,
    profile_url: &str,
    config: &PaginationConfig,
) -> ListingOutcome {
    info!(url = profile_url, "accessing scholar profile");

    let ready = match open_profile(ctx, profile_url, config).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_session_fatal() => {
            error!("browser session lost while loading profile: {e}");
            return ListingOutcome {
                markup: String::new(),
                stop: stop_after_error(e),
                clicks: 0,
            };
        }
        Err(e) => {
            warn!("error while loading profile: {e}");
            WaitOutcome::TimedOut
        }
    };

    if ready == WaitOutcome::TimedOut {
        warn!(
            "timed out waiting for profile to load after {:?}",
            config.profile_timeout
        );
        return ListingOutcome {
            markup: snapshot(ctx).await,
            stop: PaginationStop::ProfileNotReady,
            clicks: 0,
        };
    }
    info!("profile loaded");

    prime_lazy_rows(ctx, config).await;
    let (stop, clicks) = expand_listing(ctx, config).await;

    ListingOutcome {
        markup: snapshot(ctx).await,
        stop,
        clicks,
    }
}

async fn open_profile(
    ctx: &mut dyn RenderContext,
    profile_url: &str,
    config: &PaginationConfig,
) -> RenderResult<WaitOutcome> {
    ctx.navigate(profile_url).await?;
    ctx.wait_for_element(PROFILE_READY_SELECTOR, config.profile_timeout)
        .await
}

/// Scroll down in fixed steps so lazily rendered rows attach.
async fn prime_lazy_rows(ctx: &mut dyn RenderContext, config: &PaginationConfig) {
    for _ in 0..config.scroll_steps {
        if let Err(e) = ctx.scroll_by(config.scroll_amount).await {
            warn!("scrolling stopped early: {e}");
            return;
        }
        tokio::time::sleep(config.scroll_pause).await;
    }
    info!("scrolling complete");
}

/// Drive the show-more automaton to a terminal state.
async fn expand_listing(
    ctx: &mut dyn RenderContext,
    config: &PaginationConfig,
) -> (PaginationStop, usize) {
    let mut clicks = 0usize;
    let mut state = ShowMoreState::Searching;

    loop {
        state = match state {
            ShowMoreState::Searching => match locate_control(ctx, config).await {
                Ok(next) => next,
                Err(e) => {
                    warn!("exception while looking for 'show more': {e}");
                    return (stop_after_error(e), clicks);
                }
            },
            ShowMoreState::Found(control) => {
                if clicks >= config.max_clicks {
                    warn!(clicks, "show-more click budget spent");
                    return (PaginationStop::BudgetSpent, clicks);
                }
                if let Err(e) = activate_control(ctx, control, config).await {
                    warn!("exception while trying to click 'show more': {e}");
                    return (stop_after_error(e), clicks);
                }
                clicks += 1;
                ShowMoreState::Searching
            }
            ShowMoreState::Disabled => {
                info!(clicks, "'show more' button is disabled, listing complete");
                return (PaginationStop::Exhausted, clicks);
            }
            ShowMoreState::TimedOut => {
                info!(clicks, "'show more' button not found, treating listing as complete");
                return (PaginationStop::ControlMissing, clicks);
            }
        };
    }
}

async fn locate_control(
    ctx: &mut dyn RenderContext,
    config: &PaginationConfig,
) -> RenderResult<ShowMoreState> {
    if ctx
        .wait_for_element(SHOW_MORE_SELECTOR, config.control_wait)
        .await?
        == WaitOutcome::TimedOut
    {
        return Ok(ShowMoreState::TimedOut);
    }
    let Some(control) = ctx.find_element(SHOW_MORE_SELECTOR).await? else {
        return Ok(ShowMoreState::TimedOut);
    };
    if ctx.get_attribute(control, "disabled").await?.is_some() {
        return Ok(ShowMoreState::Disabled);
    }
    Ok(ShowMoreState::Found(control))
}

async fn activate_control(
    ctx: &mut dyn RenderContext,
    control: ElementHandle,
    config: &PaginationConfig,
) -> RenderResult<()> {
    ctx.scroll_into_view(control).await?;
    tokio::time::sleep(config.pre_click_pause).await;
    ctx.click(control).await?;
    info!("clicked 'show more' button");
    tokio::time::sleep(config.post_click_settle).await;
    Ok(())
}

fn stop_after_error(e: RenderError) -> PaginationStop {
    let reason = e.to_string();
    if e.is_session_fatal() {
        PaginationStop::SessionLost { reason }
    } else {
        PaginationStop::Interrupted { reason }
    }
}

async fn snapshot(ctx: &mut dyn RenderContext) -> String {
    match ctx.content().await {
        Ok(markup) => markup,
        Err(e) => {
            warn!("could not read rendered listing: {e}");
            String::new()
        }
    }
}
