//! Scripted in-memory sessions for exercising the pipeline without a browser.
//!
//! Pages are keyed by URL. A listing page reveals one batch of rows per
//! click on the show-more control and reports the control disabled once
//! every batch is visible.

use super::{ElementHandle, RenderContext, RenderResult, Renderer, WaitOutcome};
use crate::config::{BrowserConfig, FetchConfig, PaginationConfig, ScrapeConfig};
use crate::error::RenderError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SHOW_MORE: &str = "#gsc_bpf_more";

/// Something a test can assert the session was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    ScrollBy(i64),
    ScrollIntoView(String),
    Click(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowMore {
    Absent,
    DisableWhenExhausted,
    NeverDisabled,
}

/// A profile page whose rows arrive in batches.
#[derive(Debug, Clone)]
pub struct ListingScript {
    pub profile_ready: bool,
    pub batches: Vec<Vec<String>>,
    pub show_more: ShowMore,
    pub click_error: Option<RenderError>,
    /// Returned when the show-more control's attributes are read.
    pub inspect_error: Option<RenderError>,
    /// Returned when waiting for the show-more control.
    pub wait_error: Option<RenderError>,
    revealed: usize,
}

impl ListingScript {
    pub fn new(batches: Vec<Vec<String>>) -> Self {
        let revealed = batches.len().min(1);
        Self {
            profile_ready: true,
            batches,
            show_more: ShowMore::DisableWhenExhausted,
            click_error: None,
            inspect_error: None,
            wait_error: None,
            revealed,
        }
    }

    pub fn show_more(mut self, show_more: ShowMore) -> Self {
        self.show_more = show_more;
        self
    }

    pub fn never_ready(mut self) -> Self {
        self.profile_ready = false;
        self
    }

    pub fn click_error(mut self, error: RenderError) -> Self {
        self.click_error = Some(error);
        self
    }

    pub fn inspect_error(mut self, error: RenderError) -> Self {
        self.inspect_error = Some(error);
        self
    }

    pub fn wait_error(mut self, error: RenderError) -> Self {
        self.wait_error = Some(error);
        self
    }

    fn render(&self) -> String {
        let header = if self.profile_ready {
            r#"<div id="gsc_prf_w"><div id="gsc_prf_in">Test Scholar</div></div>"#
        } else {
            ""
        };
        let rows: String = self
            .batches
            .iter()
            .take(self.revealed)
            .flatten()
            .map(String::as_str)
            .collect();
        let button = match self.show_more {
            ShowMore::Absent => String::new(),
            ShowMore::DisableWhenExhausted if self.revealed >= self.batches.len() => {
                r#"<button id="gsc_bpf_more" type="button" disabled>Show more</button>"#.to_string()
            }
            _ => r#"<button id="gsc_bpf_more" type="button">Show more</button>"#.to_string(),
        };
        format!(
            "<html><body>{header}<table id=\"gsc_a_t\"><tbody id=\"gsc_a_b\">{rows}</tbody></table>{button}</body></html>"
        )
    }

    fn reveal_next(&mut self) {
        if self.revealed < self.batches.len() {
            self.revealed += 1;
        }
    }
}

enum ScriptedPage {
    Static(String),
    Listing(ListingScript),
    Broken(RenderError),
}

/// Shared view of a context after it has been handed to the pipeline.
#[derive(Clone, Default)]
pub struct Recorder {
    actions: Arc<Mutex<Vec<Action>>>,
    closed: Arc<AtomicBool>,
}

impl Recorder {
    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, Action::Click(_)))
            .count()
    }

    pub fn scrolls(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, Action::ScrollBy(_)))
            .count()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct ScriptedContext {
    pages: HashMap<String, ScriptedPage>,
    current: Option<String>,
    handles: Vec<String>,
    recorder: Recorder,
    fail_close: bool,
}

impl Default for ScriptedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedContext {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            current: None,
            handles: Vec::new(),
            recorder: Recorder::default(),
            fail_close: false,
        }
    }

    pub fn with_page(mut self, url: &str, markup: impl Into<String>) -> Self {
        self.pages
            .insert(url.to_string(), ScriptedPage::Static(markup.into()));
        self
    }

    pub fn with_listing(mut self, url: &str, script: ListingScript) -> Self {
        self.pages
            .insert(url.to_string(), ScriptedPage::Listing(script));
        self
    }

    pub fn with_broken_page(mut self, url: &str, error: RenderError) -> Self {
        self.pages
            .insert(url.to_string(), ScriptedPage::Broken(error));
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }

    fn record(&self, action: Action) {
        self.recorder.actions.lock().unwrap().push(action);
    }

    fn markup(&self) -> String {
        match self.current.as_ref().and_then(|url| self.pages.get(url)) {
            Some(ScriptedPage::Static(markup)) => markup.clone(),
            Some(ScriptedPage::Listing(script)) => script.render(),
            _ => "<html><body></body></html>".to_string(),
        }
    }

    fn matches(&self, selector: &str) -> RenderResult<bool> {
        let sel = Selector::parse(selector)
            .map_err(|_| RenderError::Protocol(format!("invalid selector {selector}")))?;
        let document = Html::parse_document(&self.markup());
        let found = document.select(&sel).next().is_some();
        Ok(found)
    }

    fn listing(&self) -> Option<&ListingScript> {
        match self.current.as_ref().and_then(|url| self.pages.get(url)) {
            Some(ScriptedPage::Listing(script)) => Some(script),
            _ => None,
        }
    }

    fn selector_for(&self, element: ElementHandle) -> RenderResult<String> {
        self.handles
            .get(element.0)
            .cloned()
            .ok_or_else(|| RenderError::StaleElement(format!("unknown handle {}", element.0)))
    }
}

#[async_trait]
impl RenderContext for ScriptedContext {
    async fn navigate(&mut self, url: &str) -> RenderResult<()> {
        self.record(Action::Navigate(url.to_string()));
        self.handles.clear();
        match self.pages.get(url) {
            Some(ScriptedPage::Broken(error)) => {
                self.current = None;
                Err(error.clone())
            }
            Some(_) => {
                self.current = Some(url.to_string());
                Ok(())
            }
            None => {
                self.current = None;
                Err(RenderError::Navigation {
                    url: url.to_string(),
                    reason: "no scripted page".to_string(),
                })
            }
        }
    }

    async fn wait_for_element(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> RenderResult<WaitOutcome> {
        if selector == SHOW_MORE {
            if let Some(error) = self.listing().and_then(|s| s.wait_error.clone()) {
                return Err(error);
            }
        }
        if self.matches(selector)? {
            Ok(WaitOutcome::Found)
        } else {
            Ok(WaitOutcome::TimedOut)
        }
    }

    async fn scroll_by(&mut self, pixels: i64) -> RenderResult<()> {
        self.record(Action::ScrollBy(pixels));
        Ok(())
    }

    async fn find_element(&mut self, selector: &str) -> RenderResult<Option<ElementHandle>> {
        if !self.matches(selector)? {
            return Ok(None);
        }
        self.handles.push(selector.to_string());
        Ok(Some(ElementHandle(self.handles.len() - 1)))
    }

    async fn scroll_into_view(&mut self, element: ElementHandle) -> RenderResult<()> {
        let selector = self.selector_for(element)?;
        self.record(Action::ScrollIntoView(selector));
        Ok(())
    }

    async fn click(&mut self, element: ElementHandle) -> RenderResult<()> {
        let selector = self.selector_for(element)?;
        self.record(Action::Click(selector.clone()));

        let current = self.current.clone();
        if let Some(ScriptedPage::Listing(script)) =
            current.as_ref().and_then(|url| self.pages.get_mut(url))
        {
            if selector == SHOW_MORE {
                if let Some(error) = &script.click_error {
                    return Err(error.clone());
                }
                script.reveal_next();
            }
        }
        Ok(())
    }

    async fn get_attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> RenderResult<Option<String>> {
        let selector = self.selector_for(element)?;
        if selector == SHOW_MORE {
            if let Some(error) = self.listing().and_then(|s| s.inspect_error.clone()) {
                return Err(error);
            }
        }
        let sel = Selector::parse(&selector)
            .map_err(|_| RenderError::Protocol(format!("invalid selector {selector}")))?;
        let document = Html::parse_document(&self.markup());
        let el = document
            .select(&sel)
            .next()
            .ok_or_else(|| RenderError::StaleElement(selector.clone()))?;
        Ok(el.value().attr(name).map(str::to_string))
    }

    async fn content(&mut self) -> RenderResult<String> {
        Ok(self.markup())
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        self.recorder.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(RenderError::Protocol("scripted close failure".to_string()));
        }
        Ok(())
    }
}

/// Hands out a single scripted context, or fails to launch.
pub struct ScriptedRenderer {
    context: Mutex<Option<ScriptedContext>>,
}

impl ScriptedRenderer {
    pub fn new(context: ScriptedContext) -> Self {
        Self {
            context: Mutex::new(Some(context)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            context: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn new_context(&self) -> RenderResult<Box<dyn RenderContext>> {
        let context = self.context.lock().unwrap().take();
        match context {
            Some(context) => Ok(Box::new(context)),
            None => Err(RenderError::Launch("no scripted browser".to_string())),
        }
    }
}

/// Config with every pause and timeout zeroed.
pub fn instant_config() -> ScrapeConfig {
    ScrapeConfig {
        pagination: PaginationConfig {
            profile_timeout: Duration::ZERO,
            scroll_pause: Duration::ZERO,
            control_wait: Duration::ZERO,
            pre_click_pause: Duration::ZERO,
            post_click_settle: Duration::ZERO,
            ..PaginationConfig::default()
        },
        fetch: FetchConfig {
            article_timeout: Duration::ZERO,
            inter_article_delay: Duration::ZERO,
        },
        browser: BrowserConfig::default(),
    }
}

/// A listing row in the profile page's table layout.
pub fn listing_row(title: &str, href: &str, year: &str) -> String {
    format!(
        r#"<tr class="gsc_a_tr"><td class="gsc_a_t"><a href="{href}" class="gsc_a_at">{title}</a><div class="gs_gray">A Author, B Author</div></td><td class="gsc_a_c"><a class="gsc_a_ac gs_ibl">12</a></td><td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl">{year}</span></td></tr>"#
    )
}

/// An article detail page with one histogram bar per `(year, count)`.
pub fn article_page(bars: &[(&str, u32)]) -> String {
    let bars: String = bars
        .iter()
        .map(|(year, count)| {
            format!(
                r#"<a href="/scholar?as_ylo={year}&amp;as_yhi={year}&amp;hl=en&amp;cites=123" class="gsc_oci_g_a" style="left:10px;height:20px"><span class="gsc_oci_g_al">{count}</span></a>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><div id="gsc_oci_table"><div class="gs_scl"><div class="gsc_oci_field">Total citations</div><div class="gsc_oci_value">Cited by 14</div></div></div><div id="gsc_oci_graph_bars">{bars}</div></body></html>"#
    )
}
