//! Rendered-page sessions.
//!
//! A [`RenderContext`] is one live browser tab that can navigate, wait for
//! markup to appear, scroll, click, and hand back the rendered document.
//! The pipeline owns exactly one context per run and lends it to the
//! paginator and citation fetcher as `&mut dyn RenderContext`.

pub mod chromium;
#[cfg(test)]
pub mod testing;

use crate::error::RenderError;
use async_trait::async_trait;
use std::time::Duration;

pub type RenderResult<T> = Result<T, RenderError>;

/// Opaque reference to an element located in the current page.
///
/// Handles are invalidated by the next navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub(crate) usize);

/// Result of waiting for a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Found,
    TimedOut,
}

/// A live browser tab.
#[async_trait]
pub trait RenderContext: Send {
    /// Load `url` in this tab.
    async fn navigate(&mut self, url: &str) -> RenderResult<()>;

    /// Wait until `selector` matches something, or `timeout` elapses.
    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> RenderResult<WaitOutcome>;

    /// Scroll the window vertically by `pixels`.
    async fn scroll_by(&mut self, pixels: i64) -> RenderResult<()>;

    /// First element matching `selector`, if any.
    async fn find_element(&mut self, selector: &str) -> RenderResult<Option<ElementHandle>>;

    async fn scroll_into_view(&mut self, element: ElementHandle) -> RenderResult<()>;

    async fn click(&mut self, element: ElementHandle) -> RenderResult<()>;

    async fn get_attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> RenderResult<Option<String>>;

    /// The current rendered markup.
    async fn content(&mut self) -> RenderResult<String>;

    /// Tear down the tab and its browser.
    async fn close(self: Box<Self>) -> RenderResult<()>;
}

/// Factory for rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn new_context(&self) -> RenderResult<Box<dyn RenderContext>>;
}
