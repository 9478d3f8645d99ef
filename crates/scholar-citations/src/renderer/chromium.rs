//! Headless Chromium sessions over the DevTools protocol.

use super::{ElementHandle, RenderContext, RenderResult, Renderer, WaitOutcome};
use crate::config::BrowserConfig;
use crate::error::RenderError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Launches one Chromium process per context.
pub struct ChromiumRenderer {
    config: BrowserConfig,
}

impl ChromiumRenderer {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn launch_config(&self) -> RenderResult<LaunchConfig> {
        let mut builder = LaunchConfig::builder()
            .window_size(1920, 1080)
            .request_timeout(self.config.request_timeout)
            .args(["--disable-dev-shm-usage", "--disable-gpu", "--start-fullscreen"]);

        if self.config.headful {
            builder = builder.with_head();
        }
        if self.config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &self.config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(RenderError::Launch)
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> RenderResult<Box<dyn RenderContext>> {
        info!("initializing chromium session");
        let (browser, mut handler) = Browser::launch(self.launch_config()?)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        // The protocol handler must be polled for the browser to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(RenderError::Launch(e.to_string()));
            }
        };

        Ok(Box::new(ChromiumContext {
            browser,
            page,
            handler_task,
            elements: Vec::new(),
            poll_interval: self.config.poll_interval,
            close_timeout: self.config.close_timeout,
        }))
    }
}

/// A single tab in a dedicated Chromium process.
pub struct ChromiumContext {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    elements: Vec<Element>,
    poll_interval: Duration,
    close_timeout: Duration,
}

impl ChromiumContext {
    fn element(&self, handle: ElementHandle) -> RenderResult<&Element> {
        self.elements
            .get(handle.0)
            .ok_or_else(|| RenderError::StaleElement(format!("unknown handle {}", handle.0)))
    }

    /// Look up `selector`, treating "no such node" as absence.
    async fn query(&self, selector: &str) -> RenderResult<Option<Element>> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(Some(element)),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(map_cdp_error(e)),
        }
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str) -> RenderResult<()> {
        self.elements.clear();
        self.page
            .goto(url)
            .await
            .map_err(|e| match map_cdp_error(e) {
                RenderError::Protocol(reason) => RenderError::Navigation {
                    url: url.to_string(),
                    reason,
                },
                other => other,
            })?;
        Ok(())
    }

    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> RenderResult<WaitOutcome> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.query(selector).await?.is_some() {
                return Ok(WaitOutcome::Found);
            }
            if Instant::now() >= deadline {
                return Ok(WaitOutcome::TimedOut);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn scroll_by(&mut self, pixels: i64) -> RenderResult<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {pixels});"))
            .await
            .map_err(map_cdp_error)?;
        Ok(())
    }

    async fn find_element(&mut self, selector: &str) -> RenderResult<Option<ElementHandle>> {
        let Some(element) = self.query(selector).await? else {
            return Ok(None);
        };
        self.elements.push(element);
        Ok(Some(ElementHandle(self.elements.len() - 1)))
    }

    async fn scroll_into_view(&mut self, element: ElementHandle) -> RenderResult<()> {
        self.element(element)?
            .scroll_into_view()
            .await
            .map_err(map_cdp_error)?;
        Ok(())
    }

    async fn click(&mut self, element: ElementHandle) -> RenderResult<()> {
        self.element(element)?.click().await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn get_attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> RenderResult<Option<String>> {
        self.element(element)?
            .attribute(name)
            .await
            .map_err(map_cdp_error)
    }

    async fn content(&mut self) -> RenderResult<String> {
        self.page.content().await.map_err(map_cdp_error)
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        let ChromiumContext {
            mut browser,
            page,
            handler_task,
            close_timeout,
            ..
        } = *self;

        if let Err(e) = page.close().await {
            warn!("failed to close page: {e}");
        }
        let result = browser.close().await.map(|_| ()).map_err(map_cdp_error);
        if let Err(e) = &result {
            warn!("browser did not accept close ({e}), killing process");
            kill(&mut browser).await;
        }

        let exited = exit_within(browser.wait(), close_timeout).await;
        match exited {
            Some(Ok(_)) => {}
            Some(Err(e)) => warn!("failed to reap browser process: {e}"),
            None => {
                error!("browser still running after {close_timeout:?}, killing process");
                kill(&mut browser).await;
            }
        }
        handler_task.abort();
        result
    }
}

/// Await `exit` for at most `grace`; `None` means it did not finish.
async fn exit_within<F: Future>(exit: F, grace: Duration) -> Option<F::Output> {
    tokio::time::timeout(grace, exit).await.ok()
}

async fn kill(browser: &mut Browser) {
    if let Some(Err(e)) = browser.kill().await {
        warn!("failed to kill browser process: {e}");
    }
}

fn is_missing(err: &CdpError) -> bool {
    match err {
        CdpError::NotFound => true,
        CdpError::Chrome(e) => {
            let msg = e.to_string();
            msg.contains("Could not find node") || msg.contains("No node")
        }
        _ => false,
    }
}

fn map_cdp_error(err: CdpError) -> RenderError {
    match err {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
            RenderError::SessionClosed
        }
        CdpError::Timeout => RenderError::Timeout("browser request".to_string()),
        CdpError::ScrollingFailed(msg) => RenderError::ClickIntercepted(msg),
        other => {
            let msg = other.to_string();
            if msg.contains("node") || msg.contains("Node") {
                RenderError::StaleElement(msg)
            } else {
                RenderError::Protocol(msg)
            }
        }
    }
}
