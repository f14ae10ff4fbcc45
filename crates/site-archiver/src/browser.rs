//! Page-load and page-render capabilities.
//!
//! [`PageLoader`] and [`PageRenderer`] are what the crawler and the renderer
//! driver talk to. [`ChromePage`] implements both over a headless Chromium
//! driven through the DevTools protocol.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::{BrowserSettings, PageLayout, RenderConfig, mm_to_inches};
use crate::error::BrowserError;

/// Id of the identification banner injected before printing.
pub const BANNER_ID: &str = "print-slug-header";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Document geometry reported after one scroll step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub scroll_height: u64,
    pub viewport_height: u64,
}

#[async_trait]
pub trait PageLoader: Send {
    /// Navigates to `url` and returns the document URL once the page has
    /// settled. It differs from `url` when the site redirected.
    async fn load(&mut self, url: &Url) -> Result<Url, BrowserError>;

    /// Serialized DOM of the current page.
    async fn html(&mut self) -> Result<String, BrowserError>;

    /// Clicks the first button whose text contains one of `phrases`
    /// (lower-case). Returns whether anything was clicked.
    async fn click_button_matching(&mut self, phrases: &[String]) -> Result<bool, BrowserError>;

    async fn scroll_by(&mut self, distance: u32) -> Result<ScrollMetrics, BrowserError>;

    /// Prepends the banner, replacing one left by a previous page.
    async fn inject_banner(&mut self, text: &str) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait PageRenderer: Send {
    async fn render(&mut self, layout: &PageLayout) -> Result<Vec<u8>, BrowserError>;
}

/// One browser process. Pages created from it share the process.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl BrowserSession {
    pub async fn launch(
        settings: &BrowserSettings,
        render: &RenderConfig,
    ) -> Result<Self, BrowserError> {
        let (browser, mut handler) = match settings.websocket_url.as_deref() {
            Some(ws_url) => {
                tracing::info!("Connecting to running browser at {}", ws_url);
                Browser::connect(ws_url)
                    .await
                    .map_err(|e| BrowserError::Launch(e.to_string()))?
            }
            None => {
                let mut builder = BrowserConfig::builder()
                    .window_size(render.viewport_width, render.viewport_height)
                    .request_timeout(settings.navigation_timeout());
                if !settings.headless {
                    builder = builder.with_head();
                }
                let config = builder.build().map_err(BrowserError::Launch)?;
                tracing::info!("Launching headless browser");
                Browser::launch(config)
                    .await
                    .map_err(|e| BrowserError::Launch(e.to_string()))?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            navigation_timeout: settings.navigation_timeout(),
        })
    }

    /// Opens a new page context, optionally with a fixed viewport.
    pub async fn new_page(&self, viewport: Option<Viewport>) -> Result<ChromePage, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        if let Some(viewport) = viewport {
            page.execute(SetDeviceMetricsOverrideParams::new(
                i64::from(viewport.width),
                i64::from(viewport.height),
                1.0,
                false,
            ))
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        }

        Ok(ChromePage {
            page,
            navigation_timeout: self.navigation_timeout,
        })
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Failed to wait for browser process: {}", e);
        }
        self.handler.abort();
    }
}

pub struct ChromePage {
    page: Page,
    navigation_timeout: Duration,
}

impl ChromePage {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T, BrowserError> {
        self.page
            .evaluate_expression(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }
}

#[async_trait]
impl PageLoader for ChromePage {
    async fn load(&mut self, url: &Url) -> Result<Url, BrowserError> {
        let navigation = async {
            self.page.goto(url.as_str()).await?;
            self.page.wait_for_navigation().await?;
            self.page.url().await
        };

        match tokio::time::timeout(self.navigation_timeout, navigation).await {
            Ok(Ok(final_url)) => Ok(final_url
                .and_then(|final_url| Url::parse(&final_url).ok())
                .unwrap_or_else(|| url.clone())),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(BrowserError::Timeout {
                url: url.to_string(),
                timeout_ms: self.navigation_timeout.as_millis() as u64,
            }),
        }
    }

    async fn html(&mut self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn click_button_matching(&mut self, phrases: &[String]) -> Result<bool, BrowserError> {
        self.eval(click_button_script(phrases)).await
    }

    async fn scroll_by(&mut self, distance: u32) -> Result<ScrollMetrics, BrowserError> {
        self.eval(scroll_script(distance)).await
    }

    async fn inject_banner(&mut self, text: &str) -> Result<(), BrowserError> {
        self.eval::<bool>(banner_script(text)).await.map(|_| ())
    }
}

#[async_trait]
impl PageRenderer for ChromePage {
    async fn render(&mut self, layout: &PageLayout) -> Result<Vec<u8>, BrowserError> {
        self.page
            .pdf(print_params(layout))
            .await
            .map_err(|e| BrowserError::Render(e.to_string()))
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn click_button_script(phrases: &[String]) -> String {
    let phrases: Vec<String> = phrases.iter().map(|p| p.to_lowercase()).collect();
    let phrases = serde_json::to_string(&phrases).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
    const phrases = {phrases};
    const button = Array.from(document.querySelectorAll('button')).find((b) => {{
        const text = (b.innerText || '').toLowerCase();
        return phrases.some((p) => text.includes(p));
    }});
    if (button) {{
        button.click();
        return true;
    }}
    return false;
}})()"#
    )
}

fn scroll_script(distance: u32) -> String {
    format!(
        r#"(() => {{
    const scrollHeight = document.body.scrollHeight;
    window.scrollBy(0, {distance});
    return {{ scrollHeight, viewportHeight: window.innerHeight }};
}})()"#
    )
}

fn banner_script(text: &str) -> String {
    format!(
        r#"(() => {{
    const old = document.getElementById('{BANNER_ID}');
    if (old) old.remove();
    const banner = document.createElement('div');
    banner.id = '{BANNER_ID}';
    const label = document.createElement('div');
    label.style.cssText = 'font-family: monospace; font-size: 12px; font-weight: bold; color: #000; border-bottom: 2px solid #000; padding: 5px 0; margin-bottom: 20px;';
    label.textContent = {text};
    banner.appendChild(label);
    document.body.prepend(banner);
    return true;
}})()"#,
        text = js_string(text)
    )
}

fn print_params(layout: &PageLayout) -> PrintToPdfParams {
    PrintToPdfParams {
        print_background: Some(layout.print_background),
        paper_width: Some(mm_to_inches(layout.paper_width_mm)),
        paper_height: Some(mm_to_inches(layout.paper_height_mm)),
        margin_top: Some(mm_to_inches(layout.margin_top_mm)),
        margin_bottom: Some(mm_to_inches(layout.margin_bottom_mm)),
        margin_left: Some(mm_to_inches(layout.margin_left_mm)),
        margin_right: Some(mm_to_inches(layout.margin_right_mm)),
        ..Default::default()
    }
}
