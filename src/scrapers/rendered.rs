//! Rendering extractor: headless Chromium fetch, then the shared parser.
//!
//! Every URL gets its own browser process and throwaway profile directory.
//! Nothing is pooled, so one misbehaving page cannot leak state into the
//! next. The session is closed on every exit path:
//!
//! 1. [`BrowserSession::close`] runs after capture whether capture worked or not.
//! 2. If the future is dropped or a panic unwinds past the session, `Drop`
//!    aborts the CDP handler task, lets `Browser`'s own drop kill the
//!    process, and removes the profile directory.

use super::Renderer;
use super::parse::parse_document;
use crate::config::{BrowserSettings, HarvestConfig};
use crate::errors::RenderError;
use crate::models::ParsedDocument;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

/// Chrome request timeout for CDP commands; navigation has its own bound.
const CDP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RenderingExtractor {
    settings: BrowserSettings,
    navigation_timeout: Duration,
}

impl RenderingExtractor {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            settings: config.browser.clone(),
            navigation_timeout: config.navigation_timeout(),
        }
    }
}

impl Renderer for RenderingExtractor {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn render_and_parse(&self, url: &str) -> Result<ParsedDocument, RenderError> {
        let t0 = Instant::now();
        let session = BrowserSession::launch(&self.settings).await?;
        let captured = session.capture(url, self.navigation_timeout).await;
        session.close().await;
        let html = captured?;

        info!(
            bytes = html.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Captured rendered HTML"
        );
        ensure_content(parse_document(url, &html))
    }
}

/// A render that produced neither a title nor any text is a failure.
fn ensure_content(doc: ParsedDocument) -> Result<ParsedDocument, RenderError> {
    if doc.title.trim().is_empty() && doc.text.trim().is_empty() {
        return Err(RenderError::Empty);
    }
    Ok(doc)
}

/// One short-lived browser process plus its CDP event pump.
struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    profile_dir: Option<PathBuf>,
}

impl BrowserSession {
    async fn launch(settings: &BrowserSettings) -> Result<Self, RenderError> {
        let profile_dir = std::env::temp_dir().join(format!(
            "article_harvest_{}_{:016x}",
            std::process::id(),
            rand::random::<u64>()
        ));

        let mut builder = BrowserConfig::builder()
            .request_timeout(CDP_REQUEST_TIMEOUT)
            .window_size(1366, 900)
            .user_data_dir(&profile_dir)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-notifications")
            .arg("--disable-background-networking")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--mute-audio");

        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        if !settings.headless {
            builder = builder.with_head();
        }
        if settings.sandbox_disabled() {
            debug!("Starting browser without sandbox");
            builder = builder.no_sandbox();
        }

        let config = builder.build().map_err(RenderError::Launch)?;
        let (browser, mut events) = match Browser::launch(config).await {
            Ok(pair) => pair,
            Err(e) => {
                remove_profile_dir(&profile_dir);
                return Err(RenderError::Launch(e.to_string()));
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    // chromiumoxide reports CDP messages it cannot decode here;
                    // they do not affect page capture.
                    trace!(error = %e, "Browser handler event error");
                }
            }
        });

        debug!(profile = %profile_dir.display(), "Browser session started");
        Ok(Self {
            browser: Some(browser),
            handler,
            profile_dir: Some(profile_dir),
        })
    }

    /// Navigate, wait for the load to settle, and return the live DOM as HTML.
    async fn capture(&self, url: &str, timeout: Duration) -> Result<String, RenderError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| RenderError::Launch("browser session already closed".to_string()))?;

        let navigation = async {
            let page = browser
                .new_page(url)
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            Ok::<_, RenderError>(page)
        };

        let page = tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| RenderError::Timeout(timeout))??;

        page.content()
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))
    }

    /// Shut the browser down and remove its profile directory.
    async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "Browser close command failed");
            }
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "Waiting for browser exit failed");
            }
        }
        self.handler.abort();
        if let Some(dir) = self.profile_dir.take() {
            remove_profile_dir(&dir);
        }
        debug!("Browser session closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if self.browser.take().is_some() {
            warn!("Browser session dropped without close; process killed on drop");
        }
        if let Some(dir) = self.profile_dir.take() {
            remove_profile_dir(&dir);
        }
    }
}

fn remove_profile_dir(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(dir) {
        warn!(path = %dir.display(), error = %e, "Failed to remove browser profile directory");
    }
}
