//! Browser session lifecycle. One headless engine and one page context per
//! run, exclusively owned, released on every exit path.

use crate::config::BrowserConfig;
use crate::{Error, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One browser instance plus one page context. Owns the CDP handler pump
/// task for the lifetime of the session.
pub struct Session {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl Session {
    /// Start the rendering engine and open a blank page context.
    pub async fn acquire(config: &BrowserConfig) -> Result<Self> {
        let (width, height) = config
            .viewport
            .map(|v| (v.width, v.height))
            .unwrap_or((1280, 720));

        let mut builder = LaunchConfig::builder()
            .window_size(width, height)
            .arg("--no-sandbox")
            .arg("--disable-gpu");
        if !config.headless {
            builder = builder.with_head();
        }
        let launch = builder
            .build()
            .map_err(|e| Error::Session(format!("browser config: {}", e)))?;

        debug!("launching browser (headless: {})", config.headless);
        let (mut browser, mut handler) = Browser::launch(launch)
            .await
            .map_err(|e| Error::Session(format!("browser launch: {}", e)))?;

        // The handler stream must be pumped for the page to make progress.
        // It ends on its own once the browser closes.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("cdp handler: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // Release whatever partially exists before surfacing.
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(Error::Session(format!("page open: {}", e)));
            }
        };

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// The page context of this session.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Close the page and terminate the engine. Called unconditionally by the
    /// harness, whatever the run outcome was.
    pub async fn release(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        match closed {
            Ok(_) => {
                let _ = self.browser.wait().await;
                // Handler drains and finishes once the browser is gone.
                if let Err(e) = self.handler_task.await {
                    warn!("handler task: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                self.handler_task.abort();
                Err(Error::Session(format!("browser close: {}", e)))
            }
        }
    }
}
