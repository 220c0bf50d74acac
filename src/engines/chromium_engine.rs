// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::engines::traits::{BrowserLauncher, BrowserSession, EngineError};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Chromium 浏览器启动器
///
/// 基于 chromiumoxide 实现。配置了远程调试地址时连接现有实例，
/// 否则为每次刷新启动一个无头浏览器。
pub struct ChromiumLauncher {
    remote_debugging_url: Option<String>,
    user_agent: String,
    step_timeout: Duration,
    poll_interval: Duration,
}

impl ChromiumLauncher {
    pub fn new(
        remote_debugging_url: Option<String>,
        user_agent: String,
        step_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            remote_debugging_url,
            user_agent,
            step_timeout,
            poll_interval,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.browser.remote_debugging_url.clone(),
            settings.site.user_agent.clone(),
            settings.step_timeout(),
            settings.poll_interval(),
        )
    }

    async fn start_browser(&self) -> Result<(Browser, JoinHandle<()>, bool), EngineError> {
        let (browser, mut handler, owned) = if let Some(ref url) = self.remote_debugging_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            let (browser, handler) = Browser::connect(url)
                .await
                .map_err(|e| EngineError::Launch(format!("Failed to connect to remote Chrome: {}", e)))?;
            (browser, handler, false)
        } else {
            let config = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(self.step_timeout)
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .build()
                .map_err(EngineError::Launch)?;

            let (browser, handler) = Browser::launch(config)
                .await
                .map_err(|e| EngineError::Launch(e.to_string()))?;
            (browser, handler, true)
        };

        // Drive CDP events until the connection drops
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handle, owned))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, EngineError> {
        let (browser, handler, owns_browser) = self.start_browser().await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(EngineError::Launch(e.to_string()));
            }
        };

        if let Err(e) = page.set_user_agent(self.user_agent.as_str()).await {
            if let Err(close_err) = page.close().await {
                warn!("Failed to close page: {}", close_err);
            }
            handler.abort();
            return Err(EngineError::Other(e.to_string()));
        }

        debug!(owns_browser, "Opened browser session");

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler,
            owns_browser,
            step_timeout: self.step_timeout,
            poll_interval: self.poll_interval,
        }))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// Chromium 页面会话
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    owns_browser: bool,
    step_timeout: Duration,
    poll_interval: Duration,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&mut self, url: &str) -> Result<(), EngineError> {
        let navigation = tokio::time::timeout(self.step_timeout, self.page.goto(url))
            .await
            .map_err(|_| EngineError::Timeout(url.to_string()))?;

        navigation.map_err(|e| EngineError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str) -> Result<(), EngineError> {
        let page = &self.page;
        let poll_interval = self.poll_interval;

        tokio::time::timeout(self.step_timeout, async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(poll_interval).await;
            }
        })
        .await
        .map_err(|_| EngineError::Timeout(selector.to_string()))
    }

    async fn click(&mut self, selector: &str) -> Result<(), EngineError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| EngineError::ElementNotFound(selector.to_string()))?
            .click()
            .await
            .map_err(|e| EngineError::Other(format!("Click on `{}` failed: {}", selector, e)))?;
        Ok(())
    }

    async fn select_option(&mut self, selector: &str, value: &str) -> Result<(), EngineError> {
        let script = select_script(selector, value)?;

        let found: bool = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| EngineError::Script(e.to_string()))?;

        if found {
            Ok(())
        } else {
            Err(EngineError::ElementNotFound(selector.to_string()))
        }
    }

    async fn content(&mut self) -> Result<String, EngineError> {
        self.page
            .content()
            .await
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    async fn close(self: Box<Self>) {
        let ChromiumSession {
            mut browser,
            page,
            handler,
            owns_browser,
            ..
        } = *self;

        if let Err(e) = page.close().await {
            warn!("Failed to close page: {}", e);
        }

        // A remote browser outlives the session; only tear down what we launched
        if owns_browser {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            let _ = browser.wait().await;
        }

        handler.abort();
        debug!("Browser session closed");
    }
}

/// 生成设置下拉框值并触发 change 事件的脚本
fn select_script(selector: &str, value: &str) -> Result<String, EngineError> {
    let selector = serde_json::to_string(selector).map_err(|e| EngineError::Script(e.to_string()))?;
    let value = serde_json::to_string(value).map_err(|e| EngineError::Script(e.to_string()))?;

    Ok(format!(
        "(() => {{ const el = document.querySelector({selector}); \
         if (!el) {{ return false; }} \
         el.value = {value}; \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return true; }})()"
    ))
}
