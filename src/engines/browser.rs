// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::engines::traits::EngineError;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 浏览器会话
///
/// 独占一个 Chromium 进程。调用方应在所有退出路径上调用 [`BrowserSession::close`]；
/// 遗漏时 `Drop` 会终止事件循环任务，进程随 `Browser` 一起回收。
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    user_agent: String,
    window_width: u32,
    window_height: u32,
}

impl BrowserSession {
    /// 启动无头浏览器
    ///
    /// # 参数
    ///
    /// * `settings` - 抓取配置，提供窗口大小、UA 与请求超时
    ///
    /// # 返回值
    ///
    /// * `Ok(BrowserSession)` - 已启动的会话
    /// * `Err(EngineError::Browser)` - 配置无效或进程无法启动
    pub async fn launch(settings: &ScraperSettings) -> Result<Self, EngineError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(settings.window_width, settings.window_height)
            .request_timeout(settings.page_timeout())
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-extensions")
            .build()
            .map_err(EngineError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // Spawn a task to handle browser events
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        debug!("Browser session launched");
        Ok(Self {
            browser: Some(browser),
            handler,
            user_agent: settings.user_agent.clone(),
            window_width: settings.window_width,
            window_height: settings.window_height,
        })
    }

    /// 打开一个已设置视口与 UA 的空白页面
    pub async fn new_page(&self) -> Result<Page, EngineError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| EngineError::Browser("browser session already closed".to_string()))?;

        let page = browser.new_page("about:blank").await?;
        page.execute(SetDeviceMetricsOverrideParams::new(
            self.window_width as i64,
            self.window_height as i64,
            1.0,
            false,
        ))
        .await?;
        page.set_user_agent(self.user_agent.as_str()).await?;
        Ok(page)
    }

    /// 关闭浏览器并等待进程退出
    pub async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            match tokio::time::timeout(Duration::from_secs(5), browser.wait()).await {
                Ok(Ok(_)) => debug!("Browser process exited"),
                Ok(Err(e)) => warn!("Failed to wait for browser process: {}", e),
                Err(_) => warn!("Browser process did not exit in time"),
            }
        }
        self.handler.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            warn!("Browser session dropped without close");
        }
        self.handler.abort();
    }
}
