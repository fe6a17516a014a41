// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, RenderContext, RenderElement, RenderEngine, RenderPage};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// 每个页面都拦截的资源地址模式
///
/// 图片、媒体、字体与样式表对字段抽取没有贡献
const BLOCKED_RESOURCE_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg", "*.ico", "*.mp4", "*.webm", "*.avi",
    "*.mp3", "*.woff", "*.woff2", "*.ttf", "*.otf", "*.css",
];

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const WARM_UP_TIMEOUT: Duration = Duration::from_secs(60);

/// Chromium渲染引擎
///
/// 基于chromiumoxide实现的浏览器渲染绑定
pub struct ChromiumEngine {
    browser: Arc<Browser>,
}

impl ChromiumEngine {
    /// 启动无头浏览器并返回引擎实例
    pub async fn launch() -> Result<Self, EngineError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(Duration::from_secs(30))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--disable-extensions")
            .build()
            .map_err(EngineError::Other)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;

        // Spawn a handler to process browser events
        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // The browser is shared by the whole run and closed with the process.
        Ok(Self {
            browser: Arc::new(browser),
        })
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn warm_up(&self) -> Result<(), EngineError> {
        tokio::time::timeout(WARM_UP_TIMEOUT, async {
            let page = self
                .browser
                .new_page("https://www.google.com/maps")
                .await
                .map_err(|e| EngineError::Navigation(e.to_string()))?;
            sleep(Duration::from_secs(8)).await;

            // 模拟少量人工滚动
            page.evaluate("window.scrollBy(0, 1200)")
                .await
                .map_err(|e| EngineError::Other(e.to_string()))?;
            sleep(Duration::from_secs(3)).await;

            page.close()
                .await
                .map(|_| ())
                .map_err(|e| EngineError::Other(e.to_string()))
        })
        .await
        .map_err(|_| EngineError::Timeout)?
    }

    async fn new_context(&self) -> Result<Box<dyn RenderContext>, EngineError> {
        let context_id = self
            .browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;

        Ok(Box::new(ChromiumContext {
            browser: self.browser.clone(),
            context_id,
        }))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

struct ChromiumContext {
    browser: Arc<Browser>,
    context_id: BrowserContextId,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn new_page(&self) -> Result<Box<dyn RenderPage>, EngineError> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(self.context_id.clone())
            .build()
            .map_err(EngineError::Other)?;

        let page = self
            .browser
            .new_page(params)
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;

        // 拦截非必要资源，降低渲染开销
        page.execute(EnableParams::default())
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;
        page.execute(SetBlockedUrLsParams::new(
            BLOCKED_RESOURCE_PATTERNS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect::<Vec<_>>(),
        ))
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?;

        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.browser
            .dispose_browser_context(self.context_id.clone())
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Other(e.to_string()))
    }
}

struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    /// 把选择器转义成JS字符串字面量
    fn selector_literal(selector: &str) -> Result<String, EngineError> {
        serde_json::to_string(selector).map_err(|e| EngineError::Other(e.to_string()))
    }
}

#[async_trait]
impl RenderPage for ChromiumPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), EngineError> {
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| EngineError::Timeout)?
            .map(|_| ())
            .map_err(|e| EngineError::Navigation(e.to_string()))
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), EngineError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(EngineError::Timeout);
            }
            sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    async fn find(&self, selector: &str) -> Result<Option<Box<dyn RenderElement>>, EngineError> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(Some(Box::new(ChromiumElement { element }))),
            // chromiumoxide reports a missing element as an error; treat it as absent
            Err(_) => Ok(None),
        }
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn RenderElement>>, EngineError> {
        let elements = self.page.find_elements(selector).await.unwrap_or_default();
        Ok(elements
            .into_iter()
            .map(|element| Box::new(ChromiumElement { element }) as Box<dyn RenderElement>)
            .collect())
    }

    async fn scroll_extent(&self, selector: &str) -> Result<i64, EngineError> {
        let literal = Self::selector_literal(selector)?;
        let script = format!(
            "(() => {{ const el = document.querySelector({literal}); return el ? el.scrollHeight : -1; }})()"
        );
        self.page
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?
            .into_value::<i64>()
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    async fn scroll_by_extent(&self, selector: &str) -> Result<(), EngineError> {
        let literal = Self::selector_literal(selector)?;
        let script = format!(
            "(() => {{ const el = document.querySelector({literal}); if (el) el.scrollBy(0, el.scrollHeight * 2); }})()"
        );
        self.page
            .evaluate(script)
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.page
            .clone()
            .close()
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Other(e.to_string()))
    }
}

struct ChromiumElement {
    element: Element,
}

#[async_trait]
impl RenderElement for ChromiumElement {
    async fn inner_text(&self) -> Result<Option<String>, EngineError> {
        self.element
            .inner_text()
            .await
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, EngineError> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| EngineError::Other(e.to_string()))
    }
}
