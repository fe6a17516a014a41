// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::business::{BusinessRecord, UNKNOWN};
use crate::domain::services::email_service::EmailService;
use crate::domain::services::extraction_service::{ExtractionService, ADDRESS_SELECTOR};
use crate::engines::traits::{RenderContext, RenderPage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

/// 单个商户抓取的时间参数
#[derive(Debug, Clone)]
pub struct FetchTuning {
    /// 详情页导航超时
    pub navigation_timeout: Duration,
    /// 导航后的固定等待
    pub settle_wait: Duration,
    /// 等待地址控件出现的上限
    pub element_wait: Duration,
}

impl Default for FetchTuning {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            settle_wait: Duration::from_millis(1000),
            element_wait: Duration::from_millis(1500),
        }
    }
}

/// 商户抓取器
///
/// 每次调用在整个生命周期内占用共享商户许可池的一个许可，
/// 全区域同时在抓的商户数因此有界
pub struct ListingFetcher {
    email_service: EmailService,
    listing_permits: Arc<Semaphore>,
    tuning: FetchTuning,
}

impl ListingFetcher {
    pub fn new(
        email_service: EmailService,
        listing_permits: Arc<Semaphore>,
        tuning: FetchTuning,
    ) -> Self {
        Self {
            email_service,
            listing_permits,
            tuning,
        }
    }

    /// 抓取一条商户记录
    ///
    /// 导航失败返回 `None`，该商户直接跳过，不重试
    pub async fn fetch(&self, context: &dyn RenderContext, reference: &str) -> Option<BusinessRecord> {
        let _permit = self.listing_permits.acquire().await.ok()?;

        let page = match context.new_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to open listing page: {}", e);
                return None;
            }
        };

        let record = self.fetch_on_page(page.as_ref(), reference).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close listing page: {}", e);
        }

        record
    }

    async fn fetch_on_page(
        &self,
        page: &dyn RenderPage,
        reference: &str,
    ) -> Option<BusinessRecord> {
        if let Err(e) = page.goto(reference, self.tuning.navigation_timeout).await {
            debug!("Listing navigation failed: {}", e);
            return None;
        }
        sleep(self.tuning.settle_wait).await;

        // 地址控件可能晚于页面加载事件渲染，限时等待后无论结果如何继续
        let _ = page
            .wait_for_selector(ADDRESS_SELECTOR, self.tuning.element_wait)
            .await;

        let mut record = ExtractionService::extract(page, reference).await;
        if record.website != UNKNOWN {
            record.email = self.email_service.resolve(&record.website).await;
        }
        Some(record)
    }
}
