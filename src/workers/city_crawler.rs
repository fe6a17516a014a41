// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::business::{BusinessRecord, CityResult};
use crate::domain::models::city::City;
use crate::domain::models::crawl::CrawlStage;
use crate::engines::traits::{RenderContext, RenderEngine, RenderPage};
use crate::workers::listing_fetcher::ListingFetcher;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// 地图搜索入口
pub const SEARCH_BASE_URL: &str = "https://www.google.com/maps/search/";
/// 结果列表容器
pub const FEED_SELECTOR: &str = "div[role='feed']";
/// 结果列表中的商户链接
pub const LISTING_ANCHOR_SELECTOR: &str = "a[href*='/maps/place']";

/// 城市抓取调优参数
#[derive(Debug, Clone)]
pub struct CrawlTuning {
    /// 搜索页加载超时
    pub search_load_timeout: Duration,
    /// 搜索页加载后的固定等待
    pub search_settle: Duration,
    /// 滚动收敛的最大尝试次数
    pub max_scroll_attempts: u32,
    /// 每次滚动后的随机停顿下限
    pub scroll_pause_min: Duration,
    /// 每次滚动后的随机停顿上限
    pub scroll_pause_max: Duration,
}

impl Default for CrawlTuning {
    fn default() -> Self {
        Self {
            search_load_timeout: Duration::from_secs(45),
            search_settle: Duration::from_secs(3),
            max_scroll_attempts: 25,
            scroll_pause_min: Duration::from_millis(800),
            scroll_pause_max: Duration::from_millis(1500),
        }
    }
}

/// 城市抓取器
///
/// 每个城市在独立上下文里执行 搜索 → 滚动 → 收集 → 抓取。
/// 任何阶段失败都只影响本城市，上下文在所有退出路径上销毁。
pub struct CityCrawler {
    engine: Arc<dyn RenderEngine>,
    fetcher: Arc<ListingFetcher>,
    tuning: CrawlTuning,
}

impl CityCrawler {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        fetcher: Arc<ListingFetcher>,
        tuning: CrawlTuning,
    ) -> Self {
        Self {
            engine,
            fetcher,
            tuning,
        }
    }

    /// 抓取一个城市
    ///
    /// 永不失败，最坏情况返回空结果
    pub async fn crawl(&self, city: &City) -> CityResult {
        let context = match self.engine.new_context().await {
            Ok(context) => context,
            Err(e) => {
                warn!(city = %city.name, "Failed to create browsing context: {}", e);
                return CityResult {
                    city: city.name.clone(),
                    records: Vec::new(),
                };
            }
        };

        let records = self.crawl_in_context(context.as_ref(), city).await;

        // 无论成功与否都销毁上下文
        if let Err(e) = context.close().await {
            warn!(city = %city.name, "Failed to dispose browsing context: {}", e);
        }

        info!(city = %city.name, records = records.len(), stage = %CrawlStage::Done, "City crawl finished");
        CityResult {
            city: city.name.clone(),
            records,
        }
    }

    async fn crawl_in_context(&self, context: &dyn RenderContext, city: &City) -> Vec<BusinessRecord> {
        let page = match context.new_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!(city = %city.name, "Failed to open search page: {}", e);
                return Vec::new();
            }
        };

        info!(city = %city.name, stage = %CrawlStage::Searching, "Loading search results");
        let search_url = search_url(&city.name, &city.region);
        if let Err(e) = page.goto(&search_url, self.tuning.search_load_timeout).await {
            warn!(city = %city.name, "Search navigation failed: {}", e);
            let _ = page.close().await;
            return Vec::new();
        }
        sleep(self.tuning.search_settle).await;

        debug!(city = %city.name, stage = %CrawlStage::Scrolling, "Expanding results feed");
        self.scroll_results_feed(page.as_ref()).await;

        let references = collect_references(page.as_ref()).await;
        if let Err(e) = page.close().await {
            debug!(city = %city.name, "Failed to close search page: {}", e);
        }
        info!(city = %city.name, listings = references.len(), stage = %CrawlStage::Fetching, "Fetching listings");

        let mut fetches: FuturesUnordered<_> = references
            .iter()
            .map(|reference| self.fetcher.fetch(context, reference))
            .collect();

        let mut records = Vec::new();
        while let Some(fetched) = fetches.next().await {
            if let Some(record) = fetched {
                records.push(record);
            }
        }
        records
    }

    /// 滚动结果列表直到范围收敛
    ///
    /// 连续两次轮询范围不变即认为到底，否则最多尝试
    /// `max_scroll_attempts` 次
    async fn scroll_results_feed(&self, page: &dyn RenderPage) {
        match page.find(FEED_SELECTOR).await {
            Ok(Some(_)) => {}
            _ => return,
        }

        let mut previous_extent = 0i64;
        let mut stall_count = 0u32;

        for _ in 0..self.tuning.max_scroll_attempts {
            if page.scroll_by_extent(FEED_SELECTOR).await.is_err() {
                break;
            }
            sleep(self.random_pause()).await;

            let current_extent = match page.scroll_extent(FEED_SELECTOR).await {
                Ok(extent) => extent,
                Err(_) => break,
            };

            if current_extent == previous_extent {
                stall_count += 1;
            } else {
                stall_count = 0;
            }
            if stall_count >= 2 {
                break;
            }
            previous_extent = current_extent;
        }
    }

    fn random_pause(&self) -> Duration {
        let min = self.tuning.scroll_pause_min.as_millis() as u64;
        let max = self.tuning.scroll_pause_max.as_millis() as u64;
        Duration::from_millis(rand::random_range(min..=max))
    }
}

/// 由固定模板构造搜索地址
pub fn search_url(city: &str, region: &str) -> String {
    let query = format!("Hair Salon in {}, {}, USA", city, region);
    format!("{}{}", SEARCH_BASE_URL, query.replace(' ', "+"))
}

async fn collect_references(page: &dyn RenderPage) -> HashSet<String> {
    let mut references = HashSet::new();
    let anchors = page
        .find_all(LISTING_ANCHOR_SELECTOR)
        .await
        .unwrap_or_default();
    for anchor in anchors {
        if let Ok(Some(href)) = anchor.attribute("href").await {
            references.insert(href);
        }
    }
    references
}
