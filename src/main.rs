// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use mapleads::config::settings::Settings;
use mapleads::domain::services::email_service::EmailService;
use mapleads::engines::chromium_engine::ChromiumEngine;
use mapleads::engines::traits::RenderEngine;
use mapleads::infrastructure::checkpoint_store::JsonCheckpointStore;
use mapleads::infrastructure::city_list;
use mapleads::infrastructure::csv_batch::CsvBatchRepository;
use mapleads::utils::telemetry;
use mapleads::workers::city_crawler::{CityCrawler, CrawlTuning};
use mapleads::workers::listing_fetcher::{FetchTuning, ListingFetcher};
use mapleads::workers::orchestrator::{BatchOrchestrator, OrchestratorOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并驱动区域抓取
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting mapleads...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // 3. Load the city list for the target region
    let region = city_list::load_region(
        Path::new(&settings.input.cities_file),
        &settings.crawl.region_code,
    )?;
    info!(region = %region.name, code = %region.code, cities = region.cities.len(), "Region loaded");

    // 4. Launch the rendering engine and warm up the shared session
    let engine: Arc<dyn RenderEngine> = Arc::new(ChromiumEngine::launch().await?);
    info!(engine = engine.name(), "Rendering engine ready");
    if let Err(e) = engine.warm_up().await {
        warn!("Session warm-up failed, continuing anyway: {}", e);
    }

    // 5. Shared HTTP client for email resolution
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(settings.http.pool_max_per_host)
        .build()?;
    let email_service = EmailService::new(client, Duration::from_secs(settings.http.email_timeout));

    // 6. Assemble the workers
    let listing_permits = Arc::new(Semaphore::new(settings.concurrency.max_listings));
    let fetcher = Arc::new(ListingFetcher::new(
        email_service,
        listing_permits,
        FetchTuning {
            navigation_timeout: Duration::from_secs(settings.crawl.navigation_timeout),
            settle_wait: Duration::from_millis(settings.crawl.listing_settle_ms),
            element_wait: Duration::from_millis(settings.crawl.element_wait_ms),
        },
    ));
    let crawler = Arc::new(CityCrawler::new(
        engine,
        fetcher,
        CrawlTuning {
            search_load_timeout: Duration::from_secs(settings.crawl.search_load_timeout),
            search_settle: Duration::from_millis(settings.crawl.search_settle_ms),
            max_scroll_attempts: settings.crawl.max_scroll_attempts,
            scroll_pause_min: Duration::from_millis(settings.crawl.scroll_pause_min_ms),
            scroll_pause_max: Duration::from_millis(settings.crawl.scroll_pause_max_ms),
        },
    ));

    let orchestrator = BatchOrchestrator::new(
        crawler,
        CsvBatchRepository::new(&settings.output.batch_dir),
        JsonCheckpointStore::new(&settings.output.checkpoint_file),
        OrchestratorOptions {
            max_cities: settings.concurrency.max_cities,
            batch_size: settings.crawl.batch_size,
            start_index: settings.crawl.start_index,
        },
    );

    // 7. Drive the region to completion
    let started = Instant::now();
    let summary = orchestrator.run(&region).await?;
    info!(
        cities = summary.cities_completed,
        records = summary.records_collected,
        batches = summary.batches_written,
        elapsed_secs = started.elapsed().as_secs(),
        "Crawl complete"
    );
    Ok(())
}
