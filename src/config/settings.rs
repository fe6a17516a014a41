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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 覆盖抓取、并发控制、HTTP、输入与输出的所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 抓取配置
    pub crawl: CrawlSettings,
    /// 并发控制配置
    pub concurrency: ConcurrencySettings,
    /// HTTP客户端配置
    pub http: HttpSettings,
    /// 输入配置
    pub input: InputSettings,
    /// 输出配置
    pub output: OutputSettings,
}

/// 抓取配置设置
#[derive(Debug, Deserialize)]
pub struct CrawlSettings {
    /// 目标区域代码
    pub region_code: String,
    /// 每批落盘的城市数
    pub batch_size: usize,
    /// 固定起始下标，设置后优先于断点续跑
    pub start_index: Option<usize>,
    /// 搜索页加载超时（秒）
    pub search_load_timeout: u64,
    /// 搜索页加载后的固定等待（毫秒）
    pub search_settle_ms: u64,
    /// 详情页导航超时（秒）
    pub navigation_timeout: u64,
    /// 详情页导航后的固定等待（毫秒）
    pub listing_settle_ms: u64,
    /// 等待地址控件出现的上限（毫秒）
    pub element_wait_ms: u64,
    /// 结果列表滚动的最大尝试次数
    pub max_scroll_attempts: u32,
    /// 每次滚动后的随机停顿下限（毫秒）
    pub scroll_pause_min_ms: u64,
    /// 每次滚动后的随机停顿上限（毫秒）
    pub scroll_pause_max_ms: u64,
}

/// 并发控制配置设置
#[derive(Debug, Deserialize)]
pub struct ConcurrencySettings {
    /// 同时在抓的城市数上限
    pub max_cities: usize,
    /// 全区域共享的商户抓取并发上限
    pub max_listings: usize,
}

/// HTTP客户端配置设置
#[derive(Debug, Deserialize)]
pub struct HttpSettings {
    /// 邮箱解析抓取超时（秒）
    pub email_timeout: u64,
    /// 每主机连接池上限
    pub pool_max_per_host: usize,
}

/// 输入配置设置
#[derive(Debug, Deserialize)]
pub struct InputSettings {
    /// 城市清单文件路径
    pub cities_file: String,
}

/// 输出配置设置
#[derive(Debug, Deserialize)]
pub struct OutputSettings {
    /// 批次输出目录
    pub batch_dir: String,
    /// 合并输出目录
    pub combined_dir: String,
    /// 断点文件路径
    pub checkpoint_file: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default crawl settings
            .set_default("crawl.region_code", "AZ")?
            .set_default("crawl.batch_size", 25)?
            .set_default("crawl.search_load_timeout", 45)?
            .set_default("crawl.search_settle_ms", 3000)?
            .set_default("crawl.navigation_timeout", 30)?
            .set_default("crawl.listing_settle_ms", 1000)?
            .set_default("crawl.element_wait_ms", 1500)?
            .set_default("crawl.max_scroll_attempts", 25)?
            .set_default("crawl.scroll_pause_min_ms", 800)?
            .set_default("crawl.scroll_pause_max_ms", 1500)?
            // Default concurrency settings
            .set_default("concurrency.max_cities", 3)?
            .set_default("concurrency.max_listings", 3)?
            // Default HTTP settings
            .set_default("http.email_timeout", 3)?
            .set_default("http.pool_max_per_host", 10)?
            // Default input/output settings
            .set_default("input.cities_file", "usa_cities.csv")?
            .set_default("output.batch_dir", "batch_output")?
            .set_default("output.combined_dir", "combined_output")?
            .set_default("output.checkpoint_file", "scraping_progress.json")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("MAPLEADS").separator("__"));

        builder.build()?.try_deserialize()
    }
}
