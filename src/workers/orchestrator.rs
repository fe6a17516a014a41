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

use crate::domain::models::business::CityResult;
use crate::domain::models::checkpoint::RunCheckpoint;
use crate::domain::models::city::{City, TargetRegion};
use crate::domain::repositories::batch_repository::BatchRepository;
use crate::domain::repositories::checkpoint_repository::CheckpointRepository;
use crate::workers::city_crawler::CityCrawler;
use anyhow::Result;
use chrono::Local;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 批次编排参数
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// 同时在抓的城市数上限
    pub max_cities: usize,
    /// 每批落盘的城市数
    pub batch_size: usize,
    /// 固定起始下标，设置后优先于断点
    pub start_index: Option<usize>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_cities: 3,
            batch_size: 25,
            start_index: None,
        }
    }
}

/// 一次区域抓取的汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub cities_completed: usize,
    pub records_collected: usize,
    pub batches_written: usize,
}

/// 连续完成前沿
///
/// 城市会乱序完成，断点只推进到最大的连续已完成下标，
/// 保证续跑永远不会跳过未落盘的城市
#[derive(Debug)]
struct CompletionFrontier {
    start: usize,
    next: usize,
    completed: BTreeSet<usize>,
}

impl CompletionFrontier {
    fn new(start: usize) -> Self {
        Self {
            start,
            next: start,
            completed: BTreeSet::new(),
        }
    }

    fn complete(&mut self, index: usize) {
        self.completed.insert(index);
        while self.completed.remove(&self.next) {
            self.next += 1;
        }
    }

    fn last_contiguous(&self) -> Option<usize> {
        if self.next > self.start {
            Some(self.next - 1)
        } else {
            None
        }
    }
}

/// 批次编排器
///
/// 以完成序驱动全部城市：窗口内任一城市完成立即补位下一个，
/// 累计满一批就落盘并推进断点
pub struct BatchOrchestrator<B, C>
where
    B: BatchRepository,
    C: CheckpointRepository,
{
    crawler: Arc<CityCrawler>,
    batches: B,
    checkpoints: C,
    city_permits: Arc<Semaphore>,
    options: OrchestratorOptions,
}

impl<B, C> BatchOrchestrator<B, C>
where
    B: BatchRepository,
    C: CheckpointRepository,
{
    pub fn new(crawler: Arc<CityCrawler>, batches: B, checkpoints: C, options: OrchestratorOptions) -> Self {
        let city_permits = Arc::new(Semaphore::new(options.max_cities));
        Self {
            crawler,
            batches,
            checkpoints,
            city_permits,
            options,
        }
    }

    /// 驱动区域内全部城市到完成
    ///
    /// 单个城市的失败只影响该城市；持久化失败是致命错误，
    /// 立即返回并停止运行
    pub async fn run(&self, region: &TargetRegion) -> Result<RunSummary> {
        let start = self.starting_index(region).await?;
        let total = region.cities.len();
        if start >= total {
            info!(region = %region.code, "Nothing to crawl, checkpoint is already at the end");
            return Ok(RunSummary {
                cities_completed: 0,
                records_collected: 0,
                batches_written: 0,
            });
        }
        info!(
            region = %region.code,
            cities = total - start,
            start = start,
            batch_size = self.options.batch_size,
            "Starting region crawl"
        );

        let mut remaining = region.cities.iter().cloned().enumerate().skip(start);

        // Prime the window up to the city cap
        let mut in_flight: FuturesUnordered<JoinHandle<(usize, CityResult)>> =
            FuturesUnordered::new();
        for _ in 0..self.options.max_cities {
            match remaining.next() {
                Some((index, city)) => in_flight.push(self.spawn_city(index, city)),
                None => break,
            }
        }

        let mut frontier = CompletionFrontier::new(start);
        let mut pending: Vec<CityResult> = Vec::new();
        let mut batch_num = start / self.options.batch_size + 1;
        let mut summary = RunSummary {
            cities_completed: 0,
            records_collected: 0,
            batches_written: 0,
        };

        while let Some(joined) = in_flight.next().await {
            // 有任务退出就立刻补位，保持窗口饱和
            if let Some((index, city)) = remaining.next() {
                in_flight.push(self.spawn_city(index, city));
            }

            let (index, result) = match joined {
                Ok(completed) => completed,
                Err(e) => {
                    error!("City task aborted: {}", e);
                    continue;
                }
            };

            summary.cities_completed += 1;
            summary.records_collected += result.records.len();
            frontier.complete(index);
            info!(
                city = %result.city,
                records = result.records.len(),
                completed = summary.cities_completed,
                remaining = total - start - summary.cities_completed,
                "City completed"
            );
            pending.push(result);

            if pending.len() >= self.options.batch_size {
                self.flush(region, batch_num, &mut pending, &frontier).await?;
                summary.batches_written += 1;
                batch_num += 1;
            }
        }

        // Final partial batch
        if !pending.is_empty() {
            self.flush(region, batch_num, &mut pending, &frontier).await?;
            summary.batches_written += 1;
        }

        info!(
            region = %region.code,
            cities = summary.cities_completed,
            records = summary.records_collected,
            batches = summary.batches_written,
            "Region crawl complete"
        );
        Ok(summary)
    }

    fn spawn_city(&self, index: usize, city: City) -> JoinHandle<(usize, CityResult)> {
        let crawler = self.crawler.clone();
        let permits = self.city_permits.clone();
        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return (
                        index,
                        CityResult {
                            city: city.name.clone(),
                            records: Vec::new(),
                        },
                    )
                }
            };
            let result = crawler.crawl(&city).await;
            (index, result)
        })
    }

    async fn flush(
        &self,
        region: &TargetRegion,
        batch_num: usize,
        pending: &mut Vec<CityResult>,
        frontier: &CompletionFrontier,
    ) -> Result<()> {
        let path = self.batches.write_batch(region, batch_num, pending).await?;
        info!(batch = batch_num, cities = pending.len(), path = %path.display(), "Batch flushed");

        // 断点只随批次落盘一起推进
        if let Some(last) = frontier.last_contiguous() {
            self.checkpoints
                .save(&RunCheckpoint {
                    last_completed_index: last,
                    region_code: region.code.clone(),
                    timestamp: Local::now().to_rfc3339(),
                })
                .await?;
        }
        pending.clear();
        Ok(())
    }

    async fn starting_index(&self, region: &TargetRegion) -> Result<usize> {
        if let Some(fixed) = self.options.start_index {
            return Ok(fixed);
        }
        match self.checkpoints.load().await? {
            Some(checkpoint) if checkpoint.region_code == region.code => {
                info!(
                    region = %region.code,
                    resume_from = checkpoint.last_completed_index + 1,
                    "Resuming from checkpoint"
                );
                Ok(checkpoint.last_completed_index + 1)
            }
            _ => Ok(0),
        }
    }
}
