// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{fast_crawler, region_of, MockRenderEngine, MockWorld};
use async_trait::async_trait;
use mapleads::domain::models::business::CityResult;
use mapleads::domain::models::checkpoint::RunCheckpoint;
use mapleads::domain::models::city::TargetRegion;
use mapleads::domain::repositories::batch_repository::BatchRepository;
use mapleads::domain::repositories::checkpoint_repository::CheckpointRepository;
use mapleads::engines::traits::RenderEngine;
use mapleads::infrastructure::checkpoint_store::JsonCheckpointStore;
use mapleads::infrastructure::csv_batch::CsvBatchRepository;
use mapleads::utils::errors::RepositoryError;
use mapleads::workers::city_crawler::search_url;
use mapleads::workers::orchestrator::{BatchOrchestrator, OrchestratorOptions};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn read_checkpoint(path: &PathBuf) -> RunCheckpoint {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// 批次不变式测试
///
/// 7个城市、批大小3：恰好3个批次（3、3、1），
/// 最终断点下标为6
#[tokio::test]
async fn seven_cities_flush_as_three_batches_and_checkpoint_lands_on_six() {
    let tmp = tempfile::tempdir().unwrap();
    let region = region_of(7);
    let world = Arc::new(MockWorld::for_region(&region, 2));
    let engine: Arc<dyn RenderEngine> = Arc::new(MockRenderEngine::new(world.clone()));

    let batch_dir = tmp.path().join("batches");
    let checkpoint_path = tmp.path().join("progress.json");
    let orchestrator = BatchOrchestrator::new(
        fast_crawler(engine),
        CsvBatchRepository::new(&batch_dir),
        JsonCheckpointStore::new(&checkpoint_path),
        OrchestratorOptions {
            max_cities: 3,
            batch_size: 3,
            start_index: None,
        },
    );

    let summary = orchestrator.run(&region).await.unwrap();

    assert_eq!(summary.cities_completed, 7);
    assert_eq!(summary.records_collected, 14);
    assert_eq!(summary.batches_written, 3);

    // 每个城市恰好出现在一个批次里
    let dirs: Vec<_> = fs::read_dir(&batch_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(dirs.len(), 3);

    let mut table_counts: Vec<usize> = dirs
        .iter()
        .map(|dir| fs::read_dir(dir).unwrap().count())
        .collect();
    table_counts.sort_unstable();
    assert_eq!(table_counts, vec![1, 3, 3]);

    let mut cities: Vec<String> = dirs
        .iter()
        .flat_map(|dir| {
            fs::read_dir(dir).unwrap().map(|entry| {
                entry
                    .unwrap()
                    .path()
                    .file_stem()
                    .unwrap()
                    .to_str()
                    .unwrap()
                    .to_string()
            })
        })
        .collect();
    cities.sort();
    assert_eq!(cities.len(), 7);
    cities.dedup();
    assert_eq!(cities.len(), 7);

    let checkpoint = read_checkpoint(&checkpoint_path);
    assert_eq!(checkpoint.last_completed_index, 6);
    assert_eq!(checkpoint.region_code, "AZ");
}

/// 续跑测试
///
/// 断点在5时，新一轮运行从下标6开始，0到5不再访问
#[tokio::test]
async fn resume_starts_strictly_after_the_checkpoint() {
    let tmp = tempfile::tempdir().unwrap();
    let region = region_of(7);
    let world = Arc::new(MockWorld::for_region(&region, 1));
    let engine: Arc<dyn RenderEngine> = Arc::new(MockRenderEngine::new(world.clone()));

    let checkpoint_path = tmp.path().join("progress.json");
    let store = JsonCheckpointStore::new(&checkpoint_path);
    store
        .save(&RunCheckpoint {
            last_completed_index: 5,
            region_code: "AZ".to_string(),
            timestamp: "2025-11-02T10:00:00-07:00".to_string(),
        })
        .await
        .unwrap();

    let orchestrator = BatchOrchestrator::new(
        fast_crawler(engine),
        CsvBatchRepository::new(tmp.path().join("batches")),
        JsonCheckpointStore::new(&checkpoint_path),
        OrchestratorOptions {
            max_cities: 3,
            batch_size: 3,
            start_index: None,
        },
    );

    let summary = orchestrator.run(&region).await.unwrap();
    assert_eq!(summary.cities_completed, 1);
    assert_eq!(summary.batches_written, 1);

    let visited = world.visited_searches.lock().unwrap().clone();
    assert_eq!(visited, vec![search_url("City6", "Arizona")]);

    assert_eq!(read_checkpoint(&checkpoint_path).last_completed_index, 6);
}

/// 其他区域的断点不影响本区域
#[tokio::test]
async fn foreign_checkpoint_is_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let region = region_of(2);
    let world = Arc::new(MockWorld::for_region(&region, 1));
    let engine: Arc<dyn RenderEngine> = Arc::new(MockRenderEngine::new(world.clone()));

    let checkpoint_path = tmp.path().join("progress.json");
    JsonCheckpointStore::new(&checkpoint_path)
        .save(&RunCheckpoint {
            last_completed_index: 1,
            region_code: "TX".to_string(),
            timestamp: "2025-11-02T10:00:00-07:00".to_string(),
        })
        .await
        .unwrap();

    let orchestrator = BatchOrchestrator::new(
        fast_crawler(engine),
        CsvBatchRepository::new(tmp.path().join("batches")),
        JsonCheckpointStore::new(&checkpoint_path),
        OrchestratorOptions {
            max_cities: 2,
            batch_size: 25,
            start_index: None,
        },
    );

    let summary = orchestrator.run(&region).await.unwrap();
    assert_eq!(summary.cities_completed, 2);
}

/// 固定起始下标优先于断点
#[tokio::test]
async fn configured_offset_overrides_the_checkpoint() {
    let tmp = tempfile::tempdir().unwrap();
    let region = region_of(7);
    let world = Arc::new(MockWorld::for_region(&region, 1));
    let engine: Arc<dyn RenderEngine> = Arc::new(MockRenderEngine::new(world.clone()));

    let checkpoint_path = tmp.path().join("progress.json");
    JsonCheckpointStore::new(&checkpoint_path)
        .save(&RunCheckpoint {
            last_completed_index: 2,
            region_code: "AZ".to_string(),
            timestamp: "2025-11-02T10:00:00-07:00".to_string(),
        })
        .await
        .unwrap();

    let orchestrator = BatchOrchestrator::new(
        fast_crawler(engine),
        CsvBatchRepository::new(tmp.path().join("batches")),
        JsonCheckpointStore::new(&checkpoint_path),
        OrchestratorOptions {
            max_cities: 3,
            batch_size: 25,
            start_index: Some(5),
        },
    );

    let summary = orchestrator.run(&region).await.unwrap();
    assert_eq!(summary.cities_completed, 2);

    let mut visited = world.visited_searches.lock().unwrap().clone();
    visited.sort();
    assert_eq!(
        visited,
        vec![search_url("City5", "Arizona"), search_url("City6", "Arizona")]
    );
}

struct FailingBatchRepository;

#[async_trait]
impl BatchRepository for FailingBatchRepository {
    async fn write_batch(
        &self,
        _region: &TargetRegion,
        _batch_num: usize,
        _results: &[CityResult],
    ) -> Result<std::path::PathBuf, RepositoryError> {
        Err(RepositoryError::Encoding("disk full".to_string()))
    }
}

/// 持久化失败立即终止运行
#[tokio::test]
async fn persistence_failure_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let region = region_of(3);
    let world = Arc::new(MockWorld::for_region(&region, 1));
    let engine: Arc<dyn RenderEngine> = Arc::new(MockRenderEngine::new(world));

    let orchestrator = BatchOrchestrator::new(
        fast_crawler(engine),
        FailingBatchRepository,
        JsonCheckpointStore::new(tmp.path().join("progress.json")),
        OrchestratorOptions {
            max_cities: 2,
            batch_size: 1,
            start_index: None,
        },
    );

    assert!(orchestrator.run(&region).await.is_err());
}
