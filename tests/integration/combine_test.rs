// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use mapleads::domain::models::business::{BusinessRecord, CityResult, UNKNOWN};
use mapleads::domain::models::city::TargetRegion;
use mapleads::domain::repositories::batch_repository::BatchRepository;
use mapleads::infrastructure::combine::{combine, find_batch_dirs, write_combined};
use mapleads::infrastructure::csv_batch::CsvBatchRepository;
use std::fs;

fn record(name: &str, reference: &str) -> BusinessRecord {
    BusinessRecord {
        name: name.to_string(),
        address: "12 Main St, Phoenix".to_string(),
        phone: "+1 (602) 555-0188".to_string(),
        website: UNKNOWN.to_string(),
        email: UNKNOWN.to_string(),
        source_reference: reference.to_string(),
        latitude: "33.4484".to_string(),
        longitude: "-112.0740".to_string(),
    }
}

fn region() -> TargetRegion {
    TargetRegion {
        code: "AZ".to_string(),
        name: "Arizona".to_string(),
        cities: Vec::new(),
    }
}

/// 合并去重测试
///
/// 两个批次中来源引用相同的记录只保留先出现的一条，
/// 城市表按名字有序
#[tokio::test]
async fn combine_unions_batches_and_keeps_the_first_duplicate() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = CsvBatchRepository::new(tmp.path());

    repo.write_batch(
        &region(),
        1,
        &[CityResult {
            city: "Phoenix".to_string(),
            records: vec![record("First", "ref-dup"), record("Only A", "ref-a")],
        }],
    )
    .await
    .unwrap();

    repo.write_batch(
        &region(),
        2,
        &[
            CityResult {
                city: "Phoenix".to_string(),
                records: vec![record("Second", "ref-dup"), record("Only B", "ref-b")],
            },
            CityResult {
                city: "Mesa".to_string(),
                records: vec![record("Mesa One", "ref-m")],
            },
        ],
    )
    .await
    .unwrap();

    let dirs = find_batch_dirs(tmp.path(), "AZ").unwrap();
    assert_eq!(dirs.len(), 2);

    let combined = combine("AZ", &dirs).unwrap();

    let cities: Vec<&String> = combined.keys().collect();
    assert_eq!(cities, vec!["Mesa", "Phoenix"]);

    let phoenix = &combined["Phoenix"];
    assert_eq!(phoenix.len(), 3);
    let dup: Vec<&BusinessRecord> = phoenix
        .iter()
        .filter(|record| record.source_reference == "ref-dup")
        .collect();
    assert_eq!(dup.len(), 1);
    assert_eq!(dup[0].name, "First");

    let out = write_combined(&tmp.path().join("combined"), "AZ", "Arizona", &combined).unwrap();
    let mut tables: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_str().unwrap().to_string())
        .collect();
    tables.sort();
    assert_eq!(tables, vec!["Mesa.csv", "Phoenix.csv"]);
}

/// 不属于目标区域的批次目录被忽略
#[tokio::test]
async fn foreign_region_directories_are_not_picked_up() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = CsvBatchRepository::new(tmp.path());

    repo.write_batch(
        &region(),
        1,
        &[CityResult {
            city: "Phoenix".to_string(),
            records: vec![record("Salon", "ref-1")],
        }],
    )
    .await
    .unwrap();

    let tx = TargetRegion {
        code: "TX".to_string(),
        name: "Texas".to_string(),
        cities: Vec::new(),
    };
    repo.write_batch(
        &tx,
        1,
        &[CityResult {
            city: "Dallas".to_string(),
            records: vec![record("Salon", "ref-2")],
        }],
    )
    .await
    .unwrap();

    let dirs = find_batch_dirs(tmp.path(), "AZ").unwrap();
    assert_eq!(dirs.len(), 1);

    let combined = combine("AZ", &dirs).unwrap();
    assert!(combined.contains_key("Phoenix"));
    assert!(!combined.contains_key("Dallas"));
}
