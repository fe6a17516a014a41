// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::business::BusinessRecord;
use crate::infrastructure::csv_batch::table_name;
use crate::utils::errors::RepositoryError;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 收集一个区域的全部批次目录，按目录名排序
pub fn find_batch_dirs(input_dir: &Path, region_code: &str) -> Result<Vec<PathBuf>, RepositoryError> {
    let prefix = format!("{}_", region_code);
    let mut dirs = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_dir() && name.starts_with(&prefix) {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// 合并多个批次目录
///
/// 同名城市表逐文件并入，再按来源引用去重，先出现者保留。
/// 单张表读取失败只跳过该表，不影响其余批次。
pub fn combine(
    region_code: &str,
    files: &[PathBuf],
) -> Result<BTreeMap<String, Vec<BusinessRecord>>, RepositoryError> {
    let mut combined: BTreeMap<String, Vec<BusinessRecord>> = BTreeMap::new();
    let mut total_rows = 0usize;

    for dir in files {
        let mut tables: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
            .collect();
        tables.sort();

        for table in tables {
            let Some(city) = table.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            else {
                continue;
            };
            let mut reader = match csv::Reader::from_path(&table) {
                Ok(reader) => reader,
                Err(e) => {
                    warn!(table = %table.display(), "Skipping unreadable table: {}", e);
                    continue;
                }
            };
            for row in reader.deserialize::<BusinessRecord>() {
                match row {
                    Ok(record) => {
                        combined.entry(city.clone()).or_default().push(record);
                        total_rows += 1;
                    }
                    Err(e) => warn!(table = %table.display(), "Skipping bad row: {}", e),
                }
            }
        }
    }

    // 城市内按来源引用去重，保留第一次出现的记录
    let mut duplicates = 0usize;
    for records in combined.values_mut() {
        let mut seen = HashSet::new();
        let before = records.len();
        records.retain(|record| seen.insert(record.source_reference.clone()));
        duplicates += before - records.len();
    }
    combined.retain(|_, records| !records.is_empty());

    info!(
        region = %region_code,
        batches = files.len(),
        cities = combined.len(),
        rows = total_rows,
        duplicates = duplicates,
        "Batches combined"
    );
    Ok(combined)
}

/// 写出合并结果
///
/// 单个目录，城市表按名字有序
pub fn write_combined(
    output_dir: &Path,
    region_code: &str,
    region_name: &str,
    combined: &BTreeMap<String, Vec<BusinessRecord>>,
) -> Result<PathBuf, RepositoryError> {
    let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    let dir = output_dir.join(format!("{}_{}_COMBINED_{}", region_code, region_name, timestamp));
    fs::create_dir_all(&dir)?;

    for (city, records) in combined {
        let path = dir.join(format!("{}.csv", table_name(city)));
        let mut writer = csv::Writer::from_path(&path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    Ok(dir)
}
