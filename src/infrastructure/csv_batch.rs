// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::business::{BusinessRecord, CityResult};
use crate::domain::models::city::TargetRegion;
use crate::domain::repositories::batch_repository::BatchRepository;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// 表名长度上限，对齐电子表格工作表名的限制
pub const TABLE_NAME_LIMIT: usize = 31;

/// CSV批次输出
///
/// 每个批次一个目录，目录内每个非空城市一张表
pub struct CsvBatchRepository {
    output_dir: PathBuf,
}

impl CsvBatchRepository {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl BatchRepository for CsvBatchRepository {
    async fn write_batch(
        &self,
        region: &TargetRegion,
        batch_num: usize,
        results: &[CityResult],
    ) -> Result<PathBuf, RepositoryError> {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let dir = self.output_dir.join(format!(
            "{}_{}_batch{}_{}",
            region.code,
            region.name.replace(' ', "_"),
            batch_num,
            timestamp
        ));
        fs::create_dir_all(&dir)?;

        for result in results {
            if result.records.is_empty() {
                continue;
            }
            write_city_table(&dir, &result.city, &result.records)?;
        }

        Ok(dir)
    }
}

fn write_city_table(
    dir: &Path,
    city: &str,
    records: &[BusinessRecord],
) -> Result<(), RepositoryError> {
    let path = dir.join(format!("{}.csv", table_name(city)));
    let mut writer = csv::Writer::from_path(&path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// 城市名截断为合法表名
pub fn table_name(city: &str) -> String {
    city.chars().take(TABLE_NAME_LIMIT).collect()
}
