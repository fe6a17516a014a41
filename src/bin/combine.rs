// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use mapleads::config::settings::Settings;
use mapleads::infrastructure::combine::{combine, find_batch_dirs, write_combined};
use mapleads::utils::telemetry;
use std::path::Path;
use tracing::{info, warn};

/// 批次合并入口
///
/// 汇总一个区域的全部批次目录，按来源引用去重后输出单个合并目录
fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();

    let settings = Settings::new()?;
    let region_code = settings.crawl.region_code.clone();
    let input_dir = Path::new(&settings.output.batch_dir);

    let dirs = find_batch_dirs(input_dir, &region_code)?;
    if dirs.is_empty() {
        warn!(region = %region_code, dir = %input_dir.display(), "No batch output found");
        return Ok(());
    }
    info!(region = %region_code, batches = dirs.len(), "Combining batches");

    let combined = combine(&region_code, &dirs)?;

    // 区域名从第一个批次目录名恢复
    let region_name = dirs
        .first()
        .and_then(|dir| dir.file_name().and_then(|n| n.to_str()))
        .and_then(|name| name.split('_').nth(1))
        .unwrap_or("Unknown")
        .to_string();

    let out = write_combined(
        Path::new(&settings.output.combined_dir),
        &region_code,
        &region_name,
        &combined,
    )?;
    let records: usize = combined.values().map(Vec::len).sum();
    info!(cities = combined.len(), records = records, path = %out.display(), "Combine complete");
    Ok(())
}
