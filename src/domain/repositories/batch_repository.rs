// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::business::CityResult;
use crate::domain::models::city::TargetRegion;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use std::path::PathBuf;

/// 批次输出仓库接口
///
/// 编排器只依赖此接口，具体表格编码由基础设施层决定
#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// 写出一个批次，返回落盘位置
    async fn write_batch(
        &self,
        region: &TargetRegion,
        batch_num: usize,
        results: &[CityResult],
    ) -> Result<PathBuf, RepositoryError>;
}
