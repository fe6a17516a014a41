// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::checkpoint::RunCheckpoint;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 断点仓库接口
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// 读取断点，不存在时返回 `None`
    async fn load(&self) -> Result<Option<RunCheckpoint>, RepositoryError>;

    /// 覆写断点
    ///
    /// 实现必须保证覆写原子性，避免中断留下半个断点
    async fn save(&self, checkpoint: &RunCheckpoint) -> Result<(), RepositoryError>;
}
