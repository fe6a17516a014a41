// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::checkpoint::RunCheckpoint;
use crate::domain::repositories::checkpoint_repository::CheckpointRepository;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// JSON断点文件
///
/// 先写临时文件再改名，覆写不会留下半个断点
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CheckpointRepository for JsonCheckpointStore {
    async fn load(&self) -> Result<Option<RunCheckpoint>, RepositoryError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<RunCheckpoint>(&content) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(e) => {
                // 断点损坏按不存在处理，宁可重抓不可跳过
                warn!(path = %self.path.display(), "Ignoring corrupt checkpoint: {}", e);
                Ok(None)
            }
        }
    }

    async fn save(&self, checkpoint: &RunCheckpoint) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string(checkpoint)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serialized)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
