// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 持久化层错误类型
///
/// 断点或批次写盘失败属于致命错误，编排器收到后立即停止运行
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("编码错误: {0}")]
    Encoding(String),

    #[error("未找到数据: {0}")]
    NotFound(String),
}

impl From<csv::Error> for RepositoryError {
    fn from(e: csv::Error) -> Self {
        RepositoryError::Encoding(e.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        RepositoryError::Encoding(e.to_string())
    }
}
